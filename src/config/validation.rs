use super::defaults::{
    MAX_CHANNEL_CAPACITY, MAX_SETTLE_MS, MAX_UTTERANCE_HARD_LIMIT_MS, MIN_CHANNEL_CAPACITY,
    MIN_UTTERANCE_MS,
};
use super::AppConfig;
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the player binary. The manifest path is
    /// deliberately not touched here so utility modes such as
    /// `--list-input-devices` work without one.
    pub fn validate(&mut self) -> Result<()> {
        if self.settle_ms > MAX_SETTLE_MS {
            bail!(
                "--settle-ms must be at most {MAX_SETTLE_MS}, got {}",
                self.settle_ms
            );
        }
        if self.max_utterance_ms != 0
            && !(MIN_UTTERANCE_MS..=MAX_UTTERANCE_HARD_LIMIT_MS).contains(&self.max_utterance_ms)
        {
            bail!(
                "--max-utterance-ms must be 0 or between {MIN_UTTERANCE_MS} and \
                 {MAX_UTTERANCE_HARD_LIMIT_MS}, got {}",
                self.max_utterance_ms
            );
        }
        if !(MIN_CHANNEL_CAPACITY..=MAX_CHANNEL_CAPACITY).contains(&self.channel_capacity) {
            bail!(
                "--channel-capacity must be between {MIN_CHANNEL_CAPACITY} and \
                 {MAX_CHANNEL_CAPACITY}, got {}",
                self.channel_capacity
            );
        }

        self.player_cmd = sanitize_binary(&self.player_cmd, "--player-cmd", &["ffplay"])?;
        Ok(())
    }
}

/// Allow either a known binary name or an existing executable path.
pub(super) fn sanitize_binary(value: &str, flag: &str, allowlist: &[&str]) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{flag} cannot be empty");
    }
    if let Some(allowed) = allowlist
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(trimmed))
    {
        return Ok((*allowed).to_string());
    }

    let path = Path::new(trimmed);
    if path.is_absolute() || trimmed.contains(std::path::MAIN_SEPARATOR) {
        let canonical = path
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {flag} '{trimmed}'"))?;
        let metadata = fs::metadata(&canonical)
            .with_context(|| format!("failed to inspect {flag} '{}'", canonical.display()))?;
        if !metadata.is_file() {
            bail!("{flag} '{}' is not a file", canonical.display());
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode();
            if mode & 0o111 == 0 {
                bail!(
                    "{flag} '{}' exists but is not executable (mode {:o})",
                    canonical.display(),
                    mode
                );
            }
        }
        return canonical
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("{flag} must be valid UTF-8"));
    }

    bail!("{flag} must be one of {allowlist:?} or an existing binary path");
}
