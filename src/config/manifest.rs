//! The JSON command manifest: engine locations plus the keyword list.
//!
//! Loaded once at startup. The keyword order in the manifest is the contract
//! with the wake-word engine — the engine reports detections by position.

use super::defaults::{
    MAX_ENGINE_FRAME_LENGTH, MAX_ENGINE_SAMPLE_RATE, MIN_ENGINE_FRAME_LENGTH,
    MIN_ENGINE_SAMPLE_RATE, SUPPORTED_MANIFEST_VERSION,
};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub detector: DetectorManifest,
    pub transcriber: TranscriberManifest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorManifest {
    /// Directory the engine's model, library, and keyword files live under.
    pub root_path: PathBuf,
    /// Native library override; resolved per platform/architecture when absent.
    #[serde(default)]
    pub library_path: Option<PathBuf>,
    /// Engine parameter model, relative to `root_path`.
    pub model_path: PathBuf,
    /// Engine access key; falls back to the PICOVOICE_ACCESS_KEY environment
    /// variable when absent.
    #[serde(default)]
    pub access_key: Option<String>,
    pub keywords: Vec<KeywordEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordEntry {
    pub name: String,
    pub title: String,
    pub sensitivity: f32,
    /// Keyword model file, relative to the detector root.
    pub file: PathBuf,
    pub action: ActionEntry,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionEntry {
    /// Launch a background player for the given audio file.
    Play { file: PathBuf },
    /// Capture and transcribe one utterance.
    Transcribe,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriberManifest {
    pub root_path: PathBuf,
    #[serde(default)]
    pub library_path: Option<PathBuf>,
    /// Acoustic model, relative to `root_path` (a ggml model for the whisper
    /// backend).
    pub acoustic_model_path: PathBuf,
    /// Engine-specific extras; validated for existence when present, consumed
    /// only by backends that need them.
    #[serde(default)]
    pub language_model_path: Option<PathBuf>,
    #[serde(default)]
    pub license_path: Option<PathBuf>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_frame_length() -> usize {
    512
}

impl Manifest {
    /// Read and validate the manifest. Every failure here is fatal at
    /// startup, so the messages name the offending field.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read command manifest '{}'", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse command manifest '{}'", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != SUPPORTED_MANIFEST_VERSION {
            bail!(
                "manifest version {} is not supported (expected {SUPPORTED_MANIFEST_VERSION})",
                self.version
            );
        }
        self.detector.validate()?;
        self.transcriber.validate()?;
        Ok(())
    }
}

impl DetectorManifest {
    fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            bail!("manifest declares no keywords");
        }
        for (index, keyword) in self.keywords.iter().enumerate() {
            if keyword.name.trim().is_empty() {
                bail!("keyword {index} has an empty name");
            }
            if !(0.0..=1.0).contains(&keyword.sensitivity) {
                bail!(
                    "keyword '{}' sensitivity must be within [0.0, 1.0], got {}",
                    keyword.name,
                    keyword.sensitivity
                );
            }
            if keyword.file.as_os_str().is_empty() {
                bail!("keyword '{}' has an empty file reference", keyword.name);
            }
        }
        Ok(())
    }

    /// Keyword model files in manifest order, resolved against the root.
    /// A `{platform}` placeholder in a file name picks the per-OS keyword
    /// binary the engine vendor ships.
    pub fn keyword_file_paths(&self) -> Result<Vec<PathBuf>> {
        self.keywords
            .iter()
            .map(|keyword| Ok(self.root_path.join(expand_platform(&keyword.file)?)))
            .collect()
    }

    pub fn sensitivities(&self) -> Vec<f32> {
        self.keywords.iter().map(|keyword| keyword.sensitivity).collect()
    }

    pub fn resolved_model_path(&self) -> PathBuf {
        self.root_path.join(&self.model_path)
    }

    /// The native library to load: the manifest override, or the vendor's
    /// per-platform layout under the root.
    pub fn resolved_library_path(&self) -> Result<PathBuf> {
        match &self.library_path {
            Some(path) => Ok(self.root_path.join(path)),
            None => Ok(self.root_path.join(super::platform::detector_library_path()?)),
        }
    }
}

fn expand_platform(file: &Path) -> Result<PathBuf> {
    let raw = file.to_string_lossy();
    if raw.contains("{platform}") {
        let suffix = super::platform::keyword_file_suffix()?;
        Ok(PathBuf::from(raw.replace("{platform}", suffix)))
    } else {
        Ok(file.to_path_buf())
    }
}

impl TranscriberManifest {
    fn validate(&self) -> Result<()> {
        if !(MIN_ENGINE_SAMPLE_RATE..=MAX_ENGINE_SAMPLE_RATE).contains(&self.sample_rate) {
            bail!(
                "transcriber sample_rate must be between {MIN_ENGINE_SAMPLE_RATE} and \
                 {MAX_ENGINE_SAMPLE_RATE} Hz, got {}",
                self.sample_rate
            );
        }
        if !(MIN_ENGINE_FRAME_LENGTH..=MAX_ENGINE_FRAME_LENGTH).contains(&self.frame_length) {
            bail!(
                "transcriber frame_length must be between {MIN_ENGINE_FRAME_LENGTH} and \
                 {MAX_ENGINE_FRAME_LENGTH} samples, got {}",
                self.frame_length
            );
        }
        if self.language.trim().is_empty() {
            bail!("transcriber language must not be empty");
        }
        for (label, path) in [
            ("language_model_path", &self.language_model_path),
            ("license_path", &self.license_path),
        ] {
            if let Some(path) = path {
                let resolved = self.root_path.join(path);
                if !resolved.exists() {
                    bail!("transcriber {label} '{}' does not exist", resolved.display());
                }
            }
        }
        Ok(())
    }

    pub fn resolved_model_path(&self) -> PathBuf {
        self.root_path.join(&self.acoustic_model_path)
    }
}
