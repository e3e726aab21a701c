//! Porcupine wake-word backend (feature `porcupine`).

use crate::config::DetectorManifest;
use crate::engine::WakeWordDetector;
use anyhow::{anyhow, bail, Result};
use porcupine::{Porcupine, PorcupineBuilder};
use std::env;
use tracing::info;

/// Environment fallback for the engine access key when the manifest carries
/// none.
const ACCESS_KEY_ENV: &str = "PICOVOICE_ACCESS_KEY";

pub struct PorcupineDetector {
    engine: Porcupine,
}

impl std::fmt::Debug for PorcupineDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PorcupineDetector").finish_non_exhaustive()
    }
}

impl PorcupineDetector {
    /// Build the engine from the manifest's keyword list. Keyword order in
    /// the manifest defines the indices the engine reports.
    pub fn from_manifest(cfg: &DetectorManifest) -> Result<Self> {
        let access_key = cfg
            .access_key
            .clone()
            .or_else(|| env::var(ACCESS_KEY_ENV).ok())
            .ok_or_else(|| {
                anyhow!("no engine access key in the manifest or ${ACCESS_KEY_ENV}")
            })?;

        let keyword_paths = cfg.keyword_file_paths()?;
        for path in &keyword_paths {
            if !path.exists() {
                bail!("keyword file '{}' does not exist", path.display());
            }
        }
        let model_path = cfg.resolved_model_path();
        if !model_path.exists() {
            bail!("engine model '{}' does not exist", model_path.display());
        }
        let library_path = cfg.resolved_library_path()?;

        let engine = PorcupineBuilder::new_with_keyword_paths(access_key, &keyword_paths)
            .sensitivities(&cfg.sensitivities())
            .model_path(&model_path)
            .library_path(&library_path)
            .init()
            .map_err(|err| anyhow!("failed to initialize the wake-word engine: {err}"))?;

        info!(
            version = %engine.version(),
            keywords = keyword_paths.len(),
            "wake-word engine ready"
        );
        Ok(Self { engine })
    }
}

impl WakeWordDetector for PorcupineDetector {
    fn process(&mut self, frame: &[i16]) -> Result<Option<usize>> {
        let index = self
            .engine
            .process(frame)
            .map_err(|err| anyhow!("wake-word engine failed to process a frame: {err}"))?;
        // The engine reports -1 for "no detection".
        Ok(usize::try_from(index).ok())
    }

    fn frame_length(&self) -> usize {
        self.engine.frame_length() as usize
    }

    fn sample_rate(&self) -> u32 {
        self.engine.sample_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionEntry, KeywordEntry};
    use std::path::PathBuf;

    #[test]
    fn missing_keyword_files_fail_before_engine_init() {
        let manifest = DetectorManifest {
            root_path: PathBuf::from("/no/such/engine"),
            library_path: Some(PathBuf::from("lib/libkw.so")),
            model_path: PathBuf::from("params.pv"),
            access_key: Some("test-key".to_string()),
            keywords: vec![KeywordEntry {
                name: "porcupine".to_string(),
                title: "Porcupine".to_string(),
                sensitivity: 0.5,
                file: PathBuf::from("keywords/porcupine.ppn"),
                action: ActionEntry::Transcribe,
            }],
        };
        let err = PorcupineDetector::from_manifest(&manifest).expect_err("nothing exists");
        assert!(format!("{err:#}").contains("keyword file"));
    }
}
