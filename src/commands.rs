//! The keyword-to-action table built once from the manifest.
//!
//! The wake-word engine reports keywords by position in the configured list,
//! so the table preserves manifest order and the index is part of the engine
//! contract. Lookup failures are a normal runtime condition (a misbehaving
//! engine), handled by the session, never a panic.

use crate::config::{ActionEntry, DetectorManifest};
use std::path::PathBuf;

/// One configured wake phrase as the detector sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSpec {
    pub index: usize,
    pub name: String,
    pub title: String,
    pub sensitivity: f32,
    /// Keyword model file, resolved against the detector root.
    pub file: PathBuf,
}

/// What to do when a keyword fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Spawn a background player for the given audio file.
    PlayAudio(PathBuf),
    /// Open a transcription window and capture one utterance.
    Transcribe,
}

#[derive(Debug, Clone)]
pub struct Command {
    pub spec: KeywordSpec,
    pub action: CommandAction,
}

/// Immutable dispatch table keyed by detector-reported index.
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: Vec<Command>,
}

impl CommandTable {
    /// Build the table from a validated detector manifest, preserving the
    /// keyword order the engine was configured with.
    pub fn from_manifest(detector: &DetectorManifest) -> Self {
        let commands = detector
            .keywords
            .iter()
            .enumerate()
            .map(|(index, entry)| Command {
                spec: KeywordSpec {
                    index,
                    name: entry.name.clone(),
                    title: entry.title.clone(),
                    sensitivity: entry.sensitivity,
                    file: detector.root_path.join(&entry.file),
                },
                action: match &entry.action {
                    ActionEntry::Play { file } => CommandAction::PlayAudio(file.clone()),
                    ActionEntry::Transcribe => CommandAction::Transcribe,
                },
            })
            .collect();
        Self { commands }
    }

    /// Look up the command for a detector-reported index. `None` means the
    /// engine reported an index outside the configured list.
    pub fn lookup(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}
