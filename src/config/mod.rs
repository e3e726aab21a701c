//! Command-line parsing, the JSON command manifest, and validation helpers.

mod defaults;
mod manifest;
mod platform;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_MANIFEST_PATH, DEFAULT_SETTLE_MS, MAX_SETTLE_MS,
    MAX_UTTERANCE_HARD_LIMIT_MS, SUPPORTED_MANIFEST_VERSION,
};
pub use manifest::{
    ActionEntry, DetectorManifest, KeywordEntry, Manifest, TranscriberManifest,
};
pub use platform::{detector_library_path, keyword_file_suffix};

/// CLI options for the dispatcher. Validated values keep the spawned player
/// and the capture pipeline within sane bounds.
#[derive(Debug, Parser, Clone)]
#[command(about = "VoxCmdr voice-triggered command dispatcher", author, version)]
pub struct AppConfig {
    /// Path to the JSON command manifest
    #[arg(long = "config", env = "VOXCMDR_CONFIG", default_value = DEFAULT_MANIFEST_PATH)]
    pub manifest_path: PathBuf,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// External player binary used for background playback
    #[arg(long = "player-cmd", default_value = "ffplay")]
    pub player_cmd: String,

    /// Audio discarded after a wake word before transcription starts (milliseconds)
    #[arg(long = "settle-ms", default_value_t = DEFAULT_SETTLE_MS)]
    pub settle_ms: u64,

    /// Hard cap on a single utterance (milliseconds, 0 disables the cap)
    #[arg(long = "max-utterance-ms", default_value_t = 0)]
    pub max_utterance_ms: u64,

    /// Frame channel capacity between the capture callback and the main loop
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Enable debug-level logging
    #[arg(long, env = "VOXCMDR_VERBOSE", default_value_t = false)]
    pub verbose: bool,
}
