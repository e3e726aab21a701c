//! Tunable limits and default values shared by validation and the CLI.

/// Manifest schema version this build understands.
pub const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Manifest looked up next to the working directory when `--config` is absent.
pub const DEFAULT_MANIFEST_PATH: &str = "voxcmdr.json";

/// Audio discarded between the wake word and the utterance. The trailing
/// syllable of the wake phrase otherwise leaks into the transcript.
pub const DEFAULT_SETTLE_MS: u64 = 200;

/// Anything longer than this would swallow the start of the utterance.
pub const MAX_SETTLE_MS: u64 = 5_000;

/// Upper bound for --max-utterance-ms (ten minutes).
pub const MAX_UTTERANCE_HARD_LIMIT_MS: u64 = 600_000;

/// Shortest utterance cap worth allowing.
pub const MIN_UTTERANCE_MS: u64 = 500;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const MIN_CHANNEL_CAPACITY: usize = 8;
pub const MAX_CHANNEL_CAPACITY: usize = 1_024;

/// Engine sample-rate sanity window (Hz).
pub const MIN_ENGINE_SAMPLE_RATE: u32 = 8_000;
pub const MAX_ENGINE_SAMPLE_RATE: u32 = 48_000;

/// Engine frame-length sanity window (samples).
pub const MIN_ENGINE_FRAME_LENGTH: usize = 80;
pub const MAX_ENGINE_FRAME_LENGTH: usize = 8_192;
