//! Contracts for the external recognition engines.
//!
//! Both engines are black boxes to the session: they consume fixed-length
//! blocks of signed 16-bit PCM and expose the frame length and sample rate
//! the audio source must be opened with. Everything else about them is
//! backend detail.

use anyhow::Result;

#[cfg(feature = "porcupine")]
mod porcupine;
mod whisper;

#[cfg(feature = "porcupine")]
pub use porcupine::PorcupineDetector;
pub use whisper::WhisperTranscriber;

/// A keyword spotter. `process` consumes exactly one frame and reports the
/// index of the detected keyword in the configured list, if any. Backends
/// translate their native "-1 means nothing" convention into `Option`.
pub trait WakeWordDetector {
    fn process(&mut self, frame: &[i16]) -> Result<Option<usize>>;
    fn frame_length(&self) -> usize;
    fn sample_rate(&self) -> u32;
}

/// A speech-to-text engine driven one frame at a time. `feed` accumulates
/// internal state; `finalize` ends the utterance, returns the transcript, and
/// resets the engine for the next window.
pub trait UtteranceTranscriber {
    fn feed(&mut self, frame: &[i16]) -> Result<()>;
    fn finalize(&mut self) -> Result<String>;
    fn frame_length(&self) -> usize;
    fn sample_rate(&self) -> u32;
}
