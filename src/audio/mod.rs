//! Frame-oriented microphone capture.
//!
//! The engines consume fixed-length blocks of signed 16-bit samples at a
//! rate they dictate. Audio is captured via CPAL at whatever format the
//! device offers, downmixed to mono, resampled to the consumer's rate, and
//! chunked into exact frames before crossing to the main loop over a bounded
//! channel.

mod dispatch;
mod resample;
mod source;
#[cfg(test)]
mod tests;

pub use source::{FrameRead, FrameSource, FrameStream, Microphone, StreamSpec};
