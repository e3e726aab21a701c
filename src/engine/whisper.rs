//! Whisper speech-to-text backend.
//!
//! Wraps `whisper_rs` behind the [`UtteranceTranscriber`] contract: frames
//! accumulate into a PCM buffer and `finalize` runs one full decode. The
//! model is loaded once at startup and reused across utterances to avoid
//! repeated initialization overhead.

#[cfg(unix)]
mod platform {
    use crate::config::TranscriberManifest;
    use crate::engine::UtteranceTranscriber;
    use anyhow::{anyhow, Context, Result};
    use std::io;
    use std::os::raw::{c_char, c_uint, c_void};
    use std::os::unix::io::AsRawFd;
    use std::sync::Once;
    use tracing::debug;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Whisper model context plus the per-utterance PCM buffer.
    pub struct WhisperTranscriber {
        ctx: WhisperContext,
        pending: Vec<f32>,
        language: String,
        sample_rate: u32,
        frame_length: usize,
    }

    impl WhisperTranscriber {
        /// Load the ggml model named by the manifest.
        ///
        /// Stderr is temporarily redirected to `/dev/null` during loading
        /// because whisper.cpp emits verbose initialization messages.
        pub fn from_manifest(cfg: &TranscriberManifest) -> Result<Self> {
            install_whisper_log_silencer();

            let model_path = cfg.resolved_model_path();
            let model_path = model_path
                .to_str()
                .ok_or_else(|| anyhow!("transcriber model path must be valid UTF-8"))?;

            let ctx = with_silenced_stderr(|| {
                WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            })?
            .with_context(|| format!("failed to load whisper model '{model_path}'"))?;

            Ok(Self {
                ctx,
                pending: Vec::new(),
                language: cfg.language.clone(),
                sample_rate: cfg.sample_rate,
                frame_length: cfg.frame_length,
            })
        }
    }

    impl UtteranceTranscriber for WhisperTranscriber {
        fn feed(&mut self, frame: &[i16]) -> Result<()> {
            self.pending
                .extend(frame.iter().map(|&sample| sample as f32 / 32_768.0));
            Ok(())
        }

        fn finalize(&mut self) -> Result<String> {
            let samples = std::mem::take(&mut self.pending);
            if samples.is_empty() {
                return Ok(String::new());
            }

            let mut state = self
                .ctx
                .create_state()
                .context("failed to create whisper state")?;
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_language(Some(&self.language));
            // Keep laptops usable while decoding.
            params.set_n_threads(num_cpus::get().min(8) as i32);
            params.set_print_progress(false);
            params.set_print_timestamps(false);
            params.set_print_special(false);
            params.set_print_realtime(false);
            params.set_translate(false);
            params.set_token_timestamps(false);
            state.full(params, &samples)?;

            let mut transcript = String::new();
            let num_segments = match state.full_n_segments() {
                Ok(count) => count,
                Err(err) => {
                    debug!("whisper failed to read segment count: {err}");
                    return Ok(transcript);
                }
            };
            if num_segments < 0 {
                debug!("whisper returned a negative segment count");
                return Ok(transcript);
            }
            // Whisper splits output into small segments; stitch them together.
            for i in 0..num_segments {
                match state.full_get_segment_text_lossy(i) {
                    Ok(text) => transcript.push_str(&text),
                    Err(err) => debug!("failed to read whisper segment {i}: {err}"),
                }
            }
            Ok(transcript.replace("[BLANK_AUDIO]", ""))
        }

        fn frame_length(&self) -> usize {
            self.frame_length
        }

        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }
    }

    /// Run `f` with stderr pointed at `/dev/null`, restoring it afterwards.
    fn with_silenced_stderr<T>(f: impl FnOnce() -> T) -> Result<T> {
        let null = std::fs::OpenOptions::new()
            .write(true)
            .open("/dev/null")
            .context("failed to open /dev/null")?;
        let null_fd = null.as_raw_fd();

        // SAFETY: dup(2) duplicates the stderr file descriptor; we hold the
        // only copy and restore it before returning.
        let orig_stderr = unsafe { libc::dup(2) };
        if orig_stderr < 0 {
            return Err(anyhow!(
                "failed to dup stderr: {}",
                io::Error::last_os_error()
            ));
        }

        let dup_result = unsafe { libc::dup2(null_fd, 2) };
        if dup_result < 0 {
            unsafe {
                libc::close(orig_stderr);
            }
            return Err(anyhow!(
                "failed to redirect stderr: {}",
                io::Error::last_os_error()
            ));
        }

        let value = f();

        let restore_result = unsafe { libc::dup2(orig_stderr, 2) };
        unsafe {
            libc::close(orig_stderr);
        }
        if restore_result < 0 {
            return Err(anyhow!(
                "failed to restore stderr: {}",
                io::Error::last_os_error()
            ));
        }

        Ok(value)
    }

    fn install_whisper_log_silencer() {
        static INSTALL_LOG_CALLBACK: Once = Once::new();
        INSTALL_LOG_CALLBACK.call_once(|| unsafe {
            whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
        });
    }

    #[allow(unused_variables)]
    unsafe extern "C" fn whisper_log_callback(
        _level: c_uint,
        _text: *const c_char,
        _user_data: *mut c_void,
    ) {
        // Silence the default whisper.cpp logger; detections are logged by the
        // session, not the engine.
    }
}

#[cfg(unix)]
pub use platform::WhisperTranscriber;

#[cfg(not(unix))]
mod platform {
    use crate::config::TranscriberManifest;
    use crate::engine::UtteranceTranscriber;
    use anyhow::{anyhow, Result};

    /// Stub for targets without whisper.cpp support.
    pub struct WhisperTranscriber;

    impl WhisperTranscriber {
        pub fn from_manifest(_: &TranscriberManifest) -> Result<Self> {
            Err(anyhow!(
                "whisper transcription is currently supported only on Unix-like platforms"
            ))
        }
    }

    impl UtteranceTranscriber for WhisperTranscriber {
        fn feed(&mut self, _: &[i16]) -> Result<()> {
            Err(anyhow!("unsupported platform"))
        }

        fn finalize(&mut self) -> Result<String> {
            Err(anyhow!("unsupported platform"))
        }

        fn frame_length(&self) -> usize {
            0
        }

        fn sample_rate(&self) -> u32 {
            0
        }
    }
}

#[cfg(not(unix))]
pub use platform::WhisperTranscriber;
