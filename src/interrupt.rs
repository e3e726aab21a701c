//! Process-wide interrupt flag with double-edge semantics.
//!
//! The flag rests at `true` ("no capture in progress"). A transcription loop
//! arms it to `false` for the duration of active listening. When SIGINT
//! arrives the handler swaps the flag back to `true`: if it was already at
//! rest the user meant "exit the program", otherwise the running loop picks
//! the stop up at its next frame boundary.

use anyhow::{Context, Result};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared cancellation handle threaded through the session and the signal
/// handler. Cloning is cheap; all clones observe the same flag.
#[derive(Clone, Debug)]
pub struct InterruptSignal {
    raised: Arc<AtomicBool>,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self {
            // Resting value: nothing to cancel yet.
            raised: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Register the SIGINT handler. The handler exits the process when the
    /// flag is at rest and otherwise stops the in-flight capture.
    pub fn install_sigint_handler(&self) -> Result<()> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            if signal.fire() {
                info!("interrupt received while idle; exiting");
                process::exit(0);
            }
            info!("interrupt received; stopping the current capture");
        })
        .context("failed to install the SIGINT handler")
    }

    /// The handler entry point: raise the flag and report whether the process
    /// should exit (true when the flag was already at rest).
    pub fn fire(&self) -> bool {
        self.raised.swap(true, Ordering::SeqCst)
    }

    /// Arm the flag for a capture window. Must be paired with [`rest`].
    ///
    /// [`rest`]: InterruptSignal::rest
    pub fn arm(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    /// True once the armed flag has been consumed by a `fire`, or while no
    /// capture is running.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Return the flag to its resting value after a capture window ends.
    pub fn rest(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }
}

impl Default for InterruptSignal {
    fn default() -> Self {
        Self::new()
    }
}
