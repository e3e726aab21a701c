//! Background audio playback via an external player process.
//!
//! The backend is stateless: it can spawn a player and a handle can be told
//! to terminate. The at-most-one-player invariant lives in the session, which
//! owns the handle.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info};

/// A spawned player the session can supersede later. Termination is
/// fire-and-forget: a request is sent and the child is reaped if it already
/// exited, but nobody blocks waiting for confirmation.
pub trait PlayerProcess: std::fmt::Debug {
    fn id(&self) -> u32;
    fn terminate(&mut self);
}

/// Spawns player processes. Trait so tests can substitute a recording fake.
pub trait PlayerBackend {
    fn launch(&self, path: &Path) -> Result<Box<dyn PlayerProcess>>;
}

/// `ffplay`-based backend: headless playback, stdout discarded.
pub struct Ffplay {
    cmd: String,
}

impl Ffplay {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

impl PlayerBackend for Ffplay {
    fn launch(&self, path: &Path) -> Result<Box<dyn PlayerProcess>> {
        info!(" $ {} -nodisp {}", self.cmd, path.display());
        let child = Command::new(&self.cmd)
            .arg("-nodisp")
            .arg(path)
            .stdout(Stdio::null())
            .spawn()
            .with_context(|| {
                format!("failed to spawn '{}' for '{}'", self.cmd, path.display())
            })?;
        info!(pid = child.id(), "background player started");
        Ok(Box::new(FfplayProcess { child }))
    }
}

#[derive(Debug)]
struct FfplayProcess {
    child: Child,
}

impl PlayerProcess for FfplayProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn terminate(&mut self) {
        if let Err(err) = self.child.kill() {
            debug!(pid = self.child.id(), "player already gone: {err}");
        }
        // Reap without blocking; a still-exiting child is collected by the OS.
        let _ = self.child.try_wait();
    }
}
