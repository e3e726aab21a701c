//! The detection-to-action state machine.
//!
//! A single thread owns the session and drives it frame by frame: listen for
//! a keyword, dispatch its action, return to listening. The only state shared
//! across a thread boundary is the interrupt flag; everything else is touched
//! exclusively here, synchronously with the frame reads.

use crate::audio::{FrameRead, FrameSource, StreamSpec};
use crate::commands::{CommandAction, CommandTable};
use crate::engine::{UtteranceTranscriber, WakeWordDetector};
use crate::interrupt::InterruptSignal;
use crate::player::{PlayerBackend, PlayerProcess};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Operating mode of the dispatcher. Exactly one holds at any instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Listening,
    Transcribing,
    RunningPlayer,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Listening => "listening",
            Mode::Transcribing => "transcribing",
            Mode::RunningPlayer => "running_player",
        }
    }

    /// Validate a transition edge. Illegal edges are an error, never a silent
    /// assignment; the session logs and keeps its state when one shows up.
    pub fn transition(self, next: Mode) -> Result<Mode> {
        use Mode::*;
        let legal = matches!(
            (self, next),
            (Idle, Listening)
                | (Listening, Transcribing)
                | (Listening, RunningPlayer)
                | (Transcribing, Listening)
                | (RunningPlayer, Listening)
        );
        if legal {
            Ok(next)
        } else {
            Err(anyhow!(
                "illegal mode transition {} -> {}",
                self.label(),
                next.label()
            ))
        }
    }
}

/// Session tunables beyond its collaborators.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Audio discarded between the wake word and the utterance.
    pub settle: Duration,
    /// Optional hard cap on one utterance; the interrupt flag remains the
    /// primary exit.
    pub max_utterance: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(crate::config::DEFAULT_SETTLE_MS),
            max_utterance: None,
        }
    }
}

/// What a single keyword dispatch amounted to.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The engine reported an index outside the configured list; logged,
    /// nothing changed.
    UnknownKeyword(usize),
    PlayerStarted { title: String },
    /// The spawn failed; logged, nothing tracked.
    PlayerFailed,
    /// One utterance was captured; empty after sanitation means no speech.
    Transcript(String),
}

pub struct Session {
    source: Box<dyn FrameSource>,
    detector: Box<dyn WakeWordDetector>,
    transcriber: Box<dyn UtteranceTranscriber>,
    player: Box<dyn PlayerBackend>,
    commands: CommandTable,
    interrupt: InterruptSignal,
    cfg: SessionConfig,
    mode: Mode,
    active_player: Option<Box<dyn PlayerProcess>>,
}

impl Session {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn WakeWordDetector>,
        transcriber: Box<dyn UtteranceTranscriber>,
        player: Box<dyn PlayerBackend>,
        commands: CommandTable,
        interrupt: InterruptSignal,
        cfg: SessionConfig,
    ) -> Self {
        Self {
            source,
            detector,
            transcriber,
            player,
            commands,
            interrupt,
            cfg,
            mode: Mode::Idle,
            active_player: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn has_active_player(&self) -> bool {
        self.active_player.is_some()
    }

    /// Drive the listening loop until a fatal error. There is no terminal
    /// state besides process exit, which the interrupt handler owns.
    pub fn run(&mut self) -> Result<()> {
        self.set_mode(Mode::Listening);
        info!(keywords = self.commands.len(), "listening for wake words");
        let mut stream = self.source.open(self.detector_spec())?;
        loop {
            let frame = stream.read_frame().context("audio capture failed")?;
            let Some(index) = self
                .detector
                .process(&frame)
                .context("wake-word engine failed")?
            else {
                continue;
            };
            let (next_stream, outcome) = self.dispatch(index, stream)?;
            stream = next_stream;
            if let DispatchOutcome::Transcript(text) = &outcome {
                if text.is_empty() {
                    info!("utterance produced no speech");
                } else {
                    info!(transcript = %text, "utterance transcribed");
                }
            }
        }
    }

    /// Handle one detected keyword. Takes the listening stream and returns
    /// the stream to keep listening on, which is a fresh one after a
    /// transcription window.
    pub fn dispatch(
        &mut self,
        index: usize,
        stream: Box<dyn FrameRead>,
    ) -> Result<(Box<dyn FrameRead>, DispatchOutcome)> {
        let Some(command) = self.commands.lookup(index) else {
            error!(index, "wake-word engine reported an unknown keyword index");
            return Ok((stream, DispatchOutcome::UnknownKeyword(index)));
        };
        let title = command.spec.title.clone();
        let action = command.action.clone();
        info!(keyword = %title, index, "keyword detected");

        // Whatever runs next supersedes the current player, even when the new
        // action is a transcription.
        self.stop_active_player();

        match action {
            CommandAction::PlayAudio(path) => match self.player.launch(&path) {
                Ok(handle) => {
                    self.set_mode(Mode::RunningPlayer);
                    self.active_player = Some(handle);
                    // The spawn is fire-and-forget; listening resumes while
                    // the player runs on its own.
                    self.set_mode(Mode::Listening);
                    Ok((stream, DispatchOutcome::PlayerStarted { title }))
                }
                Err(err) => {
                    error!("failed to spawn the background player: {err:#}");
                    Ok((stream, DispatchOutcome::PlayerFailed))
                }
            },
            CommandAction::Transcribe => {
                self.set_mode(Mode::Transcribing);
                // The device reopens at the transcriber's format.
                drop(stream);
                let transcript = self.transcribe_utterance()?;
                self.set_mode(Mode::Listening);
                let stream = self.source.open(self.detector_spec())?;
                Ok((stream, DispatchOutcome::Transcript(transcript)))
            }
        }
    }

    /// Capture one utterance: arm the interrupt flag, discard the settle
    /// window, feed frames until the flag is raised, finalize exactly once,
    /// and leave the flag at rest.
    fn transcribe_utterance(&mut self) -> Result<String> {
        let spec = StreamSpec {
            sample_rate: self.transcriber.sample_rate(),
            frame_length: self.transcriber.frame_length(),
        };
        let mut stream = self.source.open(spec)?;
        self.interrupt.arm();

        if let Err(err) = self.pump_utterance(stream.as_mut(), &spec) {
            self.interrupt.rest();
            return Err(err);
        }

        let transcript = self.transcriber.finalize().context("transcription failed");
        // Post-condition: the flag is back at its resting value before the
        // result is inspected, so the next window starts clean.
        self.interrupt.rest();
        Ok(sanitize_transcript(&transcript?))
    }

    fn pump_utterance(&mut self, stream: &mut dyn FrameRead, spec: &StreamSpec) -> Result<()> {
        // Frames contaminated by the tail of the wake word are read and
        // thrown away before any reach the transcriber.
        let settle_samples =
            self.cfg.settle.as_millis() as u64 * u64::from(spec.sample_rate) / 1000;
        let mut to_discard = settle_samples.div_ceil(spec.frame_length.max(1) as u64);
        let deadline = self.cfg.max_utterance.map(|cap| Instant::now() + cap);

        // The flag is sampled only between frames; a read in flight always
        // completes and its frame is still processed.
        while !self.interrupt.is_raised() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    debug!("utterance reached the configured duration cap");
                    break;
                }
            }
            let frame = stream.read_frame().context("audio capture failed")?;
            if to_discard > 0 {
                to_discard -= 1;
                continue;
            }
            self.transcriber
                .feed(&frame)
                .context("transcription engine failed")?;
        }
        Ok(())
    }

    fn stop_active_player(&mut self) {
        if let Some(mut player) = self.active_player.take() {
            info!(pid = player.id(), "terminating the previous background player");
            player.terminate();
        }
    }

    fn detector_spec(&self) -> StreamSpec {
        StreamSpec {
            sample_rate: self.detector.sample_rate(),
            frame_length: self.detector.frame_length(),
        }
    }

    /// Apply a validated transition. An illegal edge is logged and the state
    /// left unchanged; it indicates a bug, not a recoverable condition.
    fn set_mode(&mut self, next: Mode) {
        match self.mode.transition(next) {
            Ok(mode) => self.mode = mode,
            Err(err) => error!("{err:#}"),
        }
    }
}

/// Strip non-speech markers the transcriber emits for silence, noise, or
/// music, then collapse whitespace.
pub fn sanitize_transcript(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    static NON_SPEECH_RE: OnceLock<Regex> = OnceLock::new();
    let re = NON_SPEECH_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\[\s*\]|\(\s*\)|\[(?:\s*(?:silence|noise|inaudible|blank_audio|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background)\s*)\]|\((?:\s*(?:silence|noise|inaudible|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background|wind blowing)\s*)\)",
        )
        .expect("non-speech regex should compile")
    });
    let without_markers = re.replace_all(trimmed, " ");
    without_markers
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
