//! Command-line entry point: wires the microphone, the engines, and the
//! session together, then hands control to the frame loop.

use anyhow::Result;
use std::process;
use std::time::Duration;
use tracing::{debug, error, info};
use voxcmdr::audio::Microphone;
use voxcmdr::commands::CommandTable;
use voxcmdr::config::{AppConfig, Manifest};
#[cfg(feature = "porcupine")]
use voxcmdr::engine::PorcupineDetector;
use voxcmdr::engine::{WakeWordDetector, WhisperTranscriber};
use voxcmdr::player::Ffplay;
use voxcmdr::{telemetry, InterruptSignal, Session, SessionConfig};

fn main() {
    let config = match AppConfig::parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("voxcmdr: {err:#}");
            process::exit(2);
        }
    };
    telemetry::init_tracing(&config);

    if config.list_input_devices {
        list_input_devices();
        return;
    }

    if let Err(err) = run(&config) {
        error!("fatal: {err:#}");
        process::exit(1);
    }
}

fn list_input_devices() {
    match Microphone::list_devices() {
        Ok(names) if names.is_empty() => println!("No audio input devices detected."),
        Ok(names) => {
            println!("Detected audio input devices:");
            for name in names {
                println!("  {name}");
            }
        }
        Err(err) => println!("Failed to list audio input devices: {err:#}"),
    }
}

fn run(config: &AppConfig) -> Result<()> {
    let manifest = Manifest::load(&config.manifest_path)?;
    info!(version = manifest.version, "loaded command manifest");

    let commands = CommandTable::from_manifest(&manifest.detector);
    for command in commands.iter() {
        debug!(
            index = command.spec.index,
            keyword = %command.spec.title,
            sensitivity = command.spec.sensitivity,
            "keyword configured"
        );
    }

    let detector = build_detector(&manifest)?;
    let transcriber = WhisperTranscriber::from_manifest(&manifest.transcriber)?;
    let microphone = Microphone::new(config.input_device.as_deref(), config.channel_capacity)?;
    info!(device = %microphone.device_name(), "microphone ready");

    let interrupt = InterruptSignal::new();
    interrupt.install_sigint_handler()?;

    let session_cfg = SessionConfig {
        settle: Duration::from_millis(config.settle_ms),
        max_utterance: (config.max_utterance_ms > 0)
            .then(|| Duration::from_millis(config.max_utterance_ms)),
    };

    let mut session = Session::new(
        Box::new(microphone),
        detector,
        Box::new(transcriber),
        Box::new(Ffplay::new(config.player_cmd.clone())),
        commands,
        interrupt,
        session_cfg,
    );
    session.run()
}

#[cfg(feature = "porcupine")]
fn build_detector(manifest: &Manifest) -> Result<Box<dyn WakeWordDetector>> {
    Ok(Box::new(PorcupineDetector::from_manifest(
        &manifest.detector,
    )?))
}

#[cfg(not(feature = "porcupine"))]
fn build_detector(_manifest: &Manifest) -> Result<Box<dyn WakeWordDetector>> {
    anyhow::bail!("built without a wake-word backend; enable the 'porcupine' feature")
}
