//! System microphone access via CPAL and the blocking frame reader.

use super::dispatch::FramePump;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long `read_frame` waits between checks of the failure flag.
const FRAME_WAIT: Duration = Duration::from_millis(100);
/// A healthy microphone produces frames continuously; this much silence from
/// the driver means the device stalled.
const STALL_LIMIT: Duration = Duration::from_secs(3);

/// The format an engine dictates for its frames.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub frame_length: usize,
}

/// Blocking frame reader: one call, one exact frame.
pub trait FrameRead {
    fn read_frame(&mut self) -> Result<Vec<i16>>;
}

/// Something that can open a frame stream for a given engine format. The two
/// engines in this system may disagree on frame length and rate, so the
/// session reopens the source on every mode handoff.
pub trait FrameSource {
    fn open(&mut self, spec: StreamSpec) -> Result<Box<dyn FrameRead>>;
}

/// Audio input device wrapper.
pub struct Microphone {
    device: cpal::Device,
    channel_capacity: usize,
}

impl Microphone {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a microphone, optionally forcing a specific device so users can
    /// pick the right input when a laptop exposes several.
    pub fn new(preferred_device: Option<&str>, channel_capacity: usize) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self {
            device,
            channel_capacity: channel_capacity.max(1),
        })
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }
}

impl FrameSource for Microphone {
    fn open(&mut self, spec: StreamSpec) -> Result<Box<dyn FrameRead>> {
        FrameStream::open(&self.device, spec, self.channel_capacity)
            .map(|stream| Box::new(stream) as Box<dyn FrameRead>)
    }
}

/// A live capture stream delivering exact frames for one engine format.
///
/// The CPAL callback thread feeds a bounded channel; the reader side blocks
/// until a frame is ready. Dropping the stream stops capture.
pub struct FrameStream {
    stream: cpal::Stream,
    receiver: Receiver<Vec<i16>>,
    failed: Arc<AtomicBool>,
    overflow: Arc<AtomicUsize>,
    spec: StreamSpec,
}

impl FrameStream {
    fn open(device: &cpal::Device, spec: StreamSpec, capacity: usize) -> Result<Self> {
        let default_config = device
            .default_input_config()
            .context("failed to query the input device configuration")?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        debug!(
            "capture config: format={format:?} device_rate={device_rate}Hz channels={channels} \
             target_rate={}Hz frame_length={}",
            spec.sample_rate, spec.frame_length
        );

        let (sender, receiver) = bounded::<Vec<i16>>(capacity);
        let overflow = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicBool::new(false));
        let pump = Arc::new(Mutex::new(FramePump::new(
            device_rate,
            spec.sample_rate,
            spec.frame_length,
            sender,
            overflow.clone(),
        )));

        let err_failed = failed.clone();
        let err_fn = move |err| {
            warn!("audio stream error: {err}");
            err_failed.store(true, Ordering::Relaxed);
        };

        // Convert every supported sample type to f32 in the callback so the
        // rest of the pipeline stays format-agnostic.
        let stream = match format {
            SampleFormat::F32 => {
                let pump = pump.clone();
                let overflow = overflow.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = pump.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            overflow.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let pump = pump.clone();
                let overflow = overflow.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = pump.try_lock() {
                            pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                        } else {
                            overflow.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let pump = pump.clone();
                let overflow = overflow.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = pump.try_lock() {
                            pump.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        } else {
                            overflow.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play().context("failed to start the capture stream")?;

        Ok(Self {
            stream,
            receiver,
            failed,
            overflow,
            spec,
        })
    }

    pub fn spec(&self) -> StreamSpec {
        self.spec
    }
}

impl FrameRead for FrameStream {
    /// Block until the next exact frame. Device failure or a stalled driver
    /// is an error; there is no recovery path for a dead capture device.
    fn read_frame(&mut self) -> Result<Vec<i16>> {
        let stall_deadline = Instant::now() + STALL_LIMIT;
        loop {
            if self.failed.load(Ordering::Relaxed) {
                return Err(anyhow!("audio capture device reported a stream error"));
            }
            match self.receiver.recv_timeout(FRAME_WAIT) {
                Ok(frame) => return Ok(frame),
                Err(RecvTimeoutError::Timeout) => {
                    if Instant::now() >= stall_deadline {
                        return Err(anyhow!(
                            "no audio frames from the capture device; {}",
                            mic_permission_hint()
                        ));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(anyhow!("audio capture stream disconnected"));
                }
            }
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        if let Err(err) = self.stream.pause() {
            debug!("failed to pause audio stream: {err}");
        }
        let overflow = self.overflow.load(Ordering::Relaxed);
        if overflow > 0 {
            warn!(frames = overflow, "capture overflowed; the main loop fell behind");
        }
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}
