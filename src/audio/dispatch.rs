use super::resample::{fit_frame_length, resample_block};
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Downmix multi-channel input to mono while applying the provided converter,
/// so the engines see a single channel regardless of the microphone layout.
pub(super) fn append_downmixed_samples<T, F>(
    buf: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame into one mono sample.
    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

pub(super) fn quantize_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32_767.0).round() as i16
}

/// Runs inside the CPAL callback: accumulates device-rate mono samples and
/// emits exact engine-rate frames. The callback never blocks; a full channel
/// counts an overflow instead.
pub(super) struct FramePump {
    device_rate: u32,
    target_rate: u32,
    frame_samples: usize,
    /// Device-rate samples consumed per emitted frame.
    device_block: usize,
    pending: Vec<f32>,
    scratch: Vec<f32>,
    sender: Sender<Vec<i16>>,
    overflow: Arc<AtomicUsize>,
}

impl FramePump {
    pub(super) fn new(
        device_rate: u32,
        target_rate: u32,
        frame_samples: usize,
        sender: Sender<Vec<i16>>,
        overflow: Arc<AtomicUsize>,
    ) -> Self {
        let frame_samples = frame_samples.max(1);
        let device_block = ((frame_samples as u64 * device_rate.max(1) as u64)
            .div_ceil(target_rate.max(1) as u64))
        .max(1) as usize;
        Self {
            device_rate,
            target_rate,
            frame_samples,
            device_block,
            pending: Vec::with_capacity(device_block * 2),
            scratch: Vec::new(),
            sender,
            overflow,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        append_downmixed_samples(&mut self.scratch, data, channels, convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.device_block {
            let block: Vec<f32> = self.pending.drain(..self.device_block).collect();
            let frame = self.frame_from_block(&block);
            if let Err(err) = self.sender.try_send(frame) {
                match err {
                    TrySendError::Full(_) => {
                        self.overflow.fetch_add(1, Ordering::Relaxed);
                    }
                    TrySendError::Disconnected(_) => break,
                }
            }
        }
    }

    fn frame_from_block(&self, block: &[f32]) -> Vec<i16> {
        let shaped = if self.device_rate == self.target_rate {
            block.to_vec()
        } else {
            resample_block(block, self.device_rate, self.target_rate)
        };
        fit_frame_length(shaped, self.frame_samples)
            .into_iter()
            .map(quantize_i16)
            .collect()
    }
}
