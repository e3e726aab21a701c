//! Sample-rate conversion for the capture path. Linear interpolation with a
//! small anti-aliasing FIR when decimating; good enough for speech frames
//! where latency matters more than phase accuracy.

use std::cmp::Ordering as CmpOrdering;
use std::f32::consts::PI;

// Practical device-rate bounds (~0.17x .. 6x against a 48 kHz ceiling).
pub(super) const MIN_DEVICE_RATE: u32 = 2_000;
pub(super) const MAX_DEVICE_RATE: u32 = 384_000;
const MAX_DECIMATION_TAPS: usize = 129;

/// Convert one mono block from the device rate to the engine rate.
pub(super) fn resample_block(input: &[f32], device_rate: u32, target_rate: u32) -> Vec<f32> {
    if input.is_empty() || device_rate == 0 || target_rate == 0 || device_rate == target_rate {
        return input.to_vec();
    }
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return input.to_vec();
    }

    let ratio = target_rate as f32 / device_rate as f32;
    let filtered = if device_rate > target_rate {
        // Tame frequencies above the target Nyquist before dropping samples.
        let taps = decimation_tap_count(device_rate, target_rate);
        low_pass_fir(input, device_rate, target_rate, taps)
    } else {
        input.to_vec()
    };
    resample_linear(&filtered, ratio)
}

/// Lightweight linear resampler used after optional filtering.
pub(super) fn resample_linear(input: &[f32], ratio: f32) -> Vec<f32> {
    let input_len = input.len();
    let output_len = (input_len as f32 * ratio).round() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f32 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx - idx as f32;

        if idx + 1 < input_len {
            output.push(input[idx] * (1.0 - frac) + input[idx + 1] * frac);
        } else {
            output.push(input.last().copied().unwrap_or(0.0));
        }
    }

    output
}

/// Pad or truncate to the exact frame length the engine expects. Rounding in
/// the rate conversion can leave a block a sample short or long.
pub(super) fn fit_frame_length(mut data: Vec<f32>, desired: usize) -> Vec<f32> {
    match data.len().cmp(&desired) {
        CmpOrdering::Greater => {
            data.truncate(desired);
        }
        CmpOrdering::Less => {
            let pad = *data.last().unwrap_or(&0.0);
            data.resize(desired, pad);
        }
        CmpOrdering::Equal => {}
    }
    data
}

/// Tap count scaled with the decimation ratio: short for near-equal rates,
/// longer when collapsing 48 kHz into 16 kHz.
pub(super) fn decimation_tap_count(device_rate: u32, target_rate: u32) -> usize {
    let decimation_ratio = device_rate as f32 / target_rate.max(1) as f32;
    let mut taps = (decimation_ratio * 4.0).ceil().max(11.0) as usize;
    if taps % 2 == 0 {
        taps += 1;
    }
    taps.min(MAX_DECIMATION_TAPS)
}

/// FIR low-pass applied before decimation so high-frequency speech does not
/// alias when users have 44.1/48 kHz microphones.
pub(super) fn low_pass_fir(
    input: &[f32],
    device_rate: u32,
    target_rate: u32,
    taps: usize,
) -> Vec<f32> {
    if input.is_empty() || taps <= 1 {
        return input.to_vec();
    }

    let normalized_cutoff = (target_rate as f32 * 0.5 / device_rate as f32).min(0.499);
    let coeffs = design_low_pass(normalized_cutoff, taps);
    let half = taps / 2;
    let mut output = Vec::with_capacity(input.len());

    for n in 0..input.len() {
        let mut acc = 0.0;
        for (k, coeff) in coeffs.iter().enumerate() {
            if let Some(idx) = (n + k).checked_sub(half) {
                if let Some(sample) = input.get(idx) {
                    acc += *sample * coeff;
                }
            }
        }
        output.push(acc);
    }

    output
}

/// Normalized Hamming-windowed sinc taps for the FIR above.
pub(super) fn design_low_pass(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    let mut coeffs = Vec::with_capacity(taps);
    let m = (taps - 1) as f32;

    for n in 0..taps {
        let centered = n as f32 - m / 2.0;
        let x = 2.0 * PI * normalized_cutoff * centered;
        let sinc = if centered == 0.0 {
            2.0 * normalized_cutoff
        } else {
            (2.0 * normalized_cutoff * x.sin()) / x
        };
        let window = if taps <= 1 {
            1.0
        } else {
            0.54 - 0.46 * ((2.0 * PI * n as f32) / m).cos()
        };
        coeffs.push(sinc * window);
    }

    let sum: f32 = coeffs.iter().sum();
    if sum != 0.0 {
        for coeff in coeffs.iter_mut() {
            *coeff /= sum;
        }
    }

    coeffs
}
