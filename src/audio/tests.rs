use super::dispatch::{append_downmixed_samples, quantize_i16, FramePump};
use super::resample::{
    decimation_tap_count, design_low_pass, fit_frame_length, resample_block, resample_linear,
};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn downmixes_multi_channel_audio() {
    let mut buf = Vec::new();
    let samples = [1.0f32, -1.0, 0.5, 0.5];
    append_downmixed_samples(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![0.0, 0.5]);
}

#[test]
fn preserves_single_channel_audio() {
    let mut buf = Vec::new();
    let samples = [0.1f32, 0.2, 0.3];
    append_downmixed_samples(&mut buf, &samples, 1, |sample| sample);
    assert_eq!(buf, samples);
}

#[test]
fn quantize_saturates_out_of_range_samples() {
    assert_eq!(quantize_i16(0.0), 0);
    assert_eq!(quantize_i16(1.0), 32_767);
    assert_eq!(quantize_i16(2.0), 32_767);
    assert_eq!(quantize_i16(-2.0), -32_767);
}

#[test]
fn resample_linear_scales_length() {
    let input = vec![0.0f32, 1.0, 2.0, 3.0];
    let result = resample_linear(&input, 0.5);
    assert!(result.len() < input.len());
    assert!((result.first().copied().unwrap_or_default() - 0.0).abs() < 1e-6);
}

#[test]
fn resample_block_is_identity_at_equal_rates() {
    let input = vec![0.1f32, 0.2, 0.3];
    assert_eq!(resample_block(&input, 16_000, 16_000), input);
}

#[test]
fn resample_block_halves_length_for_double_rate() {
    let input: Vec<f32> = (0..960).map(|i| (i as f32 * 0.01).sin()).collect();
    let result = resample_block(&input, 32_000, 16_000);
    let expected = input.len() / 2;
    let diff = (result.len() as isize - expected as isize).unsigned_abs();
    assert!(diff <= 2, "expected ~{expected} samples, got {}", result.len());
}

#[test]
fn fit_frame_length_pads_and_truncates() {
    assert_eq!(fit_frame_length(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    assert_eq!(fit_frame_length(vec![1.0, 2.0], 4), vec![1.0, 2.0, 2.0, 2.0]);
    assert_eq!(fit_frame_length(Vec::new(), 2), vec![0.0, 0.0]);
}

#[test]
fn decimation_tap_count_is_odd_and_bounded() {
    for rate in [16_000u32, 44_100, 48_000, 192_000] {
        let taps = decimation_tap_count(rate, 16_000);
        assert!(taps % 2 == 1, "taps must be odd, got {taps}");
        assert!(taps <= 129);
    }
}

#[test]
fn low_pass_taps_are_normalized() {
    let coeffs = design_low_pass(0.25, 31);
    let sum: f32 = coeffs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-4, "taps should sum to 1, got {sum}");
}

#[test]
fn pump_emits_exact_frames_at_equal_rates() {
    let (sender, receiver) = bounded(8);
    let overflow = Arc::new(AtomicUsize::new(0));
    let mut pump = FramePump::new(16_000, 16_000, 4, sender, overflow.clone());

    // Two and a half frames of mono input.
    let data: Vec<f32> = (0..10).map(|i| i as f32 / 20.0).collect();
    pump.push(&data, 1, |sample| sample);

    let first = receiver.try_recv().expect("first frame");
    let second = receiver.try_recv().expect("second frame");
    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 4);
    assert!(receiver.try_recv().is_err(), "remainder stays pending");
    assert_eq!(overflow.load(Ordering::Relaxed), 0);
}

#[test]
fn pump_resamples_device_rate_blocks() {
    let (sender, receiver) = bounded(8);
    let overflow = Arc::new(AtomicUsize::new(0));
    // 32 kHz device, 16 kHz engine, 4-sample frames: 8 device samples each.
    let mut pump = FramePump::new(32_000, 16_000, 4, sender, overflow);

    let data = vec![0.5f32; 16];
    pump.push(&data, 1, |sample| sample);

    let first = receiver.try_recv().expect("first frame");
    assert_eq!(first.len(), 4);
    let second = receiver.try_recv().expect("second frame");
    assert_eq!(second.len(), 4);
}

#[test]
fn pump_counts_overflow_instead_of_blocking() {
    let (sender, receiver) = bounded(1);
    let overflow = Arc::new(AtomicUsize::new(0));
    let mut pump = FramePump::new(16_000, 16_000, 2, sender, overflow.clone());

    pump.push(&[0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6], 1, |sample| sample);

    assert_eq!(overflow.load(Ordering::Relaxed), 2, "one slot, three frames");
    assert!(receiver.try_recv().is_ok());
    assert!(receiver.try_recv().is_err());
}
