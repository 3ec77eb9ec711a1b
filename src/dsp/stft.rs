//! Short-time Fourier transform over complex sample buffers.

use super::window::WindowFunction;
use crate::error::{Result, SpectrogramError};
use rayon::prelude::*;
use rustfft::{FftPlanner, num_complex::Complex32};
use tracing::debug;

/// Number of samples the window advances between frames.
///
/// `hop = window_size - floor(overlap_factor * window_size)`, rejecting sizes of
/// zero, overlap factors outside `[0, 1)` and any combination that leaves `hop < 1`.
pub fn hop_size(window_size: usize, overlap_factor: f32) -> Result<usize> {
    if window_size == 0 {
        return Err(SpectrogramError::InvalidParameter(
            "window size must be at least 1".into(),
        ));
    }
    if !(0.0..1.0).contains(&overlap_factor) {
        return Err(SpectrogramError::InvalidParameter(format!(
            "overlap factor {overlap_factor} outside [0, 1)"
        )));
    }

    let overlap = (f64::from(overlap_factor) * window_size as f64).floor() as usize;
    match window_size.saturating_sub(overlap) {
        0 => Err(SpectrogramError::InvalidParameter(format!(
            "overlap factor {overlap_factor} leaves no hop for window size {window_size}"
        ))),
        hop => Ok(hop),
    }
}

/// Length after zero-padding so that `(padded - window_size) % hop == 0`.
///
/// The pad is `(hop - (len - window_size) % hop) % hop`, so the last frame always
/// reaches the end of the buffer. Padding by `(len - window_size) % hop` instead
/// can stop short of the tail: 1100 samples with a 1024 window and hop 512 give
/// two frames here, where that scheme gives one.
///
/// Expects `sample_count >= window_size` and `hop >= 1`.
pub fn padded_len(sample_count: usize, window_size: usize, hop: usize) -> usize {
    let remainder = sample_count.saturating_sub(window_size) % hop;
    sample_count + (hop - remainder) % hop
}

/// Frames produced for an already padded buffer.
pub fn frame_count(padded_len: usize, window_size: usize, hop: usize) -> usize {
    padded_len.saturating_sub(window_size) / hop + 1
}

/// Transformed frames stored back to back, earliest first.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    window_size: usize,
    hop_size: usize,
    data: Vec<Complex32>,
}

impl FrameSet {
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.window_size
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&[Complex32]> {
        let start = index.checked_mul(self.window_size)?;
        self.data.get(start..start + self.window_size)
    }

    pub fn frames(&self) -> impl ExactSizeIterator<Item = &[Complex32]> + '_ {
        self.data.chunks_exact(self.window_size)
    }

    pub fn frames_mut(&mut self) -> impl ExactSizeIterator<Item = &mut [Complex32]> + '_ {
        self.data.chunks_exact_mut(self.window_size)
    }

    pub fn as_slice(&self) -> &[Complex32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<Complex32> {
        self.data
    }
}

/// Slices `samples` into overlapping windowed frames and transforms each one.
///
/// Frames past the end of the buffer read zeros. Frames are independent and
/// processed in parallel; the returned set keeps time order.
pub fn compute_stft(
    samples: &[Complex32],
    window_size: usize,
    overlap_factor: f32,
    window: &dyn WindowFunction,
) -> Result<FrameSet> {
    let hop = hop_size(window_size, overlap_factor)?;

    if samples.len() < window_size {
        return Err(SpectrogramError::MalformedSampleInput(format!(
            "{} samples is shorter than the window size {window_size}",
            samples.len()
        )));
    }

    let weights = window.weights(window_size);
    if weights.len() != window_size {
        return Err(SpectrogramError::MalformedSampleInput(format!(
            "window function returned {} weights, expected {window_size}",
            weights.len()
        )));
    }

    let padded = padded_len(samples.len(), window_size, hop);
    let num_frames = frame_count(padded, window_size, hop);

    let fft = FftPlanner::<f32>::new().plan_fft_forward(window_size);
    let scratch_len = fft.get_inplace_scratch_len();

    let mut data = vec![Complex32::default(); num_frames * window_size];
    data.par_chunks_mut(window_size).enumerate().for_each_init(
        || vec![Complex32::default(); scratch_len],
        |scratch, (index, frame)| {
            let start = index * hop;
            for (offset, (slot, weight)) in frame.iter_mut().zip(&weights).enumerate() {
                let sample = samples.get(start + offset).copied().unwrap_or_default();
                *slot = sample * *weight;
            }
            fft.process_with_scratch(frame, scratch);
        },
    );

    debug!(
        "[stft] {} samples (padded {padded}) -> {num_frames} frames, window={window_size}, hop={hop}",
        samples.len()
    );

    Ok(FrameSet {
        window_size,
        hop_size: hop,
        data,
    })
}
