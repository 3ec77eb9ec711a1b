//! Spectrogram of complex samples built on a short-time Fourier transform.
//!
//! The matrix is computed once per parameter set. Anything that changes the
//! transform (samples, window, window size, overlap, floor) goes through a setter
//! that recomputes before committing, so the cached dB values and bounds always
//! describe the current parameters.

use super::Reconfigurable;
use super::stft::{FrameSet, compute_stft};
use super::window::{WindowFunction, WindowKind};
use crate::error::{Result, SpectrogramError};
use crate::render::colormap::Colormap;
use crate::render::image::{GridView, ImageArray, apply_bgra_lookup};
use crate::util::db::{DB_FLOOR, complex_to_db};
use rayon::prelude::*;
use rustfft::num_complex::Complex32;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_FFT_WINDOW_SIZE: usize = 1024;
pub const DEFAULT_OVERLAP_FACTOR: f32 = 0.5;

/// Transform parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramConfig {
    /// DFT length; also the number of frequency bins.
    pub window_size: usize,
    /// 0 = no overlap between frames, approaching 1 = full overlap.
    pub overlap_factor: f32,
    /// Lowest dB value stored; silent or non-finite cells are clamped here.
    pub db_floor: f32,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_FFT_WINDOW_SIZE,
            overlap_factor: DEFAULT_OVERLAP_FACTOR,
            db_floor: DB_FLOOR,
        }
    }
}

impl SpectrogramConfig {
    /// Checks the parameters and returns the hop size they produce.
    pub fn validate(&self) -> Result<usize> {
        if !self.db_floor.is_finite() {
            return Err(SpectrogramError::InvalidParameter(format!(
                "dB floor {} is not finite",
                self.db_floor
            )));
        }
        super::stft::hop_size(self.window_size, self.overlap_factor)
    }
}

/// Log-magnitude values, `[time_bins x freq_bins]` row-major, with zero frequency
/// in the center column.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramMatrix {
    time_bins: usize,
    freq_bins: usize,
    data: Vec<f32>,
    data_min: f32,
    data_max: f32,
}

impl SpectrogramMatrix {
    fn from_frames(frames: &FrameSet, db_floor: f32) -> Self {
        let freq_bins = frames.window_size();
        let time_bins = frames.len();
        let shift = freq_bins / 2;

        let mut data = vec![db_floor; frames.as_slice().len()];
        let non_finite: usize = data
            .par_chunks_mut(freq_bins)
            .zip(frames.as_slice().par_chunks(freq_bins))
            .map(|(row, frame)| {
                let mut non_finite = 0;
                for (bin, value) in frame.iter().enumerate() {
                    if !(value.re.is_finite() && value.im.is_finite()) {
                        non_finite += 1;
                    }
                    row[(bin + shift) % freq_bins] = complex_to_db(*value, db_floor);
                }
                non_finite
            })
            .sum();

        if non_finite > 0 {
            warn!("[spectrogram] {non_finite} non-finite bins clamped to {db_floor} dB");
        }

        let (data_min, data_max) = data
            .par_iter()
            .copied()
            .fold(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |(lo, hi), value| (lo.min(value), hi.max(value)),
            )
            .reduce(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |a, b| (a.0.min(b.0), a.1.max(b.1)),
            );

        Self {
            time_bins,
            freq_bins,
            data,
            data_min,
            data_max,
        }
    }

    pub fn time_bins(&self) -> usize {
        self.time_bins
    }

    pub fn freq_bins(&self) -> usize {
        self.freq_bins
    }

    pub fn data_min(&self) -> f32 {
        self.data_min
    }

    pub fn data_max(&self) -> f32 {
        self.data_max
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, time_bin: usize, freq_bin: usize) -> Option<f32> {
        self.view().get(time_bin, freq_bin)
    }

    /// One time slice across all frequency bins.
    pub fn row(&self, time_bin: usize) -> Option<&[f32]> {
        let start = time_bin.checked_mul(self.freq_bins)?;
        self.data.get(start..start + self.freq_bins)
    }

    pub fn view(&self) -> GridView<'_> {
        GridView::from_matrix(&self.data, self.time_bins, self.freq_bins)
    }
}

pub struct Spectrogram {
    samples: Arc<[Complex32]>,
    sample_rate: f32,
    config: SpectrogramConfig,
    window: Arc<dyn WindowFunction>,
    hop_size: usize,
    matrix: SpectrogramMatrix,
}

impl fmt::Debug for Spectrogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spectrogram")
            .field("samples", &self.samples.len())
            .field("sample_rate", &self.sample_rate)
            .field("config", &self.config)
            .field("hop_size", &self.hop_size)
            .field("time_bins", &self.matrix.time_bins)
            .field("freq_bins", &self.matrix.freq_bins)
            .finish_non_exhaustive()
    }
}

impl Spectrogram {
    /// Builds a spectrogram with a Hann window.
    pub fn new(
        samples: impl Into<Arc<[Complex32]>>,
        sample_rate: f32,
        config: SpectrogramConfig,
    ) -> Result<Self> {
        Self::with_window(samples, sample_rate, config, WindowKind::Hann)
    }

    pub fn with_window(
        samples: impl Into<Arc<[Complex32]>>,
        sample_rate: f32,
        config: SpectrogramConfig,
        window: impl WindowFunction + 'static,
    ) -> Result<Self> {
        let samples = samples.into();
        let window: Arc<dyn WindowFunction> = Arc::new(window);
        let (hop_size, matrix) = compute(&samples, &config, window.as_ref())?;
        Ok(Self {
            samples,
            sample_rate,
            config,
            window,
            hop_size,
            matrix,
        })
    }

    pub fn samples(&self) -> &[Complex32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn config(&self) -> SpectrogramConfig {
        self.config
    }

    pub fn window_size(&self) -> usize {
        self.config.window_size
    }

    pub fn overlap_factor(&self) -> f32 {
        self.config.overlap_factor
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn matrix(&self) -> &SpectrogramMatrix {
        &self.matrix
    }

    pub fn data_min(&self) -> f32 {
        self.matrix.data_min
    }

    pub fn data_max(&self) -> f32 {
        self.matrix.data_max
    }

    pub fn time_bins(&self) -> usize {
        self.matrix.time_bins
    }

    pub fn freq_bins(&self) -> usize {
        self.matrix.freq_bins
    }

    /// Start time of a frame relative to the first sample.
    pub fn frame_time(&self, time_bin: usize) -> Duration {
        duration_from_samples((time_bin * self.hop_size) as u64, self.sample_rate)
    }

    /// Center frequency of a (shifted) bin in Hz; the middle bin is 0 Hz.
    pub fn bin_frequency(&self, freq_bin: usize) -> f32 {
        let bins = self.matrix.freq_bins as f32;
        let offset = freq_bin as f32 - (self.matrix.freq_bins / 2) as f32;
        offset * self.sample_rate / bins
    }

    /// Only affects axis labeling; the matrix doesn't depend on it.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pub fn set_samples(&mut self, samples: impl Into<Arc<[Complex32]>>) -> Result<()> {
        let samples = samples.into();
        let (hop_size, matrix) = compute(&samples, &self.config, self.window.as_ref())?;
        self.samples = samples;
        self.commit(hop_size, matrix);
        Ok(())
    }

    pub fn set_window(&mut self, window: impl WindowFunction + 'static) -> Result<()> {
        let window: Arc<dyn WindowFunction> = Arc::new(window);
        let (hop_size, matrix) = compute(&self.samples, &self.config, window.as_ref())?;
        self.window = window;
        self.commit(hop_size, matrix);
        Ok(())
    }

    /// Renders the matrix normalized to its own bounds.
    pub fn create_spectrogram_image(&self, colormap: &Colormap) -> Result<ImageArray> {
        self.create_spectrogram_image_in_range(colormap, self.data_min(), self.data_max())
    }

    /// Renders the matrix normalized to `[min_db, max_db]` without recomputing the
    /// transform.
    pub fn create_spectrogram_image_in_range(
        &self,
        colormap: &Colormap,
        min_db: f32,
        max_db: f32,
    ) -> Result<ImageArray> {
        apply_bgra_lookup(
            self.matrix.view(),
            colormap,
            Some(min_db),
            Some(max_db),
            true,
        )
    }

    fn commit(&mut self, hop_size: usize, matrix: SpectrogramMatrix) {
        self.hop_size = hop_size;
        self.matrix = matrix;
    }
}

impl Reconfigurable<SpectrogramConfig> for Spectrogram {
    fn update_config(&mut self, config: SpectrogramConfig) -> Result<()> {
        let (hop_size, matrix) = compute(&self.samples, &config, self.window.as_ref())?;
        self.config = config;
        self.commit(hop_size, matrix);
        Ok(())
    }
}

fn compute(
    samples: &[Complex32],
    config: &SpectrogramConfig,
    window: &dyn WindowFunction,
) -> Result<(usize, SpectrogramMatrix)> {
    config.validate()?;
    let frames = compute_stft(
        samples,
        config.window_size,
        config.overlap_factor,
        window,
    )?;
    let matrix = SpectrogramMatrix::from_frames(&frames, config.db_floor);

    debug!(
        "[spectrogram] {}x{} bins, hop={}, range [{:.1}, {:.1}] dB",
        matrix.time_bins,
        matrix.freq_bins,
        frames.hop_size(),
        matrix.data_min,
        matrix.data_max
    );

    Ok((frames.hop_size(), matrix))
}

fn duration_from_samples(sample_index: u64, sample_rate: f32) -> Duration {
    if sample_rate <= 0.0 || !sample_rate.is_finite() {
        return Duration::default();
    }
    let seconds = sample_index as f64 / sample_rate as f64;
    Duration::from_secs_f64(seconds)
}
