// Spectrogram settings and persistence.

mod persistence;

pub use persistence::SettingsManager;

use crate::dsp::spectrogram::{Spectrogram, SpectrogramConfig};
use crate::dsp::window::WindowKind;
use crate::error::Result;
use crate::render::colormap::{Colormap, ColormapRegistry, DEFAULT_COLORMAP};
use rustfft::num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub const MIN_WINDOW_SIZE: usize = 1;
pub const MAX_WINDOW_SIZE: usize = 1 << 16;

/// User-facing spectrogram parameters as persisted to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramSettings {
    pub window_size: usize,
    pub overlap_factor: f32,
    pub window: WindowKind,
    pub db_floor: f32,
    pub colormap: String,
}

impl Default for SpectrogramSettings {
    fn default() -> Self {
        Self::from_config(&SpectrogramConfig::default(), WindowKind::default())
    }
}

impl SpectrogramSettings {
    pub fn from_config(cfg: &SpectrogramConfig, window: WindowKind) -> Self {
        Self {
            window_size: cfg.window_size,
            overlap_factor: cfg.overlap_factor,
            window,
            db_floor: cfg.db_floor,
            colormap: DEFAULT_COLORMAP.to_owned(),
        }
    }

    pub fn apply_to(&self, cfg: &mut SpectrogramConfig) {
        cfg.window_size = self.window_size;
        cfg.overlap_factor = self.overlap_factor;
        cfg.db_floor = self.db_floor;
    }

    pub fn to_config(&self) -> SpectrogramConfig {
        let mut cfg = SpectrogramConfig::default();
        self.apply_to(&mut cfg);
        cfg
    }

    /// Computes a spectrogram of `samples` with these parameters and window.
    pub fn build(
        &self,
        samples: impl Into<Arc<[Complex32]>>,
        sample_rate: f32,
    ) -> Result<Spectrogram> {
        Spectrogram::with_window(samples, sample_rate, self.to_config(), self.window)
    }

    /// Replaces values a transform would reject with their defaults.
    pub fn sanitize(&mut self) {
        let defaults = SpectrogramConfig::default();
        self.window_size = self.window_size.clamp(MIN_WINDOW_SIZE, MAX_WINDOW_SIZE);
        if !(0.0..1.0).contains(&self.overlap_factor) {
            self.overlap_factor = defaults.overlap_factor;
        }
        if !self.db_floor.is_finite() {
            self.db_floor = defaults.db_floor;
        }
        if self.colormap.trim().is_empty() {
            self.colormap = DEFAULT_COLORMAP.to_owned();
        }
    }

    /// The configured colormap, or the registry default when the name is unknown.
    pub fn resolve_colormap<'a>(&self, registry: &'a ColormapRegistry) -> &'a Colormap {
        registry.get(&self.colormap).unwrap_or_else(|err| {
            warn!("[settings] {err}; using '{DEFAULT_COLORMAP}'");
            registry.default_colormap()
        })
    }
}
