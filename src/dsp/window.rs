//! Window functions applied to each STFT frame.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Strategy producing the weights multiplied into every frame.
///
/// Implementations must return exactly `len` weights; the STFT engine rejects
/// anything else.
pub trait WindowFunction: Send + Sync {
    fn weights(&self, len: usize) -> Vec<f32>;
}

impl<F> WindowFunction for F
where
    F: Fn(usize) -> Vec<f32> + Send + Sync,
{
    fn weights(&self, len: usize) -> Vec<f32> {
        self(len)
    }
}

/// Built-in symmetric windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Rectangular,
    #[default]
    Hann,
    Hamming,
    Blackman,
    Bartlett,
}

impl WindowKind {
    pub const ALL: [WindowKind; 5] = [
        WindowKind::Rectangular,
        WindowKind::Hann,
        WindowKind::Hamming,
        WindowKind::Blackman,
        WindowKind::Bartlett,
    ];

    pub fn coefficients(self, len: usize) -> Vec<f32> {
        match len {
            0 => return Vec::new(),
            1 => return vec![1.0],
            _ => {}
        }

        let span = (len - 1) as f64;
        let weight = |n: usize| -> f64 {
            let phase = n as f64 * TAU / span;
            match self {
                WindowKind::Rectangular => 1.0,
                WindowKind::Hann => 0.5 - 0.5 * phase.cos(),
                WindowKind::Hamming => 0.54 - 0.46 * phase.cos(),
                WindowKind::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
                WindowKind::Bartlett => 1.0 - (2.0 * n as f64 / span - 1.0).abs(),
            }
        };

        (0..len).map(|n| weight(n) as f32).collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            WindowKind::Rectangular => "Rectangular",
            WindowKind::Hann => "Hann",
            WindowKind::Hamming => "Hamming",
            WindowKind::Blackman => "Blackman",
            WindowKind::Bartlett => "Bartlett",
        }
    }
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl WindowFunction for WindowKind {
    fn weights(&self, len: usize) -> Vec<f32> {
        self.coefficients(len)
    }
}
