//! Spectrogram core for complex (I/Q) sample buffers.
//!
//! A [`Spectrogram`] runs a windowed STFT over the samples, converts the result to
//! a centered log-magnitude matrix and renders it to BGRA pixels through a
//! [`Colormap`] lookup table.

pub mod dsp;
pub mod error;
pub mod render;
pub mod settings;
pub mod util;

pub use dsp::spectrogram::{Spectrogram, SpectrogramConfig, SpectrogramMatrix};
pub use dsp::stft::{FrameSet, compute_stft};
pub use dsp::window::{WindowFunction, WindowKind};
pub use dsp::Reconfigurable;
pub use error::{Result, SpectrogramError};
pub use render::colormap::{Bgra, Colormap, ColormapRegistry};
pub use render::image::{GridView, ImageArray, apply_bgra_lookup, create_colormap_image};
pub use rustfft::num_complex::Complex32;

#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
