//! Conversions from interleaved I/Q buffers into complex samples.
//!
//! Each helper pairs consecutive values as (in-phase, quadrature); a dangling
//! final value is dropped.

use rustfft::num_complex::Complex32;

const I16_SCALE: f32 = 1.0 / 32_768.0;
const U8_CENTER: f32 = 127.5;

pub fn from_interleaved_f32(data: &[f32]) -> Vec<Complex32> {
    data.chunks_exact(2)
        .map(|pair| Complex32::new(pair[0], pair[1]))
        .collect()
}

pub fn from_interleaved_f64(data: &[f64]) -> Vec<Complex32> {
    data.chunks_exact(2)
        .map(|pair| Complex32::new(pair[0] as f32, pair[1] as f32))
        .collect()
}

/// Signed 16-bit pairs scaled to `[-1, 1)`.
pub fn from_interleaved_i16(data: &[i16]) -> Vec<Complex32> {
    data.chunks_exact(2)
        .map(|pair| Complex32::new(pair[0] as f32 * I16_SCALE, pair[1] as f32 * I16_SCALE))
        .collect()
}

/// Offset-binary 8-bit pairs (RTL-SDR style) centered on 127.5 and scaled to `[-1, 1]`.
pub fn from_interleaved_u8(data: &[u8]) -> Vec<Complex32> {
    let scale = |value: u8| (value as f32 - U8_CENTER) / U8_CENTER;
    data.chunks_exact(2)
        .map(|pair| Complex32::new(scale(pair[0]), scale(pair[1])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_float_values() {
        let samples = from_interleaved_f32(&[1.0, -1.0, 0.5, 0.25, 9.0]);
        assert_eq!(samples, vec![Complex32::new(1.0, -1.0), Complex32::new(0.5, 0.25)]);

        let samples = from_interleaved_f64(&[0.125, 2.0]);
        assert_eq!(samples, vec![Complex32::new(0.125, 2.0)]);
    }

    #[test]
    fn scales_signed_integers() {
        let samples = from_interleaved_i16(&[i16::MIN, 0, 16_384, -16_384]);
        assert_eq!(samples[0], Complex32::new(-1.0, 0.0));
        assert_eq!(samples[1], Complex32::new(0.5, -0.5));
    }

    #[test]
    fn centers_unsigned_bytes() {
        let samples = from_interleaved_u8(&[0, 255, 127, 128]);
        assert_eq!(samples[0], Complex32::new(-1.0, 1.0));
        assert!((samples[1].re + 0.5 / U8_CENTER).abs() < 1e-6);
        assert!((samples[1].im - 0.5 / U8_CENTER).abs() < 1e-6);
    }
}
