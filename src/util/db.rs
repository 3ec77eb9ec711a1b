// decibel conversion constants/utils

use rustfft::num_complex::Complex32;

// Floor value (dB) below which magnitudes are clamped. Silent input lands here
// instead of -inf so min/max and normalization stay finite.
pub const DB_FLOOR: f32 = -160.0;

// Minimum power value to avoid log(0); sits below any floor we accept.
const POWER_EPSILON: f64 = 1.0e-30;

// Natural log to decibel conversion factor for power: 10 / ln(10) ~= 4.342944819.
const LN_TO_DB: f64 = 4.342_944_819_032_518;

// Convert power (magnitude squared) to decibels with a custom floor.
// Non-finite or vanishing power maps to the floor.
#[inline(always)]
pub fn power_to_db(power: f64, floor: f32) -> f32 {
    if power > POWER_EPSILON && power.is_finite() {
        ((power.ln() * LN_TO_DB) as f32).max(floor)
    } else {
        floor
    }
}

// 20 * log10(|value|). The square is taken in f64 so no finite f32 input overflows.
#[inline(always)]
pub fn complex_to_db(value: Complex32, floor: f32) -> f32 {
    let (re, im) = (f64::from(value.re), f64::from(value.im));
    power_to_db(re * re + im * im, floor)
}
