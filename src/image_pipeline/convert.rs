//! Conversions between 8-bit samples and the normalized floats the
//! denoiser works on.

/// Full scale of an 8-bit sample.
const U8_SCALE: f32 = 255.0;

/// Maps 8-bit samples to `[0, 1]`.
pub fn normalize_u8(samples: &[u8]) -> Vec<f32> {
    samples.iter().map(|&v| f32::from(v) / U8_SCALE).collect()
}

/// Maps 8-bit samples to shading normals in `[-1, 1]`.
pub fn normals_from_u8(samples: &[u8]) -> Vec<f32> {
    samples
        .iter()
        .map(|&v| f32::from(v) / U8_SCALE * 2.0 - 1.0)
        .collect()
}

/// Scales normalized floats back to 8 bits.
///
/// Values are clamped to the representable range before the fractional
/// part is truncated, so filter overshoot saturates instead of wrapping.
/// NaN becomes zero.
pub fn quantize_to_u8(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|&v| (v * U8_SCALE).clamp(0.0, U8_SCALE) as u8)
        .collect()
}
