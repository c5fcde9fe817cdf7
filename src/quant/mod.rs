//! Uniform scalar quantization with a quality-to-step mapping.

use crate::config::SUPPORTED_BLOCK_SIZES;
use crate::error::{McdcError, Result};

/// Map a quality setting to the uniform quantizer step.
///
/// `step = clamp(101 - quality, 1, 100)`: quality 100 quantizes with step 1,
/// quality 1 with step 100.
pub fn quant_step(quality: u16) -> i32 {
    (101 - i32::from(quality)).clamp(1, 100)
}

fn check_block_layout(len: usize, block_size: u16, what: &str) -> Result<()> {
    if !SUPPORTED_BLOCK_SIZES.contains(&block_size) {
        return Err(McdcError::Validation(format!(
            "{}: block_size must be 8 or 16, got {}",
            what, block_size
        )));
    }
    let block_elems = usize::from(block_size) * usize::from(block_size);
    if len % block_elems != 0 {
        return Err(McdcError::Validation(format!(
            "{}: buffer length {} is not a multiple of {}",
            what, len, block_elems
        )));
    }
    Ok(())
}

/// Quantize DCT coefficients: `q = round(coeff / step)`, clamped to `i16`.
pub fn quantize(coeffs: &[f32], block_size: u16, quality: u16) -> Result<Vec<i16>> {
    check_block_layout(coeffs.len(), block_size, "quantize")?;

    let inv_step = 1.0f32 / quant_step(quality) as f32;
    let qcoeff = coeffs
        .iter()
        .map(|&c| {
            let q = (c * inv_step).round();
            q.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
        })
        .collect();
    Ok(qcoeff)
}

/// Dequantize: `coeff = q · step` as `f32`.
pub fn dequantize(qcoeff: &[i16], block_size: u16, quality: u16) -> Result<Vec<f32>> {
    check_block_layout(qcoeff.len(), block_size, "dequantize")?;

    let step = quant_step(quality) as f32;
    Ok(qcoeff.iter().map(|&q| f32::from(q) * step).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quant_step_mapping() {
        assert_eq!(quant_step(100), 1);
        assert_eq!(quant_step(50), 51);
        assert_eq!(quant_step(1), 100);
        // out-of-range qualities still clamp into [1, 100]
        assert_eq!(quant_step(0), 100);
        assert_eq!(quant_step(200), 1);
    }

    #[test]
    fn test_dequantize_is_step_multiple() {
        let coeffs: Vec<f32> = (0..64).map(|i| i as f32 - 32.0).collect();
        let quality = 50;
        let q = quantize(&coeffs, 8, quality).unwrap();
        let recon = dequantize(&q, 8, quality).unwrap();

        let step = quant_step(quality) as f32;
        for (qi, ri) in q.iter().zip(recon.iter()) {
            assert!((ri - f32::from(*qi) * step).abs() <= 1e-6 * step);
        }
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // step = 2 at quality 99
        let coeffs = vec![1.0f32, -1.0, 3.0, -3.0, 0.9, -0.9, 0.0, 0.0];
        let mut padded = coeffs.clone();
        padded.resize(64, 0.0);
        let q = quantize(&padded, 8, 99).unwrap();
        assert_eq!(&q[..8], &[1, -1, 2, -2, 0, 0, 0, 0]);
    }

    #[test]
    fn test_quantize_clamps_to_i16() {
        let mut coeffs = vec![0.0f32; 64];
        coeffs[0] = 1.0e9;
        coeffs[1] = -1.0e9;
        let q = quantize(&coeffs, 8, 100).unwrap();
        assert_eq!(q[0], i16::MAX);
        assert_eq!(q[1], i16::MIN);
    }

    #[test]
    fn test_rejects_bad_layout() {
        assert!(quantize(&[0.0f32; 63], 8, 50).is_err());
        assert!(dequantize(&[0i16; 64], 9, 50).is_err());
    }
}
