//! Separable orthonormal 2-D DCT-II and its inverse.
//!
//! Both transforms operate block-by-block on block-contiguous buffers and are
//! exact inverses of each other on integer data within the codec's dynamic
//! range. Accumulation happens in `f64`; coefficients are stored as `f32`.
//! The per-size cosine and normalization tables are computed once on first
//! use and published immutably.
//!
//! Blocks are independent, so they are transformed in parallel; the output is
//! bit-identical to the sequential loop.

use std::sync::OnceLock;

use rayon::prelude::*;

use crate::config::SUPPORTED_BLOCK_SIZES;
use crate::error::{McdcError, Result};

/// Trigonometric tables for one transform size.
///
/// `cosine[u * n + x] = cos((2x + 1) · u · π / 2n)`;
/// `alpha[0] = sqrt(1/n)`, `alpha[u > 0] = sqrt(2/n)`.
struct DctTables {
    n: usize,
    cosine: Vec<f64>,
    alpha: Vec<f64>,
}

impl DctTables {
    fn build(n: usize) -> Self {
        let mut cosine = vec![0.0f64; n * n];
        let mut alpha = vec![0.0f64; n];
        let factor = std::f64::consts::PI / (2.0 * n as f64);
        for u in 0..n {
            alpha[u] = if u == 0 {
                (1.0 / n as f64).sqrt()
            } else {
                (2.0 / n as f64).sqrt()
            };
            for x in 0..n {
                cosine[u * n + x] = (((2 * x + 1) * u) as f64 * factor).cos();
            }
        }
        Self { n, cosine, alpha }
    }
}

static DCT_TABLES_8: OnceLock<DctTables> = OnceLock::new();
static DCT_TABLES_16: OnceLock<DctTables> = OnceLock::new();

fn tables_for(block_size: u16) -> &'static DctTables {
    match block_size {
        8 => DCT_TABLES_8.get_or_init(|| DctTables::build(8)),
        _ => DCT_TABLES_16.get_or_init(|| DctTables::build(16)),
    }
}

fn check_block_layout(len: usize, block_size: u16, what: &str) -> Result<usize> {
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
    Ok(block_elems)
}

/// Forward DCT-II over every block of a block-contiguous `i32` buffer.
///
/// `F(v,u) = α(v)·α(u)·Σ_x Σ_y f(y,x)·C(u,x)·C(v,y)` with orthonormal scaling.
pub fn forward_dct_blocks(blocks: &[i32], block_size: u16) -> Result<Vec<f32>> {
    let block_elems = check_block_layout(blocks.len(), block_size, "forward_dct_blocks")?;
    let tables = tables_for(block_size);
    let n = tables.n;

    let mut coeffs = vec![0.0f32; blocks.len()];
    coeffs
        .par_chunks_mut(block_elems)
        .zip(blocks.par_chunks(block_elems))
        .for_each(|(dst, src)| {
            let cos = &tables.cosine;
            let alpha = &tables.alpha;
            let mut tmp = vec![0.0f64; block_elems];

            // Row pass: tmp[y, u]
            for y in 0..n {
                for u in 0..n {
                    let mut sum = 0.0f64;
                    for x in 0..n {
                        sum += f64::from(src[y * n + x]) * cos[u * n + x];
                    }
                    tmp[y * n + u] = sum * alpha[u];
                }
            }

            // Column pass: dst[v, u]
            for v in 0..n {
                for u in 0..n {
                    let mut sum = 0.0f64;
                    for y in 0..n {
                        sum += tmp[y * n + u] * cos[v * n + y];
                    }
                    dst[v * n + u] = (sum * alpha[v]) as f32;
                }
            }
        });
    Ok(coeffs)
}

/// Inverse DCT over every block, rounding half away from zero and clamping
/// to the `i32` range.
///
/// `f(y,x) = Σ_u Σ_v α(u)·α(v)·F(v,u)·C(u,x)·C(v,y)`.
pub fn inverse_dct_blocks(coeffs: &[f32], block_size: u16) -> Result<Vec<i32>> {
    let block_elems = check_block_layout(coeffs.len(), block_size, "inverse_dct_blocks")?;
    let tables = tables_for(block_size);
    let n = tables.n;

    let mut blocks = vec![0i32; coeffs.len()];
    blocks
        .par_chunks_mut(block_elems)
        .zip(coeffs.par_chunks(block_elems))
        .for_each(|(dst, src)| {
            let cos = &tables.cosine;
            let alpha = &tables.alpha;
            let mut tmp = vec![0.0f64; block_elems];

            // Column pass: tmp[y, u] = Σ_v α(v)·C(v,y)·F(v,u)
            for u in 0..n {
                for y in 0..n {
                    let mut sum = 0.0f64;
                    for v in 0..n {
                        sum += alpha[v] * f64::from(src[v * n + u]) * cos[v * n + y];
                    }
                    tmp[y * n + u] = sum;
                }
            }

            // Row pass: dst[y, x] = Σ_u α(u)·C(u,x)·tmp[y, u]
            for y in 0..n {
                for x in 0..n {
                    let mut sum = 0.0f64;
                    for u in 0..n {
                        sum += alpha[u] * tmp[y * n + u] * cos[u * n + x];
                    }
                    let rounded = sum.round();
                    dst[y * n + x] = if rounded >= f64::from(i32::MAX) {
                        i32::MAX
                    } else if rounded <= f64::from(i32::MIN) {
                        i32::MIN
                    } else {
                        rounded as i32
                    };
                }
            }
        });
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic xorshift so test data does not depend on external crates.
    fn xorshift(state: &mut u32) -> u32 {
        let mut x = *state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        *state = x;
        x
    }

    #[test]
    fn test_dc_only_block() {
        // Constant block: all energy lands in the DC coefficient.
        let block = vec![100i32; 64];
        let coeffs = forward_dct_blocks(&block, 8).unwrap();
        assert!((coeffs[0] - 800.0).abs() < 1e-3); // 100 * sqrt(64)
        for &c in &coeffs[1..] {
            assert!(c.abs() < 1e-3);
        }
    }

    #[test]
    fn test_roundtrip_identity_on_ramp() {
        let block: Vec<i32> = (0..64).collect();
        let coeffs = forward_dct_blocks(&block, 8).unwrap();
        let recon = inverse_dct_blocks(&coeffs, 8).unwrap();
        assert_eq!(recon, block);
    }

    #[test]
    fn test_roundtrip_identity_on_random_blocks() {
        let mut state = 0x1234_5678u32;
        for n in [8u16, 16] {
            let elems = usize::from(n) * usize::from(n);
            // four blocks of values spanning the 16-bit signed pixel domain
            let blocks: Vec<i32> = (0..4 * elems)
                .map(|_| (xorshift(&mut state) % 65536) as i32 - 32768)
                .collect();
            let coeffs = forward_dct_blocks(&blocks, n).unwrap();
            let recon = inverse_dct_blocks(&coeffs, n).unwrap();
            assert_eq!(recon, blocks);
        }
    }

    #[test]
    fn test_roundtrip_identity_at_large_magnitude() {
        // Well beyond any pixel domain the codec produces, still exact.
        let mut state = 0x9e37_79b9u32;
        let blocks: Vec<i32> = (0..64)
            .map(|_| (xorshift(&mut state) % (1 << 21)) as i32 - (1 << 20))
            .collect();
        let coeffs = forward_dct_blocks(&blocks, 8).unwrap();
        let recon = inverse_dct_blocks(&coeffs, 8).unwrap();
        assert_eq!(recon, blocks);

        let constant = vec![1i32 << 24; 64];
        let coeffs = forward_dct_blocks(&constant, 8).unwrap();
        let recon = inverse_dct_blocks(&coeffs, 8).unwrap();
        assert_eq!(recon, constant);
    }

    #[test]
    fn test_rejects_bad_layout() {
        assert!(forward_dct_blocks(&[0i32; 63], 8).is_err());
        assert!(inverse_dct_blocks(&[0.0f32; 64], 12).is_err());
    }
}
