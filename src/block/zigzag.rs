//! Zigzag scan: block reordering to low-to-high frequency order.

use crate::config::SUPPORTED_BLOCK_SIZES;
use crate::error::{McdcError, Result};

/// Build the zigzag permutation for an `n` × `n` block.
///
/// Walks the antidiagonals `u + v = s` from `s = 0` to `2(n - 1)`, alternating
/// direction: even `s` reads cells `(s - x, x)` with `x` ascending, odd `s`
/// reads `(y, s - y)` with `y` ascending; out-of-range cells are skipped.
/// For `n = 8` this is the standard JPEG zigzag.
pub fn make_zigzag_order(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n * n);
    for s in 0..=2 * (n - 1) {
        if s % 2 == 0 {
            for x in 0..=s {
                let y = s - x;
                if x < n && y < n {
                    order.push(y * n + x);
                }
            }
        } else {
            for y in 0..=s {
                let x = s - y;
                if x < n && y < n {
                    order.push(y * n + x);
                }
            }
        }
    }
    order
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

/// Reorder each block of quantized coefficients into zigzag order.
pub fn zigzag_scan_blocks(qcoeff: &[i16], block_size: u16) -> Result<Vec<i16>> {
    let block_elems = check_block_layout(qcoeff.len(), block_size, "zigzag_scan_blocks")?;
    let order = make_zigzag_order(usize::from(block_size));

    let mut seq = vec![0i16; qcoeff.len()];
    for (src, dst) in qcoeff
        .chunks_exact(block_elems)
        .zip(seq.chunks_exact_mut(block_elems))
    {
        for (i, &pos) in order.iter().enumerate() {
            dst[i] = src[pos];
        }
    }
    Ok(seq)
}

/// Place each zigzag-ordered block back into raster order.
pub fn inverse_zigzag_blocks(seq: &[i16], block_size: u16) -> Result<Vec<i16>> {
    let block_elems = check_block_layout(seq.len(), block_size, "inverse_zigzag_blocks")?;
    let order = make_zigzag_order(usize::from(block_size));

    let mut qcoeff = vec![0i16; seq.len()];
    for (src, dst) in seq
        .chunks_exact(block_elems)
        .zip(qcoeff.chunks_exact_mut(block_elems))
    {
        for (i, &pos) in order.iter().enumerate() {
            dst[pos] = src[i];
        }
    }
    Ok(qcoeff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_a_permutation() {
        for n in [8usize, 16] {
            let order = make_zigzag_order(n);
            assert_eq!(order.len(), n * n);
            let mut seen = vec![false; n * n];
            for &pos in &order {
                assert!(!seen[pos]);
                seen[pos] = true;
            }
        }
    }

    #[test]
    fn test_order_matches_jpeg_for_8x8() {
        let order = make_zigzag_order(8);
        // First and last antidiagonals of the standard JPEG zigzag.
        assert_eq!(&order[..10], &[0, 1, 8, 16, 9, 2, 3, 10, 17, 24]);
        assert_eq!(&order[54..], &[47, 55, 62, 63]);
    }

    #[test]
    fn test_scan_roundtrip() {
        for n in [8u16, 16] {
            let elems = usize::from(n) * usize::from(n);
            // two blocks with distinct contents
            let src: Vec<i16> = (0..2 * elems as i16).map(|i| i * 3 - 100).collect();
            let seq = zigzag_scan_blocks(&src, n).unwrap();
            let recon = inverse_zigzag_blocks(&seq, n).unwrap();
            assert_eq!(recon, src);
        }
    }

    #[test]
    fn test_scan_places_dc_first() {
        let mut block = vec![0i16; 64];
        block[0] = 42; // DC in raster order
        block[1] = 7; // (0,1)
        block[8] = -3; // (1,0)
        let seq = zigzag_scan_blocks(&block, 8).unwrap();
        assert_eq!(&seq[..3], &[42, 7, -3]);
    }

    #[test]
    fn test_rejects_bad_layout() {
        assert!(zigzag_scan_blocks(&[0i16; 63], 8).is_err());
        assert!(inverse_zigzag_blocks(&[0i16; 65], 8).is_err());
        assert!(zigzag_scan_blocks(&[0i16; 64], 4).is_err());
    }
}
