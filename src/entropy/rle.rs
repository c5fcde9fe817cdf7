//! Zero run-length coding of scanned coefficient blocks.
//!
//! Each block starts with its DC coefficient emitted verbatim as `(dc, 0)`.
//! The remaining AC coefficients are encoded as `(value, run)` pairs where
//! `run` counts the zeros preceding `value`. A block's trailing zeros become a
//! `(0, run - 1)` pair: the pair's own zero value supplies the final zero, so
//! the decoder reconstructs exactly `run` of them.

use crate::config::SUPPORTED_BLOCK_SIZES;
use crate::error::{McdcError, Result};

/// One run-length pair: `run` zeros followed by `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlePair {
    /// The coefficient value terminating the run.
    pub value: i16,
    /// Number of zeros preceding `value` in the reconstruction.
    pub run: u16,
}

/// Encode a block-contiguous scanned sequence into run-length pairs.
pub fn rle_encode_zeros(seq: &[i16], block_size: u16) -> Result<Vec<RlePair>> {
    if !SUPPORTED_BLOCK_SIZES.contains(&block_size) {
        return Err(McdcError::Validation(format!(
            "rle_encode_zeros: block_size must be 8 or 16, got {}",
            block_size
        )));
    }
    let block_elems = usize::from(block_size) * usize::from(block_size);
    if seq.len() % block_elems != 0 {
        return Err(McdcError::Validation(format!(
            "rle_encode_zeros: buffer length {} is not a multiple of {}",
            seq.len(),
            block_elems
        )));
    }

    let mut pairs = Vec::with_capacity(seq.len());
    for block in seq.chunks_exact(block_elems) {
        // DC is always emitted verbatim.
        pairs.push(RlePair {
            value: block[0],
            run: 0,
        });

        let mut run: u16 = 0;
        for &v in &block[1..] {
            if v == 0 {
                if run == u16::MAX {
                    // A (0, run) pair reconstructs run + 1 zeros, so the
                    // saturated counter plus this zero are exactly covered.
                    pairs.push(RlePair {
                        value: 0,
                        run: u16::MAX,
                    });
                    run = 0;
                } else {
                    run += 1;
                }
            } else {
                pairs.push(RlePair { value: v, run });
                run = 0;
            }
        }
        if run > 0 {
            pairs.push(RlePair {
                value: 0,
                run: run - 1,
            });
        }
    }
    Ok(pairs)
}

/// Decode run-length pairs back into a sequence of exactly `total_coeffs`
/// coefficients.
///
/// Block-agnostic: each pair expands to `run` zeros followed by its value.
/// Over- or undershooting `total_coeffs` is an error.
pub fn rle_decode_zeros(pairs: &[RlePair], total_coeffs: usize) -> Result<Vec<i16>> {
    let mut seq = Vec::with_capacity(total_coeffs);
    for pair in pairs {
        seq.resize(seq.len() + usize::from(pair.run), 0i16);
        seq.push(pair.value);
        if seq.len() > total_coeffs {
            return Err(McdcError::Truncation(format!(
                "rle_decode_zeros: output exceeds expected {} coefficients",
                total_coeffs
            )));
        }
    }
    if seq.len() != total_coeffs {
        return Err(McdcError::Truncation(format!(
            "rle_decode_zeros: produced {} of {} coefficients",
            seq.len(),
            total_coeffs
        )));
    }
    Ok(seq)
}

/// Pack pairs into 32-bit symbols: `(run << 16) | (value as u16)`.
pub fn pack_symbols(pairs: &[RlePair]) -> Vec<u32> {
    pairs
        .iter()
        .map(|p| (u32::from(p.run) << 16) | u32::from(p.value as u16))
        .collect()
}

/// Unpack 32-bit symbols back into pairs, reinterpreting the low half as
/// signed.
pub fn unpack_symbols(symbols: &[u32]) -> Vec<RlePair> {
    symbols
        .iter()
        .map(|&s| RlePair {
            value: (s & 0xFFFF) as u16 as i16,
            run: (s >> 16) as u16,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_block_roundtrip() {
        let mut block = vec![0i16; 64];
        block[0] = 5;
        block[5] = -3;
        block[12] = 7;
        block[63] = -1;

        let pairs = rle_encode_zeros(&block, 8).unwrap();
        let recon = rle_decode_zeros(&pairs, 64).unwrap();
        assert_eq!(recon, block);
    }

    #[test]
    fn test_all_zero_block_pairs() {
        // DC pair followed by the trailing-zeros marker storing run - 1.
        let block = vec![0i16; 64];
        let pairs = rle_encode_zeros(&block, 8).unwrap();
        assert_eq!(
            pairs,
            vec![RlePair { value: 0, run: 0 }, RlePair { value: 0, run: 62 }]
        );
        assert_eq!(rle_decode_zeros(&pairs, 64).unwrap(), block);
    }

    #[test]
    fn test_single_nonzero_at_block_end() {
        // Exercises the trailing convention boundary: no trailing pair at all.
        let mut block = vec![0i16; 64];
        block[0] = 9;
        block[63] = 4;
        let pairs = rle_encode_zeros(&block, 8).unwrap();
        assert_eq!(
            pairs,
            vec![RlePair { value: 9, run: 0 }, RlePair { value: 4, run: 62 }]
        );
        assert_eq!(rle_decode_zeros(&pairs, 64).unwrap(), block);
    }

    #[test]
    fn test_multi_block_roundtrip() {
        let mut seq = vec![0i16; 3 * 64];
        seq[0] = 1;
        seq[64] = -2;
        seq[70] = 30;
        seq[128] = 3;
        seq[191] = -7;
        let pairs = rle_encode_zeros(&seq, 8).unwrap();
        assert_eq!(rle_decode_zeros(&pairs, seq.len()).unwrap(), seq);
    }

    #[test]
    fn test_run_split_pairs_roundtrip() {
        // In-block runs never reach the saturation point, but the split pair
        // must still decode consistently: (0, 0xFFFF) is 65_536 zeros.
        let pairs = vec![
            RlePair { value: 0, run: 0 },
            RlePair {
                value: 0,
                run: u16::MAX,
            },
            RlePair {
                value: 0,
                run: u16::MAX,
            },
            RlePair { value: 5, run: 10 },
        ];
        let total = 1 + 2 * 65_536 + 11;
        let seq = rle_decode_zeros(&pairs, total).unwrap();
        assert_eq!(seq.len(), total);
        assert_eq!(seq[total - 1], 5);
        assert!(seq[..total - 1].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_decode_rejects_overshoot_and_undershoot() {
        let pairs = vec![RlePair { value: 1, run: 4 }];
        assert!(rle_decode_zeros(&pairs, 3).is_err());
        assert!(rle_decode_zeros(&pairs, 6).is_err());
        assert!(rle_decode_zeros(&pairs, 5).is_ok());
    }

    #[test]
    fn test_encode_rejects_bad_layout() {
        assert!(rle_encode_zeros(&[0i16; 65], 8).is_err());
        assert!(rle_encode_zeros(&[0i16; 64], 12).is_err());
    }

    #[test]
    fn test_pack_unpack_bijection() {
        let pairs = vec![
            RlePair { value: 0, run: 0 },
            RlePair {
                value: -1,
                run: 63,
            },
            RlePair {
                value: i16::MIN,
                run: u16::MAX,
            },
            RlePair {
                value: i16::MAX,
                run: 1,
            },
            RlePair {
                value: -32000,
                run: 500,
            },
        ];
        let symbols = pack_symbols(&pairs);
        assert_eq!(symbols[0], 0);
        assert_eq!(symbols[1], (63 << 16) | 0xFFFF);
        assert_eq!(unpack_symbols(&symbols), pairs);
    }
}
