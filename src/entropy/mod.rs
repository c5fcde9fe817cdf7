//! Entropy coding: zero run-length coding, symbol packing and canonical
//! Huffman.
//!
//! The scanned coefficient sequence is first turned into (value, run) pairs,
//! packed into 32-bit symbols, then entropy-coded with a canonical Huffman
//! code whose table travels in the container as (symbol, length) entries.

mod huffman;
mod rle;

pub use huffman::{
    huff_decode, huff_encode, rebuild_table_from_lengths, BitReader, BitWriter, HuffTable,
    MAX_CODE_LENGTH,
};
pub use rle::{pack_symbols, rle_decode_zeros, rle_encode_zeros, unpack_symbols, RlePair};
