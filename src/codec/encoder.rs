//! Container encoder: image in, MCDC bytes out.

use crate::block::{tile_to_blocks, zigzag_scan_blocks, BlockGrid};
use crate::config::CodecConfig;
use crate::entropy::{huff_encode, pack_symbols, rle_encode_zeros};
use crate::error::{McdcError, Result};
use crate::format::{
    patch_payload_bytes, ByteWriter, McdcHeader, FLAG_LEVEL_SHIFT, FORMAT_VERSION, HEADER_BYTES,
};
use crate::preprocess::apply_level_shift;
use crate::quant::quantize;
use crate::transform::forward_dct_blocks;
use crate::Image;

/// Encode an image into a self-contained MCDC byte buffer.
///
/// The pipeline is level shift → tile → forward DCT → quantize → zigzag →
/// zero-RLE → symbol packing → canonical Huffman, framed by the 32-byte
/// header and the payload section
/// `[symbol_count][used_symbol_count][entries][huffman bits]`.
///
/// Fails on non-grayscale input, zero dimensions, a mismatched pixel buffer,
/// quality outside 1..=100, or an empty Huffman table.
pub fn encode_to_container(image: &Image, quality: u16) -> Result<Vec<u8>> {
    let config = CodecConfig::with_quality(quality);
    config.validate()?;
    image.validate()?;

    let block_size = config.block_size;

    // Header fields describe the original input; the level shift below only
    // affects the working copy.
    let original_signed = image.is_signed;
    let level_shift_applied = !image.is_signed;

    let mut working = image.clone();
    apply_level_shift(&mut working)?;

    let grid = BlockGrid::new(working.width, working.height, block_size)?;
    let padded = tile_to_blocks(&working, &grid)?;
    log::debug!(
        "encode: {}x{} -> padded {}x{} ({} blocks of {})",
        working.width,
        working.height,
        grid.padded_w,
        grid.padded_h,
        grid.block_count(),
        block_size
    );

    let coeffs = forward_dct_blocks(&padded, block_size)?;
    let qcoeff = quantize(&coeffs, block_size, quality)?;
    let seq = zigzag_scan_blocks(&qcoeff, block_size)?;
    let pairs = rle_encode_zeros(&seq, block_size)?;
    let symbols = pack_symbols(&pairs);
    log::debug!(
        "encode: {} coefficients -> {} RLE symbols",
        seq.len(),
        symbols.len()
    );

    let (table, huff_bits) = huff_encode(&symbols)?;
    let entries = table.serialized_entries();
    if entries.is_empty() {
        return Err(McdcError::Validation(
            "encode: no used symbols for Huffman table".to_string(),
        ));
    }

    let symbol_count = u32::try_from(symbols.len())
        .map_err(|_| McdcError::Validation("encode: symbol count overflow".to_string()))?;
    let used_symbol_count = entries.len() as u32;

    // Payload = counts, (symbol, length) entries, then the Huffman bits.
    let table_section_bytes = 4 + 4 + entries.len() * 5;
    let payload_bytes = (table_section_bytes + huff_bits.len()) as u32;

    let header = McdcHeader {
        version: FORMAT_VERSION,
        header_bytes: HEADER_BYTES,
        width: image.width,
        height: image.height,
        channels: image.channels,
        bits_allocated: image.bits_allocated,
        bits_stored: image.bits_stored,
        is_signed: original_signed,
        flags: if level_shift_applied {
            FLAG_LEVEL_SHIFT
        } else {
            0
        },
        block_size,
        quality,
        payload_bytes: 0, // patched below
    };

    let mut w = ByteWriter::new();
    header.write(&mut w);
    w.write_u32_le(symbol_count);
    w.write_u32_le(used_symbol_count);
    for &(symbol, len) in &entries {
        w.write_u32_le(symbol);
        w.write_u8(len);
    }
    w.write_bytes(&huff_bits);

    let mut bytes = w.into_bytes();
    patch_payload_bytes(&mut bytes, payload_bytes)?;
    debug_assert_eq!(bytes.len(), usize::from(HEADER_BYTES) + payload_bytes as usize);

    log::debug!(
        "encode: quality {} -> {} bytes ({} table entries, {} huffman bytes)",
        quality,
        bytes.len(),
        used_symbol_count,
        huff_bits.len()
    );
    Ok(bytes)
}
