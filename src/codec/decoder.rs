//! Container decoder: MCDC bytes in, image out.

use crate::block::{inverse_zigzag_blocks, untile_from_blocks, BlockGrid};
use crate::entropy::{huff_decode, rebuild_table_from_lengths, rle_decode_zeros, unpack_symbols};
use crate::error::{McdcError, Result};
use crate::format::{ByteReader, McdcHeader};
use crate::preprocess::inverse_level_shift;
use crate::quant::dequantize;
use crate::transform::inverse_dct_blocks;
use crate::Image;

/// Decode an MCDC byte buffer back into an image.
///
/// Reverses the encode pipeline: Huffman decode → unpack symbols → inverse
/// RLE → inverse zigzag → dequantize → inverse DCT → untile → inverse level
/// shift (iff the container records that one was applied). Any header or
/// payload inconsistency is a fatal error.
pub fn decode_from_container(bytes: &[u8]) -> Result<Image> {
    let header = McdcHeader::read(bytes)?;
    let payload_start = usize::from(header.header_bytes);
    let payload_end = payload_start + header.payload_bytes as usize;
    if bytes.len() < payload_end {
        return Err(McdcError::Truncation(format!(
            "container smaller than declared payload: {} < {}",
            bytes.len(),
            payload_end
        )));
    }

    let mut r = ByteReader::new(&bytes[payload_start..payload_end]);
    let symbol_count = r.read_u32_le()? as usize;
    let used_symbol_count = r.read_u32_le()? as usize;
    if used_symbol_count == 0 {
        return Err(McdcError::Validation(
            "decode: used_symbol_count is zero".to_string(),
        ));
    }
    if r.remaining() < used_symbol_count * 5 {
        return Err(McdcError::Truncation(
            "decode: Huffman table section truncated".to_string(),
        ));
    }
    let mut entries = Vec::with_capacity(used_symbol_count);
    for _ in 0..used_symbol_count {
        let symbol = r.read_u32_le()?;
        let len = r.read_u8()?;
        entries.push((symbol, len));
    }
    let huff_bits = r.read_bytes(r.remaining())?;

    let table = rebuild_table_from_lengths(&entries)?;
    let symbols = huff_decode(huff_bits, &table, symbol_count)?;
    let pairs = unpack_symbols(&symbols);
    log::debug!(
        "decode: {} symbols from {} table entries",
        symbols.len(),
        used_symbol_count
    );

    let block_size = header.block_size;
    let grid = BlockGrid::new(header.width, header.height, block_size)?;
    let block_elems = usize::from(block_size) * usize::from(block_size);
    let total_coeffs = grid.block_count() * block_elems;

    let seq = rle_decode_zeros(&pairs, total_coeffs)?;
    let qcoeff = inverse_zigzag_blocks(&seq, block_size)?;
    let coeffs = dequantize(&qcoeff, block_size, header.quality)?;
    let blocks = inverse_dct_blocks(&coeffs, block_size)?;

    let mut image = Image {
        width: header.width,
        height: header.height,
        channels: header.channels,
        bits_stored: header.bits_stored,
        bits_allocated: header.bits_allocated,
        is_signed: header.is_signed,
        pixels: Vec::new(),
    };
    untile_from_blocks(&mut image, &grid, &blocks)?;

    // The flag decides whether to invert the shift; the is_signed field only
    // describes the original input.
    if header.level_shift_applied() {
        inverse_level_shift(&mut image)?;
    }

    if image.pixels.len() != image.expected_len() {
        return Err(McdcError::ImageData(format!(
            "decoded pixel count mismatch: expected {}, got {}",
            image.expected_len(),
            image.pixels.len()
        )));
    }
    log::debug!(
        "decode: reconstructed {}x{} at {} bits",
        image.width,
        image.height,
        image.bits_stored
    );
    Ok(image)
}
