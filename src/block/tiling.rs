//! Block grid layout and padded raster tiling.

use crate::config::SUPPORTED_BLOCK_SIZES;
use crate::error::{McdcError, Result};
use crate::Image;

/// Geometry of the padded block grid covering an image.
///
/// Derived purely from the image dimensions and the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    /// Transform block size (8 or 16).
    pub block_size: u16,
    /// Number of blocks along the horizontal axis.
    pub blocks_x: u32,
    /// Number of blocks along the vertical axis.
    pub blocks_y: u32,
    /// Padded width, `blocks_x * block_size`.
    pub padded_w: u32,
    /// Padded height, `blocks_y * block_size`.
    pub padded_h: u32,
}

impl BlockGrid {
    /// Compute the grid covering a `width` × `height` image.
    pub fn new(width: u32, height: u32, block_size: u16) -> Result<Self> {
        if !SUPPORTED_BLOCK_SIZES.contains(&block_size) {
            return Err(McdcError::Validation(format!(
                "block_size must be 8 or 16, got {}",
                block_size
            )));
        }
        if width == 0 || height == 0 {
            return Err(McdcError::Validation(format!(
                "invalid image size {}x{}",
                width, height
            )));
        }
        let b = u32::from(block_size);
        let blocks_x = width.div_ceil(b);
        let blocks_y = height.div_ceil(b);
        Ok(Self {
            block_size,
            blocks_x,
            blocks_y,
            padded_w: blocks_x * b,
            padded_h: blocks_y * b,
        })
    }

    /// Total number of blocks in the grid.
    pub fn block_count(&self) -> usize {
        self.blocks_x as usize * self.blocks_y as usize
    }

    /// Total number of samples in the padded raster.
    pub fn padded_len(&self) -> usize {
        self.padded_w as usize * self.padded_h as usize
    }
}

/// Copy the image into a zero-padded raster of the grid's padded dimensions.
///
/// Image content lands at the top-left; samples outside the image are zero.
pub fn tile_to_blocks(image: &Image, grid: &BlockGrid) -> Result<Vec<i32>> {
    image.validate()?;
    if grid.padded_w < image.width || grid.padded_h < image.height {
        return Err(McdcError::Validation(format!(
            "grid {}x{} does not cover image {}x{}",
            grid.padded_w, grid.padded_h, image.width, image.height
        )));
    }

    let mut padded = vec![0i32; grid.padded_len()];
    let w = image.width as usize;
    let pw = grid.padded_w as usize;
    for y in 0..image.height as usize {
        let src = &image.pixels[y * w..(y + 1) * w];
        padded[y * pw..y * pw + w].copy_from_slice(src);
    }
    Ok(padded)
}

/// Copy the top-left `width` × `height` sub-rectangle of the padded raster
/// back into the image's pixel buffer, discarding the padding.
pub fn untile_from_blocks(image: &mut Image, grid: &BlockGrid, padded: &[i32]) -> Result<()> {
    if image.channels != 1 {
        return Err(McdcError::Validation(format!(
            "only grayscale is supported (channels = {})",
            image.channels
        )));
    }
    if image.width == 0 || image.height == 0 {
        return Err(McdcError::Validation(format!(
            "invalid image size {}x{}",
            image.width, image.height
        )));
    }
    if padded.len() != grid.padded_len() {
        return Err(McdcError::ImageData(format!(
            "padded buffer length mismatch: expected {}, got {}",
            grid.padded_len(),
            padded.len()
        )));
    }

    let w = image.width as usize;
    let pw = grid.padded_w as usize;
    image.pixels.resize(image.expected_len(), 0);
    for y in 0..image.height as usize {
        let src = &padded[y * pw..y * pw + w];
        image.pixels[y * w..(y + 1) * w].copy_from_slice(src);
    }
    Ok(())
}
