//! Block-domain operations: padded tiling and zigzag reordering.
//!
//! Tiling pads the image raster to a multiple of the block size; the
//! per-block linearization is implicit in how the downstream stages index.
//! Zigzag reorders each block from raster order to low-to-high frequency
//! order.

mod tiling;
mod zigzag;

pub use tiling::{tile_to_blocks, untile_from_blocks, BlockGrid};
pub use zigzag::{inverse_zigzag_blocks, make_zigzag_order, zigzag_scan_blocks};
