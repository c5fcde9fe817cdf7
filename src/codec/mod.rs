//! Container codec: the encode and decode pipelines.
//!
//! Ties the stage modules together into the two in-memory entry points
//! consumed by the drivers.

mod decoder;
mod encoder;

pub use decoder::decode_from_container;
pub use encoder::encode_to_container;
