//! Configuration types for codec settings.

use serde::{Deserialize, Serialize};

use crate::error::{McdcError, Result};

/// Block sizes the container format reserves.
pub const SUPPORTED_BLOCK_SIZES: [u16; 2] = [8, 16];

/// Configuration for an encode operation.
///
/// The container reserves `block_size = 16`, but only 8×8 blocks are written
/// by the encoder; 16 is accepted for forward compatibility on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Quantization quality, 1 (coarsest) to 100 (finest).
    pub quality: u16,
    /// Transform block size (8 or 16).
    pub block_size: u16,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            quality: 50,
            block_size: 8,
        }
    }
}

impl CodecConfig {
    /// Create a configuration with the given quality and the default block size.
    pub fn with_quality(quality: u16) -> Self {
        Self {
            quality,
            ..Default::default()
        }
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.quality < 1 || self.quality > 100 {
            return Err(McdcError::Validation(format!(
                "quality must be in 1..=100, got {}",
                self.quality
            )));
        }
        if !SUPPORTED_BLOCK_SIZES.contains(&self.block_size) {
            return Err(McdcError::Validation(format!(
                "block_size must be 8 or 16, got {}",
                self.block_size
            )));
        }
        Ok(())
    }
}
