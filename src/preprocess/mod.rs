//! Level shifting: centering unsigned samples around zero and its inverse.
//!
//! The transform works best on zero-centered data. Unsigned images are shifted
//! by `2^(bits_stored - 1)` before tiling; already-signed images pass through
//! untouched. The inverse restores the unsigned domain and clamps to the
//! representable range. Padding samples must be zeros *after* the shift, so
//! the shift always runs before tiling.

use crate::error::{McdcError, Result};
use crate::Image;

fn check_bits_stored(image: &Image) -> Result<()> {
    if image.bits_stored == 0 || image.bits_stored > 16 {
        return Err(McdcError::Validation(format!(
            "bits_stored out of range: {}",
            image.bits_stored
        )));
    }
    Ok(())
}

/// Shift unsigned samples to a zero-centered signed domain.
///
/// Subtracts `2^(bits_stored - 1)` from every pixel and marks the image as
/// signed. No-op when the image is already signed.
pub fn apply_level_shift(image: &mut Image) -> Result<()> {
    check_bits_stored(image)?;
    if image.pixels.is_empty() || image.is_signed {
        return Ok(());
    }

    let offset = 1i32 << (image.bits_stored - 1);
    for v in &mut image.pixels {
        *v -= offset;
    }
    image.is_signed = true;
    Ok(())
}

/// Restore pixels to the unsigned domain after reconstruction.
///
/// Adds `2^(bits_stored - 1)` to every pixel, clamps to
/// `[0, 2^bits_stored - 1]` and marks the image as unsigned. The decoder
/// calls this iff the container records that a shift was applied.
pub fn inverse_level_shift(image: &mut Image) -> Result<()> {
    check_bits_stored(image)?;
    if image.pixels.is_empty() {
        return Ok(());
    }

    let offset = 1i32 << (image.bits_stored - 1);
    let max = (1i32 << image.bits_stored) - 1;
    for v in &mut image.pixels {
        *v = (*v + offset).clamp(0, max);
    }
    image.is_signed = false;
    Ok(())
}
