//! Distortion metrics for lossy reconstruction quality.
//!
//! Provides RMSE/PSNR between a reference and a reconstruction, plus an
//! 8-bit absolute-error map scaled so that the 99th-percentile error maps
//! to full white. PSNR uses `MAX = 2^bits_stored - 1` of the reference.

use crate::error::{McdcError, Result};
use crate::Image;

/// Result of a distortion measurement.
#[derive(Debug, Clone, Copy)]
pub struct Distortion {
    /// Mean squared error over the unsigned sample domain.
    pub mse: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Peak signal-to-noise ratio in decibels; infinite for identical images.
    pub psnr_db: f64,
    /// Peak value used for PSNR (`2^bits_stored - 1`).
    pub max_value: u32,
}

impl Distortion {
    /// Whether the reconstruction is bit-exact.
    pub fn is_lossless(&self) -> bool {
        self.mse == 0.0
    }
}

impl std::fmt::Display for Distortion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.psnr_db.is_infinite() {
            write!(f, "RMSE 0.0, PSNR inf (lossless)")
        } else {
            write!(f, "RMSE {:.4}, PSNR {:.2} dB", self.rmse, self.psnr_db)
        }
    }
}

/// Validate that two images are comparable.
pub(crate) fn validate_images(reference: &Image, reconstruction: &Image) -> Result<()> {
    if reference.width != reconstruction.width || reference.height != reconstruction.height {
        return Err(McdcError::ImageData(format!(
            "image dimensions mismatch: {}x{} vs {}x{}",
            reference.width, reference.height, reconstruction.width, reconstruction.height
        )));
    }
    if reference.bits_stored != reconstruction.bits_stored {
        return Err(McdcError::ImageData(format!(
            "bits_stored mismatch: {} vs {}",
            reference.bits_stored, reconstruction.bits_stored
        )));
    }
    if reference.pixels.len() != reconstruction.pixels.len() {
        return Err(McdcError::ImageData(format!(
            "pixel count mismatch: {} vs {}",
            reference.pixels.len(),
            reconstruction.pixels.len()
        )));
    }
    Ok(())
}

/// Map pixels into the unsigned display domain `[0, max]`.
///
/// Signed images are shifted by `2^(bits_stored - 1)`; everything is clamped.
pub fn map_to_unsigned(image: &Image, max: u32) -> Vec<u32> {
    if image.is_signed {
        let offset = 1i64 << (image.bits_stored - 1);
        image
            .pixels
            .iter()
            .map(|&v| (i64::from(v) + offset).clamp(0, i64::from(max)) as u32)
            .collect()
    } else {
        image
            .pixels
            .iter()
            .map(|&v| i64::from(v).clamp(0, i64::from(max)) as u32)
            .collect()
    }
}

/// Compute RMSE and PSNR between a reference image and its reconstruction.
pub fn distortion(reference: &Image, reconstruction: &Image) -> Result<Distortion> {
    validate_images(reference, reconstruction)?;

    let max_value = reference.max_value();
    let ref_u = map_to_unsigned(reference, max_value);
    let rec_u = map_to_unsigned(reconstruction, max_value);

    let mut sum_sq = 0.0f64;
    for (&a, &b) in ref_u.iter().zip(rec_u.iter()) {
        let d = f64::from(a) - f64::from(b);
        sum_sq += d * d;
    }
    let mse = sum_sq / ref_u.len() as f64;
    let psnr_db = if mse == 0.0 {
        f64::INFINITY
    } else {
        20.0 * f64::from(max_value).log10() - 10.0 * mse.log10()
    };

    Ok(Distortion {
        mse,
        rmse: mse.sqrt(),
        psnr_db,
        max_value,
    })
}

/// 99th percentile of a value set: the element at index `⌊0.99 · (n - 1)⌋`
/// of the sorted order.
pub fn percentile_p99(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    let idx = (0.99 * (sorted.len() - 1) as f64).floor() as usize;
    sorted.select_nth_unstable(idx);
    sorted[idx]
}

/// Build an 8-bit absolute-error map between two comparable images.
///
/// Errors are scaled so the 99th-percentile error maps to 255 (larger errors
/// saturate); a scale of zero is bumped to one so identical images stay black.
pub fn error_map(reference: &Image, reconstruction: &Image) -> Result<Image> {
    validate_images(reference, reconstruction)?;

    let max_value = reference.max_value();
    let ref_u = map_to_unsigned(reference, max_value);
    let rec_u = map_to_unsigned(reconstruction, max_value);

    let errors: Vec<u32> = ref_u
        .iter()
        .zip(rec_u.iter())
        .map(|(&a, &b)| a.abs_diff(b))
        .collect();
    let scale = percentile_p99(&errors).max(1);

    let pixels = errors
        .iter()
        .map(|&e| {
            let clipped = e.min(scale);
            (255.0 * f64::from(clipped) / f64::from(scale)).round() as i32
        })
        .collect();

    Ok(Image::new(
        reference.width,
        reference.height,
        8,
        8,
        false,
        pixels,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(width: u32, height: u32, bits: u16, value: i32) -> Image {
        let count = width as usize * height as usize;
        Image::new(
            width,
            height,
            bits,
            if bits <= 8 { 8 } else { 16 },
            false,
            vec![value; count],
        )
    }

    #[test]
    fn test_identical_images_are_lossless() {
        let a = flat_image(64, 64, 8, 128);
        let b = flat_image(64, 64, 8, 128);
        let d = distortion(&a, &b).unwrap();
        assert!(d.is_lossless());
        assert_eq!(d.mse, 0.0);
        assert!(d.psnr_db.is_infinite());
    }

    #[test]
    fn test_known_mse_and_psnr() {
        let a = flat_image(64, 64, 8, 100);
        let b = flat_image(64, 64, 8, 110);
        let d = distortion(&a, &b).unwrap();
        // MSE = 100, PSNR = 10 * log10(255^2 / 100) ≈ 28.13 dB
        assert!((d.mse - 100.0).abs() < 1e-9);
        assert!((d.rmse - 10.0).abs() < 1e-9);
        assert!(d.psnr_db > 28.0 && d.psnr_db < 29.0);
        assert_eq!(d.max_value, 255);
    }

    #[test]
    fn test_distortion_uses_stored_bit_depth() {
        let a = flat_image(32, 32, 12, 1000);
        let b = flat_image(32, 32, 12, 1100);
        let d = distortion(&a, &b).unwrap();
        assert_eq!(d.max_value, 4095);
        assert!((d.mse - 10000.0).abs() < 1e-9);
    }

    #[test]
    fn test_signed_images_map_through_offset() {
        let mut a = flat_image(4, 4, 8, 0);
        a.is_signed = true;
        let mapped = map_to_unsigned(&a, 255);
        assert!(mapped.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_validate_rejects_mismatch() {
        let a = flat_image(64, 64, 8, 1);
        let b = flat_image(32, 32, 8, 1);
        assert!(distortion(&a, &b).is_err());

        let c = flat_image(64, 64, 12, 1);
        assert!(distortion(&a, &c).is_err());
    }

    #[test]
    fn test_percentile_p99() {
        let values: Vec<u32> = (0..100).collect();
        assert_eq!(percentile_p99(&values), 98); // floor(0.99 * 99)
        assert_eq!(percentile_p99(&[7]), 7);
        assert_eq!(percentile_p99(&[]), 0);
    }

    #[test]
    fn test_error_map_scaling() {
        let a = flat_image(10, 10, 8, 100);
        let mut b = flat_image(10, 10, 8, 100);
        // one outlier error of 40, the rest 0 except a block of 4s
        for i in 0..50 {
            b.pixels[i] = 104;
        }
        b.pixels[99] = 140;

        let map = error_map(&a, &b).unwrap();
        assert_eq!(map.bits_stored, 8);
        assert_eq!(map.width, 10);
        // p99 of the error set {0 x49, 4 x50, 40 x1} is 4, so the common
        // error saturates to 255 and zero errors stay black
        assert_eq!(map.pixels[0], 255);
        assert_eq!(map.pixels[60], 0);
        assert_eq!(map.pixels[99], 255);
    }

    #[test]
    fn test_error_map_identical_images_is_black() {
        let a = flat_image(8, 8, 8, 42);
        let map = error_map(&a, &a).unwrap();
        assert!(map.pixels.iter().all(|&v| v == 0));
    }
}
