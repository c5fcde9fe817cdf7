//! Medical image ingress and egress.
//!
//! Supported inputs: uncompressed grayscale single-frame DICOM (8/16-bit)
//! and binary PGM (P5). Output is PGM at the image's stored bit depth.

mod dicom;
mod pgm;

use std::path::Path;

use crate::error::{McdcError, Result};
use crate::Image;

pub use self::dicom::{load_dicom, load_dicom_series};
pub use self::pgm::{encode_pgm, load_pgm, parse_pgm, save_pgm};

/// Load a medical image from a path.
///
/// Dispatch: a directory is treated as a DICOM series folder (the first
/// readable slice by InstanceNumber is loaded); a `.pgm` extension selects
/// the PGM loader; anything else is tried as a DICOM file, which is the
/// common extension-less case.
pub fn load_medical<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();

    if path.is_dir() {
        return self::dicom::load_dicom_series(path);
    }

    let is_pgm = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pgm"))
        .unwrap_or(false);
    if is_pgm {
        return self::pgm::load_pgm(path);
    }

    self::dicom::load_dicom(path).map_err(|e| {
        McdcError::Unsupported(format!(
            "cannot load {} (not a supported PGM/DICOM input): {}",
            path.display(),
            e
        ))
    })
}
