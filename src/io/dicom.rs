//! DICOM ingress for uncompressed grayscale images.
//!
//! Reads single-frame MONOCHROME2 objects with 8 or 16 bits allocated from
//! little-endian uncompressed transfer syntaxes. Encapsulated (compressed)
//! objects are rejected; convert them to uncompressed first.

use std::path::{Path, PathBuf};

use dicom::core::Tag;
use dicom::dictionary_std::tags;
use dicom::object::{open_file, DefaultDicomObject};

use crate::error::{McdcError, Result};
use crate::Image;

/// Transfer syntax UIDs this loader accepts.
const IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";
const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";

fn is_uncompressed_le(transfer_syntax: &str) -> bool {
    matches!(transfer_syntax, IMPLICIT_VR_LE | EXPLICIT_VR_LE)
}

/// Load an uncompressed grayscale DICOM file.
pub fn load_dicom<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let object = open_file(path)
        .map_err(|e| McdcError::Dicom(format!("failed to read {}: {}", path.display(), e)))?;
    image_from_object(&object, path)
}

fn image_from_object(obj: &DefaultDicomObject, path: &Path) -> Result<Image> {
    let get_string = |tag: Tag| -> Option<String> {
        obj.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
    };
    let get_u16 = |tag: Tag| -> Option<u16> {
        obj.element(tag).ok().and_then(|e| e.to_int::<u16>().ok())
    };

    let transfer_syntax = obj.meta().transfer_syntax().trim_end_matches('\0').to_string();
    if !is_uncompressed_le(&transfer_syntax) {
        return Err(McdcError::Unsupported(format!(
            "compressed or non-little-endian transfer syntax {} in {}; convert to uncompressed first",
            transfer_syntax,
            path.display()
        )));
    }

    let width = get_u16(tags::COLUMNS)
        .ok_or_else(|| McdcError::Dicom("missing Columns tag".to_string()))? as u32;
    let height = get_u16(tags::ROWS)
        .ok_or_else(|| McdcError::Dicom("missing Rows tag".to_string()))? as u32;
    let bits_allocated = get_u16(tags::BITS_ALLOCATED)
        .ok_or_else(|| McdcError::Dicom("missing BitsAllocated tag".to_string()))?;
    let bits_stored = get_u16(tags::BITS_STORED).unwrap_or(bits_allocated);
    let pixel_representation = get_u16(tags::PIXEL_REPRESENTATION).unwrap_or(0);

    if let Some(spp) = get_u16(tags::SAMPLES_PER_PIXEL) {
        if spp != 1 {
            return Err(McdcError::Unsupported(format!(
                "only SamplesPerPixel=1 (grayscale) is supported, got {}",
                spp
            )));
        }
    }
    if let Some(photometric) = get_string(tags::PHOTOMETRIC_INTERPRETATION) {
        if photometric != "MONOCHROME2" {
            return Err(McdcError::Unsupported(format!(
                "unsupported PhotometricInterpretation {}",
                photometric
            )));
        }
    }
    let frames = get_string(tags::NUMBER_OF_FRAMES)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1);
    if frames != 1 {
        return Err(McdcError::Unsupported(format!(
            "only single-frame DICOM is supported (NumberOfFrames = {})",
            frames
        )));
    }
    if bits_allocated != 8 && bits_allocated != 16 {
        return Err(McdcError::Unsupported(format!(
            "only BitsAllocated 8 or 16 is supported, got {}",
            bits_allocated
        )));
    }
    if bits_stored == 0 || bits_stored > bits_allocated {
        return Err(McdcError::Dicom(format!(
            "invalid BitsStored {} for BitsAllocated {}",
            bits_stored, bits_allocated
        )));
    }

    let pixel_element = obj
        .element(tags::PIXEL_DATA)
        .map_err(|_| McdcError::Dicom("missing PixelData element".to_string()))?;
    let bytes = pixel_element
        .to_bytes()
        .map_err(|e| McdcError::Dicom(format!("failed to extract pixel data: {}", e)))?;

    let count = width as usize * height as usize;
    let is_signed = pixel_representation == 1;
    let mut pixels = Vec::with_capacity(count);

    if bits_allocated == 8 {
        if bytes.len() < count {
            return Err(McdcError::Dicom(format!(
                "pixel data too short: {} bytes for {} samples",
                bytes.len(),
                count
            )));
        }
        pixels.extend(bytes[..count].iter().map(|&b| i32::from(b)));
    } else {
        if bytes.len() < count * 2 {
            return Err(McdcError::Dicom(format!(
                "pixel data too short: {} bytes for {} samples",
                bytes.len(),
                count
            )));
        }
        for chunk in bytes[..count * 2].chunks_exact(2) {
            let raw = u16::from_le_bytes([chunk[0], chunk[1]]);
            // preserve the bit pattern for signed data
            pixels.push(if is_signed {
                i32::from(raw as i16)
            } else {
                i32::from(raw)
            });
        }
    }

    let image = Image::new(width, height, bits_stored, bits_allocated, is_signed, pixels);
    image.validate()?;
    log::debug!(
        "loaded DICOM {}: {}x{}, {} bits stored / {} allocated, signed = {}",
        path.display(),
        width,
        height,
        bits_stored,
        bits_allocated,
        is_signed
    );
    Ok(image)
}

/// InstanceNumber of a DICOM file, 0 when absent or unreadable.
fn instance_number(path: &Path) -> i32 {
    open_file(path)
        .ok()
        .and_then(|obj| {
            obj.element(tags::INSTANCE_NUMBER)
                .ok()
                .and_then(|e| e.to_int::<i32>().ok())
        })
        .unwrap_or(0)
}

/// Load the first readable slice of a DICOM series directory.
///
/// Regular files are ordered by InstanceNumber; unreadable or non-DICOM
/// entries are skipped.
pub fn load_dicom_series<P: AsRef<Path>>(dir: P) -> Result<Image> {
    let dir = dir.as_ref();
    let mut entries: Vec<(i32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            entries.push((instance_number(&path), path));
        }
    }
    if entries.is_empty() {
        return Err(McdcError::Dicom(format!(
            "no files in series folder {}",
            dir.display()
        )));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    for (_, path) in &entries {
        match load_dicom(path) {
            Ok(image) => return Ok(image),
            Err(e) => log::debug!("skipping {}: {}", path.display(), e),
        }
    }
    Err(McdcError::Dicom(format!(
        "no readable uncompressed DICOM found in {}",
        dir.display()
    )))
}
