//! Error types for the transform codec library.

use thiserror::Error;

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, McdcError>;

/// Main error type for the transform codec library.
#[derive(Error, Debug)]
pub enum McdcError {
    /// Contract violation at a stage boundary (bad magic, out-of-range
    /// parameters, buffer length mismatches, unsupported layouts).
    #[error("validation error: {0}")]
    Validation(String),

    /// Bitstream shorter than its own declarations (payload smaller than
    /// declared, Huffman bits exhausted mid-symbol, RLE under/overshoot).
    #[error("truncated bitstream: {0}")]
    Truncation(String),

    /// Internally inconsistent bitstream or table (invalid code length,
    /// duplicate canonical code, null trie child, missing symbol).
    #[error("corrupt bitstream: {0}")]
    Corruption(String),

    /// Image dimensions or pixel buffer mismatch.
    #[error("image data error: {0}")]
    ImageData(String),

    /// Input format the codec does not handle.
    #[error("unsupported input: {0}")]
    Unsupported(String),

    /// Error reading or parsing a DICOM file.
    #[error("DICOM error: {0}")]
    Dicom(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<dicom::object::ReadError> for McdcError {
    fn from(err: dicom::object::ReadError) -> Self {
        McdcError::Dicom(err.to_string())
    }
}

impl From<dicom::object::WriteError> for McdcError {
    fn from(err: dicom::object::WriteError) -> Self {
        McdcError::Dicom(err.to_string())
    }
}
