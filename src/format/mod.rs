//! MCDC container format: little-endian byte I/O and the fixed 32-byte header.
//!
//! The header is always serialized field by field at fixed offsets, never by
//! dumping a struct, so the on-disk layout is independent of the compiler.
//!
//! ```text
//! offset  bytes  field
//!      0      4  magic "MCDC"
//!      4      2  version (1)
//!      6      2  header_bytes (32)
//!      8      4  width
//!     12      4  height
//!     16      2  channels (1)
//!     18      2  bits_allocated (8 | 16)
//!     20      2  bits_stored (1..=16)
//!     22      1  is_signed (0 | 1, original input)
//!     23      1  flags (bit 0: level shift applied)
//!     24      2  block_size (8 | 16)
//!     26      2  quality (1..=100)
//!     28      4  payload_bytes
//! ```

use crate::config::SUPPORTED_BLOCK_SIZES;
use crate::error::{McdcError, Result};

/// Container magic, ASCII "MCDC".
pub const MAGIC: [u8; 4] = *b"MCDC";

/// The only container version this codec reads or writes.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed on-disk header size for version 1.
pub const HEADER_BYTES: u16 = 32;

/// Flags bit 0: a level shift was applied during encode.
pub const FLAG_LEVEL_SHIFT: u8 = 0x01;

/// Byte offset of the `payload_bytes` field, patched after the payload is
/// written.
pub const PAYLOAD_BYTES_OFFSET: usize = 28;

/// Growable little-endian byte sink.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Append a `u16`, least significant byte first.
    pub fn write_u16_le(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Append a `u32`, least significant byte first.
    pub fn write_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Little-endian byte reader mirroring [`ByteWriter`].
///
/// Every read that would run past the end of the buffer is a fatal
/// premature-EOF error.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.pos + n > self.buf.len() {
            return Err(McdcError::Truncation(format!(
                "premature EOF: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    /// Read a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.need(2)?;
        let v = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.need(4)?;
        let v = u32::from_le_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    /// Read exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Parsed MCDC container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McdcHeader {
    /// Container version.
    pub version: u16,
    /// On-disk header size; payload starts here.
    pub header_bytes: u16,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of channels (1).
    pub channels: u16,
    /// Storage width per sample (8 or 16).
    pub bits_allocated: u16,
    /// Sample bit depth (1..=16).
    pub bits_stored: u16,
    /// Signedness of the original input image.
    pub is_signed: bool,
    /// Flag bits; bit 0 records that a level shift was applied.
    pub flags: u8,
    /// Transform block size (8 or 16; the encoder always writes 8).
    pub block_size: u16,
    /// Quantization quality used on encode.
    pub quality: u16,
    /// Payload length in bytes after the header.
    pub payload_bytes: u32,
}

impl McdcHeader {
    /// Whether the encoder applied a level shift (flags bit 0).
    pub fn level_shift_applied(&self) -> bool {
        self.flags & FLAG_LEVEL_SHIFT != 0
    }

    /// Serialize the header at the current writer position.
    pub fn write(&self, w: &mut ByteWriter) {
        w.write_bytes(&MAGIC);
        w.write_u16_le(self.version);
        w.write_u16_le(self.header_bytes);
        w.write_u32_le(self.width);
        w.write_u32_le(self.height);
        w.write_u16_le(self.channels);
        w.write_u16_le(self.bits_allocated);
        w.write_u16_le(self.bits_stored);
        w.write_u8(u8::from(self.is_signed));
        w.write_u8(self.flags);
        w.write_u16_le(self.block_size);
        w.write_u16_le(self.quality);
        w.write_u32_le(self.payload_bytes);
    }

    /// Parse and validate a header from the start of a container buffer.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < usize::from(HEADER_BYTES) {
            return Err(McdcError::Truncation(format!(
                "container too small for header: {} bytes",
                bytes.len()
            )));
        }
        let mut r = ByteReader::new(bytes);
        let magic = r.read_bytes(4)?;
        if magic != MAGIC {
            return Err(McdcError::Validation("bad container magic".to_string()));
        }
        let version = r.read_u16_le()?;
        if version != FORMAT_VERSION {
            return Err(McdcError::Validation(format!(
                "unsupported container version {}",
                version
            )));
        }
        let header_bytes = r.read_u16_le()?;
        if header_bytes < HEADER_BYTES {
            return Err(McdcError::Validation(format!(
                "invalid header_bytes {}",
                header_bytes
            )));
        }
        if bytes.len() < usize::from(header_bytes) {
            return Err(McdcError::Truncation("truncated header".to_string()));
        }

        let width = r.read_u32_le()?;
        let height = r.read_u32_le()?;
        let channels = r.read_u16_le()?;
        let bits_allocated = r.read_u16_le()?;
        let bits_stored = r.read_u16_le()?;
        let is_signed_byte = r.read_u8()?;
        let flags = r.read_u8()?;
        let block_size = r.read_u16_le()?;
        let quality = r.read_u16_le()?;
        let payload_bytes = r.read_u32_le()?;

        if width == 0 || height == 0 {
            return Err(McdcError::Validation(format!(
                "invalid image size {}x{}",
                width, height
            )));
        }
        if channels != 1 {
            return Err(McdcError::Validation(format!(
                "only grayscale is supported (channels = {})",
                channels
            )));
        }
        if bits_allocated != 8 && bits_allocated != 16 {
            return Err(McdcError::Validation(format!(
                "bits_allocated must be 8 or 16, got {}",
                bits_allocated
            )));
        }
        if bits_stored == 0 || bits_stored > 16 {
            return Err(McdcError::Validation(format!(
                "bits_stored out of range: {}",
                bits_stored
            )));
        }
        if is_signed_byte > 1 {
            return Err(McdcError::Validation(format!(
                "is_signed must be 0 or 1, got {}",
                is_signed_byte
            )));
        }
        if !SUPPORTED_BLOCK_SIZES.contains(&block_size) {
            return Err(McdcError::Validation(format!(
                "block_size must be 8 or 16, got {}",
                block_size
            )));
        }
        if quality < 1 || quality > 100 {
            return Err(McdcError::Validation(format!(
                "quality must be in 1..=100, got {}",
                quality
            )));
        }

        Ok(Self {
            version,
            header_bytes,
            width,
            height,
            channels,
            bits_allocated,
            bits_stored,
            is_signed: is_signed_byte != 0,
            flags,
            block_size,
            quality,
            payload_bytes,
        })
    }
}

/// Patch the `payload_bytes` field of an already-serialized header in place.
pub fn patch_payload_bytes(container: &mut [u8], payload_bytes: u32) -> Result<()> {
    if container.len() < usize::from(HEADER_BYTES) {
        return Err(McdcError::Validation(
            "container too small to patch payload_bytes".to_string(),
        ));
    }
    container[PAYLOAD_BYTES_OFFSET..PAYLOAD_BYTES_OFFSET + 4]
        .copy_from_slice(&payload_bytes.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> McdcHeader {
        McdcHeader {
            version: FORMAT_VERSION,
            header_bytes: HEADER_BYTES,
            width: 640,
            height: 480,
            channels: 1,
            bits_allocated: 16,
            bits_stored: 12,
            is_signed: false,
            flags: FLAG_LEVEL_SHIFT,
            block_size: 8,
            quality: 75,
            payload_bytes: 1234,
        }
    }

    #[test]
    fn test_byte_io_roundtrip() {
        let mut w = ByteWriter::new();
        w.write_u8(0xAB);
        w.write_u16_le(0x1234);
        w.write_u32_le(0xDEAD_BEEF);
        w.write_bytes(&[1, 2, 3]);
        let bytes = w.into_bytes();
        assert_eq!(bytes[1..3], [0x34, 0x12]); // LSB first

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 0xAB);
        assert_eq!(r.read_u16_le().unwrap(), 0x1234);
        assert_eq!(r.read_u32_le().unwrap(), 0xDEAD_BEEF);
        assert_eq!(r.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert_eq!(r.remaining(), 0);
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn test_reader_premature_eof() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        assert!(matches!(r.read_u32_le(), Err(McdcError::Truncation(_))));
    }

    #[test]
    fn test_header_field_offsets() {
        let hdr = sample_header();
        let mut w = ByteWriter::new();
        hdr.write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), usize::from(HEADER_BYTES));

        assert_eq!(&bytes[0..4], b"MCDC");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 32);
        assert_eq!(
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            640
        );
        assert_eq!(
            u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            480
        );
        assert_eq!(u16::from_le_bytes([bytes[16], bytes[17]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[18], bytes[19]]), 16);
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 12);
        assert_eq!(bytes[22], 0);
        assert_eq!(bytes[23], FLAG_LEVEL_SHIFT);
        assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 8);
        assert_eq!(u16::from_le_bytes([bytes[26], bytes[27]]), 75);
        assert_eq!(
            u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]),
            1234
        );
    }

    #[test]
    fn test_header_roundtrip() {
        let hdr = sample_header();
        let mut w = ByteWriter::new();
        hdr.write(&mut w);
        let parsed = McdcHeader::read(&w.into_bytes()).unwrap();
        assert_eq!(parsed, hdr);
        assert!(parsed.level_shift_applied());
    }

    #[test]
    fn test_header_rejects_tampering() {
        let hdr = sample_header();
        let mut w = ByteWriter::new();
        hdr.write(&mut w);
        let bytes = w.into_bytes();

        let mut bad_magic = bytes.clone();
        bad_magic[0] = 0;
        assert!(McdcHeader::read(&bad_magic).is_err());

        let mut bad_version = bytes.clone();
        bad_version[4] = 2;
        assert!(McdcHeader::read(&bad_version).is_err());

        let mut bad_channels = bytes.clone();
        bad_channels[16] = 3;
        assert!(McdcHeader::read(&bad_channels).is_err());

        let mut bad_block = bytes.clone();
        bad_block[24] = 7;
        assert!(McdcHeader::read(&bad_block).is_err());

        let mut bad_quality = bytes.clone();
        bad_quality[26] = 0;
        assert!(McdcHeader::read(&bad_quality).is_err());

        let mut bad_signed = bytes;
        bad_signed[22] = 2;
        assert!(McdcHeader::read(&bad_signed).is_err());
    }

    #[test]
    fn test_patch_payload_bytes() {
        let hdr = sample_header();
        let mut w = ByteWriter::new();
        hdr.write(&mut w);
        let mut bytes = w.into_bytes();
        patch_payload_bytes(&mut bytes, 0xCAFE).unwrap();
        let parsed = McdcHeader::read(&bytes).unwrap();
        assert_eq!(parsed.payload_bytes, 0xCAFE);
    }
}
