//! Binary data parsing utilities shared across formats.
//!
//! This module provides functions for reading little-endian integers out of
//! raw buffers, a bounds-checked [`ByteCursor`], and UTF-16LE string helpers
//! used by the legacy record decoders.

use zerocopy::{FromBytes, I16, I32, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    ParseError(String),
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data: expected {}, got {}",
                    expected, available
                )
            },
            BinaryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn check_len(data: &[u8], offset: usize, width: usize) -> BinaryResult<()> {
    match offset.checked_add(width) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(BinaryError::InsufficientData {
            expected: offset.saturating_add(width),
            available: data.len(),
        }),
    }
}

/// Read a byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> BinaryResult<u8> {
    check_len(data, offset, 1)?;
    Ok(data[offset])
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use hwpdoc::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    check_len(data, offset, 2)?;
    U16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

/// Read a little-endian i16 from a byte slice at the given offset.
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    check_len(data, offset, 2)?;
    I16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use hwpdoc::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    check_len(data, offset, 4)?;
    U32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

/// Read a little-endian i32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use hwpdoc::common::binary::read_i32_le;
/// let data = [0xFF, 0xFF, 0xFF, 0xFF];
/// assert_eq!(read_i32_le(&data, 0).unwrap(), -1i32);
/// ```
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    check_len(data, offset, 4)?;
    I32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i32".to_string()))
}

/// Decode a UTF-16LE byte slice of known length, stopping at the first NUL.
///
/// Unpaired surrogates are replaced with U+FFFD.
///
/// # Examples
///
/// ```
/// use hwpdoc::common::binary::parse_utf16le_string;
/// let data = vec![0x48, 0x00, 0x69, 0x00, 0x00, 0x00];
/// assert_eq!(parse_utf16le_string(&data), "Hi");
/// ```
pub fn parse_utf16le_string(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Split a byte slice into little-endian u16 code units; a trailing odd byte is dropped.
pub fn utf16_units(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Forward-only, bounds-checked reader over a byte slice.
///
/// Every read either returns the decoded value and advances, or fails with
/// [`BinaryError::InsufficientData`] and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a cursor positioned at `offset` (clamped to the end).
    #[inline]
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            pos: offset.min(data.len()),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Skip `n` bytes, clamping at the end of the buffer.
    #[inline]
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }

    #[inline]
    pub fn u8(&mut self) -> BinaryResult<u8> {
        let v = read_u8(self.data, self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    #[inline]
    pub fn i8(&mut self) -> BinaryResult<i8> {
        self.u8().map(|v| v as i8)
    }

    #[inline]
    pub fn u16(&mut self) -> BinaryResult<u16> {
        let v = read_u16_le(self.data, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub fn i16(&mut self) -> BinaryResult<i16> {
        let v = read_i16_le(self.data, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub fn u32(&mut self) -> BinaryResult<u32> {
        let v = read_u32_le(self.data, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    #[inline]
    pub fn i32(&mut self) -> BinaryResult<i32> {
        let v = read_i32_le(self.data, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    /// Borrow the next `n` bytes.
    pub fn bytes(&mut self, n: usize) -> BinaryResult<&'a [u8]> {
        check_len(self.data, self.pos, n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a length-prefixed UTF-16LE string (u16 character count, then units).
    pub fn utf16_string(&mut self) -> BinaryResult<String> {
        let start = self.pos;
        let len = self.u16()? as usize;
        match self.bytes(len * 2) {
            Ok(raw) => Ok(String::from_utf16_lossy(&utf16_units(raw))),
            Err(e) => {
                self.pos = start;
                Err(e)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert!(read_u16_le(&data, 0).is_ok_and(|v| v == 0x1234));
        assert!(read_u16_le(&data, 2).is_ok_and(|v| v == 0x5678));
        assert!(read_u16_le(&data, 3).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert!(read_u32_le(&data, 0).is_ok_and(|v| v == 0x12345678));
        assert!(read_u32_le(&data, 1).is_err());
        assert!(read_u32_le(&data, usize::MAX).is_err());
    }

    #[test]
    fn test_parse_utf16le() {
        let data = vec![
            0x48, 0x00, // 'H'
            0x65, 0x00, // 'e'
            0x6C, 0x00, // 'l'
            0x6C, 0x00, // 'l'
            0x6F, 0x00, // 'o'
            0x00, 0x00, // null terminator
        ];
        assert_eq!(parse_utf16le_string(&data), "Hello");
    }

    #[test]
    fn test_parse_utf16le_hangul() {
        // "한글"
        let data = [0x5C, 0xD5, 0x00, 0xAE];
        assert_eq!(parse_utf16le_string(&data), "한글");
    }

    #[test]
    fn test_cursor_reads_and_fails_in_place() {
        let data = [0x01, 0x02, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.u8().unwrap(), 1);
        assert_eq!(cursor.u16().unwrap(), 2);
        assert_eq!(cursor.i32().unwrap(), -1);
        assert!(cursor.is_empty());
        assert!(cursor.u8().is_err());
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn test_cursor_utf16_string() {
        let data = [0x02, 0x00, 0x41, 0x00, 0x42, 0x00, 0x03, 0x00, 0x41, 0x00];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.utf16_string().unwrap(), "AB");
        // Declared length runs past the end: error, position restored.
        assert!(cursor.utf16_string().is_err());
        assert_eq!(cursor.position(), 6);
    }
}
