//! Record stream walker.
//!
//! Every record starts with a little-endian `u32` header: bits 0..10 hold
//! the tag, bits 10..20 the nesting level and bits 20..32 the payload size.
//! A size of `0xFFF` means the real size follows as another `u32`.

use crate::common::binary::read_u32_le;

/// Size value announcing an extended size field
const SIZE_ESCAPE: u32 = 0xFFF;

/// One record borrowed from a stream buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub tag: u16,
    pub level: u16,
    pub data: &'a [u8],
    /// Offset of the record header in the stream
    pub offset: usize,
}

/// Iterator over the records of a stream.
///
/// Never reads past the buffer: a truncated trailing header ends iteration
/// and a payload running past the end is clamped to what is available.
#[derive(Debug, Clone)]
pub struct RecordIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Restart iteration at `offset`, typically a previous [`Record::offset`].
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            pos: offset.min(data.len()),
        }
    }

    /// Offset of the next header.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.pos;
        let header = read_u32_le(self.data, offset).ok()?;
        let tag = (header & 0x3FF) as u16;
        let level = ((header >> 10) & 0x3FF) as u16;
        let mut size = header >> 20;
        let mut start = offset + 4;

        if size == SIZE_ESCAPE {
            size = read_u32_le(self.data, start).ok()?;
            start += 4;
        }

        let end = start.saturating_add(size as usize).min(self.data.len());
        if end - start < size as usize {
            tracing::debug!(
                tag,
                offset,
                declared = size,
                available = end - start,
                "record payload clamped to stream end"
            );
        }
        self.pos = end;
        Some(Record {
            tag,
            level,
            data: &self.data[start..end],
            offset,
        })
    }
}
