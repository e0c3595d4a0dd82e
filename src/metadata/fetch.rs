use crate::error::TiffRasterResult;
use crate::reader::{EndianAwareReader, Endianness, RangeReader};

/// A positioned cursor over a [`RangeReader`] that decodes primitives in file byte order.
///
/// The position lives in the cursor, not in the reader, so independent cursors may share one
/// source.
pub(crate) struct MetadataCursor<'a, R: RangeReader + ?Sized> {
    reader: &'a R,
    offset: u64,
    endianness: Endianness,
}

impl<'a, R: RangeReader + ?Sized> MetadataCursor<'a, R> {
    pub fn new(reader: &'a R, endianness: Endianness) -> Self {
        Self {
            reader,
            offset: 0,
            endianness,
        }
    }

    pub fn new_with_offset(reader: &'a R, endianness: Endianness, offset: u64) -> Self {
        Self {
            reader,
            offset,
            endianness,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn seek(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Read the given number of bytes, advancing the internal cursor state by the same amount.
    pub(crate) fn read(&mut self, length: u64) -> TiffRasterResult<EndianAwareReader> {
        let end = self.offset.saturating_add(length);
        let range = self.offset..end;
        self.offset = end;
        let bytes = self.reader.get_bytes(range)?;
        Ok(EndianAwareReader::new(bytes, self.endianness))
    }

    /// Read a u16 from the cursor, advancing the internal state by 2 bytes.
    pub(crate) fn read_u16(&mut self) -> TiffRasterResult<u16> {
        self.read(2)?.read_u16()
    }

    /// Read a u32 from the cursor, advancing the internal state by 4 bytes.
    pub(crate) fn read_u32(&mut self) -> TiffRasterResult<u32> {
        self.read(4)?.read_u32()
    }
}
