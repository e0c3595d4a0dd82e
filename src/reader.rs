//! Abstractions for positioned reads.

use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use bytes::buf::Reader;
use bytes::{Buf, Bytes};

use crate::error::{TiffRasterError, TiffRasterResult};

/// The interface used to read byte ranges out of a TIFF source.
///
/// Every call names its own range, so implementations must not depend on an implicit cursor.
/// Independent callers may decode different images of the same source at the same time.
///
/// Notes:
///
/// 1. [`Bytes`] implements this interface for sources that are already in memory.
///
/// 2. [`FileReader`] implements it for files on disk using positioned reads.
pub trait RangeReader: Debug + Send + Sync {
    /// Retrieve the bytes in `range`.
    fn get_bytes(&self, range: Range<u64>) -> TiffRasterResult<Bytes>;

    /// Total length of the source in bytes, `None` if it is not known without reading.
    ///
    /// Decoders use this to reject chunks that end past the source before sizing buffers.
    fn source_len(&self) -> TiffRasterResult<Option<u64>> {
        Ok(None)
    }

    /// Retrieve multiple byte ranges. The default implementation will call `get_bytes`
    /// sequentially
    fn get_byte_ranges(&self, ranges: Vec<Range<u64>>) -> TiffRasterResult<Vec<Bytes>> {
        let mut result = Vec::with_capacity(ranges.len());

        for range in ranges.into_iter() {
            let data = self.get_bytes(range)?;
            result.push(data);
        }

        Ok(result)
    }
}

/// This allows Box<dyn RangeReader + '_> to be used as a RangeReader,
impl RangeReader for Box<dyn RangeReader + '_> {
    fn get_bytes(&self, range: Range<u64>) -> TiffRasterResult<Bytes> {
        self.as_ref().get_bytes(range)
    }

    fn source_len(&self) -> TiffRasterResult<Option<u64>> {
        self.as_ref().source_len()
    }

    fn get_byte_ranges(&self, ranges: Vec<Range<u64>>) -> TiffRasterResult<Vec<Bytes>> {
        self.as_ref().get_byte_ranges(ranges)
    }
}

/// This allows Arc<dyn RangeReader + '_> to be used as a RangeReader,
impl RangeReader for Arc<dyn RangeReader + '_> {
    fn get_bytes(&self, range: Range<u64>) -> TiffRasterResult<Bytes> {
        self.as_ref().get_bytes(range)
    }

    fn source_len(&self) -> TiffRasterResult<Option<u64>> {
        self.as_ref().source_len()
    }

    fn get_byte_ranges(&self, ranges: Vec<Range<u64>>) -> TiffRasterResult<Vec<Bytes>> {
        self.as_ref().get_byte_ranges(ranges)
    }
}

impl RangeReader for Bytes {
    fn get_bytes(&self, range: Range<u64>) -> TiffRasterResult<Bytes> {
        let requested = range.end.saturating_sub(range.start);
        let len = self.len() as u64;
        if range.start > range.end || range.end > len {
            let available = len.saturating_sub(range.start.min(len));
            return Err(TiffRasterError::EndOfFile(requested, available));
        }
        Ok(self.slice(range.start as usize..range.end as usize))
    }

    fn source_len(&self) -> TiffRasterResult<Option<u64>> {
        Ok(Some(self.len() as u64))
    }
}

/// A [`RangeReader`] over a file on disk.
///
/// On unix this uses `pread`-style positioned reads, so concurrent callers never share a
/// cursor. Elsewhere the file is kept behind a `Mutex` and every read seeks first.
#[derive(Debug)]
pub struct FileReader {
    #[cfg(unix)]
    file: File,
    #[cfg(not(unix))]
    file: std::sync::Mutex<File>,
}

impl FileReader {
    /// Wrap an already opened file.
    pub fn new(file: File) -> Self {
        #[cfg(unix)]
        {
            Self { file }
        }
        #[cfg(not(unix))]
        {
            Self {
                file: std::sync::Mutex::new(file),
            }
        }
    }

    /// Open the file at `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> TiffRasterResult<Self> {
        Ok(Self::new(File::open(path)?))
    }

    #[cfg(unix)]
    fn file_len(&self) -> std::io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    #[cfg(not(unix))]
    fn file_len(&self) -> std::io::Result<u64> {
        let file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(file.metadata()?.len())
    }

    #[cfg(unix)]
    fn read_range(&self, start: u64, buffer: &mut [u8]) -> std::io::Result<()> {
        use std::os::unix::fs::FileExt;

        self.file.read_exact_at(buffer, start)
    }

    #[cfg(not(unix))]
    fn read_range(&self, start: u64, buffer: &mut [u8]) -> std::io::Result<()> {
        use std::io::{Seek, SeekFrom};

        let mut file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(buffer)
    }
}

impl RangeReader for FileReader {
    fn get_bytes(&self, range: Range<u64>) -> TiffRasterResult<Bytes> {
        let to_read = range.end.saturating_sub(range.start);
        let file_len = self.file_len()?;
        if range.start > range.end || range.end > file_len {
            let available = file_len.saturating_sub(range.start.min(file_len));
            return Err(TiffRasterError::EndOfFile(to_read, available));
        }
        let len = usize::try_from(to_read).map_err(|_| TiffRasterError::DimensionOverflow {
            name: "read length",
            value: to_read,
        })?;
        let mut buffer = vec![0; len];
        match self.read_range(range.start, &mut buffer) {
            Ok(()) => Ok(buffer.into()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(TiffRasterError::EndOfFile(to_read, 0))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn source_len(&self) -> TiffRasterResult<Option<u64>> {
        Ok(Some(self.file_len()?))
    }
}

/// Endianness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Little Endian
    LittleEndian,
    /// Big Endian
    BigEndian,
}

pub(crate) struct EndianAwareReader {
    reader: Reader<Bytes>,
    endianness: Endianness,
}

impl EndianAwareReader {
    pub(crate) fn new(bytes: Bytes, endianness: Endianness) -> Self {
        Self {
            reader: bytes.reader(),
            endianness,
        }
    }

    /// Read a u8 from the cursor, advancing the internal state by 1 byte.
    pub(crate) fn read_u8(&mut self) -> TiffRasterResult<u8> {
        Ok(self.reader.read_u8()?)
    }

    /// Read a i8 from the cursor, advancing the internal state by 1 byte.
    pub(crate) fn read_i8(&mut self) -> TiffRasterResult<i8> {
        Ok(self.reader.read_i8()?)
    }

    pub(crate) fn read_u16(&mut self) -> TiffRasterResult<u16> {
        match self.endianness {
            Endianness::LittleEndian => Ok(self.reader.read_u16::<LittleEndian>()?),
            Endianness::BigEndian => Ok(self.reader.read_u16::<BigEndian>()?),
        }
    }

    pub(crate) fn read_i16(&mut self) -> TiffRasterResult<i16> {
        match self.endianness {
            Endianness::LittleEndian => Ok(self.reader.read_i16::<LittleEndian>()?),
            Endianness::BigEndian => Ok(self.reader.read_i16::<BigEndian>()?),
        }
    }

    pub(crate) fn read_u32(&mut self) -> TiffRasterResult<u32> {
        match self.endianness {
            Endianness::LittleEndian => Ok(self.reader.read_u32::<LittleEndian>()?),
            Endianness::BigEndian => Ok(self.reader.read_u32::<BigEndian>()?),
        }
    }

    pub(crate) fn read_i32(&mut self) -> TiffRasterResult<i32> {
        match self.endianness {
            Endianness::LittleEndian => Ok(self.reader.read_i32::<LittleEndian>()?),
            Endianness::BigEndian => Ok(self.reader.read_i32::<BigEndian>()?),
        }
    }

    pub(crate) fn read_f32(&mut self) -> TiffRasterResult<f32> {
        match self.endianness {
            Endianness::LittleEndian => Ok(self.reader.read_f32::<LittleEndian>()?),
            Endianness::BigEndian => Ok(self.reader.read_f32::<BigEndian>()?),
        }
    }

    pub(crate) fn read_f64(&mut self) -> TiffRasterResult<f64> {
        match self.endianness {
            Endianness::LittleEndian => Ok(self.reader.read_f64::<LittleEndian>()?),
            Endianness::BigEndian => Ok(self.reader.read_f64::<BigEndian>()?),
        }
    }
}

impl AsRef<[u8]> for EndianAwareReader {
    fn as_ref(&self) -> &[u8] {
        self.reader.get_ref().as_ref()
    }
}

impl Read for EndianAwareReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}
