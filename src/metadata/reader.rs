use std::collections::HashSet;
use std::io::Read;

use bytes::Bytes;
use log::{debug, trace, warn};

use crate::error::{TiffRasterError, TiffRasterResult};
use crate::ifd::{Entry, Ifd, Rational, SRational};
use crate::metadata::fetch::MetadataCursor;
use crate::reader::{EndianAwareReader, Endianness, RangeReader};
use crate::tiff::tags::Type;

/// The 8-byte header at the start of every TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order of every multi-byte value in the file.
    pub endianness: Endianness,
    /// File offset of the first IFD.
    pub first_ifd_offset: u64,
}

/// Entry point to reading TIFF metadata.
///
/// This is a stateful reader because we don't know how many IFDs will be encountered.
///
/// ```ignore
/// // reader implements RangeReader
/// let mut metadata_reader = TiffMetadataReader::try_open(&reader)?;
/// let ifds = metadata_reader.read_all_ifds(&reader)?;
/// ```
#[derive(Debug)]
pub struct TiffMetadataReader {
    header: TiffHeader,
    next_ifd_offset: Option<u64>,
    visited: HashSet<u64>,
}

impl TiffMetadataReader {
    /// Open a new TIFF file, validating the magic bytes, reading the endianness and the offset
    /// of the first IFD.
    ///
    /// This does not read any IFD metadata.
    pub fn try_open<R: RangeReader + ?Sized>(reader: &R) -> TiffRasterResult<Self> {
        let magic_bytes = reader.get_bytes(0..2)?;

        // Should be b"II" for little endian or b"MM" for big endian
        let endianness = if magic_bytes == Bytes::from_static(b"II") {
            Endianness::LittleEndian
        } else if magic_bytes == Bytes::from_static(b"MM") {
            Endianness::BigEndian
        } else {
            return Err(TiffRasterError::InvalidHeader(format!(
                "unexpected magic bytes {magic_bytes:?}"
            )));
        };

        // Set offset to 2 since we've already read magic bytes.
        let mut cursor = MetadataCursor::new(reader, endianness).with_offset(2);

        match cursor.read_u16()? {
            42 => {}
            43 => return Err(TiffRasterError::Unsupported("BigTIFF files".to_string())),
            version => {
                return Err(TiffRasterError::InvalidHeader(format!(
                    "unexpected version {version}"
                )))
            }
        }

        let first_ifd_offset = cursor.read_u32()?.into();
        debug!("Opened TIFF header: {endianness:?}, first IFD at {first_ifd_offset}");

        Ok(Self {
            header: TiffHeader {
                endianness,
                first_ifd_offset,
            },
            next_ifd_offset: (first_ifd_offset != 0).then_some(first_ifd_offset),
            visited: HashSet::new(),
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> TiffHeader {
        self.header
    }

    /// Returns the endianness of the file.
    pub fn endianness(&self) -> Endianness {
        self.header.endianness
    }

    /// Returns `true` if there are more IFDs to read.
    pub fn has_next_ifd(&self) -> bool {
        self.next_ifd_offset.is_some()
    }

    /// The byte offset of the start of the next IFD.
    ///
    /// This will be `None` if all IFDs have already been read.
    pub fn next_ifd_offset(&self) -> Option<u64> {
        self.next_ifd_offset
    }

    /// Read the next IFD from the file.
    ///
    /// If there are no more IFDs, returns `None`. Fails with [`TiffRasterError::IfdCycle`] if
    /// the chain of next-IFD offsets revisits an IFD.
    pub fn read_next_ifd<R: RangeReader + ?Sized>(
        &mut self,
        reader: &R,
    ) -> TiffRasterResult<Option<Ifd>> {
        if let Some(ifd_start) = self.next_ifd_offset {
            if !self.visited.insert(ifd_start) {
                return Err(TiffRasterError::IfdCycle(ifd_start));
            }
            let ifd_reader =
                ImageFileDirectoryReader::open(reader, ifd_start, self.header.endianness)?;
            let entries = ifd_reader.read(reader)?;
            let next_ifd_offset = ifd_reader.finish(reader)?;
            debug!(
                "Read IFD at {ifd_start} with {} entries, next IFD at {next_ifd_offset:?}",
                entries.len()
            );
            self.next_ifd_offset = next_ifd_offset;
            Ok(Some(Ifd::new(entries, next_ifd_offset)))
        } else {
            Ok(None)
        }
    }

    /// Read all IFDs from the file.
    pub fn read_all_ifds<R: RangeReader + ?Sized>(
        &mut self,
        reader: &R,
    ) -> TiffRasterResult<Vec<Ifd>> {
        let mut ifds = vec![];
        while let Some(ifd) = self.read_next_ifd(reader)? {
            ifds.push(ifd);
        }
        Ok(ifds)
    }
}

/// Reads the entries of a single IFD.
///
/// TIFF metadata is not necessarily contiguous in the files: IFDs are normally all stored
/// contiguously in the header, but the format allows them to be non-contiguous or spread out
/// through the file.
///
/// Note that you must call [`finish`][ImageFileDirectoryReader::finish] to read the offset of the
/// following IFD.
#[derive(Debug)]
pub struct ImageFileDirectoryReader {
    endianness: Endianness,
    /// The byte offset of the beginning of this IFD
    ifd_start_offset: u64,
    /// The number of tags in this IFD
    tag_count: u64,
}

impl ImageFileDirectoryReader {
    /// Each entry: tag (2 bytes), type (2 bytes), count (4 bytes), value or offset (4 bytes).
    const ENTRY_BYTE_SIZE: u64 = 12;
    /// The size of the entry count that starts the IFD.
    const TAG_COUNT_BYTE_SIZE: u64 = 2;

    /// Read the entry count of the IFD starting at the given file offset
    pub fn open<R: RangeReader + ?Sized>(
        reader: &R,
        ifd_start_offset: u64,
        endianness: Endianness,
    ) -> TiffRasterResult<Self> {
        let mut cursor = MetadataCursor::new_with_offset(reader, endianness, ifd_start_offset);
        let tag_count = cursor.read_u16()?.into();
        Ok(Self {
            endianness,
            ifd_start_offset,
            tag_count,
        })
    }

    /// The number of entries declared by this IFD.
    pub fn tag_count(&self) -> u64 {
        self.tag_count
    }

    /// Manually read the entry with the specified index.
    ///
    /// Returns `None` for an entry whose field type is not one of the twelve TIFF 6.0 types.
    ///
    /// Fails with [`TiffRasterError::TagIndexOutOfRange`] if `tag_idx` is not below the tag count.
    pub fn read_tag<R: RangeReader + ?Sized>(
        &self,
        reader: &R,
        tag_idx: u64,
    ) -> TiffRasterResult<Option<Entry>> {
        if tag_idx >= self.tag_count {
            return Err(TiffRasterError::TagIndexOutOfRange {
                index: tag_idx,
                count: self.tag_count,
            });
        }
        let tag_offset = self.ifd_start_offset
            + Self::TAG_COUNT_BYTE_SIZE
            + (Self::ENTRY_BYTE_SIZE * tag_idx);
        read_tag(reader, tag_offset, self.endianness)
    }

    /// Read all entries out of this IFD, in file order.
    ///
    /// Keep in mind that you'll still need to call [`finish`][Self::finish] to get the byte offset
    /// of the next IFD.
    pub fn read<R: RangeReader + ?Sized>(&self, reader: &R) -> TiffRasterResult<Vec<Entry>> {
        let mut entries = Vec::with_capacity(self.tag_count as usize);
        for tag_idx in 0..self.tag_count {
            if let Some(entry) = self.read_tag(reader, tag_idx)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Finish this reader, reading the byte offset of the next IFD
    pub fn finish<R: RangeReader + ?Sized>(self, reader: &R) -> TiffRasterResult<Option<u64>> {
        // The byte offset for reading the next ifd
        let next_ifd_byte_offset = self.ifd_start_offset
            + Self::TAG_COUNT_BYTE_SIZE
            + (Self::ENTRY_BYTE_SIZE * self.tag_count);
        let mut cursor =
            MetadataCursor::new_with_offset(reader, self.endianness, next_ifd_byte_offset);
        let next_ifd_offset: u64 = cursor.read_u32()?.into();

        // If the ifd_offset is 0, no more IFDs
        if next_ifd_offset == 0 {
            Ok(None)
        } else {
            Ok(Some(next_ifd_offset))
        }
    }
}

/// Read a single entry starting at `tag_offset`
fn read_tag<R: RangeReader + ?Sized>(
    reader: &R,
    tag_offset: u64,
    endianness: Endianness,
) -> TiffRasterResult<Option<Entry>> {
    let mut cursor = MetadataCursor::new_with_offset(reader, endianness, tag_offset);

    let tag = cursor.read_u16()?;
    let tag_type_code = cursor.read_u16()?;
    let count: u64 = cursor.read_u32()?.into();

    let Ok(tag_type) = Type::try_from(tag_type_code) else {
        warn!("Skipping tag {tag} with unknown field type {tag_type_code}");
        return Ok(None);
    };

    let entry = read_tag_value(&mut cursor, tag, tag_type, count)?;
    trace!("Read tag {tag} as {tag_type:?} with {count} values");
    Ok(Some(entry))
}

/// Read an entry's values, either from the 4-byte value field or from the offset it holds.
///
/// The cursor must be positioned at the value field.
fn read_tag_value<R: RangeReader + ?Sized>(
    cursor: &mut MetadataCursor<'_, R>,
    tag: u16,
    tag_type: Type,
    count: u64,
) -> TiffRasterResult<Entry> {
    let value_byte_length =
        count
            .checked_mul(tag_type.size())
            .ok_or(TiffRasterError::DimensionOverflow {
                name: "entry byte length",
                value: count,
            })?;

    let mut data = if count <= tag_type.max_inline_count() {
        cursor.read(value_byte_length)?
    } else {
        let offset = cursor.read_u32()?;
        cursor.seek(offset.into());
        cursor.read(value_byte_length)?
    };

    decode_values(&mut data, tag, tag_type, count as usize)
}

fn decode_values(
    data: &mut EndianAwareReader,
    tag: u16,
    tag_type: Type,
    count: usize,
) -> TiffRasterResult<Entry> {
    fn collect<T>(
        count: usize,
        mut read: impl FnMut() -> TiffRasterResult<T>,
    ) -> TiffRasterResult<Vec<T>> {
        (0..count).map(|_| read()).collect()
    }

    fn raw(data: &mut EndianAwareReader, count: usize) -> TiffRasterResult<Vec<u8>> {
        let mut buf = vec![0; count];
        data.read_exact(&mut buf)?;
        Ok(buf)
    }

    Ok(match tag_type {
        Type::Byte => Entry::Byte { tag, values: raw(data, count)? },
        Type::Ascii => Entry::Ascii { tag, values: raw(data, count)? },
        Type::Undefined => Entry::Undefined { tag, values: raw(data, count)? },
        Type::SByte => Entry::SByte {
            tag,
            values: collect(count, || data.read_i8())?,
        },
        Type::Short => Entry::Short {
            tag,
            values: collect(count, || data.read_u16())?,
        },
        Type::SShort => Entry::SShort {
            tag,
            values: collect(count, || data.read_i16())?,
        },
        Type::Long => Entry::Long {
            tag,
            values: collect(count, || data.read_u32())?,
        },
        Type::SLong => Entry::SLong {
            tag,
            values: collect(count, || data.read_i32())?,
        },
        Type::Rational => Entry::Rational {
            tag,
            values: collect(count, || {
                Ok(Rational {
                    numerator: data.read_u32()?,
                    denominator: data.read_u32()?,
                })
            })?,
        },
        Type::SRational => Entry::SRational {
            tag,
            values: collect(count, || {
                Ok(SRational {
                    numerator: data.read_i32()?,
                    denominator: data.read_i32()?,
                })
            })?,
        },
        Type::Float => Entry::Float {
            tag,
            values: collect(count, || data.read_f32())?,
        },
        Type::Double => Entry::Double {
            tag,
            values: collect(count, || data.read_f64())?,
        },
    })
}
