//! Image geometry: dimensions and the strip or tile layout of the pixel data.

use std::ops::Range;

use crate::error::{TiffRasterError, TiffRasterResult};
use crate::ifd::Ifd;

/// ImageWidth and ImageLength as stored in the file.
///
/// Both are unsigned 32-bit in TIFF, so they are widened here and narrowed with
/// [`ImageDimensions::narrow`] before buffers are sized from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Pixels per row.
    pub image_width: u64,
    /// Number of rows.
    pub image_length: u64,
}

/// Dimensions that are known to fit a signed 32-bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrowDimensions {
    /// Pixels per row.
    pub width: u32,
    /// Number of rows.
    pub length: u32,
}

fn narrow(name: &'static str, value: u64) -> TiffRasterResult<u32> {
    if value > i32::MAX as u64 {
        return Err(TiffRasterError::DimensionOverflow { name, value });
    }
    Ok(value as u32)
}

impl ImageDimensions {
    /// Read the required ImageWidth and ImageLength tags.
    pub fn from_ifd(ifd: &Ifd) -> TiffRasterResult<Self> {
        Ok(Self {
            image_width: ifd.image_width()?,
            image_length: ifd.image_length()?,
        })
    }

    /// Fails with [`TiffRasterError::DimensionOverflow`] if either dimension exceeds `i32::MAX`.
    pub fn narrow(&self) -> TiffRasterResult<NarrowDimensions> {
        Ok(NarrowDimensions {
            width: narrow("ImageWidth", self.image_width)?,
            length: narrow("ImageLength", self.image_length)?,
        })
    }
}

fn check_parallel(kind: &'static str, offsets: &[u64], byte_counts: &[u64]) -> TiffRasterResult<()> {
    if offsets.len() != byte_counts.len() {
        return Err(TiffRasterError::InconsistentLayout {
            kind,
            offsets: offsets.len(),
            byte_counts: byte_counts.len(),
        });
    }
    Ok(())
}

fn byte_range(offset: u64, byte_count: u64) -> TiffRasterResult<Range<u64>> {
    let end = offset
        .checked_add(byte_count)
        .ok_or(TiffRasterError::DimensionOverflow {
            name: "chunk end offset",
            value: offset,
        })?;
    Ok(offset..end)
}

/// RowsPerStrip together with the StripOffsets and StripByteCounts arrays.
///
/// Strip `i` holds rows `[i * rows_per_strip, (i + 1) * rows_per_strip)`, the last strip may hold
/// fewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripInfo {
    rows_per_strip: u64,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl StripInfo {
    /// Fails if the arrays differ in length or `rows_per_strip` is zero.
    pub fn new(rows_per_strip: u64, offsets: Vec<u64>, byte_counts: Vec<u64>) -> TiffRasterResult<Self> {
        check_parallel("strip", &offsets, &byte_counts)?;
        if rows_per_strip == 0 {
            return Err(TiffRasterError::Unsupported("RowsPerStrip of 0".to_string()));
        }
        Ok(Self {
            rows_per_strip,
            offsets,
            byte_counts,
        })
    }

    /// The strip layout of `ifd`, `None` if it has no StripOffsets or no StripByteCounts.
    pub fn from_ifd(ifd: &Ifd) -> TiffRasterResult<Option<Self>> {
        match (ifd.strip_offsets()?, ifd.strip_byte_counts()?) {
            (Some(offsets), Some(byte_counts)) => {
                Self::new(ifd.rows_per_strip()?, offsets, byte_counts).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Rows in every strip but the last.
    pub fn rows_per_strip(&self) -> u64 {
        self.rows_per_strip
    }

    /// StripOffsets
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// StripByteCounts
    pub fn byte_counts(&self) -> &[u64] {
        &self.byte_counts
    }

    /// Number of strips.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if there are no chunks.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The file byte range of strip `index`.
    ///
    /// Panics if `index` is out of bounds.
    pub fn byte_range(&self, index: usize) -> TiffRasterResult<Range<u64>> {
        byte_range(self.offsets[index], self.byte_counts[index])
    }
}

/// TileWidth, TileLength, TileOffsets and TileByteCounts.
///
/// Tiles are numbered left to right, then top to bottom. Tiles on the right and bottom edges
/// may extend past the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileInfo {
    width: u64,
    length: u64,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl TileInfo {
    /// Fails if the arrays differ in length or either tile dimension is zero.
    pub fn new(width: u64, length: u64, offsets: Vec<u64>, byte_counts: Vec<u64>) -> TiffRasterResult<Self> {
        check_parallel("tile", &offsets, &byte_counts)?;
        if width == 0 || length == 0 {
            return Err(TiffRasterError::Unsupported(format!(
                "tile dimensions of {width}x{length}"
            )));
        }
        Ok(Self {
            width,
            length,
            offsets,
            byte_counts,
        })
    }

    /// The tile layout of `ifd`, `None` unless all four tile tags are present.
    pub fn from_ifd(ifd: &Ifd) -> TiffRasterResult<Option<Self>> {
        match (
            ifd.tile_width()?,
            ifd.tile_length()?,
            ifd.tile_offsets()?,
            ifd.tile_byte_counts()?,
        ) {
            (Some(width), Some(length), Some(offsets), Some(byte_counts)) => {
                Self::new(width, length, offsets, byte_counts).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Tile width in pixels.
    pub fn width(&self) -> u64 {
        self.width
    }

    /// Tile length in rows.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// TileOffsets
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// TileByteCounts
    pub fn byte_counts(&self) -> &[u64] {
        &self.byte_counts
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if there are no chunks.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Number of tiles needed to cover one row of an image `image_width` pixels wide.
    pub fn tiles_across(&self, image_width: u64) -> u64 {
        image_width.div_ceil(self.width)
    }

    /// Number of tile rows needed to cover an image `image_length` rows long.
    pub fn tiles_down(&self, image_length: u64) -> u64 {
        image_length.div_ceil(self.length)
    }

    /// The file byte range of tile `index`.
    ///
    /// Panics if `index` is out of bounds.
    pub fn byte_range(&self, index: usize) -> TiffRasterResult<Range<u64>> {
        byte_range(self.offsets[index], self.byte_counts[index])
    }
}
