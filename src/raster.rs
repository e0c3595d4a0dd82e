//! Reassembly of strips and tiles into one row-major raster.

use std::ops::Range;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::{debug, warn};

use crate::decoder::{Compressor, CompressorRegistry, COMPRESSION_NONE};
use crate::error::{TiffRasterError, TiffRasterResult};
use crate::ifd::Ifd;
use crate::layout::{ImageDimensions, StripInfo, TileInfo};
use crate::predictor::{predictor_for, DifferencingPredictor};
use crate::reader::{Endianness, RangeReader};
use crate::tiff::tags::{PlanarConfiguration, SampleFormat};

/// Decoded samples of a raster, in row-major order, in native byte order.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// 1, 2, 4 or 8 bit samples, one byte each.
    Bytes(Vec<u8>),
    /// 16 bit samples.
    Shorts(Vec<u16>),
    /// 32 bit integer samples.
    Ints(Vec<u32>),
    /// 32 bit IEEE floating point samples.
    Floats(Vec<f32>),
}

impl Samples {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Samples::Bytes(v) => v.len(),
            Samples::Shorts(v) => v.len(),
            Samples::Ints(v) => v.len(),
            Samples::Floats(v) => v.len(),
        }
    }

    /// `true` if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The pixel data of one image.
///
/// Row `r` holds `width * components_per_pixel` samples starting at
/// `r * width * components_per_pixel`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    length: u32,
    components_per_pixel: usize,
    bits_per_sample: u16,
    sample_format: u16,
    samples: Samples,
}

impl Raster {
    /// Pixels per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Samples per pixel.
    pub fn components_per_pixel(&self) -> usize {
        self.components_per_pixel
    }

    /// Bits per sample as stored in the file. Sub-byte samples are already unpacked to one
    /// byte each.
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// The SampleFormat of the first component.
    pub fn sample_format(&self) -> u16 {
        self.sample_format
    }

    /// Number of samples in one row.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.components_per_pixel
    }

    /// The decoded samples.
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Take ownership of the decoded samples.
    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// The samples as one byte each, or the raster back unchanged if they are wider.
    pub fn into_bytes(self) -> Result<Vec<u8>, Self> {
        match self.samples {
            Samples::Bytes(v) => Ok(v),
            samples => Err(Self { samples, ..self }),
        }
    }
}

/// Everything needed to turn one strip or tile row back into image bytes.
struct Geometry {
    width: usize,
    length: usize,
    components: usize,
    bits_per_sample: u16,
    /// Bytes per image row, rows padded to a whole byte.
    row_bytes: usize,
}

impl Geometry {
    fn bytes_per_pixel(&self) -> usize {
        self.components * self.bits_per_sample as usize / 8
    }
}

fn to_usize(name: &'static str, value: u64) -> TiffRasterResult<usize> {
    usize::try_from(value).map_err(|_| TiffRasterError::DimensionOverflow { name, value })
}

fn checked_product(name: &'static str, factors: &[usize]) -> TiffRasterResult<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or(TiffRasterError::DimensionOverflow {
            name,
            value: factors.iter().map(|&f| f as u64).fold(1u64, u64::saturating_mul),
        })
}

/// A zero filled vector of `len` values, failing instead of aborting when it cannot be allocated.
fn zeroed<T: Clone + Default>(name: &'static str, len: usize) -> TiffRasterResult<Vec<T>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|_| TiffRasterError::DimensionOverflow {
            name,
            value: len as u64,
        })?;
    values.resize(len, T::default());
    Ok(values)
}

fn uniform_bits_per_sample(bits: &[u16]) -> TiffRasterResult<u16> {
    match bits.split_first() {
        Some((&first, rest)) if rest.iter().all(|&b| b == first) => Ok(first),
        Some(_) => Err(TiffRasterError::Unsupported(format!(
            "non-uniform BitsPerSample {bits:?}"
        ))),
        None => Err(TiffRasterError::Unsupported(
            "empty BitsPerSample".to_string(),
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SampleKind {
    Bytes,
    Shorts,
    Ints,
    Floats,
}

impl SampleKind {
    fn select(bits_per_sample: u16, sample_format: u16) -> TiffRasterResult<Self> {
        let float = sample_format == u16::from(SampleFormat::IEEEFP);
        match (bits_per_sample, float) {
            (1 | 2 | 4 | 8, false) => Ok(Self::Bytes),
            (16, false) => Ok(Self::Shorts),
            (32, false) => Ok(Self::Ints),
            (32, true) => Ok(Self::Floats),
            _ => Err(TiffRasterError::Unsupported(format!(
                "{bits_per_sample} bits per sample with SampleFormat {sample_format}"
            ))),
        }
    }
}

/// How strips map onto image rows.
struct StripPlan {
    rows_per_strip: usize,
    /// Strips `0..needed` hold image rows, later ones are skipped.
    needed: usize,
}

/// How tiles map onto the image.
struct TilePlan {
    tile_width: usize,
    tile_length: usize,
    pixel_bytes: usize,
    tile_row_bytes: usize,
    tile_bytes: usize,
    across: usize,
    down: usize,
    /// Tiles `0..needed` cover the image, later ones are skipped.
    needed: usize,
}

/// The chunk layout of an image, checked against the image geometry.
enum Layout {
    Strips(StripInfo, StripPlan),
    Tiles(TileInfo, TilePlan),
}

impl Layout {
    /// Pick the layout of `ifd` and check that its chunks cover every image row.
    ///
    /// Byte counts are checked as well when the chunks are stored uncompressed.
    fn plan(ifd: &Ifd, geometry: &Geometry, uncompressed: bool) -> TiffRasterResult<Self> {
        if let Some(strips) = StripInfo::from_ifd(ifd)? {
            let plan = Self::plan_strips(&strips, geometry, uncompressed)?;
            Ok(Self::Strips(strips, plan))
        } else if let Some(tiles) = TileInfo::from_ifd(ifd)? {
            let plan = Self::plan_tiles(&tiles, geometry, uncompressed)?;
            Ok(Self::Tiles(tiles, plan))
        } else {
            Err(TiffRasterError::NoRasterLayout)
        }
    }

    fn plan_strips(strips: &StripInfo, geometry: &Geometry, uncompressed: bool) -> TiffRasterResult<StripPlan> {
        let rows_per_strip = to_usize("RowsPerStrip", strips.rows_per_strip())?.min(geometry.length);
        let needed = geometry.length.div_ceil(rows_per_strip);
        if strips.len() < needed {
            return Err(TiffRasterError::MalformedStrip {
                index: strips.len(),
                expected: rows_per_strip as u64,
                actual: 0,
            });
        }
        if uncompressed {
            for (index, &byte_count) in strips.byte_counts().iter().take(needed).enumerate() {
                let rows = byte_count / geometry.row_bytes as u64;
                let expected = (geometry.length - index * rows_per_strip).min(rows_per_strip) as u64;
                if rows < expected {
                    return Err(TiffRasterError::MalformedStrip {
                        index,
                        expected,
                        actual: rows,
                    });
                }
            }
        }
        Ok(StripPlan {
            rows_per_strip,
            needed,
        })
    }

    fn plan_tiles(tiles: &TileInfo, geometry: &Geometry, uncompressed: bool) -> TiffRasterResult<TilePlan> {
        if geometry.bits_per_sample < 8 {
            return Err(TiffRasterError::Unsupported(format!(
                "tiled images with {} bits per sample",
                geometry.bits_per_sample
            )));
        }
        let tile_width = to_usize("TileWidth", tiles.width())?;
        let tile_length = to_usize("TileLength", tiles.length())?;
        let pixel_bytes = geometry.bytes_per_pixel();
        let tile_row_bytes = checked_product("tile row bytes", &[tile_width, pixel_bytes])?;
        let tile_bytes = checked_product("tile bytes", &[tile_row_bytes, tile_length])?;
        let across = to_usize("tiles across", tiles.tiles_across(geometry.width as u64))?;
        let down = to_usize("tiles down", tiles.tiles_down(geometry.length as u64))?;
        let needed = checked_product("tile count", &[across, down])?;
        if tiles.len() < needed {
            return Err(TiffRasterError::MalformedTile {
                index: tiles.len(),
                expected: tile_bytes,
                actual: 0,
            });
        }
        if uncompressed {
            for (index, &byte_count) in tiles.byte_counts().iter().take(needed).enumerate() {
                if byte_count != tile_bytes as u64 {
                    return Err(TiffRasterError::MalformedTile {
                        index,
                        expected: tile_bytes,
                        actual: to_usize("tile byte count", byte_count)?,
                    });
                }
            }
        }
        Ok(TilePlan {
            tile_width,
            tile_length,
            pixel_bytes,
            tile_row_bytes,
            tile_bytes,
            across,
            down,
            needed,
        })
    }

    fn needed(&self) -> usize {
        match self {
            Self::Strips(_, plan) => plan.needed,
            Self::Tiles(_, plan) => plan.needed,
        }
    }

    fn byte_range(&self, index: usize) -> TiffRasterResult<Range<u64>> {
        match self {
            Self::Strips(strips, _) => strips.byte_range(index),
            Self::Tiles(tiles, _) => tiles.byte_range(index),
        }
    }

    /// Fail with [`TiffRasterError::EndOfFile`] if a chunk that will be read ends past the source.
    fn check_in_source<R: RangeReader + ?Sized>(&self, reader: &R) -> TiffRasterResult<()> {
        let Some(source_len) = reader.source_len()? else {
            return Ok(());
        };
        for index in 0..self.needed() {
            let range = self.byte_range(index)?;
            if range.end > source_len {
                return Err(TiffRasterError::EndOfFile(
                    range.end - range.start,
                    source_len.saturating_sub(range.start),
                ));
            }
        }
        Ok(())
    }
}

/// Read, decompress and reassemble the pixel data described by `ifd`.
///
/// Strips are used when StripOffsets and StripByteCounts are present, tiles otherwise. The
/// layout is checked to cover the whole image before the output buffer is allocated.
pub fn read_raster<R: RangeReader + ?Sized>(
    reader: &R,
    ifd: &Ifd,
    endianness: Endianness,
    compressors: &CompressorRegistry,
) -> TiffRasterResult<Raster> {
    let dimensions = ImageDimensions::from_ifd(ifd)?.narrow()?;
    let bits_per_sample = uniform_bits_per_sample(&ifd.bits_per_sample()?)?;
    let components = ifd.samples_per_pixel()? as usize;
    if components == 0 {
        return Err(TiffRasterError::Unsupported(
            "SamplesPerPixel of 0".to_string(),
        ));
    }
    if components > 1 {
        let planar_configuration = ifd.planar_configuration()?;
        if planar_configuration != u16::from(PlanarConfiguration::Chunky) {
            return Err(TiffRasterError::Unsupported(format!(
                "PlanarConfiguration {planar_configuration}"
            )));
        }
    }
    let sample_format = ifd
        .sample_format()?
        .first()
        .copied()
        .unwrap_or(u16::from(SampleFormat::Uint));
    let kind = SampleKind::select(bits_per_sample, sample_format)?;

    let width = dimensions.width as usize;
    let length = dimensions.length as usize;
    let row_bits = checked_product("row bits", &[width, components, bits_per_sample as usize])?;
    let geometry = Geometry {
        width,
        length,
        components,
        bits_per_sample,
        row_bytes: row_bits.div_ceil(8),
    };
    let image_bytes = checked_product("image bytes", &[geometry.row_bytes, length])?;

    let buffer = if image_bytes == 0 {
        Vec::new()
    } else {
        let compression = ifd.compression()?;
        let compressor = compressors.compressor_for(compression)?;
        let predictor = predictor_for(ifd.predictor()?, bits_per_sample, components, endianness)?;
        let layout = Layout::plan(ifd, &geometry, compression == COMPRESSION_NONE)?;
        layout.check_in_source(reader)?;

        let mut buffer = zeroed("image bytes", image_bytes)?;
        match &layout {
            Layout::Strips(strips, plan) => read_strips(
                reader,
                strips,
                plan,
                &geometry,
                compressor.as_ref(),
                predictor.as_ref(),
                &mut buffer,
            )?,
            Layout::Tiles(tiles, plan) => read_tiles(
                reader,
                tiles,
                plan,
                &geometry,
                compressor.as_ref(),
                predictor.as_ref(),
                &mut buffer,
            )?,
        }
        buffer
    };

    let samples = match kind {
        SampleKind::Bytes if bits_per_sample < 8 => Samples::Bytes(unpack_sub_byte(
            &buffer,
            geometry.row_bytes,
            width * components,
            bits_per_sample,
        )),
        SampleKind::Bytes => Samples::Bytes(buffer),
        SampleKind::Shorts => {
            let mut values = zeroed::<u16>("image samples", buffer.len() / 2)?;
            match endianness {
                Endianness::LittleEndian => LittleEndian::read_u16_into(&buffer, &mut values),
                Endianness::BigEndian => BigEndian::read_u16_into(&buffer, &mut values),
            }
            Samples::Shorts(values)
        }
        SampleKind::Ints => {
            let mut values = zeroed::<u32>("image samples", buffer.len() / 4)?;
            match endianness {
                Endianness::LittleEndian => LittleEndian::read_u32_into(&buffer, &mut values),
                Endianness::BigEndian => BigEndian::read_u32_into(&buffer, &mut values),
            }
            Samples::Ints(values)
        }
        SampleKind::Floats => {
            let mut values = zeroed::<f32>("image samples", buffer.len() / 4)?;
            match endianness {
                Endianness::LittleEndian => LittleEndian::read_f32_into(&buffer, &mut values),
                Endianness::BigEndian => BigEndian::read_f32_into(&buffer, &mut values),
            }
            Samples::Floats(values)
        }
    };

    Ok(Raster {
        width: dimensions.width,
        length: dimensions.length,
        components_per_pixel: components,
        bits_per_sample,
        sample_format,
        samples,
    })
}

fn read_strips<R: RangeReader + ?Sized>(
    reader: &R,
    strips: &StripInfo,
    plan: &StripPlan,
    geometry: &Geometry,
    compressor: &dyn Compressor,
    predictor: &dyn DifferencingPredictor,
    buffer: &mut [u8],
) -> TiffRasterResult<()> {
    let row_bytes = geometry.row_bytes;
    let rows_per_strip = plan.rows_per_strip;
    debug!(
        "Reading {} strips of {rows_per_strip} rows, {row_bytes} bytes per row",
        strips.len()
    );

    for index in 0..strips.len() {
        if index >= plan.needed {
            warn!("Strip {index} starts past the last image row, skipping");
            continue;
        }
        let first_row = index * rows_per_strip;
        let mut data = compressor.decompress(reader.get_bytes(strips.byte_range(index)?)?)?;
        let rows_in_strip = data.len() / row_bytes;
        let remaining = geometry.length - first_row;
        let is_last = index + 1 == plan.needed;
        if (!is_last && rows_in_strip != rows_per_strip) || rows_in_strip < remaining.min(rows_per_strip) {
            return Err(TiffRasterError::MalformedStrip {
                index,
                expected: remaining.min(rows_per_strip) as u64,
                actual: rows_in_strip as u64,
            });
        }
        if rows_in_strip > remaining {
            warn!(
                "Strip {index} holds {rows_in_strip} rows, dropping {} past the image",
                rows_in_strip - remaining
            );
        }
        for (strip_row, row) in data
            .chunks_exact_mut(row_bytes)
            .take(remaining.min(rows_in_strip))
            .enumerate()
        {
            predictor.unpack(row);
            let image_row = first_row + strip_row;
            buffer[image_row * row_bytes..(image_row + 1) * row_bytes].copy_from_slice(row);
        }
    }
    Ok(())
}

fn read_tiles<R: RangeReader + ?Sized>(
    reader: &R,
    tiles: &TileInfo,
    plan: &TilePlan,
    geometry: &Geometry,
    compressor: &dyn Compressor,
    predictor: &dyn DifferencingPredictor,
    buffer: &mut [u8],
) -> TiffRasterResult<()> {
    let (tile_width, tile_length) = (plan.tile_width, plan.tile_length);
    debug!(
        "Reading {} tiles of {tile_width}x{tile_length}, {} across",
        plan.needed, plan.across
    );

    for index in 0..tiles.len() {
        let (tile_row, tile_col) = (index / plan.across, index % plan.across);
        if tile_row >= plan.down {
            warn!("Tile {index} lies outside the image, skipping");
            continue;
        }
        let mut data = compressor.decompress(reader.get_bytes(tiles.byte_range(index)?)?)?;
        if data.len() != plan.tile_bytes {
            return Err(TiffRasterError::MalformedTile {
                index,
                expected: plan.tile_bytes,
                actual: data.len(),
            });
        }

        let x0 = tile_col * tile_width;
        let copy_bytes = tile_width.min(geometry.width - x0) * plan.pixel_bytes;
        let y0 = tile_row * tile_length;
        let rows = tile_length.min(geometry.length - y0);
        for (r, row) in data.chunks_exact_mut(plan.tile_row_bytes).take(rows).enumerate() {
            predictor.unpack(row);
            let start = (y0 + r) * geometry.row_bytes + x0 * plan.pixel_bytes;
            buffer[start..start + copy_bytes].copy_from_slice(&row[..copy_bytes]);
        }
    }
    Ok(())
}

/// Spread 1, 2 or 4 bit samples out to one byte each, most significant bits first.
fn unpack_sub_byte(buffer: &[u8], row_bytes: usize, samples_per_row: usize, bits: u16) -> Vec<u8> {
    let bits = bits as usize;
    let mask = (1u8 << bits) - 1;
    let rows = if row_bytes == 0 { 0 } else { buffer.len() / row_bytes };
    let mut out = Vec::with_capacity(rows * samples_per_row);
    for row in buffer.chunks_exact(row_bytes.max(1)).take(rows) {
        for sample in 0..samples_per_row {
            let bit = sample * bits;
            let shift = 8 - bits - bit % 8;
            out.push((row[bit / 8] >> shift) & mask);
        }
    }
    out
}
