use std::borrow::Cow;
use std::ops::Range;

use log::warn;

use crate::colormap::ColorMap;
use crate::error::{TiffRasterError, TiffRasterResult};
use crate::geo::{GeoKeyDirectory, ModelPixelScale, ModelTiepoint};
use crate::tiff::tags::{Tag, Type};

/// An unsigned fraction, the value of a RATIONAL field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// Numerator.
    pub numerator: u32,
    /// Denominator.
    pub denominator: u32,
}

impl Rational {
    /// The fraction as a float. A zero denominator gives an infinite or NaN value.
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// A signed fraction, the value of an SRATIONAL field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SRational {
    /// Numerator.
    pub numerator: i32,
    /// Denominator.
    pub denominator: i32,
}

impl SRational {
    /// The fraction as a float.
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// The values of one IFD entry, tagged with their field type.
///
/// The variant decides both how the values were stored and how they may be interpreted. Tag
/// accessors match on it exhaustively, so a new variant fails to compile until every accessor
/// decides what to do with it.
///
/// `NotFound` is what a lookup returns for an absent tag.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Entry {
    Byte { tag: u16, values: Vec<u8> },
    /// Raw 7-bit ASCII bytes, NUL terminators included.
    Ascii { tag: u16, values: Vec<u8> },
    Short { tag: u16, values: Vec<u16> },
    Long { tag: u16, values: Vec<u32> },
    Rational { tag: u16, values: Vec<Rational> },
    SByte { tag: u16, values: Vec<i8> },
    Undefined { tag: u16, values: Vec<u8> },
    SShort { tag: u16, values: Vec<i16> },
    SLong { tag: u16, values: Vec<i32> },
    SRational { tag: u16, values: Vec<SRational> },
    Float { tag: u16, values: Vec<f32> },
    Double { tag: u16, values: Vec<f64> },
    NotFound { tag: u16 },
}

impl Entry {
    /// The tag (or GeoKey) id this entry belongs to.
    pub fn tag(&self) -> u16 {
        match self {
            Entry::Byte { tag, .. }
            | Entry::Ascii { tag, .. }
            | Entry::Short { tag, .. }
            | Entry::Long { tag, .. }
            | Entry::Rational { tag, .. }
            | Entry::SByte { tag, .. }
            | Entry::Undefined { tag, .. }
            | Entry::SShort { tag, .. }
            | Entry::SLong { tag, .. }
            | Entry::SRational { tag, .. }
            | Entry::Float { tag, .. }
            | Entry::Double { tag, .. }
            | Entry::NotFound { tag } => *tag,
        }
    }

    /// The field type of this entry, `None` for [`Entry::NotFound`].
    pub fn field_type(&self) -> Option<Type> {
        match self {
            Entry::Byte { .. } => Some(Type::Byte),
            Entry::Ascii { .. } => Some(Type::Ascii),
            Entry::Short { .. } => Some(Type::Short),
            Entry::Long { .. } => Some(Type::Long),
            Entry::Rational { .. } => Some(Type::Rational),
            Entry::SByte { .. } => Some(Type::SByte),
            Entry::Undefined { .. } => Some(Type::Undefined),
            Entry::SShort { .. } => Some(Type::SShort),
            Entry::SLong { .. } => Some(Type::SLong),
            Entry::SRational { .. } => Some(Type::SRational),
            Entry::Float { .. } => Some(Type::Float),
            Entry::Double { .. } => Some(Type::Double),
            Entry::NotFound { .. } => None,
        }
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Entry::Byte { .. } => "Byte",
            Entry::Ascii { .. } => "Ascii",
            Entry::Short { .. } => "Short",
            Entry::Long { .. } => "Long",
            Entry::Rational { .. } => "Rational",
            Entry::SByte { .. } => "SByte",
            Entry::Undefined { .. } => "Undefined",
            Entry::SShort { .. } => "SShort",
            Entry::SLong { .. } => "SLong",
            Entry::SRational { .. } => "SRational",
            Entry::Float { .. } => "Float",
            Entry::Double { .. } => "Double",
            Entry::NotFound { .. } => "NotFound",
        }
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        match self {
            Entry::Byte { values, .. } | Entry::Ascii { values, .. } | Entry::Undefined { values, .. } => {
                values.len()
            }
            Entry::Short { values, .. } => values.len(),
            Entry::Long { values, .. } => values.len(),
            Entry::Rational { values, .. } => values.len(),
            Entry::SByte { values, .. } => values.len(),
            Entry::SShort { values, .. } => values.len(),
            Entry::SLong { values, .. } => values.len(),
            Entry::SRational { values, .. } => values.len(),
            Entry::Float { values, .. } => values.len(),
            Entry::Double { values, .. } => values.len(),
            Entry::NotFound { .. } => 0,
        }
    }

    /// `true` if the entry holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `range` of this entry's values into a new entry of the same type under `tag`.
    ///
    /// Returns `None` if the range is out of bounds.
    pub(crate) fn copy_range(&self, tag: u16, range: Range<usize>) -> Option<Entry> {
        Some(match self {
            Entry::Byte { values, .. } => Entry::Byte { tag, values: values.get(range)?.to_vec() },
            Entry::Ascii { values, .. } => Entry::Ascii { tag, values: values.get(range)?.to_vec() },
            Entry::Short { values, .. } => Entry::Short { tag, values: values.get(range)?.to_vec() },
            Entry::Long { values, .. } => Entry::Long { tag, values: values.get(range)?.to_vec() },
            Entry::Rational { values, .. } => Entry::Rational { tag, values: values.get(range)?.to_vec() },
            Entry::SByte { values, .. } => Entry::SByte { tag, values: values.get(range)?.to_vec() },
            Entry::Undefined { values, .. } => Entry::Undefined { tag, values: values.get(range)?.to_vec() },
            Entry::SShort { values, .. } => Entry::SShort { tag, values: values.get(range)?.to_vec() },
            Entry::SLong { values, .. } => Entry::SLong { tag, values: values.get(range)?.to_vec() },
            Entry::SRational { values, .. } => Entry::SRational { tag, values: values.get(range)?.to_vec() },
            Entry::Float { values, .. } => Entry::Float { tag, values: values.get(range)?.to_vec() },
            Entry::Double { values, .. } => Entry::Double { tag, values: values.get(range)?.to_vec() },
            Entry::NotFound { .. } => Entry::NotFound { tag },
        })
    }
}

/// A sorted table of typed entries that tag accessors can query.
///
/// Implemented by [`Ifd`] (keyed by [`Tag`]) and [`GeoKeyDirectory`] (keyed by
/// [`GeoKey`][crate::geo::GeoKey]); the two differ only in the errors they raise.
pub(crate) trait Directory {
    type Key: Copy;

    /// Look up `key`, returning [`Entry::NotFound`] if it is absent.
    fn find(&self, key: Self::Key) -> Cow<'_, Entry>;

    fn missing(key: Self::Key) -> TiffRasterError;

    fn unsupported(key: Self::Key, found: &Entry) -> TiffRasterError;
}

/// Binary search a slice of entries sorted by tag.
pub(crate) fn search_sorted(entries: &[Entry], id: u16) -> Cow<'_, Entry> {
    match entries.binary_search_by_key(&id, Entry::tag) {
        Ok(idx) => Cow::Borrowed(&entries[idx]),
        Err(_) => Cow::Owned(Entry::NotFound { tag: id }),
    }
}

/// Sort entries by tag, keeping the first of any duplicates.
pub(crate) fn sort_entries(mut entries: Vec<Entry>, kind: &str) -> Vec<Entry> {
    entries.sort_by_key(Entry::tag);
    entries.dedup_by(|later, earlier| {
        let duplicate = later.tag() == earlier.tag();
        if duplicate {
            warn!("Duplicate {kind} {}, keeping the first occurrence", later.tag());
        }
        duplicate
    });
    entries
}

pub(crate) fn optional_ascii<D: Directory>(
    directory: &D,
    key: D::Key,
) -> TiffRasterResult<Option<String>> {
    match directory.find(key).as_ref() {
        Entry::Ascii { values, .. } => {
            let end = values.iter().position(|&b| b == 0).unwrap_or(values.len());
            Ok(Some(String::from_utf8_lossy(&values[..end]).into_owned()))
        }
        Entry::NotFound { .. } => Ok(None),
        found @ (Entry::Byte { .. }
        | Entry::Short { .. }
        | Entry::Long { .. }
        | Entry::Rational { .. }
        | Entry::SByte { .. }
        | Entry::Undefined { .. }
        | Entry::SShort { .. }
        | Entry::SLong { .. }
        | Entry::SRational { .. }
        | Entry::Float { .. }
        | Entry::Double { .. }) => Err(D::unsupported(key, found)),
    }
}

pub(crate) fn optional_ushort_array<D: Directory>(
    directory: &D,
    key: D::Key,
) -> TiffRasterResult<Option<Vec<u16>>> {
    match directory.find(key).as_ref() {
        Entry::Short { values, .. } => Ok(Some(values.clone())),
        Entry::NotFound { .. } => Ok(None),
        found @ (Entry::Byte { .. }
        | Entry::Ascii { .. }
        | Entry::Long { .. }
        | Entry::Rational { .. }
        | Entry::SByte { .. }
        | Entry::Undefined { .. }
        | Entry::SShort { .. }
        | Entry::SLong { .. }
        | Entry::SRational { .. }
        | Entry::Float { .. }
        | Entry::Double { .. }) => Err(D::unsupported(key, found)),
    }
}

/// The first value of a Short entry. An empty entry counts as absent.
pub(crate) fn optional_ushort<D: Directory>(
    directory: &D,
    key: D::Key,
) -> TiffRasterResult<Option<u16>> {
    Ok(optional_ushort_array(directory, key)?.and_then(|values| values.first().copied()))
}

/// Values of a tag that may be stored either as Short or Long.
pub(crate) fn optional_uint_array<D: Directory>(
    directory: &D,
    key: D::Key,
) -> TiffRasterResult<Option<Vec<u64>>> {
    match directory.find(key).as_ref() {
        Entry::Short { values, .. } => Ok(Some(values.iter().map(|&v| v as u64).collect())),
        Entry::Long { values, .. } => Ok(Some(values.iter().map(|&v| v as u64).collect())),
        Entry::NotFound { .. } => Ok(None),
        found @ (Entry::Byte { .. }
        | Entry::Ascii { .. }
        | Entry::Rational { .. }
        | Entry::SByte { .. }
        | Entry::Undefined { .. }
        | Entry::SShort { .. }
        | Entry::SLong { .. }
        | Entry::SRational { .. }
        | Entry::Float { .. }
        | Entry::Double { .. }) => Err(D::unsupported(key, found)),
    }
}

pub(crate) fn optional_uint<D: Directory>(
    directory: &D,
    key: D::Key,
) -> TiffRasterResult<Option<u64>> {
    Ok(optional_uint_array(directory, key)?.and_then(|values| values.first().copied()))
}

pub(crate) fn optional_rational<D: Directory>(
    directory: &D,
    key: D::Key,
) -> TiffRasterResult<Option<Rational>> {
    match directory.find(key).as_ref() {
        Entry::Rational { values, .. } => Ok(values.first().copied()),
        Entry::NotFound { .. } => Ok(None),
        found @ (Entry::Byte { .. }
        | Entry::Ascii { .. }
        | Entry::Short { .. }
        | Entry::Long { .. }
        | Entry::SByte { .. }
        | Entry::Undefined { .. }
        | Entry::SShort { .. }
        | Entry::SLong { .. }
        | Entry::SRational { .. }
        | Entry::Float { .. }
        | Entry::Double { .. }) => Err(D::unsupported(key, found)),
    }
}

pub(crate) fn optional_double_array<D: Directory>(
    directory: &D,
    key: D::Key,
) -> TiffRasterResult<Option<Vec<f64>>> {
    match directory.find(key).as_ref() {
        Entry::Double { values, .. } => Ok(Some(values.clone())),
        Entry::NotFound { .. } => Ok(None),
        found @ (Entry::Byte { .. }
        | Entry::Ascii { .. }
        | Entry::Short { .. }
        | Entry::Long { .. }
        | Entry::Rational { .. }
        | Entry::SByte { .. }
        | Entry::Undefined { .. }
        | Entry::SShort { .. }
        | Entry::SLong { .. }
        | Entry::SRational { .. }
        | Entry::Float { .. }) => Err(D::unsupported(key, found)),
    }
}

/// An Image File Directory: the entries describing one image, sorted by tag id.
#[derive(Debug, Clone, PartialEq)]
pub struct Ifd {
    entries: Vec<Entry>,
    next_ifd_offset: Option<u64>,
}

impl Directory for Ifd {
    type Key = Tag;

    fn find(&self, key: Tag) -> Cow<'_, Entry> {
        self.find_tag(key.id)
    }

    fn missing(key: Tag) -> TiffRasterError {
        TiffRasterError::MissingRequiredTag {
            name: key.name,
            id: key.id,
        }
    }

    fn unsupported(key: Tag, found: &Entry) -> TiffRasterError {
        TiffRasterError::UnsupportedTypeForTag {
            name: key.name,
            id: key.id,
            found: found.type_name(),
        }
    }
}

impl Ifd {
    /// Build an IFD out of decoded entries. Entries are sorted by tag, and when a tag occurs
    /// more than once only its first occurrence is kept.
    pub fn new(entries: Vec<Entry>, next_ifd_offset: Option<u64>) -> Self {
        Self {
            entries: sort_entries(entries, "tag"),
            next_ifd_offset,
        }
    }

    /// All entries, sorted by tag.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the IFD has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File offset of the following IFD, `None` for the last one in the file.
    pub fn next_ifd_offset(&self) -> Option<u64> {
        self.next_ifd_offset
    }

    /// Look up a tag by id.
    ///
    /// Never fails: an absent tag yields [`Entry::NotFound`].
    pub fn find_tag(&self, id: u16) -> Cow<'_, Entry> {
        search_sorted(&self.entries, id)
    }

    fn required_uint(&self, tag: Tag) -> TiffRasterResult<u64> {
        optional_uint(self, tag)?.ok_or_else(|| Self::missing(tag))
    }

    /// The number of columns in the image, i.e., the number of pixels per row.
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/imagewidth.html>
    pub fn image_width(&self) -> TiffRasterResult<u64> {
        self.required_uint(Tag::IMAGE_WIDTH)
    }

    /// The number of rows of pixels in the image.
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/imagelength.html>
    pub fn image_length(&self) -> TiffRasterResult<u64> {
        self.required_uint(Tag::IMAGE_LENGTH)
    }

    /// Number of bits per component, defaulting to one bit for each sample.
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/bitspersample.html>
    pub fn bits_per_sample(&self) -> TiffRasterResult<Vec<u16>> {
        match optional_ushort_array(self, Tag::BITS_PER_SAMPLE)? {
            Some(bits) => Ok(bits),
            None => Ok(vec![1; self.samples_per_pixel()? as usize]),
        }
    }

    /// Compression scheme used on the image data, defaulting to 1 (no compression).
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/compression.html>
    pub fn compression(&self) -> TiffRasterResult<u16> {
        Ok(optional_ushort(self, Tag::COMPRESSION)?.unwrap_or(1))
    }

    /// The color space of the image data.
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/photometricinterpretation.html>
    pub fn photometric_interpretation(&self) -> TiffRasterResult<u16> {
        optional_ushort(self, Tag::PHOTOMETRIC_INTERPRETATION)?
            .ok_or_else(|| Self::missing(Tag::PHOTOMETRIC_INTERPRETATION))
    }

    /// The number of components per pixel, defaulting to 1.
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/samplesperpixel.html>
    pub fn samples_per_pixel(&self) -> TiffRasterResult<u16> {
        Ok(optional_ushort(self, Tag::SAMPLES_PER_PIXEL)?.unwrap_or(1))
    }

    /// The number of rows per strip, defaulting to 2.
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/rowsperstrip.html>
    pub fn rows_per_strip(&self) -> TiffRasterResult<u64> {
        Ok(optional_uint(self, Tag::ROWS_PER_STRIP)?.unwrap_or(2))
    }

    /// For each strip, the byte offset of that strip.
    pub fn strip_offsets(&self) -> TiffRasterResult<Option<Vec<u64>>> {
        optional_uint_array(self, Tag::STRIP_OFFSETS)
    }

    /// For each strip, the number of bytes in the strip after compression.
    pub fn strip_byte_counts(&self) -> TiffRasterResult<Option<Vec<u64>>> {
        optional_uint_array(self, Tag::STRIP_BYTE_COUNTS)
    }

    /// The number of pixels per ResolutionUnit in the ImageWidth direction.
    pub fn x_resolution(&self) -> TiffRasterResult<Option<Rational>> {
        optional_rational(self, Tag::X_RESOLUTION)
    }

    /// The number of pixels per ResolutionUnit in the ImageLength direction.
    pub fn y_resolution(&self) -> TiffRasterResult<Option<Rational>> {
        optional_rational(self, Tag::Y_RESOLUTION)
    }

    /// The unit of measurement for XResolution and YResolution, defaulting to 2 (inch).
    pub fn resolution_unit(&self) -> TiffRasterResult<u16> {
        Ok(optional_ushort(self, Tag::RESOLUTION_UNIT)?.unwrap_or(2))
    }

    /// How the components of each pixel are stored, defaulting to 1 (chunky).
    pub fn planar_configuration(&self) -> TiffRasterResult<u16> {
        Ok(optional_ushort(self, Tag::PLANAR_CONFIGURATION)?.unwrap_or(1))
    }

    /// The differencing predictor applied before compression, defaulting to 1 (none).
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/predictor.html>
    pub fn predictor(&self) -> TiffRasterResult<u16> {
        Ok(optional_ushort(self, Tag::PREDICTOR)?.unwrap_or(1))
    }

    /// How to interpret each data sample, defaulting to unsigned integers.
    pub fn sample_format(&self) -> TiffRasterResult<Vec<u16>> {
        match optional_ushort_array(self, Tag::SAMPLE_FORMAT)? {
            Some(formats) => Ok(formats),
            None => Ok(vec![1; self.samples_per_pixel()? as usize]),
        }
    }

    /// A color map for palette color images.
    /// <https://web.archive.org/web/20240329145250/https://www.awaresystems.be/imaging/tiff/tifftags/colormap.html>
    pub fn color_map(&self) -> TiffRasterResult<Option<ColorMap>> {
        optional_ushort_array(self, Tag::COLOR_MAP)?
            .map(|shorts| ColorMap::create(&shorts))
            .transpose()
    }

    /// The tile width in pixels.
    pub fn tile_width(&self) -> TiffRasterResult<Option<u64>> {
        optional_uint(self, Tag::TILE_WIDTH)
    }

    /// The tile length (height) in pixels.
    pub fn tile_length(&self) -> TiffRasterResult<Option<u64>> {
        optional_uint(self, Tag::TILE_LENGTH)
    }

    /// For each tile, the byte offset of that tile.
    pub fn tile_offsets(&self) -> TiffRasterResult<Option<Vec<u64>>> {
        optional_uint_array(self, Tag::TILE_OFFSETS)
    }

    /// For each tile, the number of (compressed) bytes in that tile.
    pub fn tile_byte_counts(&self) -> TiffRasterResult<Option<Vec<u64>>> {
        optional_uint_array(self, Tag::TILE_BYTE_COUNTS)
    }

    /// Used in interchangeable GeoTIFF files.
    /// <https://web.archive.org/web/20240329145238/https://www.awaresystems.be/imaging/tiff/tifftags/modelpixelscaletag.html>
    pub fn model_pixel_scale(&self) -> TiffRasterResult<Option<ModelPixelScale>> {
        match optional_double_array(self, Tag::MODEL_PIXEL_SCALE)? {
            Some(values) => match values.as_slice() {
                [x, y, z] => Ok(Some(ModelPixelScale {
                    x: *x,
                    y: *y,
                    z: *z,
                })),
                _ => Err(TiffRasterError::Unsupported(format!(
                    "MODEL_PIXEL_SCALE with {} values, expected 3",
                    values.len()
                ))),
            },
            None => Ok(None),
        }
    }

    /// Used in interchangeable GeoTIFF files. Trailing values that do not complete a tiepoint
    /// are ignored.
    /// <https://web.archive.org/web/20240329145303/https://www.awaresystems.be/imaging/tiff/tifftags/modeltiepointtag.html>
    pub fn model_tiepoints(&self) -> TiffRasterResult<Option<Vec<ModelTiepoint>>> {
        Ok(optional_double_array(self, Tag::MODEL_TIE_POINT)?.map(|values| {
            values
                .chunks_exact(6)
                .map(|c| ModelTiepoint {
                    i: c[0],
                    j: c[1],
                    k: c[2],
                    x: c[3],
                    y: c[4],
                    z: c[5],
                })
                .collect()
        }))
    }

    /// The 4x4 raster-to-model transformation matrix, row-major.
    pub fn model_transformation(&self) -> TiffRasterResult<Option<[[f64; 4]; 4]>> {
        match optional_double_array(self, Tag::MODEL_TRANSFORMATION)? {
            Some(values) if values.len() == 16 => {
                let mut matrix = [[0.0; 4]; 4];
                for (idx, value) in values.into_iter().enumerate() {
                    matrix[idx / 4][idx % 4] = value;
                }
                Ok(Some(matrix))
            }
            Some(values) => Err(TiffRasterError::Unsupported(format!(
                "MODEL_TRANSFORMATION with {} values, expected 16",
                values.len()
            ))),
            None => Ok(None),
        }
    }

    /// Geospatial tags
    /// <https://web.archive.org/web/20240329145313/https://www.awaresystems.be/imaging/tiff/tifftags/geokeydirectorytag.html>
    pub fn geo_key_directory(&self) -> TiffRasterResult<Option<GeoKeyDirectory>> {
        GeoKeyDirectory::from_ifd(self)
    }

    /// Double valued GeoKeys, referenced from the GeoKeyDirectory.
    pub fn geo_double_params(&self) -> TiffRasterResult<Option<Vec<f64>>> {
        optional_double_array(self, Tag::GEO_DOUBLE_PARAMS)
    }

    /// ASCII valued GeoKeys, referenced from the GeoKeyDirectory. Each value ends with `|`.
    pub fn geo_ascii_params(&self) -> TiffRasterResult<Option<String>> {
        optional_ascii(self, Tag::GEO_ASCII_PARAMS)
    }
}
