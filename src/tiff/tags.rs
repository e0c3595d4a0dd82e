//! Tag ids and the enumerated values of the tags this crate interprets.

#![allow(missing_docs)]

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A well-known TIFF tag, its numeric id plus the user-friendly name reported in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: u16,
    pub name: &'static str,
}

impl Tag {
    const fn new(id: u16, name: &'static str) -> Self {
        Self { id, name }
    }

    // Baseline tags
    pub const IMAGE_WIDTH: Tag = Tag::new(0x100, "IMAGE_WIDTH");
    pub const IMAGE_LENGTH: Tag = Tag::new(0x101, "IMAGE_LENGTH");
    pub const BITS_PER_SAMPLE: Tag = Tag::new(0x102, "BITS_PER_SAMPLE");
    pub const COMPRESSION: Tag = Tag::new(0x103, "COMPRESSION");
    pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag::new(0x106, "PHOTOMETRIC_INTERPRETATION");
    pub const STRIP_OFFSETS: Tag = Tag::new(0x111, "STRIP_OFFSETS");
    pub const SAMPLES_PER_PIXEL: Tag = Tag::new(0x115, "SAMPLES_PER_PIXEL");
    pub const ROWS_PER_STRIP: Tag = Tag::new(0x116, "ROWS_PER_STRIP");
    pub const STRIP_BYTE_COUNTS: Tag = Tag::new(0x117, "STRIP_BYTE_COUNTS");
    pub const X_RESOLUTION: Tag = Tag::new(0x11A, "X_RESOLUTION");
    pub const Y_RESOLUTION: Tag = Tag::new(0x11B, "Y_RESOLUTION");
    pub const PLANAR_CONFIGURATION: Tag = Tag::new(0x11C, "PLANAR_CONFIGURATION");
    pub const RESOLUTION_UNIT: Tag = Tag::new(0x128, "RESOLUTION_UNIT");
    pub const PREDICTOR: Tag = Tag::new(0x13D, "PREDICTOR");
    pub const COLOR_MAP: Tag = Tag::new(0x140, "COLOR_MAP");

    // Extension tags
    pub const TILE_WIDTH: Tag = Tag::new(0x142, "TILE_WIDTH");
    pub const TILE_LENGTH: Tag = Tag::new(0x143, "TILE_LENGTH");
    pub const TILE_OFFSETS: Tag = Tag::new(0x144, "TILE_OFFSETS");
    pub const TILE_BYTE_COUNTS: Tag = Tag::new(0x145, "TILE_BYTE_COUNTS");
    pub const SAMPLE_FORMAT: Tag = Tag::new(0x153, "SAMPLE_FORMAT");

    // GeoTIFF tags
    pub const MODEL_PIXEL_SCALE: Tag = Tag::new(0x830E, "MODEL_PIXEL_SCALE");
    pub const MODEL_TIE_POINT: Tag = Tag::new(0x8482, "MODEL_TIE_POINT");
    pub const MODEL_TRANSFORMATION: Tag = Tag::new(0x85D8, "MODEL_TRANSFORMATION");
    pub const GEO_KEY_DIRECTORY: Tag = Tag::new(0x87AF, "GEO_KEY_DIRECTORY");
    pub const GEO_DOUBLE_PARAMS: Tag = Tag::new(0x87B0, "GEO_DOUBLE_PARAMS");
    pub const GEO_ASCII_PARAMS: Tag = Tag::new(0x87B1, "GEO_ASCII_PARAMS");
}

/// The field type of an IFD entry.
///
/// Codes 13 and up (IFD and the BigTIFF types) are not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum Type {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
}

impl Type {
    /// Size in bytes of a single value of this type.
    pub fn size(&self) -> u64 {
        match self {
            Type::Byte | Type::Ascii | Type::SByte | Type::Undefined => 1,
            Type::Short | Type::SShort => 2,
            Type::Long | Type::SLong | Type::Float => 4,
            Type::Rational | Type::SRational | Type::Double => 8,
        }
    }

    /// The largest count whose values still fit in the 4-byte value field of an entry.
    pub fn max_inline_count(&self) -> u64 {
        match self {
            Type::Byte | Type::Ascii | Type::SByte | Type::Undefined => 4,
            Type::Short | Type::SShort => 2,
            Type::Long | Type::SLong | Type::Float => 1,
            Type::Rational | Type::SRational | Type::Double => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum PhotometricInterpretation {
    WhiteIsZero = 0,
    BlackIsZero = 1,
    RGB = 2,
    RGBPalette = 3,
    TransparencyMask = 4,
    CMYK = 5,
    YCbCr = 6,
    CIELab = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum PlanarConfiguration {
    Chunky = 1,
    Planar = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum Predictor {
    None = 1,
    Horizontal = 2,
    FloatingPoint = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum SampleFormat {
    Uint = 1,
    Int = 2,
    IEEEFP = 3,
    Void = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum ResolutionUnit {
    None = 1,
    Inch = 2,
    Centimeter = 3,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_type_codes() {
        assert_eq!(Type::try_from(3u16).unwrap(), Type::Short);
        assert_eq!(Type::try_from(12u16).unwrap(), Type::Double);
        assert!(Type::try_from(13u16).is_err());
        assert!(Type::try_from(0u16).is_err());
        assert_eq!(u16::from(Type::SRational), 10);
    }
}
