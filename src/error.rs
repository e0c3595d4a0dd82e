//! Error handling.

use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TiffRasterError {
    /// End of file error.
    #[error("End of File: expected to read {0} bytes, got {1}")]
    EndOfFile(u64, u64),

    /// The first eight bytes of the source are not a TIFF header.
    #[error("Invalid TIFF header: {0}")]
    InvalidHeader(String),

    /// The chain of IFD offsets loops back on itself.
    #[error("Cycle in IFD offsets, offset {0} was visited twice")]
    IfdCycle(u64),

    /// An image index past the last IFD of the file.
    #[error("No IFD at index {index}, file has {count}")]
    IfdIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of IFDs in the file.
        count: usize,
    },

    /// An entry index past the entry count of an IFD.
    #[error("No entry at index {index}, IFD has {count}")]
    TagIndexOutOfRange {
        /// Requested index.
        index: u64,
        /// Number of entries declared by the IFD.
        count: u64,
    },

    /// A required tag has no usable default and was absent.
    #[error("Missing required tag with ID: {id}. User-friendly name: {name}")]
    MissingRequiredTag {
        /// User-friendly tag name.
        name: &'static str,
        /// Tag id.
        id: u16,
    },

    /// The tag is present but was encoded with a field type it does not allow.
    #[error("Incorrect type: {found}, encountered for tag with ID: {id}. User-friendly name: {name}.")]
    UnsupportedTypeForTag {
        /// User-friendly tag name.
        name: &'static str,
        /// Tag id.
        id: u16,
        /// Name of the entry variant that was found.
        found: &'static str,
    },

    /// A required GeoKey is absent from the GeoKeyDirectory.
    #[error("Missing required GeoKey with ID: {id}. User-friendly name: {name}")]
    MissingRequiredGeoKey {
        /// User-friendly key name.
        name: &'static str,
        /// Key id.
        id: u16,
    },

    /// The GeoKey is present but holds values of a type it does not allow.
    #[error("Incorrect type: {found}, encountered for key with ID: {id}. User-friendly name: {name}.")]
    UnsupportedTypeForGeoKey {
        /// User-friendly key name.
        name: &'static str,
        /// Key id.
        id: u16,
        /// Name of the entry variant that was found.
        found: &'static str,
    },

    /// The GeoKeyDirectory header or one of its key records is malformed.
    #[error("Invalid GeoKeyDirectory: {0}")]
    InvalidGeoKeyDirectory(String),

    /// The ColorMap cannot serve every index the image can hold.
    #[error("Invalid ColorMap: {0}")]
    InvalidColorMap(String),

    /// No compressor is registered for the Compression tag value.
    #[error("Unable to locate compressor for code: {code}. Known codes are: {known}.")]
    UnknownCompressionCode {
        /// The compression code.
        code: u16,
        /// Comma separated list of registered codes.
        known: String,
    },

    /// A strip decompressed to a number of rows inconsistent with RowsPerStrip.
    #[error("Incorrect number of rows found ({actual}) not ({expected}) in strip# ({index}).")]
    MalformedStrip {
        /// Strip index.
        index: usize,
        /// Rows the strip should hold.
        expected: u64,
        /// Rows the strip actually held.
        actual: u64,
    },

    /// A tile decompressed to the wrong number of bytes.
    #[error("Incorrect number of uncompressed bytes ({actual}) not ({expected}) in tile# ({index}).")]
    MalformedTile {
        /// Tile index.
        index: usize,
        /// Bytes the tile should hold.
        expected: usize,
        /// Bytes the tile actually held.
        actual: usize,
    },

    /// Offsets and byte counts for strips or tiles have different lengths.
    #[error("Inconsistent {kind} layout: {offsets} offsets but {byte_counts} byte counts")]
    InconsistentLayout {
        /// "strip" or "tile".
        kind: &'static str,
        /// Number of offsets.
        offsets: usize,
        /// Number of byte counts.
        byte_counts: usize,
    },

    /// The IFD describes neither a strip nor a tile layout.
    #[error("Unable to read raster contents, neither strip or tile layout was found")]
    NoRasterLayout,

    /// A declared size exceeds what the in-memory representation can address.
    #[error("{name} of {value} exceeds the addressable range")]
    DimensionOverflow {
        /// What overflowed.
        name: &'static str,
        /// The declared value.
        value: u64,
    },

    /// A tag or key holds a code outside its defined set of values.
    #[error("Unknown {name} value: {code}")]
    UnknownValue {
        /// Name of the field.
        name: &'static str,
        /// The unrecognised code.
        code: u32,
    },

    /// Compressed input that a decompressor could not make sense of.
    #[error("Corrupt {method} data: {reason}")]
    CorruptData {
        /// Name of the compression method.
        method: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A valid TIFF feature this crate does not decode.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A registered codec without an implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// IO Error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// External error
    #[error(transparent)]
    External(Box<dyn std::error::Error + Send + Sync>),
}

/// Crate-specific result type.
pub type TiffRasterResult<T> = std::result::Result<T, TiffRasterError>;
