//! API for reading metadata out of a TIFF file.
//!
//! [`TiffMetadataReader::try_open`] validates the header, after which
//! [`TiffMetadataReader::read_all_ifds`] walks the chain of IFDs:
//!
//! ```
//! use bytes::Bytes;
//! use tiff_raster::metadata::TiffMetadataReader;
//!
//! // A little endian file holding one IFD with a single ImageWidth entry.
//! let source = Bytes::from_static(&[
//!     b'I', b'I', 42, 0, 8, 0, 0, 0,
//!     1, 0,
//!     0, 1, 3, 0, 1, 0, 0, 0, 64, 0, 0, 0,
//!     0, 0, 0, 0,
//! ]);
//!
//! let mut metadata_reader = TiffMetadataReader::try_open(&source).unwrap();
//! let ifds = metadata_reader.read_all_ifds(&source).unwrap();
//! assert_eq!(ifds[0].image_width().unwrap(), 64);
//! ```
//!
//! The [`ImageFileDirectoryReader`] underneath reads every entry with its own small range
//! request, so sources with expensive reads should buffer the start of the file.

mod fetch;
mod reader;

pub use reader::{ImageFileDirectoryReader, TiffHeader, TiffMetadataReader};
