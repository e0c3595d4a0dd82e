#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod reader;
mod colormap;
pub mod decoder;
pub mod error;
mod file;
pub mod geo;
mod ifd;
pub mod image;
pub mod layout;
pub mod metadata;
pub mod predictor;
pub mod raster;
pub mod tiff;

pub use colormap::{ColorMap, Rgb};
pub use file::{DecodeOptions, TIFF};
pub use ifd::{Entry, Ifd, Rational, SRational};
