//! Typed images built from an assembled [`Raster`].
//!
//! An [`ImageMaker`] looks at the IFD of a raster and decides what kind of image it is. The
//! [`StandardImageMaker`] recognises the TIFF baseline image types and falls back to a
//! [`DataImage`]. Use the [`DataImageMaker`] to always get raw samples.

mod baseline;
mod data;

use std::fmt::Debug;

pub use baseline::{
    BiLevelImage, BlackOrWhite, GrayscaleImage, PaletteColorImage, Resolution, RgbImage,
};
pub use data::{Components, DataImage, Pixel, SampleImage};

use crate::error::{TiffRasterError, TiffRasterResult};
use crate::ifd::Ifd;
use crate::raster::{Raster, Samples};
use crate::tiff::tags::{PhotometricInterpretation, ResolutionUnit, Tag};

/// A decoded image.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    /// 1 bit black and white.
    BiLevel(BiLevelImage),
    /// 4 or 8 bit grayscale.
    Grayscale(GrayscaleImage),
    /// 8 bit RGB.
    Rgb(RgbImage),
    /// Indices into a color map.
    PaletteColor(PaletteColorImage),
    /// Raw samples of any supported width and component count.
    Data(DataImage),
}

impl Image {
    /// Pixels per row.
    pub fn width(&self) -> u32 {
        match self {
            Image::BiLevel(image) => image.width(),
            Image::Grayscale(image) => image.width(),
            Image::Rgb(image) => image.width(),
            Image::PaletteColor(image) => image.width(),
            Image::Data(image) => image.width(),
        }
    }

    /// Number of rows.
    pub fn length(&self) -> u32 {
        match self {
            Image::BiLevel(image) => image.length(),
            Image::Grayscale(image) => image.length(),
            Image::Rgb(image) => image.length(),
            Image::PaletteColor(image) => image.length(),
            Image::Data(image) => image.length(),
        }
    }
}

/// Builds an [`Image`] out of a raster and the IFD it was read from.
///
/// This allows end users to plug in their own interpretation of the pixel data.
pub trait ImageMaker: Debug + Send + Sync {
    /// Wrap `raster`, which was assembled from `ifd`.
    fn make(&self, ifd: &Ifd, raster: Raster) -> TiffRasterResult<Image>;
}

/// Baseline images where the photometric interpretation and bit depths match one, data images
/// otherwise.
#[derive(Debug, Clone, Default)]
pub struct StandardImageMaker;

/// Always builds a [`DataImage`].
#[derive(Debug, Clone, Default)]
pub struct DataImageMaker;

impl ImageMaker for DataImageMaker {
    fn make(&self, _ifd: &Ifd, raster: Raster) -> TiffRasterResult<Image> {
        Ok(Image::Data(DataImage::from_raster(raster)?))
    }
}

impl Resolution {
    /// The resolution of `ifd`, `None` unless both XResolution and YResolution are present.
    pub fn from_ifd(ifd: &Ifd) -> TiffRasterResult<Option<Self>> {
        let (Some(x), Some(y)) = (ifd.x_resolution()?, ifd.y_resolution()?) else {
            return Ok(None);
        };
        let unit = ifd.resolution_unit()?;
        let unit = ResolutionUnit::try_from(unit).map_err(|_| TiffRasterError::UnknownValue {
            name: "ResolutionUnit",
            code: unit.into(),
        })?;
        Ok(Some(Resolution { x, y, unit }))
    }
}

/// The baseline image types, recognised before the raster is taken apart.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Baseline {
    BiLevel { white_is_zero: bool },
    Grayscale { bits: u16, white_is_zero: bool },
    Rgb,
    PaletteColor { bits: u16 },
}

impl Baseline {
    fn classify(ifd: &Ifd, raster: &Raster) -> TiffRasterResult<Option<Self>> {
        let photometric = PhotometricInterpretation::try_from(ifd.photometric_interpretation()?).ok();
        let bits = ifd.bits_per_sample()?;
        if !matches!(raster.samples(), Samples::Bytes(_)) {
            return Ok(None);
        }

        use PhotometricInterpretation::*;
        let white_is_zero = photometric == Some(WhiteIsZero);
        Ok(match (photometric, bits.as_slice(), raster.components_per_pixel()) {
            (Some(WhiteIsZero | BlackIsZero), [1], 1) => Some(Self::BiLevel { white_is_zero }),
            (Some(WhiteIsZero | BlackIsZero), [bits @ (4 | 8)], 1) => Some(Self::Grayscale {
                bits: *bits,
                white_is_zero,
            }),
            (Some(RGB), [8, 8, 8], 3) => Some(Self::Rgb),
            (Some(RGBPalette), [bits @ (1 | 2 | 4 | 8)], 1) => Some(Self::PaletteColor { bits: *bits }),
            _ => None,
        })
    }
}

impl ImageMaker for StandardImageMaker {
    fn make(&self, ifd: &Ifd, raster: Raster) -> TiffRasterResult<Image> {
        let Some(baseline) = Baseline::classify(ifd, &raster)? else {
            return DataImageMaker.make(ifd, raster);
        };
        let (width, length) = (raster.width(), raster.length());
        let pixels = match raster.into_bytes() {
            Ok(pixels) => pixels,
            Err(raster) => return DataImageMaker.make(ifd, raster),
        };

        match baseline {
            Baseline::BiLevel { white_is_zero } => Ok(Image::BiLevel(BiLevelImage {
                width,
                length,
                white_is_zero,
                pixels,
                resolution: Resolution::from_ifd(ifd)?,
            })),
            Baseline::Grayscale {
                bits,
                white_is_zero,
            } => Ok(Image::Grayscale(GrayscaleImage {
                width,
                length,
                bits_per_sample: bits,
                white_is_zero,
                pixels,
                resolution: Resolution::from_ifd(ifd)?,
            })),
            Baseline::Rgb => Ok(Image::Rgb(RgbImage {
                width,
                length,
                pixels,
                resolution: Resolution::from_ifd(ifd)?,
            })),
            Baseline::PaletteColor { bits } => {
                let color_map = ifd
                    .color_map()?
                    .ok_or(TiffRasterError::MissingRequiredTag {
                        name: Tag::COLOR_MAP.name,
                        id: Tag::COLOR_MAP.id,
                    })?;
                let needed = 1usize << bits;
                if color_map.len() < needed {
                    return Err(TiffRasterError::InvalidColorMap(format!(
                        "{} entries for {bits} bit indices, expected {needed}",
                        color_map.len()
                    )));
                }
                Ok(Image::PaletteColor(PaletteColorImage::new(
                    width,
                    length,
                    pixels,
                    color_map,
                    Resolution::from_ifd(ifd)?,
                )?))
            }
        }
    }
}
