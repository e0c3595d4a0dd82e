//! GeoTIFF georeferencing: model tags, the GeoKeyDirectory and affine transforms.

mod affine;
mod geo_key_directory;

pub use affine::AffineTransform;
pub use geo_key_directory::{AngularUnit, GeoKey, GeoKeyDirectory};

use crate::error::TiffRasterResult;
use crate::ifd::Ifd;
use crate::image::Image;

/// ModelPixelScale: the size of a raster cell in model units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPixelScale {
    #[allow(missing_docs)]
    pub x: f64,
    #[allow(missing_docs)]
    pub y: f64,
    #[allow(missing_docs)]
    pub z: f64,
}

/// One ModelTiepoint: raster position `(i, j, k)` sits at model position `(x, y, z)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct ModelTiepoint {
    pub i: f64,
    pub j: f64,
    pub k: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// An image with the georeferencing of its IFD.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoImage {
    image: Image,
    geo_key_directory: Option<GeoKeyDirectory>,
    transform: Option<AffineTransform>,
}

impl GeoImage {
    /// Attach the GeoKeyDirectory and transform of `ifd` to `image`.
    pub fn new(image: Image, ifd: &Ifd) -> TiffRasterResult<Self> {
        Ok(Self {
            image,
            geo_key_directory: ifd.geo_key_directory()?,
            transform: AffineTransform::from_ifd(ifd)?,
        })
    }

    #[allow(missing_docs)]
    pub fn image(&self) -> &Image {
        &self.image
    }

    #[allow(missing_docs)]
    pub fn into_image(self) -> Image {
        self.image
    }

    /// `None` if the IFD has no GeoKeyDirectory tag.
    pub fn geo_key_directory(&self) -> Option<&GeoKeyDirectory> {
        self.geo_key_directory.as_ref()
    }

    /// Raster to model transform, `None` without ModelTransformation or a pixel scale and
    /// tiepoint.
    pub fn transform(&self) -> Option<&AffineTransform> {
        self.transform.as_ref()
    }
}
