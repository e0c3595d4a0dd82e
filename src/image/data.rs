use crate::error::{TiffRasterError, TiffRasterResult};
use crate::raster::{Raster, Samples};

/// How many samples make up one pixel.
///
/// One and three components get their own variant so [`SampleImage::value_at`] can return them
/// by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Components {
    /// One sample per pixel.
    One,
    /// Three samples per pixel.
    Three,
    /// Any other number of samples per pixel.
    N(usize),
}

impl Components {
    /// The specialisation for `count` samples per pixel.
    pub fn from_count(count: usize) -> Self {
        match count {
            1 => Components::One,
            3 => Components::Three,
            n => Components::N(n),
        }
    }

    /// Samples per pixel.
    pub fn count(&self) -> usize {
        match self {
            Components::One => 1,
            Components::Three => 3,
            Components::N(n) => *n,
        }
    }
}

/// The samples of one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pixel<'a, T> {
    /// A single-component pixel.
    One(T),
    /// A three-component pixel.
    Three([T; 3]),
    /// A pixel with any other number of components, borrowed from the image.
    N(&'a [T]),
}

/// A width x length grid of pixels with `T` samples, stored row-major and interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleImage<T> {
    width: u32,
    length: u32,
    components: Components,
    samples: Vec<T>,
}

impl<T: Copy> SampleImage<T> {
    /// Wrap `samples`, which must hold exactly `width * length * components_per_pixel` values.
    pub fn new(
        width: u32,
        length: u32,
        components_per_pixel: usize,
        samples: Vec<T>,
    ) -> TiffRasterResult<Self> {
        let expected = (width as usize)
            .checked_mul(length as usize)
            .and_then(|pixels| pixels.checked_mul(components_per_pixel));
        if components_per_pixel == 0 || expected != Some(samples.len()) {
            return Err(TiffRasterError::Unsupported(format!(
                "{} samples for a {width}x{length} image with {components_per_pixel} components",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            length,
            components: Components::from_count(components_per_pixel),
            samples,
        })
    }

    /// Pixels per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// The component specialisation.
    pub fn components(&self) -> Components {
        self.components
    }

    /// All samples, row-major.
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    /// The samples of one row.
    ///
    /// # Panics
    ///
    /// If `row` is not below [`length`][Self::length].
    pub fn row(&self, row: u32) -> &[T] {
        assert!(row < self.length, "row {row} out of bounds for length {}", self.length);
        let row_len = self.width as usize * self.components.count();
        &self.samples[row as usize * row_len..(row as usize + 1) * row_len]
    }

    /// The pixel at `row`, `col`.
    ///
    /// # Panics
    ///
    /// If the position lies outside the image.
    pub fn value_at(&self, row: u32, col: u32) -> Pixel<'_, T> {
        assert!(
            row < self.length && col < self.width,
            "pixel ({row}, {col}) out of bounds for {}x{}",
            self.width,
            self.length
        );
        let n = self.components.count();
        let start = (row as usize * self.width as usize + col as usize) * n;
        match self.components {
            Components::One => Pixel::One(self.samples[start]),
            Components::Three => Pixel::Three([
                self.samples[start],
                self.samples[start + 1],
                self.samples[start + 2],
            ]),
            Components::N(_) => Pixel::N(&self.samples[start..start + n]),
        }
    }
}

/// An image holding raw samples, for anything that is not a baseline image, such as elevation
/// grids or multi-band data.
///
/// Integer samples keep their bit pattern whatever the SampleFormat; signed data can be
/// reinterpreted with `as`.
#[derive(Debug, Clone, PartialEq)]
pub enum DataImage {
    /// 8 bit samples, or unpacked 1, 2 and 4 bit samples.
    Byte(SampleImage<u8>),
    /// 16 bit samples.
    Short(SampleImage<u16>),
    /// 32 bit integer samples.
    Int(SampleImage<u32>),
    /// 32 bit floating point samples.
    Float(SampleImage<f32>),
}

impl DataImage {
    /// Wrap an assembled raster without copying its samples.
    pub fn from_raster(raster: Raster) -> TiffRasterResult<Self> {
        let (width, length, n) = (raster.width(), raster.length(), raster.components_per_pixel());
        Ok(match raster.into_samples() {
            Samples::Bytes(v) => DataImage::Byte(SampleImage::new(width, length, n, v)?),
            Samples::Shorts(v) => DataImage::Short(SampleImage::new(width, length, n, v)?),
            Samples::Ints(v) => DataImage::Int(SampleImage::new(width, length, n, v)?),
            Samples::Floats(v) => DataImage::Float(SampleImage::new(width, length, n, v)?),
        })
    }

    /// Pixels per row.
    pub fn width(&self) -> u32 {
        match self {
            DataImage::Byte(image) => image.width(),
            DataImage::Short(image) => image.width(),
            DataImage::Int(image) => image.width(),
            DataImage::Float(image) => image.width(),
        }
    }

    /// Number of rows.
    pub fn length(&self) -> u32 {
        match self {
            DataImage::Byte(image) => image.length(),
            DataImage::Short(image) => image.length(),
            DataImage::Int(image) => image.length(),
            DataImage::Float(image) => image.length(),
        }
    }

    /// Samples per pixel.
    pub fn components_per_pixel(&self) -> usize {
        match self {
            DataImage::Byte(image) => image.components().count(),
            DataImage::Short(image) => image.components().count(),
            DataImage::Int(image) => image.components().count(),
            DataImage::Float(image) => image.components().count(),
        }
    }
}
