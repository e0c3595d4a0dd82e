use crate::colormap::{ColorMap, Rgb};
use crate::error::{TiffRasterError, TiffRasterResult};
use crate::ifd::Rational;
use crate::tiff::tags::ResolutionUnit;

/// XResolution, YResolution and ResolutionUnit of a baseline image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Pixels per unit along a row.
    pub x: Rational,
    /// Pixels per unit along a column.
    pub y: Rational,
    /// The unit both resolutions are measured in.
    pub unit: ResolutionUnit,
}

fn index(width: u32, length: u32, components: usize, row: u32, col: u32) -> usize {
    assert!(
        row < length && col < width,
        "pixel ({row}, {col}) out of bounds for {width}x{length}"
    );
    (row as usize * width as usize + col as usize) * components
}

/// Color of a bi-level pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackOrWhite {
    #[allow(missing_docs)]
    Black,
    #[allow(missing_docs)]
    White,
}

/// A 1 bit image.
#[derive(Debug, Clone, PartialEq)]
pub struct BiLevelImage {
    pub(crate) width: u32,
    pub(crate) length: u32,
    pub(crate) white_is_zero: bool,
    pub(crate) pixels: Vec<u8>,
    pub(crate) resolution: Option<Resolution>,
}

impl BiLevelImage {
    /// Pixels per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// `true` for PhotometricInterpretation 0, where a 0 bit is white.
    pub fn white_is_zero(&self) -> bool {
        self.white_is_zero
    }

    #[allow(missing_docs)]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// The color at `row`, `col`. Panics outside the image.
    pub fn value_at(&self, row: u32, col: u32) -> BlackOrWhite {
        let set = self.pixels[index(self.width, self.length, 1, row, col)] != 0;
        if set == self.white_is_zero {
            BlackOrWhite::Black
        } else {
            BlackOrWhite::White
        }
    }
}

/// A 4 or 8 bit grayscale image.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayscaleImage {
    pub(crate) width: u32,
    pub(crate) length: u32,
    pub(crate) bits_per_sample: u16,
    pub(crate) white_is_zero: bool,
    pub(crate) pixels: Vec<u8>,
    pub(crate) resolution: Option<Resolution>,
}

impl GrayscaleImage {
    /// Pixels per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// 4 or 8.
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// `true` for PhotometricInterpretation 0, where 0 is white.
    pub fn white_is_zero(&self) -> bool {
        self.white_is_zero
    }

    #[allow(missing_docs)]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// The stored sample at `row`, `col`, in `0..2^bits_per_sample`. Panics outside the image.
    pub fn value_at(&self, row: u32, col: u32) -> u8 {
        self.pixels[index(self.width, self.length, 1, row, col)]
    }

    /// The sample at `row`, `col` scaled to 8 bits with 0 as black.
    pub fn brightness_at(&self, row: u32, col: u32) -> u8 {
        let value = self.value_at(row, col);
        let scaled = match self.bits_per_sample {
            4 => value * 17,
            _ => value,
        };
        if self.white_is_zero {
            255 - scaled
        } else {
            scaled
        }
    }
}

/// An 8,8,8 bit RGB image.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    pub(crate) width: u32,
    pub(crate) length: u32,
    pub(crate) pixels: Vec<u8>,
    pub(crate) resolution: Option<Resolution>,
}

impl RgbImage {
    /// Pixels per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn length(&self) -> u32 {
        self.length
    }

    #[allow(missing_docs)]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// The red, green and blue samples at `row`, `col`. Panics outside the image.
    pub fn value_at(&self, row: u32, col: u32) -> [u8; 3] {
        let i = index(self.width, self.length, 3, row, col);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }
}

/// An image of indices into a [`ColorMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteColorImage {
    pub(crate) width: u32,
    pub(crate) length: u32,
    pub(crate) indices: Vec<u8>,
    pub(crate) color_map: ColorMap,
    pub(crate) resolution: Option<Resolution>,
}

impl PaletteColorImage {
    /// Fails with [`TiffRasterError::InvalidColorMap`] if an index points past the color map.
    pub(crate) fn new(
        width: u32,
        length: u32,
        indices: Vec<u8>,
        color_map: ColorMap,
        resolution: Option<Resolution>,
    ) -> TiffRasterResult<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= color_map.len()) {
            return Err(TiffRasterError::InvalidColorMap(format!(
                "index {index} past the {} entry color map",
                color_map.len()
            )));
        }
        Ok(Self {
            width,
            length,
            indices,
            color_map,
            resolution,
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

    #[allow(missing_docs)]
    pub fn color_map(&self) -> &ColorMap {
        &self.color_map
    }

    #[allow(missing_docs)]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// The palette index at `row`, `col`. Panics outside the image.
    pub fn index_at(&self, row: u32, col: u32) -> u8 {
        self.indices[index(self.width, self.length, 1, row, col)]
    }

    /// The 16 bit color at `row`, `col`. Panics outside the image.
    pub fn value_at(&self, row: u32, col: u32) -> Rgb {
        self.color_map[self.index_at(row, col) as usize]
    }
}
