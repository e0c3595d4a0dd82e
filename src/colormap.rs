//! The palette of a palette-color image.

use std::ops::Index;

use crate::error::{TiffRasterError, TiffRasterResult};

/// A ColorMap entry. Channels are 16-bit: 0 is the minimum intensity and 65535 the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red.
    pub r: u16,
    /// Green.
    pub g: u16,
    /// Blue.
    pub b: u16,
}

/// A color map for palette color images.
///
/// In the TIFF encoding all the Red values come first, followed by the Green values, then the
/// Blue values. [`ColorMap::create`] and [`ColorMap::flatten`] convert between that encoding and
/// a list of RGB triples, and are exact inverses of each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    rgb_values: Vec<Rgb>,
}

impl ColorMap {
    /// Build a color map from the planar encoding of the ColorMap tag.
    pub fn create(shorts: &[u16]) -> TiffRasterResult<Self> {
        if shorts.len() % 3 != 0 {
            return Err(TiffRasterError::InvalidColorMap(format!(
                "{} values is not a multiple of 3",
                shorts.len()
            )));
        }
        let n = shorts.len() / 3;
        let (reds, rest) = shorts.split_at(n);
        let (greens, blues) = rest.split_at(n);
        let rgb_values = reds
            .iter()
            .zip(greens)
            .zip(blues)
            .map(|((&r, &g), &b)| Rgb { r, g, b })
            .collect();
        Ok(Self { rgb_values })
    }

    /// Inverse of [`ColorMap::create`].
    pub fn flatten(&self) -> Vec<u16> {
        let n = self.rgb_values.len();
        let mut shorts = vec![0; n * 3];
        for (idx, rgb) in self.rgb_values.iter().enumerate() {
            shorts[idx] = rgb.r;
            shorts[n + idx] = rgb.g;
            shorts[2 * n + idx] = rgb.b;
        }
        shorts
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.rgb_values.len()
    }

    /// `true` if the palette has no entries.
    pub fn is_empty(&self) -> bool {
        self.rgb_values.is_empty()
    }

    /// The color at `index`, `None` past the end of the palette.
    pub fn rgb(&self, index: usize) -> Option<Rgb> {
        self.rgb_values.get(index).copied()
    }

    /// The color at `index` scaled down to 8-bit channels.
    pub fn rgb8(&self, index: usize) -> Option<[u8; 3]> {
        fn cmap_transform(val: u16) -> u8 {
            (val as u32 * 255 / 65535) as u8
        }

        self.rgb(index)
            .map(|rgb| [cmap_transform(rgb.r), cmap_transform(rgb.g), cmap_transform(rgb.b)])
    }
}

impl Index<usize> for ColorMap {
    type Output = Rgb;

    /// Panics if `index` is not below [`ColorMap::len`].
    fn index(&self, index: usize) -> &Rgb {
        &self.rgb_values[index]
    }
}
