use crate::error::TiffRasterResult;
use crate::ifd::Ifd;

/// Affine transformation values.
///
/// Maps a raster position `(col, row)` to model coordinates:
/// `x = a * col + b * row + c`, `y = d * col + e * row + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform(f64, f64, f64, f64, f64, f64);

impl AffineTransform {
    #[allow(missing_docs)]
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self(a, b, xoff, d, e, yoff)
    }

    #[allow(missing_docs)]
    pub fn a(&self) -> f64 {
        self.0
    }

    #[allow(missing_docs)]
    pub fn b(&self) -> f64 {
        self.1
    }

    /// x offset
    pub fn c(&self) -> f64 {
        self.2
    }

    #[allow(missing_docs)]
    pub fn d(&self) -> f64 {
        self.3
    }

    #[allow(missing_docs)]
    pub fn e(&self) -> f64 {
        self.4
    }

    /// y offset
    pub fn f(&self) -> f64 {
        self.5
    }

    /// Model coordinates of raster position `(col, row)`.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.0 * col + self.1 * row + self.2,
            self.3 * col + self.4 * row + self.5,
        )
    }

    /// Construct a new Affine Transform from the IFD
    ///
    /// ModelTransformation wins when present. Otherwise ModelPixelScale and the first
    /// ModelTiepoint are combined, with the y axis pointing down the raster.
    pub fn from_ifd(ifd: &Ifd) -> TiffRasterResult<Option<Self>> {
        if let Some(m) = ifd.model_transformation()? {
            return Ok(Some(Self::new(
                m[0][0], m[0][1], m[0][3], m[1][0], m[1][1], m[1][3],
            )));
        }
        let scale = ifd.model_pixel_scale()?;
        let tiepoint = ifd
            .model_tiepoints()?
            .and_then(|tiepoints| tiepoints.into_iter().next());
        Ok(match (scale, tiepoint) {
            (Some(scale), Some(tiepoint)) => Some(Self::new(
                scale.x,
                0.0,
                tiepoint.x - tiepoint.i * scale.x,
                0.0,
                -scale.y,
                tiepoint.y + tiepoint.j * scale.y,
            )),
            _ => None,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ifd::Entry;
    use crate::tiff::tags::Tag;

    fn doubles(tag: Tag, values: Vec<f64>) -> Entry {
        Entry::Double { tag: tag.id, values }
    }

    #[test]
    fn test_from_scale_and_tiepoint() {
        let ifd = Ifd::new(
            vec![
                doubles(Tag::MODEL_PIXEL_SCALE, vec![60.0, 30.0, 0.0]),
                doubles(Tag::MODEL_TIE_POINT, vec![0.0, 0.0, 0.0, 440_720.0, 3_751_320.0, 0.0]),
            ],
            None,
        );
        let transform = AffineTransform::from_ifd(&ifd).unwrap().unwrap();
        assert_eq!(
            transform,
            AffineTransform::new(60.0, 0.0, 440_720.0, 0.0, -30.0, 3_751_320.0)
        );
        assert_eq!(transform.apply(2.0, 1.0), (440_840.0, 3_751_290.0));

        // a tiepoint anchored away from the raster origin
        let ifd = Ifd::new(
            vec![
                doubles(Tag::MODEL_PIXEL_SCALE, vec![2.0, 2.0, 0.0]),
                doubles(Tag::MODEL_TIE_POINT, vec![1.0, 1.0, 0.0, 10.0, 10.0, 0.0]),
            ],
            None,
        );
        let transform = AffineTransform::from_ifd(&ifd).unwrap().unwrap();
        assert_eq!((transform.c(), transform.f()), (8.0, 12.0));
        assert_eq!(transform.apply(1.0, 1.0), (10.0, 10.0));
    }

    #[test]
    fn test_model_transformation_wins() {
        #[rustfmt::skip]
        let matrix = vec![
            1.0, 0.5, 0.0, 100.0,
            0.25, -1.0, 0.0, 200.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        let ifd = Ifd::new(
            vec![
                doubles(Tag::MODEL_TRANSFORMATION, matrix),
                doubles(Tag::MODEL_PIXEL_SCALE, vec![60.0, 30.0, 0.0]),
                doubles(Tag::MODEL_TIE_POINT, vec![0.0; 6]),
            ],
            None,
        );
        let transform = AffineTransform::from_ifd(&ifd).unwrap().unwrap();
        assert_eq!(
            (transform.a(), transform.b(), transform.c()),
            (1.0, 0.5, 100.0)
        );
        assert_eq!(
            (transform.d(), transform.e(), transform.f()),
            (0.25, -1.0, 200.0)
        );
    }

    #[test]
    fn test_incomplete_georeferencing() {
        let ifd = Ifd::new(vec![doubles(Tag::MODEL_PIXEL_SCALE, vec![1.0, 1.0, 0.0])], None);
        assert_eq!(AffineTransform::from_ifd(&ifd).unwrap(), None);
        assert_eq!(AffineTransform::from_ifd(&Ifd::new(vec![], None)).unwrap(), None);
    }
}
