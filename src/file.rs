use std::sync::Arc;

use log::debug;

use crate::decoder::CompressorRegistry;
use crate::error::{TiffRasterError, TiffRasterResult};
use crate::geo::GeoImage;
use crate::ifd::Ifd;
use crate::image::{Image, ImageMaker, StandardImageMaker};
use crate::metadata::{TiffHeader, TiffMetadataReader};
use crate::raster::{read_raster, Raster};
use crate::reader::{Endianness, RangeReader};

/// Options controlling how pixel data is decoded.
///
/// The registry is shared, so compressors registered after opening a file are visible to it.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    compressors: Arc<CompressorRegistry>,
    image_maker: Arc<dyn ImageMaker>,
}

impl DecodeOptions {
    /// Use `compressors` to look up Compression tag values.
    pub fn with_compressors(mut self, compressors: Arc<CompressorRegistry>) -> Self {
        self.compressors = compressors;
        self
    }

    /// Use `image_maker` to build images out of rasters.
    pub fn with_image_maker(mut self, image_maker: Arc<dyn ImageMaker>) -> Self {
        self.image_maker = image_maker;
        self
    }

    /// The compressor registry.
    pub fn compressors(&self) -> &Arc<CompressorRegistry> {
        &self.compressors
    }

    /// The image maker.
    pub fn image_maker(&self) -> &Arc<dyn ImageMaker> {
        &self.image_maker
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            compressors: Arc::new(CompressorRegistry::default()),
            image_maker: Arc::new(StandardImageMaker),
        }
    }
}

/// A TIFF file.
///
/// Opening reads the header and every IFD. Pixel data is only read on request, one image at a
/// time.
#[derive(Debug)]
pub struct TIFF<R: RangeReader> {
    reader: R,
    header: TiffHeader,
    ifds: Vec<Ifd>,
    options: DecodeOptions,
}

impl<R: RangeReader> TIFF<R> {
    /// Open a TIFF with the default compressors and image maker.
    pub fn open(reader: R) -> TiffRasterResult<Self> {
        Self::open_with_options(reader, DecodeOptions::default())
    }

    /// Open a TIFF with explicit options.
    pub fn open_with_options(reader: R, options: DecodeOptions) -> TiffRasterResult<Self> {
        let mut metadata_reader = TiffMetadataReader::try_open(&reader)?;
        let header = metadata_reader.header();
        let ifds = metadata_reader.read_all_ifds(&reader)?;
        debug!("Opened {:?} TIFF with {} IFDs", header.endianness, ifds.len());
        Ok(Self {
            reader,
            header,
            ifds,
            options,
        })
    }

    /// The file header.
    pub fn header(&self) -> TiffHeader {
        self.header
    }

    /// Byte order of the file.
    pub fn endianness(&self) -> Endianness {
        self.header.endianness
    }

    /// Access the underlying Image File Directories.
    pub fn ifds(&self) -> &[Ifd] {
        &self.ifds
    }

    /// The options this file decodes with.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    fn ifd(&self, index: usize) -> TiffRasterResult<&Ifd> {
        self.ifds
            .get(index)
            .ok_or(TiffRasterError::IfdIndexOutOfRange {
                index,
                count: self.ifds.len(),
            })
    }

    /// Decode the pixel data of image `index` without interpreting it.
    pub fn read_raster(&self, index: usize) -> TiffRasterResult<Raster> {
        read_raster(
            &self.reader,
            self.ifd(index)?,
            self.endianness(),
            &self.options.compressors,
        )
    }

    /// Decode image `index` through the configured [`ImageMaker`].
    pub fn read_image(&self, index: usize) -> TiffRasterResult<Image> {
        let ifd = self.ifd(index)?;
        let raster = read_raster(&self.reader, ifd, self.endianness(), &self.options.compressors)?;
        self.options.image_maker.make(ifd, raster)
    }

    /// Decode every image in file order. Each image fails or succeeds on its own.
    pub fn images(&self) -> impl Iterator<Item = TiffRasterResult<Image>> + '_ {
        (0..self.ifds.len()).map(|index| self.read_image(index))
    }

    /// Decode image `index` together with its georeferencing.
    pub fn read_geo_image(&self, index: usize) -> TiffRasterResult<GeoImage> {
        GeoImage::new(self.read_image(index)?, self.ifd(index)?)
    }
}
