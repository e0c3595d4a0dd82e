use std::io::Write;
use std::sync::Arc;

use bytes::Bytes;
use flate2::write::ZlibEncoder;
use tiff_raster::decoder::{Compressor, CompressorRegistry};
use tiff_raster::error::{TiffRasterError, TiffRasterResult};
use tiff_raster::image::{DataImage, Image, Pixel};
use tiff_raster::raster::Samples;
use tiff_raster::{DecodeOptions, TIFF};

mod util;
use util::*;

/// Fields of an 8 bit grayscale image split into strips.
fn gray_fields(width: u32, length: u32, rows_per_strip: u32, compression: u16) -> Vec<(u16, Value)> {
    vec![
        (IMAGE_WIDTH, Value::Long(vec![width])),
        (IMAGE_LENGTH, Value::Long(vec![length])),
        (BITS_PER_SAMPLE, Value::Short(vec![8])),
        (COMPRESSION, Value::Short(vec![compression])),
        (PHOTOMETRIC, Value::Short(vec![1])),
        (ROWS_PER_STRIP, Value::Long(vec![rows_per_strip])),
    ]
}

fn gray_pixels(width: u32, length: u32) -> Vec<u8> {
    (0..width * length).map(|i| (i * 7 % 251) as u8).collect()
}

fn gray_values(image: &Image) -> Vec<u8> {
    let Image::Grayscale(image) = image else {
        panic!("expected a grayscale image, got {image:?}")
    };
    (0..image.length())
        .flat_map(|row| (0..image.width()).map(move |col| (row, col)))
        .map(|(row, col)| image.value_at(row, col))
        .collect()
}

#[test]
fn test_strips_in_both_byte_orders() {
    init_logger();
    let (width, length, rows_per_strip) = (5, 7, 3);
    let pixels = gray_pixels(width, length);
    let strips: Vec<Vec<u8>> = pixels
        .chunks((width * rows_per_strip) as usize)
        .map(<[u8]>::to_vec)
        .collect();

    for big_endian in [false, true] {
        let mut builder = TiffBuilder::new(big_endian);
        let (offsets, counts) = builder.chunks(&strips);
        let mut fields = gray_fields(width, length, rows_per_strip, 1);
        fields.extend([(STRIP_OFFSETS, offsets), (STRIP_BYTE_COUNTS, counts)]);
        builder.ifd(fields);

        let tiff = TIFF::open(builder.build()).unwrap();
        let image = tiff.read_image(0).unwrap();
        assert_eq!((image.width(), image.length()), (width, length));
        assert_eq!(gray_values(&image), pixels);
    }
}

#[test]
fn test_strip_order_follows_offsets_not_file_position() {
    let (width, length) = (4, 6);
    let pixels = gray_pixels(width, length);
    let strips: Vec<Vec<u8>> = pixels.chunks(8).map(<[u8]>::to_vec).collect();

    // write strips 2, 0, 1 into the file
    let mut builder = TiffBuilder::new(false);
    let at: Vec<u32> = [2, 0, 1].iter().map(|&i| builder.chunk(&strips[i])).collect();
    let mut fields = gray_fields(width, length, 2, 1);
    fields.extend([
        (STRIP_OFFSETS, Value::Long(vec![at[1], at[2], at[0]])),
        (STRIP_BYTE_COUNTS, Value::Long(vec![8, 8, 8])),
    ]);
    builder.ifd(fields);

    let tiff = TIFF::open(builder.build()).unwrap();
    assert_eq!(gray_values(&tiff.read_image(0).unwrap()), pixels);
}

#[test]
fn test_decoding_is_deterministic() {
    let pixels = gray_pixels(3, 3);
    let mut builder = TiffBuilder::new(true);
    let (offsets, counts) = builder.chunks(&[pixels.clone()]);
    let mut fields = gray_fields(3, 3, 3, 1);
    fields.extend([(STRIP_OFFSETS, offsets), (STRIP_BYTE_COUNTS, counts)]);
    builder.ifd(fields);

    let tiff = TIFF::open(builder.build()).unwrap();
    assert_eq!(tiff.read_image(0).unwrap(), tiff.read_image(0).unwrap());
    assert_eq!(tiff.read_raster(0).unwrap(), tiff.read_raster(0).unwrap());
}

#[test]
fn test_lzw_with_horizontal_predictor() {
    init_logger();
    let (width, length) = (6u32, 4u32);
    let values: Vec<u16> = (0..width * length).map(|i| (i * 1000 + 3) as u16).collect();
    let differenced = difference_u16_le(&values, width as usize);
    let encoded = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
        .encode(&differenced)
        .unwrap();

    let mut builder = TiffBuilder::new(false);
    let (offsets, counts) = builder.chunks(&[encoded]);
    builder.ifd(vec![
        (IMAGE_WIDTH, Value::Short(vec![width as u16])),
        (IMAGE_LENGTH, Value::Short(vec![length as u16])),
        (BITS_PER_SAMPLE, Value::Short(vec![16])),
        (COMPRESSION, Value::Short(vec![5])),
        (PHOTOMETRIC, Value::Short(vec![1])),
        (ROWS_PER_STRIP, Value::Short(vec![length as u16])),
        (PREDICTOR, Value::Short(vec![2])),
        (STRIP_OFFSETS, offsets),
        (STRIP_BYTE_COUNTS, counts),
    ]);

    let tiff = TIFF::open(builder.build()).unwrap();
    let raster = tiff.read_raster(0).unwrap();
    assert_eq!(raster.bits_per_sample(), 16);
    assert_eq!(raster.into_samples(), Samples::Shorts(values.clone()));

    // 16 bit grayscale is not a baseline image
    let Image::Data(DataImage::Short(image)) = tiff.read_image(0).unwrap() else {
        panic!("expected 16 bit data")
    };
    assert_eq!(image.value_at(1, 2), Pixel::One(values[8]));
}

#[test]
fn test_packbits_and_deflate() {
    let (width, length) = (8u32, 2u32);
    let pixels: Vec<u8> = vec![0, 0, 0, 0, 0, 0, 1, 2, 9, 9, 9, 9, 8, 7, 6, 5];

    // row 0: a run of six zeros then a literal pair, row 1: a run of four nines then literals
    #[rustfmt::skip]
    let packbits = vec![
        (-5i8) as u8, 0, 1, 1, 2,
        (-3i8) as u8, 9, 3, 8, 7, 6, 5,
    ];
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&pixels).unwrap();
    let deflated = encoder.finish().unwrap();

    for (compression, strip) in [(32773, packbits), (8, deflated.clone()), (32946, deflated)] {
        let mut builder = TiffBuilder::new(false);
        let (offsets, counts) = builder.chunks(&[strip]);
        let mut fields = gray_fields(width, length, length, compression);
        fields.extend([(STRIP_OFFSETS, offsets), (STRIP_BYTE_COUNTS, counts)]);
        builder.ifd(fields);

        let tiff = TIFF::open(builder.build()).unwrap();
        assert_eq!(
            gray_values(&tiff.read_image(0).unwrap()),
            pixels,
            "compression {compression}"
        );
    }
}

#[test]
fn test_every_ifd_is_an_image() {
    let mut builder = TiffBuilder::new(true);
    let (first_offsets, first_counts) = builder.chunks(&[vec![1, 2, 3, 4]]);
    let (second_offsets, second_counts) = builder.chunks(&[vec![10, 20]]);
    let mut first = gray_fields(2, 2, 2, 1);
    first.extend([(STRIP_OFFSETS, first_offsets), (STRIP_BYTE_COUNTS, first_counts)]);
    let mut second = gray_fields(1, 2, 2, 1);
    second.extend([(STRIP_OFFSETS, second_offsets), (STRIP_BYTE_COUNTS, second_counts)]);
    // an IFD without any layout tags
    let third = gray_fields(1, 1, 1, 1);
    builder.ifd(first).ifd(second).ifd(third);

    let tiff = TIFF::open(builder.build()).unwrap();
    assert_eq!(tiff.ifds().len(), 3);
    let images: Vec<_> = tiff.images().collect();
    assert_eq!(gray_values(images[0].as_ref().unwrap()), vec![1, 2, 3, 4]);
    assert_eq!(gray_values(images[1].as_ref().unwrap()), vec![10, 20]);
    assert!(matches!(images[2], Err(TiffRasterError::NoRasterLayout)));
}

#[test]
fn test_truncated_strip() {
    let mut builder = TiffBuilder::new(false);
    let (offsets, _) = builder.chunks(&[vec![1, 2, 3, 4, 5, 6]]);
    let mut fields = gray_fields(3, 3, 3, 1);
    // the strip claims to be longer than the file
    fields.extend([(STRIP_OFFSETS, offsets), (STRIP_BYTE_COUNTS, Value::Long(vec![4096]))]);
    builder.ifd(fields);

    let tiff = TIFF::open(builder.build()).unwrap();
    assert!(matches!(tiff.read_image(0), Err(TiffRasterError::EndOfFile(..))));
}

#[test]
fn test_huge_declared_dimensions() {
    // a few bytes declaring an i32::MAX by i32::MAX image with a single one byte strip
    let mut builder = TiffBuilder::new(false);
    let (offsets, counts) = builder.chunks(&[vec![0]]);
    builder.ifd(vec![
        (IMAGE_WIDTH, Value::Long(vec![i32::MAX as u32])),
        (IMAGE_LENGTH, Value::Long(vec![i32::MAX as u32])),
        (BITS_PER_SAMPLE, Value::Short(vec![8])),
        (COMPRESSION, Value::Short(vec![1])),
        (PHOTOMETRIC, Value::Short(vec![1])),
        (STRIP_OFFSETS, offsets),
        (STRIP_BYTE_COUNTS, counts),
    ]);

    let tiff = TIFF::open(builder.build()).unwrap();
    assert_eq!(tiff.ifds()[0].image_width().unwrap(), i32::MAX as u64);
    assert!(matches!(
        tiff.read_raster(0),
        Err(TiffRasterError::MalformedStrip { index: 1, .. })
    ));
    assert!(matches!(
        tiff.read_image(0),
        Err(TiffRasterError::MalformedStrip { index: 1, .. })
    ));
}

/// Stores strips XORed with a key.
#[derive(Debug)]
struct Xor(u8);

impl Compressor for Xor {
    fn decompress(&self, data: Bytes) -> TiffRasterResult<Vec<u8>> {
        Ok(data.iter().map(|b| b ^ self.0).collect())
    }
}

#[test]
fn test_registered_compressor() {
    let pixels = vec![1u8, 2, 3, 4];
    let mut builder = TiffBuilder::new(false);
    let stored: Vec<u8> = pixels.iter().map(|b| b ^ 0x5a).collect();
    let (offsets, counts) = builder.chunks(&[stored]);
    let mut fields = gray_fields(2, 2, 2, 40000);
    fields.extend([(STRIP_OFFSETS, offsets), (STRIP_BYTE_COUNTS, counts)]);
    builder.ifd(fields);

    let registry = Arc::new(CompressorRegistry::default());
    let options = DecodeOptions::default().with_compressors(registry.clone());
    let tiff = TIFF::open_with_options(builder.build(), options).unwrap();
    assert!(matches!(
        tiff.read_image(0),
        Err(TiffRasterError::UnknownCompressionCode { code: 40000, .. })
    ));

    // registering on the shared registry is visible to the open file
    registry.register(40000, Arc::new(Xor(0x5a)));
    assert_eq!(gray_values(&tiff.read_image(0).unwrap()), pixels);
}
