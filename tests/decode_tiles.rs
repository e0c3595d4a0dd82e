use tiff_raster::error::TiffRasterError;
use tiff_raster::image::{DataImage, Image, Pixel};
use tiff_raster::predictor::{DifferencingPredictor, FloatingPointPredictor};
use tiff_raster::reader::Endianness;
use tiff_raster::TIFF;

mod util;
use util::*;

/// Cut a row-major image of `bytes_per_pixel` wide pixels into zero padded tiles.
fn cut_tiles(
    pixels: &[u8],
    (width, length): (usize, usize),
    (tile_width, tile_length): (usize, usize),
    bytes_per_pixel: usize,
) -> Vec<Vec<u8>> {
    let mut tiles = vec![];
    for tile_row in 0..length.div_ceil(tile_length) {
        for tile_col in 0..width.div_ceil(tile_width) {
            let mut tile = vec![0; tile_width * tile_length * bytes_per_pixel];
            for y in 0..tile_length {
                for x in 0..tile_width {
                    let (row, col) = (tile_row * tile_length + y, tile_col * tile_width + x);
                    if row < length && col < width {
                        let from = (row * width + col) * bytes_per_pixel;
                        let to = (y * tile_width + x) * bytes_per_pixel;
                        tile[to..to + bytes_per_pixel]
                            .copy_from_slice(&pixels[from..from + bytes_per_pixel]);
                    }
                }
            }
            tiles.push(tile);
        }
    }
    tiles
}

fn tile_fields(width: u32, length: u32, tile_size: u32) -> Vec<(u16, Value)> {
    vec![
        (IMAGE_WIDTH, Value::Long(vec![width])),
        (IMAGE_LENGTH, Value::Long(vec![length])),
        (TILE_WIDTH, Value::Short(vec![tile_size as u16])),
        (TILE_LENGTH, Value::Short(vec![tile_size as u16])),
        (COMPRESSION, Value::Short(vec![1])),
    ]
}

#[test]
fn test_rgb_tiles() {
    init_logger();
    let (width, length) = (20usize, 18usize);
    let pixels: Vec<u8> = (0..width * length * 3).map(|i| (i % 253) as u8).collect();
    let tiles = cut_tiles(&pixels, (width, length), (16, 16), 3);
    assert_eq!(tiles.len(), 4);

    for big_endian in [false, true] {
        let mut builder = TiffBuilder::new(big_endian);
        let (offsets, counts) = builder.chunks(&tiles);
        let mut fields = tile_fields(width as u32, length as u32, 16);
        fields.extend([
            (BITS_PER_SAMPLE, Value::Short(vec![8, 8, 8])),
            (PHOTOMETRIC, Value::Short(vec![2])),
            (SAMPLES_PER_PIXEL, Value::Short(vec![3])),
            (TILE_OFFSETS, offsets),
            (TILE_BYTE_COUNTS, counts),
        ]);
        builder.ifd(fields);

        let tiff = TIFF::open(builder.build()).unwrap();
        let Image::Rgb(image) = tiff.read_image(0).unwrap() else {
            panic!("expected an RGB image")
        };
        assert_eq!((image.width(), image.length()), (20, 18));
        for (row, col) in [(0, 0), (0, 19), (15, 16), (17, 3), (17, 19)] {
            let at = (row * width + col) * 3;
            assert_eq!(
                image.value_at(row as u32, col as u32),
                [pixels[at], pixels[at + 1], pixels[at + 2]],
                "pixel ({row}, {col})"
            );
        }
    }
}

#[test]
fn test_float_tiles_with_floating_point_predictor() {
    let (width, length) = (3usize, 2usize);
    let values: Vec<f32> = vec![42.0, 43.0, -1.5, 0.25, 1e6, f32::MIN_POSITIVE];

    for (big_endian, endianness) in [(false, Endianness::LittleEndian), (true, Endianness::BigEndian)] {
        let pixels: Vec<u8> = values
            .iter()
            .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
            .collect();
        let predictor = FloatingPointPredictor {
            components: 1,
            bit_depth: 32,
            endianness,
        };
        let tiles: Vec<Vec<u8>> = cut_tiles(&pixels, (width, length), (16, 16), 4)
            .into_iter()
            .map(|mut tile| {
                tile.chunks_mut(16 * 4).for_each(|row| predictor.pack(row));
                tile
            })
            .collect();

        let mut builder = TiffBuilder::new(big_endian);
        let (offsets, counts) = builder.chunks(&tiles);
        let mut fields = tile_fields(width as u32, length as u32, 16);
        fields.extend([
            (BITS_PER_SAMPLE, Value::Short(vec![32])),
            (PHOTOMETRIC, Value::Short(vec![1])),
            (SAMPLE_FORMAT, Value::Short(vec![3])),
            (PREDICTOR, Value::Short(vec![3])),
            (TILE_OFFSETS, offsets),
            (TILE_BYTE_COUNTS, counts),
        ]);
        builder.ifd(fields);

        let tiff = TIFF::open(builder.build()).unwrap();
        let Image::Data(DataImage::Float(image)) = tiff.read_image(0).unwrap() else {
            panic!("expected float data")
        };
        assert_eq!(image.samples(), values.as_slice());
        assert_eq!(image.value_at(1, 0), Pixel::One(0.25));
    }
}

#[test]
fn test_wrong_tile_size() {
    let mut builder = TiffBuilder::new(false);
    let (offsets, counts) = builder.chunks(&[vec![0; 16 * 16], vec![0; 100]]);
    let mut fields = tile_fields(20, 10, 16);
    fields.extend([
        (BITS_PER_SAMPLE, Value::Short(vec![8])),
        (PHOTOMETRIC, Value::Short(vec![1])),
        (TILE_OFFSETS, offsets),
        (TILE_BYTE_COUNTS, counts),
    ]);
    builder.ifd(fields);

    let tiff = TIFF::open(builder.build()).unwrap();
    assert!(matches!(
        tiff.read_image(0),
        Err(TiffRasterError::MalformedTile {
            index: 1,
            expected: 256,
            actual: 100
        })
    ));
}

#[test]
fn test_mismatched_tile_tables() {
    let mut builder = TiffBuilder::new(false);
    let (offsets, _) = builder.chunks(&[vec![0; 16 * 16]]);
    let mut fields = tile_fields(16, 16, 16);
    fields.extend([
        (BITS_PER_SAMPLE, Value::Short(vec![8])),
        (PHOTOMETRIC, Value::Short(vec![1])),
        (TILE_OFFSETS, offsets),
        (TILE_BYTE_COUNTS, Value::Long(vec![256, 256])),
    ]);
    builder.ifd(fields);

    let tiff = TIFF::open(builder.build()).unwrap();
    assert!(matches!(
        tiff.read_raster(0),
        Err(TiffRasterError::InconsistentLayout { .. })
    ));
}
