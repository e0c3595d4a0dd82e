use tiff_raster::error::TiffRasterError;
use tiff_raster::geo::{AffineTransform, AngularUnit, GeoKey, ModelPixelScale};
use tiff_raster::image::{DataImage, Image};
use tiff_raster::reader::FileReader;
use tiff_raster::{Entry, TIFF};

mod util;
use util::*;

/// A 2x2 32 bit float elevation grid in WGS 84 with the given georeferencing tags.
fn elevation(big_endian: bool, geo: Vec<(u16, Value)>) -> bytes::Bytes {
    let values = [101.5f32, 102.0, 99.25, 98.0];
    let strip: Vec<u8> = values
        .iter()
        .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect();

    let mut builder = TiffBuilder::new(big_endian);
    let (offsets, counts) = builder.chunks(&[strip]);
    let mut fields = vec![
        (IMAGE_WIDTH, Value::Short(vec![2])),
        (IMAGE_LENGTH, Value::Short(vec![2])),
        (BITS_PER_SAMPLE, Value::Short(vec![32])),
        (COMPRESSION, Value::Short(vec![1])),
        (PHOTOMETRIC, Value::Short(vec![1])),
        (ROWS_PER_STRIP, Value::Short(vec![2])),
        (SAMPLE_FORMAT, Value::Short(vec![3])),
        (STRIP_OFFSETS, offsets),
        (STRIP_BYTE_COUNTS, counts),
    ];
    fields.extend(geo);
    builder.ifd(fields);
    builder.build()
}

fn wgs84_keys() -> Vec<(u16, Value)> {
    #[rustfmt::skip]
    let directory = vec![
        1, 1, 0, 6,
        0x0400, 0, 1, 2,
        0x0401, 0, 1, 1,
        0x0800, 0, 1, 4326,
        0x0801, 34737, 7, 0,
        0x0806, 0, 1, 9102,
        0x0809, 34736, 1, 1,
    ];
    vec![
        (GEO_KEY_DIRECTORY, Value::Short(directory)),
        (GEO_DOUBLE_PARAMS, Value::Double(vec![298.257223563, 6_378_137.0])),
        (GEO_ASCII_PARAMS, Value::Ascii("WGS 84|".to_string())),
        (MODEL_PIXEL_SCALE, Value::Double(vec![0.5, 0.25, 0.0])),
        (MODEL_TIEPOINT, Value::Double(vec![0.0, 0.0, 0.0, 10.0, 50.0, 0.0])),
    ]
}

#[test]
fn test_geo_keys_through_the_file() {
    init_logger();
    for big_endian in [false, true] {
        let tiff = TIFF::open(elevation(big_endian, wgs84_keys())).unwrap();
        let ifd = &tiff.ifds()[0];
        assert_eq!(
            ifd.model_pixel_scale().unwrap(),
            Some(ModelPixelScale {
                x: 0.5,
                y: 0.25,
                z: 0.0
            })
        );
        assert_eq!(ifd.geo_ascii_params().unwrap().as_deref(), Some("WGS 84|"));

        let directory = ifd.geo_key_directory().unwrap().unwrap();
        assert_eq!(directory.keys().len(), 6);
        assert_eq!(directory.model_type().unwrap(), 2);
        assert_eq!(directory.raster_type().unwrap(), 1);
        assert_eq!(directory.geodetic_crs().unwrap(), Some(4326));
        assert_eq!(directory.geodetic_citation().unwrap().as_deref(), Some("WGS 84"));
        assert_eq!(directory.geo_angular_unit().unwrap(), Some(AngularUnit::Degree));
        assert_eq!(directory.geog_semi_major_axis().unwrap(), Some(6_378_137.0));
        assert_eq!(directory.projected_crs().unwrap(), None);
        assert!(matches!(
            directory.find_key(GeoKey::VERTICAL_CRS.id).as_ref(),
            Entry::NotFound { .. }
        ));
    }
}

#[test]
fn test_read_geo_image() {
    let tiff = TIFF::open(elevation(false, wgs84_keys())).unwrap();
    let geo = tiff.read_geo_image(0).unwrap();
    let transform = geo.transform().unwrap();
    assert_eq!(
        *transform,
        AffineTransform::new(0.5, 0.0, 10.0, 0.0, -0.25, 50.0)
    );
    assert_eq!(transform.apply(2.0, 2.0), (11.0, 49.5));
    assert_eq!(geo.geo_key_directory().unwrap().geodetic_crs().unwrap(), Some(4326));

    let Image::Data(DataImage::Float(image)) = geo.into_image() else {
        panic!("expected float data")
    };
    assert_eq!(image.samples(), &[101.5, 102.0, 99.25, 98.0]);
}

#[test]
fn test_invalid_key_directory() {
    // declares two keys but holds one
    let geo = vec![(GEO_KEY_DIRECTORY, Value::Short(vec![1, 1, 0, 2, 0x0400, 0, 1, 2]))];
    let tiff = TIFF::open(elevation(false, geo)).unwrap();
    assert!(matches!(
        tiff.read_geo_image(0),
        Err(TiffRasterError::InvalidGeoKeyDirectory(_))
    ));
    // plain reads do not look at georeferencing
    assert!(tiff.read_image(0).is_ok());
}

#[test]
fn test_key_pointing_at_absent_tag() {
    #[rustfmt::skip]
    let directory = vec![
        1, 1, 1, 2,
        0x0400, 0, 1, 1,
        0x0402, 34737, 5, 0,
    ];
    let tiff = TIFF::open(elevation(true, vec![(GEO_KEY_DIRECTORY, Value::Short(directory))])).unwrap();
    let geo = tiff.read_geo_image(0).unwrap();
    let directory = geo.geo_key_directory().unwrap();
    assert_eq!(directory.minor_revision(), 1);
    assert_eq!(directory.citation().unwrap(), None);
    assert!(geo.transform().is_none());
}

#[test]
fn test_file_reader() {
    let path = std::env::temp_dir().join(format!("tiff-raster-geotiff-{}.tif", std::process::id()));
    std::fs::write(&path, elevation(true, wgs84_keys())).unwrap();

    let tiff = TIFF::open(FileReader::open(&path).unwrap()).unwrap();
    let geo = tiff.read_geo_image(0).unwrap();
    assert_eq!(geo.image().width(), 2);
    assert_eq!(geo.transform().unwrap().c(), 10.0);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_file_reader_oversized_byte_count() {
    let mut builder = TiffBuilder::new(false);
    let (offsets, _) = builder.chunks(&[vec![0; 16]]);
    builder.ifd(vec![
        (IMAGE_WIDTH, Value::Short(vec![2])),
        (IMAGE_LENGTH, Value::Short(vec![2])),
        (BITS_PER_SAMPLE, Value::Short(vec![32])),
        (COMPRESSION, Value::Short(vec![1])),
        (PHOTOMETRIC, Value::Short(vec![1])),
        (ROWS_PER_STRIP, Value::Short(vec![2])),
        (SAMPLE_FORMAT, Value::Short(vec![3])),
        (STRIP_OFFSETS, offsets),
        (STRIP_BYTE_COUNTS, Value::Long(vec![u32::MAX])),
    ]);
    let path = std::env::temp_dir().join(format!("tiff-raster-oversized-{}.tif", std::process::id()));
    std::fs::write(&path, builder.build()).unwrap();

    let tiff = TIFF::open(FileReader::open(&path).unwrap()).unwrap();
    assert!(matches!(
        tiff.read_image(0),
        Err(TiffRasterError::EndOfFile(requested, _)) if requested == u32::MAX as u64
    ));

    std::fs::remove_file(&path).unwrap();
}
