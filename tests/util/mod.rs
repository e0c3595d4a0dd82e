#![allow(dead_code)]

use bytes::Bytes;

pub(crate) const IMAGE_WIDTH: u16 = 0x100;
pub(crate) const IMAGE_LENGTH: u16 = 0x101;
pub(crate) const BITS_PER_SAMPLE: u16 = 0x102;
pub(crate) const COMPRESSION: u16 = 0x103;
pub(crate) const PHOTOMETRIC: u16 = 0x106;
pub(crate) const STRIP_OFFSETS: u16 = 0x111;
pub(crate) const SAMPLES_PER_PIXEL: u16 = 0x115;
pub(crate) const ROWS_PER_STRIP: u16 = 0x116;
pub(crate) const STRIP_BYTE_COUNTS: u16 = 0x117;
pub(crate) const PREDICTOR: u16 = 0x13D;
pub(crate) const TILE_WIDTH: u16 = 0x142;
pub(crate) const TILE_LENGTH: u16 = 0x143;
pub(crate) const TILE_OFFSETS: u16 = 0x144;
pub(crate) const TILE_BYTE_COUNTS: u16 = 0x145;
pub(crate) const SAMPLE_FORMAT: u16 = 0x153;
pub(crate) const MODEL_PIXEL_SCALE: u16 = 33550;
pub(crate) const MODEL_TIEPOINT: u16 = 33922;
pub(crate) const GEO_KEY_DIRECTORY: u16 = 34735;
pub(crate) const GEO_DOUBLE_PARAMS: u16 = 34736;
pub(crate) const GEO_ASCII_PARAMS: u16 = 34737;

/// Field values, written with the matching TIFF field type.
#[derive(Debug, Clone)]
pub(crate) enum Value {
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    Double(Vec<f64>),
}

/// Writes small TIFF files: image data first, then the IFDs with their out-of-line values.
pub(crate) struct TiffBuilder {
    big_endian: bool,
    data: Vec<u8>,
    ifds: Vec<Vec<(u16, Value)>>,
}

impl TiffBuilder {
    pub(crate) fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            data: vec![0; 8],
            ifds: vec![],
        }
    }

    /// Append a chunk of image data, returning its offset.
    pub(crate) fn chunk(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(bytes);
        offset
    }

    /// Append `chunks` in the given order, returning offset and byte count fields for them.
    pub(crate) fn chunks(&mut self, chunks: &[Vec<u8>]) -> (Value, Value) {
        let offsets = chunks.iter().map(|c| self.chunk(c)).collect();
        let counts = chunks.iter().map(|c| c.len() as u32).collect();
        (Value::Long(offsets), Value::Long(counts))
    }

    pub(crate) fn ifd(&mut self, fields: Vec<(u16, Value)>) -> &mut Self {
        self.ifds.push(fields);
        self
    }

    fn u16(&self, v: u16) -> [u8; 2] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn u32(&self, v: u32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn encode(&self, value: &Value) -> (u16, u32, Vec<u8>) {
        match value {
            Value::Ascii(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                (2, bytes.len() as u32, bytes)
            }
            Value::Short(v) => (3, v.len() as u32, v.iter().flat_map(|&x| self.u16(x)).collect()),
            Value::Long(v) => (4, v.len() as u32, v.iter().flat_map(|&x| self.u32(x)).collect()),
            Value::Rational(v) => (
                5,
                v.len() as u32,
                v.iter()
                    .flat_map(|&(n, d)| self.u32(n).into_iter().chain(self.u32(d)))
                    .collect(),
            ),
            Value::Double(v) => (
                12,
                v.len() as u32,
                v.iter()
                    .flat_map(|&x| {
                        if self.big_endian {
                            x.to_be_bytes()
                        } else {
                            x.to_le_bytes()
                        }
                    })
                    .collect(),
            ),
        }
    }

    pub(crate) fn build(&self) -> Bytes {
        let mut out = self.data.clone();
        out[..2].copy_from_slice(if self.big_endian { b"MM" } else { b"II" });
        out[2..4].copy_from_slice(&self.u16(42));

        let mut pointer_at = 4;
        for fields in &self.ifds {
            if out.len() % 2 == 1 {
                out.push(0);
            }
            let start = out.len() as u32;
            let pointer = self.u32(start);
            out[pointer_at..pointer_at + 4].copy_from_slice(&pointer);

            let mut fields = fields.clone();
            fields.sort_by_key(|(tag, _)| *tag);
            let mut extra_at = start as usize + 2 + 12 * fields.len() + 4;
            let mut entries = self.u16(fields.len() as u16).to_vec();
            let mut extra = vec![];
            for (tag, value) in &fields {
                let (field_type, count, bytes) = self.encode(value);
                entries.extend_from_slice(&self.u16(*tag));
                entries.extend_from_slice(&self.u16(field_type));
                entries.extend_from_slice(&self.u32(count));
                if bytes.len() <= 4 {
                    let mut inline = bytes.clone();
                    inline.resize(4, 0);
                    entries.extend_from_slice(&inline);
                } else {
                    entries.extend_from_slice(&self.u32(extra_at as u32));
                    extra.extend_from_slice(&bytes);
                    extra_at += bytes.len();
                    if bytes.len() % 2 == 1 {
                        extra.push(0);
                        extra_at += 1;
                    }
                }
            }
            out.extend_from_slice(&entries);
            pointer_at = out.len();
            out.extend_from_slice(&[0; 4]);
            out.extend_from_slice(&extra);
        }
        out.into()
    }
}

/// Apply horizontal differencing to 16 bit little endian rows of `width` samples.
pub(crate) fn difference_u16_le(samples: &[u16], width: usize) -> Vec<u8> {
    samples
        .chunks(width)
        .flat_map(|row| {
            let mut previous = 0u16;
            row.iter()
                .map(move |&v| {
                    let d = v.wrapping_sub(previous);
                    previous = v;
                    d
                })
                .collect::<Vec<_>>()
        })
        .flat_map(u16::to_le_bytes)
        .collect()
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
