//! Differencing predictors: none, horizontal and floating-point.
//!
//! Predictors operate on one row of decompressed bytes at a time, in file byte order.
use std::fmt::Debug;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{TiffRasterError, TiffRasterResult};
use crate::reader::Endianness;
use crate::tiff::tags::Predictor;

/// A reversible per-row transform applied before compression.
///
/// `unpack(pack(row)) == row` for every row whose length is a whole number of samples.
pub trait DifferencingPredictor: Debug + Send + Sync {
    /// Undo the prediction in place, turning differences back into samples.
    fn unpack(&self, row: &mut [u8]);

    /// Apply the prediction in place, turning samples into differences.
    fn pack(&self, row: &mut [u8]);
}

/// Pick the predictor for a Predictor tag value.
///
/// `bits_per_sample` is the (uniform) sample width and `components` the samples per pixel.
pub fn predictor_for(
    predictor: u16,
    bits_per_sample: u16,
    components: usize,
    endianness: Endianness,
) -> TiffRasterResult<Box<dyn DifferencingPredictor>> {
    let predictor = Predictor::try_from(predictor).map_err(|_| TiffRasterError::UnknownValue {
        name: "Predictor",
        code: predictor.into(),
    })?;
    let unsupported = || {
        TiffRasterError::Unsupported(format!(
            "{predictor:?} predictor with {bits_per_sample} bits per sample"
        ))
    };
    match predictor {
        Predictor::None => Ok(Box::new(NoPredictor)),
        Predictor::Horizontal => match bits_per_sample {
            8 => Ok(Box::new(PlanarPredictor { components })),
            16 | 32 | 64 => Ok(Box::new(HorizontalPredictor::new(
                components,
                bits_per_sample,
                endianness,
            )?)),
            _ => Err(unsupported()),
        },
        Predictor::FloatingPoint => match bits_per_sample {
            16 | 32 | 64 => Ok(Box::new(FloatingPointPredictor {
                components,
                bit_depth: bits_per_sample,
                endianness,
            })),
            _ => Err(unsupported()),
        },
    }
}

/// no predictor
#[derive(Debug)]
pub struct NoPredictor;

impl DifferencingPredictor for NoPredictor {
    fn unpack(&self, _row: &mut [u8]) {}

    fn pack(&self, _row: &mut [u8]) {}
}

/// Differencing over interleaved single-byte channels.
///
/// Every byte is predicted from the byte `components` positions before it, regardless of what
/// the bytes mean.
#[derive(Debug)]
pub struct PlanarPredictor {
    /// Interleaved channels per pixel.
    pub components: usize,
}

impl DifferencingPredictor for PlanarPredictor {
    fn unpack(&self, row: &mut [u8]) {
        for i in self.components..row.len() {
            row[i] = row[i].wrapping_add(row[i - self.components]);
        }
    }

    fn pack(&self, row: &mut [u8]) {
        for i in (self.components..row.len()).rev() {
            row[i] = row[i].wrapping_sub(row[i - self.components]);
        }
    }
}

/// Horizontal differencing over 16, 32 or 64 bit integer samples stored in file byte order.
///
/// 8 bit samples need no byte order and use [`PlanarPredictor`].
#[derive(Debug)]
pub struct HorizontalPredictor {
    components: usize,
    width: SampleWidth,
    endianness: Endianness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleWidth {
    U16,
    U32,
    U64,
}

trait Sample: Copy {
    const SIZE: usize;
    fn read<B: ByteOrder>(buf: &[u8]) -> Self;
    fn write<B: ByteOrder>(self, buf: &mut [u8]);
    fn wrapping_add(self, other: Self) -> Self;
    fn wrapping_sub(self, other: Self) -> Self;
}

macro_rules! impl_sample {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Sample for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn read<B: ByteOrder>(buf: &[u8]) -> Self {
                B::$read(buf)
            }

            fn write<B: ByteOrder>(self, buf: &mut [u8]) {
                B::$write(buf, self)
            }

            fn wrapping_add(self, other: Self) -> Self {
                <$ty>::wrapping_add(self, other)
            }

            fn wrapping_sub(self, other: Self) -> Self {
                <$ty>::wrapping_sub(self, other)
            }
        }
    };
}

impl_sample!(u16, read_u16, write_u16);
impl_sample!(u32, read_u32, write_u32);
impl_sample!(u64, read_u64, write_u64);

fn unpack_samples<T: Sample, B: ByteOrder>(row: &mut [u8], components: usize) {
    let size = T::SIZE;
    for i in components..row.len() / size {
        let prev = T::read::<B>(&row[(i - components) * size..]);
        let cur = T::read::<B>(&row[i * size..]);
        cur.wrapping_add(prev).write::<B>(&mut row[i * size..]);
    }
}

fn pack_samples<T: Sample, B: ByteOrder>(row: &mut [u8], components: usize) {
    let size = T::SIZE;
    for i in (components..row.len() / size).rev() {
        let prev = T::read::<B>(&row[(i - components) * size..]);
        let cur = T::read::<B>(&row[i * size..]);
        cur.wrapping_sub(prev).write::<B>(&mut row[i * size..]);
    }
}

impl HorizontalPredictor {
    /// Fails with [`TiffRasterError::Unsupported`] unless `bit_depth` is 16, 32 or 64.
    pub fn new(components: usize, bit_depth: u16, endianness: Endianness) -> TiffRasterResult<Self> {
        let width = match bit_depth {
            16 => SampleWidth::U16,
            32 => SampleWidth::U32,
            64 => SampleWidth::U64,
            _ => {
                return Err(TiffRasterError::Unsupported(format!(
                    "horizontal differencing over {bit_depth} bit samples"
                )))
            }
        };
        Ok(Self {
            components,
            width,
            endianness,
        })
    }

    /// Bits per sample.
    pub fn bit_depth(&self) -> u16 {
        match self.width {
            SampleWidth::U16 => 16,
            SampleWidth::U32 => 32,
            SampleWidth::U64 => 64,
        }
    }

    fn apply(&self, row: &mut [u8], pack: bool) {
        fn run<B: ByteOrder>(row: &mut [u8], components: usize, width: SampleWidth, pack: bool) {
            match (width, pack) {
                (SampleWidth::U16, false) => unpack_samples::<u16, B>(row, components),
                (SampleWidth::U16, true) => pack_samples::<u16, B>(row, components),
                (SampleWidth::U32, false) => unpack_samples::<u32, B>(row, components),
                (SampleWidth::U32, true) => pack_samples::<u32, B>(row, components),
                (SampleWidth::U64, false) => unpack_samples::<u64, B>(row, components),
                (SampleWidth::U64, true) => pack_samples::<u64, B>(row, components),
            }
        }

        match self.endianness {
            Endianness::LittleEndian => run::<LittleEndian>(row, self.components, self.width, pack),
            Endianness::BigEndian => run::<BigEndian>(row, self.components, self.width, pack),
        }
    }
}

impl DifferencingPredictor for HorizontalPredictor {
    fn unpack(&self, row: &mut [u8]) {
        self.apply(row, false)
    }

    fn pack(&self, row: &mut [u8]) {
        self.apply(row, true)
    }
}

/// Floating point predictor
///
/// floating point prediction first shuffles the bytes of each sample into planes, most
/// significant byte first, and then uses byte-wise horizontal differencing over the whole row.
/// Unpacking writes the samples back in file byte order.
#[derive(Debug)]
pub struct FloatingPointPredictor {
    /// Samples per pixel.
    pub components: usize,
    /// Bits per sample, 16, 32 or 64.
    pub bit_depth: u16,
    /// Byte order of the samples.
    pub endianness: Endianness,
}

impl FloatingPointPredictor {
    /// Position within a sample, in file byte order, of byte plane `plane`.
    fn byte_in_sample(&self, plane: usize, size: usize) -> usize {
        match self.endianness {
            Endianness::BigEndian => plane,
            Endianness::LittleEndian => size - 1 - plane,
        }
    }
}

impl DifferencingPredictor for FloatingPointPredictor {
    fn unpack(&self, row: &mut [u8]) {
        PlanarPredictor {
            components: self.components,
        }
        .unpack(row);

        let size = self.bit_depth as usize / 8;
        let n = row.len() / size;
        let shuffled = row.to_vec();
        for i in 0..n {
            for plane in 0..size {
                row[i * size + self.byte_in_sample(plane, size)] = shuffled[plane * n + i];
            }
        }
    }

    fn pack(&self, row: &mut [u8]) {
        let size = self.bit_depth as usize / 8;
        let n = row.len() / size;
        let samples = row.to_vec();
        for i in 0..n {
            for plane in 0..size {
                row[plane * n + i] = samples[i * size + self.byte_in_sample(plane, size)];
            }
        }

        PlanarPredictor {
            components: self.components,
        }
        .pack(row);
    }
}
