//! Decompressors for the TIFF compression methods.

mod lzw;
mod packbits;

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::{Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use flate2::bufread::ZlibDecoder;
use log::debug;

use crate::error::{TiffRasterError, TiffRasterResult};

/// Compression tag value for uncompressed data.
pub const COMPRESSION_NONE: u16 = 1;
/// Compression tag value for CCITT Group 3 Modified Huffman.
pub const COMPRESSION_MODIFIED_HUFFMAN: u16 = 2;
/// Compression tag value for LZW.
pub const COMPRESSION_LZW: u16 = 5;
/// Compression tag value for Adobe Deflate.
pub const COMPRESSION_DEFLATE: u16 = 8;
/// Compression tag value for PackBits.
pub const COMPRESSION_PACKBITS: u16 = 32773;
/// Compression tag value for the older Deflate code.
pub const COMPRESSION_OLD_DEFLATE: u16 = 32946;

/// A registry of compressors, keyed by Compression tag value.
///
/// This allows end users to register their own compressors, for custom compression methods, or
/// override the default implementations. The registry is internally synchronized: it can be
/// shared behind an [`Arc`] and extended while other threads look codes up. Codes are never
/// removed, only added or replaced.
#[derive(Debug)]
pub struct CompressorRegistry(RwLock<HashMap<u16, Arc<dyn Compressor>>>);

impl CompressorRegistry {
    /// Create a new registry with no compressors registered
    pub fn new() -> Self {
        Self(RwLock::new(HashMap::new()))
    }

    /// Register `compressor` for `code`, replacing any previous registration.
    pub fn register(&self, code: u16, compressor: Arc<dyn Compressor>) -> &Self {
        debug!("Registering compressor {compressor:?} for code {code}");
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code, compressor);
        self
    }

    /// The compressor registered for `code`.
    pub fn compressor_for(&self, code: u16) -> TiffRasterResult<Arc<dyn Compressor>> {
        let compressors = self.0.read().unwrap_or_else(PoisonError::into_inner);
        match compressors.get(&code) {
            Some(compressor) => Ok(compressor.clone()),
            None => {
                let mut known = compressors.keys().copied().collect::<Vec<_>>();
                known.sort_unstable();
                Err(TiffRasterError::UnknownCompressionCode {
                    code,
                    known: known
                        .iter()
                        .map(u16::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        }
    }

    /// All registered codes, in ascending order.
    pub fn codes(&self) -> Vec<u16> {
        let mut codes = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect::<Vec<_>>();
        codes.sort_unstable();
        codes
    }
}

impl Default for CompressorRegistry {
    fn default() -> Self {
        let registry = Self::new();
        registry
            .register(COMPRESSION_NONE, Arc::new(Uncompressed))
            .register(COMPRESSION_MODIFIED_HUFFMAN, Arc::new(ModifiedHuffman))
            .register(COMPRESSION_LZW, Arc::new(Lzw))
            .register(COMPRESSION_DEFLATE, Arc::new(Deflate))
            .register(COMPRESSION_PACKBITS, Arc::new(PackBits))
            .register(COMPRESSION_OLD_DEFLATE, Arc::new(Deflate));
        registry
    }
}

/// A trait to expand one compressed strip or tile back to its raw bytes.
pub trait Compressor: Debug + Send + Sync {
    /// Decompress a strip or tile.
    fn decompress(&self, compressed: Bytes) -> TiffRasterResult<Vec<u8>>;
}

/// A compressor for uncompressed data.
#[derive(Debug, Clone)]
pub struct Uncompressed;

impl Compressor for Uncompressed {
    fn decompress(&self, compressed: Bytes) -> TiffRasterResult<Vec<u8>> {
        Ok(compressed.to_vec())
    }
}

/// Placeholder for CCITT Group 3 Modified Huffman. Always fails with
/// [`TiffRasterError::NotImplemented`].
#[derive(Debug, Clone)]
pub struct ModifiedHuffman;

impl Compressor for ModifiedHuffman {
    fn decompress(&self, _compressed: Bytes) -> TiffRasterResult<Vec<u8>> {
        Err(TiffRasterError::NotImplemented(
            "Modified Huffman (CCITT Group 3) decompression",
        ))
    }
}

/// A compressor for the LZW compression method.
#[derive(Debug, Clone)]
pub struct Lzw;

impl Compressor for Lzw {
    fn decompress(&self, compressed: Bytes) -> TiffRasterResult<Vec<u8>> {
        lzw::decompress(&compressed)
    }
}

/// A compressor for the PackBits compression method.
#[derive(Debug, Clone)]
pub struct PackBits;

impl Compressor for PackBits {
    fn decompress(&self, compressed: Bytes) -> TiffRasterResult<Vec<u8>> {
        packbits::decompress(&compressed)
    }
}

/// A compressor for the Deflate compression method.
#[derive(Debug, Clone)]
pub struct Deflate;

impl Compressor for Deflate {
    fn decompress(&self, compressed: Bytes) -> TiffRasterResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(Cursor::new(compressed));
        let mut result = Vec::new();
        decoder
            .read_to_end(&mut result)
            .map_err(|e| TiffRasterError::CorruptData {
                method: "Deflate",
                reason: e.to_string(),
            })?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    use super::*;

    #[test]
    fn test_default_codes() {
        let registry = CompressorRegistry::default();
        assert_eq!(registry.codes(), vec![1, 2, 5, 8, 32773, 32946]);
        let data = Bytes::from_static(&[1, 2, 3]);
        let uncompressed = registry.compressor_for(1).unwrap();
        assert_eq!(uncompressed.decompress(data.clone()).unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            registry.compressor_for(2).unwrap().decompress(data),
            Err(TiffRasterError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_unknown_code_lists_known() {
        let registry = CompressorRegistry::new();
        registry
            .register(5, Arc::new(Lzw))
            .register(1, Arc::new(Uncompressed));
        match registry.compressor_for(7) {
            Err(e @ TiffRasterError::UnknownCompressionCode { code: 7, .. }) => assert_eq!(
                e.to_string(),
                "Unable to locate compressor for code: 7. Known codes are: 1, 5."
            ),
            other => panic!("{other:?}"),
        }
    }

    #[derive(Debug)]
    struct Reverse;

    impl Compressor for Reverse {
        fn decompress(&self, compressed: Bytes) -> TiffRasterResult<Vec<u8>> {
            Ok(compressed.iter().rev().copied().collect())
        }
    }

    #[test]
    fn test_register_overrides_across_threads() {
        let registry = Arc::new(CompressorRegistry::default());
        let handles = (0..4u16)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry.register(40000 + i, Arc::new(Reverse));
                    registry.compressor_for(1).is_ok()
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(registry.codes().len(), 10);

        registry.register(1, Arc::new(Reverse));
        let out = registry
            .compressor_for(1)
            .unwrap()
            .decompress(Bytes::from_static(&[1, 2, 3]))
            .unwrap();
        assert_eq!(out, vec![3, 2, 1]);
    }

    #[test]
    fn test_deflate() {
        let data = (0..1000u32).map(|v| (v % 7) as u8).collect::<Vec<_>>();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(Deflate.decompress(compressed.into()).unwrap(), data);
        assert!(matches!(
            Deflate.decompress(Bytes::from_static(&[0x78, 0x9c, 0xff, 0xff])),
            Err(TiffRasterError::CorruptData { method: "Deflate", .. })
        ));
    }
}
