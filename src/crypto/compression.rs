//! Payload compression.
//!
//! Compression runs before encryption - ciphertext is indistinguishable
//! from random and does not compress - and the choice is recorded in the
//! envelope so the recipient reverses exactly what the sender applied.
//! There is no negotiation: one algorithm per message, taken from the
//! envelope's `compression` field.

use std::io;
use thiserror::Error;

/// zstd level used for all compression; the speed/ratio middle ground.
const ZSTD_LEVEL: i32 = 3;

/// Compression errors.
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("unknown compression algorithm {0:?}")]
    UnknownAlgorithm(String),
}

/// The compression choice recorded in an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Zstandard at level 3.
    Zstd,
    /// No compression; for payloads that are already compressed.
    None,
}

impl Compression {
    /// The identifier written into the envelope's `compression` field.
    pub fn id(&self) -> &'static str {
        match self {
            Compression::Zstd => "zstd",
            Compression::None => "none",
        }
    }

    /// Resolves an envelope's recorded identifier.
    pub fn from_id(id: &str) -> Result<Self, CompressionError> {
        match id {
            "zstd" => Ok(Compression::Zstd),
            "none" => Ok(Compression::None),
            other => Err(CompressionError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Compresses `data` with the given algorithm.
pub fn compress(data: &[u8], compression: Compression) -> Result<Vec<u8>, CompressionError> {
    match compression {
        Compression::Zstd => zstd::encode_all(data, ZSTD_LEVEL)
            .map_err(|e: io::Error| CompressionError::CompressionFailed(e.to_string())),
        Compression::None => Ok(data.to_vec()),
    }
}

/// Reverses [`compress`] according to an envelope's recorded identifier.
///
/// Fails closed on identifiers this build does not know.
pub fn decompress(data: &[u8], compression_id: &str) -> Result<Vec<u8>, CompressionError> {
    match Compression::from_id(compression_id)? {
        Compression::Zstd => zstd::decode_all(data)
            .map_err(|e: io::Error| CompressionError::DecompressionFailed(e.to_string())),
        Compression::None => Ok(data.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zstd_roundtrip() {
        let data = b"this text repeats. this text repeats. this text repeats.";
        let compressed = compress(data, Compression::Zstd).unwrap();
        let restored = decompress(&compressed, "zstd").unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_zstd_actually_compresses() {
        let data = vec![b'A'; 4096];
        let compressed = compress(&data, Compression::Zstd).unwrap();
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn test_none_is_identity() {
        let data = b"\x00\x01\x02already compressed";
        let compressed = compress(data, Compression::None).unwrap();
        assert_eq!(compressed, data);
        assert_eq!(decompress(&compressed, "none").unwrap(), data);
    }

    #[test]
    fn test_empty_roundtrip() {
        for compression in [Compression::Zstd, Compression::None] {
            let compressed = compress(b"", compression).unwrap();
            assert_eq!(decompress(&compressed, compression.id()).unwrap(), b"");
        }
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = decompress(b"data", "brotli").unwrap_err();
        assert!(matches!(err, CompressionError::UnknownAlgorithm(_)));
        assert!(err.to_string().contains("brotli"));
    }

    #[test]
    fn test_corrupted_zstd_stream_rejected() {
        let mut compressed = compress(b"some payload to mangle", Compression::Zstd).unwrap();
        compressed.truncate(compressed.len() / 2);
        assert!(matches!(
            decompress(&compressed, "zstd"),
            Err(CompressionError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_id_mapping() {
        assert_eq!(Compression::Zstd.id(), "zstd");
        assert_eq!(Compression::None.id(), "none");
        assert_eq!(Compression::from_id("zstd").unwrap(), Compression::Zstd);
        assert_eq!(Compression::from_id("none").unwrap(), Compression::None);
    }
}
