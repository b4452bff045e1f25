//! Compression backends, selected by the persisted u16 code

use std::io::{Read, Write};

use crate::error::BbmError;

/// Zstandard level used on encode, matching the converter this format
/// originated from
const ZSTD_LEVEL: i32 = 9;
/// XZ preset used for the lzma mode
const LZMA_PRESET: u32 = 6;

/// Compression kind, persisted as a small integer in every entry header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum Compression {
    #[default]
    None = 0,
    Bz2 = 1,
    Lz4 = 2,
    Zstd = 3,
    Zlib = 4,
    Lzma = 5,
}

impl Compression {
    /// All supported kinds, in code order
    pub const ALL: [Compression; 6] = [
        Self::None,
        Self::Bz2,
        Self::Lz4,
        Self::Zstd,
        Self::Zlib,
        Self::Lzma,
    ];

    /// Code persisted in the entry header
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Strict lookup for the decode path: a container claiming a code
    /// outside the known range is an error.
    pub fn from_code(code: u16) -> Result<Self, BbmError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Bz2),
            2 => Ok(Self::Lz4),
            3 => Ok(Self::Zstd),
            4 => Ok(Self::Zlib),
            5 => Ok(Self::Lzma),
            other => Err(BbmError::UnsupportedCodec(other)),
        }
    }

    /// Encode-side lookup: unknown integers fall back to pass-through
    pub fn from_code_lossy(code: u16) -> Self {
        Self::from_code(code).unwrap_or(Self::None)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bz2 => "bz2",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
            Self::Zlib => "zlib",
            Self::Lzma => "lzma",
        }
    }
}

/// Compress a payload with the selected backend
pub fn compress(data: &[u8], mode: Compression) -> Result<Vec<u8>, BbmError> {
    match mode {
        Compression::None => Ok(data.to_vec()),
        Compression::Bz2 => {
            let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
        Compression::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        Compression::Zstd => Ok(zstd::encode_all(data, ZSTD_LEVEL)?),
        Compression::Zlib => {
            let mut enc =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
        Compression::Lzma => {
            let mut enc = xz2::write::XzEncoder::new(Vec::new(), LZMA_PRESET);
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
    }
}

/// Decompress a payload.
///
/// Corrupt compressed streams surface as `Malformed` naming the codec.
pub fn decompress(data: &[u8], mode: Compression) -> Result<Vec<u8>, BbmError> {
    match mode {
        Compression::None => Ok(data.to_vec()),
        Compression::Bz2 => {
            let mut out = Vec::new();
            bzip2::read::BzDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| BbmError::Malformed(format!("bz2: {e}")))?;
            Ok(out)
        }
        Compression::Lz4 => lz4_flex::decompress_size_prepended(data)
            .map_err(|e| BbmError::Malformed(format!("lz4: {e}"))),
        Compression::Zstd => {
            zstd::decode_all(data).map_err(|e| BbmError::Malformed(format!("zstd: {e}")))
        }
        Compression::Zlib => {
            let mut out = Vec::new();
            flate2::read::ZlibDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| BbmError::Malformed(format!("zlib: {e}")))?;
            Ok(out)
        }
        Compression::Lzma => {
            let mut out = Vec::new();
            xz2::read::XzDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| BbmError::Malformed(format!("lzma: {e}")))?;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_codec_roundtrips() {
        // Repetitive payload so every backend actually shrinks something
        let data: Vec<u8> = b"abcdefgh".repeat(64);
        for mode in Compression::ALL {
            let compressed = compress(&data, mode).unwrap();
            let restored = decompress(&compressed, mode).unwrap();
            assert_eq!(restored, data, "mode {mode:?}");
        }
    }

    #[test]
    fn test_every_codec_roundtrips_empty_payload() {
        for mode in Compression::ALL {
            let compressed = compress(&[], mode).unwrap();
            assert!(decompress(&compressed, mode).unwrap().is_empty(), "mode {mode:?}");
        }
    }

    #[test]
    fn test_code_roundtrip() {
        for mode in Compression::ALL {
            assert_eq!(Compression::from_code(mode.code()).unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_code_strict_vs_lossy() {
        assert!(matches!(
            Compression::from_code(9),
            Err(BbmError::UnsupportedCodec(9))
        ));
        assert_eq!(Compression::from_code_lossy(9), Compression::None);
    }

    #[test]
    fn test_corrupt_stream_is_malformed() {
        let garbage = [0x13u8, 0x37, 0x00, 0xff, 0x42];
        for mode in [Compression::Bz2, Compression::Zstd, Compression::Zlib, Compression::Lzma] {
            assert!(
                matches!(decompress(&garbage, mode), Err(BbmError::Malformed(_))),
                "mode {mode:?}"
            );
        }
    }
}
