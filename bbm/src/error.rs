//! Error types for BBM encoding and decoding

use std::io;

use thiserror::Error;

/// Errors that can occur while reading source meshes or coding containers
#[derive(Debug, Error)]
pub enum BbmError {
    /// Input file extension is not one of .obj/.ply/.stl
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// Input ended before its own framing said it would
    #[error("truncated input: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Source file or container bytes do not match the declared structure
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Container declares a compression code outside the known 0..=5 range
    #[error("unsupported compression code: {0}")]
    UnsupportedCodec(u16),

    /// Encryption scheme name is not in the recognized table
    #[error("unknown encryption scheme: {0}")]
    UnknownScheme(String),

    /// Block-cipher padding check failed, almost always a wrong key
    #[error("decryption failed: invalid padding (wrong key?)")]
    DecryptionFailed,

    /// Key material the selected cipher cannot accept
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    /// IO error while reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
