//! Codec pipeline: compression and encryption around byte payloads
//!
//! Composition order is fixed. Encoding compresses first and encrypts the
//! compressed bytes; decoding decrypts first and decompresses the result.
//! The compression kind is persisted in the entry header; the encryption
//! spec never is — it is an out-of-band secret the caller must supply again
//! at decode time, exactly as used at encode time.

mod compress;
mod encrypt;

pub use compress::{Compression, compress, decompress};
pub use encrypt::{ENCRYPTION_SCHEMES, Encryption, decrypt, encrypt};

use crate::error::BbmError;

/// Out-of-band encryption selection: scheme plus caller-supplied key
#[derive(Debug, Clone)]
pub struct EncryptionSpec {
    pub scheme: Encryption,
    pub key: String,
}

/// Per-container codec selection
#[derive(Debug, Clone, Default)]
pub struct CodecSpec {
    pub compression: Compression,
    pub encryption: Option<EncryptionSpec>,
}

impl CodecSpec {
    /// Compression only, no encryption
    pub fn compression(compression: Compression) -> Self {
        Self {
            compression,
            encryption: None,
        }
    }
}

/// Compress, then encrypt
pub fn encode_payload(data: &[u8], spec: &CodecSpec) -> Result<Vec<u8>, BbmError> {
    let compressed = compress(data, spec.compression)?;
    match &spec.encryption {
        Some(enc) => encrypt(&compressed, enc.scheme, &enc.key),
        None => Ok(compressed),
    }
}

/// Decrypt, then decompress
pub fn decode_payload(data: &[u8], spec: &CodecSpec) -> Result<Vec<u8>, BbmError> {
    let decrypted = match &spec.encryption {
        Some(enc) => decrypt(data, enc.scheme, &enc.key)?,
        None => data.to_vec(),
    };
    decompress(&decrypted, spec.compression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_then_encrypt_roundtrip() {
        let data: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
        let spec = CodecSpec {
            compression: Compression::Zlib,
            encryption: Some(EncryptionSpec {
                scheme: Encryption::Aes,
                key: "pipeline key".into(),
            }),
        };
        let coded = encode_payload(&data, &spec).unwrap();
        assert_ne!(coded, data);
        assert_eq!(decode_payload(&coded, &spec).unwrap(), data);
    }

    #[test]
    fn test_passthrough_spec_is_identity() {
        let data = b"identity".to_vec();
        let spec = CodecSpec::default();
        assert_eq!(encode_payload(&data, &spec).unwrap(), data);
        assert_eq!(decode_payload(&data, &spec).unwrap(), data);
    }
}
