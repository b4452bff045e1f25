//! BBM: a binary container format for triangle meshes
//!
//! This crate ingests OBJ, ASCII PLY, and binary STL files into a canonical
//! `(vertices, faces)` form, deduplicates them, packs them into
//! space-optimized payloads (half- or full-precision vertices, 16- or 32-bit
//! face indices), runs the payloads through a compression/encryption
//! pipeline, and frames one or many models into a single `.bbm` container.
//! Decoding reverses the pipeline and hands back the canonical mesh.
//!
//! # Container layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Entry 0                                                  │
//! │ ├── header (48 bytes: "BBM" + kind, counts, codec,       │
//! │ │            payload lengths, 16-byte model name)        │
//! │ ├── vertex payload (packed → compressed → encrypted)     │
//! │ └── face payload   (packed → compressed → encrypted)     │
//! ├──────────────────────────────────────────────────────────┤
//! │ Entry 1 ...                                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are contiguous; each header carries its payload lengths, so the
//! n-th entry is reached by walking offsets from byte 0. The compression
//! kind is stored per entry; the encryption scheme and key are out-of-band
//! secrets the decoding side must supply again.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use bbm::{CodecSpec, Compression};
//!
//! let model = bbm::convert_file(Path::new("bunny.obj")).unwrap();
//! let spec = CodecSpec::compression(Compression::Zstd);
//! let bytes = bbm::encode_container(&[model], &spec).unwrap();
//!
//! let (mesh, info) = bbm::decode_at(&bytes, 0, None).unwrap();
//! println!("{}: {} vertices", info.name, mesh.vertices.len());
//! ```

mod codec;
mod container;
mod error;
mod mesh;
mod optimize;
mod packing;
mod reader;

pub use codec::{
    CodecSpec, Compression, ENCRYPTION_SCHEMES, Encryption, EncryptionSpec, decode_payload,
    encode_payload,
};
pub use container::{
    Entries, EntryHeader, EntryInfo, Model, decode_at, encode_container, encode_entry, entries,
    write_container,
};
pub use error::BbmError;
pub use mesh::{Mesh, SourceKind};
pub use optimize::{OptimizeStats, optimize};
pub use packing::{pack_faces, pack_vertices, unpack_faces, unpack_vertices};
pub use reader::read_mesh;

// =============================================================================
// Format constants
// =============================================================================

/// Magic prefix of every entry header
pub const BBM_MAGIC: &[u8; 3] = b"BBM";

/// Fixed per-entry header size in bytes
pub const HEADER_SIZE: usize = EntryHeader::SIZE;

/// Fixed width of the header's model-name field
pub const MODEL_NAME_LEN: usize = 16;

/// Container file extension without dot
pub const BBM_EXTENSION: &str = "bbm";

use std::path::Path;

/// Read a source mesh, optimize it, and name it after the file stem.
///
/// This is the per-file half of the conversion pipeline; feed the returned
/// [`Model`]s to [`encode_container`] or [`write_container`].
pub fn convert_file(path: &Path) -> Result<Model, BbmError> {
    let (mut mesh, kind) = read_mesh(path)?;
    optimize(&mut mesh);

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Model { mesh, kind, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(BBM_MAGIC.len(), 3);
        assert_eq!(HEADER_SIZE, 48);
        assert_eq!(MODEL_NAME_LEN, 16);
    }
}
