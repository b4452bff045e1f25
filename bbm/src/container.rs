//! BBM container framing and traversal
//!
//! A container is a sequence of entries laid out back to back with no
//! padding. Each entry is a fixed 48-byte header followed by the coded
//! vertex payload and the coded face payload; the header states both payload
//! lengths, so traversal is a cumulative-offset walk with no index block.
//! Reaching entry `i` costs O(i) header reads, which is fine at the entry
//! counts this format carries (tens, not millions).

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::codec::{self, CodecSpec, Compression, EncryptionSpec};
use crate::error::BbmError;
use crate::mesh::{Mesh, SourceKind};
use crate::packing;
use crate::{BBM_MAGIC, MODEL_NAME_LEN};

/// Per-entry header (48 bytes, all integers little-endian)
///
/// ```text
/// 0x00: magic "BBM" (3 bytes) + source-kind marker (1 byte)
/// 0x04: vertex_count u32
/// 0x08: face_count u32
/// 0x0C: compression u16
/// 0x0E: entry_count u16 (total entries, repeated in every header)
/// 0x10: vertex_len u64 (coded vertex payload length)
/// 0x18: face_len u64 (coded face payload length)
/// 0x20: model name (16 bytes, UTF-8, zero padded)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub kind: u8,
    pub vertex_count: u32,
    pub face_count: u32,
    pub compression: u16,
    pub entry_count: u16,
    pub vertex_len: u64,
    pub face_len: u64,
    pub name: [u8; MODEL_NAME_LEN],
}

impl EntryHeader {
    pub const SIZE: usize = 48;

    /// Write the header through any writer
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BBM_MAGIC)?;
        w.write_u8(self.kind)?;
        w.write_u32::<LittleEndian>(self.vertex_count)?;
        w.write_u32::<LittleEndian>(self.face_count)?;
        w.write_u16::<LittleEndian>(self.compression)?;
        w.write_u16::<LittleEndian>(self.entry_count)?;
        w.write_u64::<LittleEndian>(self.vertex_len)?;
        w.write_u64::<LittleEndian>(self.face_len)?;
        w.write_all(&self.name)?;
        Ok(())
    }

    /// Read a header from the front of `bytes` and validate the magic
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BbmError> {
        if bytes.len() < Self::SIZE {
            return Err(BbmError::Truncated {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        if &bytes[0..3] != BBM_MAGIC {
            return Err(BbmError::Malformed(format!(
                "bad magic {:02x?} (expected \"BBM\")",
                &bytes[0..3]
            )));
        }
        let mut name = [0u8; MODEL_NAME_LEN];
        name.copy_from_slice(&bytes[32..48]);
        Ok(Self {
            kind: bytes[3],
            vertex_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            face_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            compression: u16::from_le_bytes([bytes[12], bytes[13]]),
            entry_count: u16::from_le_bytes([bytes[14], bytes[15]]),
            vertex_len: u64::from_le_bytes(bytes[16..24].try_into().unwrap()),
            face_len: u64::from_le_bytes(bytes[24..32].try_into().unwrap()),
            name,
        })
    }

    /// Stored model name with the zero padding stripped
    pub fn model_name(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MODEL_NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// Metadata for one container entry, as yielded by [`entries`]
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Position in the container walk, 0-based
    pub index: usize,
    /// Byte offset of the entry's header
    pub offset: usize,
    pub name: String,
    /// Raw source-kind marker; unknown values are informational, not errors
    pub kind: u8,
    pub vertex_count: u32,
    pub face_count: u32,
    pub compression: u16,
    pub entry_count: u16,
    pub vertex_len: u64,
    pub face_len: u64,
}

impl EntryInfo {
    fn from_header(header: &EntryHeader, index: usize, offset: usize) -> Self {
        Self {
            index,
            offset,
            name: header.model_name(),
            kind: header.kind,
            vertex_count: header.vertex_count,
            face_count: header.face_count,
            compression: header.compression,
            entry_count: header.entry_count,
            vertex_len: header.vertex_len,
            face_len: header.face_len,
        }
    }

    /// Decoded source kind, when the marker is a known one
    pub fn source_kind(&self) -> Option<SourceKind> {
        SourceKind::from_marker(self.kind)
    }
}

/// One model queued for encoding
#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Mesh,
    pub kind: SourceKind,
    pub name: String,
}

/// Lazy offset-walk over a container's entries.
///
/// The iterator borrows the bytes and owns nothing else; a fresh traversal
/// can be started at any time with another [`entries`] call.
pub struct Entries<'a> {
    data: &'a [u8],
    offset: usize,
    index: usize,
    done: bool,
}

/// Start a traversal at byte offset 0
pub fn entries(data: &[u8]) -> Entries<'_> {
    Entries {
        data,
        offset: 0,
        index: 0,
        done: false,
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<EntryInfo, BbmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.data.len() {
            return None;
        }

        let header = match EntryHeader::from_bytes(&self.data[self.offset..]) {
            Ok(h) => h,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let span = match entry_span(&header) {
            Ok(s) => s,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if span > self.data.len() - self.offset {
            self.done = true;
            return Some(Err(BbmError::Truncated {
                expected: self.offset + span,
                actual: self.data.len(),
            }));
        }

        let info = EntryInfo::from_header(&header, self.index, self.offset);
        self.offset += span;
        self.index += 1;
        Some(Ok(info))
    }
}

/// Header plus both payloads, with overflow-checked arithmetic
fn entry_span(header: &EntryHeader) -> Result<usize, BbmError> {
    let vlen = usize::try_from(header.vertex_len);
    let flen = usize::try_from(header.face_len);
    match (vlen, flen) {
        (Ok(v), Ok(f)) => EntryHeader::SIZE
            .checked_add(v)
            .and_then(|n| n.checked_add(f))
            .ok_or_else(|| span_overflow(header)),
        _ => Err(span_overflow(header)),
    }
}

fn span_overflow(header: &EntryHeader) -> BbmError {
    BbmError::Malformed(format!(
        "entry payload lengths {} + {} overflow addressable size",
        header.vertex_len, header.face_len
    ))
}

/// Encode one mesh into entry bytes.
///
/// `entry_count` is the total number of entries the surrounding container
/// will hold; single-model containers pass 1.
pub fn encode_entry(
    mesh: &Mesh,
    kind: SourceKind,
    name: &str,
    spec: &CodecSpec,
    entry_count: u16,
) -> Result<Vec<u8>, BbmError> {
    mesh.validate()?;

    let vertex_count = u32::try_from(mesh.vertices.len())
        .map_err(|_| BbmError::Malformed("vertex count exceeds u32".into()))?;
    let face_count = u32::try_from(mesh.faces.len())
        .map_err(|_| BbmError::Malformed("face count exceeds u32".into()))?;

    let vertex_payload = codec::encode_payload(&packing::pack_vertices(&mesh.vertices), spec)?;
    let face_payload =
        codec::encode_payload(&packing::pack_faces(&mesh.faces, vertex_count), spec)?;

    let header = EntryHeader {
        kind: kind.marker(),
        vertex_count,
        face_count,
        compression: spec.compression.code(),
        entry_count,
        vertex_len: vertex_payload.len() as u64,
        face_len: face_payload.len() as u64,
        name: encode_name(name),
    };

    let mut out =
        Vec::with_capacity(EntryHeader::SIZE + vertex_payload.len() + face_payload.len());
    header.write_to(&mut out)?;
    out.extend_from_slice(&vertex_payload);
    out.extend_from_slice(&face_payload);

    tracing::debug!(
        "Encoded entry {:?}: {} vertices, {} faces, payloads {}+{} bytes ({})",
        name,
        vertex_count,
        face_count,
        vertex_payload.len(),
        face_payload.len(),
        spec.compression.as_str()
    );

    Ok(out)
}

/// Encode a whole container; entries appear in input order
pub fn encode_container(models: &[Model], spec: &CodecSpec) -> Result<Vec<u8>, BbmError> {
    let entry_count = u16::try_from(models.len())
        .map_err(|_| BbmError::Malformed("container holds at most 65535 entries".into()))?;

    let mut out = Vec::new();
    for model in models {
        out.extend_from_slice(&encode_entry(
            &model.mesh,
            model.kind,
            &model.name,
            spec,
            entry_count,
        )?);
    }
    Ok(out)
}

/// Encode a container and write it to `path` via a sibling temp file plus
/// rename, so readers never observe a half-written container. Returns the
/// encoded bytes.
pub fn write_container(
    path: &Path,
    models: &[Model],
    spec: &CodecSpec,
) -> Result<Vec<u8>, BbmError> {
    let bytes = encode_container(models, spec)?;
    let tmp = path.with_extension("bbm.tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    Ok(bytes)
}

/// Decode the entry at `index`.
///
/// An index at or past the container's declared entry count falls back to
/// entry 0 instead of erroring; callers that want validation should measure
/// [`entries`] first. `encryption` must repeat exactly what was used at
/// encode time, or be `None` for unencrypted containers.
pub fn decode_at(
    data: &[u8],
    index: usize,
    encryption: Option<&EncryptionSpec>,
) -> Result<(Mesh, EntryInfo), BbmError> {
    let first = EntryHeader::from_bytes(data)?;

    let declared = first.entry_count as usize;
    let target = if index < declared {
        index
    } else {
        if index != 0 {
            tracing::warn!(
                "entry index {} out of range for {} entries, selecting entry 0",
                index,
                declared
            );
        }
        0
    };

    let mut selected = None;
    for (i, item) in entries(data).enumerate() {
        let info = item?;
        if i == target {
            selected = Some(info);
            break;
        }
    }
    let info = selected.ok_or_else(|| {
        BbmError::Malformed(format!(
            "container ended before entry {target} (declared {declared} entries)"
        ))
    })?;

    let spec = CodecSpec {
        compression: Compression::from_code(info.compression)?,
        encryption: encryption.cloned(),
    };

    // entries() already bounds-checked this span against the buffer
    let vertex_start = info.offset + EntryHeader::SIZE;
    let face_start = vertex_start + info.vertex_len as usize;
    let face_end = face_start + info.face_len as usize;
    let vertex_payload = &data[vertex_start..face_start];
    let face_payload = &data[face_start..face_end];

    let vertices = packing::unpack_vertices(&codec::decode_payload(vertex_payload, &spec)?)?;
    if vertices.len() != info.vertex_count as usize {
        return Err(BbmError::Malformed(format!(
            "vertex payload holds {} vertices but header declares {}",
            vertices.len(),
            info.vertex_count
        )));
    }

    let faces = packing::unpack_faces(
        &codec::decode_payload(face_payload, &spec)?,
        info.vertex_count,
    )?;
    if faces.len() != info.face_count as usize {
        return Err(BbmError::Malformed(format!(
            "face payload holds {} faces but header declares {}",
            faces.len(),
            info.face_count
        )));
    }

    let mesh = Mesh { vertices, faces };
    mesh.validate()?;

    Ok((mesh, info))
}

/// Fit a model name into the fixed 16-byte header field: zero padded,
/// truncated on a char boundary when longer
fn encode_name(name: &str) -> [u8; MODEL_NAME_LEN] {
    let mut out = [0u8; MODEL_NAME_LEN];
    let mut end = name.len().min(MODEL_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    if end < name.len() {
        tracing::warn!("model name {:?} truncated to {} bytes", name, end);
    }
    out[..end].copy_from_slice(&name.as_bytes()[..end]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> EntryHeader {
        EntryHeader {
            kind: SourceKind::Ply.marker(),
            vertex_count: 8,
            face_count: 12,
            compression: 3,
            entry_count: 2,
            vertex_len: 49,
            face_len: 73,
            name: encode_name("cube"),
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), EntryHeader::SIZE);
        assert_eq!(EntryHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_layout_is_little_endian() {
        let header = sample_header();
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert_eq!(&bytes[0..3], b"BBM");
        assert_eq!(bytes[3], 2);
        assert_eq!(&bytes[4..8], &8u32.to_le_bytes());
        assert_eq!(&bytes[12..14], &3u16.to_le_bytes());
        assert_eq!(&bytes[16..24], &49u64.to_le_bytes());
        assert_eq!(&bytes[32..36], b"cube");
        assert_eq!(bytes[36], 0);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = Vec::new();
        sample_header().write_to(&mut bytes).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            EntryHeader::from_bytes(&bytes),
            Err(BbmError::Malformed(_))
        ));
    }

    #[test]
    fn test_short_header_rejected() {
        assert!(matches!(
            EntryHeader::from_bytes(&[0u8; 20]),
            Err(BbmError::Truncated { expected: 48, .. })
        ));
    }

    #[test]
    fn test_name_padding_and_truncation() {
        assert_eq!(&encode_name("cube")[..5], b"cube\0");
        let long = encode_name("a-model-name-that-overflows");
        assert_eq!(&long, b"a-model-name-tha");
        // Multi-byte chars never split
        let uni = encode_name("модель-юнит");
        assert!(std::str::from_utf8(&uni[..uni.iter().position(|&b| b == 0).unwrap_or(16)]).is_ok());
    }

    #[test]
    fn test_unknown_kind_marker_is_informational() {
        let mut header = sample_header();
        header.kind = 9;
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        let parsed = EntryHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.kind, 9);
        let info = EntryInfo::from_header(&parsed, 0, 0);
        assert_eq!(info.source_kind(), None);
    }
}
