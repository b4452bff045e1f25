//! Canonical in-memory mesh representation

use crate::error::BbmError;

/// A triangle mesh in the canonical form shared by every reader and codec.
///
/// Vertices keep their first-seen order. Faces hold 0-based indices into
/// `vertices` regardless of the source format's convention; the invariant
/// `index < vertices.len()` holds for every face of a mesh produced by the
/// readers or by [`crate::container::decode_at`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions, 32-bit floats
    pub vertices: Vec<[f32; 3]>,
    /// Triangles as ordered index triples
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Check the face-index invariant.
    ///
    /// Returns `Malformed` naming the first face whose indices point outside
    /// the vertex list.
    pub fn validate(&self) -> Result<(), BbmError> {
        let count = self.vertices.len() as u32;
        for (i, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&idx| idx >= count) {
                return Err(BbmError::Malformed(format!(
                    "face {} references vertex {} but mesh has {} vertices",
                    i,
                    face.iter().max().copied().unwrap_or(0),
                    count
                )));
            }
        }
        Ok(())
    }
}

/// Source format of an encoded model, stored as the byte after the magic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Obj,
    Ply,
    Stl,
}

impl SourceKind {
    /// Marker byte persisted in the entry tag
    pub const fn marker(self) -> u8 {
        match self {
            Self::Obj => 1,
            Self::Ply => 2,
            Self::Stl => 3,
        }
    }

    /// Decode a persisted marker byte.
    ///
    /// Unknown markers yield `None`; they are informational only and must not
    /// cause an entry to be rejected.
    pub const fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            1 => Some(Self::Obj),
            2 => Some(Self::Ply),
            3 => Some(Self::Stl),
            _ => None,
        }
    }

    /// Map a lowercase file extension (without dot) to a source kind
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "obj" => Some(Self::Obj),
            "ply" => Some(Self::Ply),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Short display name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Ply => "ply",
            Self::Stl => "stl",
        }
    }
}
