//! Payload packing: vertices and faces to tight little-endian layouts
//!
//! Every packed payload starts with a 1-byte format flag. Vertices pack as
//! half-precision triples when the whole mesh fits the f16 range, full f32
//! triples otherwise. Face indices pack as u16 triples when the vertex count
//! allows, u32 otherwise; the width is a pure function of the vertex count so
//! decoders re-derive it from the header instead of trusting payload length.

use half::f16;

use crate::error::BbmError;

/// Vertex payload flag: three f32 per vertex
pub const VERTEX_FULL: u8 = 0;
/// Vertex payload flag: three f16 per vertex
pub const VERTEX_HALF: u8 = 1;
/// Face payload flag: three u32 per face
pub const INDEX_WIDE: u8 = 0;
/// Face payload flag: three u16 per face
pub const INDEX_NARROW: u8 = 1;

/// Vertex counts below this limit pack faces with 16-bit indices
pub const NARROW_INDEX_LIMIT: u32 = 65535;

/// True when every coordinate survives the trip to half precision without
/// becoming non-finite.
///
/// This is an explicit magnitude check: an out-of-range f32 converts to f16
/// infinity silently rather than failing, so a conversion-error fallback
/// would never fire. NaN coordinates fail the comparison and force full
/// precision.
pub fn fits_half(vertices: &[[f32; 3]]) -> bool {
    let limit = f16::MAX.to_f32();
    vertices.iter().flatten().all(|&c| c.abs() <= limit)
}

/// Pack vertices as a flag byte plus tight coordinate triples
pub fn pack_vertices(vertices: &[[f32; 3]]) -> Vec<u8> {
    if fits_half(vertices) {
        let mut out = Vec::with_capacity(1 + vertices.len() * 6);
        out.push(VERTEX_HALF);
        for v in vertices {
            for &c in v {
                out.extend_from_slice(&f16::from_f32(c).to_le_bytes());
            }
        }
        out
    } else {
        let mut out = Vec::with_capacity(1 + vertices.len() * 12);
        out.push(VERTEX_FULL);
        for v in vertices {
            for &c in v {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out
    }
}

/// Unpack a vertex payload produced by [`pack_vertices`]
pub fn unpack_vertices(data: &[u8]) -> Result<Vec<[f32; 3]>, BbmError> {
    let (&flag, body) = data
        .split_first()
        .ok_or_else(|| BbmError::Malformed("empty vertex payload".into()))?;

    match flag {
        VERTEX_HALF => {
            if body.len() % 6 != 0 {
                return Err(BbmError::Malformed(format!(
                    "half-precision vertex payload length {} is not a whole number of triples",
                    body.len()
                )));
            }
            Ok(body
                .chunks_exact(6)
                .map(|c| {
                    [
                        f16::from_le_bytes([c[0], c[1]]).to_f32(),
                        f16::from_le_bytes([c[2], c[3]]).to_f32(),
                        f16::from_le_bytes([c[4], c[5]]).to_f32(),
                    ]
                })
                .collect())
        }
        VERTEX_FULL => {
            if body.len() % 12 != 0 {
                return Err(BbmError::Malformed(format!(
                    "vertex payload length {} is not a whole number of triples",
                    body.len()
                )));
            }
            Ok(body
                .chunks_exact(12)
                .map(|c| {
                    [
                        f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                        f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                        f32::from_le_bytes([c[8], c[9], c[10], c[11]]),
                    ]
                })
                .collect())
        }
        other => Err(BbmError::Malformed(format!(
            "unknown vertex format flag {other}"
        ))),
    }
}

/// Pack faces as a flag byte plus tight index triples.
///
/// The width is chosen from `vertex_count` alone, never from the index
/// values: counts below [`NARROW_INDEX_LIMIT`] guarantee every index fits
/// in 16 bits.
pub fn pack_faces(faces: &[[u32; 3]], vertex_count: u32) -> Vec<u8> {
    if vertex_count < NARROW_INDEX_LIMIT {
        let mut out = Vec::with_capacity(1 + faces.len() * 6);
        out.push(INDEX_NARROW);
        for f in faces {
            for &i in f {
                out.extend_from_slice(&(i as u16).to_le_bytes());
            }
        }
        out
    } else {
        let mut out = Vec::with_capacity(1 + faces.len() * 12);
        out.push(INDEX_WIDE);
        for f in faces {
            for &i in f {
                out.extend_from_slice(&i.to_le_bytes());
            }
        }
        out
    }
}

/// Unpack a face payload produced by [`pack_faces`].
///
/// `vertex_count` must be the header's stored value; the expected width is
/// re-derived from it and a payload whose flag disagrees is rejected.
pub fn unpack_faces(data: &[u8], vertex_count: u32) -> Result<Vec<[u32; 3]>, BbmError> {
    let (&flag, body) = data
        .split_first()
        .ok_or_else(|| BbmError::Malformed("empty face payload".into()))?;

    let expected = if vertex_count < NARROW_INDEX_LIMIT {
        INDEX_NARROW
    } else {
        INDEX_WIDE
    };
    if flag != expected {
        return Err(BbmError::Malformed(format!(
            "face format flag {flag} does not match vertex count {vertex_count}"
        )));
    }

    match flag {
        INDEX_NARROW => {
            if body.len() % 6 != 0 {
                return Err(BbmError::Malformed(format!(
                    "narrow face payload length {} is not a whole number of triples",
                    body.len()
                )));
            }
            Ok(body
                .chunks_exact(6)
                .map(|c| {
                    [
                        u16::from_le_bytes([c[0], c[1]]) as u32,
                        u16::from_le_bytes([c[2], c[3]]) as u32,
                        u16::from_le_bytes([c[4], c[5]]) as u32,
                    ]
                })
                .collect())
        }
        _ => {
            if body.len() % 12 != 0 {
                return Err(BbmError::Malformed(format!(
                    "wide face payload length {} is not a whole number of triples",
                    body.len()
                )));
            }
            Ok(body
                .chunks_exact(12)
                .map(|c| {
                    [
                        u32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                        u32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                        u32::from_le_bytes([c[8], c[9], c[10], c[11]]),
                    ]
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_precision_roundtrip_exact() {
        // Every value here is exactly representable in f16
        let vertices = vec![[1.0, -2.5, 0.25], [0.0, 4096.0, -0.5]];
        let packed = pack_vertices(&vertices);
        assert_eq!(packed[0], VERTEX_HALF);
        assert_eq!(packed.len(), 1 + 2 * 6);
        assert_eq!(unpack_vertices(&packed).unwrap(), vertices);
    }

    #[test]
    fn test_out_of_range_coordinate_falls_back_to_full() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0e6, 0.0, 0.0]];
        let packed = pack_vertices(&vertices);
        assert_eq!(packed[0], VERTEX_FULL);
        assert_eq!(unpack_vertices(&packed).unwrap(), vertices);
    }

    #[test]
    fn test_nan_falls_back_to_full() {
        let vertices = vec![[f32::NAN, 0.0, 0.0]];
        assert!(!fits_half(&vertices));
        let packed = pack_vertices(&vertices);
        assert_eq!(packed[0], VERTEX_FULL);
    }

    #[test]
    fn test_half_boundary_value() {
        // 65504 is f16::MAX and must still pack as half precision
        let vertices = vec![[65504.0, -65504.0, 0.0]];
        let packed = pack_vertices(&vertices);
        assert_eq!(packed[0], VERTEX_HALF);
        assert_eq!(unpack_vertices(&packed).unwrap(), vertices);
    }

    #[test]
    fn test_index_width_boundary() {
        let faces = vec![[0u32, 1, 2]];
        assert_eq!(pack_faces(&faces, 65534)[0], INDEX_NARROW);
        assert_eq!(pack_faces(&faces, 65535)[0], INDEX_WIDE);
        assert_eq!(pack_faces(&faces, 65536)[0], INDEX_WIDE);
    }

    #[test]
    fn test_narrow_face_roundtrip() {
        let faces = vec![[0u32, 1, 2], [2, 1, 0]];
        let packed = pack_faces(&faces, 100);
        assert_eq!(unpack_faces(&packed, 100).unwrap(), faces);
    }

    #[test]
    fn test_wide_face_roundtrip() {
        let faces = vec![[0u32, 70_000, 123_456]];
        let packed = pack_faces(&faces, 200_000);
        assert_eq!(unpack_faces(&packed, 200_000).unwrap(), faces);
    }

    #[test]
    fn test_flag_mismatch_rejected() {
        let packed = pack_faces(&[[0u32, 1, 2]], 100);
        // Claiming a huge vertex count derives the wide flag, which the
        // narrow payload cannot satisfy
        assert!(matches!(
            unpack_faces(&packed, 1_000_000),
            Err(BbmError::Malformed(_))
        ));
    }

    #[test]
    fn test_ragged_payload_rejected() {
        let mut packed = pack_vertices(&[[1.0, 2.0, 3.0]]);
        packed.pop();
        assert!(matches!(
            unpack_vertices(&packed),
            Err(BbmError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_mesh_payloads() {
        let packed_v = pack_vertices(&[]);
        assert_eq!(packed_v.len(), 1);
        assert!(unpack_vertices(&packed_v).unwrap().is_empty());

        let packed_f = pack_faces(&[], 0);
        assert_eq!(packed_f.len(), 1);
        assert!(unpack_faces(&packed_f, 0).unwrap().is_empty());
    }
}
