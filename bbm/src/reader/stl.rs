//! Binary STL parsing

use std::fs;
use std::path::Path;

use crate::error::BbmError;
use crate::mesh::Mesh;

/// 80-byte header preceding the triangle count
const STL_HEADER_LEN: usize = 80;
/// Normal (12) + three vertices (36) + attribute count (2)
const STL_TRIANGLE_LEN: usize = 50;

/// Parse an STL file.
///
/// The first 80 bytes are sniffed for ASCII text only to warn; every `.stl`
/// input goes through the binary parser, which fails fast on text input
/// instead of misparsing it. Each triangle appends its three vertices as new
/// entries (sharing is the optimizer's job, not the reader's).
pub(crate) fn read_stl(path: &Path) -> Result<Mesh, BbmError> {
    let data = fs::read(path)?;

    if looks_ascii(&data) {
        tracing::warn!(
            "{:?} looks like ASCII STL; ASCII parsing is unsupported, attempting binary",
            path
        );
    }

    let header_end = STL_HEADER_LEN + 4;
    if data.len() < header_end {
        return Err(BbmError::Truncated {
            expected: header_end,
            actual: data.len(),
        });
    }

    let triangle_count =
        u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;

    // Validate the full framing before allocating anything so a forged
    // triangle count cannot drive memory use past the actual file size.
    let expected = triangle_count
        .checked_mul(STL_TRIANGLE_LEN)
        .and_then(|n| n.checked_add(header_end))
        .ok_or_else(|| {
            BbmError::Malformed(format!(
                "{}: triangle count {} overflows framing",
                path.display(),
                triangle_count
            ))
        })?;
    if data.len() < expected {
        return Err(BbmError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    let mut mesh = Mesh {
        vertices: Vec::with_capacity(triangle_count * 3),
        faces: Vec::with_capacity(triangle_count),
    };

    for triangle in data[header_end..expected].chunks_exact(STL_TRIANGLE_LEN) {
        // 12 bytes of normal up front, 2 bytes of attribute at the end; both skipped
        for v in 0..3 {
            let base = 12 + v * 12;
            mesh.vertices.push([
                read_f32(triangle, base),
                read_f32(triangle, base + 4),
                read_f32(triangle, base + 8),
            ]);
        }
        let n = mesh.vertices.len() as u32;
        mesh.faces.push([n - 3, n - 2, n - 1]);
    }

    Ok(mesh)
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// The original format's heuristic: a header that decodes as ASCII marks the
/// file as text STL.
fn looks_ascii(data: &[u8]) -> bool {
    data.iter().take(STL_HEADER_LEN).all(u8::is_ascii)
}
