//! Wavefront OBJ parsing

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::BbmError;
use crate::mesh::Mesh;

/// Parse an OBJ file.
///
/// Only `v` and `f` records contribute to the mesh. A face keeps its first
/// three vertex references (no triangulation of larger polygons) and only the
/// leading index of each `index/tex/normal` reference is used. Positive
/// indices are 1-based; negative indices count back from the current end of
/// the vertex list.
pub(crate) fn read_obj(path: &Path) -> Result<Mesh, BbmError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut mesh = Mesh::default();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => {
                if parts.len() < 4 {
                    return Err(malformed(path, lineno, "vertex record needs 3 coordinates"));
                }
                let mut v = [0.0f32; 3];
                for (slot, field) in v.iter_mut().zip(&parts[1..4]) {
                    *slot = field.parse().map_err(|_| {
                        malformed(path, lineno, &format!("invalid coordinate '{field}'"))
                    })?;
                }
                mesh.vertices.push(v);
            }
            "f" => {
                if parts.len() < 4 {
                    return Err(malformed(path, lineno, "face record needs 3 vertex references"));
                }
                let mut f = [0u32; 3];
                for (slot, field) in f.iter_mut().zip(parts[1..4].iter().copied()) {
                    *slot = resolve_index(field, mesh.vertices.len())
                        .ok_or_else(|| {
                            malformed(path, lineno, &format!("invalid face reference '{field}'"))
                        })?;
                }
                mesh.faces.push(f);
            }
            _ => {}
        }
    }

    // Positive references may point forward in the file, so bounds are only
    // checkable once every vertex has been read.
    mesh.validate()
        .map_err(|e| BbmError::Malformed(format!("{}: {e}", path.display())))?;

    Ok(mesh)
}

/// Resolve one face reference (`idx`, `idx/tex`, `idx/tex/normal`) to a
/// 0-based vertex index. `vertex_count` is the number of vertices read so
/// far, which anchors negative (relative) references.
fn resolve_index(field: &str, vertex_count: usize) -> Option<u32> {
    let lead = field.split('/').next()?;
    let idx: i64 = lead.parse().ok()?;
    let resolved = if idx > 0 {
        idx - 1
    } else if idx < 0 {
        vertex_count as i64 + idx
    } else {
        return None; // OBJ indices are 1-based, 0 is never valid
    };
    u32::try_from(resolved).ok()
}

fn malformed(path: &Path, lineno: usize, detail: &str) -> BbmError {
    BbmError::Malformed(format!("{}:{}: {detail}", path.display(), lineno + 1))
}
