//! ASCII PLY parsing

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::BbmError;
use crate::mesh::Mesh;

/// Parse an ASCII PLY file.
///
/// The header is scanned for `element vertex <n>` and `element face <n>`
/// counts; body lines after `end_header` are consumed positionally. Vertex
/// lines contribute their first three numeric fields. Face lines carry a
/// leading per-face vertex count followed by indices; the first three indices
/// are kept and lines with fewer than four fields are dropped (their slot in
/// the count is still consumed).
pub(crate) fn read_ply(path: &Path) -> Result<Mesh, BbmError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut mesh = Mesh::default();
    let mut in_header = true;
    let mut vertex_remaining = 0usize;
    let mut face_remaining = 0usize;
    let mut vertex_total = 0usize;
    let mut face_total = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if in_header {
            if line.starts_with("format") && line.contains("binary") {
                return Err(BbmError::UnsupportedFormat(format!(
                    "binary PLY ({})",
                    path.display()
                )));
            }
            if let Some(rest) = line.strip_prefix("element vertex") {
                vertex_total = parse_count(rest, path, lineno)?;
                vertex_remaining = vertex_total;
            } else if let Some(rest) = line.strip_prefix("element face") {
                face_total = parse_count(rest, path, lineno)?;
                face_remaining = face_total;
            } else if line == "end_header" {
                in_header = false;
            }
            continue;
        }

        if vertex_remaining > 0 {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(malformed(path, lineno, "vertex line needs 3 coordinates"));
            }
            let mut v = [0.0f32; 3];
            for (slot, field) in v.iter_mut().zip(&fields[..3]) {
                *slot = field.parse().map_err(|_| {
                    malformed(path, lineno, &format!("invalid coordinate '{field}'"))
                })?;
            }
            mesh.vertices.push(v);
            vertex_remaining -= 1;
        } else if face_remaining > 0 {
            let fields: Vec<&str> = line.split_whitespace().collect();
            // Lines with fewer than 4 fields cannot hold a count plus a
            // triangle; they are dropped but still consume a face slot.
            if fields.len() >= 4 {
                let mut f = [0u32; 3];
                for (slot, field) in f.iter_mut().zip(&fields[1..4]) {
                    *slot = field.parse().map_err(|_| {
                        malformed(path, lineno, &format!("invalid face index '{field}'"))
                    })?;
                }
                mesh.faces.push(f);
            }
            face_remaining -= 1;
        }
    }

    if in_header {
        return Err(BbmError::Malformed(format!(
            "{}: missing end_header",
            path.display()
        )));
    }
    if vertex_remaining > 0 || face_remaining > 0 {
        return Err(BbmError::Malformed(format!(
            "{}: body ended early: got {}/{} vertices, {}/{} faces",
            path.display(),
            vertex_total - vertex_remaining,
            vertex_total,
            face_total - face_remaining,
            face_total
        )));
    }

    mesh.validate()
        .map_err(|e| BbmError::Malformed(format!("{}: {e}", path.display())))?;

    Ok(mesh)
}

fn parse_count(rest: &str, path: &Path, lineno: usize) -> Result<usize, BbmError> {
    rest.trim()
        .parse()
        .map_err(|_| malformed(path, lineno, &format!("invalid element count '{}'", rest.trim())))
}

fn malformed(path: &Path, lineno: usize, detail: &str) -> BbmError {
    BbmError::Malformed(format!("{}:{}: {detail}", path.display(), lineno + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TETRA: &str = "\
ply
format ascii 1.0
comment example
element vertex 4
property float x
property float y
property float z
element face 4
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
0 1 0
0 0 1
3 0 1 2
3 0 1 3
3 0 2 3
3 1 2 3
";

    fn write_ply(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.ply");
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_tetrahedron() {
        let (_dir, path) = write_ply(TETRA);
        let mesh = read_ply(&path).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces.len(), 4);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
    }

    #[test]
    fn test_vertex_line_extra_properties_ignored() {
        let ply = "\
ply
format ascii 1.0
element vertex 3
element face 1
end_header
0 0 0 255 0 0
1 0 0 0 255 0
0 1 0 0 0 255
3 0 1 2
";
        let (_dir, path) = write_ply(ply);
        let mesh = read_ply(&path).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_short_face_line_dropped_but_counted() {
        let ply = "\
ply
format ascii 1.0
element vertex 3
element face 2
end_header
0 0 0
1 0 0
0 1 0
2 0 1
3 0 1 2
";
        let (_dir, path) = write_ply(ply);
        let mesh = read_ply(&path).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_truncated_body_rejected() {
        let ply = "\
ply
format ascii 1.0
element vertex 4
element face 1
end_header
0 0 0
1 0 0
";
        let (_dir, path) = write_ply(ply);
        assert!(matches!(read_ply(&path), Err(BbmError::Malformed(_))));
    }

    #[test]
    fn test_binary_ply_rejected() {
        let ply = "\
ply
format binary_little_endian 1.0
element vertex 0
end_header
";
        let (_dir, path) = write_ply(ply);
        assert!(matches!(
            read_ply(&path),
            Err(BbmError::UnsupportedFormat(_))
        ));
    }
}
