//! Mesh readers: format-specific parsers producing the canonical form
//!
//! Dispatch happens once, on the file extension; everything downstream of
//! [`read_mesh`] is format-agnostic.

use std::path::Path;

use crate::error::BbmError;
use crate::mesh::{Mesh, SourceKind};

mod obj;
mod ply;
mod stl;

/// Read a source mesh file into the canonical `(Mesh, SourceKind)` pair.
///
/// The extension (case-insensitive) selects the parser: `.obj`, `.ply`
/// (ASCII), `.stl` (binary). Anything else is `UnsupportedFormat`.
pub fn read_mesh(path: &Path) -> Result<(Mesh, SourceKind), BbmError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let kind = SourceKind::from_extension(&ext)
        .ok_or_else(|| BbmError::UnsupportedFormat(format!(".{ext}")))?;

    let mesh = match kind {
        SourceKind::Obj => obj::read_obj(path)?,
        SourceKind::Ply => ply::read_ply(path)?,
        SourceKind::Stl => stl::read_stl(path)?,
    };

    tracing::info!(
        "Read {} mesh {:?}: {} vertices, {} faces",
        kind.as_str(),
        path,
        mesh.vertices.len(),
        mesh.faces.len()
    );

    Ok((mesh, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unknown_extension_rejected() {
        let err = read_mesh(Path::new("model.fbx")).unwrap_err();
        match err {
            BbmError::UnsupportedFormat(ext) => assert_eq!(ext, ".fbx"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.OBJ");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").unwrap();

        let (mesh, kind) = read_mesh(&path).unwrap();
        assert_eq!(kind, SourceKind::Obj);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }
}
