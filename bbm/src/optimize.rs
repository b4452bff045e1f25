//! Mesh optimization: vertex and face deduplication

use hashbrown::{HashMap, HashSet};

use crate::mesh::Mesh;

/// Before/after counts reported by [`optimize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeStats {
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub faces_before: usize,
    pub faces_after: usize,
}

/// Deduplicate vertices and faces in place.
///
/// Vertices are merged on exact coordinate equality (no epsilon); the
/// surviving vertices keep first-seen order and faces are remapped through
/// the translation table. A remapped face that no longer references three
/// distinct vertices is degenerate and dropped; among the rest, an ordered
/// triple that was already emitted is dropped too (winding matters:
/// `(a,b,c)` and `(b,c,a)` are distinct). Idempotent.
///
/// Callers must uphold the [`Mesh`] face-index invariant.
pub fn optimize(mesh: &mut Mesh) -> OptimizeStats {
    let vertices_before = mesh.vertices.len();
    let faces_before = mesh.faces.len();

    let mut first_seen: HashMap<[u32; 3], u32> = HashMap::with_capacity(vertices_before);
    let mut remap: Vec<u32> = Vec::with_capacity(vertices_before);
    let mut vertices: Vec<[f32; 3]> = Vec::with_capacity(vertices_before);

    for v in &mesh.vertices {
        let next = vertices.len() as u32;
        let idx = *first_seen.entry(coord_key(v)).or_insert(next);
        if idx == next {
            vertices.push(*v);
        }
        remap.push(idx);
    }

    let mut emitted: HashSet<[u32; 3]> = HashSet::with_capacity(faces_before);
    let mut faces: Vec<[u32; 3]> = Vec::with_capacity(faces_before);

    for f in &mesh.faces {
        let t = [
            remap[f[0] as usize],
            remap[f[1] as usize],
            remap[f[2] as usize],
        ];
        if t[0] == t[1] || t[1] == t[2] || t[0] == t[2] {
            continue; // degenerate after merging
        }
        if emitted.insert(t) {
            faces.push(t);
        }
    }

    mesh.vertices = vertices;
    mesh.faces = faces;

    let stats = OptimizeStats {
        vertices_before,
        vertices_after: mesh.vertices.len(),
        faces_before,
        faces_after: mesh.faces.len(),
    };
    tracing::debug!(
        "Optimized mesh: {} -> {} vertices, {} -> {} faces",
        stats.vertices_before,
        stats.vertices_after,
        stats.faces_before,
        stats.faces_after
    );
    stats
}

/// Bit-pattern key for exact coordinate equality. Negative zero is folded
/// into positive zero so the key relation matches `==` on floats; NaN bit
/// patterns never merge.
fn coord_key(v: &[f32; 3]) -> [u32; 3] {
    [zero_folded(v[0]), zero_folded(v[1]), zero_folded(v[2])]
}

fn zero_folded(c: f32) -> u32 {
    if c == 0.0 { 0.0f32.to_bits() } else { c.to_bits() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_drops_degenerate_face() {
        // Spec vector: duplicate vertex collapses the only face
        let mut mesh = Mesh {
            vertices: vec![[0.0; 3], [1.0; 3], [0.0; 3]],
            faces: vec![[0, 1, 2]],
        };
        let stats = optimize(&mut mesh);
        assert_eq!(mesh.vertices, vec![[0.0; 3], [1.0; 3]]);
        assert!(mesh.faces.is_empty());
        assert_eq!(stats.vertices_after, 2);
        assert_eq!(stats.faces_after, 0);
    }

    #[test]
    fn test_first_seen_order_preserved() {
        let mut mesh = Mesh {
            vertices: vec![[2.0; 3], [1.0; 3], [2.0; 3], [0.0; 3], [1.0; 3]],
            faces: vec![[0, 1, 3], [2, 4, 3], [0, 1, 3]],
        };
        optimize(&mut mesh);
        assert_eq!(mesh.vertices, vec![[2.0; 3], [1.0; 3], [0.0; 3]]);
        // Faces 0 and 1 remap to the same triple; face 2 repeats face 0
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_rotated_faces_are_distinct() {
        let mut mesh = Mesh {
            vertices: vec![[0.0; 3], [1.0; 3], [2.0; 3]],
            faces: vec![[0, 1, 2], [1, 2, 0]],
        };
        optimize(&mut mesh);
        assert_eq!(mesh.faces.len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let mut mesh = Mesh {
            vertices: vec![[0.0; 3], [1.0; 3], [0.0; 3], [2.0; 3]],
            faces: vec![[0, 1, 3], [2, 1, 3]],
        };
        optimize(&mut mesh);
        let once = mesh.clone();
        let stats = optimize(&mut mesh);
        assert_eq!(mesh, once);
        assert_eq!(stats.vertices_before, stats.vertices_after);
        assert_eq!(stats.faces_before, stats.faces_after);
    }

    #[test]
    fn test_negative_zero_merges_with_zero() {
        let mut mesh = Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [-0.0, 0.0, 0.0]],
            faces: vec![],
        };
        optimize(&mut mesh);
        assert_eq!(mesh.vertices.len(), 1);
    }

    #[test]
    fn test_no_epsilon_tolerance() {
        let mut mesh = Mesh {
            vertices: vec![[1.0, 0.0, 0.0], [1.0 + f32::EPSILON, 0.0, 0.0]],
            faces: vec![],
        };
        optimize(&mut mesh);
        assert_eq!(mesh.vertices.len(), 2);
    }
}
