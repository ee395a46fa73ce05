//! Geometry providers owned by drawable components.
//!
//! Each `Line`/`Mesh` exclusively owns its geometry. Mesh vertices carry the
//! owning entity's pick id so the id attachment can be written per fragment.

use easel_common::EntityId;
use glam::Vec3;

/// Unit quad in the XY plane, centred on the origin.
pub const QUAD_POSITIONS: [Vec3; 4] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(0.5, 0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Id payload of a vertex that has not been stamped yet.
const UNSTAMPED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Vec3,
    pub entity_id: i32,
}

/// Indexed triangle mesh with per-vertex entity id payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    owner: Option<EntityId>,
}

impl Mesh {
    /// Build an unstamped mesh. Attaching it to an entity stamps the ids.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let mut mesh = Self::default();
        mesh.set_geometry(positions, indices);
        mesh
    }

    /// Replace the geometry. Vertices are re-stamped with the current owner.
    ///
    /// Indices are not checked here; triangles referencing missing vertices
    /// are skipped by every consumer (see [`Mesh::triangle`]).
    pub fn set_geometry(&mut self, positions: Vec<Vec3>, indices: Vec<u32>) {
        let entity_id = self.owner.map_or(UNSTAMPED, EntityId::pick_id);
        self.vertices = positions
            .into_iter()
            .map(|position| MeshVertex {
                position,
                entity_id,
            })
            .collect();
        self.indices = indices;
    }

    /// Write `entity`'s pick id into every vertex.
    pub fn stamp(&mut self, entity: EntityId) {
        self.owner = Some(entity);
        for v in &mut self.vertices {
            v.entity_id = entity.pick_id();
        }
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices of triangle `n`.
    pub fn triangle_indices(&self, n: usize) -> &[u32] {
        &self.indices[n * 3..n * 3 + 3]
    }

    /// Model-space corners of triangle `n`, or `None` when an index is out
    /// of range.
    pub fn triangle(&self, n: usize) -> Option<[Vec3; 3]> {
        let corner = |i: u32| self.vertices.get(i as usize).map(|v| v.position);
        match self.triangle_indices(n) {
            &[a, b, c] => Some([corner(a)?, corner(b)?, corner(c)?]),
            _ => None,
        }
    }

    /// Axis-aligned unit cube centred on the origin.
    pub fn cube() -> Self {
        let p = 0.5_f32;
        #[rustfmt::skip]
        let positions = vec![
            // +Z face
            Vec3::new(-p, -p,  p), Vec3::new( p, -p,  p), Vec3::new( p,  p,  p), Vec3::new(-p,  p,  p),
            // -Z face
            Vec3::new( p, -p, -p), Vec3::new(-p, -p, -p), Vec3::new(-p,  p, -p), Vec3::new( p,  p, -p),
            // +X face
            Vec3::new( p, -p,  p), Vec3::new( p, -p, -p), Vec3::new( p,  p, -p), Vec3::new( p,  p,  p),
            // -X face
            Vec3::new(-p, -p, -p), Vec3::new(-p, -p,  p), Vec3::new(-p,  p,  p), Vec3::new(-p,  p, -p),
            // +Y face
            Vec3::new(-p,  p,  p), Vec3::new( p,  p,  p), Vec3::new( p,  p, -p), Vec3::new(-p,  p, -p),
            // -Y face
            Vec3::new(-p, -p, -p), Vec3::new( p, -p, -p), Vec3::new( p, -p,  p), Vec3::new(-p, -p,  p),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0,1,2, 2,3,0,       // +Z
            4,5,6, 6,7,4,       // -Z
            8,9,10, 10,11,8,    // +X
            12,13,14, 14,15,12, // -X
            16,17,18, 18,19,16, // +Y
            20,21,22, 22,23,20, // -Y
        ];
        Self::new(positions, indices)
    }
}

/// Mesh loaded from an OBJ file. The geometry stays empty until a loader fills it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    pub path: String,
    mesh: Mesh,
}

impl ObjMesh {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mesh: Mesh::default(),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Swap in freshly loaded geometry, keeping the owner stamp.
    pub fn replace_mesh(&mut self, mesh: Mesh) {
        let owner = self.mesh.owner();
        self.mesh = mesh;
        if let Some(owner) = owner {
            self.mesh.stamp(owner);
        }
    }

    pub(crate) fn stamp(&mut self, entity: EntityId) {
        self.mesh.stamp(entity);
    }
}

/// Ordered polyline. The revision counter changes whenever the points do,
/// which is what GPU backends key their vertex uploads on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    points: Vec<Vec3>,
    revision: u64,
}

impl Line {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            revision: 1,
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_points(&mut self, points: Vec<Vec3>) {
        if points != self.points {
            self.points = points;
            self.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mesh_is_unstamped() {
        let mesh = Mesh::cube();
        assert_eq!(mesh.vertices().len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.vertices().iter().all(|v| v.entity_id == UNSTAMPED));
    }

    #[test]
    fn recompute_restamps_with_owner() {
        let mut mesh = Mesh::cube();
        mesh.stamp(EntityId(9));
        mesh.set_geometry(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        assert!(mesh.vertices().iter().all(|v| v.entity_id == 9));
    }

    #[test]
    fn replace_obj_mesh_keeps_stamp() {
        let mut obj = ObjMesh::new("teapot.obj");
        obj.stamp(EntityId(3));
        obj.replace_mesh(Mesh::cube());
        assert!(obj.mesh().vertices().iter().all(|v| v.entity_id == 3));
    }

    #[test]
    fn line_revision_tracks_point_changes() {
        let mut line = Line::new(vec![Vec3::ZERO, Vec3::X]);
        let r = line.revision();
        line.set_points(vec![Vec3::ZERO, Vec3::X]);
        assert_eq!(line.revision(), r);
        line.set_points(vec![Vec3::ZERO, Vec3::Y]);
        assert_eq!(line.revision(), r + 1);
    }

    #[test]
    fn triangle_reads_corners() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![2, 0, 1]);
        assert_eq!(mesh.triangle(0), Some([Vec3::Y, Vec3::ZERO, Vec3::X]));
    }

    #[test]
    fn triangle_with_missing_vertex_is_none() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 7]);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangle(0), None);
    }
}
