use crate::{
    element::{EH, FH, HasTopology, Handle, VH},
    error::Error,
    topol::Topology,
};
use glam::Vec3;

/// Polygon mesh: a halfedge topology with a position for every vertex.
pub struct Mesh {
    pub(crate) topol: Topology,
    points: Vec<Vec3>,
}

/// Flat triangle soup with counter-clockwise winding and 0-based indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl HasTopology for Mesh {
    fn topology(&self) -> &Topology {
        &self.topol
    }
}

impl Mesh {
    pub fn new() -> Self {
        Mesh {
            topol: Topology::new(),
            points: vec![Vec3::ZERO],
        }
    }

    pub fn with_capacity(nverts: usize, nfaces: usize) -> Self {
        let mut points = Vec::with_capacity(nverts + 1);
        points.push(Vec3::ZERO);
        Mesh {
            topol: Topology::with_capacity(nverts, nfaces),
            points,
        }
    }

    pub fn clear(&mut self) {
        self.topol.clear();
        self.points.clear();
        self.points.push(Vec3::ZERO);
    }

    pub fn num_vertices(&self) -> usize {
        self.topol.num_vertices()
    }

    pub fn num_edges(&self) -> usize {
        self.topol.num_edges()
    }

    pub fn num_halfedges(&self) -> usize {
        self.topol.num_halfedges()
    }

    pub fn num_faces(&self) -> usize {
        self.topol.num_faces()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VH> + use<'_> {
        self.topol.vertices()
    }

    pub fn faces(&self) -> impl Iterator<Item = FH> + use<'_> {
        self.topol.faces()
    }

    pub fn edges(&self) -> impl Iterator<Item = EH> + use<'_> {
        self.topol.edges()
    }

    pub fn face_vertices(&self, f: FH) -> impl Iterator<Item = VH> + use<'_> {
        self.topol.face_vertices(f)
    }

    pub fn face_edges(&self, f: FH) -> impl Iterator<Item = EH> + use<'_> {
        self.topol.face_edges(f)
    }

    pub fn vertex_vertices(&self, v: VH) -> impl Iterator<Item = VH> + use<'_> {
        self.topol.vertex_vertices(v)
    }

    pub fn vertex_faces(&self, v: VH) -> impl Iterator<Item = FH> + use<'_> {
        self.topol.vertex_faces(v)
    }

    pub fn edge_faces(&self, e: EH) -> impl Iterator<Item = FH> + use<'_> {
        self.topol.edge_faces(e)
    }

    pub fn edge_vertices(&self, e: EH) -> [VH; 2] {
        self.topol.edge_vertices(e)
    }

    pub fn query_edge(&self, v1: VH, v2: VH) -> Option<EH> {
        self.topol.query_edge(v1, v2)
    }

    pub fn edge(&self, v1: VH, v2: VH) -> EH {
        self.topol.edge(v1, v2)
    }

    pub fn is_boundary_edge(&self, e: EH) -> bool {
        self.topol.is_boundary_edge(e)
    }

    pub fn point(&self, v: VH) -> Vec3 {
        self.points[v.index() as usize]
    }

    pub fn set_point(&mut self, v: VH, pos: Vec3) {
        let vi = v.index() as usize;
        if vi >= self.points.len() {
            self.points.resize(vi + 1, Vec3::ZERO);
        }
        self.points[vi] = pos;
    }

    /// Positions indexed by vertex id. Slot 0 and the slots of destroyed
    /// vertices hold stale values.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Apply `f` to the position of every live vertex.
    pub fn transform_points(&mut self, f: impl Fn(Vec3) -> Vec3) {
        let verts: Vec<VH> = self.topol.vertices().collect();
        for v in verts {
            let vi = v.index() as usize;
            self.points[vi] = f(self.points[vi]);
        }
    }

    pub fn create_vertex(&mut self, pos: Vec3) -> VH {
        let v = self.topol.create_vertex();
        self.set_point(v, pos);
        v
    }

    pub fn destroy_vertex(&mut self, v: VH) {
        self.topol.destroy_vertex(v);
    }

    pub fn legal_create_face(&self, verts: &[VH]) -> bool {
        self.topol.legal_create_face(verts)
    }

    pub fn create_face(&mut self, verts: &[VH]) -> FH {
        self.topol.create_face(verts)
    }

    pub fn destroy_face(&mut self, f: FH) {
        self.topol.destroy_face(f);
    }

    pub fn legal_edge_swap(&self, e: EH) -> bool {
        self.topol.legal_edge_swap(e)
    }

    pub fn swap_edge(&mut self, e: EH) -> EH {
        self.topol.swap_edge(e)
    }

    /// Split the face around a new vertex placed at the centroid of its
    /// corners.
    pub fn center_split_face(&mut self, f: FH) -> VH {
        let pos = self.face_centroid(f);
        let v = self.topol.center_split_face(f);
        self.set_point(v, pos);
        v
    }

    pub fn legal_edge_collapse(&self, e: EH) -> bool {
        self.topol.legal_edge_collapse(e)
    }

    /// Collapse the edge onto its first vertex, which keeps its position.
    pub fn collapse_edge(&mut self, e: EH) -> VH {
        self.topol.collapse_edge(e)
    }

    pub fn legal_coalesce_faces(&self, e: EH) -> bool {
        self.topol.legal_coalesce_faces(e)
    }

    pub fn coalesce_faces(&mut self, e: EH) -> FH {
        self.topol.coalesce_faces(e)
    }

    /// Split the edge at its midpoint.
    pub fn split_edge(&mut self, e: EH) -> VH {
        let [v1, v2] = self.topol.edge_vertices(e);
        let pos = (self.point(v1) + self.point(v2)) * 0.5;
        let v = self.topol.split_edge(e);
        self.set_point(v, pos);
        v
    }

    /// Verify the topology, and that every vertex has a finite position.
    pub fn check(&self) -> Result<(), Error> {
        self.topol.check()?;
        for v in self.topol.vertices() {
            match self.points.get(v.index() as usize) {
                Some(p) if p.is_finite() => {}
                _ => return Err(Error::MissingPosition(v)),
            }
        }
        Ok(())
    }

    /// Flatten into a triangle soup. Vertices and faces are emitted in
    /// ascending id order, and polygons with more than 3 sides are fanned from
    /// their first vertex.
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let mut index = vec![u32::MAX; self.topol.vertex_id_bound() as usize];
        let mut positions = Vec::with_capacity(self.num_vertices());
        for v in self.topol.vertices() {
            index[v.index() as usize] = positions.len() as u32;
            positions.push(self.point(v));
        }
        let mut triangles = Vec::with_capacity(self.num_faces());
        let mut ring = Vec::new();
        for f in self.topol.faces() {
            ring.clear();
            ring.extend(
                self.topol
                    .face_vertices(f)
                    .map(|v| index[v.index() as usize]),
            );
            for i in 1..(ring.len() - 1) {
                triangles.push([ring[0], ring[i], ring[i + 1]]);
            }
        }
        TriangleMesh {
            positions,
            triangles,
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::Mesh;
    use crate::element::Handle;
    use glam::vec3;

    #[test]
    fn t_positions_follow_edits() {
        let mut mesh = Mesh::new();
        let verts = [
            mesh.create_vertex(vec3(0., 0., 0.)),
            mesh.create_vertex(vec3(1., 0., 0.)),
            mesh.create_vertex(vec3(1., 1., 0.)),
            mesh.create_vertex(vec3(0., 1., 0.)),
        ];
        let f = mesh.create_face(&verts);
        let v = mesh.center_split_face(f);
        assert_eq!(mesh.point(v), vec3(0.5, 0.5, 0.));
        let e = mesh.edge(verts[0], verts[1]);
        let v = mesh.split_edge(e);
        assert_eq!(mesh.point(v), vec3(0.5, 0., 0.));
        mesh.check().expect("Invalid mesh");
    }

    #[test]
    fn t_to_triangle_mesh() {
        let mut mesh = Mesh::new();
        let verts: Vec<_> = [
            vec3(0., 0., 0.),
            vec3(1., 0., 0.),
            vec3(1., 1., 0.),
            vec3(0., 1., 0.),
        ]
        .into_iter()
        .map(|p| mesh.create_vertex(p))
        .collect();
        mesh.create_face(&verts);
        // A destroyed vertex leaves a hole in the ids, which gets compacted.
        let extra = mesh.create_vertex(vec3(5., 5., 5.));
        let last = mesh.create_vertex(vec3(2., 0., 0.));
        mesh.destroy_vertex(extra);
        mesh.create_face(&[verts[1], last, verts[2]]);
        assert_eq!(last.index(), 6);
        let tris = mesh.to_triangle_mesh();
        assert_eq!(tris.num_vertices(), 5);
        assert_eq!(tris.positions[4], vec3(2., 0., 0.));
        assert_eq!(tris.triangles, vec![[0, 1, 2], [0, 2, 3], [1, 4, 2]]);
    }
}
