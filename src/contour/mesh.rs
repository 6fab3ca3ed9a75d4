use super::{Corner, CubeContour, CubeCorners, Crossings};
use crate::{element::VH, mesh::Mesh, spatial::decode_cell};
use std::collections::{BTreeMap, HashMap};

/// Builds a halfedge mesh from the contour, following Wyvill et al. Each
/// cube contributes the polygons formed by the segments where the surface
/// crosses its faces. Vertices on grid edges are shared between cubes, so the
/// mesh is connected. Faces are wound counter clockwise when seen from the
/// positive side of the field.
pub struct MeshContour {
    mesh: Mesh,
    /// Vertex on each grid edge, keyed by the lower node and the axis.
    edge_vertices: HashMap<(u32, usize), VH>,
    big_faces: bool,
}

impl MeshContour {
    pub fn new() -> Self {
        MeshContour {
            mesh: Mesh::new(),
            edge_vertices: HashMap::new(),
            big_faces: false,
        }
    }

    /// Keep the polygons as they are, instead of splitting them into
    /// triangles.
    #[must_use]
    pub fn with_big_faces(mut self, big_faces: bool) -> Self {
        self.big_faces = big_faces;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    /// The vertex where the surface crosses the grid edge between the two
    /// corners, created the first time it is asked for.
    fn vertex_on_edge(&mut self, pos: &Corner, neg: &Corner, crossings: &mut Crossings<'_>) -> VH {
        let (a, b) = (decode_cell(pos.code), decode_cell(neg.code));
        let axis = match (0..3).find(|&i| a[i] != b[i]) {
            Some(axis) => axis,
            None => panic!("Corners {a:?} and {b:?} don't make an edge"),
        };
        let lower = if a[axis] < b[axis] { pos.code } else { neg.code };
        match self.edge_vertices.get(&(lower, axis)) {
            Some(v) => *v,
            None => {
                let v = self.mesh.create_vertex(crossings.point(pos, neg));
                self.edge_vertices.insert((lower, axis), v);
                v
            }
        }
    }

    /// Add a polygon, and split it into triangles unless big faces are
    /// allowed. Polygons with 6 or more sides can have two edges on the same
    /// face of the cube, so a new vertex is added at the center to be safe.
    fn add_polygon(&mut self, ring: &[VH]) {
        let f = self.mesh.create_face(ring);
        if ring.len() <= 3 || self.big_faces {
            return;
        }
        if ring.len() >= 6 || !self.mesh.triangulate_face(f) {
            self.mesh.center_split_face(f);
        }
    }
}

impl Default for MeshContour {
    fn default() -> Self {
        Self::new()
    }
}

/// The corners of the face of the cube normal to axis `d`, on the lower or
/// upper `side`. They are ordered around the face, counter clockwise when
/// seen from outside the cube.
fn face_corners(corners: &CubeCorners, d: usize, side: usize) -> [Corner; 4] {
    let (d1, d2) = ((d + 1) % 3, (d + 2) % 3);
    let mut out = [corners[0][0][0]; 4];
    let mut cd = [0usize; 3];
    cd[d] = side;
    let mut n = 0usize;
    for a in 0..2 {
        cd[d1] = a;
        let flip = side ^ a;
        for b in 0..2 {
            cd[d2] = if flip == 1 { 1 - b } else { b };
            out[n] = corners[cd[0]][cd[1]][cd[2]];
            n += 1;
        }
    }
    out
}

impl CubeContour for MeshContour {
    fn contour_cube(&mut self, _cube: [u32; 3], corners: &CubeCorners, crossings: &mut Crossings<'_>) {
        // Each segment on a face of the cube maps the vertex it ends at to
        // the vertex it starts from.
        let mut succ: BTreeMap<VH, VH> = BTreeMap::new();
        for d in 0..3 {
            for side in 0..2 {
                let face = face_corners(corners, d, side);
                let nneg = face.iter().filter(|c| c.value < 0.).count();
                let sum: f64 = face.iter().map(|c| c.value as f64).sum();
                for i in 0..4 {
                    let (i1, i2, i3) = ((i + 1) % 4, (i + 2) % 4, (i + 3) % 4);
                    if !(face[i].value < 0. && face[i1].value >= 0.) {
                        continue;
                    }
                    // Find the corner where the segment ends. With two
                    // negative corners on a diagonal the mean value decides.
                    let ie = match nneg {
                        1 => i3,
                        3 => i1,
                        _ if face[i2].value >= 0. => i2,
                        _ if sum < 0. => i1,
                        _ => i3,
                    };
                    let v1 = self.vertex_on_edge(&face[i1], &face[i], crossings);
                    let v2 = self.vertex_on_edge(&face[ie], &face[(ie + 1) % 4], crossings);
                    succ.insert(v2, v1);
                }
            }
        }
        // Lowest vertex first, so the output doesn't depend on hashing.
        let mut ring = Vec::new();
        while let Some((&start, _)) = succ.first_key_value() {
            ring.clear();
            let mut v = start;
            loop {
                ring.push(v);
                v = match succ.remove(&v) {
                    Some(next) => next,
                    None => panic!("The contour is not closed at {v}"),
                };
                if v == start {
                    break;
                }
            }
            self.add_polygon(&ring);
        }
    }
}
