/*!
Local topological edits. Each edit tears down the affected faces and rebuilds
new ones. Boundary edges along the modified region are kept alive during the
rebuild with temporary bogus halfedges, so edge handles outside the edited
region stay valid.
*/

use crate::{
    element::{EH, FH, HH, Handle, VH},
    topol::Topology,
};

/// Outcome of merging the faces on either side of an edge.
struct CoalescePlan {
    f1: FH,
    f2: FH,
    ring: Vec<VH>,
    interior: Vec<VH>,
}

impl Topology {
    /// Check if an edge can be swapped. The edge must have a triangle on
    /// either side, and the two side vertices must not already be connected.
    pub fn legal_edge_swap(&self, e: EH) -> bool {
        let Some(f2) = self.face2(e) else {
            return false;
        };
        if !self.is_triangle(self.face1(e)) || !self.is_triangle(f2) {
            return false;
        }
        let vo1 = self.side_vertex1(e);
        let Some(vo2) = self.side_vertex2(e) else {
            return false;
        };
        vo1 != vo2 && self.query_edge(vo1, vo2).is_none()
    }

    /// Replace the two triangles incident on `e` by the two triangles incident
    /// on the other diagonal. Returns the new edge.
    /// ```text
    ///         v2                   v2
    ///        /|\                  / \
    ///       / | \                /   \
    ///  vo1 /  |  \ vo2   ->  vo1 ----- vo2
    ///      \  |  /               \   /
    ///       \ | /                 \ /
    ///         v1                   v1
    /// ```
    pub fn swap_edge(&mut self, e: EH) -> EH {
        assert!(self.legal_edge_swap(e), "Cannot swap {e}");
        let h = self.edge_halfedge(e);
        let (v1, v2) = (self.tail_vertex(h), self.head_vertex(h));
        let f1 = self.face1(e);
        let vo1 = self.side_vertex1(e);
        let (Some(f2), Some(vo2)) = (self.face2(e), self.side_vertex2(e)) else {
            unreachable!("{e} has two faces");
        };
        let ring: Vec<HH> = self
            .face_halfedges(f1)
            .chain(self.face_halfedges(f2))
            .collect();
        let bogus = self.create_bogus_hedges(&ring);
        self.destroy_face(f1);
        self.destroy_face(f2);
        self.create_face(&[v1, vo2, vo1]);
        self.create_face(&[v2, vo1, vo2]);
        self.remove_bogus_hedges(&bogus);
        self.edge(vo1, vo2)
    }

    /// Replace the face with a fan of triangles around a new vertex. Returns
    /// the new vertex. Always legal.
    pub fn center_split_face(&mut self, f: FH) -> VH {
        let verts: Vec<VH> = self.face_vertices(f).collect();
        let ring: Vec<HH> = self.face_halfedges(f).collect();
        let bogus = self.create_bogus_hedges(&ring);
        self.destroy_face(f);
        let vnew = self.create_vertex();
        for (i, &v) in verts.iter().enumerate() {
            self.create_face(&[v, verts[(i + 1) % verts.len()], vnew]);
        }
        self.remove_bogus_hedges(&bogus);
        vnew
    }

    /// Check if `vertex2(e)` can be merged into `vertex1(e)`. The faces around
    /// the edge must be triangles, and the only vertices adjacent to both
    /// endpoints must be the side vertices. Collapsing a tetrahedron or an
    /// isolated triangle is not allowed.
    pub fn legal_edge_collapse(&self, e: EH) -> bool {
        if self.edge_faces(e).any(|f| !self.is_triangle(f)) {
            return false;
        }
        let [v1, v2] = self.edge_vertices(e);
        let vo1 = self.side_vertex1(e);
        let vo2 = self.side_vertex2(e);
        if vo2 == Some(vo1) {
            return false;
        }
        for v in self.vertex_vertices(v2) {
            if v == v1 || v == vo1 || Some(v) == vo2 {
                continue;
            }
            if self.query_edge(v, v1).is_some() {
                return false;
            }
        }
        let efaces: Vec<FH> = self.edge_faces(e).collect();
        if self
            .vertex_faces(v2)
            .filter(|f| !efaces.contains(f))
            .any(|f| self.face_vertices(f).any(|v| v == v1))
        {
            return false;
        }
        match vo2 {
            Some(vo2) => {
                // Tetrahedron.
                !(self.vertex_degree(v1) == 3
                    && self.vertex_degree(v2) == 3
                    && self.query_edge(vo1, vo2).is_some())
            }
            None => {
                // Isolated triangle.
                !(self.is_boundary_edge(self.edge(v1, vo1))
                    && self.is_boundary_edge(self.edge(v2, vo1)))
            }
        }
    }

    /// Merge `vertex2(e)` into `vertex1(e)`, removing the faces incident on
    /// `e`. The faces around the removed vertex keep their ids. Returns the
    /// surviving vertex.
    pub fn collapse_edge(&mut self, e: EH) -> VH {
        assert!(self.legal_edge_collapse(e), "Cannot collapse {e}");
        let [v1, v2] = self.edge_vertices(e);
        let efaces: Vec<FH> = self.edge_faces(e).collect();
        let others: Vec<(FH, Vec<VH>)> = self
            .vertex_faces(v2)
            .filter(|f| !efaces.contains(f))
            .map(|f| {
                let verts = self
                    .face_vertices(f)
                    .map(|v| if v == v2 { v1 } else { v })
                    .collect();
                (f, verts)
            })
            .collect();
        let keep: Vec<HH> = efaces
            .iter()
            .chain(others.iter().map(|(f, _)| f))
            .flat_map(|f| self.face_halfedges(*f))
            .filter(|h| self.tail_vertex(*h) != v2 && self.head_vertex(*h) != v2)
            .collect();
        let bogus = self.create_bogus_hedges(&keep);
        for &f in efaces.iter() {
            self.destroy_face(f);
        }
        for (f, _) in others.iter() {
            self.destroy_face(*f);
        }
        self.destroy_vertex(v2);
        for (f, verts) in others.iter() {
            self.create_face_with_id(f.index(), verts);
        }
        self.remove_bogus_hedges(&bogus);
        v1
    }

    fn coalesce_plan(&self, e: EH) -> Option<CoalescePlan> {
        let h = self.edge_halfedge(e);
        let f1 = self.halfedge_face(h)?;
        let hs = self.sym_halfedge(h)?;
        let f2 = self.halfedge_face(hs)?;
        if f1 == f2 {
            return None;
        }
        let shares = |x: HH| {
            self.sym_halfedge(x)
                .and_then(|s| self.halfedge_face(s))
                .is_some_and(|f| f == f2)
        };
        // Grow the run of shared halfedges in both directions.
        let nring = self.face_valence(f1);
        let mut a = h;
        let mut b = h;
        let mut run = 1;
        while run < nring && shares(self.prev_halfedge(a)) {
            a = self.prev_halfedge(a);
            run += 1;
        }
        while run < nring && shares(self.next_halfedge(b)) {
            b = self.next_halfedge(b);
            run += 1;
        }
        if run == nring {
            return None;
        }
        let mut interior = Vec::new();
        let mut x = a;
        while x != b {
            interior.push(self.head_vertex(x));
            x = self.next_halfedge(x);
        }
        let mut ring = vec![self.head_vertex(b)];
        let mut x = self.next_halfedge(b);
        while x != a {
            ring.push(self.head_vertex(x));
            x = self.next_halfedge(x);
        }
        let sa = self.sym_halfedge(a)?;
        let sb = self.sym_halfedge(b)?;
        let stop = self.prev_halfedge(sb);
        let mut x = self.next_halfedge(sa);
        while x != stop {
            if x == sb {
                // The run is not contiguous in the other face.
                return None;
            }
            ring.push(self.head_vertex(x));
            x = self.next_halfedge(x);
        }
        let mut sorted = ring.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != ring.len() || ring.len() < 3 {
            return None;
        }
        Some(CoalescePlan {
            f1,
            f2,
            ring,
            interior,
        })
    }

    /// Check if the two faces on either side of `e` can be merged into one.
    pub fn legal_coalesce_faces(&self, e: EH) -> bool {
        self.coalesce_plan(e).is_some()
    }

    /// Merge the two faces on either side of `e` into one face. All edges the
    /// two faces share along with `e` are removed, along with the vertices
    /// this isolates. The merged face takes the id of `face1(e)`.
    pub fn coalesce_faces(&mut self, e: EH) -> FH {
        let Some(plan) = self.coalesce_plan(e) else {
            panic!("Cannot coalesce faces across {e}");
        };
        let ring: Vec<HH> = self
            .face_halfedges(plan.f1)
            .chain(self.face_halfedges(plan.f2))
            .collect();
        let bogus = self.create_bogus_hedges(&ring);
        self.destroy_face(plan.f1);
        self.destroy_face(plan.f2);
        for &v in plan.interior.iter() {
            if self.vertex(v).outgoing.is_empty() {
                self.destroy_vertex(v);
            }
        }
        let f = self.create_face_with_id(plan.f1.index(), &plan.ring);
        self.remove_bogus_hedges(&bogus);
        f
    }

    /// Insert a new vertex on `e`, splitting each incident triangle in two.
    /// Returns the new vertex.
    pub fn split_edge(&mut self, e: EH) -> VH {
        let [v1, v2] = self.edge_vertices(e);
        let faces: Vec<(FH, [VH; 3])> = self
            .edge_faces(e)
            .map(|f| {
                assert!(self.is_triangle(f), "Can only split edges of triangles");
                let h = self.edge_face_halfedge(e, f);
                (
                    f,
                    [
                        self.tail_vertex(h),
                        self.head_vertex(h),
                        self.head_vertex(self.next_halfedge(h)),
                    ],
                )
            })
            .collect();
        let keep: Vec<HH> = faces
            .iter()
            .flat_map(|(f, _)| self.face_halfedges(*f))
            .filter(|h| {
                let (t, hd) = (self.tail_vertex(*h), self.head_vertex(*h));
                !((t == v1 && hd == v2) || (t == v2 && hd == v1))
            })
            .collect();
        let bogus = self.create_bogus_hedges(&keep);
        for (f, _) in faces.iter() {
            self.destroy_face(*f);
        }
        let vnew = self.create_vertex();
        for (_, [a, b, o]) in faces.iter() {
            self.create_face(&[*a, vnew, *o]);
            self.create_face(&[vnew, *b, *o]);
        }
        self.remove_bogus_hedges(&bogus);
        vnew
    }
}

#[cfg(test)]
mod test {
    use crate::{
        element::{Handle, VH},
        topol::{
            Topology,
            test::{make_vertices, quad_box},
        },
    };

    /// Square split along the diagonal 1-3.
    /// ```text
    /// 4-----3
    /// |   / |
    /// |  /  |
    /// | /   |
    /// 1-----2
    /// ```
    fn two_triangles() -> (Topology, Vec<VH>) {
        let mut mesh = Topology::new();
        let verts = make_vertices(&mut mesh, 4);
        mesh.create_face(&[verts[0], verts[1], verts[2]]);
        mesh.create_face(&[verts[0], verts[2], verts[3]]);
        (mesh, verts)
    }

    fn octahedron() -> Topology {
        // 1 is the top, 6 the bottom, 2..=5 around the equator.
        let mut mesh = Topology::new();
        make_vertices(&mut mesh, 6);
        for fvi in [
            [1u32, 2, 3],
            [1, 3, 4],
            [1, 4, 5],
            [1, 5, 2],
            [6, 3, 2],
            [6, 4, 3],
            [6, 5, 4],
            [6, 2, 5],
        ] {
            mesh.create_face(&fvi.map(VH::from));
        }
        mesh
    }

    fn euler_characteristic(mesh: &Topology) -> i64 {
        mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64
    }

    #[test]
    fn t_swap_edge() {
        let (mut mesh, verts) = two_triangles();
        let e = mesh.edge(verts[0], verts[2]);
        let boundary: Vec<_> = mesh.edges().filter(|x| *x != e).collect();
        assert!(mesh.legal_edge_swap(e));
        let enew = mesh.swap_edge(e);
        mesh.check().expect("Invalid mesh after swap");
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert!(mesh.query_edge(verts[0], verts[2]).is_none());
        assert_eq!(enew, mesh.edge(verts[1], verts[3]));
        // Boundary edges survive the swap.
        for b in boundary {
            assert!(mesh.is_valid_edge(b));
            assert!(mesh.is_boundary_edge(b));
        }
        // Boundary edges cannot be swapped.
        assert!(!mesh.legal_edge_swap(mesh.edge(verts[0], verts[1])));
    }

    #[test]
    fn t_swap_edge_closed_mesh() {
        let mut mesh = octahedron();
        // The side vertices of 1-2 are 3 and 5, which are not connected.
        let e = mesh.edge(VH::from(1), VH::from(2));
        assert!(mesh.legal_edge_swap(e));
        let enew = mesh.swap_edge(e);
        mesh.check().expect("Invalid mesh after swap");
        assert_eq!(euler_characteristic(&mesh), 2);
        assert_eq!(mesh.edge(VH::from(3), VH::from(5)), enew);
        assert_eq!(mesh.vertex_degree(VH::from(1)), 3);
        assert_eq!(mesh.vertex_degree(VH::from(2)), 3);
        // Swapping back is legal, since 1 and 2 are no longer connected.
        assert!(mesh.legal_edge_swap(enew));
    }

    #[test]
    fn t_swap_edge_illegal_when_connected() {
        let mut mesh = Topology::new();
        make_vertices(&mut mesh, 4);
        for fvi in [[1u32, 3, 2], [1, 2, 4], [2, 3, 4], [3, 1, 4]] {
            mesh.create_face(&fvi.map(VH::from));
        }
        // In a tetrahedron the side vertices of every edge are connected.
        assert!(mesh.edges().all(|e| !mesh.legal_edge_swap(e)));
    }

    #[test]
    fn t_center_split_face() {
        let mut mesh = quad_box();
        let f = mesh.faces().next().expect("Box has faces");
        let v = mesh.center_split_face(f);
        mesh.check().expect("Invalid mesh after split");
        assert_eq!(v.index(), 9);
        assert_eq!(mesh.num_vertices(), 9);
        assert_eq!(mesh.num_faces(), 9);
        assert_eq!(mesh.num_edges(), 16);
        assert_eq!(mesh.vertex_degree(v), 4);
        assert_eq!(euler_characteristic(&mesh), 2);
    }

    #[test]
    fn t_center_split_open_face() {
        let mut mesh = Topology::new();
        let verts = make_vertices(&mut mesh, 5);
        let f = mesh.create_face(&verts);
        let edges: Vec<_> = mesh.face_edges(f).collect();
        mesh.center_split_face(f);
        mesh.check().expect("Invalid mesh after split");
        assert_eq!(mesh.num_faces(), 5);
        for e in edges {
            assert!(mesh.is_valid_edge(e));
            assert!(mesh.is_boundary_edge(e));
        }
    }

    #[test]
    fn t_collapse_edge() {
        let mut mesh = octahedron();
        let e = mesh.edge(VH::from(1), VH::from(2));
        assert!(mesh.legal_edge_collapse(e));
        let [v1, v2] = mesh.edge_vertices(e);
        let kept = mesh.collapse_edge(e);
        mesh.check().expect("Invalid mesh after collapse");
        assert_eq!(kept, v1);
        assert!(!mesh.is_valid_vertex(v2));
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_edges(), 9);
        assert_eq!(euler_characteristic(&mesh), 2);
        assert!(mesh.edges().all(|e| !mesh.is_boundary_edge(e)));
    }

    #[test]
    fn t_collapse_tetrahedron_illegal() {
        let mut mesh = Topology::new();
        make_vertices(&mut mesh, 4);
        for fvi in [[1u32, 3, 2], [1, 2, 4], [2, 3, 4], [3, 1, 4]] {
            mesh.create_face(&fvi.map(VH::from));
        }
        mesh.check().expect("Invalid tetrahedron");
        for e in mesh.edges().collect::<Vec<_>>() {
            assert!(!mesh.legal_edge_collapse(e));
        }
    }

    #[test]
    fn t_collapse_boundary_edge() {
        // Fan of three triangles around vertex 1.
        let mut mesh = Topology::new();
        make_vertices(&mut mesh, 5);
        for fvi in [[1u32, 2, 3], [1, 3, 4], [1, 4, 5]] {
            mesh.create_face(&fvi.map(VH::from));
        }
        let e = mesh.edge(VH::from(1), VH::from(2));
        assert!(mesh.legal_edge_collapse(e));
        mesh.collapse_edge(e);
        mesh.check().expect("Invalid mesh after collapse");
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_vertices(), 4);
        // Isolated triangle.
        let mut tri = Topology::new();
        let verts = make_vertices(&mut tri, 3);
        tri.create_face(&verts);
        assert!(!tri.legal_edge_collapse(tri.edge(verts[0], verts[1])));
    }

    #[test]
    fn t_coalesce_faces() {
        let (mut mesh, verts) = two_triangles();
        let e = mesh.edge(verts[0], verts[2]);
        assert!(mesh.legal_coalesce_faces(e));
        let f = mesh.coalesce_faces(e);
        mesh.check().expect("Invalid mesh after coalesce");
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_edges(), 4);
        let mut fverts: Vec<_> = mesh.face_vertices(f).collect();
        fverts.sort();
        assert_eq!(fverts, verts);
        // Boundary edges cannot be coalesced across.
        assert!(!mesh.legal_coalesce_faces(mesh.edge(verts[0], verts[1])));
    }

    #[test]
    fn t_coalesce_faces_multiple_edges() {
        // Faces (1, 2, 3, 5) and (3, 4, 1, 5) share the edges 3-5 and 5-1.
        let mut mesh = Topology::new();
        make_vertices(&mut mesh, 5);
        mesh.create_face(&[1u32, 2, 3, 5].map(VH::from));
        mesh.create_face(&[3u32, 4, 1, 5].map(VH::from));
        let e = mesh.edge(VH::from(5), VH::from(1));
        let f = mesh.coalesce_faces(e);
        mesh.check().expect("Invalid mesh after coalesce");
        assert_eq!(mesh.num_vertices(), 4);
        assert!(!mesh.is_valid_vertex(VH::from(5)));
        assert_eq!(mesh.num_edges(), 4);
        assert_eq!(mesh.face_valence(f), 4);
    }

    #[test]
    fn t_split_edge() {
        let mut mesh = octahedron();
        let e = mesh.edge(VH::from(1), VH::from(2));
        let v = mesh.split_edge(e);
        mesh.check().expect("Invalid mesh after split");
        assert_eq!(mesh.num_vertices(), 7);
        assert_eq!(mesh.num_faces(), 10);
        assert_eq!(mesh.vertex_degree(v), 4);
        assert_eq!(euler_characteristic(&mesh), 2);
        assert!(mesh.query_edge(VH::from(1), VH::from(2)).is_none());
    }
}
