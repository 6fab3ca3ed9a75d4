use crate::{
    element::{EH, Edge, FH, Face, HH, Halfedge, Handle, UNLINKED, VH, Vertex},
    iterator,
};

/// Arena holding the connectivity of a mesh.
///
/// Vertex and face ids start at 1. A new vertex or face always takes the id
/// just above the highest id handed out so far, and that watermark only comes
/// down when the highest numbered element is destroyed. Halfedges and edges
/// live in slots that are recycled freely.
pub struct Topology {
    vertices: Vec<Option<Vertex>>,
    faces: Vec<Option<Face>>,
    halfedges: Vec<Option<Halfedge>>,
    edges: Vec<Option<Edge>>,
    free_halfedges: Vec<u32>,
    free_edges: Vec<u32>,
    num_vertices: usize,
    num_faces: usize,
    num_halfedges: usize,
    num_edges: usize,
}

impl Topology {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(nverts: usize, nfaces: usize) -> Self {
        let mut vertices = Vec::with_capacity(nverts + 1);
        vertices.push(None);
        let mut faces = Vec::with_capacity(nfaces + 1);
        faces.push(None);
        Topology {
            vertices,
            faces,
            halfedges: Vec::with_capacity(nfaces * 3),
            edges: Vec::with_capacity(nfaces * 3 / 2),
            free_halfedges: Vec::new(),
            free_edges: Vec::new(),
            num_vertices: 0,
            num_faces: 0,
            num_halfedges: 0,
            num_edges: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn vertex(&self, v: VH) -> &Vertex {
        match self.vertices.get(v.index() as usize) {
            Some(Some(vert)) => vert,
            _ => panic!("{v} does not exist"),
        }
    }

    fn vertex_mut(&mut self, v: VH) -> &mut Vertex {
        match self.vertices.get_mut(v.index() as usize) {
            Some(Some(vert)) => vert,
            _ => panic!("{v} does not exist"),
        }
    }

    pub(crate) fn halfedge(&self, h: HH) -> &Halfedge {
        match self.halfedges.get(h.index() as usize) {
            Some(Some(he)) => he,
            _ => panic!("{h} does not exist"),
        }
    }

    fn halfedge_mut(&mut self, h: HH) -> &mut Halfedge {
        match self.halfedges.get_mut(h.index() as usize) {
            Some(Some(he)) => he,
            _ => panic!("{h} does not exist"),
        }
    }

    fn edge_mut(&mut self, e: EH) -> &mut Edge {
        match self.edges.get_mut(e.index() as usize) {
            Some(Some(edge)) => edge,
            _ => panic!("{e} does not exist"),
        }
    }

    pub fn is_valid_vertex(&self, v: VH) -> bool {
        matches!(self.vertices.get(v.index() as usize), Some(Some(_)))
    }

    pub fn is_valid_halfedge(&self, h: HH) -> bool {
        matches!(self.halfedges.get(h.index() as usize), Some(Some(_)))
    }

    pub fn is_valid_edge(&self, e: EH) -> bool {
        matches!(self.edges.get(e.index() as usize), Some(Some(_)))
    }

    pub fn is_valid_face(&self, f: FH) -> bool {
        matches!(self.faces.get(f.index() as usize), Some(Some(_)))
    }

    pub fn head_vertex(&self, h: HH) -> VH {
        self.halfedge(h).vertex
    }

    pub fn tail_vertex(&self, h: HH) -> VH {
        self.halfedge(h).tail
    }

    pub fn sym_halfedge(&self, h: HH) -> Option<HH> {
        self.halfedge(h).sym
    }

    pub fn prev_halfedge(&self, h: HH) -> HH {
        self.halfedge(h).prev
    }

    pub fn next_halfedge(&self, h: HH) -> HH {
        self.halfedge(h).next
    }

    pub fn halfedge_face(&self, h: HH) -> Option<FH> {
        self.halfedge(h).face
    }

    pub fn halfedge_edge(&self, h: HH) -> EH {
        self.halfedge(h).edge
    }

    pub fn edge_halfedge(&self, e: EH) -> HH {
        match self.edges.get(e.index() as usize) {
            Some(Some(edge)) => edge.halfedge,
            _ => panic!("{e} does not exist"),
        }
    }

    pub fn face_halfedge(&self, f: FH) -> HH {
        match self.faces.get(f.index() as usize) {
            Some(Some(face)) => face.halfedge,
            _ => panic!("{f} does not exist"),
        }
    }

    pub fn is_boundary_edge(&self, e: EH) -> bool {
        self.sym_halfedge(self.edge_halfedge(e)).is_none()
    }

    pub fn is_boundary_vertex(&self, v: VH) -> bool {
        let outgoing = &self.vertex(v).outgoing;
        outgoing.is_empty()
            || outgoing.iter().any(|&h| {
                self.sym_halfedge(h).is_none() || self.sym_halfedge(self.prev_halfedge(h)).is_none()
            })
    }

    pub fn vertex_degree(&self, v: VH) -> usize {
        self.vertex(v)
            .outgoing
            .iter()
            .filter(|h| self.halfedge_face(**h).is_some())
            .count()
    }

    pub fn face_valence(&self, f: FH) -> usize {
        iterator::fh_ccw_iter(self, f).count()
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn num_halfedges(&self) -> usize {
        self.num_halfedges
    }

    /// One more than the highest vertex id in use.
    pub fn vertex_id_bound(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// One more than the highest face id in use.
    pub fn face_id_bound(&self) -> u32 {
        self.faces.len() as u32
    }

    pub fn vertices(&self) -> impl Iterator<Item = VH> + use<'_> {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|_| VH::from(i as u32)))
    }

    pub fn faces(&self) -> impl Iterator<Item = FH> + use<'_> {
        self.faces
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|_| FH::from(i as u32)))
    }

    pub fn edges(&self) -> impl Iterator<Item = EH> + use<'_> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| EH::from(i as u32)))
    }

    pub fn halfedges(&self) -> impl Iterator<Item = HH> + use<'_> {
        self.halfedges
            .iter()
            .enumerate()
            .filter_map(|(i, h)| h.as_ref().map(|_| HH::from(i as u32)))
    }

    /// The halfedge from `from` to `to`, if one exists.
    pub fn query_hedge(&self, from: VH, to: VH) -> Option<HH> {
        self.vertex(from)
            .outgoing
            .iter()
            .copied()
            .find(|h| self.head_vertex(*h) == to)
    }

    /// The edge between the two vertices in either direction, if one exists.
    pub fn query_edge(&self, v1: VH, v2: VH) -> Option<EH> {
        self.query_hedge(v1, v2)
            .or_else(|| self.query_hedge(v2, v1))
            .map(|h| self.halfedge_edge(h))
    }

    /// Like `query_edge`, but the edge must exist.
    pub fn edge(&self, v1: VH, v2: VH) -> EH {
        match self.query_edge(v1, v2) {
            Some(e) => e,
            None => panic!("No edge between {v1} and {v2}"),
        }
    }

    pub fn create_vertex(&mut self) -> VH {
        let v = VH::from(self.vertices.len() as u32);
        self.vertices.push(Some(Vertex::default()));
        self.num_vertices += 1;
        v
    }

    /// Destroy an isolated vertex.
    pub fn destroy_vertex(&mut self, v: VH) {
        assert!(
            self.vertex(v).outgoing.is_empty(),
            "Cannot destroy {v}, it still has halfedges"
        );
        let vi = v.index() as usize;
        self.vertices[vi] = None;
        if vi + 1 == self.vertices.len() {
            self.vertices.pop();
        }
        self.num_vertices -= 1;
    }

    /// Check, without modifying anything, whether a face with the given
    /// vertices can be created.
    pub fn legal_create_face(&self, verts: &[VH]) -> bool {
        if verts.len() < 3 {
            return false;
        }
        if verts.iter().any(|v| !self.is_valid_vertex(*v)) {
            return false;
        }
        for (i, v) in verts.iter().enumerate() {
            if verts[(i + 1)..].contains(v) {
                return false;
            }
        }
        !(0..verts.len()).any(|i| {
            self.query_hedge(verts[i], verts[(i + 1) % verts.len()])
                .is_some()
        })
    }

    /// Create a face from a ring of vertices in counter-clockwise order. The
    /// face must be legal, see `legal_create_face`.
    pub fn create_face(&mut self, verts: &[VH]) -> FH {
        let id = self.faces.len() as u32;
        self.create_face_with_id(id, verts)
    }

    pub(crate) fn create_face_with_id(&mut self, id: u32, verts: &[VH]) -> FH {
        assert!(
            self.legal_create_face(verts),
            "Cannot create a face with vertices {verts:?}"
        );
        let fi = id as usize;
        assert!(fi > 0, "Face ids start at 1");
        if fi >= self.faces.len() {
            self.faces.resize(fi + 1, None);
        }
        assert!(self.faces[fi].is_none(), "Face id {id} is already in use");
        let f = FH::from(id);
        let nverts = verts.len();
        let mut ring = Vec::with_capacity(nverts);
        for (i, &v) in verts.iter().enumerate() {
            let h = self.alloc_halfedge(Halfedge {
                tail: v,
                vertex: verts[(i + 1) % nverts],
                next: UNLINKED.into(),
                prev: UNLINKED.into(),
                sym: None,
                face: Some(f),
                edge: UNLINKED.into(),
            });
            self.enter_hedge(h);
            ring.push(h);
        }
        for (i, &h) in ring.iter().enumerate() {
            let hnext = ring[(i + 1) % nverts];
            self.halfedge_mut(h).next = hnext;
            self.halfedge_mut(hnext).prev = h;
        }
        // The representative halfedge points at the first vertex.
        self.faces[fi] = Some(Face {
            halfedge: ring[nverts - 1],
        });
        self.num_faces += 1;
        f
    }

    pub fn destroy_face(&mut self, f: FH) {
        let ring: Vec<HH> = iterator::fh_ccw_iter(self, f).collect();
        for h in ring {
            self.remove_hedge(h);
        }
        let fi = f.index() as usize;
        self.faces[fi] = None;
        if fi + 1 == self.faces.len() {
            self.faces.pop();
        }
        self.num_faces -= 1;
    }

    fn alloc_halfedge(&mut self, he: Halfedge) -> HH {
        self.num_halfedges += 1;
        match self.free_halfedges.pop() {
            Some(i) => {
                self.halfedges[i as usize] = Some(he);
                i.into()
            }
            None => {
                self.halfedges.push(Some(he));
                ((self.halfedges.len() - 1) as u32).into()
            }
        }
    }

    fn alloc_edge(&mut self, h: HH) -> EH {
        self.num_edges += 1;
        let edge = Edge { halfedge: h };
        match self.free_edges.pop() {
            Some(i) => {
                self.edges[i as usize] = Some(edge);
                i.into()
            }
            None => {
                self.edges.push(Some(edge));
                ((self.edges.len() - 1) as u32).into()
            }
        }
    }

    /// Register a freshly allocated halfedge with its tail vertex, and pair it
    /// with the reversed halfedge if one exists.
    fn enter_hedge(&mut self, h: HH) {
        let (tail, head) = {
            let he = self.halfedge(h);
            (he.tail, he.vertex)
        };
        self.vertex_mut(tail).outgoing.push(h);
        match self.query_hedge(head, tail) {
            Some(hs) => {
                assert!(
                    self.sym_halfedge(hs).is_none(),
                    "Directed edge {tail} -> {head} is already in use"
                );
                let e = self.halfedge_edge(hs);
                self.halfedge_mut(hs).sym = Some(h);
                let he = self.halfedge_mut(h);
                he.sym = Some(hs);
                he.edge = e;
                // Deterministic representative, independent of creation order.
                if head.index() > self.head_vertex(hs).index() {
                    self.edge_mut(e).halfedge = h;
                }
            }
            None => {
                let e = self.alloc_edge(h);
                let he = self.halfedge_mut(h);
                he.sym = None;
                he.edge = e;
            }
        }
    }

    /// Unregister a halfedge and free its slot. The edge is freed with the
    /// last of its halfedges.
    fn remove_hedge(&mut self, h: HH) {
        let (tail, sym, e) = {
            let he = self.halfedge(h);
            (he.tail, he.sym, he.edge)
        };
        match sym {
            Some(hs) => {
                self.halfedge_mut(hs).sym = None;
                let edge = self.edge_mut(e);
                if edge.halfedge == h {
                    edge.halfedge = hs;
                }
            }
            None => {
                self.edges[e.index() as usize] = None;
                self.free_edges.push(e.index());
                self.num_edges -= 1;
            }
        }
        let outgoing = &mut self.vertex_mut(tail).outgoing;
        match outgoing.iter().position(|x| *x == h) {
            Some(pos) => {
                outgoing.remove(pos);
            }
            None => panic!("{h} is not registered with {tail}"),
        }
        self.halfedges[h.index() as usize] = None;
        self.free_halfedges.push(h.index());
        self.num_halfedges -= 1;
    }

    /// For each boundary halfedge in `hs`, enter a temporary reversed halfedge
    /// with no face. This keeps the boundary edges alive while the faces
    /// around them are torn down and rebuilt.
    pub(crate) fn create_bogus_hedges(&mut self, hs: &[HH]) -> Vec<HH> {
        let mut bogus = Vec::new();
        for &h in hs {
            let he = *self.halfedge(h);
            if he.sym.is_some() {
                continue;
            }
            let b = self.alloc_halfedge(Halfedge {
                tail: he.vertex,
                vertex: he.tail,
                next: UNLINKED.into(),
                prev: UNLINKED.into(),
                sym: None,
                face: None,
                edge: UNLINKED.into(),
            });
            {
                let bhe = self.halfedge_mut(b);
                bhe.next = b;
                bhe.prev = b;
            }
            self.enter_hedge(b);
            bogus.push(b);
        }
        bogus
    }

    pub(crate) fn remove_bogus_hedges(&mut self, bogus: &[HH]) {
        for &b in bogus {
            debug_assert!(self.halfedge_face(b).is_none());
            self.remove_hedge(b);
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::Topology;
    use crate::element::{FH, Handle, VH};
    use arrayvec::ArrayVec;

    pub(crate) fn make_vertices(topol: &mut Topology, n: usize) -> Vec<VH> {
        (0..n).map(|_| topol.create_vertex()).collect()
    }

    /**
     * Box with 6 quads. Vertices `1..=8`, with `1..=4` on the bottom and
     * `5..=8` on top, counter-clockwise when looking down.
     */
    pub(crate) fn quad_box() -> Topology {
        let mut topol = Topology::with_capacity(8, 6);
        let verts = make_vertices(&mut topol, 8);
        assert_eq!(
            verts.iter().map(|v| v.index()).collect::<Vec<_>>(),
            (1u32..9).collect::<Vec<_>>()
        );
        let faces: Vec<FH> = [
            [1u32, 4, 3, 2],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 4, 8, 7],
            [4, 1, 5, 8],
            [5, 6, 7, 8],
        ]
        .iter()
        .map(|indices| topol.create_face(&indices.map(VH::from)))
        .collect();
        assert_eq!(faces, (1u32..7).map(FH::from).collect::<Vec<_>>());
        assert_eq!(topol.num_vertices(), 8);
        assert_eq!(topol.num_halfedges(), 24);
        assert_eq!(topol.num_edges(), 12);
        assert_eq!(topol.num_faces(), 6);
        topol
    }

    pub(crate) fn loop_mesh() -> Topology {
        /*

                            13---------14---------15---------16
                           /          /          /          /
                          /   f6     /   f7     /    f8    /
                         /          /          /          /
                        /          /          /          /
                       9----------10---------11---------12
                      /          /          /          /
                     /    f4    /          /    f5    /
                    /          /          /          /
                   /          /          /          /
                  5----------6----------7----------8
                 /          /          /          /
                /   f1     /    f2    /    f3    /
               /          /          /          /
              /          /          /          /
             1----------2----------3----------4
        */
        let mut topol = Topology::with_capacity(16, 8);
        make_vertices(&mut topol, 16);
        for fvi in [
            [1u32, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 4, 8, 7],
            [5, 6, 10, 9],
            [7, 8, 12, 11],
            [9, 10, 14, 13],
            [10, 11, 15, 14],
            [11, 12, 16, 15],
        ] {
            let vs = fvi.iter().map(VH::from).collect::<ArrayVec<VH, 4>>();
            topol.create_face(&vs);
        }
        topol
    }

    #[test]
    fn t_triangle() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 3);
        let f = topol.create_face(&verts);
        assert_eq!(f.index(), 1);
        assert_eq!(topol.num_faces(), 1);
        assert_eq!(topol.num_edges(), 3);
        assert_eq!(topol.num_halfedges(), 3);
        assert!(topol.edges().all(|e| topol.is_boundary_edge(e)));
        assert!(topol.vertices().all(|v| topol.is_boundary_vertex(v)));
        assert_eq!(topol.face_valence(f), 3);
    }

    #[test]
    fn t_two_triangles() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 4);
        topol.create_face(&[verts[0], verts[1], verts[2]]);
        topol.create_face(&[verts[0], verts[2], verts[3]]);
        assert_eq!(topol.num_edges(), 5);
        assert_eq!(topol.num_halfedges(), 6);
        let e = topol.edge(verts[0], verts[2]);
        assert!(!topol.is_boundary_edge(e));
        assert_eq!(
            topol.edges().filter(|e| topol.is_boundary_edge(*e)).count(),
            4
        );
    }

    #[test]
    fn t_face_vertex_round_trip() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 5);
        let f = topol.create_face(&verts);
        assert_eq!(topol.face_vertices(f).collect::<Vec<_>>(), verts);
    }

    #[test]
    fn t_box_closed() {
        let qbox = quad_box();
        assert!(
            qbox.edges().all(|e| !qbox.is_boundary_edge(e)),
            "Not expecting any boundary edges"
        );
        for v in qbox.vertices() {
            assert_eq!(qbox.vertex_degree(v), 3);
            assert!(!qbox.is_boundary_vertex(v));
        }
        for f in qbox.faces() {
            assert_eq!(qbox.face_valence(f), 4);
        }
        assert!(qbox.check().is_ok());
    }

    #[test]
    fn t_legal_create_face() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 4);
        // Repeated vertex.
        assert!(!topol.legal_create_face(&[verts[0], verts[1], verts[0], verts[2]]));
        assert!(!topol.legal_create_face(&verts[..2]));
        assert_eq!(topol.num_faces(), 0);
        assert_eq!(topol.num_halfedges(), 0);
        topol.create_face(&[verts[0], verts[1], verts[2]]);
        // Same orientation as the existing face.
        assert!(!topol.legal_create_face(&[verts[1], verts[2], verts[3]]));
        // Reversed orientation across the shared edge.
        assert!(topol.legal_create_face(&[verts[2], verts[1], verts[3]]));
        assert_eq!(topol.num_faces(), 1);
    }

    #[test]
    #[should_panic]
    fn t_create_face_duplicate_directed_edge() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 4);
        topol.create_face(&[verts[0], verts[1], verts[2]]);
        topol.create_face(&[verts[0], verts[1], verts[3]]);
    }

    #[test]
    fn t_id_watermark() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 4);
        let f1 = topol.create_face(&[verts[0], verts[1], verts[2]]);
        let f2 = topol.create_face(&[verts[0], verts[2], verts[3]]);
        assert_eq!((f1.index(), f2.index()), (1, 2));
        // Destroying a face that is not the highest keeps the watermark.
        topol.destroy_face(f1);
        assert_eq!(topol.face_id_bound(), 3);
        let f3 = topol.create_face(&[verts[0], verts[1], verts[2]]);
        assert_eq!(f3.index(), 3);
        // Destroying the highest recycles its id.
        topol.destroy_face(f3);
        let f4 = topol.create_face(&[verts[0], verts[1], verts[2]]);
        assert_eq!(f4.index(), 3);
        assert_eq!(topol.num_faces(), 2);
        // Isolated vertices can be destroyed.
        let v = topol.create_vertex();
        assert_eq!(v.index(), 5);
        topol.destroy_vertex(v);
        assert_eq!(topol.create_vertex().index(), 5);
    }

    #[test]
    #[should_panic]
    fn t_destroy_connected_vertex() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 3);
        topol.create_face(&verts);
        topol.destroy_vertex(verts[0]);
    }

    #[test]
    fn t_destroy_face_frees_edges() {
        let mut topol = Topology::new();
        let verts = make_vertices(&mut topol, 4);
        let f1 = topol.create_face(&[verts[0], verts[1], verts[2]]);
        topol.create_face(&[verts[0], verts[2], verts[3]]);
        topol.destroy_face(f1);
        assert_eq!(topol.num_edges(), 3);
        assert_eq!(topol.num_halfedges(), 3);
        assert!(topol.query_edge(verts[0], verts[1]).is_none());
        assert!(topol.is_boundary_edge(topol.edge(verts[2], verts[0])));
        assert!(topol.check().is_ok());
    }

    #[test]
    fn t_loop_mesh() {
        let mesh = loop_mesh();
        assert_eq!(mesh.num_faces(), 8);
        assert_eq!(mesh.num_edges(), 24);
        assert_eq!(
            mesh.edges().filter(|e| mesh.is_boundary_edge(*e)).count(),
            16
        );
        assert!(mesh.check().is_ok());
    }
}
