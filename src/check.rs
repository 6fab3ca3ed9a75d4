use crate::{
    element::{HH, Handle},
    error::Error,
    topol::Topology,
};

fn check_halfedges(mesh: &Topology) -> Result<(), Error> {
    for h in mesh.halfedges() {
        let hedge = mesh.halfedge(h);
        let Some(f) = hedge.face else {
            return Err(Error::BogusHalfedge(h));
        };
        if !mesh.is_valid_face(f)
            || !mesh.is_valid_edge(hedge.edge)
            || !mesh.is_valid_vertex(hedge.tail)
            || !mesh.is_valid_vertex(hedge.vertex)
            || !mesh.is_valid_halfedge(hedge.next)
            || !mesh.is_valid_halfedge(hedge.prev)
        {
            return Err(Error::DanglingHalfedge(h));
        }
        if mesh.prev_halfedge(hedge.next) != h
            || mesh.next_halfedge(hedge.prev) != h
            || mesh.head_vertex(hedge.prev) != hedge.tail
            || mesh.halfedge_face(hedge.next) != Some(f)
        {
            return Err(Error::BrokenHalfedgeLink(h));
        }
        if hedge.tail == hedge.vertex {
            return Err(Error::BrokenHalfedgeLink(h));
        }
        if let Some(hs) = hedge.sym {
            if !mesh.is_valid_halfedge(hs) {
                return Err(Error::DanglingHalfedge(h));
            }
            let shedge = mesh.halfedge(hs);
            if shedge.sym != Some(h)
                || shedge.tail != hedge.vertex
                || shedge.vertex != hedge.tail
                || shedge.edge != hedge.edge
            {
                return Err(Error::AsymmetricSym(h));
            }
        }
        if !mesh.vertex(hedge.tail).outgoing.contains(&h) {
            return Err(Error::OrphanHalfedge(h));
        }
    }
    Ok(())
}

fn check_vertices(mesh: &Topology, heads: &mut Vec<u32>) -> Result<(), Error> {
    for v in mesh.vertices() {
        heads.clear();
        for &h in mesh.vertex(v).outgoing.iter() {
            if !mesh.is_valid_halfedge(h) {
                return Err(Error::DanglingHalfedge(h));
            }
            if mesh.tail_vertex(h) != v {
                return Err(Error::OrphanHalfedge(h));
            }
            let head = mesh.head_vertex(h).index();
            if heads.contains(&head) {
                return Err(Error::DuplicateDirectedEdge(h, v));
            }
            heads.push(head);
        }
    }
    Ok(())
}

fn check_faces(mesh: &Topology, verts: &mut Vec<u32>) -> Result<(), Error> {
    let limit = mesh.num_halfedges();
    for f in mesh.faces() {
        let hstart = mesh.face_halfedge(f);
        if !mesh.is_valid_halfedge(hstart) {
            return Err(Error::BrokenFaceRing(f));
        }
        verts.clear();
        let mut h: HH = hstart;
        loop {
            if mesh.halfedge_face(h) != Some(f) || verts.len() > limit {
                return Err(Error::BrokenFaceRing(f));
            }
            let v = mesh.head_vertex(h);
            if verts.contains(&v.index()) {
                return Err(Error::RepeatedFaceVertex(v, f));
            }
            verts.push(v.index());
            h = mesh.next_halfedge(h);
            if h == hstart {
                break;
            }
        }
        if verts.len() < 3 {
            return Err(Error::BrokenFaceRing(f));
        }
    }
    Ok(())
}

fn check_edges(mesh: &Topology) -> Result<(), Error> {
    for e in mesh.edges() {
        let h = mesh.edge_halfedge(e);
        if !mesh.is_valid_halfedge(h) || mesh.halfedge_edge(h) != e {
            return Err(Error::InvalidEdgeHalfedge(e));
        }
    }
    let (paired, unpaired) = mesh.halfedges().fold((0usize, 0usize), |(p, u), h| {
        match mesh.sym_halfedge(h) {
            Some(_) => (p + 1, u),
            None => (p, u + 1),
        }
    });
    let expected = paired / 2 + unpaired;
    let found = mesh.edges().count();
    if expected != found {
        return Err(Error::EdgeCountMismatch { expected, found });
    }
    Ok(())
}

fn check_count(kind: &'static str, counted: usize, stored: usize) -> Result<(), Error> {
    if counted != stored {
        return Err(Error::EntityCountMismatch {
            kind,
            counted,
            stored,
        });
    }
    Ok(())
}

impl Topology {
    /// Verify every invariant of the halfedge structure. This walks the whole
    /// mesh and is meant for tests and debug assertions.
    pub fn check(&self) -> Result<(), Error> {
        check_count("vertex", self.vertices().count(), self.num_vertices())?;
        check_count("face", self.faces().count(), self.num_faces())?;
        check_count("halfedge", self.halfedges().count(), self.num_halfedges())?;
        check_count("edge", self.edges().count(), self.num_edges())?;
        let mut scratch = Vec::new();
        check_halfedges(self)?;
        check_vertices(self, &mut scratch)?;
        check_faces(self, &mut scratch)?;
        check_edges(self)
    }
}
