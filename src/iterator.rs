use crate::{
    element::{EH, FH, HH, VH},
    topol::Topology,
};

struct FaceHalfedgeIter<'a> {
    topol: &'a Topology,
    hstart: HH,
    hcurrent: Option<HH>,
}

impl Iterator for FaceHalfedgeIter<'_> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.next_halfedge(current);
                self.hcurrent = if next == self.hstart {
                    None
                } else {
                    Some(next)
                };
                Some(current)
            }
            None => None,
        }
    }
}

/// Halfedges of a face in counter-clockwise order, starting with the
/// representative halfedge, i.e. the one pointing at the first vertex.
pub(crate) fn fh_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = HH> + use<'_> {
    let h = topol.face_halfedge(f);
    FaceHalfedgeIter {
        topol,
        hstart: h,
        hcurrent: Some(h),
    }
}

pub(crate) fn fv_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = VH> + use<'_> {
    fh_ccw_iter(topol, f).map(|h| topol.head_vertex(h))
}

pub(crate) fn fe_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = EH> + use<'_> {
    fh_ccw_iter(topol, f).map(|h| topol.halfedge_edge(h))
}

pub(crate) fn ff_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = FH> + use<'_> {
    fh_ccw_iter(topol, f).filter_map(|h| {
        topol
            .sym_halfedge(h)
            .and_then(|hs| topol.halfedge_face(hs))
    })
}

/// Outgoing halfedges of a vertex that belong to a face. No particular order.
pub(crate) fn voh_iter(topol: &Topology, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    topol
        .vertex(v)
        .outgoing
        .iter()
        .copied()
        .filter(|h| topol.halfedge_face(*h).is_some())
}

/// Incoming halfedges of the vertex that don't have a sym. These are the ones
/// not reachable as the sym of an outgoing halfedge.
fn vih_boundary_iter(topol: &Topology, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    voh_iter(topol, v)
        .map(|h| topol.prev_halfedge(h))
        .filter(|h| topol.sym_halfedge(*h).is_none())
}

pub(crate) fn vv_iter(topol: &Topology, v: VH) -> impl Iterator<Item = VH> + use<'_> {
    voh_iter(topol, v)
        .map(|h| topol.head_vertex(h))
        .chain(vih_boundary_iter(topol, v).map(|h| topol.tail_vertex(h)))
}

pub(crate) fn vf_iter(topol: &Topology, v: VH) -> impl Iterator<Item = FH> + use<'_> {
    voh_iter(topol, v).filter_map(|h| topol.halfedge_face(h))
}

pub(crate) fn ve_iter(topol: &Topology, v: VH) -> impl Iterator<Item = EH> + use<'_> {
    voh_iter(topol, v)
        .chain(vih_boundary_iter(topol, v))
        .map(|h| topol.halfedge_edge(h))
}

/// Corners around a vertex, i.e. the halfedges pointing at the vertex, one
/// per incident face.
pub(crate) fn vc_iter(topol: &Topology, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    voh_iter(topol, v).map(|h| topol.prev_halfedge(h))
}

impl Topology {
    pub fn face_halfedges(&self, f: FH) -> impl Iterator<Item = HH> + use<'_> {
        fh_ccw_iter(self, f)
    }

    pub fn face_vertices(&self, f: FH) -> impl Iterator<Item = VH> + use<'_> {
        fv_ccw_iter(self, f)
    }

    pub fn face_edges(&self, f: FH) -> impl Iterator<Item = EH> + use<'_> {
        fe_ccw_iter(self, f)
    }

    pub fn face_faces(&self, f: FH) -> impl Iterator<Item = FH> + use<'_> {
        ff_ccw_iter(self, f)
    }

    pub fn vertex_halfedges(&self, v: VH) -> impl Iterator<Item = HH> + use<'_> {
        voh_iter(self, v)
    }

    pub fn vertex_vertices(&self, v: VH) -> impl Iterator<Item = VH> + use<'_> {
        vv_iter(self, v)
    }

    pub fn vertex_faces(&self, v: VH) -> impl Iterator<Item = FH> + use<'_> {
        vf_iter(self, v)
    }

    pub fn vertex_edges(&self, v: VH) -> impl Iterator<Item = EH> + use<'_> {
        ve_iter(self, v)
    }

    pub fn vertex_corners(&self, v: VH) -> impl Iterator<Item = HH> + use<'_> {
        vc_iter(self, v)
    }

    /// Tail of the representative halfedge.
    pub fn vertex1(&self, e: EH) -> VH {
        self.tail_vertex(self.edge_halfedge(e))
    }

    /// Head of the representative halfedge.
    pub fn vertex2(&self, e: EH) -> VH {
        self.head_vertex(self.edge_halfedge(e))
    }

    pub fn edge_vertices(&self, e: EH) -> [VH; 2] {
        let h = self.edge_halfedge(e);
        [self.tail_vertex(h), self.head_vertex(h)]
    }

    /// Face of the representative halfedge.
    pub fn face1(&self, e: EH) -> FH {
        let h = self.edge_halfedge(e);
        match self.halfedge_face(h) {
            Some(f) => f,
            None => panic!("{h} of {e} has no face"),
        }
    }

    /// Face on the other side of `face1`, if the edge is not on the boundary.
    pub fn face2(&self, e: EH) -> Option<FH> {
        self.sym_halfedge(self.edge_halfedge(e))
            .and_then(|h| self.halfedge_face(h))
    }

    /// The one or two faces incident on the edge.
    pub fn edge_faces(&self, e: EH) -> impl Iterator<Item = FH> + use<'_> {
        std::iter::once(self.face1(e)).chain(self.face2(e))
    }

    /// The halfedge of `e` that lies in `f`.
    pub fn edge_face_halfedge(&self, e: EH, f: FH) -> HH {
        let h = self.edge_halfedge(e);
        if self.halfedge_face(h) == Some(f) {
            return h;
        }
        match self.sym_halfedge(h) {
            Some(hs) if self.halfedge_face(hs) == Some(f) => hs,
            _ => panic!("{e} is not incident on {f}"),
        }
    }

    /// The vertex following the edge in the face `f`. For triangles this is
    /// the vertex opposite to the edge.
    pub fn opp_vertex(&self, e: EH, f: FH) -> VH {
        self.head_vertex(self.next_halfedge(self.edge_face_halfedge(e, f)))
    }

    pub fn side_vertex1(&self, e: EH) -> VH {
        self.opp_vertex(e, self.face1(e))
    }

    pub fn side_vertex2(&self, e: EH) -> Option<VH> {
        self.face2(e).map(|f| self.opp_vertex(e, f))
    }

    /// The face on the other side of `e` from `f`.
    pub fn opp_face(&self, e: EH, f: FH) -> Option<FH> {
        self.sym_halfedge(self.edge_face_halfedge(e, f))
            .and_then(|h| self.halfedge_face(h))
    }

    pub fn is_triangle(&self, f: FH) -> bool {
        self.face_valence(f) == 3
    }
}
