use crate::{
    element::{EH, FH, HH, VH},
    math::{circum_radius, dihedral_angle_cos},
    mesh::Mesh,
    topol::Topology,
};
use std::collections::{BTreeSet, HashSet};

impl Topology {
    /// Check if the face can be split into a fan of triangles around the
    /// corner at index `start` of its vertex ring, i.e. none of the diagonals
    /// of the fan already exist.
    pub fn legal_fan_triangulation(&self, f: FH, start: usize) -> bool {
        let verts: Vec<VH> = self.face_vertices(f).collect();
        let nv = verts.len();
        start < nv
            && (2..(nv - 1))
                .all(|i| self.query_edge(verts[start], verts[(start + i) % nv]).is_none())
    }

    /// Replace the face with a fan of triangles around the corner at index
    /// `start` of its vertex ring. Returns the diagonals that were created.
    pub fn fan_triangulate_face(&mut self, f: FH, start: usize) -> Vec<EH> {
        assert!(
            self.legal_fan_triangulation(f, start),
            "Cannot triangulate {f} from corner {start}"
        );
        let verts: Vec<VH> = self.face_vertices(f).collect();
        let nv = verts.len();
        if nv == 3 {
            return Vec::new();
        }
        let ring: Vec<HH> = self.face_halfedges(f).collect();
        let bogus = self.create_bogus_hedges(&ring);
        self.destroy_face(f);
        let apex = verts[start];
        for i in 1..(nv - 1) {
            self.create_face(&[
                apex,
                verts[(start + i) % nv],
                verts[(start + i + 1) % nv],
            ]);
        }
        self.remove_bogus_hedges(&bogus);
        (2..(nv - 1))
            .map(|i| self.edge(apex, verts[(start + i) % nv]))
            .collect()
    }
}

/// Returns true if swapping the edge lowers the larger of the circumradii of
/// the two triangles incident on it.
pub fn circum_radius_swap_criterion(mesh: &Mesh, e: EH) -> bool {
    let topol = &mesh.topol;
    let [v1, v2] = topol.edge_vertices(e);
    let vo1 = topol.side_vertex1(e);
    let Some(vo2) = topol.side_vertex2(e) else {
        return false;
    };
    let (p1, p2, po1, po2) = (
        mesh.point(v1),
        mesh.point(v2),
        mesh.point(vo1),
        mesh.point(vo2),
    );
    let rc1 = circum_radius(p1, p2, po1);
    let rc2 = circum_radius(p1, po2, p2);
    let rs1 = circum_radius(p1, po2, po1);
    let rs2 = circum_radius(p2, po1, po2);
    rs1.max(rs2) < rc1.max(rc2)
}

impl Mesh {
    /// Triangulate a polygonal face with a fan from the first corner whose
    /// diagonals don't already exist, then improve the fan by swapping
    /// diagonals using [`circum_radius_swap_criterion`]. Returns false, leaving
    /// the face unchanged, if no corner admits a legal fan.
    pub fn triangulate_face(&mut self, f: FH) -> bool {
        let nv = self.topol.face_valence(f);
        if nv <= 3 {
            return true;
        }
        let Some(start) = (0..nv).find(|&i| self.topol.legal_fan_triangulation(f, i)) else {
            return false;
        };
        let ring: HashSet<VH> = self.topol.face_vertices(f).collect();
        let mut edges: BTreeSet<EH> = self
            .topol
            .fan_triangulate_face(f, start)
            .into_iter()
            .collect();
        self.retriangulate(
            &mut edges,
            true,
            Some(&ring),
            -2.,
            circum_radius_swap_criterion,
        );
        true
    }

    /// Swap edges from the given set while `criterion` asks for it. Edges whose
    /// dihedral angle cosine, in either configuration, falls below `mincos` are
    /// left alone. When `recurse` is set, the edges of the faces around a
    /// swapped edge are queued for another look, limited to those with both
    /// side vertices in `ring` if it is given. Returns the number of swaps.
    pub fn retriangulate<F>(
        &mut self,
        edges: &mut BTreeSet<EH>,
        recurse: bool,
        ring: Option<&HashSet<VH>>,
        mincos: f32,
        criterion: F,
    ) -> usize
    where
        F: Fn(&Mesh, EH) -> bool,
    {
        let mut nswapped = 0usize;
        while let Some(e) = edges.pop_first() {
            if self.topol.is_boundary_edge(e) || !self.topol.legal_edge_swap(e) {
                continue;
            }
            let [v1, v2] = self.topol.edge_vertices(e);
            let vo1 = self.topol.side_vertex1(e);
            let Some(vo2) = self.topol.side_vertex2(e) else {
                continue;
            };
            let (p1, p2, po1, po2) = (
                self.point(v1),
                self.point(v2),
                self.point(vo1),
                self.point(vo2),
            );
            if dihedral_angle_cos(p1, p2, po1, po2) < mincos
                || dihedral_angle_cos(po1, po2, p2, p1) < mincos
            {
                continue;
            }
            if !criterion(self, e) {
                continue;
            }
            let faces: Vec<FH> = self.topol.edge_faces(e).collect();
            for f in faces {
                for ee in self.topol.face_edges(f) {
                    edges.remove(&ee);
                }
            }
            let enew = self.topol.swap_edge(e);
            nswapped += 1;
            if !recurse {
                continue;
            }
            let faces: Vec<FH> = self.topol.edge_faces(enew).collect();
            for f in faces {
                for ee in self.topol.face_edges(f) {
                    if ee == enew || self.topol.is_boundary_edge(ee) {
                        continue;
                    }
                    if let Some(ring) = ring {
                        let inside = ring.contains(&self.topol.side_vertex1(ee))
                            && self
                                .topol
                                .side_vertex2(ee)
                                .is_some_and(|v| ring.contains(&v));
                        if !inside {
                            continue;
                        }
                    }
                    edges.insert(ee);
                }
            }
        }
        nswapped
    }
}
