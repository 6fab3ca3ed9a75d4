use crate::{
    element::{EH, FH, Handle},
    mesh::Mesh,
};
use glam::Vec3;

/// Radius of the circle through the three points. Degenerate triangles have
/// an infinite circumradius.
pub fn circum_radius(p0: Vec3, p1: Vec3, p2: Vec3) -> f32 {
    let a = p0.distance(p1);
    let b = p1.distance(p2);
    let c = p2.distance(p0);
    let area2 = (p1 - p0).cross(p2 - p0).length();
    if area2 == 0. {
        return f32::INFINITY;
    }
    (a * b * c) / (2. * area2)
}

/// Cosine of the angle between the normals of the triangles `(p1, p2, po1)`
/// and `(p2, p1, po2)`, which share the edge `p1 - p2`. Returns 1 for a flat
/// configuration, and -2 if either triangle is degenerate.
pub fn dihedral_angle_cos(p1: Vec3, p2: Vec3, po1: Vec3, po2: Vec3) -> f32 {
    let n1 = (p2 - p1).cross(po1 - p1);
    let n2 = (p1 - p2).cross(po2 - p2);
    let (l1, l2) = (n1.length(), n2.length());
    if l1 == 0. || l2 == 0. {
        return -2.;
    }
    n1.dot(n2) / (l1 * l2)
}

/// Arithmetic mean of the points.
pub fn centroid(points: impl IntoIterator<Item = Vec3>) -> Vec3 {
    let (sum, count) = points
        .into_iter()
        .fold((Vec3::ZERO, 0usize), |(sum, count), p| (sum + p, count + 1));
    if count == 0 {
        Vec3::ZERO
    } else {
        sum / count as f32
    }
}

impl Mesh {
    /// Compute the face normal using Newell's method.
    pub fn calc_face_normal(&self, f: FH) -> Vec3 {
        let points = self.points();
        let (nverts, normal) = self.topol.face_halfedges(f).fold(
            (0usize, Vec3::ZERO),
            |(nverts, normal), h| {
                let pc = points[self.topol.tail_vertex(h).index() as usize];
                let pn = points[self.topol.head_vertex(h).index() as usize];
                let (a, b) = (pc - pn, pc + pn);
                (
                    nverts + 1,
                    normal + Vec3::new(a.y * b.z, a.z * b.x, a.x * b.y),
                )
            },
        );
        if nverts < 3 {
            return Vec3::ZERO;
        }
        normal.normalize_or_zero()
    }

    pub fn face_centroid(&self, f: FH) -> Vec3 {
        centroid(self.topol.face_vertices(f).map(|v| self.point(v)))
    }

    pub fn calc_edge_length(&self, e: EH) -> f32 {
        let [v1, v2] = self.topol.edge_vertices(e);
        self.point(v1).distance(self.point(v2))
    }

    /// Cosine of the dihedral angle at an interior edge between two
    /// triangles. See [`dihedral_angle_cos`].
    pub fn edge_dihedral_angle_cos(&self, e: EH) -> f32 {
        let [v1, v2] = self.topol.edge_vertices(e);
        let vo1 = self.topol.side_vertex1(e);
        let Some(vo2) = self.topol.side_vertex2(e) else {
            return -2.;
        };
        dihedral_angle_cos(
            self.point(v1),
            self.point(v2),
            self.point(vo1),
            self.point(vo2),
        )
    }

    pub fn calc_area(&self) -> f32 {
        self.faces()
            .map(|f| {
                let verts: Vec<Vec3> = self.face_vertices(f).map(|v| self.point(v)).collect();
                (1..(verts.len() - 1))
                    .map(|i| (verts[i] - verts[0]).cross(verts[i + 1] - verts[0]).length() * 0.5)
                    .sum::<f32>()
            })
            .sum()
    }

    /// Signed volume enclosed by the mesh, positive when the faces are
    /// oriented outward. Returns zero if the mesh is not closed.
    pub fn calc_volume(&self) -> f32 {
        if self.edges().any(|e| self.is_boundary_edge(e)) {
            return 0.;
        }
        self.faces()
            .map(|f| {
                let verts: Vec<Vec3> = self.face_vertices(f).map(|v| self.point(v)).collect();
                let p0 = verts[0];
                (1..(verts.len() - 1))
                    .map(|i| p0.dot((verts[i] - p0).cross(verts[i + 1] - p0)) / 6.)
                    .sum::<f32>()
            })
            .sum()
    }
}

#[cfg(test)]
mod test {
    use super::{circum_radius, dihedral_angle_cos};
    use crate::{macros::assert_f32_eq, mesh::Mesh};
    use glam::{Vec3, vec3};

    #[test]
    fn t_circum_radius() {
        // Right triangle: the hypotenuse is a diameter.
        let r = circum_radius(vec3(0., 0., 0.), vec3(2., 0., 0.), vec3(0., 2., 0.));
        assert_f32_eq!(r, 2f32.sqrt(), 1e-6);
        let r = circum_radius(vec3(0., 0., 0.), vec3(1., 0., 0.), vec3(2., 0., 0.));
        assert!(r.is_infinite());
    }

    #[test]
    fn t_dihedral_angle_cos() {
        let (p1, p2) = (vec3(0., 0., 0.), vec3(1., 0., 0.));
        // Flat.
        assert_f32_eq!(
            dihedral_angle_cos(p1, p2, vec3(0.5, 1., 0.), vec3(0.5, -1., 0.)),
            1.,
            1e-6
        );
        // Right angle.
        assert_f32_eq!(
            dihedral_angle_cos(p1, p2, vec3(0.5, 1., 0.), vec3(0.5, 0., 1.)),
            0.,
            1e-6
        );
        assert_eq!(dihedral_angle_cos(p1, p2, p1, vec3(0.5, 0., 1.)), -2.);
    }

    #[test]
    fn t_box_measures() {
        let mesh = Mesh::quad_box(Vec3::ZERO, vec3(1., 2., 3.));
        assert_f32_eq!(mesh.calc_volume(), 6., 1e-5);
        assert_f32_eq!(mesh.calc_area(), 22., 1e-5);
        for f in mesh.faces() {
            let n = mesh.calc_face_normal(f);
            let c = mesh.face_centroid(f) - vec3(0.5, 1., 1.5);
            // Normals point away from the center.
            assert!(n.dot(c) > 0.);
            assert_f32_eq!(n.length(), 1., 1e-6);
        }
        // Adjacent faces of a box are perpendicular.
        for e in mesh.edges() {
            assert_f32_eq!(mesh.edge_dihedral_angle_cos(e), 0., 1e-6);
        }
    }
}
