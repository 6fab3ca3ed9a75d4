use crate::{element::VH, mesh::Mesh};
use glam::{Vec3, vec3};

impl Mesh {
    /// Makes a box with the following topology, spanning from the min point to
    /// the max point. Vertex ids are one more than the labels below.
    ///
    ///  ```text
    ///       7-----------6
    ///      /|          /|
    ///     / |         / |
    ///    4-----------5  |
    ///    |  |        |  |
    ///    |  3--------|--2
    ///    | /         | /
    ///    |/          |/
    ///    0-----------1
    ///  ```
    pub fn quad_box(min: Vec3, max: Vec3) -> Self {
        const BOX_POS: [(bool, bool, bool); 8] = [
            (false, false, false),
            (true, false, false),
            (true, true, false),
            (false, true, false),
            (false, false, true),
            (true, false, true),
            (true, true, true),
            (false, true, true),
        ];
        const BOX_IDX: [[usize; 4]; 6] = [
            [0, 3, 2, 1],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
            [4, 5, 6, 7],
        ];
        let mut qbox = Self::with_capacity(8, 6);
        let verts: Vec<VH> = BOX_POS
            .iter()
            .map(|&(xf, yf, zf)| {
                qbox.create_vertex(vec3(
                    if xf { max.x } else { min.x },
                    if yf { max.y } else { min.y },
                    if zf { max.z } else { min.z },
                ))
            })
            .collect();
        for indices in BOX_IDX {
            qbox.create_face(&indices.map(|i| verts[i]));
        }
        qbox
    }

    /// Regular tetrahedron centered at the origin with its vertices at the
    /// given distance from the center.
    pub fn tetrahedron(radius: f32) -> Self {
        let s = radius / 3f32.sqrt();
        let mut mesh = Self::with_capacity(4, 4);
        let verts: Vec<VH> = [
            vec3(s, s, s),
            vec3(-s, -s, s),
            vec3(-s, s, -s),
            vec3(s, -s, -s),
        ]
        .into_iter()
        .map(|p| mesh.create_vertex(p))
        .collect();
        for [a, b, c] in [[0usize, 1, 3], [0, 2, 1], [0, 3, 2], [1, 2, 3]] {
            mesh.create_face(&[verts[a], verts[b], verts[c]]);
        }
        mesh
    }

    /// Regular octahedron centered at the origin with its vertices on the
    /// axes, at the given distance from the center.
    pub fn octahedron(radius: f32) -> Self {
        let mut mesh = Self::with_capacity(6, 8);
        let verts: Vec<VH> = [
            vec3(0., 0., radius),
            vec3(radius, 0., 0.),
            vec3(0., radius, 0.),
            vec3(-radius, 0., 0.),
            vec3(0., -radius, 0.),
            vec3(0., 0., -radius),
        ]
        .into_iter()
        .map(|p| mesh.create_vertex(p))
        .collect();
        for [a, b, c] in [
            [0usize, 1, 2],
            [0, 2, 3],
            [0, 3, 4],
            [0, 4, 1],
            [5, 2, 1],
            [5, 3, 2],
            [5, 4, 3],
            [5, 1, 4],
        ] {
            mesh.create_face(&[verts[a], verts[b], verts[c]]);
        }
        mesh
    }
}

/// Points spread evenly over a sphere along a Fibonacci spiral.
pub fn sphere_points(count: usize, center: Vec3, radius: f32) -> Vec<Vec3> {
    let golden = std::f32::consts::PI * (3. - 5f32.sqrt());
    (0..count)
        .map(|i| {
            let y = 1. - 2. * (i as f32 + 0.5) / count as f32;
            let r = (1. - y * y).max(0.).sqrt();
            let phi = golden * i as f32;
            center + radius * vec3(r * phi.cos(), y, r * phi.sin())
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::sphere_points;
    use crate::{macros::assert_f32_eq, mesh::Mesh};
    use glam::{Vec3, vec3};

    #[test]
    fn t_tetrahedron() {
        let mesh = Mesh::tetrahedron(1.);
        mesh.check().expect("Invalid tetrahedron");
        assert_eq!(
            (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces()),
            (4, 6, 4)
        );
        // Outward orientation gives a positive volume.
        assert!(mesh.calc_volume() > 0.);
        for v in mesh.vertices() {
            assert_f32_eq!(mesh.point(v).length(), 1., 1e-6);
        }
    }

    #[test]
    fn t_octahedron() {
        let mesh = Mesh::octahedron(1.);
        mesh.check().expect("Invalid octahedron");
        assert_eq!(
            (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces()),
            (6, 12, 8)
        );
        // Volume of the unit octahedron is 4/3.
        assert_f32_eq!(mesh.calc_volume(), 4. / 3., 1e-5);
    }

    #[test]
    fn t_quad_box() {
        let mesh = Mesh::quad_box(Vec3::splat(-1.), Vec3::ONE);
        mesh.check().expect("Invalid box");
        assert_f32_eq!(mesh.calc_volume(), 8., 1e-5);
        assert!(mesh.edges().all(|e| !mesh.is_boundary_edge(e)));
    }

    #[test]
    fn t_sphere_points() {
        let center = vec3(1., 2., 3.);
        let points = sphere_points(500, center, 2.);
        assert_eq!(points.len(), 500);
        for p in &points {
            assert_f32_eq!(p.distance(center), 2., 1e-5);
        }
        // Evenly spread, so the centroid is close to the center.
        let mean = points.iter().sum::<Vec3>() / points.len() as f32;
        assert!(mean.distance(center) < 0.01);
    }
}
