use super::{Corner, CubeContour, CubeCorners, Crossings};
use glam::Vec3;

/// Splits every cube into 6 tetrahedra (Kuhn) and hands the triangles
/// contouring them to a closure. Triangles are wound counter clockwise when
/// seen from the positive side of the field. Nothing is shared between
/// triangles, so crossing points are computed once per triangle corner.
pub struct StreamContour<S: FnMut([Vec3; 3])> {
    sink: S,
    num_triangles: usize,
}

/// Corners of the tetrahedra, as offsets into the cube.
const KUHN_TETRAHEDRA: [[[usize; 3]; 4]; 6] = [
    [[0, 0, 0], [0, 0, 1], [1, 0, 1], [0, 1, 0]],
    [[0, 0, 0], [1, 0, 1], [1, 0, 0], [0, 1, 0]],
    [[1, 0, 1], [1, 1, 0], [1, 0, 0], [0, 1, 0]],
    [[0, 1, 0], [0, 1, 1], [0, 0, 1], [1, 0, 1]],
    [[1, 1, 1], [0, 1, 1], [0, 1, 0], [1, 0, 1]],
    [[1, 1, 1], [0, 1, 0], [1, 1, 0], [1, 0, 1]],
];

impl<S: FnMut([Vec3; 3])> StreamContour<S> {
    pub fn new(sink: S) -> Self {
        StreamContour {
            sink,
            num_triangles: 0,
        }
    }

    /// Number of triangles handed to the closure so far.
    pub fn num_triangles(&self) -> usize {
        self.num_triangles
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn contour_tetrahedron(&mut self, mut tet: [Corner; 4], crossings: &mut Crossings<'_>) {
        let npos = tet.iter().filter(|c| c.value >= 0.).count();
        if npos == 0 || npos == 4 {
            return;
        }
        // Positive corners first.
        let (mut i, mut j) = (0usize, 3usize);
        while i < j {
            if tet[i].value >= 0. {
                i += 1;
            } else if tet[j].value < 0. {
                j -= 1;
            } else {
                tet.swap(i, j);
                i += 1;
                j -= 1;
            }
        }
        let [a, b, c, d] = tet;
        match npos {
            1 => self.output_triangle([(a, b), (a, c), (a, d)], crossings),
            2 => {
                self.output_triangle([(a, c), (a, d), (b, d)], crossings);
                self.output_triangle([(a, c), (b, d), (b, c)], crossings);
            }
            3 => self.output_triangle([(a, d), (b, d), (c, d)], crossings),
            _ => unreachable!("Tetrahedron with {npos} positive corners"),
        }
    }

    /// Each edge is given as its positive and negative corner.
    fn output_triangle(&mut self, edges: [(Corner, Corner); 3], crossings: &mut Crossings<'_>) {
        let mut tri = edges.map(|(pos, neg)| crossings.point(&pos, &neg));
        let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
        let (pos, neg) = edges[0];
        if normal.dot(pos.point - neg.point) < 0. {
            tri.swap(0, 1);
        }
        (self.sink)(tri);
        self.num_triangles += 1;
    }
}

impl<S: FnMut([Vec3; 3])> CubeContour for StreamContour<S> {
    fn contour_cube(&mut self, _cube: [u32; 3], corners: &CubeCorners, crossings: &mut Crossings<'_>) {
        for tet in KUHN_TETRAHEDRA {
            let tet = tet.map(|[i, j, k]| corners[i][j][k]);
            self.contour_tetrahedron(tet, crossings);
        }
    }
}
