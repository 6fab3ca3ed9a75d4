/*!
Tangent plane estimation. Each point gets a plane fitted to its nearest
neighbours, and the neighbourhoods are recorded in an undirected graph that
later drives the orientation of the planes.
*/

use crate::{
    graph::Graph,
    principal::{Frame, principal_components},
    spatial::SpatialGrid,
};
use glam::Vec3;
use tracing::debug;

/// Plane fitted to the neighbourhood of a point. The normal is a unit vector,
/// but its sign is arbitrary until the plane is oriented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentPlane {
    pub origin: Vec3,
    pub normal: Vec3,
    /// Principal frame of the neighbourhood. Its third axis is along the
    /// normal.
    pub frame: Frame,
    /// Variances along the axes of the frame, in decreasing order.
    pub eigenvalues: Vec3,
    /// Number of points the plane was fitted to, including the point itself.
    pub num_neighbors: usize,
    pub oriented: bool,
}

impl TangentPlane {
    /// Fit a plane through the centroid of the points, normal to the direction
    /// of least variance.
    pub fn fit(points: &[Vec3]) -> Self {
        let (frame, eigenvalues) = principal_components(points);
        TangentPlane {
            origin: frame.origin,
            normal: frame.normal(),
            frame,
            eigenvalues,
            num_neighbors: points.len(),
            oriented: false,
        }
    }

    /// Signed distance from the plane, positive on the side the normal points
    /// to.
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        (p - self.origin).dot(self.normal)
    }

    /// Closest point on the plane.
    pub fn project(&self, p: Vec3) -> Vec3 {
        p - self.signed_distance(p) * self.normal
    }

    /// Reverse the normal. The frame stays right handed.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.frame.axes.z_axis = -self.frame.axes.z_axis;
        self.frame.axes.x_axis = -self.frame.axes.x_axis;
    }

    /// Corners of a square in the plane, centered at the origin, in counter
    /// clockwise order around the normal.
    pub fn quad(&self, half_size: f32) -> [Vec3; 4] {
        let n = self.normal;
        let up = if n.y.abs() > n.x.abs() && n.y.abs() > n.z.abs() {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let u = up.cross(n).normalize_or_zero() * half_size;
        let v = n.cross(u);
        let o = self.origin;
        [o - u - v, o + u - v, o + u + v, o - u + v]
    }
}

/// When to stop growing a neighbourhood.
struct Limits {
    min_neighbors: usize,
    max_neighbors: usize,
    density2: f32,
}

/// Grow the neighbourhood of point `i`, nearest first. It stops at
/// `max_neighbors` points, or once it has `min_neighbors` points and the next
/// one is farther than the sampling density. Every neighbour is linked to `i`
/// in the graph.
fn neighborhood(
    i: usize,
    points: &[Vec3],
    grid: &SpatialGrid,
    limits: &Limits,
    graph: &mut Graph<usize>,
    out: &mut Vec<Vec3>,
) {
    out.clear();
    for (pi, dis2) in grid.search(points[i]) {
        if (out.len() >= limits.min_neighbors && dis2 > limits.density2)
            || out.len() >= limits.max_neighbors
        {
            break;
        }
        out.push(points[pi]);
        if pi != i && !graph.contains(i, pi) {
            graph.enter_undirected(i, pi);
        }
    }
}

/// Fit a tangent plane to every point. `grid` must contain every point, keyed
/// by its index. Also returns the graph linking each point to the neighbours
/// it was fitted to.
pub fn estimate_tangent_planes(
    points: &[Vec3],
    grid: &SpatialGrid,
    min_neighbors: usize,
    max_neighbors: usize,
    sampling_density: f32,
) -> (Vec<TangentPlane>, Graph<usize>) {
    assert!(
        min_neighbors >= 1 && min_neighbors <= max_neighbors,
        "Invalid neighbour counts {min_neighbors}, {max_neighbors}"
    );
    let limits = Limits {
        min_neighbors,
        max_neighbors,
        density2: sampling_density * sampling_density,
    };
    let mut graph = Graph::new();
    for i in 0..points.len() {
        graph.enter_vertex(i);
    }
    let mut buf = Vec::with_capacity(max_neighbors);
    let mut planes = Vec::with_capacity(points.len());
    for i in 0..points.len() {
        neighborhood(i, points, grid, &limits, &mut graph, &mut buf);
        planes.push(TangentPlane::fit(&buf));
    }
    let (fewest, most) = planes
        .iter()
        .fold((usize::MAX, 0), |(lo, hi), tp| {
            (lo.min(tp.num_neighbors), hi.max(tp.num_neighbors))
        });
    debug!(
        planes = planes.len(),
        fewest_neighbors = fewest,
        most_neighbors = most,
        "Estimated tangent planes"
    );
    (planes, graph)
}

/// Quads for drawing the planes, all with the same half size.
pub fn tangent_plane_quads(planes: &[TangentPlane], half_size: f32) -> Vec<[Vec3; 4]> {
    planes.iter().map(|tp| tp.quad(half_size)).collect()
}
