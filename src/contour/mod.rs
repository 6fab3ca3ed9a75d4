/*!
Piecewise linear approximation of the zero set of a scalar field over the unit
cube.

The unit cube is split into `size^3` cubes, whose corners are the nodes of the
grid with indices in `[0, size]`. Starting from a seed cube, the marcher visits
cubes breadth first, crossing into a neighbouring cube only through a face
where the field changes sign. So only the cubes around the connected part of
the surface near the seed are ever visited. Each node is evaluated at most
once. Where the field is undefined the surface gets a boundary.

What to do with a cube that the surface passes through is up to a
[`CubeContour`] strategy. [`MeshContour`] builds a halfedge mesh, and
[`StreamContour`] hands triangles to a closure.
*/

mod mesh;
mod stream;

pub use mesh::MeshContour;
pub use stream::StreamContour;

use crate::{
    error::Error,
    spatial::{MAX_GRID_SIZE, decode_cell, encode_cell},
};
use glam::Vec3;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Crossings closer than this fraction of the grid size to either end of an
/// edge are pushed away from the end.
const DEGENERATE_FRACTION: f32 = 2e-5;

/// Most evaluations of the field spent locating one crossing by bisection.
const MAX_BISECTION_EVALS: usize = 20;

/// A scalar field. `None` means the field is undefined at that point.
pub trait ScalarField {
    fn eval(&self, p: Vec3) -> Option<f32>;
}

impl<F> ScalarField for F
where
    F: Fn(Vec3) -> Option<f32>,
{
    fn eval(&self, p: Vec3) -> Option<f32> {
        self(p)
    }
}

/// Counters accumulated while marching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContourStats {
    pub cubes_visited: usize,
    /// Cubes with at least one undefined corner.
    pub cubes_undefined: usize,
    /// Seeds that visited nothing but their own cube.
    pub cubes_empty: usize,
    pub nodes_evaluated: usize,
    pub nodes_zero: usize,
    pub nodes_undefined: usize,
    /// Crossings that were too close to the end of their edge.
    pub degenerate_crossings: usize,
}

/// Corner of a cube, where the field is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    /// Packed grid indices of the node.
    pub code: u32,
    pub point: Vec3,
    pub value: f32,
}

/// The eight corners of a cube, indexed by their offsets along x, y and z.
pub type CubeCorners = [[[Corner; 2]; 2]; 2];

/// Locates the points where the surface crosses the edges of the grid.
pub struct Crossings<'a> {
    field: &'a dyn ScalarField,
    size: u32,
    tolerance: f32,
    stats: &'a mut ContourStats,
}

impl Crossings<'_> {
    /// Point where the surface crosses the edge from a corner with a value
    /// `>= 0` to a corner with a value `< 0`. Linearly interpolated, unless a
    /// vertex tolerance is set, in which case it is refined by bisection.
    pub fn point(&mut self, pos: &Corner, neg: &Corner) -> Vec3 {
        debug_assert!(pos.value >= 0. && neg.value < 0.);
        let mut frac: f32;
        let mut pt: Vec3;
        if self.tolerance == 0. {
            frac = pos.value / (pos.value - neg.value);
            pt = pos.point.lerp(neg.point, frac);
        } else {
            let (mut v0, mut v1) = (pos.value, neg.value);
            let (mut p0, mut p1) = (pos.point, neg.point);
            let (mut f0, mut f1) = (0f32, 1f32);
            let tol2 = self.tolerance * self.tolerance;
            let mut nevals = 0usize;
            loop {
                // Clamped so the bracket shrinks every step.
                let b = (v0 / (v0 - v1)).clamp(0.05, 0.95);
                frac = f0 * (1. - b) + f1 * b;
                pt = p0.lerp(p1, b);
                let value = self.field.eval(pt);
                nevals += 1;
                if nevals >= MAX_BISECTION_EVALS {
                    break;
                }
                match value {
                    Some(v) if v < 0. => {
                        (f1, p1, v1) = (frac, pt, v);
                    }
                    // Undefined counts as far outside.
                    _ => {
                        (f0, p0, v0) = (frac, pt, value.unwrap_or(f32::MAX / 2.));
                    }
                }
                if p0.distance_squared(p1) <= tol2 {
                    break;
                }
            }
        }
        let fs = DEGENERATE_FRACTION * self.size as f32;
        if frac < fs {
            self.stats.degenerate_crossings += 1;
            pt = pos.point.lerp(neg.point, fs);
        } else if frac > 1. - fs {
            self.stats.degenerate_crossings += 1;
            pt = neg.point.lerp(pos.point, fs);
        }
        pt
    }
}

/// Strategy for the cubes the surface passes through.
pub trait CubeContour {
    /// Called once for every visited cube whose corners are all defined. `cube`
    /// holds the grid indices of its lowest corner.
    fn contour_cube(&mut self, cube: [u32; 3], corners: &CubeCorners, crossings: &mut Crossings<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CubeState {
    Queued,
    Visited,
}

/// Marches cubes over the unit domain, see the module documentation.
pub struct Contour3D<F: ScalarField, C: CubeContour> {
    size: u32,
    field: F,
    strategy: C,
    vertex_tolerance: f32,
    /// Values of the evaluated nodes.
    values: HashMap<u32, Option<f32>>,
    /// Cubes that were ever queued. Absent means untouched.
    cubes: HashMap<u32, CubeState>,
    queue: VecDeque<u32>,
    stats: ContourStats,
}

impl<F: ScalarField, C: CubeContour> Contour3D<F, C> {
    /// Contour `field` on a grid of `size^3` cubes. Nodes need indices up to
    /// `size` inclusive, so the size can be at most 1023.
    pub fn new(size: usize, field: F, strategy: C) -> Result<Self, Error> {
        if size == 0 || size > MAX_GRID_SIZE {
            return Err(Error::InvalidGridSize(size));
        }
        Ok(Contour3D {
            size: size as u32,
            field,
            strategy,
            vertex_tolerance: 0.,
            values: HashMap::new(),
            cubes: HashMap::new(),
            queue: VecDeque::new(),
            stats: ContourStats::default(),
        })
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// With a non zero tolerance, crossings are found by bisection until the
    /// bracket is shorter than the tolerance. Zero means linear interpolation.
    pub fn set_vertex_tolerance(&mut self, tolerance: f32) {
        assert!(
            tolerance.is_finite() && tolerance >= 0.,
            "Invalid vertex tolerance {tolerance}"
        );
        self.vertex_tolerance = tolerance;
    }

    pub fn stats(&self) -> &ContourStats {
        &self.stats
    }

    pub fn strategy(&self) -> &C {
        &self.strategy
    }

    /// Consume the marcher, returning the strategy and the final counters.
    pub fn finish(self) -> (C, ContourStats) {
        let stats = self.stats;
        debug!(
            cubes_visited = stats.cubes_visited,
            cubes_undefined = stats.cubes_undefined,
            cubes_empty = stats.cubes_empty,
            nodes_evaluated = stats.nodes_evaluated,
            nodes_zero = stats.nodes_zero,
            nodes_undefined = stats.nodes_undefined,
            degenerate_crossings = stats.degenerate_crossings,
            "Finished marching"
        );
        (self.strategy, stats)
    }

    fn cube_containing(&self, p: Vec3) -> [u32; 3] {
        assert!(
            p.cmpge(Vec3::ZERO).all() && p.cmple(Vec3::ONE).all(),
            "Seed {p} is outside the unit cube"
        );
        let n = self.size as f32;
        [p.x, p.y, p.z].map(|c| ((c * n) as u32).min(self.size - 1))
    }

    fn node_point(&self, ni: [u32; 3]) -> Vec3 {
        let n = self.size as f32;
        let [x, y, z] = ni.map(|i| if i < self.size { i as f32 / n } else { 1. });
        Vec3::new(x, y, z)
    }

    /// Visit the connected region of cubes around the cube containing `p`.
    /// Returns the number of cubes visited: 0 if the cube was visited before,
    /// 1 if the surface doesn't pass through it.
    pub fn march_from(&mut self, p: Vec3) -> usize {
        let ci = self.cube_containing(p);
        self.march_from_cube(ci)
    }

    /// Like [`Self::march_from`], seeded from the cube containing `p` and
    /// each of its 26 neighbours.
    pub fn march_near(&mut self, p: Vec3) -> usize {
        let cc = self.cube_containing(p);
        let mut nvisited = 0usize;
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                for dz in -1i64..=1 {
                    let ci = [cc[0] as i64 + dx, cc[1] as i64 + dy, cc[2] as i64 + dz];
                    if ci.iter().all(|&c| c >= 0 && c < self.size as i64) {
                        nvisited += self.march_from_cube(ci.map(|c| c as u32));
                    }
                }
            }
        }
        nvisited
    }

    fn march_from_cube(&mut self, ci: [u32; 3]) -> usize {
        let code = encode_cell(ci);
        match self.cubes.get(&code) {
            Some(CubeState::Visited) => return 0,
            Some(CubeState::Queued) => panic!("Cube {ci:?} is queued outside a march"),
            None => {}
        }
        let before = self.stats.cubes_visited;
        self.cubes.insert(code, CubeState::Queued);
        self.queue.push_back(code);
        while let Some(code) = self.queue.pop_front() {
            self.consider_cube(code);
        }
        let nvisited = self.stats.cubes_visited - before;
        if nvisited == 1 {
            self.stats.cubes_empty += 1;
        }
        nvisited
    }

    /// Value at a node, evaluating it the first time it is needed.
    fn node_value(&mut self, ni: [u32; 3]) -> Option<f32> {
        let code = encode_cell(ni);
        if let Some(value) = self.values.get(&code) {
            return *value;
        }
        let value = self.field.eval(self.node_point(ni));
        self.stats.nodes_evaluated += 1;
        match value {
            Some(v) if v == 0. => self.stats.nodes_zero += 1,
            None => self.stats.nodes_undefined += 1,
            _ => {}
        }
        self.values.insert(code, value);
        value
    }

    fn consider_cube(&mut self, code: u32) {
        self.stats.cubes_visited += 1;
        let cc = decode_cell(code);
        let mut values = [[[None; 2]; 2]; 2];
        for (i, plane) in values.iter_mut().enumerate() {
            for (j, row) in plane.iter_mut().enumerate() {
                for (k, value) in row.iter_mut().enumerate() {
                    *value = self.node_value([cc[0] + i as u32, cc[1] + j as u32, cc[2] + k as u32]);
                }
            }
        }
        let prev = self.cubes.insert(code, CubeState::Visited);
        assert_eq!(prev, Some(CubeState::Queued), "Cube {cc:?} was not queued");
        if values.iter().flatten().flatten().any(|v| v.is_none()) {
            self.stats.cubes_undefined += 1;
        } else {
            let corners: CubeCorners = std::array::from_fn(|i| {
                std::array::from_fn(|j| {
                    std::array::from_fn(|k| {
                        let ni = [cc[0] + i as u32, cc[1] + j as u32, cc[2] + k as u32];
                        Corner {
                            code: encode_cell(ni),
                            point: self.node_point(ni),
                            value: values[i][j][k].unwrap_or(0.),
                        }
                    })
                })
            });
            let mut crossings = Crossings {
                field: &self.field,
                size: self.size,
                tolerance: self.vertex_tolerance,
                stats: &mut self.stats,
            };
            self.strategy.contour_cube(cc, &corners, &mut crossings);
        }
        // Cross into neighbours through faces where the sign changes. Zero
        // counts as positive.
        for d in 0..3 {
            let (d1, d2) = ((d + 1) % 3, (d + 2) % 3);
            for side in 0..2usize {
                let mut vmin = f32::INFINITY;
                let mut vmax = f32::NEG_INFINITY;
                let mut defined = true;
                let mut cd = [0usize; 3];
                cd[d] = side;
                for a in 0..2 {
                    cd[d1] = a;
                    for b in 0..2 {
                        cd[d2] = b;
                        match values[cd[0]][cd[1]][cd[2]] {
                            Some(v) => {
                                vmin = vmin.min(v);
                                vmax = vmax.max(v);
                            }
                            None => defined = false,
                        }
                    }
                }
                if !defined || vmin >= 0. || vmax < 0. {
                    continue;
                }
                let mut ci = cc;
                if side == 1 {
                    if ci[d] + 1 >= self.size {
                        continue;
                    }
                    ci[d] += 1;
                } else {
                    if ci[d] == 0 {
                        continue;
                    }
                    ci[d] -= 1;
                }
                let ncode = encode_cell(ci);
                if !self.cubes.contains_key(&ncode) {
                    self.cubes.insert(ncode, CubeState::Queued);
                    self.queue.push_back(ncode);
                }
            }
        }
    }
}
