/*!
Uniform spatial hash grid over a bounding box, and an incremental nearest
neighbour search over it.

Cells are addressed by three integer indices in `[0, size)`, packed into a
single 30 bit code with 10 bits per axis, so the grid size is at most 1023.
Only the non-empty cells are stored.
*/

use crate::{error::Error, queue::Pqueue};
use glam::Vec3;
use std::collections::HashMap;

/// Largest grid size that fits in 10 bits per axis.
pub const MAX_GRID_SIZE: usize = 1023;

/// Coordinates closer than this to a face of the box are pulled inward by this
/// much before being mapped to a cell.
const BOUNDARY_EPS: f32 = 0.01;

/// Default radius for [`SpatialGrid::search`].
pub const DEFAULT_SEARCH_RADIUS: f32 = 10.;

/// Pack the indices of a cell into one integer, 10 bits per axis.
pub const fn encode_cell(ci: [u32; 3]) -> u32 {
    (ci[0] << 20) | (ci[1] << 10) | ci[2]
}

pub const fn decode_cell(code: u32) -> [u32; 3] {
    const MASK: u32 = (1 << 10) - 1;
    [code >> 20, (code >> 10) & MASK, code & MASK]
}

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Box with a positive, finite extent along every axis.
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, Error> {
        if !min.is_finite() || !max.is_finite() || (max - min).cmple(Vec3::ZERO).any() {
            return Err(Error::DegenerateBoundingBox {
                min: min.to_array(),
                max: max.to_array(),
            });
        }
        Ok(BoundingBox { min, max })
    }

    /// The unit cube `[0, 1]^3`.
    pub fn unit() -> Self {
        BoundingBox {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        }
    }

    /// Tightest box around the points. The box may be flat along some axes.
    pub fn from_points(points: &[Vec3]) -> Result<Self, Error> {
        if points.is_empty() {
            return Err(Error::EmptyPointCloud);
        }
        points.iter().enumerate().try_fold(
            BoundingBox {
                min: Vec3::splat(f32::INFINITY),
                max: Vec3::splat(f32::NEG_INFINITY),
            },
            |bbox, (i, p)| {
                if !p.is_finite() {
                    return Err(Error::NonFinitePoint(i));
                }
                Ok(BoundingBox {
                    min: bbox.min.min(*p),
                    max: bbox.max.max(*p),
                })
            },
        )
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the length of the diagonal.
    pub fn radius(&self) -> f32 {
        self.extent().length() * 0.5
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// An entry in a cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridEntry {
    pub id: usize,
    pub point: Vec3,
}

/// Uniform grid of `size^3` cells over a bounding box, mapping each cell to the
/// entries whose points lie in it.
pub struct SpatialGrid {
    size: u32,
    bbox: BoundingBox,
    cells: HashMap<u32, Vec<GridEntry>>,
    count: usize,
}

impl SpatialGrid {
    pub fn new(size: usize, bbox: BoundingBox) -> Result<Self, Error> {
        if size == 0 || size > MAX_GRID_SIZE {
            return Err(Error::InvalidGridSize(size));
        }
        // Validate the extents, the box may have been built by hand.
        let bbox = BoundingBox::new(bbox.min, bbox.max)?;
        Ok(SpatialGrid {
            size: size as u32,
            bbox,
            cells: HashMap::new(),
            count: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Number of entries in the grid.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.count = 0;
    }

    pub fn shrink_to_fit(&mut self) {
        for cell in self.cells.values_mut() {
            cell.shrink_to_fit();
        }
        self.cells.shrink_to_fit();
    }

    fn float_to_index(&self, axis: usize, f: f32) -> u32 {
        let (min, max) = (self.bbox.min[axis], self.bbox.max[axis]);
        let eps = BOUNDARY_EPS.min((max - min) * 0.25);
        let t = (f.clamp(min + eps, max - eps) - min) / (max - min);
        ((t * self.size as f32) as u32).min(self.size - 1)
    }

    /// Coordinate of the lower face of the cells at index `i` along `axis`.
    fn index_to_float(&self, axis: usize, i: u32) -> f32 {
        let (min, max) = (self.bbox.min[axis], self.bbox.max[axis]);
        min + (i as f32) * (max - min) / (self.size as f32)
    }

    /// Indices of the cell containing the point. Points outside the box map to
    /// the nearest boundary cell.
    pub fn cell_index(&self, p: Vec3) -> [u32; 3] {
        [
            self.float_to_index(0, p.x),
            self.float_to_index(1, p.y),
            self.float_to_index(2, p.z),
        ]
    }

    /// Entries of the cell at the given indices.
    pub fn cell(&self, ci: [u32; 3]) -> &[GridEntry] {
        self.cells
            .get(&encode_cell(ci))
            .map(|cell| cell.as_slice())
            .unwrap_or(&[])
    }

    /// Add an entry to the cell containing `point`.
    pub fn enter(&mut self, id: usize, point: Vec3) {
        let code = encode_cell(self.cell_index(point));
        self.cells
            .entry(code)
            .or_default()
            .push(GridEntry { id, point });
        self.count += 1;
    }

    /// Remove an entry. The point must be the one the entry was added with, and
    /// the cell containing it must have exactly one entry with this id.
    pub fn remove(&mut self, id: usize, point: Vec3) {
        let code = encode_cell(self.cell_index(point));
        let Some(cell) = self.cells.get_mut(&code) else {
            panic!("Entry {id} is not in the grid");
        };
        let index = {
            let mut found = cell
                .iter()
                .enumerate()
                .filter(|(_, e)| e.id == id)
                .map(|(i, _)| i);
            match (found.next(), found.next()) {
                (Some(i), None) => i,
                (None, _) => panic!("Entry {id} is not in the grid"),
                (Some(_), Some(_)) => panic!("Entry {id} is in the grid more than once"),
            }
        };
        cell.remove(index);
        if cell.is_empty() {
            self.cells.remove(&code);
        }
        self.count -= 1;
    }

    /// Search for entries near `p`, nearest first, within the default radius.
    pub fn search(&self, p: Vec3) -> SpatialSearch<'_> {
        SpatialSearch::new(self, p, DEFAULT_SEARCH_RADIUS)
    }

    /// Search for entries near `p`, nearest first. Every entry within
    /// `max_dis` is returned. Entries farther than that may also be returned,
    /// but the search stops growing once everything it hasn't looked at is
    /// farther than `max_dis`.
    pub fn search_within(&self, p: Vec3, max_dis: f32) -> SpatialSearch<'_> {
        SpatialSearch::new(self, p, max_dis)
    }

    /// Id and squared distance of the entry nearest to `p`.
    pub fn nearest(&self, p: Vec3) -> Option<(usize, f32)> {
        SpatialSearch::new(self, p, f32::INFINITY).next()
    }
}

/// Nearest neighbour search that visits the cells of the grid in growing boxes
/// around the query point. Each call to `next` returns the entry with the
/// smallest squared distance to the query point among those not yet returned.
pub struct SpatialSearch<'a> {
    grid: &'a SpatialGrid,
    center: Vec3,
    max_dis: f32,
    queue: Pqueue<usize>,
    /// Lower and upper cell indices of the box of visited cells.
    extents: [[u32; 3]; 2],
    /// Squared distance from the center to the nearest unvisited cell.
    dis_bound2: f32,
    /// Axis and direction in which to grow the box next.
    next_layer: Option<(usize, bool)>,
    ncells: usize,
    nentries: usize,
}

impl<'a> SpatialSearch<'a> {
    pub fn new(grid: &'a SpatialGrid, p: Vec3, max_dis: f32) -> Self {
        let ci = grid.cell_index(p);
        let mut search = SpatialSearch {
            grid,
            center: p,
            max_dis,
            queue: Pqueue::new(),
            extents: [ci, ci],
            dis_bound2: 0.,
            next_layer: None,
            ncells: 0,
            nentries: 0,
        };
        search.consider(ci);
        search.find_next_layer();
        search
    }

    /// Returns true once the queue is empty and every cell not visited yet is
    /// farther than the search radius. The radius is only a request: entries
    /// already queued are still returned even if they lie farther.
    pub fn done(&mut self) -> bool {
        let max_dis2 = self.max_dis * self.max_dis;
        loop {
            if !self.queue.is_empty() {
                return false;
            }
            if self.dis_bound2 >= max_dis2 || self.next_layer.is_none() {
                return true;
            }
            self.expand();
        }
    }

    /// Number of cells visited so far.
    pub fn num_cells_visited(&self) -> usize {
        self.ncells
    }

    /// Number of entries pushed into the queue so far.
    pub fn num_entries_visited(&self) -> usize {
        self.nentries
    }

    fn consider(&mut self, ci: [u32; 3]) {
        self.ncells += 1;
        for entry in self.grid.cell(ci) {
            self.queue
                .push(entry.id, self.center.distance_squared(entry.point));
            self.nentries += 1;
        }
    }

    /// Pick the face of the box of visited cells closest to the center.
    fn find_next_layer(&mut self) {
        let grid = self.grid;
        let mut mindis = f32::INFINITY;
        self.next_layer = None;
        for axis in 0..3 {
            let [lo, hi] = [self.extents[0][axis], self.extents[1][axis]];
            if lo > 0 {
                let d = self.center[axis] - grid.index_to_float(axis, lo);
                if d < mindis {
                    mindis = d;
                    self.next_layer = Some((axis, false));
                }
            }
            if hi < grid.size - 1 {
                let d = grid.index_to_float(axis, hi + 1) - self.center[axis];
                if d < mindis {
                    mindis = d;
                    self.next_layer = Some((axis, true));
                }
            }
        }
        // Infinite once the whole grid has been visited.
        let mindis = mindis.max(0.);
        self.dis_bound2 = mindis * mindis;
    }

    /// Visit the layer of cells adjacent to the chosen face of the box.
    fn expand(&mut self) {
        let Some((axis, upper)) = self.next_layer else {
            return;
        };
        let [mut lo, mut hi] = self.extents;
        let layer = if upper {
            self.extents[1][axis] += 1;
            self.extents[1][axis]
        } else {
            self.extents[0][axis] -= 1;
            self.extents[0][axis]
        };
        lo[axis] = layer;
        hi[axis] = layer;
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    self.consider([x, y, z]);
                }
            }
        }
        self.find_next_layer();
    }
}

impl Iterator for SpatialSearch<'_> {
    type Item = (usize, f32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done() {
            return None;
        }
        // Grow until nothing in the unvisited cells can beat the front.
        while let Some(dis2) = self.queue.min_priority() {
            if dis2 <= self.dis_bound2 || self.next_layer.is_none() {
                break;
            }
            self.expand();
        }
        self.queue.pop()
    }
}

#[cfg(test)]
mod test {
    use super::{BoundingBox, SpatialGrid, decode_cell, encode_cell};
    use crate::{Error, macros::assert_f32_eq};
    use glam::{Vec3, vec3};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn random_points(n: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                vec3(
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                )
            })
            .collect()
    }

    fn make_grid(points: &[Vec3], size: usize) -> SpatialGrid {
        let mut grid = SpatialGrid::new(size, BoundingBox::unit()).expect("Cannot create grid");
        for (i, p) in points.iter().enumerate() {
            grid.enter(i, *p);
        }
        grid
    }

    fn brute_force(points: &[Vec3], q: Vec3, k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|a, b| {
            q.distance_squared(points[*a])
                .total_cmp(&q.distance_squared(points[*b]))
        });
        order.truncate(k);
        order
    }

    #[test]
    fn t_search_matches_brute_force() {
        let points = random_points(1000, 42);
        let grid = make_grid(&points, 20);
        assert_eq!(grid.len(), 1000);
        let q = Vec3::splat(0.5);
        let found: Vec<usize> = grid.search(q).take(10).map(|(i, _)| i).collect();
        assert_eq!(found, brute_force(&points, q, 10));
        // Away from the center, and outside the box.
        for q in [vec3(0.02, 0.9, 0.3), vec3(1.3, -0.2, 0.5)] {
            let found: Vec<usize> = grid.search(q).take(10).map(|(i, _)| i).collect();
            assert_eq!(found, brute_force(&points, q, 10));
        }
    }

    #[test]
    fn t_search_is_monotonic_and_exhaustive() {
        let points = random_points(500, 7);
        let grid = make_grid(&points, 8);
        let mut search = grid.search_within(vec3(0.1, 0.2, 0.3), f32::INFINITY);
        let mut last = f32::NEG_INFINITY;
        let mut count = 0;
        for (_, d2) in &mut search {
            assert!(d2 >= last);
            last = d2;
            count += 1;
        }
        assert_eq!(count, 500);
        assert_eq!(search.num_cells_visited(), 8 * 8 * 8);
        assert_eq!(search.num_entries_visited(), 500);
    }

    #[test]
    fn t_search_radius() {
        let points = random_points(500, 3);
        let grid = make_grid(&points, 10);
        let q = Vec3::splat(0.5);
        let mut search = grid.search_within(q, 0.15);
        let found: Vec<(usize, f32)> = search.by_ref().collect();
        assert!(search.done());
        // Everything within the radius is found, possibly with a few more.
        let expected = points
            .iter()
            .filter(|p| p.distance(q) <= 0.15)
            .count();
        assert!(found.len() >= expected);
        assert!(found.len() < points.len());
    }

    #[test]
    fn t_queued_entries_beyond_radius() {
        let mut grid = SpatialGrid::new(10, BoundingBox::unit()).expect("Cannot create grid");
        let p = Vec3::splat(0.59);
        grid.enter(0, p);
        // Same cell as the query, but outside the radius.
        let mut search = grid.search_within(Vec3::splat(0.5), 0.05);
        assert!(!search.done());
        let (id, dis2) = search.next().expect("Queued entry should be returned");
        assert_eq!(id, 0);
        assert_f32_eq!(dis2, p.distance_squared(Vec3::splat(0.5)), 1e-6);
        assert!(search.done());
        assert_eq!(search.next(), None);
        // Nothing is queued for an entry in a cell never reached.
        let mut grid = SpatialGrid::new(10, BoundingBox::unit()).expect("Cannot create grid");
        grid.enter(0, vec3(0.85, 0.5, 0.5));
        let mut search = grid.search_within(Vec3::splat(0.5), 0.05);
        assert!(search.done());
        assert_eq!(search.next(), None);
        assert!(search.num_cells_visited() < 1000);
    }

    #[test]
    fn t_nearest_and_remove() {
        let points = random_points(200, 11);
        let mut grid = make_grid(&points, 5);
        let q = points[17] + Vec3::splat(1e-4);
        assert_eq!(grid.nearest(q).map(|(i, _)| i), Some(17));
        grid.remove(17, points[17]);
        assert_eq!(grid.len(), 199);
        assert_ne!(grid.nearest(q).map(|(i, _)| i), Some(17));
        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.nearest(q), None);
    }

    #[test]
    #[should_panic]
    fn t_remove_missing() {
        let points = random_points(10, 1);
        let mut grid = make_grid(&points, 4);
        grid.remove(42, points[0]);
    }

    #[test]
    fn t_cell_index() {
        let grid = SpatialGrid::new(10, BoundingBox::unit()).expect("Cannot create grid");
        assert_eq!(grid.cell_index(vec3(0., 0.55, 1.)), [0, 5, 9]);
        // Outside the box is clamped to the boundary cells.
        assert_eq!(grid.cell_index(vec3(-3., 2., 0.999)), [0, 9, 9]);
        let code = encode_cell([3, 1023, 7]);
        assert_eq!(decode_cell(code), [3, 1023, 7]);
    }

    #[test]
    fn t_invalid_grid() {
        assert!(matches!(
            SpatialGrid::new(0, BoundingBox::unit()),
            Err(Error::InvalidGridSize(0))
        ));
        assert!(matches!(
            SpatialGrid::new(1024, BoundingBox::unit()),
            Err(Error::InvalidGridSize(1024))
        ));
        let flat = BoundingBox {
            min: Vec3::ZERO,
            max: vec3(1., 0., 1.),
        };
        assert!(matches!(
            SpatialGrid::new(4, flat),
            Err(Error::DegenerateBoundingBox { .. })
        ));
        assert!(matches!(
            BoundingBox::from_points(&[]),
            Err(Error::EmptyPointCloud)
        ));
        assert!(matches!(
            BoundingBox::from_points(&[Vec3::ZERO, vec3(f32::NAN, 0., 0.)]),
            Err(Error::NonFinitePoint(1))
        ));
    }
}
