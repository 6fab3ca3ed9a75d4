/*!
Signed distance to the surface sampled by a point cloud, estimated from the
oriented tangent planes of the points.
*/

use crate::{
    contour::ScalarField,
    error::Error,
    spatial::{BoundingBox, MAX_GRID_SIZE, SpatialGrid},
    tangent::TangentPlane,
};
use glam::Vec3;

/// Query points farther than this many cube diagonals from the data are left
/// undefined.
const GAP_FUDGE: f32 = 1.2;

/// Signed distance from a point to the tangent plane whose origin is nearest
/// to it. The distance is undefined where the data doesn't support it, which
/// gives the contour a boundary there.
pub struct SignedDistance<'a> {
    planes: &'a [TangentPlane],
    /// Grid over the data points.
    points: &'a SpatialGrid,
    /// Grid over the origins of the tangent planes.
    origins: SpatialGrid,
    density2: f32,
    max_gap2: f32,
}

impl<'a> SignedDistance<'a> {
    /// `points` must hold the data points, and the planes must be oriented.
    /// A grid over the plane origins is built with the same size and bounds.
    /// `contour_size` is the number of cubes per axis the field will be
    /// sampled on, which bounds how far from the data a sample may be.
    pub fn new(
        planes: &'a [TangentPlane],
        points: &'a SpatialGrid,
        sampling_density: f32,
        contour_size: usize,
    ) -> Result<Self, Error> {
        if contour_size == 0 || contour_size > MAX_GRID_SIZE {
            return Err(Error::InvalidGridSize(contour_size));
        }
        let mut origins = SpatialGrid::new(points.size(), *points.bounding_box())?;
        for (i, tp) in planes.iter().enumerate() {
            origins.enter(i, tp.origin);
        }
        let cube = points.bounding_box().extent().max_element() / contour_size as f32;
        Ok(SignedDistance {
            planes,
            points,
            origins,
            density2: sampling_density * sampling_density,
            max_gap2: 3. * cube * cube * GAP_FUDGE * GAP_FUDGE,
        })
    }

    /// Signed distance at `p`, or `None` if:
    /// - The projection of `p` onto the nearest plane is not strictly inside
    ///   the bounds of the grids.
    /// - The projection is farther than the sampling density from the data.
    /// - `p` itself is farther than a little more than the diagonal of a cube
    ///   from the data.
    pub fn eval(&self, p: Vec3) -> Option<f32> {
        let (i, _) = self.origins.nearest(p)?;
        let tp = &self.planes[i];
        let dis = tp.signed_distance(p);
        let proj = p - dis * tp.normal;
        let BoundingBox { min, max } = *self.points.bounding_box();
        if proj.cmple(min).any() || proj.cmpge(max).any() {
            return None;
        }
        if self.density2.is_finite() {
            let (_, d2) = self.points.nearest(proj)?;
            if d2 > self.density2 {
                return None;
            }
        }
        let (_, d2) = self.points.nearest(p)?;
        if d2 > self.max_gap2 {
            return None;
        }
        Some(dis)
    }
}

impl ScalarField for SignedDistance<'_> {
    fn eval(&self, p: Vec3) -> Option<f32> {
        SignedDistance::eval(self, p)
    }
}
