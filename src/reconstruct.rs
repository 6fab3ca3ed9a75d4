/*!
The reconstruction pipeline. The point cloud is fitted into the unit cube,
tangent planes are estimated and oriented, and the zero set of the signed
distance to the planes is contoured into a mesh, which is mapped back to the
coordinates of the input.
*/

use crate::{
    contour::{Contour3D, ContourStats, MeshContour},
    distance::SignedDistance,
    error::Error,
    mesh::{Mesh, TriangleMesh},
    orient::orient_tangent_planes,
    spatial::{BoundingBox, MAX_GRID_SIZE, SpatialGrid},
    tangent::{TangentPlane, estimate_tangent_planes, tangent_plane_quads},
};
use glam::Vec3;
use std::{fmt, time::Instant};
use tracing::info;

/// Parameters for [`reconstruct`]. Lengths are in the units of the input
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionParams {
    /// Number of cells per axis of the grids used for neighbour searches.
    /// `None` picks one from the number of points.
    pub search_grid_size: Option<usize>,

    /// Fewest points a tangent plane is fitted to (default: 4).
    pub min_neighbors: usize,

    /// Most points a tangent plane is fitted to (default: 20).
    pub max_neighbors: usize,

    /// Neighbours farther than this are only used to reach `min_neighbors`,
    /// and the distance is undefined where the surface is farther than this
    /// from the data (default: infinite).
    pub sampling_density: f32,

    /// Number of cubes per axis of the contouring grid (default: 20).
    pub contour_grid_size: usize,

    /// Zero places vertices by linear interpolation, otherwise they are found
    /// by bisection to within this distance (default: 0).
    pub vertex_tolerance: f32,

    /// Keep the polygons of the contour instead of triangulating them
    /// (default: false).
    pub big_mesh_faces: bool,

    /// Fraction of the unit cube left empty on each side when the points are
    /// fitted into it (default: 0.1).
    pub domain_margin: f32,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            search_grid_size: None,
            min_neighbors: 4,
            max_neighbors: 20,
            sampling_density: f32::INFINITY,
            contour_grid_size: 20,
            vertex_tolerance: 0.,
            big_mesh_faces: false,
            domain_margin: 0.1,
        }
    }
}

impl ReconstructionParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_search_grid_size(mut self, size: usize) -> Self {
        self.search_grid_size = Some(size);
        self
    }

    /// Sets the range of neighbour counts for the tangent planes.
    #[must_use]
    pub const fn with_neighbors(mut self, min: usize, max: usize) -> Self {
        self.min_neighbors = min;
        self.max_neighbors = max;
        self
    }

    #[must_use]
    pub const fn with_sampling_density(mut self, density: f32) -> Self {
        self.sampling_density = density;
        self
    }

    #[must_use]
    pub const fn with_contour_grid_size(mut self, size: usize) -> Self {
        self.contour_grid_size = size;
        self
    }

    #[must_use]
    pub const fn with_vertex_tolerance(mut self, tolerance: f32) -> Self {
        self.vertex_tolerance = tolerance;
        self
    }

    #[must_use]
    pub const fn with_big_mesh_faces(mut self, big_faces: bool) -> Self {
        self.big_mesh_faces = big_faces;
        self
    }

    #[must_use]
    pub const fn with_domain_margin(mut self, margin: f32) -> Self {
        self.domain_margin = margin;
        self
    }

    /// The search grid size to use for the given number of points.
    pub fn search_grid_size_for(&self, num_points: usize) -> usize {
        match self.search_grid_size {
            Some(size) => size,
            None if num_points > 100_000 => 60,
            None if num_points > 5000 => 36,
            None => 20,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first field out of
    /// range, or [`Error::InvalidGridSize`] for a bad grid size.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |name, reason| Err(Error::InvalidParameter { name, reason });
        if self.min_neighbors == 0 {
            return invalid("min_neighbors", "must be at least 1");
        }
        if self.min_neighbors > self.max_neighbors {
            return invalid("max_neighbors", "must not be less than min_neighbors");
        }
        if let Some(size) = self.search_grid_size {
            if size == 0 || size > MAX_GRID_SIZE {
                return Err(Error::InvalidGridSize(size));
            }
        }
        if self.contour_grid_size == 0 || self.contour_grid_size > MAX_GRID_SIZE {
            return Err(Error::InvalidGridSize(self.contour_grid_size));
        }
        if !(self.sampling_density > 0.) {
            return invalid("sampling_density", "must be positive");
        }
        if !(self.vertex_tolerance.is_finite() && self.vertex_tolerance >= 0.) {
            return invalid("vertex_tolerance", "must be finite and not negative");
        }
        if !(self.domain_margin >= 0. && self.domain_margin < 0.5) {
            return invalid("domain_margin", "must be in [0, 0.5)");
        }
        Ok(())
    }
}

/// Uniform scaling and translation that fits the points into the unit cube.
#[derive(Debug, Clone, Copy)]
struct Normalization {
    center: Vec3,
    scale: f32,
}

impl Normalization {
    fn new(bbox: &BoundingBox, margin: f32) -> Result<Self, Error> {
        let extent = bbox.extent().max_element();
        if !(extent > 0.) || !extent.is_finite() {
            return Err(Error::DegenerateBoundingBox {
                min: bbox.min.to_array(),
                max: bbox.max.to_array(),
            });
        }
        Ok(Normalization {
            center: bbox.center(),
            scale: (1. - 2. * margin) / extent,
        })
    }

    fn to_unit(&self, p: Vec3) -> Vec3 {
        (p - self.center) * self.scale + Vec3::splat(0.5)
    }

    fn to_world(&self, p: Vec3) -> Vec3 {
        (p - Vec3::splat(0.5)) / self.scale + self.center
    }

    fn plane_to_world(&self, tp: &mut TangentPlane) {
        tp.origin = self.to_world(tp.origin);
        tp.frame.origin = self.to_world(tp.frame.origin);
        tp.frame.axes = tp.frame.axes * (1. / self.scale);
        tp.eigenvalues /= self.scale * self.scale;
    }
}

/// Everything the pipeline produces. Positions are in the coordinates of the
/// input points.
pub struct Reconstruction {
    pub mesh: Mesh,
    /// Oriented tangent planes, one per input point.
    pub tangent_planes: Vec<TangentPlane>,
    /// Squares drawn in each tangent plane before orientation.
    pub unoriented_quads: Vec<[Vec3; 4]>,
    /// Squares drawn in each tangent plane after orientation.
    pub oriented_quads: Vec<[Vec3; 4]>,
    /// Number of connected components of the neighbour graph.
    pub num_components: usize,
    pub stats: ContourStats,
}

impl Reconstruction {
    pub fn triangle_mesh(&self) -> TriangleMesh {
        self.mesh.to_triangle_mesh()
    }
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reconstruction: {} vertices, {} faces, {} components, {} cubes visited",
            self.mesh.num_vertices(),
            self.mesh.num_faces(),
            self.num_components,
            self.stats.cubes_visited
        )
    }
}

fn elapsed_ms(start: Instant) -> u128 {
    start.elapsed().as_millis()
}

/// Reconstruct a surface mesh from the points.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, there are no points, a
/// point is not finite, or all the points coincide.
pub fn reconstruct(points: &[Vec3], params: &ReconstructionParams) -> Result<Reconstruction, Error> {
    params.validate()?;
    let bbox = BoundingBox::from_points(points)?;
    let norm = Normalization::new(&bbox, params.domain_margin)?;
    let unit_points: Vec<Vec3> = points.iter().map(|p| norm.to_unit(*p)).collect();
    let density = params.sampling_density * norm.scale;

    let start = Instant::now();
    let grid_size = params.search_grid_size_for(points.len());
    let mut grid = SpatialGrid::new(grid_size, BoundingBox::unit())?;
    for (i, p) in unit_points.iter().enumerate() {
        grid.enter(i, *p);
    }
    info!(
        points = points.len(),
        grid_size,
        ms = elapsed_ms(start),
        "Built spatial grid"
    );

    let start = Instant::now();
    let (mut planes, mut graph) = estimate_tangent_planes(
        &unit_points,
        &grid,
        params.min_neighbors,
        params.max_neighbors,
        density,
    );
    let half_size = bbox.radius() * norm.scale / 10.;
    let unoriented_quads = tangent_plane_quads(&planes, half_size);
    info!(ms = elapsed_ms(start), "Estimated tangent planes");

    let start = Instant::now();
    let num_components = orient_tangent_planes(&mut planes, &mut graph);
    let oriented_quads = tangent_plane_quads(&planes, half_size);
    drop(graph);
    info!(
        components = num_components,
        ms = elapsed_ms(start),
        "Oriented tangent planes"
    );

    let start = Instant::now();
    let (mut mesh, stats) = {
        let field = SignedDistance::new(&planes, &grid, density, params.contour_grid_size)?;
        let mut contour = Contour3D::new(
            params.contour_grid_size,
            field,
            MeshContour::new().with_big_faces(params.big_mesh_faces),
        )?;
        contour.set_vertex_tolerance(params.vertex_tolerance * norm.scale);
        for tp in &planes {
            contour.march_from(tp.origin);
        }
        let (contour, stats) = contour.finish();
        (contour.into_mesh(), stats)
    };
    debug_assert!(mesh.check().is_ok(), "Contouring produced an invalid mesh");
    info!(
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        ms = elapsed_ms(start),
        "Contoured signed distance"
    );

    mesh.transform_points(|p| norm.to_world(p));
    for tp in planes.iter_mut() {
        norm.plane_to_world(tp);
    }
    let quads_to_world = |quads: Vec<[Vec3; 4]>| -> Vec<[Vec3; 4]> {
        quads
            .into_iter()
            .map(|q| q.map(|p| norm.to_world(p)))
            .collect()
    };
    Ok(Reconstruction {
        mesh,
        tangent_planes: planes,
        unoriented_quads: quads_to_world(unoriented_quads),
        oriented_quads: quads_to_world(oriented_quads),
        num_components,
        stats,
    })
}

#[cfg(test)]
mod test {
    use super::{Normalization, ReconstructionParams, reconstruct};
    use crate::{
        Error,
        macros::{assert_f32_eq, assert_vec3_eq},
        primitive::sphere_points,
        spatial::BoundingBox,
    };
    use glam::{Vec3, vec3};

    #[test]
    fn t_default_params() {
        let params = ReconstructionParams::new();
        assert_eq!(params, ReconstructionParams::default());
        params.validate().expect("Defaults must be valid");
        assert_eq!(params.search_grid_size_for(1000), 20);
        assert_eq!(params.search_grid_size_for(5000), 20);
        assert_eq!(params.search_grid_size_for(5001), 36);
        assert_eq!(params.search_grid_size_for(100_000), 36);
        assert_eq!(params.search_grid_size_for(100_001), 60);
        assert_eq!(
            params.with_search_grid_size(8).search_grid_size_for(1_000_000),
            8
        );
    }

    #[test]
    fn t_invalid_params() {
        let check = |params: ReconstructionParams, field: &str| match params.validate() {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, field),
            other => panic!("Expected an invalid {field}, got {other:?}"),
        };
        check(ReconstructionParams::new().with_neighbors(0, 4), "min_neighbors");
        check(ReconstructionParams::new().with_neighbors(8, 4), "max_neighbors");
        check(ReconstructionParams::new().with_sampling_density(0.), "sampling_density");
        check(
            ReconstructionParams::new().with_sampling_density(f32::NAN),
            "sampling_density",
        );
        check(ReconstructionParams::new().with_vertex_tolerance(-1.), "vertex_tolerance");
        check(ReconstructionParams::new().with_domain_margin(0.5), "domain_margin");
        assert!(matches!(
            ReconstructionParams::new().with_contour_grid_size(0).validate(),
            Err(Error::InvalidGridSize(0))
        ));
        assert!(matches!(
            ReconstructionParams::new().with_search_grid_size(1024).validate(),
            Err(Error::InvalidGridSize(1024))
        ));
    }

    #[test]
    fn t_invalid_points() {
        let params = ReconstructionParams::default();
        assert!(matches!(reconstruct(&[], &params), Err(Error::EmptyPointCloud)));
        let points = [Vec3::ZERO, vec3(f32::NAN, 0., 0.), Vec3::ONE];
        assert!(matches!(reconstruct(&points, &params), Err(Error::NonFinitePoint(1))));
        let points = [Vec3::ONE; 5];
        assert!(matches!(
            reconstruct(&points, &params),
            Err(Error::DegenerateBoundingBox { .. })
        ));
    }

    #[test]
    fn t_normalization() {
        let bbox = BoundingBox::new(vec3(-1., 2., 3.), vec3(3., 4., 4.)).expect("Invalid box");
        let norm = Normalization::new(&bbox, 0.1).expect("Degenerate box");
        assert_eq!(norm.to_unit(bbox.center()), Vec3::splat(0.5));
        let lo = norm.to_unit(bbox.min);
        let hi = norm.to_unit(bbox.max);
        // The longest axis spans the cube less the margins.
        assert_f32_eq!(lo.x, 0.1, 1e-6);
        assert_f32_eq!(hi.x, 0.9, 1e-6);
        assert!(lo.y > 0.1 && hi.y < 0.9);
        let p = vec3(0.3, 2.7, 3.9);
        assert_vec3_eq!(norm.to_world(norm.to_unit(p)), p, 1e-5);
    }

    #[test]
    fn t_sphere() {
        let center = vec3(10., -5., 3.);
        let radius = 4.;
        let points = sphere_points(6000, center, radius);
        let result = reconstruct(&points, &ReconstructionParams::default()).expect("Failed");
        let mesh = &result.mesh;
        mesh.check().expect("Invalid mesh");
        assert_eq!(result.num_components, 1);
        assert_eq!(result.tangent_planes.len(), points.len());
        assert_eq!(result.unoriented_quads.len(), points.len());
        assert_eq!(result.oriented_quads.len(), points.len());
        assert!(mesh.num_faces() > 100);
        assert!(mesh.edges().all(|e| !mesh.is_boundary_edge(e)));
        let euler =
            mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64;
        assert_eq!(euler, 2);
        // In world coordinates, facing out.
        for v in mesh.vertices() {
            assert_f32_eq!(mesh.point(v).distance(center), radius, 0.25);
        }
        assert!(mesh.calc_volume() > 0.);
        for (p, tp) in points.iter().zip(&result.tangent_planes) {
            assert!(tp.origin.distance(*p) < 0.5);
            assert!(tp.normal.dot(*p - center) > 0.);
        }
        let half_size = radius * 3f32.sqrt() / 10.;
        for quad in &result.oriented_quads {
            assert_f32_eq!(quad[0].distance(quad[2]), half_size * 8f32.sqrt(), 0.05);
        }
        let tri = result.triangle_mesh();
        assert_eq!(tri.num_vertices(), mesh.num_vertices());
        assert_eq!(tri.num_triangles(), mesh.num_faces());
    }

    #[test]
    fn t_big_faces_and_bisection() {
        let points = sphere_points(3000, Vec3::ZERO, 1.);
        let params = ReconstructionParams::new()
            .with_big_mesh_faces(true)
            .with_vertex_tolerance(1e-3)
            .with_contour_grid_size(16);
        let result = reconstruct(&points, &params).expect("Failed");
        result.mesh.check().expect("Invalid mesh");
        assert!(result.stats.cubes_visited > 0);
        assert!(result.mesh.faces().any(|f| !result.mesh.topol.is_triangle(f)));
        let tri = result.triangle_mesh();
        assert!(tri.num_triangles() > result.mesh.num_faces());
    }
}
