/*!
Surface reconstruction from unorganized points, built on a halfedge mesh.

# Overview

+ A tangent plane is fitted to the neighbourhood of each point by principal
  component analysis. Neighbourhoods are found with a uniform [`SpatialGrid`].

+ The normals of the planes are given consistent signs by propagating them
  along a minimum spanning tree of the neighbour [`Graph`], one connected
  component at a time.

+ The signed distance to the nearest tangent plane ([`SignedDistance`]) is
  contoured with a marching cubes flood fill ([`Contour3D`]). The contour is
  either built into a halfedge [`Mesh`] ([`MeshContour`]) or streamed out as
  independent triangles ([`StreamContour`]).

+ [`reconstruct`] runs the whole pipeline, after fitting the points into the
  unit cube, and maps the results back to the coordinates of the input.

The halfedge [`Mesh`] supports the usual topological edits: edge swaps,
splits and collapses, face splits and face merges, and can verify its own
consistency with [`Mesh::check`].
*/

mod check;
mod contour;
mod distance;
mod edit;
mod element;
mod error;
mod graph;
mod iterator;
mod macros;
mod math;
mod mesh;
mod orient;
mod primitive;
mod principal;
mod queue;
mod reconstruct;
mod spatial;
mod tangent;
mod topol;
mod triangulate;

pub use contour::{
    Contour3D, ContourStats, Corner, CubeContour, CubeCorners, Crossings, MeshContour,
    ScalarField, StreamContour,
};
pub use distance::SignedDistance;
pub use element::{EH, FH, HH, Handle, HasTopology, VH};
pub use error::Error;
pub use graph::{Graph, UnionFind, minimum_spanning_tree};
pub use mesh::{Mesh, TriangleMesh};
pub use orient::orient_tangent_planes;
pub use primitive::sphere_points;
pub use principal::{Frame, principal_components};
pub use queue::Pqueue;
pub use reconstruct::{Reconstruction, ReconstructionParams, reconstruct};
pub use spatial::{
    BoundingBox, DEFAULT_SEARCH_RADIUS, GridEntry, MAX_GRID_SIZE, SpatialGrid, SpatialSearch,
    decode_cell, encode_cell,
};
pub use tangent::{TangentPlane, estimate_tangent_planes, tangent_plane_quads};
pub use topol::Topology;
