use crate::element::{EH, FH, HH, VH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Input.
    #[error("The point cloud has no points")]
    EmptyPointCloud,
    #[error("Point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),
    #[error("Bounding box is degenerate: min {min:?}, max {max:?}")]
    DegenerateBoundingBox { min: [f32; 3], max: [f32; 3] },
    #[error("Invalid grid size {0}: must be between 1 and 1023")]
    InvalidGridSize(usize),
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    // Topology.
    #[error("{0} refers to a deleted or missing element")]
    DanglingHalfedge(HH),
    #[error("{0} is not the sym of its own sym")]
    AsymmetricSym(HH),
    #[error("{0} is not linked to its neighbours in the face ring")]
    BrokenHalfedgeLink(HH),
    #[error("The halfedge ring of {0} does not close")]
    BrokenFaceRing(FH),
    #[error("{0} appears more than once in the ring of {1}")]
    RepeatedFaceVertex(VH, FH),
    #[error("{0} appears more than once among the outgoing halfedges of {1}")]
    DuplicateDirectedEdge(HH, VH),
    #[error("{0} is not registered with its tail vertex")]
    OrphanHalfedge(HH),
    #[error("{0} is a leftover bogus halfedge")]
    BogusHalfedge(HH),
    #[error("{0} does not point back to its representative halfedge")]
    InvalidEdgeHalfedge(EH),
    #[error("Expected {expected} edges, found {found}")]
    EdgeCountMismatch { expected: usize, found: usize },
    #[error("The live {kind} count is {counted}, but {stored} are recorded")]
    EntityCountMismatch {
        kind: &'static str,
        counted: usize,
        stored: usize,
    },
    #[error("{0} has no position")]
    MissingPosition(VH),
}
