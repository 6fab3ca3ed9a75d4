use crate::topol::Topology;
use std::fmt::{Debug, Display};

/**
 * All elements of the mesh implement this trait. They are identified by their
 * index.
 */
pub trait Handle {
    /**
     * The index of the element.
     */
    fn index(&self) -> u32;
}

/**
 * Vertex handle. The index is the vertex id, which starts at 1.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VH {
    idx: u32,
}

/**
 * Halfedge handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HH {
    idx: u32,
}

/**
 * Edge handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EH {
    idx: u32,
}

/**
 * Face handle. The index is the face id, which starts at 1.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FH {
    idx: u32,
}

macro_rules! impl_handle {
    ($handle:ident, $name:literal) => {
        impl Handle for $handle {
            fn index(&self) -> u32 {
                self.idx
            }
        }

        impl From<u32> for $handle {
            fn from(idx: u32) -> Self {
                $handle { idx }
            }
        }

        impl From<&u32> for $handle {
            fn from(idx: &u32) -> Self {
                $handle { idx: *idx }
            }
        }

        impl Display for $handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", $name, self.idx)
            }
        }

        impl Debug for $handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", $name, self.idx)
            }
        }
    };
}

impl_handle!(VH, "VH");
impl_handle!(HH, "HH");
impl_handle!(EH, "EH");
impl_handle!(FH, "FH");

pub trait HasTopology {
    fn topology(&self) -> &Topology;
}

impl HasTopology for Topology {
    fn topology(&self) -> &Topology {
        self
    }
}

impl VH {
    /// Check if this vertex is alive in the `mesh`.
    pub fn is_valid(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_valid_vertex(self)
    }

    /// Check if this vertex is on the boundary of the `mesh`.
    ///
    /// A vertex is on the boundary if any of its incident edges has only one
    /// face. Isolated vertices are considered to be on the boundary.
    pub fn is_boundary(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_boundary_vertex(self)
    }

    /// The number of outgoing halfedges of this vertex.
    pub fn degree(self, mesh: &impl HasTopology) -> usize {
        mesh.topology().vertex_degree(self)
    }
}

impl HH {
    /// The vertex this halfedge points to.
    pub fn head(self, mesh: &impl HasTopology) -> VH {
        mesh.topology().head_vertex(self)
    }

    /// The vertex this halfedge starts from.
    pub fn tail(self, mesh: &impl HasTopology) -> VH {
        mesh.topology().tail_vertex(self)
    }

    pub fn sym(self, mesh: &impl HasTopology) -> Option<HH> {
        mesh.topology().sym_halfedge(self)
    }

    pub fn prev(self, mesh: &impl HasTopology) -> HH {
        mesh.topology().prev_halfedge(self)
    }

    pub fn next(self, mesh: &impl HasTopology) -> HH {
        mesh.topology().next_halfedge(self)
    }

    pub fn face(self, mesh: &impl HasTopology) -> Option<FH> {
        mesh.topology().halfedge_face(self)
    }

    pub fn edge(self, mesh: &impl HasTopology) -> EH {
        mesh.topology().halfedge_edge(self)
    }

    /// A halfedge is on the boundary if it has no sym.
    pub fn is_boundary(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().sym_halfedge(self).is_none()
    }
}

impl EH {
    /// The representative halfedge of this edge.
    pub fn halfedge(self, mesh: &impl HasTopology) -> HH {
        mesh.topology().edge_halfedge(self)
    }

    pub fn is_valid(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_valid_edge(self)
    }

    /// Check if the edge is a boundary edge, i.e. it has only one face.
    pub fn is_boundary(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_boundary_edge(self)
    }
}

impl FH {
    pub fn halfedge(self, mesh: &impl HasTopology) -> HH {
        mesh.topology().face_halfedge(self)
    }

    pub fn is_valid(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_valid_face(self)
    }

    /// Number of vertices in this face.
    pub fn valence(self, mesh: &impl HasTopology) -> usize {
        mesh.topology().face_valence(self)
    }
}

/// Placeholder used while a halfedge is being wired up.
pub(crate) const UNLINKED: u32 = u32::MAX;

#[derive(Debug, Clone, Default)]
pub(crate) struct Vertex {
    /// Halfedges leaving this vertex, in insertion order.
    pub(crate) outgoing: Vec<HH>,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Halfedge {
    pub(crate) tail: VH,
    pub(crate) vertex: VH,
    pub(crate) next: HH,
    pub(crate) prev: HH,
    pub(crate) sym: Option<HH>,
    /// `None` only for bogus halfedges, which exist for the duration of an
    /// edit and link to themselves.
    pub(crate) face: Option<FH>,
    pub(crate) edge: EH,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Edge {
    pub(crate) halfedge: HH,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Face {
    pub(crate) halfedge: HH,
}
