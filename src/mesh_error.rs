//! MeshError: unified error type for mesh-topo public APIs.
//!
//! Every fallible operation in the crate (container lookups, element
//! construction, relation queries, deletion, refinement and hole-point
//! extraction) reports failures through this enum instead of panicking.

use thiserror::Error;

use crate::mesh::region::RegionId;
use crate::topology::element_kind::ElementKind;

/// Unified error type for mesh-topo operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// The vertex list does not match the arity of the requested element kind.
    #[error("{kind:?} cannot be built from {found} vertices")]
    InvalidArity { kind: ElementKind, found: usize },
    /// The same vertex appears more than once in an element.
    #[error("{kind:?} references the same vertex more than once")]
    DegenerateElement { kind: ElementKind },
    /// A topological dimension outside the supported range, or the wrong
    /// dimension for the requested relation.
    #[error("invalid dimension {dimension}: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },
    /// A handle, id or local index does not refer to a live element.
    #[error("not found: {0}")]
    NotFound(String),
    /// A point has the wrong number of coordinates for this mesh.
    #[error("point has {found} coordinates, mesh expects {expected}")]
    PointDimensionMismatch { expected: usize, found: usize },
    /// A region id that was never created on this mesh.
    #[error("unknown region {0:?}")]
    UnknownRegion(RegionId),
    /// Edge flags and refinement vertices do not describe a refinable mesh.
    #[error("inconsistent refinement: {0}")]
    InconsistentRefinement(String),
    /// The element kind has no refinement template for the requested operation.
    #[error("no refinement template for {0:?}")]
    UnsupportedRefinement(ElementKind),
    /// Input and output meshes of a refinement live in different spaces.
    #[error("geometric dimension mismatch: input {input}, output {output}")]
    GeometricDimensionMismatch { input: usize, output: usize },
    /// No interior point could be synthesized for a hole surface.
    #[error("no hole point found for surface {surface}")]
    HolePointNotFound { surface: usize },
}
