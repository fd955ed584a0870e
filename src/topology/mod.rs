//! Element kinds, reference boundary tables, orientation and change
//! tracking.

pub mod cache;
pub mod element;
pub mod element_kind;
pub mod orientation;

pub use cache::{ChangeCounter, InvalidateCache};
pub use element::{BoundaryLayer, Element, ElementId};
pub use element_kind::{ElementKind, MAX_DIMENSION};
pub use orientation::Permutation;
