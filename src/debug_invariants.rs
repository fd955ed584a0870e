//! Structural self-checks.
//!
//! For a [`Mesh`](crate::mesh::Mesh) the checks cover the point buffer
//! length, dense local indices per dimension, boundary references in range
//! with one orientation per entry, the de-duplication index and region
//! members. Mutating operations run them after they finish when debug
//! assertions or one of the `check-invariants` / `strict-invariants`
//! features are on.

use crate::mesh_error::MeshError;

pub trait DebugInvariants {
    /// First violated invariant, if any.
    fn validate_invariants(&self) -> Result<(), MeshError>;

    /// Panic on a violated invariant when checking is enabled; a no-op
    /// otherwise.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), core::any::type_name::<Self>());
    }
}

/// Panic with `context` if `$check` returns an error, when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $context:expr) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $check {
            panic!("[invariants] {}: {}", $context, e);
        }
    };
}
