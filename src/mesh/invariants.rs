//! Structural self-checks of a mesh.

use super::{Mesh, MeshConfig};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;
use crate::topology::element::ElementId;
use crate::topology::element_kind::MAX_DIMENSION;

impl<C: MeshConfig> DebugInvariants for Mesh<C> {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        let g = self.geometric_dimension;
        if self.points.len() != self.count(0) * g {
            return Err(MeshError::PointDimensionMismatch {
                expected: self.count(0) * g,
                found: self.points.len(),
            });
        }
        for dim in 0..=MAX_DIMENSION {
            let store = &self.stores[dim];
            for (pos, element) in store.values().enumerate() {
                let id = ElementId::new(dim, pos);
                if element.dimension() != dim {
                    return Err(MeshError::InvalidDimension {
                        dimension: element.dimension(),
                        reason: "element stored under the wrong dimension",
                    });
                }
                for b in 0..dim {
                    let layer = element.boundary(b);
                    if layer.len() != element.orientations(b).len() {
                        return Err(MeshError::NotFound(format!(
                            "orientation list of {id} in dimension {b}"
                        )));
                    }
                    if let Some(&bad) = layer.iter().find(|&&i| i >= self.count(b)) {
                        return Err(MeshError::NotFound(format!(
                            "{} referenced by {id}",
                            ElementId::new(b, bad)
                        )));
                    }
                }
                if dim > 0 {
                    let key = (element.kind(), element.vertex_key());
                    if self.dedup.get(&key) != Some(&pos) {
                        return Err(MeshError::NotFound(format!(
                            "de-duplication entry of {id}"
                        )));
                    }
                }
            }
        }
        for region in self.regions.iter() {
            if let Some(bad) = region.members().iter().find(|&m| !self.contains(m)) {
                return Err(MeshError::NotFound(format!(
                    "{bad} in region {}",
                    region.name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::meshgen::triangle_grid;

    #[test]
    fn generated_meshes_are_consistent() {
        let mesh = triangle_grid(2, 2, [0.0; 2], [1.0; 2]).unwrap();
        assert_eq!(mesh.validate_invariants(), Ok(()));
        mesh.debug_assert_invariants();
    }

    #[test]
    fn short_point_buffer_is_reported() {
        let mut mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2]).unwrap();
        mesh.points.pop();
        assert_eq!(
            mesh.validate_invariants(),
            Err(MeshError::PointDimensionMismatch {
                expected: 8,
                found: 7
            })
        );
    }

    #[test]
    fn stale_dedup_entry_is_reported() {
        let mut mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2]).unwrap();
        mesh.dedup.clear();
        assert!(matches!(mesh.validate_invariants(), Err(MeshError::NotFound(_))));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "[invariants]")]
    fn debug_assert_panics_on_violation() {
        let mut mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2]).unwrap();
        mesh.points.pop();
        mesh.debug_assert_invariants();
    }
}
