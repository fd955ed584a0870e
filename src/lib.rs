#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-topo
//!
//! mesh-topo is a topology store for unstructured meshes of dimension 1 to 3.
//! It keeps elements (vertices, lines, triangles, quadrilaterals, polygons,
//! PLC facets, tetrahedra, hexahedra) with their oriented boundary relations,
//! derives coboundary and neighbour relations lazily, deletes elements while
//! keeping every cross-reference consistent, and refines meshes adaptively,
//! uniformly or along a cutting hyperplane.
//!
//! ## Features
//! - A container layer with interchangeable backings (array, deque, linked
//!   list, unique set) and handle policies (positions, cursors, stable ids)
//! - Boundary relations with orientation permutations, de-duplicated on
//!   creation
//! - Coboundary and neighbour relations cached per dimension pair and
//!   rebuilt only after a mutation
//! - Transitive deletion with swap-remove compaction
//! - Longest-edge conforming refinement for simplices, uniform templates
//!   for tensor-product cells, hyperplane refinement
//! - Hole-point extraction for piecewise linear complexes
//!
//! ## Usage
//!
//! ```
//! use mesh_topo::prelude::*;
//!
//! let mut mesh = Mesh::new(2);
//! let a = mesh.create_vertex(&[0.0, 0.0])?;
//! let b = mesh.create_vertex(&[1.0, 0.0])?;
//! let c = mesh.create_vertex(&[0.0, 1.0])?;
//! let tri = mesh.create_element(ElementKind::Triangle, &[a, b, c])?;
//! assert_eq!(mesh.count(1), 3);
//!
//! let edge = mesh.boundary_elements(tri, 1)?.next().unwrap();
//! assert_eq!(mesh.coboundary_elements(edge, 2)?.to_vec(), vec![tri]);
//! # Ok::<(), MeshError>(())
//! ```
//!
//! ## Configuration
//! Storage and handle representation are chosen at compile time through a
//! [`mesh::MeshConfig`]; see [`mesh::StableConfig`] and friends, or declare
//! a new combination with [`mesh_config!`].

pub mod algs;
pub mod container;
pub mod debug_invariants;
pub mod geometry;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::hole_points::{HolePointOptions, extract_hole_points};
    pub use crate::algs::hyperplane::{HyperplaneOptions, hyperplane_refine};
    pub use crate::algs::refine::{
        CellFlags, EdgeFlags, RefineOptions, RefinementMap, refine, refine_cells, refine_in_place,
        refine_uniformly,
    };
    pub use crate::container::{Backing, HandlePolicy, KeyIndex, View};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh::{
        DefaultConfig, DequeConfig, EraseSummary, EraseView, ListConfig, Mesh, MeshConfig, MeshHandle,
        RegionId, StableConfig, UniqueConfig,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::{ElementId, ElementKind, InvalidateCache, Permutation};
}
