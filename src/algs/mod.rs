//! Algorithms built on the mesh core: refinement, hyperplane cutting,
//! hole-point extraction and structured generators.

pub mod hole_points;
pub mod hyperplane;
pub mod meshgen;
pub mod refine;

pub use hole_points::{HolePointOptions, extract_hole_points};
pub use hyperplane::{HyperplaneCut, HyperplaneOptions, hyperplane_refine, mark_edges_for_hyperplane_refine};
pub use refine::{
    CellFlags, EdgeFlags, RefineOptions, RefinementMap, cell_refinement_to_edge_refinement,
    ensure_longest_edge_refinement, refine, refine_cells, refine_in_place, refine_uniformly,
};
