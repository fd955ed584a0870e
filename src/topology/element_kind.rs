//! Element kinds and their reference boundary tables.
//!
//! Every kind fixes a local vertex numbering. The boundary of an element of
//! dimension `d` in some lower dimension is the list of *slots* returned by
//! [`ElementKind::boundary_slots`]: each slot names the parent-local vertices
//! of one boundary element, in the order the parent traverses them.
//!
//! | Kind | Vertices | Edges | Faces |
//! |---|---|---|---|
//! | triangle | `0 1 2` | `01 02 12` | |
//! | quadrilateral | `0 1 2 3` (cyclic) | `01 12 23 30` | |
//! | polygon / PLC | cyclic loop | `i, i+1` | |
//! | tetrahedron | `0 1 2 3` | `01 02 03 12 13 23` | `012 013 023 123` |
//! | hexahedron | bottom `0123`, top `4567` | bottom, top, verticals | bottom, top, four sides |

use serde::{Deserialize, Serialize};

/// Largest topological dimension the store handles.
pub const MAX_DIMENSION: usize = 3;

/// Supported element kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ElementKind {
    /// 0D vertex.
    #[default]
    Vertex,
    /// 1D segment.
    Line,
    /// 2D simplex.
    Triangle,
    /// 2D tensor-product cell, vertices in cyclic order.
    Quadrilateral,
    /// 2D polygon with any number (>= 3) of vertices in cyclic order.
    Polygon,
    /// Planar straight-line complex facet: a closed boundary made of lines,
    /// possibly with inner loops and hole points.
    Plc,
    /// 3D simplex.
    Tetrahedron,
    /// 3D tensor-product cell.
    Hexahedron,
}

const TRIANGLE_EDGES: [[usize; 2]; 3] = [[0, 1], [0, 2], [1, 2]];
const QUAD_EDGES: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];
const TET_EDGES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];
const TET_FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
const HEX_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];
const HEX_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

impl ElementKind {
    /// Topological dimension.
    pub const fn dimension(self) -> usize {
        match self {
            ElementKind::Vertex => 0,
            ElementKind::Line => 1,
            ElementKind::Triangle
            | ElementKind::Quadrilateral
            | ElementKind::Polygon
            | ElementKind::Plc => 2,
            ElementKind::Tetrahedron | ElementKind::Hexahedron => 3,
        }
    }

    /// Fixed vertex count, or `None` for variable-arity kinds.
    pub const fn vertex_count(self) -> Option<usize> {
        match self {
            ElementKind::Vertex => Some(1),
            ElementKind::Line => Some(2),
            ElementKind::Triangle => Some(3),
            ElementKind::Quadrilateral => Some(4),
            ElementKind::Tetrahedron => Some(4),
            ElementKind::Hexahedron => Some(8),
            ElementKind::Polygon | ElementKind::Plc => None,
        }
    }

    /// Whether `n` vertices can form an element of this kind.
    pub fn accepts_vertex_count(self, n: usize) -> bool {
        match self.vertex_count() {
            Some(expected) => n == expected,
            None => n >= 3,
        }
    }

    #[inline]
    pub const fn is_simplex(self) -> bool {
        matches!(
            self,
            ElementKind::Vertex | ElementKind::Line | ElementKind::Triangle | ElementKind::Tetrahedron
        )
    }

    /// Kind of the boundary elements of dimension `dim`.
    pub const fn boundary_kind(self, dim: usize) -> Option<ElementKind> {
        if dim >= self.dimension() {
            return None;
        }
        match (self, dim) {
            (_, 0) => Some(ElementKind::Vertex),
            (_, 1) => Some(ElementKind::Line),
            (ElementKind::Tetrahedron, 2) => Some(ElementKind::Triangle),
            (ElementKind::Hexahedron, 2) => Some(ElementKind::Quadrilateral),
            _ => None,
        }
    }

    /// Parent-local vertex tuples of the boundary elements of dimension
    /// `dim`, for an element with `vertex_count` vertices.
    pub fn boundary_slots(self, vertex_count: usize, dim: usize) -> Vec<Vec<usize>> {
        if dim >= self.dimension() {
            return Vec::new();
        }
        if dim == 0 {
            return (0..vertex_count).map(|i| vec![i]).collect();
        }
        fn collect<const N: usize>(table: &[[usize; N]]) -> Vec<Vec<usize>> {
            table.iter().map(|slot| slot.to_vec()).collect()
        }
        match (self, dim) {
            (ElementKind::Triangle, 1) => collect(&TRIANGLE_EDGES),
            (ElementKind::Quadrilateral, 1) => collect(&QUAD_EDGES),
            (ElementKind::Polygon | ElementKind::Plc, 1) => (0..vertex_count)
                .map(|i| vec![i, (i + 1) % vertex_count])
                .collect(),
            (ElementKind::Tetrahedron, 1) => collect(&TET_EDGES),
            (ElementKind::Tetrahedron, 2) => collect(&TET_FACES),
            (ElementKind::Hexahedron, 1) => collect(&HEX_EDGES),
            (ElementKind::Hexahedron, 2) => collect(&HEX_FACES),
            _ => Vec::new(),
        }
    }

    /// Local vertex pairs of the edges (dimension-1 boundary).
    pub fn edge_slots(self, vertex_count: usize) -> Vec<[usize; 2]> {
        self.boundary_slots(vertex_count, 1)
            .into_iter()
            .filter_map(|slot| match slot.as_slice() {
                &[a, b] => Some([a, b]),
                _ => None,
            })
            .collect()
    }
}
