//! Element identities and the per-element boundary record.

use core::fmt;
use core::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::element_kind::{ElementKind, MAX_DIMENSION};
use super::orientation::Permutation;

/// Dense identity of an element: its topological dimension and its local
/// index among the elements of that dimension.
///
/// Local indices are always `0..count(dim)`. Erasing elements compacts
/// them, so an `ElementId` held across an erase may name a different
/// element afterwards; hold a policy handle (see
/// [`Mesh::handle`](crate::mesh::Mesh::handle)) for long-lived references.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId {
    dim: u8,
    index: usize,
}

impl ElementId {
    #[inline]
    pub const fn new(dim: usize, index: usize) -> Self {
        Self {
            dim: dim as u8,
            index,
        }
    }

    /// Shorthand for a vertex id.
    #[inline]
    pub const fn vertex(index: usize) -> Self {
        Self::new(0, index)
    }

    #[inline]
    pub const fn dim(self) -> usize {
        self.dim as usize
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementId")
            .field(&self.dim)
            .field(&self.index)
            .finish()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dim, self.index)
    }
}

/// Boundary elements of one lower dimension, in reference-slot order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundaryLayer {
    pub(crate) indices: Vec<usize>,
    pub(crate) orientations: Vec<Permutation>,
}

impl BoundaryLayer {
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn orientations(&self) -> &[Permutation] {
        &self.orientations
    }

    pub(crate) fn push(&mut self, index: usize, orientation: Permutation) {
        self.indices.push(index);
        self.orientations.push(orientation);
    }
}

/// Stored record of one element.
///
/// Layer `d` holds the local indices of the boundary elements of dimension
/// `d`; layer 0 is the element's vertex list in its intrinsic order.
#[derive(Clone, Debug)]
pub struct Element {
    kind: ElementKind,
    serial: u64,
    layers: [BoundaryLayer; MAX_DIMENSION],
    hole_points: Vec<f64>,
}

impl Element {
    pub(crate) fn new(kind: ElementKind, serial: u64) -> Self {
        Self {
            kind,
            serial,
            layers: Default::default(),
            hole_points: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.kind.dimension()
    }

    /// Vertex local indices in intrinsic order (empty for vertices).
    #[inline]
    pub fn vertices(&self) -> &[usize] {
        self.boundary(0)
    }

    /// Local indices of the boundary elements of dimension `dim`.
    pub fn boundary(&self, dim: usize) -> &[usize] {
        match self.layers.get(dim) {
            Some(layer) if dim < self.dimension() => layer.indices(),
            _ => &[],
        }
    }

    pub fn orientations(&self, dim: usize) -> &[Permutation] {
        match self.layers.get(dim) {
            Some(layer) if dim < self.dimension() => layer.orientations(),
            _ => &[],
        }
    }

    /// Hole points of a PLC facet, flattened by geometric dimension.
    #[inline]
    pub fn hole_points(&self) -> &[f64] {
        &self.hole_points
    }

    pub(crate) fn layer_mut(&mut self, dim: usize) -> &mut BoundaryLayer {
        &mut self.layers[dim]
    }

    pub(crate) fn set_hole_points(&mut self, points: Vec<f64>) {
        self.hole_points = points;
    }

    /// Replace every reference to `old` in layer `dim` with `new`.
    pub(crate) fn replace_reference(&mut self, dim: usize, old: usize, new: usize) -> usize {
        let mut replaced = 0;
        if let Some(layer) = self.layers.get_mut(dim) {
            for idx in layer.indices.iter_mut().filter(|i| **i == old) {
                *idx = new;
                replaced += 1;
            }
        }
        replaced
    }

    /// Map every reference in layer `dim` through `f`.
    pub(crate) fn remap_layer(&mut self, dim: usize, mut f: impl FnMut(usize) -> usize) {
        if let Some(layer) = self.layers.get_mut(dim) {
            for idx in layer.indices.iter_mut() {
                *idx = f(*idx);
            }
        }
    }

    /// Sorted vertex list; the de-duplication identity of non-vertex elements.
    pub(crate) fn vertex_key(&self) -> Vec<usize> {
        let mut key = self.vertices().to_vec();
        key.sort_unstable();
        key
    }
}

// Vertices are told apart by creation serial, everything else by kind and
// vertex set. Set-backed stores rely on this.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (ElementKind::Vertex, ElementKind::Vertex) => self.serial == other.serial,
            (a, b) => a == b && self.vertex_key() == other.vertex_key(),
        }
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        if self.kind == ElementKind::Vertex {
            self.serial.hash(state);
        } else {
            self.vertex_key().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(ElementId, [usize; 2]);

    fn line(serial: u64, a: usize, b: usize) -> Element {
        let mut e = Element::new(ElementKind::Line, serial);
        e.layer_mut(0).push(a, Permutation::identity(1));
        e.layer_mut(0).push(b, Permutation::identity(1));
        e
    }

    #[test]
    fn equality_ignores_vertex_order_and_serial() {
        assert_eq!(line(1, 3, 4), line(2, 4, 3));
        assert_ne!(line(1, 3, 4), line(1, 3, 5));
        assert_ne!(
            Element::new(ElementKind::Vertex, 1),
            Element::new(ElementKind::Vertex, 2)
        );
    }

    #[test]
    fn replace_reference_rewrites_all_occurrences() {
        let mut e = line(0, 7, 2);
        assert_eq!(e.replace_reference(0, 7, 0), 1);
        assert_eq!(e.vertices(), &[0, 2]);
        e.remap_layer(0, |i| i + 10);
        assert_eq!(e.vertices(), &[10, 12]);
    }

    #[test]
    fn ids_order_by_dimension_first() {
        assert!(ElementId::new(0, 99) < ElementId::new(1, 0));
        assert_eq!(ElementId::new(2, 5).to_string(), "2:5");
    }
}
