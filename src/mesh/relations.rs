//! Derived relationship cache: coboundary and neighbour relations.
//!
//! Relations are computed lazily, one whole table per
//! `(relation, source dimension, other dimension)`. Each table remembers the
//! change counter it was built against and is rebuilt in full the first
//! time it is queried after a mutation. Tables are shared as `Arc`
//! snapshots, so a [`RelationView`] stays valid even if the mesh rebuilds
//! the table later.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use parking_lot::RwLock;

use super::{Mesh, MeshConfig};
use crate::container::View;
use crate::mesh_error::MeshError;
use crate::topology::element::ElementId;
use crate::topology::element_kind::MAX_DIMENSION;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum RelationKind {
    Coboundary,
    Neighbour,
}

type RelationKey = (RelationKind, u8, u8);

/// One fully built relation: for every source element, the local indices of
/// related elements in the target dimension.
#[derive(Debug)]
pub(crate) struct RelationTable {
    pub(crate) stamp: u64,
    pub(crate) target_dim: usize,
    pub(crate) entries: Vec<View<usize>>,
}

impl RelationTable {
    pub(crate) fn related(&self, index: usize) -> &[usize] {
        self.entries.get(index).map_or(&[], |v| v.as_slice())
    }
}

#[derive(Default)]
pub(crate) struct RelationCache {
    tables: RwLock<HashMap<RelationKey, Arc<RelationTable>>>,
    rebuilds: AtomicUsize,
}

impl RelationCache {
    pub(crate) fn clear(&mut self) {
        self.tables.get_mut().clear();
    }

    fn fresh(&self, key: &RelationKey, stamp: u64) -> Option<Arc<RelationTable>> {
        self.tables
            .read()
            .get(key)
            .filter(|t| t.stamp == stamp)
            .cloned()
    }
}

/// Related elements of one element, backed by a shared relation table.
#[derive(Clone, Debug)]
pub struct RelationView {
    table: Arc<RelationTable>,
    index: usize,
}

impl RelationView {
    /// Local indices of the related elements.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        self.table.related(self.index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        let dim = self.table.target_dim;
        self.indices().iter().map(move |&i| ElementId::new(dim, i))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        id.dim() == self.table.target_dim && self.indices().contains(&id.index())
    }

    pub fn to_vec(&self) -> Vec<ElementId> {
        self.iter().collect()
    }

    /// Whether both views read from the very same table build.
    pub fn same_table(&self, other: &RelationView) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }

    /// Change counter the backing table was built against.
    pub fn stamp(&self) -> u64 {
        self.table.stamp
    }
}

impl<C: MeshConfig> Mesh<C> {
    /// Elements of dimension `target_dim` having `id` on their boundary.
    pub fn coboundary_elements(
        &self,
        id: ElementId,
        target_dim: usize,
    ) -> Result<RelationView, MeshError> {
        self.element(id)?;
        if target_dim <= id.dim() || target_dim > MAX_DIMENSION {
            return Err(MeshError::InvalidDimension {
                dimension: target_dim,
                reason: "coboundary dimension must be above the element's",
            });
        }
        let table = self.relation_table(RelationKind::Coboundary, id.dim(), target_dim);
        Ok(RelationView {
            table,
            index: id.index(),
        })
    }

    /// Other elements of `id`'s dimension sharing at least one element of
    /// dimension `connector_dim` with `id`.
    ///
    /// The connector may lie below (shared boundary, e.g. triangles sharing
    /// an edge) or above (shared coboundary, e.g. vertices joined by an
    /// edge) the element's dimension.
    pub fn neighbour_elements(
        &self,
        id: ElementId,
        connector_dim: usize,
    ) -> Result<RelationView, MeshError> {
        self.element(id)?;
        if connector_dim == id.dim() || connector_dim > MAX_DIMENSION {
            return Err(MeshError::InvalidDimension {
                dimension: connector_dim,
                reason: "connector dimension must differ from the element's",
            });
        }
        let table = self.relation_table(RelationKind::Neighbour, id.dim(), connector_dim);
        Ok(RelationView {
            table,
            index: id.index(),
        })
    }

    /// Whether `id` is a facet of exactly one top-dimensional cell.
    ///
    /// A surface mesh in 3D is a hull: every one of its cells bounds
    /// the enclosed volume.
    pub fn is_boundary_facet(&self, id: ElementId) -> Result<bool, MeshError> {
        let top = self.topologic_dimension();
        if top == 2 && id.dim() == 2 && self.geometric_dimension() == 3 {
            self.element(id)?;
            return Ok(true);
        }
        if id.dim() + 1 != top {
            return Ok(false);
        }
        Ok(self.coboundary_elements(id, top)?.len() == 1)
    }

    /// Number of full relation-table builds so far.
    pub fn relation_rebuilds(&self) -> usize {
        self.relations.rebuilds.load(Ordering::Relaxed)
    }

    /// Table for `(kind, source, other)` if it is current.
    pub(crate) fn fresh_coboundary(&self, source: usize, target: usize) -> Option<Arc<RelationTable>> {
        let key = (RelationKind::Coboundary, source as u8, target as u8);
        self.relations.fresh(&key, self.counter.get())
    }

    pub(crate) fn relation_table(
        &self,
        kind: RelationKind,
        source: usize,
        other: usize,
    ) -> Arc<RelationTable> {
        let stamp = self.counter.get();
        let key = (kind, source as u8, other as u8);
        if let Some(table) = self.relations.fresh(&key, stamp) {
            return table;
        }
        let table = Arc::new(match kind {
            RelationKind::Coboundary => self.build_coboundary(source, other, stamp),
            RelationKind::Neighbour => self.build_neighbour(source, other, stamp),
        });
        self.relations.rebuilds.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "rebuilt {kind:?} relation {source}->{other} at stamp {stamp} ({} entries)",
            table.entries.len()
        );
        self.relations.tables.write().insert(key, Arc::clone(&table));
        table
    }

    fn build_coboundary(&self, source: usize, target: usize, stamp: u64) -> RelationTable {
        let mut entries: Vec<View<usize>> = vec![View::new(); self.count(source)];
        if let Ok(store) = self.store(target) {
            for (t, element) in store.values().enumerate() {
                for &b in element.boundary(source) {
                    if let Some(entry) = entries.get_mut(b) {
                        entry.insert_handle(t);
                    }
                }
            }
        }
        RelationTable {
            stamp,
            target_dim: target,
            entries,
        }
    }

    fn build_neighbour(&self, source: usize, connector: usize, stamp: u64) -> RelationTable {
        let mut entries: Vec<View<usize>> = vec![View::new(); self.count(source)];
        let mut linked: HashSet<(usize, usize)> = HashSet::new();
        let mut link = |members: &[usize]| {
            for (&a, &b) in members.iter().tuple_combinations() {
                if a == b {
                    continue;
                }
                if linked.insert((a.min(b), a.max(b))) {
                    entries[a].insert_handle(b);
                    entries[b].insert_handle(a);
                }
            }
        };
        if connector < source {
            let cob = self.relation_table(RelationKind::Coboundary, connector, source);
            for members in &cob.entries {
                link(members.as_slice());
            }
        } else if let Ok(store) = self.store(connector) {
            for element in store.values() {
                link(element.boundary(source));
            }
        }
        RelationTable {
            stamp,
            target_dim: source,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::algs::meshgen::triangle_grid;
    use crate::mesh_error::MeshError;
    use crate::topology::element::ElementId;

    #[test]
    fn second_query_reuses_the_table() {
        let mesh = triangle_grid(2, 2, [0.0, 0.0], [1.0, 1.0]).unwrap();
        let v = ElementId::vertex(4);
        let first = mesh.coboundary_elements(v, 2).unwrap();
        let rebuilds = mesh.relation_rebuilds();
        let second = mesh.coboundary_elements(v, 2).unwrap();
        assert!(first.same_table(&second));
        assert_eq!(mesh.relation_rebuilds(), rebuilds);
        assert_eq!(first.to_vec(), second.to_vec());
    }

    #[test]
    fn mutation_forces_rebuild() {
        let mut mesh = triangle_grid(1, 1, [0.0, 0.0], [1.0, 1.0]).unwrap();
        let v = ElementId::vertex(0);
        let before = mesh.coboundary_elements(v, 1).unwrap();
        let w = mesh.create_vertex(&[-1.0, 0.0]).unwrap();
        mesh.create_element(crate::topology::element_kind::ElementKind::Line, &[v, w])
            .unwrap();
        let after = mesh.coboundary_elements(v, 1).unwrap();
        assert!(!before.same_table(&after));
        assert_eq!(after.len(), before.len() + 1);
    }

    #[test]
    fn neighbours_exclude_self_in_both_directions() {
        let mesh = triangle_grid(2, 2, [0.0, 0.0], [1.0, 1.0]).unwrap();
        for t in mesh.elements(2) {
            let n = mesh.neighbour_elements(t, 1).unwrap();
            assert!(!n.contains(t));
            assert!(n.len() <= 3);
        }
        let centre = ElementId::vertex(4);
        let via_edges = mesh.neighbour_elements(centre, 1).unwrap();
        assert!(!via_edges.contains(centre));
        assert_eq!(via_edges.len(), mesh.coboundary_elements(centre, 1).unwrap().len());
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        let mesh = triangle_grid(1, 1, [0.0, 0.0], [1.0, 1.0]).unwrap();
        let t = ElementId::new(2, 0);
        assert!(matches!(
            mesh.coboundary_elements(t, 1),
            Err(MeshError::InvalidDimension { dimension: 1, .. })
        ));
        assert!(matches!(
            mesh.coboundary_elements(t, 2),
            Err(MeshError::InvalidDimension { dimension: 2, .. })
        ));
        assert!(matches!(
            mesh.neighbour_elements(t, 2),
            Err(MeshError::InvalidDimension { dimension: 2, .. })
        ));
        assert!(matches!(
            mesh.coboundary_elements(ElementId::new(2, 77), 3),
            Err(MeshError::NotFound(_))
        ));
    }
}
