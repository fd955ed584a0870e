//! Deletion: transitive marking and compacting erase.
//!
//! Erasing an element also erases everything built on it (every element
//! that has it on its boundary, transitively). Removal uses swap semantics
//! so local indices stay dense; references to moved elements are rewritten
//! in every surviving element, region and derived table.

use std::sync::Arc;

use super::relations::RelationTable;
use super::{Mesh, MeshConfig};
use crate::container::{UniqueSetBacking, View};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;
use crate::topology::element::ElementId;
use crate::topology::element_kind::MAX_DIMENSION;

/// Set of elements scheduled for erasure.
pub type EraseView = View<ElementId, UniqueSetBacking<ElementId>>;

/// What an [`erase`](Mesh::erase) call removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EraseSummary {
    /// Removed elements per topological dimension.
    pub removed: [usize; MAX_DIMENSION + 1],
    /// Whether references were rewritten through a current coboundary
    /// table rather than a full scan.
    pub used_coboundary_cache: bool,
}

impl EraseSummary {
    pub fn total(&self) -> usize {
        self.removed.iter().sum()
    }
}

impl<C: MeshConfig> Mesh<C> {
    /// Add `id` and every element transitively built on it to `view`.
    ///
    /// Marking is idempotent and never mutates the mesh. Ids that name no
    /// element are ignored.
    pub fn mark_for_erase(&self, view: &mut EraseView, id: ElementId) -> Result<(), MeshError> {
        if !self.contains(id) || !view.insert_handle(id) {
            return Ok(());
        }
        let top = self.topologic_dimension();
        let mut work = vec![id];
        while let Some(current) = work.pop() {
            for dim in current.dim() + 1..=top {
                for above in self.coboundary_elements(current, dim)?.iter() {
                    if view.insert_handle(above) {
                        log::trace!("erase: {above} depends on {current}");
                        work.push(above);
                    }
                }
            }
        }
        Ok(())
    }

    /// Erase `id` and everything built on it.
    pub fn erase_element(&mut self, id: ElementId) -> Result<EraseSummary, MeshError> {
        let mut view = EraseView::new();
        self.mark_for_erase(&mut view, id)?;
        self.erase(&view)
    }

    /// Remove every element of `view` (closed under coboundary first).
    ///
    /// Dimensions are processed from the highest down and, within one
    /// dimension, from the highest local index down; each removal moves the
    /// last element into the freed slot. Handles into `view` are not
    /// modified.
    pub fn erase(&mut self, view: &EraseView) -> Result<EraseSummary, MeshError> {
        let mut closed = EraseView::new();
        let mut requested = 0;
        for id in view.iter().filter(|&id| self.contains(id)) {
            requested += 1;
            self.mark_for_erase(&mut closed, id)?;
        }
        if closed.len() > requested {
            log::warn!(
                "erase view was not closed under coboundary; {} dependent elements added",
                closed.len() - requested
            );
        }
        if closed.is_empty() {
            return Ok(EraseSummary::default());
        }

        let top = self.topologic_dimension();
        let mut marked: Vec<Vec<usize>> = vec![Vec::new(); MAX_DIMENSION + 1];
        for id in closed.iter() {
            marked[id.dim()].push(id.index());
        }
        for list in &mut marked {
            list.sort_unstable_by(|a, b| b.cmp(a));
        }

        // current tables see pre-erase indices; capture them before mutating
        let mut snapshot: Vec<Vec<Option<Arc<RelationTable>>>> =
            vec![vec![None; MAX_DIMENSION + 1]; MAX_DIMENSION + 1];
        for d in 0..top {
            for t in d + 1..=top {
                snapshot[d][t] = self.fresh_coboundary(d, t);
            }
        }

        let mut summary = EraseSummary::default();
        let mut remaps: Vec<Vec<Option<usize>>> = (0..=MAX_DIMENSION)
            .map(|d| (0..self.count(d)).map(Some).collect())
            .collect();

        for d in (0..=top).rev() {
            let mut original_at: Vec<usize> = (0..self.count(d)).collect();
            for &i in &marked[d] {
                let removed = self.stores[d]
                    .swap_remove_at(i)
                    .ok_or_else(|| MeshError::NotFound(format!("element {}", ElementId::new(d, i))))?;
                if d == 0 {
                    self.swap_remove_point(i);
                }
                let gone = original_at.swap_remove(i);
                remaps[d][gone] = None;
                if removed.moved_from.is_some() {
                    remaps[d][original_at[i]] = Some(i);
                }
                summary.removed[d] += 1;
            }

            let moved: Vec<(usize, usize)> = remaps[d]
                .iter()
                .enumerate()
                .filter_map(|(old, new)| new.filter(|&n| n != old).map(|n| (old, n)))
                .collect();
            if moved.is_empty() {
                continue;
            }
            for t in d + 1..=top {
                match &snapshot[d][t] {
                    Some(table) => {
                        summary.used_coboundary_cache = true;
                        for &(old, new) in &moved {
                            for &above in table.related(old) {
                                if let Some(pos) = remaps[t][above] {
                                    self.stores[t]
                                        .modify_at(pos, |e| e.replace_reference(d, old, new));
                                }
                            }
                        }
                    }
                    None => {
                        let remap = &remaps[d];
                        for pos in 0..self.stores[t].len() {
                            self.stores[t].modify_at(pos, |e| {
                                e.remap_layer(d, |i| remap.get(i).copied().flatten().unwrap_or(i))
                            });
                        }
                    }
                }
            }
        }

        self.regions.rewrite(|id| {
            remaps
                .get(id.dim())
                .and_then(|r| r.get(id.index()).copied().flatten())
                .map(|index| ElementId::new(id.dim(), index))
        });
        self.rebuild_dedup();
        self.counter.bump();
        log::debug!(
            "erased {} elements {:?} (coboundary cache used: {})",
            summary.total(),
            summary.removed,
            summary.used_coboundary_cache
        );
        crate::debug_invariants!(self.validate_invariants(), "mesh after erase");
        Ok(summary)
    }

    fn swap_remove_point(&mut self, index: usize) {
        let g = self.geometric_dimension;
        let last = self.points.len() / g - 1;
        if index != last {
            self.points
                .copy_within(last * g..(last + 1) * g, index * g);
        }
        self.points.truncate(last * g);
    }
}
