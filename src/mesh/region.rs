//! Named regions: unique-set views of element ids.
//!
//! A region never owns elements. Erasure rewrites region views so they keep
//! naming the same elements after local indices are compacted, and drops
//! members that were erased.

use serde::{Deserialize, Serialize};

use crate::container::{UniqueSetBacking, View};
use crate::mesh_error::MeshError;
use crate::topology::element::ElementId;

/// Identifier of a region within one mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub(crate) usize);

impl RegionId {
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Membership view of a region.
pub type RegionView = View<ElementId, UniqueSetBacking<ElementId>>;

/// A named subset of the mesh.
#[derive(Clone, Debug)]
pub struct Region {
    id: RegionId,
    name: String,
    members: RegionView,
}

impl Region {
    #[inline]
    pub fn id(&self) -> RegionId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn members(&self) -> &RegionView {
        &self.members
    }

    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        self.members.contains(&id)
    }

    /// Members of topological dimension `dim`, in insertion order.
    pub fn elements(&self, dim: usize) -> impl Iterator<Item = ElementId> + '_ {
        self.members.iter().filter(move |id| id.dim() == dim)
    }
}

/// All regions of a mesh, addressed by [`RegionId`] or name.
#[derive(Clone, Debug, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
}

impl RegionRegistry {
    /// Region named `name`, created empty when it does not exist yet.
    pub fn get_or_create(&mut self, name: &str) -> RegionId {
        if let Some(id) = self.by_name(name) {
            return id;
        }
        let id = RegionId(self.regions.len());
        self.regions.push(Region {
            id,
            name: name.to_owned(),
            members: RegionView::new(),
        });
        id
    }

    pub fn by_name(&self, name: &str) -> Option<RegionId> {
        self.regions.iter().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn get(&self, id: RegionId) -> Result<&Region, MeshError> {
        self.regions.get(id.0).ok_or(MeshError::UnknownRegion(id))
    }

    pub(crate) fn members_mut(&mut self, id: RegionId) -> Result<&mut RegionView, MeshError> {
        self.regions
            .get_mut(id.0)
            .map(|r| &mut r.members)
            .ok_or(MeshError::UnknownRegion(id))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter()
    }

    /// Regions that contain `id`.
    pub fn containing(&self, id: ElementId) -> impl Iterator<Item = RegionId> + '_ {
        self.regions
            .iter()
            .filter(move |r| r.contains(id))
            .map(|r| r.id)
    }

    /// Map every member of every region through `f`, dropping `None`s.
    pub(crate) fn rewrite(&mut self, mut f: impl FnMut(ElementId) -> Option<ElementId>) {
        for region in &mut self.regions {
            region.members.rewrite(&mut f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut reg = RegionRegistry::default();
        let a = reg.get_or_create("wall");
        let b = reg.get_or_create("fluid");
        assert_ne!(a, b);
        assert_eq!(reg.get_or_create("wall"), a);
        assert_eq!(reg.by_name("fluid"), Some(b));
        assert!(matches!(reg.get(RegionId(9)), Err(MeshError::UnknownRegion(_))));
    }

    #[test]
    fn rewrite_drops_and_renames_members() {
        let mut reg = RegionRegistry::default();
        let r = reg.get_or_create("r");
        {
            let m = reg.members_mut(r).unwrap();
            m.insert_handle(ElementId::new(2, 0));
            m.insert_handle(ElementId::new(2, 5));
        }
        reg.rewrite(|id| (id.index() != 0).then(|| ElementId::new(id.dim(), 0)));
        let members: Vec<_> = reg.get(r).unwrap().elements(2).collect();
        assert_eq!(members, vec![ElementId::new(2, 0)]);
    }
}
