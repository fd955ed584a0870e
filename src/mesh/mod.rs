//! The element store: one container per topological dimension, the point
//! buffer, boundary relations, regions and derived-relation cache.
//!
//! # Invariants
//! - Local indices of each dimension are dense: `0..count(dim)`.
//! - Vertex `i` owns coordinates `points[i * g .. (i + 1) * g]`.
//! - Every element of dimension `d` stores, for each `b < d`, the local
//!   indices of its dimension-`b` boundary elements in reference order,
//!   each with an orientation permutation.
//! - At most one element exists per kind and vertex set; creating it again
//!   returns the existing element.
//! - [`Mesh::change_counter`] grows on every structural mutation.

pub mod config;
pub mod erase;
pub mod invariants;
pub mod region;
pub mod relations;

use hashbrown::HashMap;

use crate::mesh_error::MeshError;
use crate::topology::cache::{ChangeCounter, InvalidateCache};
use crate::topology::element::{Element, ElementId};
use crate::topology::element_kind::{ElementKind, MAX_DIMENSION};
use crate::topology::orientation::Permutation;

pub use config::{
    DefaultConfig, DequeConfig, ElementHandle, ElementStore, ListConfig, MeshConfig, MeshHandle,
    StableConfig, UniqueConfig,
};
pub use erase::{EraseSummary, EraseView};
pub use region::{Region, RegionId, RegionRegistry, RegionView};
pub use relations::RelationView;

use relations::RelationCache;

type DedupKey = (ElementKind, Vec<usize>);

/// Unstructured mesh of vertices, lines, faces and cells.
pub struct Mesh<C: MeshConfig = DefaultConfig> {
    geometric_dimension: usize,
    stores: [ElementStore<C>; MAX_DIMENSION + 1],
    points: Vec<f64>,
    dedup: HashMap<DedupKey, usize>,
    regions: RegionRegistry,
    counter: ChangeCounter,
    next_serial: u64,
    relations: RelationCache,
}

impl<C: MeshConfig> Clone for Mesh<C> {
    /// Clones the topology; derived relation tables are rebuilt on demand.
    fn clone(&self) -> Self {
        Self {
            geometric_dimension: self.geometric_dimension,
            stores: self.stores.clone(),
            points: self.points.clone(),
            dedup: self.dedup.clone(),
            regions: self.regions.clone(),
            counter: self.counter,
            next_serial: self.next_serial,
            relations: RelationCache::default(),
        }
    }
}

impl<C: MeshConfig> core::fmt::Debug for Mesh<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let counts: Vec<usize> = (0..=MAX_DIMENSION).map(|d| self.count(d)).collect();
        f.debug_struct("Mesh")
            .field("geometric_dimension", &self.geometric_dimension)
            .field("counts", &counts)
            .field("regions", &self.regions.len())
            .field("change_counter", &self.counter.get())
            .finish()
    }
}

impl Mesh {
    /// Empty mesh with the default configuration, embedded in
    /// `geometric_dimension`-space.
    pub fn new(geometric_dimension: usize) -> Self {
        Self::configured(geometric_dimension)
    }
}

impl<C: MeshConfig> Mesh<C> {
    /// Empty mesh with configuration `C`.
    pub fn configured(geometric_dimension: usize) -> Self {
        debug_assert!(geometric_dimension > 0, "points need at least one coordinate");
        Self {
            geometric_dimension: geometric_dimension.max(1),
            stores: Default::default(),
            points: Vec::new(),
            dedup: HashMap::new(),
            regions: RegionRegistry::default(),
            counter: ChangeCounter::default(),
            next_serial: 0,
            relations: RelationCache::default(),
        }
    }

    #[inline]
    pub fn geometric_dimension(&self) -> usize {
        self.geometric_dimension
    }

    /// Highest dimension holding at least one element (0 for an empty mesh).
    pub fn topologic_dimension(&self) -> usize {
        (0..=MAX_DIMENSION)
            .rev()
            .find(|&d| self.count(d) > 0)
            .unwrap_or(0)
    }

    /// Number of elements of dimension `dim`.
    #[inline]
    pub fn count(&self, dim: usize) -> usize {
        self.stores.get(dim).map_or(0, |s| s.len())
    }

    #[inline]
    pub fn change_counter(&self) -> u64 {
        self.counter.get()
    }

    /// Used when this mesh replaces one whose counter reached `previous`.
    pub(crate) fn continue_counter_from(&mut self, previous: u64) {
        self.counter.advance_past(previous);
        self.relations.clear();
    }

    /// Ids of all elements of dimension `dim`, in local-index order.
    pub fn elements(&self, dim: usize) -> impl Iterator<Item = ElementId> + '_ {
        self.stores
            .get(dim)
            .into_iter()
            .flat_map(move |s| (0..s.len()).map(move |i| ElementId::new(dim, i)))
    }

    /// Whether `id` names a live element.
    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        id.index() < self.count(id.dim())
    }

    /// Stored record of `id`.
    pub fn element(&self, id: ElementId) -> Result<&Element, MeshError> {
        self.stores
            .get(id.dim())
            .and_then(|s| s.at(id.index()))
            .ok_or_else(|| MeshError::NotFound(format!("element {id}")))
    }

    pub fn kind(&self, id: ElementId) -> Result<ElementKind, MeshError> {
        self.element(id).map(Element::kind)
    }

    /// Store of dimension `dim`.
    pub fn store(&self, dim: usize) -> Result<&ElementStore<C>, MeshError> {
        self.stores.get(dim).ok_or(MeshError::InvalidDimension {
            dimension: dim,
            reason: "beyond the largest supported dimension",
        })
    }

    // ---- handles -----------------------------------------------------------

    /// Configured policy handle for `id`.
    pub fn handle(&self, id: ElementId) -> Result<MeshHandle<C>, MeshError> {
        let raw = self
            .stores
            .get(id.dim())
            .and_then(|s| s.handle_at(id.index()))
            .ok_or_else(|| MeshError::NotFound(format!("element {id}")))?;
        Ok(ElementHandle {
            dim: id.dim() as u8,
            raw,
        })
    }

    /// Current id of the element behind `handle`.
    pub fn resolve(&self, handle: MeshHandle<C>) -> Result<ElementId, MeshError> {
        let store = self.store(handle.dim())?;
        let index = store.position(handle.raw)?;
        Ok(ElementId::new(handle.dim(), index))
    }

    // ---- creation ----------------------------------------------------------

    /// Add a vertex at `point`.
    pub fn create_vertex(&mut self, point: &[f64]) -> Result<ElementId, MeshError> {
        if point.len() != self.geometric_dimension {
            return Err(MeshError::PointDimensionMismatch {
                expected: self.geometric_dimension,
                found: point.len(),
            });
        }
        let element = Element::new(ElementKind::Vertex, self.take_serial());
        self.stores[0].insert(element);
        self.points.extend_from_slice(point);
        self.counter.bump();
        Ok(ElementId::vertex(self.count(0) - 1))
    }

    /// Create (or find) the element of `kind` spanned by `vertices`, together
    /// with every missing boundary element.
    pub fn create_element(
        &mut self,
        kind: ElementKind,
        vertices: &[ElementId],
    ) -> Result<ElementId, MeshError> {
        self.insert_element(kind, vertices).map(|(id, _)| id)
    }

    /// Like [`create_element`](Self::create_element), also reporting whether
    /// the element was new.
    pub fn insert_element(
        &mut self,
        kind: ElementKind,
        vertices: &[ElementId],
    ) -> Result<(ElementId, bool), MeshError> {
        if kind == ElementKind::Vertex {
            return Err(MeshError::InvalidDimension {
                dimension: 0,
                reason: "vertices are created with create_vertex",
            });
        }
        if !kind.accepts_vertex_count(vertices.len()) {
            return Err(MeshError::InvalidArity {
                kind,
                found: vertices.len(),
            });
        }
        let indices = self.vertex_indices(vertices)?;
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(MeshError::DegenerateElement { kind });
        }
        let (index, inserted) = self.ensure_element(kind, &indices);
        Ok((ElementId::new(kind.dimension(), index), inserted))
    }

    /// Create a PLC facet bounded by `lines`, with optional facet hole
    /// points. The lines must form closed loops.
    pub fn create_plc(
        &mut self,
        lines: &[ElementId],
        hole_points: &[&[f64]],
    ) -> Result<ElementId, MeshError> {
        let kind = ElementKind::Plc;
        let mut line_indices = Vec::with_capacity(lines.len());
        for &line in lines {
            if line.dim() != 1 {
                return Err(MeshError::InvalidDimension {
                    dimension: line.dim(),
                    reason: "PLC boundaries are made of lines",
                });
            }
            self.element(line)?;
            line_indices.push(line.index());
        }
        line_indices.sort_unstable();
        line_indices.dedup();

        // vertex order follows the chained loops
        let segments = line_indices
            .iter()
            .map(|&l| match self.stores[1].at(l).map(Element::vertices) {
                Some(&[a, b]) => Ok([a, b]),
                _ => Err(MeshError::NotFound(format!("line {}", ElementId::new(1, l)))),
            })
            .collect::<Result<Vec<[usize; 2]>, _>>()?;
        let mut degree: HashMap<usize, usize> = HashMap::new();
        for s in &segments {
            *degree.entry(s[0]).or_default() += 1;
            *degree.entry(s[1]).or_default() += 1;
        }
        if degree.len() < 3 {
            return Err(MeshError::InvalidArity {
                kind,
                found: degree.len(),
            });
        }
        if degree.values().any(|d| d % 2 == 1) {
            return Err(MeshError::DegenerateElement { kind });
        }
        // every degree is even, so each walk closes on its first vertex
        let walks = crate::geometry::chain_segments(&segments);
        let vertices: Vec<usize> = walks
            .iter()
            .flatten()
            .map(|&(_, [from, _])| from)
            .collect();

        let mut holes = Vec::with_capacity(hole_points.len() * self.geometric_dimension);
        for p in hole_points {
            if p.len() != self.geometric_dimension {
                return Err(MeshError::PointDimensionMismatch {
                    expected: self.geometric_dimension,
                    found: p.len(),
                });
            }
            holes.extend_from_slice(p);
        }

        let mut key = vertices.clone();
        key.sort_unstable();
        if let Some(&existing) = self.dedup.get(&(kind, key.clone())) {
            return Ok(ElementId::new(2, existing));
        }
        let mut element = Element::new(kind, self.take_serial());
        for &v in &vertices {
            element.layer_mut(0).push(v, Permutation::identity(1));
        }
        // lines in loop order, oriented relative to the walking direction
        for &(s, walked) in walks.iter().flatten() {
            let orientation =
                Permutation::between(&segments[s], &walked).unwrap_or_else(|| Permutation::identity(2));
            element.layer_mut(1).push(line_indices[s], orientation);
        }
        element.set_hole_points(holes);
        let index = self.push_element(2, element);
        self.dedup.insert((kind, key), index);
        Ok(ElementId::new(2, index))
    }

    fn take_serial(&mut self) -> u64 {
        let s = self.next_serial;
        self.next_serial += 1;
        s
    }

    fn vertex_indices(&self, vertices: &[ElementId]) -> Result<Vec<usize>, MeshError> {
        vertices
            .iter()
            .map(|&v| {
                if v.dim() != 0 {
                    Err(MeshError::InvalidDimension {
                        dimension: v.dim(),
                        reason: "element corners must be vertices",
                    })
                } else if v.index() >= self.count(0) {
                    Err(MeshError::NotFound(format!("vertex {v}")))
                } else {
                    Ok(v.index())
                }
            })
            .collect()
    }

    /// Find or create `kind` over already validated vertex indices.
    fn ensure_element(&mut self, kind: ElementKind, vertices: &[usize]) -> (usize, bool) {
        let mut key = vertices.to_vec();
        key.sort_unstable();
        if let Some(&existing) = self.dedup.get(&(kind, key.clone())) {
            return (existing, false);
        }

        let dim = kind.dimension();
        let mut element = Element::new(kind, self.take_serial());
        for &v in vertices {
            element.layer_mut(0).push(v, Permutation::identity(1));
        }
        for sub_dim in 1..dim {
            let Some(sub_kind) = kind.boundary_kind(sub_dim) else {
                continue;
            };
            for slot in kind.boundary_slots(vertices.len(), sub_dim) {
                let expected: Vec<usize> = slot.iter().map(|&i| vertices[i]).collect();
                let (sub, _) = self.ensure_element(sub_kind, &expected);
                let orientation = self.stores[sub_dim]
                    .at(sub)
                    .and_then(|e| Permutation::between(e.vertices(), &expected))
                    .unwrap_or_else(|| Permutation::identity(expected.len()));
                element.layer_mut(sub_dim).push(sub, orientation);
            }
        }
        let index = self.push_element(dim, element);
        self.dedup.insert((kind, key), index);
        (index, true)
    }

    fn push_element(&mut self, dim: usize, element: Element) -> usize {
        let store = &mut self.stores[dim];
        let (handle, inserted) = store.insert(element);
        self.counter.bump();
        if inserted {
            store.len() - 1
        } else {
            store.position(handle).unwrap_or(store.len() - 1)
        }
    }

    // ---- boundary relation table -----------------------------------------

    /// Boundary elements of `id` in dimension `dim`, in reference order.
    pub fn boundary_elements(
        &self,
        id: ElementId,
        dim: usize,
    ) -> Result<impl Iterator<Item = ElementId> + '_, MeshError> {
        let element = self.element(id)?;
        if dim >= id.dim() {
            return Err(MeshError::InvalidDimension {
                dimension: dim,
                reason: "boundary dimension must be below the element's",
            });
        }
        Ok(element
            .boundary(dim)
            .iter()
            .map(move |&i| ElementId::new(dim, i)))
    }

    /// Orientation of each boundary element of `id` in dimension `dim`.
    pub fn boundary_orientation(&self, id: ElementId, dim: usize) -> Result<&[Permutation], MeshError> {
        let element = self.element(id)?;
        if dim >= id.dim() {
            return Err(MeshError::InvalidDimension {
                dimension: dim,
                reason: "boundary dimension must be below the element's",
            });
        }
        Ok(element.orientations(dim))
    }

    /// Vertex ids of `id` in intrinsic order (`[id]` for a vertex).
    pub fn vertices(&self, id: ElementId) -> Result<Vec<ElementId>, MeshError> {
        let element = self.element(id)?;
        if id.dim() == 0 {
            return Ok(vec![id]);
        }
        Ok(element.vertices().iter().map(|&i| ElementId::vertex(i)).collect())
    }

    // ---- geometry ----------------------------------------------------------

    /// Coordinates of vertex `id`.
    pub fn point(&self, id: ElementId) -> Result<&[f64], MeshError> {
        if id.dim() != 0 || id.index() >= self.count(0) {
            return Err(MeshError::NotFound(format!("vertex {id}")));
        }
        let g = self.geometric_dimension;
        Ok(&self.points[id.index() * g..(id.index() + 1) * g])
    }

    /// Move vertex `id` to `point`. Topology is unchanged.
    pub fn set_point(&mut self, id: ElementId, point: &[f64]) -> Result<(), MeshError> {
        let g = self.geometric_dimension;
        if point.len() != g {
            return Err(MeshError::PointDimensionMismatch {
                expected: g,
                found: point.len(),
            });
        }
        if id.dim() != 0 || id.index() >= self.count(0) {
            return Err(MeshError::NotFound(format!("vertex {id}")));
        }
        self.points[id.index() * g..(id.index() + 1) * g].copy_from_slice(point);
        Ok(())
    }

    /// Flat coordinate buffer, vertex-major.
    #[inline]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Hole points attached to a PLC facet.
    pub fn plc_hole_points(&self, id: ElementId) -> Result<Vec<&[f64]>, MeshError> {
        let element = self.element(id)?;
        Ok(element
            .hole_points()
            .chunks(self.geometric_dimension)
            .collect())
    }

    // ---- regions -----------------------------------------------------------

    #[inline]
    pub fn regions(&self) -> &RegionRegistry {
        &self.regions
    }

    /// Region named `name`, created when missing.
    pub fn create_region(&mut self, name: &str) -> RegionId {
        self.regions.get_or_create(name)
    }

    /// Add `id` and its whole boundary closure to `region`. Returns whether
    /// `id` itself was new to the region.
    pub fn add_to_region(&mut self, region: RegionId, id: ElementId) -> Result<bool, MeshError> {
        let element = self.element(id)?;
        let closure: Vec<ElementId> = (0..id.dim())
            .flat_map(|d| {
                element
                    .boundary(d)
                    .iter()
                    .map(move |&i| ElementId::new(d, i))
            })
            .collect();
        let members = self.regions.members_mut(region)?;
        let added = members.insert_handle(id);
        for b in closure {
            members.insert_handle(b);
        }
        Ok(added)
    }

    /// Remove `id` (only `id`, not its boundary) from `region`.
    pub fn remove_from_region(&mut self, region: RegionId, id: ElementId) -> Result<bool, MeshError> {
        Ok(self.regions.members_mut(region)?.remove_handle(&id))
    }

    pub fn is_in_region(&self, region: RegionId, id: ElementId) -> Result<bool, MeshError> {
        Ok(self.regions.get(region)?.contains(id))
    }

    /// Members of `region` with dimension `dim`.
    pub fn region_elements(&self, region: RegionId, dim: usize) -> Result<Vec<ElementId>, MeshError> {
        Ok(self.regions.get(region)?.elements(dim).collect())
    }

    /// Regions containing `id`.
    pub fn element_regions(&self, id: ElementId) -> Vec<RegionId> {
        self.regions.containing(id).collect()
    }

    pub(crate) fn rebuild_dedup(&mut self) {
        self.dedup.clear();
        for dim in 1..=MAX_DIMENSION {
            for (pos, element) in self.stores[dim].values().enumerate() {
                self.dedup
                    .insert((element.kind(), element.vertex_key()), pos);
            }
        }
    }
}

impl<C: MeshConfig> InvalidateCache for Mesh<C> {
    fn invalidate_cache(&mut self) {
        self.relations.clear();
    }
}
