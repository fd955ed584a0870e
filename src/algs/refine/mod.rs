//! Adaptive and uniform mesh refinement.
//!
//! Refinement reads an input mesh and writes the refined mesh into an
//! output mesh (which may use a different configuration). Edges are the
//! unit of refinement: every flagged edge gets one new vertex, shared by all
//! cells around it, and each cell is replaced by children chosen from its
//! flagged-edge pattern.
//!
//! | Cell | Adaptive | Uniform |
//! |---|---|---|
//! | line | split at the new vertex | same |
//! | triangle | 1 flag: 2 children; 2 flags: 3 (longer edge first); 3 flags: 4 | 4 |
//! | tetrahedron | longest-flagged-edge bisection (6 flags: 8 children) | 8 (octahedron template) |
//! | quadrilateral / hexahedron | not supported with flags | 4 / 8 |
//!
//! # Expected invariants
//! - `EdgeFlags` were created for the input mesh and not reused across a
//!   mutation of it.
//! - Refined children inherit all region memberships of their parent cell;
//!   vertices keep theirs. Elements that are neither cells nor on a cell's
//!   boundary are not carried over.

mod simplex;
mod tensor;

use hashbrown::HashMap;

use crate::geometry::{distance, midpoint};
use crate::mesh::{Mesh, MeshConfig, RegionId};
use crate::mesh_error::MeshError;
use crate::topology::element::ElementId;
use crate::topology::element_kind::ElementKind;

use simplex::{SplitEdge, SplitTable, bisect, edge_key, tetrahedron_subdivision, triangle_subdivision};
use tensor::{hexahedron_subdivision, quadrilateral_subdivision};

/// Mapping from input cells to the output cells replacing them.
pub type RefinementMap = Vec<(ElementId, Vec<ElementId>)>;

/// Per-edge refinement flags of one mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeFlags {
    flags: Vec<bool>,
}

impl EdgeFlags {
    /// No edge of `mesh` flagged.
    pub fn new<C: MeshConfig>(mesh: &Mesh<C>) -> Self {
        Self {
            flags: vec![false; mesh.count(1)],
        }
    }

    /// Every edge of `mesh` flagged.
    pub fn all<C: MeshConfig>(mesh: &Mesh<C>) -> Self {
        Self {
            flags: vec![true; mesh.count(1)],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn set(&mut self, edge: ElementId, flagged: bool) -> Result<(), MeshError> {
        let slot = self
            .flags
            .get_mut(edge.index())
            .filter(|_| edge.dim() == 1)
            .ok_or_else(|| MeshError::NotFound(format!("edge {edge}")))?;
        *slot = flagged;
        Ok(())
    }

    #[inline]
    pub fn is_set(&self, edge: ElementId) -> bool {
        edge.dim() == 1 && self.flags.get(edge.index()).copied().unwrap_or(false)
    }

    /// Number of flagged edges.
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// Flagged edges.
    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| ElementId::new(1, i))
    }

    fn check<C: MeshConfig>(&self, mesh: &Mesh<C>) -> Result<(), MeshError> {
        if self.flags.len() != mesh.count(1) {
            return Err(MeshError::InconsistentRefinement(format!(
                "{} edge flags for a mesh with {} edges",
                self.flags.len(),
                mesh.count(1)
            )));
        }
        Ok(())
    }
}

/// Per-cell refinement flags of one mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellFlags {
    dim: usize,
    flags: Vec<bool>,
}

impl CellFlags {
    /// No cell (element of the mesh's topological dimension) flagged.
    pub fn new<C: MeshConfig>(mesh: &Mesh<C>) -> Self {
        let dim = mesh.topologic_dimension();
        Self {
            dim,
            flags: vec![false; mesh.count(dim)],
        }
    }

    pub fn set(&mut self, cell: ElementId, flagged: bool) -> Result<(), MeshError> {
        if cell.dim() != self.dim {
            return Err(MeshError::InvalidDimension {
                dimension: cell.dim(),
                reason: "only cells can be flagged for refinement",
            });
        }
        let slot = self
            .flags
            .get_mut(cell.index())
            .ok_or_else(|| MeshError::NotFound(format!("cell {cell}")))?;
        *slot = flagged;
        Ok(())
    }

    #[inline]
    pub fn is_set(&self, cell: ElementId) -> bool {
        cell.dim() == self.dim && self.flags.get(cell.index()).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }
}

/// Options for adaptive refinement.
#[derive(Clone, Copy, Debug)]
pub struct RefineOptions {
    /// Close the flags under "a cell with a flagged edge also has its
    /// longest edge flagged" before refining.
    pub ensure_longest_edge: bool,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            ensure_longest_edge: true,
        }
    }
}

/// Edges of `cell` in reference order (a line is its own edge).
fn cell_edges<C: MeshConfig>(mesh: &Mesh<C>, cell: ElementId) -> Result<Vec<ElementId>, MeshError> {
    if cell.dim() == 1 {
        mesh.element(cell)?;
        return Ok(vec![cell]);
    }
    Ok(mesh.boundary_elements(cell, 1)?.collect())
}

fn edge_length<C: MeshConfig>(mesh: &Mesh<C>, edge: ElementId) -> Result<f64, MeshError> {
    crate::geometry::edge_length(mesh, edge)
}

/// Flag, for every cell with at least one flagged edge, its longest edge;
/// repeat until nothing changes. Returns the number of sweeps.
pub fn ensure_longest_edge_refinement<C: MeshConfig>(
    mesh: &Mesh<C>,
    flags: &mut EdgeFlags,
) -> Result<usize, MeshError> {
    flags.check(mesh)?;
    let top = mesh.topologic_dimension();
    if top < 2 {
        return Ok(0);
    }
    let mut cells = Vec::with_capacity(mesh.count(top));
    for cell in mesh.elements(top) {
        let edges = cell_edges(mesh, cell)?;
        let mut longest: Option<(ElementId, f64)> = None;
        for &e in &edges {
            let len = edge_length(mesh, e)?;
            if longest.is_none_or(|(_, best)| len > best) {
                longest = Some((e, len));
            }
        }
        if let Some((e, _)) = longest {
            cells.push((edges, e));
        }
    }

    let mut sweeps = 0;
    loop {
        sweeps += 1;
        let mut changed = false;
        for (edges, longest) in &cells {
            if !flags.is_set(*longest) && edges.iter().any(|&e| flags.is_set(e)) {
                flags.set(*longest, true)?;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    log::debug!("longest-edge closure: {} flagged after {sweeps} sweeps", flags.count());
    Ok(sweeps)
}

/// Flag every edge of every flagged cell.
pub fn cell_refinement_to_edge_refinement<C: MeshConfig>(
    mesh: &Mesh<C>,
    cells: &CellFlags,
    flags: &mut EdgeFlags,
) -> Result<(), MeshError> {
    flags.check(mesh)?;
    for cell in mesh.elements(cells.dim) {
        if cells.is_set(cell) {
            for e in cell_edges(mesh, cell)? {
                flags.set(e, true)?;
            }
        }
    }
    Ok(())
}

/// Refine `input` into `output` along the flagged edges.
pub fn refine<Ci: MeshConfig, Co: MeshConfig>(
    input: &Mesh<Ci>,
    output: &mut Mesh<Co>,
    flags: &EdgeFlags,
    options: RefineOptions,
) -> Result<RefinementMap, MeshError> {
    flags.check(input)?;
    let mut flags = flags.clone();
    if options.ensure_longest_edge {
        ensure_longest_edge_refinement(input, &mut flags)?;
    }
    let points = midpoints(input, &flags)?;
    Refiner::new(input, output, Mode::Adaptive)?.run(&points)
}

/// Refine the flagged cells (and whatever conformity requires).
pub fn refine_cells<Ci: MeshConfig, Co: MeshConfig>(
    input: &Mesh<Ci>,
    output: &mut Mesh<Co>,
    cells: &CellFlags,
    options: RefineOptions,
) -> Result<RefinementMap, MeshError> {
    let mut flags = EdgeFlags::new(input);
    cell_refinement_to_edge_refinement(input, cells, &mut flags)?;
    refine(input, output, &flags, options)
}

/// Refine every cell with its uniform template.
pub fn refine_uniformly<Ci: MeshConfig, Co: MeshConfig>(
    input: &Mesh<Ci>,
    output: &mut Mesh<Co>,
) -> Result<RefinementMap, MeshError> {
    let flags = EdgeFlags::all(input);
    let points = midpoints(input, &flags)?;
    Refiner::new(input, output, Mode::Uniform)?.run(&points)
}

/// Refine `mesh` and replace it with the result.
pub fn refine_in_place<C: MeshConfig>(
    mesh: &mut Mesh<C>,
    flags: &EdgeFlags,
    options: RefineOptions,
) -> Result<RefinementMap, MeshError> {
    let mut out = Mesh::<C>::configured(mesh.geometric_dimension());
    let map = refine(mesh, &mut out, flags, options)?;
    out.continue_counter_from(mesh.change_counter());
    *mesh = out;
    Ok(map)
}

/// Refine along flagged edges placing each new vertex at the given point
/// instead of the midpoint. `points[e]` must be `Some` for flagged edges.
pub(crate) fn refine_at_points<Ci: MeshConfig, Co: MeshConfig>(
    input: &Mesh<Ci>,
    output: &mut Mesh<Co>,
    points: &[Option<Vec<f64>>],
) -> Result<RefinementMap, MeshError> {
    Refiner::new(input, output, Mode::Adaptive)?.run(points)
}

fn midpoints<C: MeshConfig>(mesh: &Mesh<C>, flags: &EdgeFlags) -> Result<Vec<Option<Vec<f64>>>, MeshError> {
    let mut points = vec![None; mesh.count(1)];
    for edge in flags.iter() {
        let ends = mesh.vertices(edge)?;
        let (a, b) = match ends.as_slice() {
            &[a, b] => (a, b),
            _ => {
                return Err(MeshError::InvalidArity {
                    kind: ElementKind::Line,
                    found: ends.len(),
                });
            }
        };
        points[edge.index()] = Some(midpoint(mesh.point(a)?, mesh.point(b)?));
    }
    Ok(points)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Adaptive,
    Uniform,
}

struct Refiner<'a, Ci: MeshConfig, Co: MeshConfig> {
    input: &'a Mesh<Ci>,
    output: &'a mut Mesh<Co>,
    mode: Mode,
    vertex_map: Vec<ElementId>,
    edge_vertex: Vec<Option<ElementId>>,
    face_centre: HashMap<usize, ElementId>,
    regions: Vec<RegionId>,
}

impl<'a, Ci: MeshConfig, Co: MeshConfig> Refiner<'a, Ci, Co> {
    fn new(input: &'a Mesh<Ci>, output: &'a mut Mesh<Co>, mode: Mode) -> Result<Self, MeshError> {
        if input.geometric_dimension() != output.geometric_dimension() {
            return Err(MeshError::GeometricDimensionMismatch {
                input: input.geometric_dimension(),
                output: output.geometric_dimension(),
            });
        }
        let regions = input
            .regions()
            .iter()
            .map(|r| output.create_region(r.name()))
            .collect();
        Ok(Self {
            input,
            output,
            mode,
            vertex_map: Vec::with_capacity(input.count(0)),
            edge_vertex: vec![None; input.count(1)],
            face_centre: HashMap::new(),
            regions,
        })
    }

    fn run(mut self, points: &[Option<Vec<f64>>]) -> Result<RefinementMap, MeshError> {
        if points.len() != self.input.count(1) {
            return Err(MeshError::InconsistentRefinement(format!(
                "{} refinement points for {} edges",
                points.len(),
                self.input.count(1)
            )));
        }
        for v in self.input.elements(0) {
            let out = self.output.create_vertex(self.input.point(v)?)?;
            self.vertex_map.push(out);
            self.inherit_regions(v, out)?;
        }
        for (e, point) in points.iter().enumerate() {
            if let Some(p) = point {
                self.edge_vertex[e] = Some(self.output.create_vertex(p)?);
            }
        }

        let top = self.input.topologic_dimension();
        let mut map = RefinementMap::with_capacity(self.input.count(top));
        if top == 0 {
            return Ok(map);
        }
        for cell in self.input.elements(top) {
            let kind = self.input.kind(cell)?;
            let children = self.children(cell, kind)?;
            let mut ids = Vec::with_capacity(children.len());
            for corners in children {
                let child = self.output.create_element(kind, &corners)?;
                self.inherit_regions(cell, child)?;
                ids.push(child);
            }
            map.push((cell, ids));
        }
        log::debug!(
            "{:?} refinement: {} cells -> {} cells, {} new vertices",
            self.mode,
            self.input.count(top),
            self.output.count(top),
            self.edge_vertex.iter().flatten().count()
        );
        Ok(map)
    }

    fn inherit_regions(&mut self, from: ElementId, to: ElementId) -> Result<(), MeshError> {
        for region in self.input.element_regions(from) {
            if let Some(&target) = self.regions.get(region.get()) {
                self.output.add_to_region(target, to)?;
            }
        }
        Ok(())
    }

    fn refinement_vertex(&self, edge: ElementId) -> Result<Option<ElementId>, MeshError> {
        match self.edge_vertex.get(edge.index()) {
            Some(v) => Ok(*v),
            None => Err(MeshError::InconsistentRefinement(format!(
                "edge {edge} is not part of the input mesh"
            ))),
        }
    }

    fn required_vertex(&self, edge: ElementId) -> Result<ElementId, MeshError> {
        self.refinement_vertex(edge)?.ok_or_else(|| {
            MeshError::InconsistentRefinement(format!("edge {edge} has no refinement vertex"))
        })
    }

    /// Children of `cell` as output corner lists.
    fn children(&mut self, cell: ElementId, kind: ElementKind) -> Result<Vec<Vec<ElementId>>, MeshError> {
        let input = self.input;
        let corners: Vec<ElementId> = input
            .element(cell)?
            .vertices()
            .iter()
            .map(|&v| self.vertex_map[v])
            .collect();
        let edges = cell_edges(input, cell)?;
        let mut flagged = Vec::with_capacity(edges.len());
        for &e in &edges {
            flagged.push(self.refinement_vertex(e)?.is_some());
        }
        if !flagged.contains(&true) {
            return Ok(vec![corners]);
        }

        match (kind, self.mode) {
            (ElementKind::Triangle, _) if flagged.iter().all(|f| *f) => {
                let m = [
                    self.required_vertex(edges[0])?,
                    self.required_vertex(edges[1])?,
                    self.required_vertex(edges[2])?,
                ];
                let v = [corners[0], corners[1], corners[2]];
                Ok(triangle_subdivision(v, m).iter().map(|c| c.to_vec()).collect())
            }
            (ElementKind::Tetrahedron, Mode::Uniform) => {
                let mut m = [corners[0]; 6];
                for (slot, &e) in m.iter_mut().zip(&edges) {
                    *slot = self.required_vertex(e)?;
                }
                let v = [corners[0], corners[1], corners[2], corners[3]];
                Ok(tetrahedron_subdivision(v, m).iter().map(|c| c.to_vec()).collect())
            }
            (ElementKind::Line | ElementKind::Triangle | ElementKind::Tetrahedron, _) => {
                let splits = self.split_table(cell, kind, &corners, &edges)?;
                Ok(match kind {
                    ElementKind::Line => {
                        let mut out = Vec::new();
                        bisect([corners[0], corners[1]], &splits, &mut out);
                        out.iter().map(|c| c.to_vec()).collect()
                    }
                    ElementKind::Triangle => {
                        let mut out = Vec::new();
                        bisect([corners[0], corners[1], corners[2]], &splits, &mut out);
                        out.iter().map(|c| c.to_vec()).collect()
                    }
                    _ => {
                        let mut out = Vec::new();
                        bisect([corners[0], corners[1], corners[2], corners[3]], &splits, &mut out);
                        out.iter().map(|c| c.to_vec()).collect()
                    }
                })
            }
            (ElementKind::Quadrilateral, Mode::Uniform) => {
                let mut m = [corners[0]; 4];
                for (slot, &e) in m.iter_mut().zip(&edges) {
                    *slot = self.required_vertex(e)?;
                }
                let centre = self.centre_of(cell)?;
                let v = [corners[0], corners[1], corners[2], corners[3]];
                Ok(quadrilateral_subdivision(v, m, centre)
                    .iter()
                    .map(|c| c.to_vec())
                    .collect())
            }
            (ElementKind::Hexahedron, Mode::Uniform) => {
                let mut m = [corners[0]; 12];
                for (slot, &e) in m.iter_mut().zip(&edges) {
                    *slot = self.required_vertex(e)?;
                }
                let faces: Vec<ElementId> = input.boundary_elements(cell, 2)?.collect();
                let mut f = [corners[0]; 6];
                for (slot, &face) in f.iter_mut().zip(&faces) {
                    *slot = self.face_centre_of(face)?;
                }
                let centre = self.centre_of(cell)?;
                let v: [ElementId; 8] = core::array::from_fn(|i| corners[i]);
                Ok(hexahedron_subdivision(v, m, f, centre)
                    .iter()
                    .map(|c| c.to_vec())
                    .collect())
            }
            _ => Err(MeshError::UnsupportedRefinement(kind)),
        }
    }

    fn split_table(
        &self,
        cell: ElementId,
        kind: ElementKind,
        corners: &[ElementId],
        edges: &[ElementId],
    ) -> Result<SplitTable, MeshError> {
        let input = self.input;
        let local = input.element(cell)?.vertices();
        let slots = if kind == ElementKind::Line {
            vec![[0, 1]]
        } else {
            kind.edge_slots(local.len())
        };
        let mut table = SplitTable::new();
        for (&[i, j], &edge) in slots.iter().zip(edges) {
            let Some(mid) = self.refinement_vertex(edge)? else {
                continue;
            };
            let (a, b) = (local[i], local[j]);
            let length = distance(
                input.point(ElementId::vertex(a))?,
                input.point(ElementId::vertex(b))?,
            );
            table.insert(
                edge_key(corners[i], corners[j]),
                SplitEdge {
                    midpoint: mid,
                    length,
                    tie: (a.min(b), a.max(b)),
                },
            );
        }
        Ok(table)
    }

    /// New vertex at the vertex centroid of input element `id`.
    fn centre_of(&mut self, id: ElementId) -> Result<ElementId, MeshError> {
        let g = self.input.geometric_dimension();
        let vertices = self.input.vertices(id)?;
        let mut centre = vec![0.0; g];
        for &v in &vertices {
            for (c, x) in centre.iter_mut().zip(self.input.point(v)?) {
                *c += x / vertices.len() as f64;
            }
        }
        self.output.create_vertex(&centre)
    }

    fn face_centre_of(&mut self, face: ElementId) -> Result<ElementId, MeshError> {
        if let Some(&v) = self.face_centre.get(&face.index()) {
            return Ok(v);
        }
        let v = self.centre_of(face)?;
        self.face_centre.insert(face.index(), v);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::meshgen::{quad_grid, triangle_grid};
    use crate::geometry::element_volume;

    fn total_area(mesh: &Mesh) -> f64 {
        mesh.elements(2).map(|c| element_volume(mesh, c).unwrap()).sum()
    }

    #[test]
    fn no_flags_copies_the_mesh() {
        let mesh = triangle_grid(2, 2, [0.0; 2], [1.0; 2]).unwrap();
        let mut out = Mesh::new(2);
        let map = refine(&mesh, &mut out, &EdgeFlags::new(&mesh), RefineOptions::default()).unwrap();
        assert_eq!(out.count(2), 8);
        assert_eq!(out.count(0), 9);
        assert!(map.iter().all(|(_, children)| children.len() == 1));
    }

    #[test]
    fn one_flag_splits_both_neighbours() {
        let mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2]).unwrap();
        // the diagonal is the only edge shared by both triangles
        let diagonal = mesh
            .elements(1)
            .find(|&e| mesh.coboundary_elements(e, 2).unwrap().len() == 2)
            .unwrap();
        let mut flags = EdgeFlags::new(&mesh);
        flags.set(diagonal, true).unwrap();
        let mut out = Mesh::new(2);
        refine(&mesh, &mut out, &flags, RefineOptions::default()).unwrap();
        assert_eq!(out.count(2), 4);
        assert_eq!(out.count(0), 5);
        assert!((total_area(&out) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_quads_share_edge_midpoints() {
        let mesh = quad_grid(2, 1, [0.0; 2], [2.0, 1.0]).unwrap();
        let mut out = Mesh::new(2);
        refine_uniformly(&mesh, &mut out).unwrap();
        assert_eq!(out.count(2), 8);
        // 6 corners + 7 edge midpoints + 2 centres
        assert_eq!(out.count(0), 15);
        assert!((total_area(&out) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn flagged_quads_are_rejected() {
        let mesh = quad_grid(1, 1, [0.0; 2], [1.0; 2]).unwrap();
        let mut out = Mesh::new(2);
        let err = refine(&mesh, &mut out, &EdgeFlags::all(&mesh), RefineOptions::default());
        assert_eq!(err, Err(MeshError::UnsupportedRefinement(ElementKind::Quadrilateral)));
    }

    #[test]
    fn stale_flags_are_inconsistent() {
        let mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2]).unwrap();
        let bigger = triangle_grid(2, 1, [0.0; 2], [1.0; 2]).unwrap();
        let mut out = Mesh::new(2);
        let err = refine(&mesh, &mut out, &EdgeFlags::all(&bigger), RefineOptions::default());
        assert!(matches!(err, Err(MeshError::InconsistentRefinement(_))));
    }

    #[test]
    fn cell_flags_refine_their_cell() {
        let mesh = triangle_grid(2, 2, [0.0; 2], [1.0; 2]).unwrap();
        let mut cells = CellFlags::new(&mesh);
        cells.set(ElementId::new(2, 0), true).unwrap();
        let mut out = Mesh::new(2);
        let map = refine_cells(&mesh, &mut out, &cells, RefineOptions::default()).unwrap();
        assert_eq!(map[0].1.len(), 4);
        assert!((total_area(&out) - 1.0).abs() < 1e-12);
    }
}
