//! Refinement along a cutting hyperplane.
//!
//! Every edge whose endpoints lie strictly on opposite sides of the plane
//! gets a new vertex at the intersection point, and cells are refined
//! adaptively around those vertices. No longest-edge closure is applied, so
//! afterwards no output cell crosses the plane.

use crate::algs::refine::{EdgeFlags, RefinementMap, refine_at_points};
use crate::geometry::distance;
use crate::mesh::{Mesh, MeshConfig};
use crate::mesh_error::MeshError;
use crate::topology::element::ElementId;

#[derive(Clone, Copy, Debug)]
pub struct HyperplaneOptions {
    /// Endpoints closer to the plane than this fraction of the edge length
    /// count as lying on it.
    pub relative_tolerance: f64,
}

impl Default for HyperplaneOptions {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-8,
        }
    }
}

/// Edges crossing a hyperplane and their intersection points.
#[derive(Clone, Debug)]
pub struct HyperplaneCut {
    pub flags: EdgeFlags,
    points: Vec<Option<Vec<f64>>>,
}

impl HyperplaneCut {
    /// Intersection point of a flagged edge.
    pub fn point(&self, edge: ElementId) -> Option<&[f64]> {
        if edge.dim() != 1 {
            return None;
        }
        self.points.get(edge.index())?.as_deref()
    }
}

fn signed_distance(p: &[f64], point: &[f64], normal: &[f64]) -> f64 {
    p.iter()
        .zip(point)
        .zip(normal)
        .map(|((x, x0), n)| n * (x - x0))
        .sum()
}

fn check_dimension(expected: usize, found: &[f64]) -> Result<(), MeshError> {
    if found.len() != expected {
        return Err(MeshError::PointDimensionMismatch {
            expected,
            found: found.len(),
        });
    }
    Ok(())
}

/// Flag the edges of `mesh` crossing the plane through `point` with
/// normal `normal`.
pub fn mark_edges_for_hyperplane_refine<C: MeshConfig>(
    mesh: &Mesh<C>,
    point: &[f64],
    normal: &[f64],
    options: HyperplaneOptions,
) -> Result<HyperplaneCut, MeshError> {
    let g = mesh.geometric_dimension();
    check_dimension(g, point)?;
    check_dimension(g, normal)?;

    let mut flags = EdgeFlags::new(mesh);
    let mut points = vec![None; mesh.count(1)];
    for edge in mesh.elements(1) {
        let ends = mesh.vertices(edge)?;
        let (p0, p1) = match ends.as_slice() {
            &[a, b] => (mesh.point(a)?, mesh.point(b)?),
            _ => continue,
        };
        let qd = signed_distance(p0, point, normal);
        let pd = signed_distance(p1, point, normal);
        let tolerance = options.relative_tolerance * distance(p0, p1);
        if qd.min(pd) < -tolerance && qd.max(pd) > tolerance {
            let t = pd / (pd - qd);
            let cut = p1.iter().zip(p0).map(|(b, a)| b - t * (b - a)).collect();
            flags.set(edge, true)?;
            points[edge.index()] = Some(cut);
            log::trace!("edge {edge} crosses the hyperplane");
        }
    }
    Ok(HyperplaneCut { flags, points })
}

/// Refine `input` into `output` so that no output cell crosses the plane.
pub fn hyperplane_refine<Ci: MeshConfig, Co: MeshConfig>(
    input: &Mesh<Ci>,
    output: &mut Mesh<Co>,
    point: &[f64],
    normal: &[f64],
    options: HyperplaneOptions,
) -> Result<RefinementMap, MeshError> {
    let cut = mark_edges_for_hyperplane_refine(input, point, normal, options)?;
    log::debug!("hyperplane cuts {} edges", cut.flags.count());
    refine_at_points(input, output, &cut.points)
}
