//! Hole points for piecewise linear complexes.
//!
//! A volumetric mesher fed with a set of closed boundary surfaces needs one
//! point inside every cavity so it can leave that region empty. This module
//! recovers those points from the boundary facets of a 3D mesh:
//!
//! 1. boundary facets are grouped into planar *patches* (flood fill through
//!    shared edges while the normal stays parallel to the seed's) and into
//!    connected *surfaces*;
//! 2. a ray from each patch along its normal is tested against every other
//!    surface; an odd crossing count makes that surface a parent;
//! 3. a surface whose patches have an odd number of parents is a hole, and
//!    gets one point between two of its facet centroids that is inside the
//!    surface but outside every surface nested directly within it.

use hashbrown::HashMap;

use crate::geometry::{
    add, cross, element_centroid, facet_loops, lift, midpoint, norm, scale, segment_crosses_facet, sub,
    unit_normal,
};
use crate::mesh::{Mesh, MeshConfig};
use crate::mesh_error::MeshError;

/// Fixed, axis-free direction for inside tests.
const SKEW: [f64; 3] = [1.0, 0.754_877_666_246_692_7, 0.569_840_290_998_053_2];

#[derive(Clone, Copy, Debug)]
pub struct HolePointOptions {
    /// Facets whose unit normals differ by at most this (cross product
    /// norm) belong to the same planar patch.
    pub parallel_tolerance: f64,
    /// Relative tolerance for segment/facet crossings.
    pub intersection_tolerance: f64,
}

impl Default for HolePointOptions {
    fn default() -> Self {
        Self {
            parallel_tolerance: 1e-6,
            intersection_tolerance: 1e-8,
        }
    }
}

struct Facet {
    centroid: [f64; 3],
    normal: [f64; 3],
    loops: Vec<Vec<[f64; 3]>>,
    patch: usize,
    surface: usize,
}

struct Boundary {
    facets: Vec<Facet>,
    /// First facet of every patch.
    patch_seed: Vec<usize>,
    patch_surface: Vec<usize>,
    surface_count: usize,
    size: f64,
    tolerance: f64,
}

impl Boundary {
    fn collect<C: MeshConfig>(mesh: &Mesh<C>, options: HolePointOptions) -> Result<Self, MeshError> {
        let mut ids = Vec::new();
        let mut slot = HashMap::new();
        for f in mesh.elements(2) {
            if mesh.is_boundary_facet(f)? {
                slot.insert(f.index(), ids.len());
                ids.push(f);
            }
        }

        let mut facets = Vec::with_capacity(ids.len());
        for &f in &ids {
            let loops = facet_loops(mesh, f)?;
            let normal = loops
                .first()
                .and_then(|outer| unit_normal(outer))
                .ok_or(MeshError::DegenerateElement { kind: mesh.kind(f)? })?;
            facets.push(Facet {
                centroid: element_centroid(mesh, f)?,
                normal,
                loops,
                patch: usize::MAX,
                surface: usize::MAX,
            });
        }

        let mut adjacency = Vec::with_capacity(ids.len());
        for &f in &ids {
            let near: Vec<usize> = mesh
                .neighbour_elements(f, 1)?
                .iter()
                .filter_map(|n| slot.get(&n.index()).copied())
                .collect();
            adjacency.push(near);
        }

        let mut patch_seed = Vec::new();
        for seed in 0..facets.len() {
            if facets[seed].patch != usize::MAX {
                continue;
            }
            let patch = patch_seed.len();
            patch_seed.push(seed);
            let seed_normal = facets[seed].normal;
            let mut stack = vec![seed];
            facets[seed].patch = patch;
            while let Some(k) = stack.pop() {
                for &n in &adjacency[k] {
                    let parallel = norm(cross(seed_normal, facets[n].normal)) <= options.parallel_tolerance;
                    if facets[n].patch == usize::MAX && parallel {
                        facets[n].patch = patch;
                        stack.push(n);
                    }
                }
            }
        }

        let mut surface_count = 0;
        for seed in 0..facets.len() {
            if facets[seed].surface != usize::MAX {
                continue;
            }
            let mut stack = vec![seed];
            facets[seed].surface = surface_count;
            while let Some(k) = stack.pop() {
                for &n in &adjacency[k] {
                    if facets[n].surface == usize::MAX {
                        facets[n].surface = surface_count;
                        stack.push(n);
                    }
                }
            }
            surface_count += 1;
        }
        let patch_surface = patch_seed.iter().map(|&s| facets[s].surface).collect();

        Ok(Self {
            facets,
            patch_seed,
            patch_surface,
            surface_count,
            size: mesh_size(mesh),
            tolerance: options.intersection_tolerance,
        })
    }

    fn crossings(&self, p: [f64; 3], q: [f64; 3], mut include: impl FnMut(usize) -> bool) -> usize {
        self.facets
            .iter()
            .enumerate()
            .filter(|&(k, f)| include(k) && segment_crosses_facet(p, q, &f.loops, self.tolerance))
            .count()
    }

    /// Surfaces crossed an odd number of times by the ray leaving `patch`.
    fn parents(&self, patch: usize) -> Vec<usize> {
        let seed = &self.facets[self.patch_seed[patch]];
        let own = self.patch_surface[patch];
        let end = add(seed.centroid, scale(seed.normal, self.size));
        let mut counts = vec![0usize; self.surface_count];
        for f in &self.facets {
            if f.surface != own && segment_crosses_facet(seed.centroid, end, &f.loops, self.tolerance) {
                counts[f.surface] += 1;
            }
        }
        (0..self.surface_count).filter(|&s| counts[s] % 2 == 1).collect()
    }

    fn inside(&self, surface: usize, x: [f64; 3]) -> bool {
        let dir = scale(SKEW, self.size / norm(SKEW));
        self.crossings(x, add(x, dir), |k| self.facets[k].surface == surface) % 2 == 1
    }
}

/// Diagonal of the bounding box of all points (at least 1).
fn mesh_size<C: MeshConfig>(mesh: &Mesh<C>) -> f64 {
    let g = mesh.geometric_dimension();
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in mesh.points().chunks_exact(g) {
        let p = lift(p);
        for i in 0..3 {
            lo[i] = lo[i].min(p[i]);
            hi[i] = hi[i].max(p[i]);
        }
    }
    let diagonal = norm(sub(hi, lo));
    if diagonal.is_finite() { diagonal.max(1.0) } else { 1.0 }
}

/// One interior point per hole surface of a 3D mesh's boundary.
///
/// Returns an empty list when the boundary encloses no hole. Fails with
/// [`MeshError::HolePointNotFound`] when a hole surface is recognised but
/// no point between two of its facet centroids passes the inside test.
pub fn extract_hole_points<C: MeshConfig>(
    mesh: &Mesh<C>,
    options: HolePointOptions,
) -> Result<Vec<Vec<f64>>, MeshError> {
    if mesh.geometric_dimension() != 3 {
        return Err(MeshError::InvalidDimension {
            dimension: mesh.geometric_dimension(),
            reason: "hole points need a three-dimensional mesh",
        });
    }
    if mesh.topologic_dimension() < 2 {
        return Ok(Vec::new());
    }
    let boundary = Boundary::collect(mesh, options)?;
    let parents: Vec<Vec<usize>> = (0..boundary.patch_seed.len()).map(|p| boundary.parents(p)).collect();

    // nesting of whole surfaces, read off their first patch
    let mut surface_parents = vec![Vec::new(); boundary.surface_count];
    let mut hole = vec![false; boundary.surface_count];
    for patch in (0..parents.len()).rev() {
        let s = boundary.patch_surface[patch];
        surface_parents[s] = parents[patch].clone();
        if parents[patch].len() % 2 == 1 {
            hole[s] = true;
        }
    }

    let mut points = Vec::new();
    for surface in (0..boundary.surface_count).filter(|&s| hole[s]) {
        let mut expected = surface_parents[surface].clone();
        expected.push(surface);
        expected.sort_unstable();
        let children: Vec<usize> = (0..boundary.surface_count)
            .filter(|&t| t != surface && surface_parents[t] == expected)
            .collect();

        let point = find_hole_point(&boundary, surface, &children)
            .ok_or(MeshError::HolePointNotFound { surface })?;
        log::trace!("hole surface {surface}: point {point:?}");
        points.push(point.to_vec());
    }

    log::debug!(
        "hole points: {} boundary facets, {} patches, {} surfaces, {} holes",
        boundary.facets.len(),
        boundary.patch_seed.len(),
        boundary.surface_count,
        points.len()
    );
    Ok(points)
}

fn find_hole_point(boundary: &Boundary, surface: usize, children: &[usize]) -> Option<[f64; 3]> {
    let facets = &boundary.facets;
    for (a, fa) in facets.iter().enumerate().filter(|(_, f)| f.surface == surface) {
        for (b, fb) in facets.iter().enumerate() {
            let partner = if fb.surface == surface {
                fb.patch != fa.patch
            } else {
                children.contains(&fb.surface)
            };
            if b == a || !partner {
                continue;
            }
            let blocked = boundary.crossings(fa.centroid, fb.centroid, |k| k != a && k != b) > 0;
            if blocked {
                continue;
            }
            let mid = lift(&midpoint(&fa.centroid, &fb.centroid));
            if boundary.inside(surface, mid) && !children.iter().any(|&c| boundary.inside(c, mid)) {
                return Some(mid);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::meshgen::{hexahedron_box, triangle_grid};

    fn box_with_cavity() -> Mesh {
        let mut mesh = hexahedron_box([3, 3, 3], [0.0; 3], [3.0; 3]).unwrap();
        let centre = mesh
            .elements(3)
            .find(|&c| {
                let x = element_centroid(&mesh, c).unwrap();
                x.iter().all(|v| (v - 1.5).abs() < 1e-9)
            })
            .unwrap();
        mesh.erase_element(centre).unwrap();
        mesh
    }

    #[test]
    fn solid_box_has_no_holes() {
        let mesh = hexahedron_box([2, 2, 2], [0.0; 3], [1.0; 3]).unwrap();
        let points = extract_hole_points(&mesh, HolePointOptions::default()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn cavity_gets_one_inner_point() {
        let mesh = box_with_cavity();
        let points = extract_hole_points(&mesh, HolePointOptions::default()).unwrap();
        assert_eq!(points.len(), 1);
        assert!(points[0].iter().all(|&x| x > 1.0 && x < 2.0), "{:?}", points[0]);
    }

    #[test]
    fn planar_meshes_are_rejected() {
        let mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2]).unwrap();
        let err = extract_hole_points(&mesh, HolePointOptions::default());
        assert!(matches!(err, Err(MeshError::InvalidDimension { dimension: 2, .. })));
    }
}
