//! Geometry helpers: vector arithmetic, element measures, normals and
//! segment/facet intersection.
//!
//! Points of any mesh are lifted to 3D (missing coordinates are zero), so
//! the same routines serve line, planar and volume meshes. Everything here
//! only reads the mesh.

use hashbrown::HashMap;

use crate::mesh::{Mesh, MeshConfig};
use crate::mesh_error::MeshError;
use crate::topology::element::{Element, ElementId};
use crate::topology::element_kind::ElementKind;

const EPS: f64 = 1e-12;

/// Pad or truncate `p` to three coordinates.
pub fn lift(p: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, v) in out.iter_mut().zip(p) {
        *o = *v;
    }
    out
}

#[inline]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Euclidean distance between two points of equal dimension.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

pub fn midpoint(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| 0.5 * (x + y)).collect()
}

/// Vertex average.
pub fn centroid(points: &[[f64; 3]]) -> [f64; 3] {
    if points.is_empty() {
        return [0.0; 3];
    }
    let sum = points.iter().fold([0.0; 3], |acc, p| add(acc, *p));
    scale(sum, 1.0 / points.len() as f64)
}

/// Area vector of a closed polygon (Newell's method); its length is twice
/// the polygon area.
pub fn newell_normal(polygon: &[[f64; 3]]) -> [f64; 3] {
    let mut n = [0.0; 3];
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    n
}

/// Unit normal of a planar polygon, `None` when degenerate.
pub fn unit_normal(polygon: &[[f64; 3]]) -> Option<[f64; 3]> {
    let n = newell_normal(polygon);
    let len = norm(n);
    (len > EPS).then(|| scale(n, 1.0 / len))
}

fn signed_volume(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    dot(sub(b, a), cross(sub(c, a), sub(d, a))) / 6.0
}

fn hex_volume(v: &[[f64; 3]]) -> f64 {
    signed_volume(v[0], v[1], v[3], v[4])
        + signed_volume(v[1], v[2], v[3], v[6])
        + signed_volume(v[1], v[3], v[4], v[6])
        + signed_volume(v[1], v[4], v[5], v[6])
        + signed_volume(v[3], v[4], v[6], v[7])
}

/// Unsigned measure (length, area, volume) of an element with the given
/// lifted vertices, in the element's intrinsic order.
pub fn element_measure(kind: ElementKind, v: &[[f64; 3]]) -> Result<f64, MeshError> {
    if kind != ElementKind::Vertex && !kind.accepts_vertex_count(v.len()) {
        return Err(MeshError::InvalidArity {
            kind,
            found: v.len(),
        });
    }
    Ok(match kind {
        ElementKind::Vertex => 0.0,
        ElementKind::Line => norm(sub(v[1], v[0])),
        ElementKind::Triangle => 0.5 * norm(cross(sub(v[1], v[0]), sub(v[2], v[0]))),
        ElementKind::Quadrilateral | ElementKind::Polygon | ElementKind::Plc => {
            0.5 * norm(newell_normal(v))
        }
        ElementKind::Tetrahedron => signed_volume(v[0], v[1], v[2], v[3]).abs(),
        ElementKind::Hexahedron => hex_volume(v).abs(),
    })
}

/// Walk undirected segments as closed loops. Each step is a segment index
/// with its endpoints in walking order. Open chains are walked as far as
/// they can be followed.
pub fn chain_segments(segments: &[[usize; 2]]) -> Vec<Vec<(usize, [usize; 2])>> {
    let mut incident: HashMap<usize, Vec<usize>> = HashMap::new();
    for (s, seg) in segments.iter().enumerate() {
        incident.entry(seg[0]).or_default().push(s);
        incident.entry(seg[1]).or_default().push(s);
    }
    let mut used = vec![false; segments.len()];
    let mut walks = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let [first, mut current] = segments[start];
        let mut walk = vec![(start, [first, current])];
        while current != first {
            let next = incident
                .get(&current)
                .and_then(|segs| segs.iter().copied().find(|&s| !used[s]));
            let Some(s) = next else { break };
            used[s] = true;
            let [a, b] = segments[s];
            let to = if a == current { b } else { a };
            walk.push((s, [current, to]));
            current = to;
        }
        walks.push(walk);
    }
    walks
}

/// Chain undirected segments into closed vertex loops. Open chains are
/// returned as far as they can be followed.
pub fn chain_loops(segments: &[[usize; 2]]) -> Vec<Vec<usize>> {
    chain_segments(segments)
        .into_iter()
        .map(|walk| {
            let mut chain: Vec<usize> = walk.iter().map(|&(_, [from, _])| from).collect();
            if let (Some(&(_, [first, _])), Some(&(_, [_, last]))) = (walk.first(), walk.last()) {
                if last != first {
                    chain.push(last);
                }
            }
            chain
        })
        .collect()
}

/// Whether `x`, lying in the plane with normal `n`, is inside the region
/// bounded by `loops` (even-odd rule, so inner loops cut holes).
fn inside_loops(x: [f64; 3], n: [f64; 3], loops: &[Vec<[f64; 3]>]) -> bool {
    // drop the dominant axis of the normal
    let axis = (0..3)
        .max_by(|&i, &j| n[i].abs().total_cmp(&n[j].abs()))
        .unwrap_or(2);
    let (u, w) = match axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let mut inside = false;
    for ring in loops {
        for (i, a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            if (a[w] > x[w]) != (b[w] > x[w]) {
                let t = (x[w] - a[w]) / (b[w] - a[w]);
                if x[u] < a[u] + t * (b[u] - a[u]) {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

/// Whether the open segment `p -> q` passes through the planar facet
/// bounded by `loops`. Touching the facet plane within `tolerance`
/// (relative to the segment length) does not count.
pub fn segment_crosses_facet(
    p: [f64; 3],
    q: [f64; 3],
    loops: &[Vec<[f64; 3]>],
    tolerance: f64,
) -> bool {
    let Some(outer) = loops.first() else {
        return false;
    };
    let Some(n) = unit_normal(outer) else {
        return false;
    };
    let origin = outer[0];
    let eps = tolerance * norm(sub(q, p)).max(EPS);
    let dp = dot(n, sub(p, origin));
    let dq = dot(n, sub(q, origin));
    let crosses = (dp < -eps && dq > eps) || (dp > eps && dq < -eps);
    if !crosses {
        return false;
    }
    let t = dp / (dp - dq);
    let x = add(p, scale(sub(q, p), t));
    inside_loops(x, n, loops)
}

/// Lifted coordinates of the vertices of `id`, in intrinsic order.
pub fn element_points<C: MeshConfig>(mesh: &Mesh<C>, id: ElementId) -> Result<Vec<[f64; 3]>, MeshError> {
    mesh.vertices(id)?
        .into_iter()
        .map(|v| mesh.point(v).map(lift))
        .collect()
}

/// Measure of element `id`.
pub fn element_volume<C: MeshConfig>(mesh: &Mesh<C>, id: ElementId) -> Result<f64, MeshError> {
    let kind = mesh.kind(id)?;
    element_measure(kind, &element_points(mesh, id)?)
}

/// Vertex centroid of element `id`.
pub fn element_centroid<C: MeshConfig>(mesh: &Mesh<C>, id: ElementId) -> Result<[f64; 3], MeshError> {
    Ok(centroid(&element_points(mesh, id)?))
}

/// Length of the line `id`.
pub fn edge_length<C: MeshConfig>(mesh: &Mesh<C>, id: ElementId) -> Result<f64, MeshError> {
    match mesh.vertices(id)?.as_slice() {
        &[a, b] => Ok(distance(mesh.point(a)?, mesh.point(b)?)),
        other => Err(MeshError::InvalidArity {
            kind: mesh.kind(id)?,
            found: other.len(),
        }),
    }
}

/// Boundary loops of a 2D element as lifted points. PLC facets follow their
/// lines, so facets with inner loops yield several rings.
pub fn facet_loops<C: MeshConfig>(mesh: &Mesh<C>, id: ElementId) -> Result<Vec<Vec<[f64; 3]>>, MeshError> {
    let element = mesh.element(id)?;
    let rings: Vec<Vec<usize>> = if element.kind() == ElementKind::Plc {
        let segments = plc_segments(mesh, element)?;
        chain_loops(&segments)
    } else {
        vec![element.vertices().to_vec()]
    };
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|v| mesh.point(ElementId::vertex(v)).map(lift))
                .collect()
        })
        .collect()
}

fn plc_segments<C: MeshConfig>(mesh: &Mesh<C>, element: &Element) -> Result<Vec<[usize; 2]>, MeshError> {
    element
        .boundary(1)
        .iter()
        .map(|&l| match mesh.element(ElementId::new(1, l))?.vertices() {
            &[a, b] => Ok([a, b]),
            other => Err(MeshError::InvalidArity {
                kind: ElementKind::Line,
                found: other.len(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn measures() {
        let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(approx(element_measure(ElementKind::Triangle, &tri).unwrap(), 0.5));
        let tet = [tri[0], tri[1], tri[2], [0.0, 0.0, 1.0]];
        assert!(approx(element_measure(ElementKind::Tetrahedron, &tet).unwrap(), 1.0 / 6.0));
        let quad = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(approx(element_measure(ElementKind::Quadrilateral, &quad).unwrap(), 2.0));
        let mut hex = Vec::new();
        for z in [0.0, 1.0] {
            for p in quad {
                hex.push([p[0], p[1], z]);
            }
        }
        assert!(approx(element_measure(ElementKind::Hexahedron, &hex).unwrap(), 2.0));
    }

    #[test]
    fn chains_two_loops() {
        let segs = [[0, 1], [2, 0], [1, 2], [3, 4], [5, 3], [4, 5]];
        let loops = chain_loops(&segs);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0], vec![0, 1, 2]);
        assert_eq!(loops[1].len(), 3);
    }

    #[test]
    fn segment_through_square_with_hole() {
        let outer = vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 4.0, 0.0], [0.0, 4.0, 0.0]];
        let inner = vec![[1.0, 1.0, 0.0], [3.0, 1.0, 0.0], [3.0, 3.0, 0.0], [1.0, 3.0, 0.0]];
        let loops = vec![outer, inner];
        assert!(segment_crosses_facet([0.5, 0.5, -1.0], [0.5, 0.5, 1.0], &loops, 1e-8));
        assert!(!segment_crosses_facet([2.0, 2.0, -1.0], [2.0, 2.0, 1.0], &loops, 1e-8));
        assert!(!segment_crosses_facet([0.5, 0.5, 0.0], [0.5, 0.5, 1.0], &loops, 1e-8));
        assert!(!segment_crosses_facet([5.0, 5.0, -1.0], [5.0, 5.0, 1.0], &loops, 1e-8));
    }
}
