//! Simplex refinement: reference templates and longest-edge bisection.
//!
//! Adaptive refinement of lines, triangles and tetrahedra bisects the
//! flagged edges one at a time. The edge bisected next is always the
//! largest remaining flagged edge of the current piece under a global
//! order (length, then sorted input vertex indices), so two cells sharing a
//! face or an edge split it the same way.

use core::cmp::Ordering;

use hashbrown::HashMap;

use crate::topology::element::ElementId;

/// A flagged edge as seen by the bisection.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SplitEdge {
    pub(crate) midpoint: ElementId,
    pub(crate) length: f64,
    /// Sorted input vertex indices; breaks length ties.
    pub(crate) tie: (usize, usize),
}

impl SplitEdge {
    fn order(&self, other: &SplitEdge) -> Ordering {
        self.length
            .total_cmp(&other.length)
            .then(self.tie.cmp(&other.tie))
    }
}

/// Flagged edges keyed by their sorted output endpoints.
pub(crate) type SplitTable = HashMap<(ElementId, ElementId), SplitEdge>;

#[inline]
pub(crate) fn edge_key(a: ElementId, b: ElementId) -> (ElementId, ElementId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Recursively bisect the simplex `corners` along flagged edges in `splits`.
///
/// Each split of edge `(i, j)` produces the piece with corner `j` replaced
/// by the midpoint and the piece with corner `i` replaced, so both keep the
/// parent's orientation.
pub(crate) fn bisect<const N: usize>(corners: [ElementId; N], splits: &SplitTable, out: &mut Vec<[ElementId; N]>) {
    let mut best: Option<(usize, usize, SplitEdge)> = None;
    for i in 0..N {
        for j in i + 1..N {
            if let Some(edge) = splits.get(&edge_key(corners[i], corners[j])) {
                let better = match &best {
                    Some((_, _, current)) => edge.order(current) == Ordering::Greater,
                    None => true,
                };
                if better {
                    best = Some((i, j, *edge));
                }
            }
        }
    }
    match best {
        None => out.push(corners),
        Some((i, j, edge)) => {
            let mut first = corners;
            first[j] = edge.midpoint;
            let mut second = corners;
            second[i] = edge.midpoint;
            bisect(first, splits, out);
            bisect(second, splits, out);
        }
    }
}

/// Reference 1->4 subdivision of a triangle. Midpoints are given in edge
/// order `01, 02, 12`.
pub(crate) fn triangle_subdivision(v: [ElementId; 3], m: [ElementId; 3]) -> [[ElementId; 3]; 4] {
    let [v0, v1, v2] = v;
    let [m01, m02, m12] = m;
    [
        [v0, m01, m02],
        [v1, m12, m01],
        [v2, m02, m12],
        [m01, m12, m02],
    ]
}

/// Reference 1->8 subdivision of a tetrahedron. Midpoints are given in
/// edge order `01, 02, 03, 12, 13, 23`; the inner octahedron is cut along
/// the `m01 - m23` diagonal.
pub(crate) fn tetrahedron_subdivision(v: [ElementId; 4], m: [ElementId; 6]) -> [[ElementId; 4]; 8] {
    let [v0, v1, v2, v3] = v;
    let [m01, m02, m03, m12, m13, m23] = m;
    [
        [v0, m01, m02, m03],
        [v1, m12, m01, m13],
        [v2, m02, m12, m23],
        [v3, m03, m13, m23],
        [m01, m12, m13, m23],
        [m01, m13, m03, m23],
        [m01, m03, m02, m23],
        [m01, m02, m12, m23],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> ElementId {
        ElementId::vertex(i)
    }

    fn split(table: &mut SplitTable, a: usize, b: usize, mid: usize, length: f64) {
        table.insert(
            edge_key(v(a), v(b)),
            SplitEdge {
                midpoint: v(mid),
                length,
                tie: (a.min(b), a.max(b)),
            },
        );
    }

    #[test]
    fn single_split_keeps_orientation() {
        let mut table = SplitTable::new();
        split(&mut table, 0, 1, 9, 1.0);
        let mut out = Vec::new();
        bisect([v(0), v(1), v(2)], &table, &mut out);
        assert_eq!(out, vec![[v(0), v(9), v(2)], [v(9), v(1), v(2)]]);
    }

    #[test]
    fn longer_edge_goes_first() {
        let mut table = SplitTable::new();
        split(&mut table, 0, 1, 10, 1.0);
        split(&mut table, 0, 2, 11, 2.0);
        let mut out = Vec::new();
        bisect([v(0), v(1), v(2)], &table, &mut out);
        assert_eq!(out.len(), 3);
        // the longer edge 0-2 is cut first, its midpoint reaches vertex 1
        assert!(out.contains(&[v(11), v(1), v(2)]));
    }

    #[test]
    fn all_six_edges_give_eight_tetrahedra() {
        let mut table = SplitTable::new();
        let mut mid = 10;
        for i in 0..4 {
            for j in i + 1..4 {
                split(&mut table, i, j, mid, 1.0 + mid as f64 * 0.01);
                mid += 1;
            }
        }
        let mut out = Vec::new();
        bisect([v(0), v(1), v(2), v(3)], &table, &mut out);
        assert_eq!(out.len(), 8);
    }
}
