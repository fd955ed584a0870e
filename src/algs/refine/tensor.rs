//! Uniform subdivision templates for tensor-product cells.

use crate::topology::element::ElementId;

/// Corner offsets of the 2x2 children on a 3-point lattice, in the
/// parent's corner order.
const QUAD_CHILDREN: [(usize, usize); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];

/// 1->4 subdivision of a quadrilateral.
///
/// Edge midpoints follow the edge order `01, 12, 23, 30`. Child `i` keeps
/// parent corner `i` in its own slot `i`.
pub(crate) fn quadrilateral_subdivision(
    v: [ElementId; 4],
    m: [ElementId; 4],
    centre: ElementId,
) -> [[ElementId; 4]; 4] {
    // 3x3 lattice indexed [y][x]
    let lattice = [[v[0], m[0], v[1]], [m[3], centre, m[1]], [v[3], m[2], v[2]]];
    let at = |x: usize, y: usize| lattice[y][x];
    QUAD_CHILDREN.map(|(ix, iy)| [at(ix, iy), at(ix + 1, iy), at(ix + 1, iy + 1), at(ix, iy + 1)])
}

/// Reference 1->8 subdivision of a hexahedron.
///
/// Edge midpoints follow the hexahedron edge order (bottom ring, top ring,
/// verticals) and face centres its face order (bottom, top, then the four
/// sides starting at `0154`).
pub(crate) fn hexahedron_subdivision(
    v: [ElementId; 8],
    m: [ElementId; 12],
    f: [ElementId; 6],
    centre: ElementId,
) -> [[ElementId; 8]; 8] {
    let [v0, v1, v2, v3, v4, v5, v6, v7] = v;
    let [m01, m12, m23, m30, m45, m56, m67, m74, m04, m15, m26, m37] = m;
    let [f0123, f4567, f0154, f1265, f2376, f3047] = f;

    // 3x3x3 lattice indexed [z][y][x]
    let lattice = [
        [[v0, m01, v1], [m30, f0123, m12], [v3, m23, v2]],
        [[m04, f0154, m15], [f3047, centre, f1265], [m37, f2376, m26]],
        [[v4, m45, v5], [m74, f4567, m56], [v7, m67, v6]],
    ];
    let at = |x: usize, y: usize, z: usize| lattice[z][y][x];

    let mut out = [[v0; 8]; 8];
    for (slot, (ix, iy, iz)) in [
        (0, 0, 0),
        (1, 0, 0),
        (1, 1, 0),
        (0, 1, 0),
        (0, 0, 1),
        (1, 0, 1),
        (1, 1, 1),
        (0, 1, 1),
    ]
    .into_iter()
    .enumerate()
    {
        out[slot] = [
            at(ix, iy, iz),
            at(ix + 1, iy, iz),
            at(ix + 1, iy + 1, iz),
            at(ix, iy + 1, iz),
            at(ix, iy, iz + 1),
            at(ix + 1, iy, iz + 1),
            at(ix + 1, iy + 1, iz + 1),
            at(ix, iy + 1, iz + 1),
        ];
    }
    out
}
