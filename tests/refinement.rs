use std::collections::BTreeMap;

use mesh_topo::algs::meshgen::{hexahedron_box, quad_grid, tetrahedron_box, triangle_grid};
use mesh_topo::algs::refine::ensure_longest_edge_refinement;
use mesh_topo::geometry::{edge_length, element_volume};
use mesh_topo::prelude::*;

fn total_measure<C: MeshConfig>(mesh: &Mesh<C>) -> f64 {
    let top = mesh.topologic_dimension();
    mesh.elements(top).map(|c| element_volume(mesh, c).unwrap()).sum()
}

/// Every facet lies on one cell (boundary) or two (interior); a hanging
/// vertex would leave facets with a single cell inside the domain.
fn facet_usage<C: MeshConfig>(mesh: &Mesh<C>) -> BTreeMap<usize, usize> {
    let top = mesh.topologic_dimension();
    let mut usage = BTreeMap::new();
    for facet in mesh.elements(top - 1) {
        let n = mesh.coboundary_elements(facet, top).unwrap().len();
        *usage.entry(n).or_insert(0) += 1;
    }
    usage
}

fn boundary_facets<C: MeshConfig>(mesh: &Mesh<C>) -> usize {
    facet_usage(mesh).get(&1).copied().unwrap_or(0)
}

#[test]
fn uniform_refinement_preserves_measure() -> Result<(), MeshError> {
    let tri = triangle_grid(3, 2, [0.0; 2], [3.0, 2.0])?;
    let quad = quad_grid(2, 2, [0.0; 2], [1.0; 2])?;
    let tet = tetrahedron_box([2, 1, 1], [0.0; 3], [2.0, 1.0, 1.0])?;
    let hex = hexahedron_box([2, 2, 1], [0.0; 3], [1.0, 1.0, 0.5])?;

    let mut out = Mesh::new(2);
    let map = refine_uniformly(&tri, &mut out)?;
    assert_eq!(out.count(2), 4 * tri.count(2));
    assert!(map.iter().all(|(_, children)| children.len() == 4));
    assert!((total_measure(&out) - 6.0).abs() < 1e-12);

    let mut out = Mesh::new(2);
    refine_uniformly(&quad, &mut out)?;
    assert_eq!(out.count(2), 16);
    assert!((total_measure(&out) - 1.0).abs() < 1e-12);

    let mut out = Mesh::new(3);
    refine_uniformly(&tet, &mut out)?;
    assert_eq!(out.count(3), 8 * tet.count(3));
    assert!((total_measure(&out) - 2.0).abs() < 1e-12);
    assert!(!facet_usage(&out).keys().any(|&n| n > 2));

    let mut out = Mesh::new(3);
    refine_uniformly(&hex, &mut out)?;
    assert_eq!(out.count(3), 32);
    assert!((total_measure(&out) - 0.5).abs() < 1e-12);
    Ok(())
}

#[test]
fn uniform_refinement_is_conforming() -> Result<(), MeshError> {
    let tet = tetrahedron_box([1, 1, 1], [0.0; 3], [1.0; 3])?;
    let mut out = Mesh::new(3);
    refine_uniformly(&tet, &mut out)?;
    // each boundary triangle splits in four
    assert_eq!(boundary_facets(&out), 4 * boundary_facets(&tet));
    Ok(())
}

#[test]
fn adaptive_triangles_stay_conforming() -> Result<(), MeshError> {
    let mesh = triangle_grid(4, 4, [0.0; 2], [1.0; 2])?;
    let mut cells = CellFlags::new(&mesh);
    cells.set(ElementId::new(2, 5), true)?;
    cells.set(ElementId::new(2, 12), true)?;
    let mut out = Mesh::new(2);
    refine_cells(&mesh, &mut out, &cells, RefineOptions::default())?;

    assert!(out.count(2) > mesh.count(2));
    assert!((total_measure(&out) - 1.0).abs() < 1e-12);
    // no hanging vertices: boundary edges only grow where the domain
    // boundary itself was split
    let boundary_length: f64 = out
        .elements(1)
        .filter(|&e| out.coboundary_elements(e, 2).unwrap().len() == 1)
        .map(|e| edge_length(&out, e).unwrap())
        .sum();
    assert!((boundary_length - 4.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn adaptive_tetrahedra_stay_conforming() -> Result<(), MeshError> {
    let mesh = tetrahedron_box([2, 2, 2], [0.0; 3], [1.0; 3])?;
    let mut flags = EdgeFlags::new(&mesh);
    flags.set(ElementId::new(1, 3), true)?;
    flags.set(ElementId::new(1, 20), true)?;
    let mut out = Mesh::new(3);
    refine(&mesh, &mut out, &flags, RefineOptions::default())?;

    assert!((total_measure(&out) - 1.0).abs() < 1e-12);
    assert!(!facet_usage(&out).keys().any(|&n| n > 2));
    // boundary area is unchanged, so no face is left half-covered
    let boundary_area: f64 = out
        .elements(2)
        .filter(|&f| out.coboundary_elements(f, 3).unwrap().len() == 1)
        .map(|f| element_volume(&out, f).unwrap())
        .sum();
    assert!((boundary_area - 6.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn longest_edge_closure_flags_longest_edges() -> Result<(), MeshError> {
    let mesh = triangle_grid(3, 3, [0.0; 2], [1.0; 2])?;
    let mut flags = EdgeFlags::new(&mesh);
    let short = mesh
        .elements(1)
        .find(|&e| edge_length(&mesh, e).unwrap() < 0.5)
        .unwrap();
    flags.set(short, true)?;
    let before = flags.count();
    let sweeps = ensure_longest_edge_refinement(&mesh, &mut flags)?;
    assert!(sweeps >= 1);
    assert!(flags.count() > before);
    assert!(flags.is_set(short));

    // closed: every cell with a flag has its longest edge flagged
    for cell in mesh.elements(2) {
        let edges: Vec<_> = mesh.boundary_elements(cell, 1)?.collect();
        if edges.iter().any(|&e| flags.is_set(e)) {
            let longest = edges
                .iter()
                .copied()
                .max_by(|&a, &b| edge_length(&mesh, a).unwrap().total_cmp(&edge_length(&mesh, b).unwrap()))
                .unwrap();
            assert!(flags.is_set(longest));
        }
    }

    // a second pass has nothing left to do
    let count = flags.count();
    assert_eq!(ensure_longest_edge_refinement(&mesh, &mut flags)?, 1);
    assert_eq!(flags.count(), count);
    Ok(())
}

#[test]
fn children_inherit_regions() -> Result<(), MeshError> {
    let mut mesh = triangle_grid(2, 1, [0.0; 2], [2.0, 1.0])?;
    let left = mesh.create_region("left");
    mesh.add_to_region(left, ElementId::new(2, 0))?;
    mesh.add_to_region(left, ElementId::new(2, 1))?;

    let mut out = Mesh::new(2);
    let map = refine_uniformly(&mesh, &mut out)?;
    let region = out.regions().by_name("left").unwrap();
    let members = out.region_elements(region, 2)?;
    assert_eq!(members.len(), 8);
    for (parent, children) in &map {
        let inherited = parent.index() < 2;
        for &child in children {
            assert_eq!(out.is_in_region(region, child)?, inherited);
        }
    }
    Ok(())
}

#[test]
fn in_place_refinement_advances_the_counter() -> Result<(), MeshError> {
    let mut mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2])?;
    let counter = mesh.change_counter();
    let flags = EdgeFlags::all(&mesh);
    refine_in_place(&mut mesh, &flags, RefineOptions::default())?;
    assert_eq!(mesh.count(2), 8);
    assert!(mesh.change_counter() > counter);
    Ok(())
}

#[test]
fn mismatched_dimensions_are_rejected() -> Result<(), MeshError> {
    let mesh = triangle_grid(1, 1, [0.0; 2], [1.0; 2])?;
    let mut out = Mesh::new(3);
    let err = refine_uniformly(&mesh, &mut out);
    assert_eq!(err, Err(MeshError::GeometricDimensionMismatch { input: 2, output: 3 }));
    Ok(())
}
