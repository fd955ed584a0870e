use std::collections::BTreeSet;

use mesh_topo::algs::meshgen::{tetrahedron_box, triangle_grid};
use mesh_topo::prelude::*;
use proptest::prelude::*;

/// Coboundary of `id` in `target` computed by scanning every element.
fn brute_coboundary(mesh: &Mesh, id: ElementId, target: usize) -> BTreeSet<ElementId> {
    mesh.elements(target)
        .filter(|&e| mesh.boundary_elements(e, id.dim()).unwrap().any(|b| b == id))
        .collect()
}

/// Indices are dense and every stored boundary id is live.
fn assert_dense(mesh: &Mesh) {
    for dim in 0..=3 {
        let ids: Vec<usize> = mesh.elements(dim).map(|e| e.index()).collect();
        assert_eq!(ids, (0..mesh.count(dim)).collect::<Vec<_>>());
        for id in mesh.elements(dim) {
            for b in 0..dim {
                for boundary in mesh.boundary_elements(id, b).unwrap() {
                    assert!(boundary.index() < mesh.count(b));
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn coboundary_matches_scan(nx in 1usize..4, ny in 1usize..4) {
        let mesh = triangle_grid(nx, ny, [0.0; 2], [1.0; 2]).unwrap();
        for dim in 0..2 {
            for id in mesh.elements(dim) {
                for target in dim + 1..=2 {
                    let cached: BTreeSet<_> = mesh.coboundary_elements(id, target).unwrap().iter().collect();
                    prop_assert_eq!(cached, brute_coboundary(&mesh, id, target));
                }
            }
        }
    }

    #[test]
    fn erase_keeps_ids_dense(victims in prop::collection::vec((0usize..3, 0usize..40), 1..6)) {
        let mut mesh = tetrahedron_box([2, 1, 1], [0.0; 3], [2.0, 1.0, 1.0]).unwrap();
        let mut view = EraseView::new();
        for (dim, index) in victims {
            mesh.mark_for_erase(&mut view, ElementId::new(dim, index)).unwrap();
        }
        let before: Vec<usize> = (0..=3).map(|d| mesh.count(d)).collect();
        let summary = mesh.erase(&view).unwrap();
        for dim in 0..=3 {
            prop_assert_eq!(mesh.count(dim) + summary.removed[dim], before[dim]);
        }
        assert_dense(&mesh);
        prop_assert!(mesh.validate_invariants().is_ok());
    }

    #[test]
    fn marking_is_upward_closed(dim in 0usize..3, index in 0usize..30) {
        let mesh = tetrahedron_box([1, 1, 1], [0.0; 3], [1.0; 3]).unwrap();
        let mut view = EraseView::new();
        mesh.mark_for_erase(&mut view, ElementId::new(dim, index)).unwrap();
        let marked: BTreeSet<ElementId> = view.iter().collect();
        for &id in &marked {
            for target in id.dim() + 1..=3 {
                for above in mesh.coboundary_elements(id, target).unwrap().iter() {
                    prop_assert!(marked.contains(&above));
                }
            }
        }
    }
}

#[test]
fn repeated_queries_share_one_table() -> Result<(), MeshError> {
    let mut mesh = triangle_grid(3, 3, [0.0; 2], [1.0; 2])?;
    let first = mesh.coboundary_elements(ElementId::vertex(5), 2)?;
    let rebuilds = mesh.relation_rebuilds();
    let second = mesh.coboundary_elements(ElementId::vertex(6), 2)?;
    assert!(first.same_table(&second));
    assert_eq!(mesh.relation_rebuilds(), rebuilds);

    mesh.create_vertex(&[2.0, 2.0])?;
    let third = mesh.coboundary_elements(ElementId::vertex(5), 2)?;
    assert!(!third.same_table(&first));
    assert_eq!(third.to_vec(), first.to_vec());
    assert_eq!(mesh.relation_rebuilds(), rebuilds + 1);
    Ok(())
}

#[test]
fn triangle_neighbours_share_edges() -> Result<(), MeshError> {
    let mesh = triangle_grid(2, 2, [0.0; 2], [1.0; 2])?;
    for cell in mesh.elements(2) {
        let neighbours = mesh.neighbour_elements(cell, 1)?;
        assert!(!neighbours.contains(cell));
        for n in neighbours.iter() {
            let mine: BTreeSet<_> = mesh.boundary_elements(cell, 1)?.collect();
            assert!(mesh.boundary_elements(n, 1)?.any(|e| mine.contains(&e)));
        }
    }
    Ok(())
}

#[test]
fn orientation_records_reversed_edges() -> Result<(), MeshError> {
    let mut mesh = Mesh::new(2);
    let a = mesh.create_vertex(&[0.0, 0.0])?;
    let b = mesh.create_vertex(&[1.0, 0.0])?;
    let c = mesh.create_vertex(&[0.0, 1.0])?;
    // edge (b, a) exists before the triangle expects (a, b)
    let line = mesh.create_element(ElementKind::Line, &[b, a])?;
    let tri = mesh.create_element(ElementKind::Triangle, &[a, b, c])?;
    let edges: Vec<_> = mesh.boundary_elements(tri, 1)?.collect();
    assert_eq!(edges[0], line);
    let orientation = mesh.boundary_orientation(tri, 1)?;
    assert!(orientation[0].is_odd());
    assert!(!orientation[1].is_odd());
    Ok(())
}
