use mesh_topo::algs::hyperplane::mark_edges_for_hyperplane_refine;
use mesh_topo::algs::meshgen::tetrahedron_box;
use mesh_topo::geometry::element_volume;
use mesh_topo::prelude::*;

fn signed(mesh: &Mesh, v: ElementId, point: &[f64], normal: &[f64]) -> f64 {
    let p = mesh.point(v).unwrap();
    p.iter().zip(point).zip(normal).map(|((x, x0), n)| n * (x - x0)).sum()
}

#[test]
fn oblique_cut_through_a_box() -> Result<(), MeshError> {
    let mesh = tetrahedron_box([2, 2, 2], [0.0; 3], [1.0; 3])?;
    let point = [0.3, 0.4, 0.45];
    let normal = [1.0, 0.5, 0.25];

    let cut = mark_edges_for_hyperplane_refine(&mesh, &point, &normal, HyperplaneOptions::default())?;
    assert!(cut.flags.count() > 0);
    for edge in cut.flags.iter() {
        let p = cut.point(edge).unwrap();
        let d: f64 = p.iter().zip(&point).zip(&normal).map(|((x, x0), n)| n * (x - x0)).sum();
        assert!(d.abs() < 1e-12);
    }

    let mut out = Mesh::new(3);
    hyperplane_refine(&mesh, &mut out, &point, &normal, HyperplaneOptions::default())?;
    let volume: f64 = out.elements(3).map(|c| element_volume(&out, c).unwrap()).sum();
    assert!((volume - 1.0).abs() < 1e-12);
    assert_eq!(out.count(0), mesh.count(0) + cut.flags.count());

    for cell in out.elements(3) {
        let d: Vec<f64> = out
            .vertices(cell)?
            .into_iter()
            .map(|v| signed(&out, v, &point, &normal))
            .collect();
        let below = d.iter().any(|x| *x < -1e-9);
        let above = d.iter().any(|x| *x > 1e-9);
        assert!(!(below && above), "cell {cell} straddles the plane: {d:?}");
    }
    Ok(())
}

#[test]
fn regions_survive_the_cut() -> Result<(), MeshError> {
    let mut mesh = tetrahedron_box([1, 1, 1], [0.0; 3], [1.0; 3])?;
    let all = mesh.create_region("solid");
    for cell in mesh.elements(3).collect::<Vec<_>>() {
        mesh.add_to_region(all, cell)?;
    }
    let mut out = Mesh::new(3);
    hyperplane_refine(&mesh, &mut out, &[0.5, 0.5, 0.5], &[0.0, 0.0, 1.0], HyperplaneOptions::default())?;
    let region = out.regions().by_name("solid").ok_or(MeshError::NotFound("solid".into()))?;
    assert_eq!(out.region_elements(region, 3)?.len(), out.count(3));
    Ok(())
}
