use mesh_topo::prelude::*;

/// Corners of the axis-aligned cube `[lo, hi]^3`, indexed `x + 2y + 4z`.
fn cube_corners(mesh: &mut Mesh, lo: f64, hi: f64) -> Vec<ElementId> {
    (0..8)
        .map(|i| {
            let c = |bit: usize| if i & bit == 0 { lo } else { hi };
            mesh.create_vertex(&[c(1), c(2), c(4)]).unwrap()
        })
        .collect()
}

/// Face loops of a cube in corner indices.
const FACES: [[usize; 4]; 6] = [
    [0, 1, 3, 2],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 2, 6, 4],
    [1, 3, 7, 5],
];

fn quad_cube(mesh: &mut Mesh, lo: f64, hi: f64) {
    let c = cube_corners(mesh, lo, hi);
    for face in FACES {
        let v: Vec<_> = face.iter().map(|&i| c[i]).collect();
        mesh.create_element(ElementKind::Quadrilateral, &v).unwrap();
    }
}

fn plc_cube(mesh: &mut Mesh, lo: f64, hi: f64) {
    let c = cube_corners(mesh, lo, hi);
    for face in FACES {
        let lines: Vec<_> = (0..4)
            .map(|k| {
                let (a, b) = (c[face[k]], c[face[(k + 1) % 4]]);
                mesh.create_element(ElementKind::Line, &[a, b]).unwrap()
            })
            .collect();
        mesh.create_plc(&lines, &[]).unwrap();
    }
}

fn inside(p: &[f64], lo: f64, hi: f64) -> bool {
    p.iter().all(|&x| x > lo && x < hi)
}

#[test]
fn single_hull_has_no_holes() -> Result<(), MeshError> {
    let mut mesh = Mesh::new(3);
    quad_cube(&mut mesh, 0.0, 1.0);
    assert!(extract_hole_points(&mesh, HolePointOptions::default())?.is_empty());
    Ok(())
}

#[test]
fn nested_hull_is_a_hole() -> Result<(), MeshError> {
    let mut mesh = Mesh::new(3);
    quad_cube(&mut mesh, 0.0, 3.0);
    quad_cube(&mut mesh, 1.0, 2.0);
    let points = extract_hole_points(&mesh, HolePointOptions::default())?;
    assert_eq!(points.len(), 1);
    assert!(inside(&points[0], 1.0, 2.0), "{:?}", points[0]);
    Ok(())
}

#[test]
fn island_inside_a_hole_is_solid() -> Result<(), MeshError> {
    let mut mesh = Mesh::new(3);
    quad_cube(&mut mesh, 0.0, 5.0);
    quad_cube(&mut mesh, 1.0, 4.0);
    quad_cube(&mut mesh, 2.0, 3.0);
    let points = extract_hole_points(&mesh, HolePointOptions::default())?;
    assert_eq!(points.len(), 1);
    let p = &points[0];
    assert!(inside(p, 1.0, 4.0));
    assert!(!inside(p, 2.0, 3.0), "{p:?} lies in the island");
    Ok(())
}

#[test]
fn plc_facets_are_supported() -> Result<(), MeshError> {
    let mut mesh = Mesh::new(3);
    plc_cube(&mut mesh, 0.0, 4.0);
    plc_cube(&mut mesh, 1.0, 3.0);
    assert_eq!(mesh.count(2), 12);
    let points = extract_hole_points(&mesh, HolePointOptions::default())?;
    assert_eq!(points.len(), 1);
    assert!(inside(&points[0], 1.0, 3.0));
    Ok(())
}
