//! Structured mesh generators for boxes.
//!
//! Each generator has a default-configuration form and an `_in` form
//! generic over [`MeshConfig`].

use crate::mesh::{DefaultConfig, Mesh, MeshConfig};
use crate::mesh_error::MeshError;
use crate::topology::element::ElementId;
use crate::topology::element_kind::ElementKind;

fn check_resolution(counts: &[usize]) -> Result<(), MeshError> {
    if counts.contains(&0) {
        return Err(MeshError::InvalidDimension {
            dimension: 0,
            reason: "grid resolution must be positive",
        });
    }
    Ok(())
}

fn build<C: MeshConfig>(
    dimension: usize,
    vertices: &[Vec<f64>],
    cells: &[Vec<usize>],
    kind: ElementKind,
) -> Result<Mesh<C>, MeshError> {
    let mut mesh = Mesh::<C>::configured(dimension);
    let ids = vertices
        .iter()
        .map(|p| mesh.create_vertex(p))
        .collect::<Result<Vec<_>, _>>()?;
    let mut corners = Vec::with_capacity(8);
    for cell in cells {
        corners.clear();
        for &v in cell {
            let id = ids
                .get(v)
                .copied()
                .ok_or_else(|| MeshError::NotFound(format!("vertex {}", ElementId::vertex(v))))?;
            corners.push(id);
        }
        mesh.create_element(kind, &corners)?;
    }
    Ok(mesh)
}

fn lattice_2d(nx: usize, ny: usize, min: [f64; 2], max: [f64; 2]) -> Vec<Vec<f64>> {
    let dx = (max[0] - min[0]) / nx as f64;
    let dy = (max[1] - min[1]) / ny as f64;
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        let y = min[1] + dy * j as f64;
        for i in 0..=nx {
            vertices.push(vec![min[0] + dx * i as f64, y]);
        }
    }
    vertices
}

fn lattice_3d(n: [usize; 3], min: [f64; 3], max: [f64; 3]) -> Vec<Vec<f64>> {
    let step: Vec<f64> = (0..3).map(|a| (max[a] - min[a]) / n[a] as f64).collect();
    let mut vertices = Vec::with_capacity((n[0] + 1) * (n[1] + 1) * (n[2] + 1));
    for k in 0..=n[2] {
        for j in 0..=n[1] {
            for i in 0..=n[0] {
                vertices.push(vec![
                    min[0] + step[0] * i as f64,
                    min[1] + step[1] * j as f64,
                    min[2] + step[2] * k as f64,
                ]);
            }
        }
    }
    vertices
}

/// Corners of every cube of an `n` lattice, bottom `0123` and top `4567`.
fn cubes(n: [usize; 3]) -> impl Iterator<Item = [usize; 8]> {
    let row = n[0] + 1;
    let slab = row * (n[1] + 1);
    (0..n[2]).flat_map(move |k| {
        (0..n[1]).flat_map(move |j| {
            (0..n[0]).map(move |i| {
                let v0 = k * slab + j * row + i;
                let v3 = v0 + row;
                let v4 = v0 + slab;
                let v7 = v4 + row;
                [v0, v0 + 1, v3 + 1, v3, v4, v4 + 1, v7 + 1, v7]
            })
        })
    })
}

/// `nx` x `ny` squares over `[min, max]`, each split along the diagonal
/// from its lower-left to its upper-right corner.
pub fn triangle_grid(nx: usize, ny: usize, min: [f64; 2], max: [f64; 2]) -> Result<Mesh, MeshError> {
    triangle_grid_in::<DefaultConfig>(nx, ny, min, max)
}

pub fn triangle_grid_in<C: MeshConfig>(
    nx: usize,
    ny: usize,
    min: [f64; 2],
    max: [f64; 2],
) -> Result<Mesh<C>, MeshError> {
    check_resolution(&[nx, ny])?;
    let row = nx + 1;
    let mut cells = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v0 = j * row + i;
            let v1 = v0 + 1;
            let v3 = v0 + row;
            let v2 = v3 + 1;
            cells.push(vec![v0, v1, v2]);
            cells.push(vec![v0, v2, v3]);
        }
    }
    build(2, &lattice_2d(nx, ny, min, max), &cells, ElementKind::Triangle)
}

/// `nx` x `ny` quadrilaterals over `[min, max]`.
pub fn quad_grid(nx: usize, ny: usize, min: [f64; 2], max: [f64; 2]) -> Result<Mesh, MeshError> {
    quad_grid_in::<DefaultConfig>(nx, ny, min, max)
}

pub fn quad_grid_in<C: MeshConfig>(
    nx: usize,
    ny: usize,
    min: [f64; 2],
    max: [f64; 2],
) -> Result<Mesh<C>, MeshError> {
    check_resolution(&[nx, ny])?;
    let row = nx + 1;
    let mut cells = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v0 = j * row + i;
            let v3 = v0 + row;
            cells.push(vec![v0, v0 + 1, v3 + 1, v3]);
        }
    }
    build(2, &lattice_2d(nx, ny, min, max), &cells, ElementKind::Quadrilateral)
}

/// Box of `n` cubes, each cut into six tetrahedra around its main
/// diagonal. Neighbouring cubes share identical face triangulations.
pub fn tetrahedron_box(n: [usize; 3], min: [f64; 3], max: [f64; 3]) -> Result<Mesh, MeshError> {
    tetrahedron_box_in::<DefaultConfig>(n, min, max)
}

pub fn tetrahedron_box_in<C: MeshConfig>(
    n: [usize; 3],
    min: [f64; 3],
    max: [f64; 3],
) -> Result<Mesh<C>, MeshError> {
    check_resolution(&n)?;
    let mut cells = Vec::new();
    for [v0, v1, v2, v3, v4, v5, v6, v7] in cubes(n) {
        for [a, b] in [[v1, v2], [v2, v3], [v3, v7], [v7, v4], [v4, v5], [v5, v1]] {
            cells.push(vec![v0, a, b, v6]);
        }
    }
    build(3, &lattice_3d(n, min, max), &cells, ElementKind::Tetrahedron)
}

/// Box of `n` hexahedra.
pub fn hexahedron_box(n: [usize; 3], min: [f64; 3], max: [f64; 3]) -> Result<Mesh, MeshError> {
    hexahedron_box_in::<DefaultConfig>(n, min, max)
}

pub fn hexahedron_box_in<C: MeshConfig>(
    n: [usize; 3],
    min: [f64; 3],
    max: [f64; 3],
) -> Result<Mesh<C>, MeshError> {
    check_resolution(&n)?;
    let cells: Vec<Vec<usize>> = cubes(n).map(|c| c.to_vec()).collect();
    build(3, &lattice_3d(n, min, max), &cells, ElementKind::Hexahedron)
}
