// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Generators for simple connected surfaces

use super::{SurfaceHint, SurfaceMesh};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Parametric surfaces with shared vertices and consistent outward winding
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, segments: u32 },
    /// Square patch in the XY plane split into `divisions`² quads
    Grid { size: f64, divisions: u32 },
    /// Two triangles sharing the edge (0,0,0)-(0,2,0); the left wing is
    /// raised by `fold` radians
    Hinge { fold: f64 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(r: f64, segments: u32) -> Self {
        let segments = if segments >= 4 { segments } else { 32 };
        Self::Sphere { r, segments }
    }

    pub fn grid(size: f64, divisions: u32) -> Self {
        Self::Grid {
            size,
            divisions: divisions.max(1),
        }
    }

    pub fn hinge(fold: f64) -> Self {
        Self::Hinge { fold }
    }

    pub fn to_mesh(&self) -> SurfaceMesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, segments } => generate_sphere_mesh(*r, *segments),
            Self::Grid { size, divisions } => generate_grid_mesh(*size, *divisions),
            Self::Hinge { fold } => generate_hinge_mesh(*fold),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> SurfaceMesh {
    let offset = if center { size / 2.0 } else { Vector3::zeros() };
    let corner = |x: f64, y: f64, z: f64| Point3::new(x * size.x, y * size.y, z * size.z) - offset;

    let coordinates = vec![
        corner(0.0, 0.0, 0.0),
        corner(1.0, 0.0, 0.0),
        corner(1.0, 1.0, 0.0),
        corner(0.0, 1.0, 0.0),
        corner(0.0, 0.0, 1.0),
        corner(1.0, 0.0, 1.0),
        corner(1.0, 1.0, 1.0),
        corner(0.0, 1.0, 1.0),
    ];

    let triangles = vec![
        // Bottom
        [0, 2, 1],
        [0, 3, 2],
        // Top
        [4, 5, 6],
        [4, 6, 7],
        // Front
        [0, 1, 5],
        [0, 5, 4],
        // Back
        [3, 7, 6],
        [3, 6, 2],
        // Left
        [0, 4, 7],
        [0, 7, 3],
        // Right
        [1, 2, 6],
        [1, 6, 5],
    ];

    SurfaceMesh::from_trusted(coordinates, triangles, SurfaceHint::ThreeDimensional)
}

/// UV sphere with single pole vertices and a closed seam
fn generate_sphere_mesh(radius: f64, segments: u32) -> SurfaceMesh {
    let stacks = segments as usize;
    let slices = segments as usize;

    let mut coordinates = Vec::with_capacity(2 + (stacks - 1) * slices);
    coordinates.push(Point3::new(0.0, 0.0, radius));
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            coordinates.push(Point3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            ));
        }
    }
    let south = coordinates.len();
    coordinates.push(Point3::new(0.0, 0.0, -radius));

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + (j % slices);
    let mut triangles = Vec::with_capacity(2 * slices * (stacks - 1));

    for j in 0..slices {
        triangles.push([0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let a0 = ring(i, j);
            let a1 = ring(i, j + 1);
            let b0 = ring(i + 1, j);
            let b1 = ring(i + 1, j + 1);
            triangles.push([a0, b0, b1]);
            triangles.push([a0, b1, a1]);
        }
    }
    for j in 0..slices {
        triangles.push([south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }

    SurfaceMesh::from_trusted(coordinates, triangles, SurfaceHint::Sphere)
}

fn generate_grid_mesh(size: f64, divisions: u32) -> SurfaceMesh {
    let n = divisions as usize;
    let step = size / n as f64;

    let mut coordinates = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            coordinates.push(Point3::new(i as f64 * step, j as f64 * step, 0.0));
        }
    }

    let index = |i: usize, j: usize| j * (n + 1) + i;
    let mut triangles = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            triangles.push([index(i, j), index(i + 1, j), index(i + 1, j + 1)]);
            triangles.push([index(i, j), index(i + 1, j + 1), index(i, j + 1)]);
        }
    }

    SurfaceMesh::from_trusted(coordinates, triangles, SurfaceHint::Flat)
}

fn generate_hinge_mesh(fold: f64) -> SurfaceMesh {
    let coordinates = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(-2.0 * fold.cos(), 1.0, 2.0 * fold.sin()),
    ];
    let triangles = vec![[0, 2, 1], [0, 1, 3]];

    SurfaceMesh::from_trusted(coordinates, triangles, SurfaceHint::ThreeDimensional)
}
