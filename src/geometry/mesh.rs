// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface mesh representation and utilities

use super::{MeshView, SurfaceHint, Topology, VertexLocator};
use crate::error::MeshTopologyError;
use crate::utils::math::calculate_triangle_normal;
use nalgebra::{Point3, Vector3};
use std::sync::Arc;

/// Triangulated surface with derived normals, adjacency and a nearest-vertex index.
///
/// The mesh is immutable once built. Alternate versions of the same surface
/// (inflated, spherical, deformed) are produced with
/// [`SurfaceMesh::with_coordinates`], which shares the topology.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    coordinates: Vec<Point3<f64>>,
    triangles: Arc<Vec<[usize; 3]>>,
    topology: Arc<Topology>,
    hint: SurfaceHint,
    triangle_normals: Vec<Vector3<f64>>,
    vertex_normals: Vec<Vector3<f64>>,
    locator: VertexLocator,
    mean_spacing: f64,
    spherical_radius: f64,
}

impl SurfaceMesh {
    /// Build a surface, validating every triangle index
    pub fn new(
        coordinates: Vec<Point3<f64>>,
        triangles: Vec<[usize; 3]>,
        hint: SurfaceHint,
    ) -> Result<Self, MeshTopologyError> {
        let vertex_count = coordinates.len();
        for (triangle_index, triangle) in triangles.iter().enumerate() {
            if let Some(&vertex) = triangle.iter().find(|&&v| v >= vertex_count) {
                return Err(MeshTopologyError::InvalidTriangleIndex {
                    triangle: triangle_index,
                    vertex,
                    vertex_count,
                });
            }
        }

        Ok(Self::from_trusted(coordinates, triangles, hint))
    }

    /// Build from parts already known to be consistent
    pub(crate) fn from_trusted(
        coordinates: Vec<Point3<f64>>,
        triangles: Vec<[usize; 3]>,
        hint: SurfaceHint,
    ) -> Self {
        let topology = Arc::new(Topology::build(coordinates.len(), &triangles));
        Self::assemble(coordinates, Arc::new(triangles), topology, hint)
    }

    fn assemble(
        coordinates: Vec<Point3<f64>>,
        triangles: Arc<Vec<[usize; 3]>>,
        topology: Arc<Topology>,
        hint: SurfaceHint,
    ) -> Self {
        let triangle_normals: Vec<Vector3<f64>> = triangles
            .iter()
            .map(|t| {
                calculate_triangle_normal(&coordinates[t[0]], &coordinates[t[1]], &coordinates[t[2]])
                    .unwrap_or_else(Vector3::zeros)
            })
            .collect();

        let vertex_normals = compute_vertex_normals(&coordinates, &triangles);
        let mean_spacing = compute_mean_spacing(&coordinates, &topology);
        let spherical_radius = if coordinates.is_empty() {
            0.0
        } else {
            coordinates.iter().map(|p| p.coords.norm()).sum::<f64>() / coordinates.len() as f64
        };
        let locator = VertexLocator::build(&coordinates);

        Self {
            coordinates,
            triangles,
            topology,
            hint,
            triangle_normals,
            vertex_normals,
            locator,
            mean_spacing,
            spherical_radius,
        }
    }

    /// Same topology and hint, new vertex positions
    pub fn with_coordinates(&self, coordinates: Vec<Point3<f64>>) -> Result<Self, MeshTopologyError> {
        if coordinates.len() != self.coordinates.len() {
            return Err(MeshTopologyError::CoordinateCountMismatch {
                expected: self.coordinates.len(),
                actual: coordinates.len(),
            });
        }
        Ok(Self::assemble(
            coordinates,
            Arc::clone(&self.triangles),
            Arc::clone(&self.topology),
            self.hint,
        ))
    }

    /// Same topology, every vertex moved by `f`
    pub fn map_coordinates<F>(&self, f: F) -> Self
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        let coordinates = self.coordinates.iter().map(f).collect();
        Self::assemble(
            coordinates,
            Arc::clone(&self.triangles),
            Arc::clone(&self.topology),
            self.hint,
        )
    }

    /// Same geometry with a different surface hint
    pub fn with_hint(mut self, hint: SurfaceHint) -> Self {
        self.hint = hint;
        self
    }

    pub fn coordinates(&self) -> &[Point3<f64>] {
        &self.coordinates
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}

/// Area-weighted average of the incident face normals
fn compute_vertex_normals(coordinates: &[Point3<f64>], triangles: &[[usize; 3]]) -> Vec<Vector3<f64>> {
    let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); coordinates.len()];

    for triangle in triangles {
        let v0 = coordinates[triangle[0]];
        let v1 = coordinates[triangle[1]];
        let v2 = coordinates[triangle[2]];

        // Cross product length is twice the area, which weights the sum
        let face_normal = (v1 - v0).cross(&(v2 - v0));
        for &index in triangle {
            normal_sums[index] += face_normal;
        }
    }

    normal_sums
        .into_iter()
        .map(|sum| sum.try_normalize(1e-20).unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0)))
        .collect()
}

fn compute_mean_spacing(coordinates: &[Point3<f64>], topology: &Topology) -> f64 {
    let edge_count = topology.edge_count();
    if edge_count == 0 {
        return 0.0;
    }
    // Summed in a fixed order so the result does not depend on the hasher seed
    let total: f64 = topology
        .sorted_edges()
        .into_iter()
        .map(|edge| (coordinates[edge.1] - coordinates[edge.0]).norm())
        .sum();
    total / edge_count as f64
}

impl MeshView for SurfaceMesh {
    fn vertex_count(&self) -> usize {
        self.coordinates.len()
    }

    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn coordinate(&self, vertex: usize) -> Point3<f64> {
        self.coordinates[vertex]
    }

    fn vertex_normal(&self, vertex: usize) -> Vector3<f64> {
        self.vertex_normals[vertex]
    }

    fn triangle(&self, triangle: usize) -> [usize; 3] {
        self.triangles[triangle]
    }

    fn triangle_normal(&self, triangle: usize) -> Vector3<f64> {
        self.triangle_normals[triangle]
    }

    fn nearest_vertex(&self, point: &Point3<f64>) -> Option<usize> {
        self.locator.nearest(point)
    }

    fn vertex_neighbors(&self, vertex: usize) -> &[usize] {
        self.topology.neighbors(vertex)
    }

    fn vertex_triangles(&self, vertex: usize) -> &[usize] {
        self.topology.vertex_triangles(vertex)
    }

    fn triangle_sharing_edge(&self, a: usize, b: usize, exclude: usize) -> Option<usize> {
        self.topology.triangle_sharing_edge(a, b, exclude)
    }

    fn surface_hint(&self) -> SurfaceHint {
        self.hint
    }

    fn spherical_radius(&self) -> Option<f64> {
        match self.hint {
            SurfaceHint::Sphere => Some(self.spherical_radius),
            _ => None,
        }
    }

    fn mean_vertex_spacing(&self) -> f64 {
        self.mean_spacing
    }
}
