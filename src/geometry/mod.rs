// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - surface representation and the read-only mesh interface
//! consumed by the projector

mod bbox;
mod mesh;
mod primitives;
mod topology;
mod vertex_locator;

pub use bbox::BoundingBox;
pub use mesh::SurfaceMesh;
pub use primitives::Primitive;
pub use topology::{EdgeKey, Topology};
pub use vertex_locator::VertexLocator;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Overall shape of a surface; changes how query points are adjusted
/// before they are tested against triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceHint {
    /// All vertices lie in the XY plane
    Flat,
    /// Vertices lie on a sphere centred at the origin
    Sphere,
    /// General folded surface
    ThreeDimensional,
    #[default]
    Unknown,
}

/// Read-only view of a triangulated surface.
///
/// Indices passed in are expected to be in range; implementations may panic
/// otherwise. Borrowing the view ties the lifetime of any projector to the
/// surface it reads.
pub trait MeshView {
    fn vertex_count(&self) -> usize;

    fn triangle_count(&self) -> usize;

    fn coordinate(&self, vertex: usize) -> Point3<f64>;

    /// Unit normal of a vertex
    fn vertex_normal(&self, vertex: usize) -> Vector3<f64>;

    /// Vertex indices of a triangle, in winding order
    fn triangle(&self, triangle: usize) -> [usize; 3];

    /// Unit normal of a triangle; zero for a degenerate triangle
    fn triangle_normal(&self, triangle: usize) -> Vector3<f64>;

    /// Vertex nearest `point`, `None` only when the query cannot be answered
    fn nearest_vertex(&self, point: &Point3<f64>) -> Option<usize>;

    fn vertex_neighbors(&self, vertex: usize) -> &[usize];

    /// Triangles that use `vertex`
    fn vertex_triangles(&self, vertex: usize) -> &[usize];

    /// Triangle using edge `(a, b)` other than `exclude`
    fn triangle_sharing_edge(&self, a: usize, b: usize, exclude: usize) -> Option<usize>;

    fn surface_hint(&self) -> SurfaceHint;

    /// Radius of a spherical surface; `None` for other surfaces
    fn spherical_radius(&self) -> Option<f64>;

    /// Mean distance between connected vertices
    fn mean_vertex_spacing(&self) -> f64;

    fn vertex_has_neighbors(&self, vertex: usize) -> bool {
        !self.vertex_neighbors(vertex).is_empty()
    }

    /// The three corner coordinates of a triangle
    fn triangle_coordinates(&self, triangle: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangle(triangle);
        [self.coordinate(a), self.coordinate(b), self.coordinate(c)]
    }
}
