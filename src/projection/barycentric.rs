// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Barycentric projection record
//!
//! A point held as one triangle, three unnormalised sub-triangle areas and a
//! signed distance along the triangle normal. When the point coincides with a
//! vertex the three indices are equal and the areas are `[1, 0, 0]`.

use super::{check_vertex_count, resolve_vertex, VertexIndex, UNSET_VERTEX};
use crate::error::ReconstructionFailure;
use crate::geometry::MeshView;
use crate::utils::math::calculate_triangle_normal;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Triangle, weights and offset locating a point on a surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarycentricProjection {
    triangle_vertices: [VertexIndex; 3],
    triangle_areas: [f64; 3],
    signed_distance_above_surface: f64,
    /// Vertex count of the surface projected to; zero when unknown
    projection_vertex_count: usize,
    valid: bool,
    degenerate: bool,
}

impl Default for BarycentricProjection {
    fn default() -> Self {
        Self {
            triangle_vertices: [UNSET_VERTEX; 3],
            triangle_areas: [0.0; 3],
            signed_distance_above_surface: 0.0,
            projection_vertex_count: 0,
            valid: false,
            degenerate: false,
        }
    }
}

impl BarycentricProjection {
    /// An empty, invalid record
    pub fn new() -> Self {
        Self::default()
    }

    /// A valid record built from stored fields
    pub fn from_parts(
        triangle_vertices: [VertexIndex; 3],
        triangle_areas: [f64; 3],
        signed_distance_above_surface: f64,
        degenerate: bool,
        projection_vertex_count: usize,
    ) -> Self {
        Self {
            triangle_vertices,
            triangle_areas,
            signed_distance_above_surface,
            projection_vertex_count,
            valid: true,
            degenerate,
        }
    }

    pub(crate) fn on_vertex(vertex: usize, signed_distance: f64, projection_vertex_count: usize) -> Self {
        let vertex = vertex as VertexIndex;
        Self::from_parts(
            [vertex; 3],
            [1.0, 0.0, 0.0],
            signed_distance,
            true,
            projection_vertex_count,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn triangle_vertices(&self) -> [VertexIndex; 3] {
        self.triangle_vertices
    }

    pub fn triangle_areas(&self) -> [f64; 3] {
        self.triangle_areas
    }

    pub fn signed_distance_above_surface(&self) -> f64 {
        self.signed_distance_above_surface
    }

    pub fn projection_vertex_count(&self) -> usize {
        self.projection_vertex_count
    }

    pub(crate) fn set_signed_distance_above_surface(&mut self, distance: f64) {
        self.signed_distance_above_surface = distance;
    }

    /// True when all three corners refer to the same vertex
    pub fn is_on_vertex(&self) -> bool {
        let [a, b, c] = self.triangle_vertices;
        a == b && b == c
    }

    /// Corner carrying the largest weight; `None` for an invalid record
    pub fn vertex_with_largest_weight(&self) -> Option<VertexIndex> {
        if !self.valid {
            return None;
        }
        let mut best = 0;
        for i in 1..3 {
            if self.triangle_areas[i] > self.triangle_areas[best] {
                best = i;
            }
        }
        Some(self.triangle_vertices[best])
    }

    /// Reconstruct the point on `mesh`.
    ///
    /// With `preserve_offset` the stored signed distance is applied along the
    /// triangle normal; otherwise the point on the surface is returned.
    pub fn unproject<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
        preserve_offset: bool,
    ) -> Result<Point3<f64>, ReconstructionFailure> {
        let (on_surface, normal) = self.surface_point_and_normal(mesh)?;
        if preserve_offset {
            Ok(on_surface + normal * self.signed_distance_above_surface)
        } else {
            Ok(on_surface)
        }
    }

    /// Reconstruct the point `distance` above (negative is below) the surface
    pub fn unproject_above_surface<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
        distance: f64,
    ) -> Result<Point3<f64>, ReconstructionFailure> {
        let (on_surface, normal) = self.surface_point_and_normal(mesh)?;
        Ok(on_surface + normal * distance)
    }

    fn surface_point_and_normal<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
    ) -> Result<(Point3<f64>, Vector3<f64>), ReconstructionFailure> {
        if !self.valid {
            return Err(ReconstructionFailure::InvalidProjection);
        }
        check_vertex_count(mesh, self.projection_vertex_count)?;

        let [n1, n2, n3] = self.resolve_vertices(mesh)?;
        for vertex in [n1, n2, n3] {
            if !mesh.vertex_has_neighbors(vertex) {
                return Err(ReconstructionFailure::DisconnectedVertex { vertex });
            }
        }

        if n1 == n2 && n2 == n3 {
            return Ok((mesh.coordinate(n1), mesh.vertex_normal(n1)));
        }

        let c1 = mesh.coordinate(n1);
        let c2 = mesh.coordinate(n2);
        let c3 = mesh.coordinate(n3);
        let position = weighted_position(&[c1, c2, c3], &self.triangle_areas)?;
        let normal =
            calculate_triangle_normal(&c1, &c2, &c3).ok_or(ReconstructionFailure::DegenerateTriangle)?;
        Ok((position, normal))
    }

    fn resolve_vertices<M: MeshView + ?Sized>(&self, mesh: &M) -> Result<[usize; 3], ReconstructionFailure> {
        let [a, b, c] = self.triangle_vertices;
        Ok([
            resolve_vertex(mesh, a)?,
            resolve_vertex(mesh, b)?,
            resolve_vertex(mesh, c)?,
        ])
    }
}

/// Area-weighted average of three positions
pub fn weighted_position(
    corners: &[Point3<f64>; 3],
    areas: &[f64; 3],
) -> Result<Point3<f64>, ReconstructionFailure> {
    let total = areas[0] + areas[1] + areas[2];
    if total == 0.0 {
        return Err(ReconstructionFailure::ZeroWeightSum);
    }
    let sum = corners[0].coords * areas[0] + corners[1].coords * areas[1] + corners[2].coords * areas[2];
    Ok(Point3::from(sum / total))
}

impl fmt::Display for BarycentricProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return write!(f, "Barycentric: invalid");
        }
        let [a, b, c] = self.triangle_vertices;
        let [wa, wb, wc] = self.triangle_areas;
        write!(
            f,
            "Barycentric: vertices ({a}, {b}, {c}) areas ({wa:.6}, {wb:.6}, {wc:.6}) distance {:.6}{}",
            self.signed_distance_above_surface,
            if self.degenerate { " degenerate" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{SurfaceHint, SurfaceMesh};
    use approx::assert_abs_diff_eq;

    fn square() -> SurfaceMesh {
        SurfaceMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(9.0, 9.0, 9.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
            SurfaceHint::ThreeDimensional,
        )
        .unwrap()
    }

    #[test]
    fn test_default_is_invalid() {
        let record = BarycentricProjection::new();
        assert!(!record.is_valid());
        assert_eq!(record.triangle_vertices(), [UNSET_VERTEX; 3]);
        assert_eq!(record.vertex_with_largest_weight(), None);
        assert_eq!(
            record.unproject(&square(), true),
            Err(ReconstructionFailure::InvalidProjection)
        );
    }

    #[test]
    fn test_weighted_unprojection() {
        let record = BarycentricProjection::from_parts([0, 1, 2], [0.125, 0.25, 0.125], 3.0, false, 5);
        let mesh = square();

        let on_surface = record.unproject(&mesh, false).unwrap();
        assert_abs_diff_eq!(on_surface, Point3::new(0.75, 0.25, 0.0), epsilon = 1e-12);

        let offset = record.unproject(&mesh, true).unwrap();
        assert_abs_diff_eq!(offset, Point3::new(0.75, 0.25, 3.0), epsilon = 1e-12);

        let above = record.unproject_above_surface(&mesh, -1.5).unwrap();
        assert_abs_diff_eq!(above, Point3::new(0.75, 0.25, -1.5), epsilon = 1e-12);

        assert_eq!(record.vertex_with_largest_weight(), Some(1));
    }

    #[test]
    fn test_on_vertex_uses_vertex_normal() {
        let record = BarycentricProjection::on_vertex(2, 2.0, 5);
        assert!(record.is_on_vertex());
        assert!(record.is_degenerate());
        let point = record.unproject(&square(), true).unwrap();
        assert_abs_diff_eq!(point, Point3::new(1.0, 1.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_failures() {
        let mesh = square();

        let zero = BarycentricProjection::from_parts([0, 1, 2], [0.0; 3], 0.0, false, 0);
        assert_eq!(zero.unproject(&mesh, true), Err(ReconstructionFailure::ZeroWeightSum));

        let disconnected = BarycentricProjection::from_parts([0, 1, 4], [1.0; 3], 0.0, false, 0);
        assert_eq!(
            disconnected.unproject(&mesh, true),
            Err(ReconstructionFailure::DisconnectedVertex { vertex: 4 })
        );

        let out_of_range = BarycentricProjection::from_parts([0, 1, 7], [1.0; 3], 0.0, false, 0);
        assert_eq!(
            out_of_range.unproject(&mesh, true),
            Err(ReconstructionFailure::VertexOutOfRange { index: 7 })
        );

        let wrong_surface = BarycentricProjection::from_parts([0, 1, 2], [1.0; 3], 0.0, false, 40);
        assert_eq!(
            wrong_surface.unproject(&mesh, true),
            Err(ReconstructionFailure::VertexCountMismatch {
                expected: 40,
                actual: 5
            })
        );
    }

    #[test]
    fn test_display() {
        let record = BarycentricProjection::from_parts([3, 4, 5], [1.0, 0.5, 0.25], -2.0, true, 0);
        let text = record.to_string();
        assert!(text.contains("(3, 4, 5)"));
        assert!(text.ends_with("degenerate"));
        assert_eq!(BarycentricProjection::new().to_string(), "Barycentric: invalid");
    }
}
