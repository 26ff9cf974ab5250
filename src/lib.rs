// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface Projector
//!
//! Locates points on triangulated surface meshes and reconstructs them on
//! other versions of the same surface (inflated, spherical, flattened or
//! deformed copies sharing one topology). A point is held either
//! barycentrically, as a triangle plus weights and a signed offset, or
//! relative to its nearest edge when no triangle cleanly encloses it.

pub mod config;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod utils;

pub use config::ProjectorConfig;
pub use error::{MeshTopologyError, ProjectionFailure, ProjectorError, ReconstructionFailure};
pub use geometry::{MeshView, Primitive, SurfaceHint, SurfaceMesh};
pub use projection::{
    BarycentricProjection, ProjectionMode, ProjectionReport, ProjectionResult, SurfaceProjectedItem,
    SurfaceProjector, VanEssenProjection,
};

/// Project `point` onto `mesh` with the default configuration
pub fn project(
    mesh: &SurfaceMesh,
    point: &nalgebra::Point3<f64>,
    mode: ProjectionMode,
) -> Result<ProjectionResult, ProjectorError> {
    let projector = SurfaceProjector::with_defaults(mesh)?;
    projector.project_to_surface(point, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    #[test]
    fn test_basic_projection() {
        let mesh = Primitive::grid(2.0, 2).to_mesh();
        let point = Point3::new(0.4, 1.3, 2.0);
        let result = project(&mesh, &point, ProjectionMode::Triangle).unwrap();

        assert_eq!(result.nearest_vertex, 3);
        assert_eq!(result.kind(), "triangle");
        let record = &result.barycentric;
        assert_eq!(record.triangle_vertices(), [3, 4, 7]);
        let areas = record.triangle_areas();
        assert_abs_diff_eq!(areas[0], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(areas[1], 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(areas[2], 0.15, epsilon = 1e-12);
        assert_abs_diff_eq!(record.signed_distance_above_surface(), 2.0, epsilon = 1e-12);

        assert_abs_diff_eq!(record.unproject(&mesh, true).unwrap(), point, epsilon = 1e-12);
        assert_abs_diff_eq!(
            record.unproject(&mesh, false).unwrap(),
            Point3::new(0.4, 1.3, 0.0),
            epsilon = 1e-12
        );
    }
}
