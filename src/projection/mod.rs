// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Projection module - locating points on a surface and reconstructing them
//! on other versions of the same surface

mod barycentric;
mod classifier;
mod item;
mod projector;
mod van_essen;

pub use barycentric::{weighted_position, BarycentricProjection};
pub use classifier::{Classification, PointLocation, TriangleClassifier};
pub use item::SurfaceProjectedItem;
pub use projector::{ProjectionReport, ProjectionResult, SurfaceProjector};
pub use van_essen::VanEssenProjection;

use crate::error::ReconstructionFailure;
use crate::geometry::MeshView;
use serde::{Deserialize, Serialize};

/// Vertex index as stored in projection records; negative means unset
pub type VertexIndex = i32;

/// Marker for a vertex slot that was never filled
pub const UNSET_VERTEX: VertexIndex = -1;

/// Which projections the projector may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Barycentric projection only
    Triangle,
    /// Fall back to an edge projection when no triangle cleanly encloses the point
    #[default]
    TriangleOrEdge,
}

/// Convert a stored index into a vertex of `mesh`
pub(crate) fn resolve_vertex<M: MeshView + ?Sized>(
    mesh: &M,
    index: VertexIndex,
) -> Result<usize, ReconstructionFailure> {
    usize::try_from(index)
        .ok()
        .filter(|&vertex| vertex < mesh.vertex_count())
        .ok_or(ReconstructionFailure::VertexOutOfRange { index })
}

/// A record made on a surface with a known vertex count only applies to
/// surfaces with that count
pub(crate) fn check_vertex_count<M: MeshView + ?Sized>(
    mesh: &M,
    projection_vertex_count: usize,
) -> Result<(), ReconstructionFailure> {
    if projection_vertex_count > 0 && projection_vertex_count != mesh.vertex_count() {
        return Err(ReconstructionFailure::VertexCountMismatch {
            expected: projection_vertex_count,
            actual: mesh.vertex_count(),
        });
    }
    Ok(())
}
