// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for surface projection
//!
//! Errors are split by how far they reach: a [`MeshTopologyError`] means the
//! surface itself cannot be projected to and aborts the whole call, while
//! [`ProjectionFailure`] and [`ReconstructionFailure`] describe a single point
//! and leave the rest of a batch untouched.

use thiserror::Error;

/// The surface violates an invariant every projection relies on. Fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MeshTopologyError {
    #[error("surface contains no vertices")]
    NoVertices,

    #[error("surface topology contains no triangles")]
    NoTriangles,

    #[error("triangle {triangle} references vertex {vertex} but the surface has {vertex_count} vertices")]
    InvalidTriangleIndex {
        triangle: usize,
        vertex: usize,
        vertex_count: usize,
    },

    #[error("replacement coordinates have {actual} vertices, topology expects {expected}")]
    CoordinateCountMismatch { expected: usize, actual: usize },

    #[error("nearest vertex query failed")]
    NearestVertexNotFound,
}

/// A single point could not be projected onto the surface
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionFailure {
    #[error("stereotaxic position is invalid, cannot project")]
    MissingStereotaxicPosition,

    #[error("no triangle near vertex {nearest_vertex} encloses the point")]
    NoEnclosingTriangle { nearest_vertex: usize },

    #[error("vertex {vertex} has no triangles to project onto")]
    NoNearbyTriangle { vertex: usize },

    #[error("edge projection failed")]
    EdgeProjectionFailed,
}

/// A stored projection could not be turned back into a coordinate
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconstructionFailure {
    #[error("projection is not valid")]
    InvalidProjection,

    #[error("projection was made on a surface with {expected} vertices, target has {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },

    #[error("vertex index {index} is outside the surface")]
    VertexOutOfRange { index: i32 },

    #[error("vertex {vertex} has no neighbours")]
    DisconnectedVertex { vertex: usize },

    #[error("barycentric weights sum to zero")]
    ZeroWeightSum,

    #[error("triangle has zero area")]
    DegenerateTriangle,

    #[error("edge fractions {frac_ri} and {frac_rj} do not select an edge position")]
    AmbiguousEdgeFraction { frac_ri: f64, frac_rj: f64 },

    #[error("stored triangle vertices are invalid")]
    InvalidTriangle,

    #[error("projection needs the triangle opposite the edge but none was recorded")]
    MissingOppositeTriangle,
}

/// Error returned by a single-point projection call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectorError {
    #[error(transparent)]
    Topology(#[from] MeshTopologyError),

    #[error(transparent)]
    Projection(#[from] ProjectionFailure),
}

impl ProjectorError {
    /// True when the error concerns the surface rather than the point
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProjectorError::Topology(_))
    }
}
