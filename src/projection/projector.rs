// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface projector
//!
//! Barycentric search: starting from the vertex nearest the query, test the
//! triangles around it, then the triangles around each of its neighbours,
//! stopping at the first triangle that strictly encloses the point. The
//! first degenerate (edge or vertex) admission is kept as a fallback, and a
//! query very close to the nearest vertex is pinned to that vertex when no
//! triangle admits it at all.
//!
//! Edge search: when the barycentric result is unusable, the nearest
//! triangle by plane distance and its nearest edge anchor a
//! [`VanEssenProjection`].
//!
//! The projector only borrows the surface, and all search state lives on the
//! stack of a single call, so one projector can serve many threads.

use super::item::SurfaceProjectedItem;
use super::van_essen::EdgeSelection;
use super::{
    BarycentricProjection, PointLocation, ProjectionMode, TriangleClassifier, VanEssenProjection, VertexIndex,
};
use crate::config::ProjectorConfig;
use crate::error::{MeshTopologyError, ProjectionFailure, ProjectorError};
use crate::geometry::MeshView;
use crate::utils::math::{distance_to_line, project_point_to_plane, signed_distance_from_plane};
use ahash::AHashSet;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

/// Round-trip error above which a validated projection is reported as failing
const VALIDATION_TOLERANCE: f64 = 0.001;

/// Outcome of projecting one point
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionResult {
    /// Vertex nearest the query where the search started
    pub nearest_vertex: usize,
    pub barycentric: BarycentricProjection,
    /// Present when the barycentric result was unusable and edge projection was allowed
    pub van_essen: Option<VanEssenProjection>,
}

impl ProjectionResult {
    /// Short label of the projection that will be used to reconstruct the point
    pub fn kind(&self) -> &'static str {
        if self.barycentric.is_valid() {
            if self.barycentric.is_on_vertex() {
                "vertex"
            } else if self.barycentric.is_degenerate() {
                "degenerate"
            } else {
                "triangle"
            }
        } else if self.van_essen.is_some() {
            "edge"
        } else {
            "none"
        }
    }
}

/// Summary of [`SurfaceProjector::project_item`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionReport {
    /// Distance between the item's position and its reconstruction on the surface
    pub distance_error: f64,
    /// Where the item was nudged to when the first projection was poor
    pub moved_to: Option<Point3<f64>>,
}

/// Triangles already classified during one barycentric search
#[derive(Default)]
struct SearchState {
    tested: AHashSet<usize>,
    first_degenerate: Option<BarycentricProjection>,
}

/// Projects points onto one surface
#[derive(Debug, Clone)]
pub struct SurfaceProjector<'a, M: MeshView + ?Sized> {
    mesh: &'a M,
    config: ProjectorConfig,
    classifier: TriangleClassifier,
    vertex_tolerance_squared: f64,
    spherical_radius: Option<f64>,
}

impl<'a, M: MeshView + ?Sized> SurfaceProjector<'a, M> {
    /// Create a projector for `mesh`; the surface needs at least one vertex and one triangle
    pub fn new(mesh: &'a M, config: ProjectorConfig) -> Result<Self, MeshTopologyError> {
        if mesh.vertex_count() == 0 {
            return Err(MeshTopologyError::NoVertices);
        }
        if mesh.triangle_count() == 0 {
            return Err(MeshTopologyError::NoTriangles);
        }

        let spacing = mesh.mean_vertex_spacing();
        let classifier = TriangleClassifier::new(mesh.surface_hint(), config.triangle_area_tolerance);

        Ok(Self {
            mesh,
            classifier,
            vertex_tolerance_squared: 2.0 * spacing * spacing,
            spherical_radius: mesh.spherical_radius().filter(|&r| r > 0.0),
            config,
        })
    }

    pub fn with_defaults(mesh: &'a M) -> Result<Self, MeshTopologyError> {
        Self::new(mesh, ProjectorConfig::default())
    }

    pub fn mesh(&self) -> &'a M {
        self.mesh
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Record `offset` as the signed distance of every later projection
    pub fn set_surface_offset(&mut self, offset: Option<f64>) {
        self.config.surface_offset = offset;
    }

    pub fn surface_offset(&self) -> Option<f64> {
        self.config.surface_offset
    }

    /// Project `point`, falling back to an edge projection when `mode` allows it
    pub fn project_to_surface(
        &self,
        point: &Point3<f64>,
        mode: ProjectionMode,
    ) -> Result<ProjectionResult, ProjectorError> {
        let (nearest_vertex, barycentric) = self.project_barycentric(point)?;

        let needs_edge = !barycentric.is_valid() || barycentric.is_degenerate();
        let van_essen = if mode == ProjectionMode::TriangleOrEdge && needs_edge {
            match self.project_to_edge(point) {
                Ok(record) => Some(record),
                Err(ProjectorError::Topology(error)) => return Err(error.into()),
                Err(ProjectorError::Projection(failure)) => {
                    debug!(%failure, nearest_vertex, "edge projection unavailable");
                    None
                }
            }
        } else {
            None
        };

        if !barycentric.is_valid() && van_essen.is_none() {
            return Err(ProjectionFailure::NoEnclosingTriangle { nearest_vertex }.into());
        }

        let result = ProjectionResult {
            nearest_vertex,
            barycentric,
            van_essen,
        };
        debug!(kind = result.kind(), nearest_vertex, "projected point");
        Ok(result)
    }

    /// Barycentric projection of `point` and the vertex the search started from.
    ///
    /// An unprojectable point gives an invalid record, not an error.
    pub fn project_barycentric(
        &self,
        point: &Point3<f64>,
    ) -> Result<(usize, BarycentricProjection), MeshTopologyError> {
        let adjusted = self.adjust_to_sphere(point);
        let nearest = self
            .mesh
            .nearest_vertex(&adjusted)
            .ok_or(MeshTopologyError::NearestVertexNotFound)?;

        if !is_finite_point(point) {
            debug!(nearest_vertex = nearest, "query is not finite");
            return Ok((nearest, BarycentricProjection::new()));
        }

        let mut record = self.search(nearest, point, &adjusted);
        if record.is_valid() {
            if let Some(offset) = self.config.surface_offset {
                record.set_signed_distance_above_surface(offset);
            }
        }
        Ok((nearest, record))
    }

    /// Edge projection of `point` anchored at the triangle nearest it
    pub fn project_to_edge(&self, point: &Point3<f64>) -> Result<VanEssenProjection, ProjectorError> {
        if !is_finite_point(point) {
            return Err(ProjectionFailure::EdgeProjectionFailed.into());
        }
        let nearest = self
            .mesh
            .nearest_vertex(point)
            .ok_or(MeshTopologyError::NearestVertexNotFound)?;

        let mut best: Option<(usize, f64)> = None;
        for &triangle in self.mesh.vertex_triangles(nearest) {
            let normal = self.mesh.triangle_normal(triangle);
            if normal == Vector3::zeros() {
                continue;
            }
            let corner = self.mesh.coordinate(self.mesh.triangle(triangle)[0]);
            let distance = signed_distance_from_plane(&normal, &corner, point);
            if best.map_or(true, |(_, d)| distance.abs() < d.abs()) {
                best = Some((triangle, distance));
            }
        }
        let (triangle, signed_distance) =
            best.ok_or(ProjectionFailure::NoNearbyTriangle { vertex: nearest })?;

        let corners = self.mesh.triangle_coordinates(triangle);
        let on_plane = project_point_to_plane(point, &corners[0], &self.mesh.triangle_normal(triangle));

        let [a, b, c] = self.mesh.triangle(triangle);
        let edges = [(a, b), (b, c), (c, a)];
        let mut edge = edges[0];
        let mut edge_distance = f64::INFINITY;
        for (i, j) in edges {
            let distance = distance_to_line(&self.mesh.coordinate(i), &self.mesh.coordinate(j), &on_plane);
            if distance < edge_distance {
                edge_distance = distance;
                edge = (i, j);
            }
        }

        let selection = EdgeSelection {
            triangle,
            edge,
            opposite: self.mesh.triangle_sharing_edge(edge.0, edge.1, triangle),
        };
        let record = VanEssenProjection::from_edge(
            self.mesh,
            point,
            selection,
            signed_distance < 0.0,
            self.config.surface_offset,
        );

        let parameters = [
            record.d_r(),
            record.theta_r(),
            record.phi_r(),
            record.frac_ri(),
            record.frac_rj(),
        ];
        if parameters.iter().any(|value| !value.is_finite()) {
            return Err(ProjectionFailure::EdgeProjectionFailed.into());
        }

        trace!(
            triangle,
            edge_i = edge.0,
            edge_j = edge.1,
            boundary = selection.opposite.is_none(),
            "edge projection"
        );
        Ok(record)
    }

    /// Project an item's stereotaxic position and store the result on it.
    ///
    /// When the reconstruction lands further than the configured distance
    /// error from the position, jittered copies of the position are tried and
    /// the best one is kept.
    pub fn project_item(
        &self,
        item: &mut SurfaceProjectedItem,
        mode: ProjectionMode,
    ) -> Result<ProjectionReport, ProjectorError> {
        let original = item
            .stereotaxic_xyz()
            .ok_or(ProjectionFailure::MissingStereotaxicPosition)?;

        let result = match self.project_to_surface(&original, mode) {
            Ok(result) => result,
            Err(error) => {
                if self.config.validate {
                    warn!(%error, position = ?original, "projection failed validation");
                }
                return Err(error);
            }
        };
        let mut distance_error = self.reconstruction_error(&result, &original);
        let mut kind = result.kind();
        item.set_projection(result);
        let mut moved_to = None;

        if distance_error > self.config.projection_distance_error && self.config.perturbation_attempts > 0 {
            let initial_error = distance_error;
            let mut rng = match self.config.perturbation_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let mut best: Option<(Point3<f64>, ProjectionResult, f64)> = None;
            for _ in 0..self.config.perturbation_attempts {
                let shift = (rng.gen::<f64>() - 0.5) * self.config.perturbation_magnitude;
                let candidate = original + Vector3::repeat(shift);

                let attempt = match self.project_to_surface(&candidate, mode) {
                    Ok(attempt) => attempt,
                    Err(ProjectorError::Topology(error)) => return Err(error.into()),
                    Err(ProjectorError::Projection(_)) => continue,
                };
                let error = self.reconstruction_error(&attempt, &original);
                let best_error = best.as_ref().map_or(distance_error, |(_, _, e)| *e);
                if error < best_error {
                    best = Some((candidate, attempt, error));
                }
            }

            if let Some((candidate, attempt, error)) = best {
                warn!(
                    from = ?original,
                    to = ?candidate,
                    initial_error,
                    distance_error = error,
                    "point moved to reduce projection error"
                );
                kind = attempt.kind();
                item.set_projection(attempt);
                distance_error = error;
                moved_to = Some(candidate);
            }
        }

        if self.config.validate {
            debug!(kind, distance_error, position = ?original, "validated projection");
            if distance_error > VALIDATION_TOLERANCE {
                warn!(kind, distance_error, position = ?original, "projection failed validation");
            }
        } else if distance_error > self.config.projection_distance_error {
            warn!(
                distance_error,
                position = ?original,
                projected = ?item.projected_position(self.mesh, false),
                "projection error exceeds limit"
            );
        }

        Ok(ProjectionReport {
            distance_error,
            moved_to,
        })
    }

    /// Project many points in parallel; a failed point does not stop the others
    pub fn project_points(
        &self,
        points: &[Point3<f64>],
        mode: ProjectionMode,
    ) -> Result<Vec<Result<ProjectionResult, ProjectionFailure>>, MeshTopologyError>
    where
        M: Sync,
    {
        let results: Vec<Result<ProjectionResult, ProjectorError>> = points
            .par_iter()
            .map(|point| self.project_to_surface(point, mode))
            .collect();
        split_fatal(results)
    }

    /// Project many items in parallel; see [`SurfaceProjector::project_item`]
    pub fn project_items(
        &self,
        items: &mut [SurfaceProjectedItem],
        mode: ProjectionMode,
    ) -> Result<Vec<Result<ProjectionReport, ProjectionFailure>>, MeshTopologyError>
    where
        M: Sync,
    {
        let results: Vec<Result<ProjectionReport, ProjectorError>> = items
            .par_iter_mut()
            .map(|item| self.project_item(item, mode))
            .collect();
        split_fatal(results)
    }

    fn adjust_to_sphere(&self, point: &Point3<f64>) -> Point3<f64> {
        match self.spherical_radius {
            Some(radius) => match point.coords.try_normalize(0.0) {
                Some(direction) => Point3::from(direction * radius),
                None => *point,
            },
            None => *point,
        }
    }

    fn search(&self, nearest: usize, query: &Point3<f64>, adjusted: &Point3<f64>) -> BarycentricProjection {
        let mut state = SearchState::default();

        if let Some(found) = self.search_fan(nearest, query, adjusted, &mut state) {
            return found;
        }
        for &neighbor in self.mesh.vertex_neighbors(nearest) {
            if let Some(found) = self.search_fan(neighbor, query, adjusted, &mut state) {
                return found;
            }
        }
        if let Some(degenerate) = state.first_degenerate {
            return degenerate;
        }

        let vertex_xyz = self.mesh.coordinate(nearest);
        if (adjusted - vertex_xyz).norm_squared() <= self.vertex_tolerance_squared {
            let normal = self.mesh.vertex_normal(nearest);
            let distance = signed_distance_from_plane(&normal, &vertex_xyz, query);
            trace!(vertex = nearest, "pinned to nearest vertex");
            return BarycentricProjection::on_vertex(nearest, distance, self.mesh.vertex_count());
        }

        BarycentricProjection::new()
    }

    /// Classify the untested triangles around `vertex`; returns a strictly
    /// enclosing triangle and remembers the first degenerate one
    fn search_fan(
        &self,
        vertex: usize,
        query: &Point3<f64>,
        adjusted: &Point3<f64>,
        state: &mut SearchState,
    ) -> Option<BarycentricProjection> {
        for &triangle in self.mesh.vertex_triangles(vertex) {
            if !state.tested.insert(triangle) {
                continue;
            }

            let corners = self.mesh.triangle_coordinates(triangle);
            let triangle_normal = self.mesh.triangle_normal(triangle);
            let classification = self.classifier.classify(&corners, &triangle_normal, adjusted);
            trace!(triangle, location = ?classification.location, "classified");

            let degenerate = match classification.location {
                PointLocation::Outside => continue,
                PointLocation::Inside => false,
                PointLocation::InsideDegenerate => true,
            };
            if degenerate && state.first_degenerate.is_some() {
                continue;
            }

            let normal = self.classifier.effective_normal(&triangle_normal);
            let distance = signed_distance_from_plane(&normal, &corners[0], query);
            let record = BarycentricProjection::from_parts(
                self.mesh.triangle(triangle).map(|v| v as VertexIndex),
                classification.areas,
                distance,
                degenerate,
                self.mesh.vertex_count(),
            );

            if !degenerate {
                return Some(record);
            }
            state.first_degenerate = Some(record);
        }
        None
    }

    /// Distance between `original` and the reconstruction of `result`, keeping its offset
    fn reconstruction_error(&self, result: &ProjectionResult, original: &Point3<f64>) -> f64 {
        let reconstructed = result
            .barycentric
            .unproject(self.mesh, true)
            .ok()
            .or_else(|| {
                result
                    .van_essen
                    .as_ref()
                    .and_then(|record| record.unproject(self.mesh, true).ok())
            });
        reconstructed.map_or(f64::INFINITY, |xyz| (xyz - original).norm())
    }
}

fn is_finite_point(point: &Point3<f64>) -> bool {
    point.coords.iter().all(|c| c.is_finite())
}

/// Separate surface errors, which abort a batch, from per-point failures
fn split_fatal<T>(
    results: Vec<Result<T, ProjectorError>>,
) -> Result<Vec<Result<T, ProjectionFailure>>, MeshTopologyError> {
    results
        .into_iter()
        .map(|result| match result {
            Ok(value) => Ok(Ok(value)),
            Err(ProjectorError::Projection(failure)) => Ok(Err(failure)),
            Err(ProjectorError::Topology(error)) => Err(error),
        })
        .collect()
}
