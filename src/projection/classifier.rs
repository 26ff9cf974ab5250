// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point-in-triangle classification
//!
//! A query point is first moved onto the triangle's plane in the way the
//! surface hint calls for, then tested with three signed sub-triangle areas.
//! The admission threshold is a small negative tolerance so that points on an
//! edge or a vertex are still accepted and reported as degenerate.

use crate::geometry::SurfaceHint;
use crate::utils::math::{
    project_point_to_plane, ray_intersect_plane, signed_area_2d, signed_area_3d, triangle_area,
};
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Where a query point falls relative to a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointLocation {
    Outside,
    /// Strictly inside; all three sub-areas are positive
    Inside,
    /// On an edge or vertex, admitted by the tolerance
    InsideDegenerate,
}

impl PointLocation {
    pub fn is_inside(self) -> bool {
        !matches!(self, PointLocation::Outside)
    }
}

/// Classification result with the sub-triangle areas used as weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub location: PointLocation,
    /// Areas opposite each corner; absolute values when admitted, zero when outside
    pub areas: [f64; 3],
}

impl Classification {
    fn outside() -> Self {
        Self {
            location: PointLocation::Outside,
            areas: [0.0; 3],
        }
    }
}

/// Tests query points against triangles of one surface
#[derive(Debug, Clone, Copy)]
pub struct TriangleClassifier {
    hint: SurfaceHint,
    tolerance: f64,
}

impl TriangleClassifier {
    pub fn new(hint: SurfaceHint, tolerance: f64) -> Self {
        Self { hint, tolerance }
    }

    pub fn hint(&self) -> SurfaceHint {
        self.hint
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Normal the classifier measures against; flat surfaces always face +Z
    pub fn effective_normal(&self, triangle_normal: &Vector3<f64>) -> Vector3<f64> {
        match self.hint {
            SurfaceHint::Flat => Vector3::z(),
            _ => *triangle_normal,
        }
    }

    /// Classify `query` against the triangle `corners` with unit `normal`
    pub fn classify(
        &self,
        corners: &[Point3<f64>; 3],
        normal: &Vector3<f64>,
        query: &Point3<f64>,
    ) -> Classification {
        let [p1, p2, p3] = corners;

        match self.hint {
            SurfaceHint::Flat => {
                let flat = |p: &Point3<f64>| Point2::new(p.x, p.y);
                let (a, b, c, q) = (flat(p1), flat(p2), flat(p3), flat(query));
                let areas = [
                    signed_area_2d(&b, &c, &q),
                    signed_area_2d(&c, &a, &q),
                    signed_area_2d(&a, &b, &q),
                ];
                self.admit(areas, signed_area_2d(&a, &b, &c))
            }
            SurfaceHint::Sphere => {
                if normal.norm_squared() == 0.0 {
                    return Classification::outside();
                }
                let Some(on_plane) =
                    ray_intersect_plane(p1, p2, p3, &Point3::origin(), &query.coords)
                else {
                    return Classification::outside();
                };
                self.classify_on_plane(corners, normal, &on_plane)
            }
            SurfaceHint::ThreeDimensional | SurfaceHint::Unknown => {
                if normal.norm_squared() == 0.0 {
                    return Classification::outside();
                }
                let on_plane = project_point_to_plane(query, p1, normal);
                self.classify_on_plane(corners, normal, &on_plane)
            }
        }
    }

    fn classify_on_plane(
        &self,
        corners: &[Point3<f64>; 3],
        normal: &Vector3<f64>,
        on_plane: &Point3<f64>,
    ) -> Classification {
        let [p1, p2, p3] = corners;
        let areas = [
            signed_area_3d(normal, p2, p3, on_plane),
            signed_area_3d(normal, p3, p1, on_plane),
            signed_area_3d(normal, p1, p2, on_plane),
        ];
        self.admit(areas, triangle_area(p1, p2, p3))
    }

    fn admit(&self, areas: [f64; 3], whole_area: f64) -> Classification {
        // NaN areas fail this comparison too
        if areas.iter().any(|&area| !(area >= self.tolerance)) {
            return Classification::outside();
        }

        let location = if areas.iter().all(|&area| area > 0.0) {
            PointLocation::Inside
        } else {
            PointLocation::InsideDegenerate
        };

        let areas = if whole_area > 0.0 {
            areas.map(f64::abs)
        } else {
            [1.0, 0.0, 0.0]
        };

        Classification { location, areas }
    }
}
