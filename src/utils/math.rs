// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities
//!
//! Vector helpers shared by the classifier, the projector and the two
//! projection records. Every helper guards its own numeric domain so that
//! degenerate input produces a finite value instead of NaN.

use nalgebra::{Point2, Point3, Vector3};

/// Calculate the unit normal of a triangle given three vertices.
///
/// Returns `None` when the triangle is degenerate (zero area).
pub fn calculate_triangle_normal(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Option<Vector3<f64>> {
    let v1 = p1 - p0;
    let v2 = p2 - p0;
    v1.cross(&v2).try_normalize(f64::EPSILON)
}

/// Unsigned area of a triangle
pub fn triangle_area(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    (p1 - p0).cross(&(p2 - p0)).norm() * 0.5
}

/// Signed area of a triangle in the XY plane; positive when counter-clockwise
pub fn signed_area_2d(p0: &Point2<f64>, p1: &Point2<f64>, p2: &Point2<f64>) -> f64 {
    ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)) * 0.5
}

/// Area of a triangle, negated when its winding disagrees with `reference_normal`
pub fn signed_area_3d(
    reference_normal: &Vector3<f64>,
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> f64 {
    let cross = (p1 - p0).cross(&(p2 - p0));
    let area = cross.norm() * 0.5;
    if cross.dot(reference_normal) < 0.0 {
        -area
    } else {
        area
    }
}

/// Signed distance of `point` from the plane through `plane_point` with unit `normal`
pub fn signed_distance_from_plane(
    normal: &Vector3<f64>,
    plane_point: &Point3<f64>,
    point: &Point3<f64>,
) -> f64 {
    normal.dot(&(point - plane_point))
}

/// Orthogonal projection of `point` onto the plane through `plane_point` with unit `normal`
pub fn project_point_to_plane(
    point: &Point3<f64>,
    plane_point: &Point3<f64>,
    normal: &Vector3<f64>,
) -> Point3<f64> {
    point - normal * signed_distance_from_plane(normal, plane_point, point)
}

/// Intersect the ray `origin + t * direction` with the plane of a triangle.
///
/// Returns `None` when the ray is parallel to the plane or the triangle is
/// degenerate.
pub fn ray_intersect_plane(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
) -> Option<Point3<f64>> {
    let normal = calculate_triangle_normal(p0, p1, p2)?;
    let denominator = normal.dot(direction);
    if denominator == 0.0 {
        return None;
    }
    let t = normal.dot(&(p0 - origin)) / denominator;
    Some(origin + direction * t)
}

/// Point on the infinite line through `a` and `b` closest to `point`.
///
/// A zero-length line collapses to `a`.
pub fn closest_point_on_line(a: &Point3<f64>, b: &Point3<f64>, point: &Point3<f64>) -> Point3<f64> {
    let v = b - a;
    let length_squared = v.dot(&v);
    if length_squared <= 0.0 {
        return *a;
    }
    a + v * ((point - a).dot(&v) / length_squared)
}

/// Distance from `point` to the infinite line through `a` and `b`
pub fn distance_to_line(a: &Point3<f64>, b: &Point3<f64>, point: &Point3<f64>) -> f64 {
    (point - closest_point_on_line(a, b, point)).norm()
}

/// Normalize a vector, leaving a zero-length vector at zero
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

/// `acos` with its argument clamped into `[-1, 1]`
pub fn safe_acos(value: f64) -> f64 {
    value.clamp(-1.0, 1.0).acos()
}
