// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Projection onto a surface and reconstruction on other versions of it

use anyhow::Result;
use approx::assert_abs_diff_eq;
use nalgebra::{Point3, Vector3};
use surface_projector::projection::{PointLocation, TriangleClassifier};
use surface_projector::{
    MeshView, Primitive, ProjectionMode, ProjectorConfig, SurfaceHint, SurfaceMesh, SurfaceProjectedItem,
    SurfaceProjector,
};

fn unit_square() -> Result<SurfaceMesh> {
    Ok(SurfaceMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
        SurfaceHint::ThreeDimensional,
    )?)
}

#[test]
fn test_square_centre_and_offset() -> Result<()> {
    let mesh = unit_square()?;
    let projector = SurfaceProjector::with_defaults(&mesh)?;

    // The centre lies on the shared diagonal, so the admission is on an edge
    let on_surface = projector.project_to_surface(&Point3::new(0.5, 0.5, 0.0), ProjectionMode::Triangle)?;
    let record = &on_surface.barycentric;
    assert!(record.is_valid());
    assert!([[0, 1, 2], [0, 2, 3]].contains(&record.triangle_vertices()));
    assert_abs_diff_eq!(record.signed_distance_above_surface(), 0.0, epsilon = 1e-12);

    let above = projector.project_to_surface(&Point3::new(0.5, 0.5, 5.0), ProjectionMode::Triangle)?;
    let lifted = &above.barycentric;
    assert_eq!(lifted.triangle_vertices(), record.triangle_vertices());
    assert_abs_diff_eq!(lifted.signed_distance_above_surface(), 5.0, epsilon = 1e-12);

    assert_abs_diff_eq!(lifted.unproject(&mesh, false)?, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    assert_abs_diff_eq!(lifted.unproject(&mesh, true)?, Point3::new(0.5, 0.5, 5.0), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_interior_points_round_trip() -> Result<()> {
    let mesh = Primitive::grid(6.0, 6).to_mesh().with_hint(SurfaceHint::ThreeDimensional);
    let projector = SurfaceProjector::with_defaults(&mesh)?;

    for point in [
        Point3::new(0.3, 0.2, 1.0),
        Point3::new(2.7, 4.1, -3.5),
        Point3::new(5.6, 0.9, 0.25),
    ] {
        let result = projector.project_to_surface(&point, ProjectionMode::Triangle)?;
        let record = &result.barycentric;
        assert_eq!(result.kind(), "triangle");
        assert!(record.triangle_areas().iter().all(|&a| a > 0.0));

        let on_plane = Point3::new(point.x, point.y, 0.0);
        assert_abs_diff_eq!(record.unproject(&mesh, false)?, on_plane, epsilon = 1e-9);
        assert_abs_diff_eq!(record.unproject(&mesh, true)?, point, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn test_closed_cube_top_face() -> Result<()> {
    let cube = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    assert!(cube.topology().is_closed());
    let projector = SurfaceProjector::with_defaults(&cube)?;

    let point = Point3::new(0.3, 0.4, 1.5);
    let result = projector.project_to_surface(&point, ProjectionMode::TriangleOrEdge)?;
    assert_eq!(result.nearest_vertex, 6);
    assert_eq!(result.kind(), "triangle");
    assert!(result.van_essen.is_none());

    let record = &result.barycentric;
    assert_eq!(record.triangle_vertices(), [4, 6, 7]);
    let areas = record.triangle_areas();
    assert_abs_diff_eq!(areas[0], 0.6, epsilon = 1e-12);
    assert_abs_diff_eq!(areas[1], 1.3, epsilon = 1e-12);
    assert_abs_diff_eq!(areas[2], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(record.signed_distance_above_surface(), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(record.unproject(&cube, true)?, point, epsilon = 1e-12);

    let doubled = cube.map_coordinates(|p| Point3::from(p.coords * 2.0));
    assert_abs_diff_eq!(record.unproject(&doubled, true)?, Point3::new(0.6, 0.8, 2.5), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_sphere_projection_keeps_direction() -> Result<()> {
    let sphere = Primitive::sphere(10.0, 16).to_mesh();
    let inflated = sphere.map_coordinates(|p| Point3::from(p.coords * 2.0));
    let projector = SurfaceProjector::with_defaults(&sphere)?;

    for point in [
        Point3::new(3.0, 4.0, 12.0),
        Point3::new(-7.0, 2.0, -5.0),
        Point3::new(1.0, -8.0, 0.5),
    ] {
        let result = projector.project_to_surface(&point, ProjectionMode::TriangleOrEdge)?;
        let record = &result.barycentric;
        assert!(record.is_valid());

        let on_inflated = record.unproject(&inflated, false)?;
        assert!(on_inflated.coords.norm() <= 20.0 + 1e-9);
        assert!(on_inflated.coords.norm() > 19.0);
        assert_abs_diff_eq!(
            on_inflated.coords.normalize().dot(&point.coords.normalize()),
            1.0,
            epsilon = 1e-9
        );
    }
    Ok(())
}

#[test]
fn test_near_vertex_outside_every_triangle() -> Result<()> {
    let mesh = unit_square()?;
    let projector = SurfaceProjector::with_defaults(&mesh)?;

    let result = projector.project_to_surface(&Point3::new(1.3, -0.4, 0.2), ProjectionMode::Triangle)?;
    let record = &result.barycentric;
    assert_eq!(result.kind(), "vertex");
    assert_eq!(record.triangle_vertices(), [1, 1, 1]);
    assert_eq!(record.triangle_areas(), [1.0, 0.0, 0.0]);
    assert_abs_diff_eq!(record.unproject(&mesh, true)?, Point3::new(1.0, 0.0, 0.2), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_shared_edge_is_degenerate_for_both_triangles() {
    let hinge = Primitive::hinge(0.7).to_mesh();
    let classifier = TriangleClassifier::new(hinge.surface_hint(), -0.01);
    let on_edge = Point3::new(0.0, 0.7, 0.0);

    for triangle in 0..hinge.triangle_count() {
        let classification = classifier.classify(
            &hinge.triangle_coordinates(triangle),
            &hinge.triangle_normal(triangle),
            &on_edge,
        );
        assert_eq!(classification.location, PointLocation::InsideDegenerate);
    }
}

#[test]
fn test_boundary_edge_fallback() -> Result<()> {
    let mesh = unit_square()?;
    let projector = SurfaceProjector::with_defaults(&mesh)?;

    let result = projector.project_to_surface(&Point3::new(0.5, -2.0, 0.3), ProjectionMode::TriangleOrEdge)?;
    assert!(!result.barycentric.is_valid());
    let edge = result.van_essen.expect("edge projection");
    assert!(edge.is_valid());
    assert!(!edge.has_opposite_triangle());
    assert_eq!(edge.vertex(), [1, 2]);
    assert_eq!(edge.phi_r(), 0.0);
    // A height of 0.3 over the square is stored as sqrt(0.3), not 0.3
    assert_abs_diff_eq!(edge.d_r(), 0.3_f64.sqrt(), epsilon = 1e-12);
    assert!((edge.d_r() - 0.3).abs() > 0.2);
    Ok(())
}

#[test]
fn test_item_follows_fold() -> Result<()> {
    let flat = Primitive::hinge(0.0).to_mesh();
    let folded = Primitive::hinge(std::f64::consts::FRAC_PI_2).to_mesh();
    let projector = SurfaceProjector::with_defaults(&flat)?;

    let mut item = SurfaceProjectedItem::new(Point3::new(-0.5, 1.0, 0.0));
    let report = projector.project_item(&mut item, ProjectionMode::TriangleOrEdge)?;
    assert!(report.distance_error < 1e-9);
    assert_eq!(item.barycentric().triangle_vertices(), [0, 1, 3]);

    let moved = item.projected_position(&folded, true).expect("position on folded hinge");
    assert_abs_diff_eq!(moved, Point3::new(0.0, 1.0, 0.5), epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_batch_items_on_sphere() -> Result<()> {
    let sphere = Primitive::sphere(25.0, 24).to_mesh();
    let projector = SurfaceProjector::with_defaults(&sphere)?;

    let mut items: Vec<SurfaceProjectedItem> = (0..40)
        .map(|i| {
            let t = i as f64 * 0.37;
            SurfaceProjectedItem::new(Point3::new(t.cos() * 20.0, t.sin() * 20.0, 15.0 - i as f64 * 0.7))
        })
        .collect();

    let reports = projector.project_items(&mut items, ProjectionMode::TriangleOrEdge)?;
    assert_eq!(reports.len(), items.len());
    for (item, report) in items.iter().zip(&reports) {
        assert!(report.is_ok());
        assert!(item.has_valid_projection());
    }
    Ok(())
}

#[test]
fn test_seeded_perturbation_is_repeatable() -> Result<()> {
    let mesh = unit_square()?;
    let config = ProjectorConfig {
        projection_distance_error: 1e-6,
        perturbation_seed: Some(42),
        ..ProjectorConfig::default()
    };
    let projector = SurfaceProjector::new(&mesh, config)?;
    let original = Point3::new(2.5, 0.5, 1.0);

    let mut first = SurfaceProjectedItem::new(original);
    let mut second = first.clone();
    let first_report = projector.project_item(&mut first, ProjectionMode::TriangleOrEdge)?;
    let second_report = projector.project_item(&mut second, ProjectionMode::TriangleOrEdge)?;

    assert_eq!(first_report, second_report);
    assert_eq!(first, second);
    if let Some(moved) = first_report.moved_to {
        let shift = moved - original;
        assert_abs_diff_eq!(shift.x, shift.y, epsilon = 1e-12);
        assert_abs_diff_eq!(shift.y, shift.z, epsilon = 1e-12);
        assert!(shift.x.abs() <= 0.25);
    }
    Ok(())
}
