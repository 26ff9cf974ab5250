// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stored projection records and configuration files

use anyhow::Result;
use approx::assert_abs_diff_eq;
use nalgebra::Point3;
use std::io::Write;
use surface_projector::{
    BarycentricProjection, Primitive, ProjectionMode, ProjectorConfig, SurfaceProjectedItem, SurfaceProjector,
    VanEssenProjection,
};
use tempfile::NamedTempFile;

#[test]
fn test_records_survive_json() -> Result<()> {
    let mesh = Primitive::hinge(0.4).to_mesh();
    let projector = SurfaceProjector::with_defaults(&mesh)?;

    let mut item = SurfaceProjectedItem::new(Point3::new(1.0, 1.0, 0.5));
    projector.project_item(&mut item, ProjectionMode::TriangleOrEdge)?;
    assert!(item.barycentric().is_valid());

    let json = serde_json::to_string(&item)?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["barycentric"]["triangle_vertices"], serde_json::json!([0, 2, 1]));
    assert_eq!(value["barycentric"]["projection_vertex_count"], 4);
    assert_eq!(value["van_essen"]["valid"], false);

    let restored: SurfaceProjectedItem = serde_json::from_str(&json)?;
    let folded = Primitive::hinge(1.2).to_mesh();
    assert_abs_diff_eq!(
        restored.projected_position(&folded, false).unwrap(),
        item.projected_position(&folded, false).unwrap(),
        epsilon = 1e-9
    );
    Ok(())
}

#[test]
fn test_edge_record_from_json() -> Result<()> {
    let mesh = Primitive::hinge(0.5).to_mesh();
    let projector = SurfaceProjector::with_defaults(&mesh)?;
    let query = Point3::new(-0.2, 1.3, 1.5);
    let record = projector.project_to_edge(&query)?;

    let json = serde_json::to_string_pretty(&record)?;
    let restored: VanEssenProjection = serde_json::from_str(&json)?;
    assert_eq!(restored.vertex(), record.vertex());
    assert_abs_diff_eq!(restored.d_r(), record.d_r(), epsilon = 1e-12);

    let flat = Primitive::hinge(0.0).to_mesh();
    assert_abs_diff_eq!(
        restored.unproject(&flat, true)?,
        record.unproject(&flat, true)?,
        epsilon = 1e-9
    );
    Ok(())
}

#[test]
fn test_hand_written_barycentric_record() -> Result<()> {
    let json = r#"{
        "triangle_vertices": [0, 1, 2],
        "triangle_areas": [1.0, 1.0, 2.0],
        "signed_distance_above_surface": -1.0,
        "projection_vertex_count": 0,
        "valid": true,
        "degenerate": false
    }"#;
    let record: BarycentricProjection = serde_json::from_str(json)?;
    let grid = Primitive::grid(4.0, 1).to_mesh();

    // Weights 1:1:2 over (0,0), (4,0), (0,4)
    assert_abs_diff_eq!(record.unproject(&grid, true)?, Point3::new(1.0, 2.0, -1.0), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_config_file_drives_projector() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "surface_offset = 2.5")?;
    writeln!(file, "triangle_area_tolerance = -0.05")?;
    writeln!(file, "perturbation_seed = 7")?;

    let config = ProjectorConfig::from_file(file.path())?;
    assert_eq!(config.surface_offset, Some(2.5));
    assert_eq!(config.triangle_area_tolerance, -0.05);
    assert_eq!(config.perturbation_seed, Some(7));
    assert_eq!(config.projection_distance_error, 0.5);

    let mesh = Primitive::grid(2.0, 2).to_mesh();
    let projector = SurfaceProjector::new(&mesh, config)?;
    let (_, record) = projector.project_barycentric(&Point3::new(0.6, 1.3, -4.0))?;
    assert_eq!(record.signed_distance_above_surface(), 2.5);
    assert_abs_diff_eq!(record.unproject(&mesh, true)?, Point3::new(0.6, 1.3, 2.5), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_bad_config_file_is_rejected() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "projection_distance_error = -1.0")?;
    assert!(ProjectorConfig::from_file(file.path()).is_err());

    let mut garbage = NamedTempFile::new()?;
    writeln!(garbage, "surface_offset = \"high\"")?;
    let error = ProjectorConfig::from_file(garbage.path()).unwrap_err();
    assert!(error.to_string().contains("Failed to parse config file"));
    Ok(())
}
