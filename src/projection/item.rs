// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! A located thing (focus, sample, annotation) with its stereotaxic
//! position and the projections that tie it to a surface

use super::{BarycentricProjection, ProjectionResult, VanEssenProjection};
use crate::geometry::MeshView;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProjectedItem {
    stereotaxic_xyz: Option<Point3<f64>>,
    barycentric: BarycentricProjection,
    van_essen: VanEssenProjection,
}

impl SurfaceProjectedItem {
    pub fn new(stereotaxic_xyz: Point3<f64>) -> Self {
        Self {
            stereotaxic_xyz: Some(stereotaxic_xyz),
            ..Self::default()
        }
    }

    pub fn stereotaxic_xyz(&self) -> Option<Point3<f64>> {
        self.stereotaxic_xyz
    }

    pub fn set_stereotaxic_xyz(&mut self, xyz: Option<Point3<f64>>) {
        self.stereotaxic_xyz = xyz;
    }

    pub fn barycentric(&self) -> &BarycentricProjection {
        &self.barycentric
    }

    pub fn van_essen(&self) -> &VanEssenProjection {
        &self.van_essen
    }

    /// Replace both projections with the records of `result`
    pub fn set_projection(&mut self, result: ProjectionResult) {
        self.barycentric = result.barycentric;
        self.van_essen = result.van_essen.unwrap_or_default();
    }

    /// Forget both projections, keeping the stereotaxic position
    pub fn clear_projection(&mut self) {
        self.barycentric = BarycentricProjection::new();
        self.van_essen = VanEssenProjection::new();
    }

    pub fn has_valid_projection(&self) -> bool {
        self.barycentric.is_valid() || self.van_essen.is_valid()
    }

    /// Position of the item on `mesh`.
    ///
    /// Tries the barycentric projection, then the edge projection, then falls
    /// back to the stereotaxic position. With `onto_surface` the offset from
    /// the surface is dropped.
    pub fn projected_position<M: MeshView + ?Sized>(&self, mesh: &M, onto_surface: bool) -> Option<Point3<f64>> {
        self.unprojected(|| self.barycentric.unproject(mesh, !onto_surface).ok(), || {
            self.van_essen.unproject(mesh, !onto_surface).ok()
        })
    }

    /// Position of the item `distance` above (negative is below) `mesh`
    pub fn projected_position_above_surface<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
        distance: f64,
    ) -> Option<Point3<f64>> {
        self.unprojected(
            || self.barycentric.unproject_above_surface(mesh, distance).ok(),
            || self.van_essen.unproject_above_surface(mesh, distance).ok(),
        )
    }

    /// Move the stereotaxic position to the item's position on `mesh`;
    /// returns false and leaves the item untouched when nothing applies
    pub fn unproject_to_stereotaxic<M: MeshView + ?Sized>(&mut self, mesh: &M, onto_surface: bool) -> bool {
        match self.projected_position(mesh, onto_surface) {
            Some(xyz) => {
                self.stereotaxic_xyz = Some(xyz);
                true
            }
            None => false,
        }
    }

    fn unprojected(
        &self,
        barycentric: impl FnOnce() -> Option<Point3<f64>>,
        van_essen: impl FnOnce() -> Option<Point3<f64>>,
    ) -> Option<Point3<f64>> {
        let from_barycentric = if self.barycentric.is_valid() { barycentric() } else { None };
        from_barycentric
            .or_else(|| if self.van_essen.is_valid() { van_essen() } else { None })
            .or(self.stereotaxic_xyz)
    }
}
