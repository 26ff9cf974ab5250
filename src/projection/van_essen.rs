// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge (Van Essen) projection record
//!
//! Used when no triangle encloses a point. The point is described relative
//! to the edge shared by the nearest triangle and its neighbour across that
//! edge: where its foot falls along the edge (`frac_ri`, `frac_rj`), how far
//! it is from the edge (`d_r`), the dihedral angle between the two triangles
//! (`phi_r`) and the angle between the point's offset and the first
//! triangle's normal (`theta_r`).
//!
//! Unprojection rescales `theta_r` onto the dihedral angle of the target
//! surface, so points near a fold follow the fold as it opens or closes.
//!
//! Both triangles are stored with their first and last corners swapped, and
//! the coordinates of the triangles, the edge endpoints and the query point
//! are frozen at projection time. When the edge lies on the surface boundary
//! the second triangle is recorded as all zeros.

use super::{check_vertex_count, resolve_vertex, VertexIndex, UNSET_VERTEX};
use crate::error::ReconstructionFailure;
use crate::geometry::MeshView;
use crate::utils::math::{
    calculate_triangle_normal, closest_point_on_line, normalize_or_zero, project_point_to_plane,
    safe_acos,
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nearest triangle and edge chosen for an edge projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EdgeSelection {
    pub triangle: usize,
    pub edge: (usize, usize),
    /// Triangle across `edge`; `None` on the surface boundary
    pub opposite: Option<usize>,
}

/// Edge-relative polar description of a point near a surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VanEssenProjection {
    tri_vertices: [[VertexIndex; 3]; 2],
    tri_anatomical: [[Point3<f64>; 3]; 2],
    vertex: [VertexIndex; 2],
    vertex_anatomical: [Point3<f64>; 2],
    pos_anatomical: Point3<f64>,
    d_r: f64,
    theta_r: f64,
    phi_r: f64,
    frac_ri: f64,
    frac_rj: f64,
    /// Vertex count of the surface projected to; zero when unknown
    projection_vertex_count: usize,
    valid: bool,
}

impl Default for VanEssenProjection {
    fn default() -> Self {
        Self {
            tri_vertices: [[UNSET_VERTEX; 3]; 2],
            tri_anatomical: [[Point3::origin(); 3]; 2],
            vertex: [UNSET_VERTEX; 2],
            vertex_anatomical: [Point3::origin(); 2],
            pos_anatomical: Point3::origin(),
            d_r: 0.0,
            theta_r: 0.0,
            phi_r: 0.0,
            frac_ri: 0.0,
            frac_rj: 0.0,
            projection_vertex_count: 0,
            valid: false,
        }
    }
}

/// Positions of `point` along the edge measured from each endpoint, as
/// fractions of the edge length; zero for a zero-length edge
fn edge_fractions(ci: &Point3<f64>, cj: &Point3<f64>, point: &Point3<f64>) -> (f64, f64) {
    let length = (cj - ci).norm();
    if length > 0.0 {
        ((point - ci).norm() / length, (point - cj).norm() / length)
    } else {
        (0.0, 0.0)
    }
}

fn swapped_corners(triangle: [usize; 3]) -> [usize; 3] {
    [triangle[2], triangle[1], triangle[0]]
}

impl VanEssenProjection {
    /// An empty, invalid record
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe `query` relative to the selected edge of `mesh`.
    ///
    /// `under_surface` flips both triangle normals so angles are measured on
    /// the side of the surface the point is on. A `surface_offset` replaces
    /// the point's height above the nearest triangle.
    pub(crate) fn from_edge<M: MeshView + ?Sized>(
        mesh: &M,
        query: &Point3<f64>,
        selection: EdgeSelection,
        under_surface: bool,
        surface_offset: Option<f64>,
    ) -> Self {
        let EdgeSelection {
            triangle: tri_a,
            edge: (i_r, j_r),
            opposite: tri_b,
        } = selection;

        let corners_a = mesh.triangle_coordinates(tri_a);
        let plane_normal = mesh.triangle_normal(tri_a);
        let on_plane = project_point_to_plane(query, &corners_a[0], &plane_normal);

        let mut xyz = *query;
        if let Some(offset) = surface_offset {
            xyz = on_plane + plane_normal * offset;
        }

        let coord_ir = mesh.coordinate(i_r);
        let coord_jr = mesh.coordinate(j_r);

        let flip = if under_surface { -1.0 } else { 1.0 };
        let normal_a = mesh.triangle_normal(tri_a) * flip;
        let normal_b = tri_b.map(|b| mesh.triangle_normal(b) * flip);

        if tri_b.is_none() {
            // Stored records keep the square root of the height over the plane
            let d_r = (xyz - on_plane).norm().sqrt();
            let mut foot = closest_point_on_line(&coord_ir, &coord_jr, &xyz);
            let (frac_ri, frac_rj) = edge_fractions(&coord_ir, &coord_jr, &foot);
            if frac_ri > 1.0 {
                foot = coord_jr;
            }
            if frac_rj > 1.0 {
                foot = coord_ir;
            }
            let side = normalize_or_zero(&(xyz - on_plane)).dot(&normal_a);
            xyz = foot + normal_a * (d_r * side);
        }

        let qr = closest_point_on_line(&coord_ir, &coord_jr, &xyz);

        let phi_r = normal_b
            .map(|nb| safe_acos(normal_a.dot(&nb).min(1.0)))
            .unwrap_or(0.0);

        let cos_theta = normal_a.dot(&normalize_or_zero(&(xyz - qr)));
        let theta_r = if cos_theta > 0.0 { safe_acos(cos_theta) } else { 0.0 };

        let (frac_ri, frac_rj) = edge_fractions(&coord_ir, &coord_jr, &qr);
        let d_r = (qr - xyz).norm();

        let nodes_a = swapped_corners(mesh.triangle(tri_a));
        let (nodes_b, anatomical_b) = match tri_b {
            Some(b) => {
                let nodes = swapped_corners(mesh.triangle(b));
                (
                    nodes.map(|n| n as VertexIndex),
                    nodes.map(|n| mesh.coordinate(n)),
                )
            }
            None => ([0; 3], [Point3::origin(); 3]),
        };

        Self {
            tri_vertices: [nodes_a.map(|n| n as VertexIndex), nodes_b],
            tri_anatomical: [nodes_a.map(|n| mesh.coordinate(n)), anatomical_b],
            vertex: [i_r as VertexIndex, j_r as VertexIndex],
            vertex_anatomical: [coord_ir, coord_jr],
            pos_anatomical: *query,
            d_r,
            theta_r,
            phi_r,
            frac_ri,
            frac_rj,
            projection_vertex_count: mesh.vertex_count(),
            valid: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn tri_vertices(&self) -> [[VertexIndex; 3]; 2] {
        self.tri_vertices
    }

    pub fn tri_anatomical(&self) -> [[Point3<f64>; 3]; 2] {
        self.tri_anatomical
    }

    pub fn vertex(&self) -> [VertexIndex; 2] {
        self.vertex
    }

    pub fn vertex_anatomical(&self) -> [Point3<f64>; 2] {
        self.vertex_anatomical
    }

    pub fn pos_anatomical(&self) -> Point3<f64> {
        self.pos_anatomical
    }

    pub fn d_r(&self) -> f64 {
        self.d_r
    }

    pub fn theta_r(&self) -> f64 {
        self.theta_r
    }

    pub fn phi_r(&self) -> f64 {
        self.phi_r
    }

    pub fn frac_ri(&self) -> f64 {
        self.frac_ri
    }

    pub fn frac_rj(&self) -> f64 {
        self.frac_rj
    }

    pub fn projection_vertex_count(&self) -> usize {
        self.projection_vertex_count
    }

    /// False when the edge was on the surface boundary at projection time
    pub fn has_opposite_triangle(&self) -> bool {
        self.tri_vertices[1] != [0; 3]
    }

    /// Reconstruct the point on `mesh`.
    ///
    /// Without `preserve_offset` the midpoint of the edge on `mesh` is returned.
    pub fn unproject<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
        preserve_offset: bool,
    ) -> Result<Point3<f64>, ReconstructionFailure> {
        let (pis, pjs) = self.edge_on(mesh)?;
        if !preserve_offset {
            return Ok(nalgebra::center(&pis, &pjs));
        }

        let [anat_i, anat_j] = self.vertex_anatomical;
        let qr = closest_point_on_line(&anat_i, &anat_j, &self.pos_anatomical);
        let qs = self.edge_point(&qr, &pis, &pjs)?;

        if self.tri_vertices.iter().flatten().any(|&v| v < 0) {
            return Err(ReconstructionFailure::InvalidTriangle);
        }

        let normal_a = self.triangle_normal_on(mesh, 0)?;
        let phi_s = if self.has_opposite_triangle() {
            let normal_b = self.triangle_normal_on(mesh, 1)?;
            safe_acos(normal_a.dot(&normal_b).min(1.0))
        } else if self.phi_r > 0.0 {
            return Err(ReconstructionFailure::MissingOppositeTriangle);
        } else {
            0.0
        };

        let theta_s = if self.phi_r > 0.0 {
            (self.theta_r / self.phi_r) * phi_s
        } else {
            0.5 * phi_s
        };

        let [a0, a1, a2] = self.tri_anatomical[0];
        let normal_a_anatomical = calculate_triangle_normal(&a0, &a1, &a2).unwrap_or_else(Vector3::zeros);
        let projection = if normal_a_anatomical == Vector3::zeros() {
            self.pos_anatomical
        } else {
            project_point_to_plane(&self.pos_anatomical, &a2, &normal_a_anatomical)
        };

        // Which side of the edge the point was on, within the first triangle's plane
        let edge_anatomical = normalize_or_zero(&(anat_j - anat_i));
        let across_anatomical = normal_a_anatomical.cross(&edge_anatomical);
        let side = normalize_or_zero(&(projection - qr)).dot(&across_anatomical);

        let across = normal_a.cross(&normalize_or_zero(&(pjs - pis)));
        let ts = qs + across * (side * self.d_r * theta_s.sin());

        let height_sign = normal_a_anatomical.dot(&normalize_or_zero(&(self.pos_anatomical - projection)));
        Ok(ts + normal_a * (self.d_r * height_sign * theta_s.cos()))
    }

    /// Midpoint of the edge on `mesh`, `distance` along the averaged endpoint normals
    pub fn unproject_above_surface<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
        distance: f64,
    ) -> Result<Point3<f64>, ReconstructionFailure> {
        let (pis, pjs) = self.edge_on(mesh)?;
        let midpoint = nalgebra::center(&pis, &pjs);
        if distance == 0.0 {
            return Ok(midpoint);
        }
        let [i, j] = self.resolve_edge(mesh)?;
        let normal = normalize_or_zero(&(mesh.vertex_normal(i) + mesh.vertex_normal(j)));
        Ok(midpoint + normal * distance)
    }

    fn resolve_edge<M: MeshView + ?Sized>(&self, mesh: &M) -> Result<[usize; 2], ReconstructionFailure> {
        Ok([resolve_vertex(mesh, self.vertex[0])?, resolve_vertex(mesh, self.vertex[1])?])
    }

    /// Endpoints of the projection edge on `mesh`, after the shared checks
    fn edge_on<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
    ) -> Result<(Point3<f64>, Point3<f64>), ReconstructionFailure> {
        if !self.valid {
            return Err(ReconstructionFailure::InvalidProjection);
        }
        check_vertex_count(mesh, self.projection_vertex_count)?;

        let [i, j] = self.resolve_edge(mesh)?;
        for vertex in [i, j] {
            if !mesh.vertex_has_neighbors(vertex) {
                return Err(ReconstructionFailure::DisconnectedVertex { vertex });
            }
        }
        Ok((mesh.coordinate(i), mesh.coordinate(j)))
    }

    /// Foot of the point on the target edge. Feet that fell past an endpoint
    /// are extrapolated from the endpoint they passed, chosen by the larger
    /// fraction; an exact tie selects nothing.
    fn edge_point(
        &self,
        qr: &Point3<f64>,
        pis: &Point3<f64>,
        pjs: &Point3<f64>,
    ) -> Result<Point3<f64>, ReconstructionFailure> {
        let (frac_ri, frac_rj) = (self.frac_ri, self.frac_rj);
        let [anat_i, anat_j] = self.vertex_anatomical;

        if frac_ri <= 1.0 && frac_rj <= 1.0 {
            Ok(pis + (pjs - pis) * frac_ri)
        } else if frac_ri > 1.0 && frac_ri > frac_rj {
            let beyond = (qr - anat_j).norm();
            Ok(pjs + normalize_or_zero(&(pjs - pis)) * beyond)
        } else if frac_rj > 1.0 && frac_rj > frac_ri {
            let beyond = (qr - anat_i).norm();
            Ok(pis + normalize_or_zero(&(pis - pjs)) * beyond)
        } else {
            Err(ReconstructionFailure::AmbiguousEdgeFraction { frac_ri, frac_rj })
        }
    }

    /// Normal of a stored triangle recomputed on `mesh`
    fn triangle_normal_on<M: MeshView + ?Sized>(
        &self,
        mesh: &M,
        which: usize,
    ) -> Result<Vector3<f64>, ReconstructionFailure> {
        let [a, b, c] = self.tri_vertices[which];
        let corners = [
            mesh.coordinate(resolve_vertex(mesh, a)?),
            mesh.coordinate(resolve_vertex(mesh, b)?),
            mesh.coordinate(resolve_vertex(mesh, c)?),
        ];
        calculate_triangle_normal(&corners[0], &corners[1], &corners[2])
            .ok_or(ReconstructionFailure::DegenerateTriangle)
    }
}

impl fmt::Display for VanEssenProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return write!(f, "VanEssen: invalid");
        }
        write!(
            f,
            "VanEssen: edge ({}, {}) dR {:.6} thetaR {:.6} phiR {:.6} fracRI {:.6} fracRJ {:.6}",
            self.vertex[0], self.vertex[1], self.d_r, self.theta_r, self.phi_r, self.frac_ri, self.frac_rj
        )
    }
}
