// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vertex and edge adjacency for triangle meshes
//! Provides the connectivity queries the projector walks: neighbour lists,
//! triangle fans and the triangle on the other side of an edge

use ahash::AHashMap;

/// Undirected edge with the smaller vertex index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub usize, pub usize);

impl EdgeKey {
    pub fn new(a: usize, b: usize) -> Self {
        if a < b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Adjacency derived once from a triangle list
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Sorted, de-duplicated neighbours of each vertex
    neighbors: Vec<Vec<usize>>,
    /// Triangles using each vertex, in triangle order
    vertex_triangles: Vec<Vec<usize>>,
    /// Triangles using each edge (one for boundary edges, two for interior)
    edge_triangles: AHashMap<EdgeKey, Vec<usize>>,
}

impl Topology {
    /// Build adjacency; every index in `triangles` must be below `vertex_count`
    pub fn build(vertex_count: usize, triangles: &[[usize; 3]]) -> Self {
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        let mut vertex_triangles: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        let mut edge_triangles: AHashMap<EdgeKey, Vec<usize>> = AHashMap::new();

        for (triangle_index, triangle) in triangles.iter().enumerate() {
            for corner in 0..3 {
                let from = triangle[corner];
                let to = triangle[(corner + 1) % 3];

                vertex_triangles[from].push(triangle_index);
                neighbors[from].push(to);
                neighbors[to].push(from);

                edge_triangles
                    .entry(EdgeKey::new(from, to))
                    .or_default()
                    .push(triangle_index);
            }
        }

        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            neighbors,
            vertex_triangles,
            edge_triangles,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        self.neighbors.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vertex_triangles(&self, vertex: usize) -> &[usize] {
        self.vertex_triangles.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vertex_has_neighbors(&self, vertex: usize) -> bool {
        !self.neighbors(vertex).is_empty()
    }

    /// Triangle using edge `(a, b)` other than `exclude`
    pub fn triangle_sharing_edge(&self, a: usize, b: usize, exclude: usize) -> Option<usize> {
        self.edge_triangles
            .get(&EdgeKey::new(a, b))?
            .iter()
            .copied()
            .find(|&triangle| triangle != exclude)
    }

    /// All undirected edges, in no particular order
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edge_triangles.keys().copied()
    }

    /// All undirected edges in ascending vertex order
    pub fn sorted_edges(&self) -> Vec<EdgeKey> {
        let mut edges: Vec<EdgeKey> = self.edges().collect();
        edges.sort_unstable();
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.edge_triangles.len()
    }

    /// Edges used by exactly one triangle
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_triangles.values().filter(|t| t.len() == 1).count()
    }

    /// Every edge shared by exactly two triangles
    pub fn is_closed(&self) -> bool {
        self.edge_triangles.values().all(|t| t.len() == 2)
    }
}
