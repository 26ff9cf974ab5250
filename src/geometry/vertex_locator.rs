// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) over vertex positions
//! Used to answer nearest-vertex queries without scanning the whole surface

use super::BoundingBox;
use nalgebra::Point3;

/// BVH node
#[derive(Debug, Clone)]
struct LocatorNode {
    /// Bounding box of this node
    bbox: BoundingBox,
    /// Left child (None for leaf)
    left: Option<Box<LocatorNode>>,
    /// Right child (None for leaf)
    right: Option<Box<LocatorNode>>,
    /// Vertex indices (only for leaf nodes)
    vertex_indices: Vec<usize>,
}

impl LocatorNode {
    fn leaf(bbox: BoundingBox, vertex_indices: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            vertex_indices,
        }
    }

    fn internal(bbox: BoundingBox, left: Box<LocatorNode>, right: Box<LocatorNode>) -> Self {
        Self {
            bbox,
            left: Some(left),
            right: Some(right),
            vertex_indices: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Nearest-vertex index for a fixed set of points
#[derive(Debug, Clone)]
pub struct VertexLocator {
    root: LocatorNode,
    positions: Vec<Point3<f64>>,
}

impl VertexLocator {
    const MAX_DEPTH: usize = 32;
    const LEAF_SIZE: usize = 8;

    /// Build the hierarchy over `positions`
    pub fn build(positions: &[Point3<f64>]) -> Self {
        let entries: Vec<usize> = (0..positions.len()).collect();
        let root = if entries.is_empty() {
            LocatorNode::leaf(BoundingBox::empty(), Vec::new())
        } else {
            Self::build_recursive(positions, entries, 0)
        };
        Self {
            root,
            positions: positions.to_vec(),
        }
    }

    fn build_recursive(positions: &[Point3<f64>], mut entries: Vec<usize>, depth: usize) -> LocatorNode {
        let bbox = BoundingBox::from_points(entries.iter().map(|&i| &positions[i]));

        if entries.len() <= Self::LEAF_SIZE || depth >= Self::MAX_DEPTH {
            return LocatorNode::leaf(bbox, entries);
        }

        let axis = bbox.longest_axis();
        entries.sort_by(|&a, &b| positions[a][axis].total_cmp(&positions[b][axis]));

        // Split at median
        let right_entries = entries.split_off(entries.len() / 2);
        let left = Box::new(Self::build_recursive(positions, entries, depth + 1));
        let right = Box::new(Self::build_recursive(positions, right_entries, depth + 1));

        LocatorNode::internal(left.bbox.union(&right.bbox), left, right)
    }

    /// Number of indexed vertices
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Index of the vertex nearest `point`; exact ties go to the lower index
    pub fn nearest(&self, point: &Point3<f64>) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }
        let mut best: Option<(f64, usize)> = None;
        self.nearest_recursive(&self.root, point, &mut best);
        best.map(|(_, index)| index)
    }

    fn nearest_recursive(&self, node: &LocatorNode, point: &Point3<f64>, best: &mut Option<(f64, usize)>) {
        if let Some((best_distance, _)) = *best {
            if node.bbox.distance_squared_to_point(point) > best_distance {
                return;
            }
        }

        if node.is_leaf() {
            for &index in &node.vertex_indices {
                let distance = (self.positions[index] - point).norm_squared();
                let closer = match *best {
                    None => true,
                    Some((best_distance, best_index)) => {
                        distance < best_distance || (distance == best_distance && index < best_index)
                    }
                };
                if closer {
                    *best = Some((distance, index));
                }
            }
            return;
        }

        // Visit the nearer child first so the farther one is more often pruned
        if let (Some(left), Some(right)) = (&node.left, &node.right) {
            let left_distance = left.bbox.distance_squared_to_point(point);
            let right_distance = right.bbox.distance_squared_to_point(point);
            if left_distance <= right_distance {
                self.nearest_recursive(left, point, best);
                self.nearest_recursive(right, point, best);
            } else {
                self.nearest_recursive(right, point, best);
                self.nearest_recursive(left, point, best);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(positions: &[Point3<f64>], point: &Point3<f64>) -> usize {
        let mut best = 0;
        for (i, p) in positions.iter().enumerate() {
            if (p - point).norm_squared() < (positions[best] - point).norm_squared() {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_empty_locator() {
        let locator = VertexLocator::build(&[]);
        assert!(locator.is_empty());
        assert_eq!(locator.nearest(&Point3::origin()), None);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut positions = Vec::new();
        for i in 0..12 {
            for j in 0..12 {
                let x = i as f64 * 0.7;
                let y = j as f64 * 1.3;
                positions.push(Point3::new(x, y, (x * 0.5).sin() + (y * 0.3).cos()));
            }
        }
        let locator = VertexLocator::build(&positions);
        assert_eq!(locator.len(), positions.len());

        let queries = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.3, 7.1, 2.0),
            Point3::new(-4.0, 20.0, -1.0),
            Point3::new(7.7, 0.4, 0.9),
        ];
        for query in &queries {
            assert_eq!(locator.nearest(query), Some(brute_force(&positions, query)));
        }
    }

    #[test]
    fn test_tie_prefers_lower_index() {
        let positions = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let locator = VertexLocator::build(&positions);
        assert_eq!(locator.nearest(&Point3::new(0.0, 0.0, 0.0)), Some(0));
    }
}
