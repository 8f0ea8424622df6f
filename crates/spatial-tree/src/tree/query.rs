//! Point, sphere, segment and capsule queries.
//!
//! Queries never fail: ids are only produced by the tree itself, and a probe
//! outside the root region simply finds nothing. List queries append the
//! leaves that carry a payload to a caller-supplied vector, in traversal
//! order.

use nalgebra::Point3;

use super::{Node, NodeId, Tree};
use crate::geometry::Segment;

impl<P> Tree<P> {
    /// The leaf whose region contains `point`, regardless of its payload.
    ///
    /// Fixed-arity nodes pick the child by the point's side of each split,
    /// so a point on a shared face lands in the upper cell. Variable-arity
    /// (OBB) nodes descend into the first child containing the point, so the
    /// deepest containing node is returned. `None` when the point is outside
    /// the root.
    pub fn find_leaf(&self, point: &Point3<f32>) -> Option<NodeId> {
        let mut current = self.root();
        let mut node = self.node(current).ok()?;
        if !node.partition.contains_point(point) {
            return None;
        }

        while !node.is_leaf() {
            let next = match node.partition.child_index(point) {
                Some(index) => node.children.get(index).copied(),
                None => node.children.iter().copied().find(|child| {
                    self.node(*child)
                        .is_ok_and(|c| c.partition.contains_point(point))
                }),
            };
            let Some(next) = next else {
                break;
            };
            current = next;
            node = self.node(current).ok()?;
        }

        Some(current)
    }

    /// Leaves whose region intersects the sphere around `center`.
    pub fn find_leaves_in_sphere(&self, center: &Point3<f32>, radius: f32, out: &mut Vec<NodeId>) {
        let radius = radius.max(0.0);
        let root = self.root();
        if let Ok(node) = self.node(root) {
            if node.partition.distance_squared(center) <= radius * radius {
                self.sphere_leaves(root, center, radius, out);
            }
        }
    }

    /// Leaves whose region is crossed by `segment`.
    pub fn find_leaves_on_segment(&self, segment: &Segment, out: &mut Vec<NodeId>) {
        let root = self.root();
        if let Ok(node) = self.node(root) {
            if let Some((t0, t1)) = node.partition.clip_segment(segment, 0.0, 0.0, 1.0) {
                self.segment_leaves(root, segment, t0, t1, out);
            }
        }
    }

    /// Leaves whose region may intersect the capsule of `radius` around
    /// `segment`. Cell tests use the cell grown by `radius`, so the result
    /// is conservative near cell corners.
    pub fn find_leaves_on_capsule(&self, segment: &Segment, radius: f32, out: &mut Vec<NodeId>) {
        let radius = radius.max(0.0);
        let root = self.root();
        if let Ok(node) = self.node(root) {
            if node.partition.clip_segment(segment, radius, 0.0, 1.0).is_some() {
                self.capsule_leaves(root, segment, radius, out);
            }
        }
    }

    fn sphere_leaves(&self, id: NodeId, center: &Point3<f32>, radius: f32, out: &mut Vec<NodeId>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        if collect_leaf(id, node, out) {
            return;
        }

        match node.partition.split_offset(center) {
            Some((offset, positive)) => {
                for child in binary_reach(&node.children, positive, offset, offset, radius) {
                    self.sphere_leaves(child, center, radius, out);
                }
            }
            None => {
                for &child in &node.children {
                    let reached = self
                        .node(child)
                        .is_ok_and(|c| c.partition.distance_squared(center) <= radius * radius);
                    if reached {
                        self.sphere_leaves(child, center, radius, out);
                    }
                }
            }
        }
    }

    /// `t0..t1` is the part of the segment already known to be inside `id`.
    fn segment_leaves(&self, id: NodeId, segment: &Segment, t0: f32, t1: f32, out: &mut Vec<NodeId>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        if collect_leaf(id, node, out) {
            return;
        }

        let start = segment.point_at(t0);
        let end = segment.point_at(t1);
        match (
            node.partition.split_offset(&start),
            node.partition.split_offset(&end),
        ) {
            (Some((d0, positive)), Some((d1, _))) => {
                let first = if d0 >= 0.0 { positive } else { 1 - positive };
                if (d0 >= 0.0) == (d1 >= 0.0) {
                    if let Some(&child) = node.children.get(first) {
                        self.segment_leaves(child, segment, t0, t1, out);
                    }
                } else {
                    // Crosses the splitter: visit both halves in segment order.
                    let t = t0 + (t1 - t0) * d0 / (d0 - d1);
                    if let Some(&child) = node.children.get(first) {
                        self.segment_leaves(child, segment, t0, t, out);
                    }
                    if let Some(&child) = node.children.get(1 - first) {
                        self.segment_leaves(child, segment, t, t1, out);
                    }
                }
            }
            _ => {
                for &child in &node.children {
                    let clipped = self
                        .node(child)
                        .ok()
                        .and_then(|c| c.partition.clip_segment(segment, 0.0, t0, t1));
                    if let Some((c0, c1)) = clipped {
                        self.segment_leaves(child, segment, c0, c1, out);
                    }
                }
            }
        }
    }

    fn capsule_leaves(&self, id: NodeId, segment: &Segment, radius: f32, out: &mut Vec<NodeId>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        if collect_leaf(id, node, out) {
            return;
        }

        match (
            node.partition.split_offset(&segment.start),
            node.partition.split_offset(&segment.end),
        ) {
            (Some((d0, positive)), Some((d1, _))) => {
                for child in binary_reach(&node.children, positive, d0.min(d1), d0.max(d1), radius) {
                    self.capsule_leaves(child, segment, radius, out);
                }
            }
            _ => {
                for &child in &node.children {
                    let reached = self
                        .node(child)
                        .is_ok_and(|c| c.partition.clip_segment(segment, radius, 0.0, 1.0).is_some());
                    if reached {
                        self.capsule_leaves(child, segment, radius, out);
                    }
                }
            }
        }
    }
}

/// Pushes `id` if it is a leaf with a payload. Returns `true` for any leaf.
fn collect_leaf<P>(id: NodeId, node: &Node<P>, out: &mut Vec<NodeId>) -> bool {
    if !node.is_leaf() {
        return false;
    }
    if node.payload.is_some() {
        out.push(id);
    }
    true
}

/// Children of a binary node reached by a probe whose splitter offsets span
/// `low..=high`, widened by `radius`.
fn binary_reach(
    children: &[NodeId],
    positive: usize,
    low: f32,
    high: f32,
    radius: f32,
) -> impl Iterator<Item = NodeId> + '_ {
    children
        .iter()
        .enumerate()
        .filter(move |(index, _)| {
            if *index == positive {
                high >= -radius
            } else {
                low < radius
            }
        })
        .map(|(_, child)| *child)
}
