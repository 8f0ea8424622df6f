//! Visitor pattern for leaf traversal.
//!
//! Visitors receive every leaf that carries a payload, either in plain
//! pre-order or ordered by distance from a viewpoint.

use nalgebra::Point3;

use super::{NodeId, Tree};

/// Visitor for processing payload leaves during traversal.
pub trait LeafVisitor<P> {
    /// Called once for each leaf that carries a payload.
    fn visit(&mut self, leaf: NodeId, payload: &P);
}

/// A visitor that records the ids of all visited leaves.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<NodeId>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaves(&self) -> &[NodeId] {
        &self.collected
    }

    pub fn into_leaves(self) -> Vec<NodeId> {
        self.collected
    }
}

impl<P> LeafVisitor<P> for CollectingVisitor {
    fn visit(&mut self, leaf: NodeId, _payload: &P) {
        self.collected.push(leaf);
    }
}

/// A visitor that calls a closure for each leaf.
pub struct FnVisitor<F> {
    func: F,
}

impl<F> FnVisitor<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<P, F> LeafVisitor<P> for FnVisitor<F>
where
    F: FnMut(NodeId, &P),
{
    fn visit(&mut self, leaf: NodeId, payload: &P) {
        (self.func)(leaf, payload);
    }
}

impl<P> Tree<P> {
    /// Visits all payload leaves in pre-order.
    pub fn visit_leaves<V: LeafVisitor<P>>(&self, visitor: &mut V) {
        for id in self.iter() {
            if let Ok(node) = self.node(id) {
                if let (true, Some(payload)) = (node.is_leaf(), node.payload.as_ref()) {
                    visitor.visit(id, payload);
                }
            }
        }
    }

    /// Visits payload leaves nearest-first as seen from `eye`.
    ///
    /// Binary nodes visit the child on the eye's side of the splitter first;
    /// cell-based nodes visit children by increasing distance to `eye`.
    pub fn traverse_front_to_back<V: LeafVisitor<P>>(&self, eye: Point3<f32>, visitor: &mut V) {
        self.traverse_ordered(self.root(), &eye, false, visitor);
    }

    /// Visits payload leaves farthest-first as seen from `eye`.
    pub fn traverse_back_to_front<V: LeafVisitor<P>>(&self, eye: Point3<f32>, visitor: &mut V) {
        self.traverse_ordered(self.root(), &eye, true, visitor);
    }

    fn traverse_ordered<V: LeafVisitor<P>>(
        &self,
        id: NodeId,
        eye: &Point3<f32>,
        reverse: bool,
        visitor: &mut V,
    ) {
        let Ok(node) = self.node(id) else {
            return;
        };
        if node.is_leaf() {
            if let Some(payload) = node.payload.as_ref() {
                visitor.visit(id, payload);
            }
            return;
        }

        let mut order: Vec<NodeId> = match node.partition.split_offset(eye) {
            Some((offset, positive)) => {
                let eye_side = if offset >= 0.0 { positive } else { 1 - positive };
                let mut order = node.children.clone();
                if eye_side < order.len() {
                    order.swap(0, eye_side);
                }
                order
            }
            None => {
                let mut ranked: Vec<(f32, NodeId)> = node
                    .children
                    .iter()
                    .filter_map(|child| {
                        let cell = self.node(*child).ok()?;
                        Some((cell.partition.distance_squared(eye), *child))
                    })
                    .collect();
                ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
                ranked.into_iter().map(|(_, child)| child).collect()
            }
        };
        if reverse {
            order.reverse();
        }

        for child in order {
            self.traverse_ordered(child, eye, reverse, visitor);
        }
    }
}
