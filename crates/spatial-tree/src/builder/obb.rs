//! OBB-tree construction: nested oriented boxes.

use log::debug;

use crate::error::{BuildError, TreeError};
use crate::geometry::Obb;
use crate::tree::{NodeId, Partition, Tree};

/// Builds a containment hierarchy of oriented boxes.
///
/// The root is an unbounded box. Each box, in input order, becomes a new
/// child of the deepest existing node whose box fully contains it; its
/// payload is its index in `boxes`. A box inserted before its container
/// stays a sibling of it. Returns `Ok(None)` for an empty list.
pub fn build_obb_tree(boxes: &[Obb]) -> Result<Option<Tree<usize>>, BuildError> {
    if boxes.is_empty() {
        return Ok(None);
    }

    let mut tree = Tree::new(Partition::Obb {
        obb: Obb::unbounded(),
    });
    for (index, obb) in boxes.iter().enumerate() {
        let parent = deepest_container(&tree, tree.root(), obb, None)?;
        let node = tree.add_child(parent, Partition::Obb { obb: *obb })?;
        tree.set_payload(node, index)?;
    }

    debug!(
        "obb-tree: {} boxes, {} nodes, depth {}",
        boxes.len(),
        tree.node_count(),
        tree.depth()
    );
    Ok(Some(tree))
}

/// Gives node `id` the box `obb` and re-links it below the deepest node
/// that contains the new box.
///
/// The search climbs from the current parent to the nearest ancestor that
/// still contains the box, then descends through the other children. With
/// `update_children`, direct children that no longer fit inside the new box
/// first move up to the node's old parent. The root keeps its unbounded box.
pub fn move_obb<P>(tree: &mut Tree<P>, id: NodeId, obb: Obb, update_children: bool) -> Result<(), TreeError> {
    let Some(parent) = tree.parent(id)? else {
        return Ok(());
    };
    *tree.partition_mut(id)? = Partition::Obb { obb };

    if update_children {
        let escaped: Vec<NodeId> = tree
            .children(id)?
            .iter()
            .copied()
            .filter(|child| {
                matches!(tree.partition(*child), Ok(Partition::Obb { obb: inner }) if !obb.contains_obb(inner))
            })
            .collect();
        for child in escaped {
            tree.reparent(child, parent)?;
        }
    }

    let mut ancestor = parent;
    while !node_contains(tree, ancestor, &obb).unwrap_or(false) {
        match tree.parent(ancestor)? {
            Some(up) => ancestor = up,
            None => break,
        }
    }
    let target = deepest_container(tree, ancestor, &obb, Some(id))?;
    if target != parent {
        debug!("obb-tree: node {id} moves from {parent} to {target}");
        tree.reparent(id, target)?;
    }
    Ok(())
}

/// Whether the box of node `id` contains `obb`; `None` for non-OBB nodes.
fn node_contains<P>(tree: &Tree<P>, id: NodeId, obb: &Obb) -> Option<bool> {
    match tree.partition(id) {
        Ok(Partition::Obb { obb: outer }) => Some(outer.contains_obb(obb)),
        _ => None,
    }
}

/// The deepest node at or below `from` whose box contains `obb`, never
/// entering the subtree of `skip`.
fn deepest_container<P>(tree: &Tree<P>, from: NodeId, obb: &Obb, skip: Option<NodeId>) -> Result<NodeId, TreeError> {
    let mut parent = from;
    loop {
        let container = tree
            .children(parent)?
            .iter()
            .copied()
            .find(|child| Some(*child) != skip && node_contains(tree, *child, obb) == Some(true));
        match container {
            Some(child) => parent = child,
            None => return Ok(parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, UnitQuaternion, Vector3};
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn empty_list_builds_nothing() {
        assert!(build_obb_tree(&[]).unwrap().is_none());
    }

    #[test]
    fn boxes_nest_by_containment() {
        let boxes = [
            Obb::axis_aligned(Point3::origin(), Vector3::repeat(10.0)),
            Obb::axis_aligned(Point3::new(5.0, 0.0, 0.0), Vector3::repeat(2.0)),
            Obb::new(
                Point3::new(5.0, 0.0, 0.0),
                UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_4),
                Vector3::repeat(0.5),
            ),
            Obb::axis_aligned(Point3::new(50.0, 0.0, 0.0), Vector3::repeat(1.0)),
        ];
        let tree = build_obb_tree(&boxes).unwrap().unwrap();
        let root = tree.root();

        let top: Vec<usize> = tree
            .children(root)
            .unwrap()
            .iter()
            .map(|id| *tree.payload(*id).unwrap().unwrap())
            .collect();
        assert_eq!(top, vec![0, 3]);

        let rotated = tree.find_leaf(&Point3::new(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(tree.payload(rotated).unwrap(), Some(&2));
        assert_eq!(tree.level(rotated).unwrap(), 3);

        let outer_only = tree.find_leaf(&Point3::new(-8.0, 0.0, 0.0)).unwrap();
        assert_eq!(tree.payload(outer_only).unwrap(), Some(&0));
    }

    fn node_with(tree: &Tree<usize>, index: usize) -> NodeId {
        tree.iter()
            .find(|id| tree.payload(*id).unwrap() == Some(&index))
            .unwrap()
    }

    fn cube(x: f32, half: f32) -> Obb {
        Obb::axis_aligned(Point3::new(x, 0.0, 0.0), Vector3::repeat(half))
    }

    #[test]
    fn moved_box_follows_its_new_container() {
        let mut tree = build_obb_tree(&[cube(0.0, 10.0), cube(50.0, 10.0), cube(5.0, 1.0)])
            .unwrap()
            .unwrap();
        let (left, right, small) = (node_with(&tree, 0), node_with(&tree, 1), node_with(&tree, 2));
        assert_eq!(tree.parent(small).unwrap(), Some(left));

        move_obb(&mut tree, small, cube(52.0, 1.0), false).unwrap();
        assert_eq!(tree.parent(small).unwrap(), Some(right));
        assert!(tree.is_leaf(left).unwrap());
        assert_eq!(tree.find_leaf(&Point3::new(52.0, 0.0, 0.0)), Some(small));

        // Too big for either container: back to the root.
        move_obb(&mut tree, small, cube(30.0, 15.0), false).unwrap();
        assert_eq!(tree.parent(small).unwrap(), Some(tree.root()));

        // A small move inside the current container keeps the link.
        move_obb(&mut tree, left, cube(1.0, 10.0), false).unwrap();
        assert_eq!(tree.parent(left).unwrap(), Some(tree.root()));
    }

    #[test]
    fn shrunk_box_releases_children_to_its_parent() {
        let mut tree = build_obb_tree(&[cube(0.0, 10.0), cube(5.0, 2.0), cube(4.0, 0.5), cube(6.0, 0.5)])
            .unwrap()
            .unwrap();
        let outer = node_with(&tree, 0);
        let middle = node_with(&tree, 1);
        let (kept, released) = (node_with(&tree, 3), node_with(&tree, 2));
        assert_eq!(tree.children(middle).unwrap(), &[released, kept]);

        move_obb(&mut tree, middle, cube(6.0, 1.0), true).unwrap();
        assert_eq!(tree.parent(middle).unwrap(), Some(outer));
        assert_eq!(tree.children(middle).unwrap(), &[kept]);
        assert_eq!(tree.parent(released).unwrap(), Some(outer));

        // Without the child pass, children travel with their parent.
        move_obb(&mut tree, middle, cube(-50.0, 1.0), false).unwrap();
        assert_eq!(tree.parent(middle).unwrap(), Some(tree.root()));
        assert_eq!(tree.root_of(kept).unwrap(), tree.root());
        assert_eq!(tree.parent(kept).unwrap(), Some(middle));
    }

    #[test]
    fn root_box_is_never_moved() {
        let mut tree = build_obb_tree(&[cube(0.0, 1.0)]).unwrap().unwrap();
        let root = tree.root();
        move_obb(&mut tree, root, cube(0.0, 0.5), true).unwrap();
        assert_eq!(tree.partition(root).unwrap(), &Partition::Obb { obb: Obb::unbounded() });
        assert_eq!(tree.children(root).unwrap().len(), 1);
    }
}
