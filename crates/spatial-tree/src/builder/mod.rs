//! Tree construction from meshes, scene objects and bounding boxes.
//!
//! Every builder returns `Ok(None)` for empty input and a [`BuildError`] for
//! out-of-range parameters. Recursive builders are bounded by
//! [`MAX_TREE_DEPTH`]; grid builders by [`MAX_FORK_COUNT`].

mod bsp;
mod kd;
mod obb;
mod oct;
mod quad;
mod selector;

pub use bsp::{build_bsp_tree, build_bsp_tree_with};
pub use kd::{build_kd_tree, FaceId, KdConcept, KdTree, KdTreeConfig, DEFAULT_KD_TREE_DEPTH};
pub use obb::{build_obb_tree, move_obb};
pub use oct::{build_object_oc_tree, build_oc_tree, OcTree};
pub use quad::{build_object_quad_tree, build_point_quad_tree, build_quad_tree, QuadTree};
pub use selector::{BalancedSplit, FirstPolygon, PlaneSelector};

use crate::error::{BuildError, TreeError};
use crate::tree::{NodeId, Tree};

/// Largest recursion budget accepted by the kd, BSP and point quad-tree builders.
pub const MAX_TREE_DEPTH: u8 = 32;

/// Default fork count of the grid (oct and quad) builders.
pub const DEFAULT_FORK_COUNT: u8 = 3;

/// Largest fork count of the grid builders: `2^8` cells per axis.
pub const MAX_FORK_COUNT: u8 = 8;

/// Margin added around the input bounds of grid trees, so geometry on the
/// outer faces falls strictly inside the root cell.
pub const CELL_MARGIN: f32 = 0.01;

fn check_depth(depth: u8) -> Result<(), BuildError> {
    if depth > MAX_TREE_DEPTH {
        return Err(BuildError::DepthOutOfRange {
            depth,
            max: MAX_TREE_DEPTH,
        });
    }
    Ok(())
}

fn check_fork_count(forks: u8) -> Result<(), BuildError> {
    if forks > MAX_FORK_COUNT {
        return Err(BuildError::ForkCountOutOfRange {
            forks,
            max: MAX_FORK_COUNT,
        });
    }
    Ok(())
}

/// Appends `item` to the list payload of `id`, creating the list on first use.
fn push_payload<T>(tree: &mut Tree<Vec<T>>, id: NodeId, item: T) -> Result<(), TreeError> {
    match tree.payload_mut(id)? {
        Some(items) => items.push(item),
        None => tree.set_payload(id, vec![item])?,
    }
    Ok(())
}

/// Node, leaf and payload-item counts for build summaries.
fn tree_stats<T>(tree: &Tree<Vec<T>>) -> (usize, usize, usize) {
    let leaves = tree.leaves().count();
    let items = tree
        .iter()
        .filter_map(|id| tree.payload(id).ok().flatten())
        .map(Vec::len)
        .sum();
    (tree.node_count(), leaves, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Aabb;
    use crate::tree::Partition;
    use nalgebra::Point3;

    #[test]
    fn parameter_limits() {
        assert!(check_depth(MAX_TREE_DEPTH).is_ok());
        assert_eq!(
            check_depth(33),
            Err(BuildError::DepthOutOfRange { depth: 33, max: 32 })
        );
        assert!(check_fork_count(MAX_FORK_COUNT).is_ok());
        assert_eq!(
            check_fork_count(9),
            Err(BuildError::ForkCountOutOfRange { forks: 9, max: 8 })
        );
    }

    #[test]
    fn push_payload_creates_then_appends() {
        let mut tree: Tree<Vec<u8>> = Tree::new(Partition::Oct {
            cell: Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)),
        });
        let root = tree.root();
        push_payload(&mut tree, root, 1).unwrap();
        push_payload(&mut tree, root, 2).unwrap();
        assert_eq!(tree.payload(root).unwrap(), Some(&vec![1, 2]));
        assert_eq!(tree_stats(&tree), (1, 1, 2));
    }
}
