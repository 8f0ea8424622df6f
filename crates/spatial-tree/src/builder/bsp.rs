//! BSP-tree construction from mesh triangles.

use log::{debug, warn};

use super::selector::{BalancedSplit, PlaneSelector};
use super::{check_depth, tree_stats};
use crate::error::{BuildError, TreeError};
use crate::geometry::{Classification, Cuttable, Plane3D, Polygon};
use crate::mesh::MeshSource;
use crate::tree::{NodeId, Partition, Tree};

/// Builds a BSP-tree over the triangles of `mesh` using [`BalancedSplit`].
pub fn build_bsp_tree<M: MeshSource>(
    mesh: &M,
    max_depth: u8,
) -> Result<Option<Tree<Vec<Polygon>>>, BuildError> {
    build_bsp_tree_with(mesh, max_depth, &BalancedSplit::default())
}

/// Builds a BSP-tree over the triangles of `mesh` (in mesh-local space).
///
/// Each internal node splits along the plane of the polygon chosen by
/// `selector`; children are `[front, back]`. Polygons coplanar with the
/// splitter go to the front when they face the same way as its normal and to
/// the back otherwise. Spanning polygons are cut in two. A node becomes a
/// leaf owning its polygons when the depth budget is spent, at most one
/// polygon remains, or the split would leave one side empty.
///
/// Degenerate triangles are skipped. Returns `Ok(None)` if no usable
/// triangles remain.
pub fn build_bsp_tree_with<M: MeshSource, S: PlaneSelector>(
    mesh: &M,
    max_depth: u8,
    selector: &S,
) -> Result<Option<Tree<Vec<Polygon>>>, BuildError> {
    check_depth(max_depth)?;

    let mut polygons = Vec::with_capacity(mesh.total_triangle_count());
    for surface in 0..mesh.surface_count() {
        for index in 0..mesh.triangle_count(surface) {
            match mesh.triangle(surface, index) {
                Some(triangle) if !triangle.is_degenerate() => polygons.push(Polygon::from(triangle)),
                Some(_) => warn!("surface {surface}: degenerate triangle {index} skipped"),
                None => warn!("surface {surface}: triangle {index} is unreadable, skipped"),
            }
        }
    }
    let Some(first_plane) = polygons.iter().find_map(Polygon::plane) else {
        debug!("bsp-tree: no usable triangles");
        return Ok(None);
    };

    let input = polygons.len();
    let mut tree = Tree::new(Partition::Bsp { plane: first_plane });
    let root = tree.root();
    build_node(&mut tree, root, polygons, max_depth, selector)?;

    let (nodes, leaves, fragments) = tree_stats(&tree);
    debug!(
        "bsp-tree: {input} triangles, {nodes} nodes, {leaves} leaves, {fragments} polygons, depth {}",
        tree.depth()
    );
    Ok(Some(tree))
}

fn build_node<S: PlaneSelector>(
    tree: &mut Tree<Vec<Polygon>>,
    id: NodeId,
    polygons: Vec<Polygon>,
    budget: u8,
    selector: &S,
) -> Result<(), TreeError> {
    if polygons.is_empty() {
        return Ok(());
    }
    if budget == 0 || polygons.len() <= 1 {
        return tree.set_payload(id, polygons);
    }
    let Some(plane) = selector
        .select(&polygons)
        .and_then(|index| polygons.get(index))
        .and_then(Polygon::plane)
    else {
        return tree.set_payload(id, polygons);
    };

    let (front, back) = split_polygons(polygons, &plane);
    if front.is_empty() || back.is_empty() {
        // Nothing was cut, so one side holds the original set.
        let mut all = front;
        all.extend(back);
        return tree.set_payload(id, all);
    }

    *tree.partition_mut(id)? = Partition::Bsp { plane };
    tree.add_children(id)?;
    let &[front_id, back_id] = tree.children(id)? else {
        return Ok(());
    };
    build_node(tree, front_id, front, budget - 1, selector)?;
    build_node(tree, back_id, back, budget - 1, selector)
}

fn split_polygons(polygons: Vec<Polygon>, plane: &Plane3D) -> (Vec<Polygon>, Vec<Polygon>) {
    let mut front = Vec::new();
    let mut back = Vec::new();
    for polygon in polygons {
        match polygon.classify(plane) {
            Classification::Front => front.push(polygon),
            Classification::Back => back.push(polygon),
            Classification::Coplanar => {
                if polygon.faces(plane) {
                    front.push(polygon);
                } else {
                    back.push(polygon);
                }
            }
            Classification::Spanning => {
                let (front_part, back_part) = polygon.cut(plane);
                front.extend(front_part);
                back.extend(back_part);
            }
        }
    }
    (front, back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FirstPolygon;
    use crate::geometry::Triangle;
    use crate::mesh::TriangleMesh;
    use nalgebra::Point3;

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::new(Point3::from(a), Point3::from(b), Point3::from(c))
    }

    fn polygon_count(tree: &Tree<Vec<Polygon>>) -> usize {
        tree_stats(tree).2
    }

    #[test]
    fn build_empty() {
        assert!(build_bsp_tree(&TriangleMesh::new(), 8).unwrap().is_none());
        let degenerate = TriangleMesh::from_triangles([make_triangle(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
        )]);
        assert!(build_bsp_tree(&degenerate, 8).unwrap().is_none());
    }

    #[test]
    fn build_single_polygon() {
        let mesh = TriangleMesh::from_triangles([make_triangle(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        )]);
        let tree = build_bsp_tree(&mesh, 8).unwrap().unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(polygon_count(&tree), 1);
    }

    #[test]
    fn one_sided_split_makes_leaf() {
        // Facing +z at z = 0 and z = 1.
        let mesh = TriangleMesh::from_triangles([
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
        ]);

        // Everything lies in front of the z = 0 layer.
        let first = build_bsp_tree_with(&mesh, 8, &FirstPolygon).unwrap().unwrap();
        assert_eq!(first.node_count(), 1);
        assert_eq!(polygon_count(&first), 2);

        // The balanced selector splits on z = 1 instead.
        let balanced = build_bsp_tree(&mesh, 8).unwrap().unwrap();
        let children = balanced.children(balanced.root()).unwrap();
        assert_eq!(children.len(), 2);
        let back = balanced.find_leaf(&Point3::new(0.2, 0.2, 0.5)).unwrap();
        assert_eq!(back, children[1]);
        assert_eq!(balanced.payload(back).unwrap().map(Vec::len), Some(1));
        assert_eq!(polygon_count(&balanced), 2);
    }

    #[test]
    fn build_spanning_polygon_gets_split() {
        // Splitter on y = 0 facing +y, the second triangle crosses it.
        let mesh = TriangleMesh::from_triangles([
            make_triangle([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            make_triangle([-0.5, -1.0, 0.5], [0.5, 1.0, 0.5], [0.5, -1.0, 0.5]),
        ]);
        let tree = build_bsp_tree_with(&mesh, 8, &FirstPolygon).unwrap().unwrap();
        assert_eq!(polygon_count(&tree), 3);
    }

    #[test]
    fn depth_budget_limits_levels() {
        let mesh = TriangleMesh::from_triangles((0..16).map(|i| {
            let y = i as f32;
            make_triangle([0.0, y, 0.0], [0.0, y, 1.0], [1.0, y, 0.0])
        }));
        let tree = build_bsp_tree(&mesh, 2).unwrap().unwrap();
        assert!(tree.depth() <= 2);
        assert_eq!(polygon_count(&tree), 16);
        assert!(tree
            .leaves()
            .all(|leaf| tree.level(leaf).unwrap() <= 2));
    }
}
