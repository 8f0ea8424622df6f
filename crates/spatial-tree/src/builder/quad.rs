//! Quad-trees on the ground plane: eager grids and adaptive point trees.
//!
//! Quad-trees work in the (x, z) plane; heights are ignored.

use log::{debug, error};
use nalgebra::{distance_squared, Point2, Point3, Vector2};

use super::oct::grid_coordinate;
use super::{check_depth, check_fork_count, push_payload, tree_stats, CELL_MARGIN};
use crate::collision::CollisionFace;
use crate::error::{BuildError, TreeError};
use crate::geometry::{ground, overlap, Rect};
use crate::mesh::{MeshSource, Positioned};
use crate::tree::{NodeId, Partition, Tree};

/// A complete quad-tree of depth `F` with `2^F` cells per side, indexed
/// `z * c + x` in its cell table.
#[derive(Debug)]
pub struct QuadTree<P> {
    tree: Tree<P>,
    cells: Vec<NodeId>,
    resolution: usize,
    rect: Rect,
}

impl<P> QuadTree<P> {
    #[inline]
    pub fn tree(&self) -> &Tree<P> {
        &self.tree
    }

    /// Ground-plane footprint of the root cell.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn cells(&self) -> &[NodeId] {
        &self.cells
    }

    pub fn cell(&self, x: usize, z: usize) -> Option<NodeId> {
        let c = self.resolution;
        if x >= c || z >= c {
            return None;
        }
        self.cells.get(z * c + x).copied()
    }

    /// The leaf below or above `point`; `None` outside the footprint.
    pub fn cell_at(&self, point: &Point3<f32>) -> Option<NodeId> {
        let point = ground(point);
        if !self.rect.contains(&point) {
            return None;
        }
        self.cell(self.coordinate(point.x, 0), self.coordinate(point.y, 1))
    }

    fn coordinate(&self, value: f32, axis: usize) -> usize {
        grid_coordinate(value, self.rect.min[axis], self.rect.max[axis], self.resolution).1
    }

    fn coordinate_range(&self, min: f32, max: f32, axis: usize) -> (usize, usize) {
        let (lo, hi) = (self.rect.min[axis], self.rect.max[axis]);
        (
            grid_coordinate(min, lo, hi, self.resolution).0,
            grid_coordinate(max, lo, hi, self.resolution).1,
        )
    }

    fn cell_rect(&self, id: NodeId) -> Option<Rect> {
        match self.tree.partition(id) {
            Ok(Partition::Quad { rect }) => Some(*rect),
            _ => None,
        }
    }
}

impl<T> QuadTree<Vec<T>> {
    fn insert(&mut self, offset: usize, item: T) -> Result<(), TreeError> {
        match self.cells.get(offset) {
            Some(&cell) => push_payload(&mut self.tree, cell, item),
            None => {
                error!(
                    "quad-tree cell offset {offset} out of range ({} cells), item skipped",
                    self.cells.len()
                );
                Ok(())
            }
        }
    }
}

fn grid<P>(rect: Rect, forks: u8) -> Result<QuadTree<P>, TreeError> {
    let resolution = 1usize << forks;
    let mut tree = Tree::new(Partition::Quad { rect });
    let root = tree.root();
    let mut cells = vec![root; resolution * resolution];

    let mut stack = vec![(root, 0u8, [0usize; 2])];
    while let Some((id, level, offset)) = stack.pop() {
        if level == forks {
            cells[offset[1] * resolution + offset[0]] = id;
            continue;
        }
        tree.add_children(id)?;
        for (quadrant, child) in tree.children(id)?.iter().enumerate() {
            let child_offset = [
                offset[0] * 2 + (quadrant & 1),
                offset[1] * 2 + ((quadrant >> 1) & 1),
            ];
            stack.push((*child, level + 1, child_offset));
        }
    }

    Ok(QuadTree {
        tree,
        cells,
        resolution,
        rect,
    })
}

/// Builds a quad-tree grid over the ground-plane footprint of `mesh`.
///
/// Each triangle is stored in every cell its (x, z) projection overlaps.
pub fn build_quad_tree<M: MeshSource>(
    mesh: &M,
    forks: u8,
) -> Result<Option<QuadTree<Vec<CollisionFace>>>, BuildError> {
    check_fork_count(forks)?;
    let bounds = mesh.bounding_box(false);
    if mesh.total_triangle_count() == 0 || bounds.is_empty() {
        return Ok(None);
    }

    let rect = Rect::new(ground(&bounds.min), ground(&bounds.max)).expanded(CELL_MARGIN);
    let mut quadtree = grid(rect, forks)?;
    let stride = quadtree.resolution;
    for surface in 0..mesh.surface_count() {
        for index in 0..mesh.triangle_count(surface) {
            let Some(triangle) = mesh.triangle(surface, index) else {
                continue;
            };
            let [a, b, c] = triangle.vertices();
            let footprint = [ground(a), ground(b), ground(c)];
            let range = Rect::from_points(footprint);
            let (x0, x1) = quadtree.coordinate_range(range.min.x, range.max.x, 0);
            let (z0, z1) = quadtree.coordinate_range(range.min.y, range.max.y, 1);
            let face = CollisionFace {
                mesh: 0,
                surface,
                index,
                triangle,
            };
            for z in z0..=z1 {
                for x in x0..=x1 {
                    let offset = z * stride + x;
                    let overlaps = quadtree
                        .cells
                        .get(offset)
                        .and_then(|cell| quadtree.cell_rect(*cell))
                        .is_none_or(|cell| overlap::triangle_rect_overlap(&footprint, &cell));
                    if overlaps {
                        quadtree.insert(offset, face)?;
                    }
                }
            }
        }
    }

    let (nodes, leaves, references) = tree_stats(&quadtree.tree);
    debug!("quad-tree: {forks} forks, {nodes} nodes, {leaves} leaves, {references} references");
    Ok(Some(quadtree))
}

/// Builds a quad-tree grid over object positions.
pub fn build_object_quad_tree<O: Positioned>(
    objects: &[O],
    forks: u8,
) -> Result<Option<QuadTree<Vec<usize>>>, BuildError> {
    check_fork_count(forks)?;
    if objects.is_empty() {
        return Ok(None);
    }

    let rect = Rect::from_points(objects.iter().map(|o| ground(&o.position()))).expanded(CELL_MARGIN);
    let mut quadtree = grid(rect, forks)?;
    let c = quadtree.resolution;
    for (index, object) in objects.iter().enumerate() {
        let position = ground(&object.position());
        let (x, z) = (quadtree.coordinate(position.x, 0), quadtree.coordinate(position.y, 1));
        quadtree.insert(z * c + x, index)?;
    }

    debug!("object quad-tree: {} objects, {forks} forks", objects.len());
    Ok(Some(quadtree))
}

/// Builds an adaptive point quad-tree over object positions.
///
/// Each node splits at the object nearest to the mean of its objects. A
/// node becomes a leaf holding its object indices when it has at most one
/// object, the depth budget is spent, or all objects fall into the same
/// quadrant.
pub fn build_point_quad_tree<O: Positioned>(
    objects: &[O],
    max_depth: u8,
) -> Result<Option<Tree<Vec<usize>>>, BuildError> {
    check_depth(max_depth)?;
    if objects.is_empty() {
        return Ok(None);
    }

    let positions: Vec<Point2<f32>> = objects.iter().map(|o| ground(&o.position())).collect();
    let rect = Rect::from_points(positions.iter().copied()).expanded(CELL_MARGIN);
    let mut tree = Tree::new(Partition::point_quad(rect));
    let root = tree.root();
    build_point_node(&mut tree, &positions, root, (0..objects.len()).collect(), max_depth)?;

    let (nodes, leaves, _) = tree_stats(&tree);
    debug!(
        "point quad-tree: {} objects, {nodes} nodes, {leaves} leaves, depth {}",
        objects.len(),
        tree.depth()
    );
    Ok(Some(tree))
}

fn build_point_node(
    tree: &mut Tree<Vec<usize>>,
    positions: &[Point2<f32>],
    id: NodeId,
    members: Vec<usize>,
    budget: u8,
) -> Result<(), TreeError> {
    if members.is_empty() {
        return Ok(());
    }
    let rect = match tree.partition(id)? {
        Partition::PointQuad { rect, .. } if members.len() > 1 && budget > 0 => *rect,
        _ => return tree.set_payload(id, members),
    };

    let mean = members
        .iter()
        .fold(Vector2::zeros(), |acc, m| acc + positions[*m].coords)
        / members.len() as f32;
    let mean = Point2::from(mean);
    let Some(center) = members
        .iter()
        .map(|m| positions[*m])
        .min_by(|a, b| distance_squared(a, &mean).total_cmp(&distance_squared(b, &mean)))
    else {
        return tree.set_payload(id, members);
    };

    let mut quadrants: [Vec<usize>; 4] = Default::default();
    for &m in &members {
        let p = positions[m];
        let quadrant = usize::from(p.x >= center.x) | (usize::from(p.y >= center.y) << 1);
        quadrants[quadrant].push(m);
    }
    if quadrants.iter().filter(|q| !q.is_empty()).count() <= 1 {
        return tree.set_payload(id, members);
    }

    *tree.partition_mut(id)? = Partition::PointQuad { rect, center };
    tree.add_children(id)?;
    let children = tree.children(id)?.to_vec();
    for (child, members) in children.into_iter().zip(quadrants) {
        build_point_node(tree, positions, child, members, budget - 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::mesh::TriangleMesh;

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::new(Point3::from(a), Point3::from(b), Point3::from(c))
    }

    #[test]
    fn grid_cells_match_positions() {
        let quadtree: QuadTree<()> =
            grid(Rect::new(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0)), 2).unwrap();
        assert_eq!(quadtree.cells().len(), 16);
        for z in 0..4 {
            for x in 0..4 {
                let center = Point3::new(x as f32 + 0.5, -20.0, z as f32 + 0.5);
                assert_eq!(quadtree.tree().find_leaf(&center), quadtree.cell(x, z));
                assert_eq!(quadtree.cell_at(&center), quadtree.cell(x, z));
            }
        }
    }

    #[test]
    fn vertical_triangle_uses_footprint() {
        // A wall along x at z = 0.5, plus a floor tile to widen the bounds.
        let wall = make_triangle([0.1, 0.0, 0.5], [1.9, 0.0, 0.5], [1.0, 5.0, 0.5]);
        let floor = make_triangle([0.0, 0.0, 0.0], [4.0, 0.0, 4.0], [4.0, 0.0, 0.0]);
        let mesh = TriangleMesh::from_triangles([wall, floor]);
        let quadtree = build_quad_tree(&mesh, 1).unwrap().unwrap();

        let holders: Vec<NodeId> = quadtree
            .cells()
            .iter()
            .copied()
            .filter(|cell| {
                quadtree
                    .tree()
                    .payload(*cell)
                    .unwrap()
                    .is_some_and(|faces| faces.iter().any(|f| f.index == 0))
            })
            .collect();
        assert_eq!(holders, vec![quadtree.cell(0, 0).unwrap()]);
    }

    #[test]
    fn quad_fork_limit() {
        let objects = [Point3::origin()];
        assert_eq!(
            build_object_quad_tree(&objects, 9).unwrap_err(),
            BuildError::ForkCountOutOfRange { forks: 9, max: 8 }
        );
    }

    #[test]
    fn object_grid_ignores_height() {
        let objects = [Point3::new(0.0, 100.0, 0.0), Point3::new(2.0, -100.0, 2.0)];
        let quadtree = build_object_quad_tree(&objects, 1).unwrap().unwrap();
        assert_eq!(quadtree.tree().payload(quadtree.cell(0, 0).unwrap()).unwrap(), Some(&vec![0]));
        assert_eq!(quadtree.tree().payload(quadtree.cell(1, 1).unwrap()).unwrap(), Some(&vec![1]));
    }

    #[test]
    fn point_tree_splits_at_data_point() {
        let objects = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 2.0),
        ];
        let tree = build_point_quad_tree(&objects, 4).unwrap().unwrap();
        let root = tree.root();
        match tree.partition(root).unwrap() {
            Partition::PointQuad { center, .. } => assert_eq!(*center, Point2::new(1.0, 1.0)),
            other => panic!("unexpected root partition {other:?}"),
        }

        let children = tree.children(root).unwrap();
        assert_eq!(tree.payload(children[0]).unwrap(), Some(&vec![0]));
        assert_eq!(tree.payload(children[1]).unwrap(), None);
        assert_eq!(tree.payload(children[2]).unwrap(), None);
        // Both remaining points sit in the +x+z quadrant of their own mean.
        assert_eq!(tree.payload(children[3]).unwrap(), Some(&vec![1, 2]));

        let mut leaves: Vec<usize> = tree
            .leaves()
            .filter_map(|leaf| tree.payload(leaf).unwrap().cloned())
            .flatten()
            .collect();
        leaves.sort_unstable();
        assert_eq!(leaves, vec![0, 1, 2]);
    }

    #[test]
    fn object_on_cell_face_is_found_by_tree_and_table() {
        let objects = [
            Point3::new(-1.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
        ];
        let quadtree = build_object_quad_tree(&objects, 1).unwrap().unwrap();
        let high = quadtree.cell(1, 1).unwrap();
        assert_eq!(quadtree.tree().payload(high).unwrap(), Some(&vec![1, 2]));

        for (index, object) in objects.iter().enumerate() {
            let leaf = quadtree.tree().find_leaf(object).unwrap();
            assert_eq!(Some(leaf), quadtree.cell_at(object));
            assert!(quadtree.tree().payload(leaf).unwrap().unwrap().contains(&index));
        }
    }

    #[test]
    fn split_point_is_found_in_its_own_leaf() {
        let objects = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 2.0),
        ];
        let tree = build_point_quad_tree(&objects, 4).unwrap().unwrap();
        for (index, object) in objects.iter().enumerate() {
            let leaf = tree.find_leaf(object).unwrap();
            assert!(tree.payload(leaf).unwrap().unwrap().contains(&index));
        }
        let upper = tree.children(tree.root()).unwrap()[3];
        assert_eq!(tree.find_leaf(&objects[1]), Some(upper));
    }

    #[test]
    fn point_tree_depth_budget() {
        let objects: Vec<Point3<f32>> = (0..10).map(|i| Point3::new(i as f32, 0.0, i as f32)).collect();
        let tree = build_point_quad_tree(&objects, 0).unwrap().unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.payload(tree.root()).unwrap().map(Vec::len), Some(10));
    }

    #[test]
    fn coincident_points_share_leaf() {
        let objects = [Point3::new(1.0, 0.0, 1.0); 3];
        let tree = build_point_quad_tree(&objects, 8).unwrap().unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.payload(tree.root()).unwrap(), Some(&vec![0, 1, 2]));
    }
}
