//! Eager oct-tree grids over meshes and scene objects.

use log::{debug, error};
use nalgebra::Point3;

use super::{check_fork_count, push_payload, tree_stats, CELL_MARGIN};
use crate::collision::CollisionFace;
use crate::error::{BuildError, TreeError};
use crate::geometry::{overlap, Aabb};
use crate::mesh::{MeshSource, Positioned};
use crate::tree::{NodeId, Partition, Tree};

/// A complete oct-tree of depth `F` with `2^F` cells per axis.
///
/// Every leaf is registered in a cell table addressed by
/// `z * c² + y * c + x` (with `c = 2^F`), giving constant-time lookup by
/// position next to the usual tree queries.
#[derive(Debug)]
pub struct OcTree<P> {
    tree: Tree<P>,
    cells: Vec<NodeId>,
    resolution: usize,
    bounds: Aabb,
}

impl<P> OcTree<P> {
    #[inline]
    pub fn tree(&self) -> &Tree<P> {
        &self.tree
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Number of cells per axis.
    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// All leaves in cell-table order.
    #[inline]
    pub fn cells(&self) -> &[NodeId] {
        &self.cells
    }

    /// The leaf at integer cell coordinates.
    pub fn cell(&self, x: usize, y: usize, z: usize) -> Option<NodeId> {
        let c = self.resolution;
        if x >= c || y >= c || z >= c {
            return None;
        }
        self.cells.get(z * c * c + y * c + x).copied()
    }

    /// The leaf containing `point`; `None` outside the bounds.
    pub fn cell_at(&self, point: &Point3<f32>) -> Option<NodeId> {
        if !self.bounds.contains(point) {
            return None;
        }
        let [x, y, z] = [0, 1, 2].map(|axis| self.coordinate(point[axis], axis));
        self.cell(x, y, z)
    }

    /// Cell coordinate of `value` along `axis`, clamped to the grid.
    fn coordinate(&self, value: f32, axis: usize) -> usize {
        grid_coordinate(value, self.bounds.min[axis], self.bounds.max[axis], self.resolution).1
    }

    /// Cells covering `min..=max` along `axis`, including both neighbours of
    /// a shared face the range touches.
    fn coordinate_range(&self, min: f32, max: f32, axis: usize) -> (usize, usize) {
        let (lo, hi) = (self.bounds.min[axis], self.bounds.max[axis]);
        (
            grid_coordinate(min, lo, hi, self.resolution).0,
            grid_coordinate(max, lo, hi, self.resolution).1,
        )
    }

    fn cell_box(&self, id: NodeId) -> Option<Aabb> {
        match self.tree.partition(id) {
            Ok(Partition::Oct { cell }) => Some(*cell),
            _ => None,
        }
    }
}

impl<T> OcTree<Vec<T>> {
    /// Appends `item` to the cell at `offset` in the cell table.
    fn insert(&mut self, offset: usize, item: T) -> Result<(), TreeError> {
        match self.cells.get(offset) {
            Some(&cell) => push_payload(&mut self.tree, cell, item),
            None => {
                error!(
                    "oct-tree cell offset {offset} out of range ({} cells), item skipped",
                    self.cells.len()
                );
                Ok(())
            }
        }
    }
}

/// Grid cells containing `value` on the interval `lo..hi` split into
/// `resolution` cells: `(first, last)`, which differ only when `value` lies
/// exactly on a shared cell face. Both are clamped to the grid.
pub(super) fn grid_coordinate(value: f32, lo: f32, hi: f32, resolution: usize) -> (usize, usize) {
    let size = hi - lo;
    if size <= 0.0 {
        return (0, 0);
    }
    let scaled = (value - lo) / size * resolution as f32;
    let last = (resolution - 1) as f32;
    let clamp = |cell: f32| cell.clamp(0.0, last) as usize;
    (clamp(scaled.ceil() - 1.0), clamp(scaled.floor()))
}

/// Builds the full grid of depth `forks` over `bounds`.
fn grid<P>(bounds: Aabb, forks: u8) -> Result<OcTree<P>, TreeError> {
    let resolution = 1usize << forks;
    let mut tree = Tree::new(Partition::Oct { cell: bounds });
    let root = tree.root();
    let mut cells = vec![root; resolution * resolution * resolution];

    let mut stack = vec![(root, 0u8, [0usize; 3])];
    while let Some((id, level, offset)) = stack.pop() {
        if level == forks {
            cells[offset[2] * resolution * resolution + offset[1] * resolution + offset[0]] = id;
            continue;
        }
        tree.add_children(id)?;
        for (octant, child) in tree.children(id)?.iter().enumerate() {
            let child_offset: [usize; 3] =
                std::array::from_fn(|axis| offset[axis] * 2 + ((octant >> axis) & 1));
            stack.push((*child, level + 1, child_offset));
        }
    }

    Ok(OcTree {
        tree,
        cells,
        resolution,
        bounds,
    })
}

/// Builds an oct-tree grid over the triangles of `mesh` (in mesh-local space).
///
/// Each triangle is stored in every cell it precisely overlaps. Returns
/// `Ok(None)` if the mesh has no triangles.
pub fn build_oc_tree<M: MeshSource>(
    mesh: &M,
    forks: u8,
) -> Result<Option<OcTree<Vec<CollisionFace>>>, BuildError> {
    check_fork_count(forks)?;
    if mesh.total_triangle_count() == 0 {
        return Ok(None);
    }
    let bounds = mesh.bounding_box(false);
    if bounds.is_empty() {
        return Ok(None);
    }

    let mut octree = grid(bounds.expanded(CELL_MARGIN), forks)?;
    let c = octree.resolution;
    for surface in 0..mesh.surface_count() {
        for index in 0..mesh.triangle_count(surface) {
            let Some(triangle) = mesh.triangle(surface, index) else {
                continue;
            };
            let face = CollisionFace {
                mesh: 0,
                surface,
                index,
                triangle,
            };
            let range = triangle.aabb();
            let [(x0, x1), (y0, y1), (z0, z1)] =
                [0, 1, 2].map(|axis| octree.coordinate_range(range.min[axis], range.max[axis], axis));
            for z in z0..=z1 {
                for y in y0..=y1 {
                    for x in x0..=x1 {
                        let offset = z * c * c + y * c + x;
                        let overlaps = octree
                            .cells
                            .get(offset)
                            .and_then(|cell| octree.cell_box(*cell))
                            .is_none_or(|cell| overlap::triangle_aabb_overlap(&triangle, &cell));
                        if overlaps {
                            octree.insert(offset, face)?;
                        }
                    }
                }
            }
        }
    }

    let (nodes, leaves, references) = tree_stats(&octree.tree);
    debug!(
        "oct-tree: {} triangles, {forks} forks, {nodes} nodes, {leaves} leaves, {references} references",
        mesh.total_triangle_count()
    );
    Ok(Some(octree))
}

/// Builds an oct-tree grid over object positions; leaves hold the indices
/// of the objects in their cell.
pub fn build_object_oc_tree<O: Positioned>(
    objects: &[O],
    forks: u8,
) -> Result<Option<OcTree<Vec<usize>>>, BuildError> {
    check_fork_count(forks)?;
    if objects.is_empty() {
        return Ok(None);
    }

    let bounds = Aabb::from_points(objects.iter().map(Positioned::position));
    let mut octree = grid(bounds.expanded(CELL_MARGIN), forks)?;
    let c = octree.resolution;
    for (index, object) in objects.iter().enumerate() {
        let position = object.position();
        let [x, y, z] = [0, 1, 2].map(|axis| octree.coordinate(position[axis], axis));
        octree.insert(z * c * c + y * c + x, index)?;
    }

    let (nodes, leaves, _) = tree_stats(&octree.tree);
    debug!(
        "object oct-tree: {} objects, {forks} forks, {nodes} nodes, {leaves} leaves",
        objects.len()
    );
    Ok(Some(octree))
}
