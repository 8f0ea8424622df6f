//! Kd-tree construction over triangle meshes.

use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use super::{check_depth, tree_stats};
use crate::collision::CollisionFace;
use crate::error::{BuildError, TreeError};
use crate::geometry::{Aabb, Axis};
use crate::mesh::MeshSource;
use crate::tree::{NodeId, Partition, Tree};

/// Index of a face in [`KdTree::faces`].
pub type FaceId = usize;

/// Depth used by [`KdTreeConfig::default`].
pub const DEFAULT_KD_TREE_DEPTH: u8 = 12;

/// How a kd node chooses its split point and axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KdConcept {
    /// Split at the node's bounds center, along its longest side.
    #[default]
    Center,
    /// Split at the mean triangle centroid, along the most balanced axis.
    Average,
}

/// Parameters of [`build_kd_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KdTreeConfig {
    /// Fork budget; no leaf is deeper than this.
    pub max_depth: u8,
    pub concept: KdConcept,
    /// Store triangles in world space (each mesh's transform applied).
    pub pre_transform: bool,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_KD_TREE_DEPTH,
            concept: KdConcept::Center,
            pre_transform: false,
        }
    }
}

impl KdTreeConfig {
    pub fn new(max_depth: u8) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn with_concept(mut self, concept: KdConcept) -> Self {
        self.concept = concept;
        self
    }

    pub fn with_pre_transform(mut self, pre_transform: bool) -> Self {
        self.pre_transform = pre_transform;
        self
    }
}

/// A kd-tree over copies of mesh triangles.
///
/// Faces are stored once in a flat list; each leaf holds the sorted ids of
/// the faces reaching into its cell. A face straddling a split plane is
/// referenced from both sides.
#[derive(Debug)]
pub struct KdTree {
    faces: Vec<CollisionFace>,
    tree: Tree<Vec<FaceId>>,
}

impl KdTree {
    #[inline]
    pub fn faces(&self) -> &[CollisionFace] {
        &self.faces
    }

    #[inline]
    pub fn face(&self, id: FaceId) -> Option<&CollisionFace> {
        self.faces.get(id)
    }

    #[inline]
    pub fn tree(&self) -> &Tree<Vec<FaceId>> {
        &self.tree
    }

    /// Bounds of the root cell.
    pub fn bounds(&self) -> Aabb {
        match self.tree.partition(self.tree.root()) {
            Ok(Partition::Kd { bounds, .. }) => *bounds,
            _ => Aabb::empty(),
        }
    }

    /// Face ids stored in `leaf`; empty for internal or payload-less nodes.
    pub fn leaf_faces(&self, leaf: NodeId) -> &[FaceId] {
        match self.tree.payload(leaf) {
            Ok(Some(ids)) => ids,
            _ => &[],
        }
    }

    /// Total number of face references across all leaves.
    pub fn reference_count(&self) -> usize {
        tree_stats(&self.tree).2
    }
}

/// Builds a kd-tree over all triangles of `meshes`.
///
/// Returns `Ok(None)` when the meshes contain no triangles.
pub fn build_kd_tree<M: MeshSource>(
    meshes: &[M],
    config: &KdTreeConfig,
) -> Result<Option<KdTree>, BuildError> {
    check_depth(config.max_depth)?;

    let mut bounds = Aabb::empty();
    let mut faces = Vec::new();
    for (mesh_index, mesh) in meshes.iter().enumerate() {
        let matrix = mesh.transform();
        for surface in 0..mesh.surface_count() {
            for index in 0..mesh.triangle_count(surface) {
                let Some(triangle) = mesh.triangle(surface, index) else {
                    warn!("mesh {mesh_index} surface {surface}: triangle {index} is unreadable, skipped");
                    continue;
                };
                let triangle = if config.pre_transform {
                    triangle.transformed(&matrix)
                } else {
                    triangle
                };
                bounds.insert_box(&triangle.aabb());
                faces.push(CollisionFace {
                    mesh: mesh_index,
                    surface,
                    index,
                    triangle,
                });
            }
        }
    }

    if faces.is_empty() {
        debug!("kd-tree: no triangles in {} meshes", meshes.len());
        return Ok(None);
    }

    let mut tree = Tree::new(Partition::kd(bounds));
    let root = tree.root();
    let candidates: Vec<FaceId> = (0..faces.len()).collect();
    build_node(&mut tree, &faces, root, candidates, config.max_depth, config.concept)?;

    let (nodes, leaves, references) = tree_stats(&tree);
    debug!(
        "kd-tree: {} faces, {nodes} nodes, {leaves} leaves, {references} references, depth {}",
        faces.len(),
        tree.depth()
    );

    Ok(Some(KdTree { faces, tree }))
}

fn build_node(
    tree: &mut Tree<Vec<FaceId>>,
    faces: &[CollisionFace],
    id: NodeId,
    candidates: Vec<FaceId>,
    budget: u8,
    concept: KdConcept,
) -> Result<(), TreeError> {
    if candidates.is_empty() {
        return Ok(());
    }
    if budget == 0 {
        return make_leaf(tree, id, candidates);
    }
    let bounds = match tree.partition(id)? {
        Partition::Kd { bounds, .. } => *bounds,
        _ => return make_leaf(tree, id, candidates),
    };

    let split_point = match concept {
        KdConcept::Center => bounds.center(),
        KdConcept::Average => {
            let sum = candidates
                .iter()
                .fold(Vector3::zeros(), |acc, id| acc + faces[*id].triangle.centroid().coords);
            let mean = Point3::from(sum / candidates.len() as f32);
            mean.sup(&bounds.min).inf(&bounds.max)
        }
    };

    let mut sides = Axis::ALL.map(|axis| partition_faces(faces, &candidates, axis, split_point[axis.index()]));
    let axis = choose_axis(concept, &bounds, &sides);
    let (near, far) = std::mem::take(&mut sides[axis.index()]);

    // Every candidate reaches both halves: splitting would only duplicate.
    if near.len() == candidates.len() && far.len() == candidates.len() {
        return make_leaf(tree, id, candidates);
    }

    *tree.partition_mut(id)? = Partition::Kd {
        axis,
        split: split_point[axis.index()],
        bounds,
    };
    tree.add_children(id)?;
    let &[near_id, far_id] = tree.children(id)? else {
        return make_leaf(tree, id, candidates);
    };

    build_node(tree, faces, near_id, near, budget - 1, concept)?;
    build_node(tree, faces, far_id, far, budget - 1, concept)
}

/// Near gets faces with any vertex below `split`, far gets faces with any
/// vertex at or above it.
fn partition_faces(
    faces: &[CollisionFace],
    candidates: &[FaceId],
    axis: Axis,
    split: f32,
) -> (Vec<FaceId>, Vec<FaceId>) {
    let i = axis.index();
    let mut near = Vec::new();
    let mut far = Vec::new();
    for &id in candidates {
        let vertices = faces[id].triangle.vertices();
        if vertices.iter().any(|v| v[i] < split) {
            near.push(id);
        }
        if vertices.iter().any(|v| v[i] >= split) {
            far.push(id);
        }
    }
    (near, far)
}

fn choose_axis(concept: KdConcept, bounds: &Aabb, sides: &[(Vec<FaceId>, Vec<FaceId>); 3]) -> Axis {
    let longest = bounds.longest_axis();
    match concept {
        KdConcept::Center => longest,
        KdConcept::Average => {
            let cost = |axis: Axis| {
                let (near, far) = &sides[axis.index()];
                near.len().max(far.len())
            };
            Axis::ALL
                .into_iter()
                .fold(longest, |best, axis| if cost(axis) < cost(best) { axis } else { best })
        }
    }
}

fn make_leaf(tree: &mut Tree<Vec<FaceId>>, id: NodeId, mut faces: Vec<FaceId>) -> Result<(), TreeError> {
    faces.sort_unstable();
    faces.dedup();
    if !faces.is_empty() {
        tree.set_payload(id, faces)?;
    }
    Ok(())
}
