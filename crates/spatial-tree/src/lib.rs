//! Spatial partitioning trees for collision detection and spatial lookup.
//!
//! All topologies (kd, oct, quad, point quad, BSP and OBB trees) share one
//! node arena, [`Tree`], and differ only in the [`Partition`] stored at each
//! node. The [`builder`] functions build trees from [`MeshSource`] meshes or
//! [`Positioned`] objects; [`CollisionMesh`] uses a kd-tree for segment
//! picking.
//!
//! ```
//! use nalgebra::Point3;
//! use spatial_tree::{build_kd_tree, KdTreeConfig, Triangle, TriangleMesh};
//!
//! let mesh = TriangleMesh::from_triangles([Triangle::new(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! )]);
//! let kd = build_kd_tree(&[mesh], &KdTreeConfig::default())?.expect("mesh has triangles");
//! let leaf = kd.tree().find_leaf(&Point3::new(0.2, 0.2, 0.0));
//! assert!(leaf.is_some());
//! # Ok::<(), spatial_tree::BuildError>(())
//! ```

pub mod builder;
pub mod collision;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod tree;

pub use builder::{
    build_bsp_tree, build_bsp_tree_with, build_kd_tree, build_obb_tree, build_object_oc_tree,
    build_object_quad_tree, build_oc_tree, build_point_quad_tree, build_quad_tree, move_obb,
    BalancedSplit, FaceId, FirstPolygon, KdConcept, KdTree, KdTreeConfig, OcTree, PlaneSelector,
    QuadTree,
    CELL_MARGIN, DEFAULT_FORK_COUNT, DEFAULT_KD_TREE_DEPTH, MAX_FORK_COUNT, MAX_TREE_DEPTH,
};
pub use collision::{CollisionFace, CollisionMesh, Contact, FaceSide};
pub use error::{BuildError, TreeError};
pub use geometry::{Aabb, Axis, Obb, Plane3D, Polygon, Rect, Segment, Triangle};
pub use mesh::{MeshSource, Positioned, Surface, TriangleMesh};
pub use tree::{
    CollectingVisitor, FnVisitor, LeafVisitor, Node, NodeId, Partition, PreOrder, Tree, TreeKind,
};
