//! Geometric primitives consumed by the tree builders and queries.

mod aabb;
mod cuttable;
mod obb;
pub mod overlap;
mod plane;
mod polygon;
mod rect;
mod segment;
mod triangle;

pub use aabb::{Aabb, Axis};
pub use cuttable::Cuttable;
pub use obb::Obb;
pub use plane::{Classification, Plane3D, PlaneSide, PLANE_EPSILON};
pub use polygon::Polygon;
pub use rect::{ground, Rect};
pub use segment::Segment;
pub use triangle::Triangle;
