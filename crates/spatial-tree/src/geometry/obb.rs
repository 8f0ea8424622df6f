//! Oriented bounding boxes for OBB-tree nodes.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use super::{Aabb, Segment};

/// A box with arbitrary orientation: a rigid placement plus half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    placement: Isometry3<f32>,
    half_extents: Vector3<f32>,
}

impl Obb {
    pub fn new(center: Point3<f32>, rotation: UnitQuaternion<f32>, half_extents: Vector3<f32>) -> Self {
        Self {
            placement: Isometry3::from_parts(Translation3::from(center.coords), rotation),
            half_extents: half_extents.abs(),
        }
    }

    /// An axis-aligned box centered at `center`.
    pub fn axis_aligned(center: Point3<f32>, half_extents: Vector3<f32>) -> Self {
        Self::new(center, UnitQuaternion::identity(), half_extents)
    }

    /// A box enclosing all of space; used as the root of OBB-trees.
    pub fn unbounded() -> Self {
        Self::axis_aligned(Point3::origin(), Vector3::repeat(f32::MAX))
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        Point3::from(self.placement.translation.vector)
    }

    #[inline]
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.placement.rotation
    }

    #[inline]
    pub fn half_extents(&self) -> Vector3<f32> {
        self.half_extents
    }

    /// The box's extent in its own frame.
    pub fn local_aabb(&self) -> Aabb {
        Aabb::new(Point3::from(-self.half_extents), Point3::from(self.half_extents))
    }

    /// Converts a world point into the box's local frame.
    #[inline]
    pub fn to_local(&self, point: &Point3<f32>) -> Point3<f32> {
        self.placement.inverse_transform_point(point)
    }

    pub fn segment_to_local(&self, segment: &Segment) -> Segment {
        Segment::new(self.to_local(&segment.start), self.to_local(&segment.end))
    }

    /// The eight corners in world space.
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let h = self.half_extents;
        std::array::from_fn(|i| {
            let local = Point3::new(
                if i & 1 != 0 { h.x } else { -h.x },
                if i & 2 != 0 { h.y } else { -h.y },
                if i & 4 != 0 { h.z } else { -h.z },
            );
            self.placement.transform_point(&local)
        })
    }

    pub fn contains(&self, point: &Point3<f32>) -> bool {
        self.local_aabb().contains(&self.to_local(point))
    }

    /// Returns `true` if `other` lies entirely inside this box.
    pub fn contains_obb(&self, other: &Obb) -> bool {
        other.corners().iter().all(|corner| self.contains(corner))
    }

    /// Squared distance from `point` to the box (0 inside).
    pub fn distance_squared(&self, point: &Point3<f32>) -> f32 {
        self.local_aabb().distance_squared(&self.to_local(point))
    }
}
