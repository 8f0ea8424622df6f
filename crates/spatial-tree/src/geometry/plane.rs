//! Oriented planes: BSP splitters and the classification of geometry
//! against them.

use nalgebra::{Point3, Vector3};

/// Points closer to a plane than this are treated as lying on it.
pub const PLANE_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// The side the normal points to.
    Front,
    Back,
    /// Within [`PLANE_EPSILON`] of the plane.
    OnPlane,
}

/// Where a vertex set lies relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Nothing behind the plane.
    Front,
    /// Nothing in front of the plane.
    Back,
    /// Every vertex on the plane.
    Coplanar,
    /// Vertices on both sides.
    Spanning,
}

/// The plane `normal · p = offset` with a unit normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Scales `normal` and `offset` so that the normal has unit length.
    ///
    /// # Panics
    /// Panics if `normal` is zero.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let length = normal.norm();
        assert!(length > f32::EPSILON, "plane normal must not be zero");
        Self {
            normal: normal / length,
            offset: offset / length,
        }
    }

    /// The plane through `point` facing along `normal`; `None` for a zero
    /// normal.
    pub fn through_point(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let normal = normal.try_normalize(f32::EPSILON)?;
        Some(Self {
            offset: normal.dot(&point.coords),
            normal,
        })
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Positive in front of the plane.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    pub fn side_of(&self, point: Point3<f32>) -> PlaneSide {
        match self.signed_distance(point) {
            d if d > PLANE_EPSILON => PlaneSide::Front,
            d if d < -PLANE_EPSILON => PlaneSide::Back,
            _ => PlaneSide::OnPlane,
        }
    }

    /// Classifies a vertex set (a triangle or polygon outline).
    pub fn classify(&self, points: &[Point3<f32>]) -> Classification {
        let (mut front, mut back) = (false, false);
        for point in points {
            match self.side_of(*point) {
                PlaneSide::Front => front = true,
                PlaneSide::Back => back = true,
                PlaneSide::OnPlane => {}
            }
        }
        match (front, back) {
            (false, false) => Classification::Coplanar,
            (true, false) => Classification::Front,
            (false, true) => Classification::Back,
            (true, true) => Classification::Spanning,
        }
    }

    /// Same plane, opposite orientation.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Where the segment `start..end` crosses the plane, if it does.
    pub fn crossing(&self, start: Point3<f32>, end: Point3<f32>) -> Option<Point3<f32>> {
        let direction = end - start;
        let rate = self.normal.dot(&direction);
        if rate.abs() < f32::EPSILON {
            return None;
        }
        let t = -self.signed_distance(start) / rate;
        (0.0..=1.0).contains(&t).then(|| start + direction * t)
    }
}
