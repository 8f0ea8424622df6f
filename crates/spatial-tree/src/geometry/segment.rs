//! Line segments used for picking and line-of-sight queries.

use nalgebra::{Matrix4, Point3, Vector3};

/// A directed line segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
}

impl Segment {
    pub fn new(start: Point3<f32>, end: Point3<f32>) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn direction(&self) -> Vector3<f32> {
        self.end - self.start
    }

    /// Point at parameter `t` (0 = start, 1 = end).
    #[inline]
    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.start + self.direction() * t
    }

    /// The same segment traversed from `end` to `start`.
    #[inline]
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    /// Sub-segment between parameters `t0` and `t1`.
    pub fn sub_segment(&self, t0: f32, t1: f32) -> Self {
        Self {
            start: self.point_at(t0),
            end: self.point_at(t1),
        }
    }

    /// Both endpoints transformed by a homogeneous matrix.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        Self {
            start: matrix.transform_point(&self.start),
            end: matrix.transform_point(&self.end),
        }
    }
}
