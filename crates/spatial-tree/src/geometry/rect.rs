//! 2D rectangles on the ground plane, used by quad-tree cells.
//!
//! Quad-trees partition the (x, z) plane; [`ground`] drops the y coordinate
//! of a 3D point to obtain its position on that plane.

use nalgebra::{Point2, Point3};

/// Projects a 3D point onto the (x, z) ground plane.
#[inline]
pub fn ground(point: &Point3<f32>) -> Point2<f32> {
    Point2::new(point.x, point.z)
}

/// An axis-aligned rectangle with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
}

impl Rect {
    pub fn new(min: Point2<f32>, max: Point2<f32>) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle enclosing `points`; inverted if there are none.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point2<f32>>,
    {
        let mut rect = Self::new(
            Point2::new(f32::INFINITY, f32::INFINITY),
            Point2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        );
        for point in points {
            rect.min = rect.min.inf(&point);
            rect.max = rect.max.sup(&point);
        }
        rect
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn contains(&self, point: &Point2<f32>) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Squared distance from `point` to the rectangle (0 inside).
    pub fn distance_squared(&self, point: &Point2<f32>) -> f32 {
        let clamped = point.sup(&self.min).inf(&self.max);
        (point - clamped).norm_squared()
    }

    /// Quadrant `index` of the rectangle split at `center`.
    /// Bit 0 selects the +x half, bit 1 the +z half.
    pub fn quadrant(&self, index: usize, center: &Point2<f32>) -> Rect {
        let mut cell = *self;
        if index & 1 != 0 {
            cell.min.x = center.x;
        } else {
            cell.max.x = center.x;
        }
        if index & 2 != 0 {
            cell.min.y = center.y;
        } else {
            cell.max.y = center.y;
        }
        cell
    }

    /// Parametric range `(t_enter, t_exit)` within `[t_min, t_max]` where the
    /// 2D line `start + t * (end - start)` is inside the rectangle.
    pub fn clip_segment(
        &self,
        start: &Point2<f32>,
        end: &Point2<f32>,
        mut t_min: f32,
        mut t_max: f32,
    ) -> Option<(f32, f32)> {
        let dir = end - start;
        for i in 0..2 {
            if dir[i].abs() < f32::EPSILON {
                if start[i] < self.min[i] || start[i] > self.max[i] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir[i];
            let mut t0 = (self.min[i] - start[i]) * inv;
            let mut t1 = (self.max[i] - start[i]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some((t_min, t_max))
    }

    /// Returns `true` if the 2D segment `start..end` touches the rectangle.
    pub fn intersects_segment(&self, start: &Point2<f32>, end: &Point2<f32>) -> bool {
        self.clip_segment(start, end, 0.0, 1.0).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrants_split_at_arbitrary_center() {
        let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0));
        let center = Point2::new(1.0, 3.0);
        let q = rect.quadrant(3, &center);
        assert_eq!(q.min, Point2::new(1.0, 3.0));
        assert_eq!(q.max, Point2::new(4.0, 4.0));
        let q = rect.quadrant(0, &center);
        assert_eq!(q.max, Point2::new(1.0, 3.0));
    }

    #[test]
    fn ground_drops_height() {
        assert_eq!(ground(&Point3::new(1.0, 9.0, 2.0)), Point2::new(1.0, 2.0));
    }

    #[test]
    fn segment_test() {
        let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        assert!(rect.intersects_segment(&Point2::new(-1.0, 0.5), &Point2::new(2.0, 0.5)));
        assert!(!rect.intersects_segment(&Point2::new(-1.0, 1.5), &Point2::new(2.0, 1.5)));
    }
}
