//! Axis-aligned bounding boxes and coordinate axes.

use nalgebra::{Point3, Vector3};

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis (0, 1 or 2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// An axis-aligned box given by its minimum and maximum corners.
///
/// All containment tests are inclusive on both faces, so points on a shared
/// face between two adjacent boxes belong to both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Creates a box from two corners.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// An inverted box that any inserted point or box replaces.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Smallest box enclosing all `points`; [`Aabb::empty`] if there are none.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut aabb = Self::empty();
        for point in points {
            aabb.insert_point(point);
        }
        aabb
    }

    /// Returns `true` if no point has been inserted (min > max on some axis).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grows the box to include `point`.
    pub fn insert_point(&mut self, point: Point3<f32>) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grows the box to include `other`.
    pub fn insert_box(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    #[inline]
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// The axis along which the box is longest. Ties prefer X, then Y.
    pub fn longest_axis(&self) -> Axis {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            Axis::X
        } else if size.y >= size.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns a copy grown by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Inclusive point containment.
    pub fn contains(&self, point: &Point3<f32>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Squared distance from `point` to the closest point of the box (0 inside).
    pub fn distance_squared(&self, point: &Point3<f32>) -> f32 {
        let clamped = point.sup(&self.min).inf(&self.max);
        (point - clamped).norm_squared()
    }

    /// Splits the box at `value` along `axis` into `(near, far)` halves.
    pub fn split(&self, axis: Axis, value: f32) -> (Aabb, Aabb) {
        let i = axis.index();
        let mut near = *self;
        let mut far = *self;
        near.max[i] = value;
        far.min[i] = value;
        (near, far)
    }

    /// One of the eight equal octants. Bit 0 selects +x, bit 1 +y, bit 2 +z.
    pub fn octant(&self, index: usize) -> Aabb {
        let center = self.center();
        let mut cell = *self;
        for axis in 0..3 {
            if index & (1 << axis) != 0 {
                cell.min[axis] = center[axis];
            } else {
                cell.max[axis] = center[axis];
            }
        }
        cell
    }

    /// Parametric range `(t_enter, t_exit)` within `[t_min, t_max]` where the
    /// line `start + t * (end - start)` is inside the box (slab test).
    pub fn clip_segment(
        &self,
        start: &Point3<f32>,
        end: &Point3<f32>,
        mut t_min: f32,
        mut t_max: f32,
    ) -> Option<(f32, f32)> {
        let dir = end - start;
        for i in 0..3 {
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

    /// Returns `true` if the segment `start..end` touches the box.
    pub fn intersects_segment(&self, start: &Point3<f32>, end: &Point3<f32>) -> bool {
        self.clip_segment(start, end, 0.0, 1.0).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn empty_box_absorbs_points() {
        let mut aabb = Aabb::empty();
        assert!(aabb.is_empty());
        aabb.insert_point(Point3::new(1.0, 2.0, 3.0));
        aabb.insert_point(Point3::new(-1.0, 0.0, 5.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, Point3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn longest_axis_prefers_x_on_ties() {
        assert_eq!(unit().longest_axis(), Axis::X);
        let tall = Aabb::new(Point3::origin(), Point3::new(1.0, 3.0, 2.0));
        assert_eq!(tall.longest_axis(), Axis::Y);
        let deep = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 2.0));
        assert_eq!(deep.longest_axis(), Axis::Z);
    }

    #[test]
    fn split_and_octants_tile_the_box() {
        let (near, far) = unit().split(Axis::Y, 0.25);
        assert_eq!(near.max.y, 0.25);
        assert_eq!(far.min.y, 0.25);

        let top_right_back = unit().octant(7);
        assert_eq!(top_right_back.min, Point3::new(0.5, 0.5, 0.5));
        assert_eq!(top_right_back.max, Point3::new(1.0, 1.0, 1.0));
        let origin_cell = unit().octant(0);
        assert_eq!(origin_cell.max, Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn distance_is_zero_inside() {
        assert_eq!(unit().distance_squared(&Point3::new(0.5, 0.5, 0.5)), 0.0);
        assert!((unit().distance_squared(&Point3::new(3.0, 0.5, 0.5)) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn segment_slab_test() {
        let aabb = unit();
        assert!(aabb.intersects_segment(&Point3::new(-1.0, 0.5, 0.5), &Point3::new(2.0, 0.5, 0.5)));
        assert!(!aabb.intersects_segment(&Point3::new(-1.0, 2.0, 0.5), &Point3::new(2.0, 2.0, 0.5)));
        // Stops short of the box.
        assert!(!aabb.intersects_segment(&Point3::new(-2.0, 0.5, 0.5), &Point3::new(-1.0, 0.5, 0.5)));
        // Axis-parallel inside the slab.
        assert!(aabb.intersects_segment(&Point3::new(0.5, 0.5, -1.0), &Point3::new(0.5, 0.5, 2.0)));
    }
}
