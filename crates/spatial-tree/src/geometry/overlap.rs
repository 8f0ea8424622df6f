//! Precise overlap and intersection tests between primitives.
//!
//! Touching counts as overlapping throughout: geometry lying exactly on a
//! shared cell face is registered in both cells.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use super::{Aabb, Rect, Segment, Triangle};

/// Separating-axis test between a triangle and an axis-aligned box
/// (box face normals, triangle normal and the nine edge cross products).
pub fn triangle_aabb_overlap(triangle: &Triangle, aabb: &Aabb) -> bool {
    let center = aabb.center();
    let half = aabb.size() * 0.5;
    let [a, b, c] = triangle.vertices();
    let v = [a - center, b - center, c - center];

    // Box face normals.
    for i in 0..3 {
        let min = v[0][i].min(v[1][i]).min(v[2][i]);
        let max = v[0][i].max(v[1][i]).max(v[2][i]);
        if min > half[i] || max < -half[i] {
            return false;
        }
    }

    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

    // Triangle normal.
    let normal = edges[0].cross(&edges[1]);
    if separated_on(&normal, &v, &half) {
        return false;
    }

    for edge in &edges {
        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            let test = axis.cross(edge);
            if test.norm_squared() < f32::EPSILON * f32::EPSILON {
                continue;
            }
            if separated_on(&test, &v, &half) {
                return false;
            }
        }
    }

    true
}

/// Projects the (box-centered) triangle and the box onto `axis` and reports
/// whether the intervals are disjoint.
fn separated_on(axis: &Vector3<f32>, v: &[Vector3<f32>; 3], half: &Vector3<f32>) -> bool {
    let p = [axis.dot(&v[0]), axis.dot(&v[1]), axis.dot(&v[2])];
    let min = p[0].min(p[1]).min(p[2]);
    let max = p[0].max(p[1]).max(p[2]);
    let radius = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
    min > radius || max < -radius
}

/// Separating-axis test between a 2D triangle and a rectangle.
pub fn triangle_rect_overlap(triangle: &[Point2<f32>; 3], rect: &Rect) -> bool {
    let center = rect.center();
    let half = (rect.max - rect.min) * 0.5;
    let v = triangle.map(|p| p - center);

    for i in 0..2 {
        let min = v[0][i].min(v[1][i]).min(v[2][i]);
        let max = v[0][i].max(v[1][i]).max(v[2][i]);
        if min > half[i] || max < -half[i] {
            return false;
        }
    }

    for k in 0..3 {
        let edge = v[(k + 1) % 3] - v[k];
        let axis = Vector2::new(-edge.y, edge.x);
        if axis.norm_squared() < f32::EPSILON * f32::EPSILON {
            continue;
        }
        let p = [axis.dot(&v[0]), axis.dot(&v[1]), axis.dot(&v[2])];
        let min = p[0].min(p[1]).min(p[2]);
        let max = p[0].max(p[1]).max(p[2]);
        let radius = half.x * axis.x.abs() + half.y * axis.y.abs();
        if min > radius || max < -radius {
            return false;
        }
    }

    true
}

/// One-sided segment/triangle intersection (Möller–Trumbore).
///
/// Only hits on the triangle's front face (the side its normal points to)
/// are reported; test the reversed segment to find back-face hits.
pub fn segment_triangle_intersection(triangle: &Triangle, segment: &Segment) -> Option<Point3<f32>> {
    let [a, b, c] = triangle.vertices();
    let dir = segment.direction();
    let e1 = b - a;
    let e2 = c - a;

    let p = dir.cross(&e2);
    let det = e1.dot(&p);
    // Parallel, degenerate, or approaching from behind. `det` grows with the
    // product of the three lengths, so the threshold does too.
    let scale = dir.norm() * e1.norm() * e2.norm();
    if det <= f32::EPSILON * scale {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = segment.start - a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    Some(segment.point_at(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::new(Point3::from(a), Point3::from(b), Point3::from(c))
    }

    fn unit() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn triangle_inside_box() {
        let tri = make_triangle([0.2, 0.2, 0.2], [0.8, 0.2, 0.2], [0.5, 0.8, 0.5]);
        assert!(triangle_aabb_overlap(&tri, &unit()));
    }

    #[test]
    fn triangle_far_away() {
        let tri = make_triangle([5.0, 5.0, 5.0], [6.0, 5.0, 5.0], [5.0, 6.0, 5.0]);
        assert!(!triangle_aabb_overlap(&tri, &unit()));
    }

    #[test]
    fn large_triangle_cutting_through_box() {
        // Vertices all outside, the plane z = 0.5 passes through the box.
        let tri = make_triangle([-10.0, -10.0, 0.5], [10.0, -10.0, 0.5], [0.0, 10.0, 0.5]);
        assert!(triangle_aabb_overlap(&tri, &unit()));
    }

    #[test]
    fn triangle_plane_misses_box_corner() {
        // Bounding boxes overlap but the triangle plane x + y + z = 3.5 clears the box.
        let tri = make_triangle([3.5, 0.0, 0.0], [0.0, 3.5, 0.0], [0.0, 0.0, 3.5]);
        assert!(!triangle_aabb_overlap(&tri, &unit()));
    }

    #[test]
    fn touching_face_counts() {
        let tri = make_triangle([1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 1.0]);
        assert!(triangle_aabb_overlap(&tri, &unit()));
    }

    #[test]
    fn rect_overlap_2d() {
        let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let inside = [Point2::new(0.1, 0.1), Point2::new(0.9, 0.1), Point2::new(0.5, 0.9)];
        assert!(triangle_rect_overlap(&inside, &rect));
        // Bounding boxes overlap, hypotenuse x + y = 2.5 does not reach the rectangle.
        let outside = [Point2::new(2.5, 0.0), Point2::new(0.0, 2.5), Point2::new(3.0, 3.0)];
        assert!(!triangle_rect_overlap(&outside, &rect));
    }

    #[test]
    fn segment_hits_front_face_only() {
        // Normal points to +z.
        let tri = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let down = Segment::new(Point3::new(0.25, 0.25, 1.0), Point3::new(0.25, 0.25, -1.0));
        let hit = segment_triangle_intersection(&tri, &down).unwrap();
        assert!(hit.z.abs() < 1e-6);
        assert!(segment_triangle_intersection(&tri, &down.reversed()).is_none());
    }

    #[test]
    fn millimetre_segment_hits_millimetre_triangle() {
        let tri = make_triangle([0.0, 0.0, 0.0], [0.001, 0.0, 0.0], [0.0, 0.001, 0.0]);
        let down = Segment::new(
            Point3::new(0.00025, 0.00025, 0.001),
            Point3::new(0.00025, 0.00025, -0.001),
        );
        let hit = segment_triangle_intersection(&tri, &down).unwrap();
        assert!(hit.z.abs() < 1e-6);
        assert!(segment_triangle_intersection(&tri, &down.reversed()).is_none());
    }

    #[test]
    fn short_segment_misses() {
        let tri = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let short = Segment::new(Point3::new(0.25, 0.25, 2.0), Point3::new(0.25, 0.25, 1.0));
        assert!(segment_triangle_intersection(&tri, &short).is_none());
    }
}
