//! Convex polygons produced when BSP construction cuts triangles.

use nalgebra::{Point3, Vector3};

use super::{Classification, Plane3D, Triangle};

/// A convex, planar vertex loop, counter-clockwise seen from the front.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point3<f32>>,
}

impl Polygon {
    /// # Panics (debug builds only)
    /// Panics with fewer than 3 vertices.
    pub fn new(vertices: Vec<Point3<f32>>) -> Self {
        debug_assert!(vertices.len() >= 3, "a polygon needs at least 3 vertices");
        Self { vertices }
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Newell normal, scaled by twice the area.
    pub fn normal(&self) -> Vector3<f32> {
        let next = self.vertices.iter().cycle().skip(1);
        self.vertices
            .iter()
            .zip(next)
            .fold(Vector3::zeros(), |n, (a, b)| {
                n + Vector3::new(
                    (a.y - b.y) * (a.z + b.z),
                    (a.z - b.z) * (a.x + b.x),
                    (a.x - b.x) * (a.y + b.y),
                )
            })
    }

    pub fn unit_normal(&self) -> Option<Vector3<f32>> {
        self.normal().try_normalize(f32::EPSILON)
    }

    /// The supporting plane through the vertex average; `None` without area.
    pub fn plane(&self) -> Option<Plane3D> {
        Plane3D::through_point(self.centroid(), self.unit_normal()?)
    }

    pub fn area(&self) -> f32 {
        self.normal().norm() * 0.5
    }

    /// Vertex average.
    pub fn centroid(&self) -> Point3<f32> {
        let sum: Vector3<f32> = self.vertices.iter().map(|p| p.coords).sum();
        Point3::from(sum / self.vertices.len() as f32)
    }

    #[inline]
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        plane.classify(&self.vertices)
    }

    /// Whether the polygon faces the same way as `plane`.
    pub fn faces(&self, plane: &Plane3D) -> bool {
        self.normal().dot(&plane.normal()) > 0.0
    }
}

impl From<&Triangle> for Polygon {
    fn from(triangle: &Triangle) -> Self {
        Self {
            vertices: triangle.vertices().to_vec(),
        }
    }
}

impl From<Triangle> for Polygon {
    fn from(triangle: Triangle) -> Self {
        Self::from(&triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlaneSide;

    fn make_quad() -> Polygon {
        Polygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn quad_area_and_normal() {
        let quad = make_quad();
        assert!((quad.area() - 2.0).abs() < 1e-6);
        let n = quad.unit_normal().unwrap();
        assert!((n.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn plane_passes_through_vertices() {
        let quad = make_quad();
        let plane = quad.plane().unwrap();
        for v in quad.vertices() {
            assert_eq!(plane.side_of(*v), PlaneSide::OnPlane);
        }
        assert!(quad.faces(&plane));
        assert!(!quad.faces(&plane.flipped()));
    }

    #[test]
    fn from_triangle_keeps_winding() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let poly = Polygon::from(tri);
        assert_eq!(poly.len(), 3);
        assert!(poly.normal().dot(&tri.normal()) > 0.0);
    }
}
