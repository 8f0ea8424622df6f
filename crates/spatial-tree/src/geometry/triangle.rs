//! Triangles: the unit of geometry every tree builder consumes.

use nalgebra::{Matrix4, Point3, Vector3};

use super::{Aabb, Classification, Plane3D};

/// Three vertices; the winding gives the normal `(b - a) × (c - a)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>; 3] {
        &self.vertices
    }

    /// Normal scaled by twice the area.
    pub fn normal(&self) -> Vector3<f32> {
        let [a, b, c] = &self.vertices;
        (b - a).cross(&(c - a))
    }

    /// `None` for a degenerate triangle.
    pub fn unit_normal(&self) -> Option<Vector3<f32>> {
        self.normal().try_normalize(f32::EPSILON)
    }

    /// Collinear (or coincident) vertices.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.unit_normal().is_none()
    }

    pub fn area(&self) -> f32 {
        self.normal().norm() * 0.5
    }

    pub fn centroid(&self) -> Point3<f32> {
        let [a, b, c] = &self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.vertices)
    }

    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        Self {
            vertices: self.vertices.map(|v| matrix.transform_point(&v)),
        }
    }

    #[inline]
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        plane.classify(&self.vertices)
    }
}
