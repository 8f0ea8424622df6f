//! Geometry sources the tree builders read from.
//!
//! Builders only see meshes through [`MeshSource`] and scene objects through
//! [`Positioned`]. [`TriangleMesh`] is a plain indexed-triangle implementation
//! for callers that do not have their own mesh type.

use nalgebra::{Matrix4, Point3};

use crate::geometry::{Aabb, Triangle};

/// Read access to a mesh split into surfaces (mesh buffers) of triangles.
pub trait MeshSource {
    fn surface_count(&self) -> usize;

    fn triangle_count(&self, surface: usize) -> usize;

    /// Triangle coordinates in mesh-local space.
    fn triangle(&self, surface: usize, index: usize) -> Option<Triangle>;

    /// Current local-to-world transformation.
    fn transform(&self) -> Matrix4<f32> {
        Matrix4::identity()
    }

    /// Number of triangles across all surfaces.
    fn total_triangle_count(&self) -> usize {
        (0..self.surface_count()).map(|s| self.triangle_count(s)).sum()
    }

    /// Bounding box of all triangles, in world space when `world` is set.
    fn bounding_box(&self, world: bool) -> Aabb {
        let matrix = self.transform();
        let mut aabb = Aabb::empty();
        for surface in 0..self.surface_count() {
            for index in 0..self.triangle_count(surface) {
                if let Some(triangle) = self.triangle(surface, index) {
                    let triangle = if world { triangle.transformed(&matrix) } else { triangle };
                    aabb.insert_box(&triangle.aabb());
                }
            }
        }
        aabb
    }
}

impl<M: MeshSource + ?Sized> MeshSource for &M {
    fn surface_count(&self) -> usize {
        (**self).surface_count()
    }

    fn triangle_count(&self, surface: usize) -> usize {
        (**self).triangle_count(surface)
    }

    fn triangle(&self, surface: usize, index: usize) -> Option<Triangle> {
        (**self).triangle(surface, index)
    }

    fn transform(&self) -> Matrix4<f32> {
        (**self).transform()
    }

    fn bounding_box(&self, world: bool) -> Aabb {
        (**self).bounding_box(world)
    }
}

/// Something with a world position, e.g. a scene object.
pub trait Positioned {
    fn position(&self) -> Point3<f32>;
}

impl Positioned for Point3<f32> {
    fn position(&self) -> Point3<f32> {
        *self
    }
}

/// One vertex/index buffer pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    vertices: Vec<Point3<f32>>,
    indices: Vec<[u32; 3]>,
}

impl Surface {
    pub fn new(vertices: Vec<Point3<f32>>, indices: Vec<[u32; 3]>) -> Self {
        Self { vertices, indices }
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// Triangle `index`; `None` if the index or any vertex reference is out of range.
    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let [a, b, c] = self.indices.get(index)?;
        Some(Triangle::new(
            *self.vertices.get(*a as usize)?,
            *self.vertices.get(*b as usize)?,
            *self.vertices.get(*c as usize)?,
        ))
    }
}

/// A mesh made of indexed triangle surfaces with a world transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    surfaces: Vec<Surface>,
    transform: Matrix4<f32>,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleMesh {
    /// An empty mesh with the identity transform.
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
            transform: Matrix4::identity(),
        }
    }

    /// A single-surface mesh with three vertices per triangle.
    pub fn from_triangles<I>(triangles: I) -> Self
    where
        I: IntoIterator<Item = Triangle>,
    {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for triangle in triangles {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(triangle.vertices());
            indices.push([base, base + 1, base + 2]);
        }
        let mut mesh = Self::new();
        mesh.add_surface(Surface::new(vertices, indices));
        mesh
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }

    pub fn add_surface(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    #[inline]
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }
}

impl MeshSource for TriangleMesh {
    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn triangle_count(&self, surface: usize) -> usize {
        self.surfaces.get(surface).map_or(0, |s| s.indices.len())
    }

    fn triangle(&self, surface: usize, index: usize) -> Option<Triangle> {
        self.surfaces.get(surface)?.triangle(index)
    }

    fn transform(&self) -> Matrix4<f32> {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::new(Point3::from(a), Point3::from(b), Point3::from(c))
    }

    #[test]
    fn from_triangles_round_trips_coordinates() {
        let tri = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let mesh = TriangleMesh::from_triangles([tri]);
        assert_eq!(mesh.surface_count(), 1);
        assert_eq!(mesh.total_triangle_count(), 1);
        assert_eq!(mesh.triangle(0, 0), Some(tri));
        assert_eq!(mesh.triangle(0, 1), None);
        assert_eq!(mesh.triangle(1, 0), None);
    }

    #[test]
    fn bad_vertex_reference_is_skipped() {
        let mut mesh = TriangleMesh::new();
        mesh.add_surface(Surface::new(vec![Point3::origin()], vec![[0, 0, 7]]));
        assert_eq!(mesh.triangle(0, 0), None);
        assert!(mesh.bounding_box(false).is_empty());
    }

    #[test]
    fn world_bounding_box_applies_transform() {
        let tri = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let mesh = TriangleMesh::from_triangles([tri])
            .with_transform(Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)));

        assert_eq!(mesh.bounding_box(false).min.x, 0.0);
        assert_eq!(mesh.bounding_box(true).min.x, 10.0);
    }
}
