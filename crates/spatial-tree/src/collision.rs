//! Segment picking against triangle meshes, accelerated by a kd-tree.

use std::collections::HashSet;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::builder::{build_kd_tree, FaceId, KdConcept, KdTree, KdTreeConfig};
use crate::error::BuildError;
use crate::geometry::{overlap, Segment, Triangle};
use crate::mesh::MeshSource;

/// A copy of one mesh triangle together with where it came from.
///
/// Trees own these copies, so they stay valid (but stale) when the source
/// mesh is edited or moved after the build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionFace {
    /// Index of the mesh in the builder's input list.
    pub mesh: usize,
    pub surface: usize,
    /// Triangle index within the surface.
    pub index: usize,
    pub triangle: Triangle,
}

/// Which triangle faces take part in intersection tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaceSide {
    /// Faces hit from the side their normal points to.
    #[default]
    Front,
    Back,
    Both,
}

/// One segment/triangle intersection, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub point: Point3<f32>,
    /// Unit normal of the hit side: the triangle normal for front hits,
    /// its negation for back hits.
    pub normal: Vector3<f32>,
    pub triangle: Triangle,
    pub face: FaceId,
    /// Squared distance from the segment start.
    pub distance_sq: f32,
}

/// A triangle mesh prepared for segment intersection queries.
#[derive(Debug)]
pub struct CollisionMesh {
    tree: Option<KdTree>,
    transform: Matrix4<f32>,
    face_side: FaceSide,
}

impl CollisionMesh {
    /// Builds the kd-tree in mesh-local space and keeps the mesh transform,
    /// so the mesh can later be moved with [`CollisionMesh::set_transform`].
    pub fn new<M: MeshSource>(mesh: &M, max_depth: u8) -> Result<Self, BuildError> {
        let config = KdTreeConfig::new(max_depth).with_concept(KdConcept::Center);
        Ok(Self {
            tree: build_kd_tree(std::slice::from_ref(mesh), &config)?,
            transform: mesh.transform(),
            face_side: FaceSide::default(),
        })
    }

    /// Builds one kd-tree over several meshes in world space.
    pub fn from_meshes<M: MeshSource>(meshes: &[M], max_depth: u8) -> Result<Self, BuildError> {
        let config = KdTreeConfig::new(max_depth)
            .with_concept(KdConcept::Center)
            .with_pre_transform(true);
        Ok(Self {
            tree: build_kd_tree(meshes, &config)?,
            transform: Matrix4::identity(),
            face_side: FaceSide::default(),
        })
    }

    pub fn with_face_side(mut self, face_side: FaceSide) -> Self {
        self.face_side = face_side;
        self
    }

    #[inline]
    pub fn face_side(&self) -> FaceSide {
        self.face_side
    }

    pub fn set_face_side(&mut self, face_side: FaceSide) {
        self.face_side = face_side;
    }

    #[inline]
    pub fn transform(&self) -> &Matrix4<f32> {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }

    /// `None` when the meshes had no triangles.
    #[inline]
    pub fn tree(&self) -> Option<&KdTree> {
        self.tree.as_ref()
    }

    /// All intersections of `segment` (world space) with the mesh.
    ///
    /// Each face is tested once even when several leaves reference it. With
    /// [`FaceSide::Both`] a face may yield one front and one back contact.
    pub fn find_intersections(&self, segment: &Segment) -> Vec<Contact> {
        self.collect_contacts(segment, false)
    }

    /// The intersection closest to the segment start.
    pub fn nearest_intersection(&self, segment: &Segment) -> Option<Contact> {
        self.find_intersections(segment)
            .into_iter()
            .min_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq))
    }

    /// Returns `true` if `segment` hits the mesh at all.
    pub fn intersects(&self, segment: &Segment) -> bool {
        !self.collect_contacts(segment, true).is_empty()
    }

    fn collect_contacts(&self, segment: &Segment, first_only: bool) -> Vec<Contact> {
        let mut contacts = Vec::new();
        let Some(kd) = &self.tree else {
            return contacts;
        };
        let Some(inverse) = self.transform.try_inverse() else {
            return contacts;
        };
        let local = segment.transformed(&inverse);

        let mut leaves = Vec::new();
        kd.tree().find_leaves_on_segment(&local, &mut leaves);

        let mut tested = HashSet::new();
        for leaf in leaves {
            for &face_id in kd.leaf_faces(leaf) {
                if !tested.insert(face_id) {
                    continue;
                }
                let Some(face) = kd.face(face_id) else {
                    continue;
                };
                if self.face_side != FaceSide::Back {
                    if let Some(hit) = overlap::segment_triangle_intersection(&face.triangle, &local) {
                        contacts.push(self.contact(face_id, &face.triangle, &hit, false, segment));
                    }
                }
                if self.face_side != FaceSide::Front {
                    if let Some(hit) =
                        overlap::segment_triangle_intersection(&face.triangle, &local.reversed())
                    {
                        contacts.push(self.contact(face_id, &face.triangle, &hit, true, segment));
                    }
                }
                if first_only && !contacts.is_empty() {
                    return contacts;
                }
            }
        }
        contacts
    }

    fn contact(
        &self,
        face: FaceId,
        local_triangle: &Triangle,
        local_point: &Point3<f32>,
        back: bool,
        segment: &Segment,
    ) -> Contact {
        let triangle = local_triangle.transformed(&self.transform);
        let point = self.transform.transform_point(local_point);
        let normal = triangle.unit_normal().unwrap_or_else(Vector3::zeros);
        Contact {
            point,
            normal: if back { -normal } else { normal },
            triangle,
            face,
            distance_sq: (point - segment.start).norm_squared(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriangleMesh;

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::new(Point3::from(a), Point3::from(b), Point3::from(c))
    }

    /// Two floor tiles facing +y at heights 0 and 2.
    fn floors() -> TriangleMesh {
        TriangleMesh::from_triangles([
            make_triangle([0.0, 0.0, 0.0], [0.0, 0.0, 4.0], [4.0, 0.0, 0.0]),
            make_triangle([0.0, 2.0, 0.0], [0.0, 2.0, 4.0], [4.0, 2.0, 0.0]),
        ])
    }

    fn down() -> Segment {
        Segment::new(Point3::new(1.0, 5.0, 1.0), Point3::new(1.0, -5.0, 1.0))
    }

    #[test]
    fn front_faces_hit_from_above() {
        let mesh = CollisionMesh::new(&floors(), 4).unwrap();
        let contacts = mesh.find_intersections(&down());
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(|c| c.normal == Vector3::y()));

        let nearest = mesh.nearest_intersection(&down()).unwrap();
        assert_eq!(nearest.face, 1);
        assert!((nearest.point.y - 2.0).abs() < 1e-5);
        assert!((nearest.distance_sq - 9.0).abs() < 1e-4);
        assert!(mesh.intersects(&down()));
    }

    #[test]
    fn back_faces_are_filtered() {
        let up = down().reversed();
        let front_only = CollisionMesh::new(&floors(), 4).unwrap();
        assert!(front_only.find_intersections(&up).is_empty());
        assert!(!front_only.intersects(&up));

        let back_only = CollisionMesh::new(&floors(), 4).unwrap().with_face_side(FaceSide::Back);
        let contacts = back_only.find_intersections(&up);
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(|c| c.normal == -Vector3::y()));
        assert!(back_only.find_intersections(&down()).is_empty());

        let both = CollisionMesh::new(&floors(), 4).unwrap().with_face_side(FaceSide::Both);
        assert_eq!(both.find_intersections(&up).len(), 2);
        assert_eq!(both.find_intersections(&down()).len(), 2);
    }

    #[test]
    fn transform_moves_the_mesh() {
        let shift = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0));
        let mut mesh = CollisionMesh::new(&floors().with_transform(shift), 4).unwrap();
        assert!(mesh.find_intersections(&down()).is_empty());

        let moved = Segment::new(Point3::new(11.0, 5.0, 1.0), Point3::new(11.0, -5.0, 1.0));
        let hit = mesh.nearest_intersection(&moved).unwrap();
        assert!((hit.point.x - 11.0).abs() < 1e-5);
        assert!((hit.triangle.vertices()[0].x - 10.0).abs() < 1e-5);

        mesh.set_transform(Matrix4::identity());
        assert_eq!(mesh.find_intersections(&down()).len(), 2);
    }

    #[test]
    fn pre_transformed_meshes_share_one_tree() {
        let shift = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0));
        let meshes = [floors(), floors().with_transform(shift)];
        let mesh = CollisionMesh::from_meshes(&meshes, 6).unwrap();
        assert_eq!(mesh.transform(), &Matrix4::identity());
        assert_eq!(mesh.tree().unwrap().faces().len(), 4);

        let moved = Segment::new(Point3::new(11.0, 5.0, 1.0), Point3::new(11.0, -5.0, 1.0));
        let contacts = mesh.find_intersections(&moved);
        assert_eq!(contacts.len(), 2);
        let face = mesh.tree().unwrap().face(contacts[0].face).unwrap();
        assert_eq!(face.mesh, 1);
    }

    #[test]
    fn degenerate_setups_find_nothing() {
        let empty = CollisionMesh::new(&TriangleMesh::new(), 4).unwrap();
        assert!(empty.tree().is_none());
        assert!(empty.find_intersections(&down()).is_empty());

        let mut singular = CollisionMesh::new(&floors(), 4).unwrap();
        singular.set_transform(Matrix4::zeros());
        assert!(singular.find_intersections(&down()).is_empty());
    }
}
