//! Shared drawing and scene helpers for the tree demos.

use std::hash::{Hash, Hasher};

use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;
use nalgebra::{Point3, Rotation3, Vector3};
use spatial_tree::{Aabb, LeafVisitor, NodeId, Partition, Polygon, Triangle};

pub mod navigator;
pub use navigator::TreeNavigator;

/// Deterministic color from a set of vertices, so cut fragments and
/// repeated frames keep their colors.
pub fn vertex_color(vertices: &[Point3<f32>]) -> Color {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for v in vertices {
        v.x.to_bits().hash(&mut hasher);
        v.y.to_bits().hash(&mut hasher);
        v.z.to_bits().hash(&mut hasher);
    }
    let hash = hasher.finish();

    // Keep a minimum brightness.
    let r = (((hash >> 16) & 0xFF) as u8).max(40);
    let g = (((hash >> 8) & 0xFF) as u8).max(40);
    let b = ((hash & 0xFF) as u8).max(40);
    Color::from_rgba(r, g, b, 255)
}

/// Draws a convex fan of vertices as a filled mesh.
pub fn draw_fan(vertices: &[Point3<f32>], color: Color) {
    if vertices.len() < 3 {
        return;
    }
    let mesh_vertices: Vec<Vertex> = vertices
        .iter()
        .map(|p| Vertex::new2(to_vec3(p), vec2(0.0, 0.0), color))
        .collect();
    let mut indices: Vec<u16> = Vec::with_capacity((vertices.len() - 2) * 3);
    for i in 1..vertices.len() - 1 {
        indices.extend([0, i as u16, (i + 1) as u16]);
    }
    draw_mesh(&Mesh {
        vertices: mesh_vertices,
        indices,
        texture: None,
    });
}

pub fn draw_polygon(polygon: &Polygon) {
    draw_fan(polygon.vertices(), vertex_color(polygon.vertices()));
}

pub fn draw_triangle(triangle: &Triangle) {
    draw_fan(triangle.vertices(), vertex_color(triangle.vertices()));
}

pub fn draw_triangle_wire(triangle: &Triangle, color: Color) {
    let [a, b, c] = triangle.vertices();
    let (a, b, c) = (to_vec3(a), to_vec3(b), to_vec3(c));
    draw_line_3d(a, b, color);
    draw_line_3d(b, c, color);
    draw_line_3d(c, a, color);
}

pub fn draw_aabb_wire(aabb: &Aabb, color: Color) {
    let size = aabb.size();
    draw_cube_wires(to_vec3(&aabb.center()), vec3(size.x, size.y, size.z), color);
}

/// The box of a cell-shaped node: kd bounds or oct cell.
pub fn partition_box(partition: &Partition) -> Option<Aabb> {
    match partition {
        Partition::Kd { bounds, .. } => Some(*bounds),
        Partition::Oct { cell } => Some(*cell),
        _ => None,
    }
}

#[inline]
pub fn to_vec3(p: &Point3<f32>) -> Vec3 {
    vec3(p.x, p.y, p.z)
}

/// Draws the polygons of every BSP leaf it visits.
pub struct RenderVisitor;

impl LeafVisitor<Vec<Polygon>> for RenderVisitor {
    fn visit(&mut self, _leaf: NodeId, polygons: &Vec<Polygon>) {
        for polygon in polygons {
            draw_polygon(polygon);
        }
    }
}

/// The twelve triangles of a cube, wound counter-clockwise seen from outside.
pub fn cube_triangles(center: Point3<f32>, size: f32, rotation: &Rotation3<f32>) -> Vec<Triangle> {
    let half = size / 2.0;
    let corners: Vec<Point3<f32>> = [
        Vector3::new(-half, -half, -half),
        Vector3::new(half, -half, -half),
        Vector3::new(half, half, -half),
        Vector3::new(-half, half, -half),
        Vector3::new(-half, -half, half),
        Vector3::new(half, -half, half),
        Vector3::new(half, half, half),
        Vector3::new(-half, half, half),
    ]
    .iter()
    .map(|v| center + rotation * v)
    .collect();

    let faces: [[usize; 4]; 6] = [
        [4, 5, 6, 7], // +Z
        [1, 0, 3, 2], // -Z
        [0, 4, 7, 3], // -X
        [5, 1, 2, 6], // +X
        [7, 6, 2, 3], // +Y
        [0, 1, 5, 4], // -Y
    ];
    faces
        .iter()
        .flat_map(|[a, b, c, d]| {
            [
                Triangle::new(corners[*a], corners[*b], corners[*c]),
                Triangle::new(corners[*a], corners[*c], corners[*d]),
            ]
        })
        .collect()
}

/// A square floor at height `y`, facing up.
pub fn floor_triangles(y: f32, half: f32) -> [Triangle; 2] {
    let corners = [
        Point3::new(-half, y, -half),
        Point3::new(-half, y, half),
        Point3::new(half, y, half),
        Point3::new(half, y, -half),
    ];
    [
        Triangle::new(corners[0], corners[1], corners[2]),
        Triangle::new(corners[0], corners[2], corners[3]),
    ]
}

/// Camera circling a target point; drag or arrow keys orbit, the wheel
/// zooms.
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Radians around the vertical axis.
    pub yaw: f32,
    /// Radians above the horizon, kept inside `±PITCH_LIMIT`.
    pub pitch: f32,
    pub zoom_speed: f32,
    pub zoom_range: (f32, f32),
}

const PITCH_LIMIT: f32 = 1.5;
const KEY_ORBIT_STEP: f32 = 0.02;

impl OrbitCamera {
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            distance,
            yaw,
            pitch,
            zoom_speed: 5.0,
            zoom_range: (10.0, 200.0),
        }
    }

    pub fn with_zoom(mut self, speed: f32, min: f32, max: f32) -> Self {
        self.zoom_speed = speed;
        self.zoom_range = (min, max);
        self
    }

    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Applies this frame's mouse and keyboard input.
    pub fn update(&mut self) {
        if is_mouse_button_down(MouseButton::Left) {
            let delta = mouse_delta_position();
            self.orbit(-delta.x * 2.0, -delta.y * 2.0);
        }
        let key_axis = |plus: KeyCode, minus: KeyCode| {
            f32::from(u8::from(is_key_down(plus))) - f32::from(u8::from(is_key_down(minus)))
        };
        self.orbit(
            key_axis(KeyCode::Left, KeyCode::Right) * KEY_ORBIT_STEP,
            key_axis(KeyCode::Up, KeyCode::Down) * KEY_ORBIT_STEP,
        );

        let (near, far) = self.zoom_range;
        self.distance = (self.distance - mouse_wheel().1 * self.zoom_speed).clamp(near, far);
    }

    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + self.distance * vec3(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: Vec3::Y,
            target: self.target,
            ..Default::default()
        }
    }

    /// The eye point for tree traversal and picking.
    pub fn eye_point(&self) -> Point3<f32> {
        let eye = self.position();
        Point3::new(eye.x, eye.y, eye.z)
    }
}
