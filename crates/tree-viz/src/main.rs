use log::{error, info};
use macroquad::prelude::*;
use nalgebra::{Point3, Rotation3};
use spatial_tree::{CollisionMesh, FaceSide, Segment, Triangle, TriangleMesh, DEFAULT_KD_TREE_DEPTH};
use tree_viz::{cube_triangles, draw_triangle, draw_triangle_wire, floor_triangles, to_vec3, OrbitCamera, TreeNavigator};

/// A rotated cube and an axis-aligned cube standing on a floor.
fn generate_scene() -> Vec<Triangle> {
    let rotation = Rotation3::from_euler_angles(0.3, 0.4, 0.25);
    let mut triangles = cube_triangles(Point3::new(-1.0, 0.0, 0.0), 0.8, &rotation);
    triangles.extend(cube_triangles(Point3::new(1.0, 0.0, 0.0), 0.8, &Rotation3::identity()));
    triangles.extend(floor_triangles(-1.0, 1.5));
    triangles
}

/// A vertical probe circling over the scene.
fn probe(time: f32) -> Segment {
    let (x, z) = (1.2 * time.cos(), 1.2 * time.sin());
    Segment::new(Point3::new(x, 2.0, z), Point3::new(x, -2.0, z))
}

#[macroquad::main("Kd-tree Picking")]
async fn main() {
    env_logger::init();

    let scene = generate_scene();
    let triangle_count = scene.len();
    let mesh = TriangleMesh::from_triangles(scene);
    let mut collision = match CollisionMesh::new(&mesh, DEFAULT_KD_TREE_DEPTH) {
        Ok(collision) => collision,
        Err(err) => {
            error!("cannot build collision mesh: {err}");
            return;
        }
    };
    let Some(kd) = collision.tree() else {
        error!("scene has no triangles");
        return;
    };
    info!(
        "kd-tree built: {} faces, {} references, depth {}",
        kd.faces().len(),
        kd.reference_count(),
        kd.tree().depth()
    );

    let mut camera = OrbitCamera::new(5.0, 0.4, 0.4).with_zoom(0.5, 2.0, 20.0);
    let mut navigator = TreeNavigator::new();

    loop {
        camera.update();
        if is_key_pressed(KeyCode::S) {
            let next = match collision.face_side() {
                FaceSide::Front => FaceSide::Back,
                FaceSide::Back => FaceSide::Both,
                FaceSide::Both => FaceSide::Front,
            };
            collision.set_face_side(next);
        }
        let face_side = collision.face_side();

        let segment = probe(get_time() as f32 * 0.5);
        let contacts = collision.find_intersections(&segment);
        let Some(kd) = collision.tree() else {
            break;
        };
        if navigator.update(kd.tree()) {
            info!("inspecting {:?}", navigator.current(kd.tree()));
        }

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        navigator.render(kd.tree(), |_, faces| {
            for face in faces.iter().filter_map(|id| kd.face(*id)) {
                draw_triangle(&face.triangle);
            }
        });
        for face in kd.faces() {
            draw_triangle_wire(&face.triangle, Color::from_rgba(90, 90, 110, 255));
        }

        draw_line_3d(to_vec3(&segment.start), to_vec3(&segment.end), WHITE);
        for contact in &contacts {
            let point = to_vec3(&contact.point);
            draw_sphere(point, 0.05, None, RED);
            let tip = contact.point + contact.normal * 0.3;
            draw_line_3d(point, to_vec3(&tip), ORANGE);
        }

        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), RED);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), GREEN);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0), BLUE);

        set_default_camera();

        draw_text(
            &format!("Kd-tree picking - {triangle_count} triangles, depth {}", kd.tree().depth()),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!("Probe contacts: {} | [S]ides: {face_side:?}", contacts.len()),
            10.0,
            45.0,
            18.0,
            GRAY,
        );
        navigator.draw_ui(kd.tree(), 70.0);
        draw_text("Drag mouse to rotate, scroll to zoom", 10.0, 155.0, 16.0, DARKGRAY);
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 175.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
