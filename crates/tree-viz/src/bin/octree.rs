use log::{error, info};
use macroquad::prelude::*;
use nalgebra::{Point3, Rotation3};
use spatial_tree::{build_oc_tree, TriangleMesh, DEFAULT_FORK_COUNT};
use tree_viz::{cube_triangles, draw_aabb_wire, draw_triangle, floor_triangles, partition_box, OrbitCamera};

#[macroquad::main("Oct-tree Cells")]
async fn main() {
    env_logger::init();

    let rotation = Rotation3::from_euler_angles(0.0, 0.6, 0.0);
    let mut triangles = cube_triangles(Point3::new(0.0, -0.4, 0.0), 1.0, &rotation);
    triangles.extend(floor_triangles(-1.0, 2.0));
    let mesh = TriangleMesh::from_triangles(triangles);

    let mut forks = DEFAULT_FORK_COUNT;
    let mut octree = match build_oc_tree(&mesh, forks) {
        Ok(Some(octree)) => octree,
        Ok(None) => {
            error!("scene has no triangles");
            return;
        }
        Err(err) => {
            error!("cannot build oct-tree: {err}");
            return;
        }
    };

    let mut camera = OrbitCamera::new(6.0, 0.5, 0.5).with_zoom(0.5, 2.0, 20.0);
    let mut probe = 0usize;

    loop {
        camera.update();
        let rebuild = if is_key_pressed(KeyCode::Equal) {
            Some(forks.saturating_add(1))
        } else if is_key_pressed(KeyCode::Minus) {
            Some(forks.saturating_sub(1))
        } else {
            None
        };
        if let Some(next) = rebuild {
            match build_oc_tree(&mesh, next) {
                Ok(Some(rebuilt)) => {
                    info!("rebuilt oct-tree with {next} forks");
                    forks = next;
                    octree = rebuilt;
                    probe = 0;
                }
                Ok(None) => {}
                Err(err) => error!("{err}"),
            }
        }
        if is_key_pressed(KeyCode::N) {
            probe = (probe + 1) % octree.cells().len();
        }

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        let mut filled = 0;
        for &cell in octree.cells() {
            let Ok(node) = octree.tree().node(cell) else {
                continue;
            };
            let Some(aabb) = partition_box(node.partition()) else {
                continue;
            };
            if node.payload().is_some() {
                filled += 1;
                draw_aabb_wire(&aabb, Color::from_rgba(80, 120, 80, 255));
            }
        }

        let current = octree.cells()[probe];
        if let Ok(node) = octree.tree().node(current) {
            if let Some(aabb) = partition_box(node.partition()) {
                draw_aabb_wire(&aabb, YELLOW);
            }
            for face in node.payload().into_iter().flatten() {
                draw_triangle(&face.triangle);
            }
        }

        set_default_camera();

        draw_text(
            &format!(
                "Oct-tree - {forks} forks, {} cells, {filled} filled",
                octree.cells().len()
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!("Cell {probe} ({current}) | [N]ext cell | [+/-] forks"),
            10.0,
            45.0,
            18.0,
            GRAY,
        );
        draw_text("Drag mouse to rotate, scroll to zoom", 10.0, 65.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
