use log::{error, info};
use macroquad::prelude::*;
use nalgebra::{Point3, Rotation3};
use spatial_tree::{build_bsp_tree, TriangleMesh, MAX_TREE_DEPTH};
use tree_viz::{cube_triangles, draw_polygon, floor_triangles, OrbitCamera, RenderVisitor, TreeNavigator};

#[macroquad::main("BSP-tree Painter")]
async fn main() {
    env_logger::init();

    let rotation = Rotation3::from_euler_angles(0.3, 0.4, 0.25);
    let mut triangles = cube_triangles(Point3::new(-1.0, 0.0, 0.0), 0.8, &rotation);
    triangles.extend(cube_triangles(Point3::new(1.0, 0.0, 0.0), 0.8, &Rotation3::identity()));
    triangles.extend(floor_triangles(-1.0, 1.5));
    let triangle_count = triangles.len();

    let tree = match build_bsp_tree(&TriangleMesh::from_triangles(triangles), MAX_TREE_DEPTH) {
        Ok(Some(tree)) => tree,
        Ok(None) => {
            error!("scene has no usable triangles");
            return;
        }
        Err(err) => {
            error!("cannot build bsp-tree: {err}");
            return;
        }
    };
    let polygon_count: usize = tree
        .leaves()
        .filter_map(|leaf| tree.payload(leaf).ok().flatten())
        .map(Vec::len)
        .sum();
    info!(
        "bsp-tree built: {triangle_count} triangles, {polygon_count} polygons, depth {}",
        tree.depth()
    );

    let mut camera = OrbitCamera::new(5.0, 0.4, 0.4).with_zoom(0.5, 2.0, 20.0);
    let mut navigator = TreeNavigator::new();
    let mut whole_tree = true;

    loop {
        camera.update();
        if navigator.update(&tree) {
            whole_tree = false;
        }
        if is_key_pressed(KeyCode::A) {
            whole_tree = !whole_tree;
        }

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        if whole_tree {
            // Painter's order: farthest leaves first.
            tree.traverse_back_to_front(camera.eye_point(), &mut RenderVisitor);
        } else {
            navigator.render(&tree, |_, polygons| polygons.iter().for_each(draw_polygon));
        }

        set_default_camera();

        draw_text(
            &format!("BSP-tree - {polygon_count} polygons from {triangle_count} triangles"),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!("Tree depth: {} | [A]ll leaves: {whole_tree}", tree.depth()),
            10.0,
            45.0,
            18.0,
            GRAY,
        );
        navigator.draw_ui(&tree, 70.0);
        draw_text("Drag mouse to rotate, scroll to zoom", 10.0, 155.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
