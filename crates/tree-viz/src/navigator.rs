//! Interactive walk down any spatial tree.

use macroquad::prelude::*;
use spatial_tree::{NodeId, Tree};

use crate::{draw_aabb_wire, partition_box};

const CHILD_KEYS: [KeyCode; 8] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
];

/// Tracks the path (child indices) from the root to the inspected node.
#[derive(Debug, Default)]
pub struct TreeNavigator {
    path: Vec<usize>,
}

impl TreeNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Descends into child `index`. Returns true if it exists.
    pub fn go_child<P>(&mut self, tree: &Tree<P>, index: usize) -> bool {
        let exists = self
            .current(tree)
            .and_then(|id| tree.children(id).ok())
            .is_some_and(|children| index < children.len());
        if exists {
            self.path.push(index);
        }
        exists
    }

    pub fn go_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }

    pub fn go_root(&mut self) {
        self.path.clear();
    }

    /// Handles keyboard input: digits pick a child, P goes up, R resets.
    /// Returns true if the inspected node changed.
    pub fn update<P>(&mut self, tree: &Tree<P>) -> bool {
        let mut changed = false;
        for (index, key) in CHILD_KEYS.iter().enumerate() {
            if is_key_pressed(*key) {
                changed |= self.go_child(tree, index);
            }
        }
        if is_key_pressed(KeyCode::P) {
            changed |= self.go_parent();
        }
        if is_key_pressed(KeyCode::R) && !self.path.is_empty() {
            self.go_root();
            changed = true;
        }
        changed
    }

    /// The inspected node; `None` if the path no longer fits the tree.
    pub fn current<P>(&self, tree: &Tree<P>) -> Option<NodeId> {
        let mut id = tree.root();
        for &index in &self.path {
            id = *tree.children(id).ok()?.get(index)?;
        }
        Some(id)
    }

    /// Draws the inspected node's box and hands every payload leaf below it
    /// to `draw_leaf`.
    pub fn render<P>(&self, tree: &Tree<P>, mut draw_leaf: impl FnMut(NodeId, &P)) {
        let Some(current) = self.current(tree) else {
            return;
        };
        if let Some(aabb) = tree.partition(current).ok().and_then(partition_box) {
            draw_aabb_wire(&aabb, YELLOW);
        }

        let mut stack = vec![current];
        while let Some(id) = stack.pop() {
            let Ok(node) = tree.node(id) else {
                continue;
            };
            if let Some(payload) = node.payload() {
                draw_leaf(id, payload);
            }
            stack.extend(node.children().iter().rev());
        }
    }

    pub fn draw_ui<P>(&self, tree: &Tree<P>, y_offset: f32) {
        let Some(current) = self.current(tree) else {
            return;
        };
        let children = tree.children(current).map_or(0, <[NodeId]>::len);
        let path = if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|index| (index + 1).to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        draw_text(&format!("Node {current}"), 10.0, y_offset, 18.0, WHITE);
        draw_text(
            &format!("Path: {path} (level {})", self.path.len()),
            10.0,
            y_offset + 20.0,
            18.0,
            YELLOW,
        );
        let (label, color) = if children == 0 {
            ("(leaf)".to_string(), ORANGE)
        } else {
            (format!("Children: [1-{children}]"), GREEN)
        };
        draw_text(&label, 10.0, y_offset + 40.0, 18.0, color);
        draw_text("[P]arent | [R]oot", 10.0, y_offset + 60.0, 16.0, DARKGRAY);
    }
}
