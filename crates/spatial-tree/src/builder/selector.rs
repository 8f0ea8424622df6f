//! Plane selection strategies for BSP tree construction.
//!
//! The choice of splitting plane affects tree balance and the number of
//! polygon splits during construction.

use crate::geometry::{Classification, Polygon};

/// Strategy for selecting which polygon's plane splits a BSP node.
pub trait PlaneSelector {
    /// Index of the polygon whose plane should split `polygons`.
    ///
    /// Returns `None` if no polygon is usable; the node then becomes a leaf.
    fn select(&self, polygons: &[Polygon]) -> Option<usize>;
}

/// Selects the first polygon with a well-defined plane.
///
/// Fastest, but the tree shape depends entirely on input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPolygon;

impl PlaneSelector for FirstPolygon {
    fn select(&self, polygons: &[Polygon]) -> Option<usize> {
        polygons.iter().position(|p| p.plane().is_some())
    }
}

/// Selects the plane minimising `|front - back| + split_weight * spanning`.
///
/// Planes with every other polygon on one side are rejected, since they do
/// not divide the set. O(n²) per node.
#[derive(Debug, Clone, Copy)]
pub struct BalancedSplit {
    /// Cost of one spanning polygon relative to one polygon of imbalance.
    pub split_weight: f32,
}

impl Default for BalancedSplit {
    fn default() -> Self {
        Self { split_weight: 3.0 }
    }
}

impl PlaneSelector for BalancedSplit {
    fn select(&self, polygons: &[Polygon]) -> Option<usize> {
        let mut best: Option<(f32, usize)> = None;
        for (index, candidate) in polygons.iter().enumerate() {
            let Some(plane) = candidate.plane() else {
                continue;
            };

            // The splitter itself faces its own plane.
            let (mut front, mut back, mut spanning) = (1usize, 0usize, 0usize);
            for (other_index, other) in polygons.iter().enumerate() {
                if other_index == index {
                    continue;
                }
                match other.classify(&plane) {
                    Classification::Front => front += 1,
                    Classification::Back => back += 1,
                    Classification::Coplanar if other.faces(&plane) => front += 1,
                    Classification::Coplanar => back += 1,
                    Classification::Spanning => {
                        front += 1;
                        back += 1;
                        spanning += 1;
                    }
                }
            }
            if back == 0 {
                continue;
            }

            let score = front.abs_diff(back) as f32 + self.split_weight * spanning as f32;
            if best.is_none_or(|(best_score, _)| score < best_score) {
                best = Some((score, index));
            }
        }
        best.map(|(_, index)| index)
    }
}
