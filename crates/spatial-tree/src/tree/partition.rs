use nalgebra::{Point2, Point3};

use crate::geometry::{ground, Aabb, Axis, Obb, Plane3D, Rect, Segment};

/// The topology a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TreeKind {
    QuadTree,
    PointQuadTree,
    OcTree,
    BspTree,
    KdTree,
    ObbTree,
}

/// Per-topology split parameters of a node.
///
/// Child order is fixed per variant: quadrants and octants are indexed by
/// their sign bits (bit 0 = +x, bit 1 = +y for octants or +z for quadrants,
/// bit 2 = +z), BSP children are `[front, back]` and kd children are
/// `[near, far]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Partition {
    /// Ground-plane (x, z) cell split at its midpoint.
    Quad { rect: Rect },
    /// Ground-plane cell split at a data point.
    PointQuad { rect: Rect, center: Point2<f32> },
    Oct { cell: Aabb },
    Bsp { plane: Plane3D },
    /// Near holds coordinates `< split` along `axis`, far holds `>= split`.
    Kd { axis: Axis, split: f32, bounds: Aabb },
    /// Oriented box with any number of children.
    Obb { obb: Obb },
}

impl Partition {
    /// A kd cell split at the center of its longest side.
    pub fn kd(bounds: Aabb) -> Self {
        let axis = bounds.longest_axis();
        Partition::Kd {
            axis,
            split: bounds.center()[axis.index()],
            bounds,
        }
    }

    /// A point quad cell split at its own midpoint.
    pub fn point_quad(rect: Rect) -> Self {
        Partition::PointQuad {
            center: rect.center(),
            rect,
        }
    }

    pub fn kind(&self) -> TreeKind {
        match self {
            Partition::Quad { .. } => TreeKind::QuadTree,
            Partition::PointQuad { .. } => TreeKind::PointQuadTree,
            Partition::Oct { .. } => TreeKind::OcTree,
            Partition::Bsp { .. } => TreeKind::BspTree,
            Partition::Kd { .. } => TreeKind::KdTree,
            Partition::Obb { .. } => TreeKind::ObbTree,
        }
    }

    /// Number of children created by [`Partition::subdivide`];
    /// `None` for variable arity.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Partition::Quad { .. } | Partition::PointQuad { .. } => Some(4),
            Partition::Oct { .. } => Some(8),
            Partition::Bsp { .. } | Partition::Kd { .. } => Some(2),
            Partition::Obb { .. } => None,
        }
    }

    /// Partitions of the fixed-arity child set, in child order.
    ///
    /// Kd children get the two halves of the split bounds with a default
    /// split of their own; BSP children inherit the parent plane until the
    /// caller assigns their splitters.
    pub fn subdivide(&self) -> Vec<Partition> {
        match self {
            Partition::Quad { rect } => {
                let center = rect.center();
                (0..4)
                    .map(|i| Partition::Quad {
                        rect: rect.quadrant(i, &center),
                    })
                    .collect()
            }
            Partition::PointQuad { rect, center } => (0..4)
                .map(|i| Partition::point_quad(rect.quadrant(i, center)))
                .collect(),
            Partition::Oct { cell } => (0..8)
                .map(|i| Partition::Oct {
                    cell: cell.octant(i),
                })
                .collect(),
            Partition::Bsp { plane } => vec![
                Partition::Bsp {
                    plane: plane.clone(),
                },
                Partition::Bsp {
                    plane: plane.clone(),
                },
            ],
            Partition::Kd {
                axis,
                split,
                bounds,
            } => {
                let (near, far) = bounds.split(*axis, *split);
                vec![Partition::kd(near), Partition::kd(far)]
            }
            Partition::Obb { .. } => Vec::new(),
        }
    }

    /// Returns `true` if the node's region contains `point`.
    /// BSP nodes have no extent and contain everything.
    pub fn contains_point(&self, point: &Point3<f32>) -> bool {
        match self {
            Partition::Quad { rect } | Partition::PointQuad { rect, .. } => {
                rect.contains(&ground(point))
            }
            Partition::Oct { cell } => cell.contains(point),
            Partition::Bsp { .. } => true,
            Partition::Kd { bounds, .. } => bounds.contains(point),
            Partition::Obb { obb } => obb.contains(point),
        }
    }

    /// Squared distance from `point` to the node's region (0 inside).
    pub fn distance_squared(&self, point: &Point3<f32>) -> f32 {
        match self {
            Partition::Quad { rect } | Partition::PointQuad { rect, .. } => {
                rect.distance_squared(&ground(point))
            }
            Partition::Oct { cell } => cell.distance_squared(point),
            Partition::Bsp { .. } => 0.0,
            Partition::Kd { bounds, .. } => bounds.distance_squared(point),
            Partition::Obb { obb } => obb.distance_squared(point),
        }
    }

    /// Parametric range within `[t_min, t_max]` where `segment` lies inside
    /// the node's region grown by `margin`.
    pub fn clip_segment(
        &self,
        segment: &Segment,
        margin: f32,
        t_min: f32,
        t_max: f32,
    ) -> Option<(f32, f32)> {
        match self {
            Partition::Quad { rect } | Partition::PointQuad { rect, .. } => rect
                .expanded(margin)
                .clip_segment(&ground(&segment.start), &ground(&segment.end), t_min, t_max),
            Partition::Oct { cell } => {
                cell.expanded(margin)
                    .clip_segment(&segment.start, &segment.end, t_min, t_max)
            }
            Partition::Bsp { .. } => Some((t_min, t_max)),
            Partition::Kd { bounds, .. } => {
                bounds
                    .expanded(margin)
                    .clip_segment(&segment.start, &segment.end, t_min, t_max)
            }
            Partition::Obb { obb } => {
                let local = obb.segment_to_local(segment);
                obb.local_aabb()
                    .expanded(margin)
                    .clip_segment(&local.start, &local.end, t_min, t_max)
            }
        }
    }

    /// Index of the fixed-arity child whose region takes `point`; `None`
    /// for OBB nodes.
    ///
    /// Child regions share their faces. A point on a shared face goes to the
    /// upper cell (the set bit), which is where the grid builders and
    /// [`build_point_quad_tree`](crate::build_point_quad_tree) put objects
    /// lying on the boundary.
    pub fn child_index(&self, point: &Point3<f32>) -> Option<usize> {
        match self {
            Partition::Quad { rect } => Some(quadrant_index(&ground(point), &rect.center())),
            Partition::PointQuad { center, .. } => Some(quadrant_index(&ground(point), center)),
            Partition::Oct { cell } => {
                let center = cell.center();
                Some((0..3).fold(0, |index, axis| {
                    index | (usize::from(point[axis] >= center[axis]) << axis)
                }))
            }
            Partition::Bsp { .. } | Partition::Kd { .. } => self
                .split_offset(point)
                .map(|(offset, positive)| if offset >= 0.0 { positive } else { 1 - positive }),
            Partition::Obb { .. } => None,
        }
    }

    /// Signed offset of `point` from a binary node's splitter, together with
    /// the index of the child on the non-negative side.
    ///
    /// Kd nodes measure along their axis (far side is non-negative), BSP
    /// nodes use the plane distance (front side is non-negative). `None` for
    /// cell-based topologies.
    pub fn split_offset(&self, point: &Point3<f32>) -> Option<(f32, usize)> {
        match self {
            Partition::Kd { axis, split, .. } => Some((point[axis.index()] - split, 1)),
            Partition::Bsp { plane } => Some((plane.signed_distance(*point), 0)),
            _ => None,
        }
    }
}

fn quadrant_index(point: &Point2<f32>, center: &Point2<f32>) -> usize {
    usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn cube() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 2.0, 2.0))
    }

    #[test]
    fn kind_follows_variant() {
        assert_eq!(Partition::kd(cube()).kind(), TreeKind::KdTree);
        assert_eq!(Partition::Oct { cell: cube() }.kind(), TreeKind::OcTree);
        assert_eq!(
            Partition::Obb {
                obb: Obb::unbounded()
            }
            .arity(),
            None
        );
    }

    #[test]
    fn kd_default_split_is_longest_axis_center() {
        match Partition::kd(cube()) {
            Partition::Kd { axis, split, .. } => {
                assert_eq!(axis, Axis::X);
                assert_eq!(split, 2.0);
            }
            other => panic!("unexpected partition {other:?}"),
        }
    }

    #[test]
    fn kd_children_cover_split_halves() {
        let children = Partition::Kd {
            axis: Axis::Y,
            split: 0.5,
            bounds: cube(),
        }
        .subdivide();
        assert_eq!(children.len(), 2);
        match (&children[0], &children[1]) {
            (Partition::Kd { bounds: near, .. }, Partition::Kd { bounds: far, .. }) => {
                assert_eq!(near.max.y, 0.5);
                assert_eq!(far.min.y, 0.5);
            }
            other => panic!("unexpected children {other:?}"),
        }
    }

    #[test]
    fn point_quad_children_split_at_data_point() {
        let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0));
        let children = Partition::PointQuad {
            rect,
            center: Point2::new(1.0, 3.0),
        }
        .subdivide();
        assert_eq!(children.len(), 4);
        assert!(children[0].contains_point(&Point3::new(0.5, 100.0, 2.0)));
        assert!(children[3].contains_point(&Point3::new(2.0, -5.0, 3.5)));
        assert!(!children[3].contains_point(&Point3::new(0.5, 0.0, 3.5)));
    }

    #[test]
    fn split_offsets() {
        let kd = Partition::Kd {
            axis: Axis::Z,
            split: 1.0,
            bounds: cube(),
        };
        assert_eq!(kd.split_offset(&Point3::new(0.0, 0.0, 0.25)), Some((-0.75, 1)));

        let bsp = Partition::Bsp {
            plane: Plane3D::new(Vector3::x(), 1.0),
        };
        assert_eq!(bsp.split_offset(&Point3::new(3.0, 0.0, 0.0)), Some((2.0, 0)));
        assert_eq!(Partition::Oct { cell: cube() }.split_offset(&Point3::origin()), None);
    }

    #[test]
    fn shared_faces_route_to_upper_child() {
        let oct = Partition::Oct { cell: cube() };
        assert_eq!(oct.child_index(&Point3::new(2.0, 1.0, 1.0)), Some(0b111));
        assert_eq!(oct.child_index(&Point3::new(1.9, 1.0, 0.5)), Some(0b010));

        let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0));
        let point_quad = Partition::PointQuad {
            rect,
            center: Point2::new(1.0, 3.0),
        };
        assert_eq!(point_quad.child_index(&Point3::new(1.0, 0.0, 3.0)), Some(3));
        assert_eq!(point_quad.child_index(&Point3::new(0.5, 0.0, 3.0)), Some(2));
        assert_eq!(Partition::Quad { rect }.child_index(&Point3::new(2.0, 9.0, 1.0)), Some(1));

        let kd = Partition::Kd {
            axis: Axis::X,
            split: 2.0,
            bounds: cube(),
        };
        assert_eq!(kd.child_index(&Point3::new(2.0, 0.0, 0.0)), Some(1));
        assert_eq!(
            Partition::Obb {
                obb: Obb::unbounded()
            }
            .child_index(&Point3::origin()),
            None
        );
    }

    #[test]
    fn clip_against_expanded_cell() {
        let oct = Partition::Oct { cell: cube() };
        let above = Segment::new(Point3::new(-1.0, 2.5, 1.0), Point3::new(5.0, 2.5, 1.0));
        assert!(oct.clip_segment(&above, 0.0, 0.0, 1.0).is_none());
        assert!(oct.clip_segment(&above, 0.5, 0.0, 1.0).is_some());
    }
}
