//! Cutting geometry in two along a plane.

use super::{Classification, Plane3D, PlaneSide, Polygon, Triangle};

/// Geometry a BSP splitter can cut.
pub trait Cuttable {
    /// `(front, back)` parts. Whole pieces go to one side (coplanar ones to
    /// the front); spanning pieces are clipped into both.
    fn cut(&self, plane: &Plane3D) -> (Option<Polygon>, Option<Polygon>);
}

impl Cuttable for Polygon {
    fn cut(&self, plane: &Plane3D) -> (Option<Polygon>, Option<Polygon>) {
        match self.classify(plane) {
            Classification::Front | Classification::Coplanar => (Some(self.clone()), None),
            Classification::Back => (None, Some(self.clone())),
            Classification::Spanning => clip(self, plane),
        }
    }
}

impl Cuttable for Triangle {
    fn cut(&self, plane: &Plane3D) -> (Option<Polygon>, Option<Polygon>) {
        Polygon::from(self).cut(plane)
    }
}

/// Sutherland–Hodgman clip against both half-spaces at once. On-plane
/// vertices and edge crossings belong to both halves.
fn clip(polygon: &Polygon, plane: &Plane3D) -> (Option<Polygon>, Option<Polygon>) {
    let vertices = polygon.vertices();
    let sides: Vec<PlaneSide> = vertices.iter().map(|v| plane.side_of(*v)).collect();
    let mut front = Vec::with_capacity(vertices.len() + 1);
    let mut back = Vec::with_capacity(vertices.len() + 1);

    for (i, &current) in vertices.iter().enumerate() {
        let j = (i + 1) % vertices.len();
        match sides[i] {
            PlaneSide::Front => front.push(current),
            PlaneSide::Back => back.push(current),
            PlaneSide::OnPlane => {
                front.push(current);
                back.push(current);
            }
        }
        if let (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front) = (sides[i], sides[j]) {
            if let Some(point) = plane.crossing(current, vertices[j]) {
                front.push(point);
                back.push(point);
            }
        }
    }

    let keep = |outline: Vec<_>| (outline.len() >= 3).then(|| Polygon::new(outline));
    (keep(front), keep(back))
}
