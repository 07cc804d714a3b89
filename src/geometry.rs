//! Branch curve geometry
//!
//! Every branch is drawn as a quadratic Bézier from its source to its
//! target. The control point is either the one the user dragged or a
//! default that bows the curve upward, so parallel branches between the
//! same nodes stay distinguishable once one of them is reshaped.
//!
//! Non-finite input never panics: the main path degrades to a straight
//! line and the arrowhead disappears.

use egui::{Pos2, Vec2};

use crate::constants::curve::{
    ARROW_LENGTH, ARROW_T, ARROW_WING_ANGLE, DEFAULT_BOW, HIT_SAMPLES, LABEL_T,
};
use crate::graph::{Branch, SignalGraph};

fn is_finite(p: Pos2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Chord midpoint lifted by the default bow
pub fn default_control_point(source: Pos2, target: Pos2) -> Pos2 {
    Pos2::new(
        (source.x + target.x) / 2.0,
        (source.y + target.y) / 2.0 - DEFAULT_BOW,
    )
}

/// The stored control point when it is usable, otherwise the default
pub fn resolve_control_point(source: Pos2, target: Pos2, stored: Option<Pos2>) -> Pos2 {
    match stored {
        Some(point) if is_finite(point) => point,
        _ => default_control_point(source, target),
    }
}

/// Calculates a point on a quadratic Bézier curve at parameter t (0.0 to 1.0)
pub fn quadratic_bezier_point(t: f32, p0: Pos2, p1: Pos2, p2: Pos2) -> Pos2 {
    let mt = 1.0 - t;
    Pos2::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

/// Calculates the minimum distance from a point to a line segment
pub fn distance_to_line_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_len_sq = ab.x * ab.x + ab.y * ab.y;

    if ab_len_sq == 0.0 {
        return (point - a).length();
    }

    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len_sq).clamp(0.0, 1.0);
    let projection = a + ab * t;
    (point - projection).length()
}

/// Everything needed to draw or export one branch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    pub source: Pos2,
    pub control: Pos2,
    pub target: Pos2,
    /// Arrowhead triangle: anchor on the curve, then the two wing tips
    pub arrow: Option<[Pos2; 3]>,
    /// Point on the curve where the function label sits
    pub label: Pos2,
}

impl EdgeCurve {
    /// Resolves the control point and derives arrowhead and label anchor
    pub fn solve(source: Pos2, target: Pos2, stored: Option<Pos2>) -> Self {
        let control = resolve_control_point(source, target, stored);
        let mut curve = Self {
            source,
            control,
            target,
            arrow: None,
            label: Pos2::new((source.x + target.x) / 2.0, (source.y + target.y) / 2.0),
        };
        if curve.is_curved() {
            curve.arrow = Some(curve.arrowhead());
            curve.label = curve.point_at(LABEL_T);
        }
        curve
    }

    /// False when any of the three points is not finite
    pub fn is_curved(&self) -> bool {
        is_finite(self.source) && is_finite(self.control) && is_finite(self.target)
    }

    pub fn point_at(&self, t: f32) -> Pos2 {
        quadratic_bezier_point(t, self.source, self.control, self.target)
    }

    fn arrowhead(&self) -> [Pos2; 3] {
        let anchor = self.point_at(ARROW_T);
        let direction = self.target - anchor;
        let angle = direction.y.atan2(direction.x);
        let wing = |offset: f32| anchor - Vec2::angled(angle + offset) * ARROW_LENGTH;
        [anchor, wing(-ARROW_WING_ANGLE), wing(ARROW_WING_ANGLE)]
    }

    /// SVG path of the branch body
    pub fn path(&self) -> String {
        let (s, c, t) = (self.source, self.control, self.target);
        if self.is_curved() {
            format!("M {},{} Q {},{} {},{}", s.x, s.y, c.x, c.y, t.x, t.y)
        } else {
            format!("M {},{} L {},{}", s.x, s.y, t.x, t.y)
        }
    }

    /// SVG path of the arrowhead, empty when the curve is degenerate
    pub fn arrow_path(&self) -> String {
        match self.arrow {
            Some([a, b, c]) => format!("M {},{} L {},{} L {},{} Z", a.x, a.y, b.x, b.y, c.x, c.y),
            None => String::new(),
        }
    }

    /// Approximate distance from `point` to the drawn branch
    pub fn distance_to(&self, point: Pos2) -> f32 {
        if !self.is_curved() {
            return distance_to_line_segment(point, self.source, self.target);
        }
        let mut previous = self.source;
        let mut best = f32::INFINITY;
        for i in 1..=HIT_SAMPLES {
            let next = self.point_at(i as f32 / HIT_SAMPLES as f32);
            best = best.min(distance_to_line_segment(point, previous, next));
            previous = next;
        }
        best
    }
}

/// Curves for every branch whose endpoints both exist, in creation order
pub fn branch_curves(graph: &SignalGraph) -> Vec<(&Branch, EdgeCurve)> {
    graph
        .edges()
        .iter()
        .filter_map(|edge| {
            let source = graph.node(edge.source)?.position;
            let target = graph.node(edge.target)?.position;
            Some((edge, EdgeCurve::solve(source, target, edge.control_point)))
        })
        .collect()
}
