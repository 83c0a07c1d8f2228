use crate::config::Geometry;

use super::{EdgePath, Point, PositionMap};

// ── Label anchor ────────────────────────────────────────────────────
/// Curve parameter of the label anchor, biased toward the edge start.
const LABEL_T: f32 = 0.33;

// ── Self-loops ──────────────────────────────────────────────────────
/// Vertical offset of the loop anchors from the node center.
const SELF_LOOP_ANCHOR_OFFSET: f32 = 10.0;
/// Loop radius as a fraction of node width.
const SELF_LOOP_RADIUS_RATIO: f32 = 0.125;

// ── Forward edges ───────────────────────────────────────────────────
/// Horizontal drift below which an edge is drawn as a straight line.
const STRAIGHT_EDGE_MAX_DX: f32 = 10.0;
/// Edges longer than this many level spacings get the pronounced curve.
const LONG_EDGE_SPACING_RATIO: f32 = 1.5;
const LONG_EDGE_BEND_RATIO: f32 = 0.5;
const LONG_EDGE_BEND_MAX: f32 = 100.0;
const SHORT_EDGE_BEND_RATIO: f32 = 0.3;
const SHORT_EDGE_BEND_MAX: f32 = 50.0;

// ── Upward (back) edges ─────────────────────────────────────────────
/// Extra clearance below the target box where upward edges enter.
const UPWARD_ENTRY_CLEARANCE: f32 = 15.0;
const UPWARD_BEND_RATIO: f32 = 0.5;
const UPWARD_BEND_MAX: f32 = 100.0;

/// Geometry for the edge `source -> target`, or `None` when an endpoint has
/// no position or two distinct nodes share the same position.
pub fn compute_edge_path(
    source: &str,
    target: &str,
    positions: &PositionMap,
    geometry: &Geometry,
) -> Option<EdgePath> {
    let from = *positions.get(source)?;
    let to = *positions.get(target)?;

    if source == target {
        return Some(self_loop_path(from, geometry));
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let distance = dx.hypot(dy);
    if distance == 0.0 {
        return None;
    }

    if to.y < from.y {
        Some(upward_path(from, to, geometry))
    } else {
        Some(forward_path(from, to, dx, dy, distance, geometry))
    }
}

fn self_loop_path(center: Point, geometry: &Geometry) -> EdgePath {
    let radius = geometry.node_width * SELF_LOOP_RADIUS_RATIO;
    let right = center.x + geometry.node_width / 2.0;
    let start = Point::new(right, center.y - SELF_LOOP_ANCHOR_OFFSET);
    let end = Point::new(right, center.y + SELF_LOOP_ANCHOR_OFFSET);
    let reach = right + radius * 2.0;
    let c1 = Point::new(reach, start.y - radius);
    let c2 = Point::new(reach, end.y + radius);

    EdgePath {
        start_x: start.x,
        start_y: start.y,
        end_x: end.x,
        end_y: end.y,
        control_points: Some([c1, c2]),
        mid_x: reach,
        mid_y: center.y,
        is_upward_edge: false,
    }
}

/// Leaves the top of the source and comes up into the target from below.
fn upward_path(from: Point, to: Point, geometry: &Geometry) -> EdgePath {
    let half_height = geometry.node_height / 2.0;
    let start = Point::new(from.x, from.y - half_height);
    let end = Point::new(to.x, to.y + half_height + UPWARD_ENTRY_CLEARANCE);
    let bend = ((to.y - from.y).abs() * UPWARD_BEND_RATIO).min(UPWARD_BEND_MAX);
    let c1 = Point::new(start.x, start.y - bend);
    let c2 = Point::new(end.x, end.y + bend / 2.0);
    curved_path(start, c1, c2, end, true)
}

fn forward_path(
    from: Point,
    to: Point,
    dx: f32,
    dy: f32,
    distance: f32,
    geometry: &Geometry,
) -> EdgePath {
    let half_height = geometry.node_height / 2.0;
    let ux = dx / distance;
    let uy = dy / distance;
    let start = Point::new(from.x + ux * half_height, from.y + uy * half_height);
    let end = Point::new(to.x - ux * half_height, to.y - uy * half_height);

    if dx.abs() < STRAIGHT_EDGE_MAX_DX {
        let mid = lerp(start, end, LABEL_T);
        return EdgePath {
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            control_points: None,
            mid_x: mid.x,
            mid_y: mid.y,
            is_upward_edge: false,
        };
    }

    let bend = if distance > geometry.spacing_y * LONG_EDGE_SPACING_RATIO {
        (dy.abs() * LONG_EDGE_BEND_RATIO).min(LONG_EDGE_BEND_MAX)
    } else {
        (dy.abs() * SHORT_EDGE_BEND_RATIO).min(SHORT_EDGE_BEND_MAX)
    };
    let c1 = Point::new(start.x, start.y + bend);
    let c2 = Point::new(end.x, end.y - bend);
    curved_path(start, c1, c2, end, false)
}

fn curved_path(start: Point, c1: Point, c2: Point, end: Point, is_upward_edge: bool) -> EdgePath {
    let mid = cubic_bezier_point(start, c1, c2, end, LABEL_T);
    EdgePath {
        start_x: start.x,
        start_y: start.y,
        end_x: end.x,
        end_y: end.y,
        control_points: Some([c1, c2]),
        mid_x: mid.x,
        mid_y: mid.y,
        is_upward_edge,
    }
}

fn cubic_bezier_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry {
            node_width: 160.0,
            node_height: 40.0,
            spacing_x: 200.0,
            spacing_y: 120.0,
            left_padding: 0.0,
        }
    }

    fn positions(entries: &[(&str, f32, f32)]) -> PositionMap {
        entries
            .iter()
            .map(|(id, x, y)| (id.to_string(), Point::new(*x, *y)))
            .collect()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn missing_endpoint_yields_none() {
        let pos = positions(&[("A", 100.0, 100.0)]);
        assert!(compute_edge_path("A", "B", &pos, &geometry()).is_none());
        assert!(compute_edge_path("B", "A", &pos, &geometry()).is_none());
    }

    #[test]
    fn coincident_nodes_yield_none() {
        let pos = positions(&[("A", 100.0, 100.0), ("B", 100.0, 100.0)]);
        assert!(compute_edge_path("A", "B", &pos, &geometry()).is_none());
    }

    #[test]
    fn self_loop_sits_on_the_right_side() {
        let pos = positions(&[("A", 300.0, 100.0)]);
        let path = compute_edge_path("A", "A", &pos, &geometry()).unwrap();
        assert!(!path.is_upward_edge);
        assert!(close(path.start_x, 380.0));
        assert!(close(path.end_x, 380.0));
        assert!(close(path.start_y, 90.0));
        assert!(close(path.end_y, 110.0));
        let [c1, c2] = path.control_points.unwrap();
        assert!(close(c1.x, 420.0));
        assert!(close(c2.x, 420.0));
        assert!(close(c1.y, 70.0));
        assert!(close(c2.y, 130.0));
        assert!(path.mid_x > 380.0);
        assert!(close(path.mid_y, 100.0));
    }

    #[test]
    fn vertical_edge_is_straight_with_linear_label() {
        let pos = positions(&[("A", 200.0, 100.0), ("B", 205.0, 220.0)]);
        let path = compute_edge_path("A", "B", &pos, &geometry()).unwrap();
        assert!(path.control_points.is_none());
        assert!(!path.is_upward_edge);
        assert!(path.start_y > 100.0 && path.start_y <= 120.0);
        assert!(path.end_y < 220.0 && path.end_y >= 200.0);
        let expected = path.start_y + (path.end_y - path.start_y) * LABEL_T;
        assert!(close(path.mid_y, expected));
    }

    #[test]
    fn diagonal_edges_bend_by_length() {
        let pos = positions(&[("A", 100.0, 100.0), ("B", 300.0, 220.0)]);
        let g = geometry();
        let path = compute_edge_path("A", "B", &pos, &g).unwrap();
        // distance = hypot(200, 120) ≈ 233 > 180, so this one is long
        let [c1, _] = path.control_points.unwrap();
        assert!(close(c1.y - path.start_y, 60.0));

        let near = positions(&[("A", 100.0, 100.0), ("B", 150.0, 160.0)]);
        let path = compute_edge_path("A", "B", &near, &g).unwrap();
        let [c1, c2] = path.control_points.unwrap();
        assert!(close(c1.y - path.start_y, 18.0));
        assert!(close(path.end_y - c2.y, 18.0));
        assert!(close(c1.x, path.start_x));
        assert!(close(c2.x, path.end_x));
    }

    #[test]
    fn long_edge_bend_is_capped() {
        let pos = positions(&[("A", 100.0, 100.0), ("B", 400.0, 700.0)]);
        let path = compute_edge_path("A", "B", &pos, &geometry()).unwrap();
        let [c1, c2] = path.control_points.unwrap();
        assert!(close(c1.y - path.start_y, 100.0));
        assert!(close(path.end_y - c2.y, 100.0));
    }

    #[test]
    fn upward_edge_leaves_top_and_enters_below_target() {
        let pos = positions(&[("A", 100.0, 340.0), ("B", 300.0, 100.0)]);
        let path = compute_edge_path("A", "B", &pos, &geometry()).unwrap();
        assert!(path.is_upward_edge);
        assert!(close(path.start_x, 100.0));
        assert!(close(path.start_y, 320.0));
        assert!(close(path.end_x, 300.0));
        assert!(close(path.end_y, 135.0));
        let [c1, c2] = path.control_points.unwrap();
        assert!(close(c1.y, 220.0));
        assert!(close(c2.y, 185.0));
    }

    #[test]
    fn label_anchor_uses_cubic_formula() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(0.0, 100.0);
        let p2 = Point::new(100.0, 100.0);
        let p3 = Point::new(100.0, 0.0);
        let start = cubic_bezier_point(p0, p1, p2, p3, 0.0);
        let end = cubic_bezier_point(p0, p1, p2, p3, 1.0);
        assert_eq!(start, p0);
        assert_eq!(end, p3);
        let mid = cubic_bezier_point(p0, p1, p2, p3, 0.5);
        assert!(close(mid.x, 50.0));
        assert!(close(mid.y, 75.0));
    }

    #[test]
    fn paths_are_deterministic() {
        let pos = positions(&[("A", 120.0, 100.0), ("B", 420.0, 460.0)]);
        let first = compute_edge_path("A", "B", &pos, &geometry());
        let second = compute_edge_path("A", "B", &pos, &geometry());
        assert_eq!(first, second);
    }
}
