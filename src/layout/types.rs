use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Center of a node box on the canvas.
pub type Position = Point;

/// Node id to position, in graph node order.
pub type PositionMap = IndexMap<String, Position>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

/// Geometry of one rendered edge. `mid_x`/`mid_y` is the label anchor,
/// taken a third of the way along the curve from the start side rather than
/// at its true midpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePath {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_points: Option<[Point; 2]>,
    pub mid_x: f32,
    pub mid_y: f32,
    pub is_upward_edge: bool,
}

impl EdgePath {
    pub fn label_anchor(&self) -> Point {
        Point::new(self.mid_x, self.mid_y)
    }

    /// SVG `d` attribute for this path.
    pub fn to_svg_path(&self) -> String {
        match self.control_points {
            Some([c1, c2]) => format!(
                "M {:.2} {:.2} C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}",
                self.start_x, self.start_y, c1.x, c1.y, c2.x, c2.y, self.end_x, self.end_y
            ),
            None => format!(
                "M {:.2} {:.2} L {:.2} {:.2}",
                self.start_x, self.start_y, self.end_x, self.end_y
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub source: String,
    pub target: String,
    /// `None` when an endpoint is unknown or both endpoints coincide.
    pub path: Option<EdgePath>,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub levels: IndexMap<String, i32>,
    pub nodes: PositionMap,
    pub edges: Vec<EdgeLayout>,
    pub cycle_nodes: Vec<String>,
}

impl Layout {
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize {
            width: self.width,
            height: self.height,
        }
    }

    pub fn max_level(&self) -> Option<i32> {
        self.levels.values().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(control_points: Option<[Point; 2]>) -> EdgePath {
        EdgePath {
            start_x: 10.0,
            start_y: 20.0,
            end_x: 15.5,
            end_y: 140.0,
            control_points,
            mid_x: 12.0,
            mid_y: 60.0,
            is_upward_edge: false,
        }
    }

    #[test]
    fn straight_path_is_a_line() {
        assert_eq!(path(None).to_svg_path(), "M 10.00 20.00 L 15.50 140.00");
    }

    #[test]
    fn curved_path_is_a_cubic() {
        let curved = path(Some([Point::new(10.0, 80.0), Point::new(15.5, 80.0)]));
        assert_eq!(
            curved.to_svg_path(),
            "M 10.00 20.00 C 10.00 80.00, 15.50 80.00, 15.50 140.00"
        );
        assert_eq!(curved.label_anchor(), Point::new(12.0, 60.0));
    }
}
