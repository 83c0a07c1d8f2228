mod ranking;
mod routing;
pub(crate) mod types;
pub use ranking::{
    LevelAssignment, LevelGroups, LevelMap, assign_levels, group_by_level, normalize_levels,
    order_level,
};
pub use routing::compute_edge_path;
pub use types::*;

use crate::config::{Geometry, LayoutConfig, RankingConfig, ViewportConfig};
use crate::ir::{Edge, Graph};
use tracing::debug;

/// Distance from the canvas top to the first level's node centers.
const TOP_MARGIN: f32 = 100.0;
/// Room left under the last level for edge routing.
const BOTTOM_MARGIN: f32 = 200.0;
const EMPTY_CANVAS_HEIGHT: f32 = 400.0;

/// Levels after normalization and in-level ordering.
struct LevelPlan {
    assignment: LevelAssignment,
    groups: LevelGroups,
}

impl LevelPlan {
    fn build(graph: &Graph, ranking: &RankingConfig) -> Self {
        let mut assignment = assign_levels(graph, ranking);
        assignment.levels = normalize_levels(&assignment.levels);
        let groups = group_by_level(&assignment.levels);
        Self { assignment, groups }
    }

    fn max_level(&self) -> Option<i32> {
        self.groups.keys().next_back().copied()
    }

    fn max_nodes_in_level(&self) -> usize {
        self.groups.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Runs the in-level ordering top-down; each level sees the final order
    /// of the one above it.
    fn order(&mut self, edges: &[Edge]) {
        let Some(max_level) = self.max_level() else {
            return;
        };
        for level in 0..=max_level {
            let ordered = order_level(level, &self.groups, edges, &self.assignment.levels);
            if ordered.is_empty() {
                continue;
            }
            self.groups.insert(level, ordered);
        }
    }
}

pub fn compute_positions(graph: &Graph, canvas: CanvasSize, config: &LayoutConfig) -> PositionMap {
    if graph.is_empty() {
        return PositionMap::new();
    }
    let mut plan = LevelPlan::build(graph, &config.ranking);
    plan.order(&graph.edges);
    place_nodes(&plan, canvas, &config.geometry())
}

pub fn compute_canvas_size(
    graph: &Graph,
    viewport: &ViewportConfig,
    config: &LayoutConfig,
    nesting_depth: u32,
) -> CanvasSize {
    if graph.is_empty() {
        return CanvasSize {
            width: viewport.width,
            height: EMPTY_CANVAS_HEIGHT,
        };
    }
    let plan = LevelPlan::build(graph, &config.ranking);
    canvas_for(&plan, viewport, config, nesting_depth)
}

/// Full layout pass: canvas, node positions and one path per input edge.
pub fn compute_layout(
    graph: &Graph,
    config: &LayoutConfig,
    viewport: &ViewportConfig,
    nesting_depth: u32,
) -> Layout {
    if graph.is_empty() {
        let canvas = compute_canvas_size(graph, viewport, config, nesting_depth);
        return Layout {
            width: canvas.width,
            height: canvas.height,
            levels: LevelMap::new(),
            nodes: PositionMap::new(),
            edges: graph
                .edges
                .iter()
                .map(|edge| EdgeLayout {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    path: None,
                })
                .collect(),
            cycle_nodes: Vec::new(),
        };
    }

    let geometry = config.geometry();
    let mut plan = LevelPlan::build(graph, &config.ranking);
    let canvas = canvas_for(&plan, viewport, config, nesting_depth);
    plan.order(&graph.edges);
    let nodes = place_nodes(&plan, canvas, &geometry);

    let edges: Vec<EdgeLayout> = graph
        .edges
        .iter()
        .map(|edge| EdgeLayout {
            source: edge.source.clone(),
            target: edge.target.clone(),
            path: compute_edge_path(&edge.source, &edge.target, &nodes, &geometry),
        })
        .collect();

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        unrouted = edges.iter().filter(|edge| edge.path.is_none()).count(),
        width = canvas.width,
        height = canvas.height,
        "computed layout"
    );

    Layout {
        width: canvas.width,
        height: canvas.height,
        levels: plan.assignment.levels,
        nodes,
        edges,
        cycle_nodes: plan.assignment.cycle_nodes,
    }
}

fn canvas_for(
    plan: &LevelPlan,
    viewport: &ViewportConfig,
    config: &LayoutConfig,
    nesting_depth: u32,
) -> CanvasSize {
    let Some(max_level) = plan.max_level() else {
        return CanvasSize {
            width: viewport.width,
            height: EMPTY_CANVAS_HEIGHT,
        };
    };

    let needed = plan.max_nodes_in_level() as f32 * config.node_spacing_x;
    let base_width = if needed > viewport.width {
        needed
    } else {
        viewport.width
    };
    let scale = (1.0 - nesting_depth as f32 * config.nesting_shrink).max(config.min_nesting_scale);

    CanvasSize {
        width: base_width * scale,
        height: (max_level + 1) as f32 * config.node_spacing_y + BOTTOM_MARGIN,
    }
}

/// Centers every level's row on the canvas. Positions come back in graph
/// node order.
fn place_nodes(plan: &LevelPlan, canvas: CanvasSize, geometry: &Geometry) -> PositionMap {
    let mut placed = PositionMap::new();
    for (level, row) in &plan.groups {
        let count = row.len() as f32;
        let row_width =
            count * geometry.node_width + (count - 1.0) * (geometry.spacing_x - geometry.node_width);
        let start_x = geometry.left_padding + (canvas.width - row_width) / 2.0;
        let y = TOP_MARGIN + *level as f32 * geometry.spacing_y;
        for (idx, id) in row.iter().enumerate() {
            let x = start_x + idx as f32 * geometry.spacing_x + geometry.node_width / 2.0;
            placed.insert(id.clone(), Point::new(x, y));
        }
    }

    plan.assignment
        .levels
        .keys()
        .filter_map(|id| placed.get(id).map(|pos| (id.clone(), *pos)))
        .collect()
}
