use serde::Deserialize;
use tracegraph::{Config, Graph, LayoutDump, compute_layout};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphLayoutOptions {
    node_width: Option<f32>,
    node_height: Option<f32>,
    node_spacing_x: Option<f32>,
    node_spacing_y: Option<f32>,
    left_padding: Option<f32>,
    viewport_width: Option<f32>,
    viewport_height: Option<f32>,
    nesting_depth: Option<u32>,
}

fn build_config(options: &GraphLayoutOptions) -> Config {
    let mut config = Config::default();
    if let Some(v) = options.node_width {
        config.layout.node_width = v;
    }
    if let Some(v) = options.node_height {
        config.layout.node_height = v;
    }
    if let Some(v) = options.node_spacing_x {
        config.layout.node_spacing_x = v;
    }
    if let Some(v) = options.node_spacing_y {
        config.layout.node_spacing_y = v;
    }
    if let Some(v) = options.left_padding {
        config.layout.left_padding = v;
    }
    if let Some(v) = options.viewport_width {
        config.viewport.width = v;
    }
    if let Some(v) = options.viewport_height {
        config.viewport.height = v;
    }
    config
}

fn layout_json(graph_json: &str, options_json: Option<&str>) -> Result<String, String> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<GraphLayoutOptions>(raw).map_err(|e| e.to_string())?,
        None => GraphLayoutOptions::default(),
    };
    let graph = Graph::from_json_str(graph_json).map_err(|e| e.to_string())?;
    graph.validate().map_err(|e| e.to_string())?;
    let config = build_config(&options);
    let layout = compute_layout(
        &graph,
        &config.layout,
        &config.viewport,
        options.nesting_depth.unwrap_or(0),
    );
    LayoutDump::from_layout(&layout)
        .to_json()
        .map_err(|e| e.to_string())
}

/// Lays out a `{nodes, edges}` graph and returns the layout dump as JSON.
#[wasm_bindgen]
pub fn layout_graph_json(graph_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    layout_json(graph_json, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}
