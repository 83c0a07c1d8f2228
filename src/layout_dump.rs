use crate::layout::{EdgePath, Layout};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub cycle_nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub level: i32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<EdgePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|(id, pos)| NodeDump {
                id: id.clone(),
                level: layout.levels.get(id).copied().unwrap_or(0),
                x: pos.x,
                y: pos.y,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                source: edge.source.clone(),
                target: edge.target.clone(),
                d: edge.path.as_ref().map(EdgePath::to_svg_path),
                path: edge.path.clone(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
            cycle_nodes: layout.cycle_nodes.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(&mut writer, &dump)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, ViewportConfig};
    use crate::ir::Graph;
    use crate::layout::compute_layout;
    use serde_json::Value;

    fn sample_layout() -> Layout {
        let mut graph = Graph::new();
        graph.connect("A", "B");
        graph.connect("B", "A");
        graph.edges.push(crate::ir::Edge::new("B", "nowhere"));
        compute_layout(&graph, &LayoutConfig::default(), &ViewportConfig::default(), 0)
    }

    #[test]
    fn dump_uses_camel_case_fields() {
        let dump = LayoutDump::from_layout(&sample_layout());
        let value: Value = serde_json::from_str(&dump.to_json().unwrap()).unwrap();
        assert_eq!(value["cycleNodes"], serde_json::json!(["A", "B"]));
        assert_eq!(value["nodes"][1]["id"], "B");
        assert_eq!(value["nodes"][1]["level"], 1);
        let back = &value["edges"][1]["path"];
        assert_eq!(back["isUpwardEdge"], true);
        assert!(back["controlPoints"].is_array());
        assert!(value["edges"][1]["d"].as_str().unwrap().starts_with("M "));
    }

    #[test]
    fn unrouted_edges_omit_geometry() {
        let dump = LayoutDump::from_layout(&sample_layout());
        let dangling = &dump.edges[2];
        assert_eq!(dangling.target, "nowhere");
        assert!(dangling.path.is_none());
        assert!(dangling.d.is_none());
        let value = serde_json::to_value(dangling).unwrap();
        assert!(value.get("path").is_none());
    }
}
