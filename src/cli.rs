use crate::config::load_config;
use crate::ir::Graph;
use crate::layout::compute_layout;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tracegraph",
    version,
    about = "Lay out trace and workflow graphs as levelled node rows with curved edges"
)]
pub struct Args {
    /// Input graph (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Nesting depth of the graph being laid out; deeper graphs get narrower canvases
    #[arg(short = 'd', long = "nestingDepth", default_value_t = 0)]
    pub nesting_depth: u32,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }

    let input = read_input(args.input.as_deref())?;
    let graph = parse_graph(&input)?;
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "loaded graph"
    );

    let layout = compute_layout(
        &graph,
        &config.layout,
        &config.viewport,
        args.nesting_depth,
    );

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &layout)
            .with_context(|| format!("writing layout to {}", path.display()))?,
        None => {
            let json = LayoutDump::from_layout(&layout).to_json()?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tracegraph=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Parses and validates a graph document. Edges pointing at unknown nodes are
/// kept; they are reported and come out of the layout without a path.
fn parse_graph(input: &str) -> Result<Graph> {
    let graph = Graph::from_json_str(input)?;
    graph.validate()?;
    for idx in graph.dangling_edges() {
        let edge = &graph.edges[idx];
        warn!(
            edge = idx,
            source = %edge.source,
            target = %edge.target,
            "edge references an unknown node"
        );
    }
    Ok(graph)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading graph from {}", path.display()));
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    #[test]
    fn parses_valid_graph_with_dangling_edge() {
        let graph = parse_graph(
            r#"{"nodes": [{"id": "a"}], "edges": [{"source": "a", "target": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn rejects_duplicate_nodes() {
        let err = parse_graph(r#"{"nodes": [{"id": "a"}, {"id": "a"}], "edges": []}"#)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::DuplicateNode(id)) if id == "a"
        ));
    }

    #[test]
    fn args_accept_long_flags() {
        let args = Args::try_parse_from([
            "tracegraph",
            "--input",
            "graph.json",
            "--width",
            "800",
            "--nestingDepth",
            "2",
        ])
        .unwrap();
        assert_eq!(args.input.as_deref(), Some(Path::new("graph.json")));
        assert_eq!(args.width, Some(800.0));
        assert_eq!(args.height, None);
        assert_eq!(args.nesting_depth, 2);
    }

    #[test]
    fn missing_input_file_names_path() {
        let err = read_input(Some(Path::new("/nonexistent/graph.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("graph.json"));
    }
}
