#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, Geometry, LayoutConfig, RankingConfig, ViewportConfig, load_config};
pub use error::GraphError;
pub use ir::{Edge, Graph, Node};
pub use layout::{
    CanvasSize, EdgePath, Layout, Point, Position, PositionMap, compute_canvas_size,
    compute_edge_path, compute_layout, compute_positions,
};
pub use layout_dump::LayoutDump;
