use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Tunables of the level refinement pass.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub refine_iterations: usize,
    /// Largest level span allowed on an edge between two cycle members.
    /// Values below 1 are treated as 1.
    pub cycle_gap_cap: i32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            refine_iterations: 5,
            cycle_gap_cap: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub node_spacing_x: f32,
    pub node_spacing_y: f32,
    pub left_padding: f32,
    /// Width lost per nesting level when sizing a nested canvas.
    pub nesting_shrink: f32,
    pub min_nesting_scale: f32,
    pub ranking: RankingConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 60.0,
            node_spacing_x: 220.0,
            node_spacing_y: 120.0,
            left_padding: 0.0,
            nesting_shrink: 0.05,
            min_nesting_scale: 0.5,
            ranking: RankingConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn geometry(&self) -> Geometry {
        Geometry {
            node_width: self.node_width,
            node_height: self.node_height,
            spacing_x: self.node_spacing_x,
            spacing_y: self.node_spacing_y,
            left_padding: self.left_padding,
        }
    }
}

/// The node box and spacing constants shared by position and edge
/// computations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub node_width: f32,
    pub node_height: f32,
    pub spacing_x: f32,
    pub spacing_y: f32,
    pub left_padding: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ViewportFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    node_spacing_x: Option<f32>,
    node_spacing_y: Option<f32>,
    left_padding: Option<f32>,
    nesting_shrink: Option<f32>,
    min_nesting_scale: Option<f32>,
    refine_iterations: Option<usize>,
    cycle_gap_cap: Option<i32>,
    viewport: Option<ViewportFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config file {}", path.display()))
}

/// Parses a JSON or JSON5 document of camelCase overrides on top of the
/// defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(v) = parsed.node_width {
        config.layout.node_width = v;
    }
    if let Some(v) = parsed.node_height {
        config.layout.node_height = v;
    }
    if let Some(v) = parsed.node_spacing_x {
        config.layout.node_spacing_x = v;
    }
    if let Some(v) = parsed.node_spacing_y {
        config.layout.node_spacing_y = v;
    }
    if let Some(v) = parsed.left_padding {
        config.layout.left_padding = v;
    }
    if let Some(v) = parsed.nesting_shrink {
        config.layout.nesting_shrink = v;
    }
    if let Some(v) = parsed.min_nesting_scale {
        config.layout.min_nesting_scale = v;
    }
    if let Some(v) = parsed.refine_iterations {
        config.layout.ranking.refine_iterations = v;
    }
    if let Some(v) = parsed.cycle_gap_cap {
        config.layout.ranking.cycle_gap_cap = v;
    }
    if let Some(viewport) = parsed.viewport {
        if let Some(v) = viewport.width {
            config.viewport.width = v;
        }
        if let Some(v) = viewport.height {
            config.viewport.height = v;
        }
    }

    Ok(config)
}
