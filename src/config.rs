use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    /// Vertical gap between members of a stacked team.
    pub stack_gap: f32,
    /// Managers with more visible reports than this get their team stacked.
    pub large_team_threshold: usize,
    pub node_spacing: f32,
    pub layer_spacing: f32,
    /// Upper bound for one solver call; 0 disables the bound.
    pub solver_timeout_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 300.0,
            node_height: 100.0,
            stack_gap: 20.0,
            large_team_threshold: 5,
            node_spacing: 80.0,
            layer_spacing: 100.0,
            solver_timeout_ms: 5_000,
        }
    }
}

impl LayoutConfig {
    /// Distance between the tops of two consecutive stack members.
    pub fn stack_step(&self) -> f32 {
        self.node_height + self.stack_gap
    }

    pub fn stack_height(&self, members: usize) -> f32 {
        if members == 0 {
            return 0.0;
        }
        members as f32 * self.stack_step() - self.stack_gap
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Collapse every manager the first time a non-empty org is loaded.
    pub collapse_on_load: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            collapse_on_load: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    stack_gap: Option<f32>,
    large_team_threshold: Option<usize>,
    node_spacing: Option<f32>,
    layer_spacing: Option<f32>,
    solver_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SessionConfigFile {
    collapse_on_load: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    session: Option<SessionConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON5 config document and overlays it onto the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.node_width {
            target.node_width = finite("nodeWidth", v)?.max(1.0);
        }
        if let Some(v) = layout.node_height {
            target.node_height = finite("nodeHeight", v)?.max(1.0);
        }
        if let Some(v) = layout.stack_gap {
            target.stack_gap = finite("stackGap", v)?.max(0.0);
        }
        if let Some(v) = layout.large_team_threshold {
            target.large_team_threshold = v;
        }
        if let Some(v) = layout.node_spacing {
            target.node_spacing = finite("nodeSpacing", v)?.max(0.0);
        }
        if let Some(v) = layout.layer_spacing {
            target.layer_spacing = finite("layerSpacing", v)?.max(0.0);
        }
        if let Some(v) = layout.solver_timeout_ms {
            target.solver_timeout_ms = v;
        }
    }

    if let Some(session) = parsed.session {
        if let Some(v) = session.collapse_on_load {
            config.session.collapse_on_load = v;
        }
    }

    Ok(config)
}

fn finite(key: &str, value: f32) -> anyhow::Result<f32> {
    if !value.is_finite() {
        anyhow::bail!("layout.{key} must be a finite number, got {value}");
    }
    Ok(value)
}
