use crate::theme::LinkTheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CLEARANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneInsets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for LaneInsets {
    fn default() -> Self {
        Self {
            left: 5.0,
            top: 1.0,
            right: 3.0,
            bottom: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Offset from an obstacle's top edge to the centre of slot 0.
    pub slot_origin: f32,
    pub slot_height: f32,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            slot_origin: 14.0,
            slot_height: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub lane_insets: LaneInsets,
    pub line_width: f32,
    /// Explicit lane reservation step. Derived from `line_width` when unset.
    pub lane_step: Option<f32>,
    pub hug_clearance: f32,
    pub max_obstructions: u8,
    pub max_direct_distance: Option<f32>,
    /// Spatial index cell size; `0` scans every obstacle per segment.
    pub grid_cell: f32,
    pub reserve_anchor_lanes: bool,
    pub anchors: AnchorConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            lane_insets: LaneInsets::default(),
            line_width: 2.0,
            lane_step: None,
            hug_clearance: DEFAULT_CLEARANCE,
            max_obstructions: 3,
            max_direct_distance: None,
            grid_cell: 100.0,
            reserve_anchor_lanes: true,
            anchors: AnchorConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Spacing between neighbouring wires ("line space").
    pub fn lane_step(&self) -> f32 {
        match self.lane_step {
            Some(step) if step.is_finite() && step > 0.0 => step,
            _ => (3.0 + self.line_width.max(0.0)).floor().max(1.0),
        }
    }

    /// Gap kept between a lane and any waypoint placed beside it. Must stay
    /// positive so routed endpoints never land on their own lane's edge.
    pub(crate) fn clearance(&self) -> f32 {
        if self.hug_clearance.is_finite() && self.hug_clearance > 0.0 {
            self.hug_clearance
        } else {
            DEFAULT_CLEARANCE
        }
    }

    pub(crate) fn obstruction_limit(&self) -> u8 {
        self.max_obstructions.max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let insets = [
            ("laneInsets.left", self.lane_insets.left),
            ("laneInsets.top", self.lane_insets.top),
            ("laneInsets.right", self.lane_insets.right),
            ("laneInsets.bottom", self.lane_insets.bottom),
            ("gridCell", self.grid_cell),
        ];
        for (field, value) in insets {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if !self.hug_clearance.is_finite() || self.hug_clearance <= 0.0 {
            return Err(ConfigError::Clearance(self.hug_clearance));
        }
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(ConfigError::LineWidth(self.line_width));
        }
        if let Some(step) = self.lane_step
            && (!step.is_finite() || step <= 0.0)
        {
            return Err(ConfigError::LaneStep(step));
        }
        if let Some(limit) = self.max_direct_distance
            && (limit.is_nan() || limit <= 0.0)
        {
            return Err(ConfigError::DirectDistance(limit));
        }
        if self.max_obstructions == 0 {
            return Err(ConfigError::ObstructionBound);
        }
        if !self.anchors.slot_origin.is_finite() || !self.anchors.slot_height.is_finite() {
            return Err(ConfigError::NonFinite { field: "anchors" });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("hugClearance must be positive (got {0})")]
    Clearance(f32),
    #[error("lineWidth must be positive (got {0})")]
    LineWidth(f32),
    #[error("laneStep must be positive (got {0})")]
    LaneStep(f32),
    #[error("maxDirectDistance must be positive (got {0})")]
    DirectDistance(f32),
    #[error("maxObstructions must be at least 1")]
    ObstructionBound,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub router: RouterConfig,
    pub theme: LinkTheme,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaneInsetsFile {
    left: Option<f32>,
    top: Option<f32>,
    right: Option<f32>,
    bottom: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouterConfigFile {
    lane_insets: Option<LaneInsetsFile>,
    line_width: Option<f32>,
    lane_step: Option<f32>,
    hug_clearance: Option<f32>,
    max_obstructions: Option<u8>,
    max_direct_distance: Option<f32>,
    grid_cell: Option<f32>,
    reserve_anchor_lanes: Option<bool>,
    slot_origin: Option<f32>,
    slot_height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeFile {
    default_color: Option<String>,
    fallback_color: Option<String>,
    type_colors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    router: Option<RouterConfigFile>,
    theme: Option<ThemeFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse a config document. Strict JSON is tried first, then JSON5 so
/// hand-edited files may carry comments and trailing commas.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid router config: {json_err}"))?,
    };

    let mut config = Config::default();

    if let Some(router) = parsed.router {
        if let Some(insets) = router.lane_insets {
            if let Some(v) = insets.left {
                config.router.lane_insets.left = v;
            }
            if let Some(v) = insets.top {
                config.router.lane_insets.top = v;
            }
            if let Some(v) = insets.right {
                config.router.lane_insets.right = v;
            }
            if let Some(v) = insets.bottom {
                config.router.lane_insets.bottom = v;
            }
        }
        if let Some(v) = router.line_width {
            config.router.line_width = v;
        }
        if let Some(v) = router.lane_step {
            config.router.lane_step = Some(v);
        }
        if let Some(v) = router.hug_clearance {
            config.router.hug_clearance = v;
        }
        if let Some(v) = router.max_obstructions {
            config.router.max_obstructions = v;
        }
        if let Some(v) = router.max_direct_distance {
            config.router.max_direct_distance = Some(v);
        }
        if let Some(v) = router.grid_cell {
            config.router.grid_cell = v;
        }
        if let Some(v) = router.reserve_anchor_lanes {
            config.router.reserve_anchor_lanes = v;
        }
        if let Some(v) = router.slot_origin {
            config.router.anchors.slot_origin = v;
        }
        if let Some(v) = router.slot_height {
            config.router.anchors.slot_height = v;
        }
    }

    if let Some(theme) = parsed.theme {
        if let Some(v) = theme.default_color {
            config.theme.default_color = Some(v);
        }
        if let Some(v) = theme.fallback_color {
            config.theme.fallback_color = v;
        }
        if let Some(colors) = theme.type_colors {
            config.theme.type_colors.extend(colors);
        }
    }

    config.router.validate()?;
    Ok(config)
}
