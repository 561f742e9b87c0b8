//! Configuration loading for sarathi-nav.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SarathiError};

/// Planner configuration.
///
/// Every field has a default matching the tuning the planner ships with,
/// so a partial TOML file (or none at all) is valid.
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerConfig {
    /// Maximum linear velocity in m/s (default: 0.3)
    #[serde(default = "default_max_vel")]
    pub max_vel: f32,

    /// Maximum angular velocity in rad/s (default: 0.6)
    #[serde(default = "default_max_ang_vel")]
    pub max_ang_vel: f32,

    /// Planning frequency in Hz; the per-cycle search time budget is its
    /// inverse (default: 0.5)
    #[serde(default = "default_freq")]
    pub freq: f32,

    /// Search radius in meters for a single expansion step (default: 0.4)
    #[serde(default = "default_search_range")]
    pub search_range: f32,

    /// Penalty weight for decelerating through tight curves (default: 50)
    #[serde(default = "default_weight_decel")]
    pub weight_decel: f32,

    /// Penalty weight for backward motion (default: 100)
    #[serde(default = "default_weight_backward")]
    pub weight_backward: f32,

    /// Weight of the heading axis in edge costs (default: 0.3)
    #[serde(default = "default_weight_ang_vel")]
    pub weight_ang_vel: f32,

    /// Fixed cost of turning in place (default: 50)
    #[serde(default = "default_cost_in_place_turn")]
    pub cost_in_place_turn: f32,

    /// Cost assigned to cells the map source reports as unknown
    /// (default: 100, i.e. lethal)
    #[serde(default = "default_unknown_cost")]
    pub unknown_cost: u8,

    /// Open-set size ceiling; 0 means unlimited (default: 0)
    #[serde(default = "default_queue_size_limit")]
    pub queue_size_limit: usize,
}

fn default_max_vel() -> f32 {
    0.3
}
fn default_max_ang_vel() -> f32 {
    0.6
}
fn default_freq() -> f32 {
    0.5
}
fn default_search_range() -> f32 {
    0.4
}
fn default_weight_decel() -> f32 {
    50.0
}
fn default_weight_backward() -> f32 {
    100.0
}
fn default_weight_ang_vel() -> f32 {
    0.3
}
fn default_cost_in_place_turn() -> f32 {
    50.0
}
fn default_unknown_cost() -> u8 {
    100
}
fn default_queue_size_limit() -> usize {
    0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_vel: default_max_vel(),
            max_ang_vel: default_max_ang_vel(),
            freq: default_freq(),
            search_range: default_search_range(),
            weight_decel: default_weight_decel(),
            weight_backward: default_weight_backward(),
            weight_ang_vel: default_weight_ang_vel(),
            cost_in_place_turn: default_cost_in_place_turn(),
            unknown_cost: default_unknown_cost(),
            queue_size_limit: default_queue_size_limit(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SarathiError::Config(format!("failed to read config file: {}", e)))?;
        let config: PlannerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the planner cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_vel <= 0.0 || self.max_ang_vel <= 0.0 {
            return Err(SarathiError::Config(
                "max_vel and max_ang_vel must be positive".into(),
            ));
        }
        if self.freq <= 0.0 {
            return Err(SarathiError::Config("freq must be positive".into()));
        }
        if self.search_range <= 0.0 {
            return Err(SarathiError::Config("search_range must be positive".into()));
        }
        Ok(())
    }

    /// Planning period, also used as the per-cycle search time budget.
    #[inline]
    pub fn period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.freq)
    }
}
