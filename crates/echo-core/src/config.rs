//! Game configuration - every tunable constant of the core in one struct.
//!
//! Defaults reproduce the shipped game. Configs can be loaded from JSON;
//! missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};
use std::io::Read;

/// Cave generator knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Wall probability at depth 0
    pub base_fill: f64,
    /// Added wall probability per depth level
    pub fill_per_depth: f64,
    pub smoothing_passes: u32,
    /// Wall if at least this many of the 9 cells in the 3×3 window are wall
    pub wall_threshold: u32,
    /// Block half-size cleared before smoothing
    pub start_clear_radius: usize,
    /// Block half-size re-cleared after smoothing
    pub start_keep_radius: usize,
    pub air_pockets_min: usize,
    pub air_pockets_max: usize,
    /// Rejection-sampling budget for air pockets and the exit
    pub feature_attempts: usize,
    /// Inclusive row band the exit is drawn from
    pub exit_rows: (usize, usize),
    /// Columns kept clear of the exit at each side
    pub exit_margin: usize,
    /// Columns/rows kept clear of air pockets at each edge
    pub pocket_margin: usize,
    /// Exit cell used when sampling fails
    pub exit_fallback_row: usize,
    pub tunnel_max_steps: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_fill: 0.44,
            fill_per_depth: 0.02,
            smoothing_passes: 5,
            wall_threshold: 5,
            start_clear_radius: 3,
            start_keep_radius: 2,
            air_pockets_min: 3,
            air_pockets_max: 5,
            feature_attempts: 500,
            exit_rows: (3, 8),
            exit_margin: 10,
            pocket_margin: 5,
            exit_fallback_row: 5,
            tunnel_max_steps: 200,
        }
    }
}

impl GenerationConfig {
    /// Wall probability for the random fill at `depth`
    pub fn fill_probability(&self, depth: u32) -> f64 {
        (self.base_fill + self.fill_per_depth * depth as f64).clamp(0.0, 1.0)
    }
}

/// Configuration for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    /// World units per grid cell
    pub cell_size: f32,

    pub vehicle_speed: f32,
    pub vehicle_silent_speed: f32,
    pub glow_radius: f32,
    /// Reveal timer the proximity glow keeps cells at
    pub glow_floor: f32,

    pub sonar_speed: f32,
    pub sonar_max_radius: f32,
    /// Seconds between pings
    pub sonar_cooldown: f32,
    /// Seconds a ping keeps a cell lit
    pub reveal_duration: f32,

    pub max_hull: f32,
    pub max_oxygen: f32,
    /// Oxygen lost per second
    pub oxygen_drain_rate: f32,
    /// Oxygen gained per second inside an air pocket
    pub oxygen_regen_rate: f32,
    /// Oxygen granted on reaching the next depth
    pub oxygen_level_bonus: f32,

    pub collect_radius: f32,
    pub exit_radius: f32,
    /// Contact immunity after each level load, seconds
    pub invulnerability_window: f32,

    pub specimens_per_level: usize,
    pub total_depths: u32,

    /// Largest dt a single tick integrates
    pub max_step: f32,

    pub agent_min_start_distance: f32,
    pub specimen_min_start_distance: f32,
    pub placement_attempts: usize,

    pub generation: GenerationConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 120,
            grid_height: 80,
            cell_size: 24.0,
            vehicle_speed: 150.0,
            vehicle_silent_speed: 75.0,
            glow_radius: 40.0,
            glow_floor: 0.8,
            sonar_speed: 400.0,
            sonar_max_radius: 350.0,
            sonar_cooldown: 1.5,
            reveal_duration: 3.5,
            max_hull: 100.0,
            max_oxygen: 120.0,
            oxygen_drain_rate: 1.0,
            oxygen_regen_rate: 10.0,
            oxygen_level_bonus: 30.0,
            collect_radius: 50.0,
            exit_radius: 30.0,
            invulnerability_window: 2.0,
            specimens_per_level: 5,
            total_depths: 3,
            max_step: 1.0 / 30.0,
            agent_min_start_distance: 300.0,
            specimen_min_start_distance: 200.0,
            placement_attempts: 1000,
            generation: GenerationConfig::default(),
        }
    }
}

/// Smallest grid the generator's fixed bands fit in
pub const MIN_GRID_WIDTH: usize = 24;
pub const MIN_GRID_HEIGHT: usize = 16;

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON config from a reader
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configs the core cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width < MIN_GRID_WIDTH {
            return Err(ConfigError::invalid(
                "grid_width",
                format!("must be at least {}", MIN_GRID_WIDTH),
            ));
        }
        if self.grid_height < MIN_GRID_HEIGHT {
            return Err(ConfigError::invalid(
                "grid_height",
                format!("must be at least {}", MIN_GRID_HEIGHT),
            ));
        }

        let positive = [
            ("cell_size", self.cell_size),
            ("vehicle_speed", self.vehicle_speed),
            ("vehicle_silent_speed", self.vehicle_silent_speed),
            ("glow_radius", self.glow_radius),
            ("sonar_speed", self.sonar_speed),
            ("sonar_max_radius", self.sonar_max_radius),
            ("reveal_duration", self.reveal_duration),
            ("max_hull", self.max_hull),
            ("max_oxygen", self.max_oxygen),
            ("max_step", self.max_step),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, "must be a positive number"));
            }
        }

        if self.total_depths == 0 {
            return Err(ConfigError::invalid("total_depths", "must be at least 1"));
        }

        let gen = &self.generation;
        if gen.air_pockets_min > gen.air_pockets_max {
            return Err(ConfigError::invalid(
                "generation.air_pockets_min",
                "must not exceed air_pockets_max",
            ));
        }
        let (top, bottom) = gen.exit_rows;
        if top == 0 || top > bottom || bottom + 1 >= self.grid_height {
            return Err(ConfigError::invalid(
                "generation.exit_rows",
                "must be an interior row band with top <= bottom",
            ));
        }
        if gen.exit_margin == 0 || gen.exit_margin * 2 >= self.grid_width {
            return Err(ConfigError::invalid(
                "generation.exit_margin",
                "must leave at least one interior column",
            ));
        }
        if gen.pocket_margin == 0
            || gen.pocket_margin * 2 >= self.grid_width
            || self.grid_height / 2 >= self.grid_height - gen.pocket_margin
        {
            return Err(ConfigError::invalid(
                "generation.pocket_margin",
                "must leave room for air pockets in the lower half",
            ));
        }
        if gen.exit_fallback_row == 0 || gen.exit_fallback_row + 1 >= self.grid_height {
            return Err(ConfigError::invalid(
                "generation.exit_fallback_row",
                "must be an interior row",
            ));
        }

        Ok(())
    }
}

/// Errors from loading or validating a config
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid config field `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_fill_probability_scales_with_depth() {
        let gen = GenerationConfig::default();
        assert!((gen.fill_probability(1) - 0.46).abs() < 1e-9);
        assert!((gen.fill_probability(3) - 0.50).abs() < 1e-9);
        assert!(gen.fill_probability(1000) <= 1.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json_str(r#"{ "total_depths": 5 }"#).unwrap();
        assert_eq!(config.total_depths, 5);
        assert_eq!(config.grid_width, 120);
        assert_eq!(config.generation.smoothing_passes, 5);
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig {
            sonar_cooldown: 2.0,
            ..Default::default()
        };
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GameConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_tiny_grid() {
        let err = GameConfig::from_json_str(r#"{ "grid_width": 10 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "grid_width", .. }));
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_rejects_inverted_pocket_range() {
        let mut config = GameConfig::default();
        config.generation.air_pockets_min = 6;
        assert!(config.validate().is_err());
    }
}
