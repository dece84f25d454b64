//! Player vehicle and collectible components.

use serde::{Deserialize, Serialize};

use super::Vec2;
use crate::config::GameConfig;

/// Marker component for a collectible specimen
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Specimen {
    pub collected: bool,
}

/// The player's submersible (one per session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub position: Vec2,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub hull: f32,
    pub oxygen: f32,
    pub silent: bool,
    pub sonar_cooldown: f32,
    /// Seconds of contact immunity left
    pub invulnerable_for: f32,
}

impl Vehicle {
    /// Full hull and oxygen at `position`
    pub fn new(position: Vec2, config: &GameConfig) -> Self {
        Self {
            position,
            facing: 1.0,
            hull: config.max_hull,
            oxygen: config.max_oxygen,
            silent: false,
            sonar_cooldown: 0.0,
            invulnerable_for: 0.0,
        }
    }

    /// Move to a new level's start, keeping hull and oxygen
    pub fn reset_for_level(&mut self, start: Vec2, config: &GameConfig) {
        self.position = start;
        self.facing = 1.0;
        self.silent = false;
        self.sonar_cooldown = 0.0;
        self.invulnerable_for = config.invulnerability_window;
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    pub fn is_destroyed(&self) -> bool {
        self.hull <= 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.hull = (self.hull - amount).max(0.0);
    }

    /// Proximity glow radius, halved while running silent
    pub fn glow_radius(&self, config: &GameConfig) -> f32 {
        if self.silent {
            config.glow_radius * 0.5
        } else {
            config.glow_radius
        }
    }

    pub fn hull_fraction(&self, config: &GameConfig) -> f32 {
        fraction(self.hull, config.max_hull)
    }

    pub fn oxygen_fraction(&self, config: &GameConfig) -> f32 {
        fraction(self.oxygen, config.max_oxygen)
    }

    /// 1.0 right after a ping, 0.0 when ready
    pub fn cooldown_fraction(&self, config: &GameConfig) -> f32 {
        fraction(self.sonar_cooldown, config.sonar_cooldown)
    }
}

fn fraction(value: f32, max: f32) -> f32 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hull_never_negative() {
        let config = GameConfig::default();
        let mut v = Vehicle::new(Vec2::ZERO, &config);
        v.take_damage(250.0);
        assert_eq!(v.hull, 0.0);
        assert!(v.is_destroyed());
        assert_eq!(v.hull_fraction(&config), 0.0);
    }

    #[test]
    fn test_silent_halves_glow() {
        let config = GameConfig::default();
        let mut v = Vehicle::new(Vec2::ZERO, &config);
        assert_eq!(v.glow_radius(&config), 40.0);
        v.silent = true;
        assert_eq!(v.glow_radius(&config), 20.0);
    }

    #[test]
    fn test_level_reset_keeps_resources() {
        let config = GameConfig::default();
        let mut v = Vehicle::new(Vec2::ZERO, &config);
        v.hull = 42.0;
        v.oxygen = 17.0;
        v.sonar_cooldown = 1.0;
        v.reset_for_level(Vec2::new(5.0, 5.0), &config);
        assert_eq!(v.hull, 42.0);
        assert_eq!(v.oxygen, 17.0);
        assert_eq!(v.sonar_cooldown, 0.0);
        assert!(v.is_invulnerable());
    }
}
