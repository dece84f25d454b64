//! Creature components: kind table, behavior state, per-entity stats.

use serde::{Deserialize, Serialize};

use super::Vec2;

/// Seconds between two contact hits from the same creature
pub const CONTACT_COOLDOWN: f32 = 1.0;
/// Alert length when a creature spots the vehicle on its own
pub const PASSIVE_ALERT_DURATION: f32 = 3.0;
/// A charge ends once the creature is this close to its target
pub const ALERT_ARRIVAL_DISTANCE: f32 = 5.0;
/// Patrol picks a new waypoint inside this distance of the old one
pub const PATROL_ARRIVAL_DISTANCE: f32 = 20.0;

/// The three creature kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureKind {
    /// Small, quick hunter
    Anglerfish,
    /// Slow drifter, deaf to sonar
    Jellyfish,
    /// Apex predator, only at the final depth
    Leviathan,
}

/// Fixed per-kind parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatureParams {
    pub max_hp: f32,
    pub speed: f32,
    pub contact_damage: f32,
    /// Speed multiplier while charging an alert target
    pub charge_multiplier: f32,
    /// `None` for kinds that ignore pings
    pub ping_alert_range: Option<f32>,
    pub ping_alert_duration: f32,
    /// Half-size of the square a patrol waypoint is drawn from
    pub patrol_radius: f32,
    /// `None` for kinds that never notice the vehicle unprompted
    pub detect_range: Option<f32>,
    pub contact_radius: f32,
    pub invulnerable: bool,
}

impl CreatureKind {
    pub fn params(&self) -> CreatureParams {
        match self {
            CreatureKind::Anglerfish => CreatureParams {
                max_hp: 30.0,
                speed: 60.0,
                contact_damage: 10.0,
                charge_multiplier: 1.2,
                ping_alert_range: Some(350.0),
                ping_alert_duration: 4.0,
                patrol_radius: 200.0,
                detect_range: Some(120.0),
                contact_radius: 25.0,
                invulnerable: false,
            },
            CreatureKind::Jellyfish => CreatureParams {
                max_hp: 10.0,
                speed: 30.0,
                contact_damage: 5.0,
                charge_multiplier: 1.2,
                ping_alert_range: None,
                ping_alert_duration: 0.0,
                patrol_radius: 150.0,
                detect_range: None,
                contact_radius: 25.0,
                invulnerable: false,
            },
            CreatureKind::Leviathan => CreatureParams {
                max_hp: 99_999.0,
                speed: 120.0,
                contact_damage: 30.0,
                charge_multiplier: 1.5,
                ping_alert_range: Some(500.0),
                ping_alert_duration: 6.0,
                patrol_radius: 200.0,
                detect_range: Some(120.0),
                contact_radius: 40.0,
                invulnerable: true,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CreatureKind::Anglerfish => "anglerfish",
            CreatureKind::Jellyfish => "jellyfish",
            CreatureKind::Leviathan => "leviathan",
        }
    }
}

/// High-level behavior state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Behavior {
    #[default]
    Patrolling,
    /// Charging toward `Creature::ping_target`
    Alerted,
}

/// Creature component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub kind: CreatureKind,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub contact_damage: f32,
    pub patrol_target: Option<Vec2>,
    pub behavior: Behavior,
    pub alert_timer: f32,
    pub ping_target: Vec2,
    pub contact_cooldown: f32,
}

impl Creature {
    pub fn new(kind: CreatureKind) -> Self {
        let params = kind.params();
        Self {
            kind,
            hp: params.max_hp,
            max_hp: params.max_hp,
            speed: params.speed,
            contact_damage: params.contact_damage,
            patrol_target: None,
            behavior: Behavior::Patrolling,
            alert_timer: 0.0,
            ping_target: Vec2::ZERO,
            contact_cooldown: 0.0,
        }
    }

    pub fn params(&self) -> CreatureParams {
        self.kind.params()
    }

    pub fn is_alerted(&self) -> bool {
        self.behavior == Behavior::Alerted
    }

    /// Switch to charging `target` for `duration` seconds
    pub fn alert_toward(&mut self, target: Vec2, duration: f32) {
        self.behavior = Behavior::Alerted;
        self.ping_target = target;
        self.alert_timer = duration;
    }

    /// Drop back to patrol
    pub fn calm(&mut self) {
        self.behavior = Behavior::Patrolling;
        self.alert_timer = 0.0;
    }

    /// React to a ping at `origin` seen from `position`. Returns true if alerted.
    pub fn hear_ping(&mut self, position: Vec2, origin: Vec2) -> bool {
        let params = self.params();
        match params.ping_alert_range {
            Some(range) if position.distance(&origin) < range => {
                self.alert_toward(origin, params.ping_alert_duration);
                true
            }
            _ => false,
        }
    }

    /// Apply damage; the apex kind shrugs it off. Nothing in the core calls
    /// this yet because the vehicle has no weapon.
    pub fn take_damage(&mut self, amount: f32) {
        if self.params().invulnerable {
            return;
        }
        self.hp = (self.hp - amount).max(0.0);
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creature_uses_kind_table() {
        let c = Creature::new(CreatureKind::Anglerfish);
        assert_eq!(c.hp, 30.0);
        assert_eq!(c.speed, 60.0);
        assert_eq!(c.contact_damage, 10.0);
        assert_eq!(c.behavior, Behavior::Patrolling);
    }

    #[test]
    fn test_jellyfish_ignore_pings() {
        let mut c = Creature::new(CreatureKind::Jellyfish);
        assert!(!c.hear_ping(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)));
        assert!(!c.is_alerted());
    }

    #[test]
    fn test_ping_range_per_kind() {
        let origin = Vec2::ZERO;
        let at = Vec2::new(400.0, 0.0);

        let mut angler = Creature::new(CreatureKind::Anglerfish);
        assert!(!angler.hear_ping(at, origin));

        let mut leviathan = Creature::new(CreatureKind::Leviathan);
        assert!(leviathan.hear_ping(at, origin));
        assert_eq!(leviathan.alert_timer, 6.0);
        assert_eq!(leviathan.ping_target, origin);
    }

    #[test]
    fn test_leviathan_is_invulnerable() {
        let mut c = Creature::new(CreatureKind::Leviathan);
        c.take_damage(1_000_000.0);
        assert_eq!(c.hp, c.max_hp);

        let mut j = Creature::new(CreatureKind::Jellyfish);
        j.take_damage(4.0);
        assert_eq!(j.hp, 6.0);
        j.take_damage(40.0);
        assert!(j.is_dead());
    }
}
