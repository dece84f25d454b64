//! Session controller - the dive state machine and the per-frame tick.
//!
//! The presentation layer owns a [`Session`], forwards discrete actions
//! (`fire_ping`, `collect_nearby`, `advance_or_restart`) and calls
//! [`Session::tick`] once per frame to get a [`Snapshot`] back.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::{ConfigError, GameConfig};
use crate::generation::{generate_cave, populate_level, LevelRoster};
use crate::systems::*;
use crate::view::Snapshot;

/// Seconds the hit flash stays up after contact damage
pub const DAMAGE_FLASH_DURATION: f32 = 0.3;

/// Top-level game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Menu,
    Playing,
    Dead,
    Victory,
}

/// Continuous per-frame input
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Desired direction; any length, normalized by the core
    pub movement: Vec2,
    pub silent: bool,
}

impl TickInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(x: f32, y: f32) -> Self {
        Self {
            movement: Vec2::new(x, y),
            silent: false,
        }
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// One cave and everything in it
pub struct Level {
    pub depth: u32,
    pub grid: Grid,
    /// Creatures and specimens
    pub world: World,
    pub sonar: SonarField,
    pub roster: LevelRoster,
}

impl Level {
    /// Generate and populate the cave for `depth`
    pub fn generate(depth: u32, config: &GameConfig, rng: &mut impl Rng) -> Self {
        let grid = generate_cave(depth, config, rng);
        let mut world = World::new();
        let roster = populate_level(&mut world, &grid, depth, config, rng);
        Self {
            depth,
            grid,
            world,
            sonar: SonarField::new(),
            roster,
        }
    }

    /// Wrap a hand-built grid with an empty world
    pub fn from_grid(depth: u32, grid: Grid) -> Self {
        Self {
            depth,
            grid,
            world: World::new(),
            sonar: SonarField::new(),
            roster: LevelRoster::default(),
        }
    }

    pub fn spawn_creature(&mut self, kind: CreatureKind, at: Vec2) -> Entity {
        match kind {
            CreatureKind::Anglerfish => self.roster.anglerfish += 1,
            CreatureKind::Jellyfish => self.roster.jellyfish += 1,
            CreatureKind::Leviathan => self.roster.leviathans += 1,
        }
        self.world.spawn((Position(at), Creature::new(kind)))
    }

    pub fn spawn_specimen(&mut self, at: Vec2) -> Entity {
        self.roster.specimens += 1;
        self.world.spawn((Position(at), Specimen::default()))
    }

    pub fn creature_count(&self) -> usize {
        self.world.query::<&Creature>().iter().count()
    }

    /// Specimens still waiting in this cave
    pub fn remaining_specimens(&self) -> usize {
        remaining_specimens(&self.world)
    }
}

/// What the end of a tick asks the session to do
enum Outcome {
    Continue,
    Died,
    ReachedExit,
}

/// A single dive from depth 1 to the final depth
pub struct Session {
    config: GameConfig,
    rng: StdRng,
    seed: Option<u64>,
    state: SessionState,
    depth: u32,
    /// Specimens taken on the current level
    specimens_collected: usize,
    /// Specimens taken over the whole dive
    total_specimens: usize,
    vehicle: Vehicle,
    level: Option<Level>,
    damage_flash: f32,
}

impl Session {
    /// New session in the menu, seeded from entropy
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::build(config, StdRng::from_entropy(), None)
    }

    /// New session in the menu with a deterministic rng
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, StdRng::seed_from_u64(seed), Some(seed))
    }

    /// Configs that fail `validate` are refused before any level is built
    fn build(config: GameConfig, rng: StdRng, seed: Option<u64>) -> Result<Self, ConfigError> {
        config.validate()?;
        let vehicle = Vehicle::new(Vec2::ZERO, &config);
        Ok(Self {
            config,
            rng,
            seed,
            state: SessionState::Menu,
            depth: 0,
            specimens_collected: 0,
            total_specimens: 0,
            vehicle,
            level: None,
            damage_flash: 0.0,
        })
    }

    /// Begin a dive at depth 1. Only valid from the menu or after death.
    pub fn start_session(&mut self) -> bool {
        if !matches!(self.state, SessionState::Menu | SessionState::Dead) {
            return false;
        }
        log::info!("Starting dive (seed {:?})", self.seed);

        self.vehicle = Vehicle::new(Vec2::ZERO, &self.config);
        self.total_specimens = 0;
        self.state = SessionState::Playing;
        self.load_level(1);
        true
    }

    /// Start playing on a prepared level with a fresh vehicle
    pub fn begin_with_level(&mut self, level: Level) {
        self.vehicle = Vehicle::new(Vec2::ZERO, &self.config);
        self.total_specimens = 0;
        self.state = SessionState::Playing;
        self.install_level(level);
    }

    /// Confirm action: start from menu or death, leave victory for the menu
    pub fn advance_or_restart(&mut self) -> bool {
        match self.state {
            SessionState::Menu | SessionState::Dead => self.start_session(),
            SessionState::Victory => {
                log::info!("Returning to menu");
                self.state = SessionState::Menu;
                self.level = None;
                true
            }
            SessionState::Playing => false,
        }
    }

    /// Emit a sonar ping from the vehicle. Returns false while cooling
    /// down or outside play.
    pub fn fire_ping(&mut self) -> bool {
        if self.state != SessionState::Playing || self.vehicle.sonar_cooldown > 0.0 {
            return false;
        }
        let Some(level) = self.level.as_mut() else {
            return false;
        };

        let origin = self.vehicle.position;
        level.sonar.fire(origin, &self.config);
        let alerted = alert_creatures_to_ping(&mut level.world, origin);
        self.vehicle.sonar_cooldown = self.config.sonar_cooldown;
        log::debug!(
            "Ping at ({:.0}, {:.0}) alerted {} creatures",
            origin.x,
            origin.y,
            alerted
        );
        true
    }

    /// Pick up the nearest specimen in reach
    pub fn collect_nearby(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        let Some(level) = self.level.as_mut() else {
            return false;
        };
        if collect_nearest(&mut level.world, self.vehicle.position, self.config.collect_radius)
            .is_none()
        {
            return false;
        }

        self.specimens_collected += 1;
        self.total_specimens += 1;
        log::debug!(
            "Collected specimen {}/{} at depth {}",
            self.specimens_collected,
            self.config.specimens_per_level,
            self.depth
        );
        true
    }

    /// Advance the simulation by `dt` seconds (clamped) and read back
    pub fn tick(&mut self, dt: f32, input: TickInput) -> Snapshot {
        if self.state == SessionState::Playing {
            let dt = if dt.is_finite() {
                dt.clamp(0.0, self.config.max_step)
            } else {
                0.0
            };
            match self.step(dt, input) {
                Outcome::Continue => {}
                Outcome::Died => {
                    log::info!(
                        "Vehicle lost at depth {} with {} specimens",
                        self.depth,
                        self.total_specimens
                    );
                    self.state = SessionState::Dead;
                }
                Outcome::ReachedExit => self.reach_exit(),
            }
        }
        self.snapshot()
    }

    fn step(&mut self, dt: f32, input: TickInput) -> Outcome {
        let Some(level) = self.level.as_mut() else {
            return Outcome::Continue;
        };
        let config = &self.config;
        let vehicle = &mut self.vehicle;
        vehicle.silent = input.silent;

        tick_invulnerability(vehicle, dt);
        self.damage_flash = (self.damage_flash - dt).max(0.0);

        steer(vehicle, &level.grid, input.movement, dt, config);
        tick_sonar_cooldown(vehicle, dt);

        level.sonar.advance(&mut level.grid, dt, config);
        apply_glow(
            &mut level.grid,
            vehicle.position,
            vehicle.glow_radius(config),
            config.glow_floor,
        );
        decay(&mut level.grid, dt);

        creature_system(
            &mut level.world,
            &level.grid,
            vehicle.position,
            vehicle.silent,
            dt,
            &mut self.rng,
        );
        if contact_damage_system(&mut level.world, vehicle) > 0.0 {
            self.damage_flash = DAMAGE_FLASH_DURATION;
        }

        update_resources(vehicle, &level.grid, dt, config);

        if vehicle.is_destroyed() {
            Outcome::Died
        } else if at_exit(vehicle, &level.grid, config) {
            Outcome::ReachedExit
        } else {
            Outcome::Continue
        }
    }

    fn reach_exit(&mut self) {
        if self.depth >= self.config.total_depths {
            log::info!(
                "Surfaced from depth {} with {} specimens",
                self.depth,
                self.total_specimens
            );
            self.state = SessionState::Victory;
            return;
        }

        self.vehicle.oxygen =
            (self.vehicle.oxygen + self.config.oxygen_level_bonus).min(self.config.max_oxygen);
        log::info!(
            "Descending to depth {} (hull {:.0}, oxygen {:.0})",
            self.depth + 1,
            self.vehicle.hull,
            self.vehicle.oxygen
        );
        self.load_level(self.depth + 1);
    }

    fn load_level(&mut self, depth: u32) {
        let level = Level::generate(depth, &self.config, &mut self.rng);
        self.install_level(level);
    }

    fn install_level(&mut self, level: Level) {
        self.depth = level.depth;
        self.specimens_collected = 0;
        self.damage_flash = 0.0;
        self.vehicle
            .reset_for_level(level.grid.start_point(), &self.config);
        log::info!(
            "Loaded depth {}: {} creatures, {} specimens",
            level.depth,
            level.roster.creatures(),
            level.roster.specimens
        );
        self.level = Some(level);
    }

    /// Read back the current frame without advancing
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current depth, 0 before the first dive
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn specimens_collected(&self) -> usize {
        self.specimens_collected
    }

    pub fn total_specimens(&self) -> usize {
        self.total_specimens
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn vehicle_mut(&mut self) -> &mut Vehicle {
        &mut self.vehicle
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut Level> {
        self.level.as_mut()
    }

    /// 1.0 right after a hit, fading to 0.0
    pub fn damage_flash(&self) -> f32 {
        (self.damage_flash / DAMAGE_FLASH_DURATION).clamp(0.0, 1.0)
    }
}
