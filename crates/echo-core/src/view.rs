//! Readback - a renderable, serializable picture of one frame

use serde::{Deserialize, Serialize};

use crate::components::{Creature, CreatureKind, Position, Specimen, Vec2};
use crate::session::{Session, SessionState};
use crate::systems::{
    cell_opacity, entity_opacity, exit_opacity, CREATURE_BIOLUMINESCENCE,
    SPECIMEN_BIOLUMINESCENCE,
};

/// Oxygen fraction below which the warning shows
pub const LOW_OXYGEN_FRACTION: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub is_wall: bool,
    pub is_air_pocket: bool,
    pub is_exit: bool,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreatureView {
    pub kind: CreatureKind,
    pub position: Vec2,
    pub opacity: f32,
    pub alerted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecimenView {
    pub position: Vec2,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PingView {
    pub origin: Vec2,
    pub radius: f32,
    pub intensity: f32,
}

/// Everything the presentation layer needs to draw a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub depth: u32,
    pub total_depths: u32,
    pub specimens_collected: usize,
    pub specimens_per_level: usize,
    pub total_specimens: usize,

    pub hull: f32,
    pub oxygen: f32,
    pub sonar_cooldown: f32,
    pub silent: bool,
    pub facing: f32,
    pub damage_flash: f32,
    pub low_oxygen: bool,
    pub vehicle_position: Vec2,

    /// Grid size in cells; `cells` is row-major
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    pub cells: Vec<CellView>,
    pub exit_opacity: f32,

    pub creatures: Vec<CreatureView>,
    /// Uncollected only
    pub specimens: Vec<SpecimenView>,
    pub pings: Vec<PingView>,
}

impl Snapshot {
    pub fn capture(session: &Session) -> Self {
        let config = session.config();
        let vehicle = session.vehicle();
        let oxygen = vehicle.oxygen_fraction(config);

        let mut snapshot = Self {
            state: session.state(),
            depth: session.depth(),
            total_depths: config.total_depths,
            specimens_collected: session.specimens_collected(),
            specimens_per_level: config.specimens_per_level,
            total_specimens: session.total_specimens(),
            hull: vehicle.hull_fraction(config),
            oxygen,
            sonar_cooldown: vehicle.cooldown_fraction(config),
            silent: vehicle.silent,
            facing: vehicle.facing,
            damage_flash: session.damage_flash(),
            low_oxygen: oxygen < LOW_OXYGEN_FRACTION,
            vehicle_position: vehicle.position,
            width: 0,
            height: 0,
            cell_size: config.cell_size,
            cells: Vec::new(),
            exit_opacity: 0.0,
            creatures: Vec::new(),
            specimens: Vec::new(),
            pings: Vec::new(),
        };

        let Some(level) = session.level() else {
            return snapshot;
        };
        let grid = &level.grid;
        let glow = vehicle.glow_radius(config);

        snapshot.width = grid.width();
        snapshot.height = grid.height();
        snapshot.cell_size = grid.cell_size();
        snapshot.cells = grid
            .cells()
            .iter()
            .map(|cell| CellView {
                is_wall: cell.is_wall,
                is_air_pocket: cell.is_air_pocket,
                is_exit: cell.is_exit,
                opacity: cell_opacity(cell, config.reveal_duration),
            })
            .collect();
        snapshot.exit_opacity = exit_opacity(grid, config);

        for (_, (pos, creature)) in level.world.query::<(&Position, &Creature)>().iter() {
            snapshot.creatures.push(CreatureView {
                kind: creature.kind,
                position: pos.0,
                opacity: entity_opacity(
                    grid,
                    pos.0,
                    vehicle.position,
                    glow,
                    CREATURE_BIOLUMINESCENCE,
                    config,
                ),
                alerted: creature.is_alerted(),
            });
        }

        for (_, (pos, specimen)) in level.world.query::<(&Position, &Specimen)>().iter() {
            if specimen.collected {
                continue;
            }
            snapshot.specimens.push(SpecimenView {
                position: pos.0,
                opacity: entity_opacity(
                    grid,
                    pos.0,
                    vehicle.position,
                    glow,
                    SPECIMEN_BIOLUMINESCENCE,
                    config,
                ),
            });
        }

        snapshot.pings = level
            .sonar
            .pings()
            .iter()
            .map(|ping| PingView {
                origin: ping.origin,
                radius: ping.current_radius,
                intensity: ping.intensity(),
            })
            .collect();

        snapshot
    }

    /// Opacity of cell `(x, y)`, 0 outside the grid
    pub fn cell_opacity(&self, x: usize, y: usize) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.cells
            .get(y * self.width + x)
            .map(|c| c.opacity)
            .unwrap_or(0.0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Grid;
    use crate::config::GameConfig;
    use crate::session::{Level, TickInput};

    fn lit_room() -> Level {
        let grid = Grid::from_rows(
            &[
                "##############################",
                "#............................#",
                "#.........E..................#",
                "#............................#",
                "#............................#",
                "#............................#",
                "#............................#",
                "#............S...............#",
                "#............................#",
                "##############################",
            ],
            24.0,
        );
        Level::from_grid(1, grid)
    }

    #[test]
    fn test_menu_snapshot_is_empty() {
        let session = Session::with_seed(GameConfig::default(), 0).unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.state, SessionState::Menu);
        assert_eq!(snap.depth, 0);
        assert!(snap.cells.is_empty());
        assert_eq!(snap.hull, 1.0);
    }

    #[test]
    fn test_ping_lights_cells_and_creatures() {
        let mut session = Session::with_seed(GameConfig::default(), 0).unwrap();
        let mut level = lit_room();
        let start = level.grid.start_point();
        level.spawn_creature(CreatureKind::Jellyfish, start + Vec2::new(240.0, 0.0));
        session.begin_with_level(level);

        let dark = session.snapshot();
        assert_eq!(dark.cell_opacity(23, 7), 0.0);
        assert_eq!(dark.creatures[0].opacity, 0.05);

        assert!(session.fire_ping());
        let snap = session.tick(1.0 / 30.0, TickInput::idle());
        assert_eq!(snap.pings.len(), 2);
        // The first stamp covers the origin cell
        let expected = 1.0 - (1.0 / 30.0) / 3.5;
        assert!((snap.cell_opacity(13, 7) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_exit_marker_follows_nearby_reveal() {
        let mut session = Session::with_seed(GameConfig::default(), 0).unwrap();
        session.begin_with_level(lit_room());
        assert_eq!(session.snapshot().exit_opacity, 0.0);

        let grid = &mut session.level_mut().unwrap().grid;
        grid.cell_mut(12, 3).unwrap().reveal_timer = 1.75;
        assert!((session.snapshot().exit_opacity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_low_oxygen_flag() {
        let mut session = Session::with_seed(GameConfig::default(), 0).unwrap();
        session.begin_with_level(lit_room());
        session.vehicle_mut().oxygen = 20.0;
        let snap = session.snapshot();
        assert!(snap.low_oxygen);
        assert!((snap.oxygen - 20.0 / 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = Session::with_seed(GameConfig::default(), 0).unwrap();
        session.begin_with_level(lit_room());
        let json = session.snapshot().to_json().unwrap();
        assert!(json.contains("\"state\":\"Playing\""));
    }
}
