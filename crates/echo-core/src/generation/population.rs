//! Level population - spawns creatures and specimens into a generated cave

use hecs::World;
use rand::Rng;

use crate::components::{Creature, CreatureKind, Grid, Position, Specimen, Vec2};
use crate::config::GameConfig;

/// Spawns stay this many cells away from the grid edge
const SPAWN_MARGIN: usize = 5;

/// What `populate_level` actually managed to place
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelRoster {
    pub anglerfish: usize,
    pub jellyfish: usize,
    pub leviathans: usize,
    pub specimens: usize,
}

impl LevelRoster {
    pub fn creatures(&self) -> usize {
        self.anglerfish + self.jellyfish + self.leviathans
    }
}

/// Creature counts for a depth: more hunters deeper down, and the apex
/// predator only at the final depth.
pub fn creature_counts(depth: u32, total_depths: u32) -> [(CreatureKind, usize); 3] {
    let depth = depth as usize;
    let leviathans = if depth as u32 == total_depths { 1 } else { 0 };
    [
        (CreatureKind::Anglerfish, 3 + depth),
        (CreatureKind::Jellyfish, 2 + depth),
        (CreatureKind::Leviathan, leviathans),
    ]
}

/// Spawn the full roster for `depth`
pub fn populate_level(
    world: &mut World,
    grid: &Grid,
    depth: u32,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> LevelRoster {
    let mut roster = LevelRoster::default();
    for (kind, count) in creature_counts(depth, config.total_depths) {
        let placed = place_agents(world, grid, kind, count, config, rng);
        match kind {
            CreatureKind::Anglerfish => roster.anglerfish = placed,
            CreatureKind::Jellyfish => roster.jellyfish = placed,
            CreatureKind::Leviathan => roster.leviathans = placed,
        }
    }
    roster.specimens = place_specimens(world, grid, config.specimens_per_level, config, rng);
    roster
}

/// Spawn up to `count` creatures of `kind` on open cells far from the start
pub fn place_agents(
    world: &mut World,
    grid: &Grid,
    kind: CreatureKind,
    count: usize,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> usize {
    let points = sample_spawn_points(
        grid,
        count,
        config.agent_min_start_distance,
        config.placement_attempts,
        rng,
    );
    if points.len() < count {
        log::debug!(
            "Placed {} of {} {} after {} attempts",
            points.len(),
            count,
            kind.name(),
            config.placement_attempts
        );
    }
    for &point in &points {
        world.spawn((Position(point), Creature::new(kind)));
    }
    points.len()
}

/// Spawn up to `count` specimens on open cells away from the start
pub fn place_specimens(
    world: &mut World,
    grid: &Grid,
    count: usize,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> usize {
    let points = sample_spawn_points(
        grid,
        count,
        config.specimen_min_start_distance,
        config.placement_attempts,
        rng,
    );
    if points.len() < count {
        log::debug!(
            "Placed {} of {} specimens after {} attempts",
            points.len(),
            count,
            config.placement_attempts
        );
    }
    for &point in &points {
        world.spawn((Position(point), Specimen::default()));
    }
    points.len()
}

/// Rejection-sample open cell centers farther than `min_distance` from the
/// start point
fn sample_spawn_points(
    grid: &Grid,
    count: usize,
    min_distance: f32,
    max_attempts: usize,
    rng: &mut impl Rng,
) -> Vec<Vec2> {
    let (w, h) = (grid.width(), grid.height());
    if w <= SPAWN_MARGIN * 2 || h <= SPAWN_MARGIN * 2 {
        return Vec::new();
    }
    let start = grid.start_point();

    let mut points = Vec::with_capacity(count);
    let mut attempts = 0;
    while points.len() < count && attempts < max_attempts {
        let cx = rng.gen_range(SPAWN_MARGIN..w - SPAWN_MARGIN);
        let cy = rng.gen_range(SPAWN_MARGIN..h - SPAWN_MARGIN);
        attempts += 1;

        if grid.cell(cx, cy).map(|c| c.is_wall).unwrap_or(true) {
            continue;
        }
        let point = grid.cell_center(cx, cy);
        if point.distance(&start) > min_distance {
            points.push(point);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::generate_cave;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_creature_counts_by_depth() {
        assert_eq!(
            creature_counts(1, 3),
            [
                (CreatureKind::Anglerfish, 4),
                (CreatureKind::Jellyfish, 3),
                (CreatureKind::Leviathan, 0),
            ]
        );
        assert_eq!(creature_counts(3, 3)[2], (CreatureKind::Leviathan, 1));
    }

    #[test]
    fn test_spawns_respect_start_distance() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let grid = generate_cave(2, &config, &mut rng);
        let mut world = World::new();
        populate_level(&mut world, &grid, 2, &config, &mut rng);

        let start = grid.start_point();
        for (_, (pos, _)) in world.query::<(&Position, &Creature)>().iter() {
            assert!(pos.0.distance(&start) > config.agent_min_start_distance);
            assert!(!grid.is_wall_at(pos.0));
        }
        for (_, (pos, _)) in world.query::<(&Position, &Specimen)>().iter() {
            assert!(pos.0.distance(&start) > config.specimen_min_start_distance);
            assert!(!grid.is_wall_at(pos.0));
        }
    }

    #[test]
    fn test_full_roster_on_default_cave() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let grid = generate_cave(3, &config, &mut rng);
        let mut world = World::new();
        let roster = populate_level(&mut world, &grid, 3, &config, &mut rng);
        assert_eq!(roster.anglerfish, 6);
        assert_eq!(roster.jellyfish, 5);
        assert_eq!(roster.leviathans, 1);
        assert_eq!(roster.specimens, 5);
        assert_eq!(world.len() as usize, roster.creatures() + roster.specimens);
    }

    #[test]
    fn test_shortfall_on_solid_grid() {
        let config = GameConfig::default();
        let mut grid = Grid::new(40, 30, 24.0);
        for cell in grid.cells_mut() {
            cell.is_wall = true;
        }
        let mut world = World::new();
        let placed = place_specimens(
            &mut world,
            &grid,
            5,
            &config,
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(placed, 0);
        assert_eq!(world.len(), 0);
    }
}
