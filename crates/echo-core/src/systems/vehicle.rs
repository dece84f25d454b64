//! Vehicle system - steering with wall sliding, timers, oxygen

use crate::components::{Grid, Vec2, Vehicle};
use crate::config::GameConfig;

/// Move the vehicle along `intent` for `dt` seconds.
///
/// The intent is normalized, so diagonal input is no faster. A blocked move
/// tries an x-only slide, then a y-only slide. Returns whether it moved.
pub fn steer(
    vehicle: &mut Vehicle,
    grid: &Grid,
    intent: Vec2,
    dt: f32,
    config: &GameConfig,
) -> bool {
    let dir = intent.normalize();
    if dir.is_zero() {
        return false;
    }
    if dir.x != 0.0 {
        vehicle.facing = dir.x.signum();
    }

    let speed = if vehicle.silent {
        config.vehicle_silent_speed
    } else {
        config.vehicle_speed
    };
    let step = dir * (speed * dt);
    let from = vehicle.position;

    let candidates = [
        from + step,
        Vec2::new(from.x + step.x, from.y),
        Vec2::new(from.x, from.y + step.y),
    ];
    for next in candidates {
        if next != from && !grid.is_wall_at(next) {
            vehicle.position = next;
            return true;
        }
    }
    false
}

/// Count down the contact immunity window
pub fn tick_invulnerability(vehicle: &mut Vehicle, dt: f32) {
    if vehicle.invulnerable_for > 0.0 {
        vehicle.invulnerable_for = (vehicle.invulnerable_for - dt).max(0.0);
    }
}

/// Count down the sonar cooldown
pub fn tick_sonar_cooldown(vehicle: &mut Vehicle, dt: f32) {
    if vehicle.sonar_cooldown > 0.0 {
        vehicle.sonar_cooldown = (vehicle.sonar_cooldown - dt).max(0.0);
    }
}

/// Drain oxygen; an empty tank floods the hull
pub fn drain_oxygen(vehicle: &mut Vehicle, dt: f32, config: &GameConfig) {
    vehicle.oxygen = (vehicle.oxygen - config.oxygen_drain_rate * dt).max(0.0);
    if vehicle.oxygen <= 0.0 {
        vehicle.hull = 0.0;
    }
}

/// Refill oxygen while the vehicle sits in an air pocket.
/// Returns true if it did.
pub fn regenerate_oxygen(
    vehicle: &mut Vehicle,
    grid: &Grid,
    dt: f32,
    config: &GameConfig,
) -> bool {
    if !grid.is_air_pocket_at(vehicle.position) {
        return false;
    }
    vehicle.oxygen = (vehicle.oxygen + config.oxygen_regen_rate * dt).min(config.max_oxygen);
    true
}

/// Drain then regenerate, in that order
pub fn update_resources(vehicle: &mut Vehicle, grid: &Grid, dt: f32, config: &GameConfig) {
    drain_oxygen(vehicle, dt, config);
    regenerate_oxygen(vehicle, grid, dt, config);
}

/// Within `exit_radius` of the exit cell center
pub fn at_exit(vehicle: &Vehicle, grid: &Grid, config: &GameConfig) -> bool {
    grid.exit_point()
        .map(|exit| vehicle.position.distance(&exit) < config.exit_radius)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        Grid::from_rows(
            &[
                "##########",
                "#........#",
                "#..###...#",
                "#........#",
                "#AAA....E#",
                "##########",
            ],
            10.0,
        )
    }

    #[test]
    fn test_diagonal_not_faster() {
        let config = GameConfig::default();
        let grid = Grid::new(100, 100, 10.0);
        let start = grid.cell_center(50, 50);
        let mut v = Vehicle::new(start, &config);
        assert!(steer(&mut v, &grid, Vec2::new(1.0, 1.0), 0.1, &config));
        assert!((v.position.distance(&start) - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_facing_follows_horizontal_input() {
        let config = GameConfig::default();
        let grid = Grid::new(100, 100, 10.0);
        let mut v = Vehicle::new(grid.cell_center(50, 50), &config);
        steer(&mut v, &grid, Vec2::new(-1.0, 0.0), 0.01, &config);
        assert_eq!(v.facing, -1.0);
        steer(&mut v, &grid, Vec2::new(0.0, 1.0), 0.01, &config);
        assert_eq!(v.facing, -1.0);
    }

    #[test]
    fn test_slides_along_wall() {
        let config = GameConfig::default();
        let grid = corridor();
        // Just below the wall run at row 2, moving up-right
        let start = Vec2::new(45.0, 31.0);
        let mut v = Vehicle::new(start, &config);
        assert!(steer(&mut v, &grid, Vec2::new(1.0, -1.0), 0.05, &config));
        assert!(v.position.x > start.x);
        assert_eq!(v.position.y, start.y);
    }

    #[test]
    fn test_fully_blocked_stays_put() {
        let config = GameConfig::default();
        let grid = corridor();
        let start = Vec2::new(15.0, 15.0);
        let mut v = Vehicle::new(start, &config);
        assert!(!steer(&mut v, &grid, Vec2::new(-1.0, -1.0), 0.1, &config));
        assert_eq!(v.position, start);
    }

    #[test]
    fn test_silent_speed() {
        let config = GameConfig::default();
        let grid = Grid::new(100, 100, 10.0);
        let start = grid.cell_center(50, 50);
        let mut v = Vehicle::new(start, &config);
        v.silent = true;
        steer(&mut v, &grid, Vec2::new(1.0, 0.0), 0.1, &config);
        assert!((v.position.x - start.x - 7.5).abs() < 1e-3);
    }

    #[test]
    fn test_empty_tank_floods_hull() {
        let config = GameConfig::default();
        let grid = corridor();
        let mut v = Vehicle::new(Vec2::new(55.0, 15.0), &config);
        v.oxygen = 0.5;
        update_resources(&mut v, &grid, 1.0, &config);
        assert_eq!(v.oxygen, 0.0);
        assert_eq!(v.hull, 0.0);
    }

    #[test]
    fn test_air_pocket_refills_capped() {
        let config = GameConfig::default();
        let grid = corridor();
        let mut v = Vehicle::new(Vec2::new(15.0, 45.0), &config);
        v.oxygen = 10.0;
        update_resources(&mut v, &grid, 0.5, &config);
        assert!((v.oxygen - 14.5).abs() < 1e-4);

        v.oxygen = config.max_oxygen - 1.0;
        update_resources(&mut v, &grid, 1.0, &config);
        assert_eq!(v.oxygen, config.max_oxygen);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let config = GameConfig::default();
        let mut v = Vehicle::new(Vec2::ZERO, &config);
        v.sonar_cooldown = 0.2;
        v.invulnerable_for = 0.2;
        tick_sonar_cooldown(&mut v, 0.5);
        tick_invulnerability(&mut v, 0.5);
        assert_eq!(v.sonar_cooldown, 0.0);
        assert!(!v.is_invulnerable());
    }

    #[test]
    fn test_exit_radius() {
        let config = GameConfig::default();
        let grid = corridor();
        let exit = grid.exit_point().unwrap();
        let mut v = Vehicle::new(exit + Vec2::new(-20.0, 0.0), &config);
        assert!(at_exit(&v, &grid, &config));
        v.position = exit + Vec2::new(-40.0, 0.0);
        assert!(!at_exit(&v, &grid, &config));
    }
}
