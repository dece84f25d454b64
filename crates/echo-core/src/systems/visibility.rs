//! Visibility system - proximity glow, reveal decay, entity opacity

use crate::components::{Cell, Grid, Vec2};
use crate::config::GameConfig;
use super::sonar::cell_bounds;

/// Opacity of anything inside the vehicle's glow
pub const GLOW_OPACITY: f32 = 0.8;

/// Faint self-glow: `opacity` applies within `distance` of the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BioBand {
    pub distance: f32,
    pub opacity: f32,
}

/// Creatures glow faintly out to 400 units
pub const CREATURE_BIOLUMINESCENCE: &[BioBand] = &[
    BioBand {
        distance: 200.0,
        opacity: 0.15,
    },
    BioBand {
        distance: 400.0,
        opacity: 0.05,
    },
];

/// Specimens only glow close up
pub const SPECIMEN_BIOLUMINESCENCE: &[BioBand] = &[BioBand {
    distance: 150.0,
    opacity: 0.12,
}];

/// Floor the reveal timer of cells within `radius` of `center`
pub fn apply_glow(grid: &mut Grid, center: Vec2, radius: f32, floor: f32) {
    let Some((x0, y0, x1, y1)) = cell_bounds(grid, center, radius) else {
        return;
    };
    let w = grid.width();
    let cs = grid.cell_size();
    let cells = grid.cells_mut();

    for y in y0..=y1 {
        for x in x0..=x1 {
            let cell_center = Vec2::new((x as f32 + 0.5) * cs, (y as f32 + 0.5) * cs);
            if cell_center.distance(&center) <= radius {
                let cell = &mut cells[y * w + x];
                cell.reveal_timer = cell.reveal_timer.max(floor);
            }
        }
    }
}

/// Fade every cell by `dt`, never below zero
pub fn decay(grid: &mut Grid, dt: f32) {
    for cell in grid.cells_mut() {
        if cell.reveal_timer > 0.0 {
            cell.reveal_timer = (cell.reveal_timer - dt).max(0.0);
        }
    }
}

/// Render opacity of a cell
pub fn cell_opacity(cell: &Cell, reveal_duration: f32) -> f32 {
    if reveal_duration <= 0.0 {
        return 0.0;
    }
    (cell.reveal_timer / reveal_duration).clamp(0.0, 1.0)
}

/// Largest reveal timer in the `(2r+1)²` block around `point`'s cell
pub fn neighborhood_reveal(grid: &Grid, point: Vec2, radius_cells: i64) -> f32 {
    let Some((cx, cy)) = grid.world_to_cell(point) else {
        return 0.0;
    };
    let mut best: f32 = 0.0;
    for dy in -radius_cells..=radius_cells {
        for dx in -radius_cells..=radius_cells {
            let nx = cx as i64 + dx;
            let ny = cy as i64 + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            if let Some(cell) = grid.cell(nx as usize, ny as usize) {
                best = best.max(cell.reveal_timer);
            }
        }
    }
    best
}

/// Opacity of an entity at `point`: the best of its lit surroundings, the
/// vehicle glow, and its own bioluminescence
pub fn entity_opacity(
    grid: &Grid,
    point: Vec2,
    vehicle: Vec2,
    glow_radius: f32,
    bio: &[BioBand],
    config: &GameConfig,
) -> f32 {
    let sonar = if config.reveal_duration > 0.0 {
        neighborhood_reveal(grid, point, 1) / config.reveal_duration
    } else {
        0.0
    };

    let dist = point.distance(&vehicle);
    let glow = if dist < glow_radius { GLOW_OPACITY } else { 0.0 };
    let self_glow = bio
        .iter()
        .find(|band| dist < band.distance)
        .map(|band| band.opacity)
        .unwrap_or(0.0);

    sonar.max(glow).max(self_glow).clamp(0.0, 1.0)
}

/// Exit marker opacity: brightest cell in the 5×5 around it
pub fn exit_opacity(grid: &Grid, config: &GameConfig) -> f32 {
    match grid.exit_point() {
        Some(point) if config.reveal_duration > 0.0 => {
            (neighborhood_reveal(grid, point, 2) / config.reveal_duration).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glow_floors_without_overriding_ping() {
        let mut grid = Grid::new(20, 20, 10.0);
        let center = grid.cell_center(10, 10);
        grid.cell_mut(10, 10).unwrap().reveal_timer = 3.0;

        apply_glow(&mut grid, center, 15.0, 0.8);
        assert_eq!(grid.cell(10, 10).unwrap().reveal_timer, 3.0);
        assert_eq!(grid.cell(11, 10).unwrap().reveal_timer, 0.8);
        assert_eq!(grid.cell(13, 10).unwrap().reveal_timer, 0.0);
    }

    #[test]
    fn test_exit_opacity_reads_five_by_five() {
        let config = GameConfig::default();
        let rows = [
            "##########",
            "#........#",
            "#...E....#",
            "#........#",
            "#........#",
            "#........#",
            "#........#",
            "##########",
        ];

        let dark = Grid::from_rows(&rows, 24.0);
        assert_eq!(exit_opacity(&dark, &config), 0.0);

        let mut near = Grid::from_rows(&rows, 24.0);
        near.cell_mut(6, 4).unwrap().reveal_timer = config.reveal_duration;
        assert_eq!(exit_opacity(&near, &config), 1.0);

        let mut far = Grid::from_rows(&rows, 24.0);
        far.cell_mut(7, 5).unwrap().reveal_timer = config.reveal_duration;
        assert_eq!(exit_opacity(&far, &config), 0.0);
    }

    #[test]
    fn test_decay_floors_at_zero() {
        let mut grid = Grid::new(10, 10, 10.0);
        grid.cell_mut(4, 4).unwrap().reveal_timer = 0.25;
        decay(&mut grid, 0.1);
        assert!((grid.cell(4, 4).unwrap().reveal_timer - 0.15).abs() < 1e-6);
        decay(&mut grid, 1.0);
        assert_eq!(grid.cell(4, 4).unwrap().reveal_timer, 0.0);
    }

    #[test]
    fn test_cell_opacity_clamped() {
        let mut cell = Cell::default();
        cell.reveal_timer = 7.0;
        assert_eq!(cell_opacity(&cell, 3.5), 1.0);
        cell.reveal_timer = 1.75;
        assert_eq!(cell_opacity(&cell, 3.5), 0.5);
    }

    #[test]
    fn test_entity_opacity_layers() {
        let config = GameConfig::default();
        let grid = Grid::new(100, 100, 24.0);
        let vehicle = grid.cell_center(50, 50);

        // Inside glow
        let near = vehicle + Vec2::new(10.0, 0.0);
        assert_eq!(
            entity_opacity(&grid, near, vehicle, 40.0, CREATURE_BIOLUMINESCENCE, &config),
            GLOW_OPACITY
        );

        // Bioluminescence bands
        let mid = vehicle + Vec2::new(150.0, 0.0);
        assert_eq!(
            entity_opacity(&grid, mid, vehicle, 40.0, CREATURE_BIOLUMINESCENCE, &config),
            0.15
        );
        let far = vehicle + Vec2::new(300.0, 0.0);
        assert_eq!(
            entity_opacity(&grid, far, vehicle, 40.0, CREATURE_BIOLUMINESCENCE, &config),
            0.05
        );
        assert_eq!(
            entity_opacity(&grid, far, vehicle, 40.0, SPECIMEN_BIOLUMINESCENCE, &config),
            0.0
        );

        let very_far = vehicle + Vec2::new(600.0, 0.0);
        assert_eq!(
            entity_opacity(&grid, very_far, vehicle, 40.0, CREATURE_BIOLUMINESCENCE, &config),
            0.0
        );
    }

    #[test]
    fn test_entity_lit_by_neighbor_cell() {
        let config = GameConfig::default();
        let mut grid = Grid::new(100, 100, 24.0);
        grid.cell_mut(71, 50).unwrap().reveal_timer = config.reveal_duration;
        let point = grid.cell_center(70, 50);
        let vehicle = grid.cell_center(10, 10);
        assert_eq!(
            entity_opacity(&grid, point, vehicle, 40.0, SPECIMEN_BIOLUMINESCENCE, &config),
            1.0
        );
    }
}
