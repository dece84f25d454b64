//! Sonar system - expanding ping rings that light the cave as they pass

use serde::{Deserialize, Serialize};

use crate::components::{Grid, Vec2};
use crate::config::GameConfig;

/// One expanding sensor ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SonarPing {
    pub origin: Vec2,
    pub current_radius: f32,
    pub max_radius: f32,
    /// Trailing echo ring; same reveal behavior, drawn dimmer
    pub echo: bool,
}

impl SonarPing {
    pub fn new(origin: Vec2, max_radius: f32) -> Self {
        Self {
            origin,
            current_radius: 0.0,
            max_radius,
            echo: false,
        }
    }

    pub fn echo(origin: Vec2, max_radius: f32) -> Self {
        Self {
            echo: true,
            ..Self::new(origin, max_radius)
        }
    }

    /// Draw intensity for the presentation layer
    pub fn intensity(&self) -> f32 {
        if self.echo {
            0.5
        } else {
            1.0
        }
    }

    pub fn is_expired(&self) -> bool {
        self.current_radius >= self.max_radius
    }
}

/// All pings alive in the current level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SonarField {
    pings: Vec<SonarPing>,
}

impl SonarField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a primary ring and its echo at `origin`
    pub fn fire(&mut self, origin: Vec2, config: &GameConfig) {
        self.pings.push(SonarPing::new(origin, config.sonar_max_radius));
        self.pings.push(SonarPing::echo(origin, config.sonar_max_radius));
    }

    /// Grow every ring, stamp the band it swept this tick, retire the
    /// finished ones
    pub fn advance(&mut self, grid: &mut Grid, dt: f32, config: &GameConfig) {
        for ping in &mut self.pings {
            let inner = ping.current_radius;
            ping.current_radius += config.sonar_speed * dt;
            stamp_annulus(
                grid,
                ping.origin,
                inner,
                ping.current_radius,
                config.reveal_duration,
            );
        }
        self.pings.retain(|p| !p.is_expired());
    }

    pub fn pings(&self) -> &[SonarPing] {
        &self.pings
    }

    pub fn len(&self) -> usize {
        self.pings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pings.is_empty()
    }
}

/// Set the reveal timer of every cell whose center lies in
/// `[inner, outer + cell_size]` from `origin`. Sets, never accumulates.
pub fn stamp_annulus(grid: &mut Grid, origin: Vec2, inner: f32, outer: f32, duration: f32) {
    let reach = outer + grid.cell_size();
    let Some((x0, y0, x1, y1)) = cell_bounds(grid, origin, reach) else {
        return;
    };
    let w = grid.width();
    let cs = grid.cell_size();
    let cells = grid.cells_mut();

    for y in y0..=y1 {
        for x in x0..=x1 {
            let center = Vec2::new((x as f32 + 0.5) * cs, (y as f32 + 0.5) * cs);
            let dist = center.distance(&origin);
            if dist >= inner && dist <= reach {
                cells[y * w + x].reveal_timer = duration;
            }
        }
    }
}

/// Inclusive cell rect covering a circle, clipped to the grid
pub(crate) fn cell_bounds(
    grid: &Grid,
    center: Vec2,
    radius: f32,
) -> Option<(usize, usize, usize, usize)> {
    if grid.width() == 0 || grid.height() == 0 || !center.x.is_finite() || !center.y.is_finite()
    {
        return None;
    }
    let cs = grid.cell_size();
    let max_x = grid.width() as i64 - 1;
    let max_y = grid.height() as i64 - 1;

    let x0 = (((center.x - radius) / cs).floor() as i64 - 1).max(0);
    let x1 = (((center.x + radius) / cs).floor() as i64 + 1).min(max_x);
    let y0 = (((center.y - radius) / cs).floor() as i64 - 1).max(0);
    let y1 = (((center.y + radius) / cs).floor() as i64 + 1).min(max_y);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid() -> Grid {
        Grid::new(60, 60, 10.0)
    }

    #[test]
    fn test_fire_spawns_ring_and_echo() {
        let config = GameConfig::default();
        let mut field = SonarField::new();
        field.fire(Vec2::new(100.0, 100.0), &config);
        assert_eq!(field.len(), 2);
        assert!(!field.pings()[0].echo);
        assert!(field.pings()[1].echo);
        assert!(field.pings()[1].intensity() < field.pings()[0].intensity());
    }

    #[test]
    fn test_ring_expands_then_retires() {
        let config = GameConfig::default();
        let mut grid = open_grid();
        let mut field = SonarField::new();
        field.fire(Vec2::new(300.0, 300.0), &config);

        field.advance(&mut grid, 0.5, &config);
        assert_eq!(field.len(), 2);
        assert!((field.pings()[0].current_radius - 200.0).abs() < 1e-3);

        field.advance(&mut grid, 0.5, &config);
        assert!(field.is_empty());
    }

    #[test]
    fn test_stamp_sets_band_only() {
        let mut grid = open_grid();
        let origin = grid.cell_center(30, 30);
        stamp_annulus(&mut grid, origin, 95.0, 105.0, 3.5);

        // 10 cells away = 100 units: in band
        assert_eq!(grid.cell(40, 30).unwrap().reveal_timer, 3.5);
        // Origin cell is inside the inner radius
        assert_eq!(grid.cell(30, 30).unwrap().reveal_timer, 0.0);
        // 20 cells away is past outer + cell_size
        assert_eq!(grid.cell(50, 30).unwrap().reveal_timer, 0.0);
    }

    #[test]
    fn test_stamp_overwrites_not_accumulates() {
        let mut grid = open_grid();
        let origin = grid.cell_center(30, 30);
        stamp_annulus(&mut grid, origin, 0.0, 20.0, 3.5);
        stamp_annulus(&mut grid, origin, 0.0, 20.0, 3.5);
        assert_eq!(grid.cell(30, 30).unwrap().reveal_timer, 3.5);
    }

    #[test]
    fn test_stamp_near_edge_is_clipped() {
        let mut grid = open_grid();
        stamp_annulus(&mut grid, Vec2::new(-50.0, -50.0), 0.0, 80.0, 3.5);
        assert_eq!(grid.cell(0, 0).unwrap().reveal_timer, 3.5);
    }
}
