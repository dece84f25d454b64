//! Cave grid - the per-level tile map shared by generation, sonar and AI.

use serde::{Deserialize, Serialize};

use super::Vec2;

/// A single cave tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub is_wall: bool,
    pub is_air_pocket: bool,
    pub is_exit: bool,
    /// Seconds of illumination left; 0 means dark
    pub reveal_timer: f32,
}

/// Row-major `width × height` tile map.
///
/// Cell `(x, y)` covers world rect `[x·cs, (x+1)·cs) × [y·cs, (y+1)·cs)`.
/// Any coordinate outside the map reads as wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cell_size: f32,
    cells: Vec<Cell>,
    start: (usize, usize),
    exit: Option<(usize, usize)>,
    air_pockets: Vec<(usize, usize)>,
}

impl Grid {
    /// Create an all-open grid with solid borders
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        let mut grid = Self {
            width,
            height,
            cell_size,
            cells: vec![Cell::default(); width * height],
            start: Self::default_start(width, height),
            exit: None,
            air_pockets: Vec::new(),
        };
        grid.seal_border();
        grid
    }

    /// Build a grid from ASCII rows, for fixtures and tooling.
    ///
    /// `#` wall, `.` open, `A` air pocket, `E` exit, `S` start. Border cells
    /// are forced solid regardless of the pattern.
    pub fn from_rows(rows: &[&str], cell_size: f32) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(width, height, cell_size);

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let Some(cell) = grid.cell_mut(x, y) else {
                    continue;
                };
                cell.is_wall = ch == '#';
                cell.is_air_pocket = ch == 'A';
                match ch {
                    'E' => grid.exit = Some((x, y)),
                    'S' => grid.start = (x, y),
                    _ => {}
                }
            }
        }

        grid.seal_border();
        if let Some((ex, ey)) = grid.exit {
            grid.mark_exit(ex, ey);
        }
        grid
    }

    /// Start cell used by generation for a grid of this size (bottom-center)
    pub fn default_start(width: usize, height: usize) -> (usize, usize) {
        (width / 2, height.saturating_sub(5))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height
    }

    /// Wall test on signed cell coordinates; out of range is wall
    pub fn is_wall_at_cell(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 {
            return true;
        }
        self.cell(x as usize, y as usize)
            .map(|c| c.is_wall)
            .unwrap_or(true)
    }

    /// Wall test on a world position; off-map positions are wall
    pub fn is_wall_at(&self, point: Vec2) -> bool {
        match self.world_to_cell(point) {
            Some((x, y)) => self.cells[y * self.width + x].is_wall,
            None => true,
        }
    }

    /// Map a world position to its cell, `None` when outside the grid
    pub fn world_to_cell(&self, point: Vec2) -> Option<(usize, usize)> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        let gx = (point.x / self.cell_size).floor();
        let gy = (point.y / self.cell_size).floor();
        if gx < 0.0 || gy < 0.0 {
            return None;
        }
        let (gx, gy) = (gx as usize, gy as usize);
        self.index(gx, gy).map(|_| (gx, gy))
    }

    /// World position of a cell's center
    pub fn cell_center(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) * self.cell_size,
            (y as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn start_cell(&self) -> (usize, usize) {
        self.start
    }

    pub fn start_point(&self) -> Vec2 {
        self.cell_center(self.start.0, self.start.1)
    }

    pub fn exit_cell(&self) -> Option<(usize, usize)> {
        self.exit
    }

    pub fn exit_point(&self) -> Option<Vec2> {
        self.exit.map(|(x, y)| self.cell_center(x, y))
    }

    /// Centers of the carved air-pocket patches
    pub fn air_pocket_centers(&self) -> &[(usize, usize)] {
        &self.air_pockets
    }

    pub fn is_air_pocket_at(&self, point: Vec2) -> bool {
        self.world_to_cell(point)
            .and_then(|(x, y)| self.cell(x, y))
            .map(|c| c.is_air_pocket)
            .unwrap_or(false)
    }

    pub fn exit_flag_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_exit).count()
    }

    pub fn open_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_wall).count()
    }

    /// Open a single interior cell (border cells stay solid)
    pub(crate) fn open(&mut self, x: usize, y: usize) {
        if self.is_border(x, y) {
            return;
        }
        if let Some(cell) = self.cell_mut(x, y) {
            cell.is_wall = false;
        }
    }

    /// Flag the one exit cell, clearing any previous flag
    pub(crate) fn mark_exit(&mut self, x: usize, y: usize) {
        if let Some((ox, oy)) = self.exit.take() {
            if let Some(cell) = self.cell_mut(ox, oy) {
                cell.is_exit = false;
            }
        }
        self.open(x, y);
        if let Some(cell) = self.cell_mut(x, y) {
            cell.is_exit = true;
            self.exit = Some((x, y));
        }
    }

    pub(crate) fn record_air_pocket(&mut self, x: usize, y: usize) {
        self.air_pockets.push((x, y));
    }

    fn seal_border(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_border(x, y) {
                    let i = y * self.width + x;
                    self.cells[i].is_wall = true;
                    self.cells[i].is_air_pocket = false;
                    self.cells[i].is_exit = false;
                }
            }
        }
    }

    /// 4-directional flood fill over open cells, marking into `reached`.
    ///
    /// The seed is marked even if already set, so calling this again from a
    /// junction extends an existing region.
    pub(crate) fn flood_fill_into(&self, reached: &mut [bool], x: usize, y: usize) {
        let Some(seed) = self.index(x, y) else {
            return;
        };
        if self.cells[seed].is_wall {
            return;
        }
        reached[seed] = true;
        let mut stack = vec![(x, y)];

        while let Some((cx, cy)) = stack.pop() {
            let neighbors = [
                (cx + 1, cy),
                (cx.wrapping_sub(1), cy),
                (cx, cy + 1),
                (cx, cy.wrapping_sub(1)),
            ];
            for (nx, ny) in neighbors {
                if let Some(i) = self.index(nx, ny) {
                    if !reached[i] && !self.cells[i].is_wall {
                        reached[i] = true;
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }

    /// Open cells reachable from the start cell, row-major
    pub fn reachable_from_start(&self) -> Vec<bool> {
        let mut reached = vec![false; self.cells.len()];
        self.flood_fill_into(&mut reached, self.start.0, self.start.1);
        reached
    }

    /// Open cells the start cannot reach
    pub fn unreachable_open_count(&self) -> usize {
        let reached = self.reachable_from_start();
        self.cells
            .iter()
            .zip(&reached)
            .filter(|(c, r)| !c.is_wall && !**r)
            .count()
    }
}
