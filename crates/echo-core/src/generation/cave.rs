//! Cave generation - cellular automata with connectivity repair.
//!
//! Pipeline:
//! 1. Random fill, denser with depth (border always solid)
//! 2. Clear the start block
//! 3. Smooth with a 3×3 majority rule
//! 4. Re-clear the start block
//! 5. Carve 3-5 air pockets in the lower half
//! 6. Carve the exit in the top band (fixed fallback cell)
//! 7. Tunnel every unreachable open cell back to the start region

use rand::Rng;

use crate::components::Grid;
use crate::config::{GameConfig, GenerationConfig};

/// Generate the cave for `depth`. Always succeeds; placement failures fall
/// back to fixed or forced cells.
pub fn generate_cave(depth: u32, config: &GameConfig, rng: &mut impl Rng) -> Grid {
    let gen = &config.generation;
    let mut grid = Grid::new(config.grid_width, config.grid_height, config.cell_size);
    let fill = gen.fill_probability(depth);

    random_fill(&mut grid, fill, rng);

    let start = grid.start_cell();
    open_block(&mut grid, start, gen.start_clear_radius);

    for _ in 0..gen.smoothing_passes {
        smooth_pass(&mut grid, gen.wall_threshold);
    }

    open_block(&mut grid, start, gen.start_keep_radius);

    let pockets = place_air_pockets(&mut grid, gen, rng);
    let exit_sampled = place_exit(&mut grid, gen, rng);
    let tunnels = repair_connectivity(&mut grid, gen.tunnel_max_steps);

    log::debug!(
        "Generated depth {} cave: fill={:.2} open={} air_pockets={} exit_sampled={} tunnels={}",
        depth,
        fill,
        grid.open_cell_count(),
        pockets,
        exit_sampled,
        tunnels
    );

    grid
}

fn random_fill(grid: &mut Grid, fill: f64, rng: &mut impl Rng) {
    let (w, h) = (grid.width(), grid.height());
    for y in 0..h {
        for x in 0..w {
            let wall = grid.is_border(x, y) || rng.gen_bool(fill);
            if let Some(cell) = grid.cell_mut(x, y) {
                cell.is_wall = wall;
            }
        }
    }
}

/// Open the square of half-size `radius` around `center` (interior only)
fn open_block(grid: &mut Grid, center: (usize, usize), radius: usize) {
    let r = radius as i64;
    for dy in -r..=r {
        for dx in -r..=r {
            let nx = center.0 as i64 + dx;
            let ny = center.1 as i64 + dy;
            if nx > 0 && ny > 0 {
                grid.open(nx as usize, ny as usize);
            }
        }
    }
}

/// One automaton pass: interior cell becomes wall when the 3×3 window
/// (itself included) holds at least `threshold` walls.
fn smooth_pass(grid: &mut Grid, threshold: u32) {
    let (w, h) = (grid.width(), grid.height());
    // Double-buffer: read from the previous generation only
    let walls: Vec<bool> = grid.cells().iter().map(|c| c.is_wall).collect();

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut count = 0;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    if walls[ny * w + nx] {
                        count += 1;
                    }
                }
            }
            if let Some(cell) = grid.cell_mut(x, y) {
                cell.is_wall = count >= threshold;
            }
        }
    }
}

/// Carve a 3×3 patch around `(cx, cy)`, optionally flagging it air pocket
fn carve_patch(grid: &mut Grid, cx: usize, cy: usize, air_pocket: bool) {
    for ny in cy.saturating_sub(1)..=cy + 1 {
        for nx in cx.saturating_sub(1)..=cx + 1 {
            if grid.is_border(nx, ny) {
                continue;
            }
            grid.open(nx, ny);
            if air_pocket {
                if let Some(cell) = grid.cell_mut(nx, ny) {
                    cell.is_air_pocket = true;
                }
            }
        }
    }
}

/// Place air pockets in the lower half. Returns how many were sampled on
/// open ground; the rest of the quota is force-carved.
fn place_air_pockets(grid: &mut Grid, gen: &GenerationConfig, rng: &mut impl Rng) -> usize {
    let (w, h) = (grid.width(), grid.height());
    let target = rng.gen_range(gen.air_pockets_min..=gen.air_pockets_max);
    let xs = gen.pocket_margin..w - gen.pocket_margin;
    let ys = h / 2..h - gen.pocket_margin;

    let mut placed = 0;
    let mut attempts = 0;
    while placed < target && attempts < gen.feature_attempts {
        let ax = rng.gen_range(xs.clone());
        let ay = rng.gen_range(ys.clone());
        if grid.cell(ax, ay).map(|c| !c.is_wall).unwrap_or(false) {
            carve_patch(grid, ax, ay, true);
            grid.record_air_pocket(ax, ay);
            placed += 1;
        }
        attempts += 1;
    }

    let sampled = placed;
    while placed < target {
        let ax = rng.gen_range(xs.clone());
        let ay = rng.gen_range(ys.clone());
        carve_patch(grid, ax, ay, true);
        grid.record_air_pocket(ax, ay);
        placed += 1;
    }
    if sampled < target {
        log::debug!(
            "Force-carved {} of {} air pockets after {} attempts",
            target - sampled,
            target,
            gen.feature_attempts
        );
    }
    sampled
}

/// Place the single exit in the top band. Returns false if the fixed
/// fallback cell had to be used.
fn place_exit(grid: &mut Grid, gen: &GenerationConfig, rng: &mut impl Rng) -> bool {
    let w = grid.width();
    let (top, bottom) = gen.exit_rows;

    for _ in 0..gen.feature_attempts {
        let ex = rng.gen_range(gen.exit_margin..w - gen.exit_margin);
        let ey = rng.gen_range(top..=bottom);
        if grid.cell(ex, ey).map(|c| !c.is_wall).unwrap_or(false) {
            grid.mark_exit(ex, ey);
            carve_patch(grid, ex, ey, false);
            return true;
        }
    }

    let fallback = (w / 2, gen.exit_fallback_row);
    log::warn!(
        "Exit sampling failed after {} attempts, using fallback cell {:?}",
        gen.feature_attempts,
        fallback
    );
    grid.mark_exit(fallback.0, fallback.1);
    false
}

/// Tunnel every open cell the start cannot reach back into the reached
/// region. Returns the number of tunnels carved.
///
/// Tunnels step one axis at a time so every carved cell is 4-adjacent to
/// the previous one. The step budget never drops below the grid's
/// Manhattan diameter, so each tunnel arrives.
fn repair_connectivity(grid: &mut Grid, max_steps: usize) -> usize {
    let (w, h) = (grid.width(), grid.height());
    let (sx, sy) = grid.start_cell();
    let step_cap = max_steps.max(w + h);

    let mut reached = vec![false; w * h];
    grid.flood_fill_into(&mut reached, sx, sy);

    let mut tunnels = 0;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            if grid.cells()[i].is_wall || reached[i] {
                continue;
            }

            tunnels += 1;
            let (mut tx, mut ty) = (x, y);
            for _ in 0..step_cap {
                if tx != sx {
                    tx = if tx < sx { tx + 1 } else { tx - 1 };
                } else if ty != sy {
                    ty = if ty < sy { ty + 1 } else { ty - 1 };
                } else {
                    break;
                }
                grid.open(tx, ty);
                if reached[ty * w + tx] {
                    // Junction: pull the tunnel and its source region in
                    grid.flood_fill_into(&mut reached, tx, ty);
                    break;
                }
            }
        }
    }
    tunnels
}
