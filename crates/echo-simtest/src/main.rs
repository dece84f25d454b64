//! Echo Depths Headless Simulation Harness
//!
//! Validates cave generation and dive logic without a renderer.
//! Runs entirely in-process: no window, no audio, no input devices.
//!
//! Usage:
//!   cargo run -p echo-simtest
//!   cargo run -p echo-simtest -- --verbose --seed 7
//!   cargo run -p echo-simtest -- --config tuning.json

use echo_core::generation::{creature_counts, generate_cave, populate_level};
use echo_core::prelude::*;
use echo_core::systems::SonarField;
use hecs::World;
use rand::rngs::StdRng;
use rand::SeedableRng;

const FRAME: f32 = 1.0 / 30.0;
const GENERATION_SEEDS: u64 = 40;
/// Ten simulated minutes
const DIVE_FRAMES: usize = 18_000;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Options {
    verbose: bool,
    seed: u64,
    config_path: Option<String>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        verbose: false,
        seed: 42,
        config_path: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" => options.verbose = true,
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                options.seed = value
                    .parse()
                    .map_err(|e| format!("bad --seed {:?}: {}", value, e))?;
            }
            "--config" => {
                options.config_path = Some(args.next().ok_or("--config needs a path")?);
            }
            other => return Err(format!("unknown argument {:?}", other)),
        }
    }
    Ok(options)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    println!("=== Echo Depths Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Configuration
    let config = match load_config(&options, &mut results) {
        Some(c) => c,
        None => {
            report(&results, options.verbose);
            std::process::exit(1);
        }
    };

    // 2. Cave generation sweep
    results.extend(validate_generation(&config, options.seed, options.verbose));

    // 3. Level population
    results.extend(validate_population(&config, options.seed, options.verbose));

    // 4. Sonar coverage
    results.extend(validate_sonar(&config));

    // 5. Session state machine
    results.extend(validate_session_rules(&config, options.seed));

    // 6. Scripted dive
    results.extend(validate_scripted_dive(&config, options.seed, options.verbose));

    if report(&results, options.verbose) > 0 {
        std::process::exit(1);
    }
}

/// Print the summary, return the failure count
fn report(results: &[TestResult], verbose: bool) -> usize {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );
    failed
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn load_config(options: &Options, results: &mut Vec<TestResult>) -> Option<GameConfig> {
    println!("--- Configuration ---");

    let config = match &options.config_path {
        Some(path) => {
            let loaded = std::fs::File::open(path)
                .map_err(ConfigError::from)
                .and_then(GameConfig::from_json_reader);
            match loaded {
                Ok(c) => {
                    log::info!("Loaded config from {}", path);
                    c
                }
                Err(e) => {
                    results.push(TestResult {
                        name: "config_load".into(),
                        passed: false,
                        detail: format!("{}: {}", path, e),
                    });
                    return None;
                }
            }
        }
        None => GameConfig::default(),
    };

    results.push(TestResult {
        name: "config_valid".into(),
        passed: config.validate().is_ok(),
        detail: format!(
            "{}x{} grid, {} depths, {} specimens per level",
            config.grid_width, config.grid_height, config.total_depths, config.specimens_per_level
        ),
    });

    let round_trip = config
        .to_json_pretty()
        .and_then(|json| GameConfig::from_json_str(&json));
    results.push(TestResult {
        name: "config_json_round_trip".into(),
        passed: matches!(&round_trip, Ok(c) if *c == config),
        detail: match &round_trip {
            Ok(_) => "serialize → parse reproduces the config".into(),
            Err(e) => format!("round trip failed: {}", e),
        },
    });

    let bad = GameConfig::from_json_str(r#"{ "total_depths": 0 }"#);
    results.push(TestResult {
        name: "config_rejects_zero_depths".into(),
        passed: matches!(bad, Err(ConfigError::Invalid { .. })),
        detail: "total_depths = 0 is refused".into(),
    });

    Some(config)
}

// ── 2. Cave Generation ──────────────────────────────────────────────────

fn validate_generation(config: &GameConfig, base_seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Cave Generation ---");
    let mut results = Vec::new();

    for depth in 1..=config.total_depths {
        let mut sealed = 0;
        let mut open_border = 0;
        let mut bad_exit = 0;
        let mut bad_pockets = 0;
        let mut open_ratio_sum = 0.0;

        for seed in base_seed..base_seed + GENERATION_SEEDS {
            let grid = generate_cave(depth, config, &mut StdRng::seed_from_u64(seed));
            let (w, h) = (grid.width(), grid.height());

            if grid.unreachable_open_count() > 0 {
                sealed += 1;
            }
            let border_ok = (0..h).all(|y| {
                (0..w).all(|x| !grid.is_border(x, y) || grid.cell(x, y).is_some_and(|c| c.is_wall))
            });
            if !border_ok {
                open_border += 1;
            }
            if grid.exit_flag_count() != 1 || grid.exit_cell().is_none() {
                bad_exit += 1;
            }
            let pockets = grid.air_pocket_centers().len();
            if pockets < config.generation.air_pockets_min
                || pockets > config.generation.air_pockets_max
            {
                bad_pockets += 1;
            }
            open_ratio_sum += grid.open_cell_count() as f64 / (w * h) as f64;
        }

        let label = |what: &str| format!("gen_depth{}_{}", depth, what);
        results.push(TestResult {
            name: label("connected"),
            passed: sealed == 0,
            detail: format!("{}/{} caves fully reachable", GENERATION_SEEDS - sealed, GENERATION_SEEDS),
        });
        results.push(TestResult {
            name: label("solid_border"),
            passed: open_border == 0,
            detail: format!("{} caves with an open border cell", open_border),
        });
        results.push(TestResult {
            name: label("single_exit"),
            passed: bad_exit == 0,
            detail: format!("{} caves without exactly one exit", bad_exit),
        });
        results.push(TestResult {
            name: label("air_pockets"),
            passed: bad_pockets == 0,
            detail: format!("{} caves outside the air-pocket range", bad_pockets),
        });

        if verbose {
            println!(
                "  depth {}: mean open ratio {:.2} over {} seeds",
                depth,
                open_ratio_sum / GENERATION_SEEDS as f64,
                GENERATION_SEEDS
            );
        }
    }

    results
}

// ── 3. Level Population ─────────────────────────────────────────────────

fn validate_population(config: &GameConfig, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Level Population ---");
    let mut results = Vec::new();

    for depth in 1..=config.total_depths {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(depth as u64));
        let grid = generate_cave(depth, config, &mut rng);
        let mut world = World::new();
        let roster = populate_level(&mut world, &grid, depth, config, &mut rng);

        let wanted: usize = creature_counts(depth, config.total_depths)
            .iter()
            .map(|(_, n)| n)
            .sum();

        let start = grid.start_point();
        let too_close = world
            .query::<(&Position, &Creature)>()
            .iter()
            .filter(|(_, (p, _))| p.0.distance(&start) <= config.agent_min_start_distance)
            .count();
        let in_walls = world
            .query::<&Position>()
            .iter()
            .filter(|(_, p)| grid.is_wall_at(p.0))
            .count();

        results.push(TestResult {
            name: format!("pop_depth{}_roster", depth),
            passed: roster.creatures() == wanted
                && roster.specimens == config.specimens_per_level,
            detail: format!(
                "{} anglerfish, {} jellyfish, {} leviathan, {} specimens",
                roster.anglerfish, roster.jellyfish, roster.leviathans, roster.specimens
            ),
        });
        results.push(TestResult {
            name: format!("pop_depth{}_placement", depth),
            passed: too_close == 0 && in_walls == 0,
            detail: format!("{} near start, {} inside walls", too_close, in_walls),
        });

        if verbose {
            println!("  depth {}: {} entities spawned", depth, world.len());
        }
    }

    results
}

// ── 4. Sonar ────────────────────────────────────────────────────────────

fn validate_sonar(config: &GameConfig) -> Vec<TestResult> {
    println!("--- Sonar ---");
    let mut results = Vec::new();

    let mut grid = Grid::new(config.grid_width, config.grid_height, config.cell_size);
    let origin = grid.cell_center(config.grid_width / 2, config.grid_height / 2);
    let mut sonar = SonarField::new();
    sonar.fire(origin, config);

    let mut frames = 0;
    while !sonar.is_empty() && frames < 10_000 {
        sonar.advance(&mut grid, FRAME, config);
        frames += 1;
    }

    let mut missed = 0;
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let inside = grid.cell_center(x, y).distance(&origin) <= config.sonar_max_radius;
            if inside && grid.cell(x, y).is_some_and(|c| c.reveal_timer <= 0.0) {
                missed += 1;
            }
        }
    }

    results.push(TestResult {
        name: "sonar_expires".into(),
        passed: sonar.is_empty(),
        detail: format!("ping retired after {} frames", frames),
    });
    results.push(TestResult {
        name: "sonar_disk_coverage".into(),
        passed: missed == 0,
        detail: format!("{} cells inside the max radius never lit", missed),
    });

    results
}

// ── 5. Session Rules ────────────────────────────────────────────────────

fn validate_session_rules(config: &GameConfig, seed: u64) -> Vec<TestResult> {
    println!("--- Session Rules ---");
    let mut results = Vec::new();

    let narrow = GameConfig {
        grid_width: 10,
        ..config.clone()
    };
    results.push(TestResult {
        name: "session_rejects_invalid_config".into(),
        passed: matches!(
            Session::with_seed(narrow, seed),
            Err(ConfigError::Invalid { field: "grid_width", .. })
        ),
        detail: "a 10-column grid is refused before generation".into(),
    });

    let mut session = match Session::with_seed(config.clone(), seed) {
        Ok(s) => s,
        Err(e) => {
            results.push(session_error("session_create", e));
            return results;
        }
    };
    results.push(TestResult {
        name: "session_menu_rejects_ping".into(),
        passed: !session.fire_ping(),
        detail: "no pings before the dive starts".into(),
    });

    session.advance_or_restart();
    results.push(TestResult {
        name: "session_starts_at_depth_one".into(),
        passed: session.state() == SessionState::Playing && session.depth() == 1,
        detail: format!("state {:?}, depth {}", session.state(), session.depth()),
    });

    let first = session.fire_ping();
    let cooldown = session.vehicle().sonar_cooldown;
    for _ in 0..15 {
        session.tick(FRAME, TickInput::idle());
    }
    let second = session.fire_ping();
    results.push(TestResult {
        name: "session_ping_cooldown".into(),
        passed: first && !second && cooldown == config.sonar_cooldown,
        detail: format!("first={} second={} cooldown={:.2}", first, second, cooldown),
    });

    session.vehicle_mut().oxygen = 0.0;
    let snap = session.tick(FRAME, TickInput::idle());
    results.push(TestResult {
        name: "session_empty_tank_is_fatal".into(),
        passed: snap.state == SessionState::Dead,
        detail: format!("state after empty tank: {:?}", snap.state),
    });

    session.advance_or_restart();
    results.push(TestResult {
        name: "session_restart_after_death".into(),
        passed: session.state() == SessionState::Playing
            && session.vehicle().hull == config.max_hull
            && session.total_specimens() == 0,
        detail: format!("restarted at depth {}", session.depth()),
    });

    results
}

// ── 6. Scripted Dive ────────────────────────────────────────────────────

fn validate_scripted_dive(config: &GameConfig, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Scripted Dive ---");
    let mut results = Vec::new();

    let mut session = match Session::with_seed(config.clone(), seed) {
        Ok(s) => s,
        Err(e) => return vec![session_error("dive_create", e)],
    };
    session.advance_or_restart();

    let mut bad_frames = 0;
    let mut max_pings = 0;
    let mut deepest = session.depth();
    let mut frames = 0;

    for frame in 0..DIVE_FRAMES {
        if frame % 45 == 0 {
            session.fire_ping();
        }
        session.collect_nearby();

        let input = autopilot(&session, frame);
        let snap = session.tick(FRAME, input);
        frames = frame + 1;

        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if !in_range(snap.hull)
            || !in_range(snap.oxygen)
            || snap.cells.len() != snap.width * snap.height
            || snap.cells.iter().any(|c| !in_range(c.opacity))
        {
            bad_frames += 1;
        }
        max_pings = max_pings.max(snap.pings.len());
        deepest = deepest.max(snap.depth);

        if snap.state != SessionState::Playing {
            break;
        }
    }

    let cooldown_frames = (config.sonar_cooldown / FRAME).floor() as usize;
    let ring_frames = (config.sonar_max_radius / (config.sonar_speed * FRAME)).ceil() as usize;
    let ping_bound = 2 * (ring_frames / cooldown_frames.max(1) + 1);

    results.push(TestResult {
        name: "dive_snapshots_well_formed".into(),
        passed: bad_frames == 0,
        detail: format!("{} malformed frames out of {}", bad_frames, frames),
    });
    results.push(TestResult {
        name: "dive_ping_count_bounded".into(),
        passed: max_pings <= ping_bound,
        detail: format!("at most {} live pings (bound {})", max_pings, ping_bound),
    });
    let json = serde_json::to_string(&session.snapshot());
    results.push(TestResult {
        name: "dive_snapshot_serializes".into(),
        passed: json.is_ok(),
        detail: match &json {
            Ok(text) => format!("final snapshot is {} bytes of JSON", text.len()),
            Err(e) => format!("serialization failed: {}", e),
        },
    });
    let (remaining, placed) = session
        .level()
        .map(|l| (l.remaining_specimens(), l.roster.specimens))
        .unwrap_or((0, 0));
    results.push(TestResult {
        name: "dive_specimen_accounting".into(),
        passed: remaining + session.specimens_collected() == placed,
        detail: format!(
            "{} collected + {} remaining of {} placed at depth {}",
            session.specimens_collected(),
            remaining,
            placed,
            session.depth()
        ),
    });

    if verbose {
        println!(
            "  outcome {:?} at depth {} (deepest {}) after {:.0}s with {} specimens",
            session.state(),
            session.depth(),
            deepest,
            frames as f32 * FRAME,
            session.total_specimens()
        );
        let v = session.vehicle();
        println!(
            "  final hull {:.0}, oxygen {:.0}, position ({:.0}, {:.0})",
            v.hull, v.oxygen, v.position.x, v.position.y
        );
    }

    results
}

fn session_error(name: &str, e: ConfigError) -> TestResult {
    TestResult {
        name: name.into(),
        passed: false,
        detail: format!("session refused the config: {}", e),
    }
}

/// Head for the exit, weaving sideways now and then to get unstuck
fn autopilot(session: &Session, frame: usize) -> TickInput {
    let Some(exit) = session.level().and_then(|l| l.grid.exit_point()) else {
        return TickInput::idle();
    };
    let here = session.vehicle().position;
    let mut dir = exit - here;
    if (frame / 90) % 3 == 2 {
        let side = if (frame / 270) % 2 == 0 { 1.0 } else { -1.0 };
        dir = Vec2::new(-dir.y * side, dir.x * side);
    }
    TickInput {
        movement: dir,
        silent: frame % 600 > 450,
    }
}
