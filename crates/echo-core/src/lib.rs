//! Echo Depths Core - Sonar Cave Exploration Engine
//!
//! Simulation core for a submersible diving through procedurally generated,
//! mostly dark caves. Sonar pings and the hull's glow briefly reveal the
//! terrain, the creatures hunting in it, and the specimens worth collecting.
//!
//! # Architecture
//!
//! Creatures and specimens live in a `hecs` ECS world; the cave grid, the
//! vehicle and the active sonar pings are owned directly by the level:
//! - **Components**: Pure data (Grid, Vehicle, Creature, Specimen, Position)
//! - **Systems**: Per-tick logic over components (sonar, visibility, AI)
//! - **Generation**: Cellular-automata caves and level population
//! - **Session**: The dive state machine and frame tick
//!
//! # Example
//!
//! ```rust,no_run
//! use echo_core::prelude::*;
//!
//! # fn main() -> Result<(), ConfigError> {
//! let mut session = Session::with_seed(GameConfig::default(), 42)?;
//! session.advance_or_restart();
//!
//! loop {
//!     session.fire_ping();
//!     let frame = session.tick(1.0 / 60.0, TickInput::moving(0.0, -1.0));
//!     if frame.state != SessionState::Playing {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod components;
pub mod config;
pub mod generation;
pub mod session;
pub mod systems;
pub mod view;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{ConfigError, GameConfig, GenerationConfig};
    pub use crate::session::{Level, Session, SessionState, TickInput};
    pub use crate::view::Snapshot;
}
