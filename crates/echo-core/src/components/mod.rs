//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities (creatures,
//! specimens) or owned directly by the level (grid, vehicle).

mod cave;
mod common;
mod creature;
mod vehicle;

pub use cave::*;
pub use common::*;
pub use creature::*;
pub use vehicle::*;
