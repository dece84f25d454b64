//! Systems - logic that operates on the grid, the vehicle and the world

mod creatures;
mod pickups;
mod sonar;
mod vehicle;
mod visibility;

pub use creatures::*;
pub use pickups::*;
pub use sonar::*;
pub use vehicle::*;
pub use visibility::*;
