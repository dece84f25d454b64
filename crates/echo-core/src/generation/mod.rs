//! Generation - procedural creation of caves and their inhabitants

mod cave;
mod population;

pub use cave::*;
pub use population::*;
