//! Simulation module. Contains the chain states and the Monte Carlo driver.

pub mod monte_carlo;
pub mod state;

pub use monte_carlo::*;
pub use state::*;
