//! A four-state variant of Conway's Game of Life on a toroidal grid, with a
//! linear undo history of past generations.
//!
//! [`Simulation`] is the entry point for front ends; [`run::Runner`] drives it
//! on a timer.

pub mod config;
pub mod error;
pub mod grid;
pub mod history;
pub mod run;
pub mod simulation;

pub use config::Config;
pub use error::{EngineError, Result};
pub use grid::{CellState, Grid};
pub use history::History;
pub use simulation::{Simulation, Snapshot};
