//! State produced by the simulation.

mod trajectory;

pub use trajectory::{Trajectory, TrajectorySample};
