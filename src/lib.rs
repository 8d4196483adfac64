//! Tether Sim - transient dynamics of a reeling tether
//!
//! Models a tether as a chain of point masses joined by one-sided
//! (tension-only) spring-damper segments. One end is fixed at a winch
//! that pays the tether out or hauls it in; the free nodes carry gravity
//! and segment forces. The stiff state equations are advanced by an
//! adaptive L-stable Rosenbrock integrator and sampled at a fixed
//! cadence into a [`Trajectory`] for external plotting or export.

// Allow non-snake-case for unit suffixes in field names (N, Ns, J, etc.)
// This follows the project convention of including units in names.
#![allow(non_snake_case)]

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod physics;
pub mod state;

pub use config::{Parameters, SimulationParameters, TetherParameters};
pub use error::SimError;
pub use export::CsvExporter;
pub use geometry::ChainState;
pub use physics::{
    IntegratorConfig, IntegratorStats, ReelSchedule, SegmentProperties, SpringForceModel,
    StiffIntegrator, TetherSolver,
};
pub use state::{Trajectory, TrajectorySample};
