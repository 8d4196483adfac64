//! Geometry module for the discretized tether chain.
//!
//! Contains the initial node layout along a fixed elevation angle and
//! the packing between node vectors and the flat integration state.

mod chain;

pub use chain::ChainState;
