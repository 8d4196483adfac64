//! Error types for the tether simulation.

use thiserror::Error;

/// Errors that can occur while configuring or running a tether solve.
#[derive(Debug, Clone, Error)]
pub enum SimError {
    /// A configuration value failed pre-solve validation.
    #[error("invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A segment length collapsed to zero or became non-finite during a
    /// right-hand-side evaluation. This is a fatal numerical state; the
    /// solve aborts.
    #[error("segment {segment} degenerated (zero or non-finite length) at t = {time_sec:.6} s")]
    DegenerateGeometry {
        /// 1-based segment index.
        segment: usize,
        /// Simulation time of the failing evaluation.
        time_sec: f64,
    },

    /// The adaptive step size fell below the configured floor without
    /// satisfying the error tolerance.
    #[error(
        "integration failed at t = {time_sec:.6} s: step size {step_sec:.3e} s \
         fell below the floor of {min_step_sec:.3e} s"
    )]
    StepSizeUnderflow {
        /// Last time reached before the collapse.
        time_sec: f64,
        /// Step size that was rejected.
        step_sec: f64,
        /// Configured minimum step size.
        min_step_sec: f64,
    },

    /// The solve exceeded its internal step budget before reaching the
    /// end of the horizon.
    #[error("integration exhausted its budget of {max_steps} steps at t = {time_sec:.6} s")]
    StepBudgetExhausted {
        /// Last time reached.
        time_sec: f64,
        /// Configured step budget.
        max_steps: u64,
    },
}

impl SimError {
    /// Create an invalid-parameter error.
    pub fn invalid_parameter(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}
