//! Physics simulation module for tether dynamics.
//!
//! This module implements:
//! - One-sided spring-damper segment forces (tension only, no compression)
//! - The reel-out schedule (time-varying rest length and material parameters)
//! - Stiff adaptive time integration (Rosenbrock ROS2 with dense output)
//!
//! References:
//! - Tether model: Fechner et al., Renewable Energy 2015
//! - ROS2: Hundsdorfer & Verwer, Springer 2003
//! - Step doubling: Press et al., Numerical Recipes, 3rd ed. 2007

pub mod integrator;
pub mod reel;
pub mod spring;

pub use integrator::{IntegratorConfig, IntegratorStats, StiffIntegrator};
pub use reel::{ReelSchedule, SegmentProperties};
pub use spring::SpringForceModel;

use glam::DVec3;

use crate::config::Parameters;
use crate::error::SimError;
use crate::geometry::ChainState;
use crate::state::{Trajectory, TrajectorySample};

/// Main solver: owns the validated configuration and drives the stiff
/// integrator over the free-node state.
pub struct TetherSolver {
    /// Force model (gravity + segment forces)
    pub forces: SpringForceModel,
    /// Reel-out schedule
    pub schedule: ReelSchedule,
    /// Stiff integrator
    pub integrator: StiffIntegrator,
    /// Validated configuration
    params: Parameters,
}

impl TetherSolver {
    /// Create a solver from validated parameters.
    ///
    /// All configuration errors surface here, before any solving starts.
    pub fn new(params: &Parameters) -> Result<Self, SimError> {
        params.validate()?;

        let integrator_config = IntegratorConfig {
            abs_tolerance: params.simulation.abs_tolerance,
            rel_tolerance: params.simulation.rel_tolerance,
            initial_step_sec: params.simulation.initial_step_sec,
            min_step_sec: params.simulation.min_step_sec,
            max_steps: params.simulation.max_steps,
            ..Default::default()
        };

        Ok(Self {
            forces: SpringForceModel::new(params.tether.gravity()),
            schedule: ReelSchedule::new(&params.tether),
            integrator: StiffIntegrator::new(integrator_config),
            params: params.clone(),
        })
    }

    /// Run the solve from the standard initial layout: a straight chain
    /// along the configured elevation angle, at rest.
    pub fn solve(&mut self) -> Result<Trajectory, SimError> {
        let initial = ChainState::along_elevation(
            self.params.tether.l0_m,
            self.params.tether.elevation_rad,
            self.params.tether.segments,
        )?;
        self.solve_from(initial)
    }

    /// Run the solve from a caller-supplied initial state.
    ///
    /// The anchor (node 0) is held fixed at its initial position for the
    /// whole solve regardless of any velocity stored on it.
    pub fn solve_from(&mut self, initial: ChainState) -> Result<Trajectory, SimError> {
        let n = self.params.tether.segments;
        if initial.segment_count() != n {
            return Err(SimError::invalid_parameter(
                "initial_state",
                format!(
                    "chain has {} segments but the configuration says {}",
                    initial.segment_count(),
                    n
                ),
            ));
        }

        let duration = self.params.simulation.duration_sec;
        let cadence = self.params.simulation.sample_interval_sec;

        log::info!(
            "solving {} segments over {:.3} s (l0 = {:.2} m, v_ro = {:.2} m/s)",
            n,
            duration,
            self.params.tether.l0_m,
            self.params.tether.v_ro_m_per_sec,
        );

        let dim = ChainState::state_dimension(n);
        let mut y0 = vec![0.0; dim];
        initial.pack_free(&mut y0);

        let anchor = initial.positions_m[0];

        // Scratch node buffers reused across every RHS evaluation; the
        // closure writes them fresh each call, so evaluations stay pure
        // functions of (t, y).
        let mut positions = vec![DVec3::ZERO; n + 1];
        let mut velocities = vec![DVec3::ZERO; n + 1];
        let mut acc = vec![DVec3::ZERO; n + 1];
        positions[0] = anchor;

        let forces = &self.forces;
        let schedule = &self.schedule;
        let integrator = &mut self.integrator;

        let rhs = |t: f64, y: &[f64], dydt: &mut [f64]| -> Result<(), SimError> {
            let props = schedule.at(t);

            for i in 1..=n {
                let p = 3 * (i - 1);
                positions[i] = DVec3::new(y[p], y[p + 1], y[p + 2]);
                let v = 3 * n + 3 * (i - 1);
                velocities[i] = DVec3::new(y[v], y[v + 1], y[v + 2]);
            }

            forces.accelerations(t, &positions, &velocities, &props, &mut acc)?;

            // ẋ = v, v̇ = a for the free nodes.
            let (dpos, dvel) = dydt.split_at_mut(3 * n);
            dpos.copy_from_slice(&y[3 * n..]);
            for i in 1..=n {
                let base = 3 * (i - 1);
                dvel[base..base + 3].copy_from_slice(&acc[i].to_array());
            }
            Ok(())
        };

        let raw = integrator.integrate(rhs, &y0, duration, cadence)?;

        let mut trajectory = Trajectory {
            samples: Vec::with_capacity(raw.len()),
        };
        let mut chain = initial.clone();
        for (time_sec, y) in raw {
            chain.unpack_free(&y);
            trajectory.samples.push(TrajectorySample {
                time_sec,
                positions_m: chain.positions_m.clone(),
                velocities_m_per_sec: chain.velocities_m_per_sec.clone(),
            });
        }

        log::info!(
            "solve complete: {} samples, {} accepted / {} rejected steps",
            trajectory.len(),
            self.integrator.stats.steps_accepted,
            self.integrator.stats.steps_rejected,
        );

        Ok(trajectory)
    }

    /// Elastic tension of every segment (N) at a given sample.
    pub fn segment_tensions_at(&self, sample: &TrajectorySample) -> Vec<f64> {
        let props = self.schedule.at(sample.time_sec);
        SpringForceModel::segment_tensions_N(&sample.positions_m, &props)
    }

    /// Work counters of the most recent solve.
    pub fn stats(&self) -> IntegratorStats {
        self.integrator.stats
    }
}
