//! Stiff ODE integration with dense output.
//!
//! The tether's spring constant makes the state equations stiff: the
//! axial vibration period of one segment is orders of magnitude shorter
//! than the swing dynamics of interest, and an explicit method would need
//! absurdly small steps to stay stable. The integrator here is the
//! second-order linearly implicit Rosenbrock method ROS2 with
//! γ = 1 + √2/2, which is L-stable and — being a W-method — keeps its
//! order for inexact Jacobians, so the finite-difference Jacobian and its
//! reuse across the error-estimation substeps are harmless.
//!
//! One step from (t, y) with step size h:
//!
//! (I - γhJ)·k₁ = f(t, y) + γh·f_t
//! (I - γhJ)·k₂ = f(t + h, y + h·k₁) - 2k₁ - γh·f_t
//! y(t + h) = y + (3/2)h·k₁ + (1/2)h·k₂
//!
//! where J ≈ ∂f/∂y and f_t ≈ ∂f/∂t by finite differences (the f_t terms
//! are what autonomizing the system contributes; they are exact here
//! because the only explicit time dependence, the reel-out length, is
//! linear in t).
//!
//! Step-size control is by step doubling: one full step is compared
//! against two half steps, the difference divided by 2²-1 estimates the
//! local error of the half-step solution, and the step size follows the
//! usual third-root rule with a safety factor. Output samples at the
//! fixed cadence are reconstructed by cubic Hermite interpolation over
//! each accepted step, so the output grid is independent of the adaptive
//! internal grid.
//!
//! Reference: Hundsdorfer & Verwer, Numerical Solution of Time-Dependent
//! Advection-Diffusion-Reaction Equations, Springer 2003 (ROS2)
//! Reference: Press et al., Numerical Recipes, 3rd ed., Cambridge
//! University Press 2007 (step doubling)

use nalgebra::{DMatrix, DVector};

use crate::error::SimError;

/// L-stability root of x² - 2x + 1/2: γ = 1 + √2/2
const GAMMA: f64 = 1.0 + std::f64::consts::FRAC_1_SQRT_2;

/// Step-size controller limits
const SAFETY: f64 = 0.9;
const MIN_SHRINK: f64 = 0.2;
const MAX_GROWTH: f64 = 5.0;

/// Configuration for the stiff integrator
#[derive(Debug, Clone)]
pub struct IntegratorConfig {
    /// Absolute local-error tolerance per component
    pub abs_tolerance: f64,
    /// Relative local-error tolerance
    pub rel_tolerance: f64,
    /// First trial step size (s)
    pub initial_step_sec: f64,
    /// Floor below which step-size collapse is reported as failure (s)
    pub min_step_sec: f64,
    /// Cap on the internal step size (s)
    pub max_step_sec: f64,
    /// Budget of internal step attempts (accepted + rejected)
    pub max_steps: u64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            abs_tolerance: 1e-6,
            rel_tolerance: 1e-6,
            initial_step_sec: 1e-4,
            min_step_sec: 1e-12,
            max_step_sec: f64::INFINITY,
            max_steps: 2_000_000,
        }
    }
}

/// Work counters for one solve
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegratorStats {
    /// Accepted internal steps
    pub steps_accepted: u64,
    /// Rejected internal steps
    pub steps_rejected: u64,
    /// Right-hand-side evaluations
    pub rhs_evaluations: u64,
    /// Finite-difference Jacobian builds
    pub jacobian_evaluations: u64,
}

/// A (time, state) pair on the output grid
pub type Sample = (f64, Vec<f64>);

/// Adaptive Rosenbrock (ROS2) integrator with dense output.
///
/// The right-hand side is any `FnMut(t, y, dydt) -> Result<(), SimError>`;
/// a `DegenerateGeometry` error raised inside a *trial* step rejects that
/// step like an oversized one (the adaptive controller may simply have
/// overshot into an invalid configuration), and is surfaced as the solve
/// error only once the step floor is reached or an accepted state itself
/// is degenerate.
pub struct StiffIntegrator {
    /// Configuration
    pub config: IntegratorConfig,
    /// Work counters from the most recent solve
    pub stats: IntegratorStats,
}

impl StiffIntegrator {
    /// Create an integrator with the given configuration.
    pub fn new(config: IntegratorConfig) -> Self {
        Self {
            config,
            stats: IntegratorStats::default(),
        }
    }

    /// Advance `y0` from t = 0 to `duration_sec`, returning samples every
    /// `sample_interval_sec` (t = 0 and t = duration always included).
    pub fn integrate<F>(
        &mut self,
        mut rhs: F,
        y0: &[f64],
        duration_sec: f64,
        sample_interval_sec: f64,
    ) -> Result<Vec<Sample>, SimError>
    where
        F: FnMut(f64, &[f64], &mut [f64]) -> Result<(), SimError>,
    {
        let dim = y0.len();
        self.stats = IntegratorStats::default();

        let mut samples: Vec<Sample> =
            Vec::with_capacity((duration_sec / sample_interval_sec) as usize + 2);
        samples.push((0.0, y0.to_vec()));
        let mut next_sample = sample_interval_sec;

        let mut t = 0.0_f64;
        let mut y = y0.to_vec();
        let mut f_curr = vec![0.0; dim];
        self.eval_rhs(&mut rhs, t, &y, &mut f_curr)?;

        let mut h = self
            .config
            .initial_step_sec
            .min(self.config.max_step_sec)
            .min(duration_sec);

        let mut scratch = Scratch::new(dim);
        // Carries the geometry error behind repeated trial-step rejections
        // so a floor hit reports the cause, not just the collapse.
        let mut pending_geometry: Option<SimError> = None;

        let t_tiny = duration_sec * 1e-12;

        while t < duration_sec - t_tiny {
            if self.stats.steps_accepted + self.stats.steps_rejected >= self.config.max_steps {
                return Err(SimError::StepBudgetExhausted {
                    time_sec: t,
                    max_steps: self.config.max_steps,
                });
            }

            let h_trial = h.min(duration_sec - t);

            match self.attempt_step(&mut rhs, t, &y, &f_curr, h_trial, &mut scratch)? {
                StepOutcome::Accepted { y_new, error_norm } => {
                    let t_new = t + h_trial;

                    // Derivative at the accepted point: needed for the
                    // next step and for the Hermite interpolant. Failure
                    // here is failure of an accepted state — fatal.
                    let mut f_new = vec![0.0; dim];
                    self.eval_rhs(&mut rhs, t_new, &y_new, &mut f_new)?;

                    while next_sample <= t_new + t_tiny && next_sample <= duration_sec + t_tiny {
                        let ts = next_sample.min(duration_sec);
                        samples.push((ts, hermite(t, h_trial, &y, &f_curr, &y_new, &f_new, ts)));
                        next_sample += sample_interval_sec;
                    }

                    t = t_new;
                    y = y_new;
                    f_curr = f_new;
                    pending_geometry = None;
                    self.stats.steps_accepted += 1;

                    let growth = if error_norm > 0.0 {
                        (SAFETY * error_norm.powf(-1.0 / 3.0)).clamp(MIN_SHRINK, MAX_GROWTH)
                    } else {
                        MAX_GROWTH
                    };
                    h = (h_trial * growth).min(self.config.max_step_sec);
                }
                StepOutcome::Rejected { error_norm } => {
                    self.stats.steps_rejected += 1;
                    let shrink =
                        (SAFETY * error_norm.powf(-1.0 / 3.0)).clamp(MIN_SHRINK, SAFETY);
                    h = h_trial * shrink;
                    self.check_floor(t, h, &mut pending_geometry)?;
                }
                StepOutcome::Degenerate(err) => {
                    self.stats.steps_rejected += 1;
                    pending_geometry = Some(err);
                    h = h_trial * 0.5;
                    self.check_floor(t, h, &mut pending_geometry)?;
                }
            }
        }

        // Cadence samples stop at the last multiple inside the horizon;
        // close the series with the end point if it is off-grid.
        let last_t = samples.last().map(|(ts, _)| *ts).unwrap_or(0.0);
        if duration_sec - last_t > t_tiny {
            samples.push((duration_sec, y.clone()));
        }

        log::debug!(
            "integration finished: {} accepted / {} rejected steps, {} rhs evals, {} jacobians",
            self.stats.steps_accepted,
            self.stats.steps_rejected,
            self.stats.rhs_evaluations,
            self.stats.jacobian_evaluations
        );

        Ok(samples)
    }

    fn check_floor(
        &self,
        t: f64,
        h: f64,
        pending_geometry: &mut Option<SimError>,
    ) -> Result<(), SimError> {
        if h < self.config.min_step_sec {
            if let Some(err) = pending_geometry.take() {
                return Err(err);
            }
            return Err(SimError::StepSizeUnderflow {
                time_sec: t,
                step_sec: h,
                min_step_sec: self.config.min_step_sec,
            });
        }
        Ok(())
    }

    /// One adaptive attempt: full ROS2 step vs two half steps.
    fn attempt_step<F>(
        &mut self,
        rhs: &mut F,
        t: f64,
        y: &[f64],
        f_curr: &[f64],
        h: f64,
        scratch: &mut Scratch,
    ) -> Result<StepOutcome, SimError>
    where
        F: FnMut(f64, &[f64], &mut [f64]) -> Result<(), SimError>,
    {
        let dim = y.len();

        // One Jacobian and time derivative per attempt, shared by the
        // full and half steps (W-method: order is unaffected).
        let (jac, f_t) = match self.derivatives(rhs, t, y, f_curr, scratch) {
            Ok(pair) => pair,
            Err(reject) => return Ok(reject),
        };

        let y_full = match self.ros2_step(rhs, t, y, f_curr, h, &jac, &f_t, scratch) {
            Ok(v) => v,
            Err(reject) => return Ok(reject),
        };

        let y_half = match self.ros2_step(rhs, t, y, f_curr, 0.5 * h, &jac, &f_t, scratch) {
            Ok(v) => v,
            Err(reject) => return Ok(reject),
        };
        let mut f_half = vec![0.0; dim];
        match self.eval_rhs_trial(rhs, t + 0.5 * h, &y_half, &mut f_half) {
            Ok(()) => {}
            Err(reject) => return Ok(reject),
        }
        let y_new = match self.ros2_step(
            rhs,
            t + 0.5 * h,
            &y_half,
            &f_half,
            0.5 * h,
            &jac,
            &f_t,
            scratch,
        ) {
            Ok(v) => v,
            Err(reject) => return Ok(reject),
        };

        if !y_new.iter().all(|v| v.is_finite()) || !y_full.iter().all(|v| v.is_finite()) {
            return Ok(StepOutcome::Rejected { error_norm: 4.0 });
        }

        // Local error of the half-step solution, order 2: Δ/(2² - 1).
        let mut sum_sq = 0.0;
        for i in 0..dim {
            let err = (y_new[i] - y_full[i]) / 3.0;
            let scale =
                self.config.abs_tolerance + self.config.rel_tolerance * y[i].abs().max(y_new[i].abs());
            let ratio = err / scale;
            sum_sq += ratio * ratio;
        }
        let error_norm = (sum_sq / dim as f64).sqrt();

        if error_norm <= 1.0 {
            Ok(StepOutcome::Accepted { y_new, error_norm })
        } else {
            Ok(StepOutcome::Rejected { error_norm })
        }
    }

    /// One ROS2 step of size `h` from (t, y) with derivative `f0`.
    ///
    /// Returns the advanced state, or a rejection outcome when a stage
    /// evaluation degenerates or the Rosenbrock matrix is singular.
    #[allow(clippy::too_many_arguments)]
    fn ros2_step<F>(
        &mut self,
        rhs: &mut F,
        t: f64,
        y: &[f64],
        f0: &[f64],
        h: f64,
        jac: &DMatrix<f64>,
        f_t: &DVector<f64>,
        scratch: &mut Scratch,
    ) -> Result<Vec<f64>, StepOutcome>
    where
        F: FnMut(f64, &[f64], &mut [f64]) -> Result<(), SimError>,
    {
        let dim = y.len();

        // I - γhJ, LU-factored once for both stages.
        let mut w = jac * (-GAMMA * h);
        for i in 0..dim {
            w[(i, i)] += 1.0;
        }
        let lu = w.lu();

        let gh_ft = f_t * (GAMMA * h);

        let rhs1 = DVector::from_row_slice(f0) + &gh_ft;
        let k1 = match lu.solve(&rhs1) {
            Some(k) => k,
            None => return Err(StepOutcome::Rejected { error_norm: 4.0 }),
        };

        for i in 0..dim {
            scratch.y_stage[i] = y[i] + h * k1[i];
        }
        match self.eval_rhs_trial(rhs, t + h, &scratch.y_stage, &mut scratch.f_stage) {
            Ok(()) => {}
            Err(reject) => return Err(reject),
        }

        let rhs2 = DVector::from_row_slice(&scratch.f_stage) - &k1 * 2.0 - &gh_ft;
        let k2 = match lu.solve(&rhs2) {
            Some(k) => k,
            None => return Err(StepOutcome::Rejected { error_norm: 4.0 }),
        };

        let mut y_next = vec![0.0; dim];
        for i in 0..dim {
            y_next[i] = y[i] + h * (1.5 * k1[i] + 0.5 * k2[i]);
        }
        Ok(y_next)
    }

    /// Finite-difference ∂f/∂y and ∂f/∂t at (t, y).
    fn derivatives<F>(
        &mut self,
        rhs: &mut F,
        t: f64,
        y: &[f64],
        f0: &[f64],
        scratch: &mut Scratch,
    ) -> Result<(DMatrix<f64>, DVector<f64>), StepOutcome>
    where
        F: FnMut(f64, &[f64], &mut [f64]) -> Result<(), SimError>,
    {
        let dim = y.len();
        let sqrt_eps = f64::EPSILON.sqrt();

        let mut jac = DMatrix::zeros(dim, dim);
        scratch.y_stage.copy_from_slice(y);
        for j in 0..dim {
            let dy = sqrt_eps * y[j].abs().max(1.0);
            scratch.y_stage[j] = y[j] + dy;
            match self.eval_rhs_trial(rhs, t, &scratch.y_stage, &mut scratch.f_stage) {
                Ok(()) => {}
                Err(reject) => return Err(reject),
            }
            for i in 0..dim {
                jac[(i, j)] = (scratch.f_stage[i] - f0[i]) / dy;
            }
            scratch.y_stage[j] = y[j];
        }
        self.stats.jacobian_evaluations += 1;

        let dt = sqrt_eps * t.abs().max(1.0);
        match self.eval_rhs_trial(rhs, t + dt, y, &mut scratch.f_stage) {
            Ok(()) => {}
            Err(reject) => return Err(reject),
        }
        let mut f_t = DVector::zeros(dim);
        for i in 0..dim {
            f_t[i] = (scratch.f_stage[i] - f0[i]) / dt;
        }

        Ok((jac, f_t))
    }

    /// RHS evaluation whose failure is fatal (initial point, accepted states).
    fn eval_rhs<F>(
        &mut self,
        rhs: &mut F,
        t: f64,
        y: &[f64],
        out: &mut [f64],
    ) -> Result<(), SimError>
    where
        F: FnMut(f64, &[f64], &mut [f64]) -> Result<(), SimError>,
    {
        self.stats.rhs_evaluations += 1;
        rhs(t, y, out)
    }

    /// RHS evaluation inside a trial step: geometry failures become step
    /// rejections instead of aborting the solve.
    fn eval_rhs_trial<F>(
        &mut self,
        rhs: &mut F,
        t: f64,
        y: &[f64],
        out: &mut [f64],
    ) -> Result<(), StepOutcome>
    where
        F: FnMut(f64, &[f64], &mut [f64]) -> Result<(), SimError>,
    {
        self.stats.rhs_evaluations += 1;
        rhs(t, y, out).map_err(StepOutcome::Degenerate)
    }
}

/// Result of one adaptive step attempt
enum StepOutcome {
    Accepted { y_new: Vec<f64>, error_norm: f64 },
    Rejected { error_norm: f64 },
    Degenerate(SimError),
}

/// Reused per-solve buffers
struct Scratch {
    y_stage: Vec<f64>,
    f_stage: Vec<f64>,
}

impl Scratch {
    fn new(dim: usize) -> Self {
        Self {
            y_stage: vec![0.0; dim],
            f_stage: vec![0.0; dim],
        }
    }
}

/// Cubic Hermite interpolation of the state at `ts` within an accepted
/// step [t0, t0 + h].
fn hermite(
    t0: f64,
    h: f64,
    y0: &[f64],
    f0: &[f64],
    y1: &[f64],
    f1: &[f64],
    ts: f64,
) -> Vec<f64> {
    let theta = ((ts - t0) / h).clamp(0.0, 1.0);
    let t2 = theta * theta;
    let t3 = t2 * theta;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + theta;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    (0..y0.len())
        .map(|i| h00 * y0[i] + h10 * h * f0[i] + h01 * y1[i] + h11 * h * f1[i])
        .collect()
}
