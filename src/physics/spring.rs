//! One-sided spring-damper force law for the tether segments.
//!
//! Each segment behaves as a linear spring in tension only: a tether can
//! pull but never push, so the elastic coefficient switches to zero the
//! moment a segment goes slack. The switch is a hard branch in the
//! right-hand side and is the main numerical difficulty of the model —
//! the integrator has to absorb a discontinuous Jacobian there. Damping
//! is NOT gated: the material dissipates in both the taut and the slack
//! regime, only the elastic restoring force is one-sided.
//!
//! Per segment i (nodes i-1 and i):
//!
//! u = (x[i-1] - x[i]) / ‖x[i-1] - x[i]‖      (points inboard, toward the anchor)
//! v_s = -u · (v[i] - v[i-1])                  (> 0 while the segment stretches)
//! F_i = (k·max(ε, 0) + c·v_s) · u             with ε = length - rest length
//!
//! F_i is the force pulling node i toward node i-1; node i-1 receives -F_i
//! through the accumulation pass (interior nodes see the difference of
//! their two adjacent segment forces).

use glam::DVec3;

use super::reel::SegmentProperties;
use crate::error::SimError;

/// Computes per-node accelerations from the chain state and the current
/// segment material parameters.
#[derive(Debug, Clone)]
pub struct SpringForceModel {
    /// Gravity vector (m/s²)
    pub gravity_m_per_s2: DVec3,
}

impl SpringForceModel {
    /// Create a force model under the given gravity.
    pub fn new(gravity_m_per_s2: DVec3) -> Self {
        Self { gravity_m_per_s2 }
    }

    /// Elastic tension (N) of a segment with the given extension.
    ///
    /// Zero at and below the rest length, k·extension above it:
    /// continuous, non-negative, strictly increasing for positive
    /// extension.
    pub fn tension_N(extension_m: f64, spring_constant_N_per_m: f64) -> f64 {
        if extension_m > 0.0 {
            spring_constant_N_per_m * extension_m
        } else {
            0.0
        }
    }

    /// Accelerations of every node at time `time_sec`.
    ///
    /// `positions`/`velocities`/`acc_out` hold all n+1 nodes, anchor
    /// first. The anchor's acceleration is identically zero; it is a
    /// boundary value, not a dynamic particle. Free nodes get gravity
    /// plus the net segment force over the node mass.
    ///
    /// Pure function of its inputs; no state survives between calls.
    pub fn accelerations(
        &self,
        time_sec: f64,
        positions: &[DVec3],
        velocities: &[DVec3],
        props: &SegmentProperties,
        acc_out: &mut [DVec3],
    ) -> Result<(), SimError> {
        let n = positions.len() - 1;
        debug_assert_eq!(velocities.len(), n + 1);
        debug_assert_eq!(acc_out.len(), n + 1);

        acc_out[0] = DVec3::ZERO;

        // Walk inboard from the free end so each node sees the force of
        // its outboard segment without a per-segment buffer.
        let mut outboard_force = DVec3::ZERO;
        for i in (1..=n).rev() {
            let displacement = positions[i - 1] - positions[i];
            let length_m = displacement.length();
            if !(length_m > 0.0) || !length_m.is_finite() {
                return Err(SimError::DegenerateGeometry {
                    segment: i,
                    time_sec,
                });
            }

            let unit = displacement / length_m;
            let relative_velocity = velocities[i] - velocities[i - 1];
            let spring_velocity = -unit.dot(relative_velocity);

            let extension_m = length_m - props.rest_length_m;
            let tension = Self::tension_N(extension_m, props.spring_constant_N_per_m);
            let segment_force = (tension + props.damping_Ns_per_m * spring_velocity) * unit;

            let net_force = segment_force - outboard_force;
            acc_out[i] = self.gravity_m_per_s2 + net_force / props.node_mass_kg;

            outboard_force = segment_force;
        }

        Ok(())
    }

    /// Elastic tension of every segment (N), 1-based index shifted to 0.
    ///
    /// Diagnostic helper; assumes non-degenerate geometry.
    pub fn segment_tensions_N(positions: &[DVec3], props: &SegmentProperties) -> Vec<f64> {
        let n = positions.len() - 1;
        (1..=n)
            .map(|i| {
                let length_m = (positions[i - 1] - positions[i]).length();
                Self::tension_N(length_m - props.rest_length_m, props.spring_constant_N_per_m)
            })
            .collect()
    }

    /// Elastic energy stored in the taut segments (J): Σ ½·k·ε² over
    /// segments with positive extension.
    pub fn elastic_energy_J(positions: &[DVec3], props: &SegmentProperties) -> f64 {
        let n = positions.len() - 1;
        (1..=n)
            .map(|i| {
                let length_m = (positions[i - 1] - positions[i]).length();
                let extension_m = length_m - props.rest_length_m;
                if extension_m > 0.0 {
                    0.5 * props.spring_constant_N_per_m * extension_m * extension_m
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// Kinetic energy of the free nodes (J).
    pub fn kinetic_energy_J(velocities: &[DVec3], props: &SegmentProperties) -> f64 {
        velocities
            .iter()
            .skip(1)
            .map(|v| 0.5 * props.node_mass_kg * v.length_squared())
            .sum()
    }

    /// Gravitational potential energy of the free nodes (J), relative to
    /// the anchor plane: Σ -m·g·x.
    pub fn potential_energy_J(&self, positions: &[DVec3], props: &SegmentProperties) -> f64 {
        positions
            .iter()
            .skip(1)
            .map(|x| -props.node_mass_kg * self.gravity_m_per_s2.dot(*x))
            .sum()
    }

    /// Tension-vs-extension curve for validation.
    ///
    /// Returns (extension_m, tension_N) pairs over the given extension
    /// range, slack region included.
    pub fn tension_curve(
        spring_constant_N_per_m: f64,
        min_extension_m: f64,
        max_extension_m: f64,
        n_points: usize,
    ) -> Vec<(f64, f64)> {
        let mut curve = Vec::with_capacity(n_points);
        for i in 0..n_points {
            let frac = i as f64 / (n_points - 1) as f64;
            let extension = min_extension_m + frac * (max_extension_m - min_extension_m);
            curve.push((extension, Self::tension_N(extension, spring_constant_N_per_m)));
        }
        curve
    }
}
