//! Reel-out schedule: time-varying tether length and the per-segment
//! material parameters derived from it.
//!
//! The winch pays the tether out (or hauls it in) at a constant speed, so
//! the total unstretched length is L(t) = l0 + v_ro·t. The discretization
//! keeps n segments throughout; what changes is each segment's rest
//! length L/n, and with it the segment spring constant, damping and node
//! mass. Stiffness scales inversely with rest length, so the series
//! stiffness of the whole tether is preserved no matter how it is cut up:
//! c_segment · (L/n) = c_spring for all t.
//!
//! Everything here is a pure function of simulation time. The adaptive
//! solver evaluates the right-hand side at rejected and retried times, so
//! nothing may depend on evaluation order or count.

use crate::config::TetherParameters;

/// Material parameters of one segment (and its node) at a given time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProperties {
    /// Total unstretched tether length L(t) (m)
    pub total_length_m: f64,
    /// Rest length of one segment, L(t)/n (m)
    pub rest_length_m: f64,
    /// Spring constant of one segment (N/m)
    pub spring_constant_N_per_m: f64,
    /// Damping coefficient of one segment (N·s/m)
    pub damping_Ns_per_m: f64,
    /// Mass lumped at each free node (kg)
    pub node_mass_kg: f64,
}

/// The reel-out law and the fixed material constants it redistributes.
#[derive(Debug, Clone)]
pub struct ReelSchedule {
    /// Initial unstretched length (m)
    l0_m: f64,
    /// Reel-out speed (m/s), negative for reel-in
    v_ro_m_per_sec: f64,
    /// Segment count n
    segments: usize,
    /// Unit spring constant (N)
    c_spring_N: f64,
    /// Unit damping constant (N·s)
    damping_Ns: f64,
    /// Tether linear mass density (kg/m)
    linear_density_kg_per_m: f64,
}

impl ReelSchedule {
    /// Build the schedule from tether parameters.
    pub fn new(params: &TetherParameters) -> Self {
        Self {
            l0_m: params.l0_m,
            v_ro_m_per_sec: params.v_ro_m_per_sec,
            segments: params.segments,
            c_spring_N: params.c_spring_N,
            damping_Ns: params.damping_Ns,
            linear_density_kg_per_m: params.linear_density_kg_per_m(),
        }
    }

    /// Segment count n
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Total unstretched tether length L(t) = l0 + v_ro·t (m)
    pub fn total_length_m(&self, time_sec: f64) -> f64 {
        self.l0_m + self.v_ro_m_per_sec * time_sec
    }

    /// Per-segment material parameters at time t.
    pub fn at(&self, time_sec: f64) -> SegmentProperties {
        let total_length_m = self.total_length_m(time_sec);
        let rest_length_m = total_length_m / self.segments as f64;

        SegmentProperties {
            total_length_m,
            rest_length_m,
            spring_constant_N_per_m: self.c_spring_N / rest_length_m,
            damping_Ns_per_m: self.damping_Ns / rest_length_m,
            node_mass_kg: self.linear_density_kg_per_m * rest_length_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_params() -> TetherParameters {
        TetherParameters {
            l0_m: 50.0,
            v_ro_m_per_sec: 2.0,
            segments: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_reel_out_length() {
        let schedule = ReelSchedule::new(&test_params());

        assert_relative_eq!(schedule.total_length_m(0.0), 50.0);
        assert_relative_eq!(schedule.total_length_m(10.0), 70.0);
        assert_relative_eq!(schedule.at(10.0).rest_length_m, 14.0);
    }

    #[test]
    fn test_reel_in_length() {
        let mut params = test_params();
        params.v_ro_m_per_sec = -1.0;
        let schedule = ReelSchedule::new(&params);

        assert_relative_eq!(schedule.total_length_m(10.0), 40.0);
    }

    #[test]
    fn test_series_stiffness_preserved() {
        let params = test_params();
        let schedule = ReelSchedule::new(&params);

        // c_segment · rest_length == unit spring constant, at any time and
        // for any discretization.
        for t in [0.0, 1.0, 4.5, 10.0] {
            let props = schedule.at(t);
            assert_relative_eq!(
                props.spring_constant_N_per_m * props.rest_length_m,
                params.c_spring_N,
                max_relative = 1e-12
            );
            assert_relative_eq!(
                props.damping_Ns_per_m * props.rest_length_m,
                params.damping_Ns,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_mass_conservation_under_reeling() {
        let params = test_params();
        let schedule = ReelSchedule::new(&params);
        let rho_lin = params.linear_density_kg_per_m();

        // n node masses always add up to the mass of the paid-out tether.
        for t in [0.0, 2.5, 7.0, 10.0] {
            let props = schedule.at(t);
            let total_mass = props.node_mass_kg * params.segments as f64;
            assert_relative_eq!(
                total_mass,
                rho_lin * schedule.total_length_m(t),
                max_relative = 1e-12
            );
        }
    }
}
