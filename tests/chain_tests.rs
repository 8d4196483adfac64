//! Validation tests for the chain topology, reel schedule and force law.
//!
//! Properties checked here are the static invariants of the model:
//! - initial layout geometry (straight line, equal spacing, at rest)
//! - one-sided tension (zero at/below rest length, monotonic above)
//! - series-stiffness preservation under any discretization
//! - mass conservation while reeling

use std::f64::consts::PI;

use glam::DVec3;
use tether_sim::{
    ChainState, Parameters, ReelSchedule, SpringForceModel, TetherParameters, TetherSolver,
};

fn test_tether_params(segments: usize) -> TetherParameters {
    TetherParameters {
        l0_m: 50.0,
        v_ro_m_per_sec: 2.0,
        segments,
        elevation_rad: PI / 10.0,
        ..Default::default()
    }
}

// ============================================================================
// Topology / initial state
// ============================================================================

#[test]
fn test_initial_layout_is_straight_and_at_rest() {
    let chain = ChainState::along_elevation(50.0, PI / 10.0, 5).unwrap();

    assert_eq!(chain.node_count(), 6);
    assert_eq!(chain.anchor(), DVec3::ZERO);

    // Nodes sit at fractional distances i/n along the initial line.
    let end = chain.free_end();
    for (i, pos) in chain.positions_m.iter().enumerate() {
        let expected = end * (i as f64 / 5.0);
        assert!(
            (*pos - expected).length() < 1e-9,
            "node {} at {:?}, expected {:?}",
            i,
            pos,
            expected
        );
    }

    // Equal spacing at the segment rest length, zero velocity everywhere.
    for length in chain.segment_lengths_m() {
        assert!((length - 10.0).abs() < 1e-9);
    }
    for vel in &chain.velocities_m_per_sec {
        assert_eq!(*vel, DVec3::ZERO);
    }
}

#[test]
fn test_configuration_errors_are_detected_before_solving() {
    // Zero segments
    assert!(ChainState::along_elevation(50.0, 0.0, 0).is_err());
    // Non-positive length
    assert!(ChainState::along_elevation(0.0, 0.0, 5).is_err());

    // Solver-level validation covers the rest.
    let mut params = Parameters::default();
    params.simulation.duration_sec = -1.0;
    assert!(TetherSolver::new(&params).is_err());

    let mut params = Parameters::default();
    params.simulation.sample_interval_sec = 0.0;
    assert!(TetherSolver::new(&params).is_err());
}

// ============================================================================
// Reel schedule
// ============================================================================

#[test]
fn test_total_length_follows_reel_speed() {
    let schedule = ReelSchedule::new(&test_tether_params(5));

    assert!((schedule.total_length_m(0.0) - 50.0).abs() < 1e-12);
    assert!((schedule.total_length_m(10.0) - 70.0).abs() < 1e-12);
    assert!((schedule.at(10.0).rest_length_m - 14.0).abs() < 1e-12);
}

#[test]
fn test_series_stiffness_independent_of_discretization() {
    // Cutting the same tether into more segments must not change its
    // end-to-end stiffness: c_segment · rest_length == c_spring always.
    for segments in [1, 2, 5, 10, 50] {
        let params = test_tether_params(segments);
        let schedule = ReelSchedule::new(&params);
        for t in [0.0, 3.3, 10.0] {
            let props = schedule.at(t);
            let unit_stiffness = props.spring_constant_N_per_m * props.rest_length_m;
            assert!(
                (unit_stiffness - params.c_spring_N).abs() < 1e-6,
                "n={} t={}: unit stiffness {} != {}",
                segments,
                t,
                unit_stiffness,
                params.c_spring_N
            );
        }
    }
}

#[test]
fn test_mass_conservation_under_reeling() {
    let params = test_tether_params(5);
    let schedule = ReelSchedule::new(&params);
    let rho_lin = params.linear_density_kg_per_m();

    for t in [0.0, 1.0, 5.0, 10.0] {
        let props = schedule.at(t);
        let discretized = props.node_mass_kg * 5.0;
        let continuum = rho_lin * schedule.total_length_m(t);
        assert!(
            (discretized - continuum).abs() < 1e-12 * continuum.max(1.0),
            "t={}: {} kg discretized vs {} kg continuum",
            t,
            discretized,
            continuum
        );
    }
}

// ============================================================================
// Force law
// ============================================================================

#[test]
fn test_tension_is_one_sided() {
    let curve = SpringForceModel::tension_curve(61_460.0, -1.0, 1.0, 201);

    for (extension, tension) in &curve {
        if *extension <= 0.0 {
            assert_eq!(*tension, 0.0, "slack segment must carry zero tension");
        } else {
            assert!(*tension > 0.0, "taut segment must carry tension");
        }
    }
}

#[test]
fn test_tension_continuous_and_strictly_increasing() {
    let k = 61_460.0;

    // No jump at the switch.
    assert!(SpringForceModel::tension_N(1e-12, k) < 1e-6);

    // Strictly increasing for positive extension.
    let mut prev = 0.0;
    for i in 1..=100 {
        let extension = i as f64 * 1e-3;
        let tension = SpringForceModel::tension_N(extension, k);
        assert!(
            tension > prev,
            "tension must increase with extension: {} !> {} at ε={}",
            tension,
            prev,
            extension
        );
        prev = tension;
    }
}
