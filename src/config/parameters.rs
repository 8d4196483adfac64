//! Parameter structures with citation metadata.
//!
//! Physical defaults describe a 4 mm braided Dyneema kite-power tether;
//! each carries its source citation.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

use crate::error::SimError;

/// Top-level parameters container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    /// Tether material and geometry parameters
    pub tether: TetherParameters,
    /// Solve horizon, output cadence and integrator settings
    pub simulation: SimulationParameters,
}

impl Parameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        let tether = TetherParameters::load_or_default("data/parameters/tether.json");
        let simulation = SimulationParameters::load_or_default("data/parameters/simulation.json");

        Self { tether, simulation }
    }

    /// Load parameters from specific directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let tether = TetherParameters::load_or_default(dir.join("tether.json"));
        let simulation = SimulationParameters::load_or_default(dir.join("simulation.json"));

        Self { tether, simulation }
    }

    /// Check every value a solve depends on, before any solving starts.
    ///
    /// Includes the reel schedule: the total length l0 + v_ro·t must stay
    /// positive over the whole horizon, so reel-in that would consume the
    /// tether is rejected here rather than mid-solve.
    pub fn validate(&self) -> Result<(), SimError> {
        let t = &self.tether;
        let s = &self.simulation;

        if t.segments < 1 {
            return Err(SimError::invalid_parameter(
                "segments",
                format!("must be at least 1, got {}", t.segments),
            ));
        }
        if !(t.l0_m > 0.0) {
            return Err(SimError::invalid_parameter(
                "l0_m",
                format!("must be positive, got {}", t.l0_m),
            ));
        }
        if !(t.d_tether_mm > 0.0) {
            return Err(SimError::invalid_parameter(
                "d_tether_mm",
                format!("must be positive, got {}", t.d_tether_mm),
            ));
        }
        if !(t.rho_tether_kg_per_m3 > 0.0) {
            return Err(SimError::invalid_parameter(
                "rho_tether_kg_per_m3",
                format!("must be positive, got {}", t.rho_tether_kg_per_m3),
            ));
        }
        if !(t.c_spring_N > 0.0) {
            return Err(SimError::invalid_parameter(
                "c_spring_N",
                format!("must be positive, got {}", t.c_spring_N),
            ));
        }
        if t.damping_Ns < 0.0 {
            return Err(SimError::invalid_parameter(
                "damping_Ns",
                format!("must be non-negative, got {}", t.damping_Ns),
            ));
        }
        if !(s.duration_sec > 0.0) {
            return Err(SimError::invalid_parameter(
                "duration_sec",
                format!("must be positive, got {}", s.duration_sec),
            ));
        }
        if !(s.sample_interval_sec > 0.0) {
            return Err(SimError::invalid_parameter(
                "sample_interval_sec",
                format!("must be positive, got {}", s.sample_interval_sec),
            ));
        }
        if !(s.abs_tolerance > 0.0) || !(s.rel_tolerance > 0.0) {
            return Err(SimError::invalid_parameter(
                "tolerances",
                format!(
                    "abs_tolerance and rel_tolerance must be positive, got {} / {}",
                    s.abs_tolerance, s.rel_tolerance
                ),
            ));
        }
        let final_length_m = t.l0_m + t.v_ro_m_per_sec * s.duration_sec;
        if final_length_m <= 0.0 {
            return Err(SimError::invalid_parameter(
                "v_ro_m_per_sec",
                format!(
                    "reel-in consumes the tether: l0 + v_ro * duration = {:.3} m",
                    final_length_m
                ),
            ));
        }
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            tether: TetherParameters::default(),
            simulation: SimulationParameters::default(),
        }
    }
}

/// Tether material and geometry parameters
///
/// Defaults describe the 4 mm Dyneema tether of a pumping kite power
/// system.
/// Reference: Fechner et al., Renewable Energy 2015
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TetherParameters {
    /// Initial unstretched tether length (m)
    pub l0_m: f64,

    /// Reel-out speed (m/s); negative values reel in
    /// Reference: nominal reel-out phase of a pumping cycle
    /// Source: Fechner et al., Renewable Energy 2015
    pub v_ro_m_per_sec: f64,

    /// Tether diameter (mm)
    /// Source: Fechner et al., Renewable Energy 2015
    pub d_tether_mm: f64,

    /// Tether material density (kg/m³)
    /// Reference: braided Dyneema including coating
    /// Source: Fechner et al., Renewable Energy 2015
    pub rho_tether_kg_per_m3: f64,

    /// Unit spring constant (N) — axial stiffness EA of the tether;
    /// a segment of rest length l has spring constant c_spring / l
    /// Source: Fechner et al., Renewable Energy 2015
    pub c_spring_N: f64,

    /// Unit damping constant (N·s); a segment of rest length l has
    /// damping coefficient damping / l
    /// Source: Fechner et al., Renewable Energy 2015
    pub damping_Ns: f64,

    /// Number of spring-damper segments in the discretized chain
    pub segments: usize,

    /// Initial elevation angle (rad), measured from the +z axis in the
    /// x–z plane; the straight initial tether runs from the origin to
    /// l0 · (sin α, 0, cos α)
    pub elevation_rad: f64,

    /// Gravity vector (m/s²), z-up convention
    pub gravity_m_per_s2: [f64; 3],
}

impl TetherParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded tether parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse tether parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Tether parameters file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Linear mass density of the tether (kg/m): π·(d/2)²·ρ
    pub fn linear_density_kg_per_m(&self) -> f64 {
        let radius_m = self.d_tether_mm * 1e-3 / 2.0;
        PI * radius_m * radius_m * self.rho_tether_kg_per_m3
    }

    /// Gravity as a vector
    pub fn gravity(&self) -> DVec3 {
        DVec3::from_array(self.gravity_m_per_s2)
    }
}

impl Default for TetherParameters {
    fn default() -> Self {
        Self {
            l0_m: 50.0,
            v_ro_m_per_sec: 2.0,

            // Fechner et al., Renewable Energy 2015
            d_tether_mm: 4.0,
            rho_tether_kg_per_m3: 724.0,
            c_spring_N: 614_600.0,
            damping_Ns: 473.0,

            // Discretization and initial layout
            segments: 5,
            elevation_rad: PI / 10.0,

            gravity_m_per_s2: [0.0, 0.0, -9.81],
        }
    }
}

/// Solve horizon, output cadence and integrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Total simulated duration (s)
    pub duration_sec: f64,

    /// Output sample cadence (s), independent of the internal adaptive step
    pub sample_interval_sec: f64,

    /// Absolute local-error tolerance per state component
    pub abs_tolerance: f64,

    /// Relative local-error tolerance
    pub rel_tolerance: f64,

    /// Initial internal step size (s)
    pub initial_step_sec: f64,

    /// Step-size floor (s); falling below it aborts the solve
    pub min_step_sec: f64,

    /// Internal step budget (accepted + rejected); the bounded-work
    /// cutoff in place of mid-solve cancellation
    pub max_steps: u64,
}

impl SimulationParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded simulation parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse simulation parameters: {}, using defaults",
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Simulation parameters file not found, using defaults");
                Self::default()
            }
        }
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            duration_sec: 10.0,
            sample_interval_sec: 0.02,
            abs_tolerance: 1e-6,
            rel_tolerance: 1e-6,
            initial_step_sec: 1e-4,
            min_step_sec: 1e-12,
            max_steps: 2_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tether_params() {
        let params = TetherParameters::default();
        assert!((params.c_spring_N - 614_600.0).abs() < 1.0);
        assert!((params.d_tether_mm - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_linear_density() {
        let params = TetherParameters::default();
        // π · (0.002 m)² · 724 kg/m³ ≈ 9.1e-3 kg/m
        let rho_lin = params.linear_density_kg_per_m();
        assert!((rho_lin - 9.098e-3).abs() < 1e-4, "got {}", rho_lin);
    }

    #[test]
    fn test_serialization() {
        let params = Parameters::default();
        let json = serde_json::to_string_pretty(&params).unwrap();
        let parsed: Parameters = serde_json::from_str(&json).unwrap();
        assert!((parsed.tether.l0_m - params.tether.l0_m).abs() < 1e-12);
        assert_eq!(parsed.tether.segments, params.tether.segments);
    }

    #[test]
    fn test_validation_rejects_bad_segments() {
        let mut params = Parameters::default();
        params.tether.segments = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_consuming_reel_in() {
        let mut params = Parameters::default();
        // 50 m are gone after 5 s of a 10 s solve
        params.tether.v_ro_m_per_sec = -10.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validation_accepts_defaults() {
        assert!(Parameters::default().validate().is_ok());
    }
}
