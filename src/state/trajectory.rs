//! Sampled trajectory of the tether chain.
//!
//! The solve produces samples at a fixed cadence, each holding the full
//! node state (anchor included). This is the complete output surface of
//! the core; renderers and exporters consume it from here.

use glam::DVec3;

/// One output sample: simulation time plus the state of every node.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    /// Simulation time (s)
    pub time_sec: f64,
    /// Node positions (m), anchor first
    pub positions_m: Vec<DVec3>,
    /// Node velocities (m/s), anchor first
    pub velocities_m_per_sec: Vec<DVec3>,
}

impl TrajectorySample {
    /// Number of nodes, anchor included
    pub fn node_count(&self) -> usize {
        self.positions_m.len()
    }

    /// Position of the free end (node n)
    pub fn free_end(&self) -> DVec3 {
        *self.positions_m.last().expect("sample has at least 2 nodes")
    }

    /// Instantaneous length of every segment (m)
    pub fn segment_lengths_m(&self) -> Vec<f64> {
        (1..self.node_count())
            .map(|i| (self.positions_m[i - 1] - self.positions_m[i]).length())
            .collect()
    }
}

/// Ordered, fixed-cadence time series of [`TrajectorySample`]s.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    /// Samples in increasing time order
    pub samples: Vec<TrajectorySample>,
}

impl Trajectory {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the trajectory holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time of the last sample (s), 0 if empty
    pub fn duration_sec(&self) -> f64 {
        self.samples.last().map(|s| s.time_sec).unwrap_or(0.0)
    }

    /// Number of nodes per sample, anchor included
    pub fn node_count(&self) -> usize {
        self.samples.first().map(|s| s.node_count()).unwrap_or(0)
    }

    /// Iterate over the samples
    pub fn iter(&self) -> std::slice::Iter<'_, TrajectorySample> {
        self.samples.iter()
    }

    /// Free-end position over time, as (t, position) pairs
    pub fn free_end_series(&self) -> Vec<(f64, DVec3)> {
        self.samples
            .iter()
            .map(|s| (s.time_sec, s.free_end()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, z: f64) -> TrajectorySample {
        TrajectorySample {
            time_sec: t,
            positions_m: vec![DVec3::ZERO, DVec3::new(0.0, 0.0, z)],
            velocities_m_per_sec: vec![DVec3::ZERO; 2],
        }
    }

    #[test]
    fn test_accessors() {
        let traj = Trajectory {
            samples: vec![sample(0.0, -10.0), sample(0.02, -10.1)],
        };

        assert_eq!(traj.len(), 2);
        assert_eq!(traj.node_count(), 2);
        assert_eq!(traj.duration_sec(), 0.02);
        assert_eq!(traj.samples[1].free_end().z, -10.1);
        assert_eq!(traj.samples[0].segment_lengths_m(), vec![10.0]);
    }

    #[test]
    fn test_empty_trajectory() {
        let traj = Trajectory::default();
        assert!(traj.is_empty());
        assert_eq!(traj.duration_sec(), 0.0);
        assert_eq!(traj.node_count(), 0);
    }
}
