//! Discretized tether chain: n+1 point masses joined by n segments.
//!
//! Node 0 is the winch-side anchor, fixed at the origin for all time.
//! Nodes 1..n are free; only they enter the integrated state. The chain
//! starts straight and at rest: node i sits at fractional distance i/n
//! along the line from the origin to l0 · (sin α, 0, cos α), in the
//! vertical x–z plane (z-up).

use glam::DVec3;

use crate::error::SimError;

/// Positions and velocities of every node in the chain, anchor included.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainState {
    /// Node positions (m), index 0 is the anchor
    pub positions_m: Vec<DVec3>,
    /// Node velocities (m/s), index 0 is the anchor
    pub velocities_m_per_sec: Vec<DVec3>,
}

impl ChainState {
    /// Lay out a straight chain of `segments` segments along the initial
    /// elevation angle, tether at rest.
    ///
    /// Fails if `segments < 1` or `l0_m <= 0`.
    pub fn along_elevation(
        l0_m: f64,
        elevation_rad: f64,
        segments: usize,
    ) -> Result<Self, SimError> {
        if segments < 1 {
            return Err(SimError::invalid_parameter(
                "segments",
                format!("must be at least 1, got {}", segments),
            ));
        }
        if !(l0_m > 0.0) {
            return Err(SimError::invalid_parameter(
                "l0_m",
                format!("must be positive, got {}", l0_m),
            ));
        }

        let end = l0_m * DVec3::new(elevation_rad.sin(), 0.0, elevation_rad.cos());

        let mut positions_m = Vec::with_capacity(segments + 1);
        for i in 0..=segments {
            let frac = i as f64 / segments as f64;
            positions_m.push(end * frac);
        }

        Ok(Self {
            velocities_m_per_sec: vec![DVec3::ZERO; segments + 1],
            positions_m,
        })
    }

    /// Number of nodes, anchor included
    pub fn node_count(&self) -> usize {
        self.positions_m.len()
    }

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.positions_m.len() - 1
    }

    /// Anchor position (node 0)
    pub fn anchor(&self) -> DVec3 {
        self.positions_m[0]
    }

    /// Free-end position (node n)
    pub fn free_end(&self) -> DVec3 {
        *self.positions_m.last().expect("chain has at least 2 nodes")
    }

    /// Displacement vector of segment `i` (1-based): pos[i-1] - pos[i]
    pub fn segment_vector(&self, segment: usize) -> DVec3 {
        self.positions_m[segment - 1] - self.positions_m[segment]
    }

    /// Instantaneous length of every segment (1-based index shifted to 0)
    pub fn segment_lengths_m(&self) -> Vec<f64> {
        (1..=self.segment_count())
            .map(|i| self.segment_vector(i).length())
            .collect()
    }

    /// Unit vector of segment `i` (1-based), pointing from node i toward
    /// node i-1
    pub fn segment_unit_vector(&self, segment: usize) -> DVec3 {
        self.segment_vector(segment).normalize()
    }

    /// Length of the flat integration state for a chain with `segments`
    /// segments: 3 position + 3 velocity components per free node.
    pub fn state_dimension(segments: usize) -> usize {
        6 * segments
    }

    /// Pack the free-node state into `y` as [x₁..xₙ | v₁..vₙ].
    ///
    /// The anchor is a boundary value, not integrated state, so it is
    /// excluded.
    pub fn pack_free(&self, y: &mut [f64]) {
        let n = self.segment_count();
        debug_assert_eq!(y.len(), Self::state_dimension(n));

        for i in 1..=n {
            let base = 3 * (i - 1);
            y[base..base + 3].copy_from_slice(&self.positions_m[i].to_array());
            let vbase = 3 * n + 3 * (i - 1);
            y[vbase..vbase + 3].copy_from_slice(&self.velocities_m_per_sec[i].to_array());
        }
    }

    /// Overwrite the free-node state from a flat vector produced by
    /// [`ChainState::pack_free`]. The anchor entry is left untouched.
    pub fn unpack_free(&mut self, y: &[f64]) {
        let n = self.segment_count();
        debug_assert_eq!(y.len(), Self::state_dimension(n));

        for i in 1..=n {
            let base = 3 * (i - 1);
            self.positions_m[i] = DVec3::new(y[base], y[base + 1], y[base + 2]);
            let vbase = 3 * n + 3 * (i - 1);
            self.velocities_m_per_sec[i] = DVec3::new(y[vbase], y[vbase + 1], y[vbase + 2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_straight_layout() {
        let chain = ChainState::along_elevation(50.0, PI / 10.0, 5).unwrap();

        assert_eq!(chain.node_count(), 6);
        assert_eq!(chain.segment_count(), 5);
        assert_relative_eq!(chain.anchor().length(), 0.0, epsilon = 1e-12);

        // Free end at l0 · (sin α, 0, cos α)
        let end = chain.free_end();
        assert_relative_eq!(end.x, 50.0 * (PI / 10.0).sin(), epsilon = 1e-12);
        assert_relative_eq!(end.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(end.z, 50.0 * (PI / 10.0).cos(), epsilon = 1e-12);

        // Equal spacing
        for len in chain.segment_lengths_m() {
            assert_relative_eq!(len, 10.0, epsilon = 1e-9);
        }

        // At rest
        for vel in &chain.velocities_m_per_sec {
            assert_eq!(*vel, DVec3::ZERO);
        }
    }

    #[test]
    fn test_unit_vectors_point_inboard() {
        let chain = ChainState::along_elevation(10.0, 0.0, 2).unwrap();

        // Straight up: every segment unit vector points back down toward
        // the anchor.
        for i in 1..=2 {
            let u = chain.segment_unit_vector(i);
            assert_relative_eq!(u.z, -1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        assert!(ChainState::along_elevation(50.0, 0.0, 0).is_err());
        assert!(ChainState::along_elevation(0.0, 0.0, 5).is_err());
        assert!(ChainState::along_elevation(-1.0, 0.0, 5).is_err());
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let mut chain = ChainState::along_elevation(50.0, PI / 4.0, 3).unwrap();
        chain.velocities_m_per_sec[2] = DVec3::new(0.5, -0.25, 1.0);

        let mut y = vec![0.0; ChainState::state_dimension(3)];
        chain.pack_free(&mut y);

        let mut restored = ChainState::along_elevation(50.0, PI / 4.0, 3).unwrap();
        restored.unpack_free(&y);

        assert_eq!(chain, restored);
    }
}
