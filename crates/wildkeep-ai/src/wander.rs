//! Wander waypoint planning.
//!
//! Waypoints are rolled around the actor's current position, pulled back
//! toward spawn when they stray past the outward limit, and rejected unless
//! the straight path to them stays inside the actor's containment.

use glam::{Quat, Vec3};
use std::f32::consts::TAU;
use tracing::trace;
use wildkeep_common::{planar, planar_direction};

use crate::boundary::Containment;
use crate::config::{ActorProfile, BehaviorTuning};

/// Phase of the wait/face/move wander cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WanderPhase {
    /// Standing still until the timer runs out
    Waiting {
        /// Seconds left to wait
        remaining: f32,
    },
    /// Turning toward a fresh waypoint over a fixed window
    Facing {
        /// Destination
        waypoint: Vec3,
        /// Orientation when the turn started
        from: Quat,
        /// Seconds spent turning
        elapsed: f32,
    },
    /// Walking to the waypoint
    Moving {
        /// Destination
        waypoint: Vec3,
    },
}

impl Default for WanderPhase {
    fn default() -> Self {
        Self::Waiting { remaining: 0.0 }
    }
}

/// Pending boundary redirect: pause, then head inward along `heading`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redirect {
    /// Unit heading to leave along
    pub heading: Vec3,
    /// Seconds spent paused
    pub elapsed: f32,
}

/// Generates and validates wander waypoints for one actor.
#[derive(Debug, Clone, Copy)]
pub struct WanderPlanner<'a> {
    profile: &'a ActorProfile,
    tuning: &'a BehaviorTuning,
}

impl<'a> WanderPlanner<'a> {
    /// Creates a planner for an actor's profile.
    #[must_use]
    pub const fn new(profile: &'a ActorProfile, tuning: &'a BehaviorTuning) -> Self {
        Self { profile, tuning }
    }

    /// Random leg length within the profile's wander distances.
    fn leg_length(&self, rng: &mut fastrand::Rng) -> f32 {
        let min = self.profile.min_wander_distance;
        let max = self.profile.max_wander_distance.max(min);
        min + rng.f32() * (max - min)
    }

    /// Random wait between wander legs.
    pub fn wait_time(&self, rng: &mut fastrand::Rng) -> f32 {
        let min = self.profile.min_wait_time;
        let max = self.profile.max_wait_time.max(min);
        min + rng.f32() * (max - min)
    }

    /// Rolls an unvalidated candidate around `origin`.
    pub fn candidate(&self, origin: Vec3, spawn: Vec3, rng: &mut fastrand::Rng) -> Vec3 {
        let angle = rng.f32() * TAU;
        let heading = Vec3::new(angle.sin(), 0.0, angle.cos());
        let raw = origin + heading * self.leg_length(rng);
        self.rein_in(spawn, raw)
    }

    /// Pulls a candidate that strayed past the outward limit back toward spawn.
    ///
    /// Candidates further than `outward_limit_fraction` of the wander radius
    /// are moved onto the ray from spawn through the candidate, at
    /// `reproject_fraction` of the radius.
    #[must_use]
    pub fn rein_in(&self, spawn: Vec3, candidate: Vec3) -> Vec3 {
        let Some(radius) = self.profile.wander_radius else {
            return candidate;
        };
        let offset = planar(candidate - spawn);
        let dist = offset.length();
        if dist <= radius * self.tuning.outward_limit_fraction {
            return candidate;
        }
        let flat = planar(spawn) + offset / dist * (radius * self.tuning.reproject_fraction);
        Vec3::new(flat.x, candidate.y, flat.z)
    }

    /// Whether the actor may walk straight from `from` to `point`.
    #[must_use]
    pub fn is_waypoint_valid(&self, containment: &Containment<'_>, from: Vec3, point: Vec3) -> bool {
        containment.path_clear(from, point, self.tuning.path_sample_step)
    }

    /// Rolls waypoints until one validates, up to the retry limit.
    ///
    /// `None` means the actor should stay put for another wait cycle.
    pub fn next_waypoint(
        &self,
        origin: Vec3,
        spawn: Vec3,
        containment: &Containment<'_>,
        rng: &mut fastrand::Rng,
    ) -> Option<Vec3> {
        for attempt in 0..self.tuning.waypoint_retry_limit {
            let candidate = self.candidate(origin, spawn, rng);
            if self.is_waypoint_valid(containment, origin, candidate) {
                return Some(candidate);
            }
            trace!(attempt, "Rejected wander waypoint {candidate:?}");
        }
        None
    }

    /// Picks a waypoint along `heading`, shortening the leg until it validates.
    pub fn waypoint_along(
        &self,
        origin: Vec3,
        spawn: Vec3,
        heading: Vec3,
        containment: &Containment<'_>,
        rng: &mut fastrand::Rng,
    ) -> Option<Vec3> {
        let heading = planar_direction(Vec3::ZERO, heading)?;
        let mut length = self.leg_length(rng);
        for _ in 0..self.tuning.waypoint_retry_limit {
            let candidate = self.rein_in(spawn, origin + heading * length);
            if self.is_waypoint_valid(containment, origin, candidate) {
                return Some(candidate);
            }
            length *= 0.5;
            if length < self.tuning.waypoint_reached_distance {
                break;
            }
        }
        None
    }
}
