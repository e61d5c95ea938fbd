//! Per-tick movement with boundary checks.
//!
//! A [`Motor`] turns toward a destination and advances along the ground
//! plane. Every step is checked against the actor's [`Containment`] before it
//! is committed; a step that would leave the permitted area is reported as
//! blocked together with the nearest safe point, and the position is left
//! untouched.

use glam::{Quat, Vec3};
use wildkeep_common::{facing_error, planar_direction, planar_distance, turn_toward};

use crate::boundary::Containment;
use crate::config::ActorProfile;

/// Outcome of one locomotion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Already within the stopping distance; nothing moved
    Arrived,
    /// Turned in place, still too misaligned to advance
    Turning,
    /// Advanced this tick
    Moved,
    /// The step would have left the permitted area
    Blocked {
        /// Nearest permitted point to the rejected position
        safe_point: Option<Vec3>,
    },
}

impl Step {
    /// Whether the actor's position changed.
    #[must_use]
    pub const fn moved(&self) -> bool {
        matches!(self, Self::Moved)
    }
}

/// Position, orientation and movement stats of one actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motor {
    /// Current position
    pub position: Vec3,
    /// Current orientation
    pub rotation: Quat,
    move_speed: f32,
    rotation_speed: f32,
    turn_before_move: bool,
    alignment_threshold: f32,
}

impl Motor {
    /// Creates a motor from a profile.
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat, profile: &ActorProfile) -> Self {
        Self {
            position,
            rotation,
            move_speed: profile.move_speed,
            rotation_speed: profile.rotation_speed,
            turn_before_move: profile.turn_before_move,
            alignment_threshold: profile.alignment_threshold_deg.to_radians(),
        }
    }

    /// Turns toward a horizontal direction at the motor's turn rate.
    pub fn face(&mut self, direction: Vec3, dt: f32) {
        self.rotation = turn_toward(self.rotation, direction, self.rotation_speed, dt);
    }

    /// Turns toward a point.
    pub fn face_point(&mut self, point: Vec3, dt: f32) {
        if let Some(dir) = planar_direction(self.position, point) {
            self.face(dir, dt);
        }
    }

    /// Turns toward `destination` and advances until within `stop_distance`.
    pub fn advance(
        &mut self,
        destination: Vec3,
        dt: f32,
        stop_distance: f32,
        containment: &Containment<'_>,
    ) -> Step {
        let dist = planar_distance(self.position, destination);
        let Some(dir) = planar_direction(self.position, destination) else {
            return Step::Arrived;
        };
        if dist <= stop_distance {
            return Step::Arrived;
        }

        self.face(dir, dt);
        if self.turn_before_move && facing_error(self.rotation, dir) > self.alignment_threshold {
            return Step::Turning;
        }

        let travel = (self.move_speed * dt).min(dist - stop_distance);
        let intended = self.position + dir * travel;
        self.commit(intended, containment)
    }

    /// Steps straight toward a safe point after a blocked move.
    ///
    /// An actor that is already outside its area may always move, so that it
    /// can work its way back in.
    pub fn step_toward_safety(
        &mut self,
        safe_point: Vec3,
        dt: f32,
        containment: &Containment<'_>,
    ) -> Step {
        let dist = planar_distance(self.position, safe_point);
        let Some(dir) = planar_direction(self.position, safe_point) else {
            return Step::Arrived;
        };
        self.face(dir, dt);
        let intended = self.position + dir * (self.move_speed * dt).min(dist);
        if !containment.contains(self.position) {
            self.position = intended;
            return Step::Moved;
        }
        self.commit(intended, containment)
    }

    fn commit(&mut self, intended: Vec3, containment: &Containment<'_>) -> Step {
        if containment.contains(intended) {
            self.position = intended;
            Step::Moved
        } else {
            Step::Blocked {
                safe_point: containment.nearest_safe_point(intended),
            }
        }
    }
}
