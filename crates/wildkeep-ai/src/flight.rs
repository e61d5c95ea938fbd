//! Vertical sub-cycle for airborne actors.
//!
//! Flyers cruise at a fixed height while idle or wandering, descend to a
//! target's height before engaging, and climb back to cruise height once the
//! engagement ends.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::finite_or;

/// Height parameters of an airborne actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightProfile {
    /// Height held while cruising
    pub cruise_height: f32,
    /// Units per second while descending or tracking a target
    pub descent_rate: f32,
    /// Units per second while climbing back
    pub ascent_rate: f32,
    /// Height difference treated as aligned
    pub height_tolerance: f32,
}

impl Default for FlightProfile {
    fn default() -> Self {
        Self {
            cruise_height: 2.0,
            descent_rate: 1.5,
            ascent_rate: 1.5,
            height_tolerance: 0.1,
        }
    }
}

impl FlightProfile {
    /// Validate and clamp values to sensible ranges.
    pub fn validate(&mut self) {
        let d = Self::default();
        self.cruise_height = finite_or(self.cruise_height, d.cruise_height);
        self.descent_rate = finite_or(self.descent_rate, d.descent_rate).max(0.01);
        self.ascent_rate = finite_or(self.ascent_rate, d.ascent_rate).max(0.01);
        self.height_tolerance =
            finite_or(self.height_tolerance, d.height_tolerance).clamp(0.001, 5.0);
    }
}

/// Where a flyer is in its vertical cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightPhase {
    /// Held at cruise height
    Cruising,
    /// Dropping toward a target's height
    Descending,
    /// At the target's height and tracking it
    Engaged,
    /// Climbing back to cruise height
    Ascending,
}

/// Vertical state of a flyer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    profile: FlightProfile,
    phase: FlightPhase,
}

impl FlightState {
    /// Starts cruising.
    #[must_use]
    pub const fn new(profile: FlightProfile) -> Self {
        Self {
            profile,
            phase: FlightPhase::Cruising,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> FlightPhase {
        self.phase
    }

    /// Whether the flyer is at cruise height and free to wander.
    #[must_use]
    pub fn is_cruising(&self) -> bool {
        self.phase == FlightPhase::Cruising
    }

    /// Whether a height difference counts as aligned.
    #[must_use]
    pub fn is_aligned(&self, height: f32, target_height: f32) -> bool {
        (height - target_height).abs() <= self.profile.height_tolerance
    }

    /// Hard clamp to cruise height.
    pub fn hold_cruise(&self, position: &mut Vec3) {
        position.y = self.profile.cruise_height;
    }

    /// Enters the descent unless already descending or engaged.
    ///
    /// Returns the previous phase when it changed.
    pub fn begin_descent(&mut self) -> Option<FlightPhase> {
        match self.phase {
            FlightPhase::Cruising | FlightPhase::Ascending => {
                Some(std::mem::replace(&mut self.phase, FlightPhase::Descending))
            },
            FlightPhase::Descending | FlightPhase::Engaged => None,
        }
    }

    /// Enters the climb unless already climbing or cruising.
    ///
    /// Returns the previous phase when it changed.
    pub fn begin_ascent(&mut self) -> Option<FlightPhase> {
        match self.phase {
            FlightPhase::Descending | FlightPhase::Engaged => {
                Some(std::mem::replace(&mut self.phase, FlightPhase::Ascending))
            },
            FlightPhase::Cruising | FlightPhase::Ascending => None,
        }
    }

    /// Steps the descent toward `target_height`.
    ///
    /// Returns `true` on the tick the flyer becomes engaged.
    pub fn descend(&mut self, position: &mut Vec3, target_height: f32, dt: f32) -> bool {
        if self.phase != FlightPhase::Descending {
            return false;
        }
        position.y = approach(position.y, target_height, self.profile.descent_rate * dt);
        if self.is_aligned(position.y, target_height) {
            self.phase = FlightPhase::Engaged;
            return true;
        }
        false
    }

    /// Keeps an engaged flyer at its target's height.
    pub fn track(&self, position: &mut Vec3, target_height: f32, dt: f32) {
        if self.phase == FlightPhase::Engaged {
            position.y = approach(position.y, target_height, self.profile.descent_rate * dt);
        }
    }

    /// Steps the climb back to cruise height.
    ///
    /// Returns `true` on the tick cruise height is reached.
    pub fn ascend(&mut self, position: &mut Vec3, dt: f32) -> bool {
        if self.phase != FlightPhase::Ascending {
            return false;
        }
        let cruise = self.profile.cruise_height;
        position.y = approach(position.y, cruise, self.profile.ascent_rate * dt);
        if (position.y - cruise).abs() <= f32::EPSILON {
            position.y = cruise;
            self.phase = FlightPhase::Cruising;
            return true;
        }
        false
    }
}

/// Moves `current` toward `target` by at most `max_delta`.
fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approach_clamps() {
        assert_eq!(approach(2.0, 0.0, 0.5), 1.5);
        assert_eq!(approach(0.2, 0.0, 0.5), 0.0);
        assert_eq!(approach(0.0, 2.0, 0.5), 0.5);
    }

    #[test]
    fn test_descent_is_monotonic_until_engaged() {
        let mut state = FlightState::new(FlightProfile::default());
        let mut pos = Vec3::new(0.0, 2.0, 0.0);
        assert_eq!(state.begin_descent(), Some(FlightPhase::Cruising));

        let mut last = pos.y;
        let mut engaged = false;
        for _ in 0..200 {
            engaged = state.descend(&mut pos, 0.0, 0.05);
            assert!(pos.y <= last);
            last = pos.y;
            if engaged {
                break;
            }
        }
        assert!(engaged);
        assert_eq!(state.phase(), FlightPhase::Engaged);
        assert!(pos.y.abs() <= 0.1);
    }

    #[test]
    fn test_ascent_returns_to_cruise() {
        let mut state = FlightState::new(FlightProfile::default());
        let mut pos = Vec3::ZERO;
        state.begin_descent();
        state.descend(&mut pos, 0.0, 1.0);
        assert_eq!(state.begin_ascent(), Some(FlightPhase::Engaged));

        let mut reached = false;
        for _ in 0..100 {
            if state.ascend(&mut pos, 0.1) {
                reached = true;
                break;
            }
        }
        assert!(reached);
        assert_eq!(pos.y, 2.0);
        assert!(state.is_cruising());
    }

    #[test]
    fn test_phase_changes_are_idempotent() {
        let mut state = FlightState::new(FlightProfile::default());
        assert!(state.begin_ascent().is_none());
        assert!(state.begin_descent().is_some());
        assert!(state.begin_descent().is_none());
    }

    #[test]
    fn test_hold_cruise_is_hard_clamp() {
        let state = FlightState::new(FlightProfile {
            cruise_height: 4.0,
            ..FlightProfile::default()
        });
        let mut pos = Vec3::new(1.0, -3.0, 1.0);
        state.hold_cruise(&mut pos);
        assert_eq!(pos, Vec3::new(1.0, 4.0, 1.0));
    }
}
