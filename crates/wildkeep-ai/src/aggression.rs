//! Aggression policy and aggro memory.
//!
//! The policy decides whether a sensed actor may be engaged at all; the
//! memory records that an actor was hit and forgets it after a fixed time.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use wildkeep_common::{planar_distance, ActorId};

use crate::view::ActorView;

/// Per-actor aggression policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BehaviorMode {
    /// Engages any live target it senses
    #[default]
    Aggressive,
    /// Engages only while it remembers being attacked
    Passive,
    /// Never engages, whatever happens to it
    UltraPassive,
    /// Engages targets that enter its territory around spawn
    Territorial,
}

impl BehaviorMode {
    /// Mode actually applied given the actor's territory.
    ///
    /// A territorial actor with no territory behaves as passive.
    #[must_use]
    pub const fn resolve(self, territory_radius: Option<f32>) -> Self {
        match (self, territory_radius) {
            (Self::Territorial, None) => Self::Passive,
            (mode, _) => mode,
        }
    }

    /// Whether taking damage turns the attacker into the current target.
    #[must_use]
    pub const fn retaliates(self) -> bool {
        matches!(self, Self::Passive)
    }

    /// Whether this mode can ever produce an eligible target.
    #[must_use]
    pub const fn can_engage(self) -> bool {
        !matches!(self, Self::UltraPassive)
    }
}

/// Time-limited record of having been attacked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggroMemory {
    has_been_attacked: bool,
    last_attacked_at: f64,
    duration: f32,
}

impl AggroMemory {
    /// Creates an empty memory that lasts `duration` seconds per hit.
    #[must_use]
    pub const fn new(duration: f32) -> Self {
        Self {
            has_been_attacked: false,
            last_attacked_at: 0.0,
            duration,
        }
    }

    /// Records a damage event at `now`.
    pub fn record_hit(&mut self, now: f64) {
        self.has_been_attacked = true;
        self.last_attacked_at = now;
    }

    /// Forgets the attack once the memory has run out.
    ///
    /// Returns `true` on the tick the memory lapses.
    pub fn expire(&mut self, now: f64) -> bool {
        if self.has_been_attacked && now - self.last_attacked_at > f64::from(self.duration) {
            self.has_been_attacked = false;
            return true;
        }
        false
    }

    /// Whether the actor currently remembers being attacked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.has_been_attacked
    }
}

/// Eligibility check for one actor, built from its fixed policy fields.
#[derive(Debug, Clone, Copy)]
pub struct AggressionPolicy<'a> {
    mode: BehaviorMode,
    memory: &'a AggroMemory,
    spawn: Vec3,
    territory_radius: Option<f32>,
}

impl<'a> AggressionPolicy<'a> {
    /// Creates a policy view.
    #[must_use]
    pub const fn new(
        mode: BehaviorMode,
        memory: &'a AggroMemory,
        spawn: Vec3,
        territory_radius: Option<f32>,
    ) -> Self {
        Self {
            mode: mode.resolve(territory_radius),
            memory,
            spawn,
            territory_radius,
        }
    }

    /// Effective mode after resolving territory.
    #[must_use]
    pub const fn mode(&self) -> BehaviorMode {
        self.mode
    }

    /// Whether `candidate` may be engaged.
    #[must_use]
    pub fn is_eligible(&self, candidate: &ActorView) -> bool {
        if candidate.dead {
            return false;
        }
        match self.mode {
            BehaviorMode::Aggressive => true,
            BehaviorMode::Passive => self.memory.is_active(),
            BehaviorMode::UltraPassive => false,
            BehaviorMode::Territorial => self
                .territory_radius
                .is_some_and(|r| planar_distance(self.spawn, candidate.position) <= r),
        }
    }

    /// Attacker to promote to current target after taking damage, if any.
    #[must_use]
    pub fn retaliation_target(&self, attacker: Option<ActorId>) -> Option<ActorId> {
        if self.mode.retaliates() {
            attacker
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Team;
    use glam::Quat;
    use proptest::prelude::*;

    fn view(x: f32, z: f32, dead: bool) -> ActorView {
        ActorView {
            id: ActorId::from_raw(7),
            position: Vec3::new(x, 0.0, z),
            rotation: Quat::IDENTITY,
            team: Team::Player,
            dead,
            leader: None,
            sensing_radius: 0.0,
        }
    }

    #[test]
    fn test_aggressive_eligible_for_live() {
        let memory = AggroMemory::new(30.0);
        let policy = AggressionPolicy::new(BehaviorMode::Aggressive, &memory, Vec3::ZERO, None);
        assert!(policy.is_eligible(&view(5.0, 0.0, false)));
        assert!(!policy.is_eligible(&view(5.0, 0.0, true)));
    }

    #[test]
    fn test_passive_requires_memory() {
        let mut memory = AggroMemory::new(30.0);
        let candidate = view(1.0, 1.0, false);
        {
            let policy = AggressionPolicy::new(BehaviorMode::Passive, &memory, Vec3::ZERO, None);
            assert!(!policy.is_eligible(&candidate));
        }
        memory.record_hit(0.0);
        let policy = AggressionPolicy::new(BehaviorMode::Passive, &memory, Vec3::ZERO, None);
        assert!(policy.is_eligible(&candidate));
        assert_eq!(policy.retaliation_target(Some(candidate.id)), Some(candidate.id));
    }

    #[test]
    fn test_territorial_uses_spawn_distance() {
        let memory = AggroMemory::new(30.0);
        let policy =
            AggressionPolicy::new(BehaviorMode::Territorial, &memory, Vec3::ZERO, Some(5.0));
        assert!(policy.is_eligible(&view(3.0, 0.0, false)));
        assert!(!policy.is_eligible(&view(8.0, 0.0, false)));
        assert!(policy.retaliation_target(Some(ActorId::from_raw(8))).is_none());
    }

    #[test]
    fn test_territorial_without_territory_is_passive() {
        assert_eq!(
            BehaviorMode::Territorial.resolve(None),
            BehaviorMode::Passive
        );
        let memory = AggroMemory::new(30.0);
        let policy = AggressionPolicy::new(BehaviorMode::Territorial, &memory, Vec3::ZERO, None);
        assert_eq!(policy.mode(), BehaviorMode::Passive);
    }

    #[test]
    fn test_memory_expires_after_duration() {
        let mut memory = AggroMemory::new(30.0);
        memory.record_hit(0.0);

        assert!(!memory.expire(29.9));
        assert!(!memory.expire(30.0));
        assert!(memory.expire(30.05));
        assert!(!memory.is_active());
        // Stays expired until a new hit
        assert!(!memory.expire(100.0));
        assert!(!memory.is_active());
    }

    #[test]
    fn test_new_hit_extends_memory() {
        let mut memory = AggroMemory::new(10.0);
        memory.record_hit(0.0);
        memory.record_hit(8.0);
        assert!(!memory.expire(15.0));
        assert!(memory.expire(18.5));
    }

    proptest! {
        #[test]
        fn prop_ultra_passive_never_eligible(
            hit in proptest::bool::ANY,
            x in -50.0f32..50.0,
            z in -50.0f32..50.0,
            territory in proptest::option::of(0.0f32..100.0),
        ) {
            let mut memory = AggroMemory::new(30.0);
            if hit {
                memory.record_hit(0.0);
            }
            let policy = AggressionPolicy::new(BehaviorMode::UltraPassive, &memory, Vec3::ZERO, territory);
            prop_assert!(!policy.is_eligible(&view(x, z, false)));
            prop_assert!(policy.retaliation_target(Some(ActorId::from_raw(8))).is_none());
        }
    }
}
