//! Health ledger contract and the reference combat ledger.
//!
//! Actors never touch each other's health. They ask the ledger to start an
//! attack; the ledger checks range and cooldown itself, resolves the hit after
//! the attacker's hit delay, and reports damage and deaths as
//! [`LedgerEvent`]s which the host delivers on the receivers' next tick.

use std::collections::VecDeque;

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};
use wildkeep_common::{planar_distance, ActorId};

use crate::config::ActorProfile;

/// Slack for comparing accumulated simulation time against a cooldown.
const COOLDOWN_EPSILON: f64 = 1e-6;

/// Whether enough time has passed since `last` for another attack.
///
/// `None` means the actor has never attacked.
#[must_use]
pub fn cooldown_elapsed(last: Option<f64>, now: f64, cooldown: f32) -> bool {
    last.map_or(true, |t| now - t + COOLDOWN_EPSILON >= f64::from(cooldown))
}

/// An attack an actor wants to start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackRequest {
    /// Attacking actor
    pub attacker: ActorId,
    /// Intended victim
    pub target: ActorId,
    /// Attacker position when the swing starts
    pub attacker_position: Vec3,
    /// Victim position when the swing starts
    pub target_position: Vec3,
    /// Simulation time of the request
    pub now: f64,
}

/// Notifications raised by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// An actor lost health
    Damaged {
        /// Actor that was hit
        victim: ActorId,
        /// Source of the damage, if any
        attacker: Option<ActorId>,
        /// Health removed
        amount: f32,
        /// Health left
        health: f32,
    },
    /// An actor's health reached zero
    Died {
        /// Actor that died
        actor: ActorId,
        /// Source of the killing blow, if any
        killer: Option<ActorId>,
    },
}

/// What actors may ask of the health ledger during a tick.
pub trait HealthLedger {
    /// Starts an attack; `false` when the ledger refuses it.
    fn try_attack(&mut self, request: AttackRequest) -> bool;
    /// Seconds until `attacker` may attack again.
    fn remaining_cooldown(&self, attacker: ActorId, now: f64) -> f32;
    /// Whether `actor` is dead. Unknown actors are not dead.
    fn is_dead(&self, actor: ActorId) -> bool;
}

/// What the simulation host needs to drive a ledger.
pub trait LedgerControl {
    /// Starts tracking an actor.
    fn register(&mut self, actor: ActorId, profile: &ActorProfile);
    /// Stops tracking an actor and cancels its pending swings.
    fn unregister(&mut self, actor: ActorId);
    /// Lands every swing whose hit time has come.
    fn resolve(&mut self, now: f64);
    /// Takes the notifications raised since the last drain.
    fn drain_events(&mut self) -> Vec<LedgerEvent>;
}

/// Why the ledger refused an attack.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttackRejected {
    /// Attacker or target is not tracked
    #[error("actor not tracked: {0}")]
    Unknown(ActorId),
    /// Attacker or target is dead
    #[error("actor is dead: {0}")]
    Dead(ActorId),
    /// Attacker is stunned
    #[error("attacker is stunned")]
    Stunned,
    /// A previous swing has not landed yet
    #[error("previous swing still pending")]
    MidSwing,
    /// Target out of range
    #[error("target out of range: distance {distance}, range {range}")]
    OutOfRange {
        /// Actual distance
        distance: f32,
        /// Required range
        range: f32,
    },
    /// Attack on cooldown
    #[error("attack on cooldown: {remaining}s remaining")]
    OnCooldown {
        /// Time remaining in seconds
        remaining: f32,
    },
}

/// Current and maximum health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current health
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
}

impl Vitals {
    /// Full health.
    #[must_use]
    pub const fn new(max_health: f32) -> Self {
        Self {
            health: max_health,
            max_health,
        }
    }

    /// Returns whether health is exhausted.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Attack parameters of one attacker.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AttackSpec {
    damage: f32,
    range: f32,
    hit_delay: f32,
    cooldown: f32,
}

impl From<&ActorProfile> for AttackSpec {
    fn from(profile: &ActorProfile) -> Self {
        Self {
            damage: profile.attack_damage,
            range: profile.attack_distance,
            hit_delay: profile.hit_delay,
            cooldown: profile.attack_cooldown,
        }
    }
}

/// A swing waiting for its hit time.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingHit {
    attacker: ActorId,
    target: ActorId,
    damage: f32,
    lands_at: f64,
}

/// Reference health ledger.
#[derive(Debug, Default)]
pub struct CombatLedger {
    vitals: AHashMap<ActorId, Vitals>,
    specs: AHashMap<ActorId, AttackSpec>,
    last_swing: AHashMap<ActorId, f64>,
    stunned_until: AHashMap<ActorId, f64>,
    pending: VecDeque<PendingHit>,
    events: Vec<LedgerEvent>,
}

impl CombatLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an actor's vitals.
    #[must_use]
    pub fn vitals(&self, actor: ActorId) -> Option<&Vitals> {
        self.vitals.get(&actor)
    }

    /// Returns an actor's current health.
    #[must_use]
    pub fn health(&self, actor: ActorId) -> Option<f32> {
        self.vitals.get(&actor).map(|v| v.health)
    }

    /// Number of swings waiting to land.
    #[must_use]
    pub fn pending_hits(&self) -> usize {
        self.pending.len()
    }

    /// Prevents `actor` from starting attacks until `until`.
    pub fn stun(&mut self, actor: ActorId, until: f64) {
        self.stunned_until.insert(actor, until);
    }

    /// Applies damage immediately.
    ///
    /// Returns the health left, or `None` when the victim is unknown or
    /// already dead.
    pub fn apply_damage(
        &mut self,
        victim: ActorId,
        attacker: Option<ActorId>,
        amount: f32,
    ) -> Option<f32> {
        let vitals = self.vitals.get_mut(&victim)?;
        if vitals.is_dead() {
            return None;
        }
        let amount = amount.max(0.0);
        vitals.health = (vitals.health - amount).max(0.0);
        let health = vitals.health;

        self.events.push(LedgerEvent::Damaged {
            victim,
            attacker,
            amount,
            health,
        });
        if health <= 0.0 {
            debug!("{victim} died (killer: {attacker:?})");
            self.events.push(LedgerEvent::Died {
                actor: victim,
                killer: attacker,
            });
        }
        Some(health)
    }

    /// Drops an actor's health to zero.
    pub fn kill(&mut self, victim: ActorId, killer: Option<ActorId>) {
        let Some(health) = self.health(victim) else {
            return;
        };
        self.apply_damage(victim, killer, health);
    }

    /// Checks an attack request without starting it.
    pub fn check_attack(&self, request: &AttackRequest) -> Result<(), AttackRejected> {
        let spec = self
            .specs
            .get(&request.attacker)
            .ok_or(AttackRejected::Unknown(request.attacker))?;
        for id in [request.attacker, request.target] {
            let vitals = self.vitals.get(&id).ok_or(AttackRejected::Unknown(id))?;
            if vitals.is_dead() {
                return Err(AttackRejected::Dead(id));
            }
        }
        if self
            .stunned_until
            .get(&request.attacker)
            .is_some_and(|&until| request.now < until)
        {
            return Err(AttackRejected::Stunned);
        }
        if self.pending.iter().any(|hit| hit.attacker == request.attacker) {
            return Err(AttackRejected::MidSwing);
        }
        let distance = planar_distance(request.attacker_position, request.target_position);
        if distance > spec.range {
            return Err(AttackRejected::OutOfRange {
                distance,
                range: spec.range,
            });
        }
        let last = self.last_swing.get(&request.attacker).copied();
        if !cooldown_elapsed(last, request.now, spec.cooldown) {
            return Err(AttackRejected::OnCooldown {
                remaining: self.remaining_cooldown(request.attacker, request.now),
            });
        }
        Ok(())
    }
}

impl HealthLedger for CombatLedger {
    fn try_attack(&mut self, request: AttackRequest) -> bool {
        if let Err(reason) = self.check_attack(&request) {
            trace!("{} attack on {} refused: {reason}", request.attacker, request.target);
            return false;
        }
        let Some(spec) = self.specs.get(&request.attacker).copied() else {
            return false;
        };
        self.last_swing.insert(request.attacker, request.now);
        self.pending.push_back(PendingHit {
            attacker: request.attacker,
            target: request.target,
            damage: spec.damage,
            lands_at: request.now + f64::from(spec.hit_delay),
        });
        trace!("{} swings at {}", request.attacker, request.target);
        true
    }

    fn remaining_cooldown(&self, attacker: ActorId, now: f64) -> f32 {
        match (self.last_swing.get(&attacker), self.specs.get(&attacker)) {
            (Some(&last), Some(spec)) => {
                let elapsed = (now - last) as f32;
                (spec.cooldown - elapsed).max(0.0)
            },
            _ => 0.0,
        }
    }

    fn is_dead(&self, actor: ActorId) -> bool {
        self.vitals.get(&actor).is_some_and(Vitals::is_dead)
    }
}

impl LedgerControl for CombatLedger {
    fn register(&mut self, actor: ActorId, profile: &ActorProfile) {
        self.vitals.insert(actor, Vitals::new(profile.max_health));
        self.specs.insert(actor, AttackSpec::from(profile));
    }

    fn unregister(&mut self, actor: ActorId) {
        self.vitals.remove(&actor);
        self.specs.remove(&actor);
        self.last_swing.remove(&actor);
        self.stunned_until.remove(&actor);
        self.pending
            .retain(|hit| hit.attacker != actor && hit.target != actor);
    }

    fn resolve(&mut self, now: f64) {
        let mut waiting = VecDeque::with_capacity(self.pending.len());
        while let Some(hit) = self.pending.pop_front() {
            if hit.lands_at > now + COOLDOWN_EPSILON {
                waiting.push_back(hit);
                continue;
            }
            // A swing from an attacker that died mid-animation never lands
            if self.is_dead(hit.attacker) {
                continue;
            }
            self.apply_damage(hit.target, Some(hit.attacker), hit.damage);
        }
        self.pending = waiting;
    }

    fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(a: ActorId, b: ActorId) -> CombatLedger {
        let mut ledger = CombatLedger::new();
        ledger.register(a, &ActorProfile::default());
        ledger.register(b, &ActorProfile::default());
        ledger
    }

    fn request(a: ActorId, b: ActorId, distance: f32, now: f64) -> AttackRequest {
        AttackRequest {
            attacker: a,
            target: b,
            attacker_position: Vec3::ZERO,
            target_position: Vec3::new(distance, 0.0, 0.0),
            now,
        }
    }

    #[test]
    fn test_cooldown_elapsed() {
        assert!(cooldown_elapsed(None, 0.0, 1.5));
        assert!(!cooldown_elapsed(Some(0.0), 1.4, 1.5));
        assert!(cooldown_elapsed(Some(0.0), 1.5, 1.5));
        // Accumulated tick time lands just short of the boundary
        assert!(cooldown_elapsed(Some(0.0), 1.499_999_9, 1.5));
    }

    #[test]
    fn test_hit_lands_after_delay() {
        let (a, b) = (ActorId::from_raw(1), ActorId::from_raw(2));
        let mut ledger = ledger_with(a, b);

        assert!(ledger.try_attack(request(a, b, 1.0, 0.0)));
        ledger.resolve(0.1);
        assert_eq!(ledger.health(b), Some(100.0));
        ledger.resolve(0.3);
        assert_eq!(ledger.health(b), Some(90.0));

        let events = ledger.drain_events();
        assert_eq!(
            events,
            vec![LedgerEvent::Damaged {
                victim: b,
                attacker: Some(a),
                amount: 10.0,
                health: 90.0,
            }]
        );
        assert!(ledger.drain_events().is_empty());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let (a, b) = (ActorId::from_raw(1), ActorId::from_raw(2));
        let ledger = ledger_with(a, b);
        let result = ledger.check_attack(&request(a, b, 5.0, 0.0));
        assert!(matches!(result, Err(AttackRejected::OutOfRange { .. })));
    }

    #[test]
    fn test_rejects_mid_swing_and_cooldown() {
        let (a, b) = (ActorId::from_raw(1), ActorId::from_raw(2));
        let mut ledger = ledger_with(a, b);

        assert!(ledger.try_attack(request(a, b, 1.0, 0.0)));
        assert_eq!(
            ledger.check_attack(&request(a, b, 1.0, 0.1)),
            Err(AttackRejected::MidSwing)
        );
        ledger.resolve(0.5);
        assert!(matches!(
            ledger.check_attack(&request(a, b, 1.0, 1.0)),
            Err(AttackRejected::OnCooldown { .. })
        ));
        assert!((ledger.remaining_cooldown(a, 1.0) - 0.5).abs() < 1e-4);
        assert!(ledger.try_attack(request(a, b, 1.0, 1.5)));
    }

    #[test]
    fn test_rejects_while_stunned() {
        let (a, b) = (ActorId::from_raw(1), ActorId::from_raw(2));
        let mut ledger = ledger_with(a, b);
        ledger.stun(a, 2.0);
        assert!(!ledger.try_attack(request(a, b, 1.0, 1.0)));
        assert!(ledger.try_attack(request(a, b, 1.0, 2.0)));
    }

    #[test]
    fn test_lethal_damage_raises_death_once() {
        let (a, b) = (ActorId::from_raw(1), ActorId::from_raw(2));
        let mut ledger = ledger_with(a, b);

        ledger.apply_damage(b, Some(a), 250.0);
        assert!(ledger.is_dead(b));
        assert!(ledger.apply_damage(b, Some(a), 1.0).is_none());

        let deaths = ledger
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, LedgerEvent::Died { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert!(!ledger.try_attack(request(a, b, 1.0, 0.0)));
    }

    #[test]
    fn test_dead_attacker_swing_is_dropped() {
        let (a, b) = (ActorId::from_raw(1), ActorId::from_raw(2));
        let mut ledger = ledger_with(a, b);
        assert!(ledger.try_attack(request(a, b, 1.0, 0.0)));
        ledger.kill(a, None);
        ledger.resolve(1.0);
        assert_eq!(ledger.health(b), Some(100.0));
    }

    #[test]
    fn test_unregister_cancels_swings() {
        let (a, b) = (ActorId::from_raw(1), ActorId::from_raw(2));
        let mut ledger = ledger_with(a, b);
        assert!(ledger.try_attack(request(a, b, 1.0, 0.0)));
        ledger.unregister(b);
        assert_eq!(ledger.pending_hits(), 0);
        assert!(!ledger.is_dead(b));
    }

    #[test]
    fn test_vitals_exhausted_at_zero() {
        let mut vitals = Vitals::new(200.0);
        assert!(!vitals.is_dead());
        vitals.health = 0.0;
        assert!(vitals.is_dead());
    }
}
