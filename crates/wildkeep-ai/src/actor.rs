//! Per-actor state.
//!
//! An [`Actor`] owns everything its state machine mutates: position and
//! facing, timers, target, aggro memory and its random stream. Other actors
//! and collaborators reach it only through [`Notification`]s queued in its
//! inbox, which it consumes at the start of its next tick.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use wildkeep_common::{ActorId, RegionId};

use crate::aggression::{AggressionPolicy, AggroMemory};
use crate::config::ActorProfile;
use crate::flight::{FlightPhase, FlightState};
use crate::locomotion::Motor;
use crate::view::ActorView;
use crate::wander::{Redirect, WanderPhase};

/// Side an actor fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Team {
    /// Wild creatures, hostile to everyone else
    #[default]
    Wild,
    /// Allied followers of the player
    Ally,
    /// The player
    Player,
}

impl Team {
    /// Returns whether an actor of this team treats `other` as a target.
    #[must_use]
    pub const fn is_hostile_to(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Wild, Self::Ally | Self::Player) | (Self::Ally, Self::Wild)
        )
    }
}

/// Mutually exclusive top-level states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BehaviorState {
    /// Standing still, waiting for the idle timer
    #[default]
    Idle,
    /// Running the wait/face/move wander cadence
    Wandering,
    /// Catching up with the leader's formation
    Following,
    /// Closing in on the current target
    Chasing,
    /// In range of the current target
    Attacking,
    /// Terminal
    Dead,
}

impl BehaviorState {
    /// Returns whether the state involves a target.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Chasing | Self::Attacking)
    }
}

/// Cross-actor effects, delivered on the receiver's next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    /// The actor lost health
    Damaged {
        /// Source of the damage, if any
        attacker: Option<ActorId>,
        /// Health removed
        amount: f32,
    },
    /// The actor's health reached zero
    Died {
        /// Source of the killing blow, if any
        killer: Option<ActorId>,
    },
}

/// Everything needed to bring an actor into the simulation.
#[derive(Debug, Clone)]
pub struct ActorSpawn {
    /// Stats and policy, fixed for the actor's lifetime
    pub profile: ActorProfile,
    /// Spawn position
    pub position: Vec3,
    /// Initial facing
    pub rotation: Quat,
    /// Team used for sensing
    pub team: Team,
    /// Regions the actor must stay inside (empty means unrestricted)
    pub regions: Vec<RegionId>,
    /// Leader to follow when idle
    pub leader: Option<ActorId>,
    /// Removed the tick it dies instead of after the despawn delay
    pub summoned: bool,
    /// Moved by the host; its brain never ticks
    pub controlled: bool,
}

impl ActorSpawn {
    /// Creates a wild actor at `position`.
    #[must_use]
    pub fn new(profile: ActorProfile, position: Vec3) -> Self {
        Self {
            profile,
            position,
            rotation: Quat::IDENTITY,
            team: Team::Wild,
            regions: Vec::new(),
            leader: None,
            summoned: false,
            controlled: false,
        }
    }

    /// Sets the initial facing.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the team.
    #[must_use]
    pub const fn with_team(mut self, team: Team) -> Self {
        self.team = team;
        self
    }

    /// Adds a containment region.
    #[must_use]
    pub fn with_region(mut self, region: RegionId) -> Self {
        self.regions.push(region);
        self
    }

    /// Follows `leader` when not fighting.
    #[must_use]
    pub const fn following(mut self, leader: ActorId) -> Self {
        self.leader = Some(leader);
        self
    }

    /// Marks the actor as transient.
    #[must_use]
    pub const fn summoned(mut self) -> Self {
        self.summoned = true;
        self
    }

    /// Marks the actor as host-controlled.
    #[must_use]
    pub const fn controlled(mut self) -> Self {
        self.controlled = true;
        self
    }
}

/// One simulated actor.
#[derive(Debug, Clone)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) team: Team,
    pub(crate) profile: ActorProfile,
    pub(crate) motor: Motor,
    pub(crate) spawn_position: Vec3,
    pub(crate) regions: Vec<RegionId>,
    pub(crate) state: BehaviorState,
    pub(crate) idle_remaining: f32,
    pub(crate) target: Option<ActorId>,
    pub(crate) promoted: Option<ActorId>,
    pub(crate) aggro: AggroMemory,
    pub(crate) last_attack_at: Option<f64>,
    pub(crate) attack_count: u32,
    pub(crate) wander: WanderPhase,
    pub(crate) redirect: Option<Redirect>,
    pub(crate) flight: Option<FlightState>,
    pub(crate) leader: Option<ActorId>,
    pub(crate) summoned: bool,
    pub(crate) controlled: bool,
    pub(crate) died_at: Option<f64>,
    pub(crate) moving: bool,
    pub(crate) inbox: Vec<Notification>,
    pub(crate) rng: fastrand::Rng,
}

impl Actor {
    /// Creates an actor; its random stream is derived from `seed` and `id`.
    #[must_use]
    pub fn new(id: ActorId, spawn: ActorSpawn, seed: u64) -> Self {
        let ActorSpawn {
            profile,
            mut position,
            rotation,
            team,
            regions,
            leader,
            summoned,
            controlled,
        } = spawn;

        let flight = profile.flight.map(FlightState::new);
        if let Some(flight) = &flight {
            flight.hold_cruise(&mut position);
        }

        Self {
            id,
            team,
            motor: Motor::new(position, rotation, &profile),
            spawn_position: position,
            regions,
            state: BehaviorState::Idle,
            idle_remaining: profile.initial_idle_time,
            target: None,
            promoted: None,
            aggro: AggroMemory::new(profile.aggro_memory_duration),
            last_attack_at: None,
            attack_count: 0,
            wander: WanderPhase::default(),
            redirect: None,
            flight,
            leader,
            summoned,
            controlled,
            died_at: None,
            moving: false,
            inbox: Vec::new(),
            rng: fastrand::Rng::with_seed(seed ^ id.raw().wrapping_mul(0x9e37_79b9_7f4a_7c15)),
            profile,
        }
    }

    /// Returns the actor's id.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Returns the actor's team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Returns the actor's profile.
    #[must_use]
    pub const fn profile(&self) -> &ActorProfile {
        &self.profile
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.motor.position
    }

    /// Current facing.
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.motor.rotation
    }

    /// Position captured at creation.
    #[must_use]
    pub const fn spawn_position(&self) -> Vec3 {
        self.spawn_position
    }

    /// Assigned containment regions.
    #[must_use]
    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    /// Current top-level state.
    #[must_use]
    pub const fn state(&self) -> BehaviorState {
        self.state
    }

    /// Current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Returns whether the actor is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == BehaviorState::Dead
    }

    /// Aggro memory.
    #[must_use]
    pub const fn aggro(&self) -> &AggroMemory {
        &self.aggro
    }

    /// Time of the last accepted attack.
    #[must_use]
    pub const fn last_attack_at(&self) -> Option<f64> {
        self.last_attack_at
    }

    /// Number of attacks the ledger accepted.
    #[must_use]
    pub const fn attack_count(&self) -> u32 {
        self.attack_count
    }

    /// Current wander sub-phase.
    #[must_use]
    pub const fn wander_phase(&self) -> WanderPhase {
        self.wander
    }

    /// Flight phase for airborne actors.
    #[must_use]
    pub fn flight_phase(&self) -> Option<FlightPhase> {
        self.flight.as_ref().map(FlightState::phase)
    }

    /// Leader this actor follows.
    #[must_use]
    pub const fn leader(&self) -> Option<ActorId> {
        self.leader
    }

    /// Returns whether the actor is transient.
    #[must_use]
    pub const fn is_summoned(&self) -> bool {
        self.summoned
    }

    /// Returns whether the host moves this actor.
    #[must_use]
    pub const fn is_controlled(&self) -> bool {
        self.controlled
    }

    /// Time of death.
    #[must_use]
    pub const fn died_at(&self) -> Option<f64> {
        self.died_at
    }

    /// Whether the last tick moved the actor.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// Queues a notification for the next tick.
    pub fn notify(&mut self, notification: Notification) {
        if !self.is_dead() {
            self.inbox.push(notification);
        }
    }

    /// Aggression policy over this actor's fixed fields.
    #[must_use]
    pub fn policy(&self) -> AggressionPolicy<'_> {
        AggressionPolicy::new(
            self.profile.behavior_mode,
            &self.aggro,
            self.spawn_position,
            self.profile.territory_radius,
        )
    }

    /// What other actors may observe about this one.
    #[must_use]
    pub fn view(&self) -> ActorView {
        ActorView {
            id: self.id,
            position: self.motor.position,
            rotation: self.motor.rotation,
            team: self.team,
            dead: self.is_dead(),
            leader: self.leader,
            sensing_radius: self.profile.sensing_radius,
        }
    }

    /// Moves a host-controlled actor.
    pub(crate) fn place(&mut self, position: Vec3, rotation: Option<Quat>) {
        self.motor.position = position;
        if let Some(rotation) = rotation {
            self.motor.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::FlightProfile;

    #[test]
    fn test_team_hostility() {
        assert!(Team::Wild.is_hostile_to(Team::Player));
        assert!(Team::Wild.is_hostile_to(Team::Ally));
        assert!(Team::Ally.is_hostile_to(Team::Wild));
        assert!(!Team::Ally.is_hostile_to(Team::Player));
        assert!(!Team::Player.is_hostile_to(Team::Wild));
        assert!(!Team::Wild.is_hostile_to(Team::Wild));
    }

    #[test]
    fn test_spawn_builder() {
        let leader = ActorId::from_raw(7);
        let spawn = ActorSpawn::new(ActorProfile::default(), Vec3::ONE)
            .with_team(Team::Ally)
            .with_region(RegionId::new(2))
            .following(leader)
            .summoned();
        assert_eq!(spawn.team, Team::Ally);
        assert_eq!(spawn.regions, vec![RegionId::new(2)]);
        assert_eq!(spawn.leader, Some(leader));
        assert!(spawn.summoned);
        assert!(!spawn.controlled);
    }

    #[test]
    fn test_new_actor_starts_idle() {
        let actor = Actor::new(
            ActorId::from_raw(1),
            ActorSpawn::new(ActorProfile::default(), Vec3::new(1.0, 0.0, 2.0)),
            0,
        );
        assert_eq!(actor.state(), BehaviorState::Idle);
        assert_eq!(actor.spawn_position(), Vec3::new(1.0, 0.0, 2.0));
        assert!(actor.target().is_none());
        assert!(actor.last_attack_at().is_none());
        assert!(!actor.aggro().is_active());
        assert!(actor.flight_phase().is_none());
    }

    #[test]
    fn test_flyer_spawns_at_cruise_height() {
        let profile = ActorProfile::default().with_flight(FlightProfile::default());
        let actor = Actor::new(ActorId::from_raw(1), ActorSpawn::new(profile, Vec3::ZERO), 0);
        assert_eq!(actor.position().y, 2.0);
        assert_eq!(actor.flight_phase(), Some(FlightPhase::Cruising));
    }

    #[test]
    fn test_dead_actor_ignores_notifications() {
        let mut actor = Actor::new(
            ActorId::from_raw(1),
            ActorSpawn::new(ActorProfile::default(), Vec3::ZERO),
            0,
        );
        actor.state = BehaviorState::Dead;
        actor.notify(Notification::Died { killer: None });
        assert!(actor.inbox.is_empty());
    }

    #[test]
    fn test_view_mirrors_actor() {
        let actor = Actor::new(
            ActorId::from_raw(4),
            ActorSpawn::new(ActorProfile::default(), Vec3::X).with_team(Team::Player),
            0,
        );
        let view = actor.view();
        assert_eq!(view.id, ActorId::from_raw(4));
        assert_eq!(view.position, Vec3::X);
        assert_eq!(view.team, Team::Player);
        assert!(!view.dead);
        assert_eq!(view.sensing_radius, 12.0);
    }
}
