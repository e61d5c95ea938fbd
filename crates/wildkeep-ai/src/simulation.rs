//! Simulation host.
//!
//! Owns the actor registry and the collaborators, and drives the fixed tick:
//!
//! 1. ledger notifications raised last tick are delivered to inboxes,
//! 2. a read-only [`WorldView`] snapshot is taken,
//! 3. every actor ticks once, in registry order,
//! 4. the ledger lands due hits,
//! 5. dead actors past their despawn delay are removed.

use ahash::{AHashMap, AHashSet};
use glam::{Quat, Vec3};
use thiserror::Error;
use tracing::{debug, info, warn};
use wildkeep_common::{ActorId, RegionId};

use crate::actor::{Actor, ActorSpawn, Notification};
use crate::behavior::TickContext;
use crate::boundary::BoundaryMap;
use crate::config::{BehaviorConfig, BehaviorTuning};
use crate::events::{BehaviorEvent, EventBus};
use crate::ledger::{CombatLedger, HealthLedger, LedgerControl, LedgerEvent};
use crate::sensor::{ProximitySensor, TargetSensor};
use crate::view::WorldView;

/// Simulation host errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimulationError {
    /// No actor with this id
    #[error("actor not found: {0}")]
    NotFound(ActorId),
    /// Id already in use
    #[error("actor already registered: {0}")]
    AlreadyRegistered(ActorId),
    /// No profile with this name
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
}

/// Result type for simulation host operations.
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Fixed-tick host for a set of actors.
#[derive(Debug)]
pub struct Simulation<L = CombatLedger, S = ProximitySensor> {
    config: BehaviorConfig,
    actors: AHashMap<ActorId, Actor>,
    order: Vec<ActorId>,
    next_id: u64,
    boundary: BoundaryMap,
    warned_regions: AHashSet<RegionId>,
    ledger: L,
    sensor: S,
    events: EventBus,
    time: f64,
    tick_count: u64,
}

impl Simulation {
    /// Creates a simulation with the reference ledger and sensor.
    #[must_use]
    pub fn new(config: BehaviorConfig) -> Self {
        Self::with_collaborators(config, CombatLedger::new(), ProximitySensor)
    }
}

impl<L, S> Simulation<L, S>
where
    L: HealthLedger + LedgerControl,
    S: TargetSensor,
{
    /// Creates a simulation around the given collaborators.
    pub fn with_collaborators(config: BehaviorConfig, ledger: L, sensor: S) -> Self {
        info!(
            "Behavior simulation created (seed {:#x}, {} profiles)",
            config.seed,
            config.profiles.len()
        );
        Self {
            config,
            actors: AHashMap::new(),
            order: Vec::new(),
            next_id: 1,
            boundary: BoundaryMap::new(),
            warned_regions: AHashSet::new(),
            ledger,
            sensor,
            events: EventBus::default(),
            time: 0.0,
            tick_count: 0,
        }
    }

    /// Replaces the containment regions.
    pub fn set_boundary(&mut self, boundary: BoundaryMap) {
        self.boundary = boundary;
        self.warned_regions.clear();
    }

    /// Containment regions.
    #[must_use]
    pub const fn boundary(&self) -> &BoundaryMap {
        &self.boundary
    }

    /// Shared tuning.
    #[must_use]
    pub const fn tuning(&self) -> &BehaviorTuning {
        &self.config.tuning
    }

    /// Full behavior configuration.
    #[must_use]
    pub const fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Builds a spawn from a named profile.
    pub fn archetype(&self, name: &str, position: Vec3) -> SimulationResult<ActorSpawn> {
        self.config
            .profile(name)
            .map(|profile| ActorSpawn::new(profile.clone(), position))
            .ok_or_else(|| SimulationError::UnknownProfile(name.to_string()))
    }

    /// Adds an actor under a fresh id.
    pub fn spawn(&mut self, spawn: ActorSpawn) -> ActorId {
        loop {
            let id = ActorId::from_raw(self.next_id);
            self.next_id += 1;
            if !self.actors.contains_key(&id) {
                self.insert(id, spawn);
                return id;
            }
        }
    }

    /// Adds an actor under a caller-chosen id.
    pub fn spawn_with_id(&mut self, id: ActorId, spawn: ActorSpawn) -> SimulationResult<ActorId> {
        if self.actors.contains_key(&id) {
            return Err(SimulationError::AlreadyRegistered(id));
        }
        self.insert(id, spawn);
        Ok(id)
    }

    fn insert(&mut self, id: ActorId, mut spawn: ActorSpawn) {
        spawn.profile.validate();
        for &region in &spawn.regions {
            if self.boundary.usable(region).is_some() || !self.warned_regions.insert(region) {
                continue;
            }
            if self.boundary.contains_region(region) {
                warn!("{id} assigned to degenerate {region}; treating it as unrestricted");
            } else {
                warn!("{id} assigned to undefined {region}; treating it as unrestricted");
            }
        }
        self.ledger.register(id, &spawn.profile);
        let actor = Actor::new(id, spawn, self.config.seed);
        debug!("Spawned {id} at {:?} ({:?})", actor.position(), actor.team());
        self.actors.insert(id, actor);
        self.order.push(id);
    }

    /// Removes an actor immediately.
    pub fn despawn(&mut self, id: ActorId) -> SimulationResult<Actor> {
        self.remove(id).ok_or(SimulationError::NotFound(id))
    }

    fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let actor = self.actors.remove(&id)?;
        self.order.retain(|&other| other != id);
        self.ledger.unregister(id);
        self.events.publish(BehaviorEvent::Despawned { actor: id });
        debug!("Despawned {id}");
        Some(actor)
    }

    /// Looks up an actor.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Iterates actors in registry order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.order.iter().filter_map(|id| self.actors.get(id))
    }

    /// Number of live or not-yet-despawned actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether no actors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Moves an actor, typically a host-controlled one.
    pub fn set_position(
        &mut self,
        id: ActorId,
        position: Vec3,
        rotation: Option<Quat>,
    ) -> SimulationResult<()> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(SimulationError::NotFound(id))?;
        actor.place(position, rotation);
        Ok(())
    }

    /// Queues a notification for an actor's next tick.
    pub fn notify(&mut self, id: ActorId, notification: Notification) -> SimulationResult<()> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(SimulationError::NotFound(id))?;
        actor.notify(notification);
        Ok(())
    }

    /// Health ledger.
    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable health ledger, for host-side damage.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Outward signal bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Simulation time in seconds.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Snapshot of every actor as the next tick will see it.
    #[must_use]
    pub fn snapshot(&self) -> WorldView {
        WorldView::new(
            self.actors()
                .map(|actor| {
                    let mut view = actor.view();
                    view.dead |= self.ledger.is_dead(actor.id());
                    view
                })
                .collect(),
        )
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let now = self.time;
        self.deliver_ledger_events();

        let world = self.snapshot();
        for id in &self.order {
            let Some(actor) = self.actors.get_mut(id) else {
                continue;
            };
            let sensed = if actor.is_dead() || actor.is_controlled() {
                Vec::new()
            } else {
                world
                    .get(*id)
                    .map(|view| self.sensor.report(view, &world))
                    .unwrap_or_default()
            };
            let mut ctx = TickContext {
                now,
                dt,
                tuning: &self.config.tuning,
                world: &world,
                sensed: &sensed,
                boundary: &self.boundary,
                ledger: &mut self.ledger,
                events: &self.events,
            };
            actor.tick(&mut ctx);
        }

        self.ledger.resolve(now);
        self.reap(now);

        self.time += f64::from(dt);
        self.tick_count += 1;
    }

    /// Runs fixed ticks until `duration` seconds have passed.
    pub fn run_for(&mut self, duration: f64, dt: f32) -> u64 {
        let start = self.tick_count;
        let end = self.time + duration;
        while self.time + f64::from(dt) * 0.5 < end {
            self.tick(dt);
        }
        self.tick_count - start
    }

    fn deliver_ledger_events(&mut self) {
        for event in self.ledger.drain_events() {
            let (id, notification) = match event {
                LedgerEvent::Damaged {
                    victim,
                    attacker,
                    amount,
                    ..
                } => (victim, Notification::Damaged { attacker, amount }),
                LedgerEvent::Died { actor, killer } => (actor, Notification::Died { killer }),
            };
            if let Some(actor) = self.actors.get_mut(&id) {
                actor.notify(notification);
            }
        }
    }

    fn reap(&mut self, now: f64) {
        let expired: Vec<ActorId> = self
            .actors()
            .filter(|actor| {
                actor.died_at().is_some_and(|died| {
                    actor.is_summoned()
                        || now - died + 1e-6 >= f64::from(actor.profile().despawn_delay)
                })
            })
            .map(Actor::id)
            .collect();
        for id in expired {
            self.remove(id);
        }
    }
}
