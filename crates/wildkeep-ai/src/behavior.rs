//! The per-actor state machine.
//!
//! Each tick an actor, in order:
//! 1. consumes its inbox (damage and death notifications),
//! 2. drops a stale target,
//! 3. re-evaluates aggression,
//! 4. makes at most one top-level transition,
//! 5. performs at most one movement step and at most one attack request.
//!
//! Timers are elapsed-time counters; nothing here blocks or suspends.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use tracing::{debug, trace};
use wildkeep_common::{
    facing_rotation, forward, planar_direction, planar_distance, rotate_about_y, ActorId,
};

use crate::actor::{Actor, BehaviorState, Notification};
use crate::arbiter::select_target;
use crate::boundary::{BoundaryProvider, Containment};
use crate::config::BehaviorTuning;
use crate::events::{BehaviorEvent, EventBus};
use crate::flight::FlightPhase;
use crate::ledger::{cooldown_elapsed, AttackRequest, HealthLedger};
use crate::locomotion::Step;
use crate::view::{ActorView, WorldView};
use crate::wander::{Redirect, WanderPhase, WanderPlanner};

/// Stop this fraction of the minimum attack distance short of a target.
const CHASE_STOP_FRACTION: f32 = 0.9;

/// Everything an actor may consult or call during its tick.
pub struct TickContext<'a> {
    /// Simulation time at the start of the tick
    pub now: f64,
    /// Tick length in seconds
    pub dt: f32,
    /// Shared tuning
    pub tuning: &'a BehaviorTuning,
    /// Snapshot of every actor
    pub world: &'a WorldView,
    /// Candidates reported by the actor's sensor
    pub sensed: &'a [ActorId],
    /// Containment service
    pub boundary: &'a dyn BoundaryProvider,
    /// Health ledger
    pub ledger: &'a mut dyn HealthLedger,
    /// Outward signals
    pub events: &'a EventBus,
}

impl TickContext<'_> {
    /// Whether `id` is present, alive in the snapshot and alive in the ledger.
    fn is_live(&self, id: ActorId) -> bool {
        self.world.get(id).is_some_and(|v| !v.dead) && !self.ledger.is_dead(id)
    }
}

/// Point behind `leader` that follower `slot` of `count` should hold.
///
/// Followers form a single row behind the leader, centered on its path.
#[must_use]
pub fn formation_point(leader: &ActorView, slot: usize, count: usize, spacing: f32) -> Vec3 {
    let fwd = forward(leader.rotation);
    let back = if fwd == Vec3::ZERO { -Vec3::Z } else { -fwd };
    let side = rotate_about_y(back, FRAC_PI_2);
    let lateral = (slot as f32 - (count.saturating_sub(1)) as f32 * 0.5) * spacing;
    leader.position + back * spacing + side * lateral
}

impl Actor {
    /// Advances the actor by one tick.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if self.is_dead() {
            self.inbox.clear();
            return;
        }

        self.consume_inbox(ctx);
        if !self.is_dead() && ctx.ledger.is_dead(self.id) {
            self.enter_dead(ctx);
        }
        if self.is_dead() || self.controlled {
            return;
        }

        self.prune_target(ctx);
        self.refresh_aggression(ctx);
        self.resolve_target(ctx);

        let next = self.decide(ctx);
        if next != self.state {
            self.transition(next, ctx);
        }

        let moved = match self.state {
            BehaviorState::Idle => self.act_idle(ctx),
            BehaviorState::Wandering => self.act_wander(ctx),
            BehaviorState::Following => self.act_follow(ctx),
            BehaviorState::Chasing => self.act_chase(ctx),
            BehaviorState::Attacking => self.act_attack(ctx),
            BehaviorState::Dead => false,
        };
        self.set_moving(moved, ctx.events);
    }

    fn consume_inbox(&mut self, ctx: &TickContext<'_>) {
        for notification in std::mem::take(&mut self.inbox) {
            match notification {
                Notification::Died { killer } => {
                    debug!("{} received death notification (killer: {killer:?})", self.id);
                    self.enter_dead(ctx);
                    return;
                },
                Notification::Damaged { attacker, amount } => {
                    trace!("{} took {amount} damage from {attacker:?}", self.id);
                    self.aggro.record_hit(ctx.now);
                    let promoted = self
                        .policy()
                        .retaliation_target(attacker)
                        .filter(|&a| a != self.id && ctx.is_live(a));
                    if promoted.is_some() {
                        self.promoted = promoted;
                    }
                },
            }
        }
    }

    fn prune_target(&mut self, ctx: &TickContext<'_>) {
        if let Some(target) = self.target {
            if !ctx.is_live(target) {
                debug!("{} dropped stale target {target}", self.id);
                self.target = None;
            }
        }
        if self.promoted.is_some_and(|p| !ctx.is_live(p)) {
            self.promoted = None;
        }
    }

    fn refresh_aggression(&mut self, ctx: &TickContext<'_>) {
        if self.aggro.expire(ctx.now) {
            debug!("{} aggro memory lapsed", self.id);
        }
        let Some(target) = self.target else {
            return;
        };
        let Some(view) = ctx.world.get(target) else {
            self.target = None;
            return;
        };
        if !self.policy().is_eligible(view) {
            debug!("{} no longer eligible to engage {target}", self.id);
            self.target = None;
        } else if planar_distance(self.motor.position, view.position) > self.profile.leash_distance
        {
            debug!("{} leashed off {target}", self.id);
            self.target = None;
        }
    }

    fn resolve_target(&mut self, ctx: &TickContext<'_>) {
        if let Some(attacker) = self.promoted.take() {
            if ctx
                .world
                .get(attacker)
                .is_some_and(|v| self.policy().is_eligible(v))
            {
                if self.target != Some(attacker) {
                    debug!("{} retaliates against {attacker}", self.id);
                }
                self.target = Some(attacker);
                return;
            }
        }
        if self.target.is_some() {
            return;
        }

        let policy = self.policy();
        let candidates = ctx
            .sensed
            .iter()
            .filter_map(|&id| ctx.world.get(id))
            .filter(|v| policy.is_eligible(v));
        let picked = select_target(candidates, self.id, self.motor.position);
        if let Some(target) = picked {
            debug!("{} acquired target {target}", self.id);
        }
        self.target = picked;
    }

    fn decide(&self, ctx: &TickContext<'_>) -> BehaviorState {
        if let Some(view) = self.target.and_then(|t| ctx.world.get(t)) {
            let distance = planar_distance(self.motor.position, view.position);
            let level = self
                .flight
                .as_ref()
                .map_or(true, |f| f.phase() == FlightPhase::Engaged);
            let reach = if self.state == BehaviorState::Attacking {
                self.profile.attack_distance
            } else {
                self.profile.min_attack_distance
            };
            return if level && distance <= reach {
                BehaviorState::Attacking
            } else {
                BehaviorState::Chasing
            };
        }

        match self.state {
            BehaviorState::Chasing | BehaviorState::Attacking => BehaviorState::Idle,
            BehaviorState::Idle => {
                let cruising = self.flight.as_ref().map_or(true, |f| f.is_cruising());
                if self.idle_remaining > 0.0 || !cruising {
                    BehaviorState::Idle
                } else if self.follow_slot(ctx).is_some_and(|slot| {
                    planar_distance(self.motor.position, slot) > self.profile.follow_distance
                }) {
                    BehaviorState::Following
                } else if self.profile.wander_enabled {
                    BehaviorState::Wandering
                } else {
                    BehaviorState::Idle
                }
            },
            BehaviorState::Wandering => {
                if self.follow_slot(ctx).is_some_and(|slot| {
                    planar_distance(self.motor.position, slot) > self.profile.follow_distance
                }) {
                    BehaviorState::Following
                } else {
                    BehaviorState::Wandering
                }
            },
            BehaviorState::Following => match self.follow_slot(ctx) {
                Some(slot)
                    if planar_distance(self.motor.position, slot)
                        > ctx.tuning.waypoint_reached_distance =>
                {
                    BehaviorState::Following
                },
                _ => BehaviorState::Idle,
            },
            BehaviorState::Dead => BehaviorState::Dead,
        }
    }

    fn transition(&mut self, next: BehaviorState, ctx: &TickContext<'_>) {
        let from = std::mem::replace(&mut self.state, next);
        match next {
            BehaviorState::Idle => {
                self.idle_remaining = if from.is_engaged() {
                    ctx.tuning.return_to_wander_pause
                } else {
                    WanderPlanner::new(&self.profile, ctx.tuning).wait_time(&mut self.rng)
                };
                self.redirect = None;
                if let Some(flight) = self.flight.as_mut() {
                    if let Some(prev) = flight.begin_ascent() {
                        publish_flight(ctx.events, self.id, prev, FlightPhase::Ascending);
                    }
                }
            },
            BehaviorState::Wandering => {
                self.wander = WanderPhase::default();
                self.redirect = None;
            },
            BehaviorState::Following | BehaviorState::Chasing | BehaviorState::Attacking => {
                self.redirect = None;
            },
            BehaviorState::Dead => {},
        }
        debug!("{} {from:?} -> {next:?}", self.id);
        ctx.events.publish(BehaviorEvent::StateChanged {
            actor: self.id,
            from,
            to: next,
        });
    }

    fn enter_dead(&mut self, ctx: &TickContext<'_>) {
        if self.is_dead() {
            return;
        }
        let from = std::mem::replace(&mut self.state, BehaviorState::Dead);
        self.target = None;
        self.promoted = None;
        self.redirect = None;
        self.inbox.clear();
        self.died_at = Some(ctx.now);
        debug!("{} {from:?} -> Dead", self.id);
        ctx.events.publish(BehaviorEvent::StateChanged {
            actor: self.id,
            from,
            to: BehaviorState::Dead,
        });
        self.set_moving(false, ctx.events);
    }

    fn set_moving(&mut self, moving: bool, events: &EventBus) {
        if self.moving != moving {
            self.moving = moving;
            events.publish(BehaviorEvent::Moving {
                actor: self.id,
                moving,
            });
        }
    }

    fn follow_slot(&self, ctx: &TickContext<'_>) -> Option<Vec3> {
        let leader = ctx.world.get(self.leader?)?;
        if leader.dead {
            return None;
        }
        let (slot, count) = ctx.world.follower_slot(leader.id, self.id)?;
        Some(formation_point(leader, slot, count, ctx.tuning.formation_spacing))
    }

    fn act_idle(&mut self, ctx: &TickContext<'_>) -> bool {
        self.idle_remaining -= ctx.dt;
        if let Some(flight) = self.flight.as_mut() {
            if flight.ascend(&mut self.motor.position, ctx.dt) {
                publish_flight(ctx.events, self.id, FlightPhase::Ascending, FlightPhase::Cruising);
            }
            if flight.is_cruising() {
                flight.hold_cruise(&mut self.motor.position);
            }
        }
        false
    }

    fn act_wander(&mut self, ctx: &TickContext<'_>) -> bool {
        if let Some(flight) = self.flight.as_ref() {
            flight.hold_cruise(&mut self.motor.position);
        }

        let dt = ctx.dt;
        let planner = WanderPlanner::new(&self.profile, ctx.tuning);
        let containment = Containment::new(ctx.boundary, &self.regions);
        let position = self.motor.position;
        let spawn = self.spawn_position;

        if !containment.contains(position) {
            // Spawned or pushed outside: walk back in before anything else
            if let Some(safe) = containment.nearest_safe_point(position) {
                return self.motor.step_toward_safety(safe, dt, &containment).moved();
            }
        }

        if let Some(redirect) = self.redirect.as_mut() {
            redirect.elapsed += dt;
            let (heading, elapsed) = (redirect.heading, redirect.elapsed);
            self.motor.face(heading, dt);
            if elapsed < ctx.tuning.redirect_pause {
                return false;
            }
            self.redirect = None;
            self.wander = match planner.waypoint_along(
                position,
                spawn,
                heading,
                &containment,
                &mut self.rng,
            ) {
                Some(waypoint) => WanderPhase::Moving { waypoint },
                None => WanderPhase::Waiting {
                    remaining: planner.wait_time(&mut self.rng),
                },
            };
            return false;
        }

        match self.wander {
            WanderPhase::Waiting { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.wander = WanderPhase::Waiting { remaining };
                    return false;
                }
                self.wander =
                    match planner.next_waypoint(position, spawn, &containment, &mut self.rng) {
                        Some(waypoint) => WanderPhase::Facing {
                            waypoint,
                            from: self.motor.rotation,
                            elapsed: 0.0,
                        },
                        None => {
                            debug!("{} found no valid waypoint, waiting another cycle", self.id);
                            WanderPhase::Waiting {
                                remaining: planner.wait_time(&mut self.rng),
                            }
                        },
                    };
                false
            },
            WanderPhase::Facing {
                waypoint,
                from,
                elapsed,
            } => {
                let elapsed = elapsed + dt;
                let window = ctx.tuning.face_waypoint_time;
                if let Some(dir) = planar_direction(position, waypoint) {
                    let t = if window > 0.0 {
                        (elapsed / window).min(1.0)
                    } else {
                        1.0
                    };
                    self.motor.rotation = from.slerp(facing_rotation(dir), t).normalize();
                }
                self.wander = if elapsed >= window {
                    WanderPhase::Moving { waypoint }
                } else {
                    WanderPhase::Facing {
                        waypoint,
                        from,
                        elapsed,
                    }
                };
                false
            },
            WanderPhase::Moving { waypoint } => {
                match self.motor.advance(
                    waypoint,
                    dt,
                    ctx.tuning.waypoint_reached_distance,
                    &containment,
                ) {
                    Step::Moved => true,
                    Step::Turning => false,
                    Step::Arrived => {
                        self.wander = WanderPhase::Waiting {
                            remaining: planner.wait_time(&mut self.rng),
                        };
                        false
                    },
                    Step::Blocked { .. } => {
                        let anchor = containment.inward_anchor(position, spawn);
                        let inward = planar_direction(position, anchor)
                            .unwrap_or_else(|| -forward(self.motor.rotation));
                        let spread = ctx.tuning.redirect_angle_deg.to_radians();
                        let jitter = (self.rng.f32() * 2.0 - 1.0) * spread;
                        debug!("{} hit its boundary, redirecting inward", self.id);
                        self.redirect = Some(Redirect {
                            heading: rotate_about_y(inward, jitter),
                            elapsed: 0.0,
                        });
                        self.wander = WanderPhase::default();
                        false
                    },
                }
            },
        }
    }

    fn act_follow(&mut self, ctx: &TickContext<'_>) -> bool {
        let Some(slot) = self.follow_slot(ctx) else {
            return false;
        };
        if let Some(flight) = self.flight.as_ref() {
            flight.hold_cruise(&mut self.motor.position);
        }
        let containment = Containment::new(ctx.boundary, &self.regions);
        match self
            .motor
            .advance(slot, ctx.dt, ctx.tuning.waypoint_reached_distance, &containment)
        {
            Step::Moved => true,
            Step::Blocked {
                safe_point: Some(safe),
            } => self
                .motor
                .step_toward_safety(safe, ctx.dt, &containment)
                .moved(),
            _ => false,
        }
    }

    fn act_chase(&mut self, ctx: &TickContext<'_>) -> bool {
        let Some(target) = self.target.and_then(|t| ctx.world.get(t)).copied() else {
            return false;
        };
        let dt = ctx.dt;

        if let Some(flight) = self.flight.as_mut() {
            if let Some(prev) = flight.begin_descent() {
                publish_flight(ctx.events, self.id, prev, FlightPhase::Descending);
            }
            if flight.phase() == FlightPhase::Descending {
                // Horizontal movement waits until the flyer is level with its target
                self.motor.face_point(target.position, dt);
                if flight.descend(&mut self.motor.position, target.position.y, dt) {
                    publish_flight(
                        ctx.events,
                        self.id,
                        FlightPhase::Descending,
                        FlightPhase::Engaged,
                    );
                }
                return false;
            }
            flight.track(&mut self.motor.position, target.position.y, dt);
        }

        let stop = self.profile.min_attack_distance * CHASE_STOP_FRACTION;
        let containment = Containment::new(ctx.boundary, &self.regions);
        match self.motor.advance(target.position, dt, stop, &containment) {
            Step::Moved => true,
            Step::Blocked {
                safe_point: Some(safe),
            } => self.motor.step_toward_safety(safe, dt, &containment).moved(),
            _ => false,
        }
    }

    fn act_attack(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let Some(target) = self.target.and_then(|t| ctx.world.get(t)).copied() else {
            return false;
        };
        self.motor.face_point(target.position, ctx.dt);

        if let Some(flight) = self.flight.as_ref() {
            flight.track(&mut self.motor.position, target.position.y, ctx.dt);
            if !flight.is_aligned(self.motor.position.y, target.position.y) {
                return false;
            }
        }

        if !cooldown_elapsed(self.last_attack_at, ctx.now, self.profile.attack_cooldown) {
            return false;
        }

        let request = AttackRequest {
            attacker: self.id,
            target: target.id,
            attacker_position: self.motor.position,
            target_position: target.position,
            now: ctx.now,
        };
        if ctx.ledger.try_attack(request) {
            trace!("{} attack on {} accepted at {:.3}", self.id, target.id, ctx.now);
            self.last_attack_at = Some(ctx.now);
            self.attack_count += 1;
            ctx.events.publish(BehaviorEvent::AttackAnimation {
                actor: self.id,
                target: target.id,
            });
        } else {
            trace!(
                "{} attack on {} rejected, {:.2}s cooldown left",
                self.id,
                target.id,
                ctx.ledger.remaining_cooldown(self.id, ctx.now)
            );
        }
        false
    }
}

fn publish_flight(events: &EventBus, actor: ActorId, from: FlightPhase, to: FlightPhase) {
    debug!("{actor} flight {from:?} -> {to:?}");
    events.publish(BehaviorEvent::FlightPhaseChanged { actor, from, to });
}
