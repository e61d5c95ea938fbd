//! Event bus for outward behavior signals.
//!
//! Animation, audio and telemetry listen here; nothing in the behavior core
//! reads these events back.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use wildkeep_common::ActorId;

use crate::actor::BehaviorState;
use crate::flight::FlightPhase;

/// Signals emitted by actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorEvent {
    /// Locomotion started or stopped
    Moving {
        /// Actor ID
        actor: ActorId,
        /// Whether the actor is now moving
        moving: bool,
    },
    /// An attack was accepted; play the swing
    AttackAnimation {
        /// Attacking actor
        actor: ActorId,
        /// Victim
        target: ActorId,
    },
    /// Top-level state changed
    StateChanged {
        /// Actor ID
        actor: ActorId,
        /// Previous state
        from: BehaviorState,
        /// New state
        to: BehaviorState,
    },
    /// Flight phase changed
    FlightPhaseChanged {
        /// Actor ID
        actor: ActorId,
        /// Previous phase
        from: FlightPhase,
        /// New phase
        to: FlightPhase,
    },
    /// Actor removed from the simulation
    Despawned {
        /// Actor ID
        actor: ActorId,
    },
}

impl BehaviorEvent {
    /// Actor the event is about.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        match *self {
            Self::Moving { actor, .. }
            | Self::AttackAnimation { actor, .. }
            | Self::StateChanged { actor, .. }
            | Self::FlightPhaseChanged { actor, .. }
            | Self::Despawned { actor } => actor,
        }
    }
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<BehaviorEvent>,
    /// Receiver for collecting events
    receiver: Receiver<BehaviorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: BehaviorEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<BehaviorEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Drains pending events into a handler.
    pub fn dispatch(&self, handler: &dyn EventHandler) -> usize {
        let mut count = 0;
        for event in self.receiver.try_iter() {
            handler.handle(&event);
            count += 1;
        }
        count
    }
}

/// Typed event handler trait.
pub trait EventHandler: Send + Sync {
    /// Handles an event.
    fn handle(&self, event: &BehaviorEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        let actor = ActorId::from_raw(1);
        bus.publish(BehaviorEvent::Moving { actor, moving: true });
        bus.publish(BehaviorEvent::Despawned { actor });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], BehaviorEvent::Despawned { actor });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        let actor = ActorId::from_raw(1);
        bus.publish(BehaviorEvent::Despawned { actor });
        bus.publish(BehaviorEvent::Despawned { actor });
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_dispatch_to_handler() {
        struct Counter(AtomicUsize);
        impl EventHandler for Counter {
            fn handle(&self, _event: &BehaviorEvent) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let bus = EventBus::default();
        let actor = ActorId::from_raw(3);
        bus.publish(BehaviorEvent::AttackAnimation {
            actor,
            target: ActorId::from_raw(4),
        });

        let counter = Counter(AtomicUsize::new(0));
        assert_eq!(bus.dispatch(&counter), 1);
        assert_eq!(counter.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_event_actor() {
        let actor = ActorId::from_raw(9);
        let event = BehaviorEvent::FlightPhaseChanged {
            actor,
            from: FlightPhase::Cruising,
            to: FlightPhase::Descending,
        };
        assert_eq!(event.actor(), actor);
    }
}
