//! Read-only snapshot of every actor, taken once at the top of a tick.
//!
//! Actors never reach into each other's state; everything they learn about
//! other actors during a tick comes from this snapshot.

use ahash::AHashMap;
use glam::{Quat, Vec3};
use wildkeep_common::ActorId;

use crate::actor::Team;

/// What other actors may observe about an actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorView {
    /// Actor id
    pub id: ActorId,
    /// Position at the start of the tick
    pub position: Vec3,
    /// Orientation at the start of the tick
    pub rotation: Quat,
    /// Team used for hostility checks
    pub team: Team,
    /// Whether the actor is dead
    pub dead: bool,
    /// Leader this actor follows, if any
    pub leader: Option<ActorId>,
    /// Radius of its proximity sensor
    pub sensing_radius: f32,
}

/// Snapshot of the simulation, in stable registry order.
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    actors: Vec<ActorView>,
    index: AHashMap<ActorId, usize>,
}

impl WorldView {
    /// Builds a snapshot from views in iteration order.
    pub fn new(actors: Vec<ActorView>) -> Self {
        let index = actors
            .iter()
            .enumerate()
            .map(|(i, view)| (view.id, i))
            .collect();
        Self { actors, index }
    }

    /// Looks up an actor by id.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&ActorView> {
        self.index.get(&id).map(|&i| &self.actors[i])
    }

    /// Iterates all actors in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorView> {
        self.actors.iter()
    }

    /// Number of actors in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Formation slot of `follower` among the live followers of `leader`.
    ///
    /// Returns `(slot, follower_count)`.
    #[must_use]
    pub fn follower_slot(&self, leader: ActorId, follower: ActorId) -> Option<(usize, usize)> {
        let mut slot = None;
        let mut count = 0;
        for view in self
            .actors
            .iter()
            .filter(|v| v.leader == Some(leader) && !v.dead)
        {
            if view.id == follower {
                slot = Some(count);
            }
            count += 1;
        }
        slot.map(|s| (s, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u64, leader: Option<u64>, dead: bool) -> ActorView {
        ActorView {
            id: ActorId::from_raw(id),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            team: Team::Ally,
            dead,
            leader: leader.map(ActorId::from_raw),
            sensing_radius: 10.0,
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let world = WorldView::new(vec![view(1, None, false), view(2, None, true)]);
        assert_eq!(world.len(), 2);
        assert!(world.get(ActorId::from_raw(2)).is_some_and(|v| v.dead));
        assert!(world.get(ActorId::from_raw(3)).is_none());
    }

    #[test]
    fn test_follower_slots_skip_dead() {
        let world = WorldView::new(vec![
            view(1, None, false),
            view(2, Some(1), false),
            view(3, Some(1), true),
            view(4, Some(1), false),
        ]);
        let leader = ActorId::from_raw(1);
        assert_eq!(world.follower_slot(leader, ActorId::from_raw(2)), Some((0, 2)));
        assert_eq!(world.follower_slot(leader, ActorId::from_raw(4)), Some((1, 2)));
        assert_eq!(world.follower_slot(leader, ActorId::from_raw(3)), None);
    }
}
