//! # Wildkeep AI
//!
//! Behavior and combat state machine for non-player actors.
//!
//! This crate provides everything that decides what an actor does each tick:
//! - Aggression policy and aggro memory
//! - Target sensing and arbitration
//! - Wander waypoint planning
//! - Boundary containment and redirection
//! - Locomotion and the flying height sub-cycle
//! - The per-actor state machine
//! - A reference health ledger and the simulation host
//! - Event bus for outward behavior signals

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod aggression;
pub mod arbiter;
pub mod behavior;
pub mod boundary;
pub mod config;
pub mod events;
pub mod flight;
pub mod ledger;
pub mod locomotion;
pub mod sensor;
pub mod simulation;
pub mod view;
pub mod wander;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::aggression::*;
    pub use crate::arbiter::*;
    pub use crate::behavior::*;
    pub use crate::boundary::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::flight::*;
    pub use crate::ledger::*;
    pub use crate::locomotion::*;
    pub use crate::sensor::*;
    pub use crate::simulation::*;
    pub use crate::view::*;
    pub use crate::wander::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use wildkeep_common::{RegionId, Vec3};

    #[test]
    fn test_default_config_spawns_every_profile() {
        let config = BehaviorConfig::default();
        let names: Vec<String> = config.profiles.keys().cloned().collect();
        let mut sim = Simulation::new(config);

        for name in &names {
            let spawn = sim.archetype(name, Vec3::ZERO).expect("profile exists");
            sim.spawn(spawn);
        }
        assert_eq!(sim.len(), names.len());

        sim.run_for(3.0, 0.1);
        assert!(sim.actors().all(|a| !a.is_dead()));
    }

    #[test]
    fn test_wild_pack_hunts_player_inside_arena() {
        let mut sim = Simulation::new(BehaviorConfig::default());
        let arena = RegionId::new(1);
        sim.set_boundary(BoundaryMap::new().with_region(
            arena,
            RegionShape::Box {
                min: Vec3::new(-10.0, 0.0, -10.0),
                max: Vec3::new(10.0, 0.0, 10.0),
            },
        ));

        let player = sim.spawn(
            ActorSpawn::new(ActorProfile::default(), Vec3::new(0.0, 0.0, 8.0))
                .with_team(Team::Player)
                .controlled(),
        );
        let pack: Vec<_> = (0..3)
            .map(|i| {
                let x = -4.0 + 4.0 * i as f32;
                let spawn = ActorSpawn::new(ActorProfile::default(), Vec3::new(x, 0.0, 0.0));
                sim.spawn(spawn.with_region(arena))
            })
            .collect();

        sim.run_for(30.0, 0.05);

        // Killed, then removed after the despawn delay
        assert!(sim.get(player).is_none());
        for id in pack {
            let actor = sim.get(id).expect("pack member survives");
            assert!(actor.attack_count() > 0);
            assert!(actor.target().is_none());
            let p = actor.position();
            assert!(p.x.abs() <= 10.0 && p.z.abs() <= 10.0);
        }
    }
}
