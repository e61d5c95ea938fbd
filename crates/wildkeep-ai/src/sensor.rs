//! Target sensing.

use wildkeep_common::{planar_distance, ActorId};

use crate::view::{ActorView, WorldView};

/// Reports the actors an observer can currently perceive as targets.
///
/// The report may include dead actors; the arbiter filters them.
pub trait TargetSensor {
    /// Candidates for `observer`, in a stable order.
    fn report(&self, observer: &ActorView, world: &WorldView) -> Vec<ActorId>;
}

/// Reports hostile actors within the observer's sensing radius.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximitySensor;

impl TargetSensor for ProximitySensor {
    fn report(&self, observer: &ActorView, world: &WorldView) -> Vec<ActorId> {
        world
            .iter()
            .filter(|other| other.id != observer.id)
            .filter(|other| observer.team.is_hostile_to(other.team))
            .filter(|other| {
                planar_distance(observer.position, other.position) <= observer.sensing_radius
            })
            .map(|other| other.id)
            .collect()
    }
}
