//! Builds a populated simulation from a scenario description.

use tracing::{debug, info};
use wildkeep_ai::{BoundaryMap, Simulation};
use wildkeep_common::{ActorId, RegionId, WildkeepError, WildkeepResult};

use crate::config::SimConfig;

/// Creates the simulation, installs the regions and spawns every entry in order.
pub fn build(config: &SimConfig) -> WildkeepResult<(Simulation, Vec<ActorId>)> {
    let mut sim = Simulation::new(config.behavior.clone());

    let mut boundary = BoundaryMap::new();
    for region in &config.regions {
        boundary.insert(RegionId::new(region.id), region.shape);
    }
    sim.set_boundary(boundary);

    let mut ids = Vec::with_capacity(config.spawns.len());
    for (index, entry) in config.spawns.iter().enumerate() {
        let mut spawn = sim
            .archetype(&entry.profile, entry.position)
            .map_err(|e| WildkeepError::Scenario(format!("spawn {index}: {e}")))?
            .with_team(entry.team);

        if let Some(health) = entry.max_health {
            spawn.profile.max_health = health;
        }
        for &region in &entry.regions {
            spawn = spawn.with_region(RegionId::new(region));
        }
        if let Some(leader) = entry.leader {
            let leader_id = ids.get(leader).copied().ok_or_else(|| {
                WildkeepError::Scenario(format!(
                    "spawn {index}: leader {leader} must refer to an earlier spawn"
                ))
            })?;
            spawn = spawn.following(leader_id);
        }
        if entry.summoned {
            spawn = spawn.summoned();
        }
        if entry.controlled {
            spawn = spawn.controlled();
        }

        let id = sim.spawn(spawn);
        debug!("Spawned {} {:?} as {id:?}", entry.profile, entry.team);
        ids.push(id);
    }

    info!(
        "Scenario ready: {} regions, {} actors",
        config.regions.len(),
        ids.len()
    );
    Ok((sim, ids))
}
