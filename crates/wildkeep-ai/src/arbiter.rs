//! Target arbitration: pick the closest live candidate.

use glam::Vec3;
use wildkeep_common::{planar_distance, ActorId};

use crate::view::ActorView;

/// Selects the closest live candidate that is not `observer`.
///
/// Distance is measured in the ground plane. Ties keep the earliest
/// candidate, so the result is stable for a stable input order.
pub fn select_target<'a, I>(candidates: I, observer: ActorId, origin: Vec3) -> Option<ActorId>
where
    I: IntoIterator<Item = &'a ActorView>,
{
    let mut best: Option<(ActorId, f32)> = None;
    for candidate in candidates {
        if candidate.id == observer || candidate.dead {
            continue;
        }
        let dist = planar_distance(origin, candidate.position);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {},
            _ => best = Some((candidate.id, dist)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Team;
    use glam::Quat;
    use proptest::prelude::*;

    fn view(id: u64, x: f32, z: f32, dead: bool) -> ActorView {
        ActorView {
            id: ActorId::from_raw(id),
            position: Vec3::new(x, 0.0, z),
            rotation: Quat::IDENTITY,
            team: Team::Player,
            dead,
            leader: None,
            sensing_radius: 0.0,
        }
    }

    #[test]
    fn test_empty_candidates() {
        let none: Vec<ActorView> = Vec::new();
        assert!(select_target(&none, ActorId::from_raw(1), Vec3::ZERO).is_none());
    }

    #[test]
    fn test_picks_closest_live() {
        let candidates = vec![
            view(2, 5.0, 0.0, false),
            view(3, 1.0, 0.0, true),
            view(4, 3.0, 0.0, false),
        ];
        let picked = select_target(&candidates, ActorId::from_raw(1), Vec3::ZERO);
        assert_eq!(picked, Some(ActorId::from_raw(4)));
    }

    #[test]
    fn test_skips_self() {
        let candidates = vec![view(1, 0.0, 0.0, false), view(2, 9.0, 0.0, false)];
        let picked = select_target(&candidates, ActorId::from_raw(1), Vec3::ZERO);
        assert_eq!(picked, Some(ActorId::from_raw(2)));
    }

    #[test]
    fn test_ties_keep_first() {
        let candidates = vec![view(7, 2.0, 0.0, false), view(3, 0.0, 2.0, false)];
        let picked = select_target(&candidates, ActorId::from_raw(1), Vec3::ZERO);
        assert_eq!(picked, Some(ActorId::from_raw(7)));
    }

    #[test]
    fn test_height_is_ignored() {
        let mut high = view(2, 1.0, 0.0, false);
        high.position.y = 50.0;
        let candidates = vec![view(3, 2.0, 0.0, false), high];
        let picked = select_target(&candidates, ActorId::from_raw(1), Vec3::ZERO);
        assert_eq!(picked, Some(ActorId::from_raw(2)));
    }

    proptest! {
        #[test]
        fn prop_result_is_closest_live_non_self(
            points in proptest::collection::vec((-20.0f32..20.0, -20.0f32..20.0, proptest::bool::ANY), 0..12)
        ) {
            let observer = ActorId::from_raw(1);
            let candidates: Vec<ActorView> = points
                .iter()
                .enumerate()
                .map(|(i, &(x, z, dead))| view(i as u64 + 1, x, z, dead))
                .collect();

            let picked = select_target(&candidates, observer, Vec3::ZERO);
            let live: Vec<&ActorView> = candidates
                .iter()
                .filter(|c| c.id != observer && !c.dead)
                .collect();

            match picked {
                None => prop_assert!(live.is_empty()),
                Some(id) => {
                    let chosen = live.iter().find(|c| c.id == id).expect("picked must be live");
                    let d = planar_distance(Vec3::ZERO, chosen.position);
                    for other in &live {
                        prop_assert!(d <= planar_distance(Vec3::ZERO, other.position));
                    }
                }
            }
        }
    }
}
