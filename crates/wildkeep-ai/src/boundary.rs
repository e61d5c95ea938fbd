//! Containment regions.
//!
//! A [`BoundaryProvider`] answers inside/nearest queries per named region.
//! [`Containment`] combines the regions assigned to one actor: a point is
//! permitted when it lies inside at least one of them. Regions the provider
//! does not know, and regions with degenerate geometry, are treated as
//! unrestricted.

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use wildkeep_common::{planar, planar_distance, RegionId};

/// Inset applied to nearest-inside answers so they test as inside.
const BOUNDARY_INSET: f32 = 0.01;

/// Shape of a containment region in the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RegionShape {
    /// Disc around a center
    Circle {
        /// Center (height ignored)
        center: Vec3,
        /// Radius in world units
        radius: f32,
    },
    /// Axis-aligned rectangle
    Box {
        /// Minimum corner (height ignored)
        min: Vec3,
        /// Maximum corner (height ignored)
        max: Vec3,
    },
}

impl RegionShape {
    /// Whether the geometry encloses any area: finite values, a positive
    /// radius, and box corners in order.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Circle { center, radius } => {
                center.is_finite() && radius.is_finite() && radius > 0.0
            },
            Self::Box { min, max } => {
                min.is_finite() && max.is_finite() && min.x <= max.x && min.z <= max.z
            },
        }
    }

    /// Whether a point lies inside the region.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            Self::Circle { center, radius } => planar_distance(center, point) <= radius,
            Self::Box { min, max } => {
                point.x >= min.x && point.x <= max.x && point.z >= min.z && point.z <= max.z
            },
        }
    }

    /// Nearest point inside the region, keeping the point's height.
    #[must_use]
    pub fn nearest_inside(&self, point: Vec3) -> Vec3 {
        if self.contains(point) {
            return point;
        }
        match *self {
            Self::Circle { center, radius } => {
                let offset = planar(point - center);
                let len = offset.length();
                let reach = (radius - BOUNDARY_INSET).max(0.0);
                let flat = if len > 0.0 {
                    planar(center) + offset / len * reach
                } else {
                    planar(center)
                };
                Vec3::new(flat.x, point.y, flat.z)
            },
            Self::Box { min, max } => {
                let clamp = |v: f32, lo: f32, hi: f32| {
                    let (lo_in, hi_in) = (lo + BOUNDARY_INSET, hi - BOUNDARY_INSET);
                    if lo_in <= hi_in {
                        v.clamp(lo_in, hi_in)
                    } else {
                        (lo + hi) * 0.5
                    }
                };
                Vec3::new(clamp(point.x, min.x, max.x), point.y, clamp(point.z, min.z, max.z))
            },
        }
    }

    /// Center of the region on the ground plane.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        match *self {
            Self::Circle { center, .. } => planar(center),
            Self::Box { min, max } => planar((min + max) * 0.5),
        }
    }
}

/// Spatial containment service.
pub trait BoundaryProvider {
    /// Whether `point` lies inside `region`; `None` when the region is unknown.
    fn is_inside(&self, point: Vec3, region: RegionId) -> Option<bool>;
    /// Nearest permitted point of `region`; `None` when the region is unknown.
    fn nearest_inside(&self, point: Vec3, region: RegionId) -> Option<Vec3>;
    /// Center of `region`; `None` when the region is unknown.
    fn region_center(&self, region: RegionId) -> Option<Vec3>;
}

/// Table of named regions.
#[derive(Debug, Clone, Default)]
pub struct BoundaryMap {
    regions: AHashMap<RegionId, RegionShape>,
}

impl BoundaryMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a region.
    pub fn insert(&mut self, id: RegionId, shape: RegionShape) {
        self.regions.insert(id, shape);
    }

    /// Adds a region, builder style.
    #[must_use]
    pub fn with_region(mut self, id: RegionId, shape: RegionShape) -> Self {
        self.insert(id, shape);
        self
    }

    /// Returns whether a region is defined.
    #[must_use]
    pub fn contains_region(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    /// Returns a region's shape when it is defined and usable.
    #[must_use]
    pub fn usable(&self, id: RegionId) -> Option<&RegionShape> {
        self.regions.get(&id).filter(|shape| shape.is_valid())
    }
}

impl BoundaryProvider for BoundaryMap {
    fn is_inside(&self, point: Vec3, region: RegionId) -> Option<bool> {
        self.usable(region).map(|shape| shape.contains(point))
    }

    fn nearest_inside(&self, point: Vec3, region: RegionId) -> Option<Vec3> {
        self.usable(region).map(|shape| shape.nearest_inside(point))
    }

    fn region_center(&self, region: RegionId) -> Option<Vec3> {
        self.usable(region).map(RegionShape::center)
    }
}

/// The permitted area of one actor: the union of its assigned regions.
#[derive(Clone, Copy)]
pub struct Containment<'a> {
    provider: &'a dyn BoundaryProvider,
    regions: &'a [RegionId],
}

impl std::fmt::Debug for Containment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Containment")
            .field("regions", &self.regions)
            .finish_non_exhaustive()
    }
}

impl<'a> Containment<'a> {
    /// Creates a containment over `regions`.
    #[must_use]
    pub fn new(provider: &'a dyn BoundaryProvider, regions: &'a [RegionId]) -> Self {
        Self { provider, regions }
    }

    /// Whether `point` is permitted.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let mut known = false;
        for &region in self.regions {
            match self.provider.is_inside(point, region) {
                Some(true) => return true,
                Some(false) => known = true,
                None => {},
            }
        }
        !known
    }

    /// Nearest permitted point to `point` across all known regions.
    #[must_use]
    pub fn nearest_safe_point(&self, point: Vec3) -> Option<Vec3> {
        self.regions
            .iter()
            .filter_map(|&r| self.provider.nearest_inside(point, r))
            .min_by(|a, b| {
                planar_distance(point, *a).total_cmp(&planar_distance(point, *b))
            })
    }

    /// Point to turn toward when redirecting back inside.
    ///
    /// Prefers `home` when it is permitted, otherwise the center of the
    /// nearest region.
    #[must_use]
    pub fn inward_anchor(&self, point: Vec3, home: Vec3) -> Vec3 {
        if self.contains(home) {
            return home;
        }
        self.regions
            .iter()
            .filter_map(|&r| self.provider.region_center(r))
            .min_by(|a, b| {
                planar_distance(point, *a).total_cmp(&planar_distance(point, *b))
            })
            .unwrap_or(home)
    }

    /// Whether the straight path from `from` to `to`, sampled every `step`
    /// units, stays permitted.
    #[must_use]
    pub fn path_clear(&self, from: Vec3, to: Vec3, step: f32) -> bool {
        if !self.contains(to) {
            return false;
        }
        let length = planar_distance(from, to);
        if length <= f32::EPSILON || step <= 0.0 {
            return true;
        }
        let samples = (length / step).ceil() as u32;
        (1..samples).all(|i| {
            let t = i as f32 / samples as f32;
            self.contains(from.lerp(to, t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> BoundaryMap {
        BoundaryMap::new()
            .with_region(
                RegionId::new(1),
                RegionShape::Circle {
                    center: Vec3::ZERO,
                    radius: 10.0,
                },
            )
            .with_region(
                RegionId::new(2),
                RegionShape::Box {
                    min: Vec3::new(20.0, 0.0, -2.0),
                    max: Vec3::new(30.0, 0.0, 2.0),
                },
            )
    }

    #[test]
    fn test_circle_contains_and_nearest() {
        let shape = RegionShape::Circle {
            center: Vec3::ZERO,
            radius: 5.0,
        };
        assert!(shape.contains(Vec3::new(3.0, 9.0, 4.0)));
        let p = shape.nearest_inside(Vec3::new(10.0, 1.0, 0.0));
        assert!(shape.contains(p));
        assert!((p.x - 5.0).abs() < 0.05);
        assert_eq!(p.y, 1.0);
    }

    #[test]
    fn test_box_nearest_clamps() {
        let shape = RegionShape::Box {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(4.0, 0.0, 4.0),
        };
        let p = shape.nearest_inside(Vec3::new(-3.0, 0.0, 10.0));
        assert!(shape.contains(p));
        assert!(p.x < 0.1 && p.z > 3.9);
    }

    #[test]
    fn test_union_of_regions() {
        let map = arena();
        let regions = [RegionId::new(1), RegionId::new(2)];
        let containment = Containment::new(&map, &regions);

        assert!(containment.contains(Vec3::new(1.0, 0.0, 1.0)));
        assert!(containment.contains(Vec3::new(25.0, 0.0, 0.0)));
        assert!(!containment.contains(Vec3::new(15.0, 0.0, 0.0)));
    }

    #[test]
    fn test_nearest_safe_point_picks_closest_region() {
        let map = arena();
        let regions = [RegionId::new(1), RegionId::new(2)];
        let containment = Containment::new(&map, &regions);

        let p = containment
            .nearest_safe_point(Vec3::new(18.0, 0.0, 0.0))
            .expect("regions are known");
        assert!(p.x >= 20.0);
    }

    #[test]
    fn test_unknown_region_is_unrestricted() {
        let map = arena();
        let regions = [RegionId::new(99)];
        let containment = Containment::new(&map, &regions);
        assert!(containment.contains(Vec3::new(1000.0, 0.0, 1000.0)));
        assert!(containment.nearest_safe_point(Vec3::ZERO).is_none());
    }

    #[test]
    fn test_no_regions_is_unrestricted() {
        let map = arena();
        let containment = Containment::new(&map, &[]);
        assert!(containment.contains(Vec3::splat(500.0)));
    }

    #[test]
    fn test_path_clear_detects_gap() {
        let map = arena();
        let regions = [RegionId::new(1), RegionId::new(2)];
        let containment = Containment::new(&map, &regions);

        // Both ends are permitted but the path crosses the gap between regions
        assert!(!containment.path_clear(Vec3::ZERO, Vec3::new(25.0, 0.0, 0.0), 0.5));
        assert!(containment.path_clear(Vec3::ZERO, Vec3::new(5.0, 0.0, 5.0), 0.5));
    }

    #[test]
    fn test_inward_anchor_prefers_home() {
        let map = arena();
        let regions = [RegionId::new(1)];
        let containment = Containment::new(&map, &regions);
        let home = Vec3::new(2.0, 0.0, 2.0);
        assert_eq!(containment.inward_anchor(Vec3::new(9.0, 0.0, 0.0), home), home);

        let outside_home = Vec3::new(50.0, 0.0, 0.0);
        assert_eq!(
            containment.inward_anchor(Vec3::new(9.0, 0.0, 0.0), outside_home),
            Vec3::ZERO
        );
    }

    #[test]
    fn test_degenerate_shapes_are_invalid() {
        let inverted = RegionShape::Box {
            min: Vec3::new(10.0, 0.0, 10.0),
            max: Vec3::new(-10.0, 0.0, -10.0),
        };
        let empty = RegionShape::Circle {
            center: Vec3::ZERO,
            radius: 0.0,
        };
        let unbounded = RegionShape::Circle {
            center: Vec3::ZERO,
            radius: f32::INFINITY,
        };
        assert!(!inverted.is_valid());
        assert!(!empty.is_valid());
        assert!(!unbounded.is_valid());
        assert!(RegionShape::Box {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
        .is_valid());
    }

    #[test]
    fn test_invalid_region_is_unrestricted() {
        let map = BoundaryMap::new().with_region(
            RegionId::new(4),
            RegionShape::Box {
                min: Vec3::new(10.0, 0.0, 10.0),
                max: Vec3::new(-10.0, 0.0, -10.0),
            },
        );
        assert!(map.contains_region(RegionId::new(4)));
        assert!(map.usable(RegionId::new(4)).is_none());

        let regions = [RegionId::new(4)];
        let containment = Containment::new(&map, &regions);
        assert!(containment.contains(Vec3::new(3.0, 0.0, 0.0)));
        assert!(containment.nearest_safe_point(Vec3::new(3.0, 0.0, 0.0)).is_none());
        let home = Vec3::new(40.0, 0.0, 0.0);
        assert_eq!(containment.inward_anchor(Vec3::ZERO, home), home);
    }
}
