//! # Wildkeep Common
//!
//! Common types, utilities, and shared abstractions for Wildkeep.
//!
//! This crate provides foundational types used across the actor simulation:
//! - ID types (ActorId, RegionId)
//! - Planar geometry helpers on top of glam
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;

pub use glam::{Quat, Vec3};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use glam::{Quat, Vec3};
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_actor_id() {
        assert!(ActorId::from_raw(1).is_valid());
        assert!(!ActorId::NULL.is_valid());
    }

    #[test]
    fn test_actor_id_raw_roundtrip() {
        let id = ActorId::from_raw(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.to_string(), "actor#42");
    }

    #[test]
    fn test_region_id_display() {
        assert_eq!(RegionId::new(3).to_string(), "region#3");
    }
}
