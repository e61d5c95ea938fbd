//! Behavior configuration.
//!
//! Shared timing constants live in [`BehaviorTuning`]; per-archetype stats
//! live in [`ActorProfile`]. Both can be loaded from and saved to TOML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use wildkeep_common::ConfigError;

use crate::aggression::BehaviorMode;
use crate::flight::FlightProfile;

/// Returns `value`, or `fallback` when `value` is NaN or infinite.
pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Timing and geometry constants shared by every actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Distance at which a wander waypoint counts as reached
    pub waypoint_reached_distance: f32,
    /// Spacing of the samples used to validate a straight wander path
    pub path_sample_step: f32,
    /// Attempts before waypoint generation gives up for one wait cycle
    pub waypoint_retry_limit: u32,
    /// Seconds spent turning toward a fresh waypoint before moving
    pub face_waypoint_time: f32,
    /// Stationary pause between losing a target and wandering again
    pub return_to_wander_pause: f32,
    /// Pause before an actor that hit its boundary picks a new heading
    pub redirect_pause: f32,
    /// Maximum random deviation (degrees) from the inward redirect heading
    pub redirect_angle_deg: f32,
    /// Fraction of the wander radius beyond which candidates are pulled in
    pub outward_limit_fraction: f32,
    /// Fraction of the wander radius that pulled-in candidates land on
    pub reproject_fraction: f32,
    /// Lateral spacing between followers sharing a leader
    pub formation_spacing: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            waypoint_reached_distance: 0.5,
            path_sample_step: 0.5,
            waypoint_retry_limit: 10,
            face_waypoint_time: 0.5,
            return_to_wander_pause: 2.0,
            redirect_pause: 0.75,
            redirect_angle_deg: 70.0,
            outward_limit_fraction: 0.8,
            reproject_fraction: 0.7,
            formation_spacing: 1.5,
        }
    }
}

impl BehaviorTuning {
    /// Validate and clamp values to sensible ranges.
    ///
    /// Non-finite values fall back to their defaults before clamping.
    pub fn validate(&mut self) {
        let d = Self::default();
        self.waypoint_reached_distance =
            finite_or(self.waypoint_reached_distance, d.waypoint_reached_distance).clamp(0.05, 10.0);
        self.path_sample_step = finite_or(self.path_sample_step, d.path_sample_step).clamp(0.05, 10.0);
        self.waypoint_retry_limit = self.waypoint_retry_limit.clamp(1, 100);
        self.face_waypoint_time =
            finite_or(self.face_waypoint_time, d.face_waypoint_time).clamp(0.0, 5.0);
        self.return_to_wander_pause =
            finite_or(self.return_to_wander_pause, d.return_to_wander_pause).clamp(0.0, 30.0);
        self.redirect_pause = finite_or(self.redirect_pause, d.redirect_pause).clamp(0.0, 10.0);
        self.redirect_angle_deg =
            finite_or(self.redirect_angle_deg, d.redirect_angle_deg).clamp(0.0, 180.0);
        self.reproject_fraction =
            finite_or(self.reproject_fraction, d.reproject_fraction).clamp(0.0, 1.0);
        self.outward_limit_fraction = finite_or(self.outward_limit_fraction, d.outward_limit_fraction)
            .clamp(self.reproject_fraction, 1.0);
        self.formation_spacing =
            finite_or(self.formation_spacing, d.formation_spacing).clamp(0.0, 20.0);
    }
}

/// Stats and policy for one actor archetype, fixed at spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorProfile {
    /// Maximum health handed to the health ledger
    pub max_health: f32,
    /// Forward speed in world units per second
    pub move_speed: f32,
    /// Turn rate (fraction of the remaining turn per second)
    pub rotation_speed: f32,
    /// Only advance once facing within `alignment_threshold_deg`
    pub turn_before_move: bool,
    /// Facing error tolerated before moving when `turn_before_move` is set
    pub alignment_threshold_deg: f32,
    /// Damage dealt per connected hit
    pub attack_damage: f32,
    /// Range within which an ongoing attack continues
    pub attack_distance: f32,
    /// Tighter range required to start attacking
    pub min_attack_distance: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Delay between an accepted attack and its hit landing
    pub hit_delay: f32,
    /// Radius of the proximity sensor
    pub sensing_radius: f32,
    /// A held target further than this is dropped
    pub leash_distance: f32,
    /// Aggression policy
    pub behavior_mode: BehaviorMode,
    /// Seconds a damage event keeps the actor aggravated
    pub aggro_memory_duration: f32,
    /// Territory around spawn for territorial actors
    pub territory_radius: Option<f32>,
    /// Whether the actor wanders when it has nothing to do
    pub wander_enabled: bool,
    /// Maximum wander distance from spawn, if limited
    pub wander_radius: Option<f32>,
    /// Shortest wander leg
    pub min_wander_distance: f32,
    /// Longest wander leg
    pub max_wander_distance: f32,
    /// Shortest pause between wander legs
    pub min_wait_time: f32,
    /// Longest pause between wander legs
    pub max_wait_time: f32,
    /// Idle time after spawning before the first wander
    pub initial_idle_time: f32,
    /// Followers start moving once the leader is further than this
    pub follow_distance: f32,
    /// Seconds a corpse stays before removal
    pub despawn_delay: f32,
    /// Present for airborne actors
    pub flight: Option<FlightProfile>,
}

impl Default for ActorProfile {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 3.5,
            rotation_speed: 8.0,
            turn_before_move: false,
            alignment_threshold_deg: 30.0,
            attack_damage: 10.0,
            attack_distance: 2.0,
            min_attack_distance: 1.8,
            attack_cooldown: 1.5,
            hit_delay: 0.3,
            sensing_radius: 12.0,
            leash_distance: 25.0,
            behavior_mode: BehaviorMode::Aggressive,
            aggro_memory_duration: 30.0,
            territory_radius: None,
            wander_enabled: true,
            wander_radius: Some(10.0),
            min_wander_distance: 2.0,
            max_wander_distance: 6.0,
            min_wait_time: 1.0,
            max_wait_time: 3.0,
            initial_idle_time: 0.5,
            follow_distance: 3.0,
            despawn_delay: 3.0,
            flight: None,
        }
    }
}

impl ActorProfile {
    /// Returns an airborne copy of this profile.
    #[must_use]
    pub fn with_flight(mut self, flight: FlightProfile) -> Self {
        self.flight = Some(flight);
        self
    }

    /// Sets the aggression policy.
    #[must_use]
    pub const fn with_mode(mut self, mode: BehaviorMode) -> Self {
        self.behavior_mode = mode;
        self
    }

    /// Validate and clamp values to sensible ranges.
    ///
    /// Non-finite values fall back to their defaults before clamping; a
    /// non-finite optional radius is dropped.
    pub fn validate(&mut self) {
        let d = Self::default();
        self.max_health = finite_or(self.max_health, d.max_health).max(1.0);
        self.move_speed = finite_or(self.move_speed, d.move_speed).clamp(0.0, 100.0);
        self.rotation_speed = finite_or(self.rotation_speed, d.rotation_speed).clamp(0.1, 100.0);
        self.alignment_threshold_deg =
            finite_or(self.alignment_threshold_deg, d.alignment_threshold_deg).clamp(1.0, 180.0);
        self.attack_damage = finite_or(self.attack_damage, d.attack_damage).max(0.0);
        self.attack_distance = finite_or(self.attack_distance, d.attack_distance).max(0.1);
        self.min_attack_distance = finite_or(self.min_attack_distance, d.min_attack_distance)
            .clamp(0.05, self.attack_distance);
        self.attack_cooldown = finite_or(self.attack_cooldown, d.attack_cooldown).max(0.0);
        self.hit_delay = finite_or(self.hit_delay, d.hit_delay).clamp(0.0, self.attack_cooldown);
        self.sensing_radius = finite_or(self.sensing_radius, d.sensing_radius).max(0.0);
        self.leash_distance =
            finite_or(self.leash_distance, d.leash_distance).max(self.sensing_radius);
        self.aggro_memory_duration =
            finite_or(self.aggro_memory_duration, d.aggro_memory_duration).max(0.0);
        self.territory_radius = self
            .territory_radius
            .filter(|r| r.is_finite())
            .map(|r| r.max(0.0));
        self.wander_radius = self
            .wander_radius
            .filter(|r| r.is_finite())
            .map(|r| r.max(0.5));
        self.min_wander_distance =
            finite_or(self.min_wander_distance, d.min_wander_distance).max(0.1);
        self.max_wander_distance = finite_or(self.max_wander_distance, d.max_wander_distance)
            .max(self.min_wander_distance);
        self.min_wait_time = finite_or(self.min_wait_time, d.min_wait_time).max(0.0);
        self.max_wait_time = finite_or(self.max_wait_time, d.max_wait_time).max(self.min_wait_time);
        self.initial_idle_time = finite_or(self.initial_idle_time, d.initial_idle_time).max(0.0);
        self.follow_distance = finite_or(self.follow_distance, d.follow_distance).max(0.5);
        self.despawn_delay = finite_or(self.despawn_delay, d.despawn_delay).max(0.0);
        if let Some(flight) = self.flight.as_mut() {
            flight.validate();
        }
    }
}

/// Complete behavior configuration: seed, tuning and named profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Seed for every actor's random stream
    pub seed: u64,
    /// Shared tuning
    pub tuning: BehaviorTuning,
    /// Archetypes by name
    pub profiles: HashMap<String, ActorProfile>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("grunt".to_string(), ActorProfile::default());
        profiles.insert(
            "grazer".to_string(),
            ActorProfile::default().with_mode(BehaviorMode::Passive),
        );
        profiles.insert(
            "critter".to_string(),
            ActorProfile::default().with_mode(BehaviorMode::UltraPassive),
        );
        profiles.insert(
            "bat".to_string(),
            ActorProfile::default().with_flight(FlightProfile::default()),
        );
        Self {
            seed: 0x5eed,
            tuning: BehaviorTuning::default(),
            profiles,
        }
    }
}

impl BehaviorConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Behavior config not found at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded behavior config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse behavior config: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read behavior config: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        info!("Saved behavior config to {}", path.display());
        Ok(())
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&ActorProfile> {
        self.profiles.get(name)
    }

    /// Validate and clamp every section.
    pub fn validate(&mut self) {
        self.tuning.validate();
        for profile in self.profiles.values_mut() {
            profile.validate();
        }
    }
}
