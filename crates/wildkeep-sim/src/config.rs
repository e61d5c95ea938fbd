//! Scenario configuration for the headless harness.
//!
//! A scenario bundles the behavior configuration with the containment regions
//! and the actors to place before the first tick. It is read from a TOML file;
//! a missing or unreadable file falls back to the built-in arena scenario.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wildkeep_ai::{BehaviorConfig, RegionShape, Team};
use wildkeep_common::{ConfigError, WildkeepResult};

/// Default scenario file name
const CONFIG_FILE: &str = "wildkeep.toml";

/// Returns the scenario path used when none is given on the command line.
#[must_use]
pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE)
}

/// Writes the built-in scenario to `path` for editing.
pub fn write_default(path: &Path) -> WildkeepResult<()> {
    SimConfig::default().save_to(path)?;
    Ok(())
}

/// A named containment region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region identifier referenced by spawns
    pub id: u32,
    /// Region geometry
    #[serde(flatten)]
    pub shape: RegionShape,
}

/// One spawn entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Profile name in `behavior.profiles`
    pub profile: String,
    /// Spawn position
    pub position: Vec3,
    /// Team the actor fights on
    pub team: Team,
    /// Regions the actor is confined to
    pub regions: Vec<u32>,
    /// Index of an earlier spawn entry to follow
    pub leader: Option<usize>,
    /// Removed immediately on death
    pub summoned: bool,
    /// Driven from outside; never ticks its own behavior
    pub controlled: bool,
    /// Overrides the profile's maximum health
    pub max_health: Option<f32>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            profile: "grunt".to_string(),
            position: Vec3::ZERO,
            team: Team::Wild,
            regions: Vec::new(),
            leader: None,
            summoned: false,
            controlled: false,
            max_health: None,
        }
    }
}

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per simulated second
    pub tick_rate: u32,
    /// Simulated seconds to run
    pub duration: f64,
    /// Seconds between summary log lines (0 disables)
    pub report_interval: f64,
    /// Behavior tuning and profiles
    pub behavior: BehaviorConfig,
    /// Containment regions
    pub regions: Vec<RegionConfig>,
    /// Actors placed before the first tick
    pub spawns: Vec<SpawnConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let arena = 1;
        let wild = |profile: &str, x: f32, z: f32| SpawnConfig {
            profile: profile.to_string(),
            position: Vec3::new(x, 0.0, z),
            regions: vec![arena],
            ..SpawnConfig::default()
        };

        Self {
            tick_rate: 20,
            duration: 60.0,
            report_interval: 10.0,
            behavior: BehaviorConfig::default(),
            regions: vec![RegionConfig {
                id: arena,
                shape: RegionShape::Circle {
                    center: Vec3::ZERO,
                    radius: 20.0,
                },
            }],
            spawns: vec![
                SpawnConfig {
                    position: Vec3::new(0.0, 0.0, 6.0),
                    team: Team::Player,
                    controlled: true,
                    max_health: Some(1000.0),
                    ..SpawnConfig::default()
                },
                SpawnConfig {
                    position: Vec3::new(2.0, 0.0, 5.0),
                    team: Team::Ally,
                    leader: Some(0),
                    ..SpawnConfig::default()
                },
                wild("grunt", -5.0, -2.0),
                wild("grunt", 5.0, -2.0),
                wild("grazer", 0.0, -10.0),
                wild("critter", -10.0, 2.0),
                wild("bat", 8.0, 4.0),
            ],
        }
    }
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Scenario not found at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded scenario from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse scenario: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read scenario: {e}");
                Self::default()
            },
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        info!("Saved scenario to {}", path.display());
        Ok(())
    }

    /// Fixed timestep in seconds.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Number of ticks needed to cover `duration`.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (self.duration * f64::from(self.tick_rate)).round() as u64
    }

    /// Validate and clamp values to acceptable ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(1, 240);
        self.duration = self.duration.clamp(0.0, 86_400.0);
        self.report_interval = self.report_interval.max(0.0);
        self.behavior.validate();
        for spawn in &mut self.spawns {
            if let Some(health) = spawn.max_health.as_mut() {
                *health = health.max(1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_scenario() {
        let config = SimConfig::default();
        assert_eq!(config.tick_rate, 20);
        assert_eq!(config.total_ticks(), 1200);
        assert!((config.fixed_dt() - 0.05).abs() < 1e-6);
        assert!(config.spawns.iter().any(|s| s.controlled));
        for spawn in &config.spawns {
            assert!(config.behavior.profile(&spawn.profile).is_some());
        }
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = SimConfig {
            tick_rate: 0,
            duration: -5.0,
            ..SimConfig::default()
        };
        config.spawns[0].max_health = Some(-3.0);
        config.validate();
        assert_eq!(config.tick_rate, 1);
        assert_eq!(config.duration, 0.0);
        assert_eq!(config.spawns[0].max_health, Some(1.0));
    }

    #[test]
    fn test_parse_partial_scenario() {
        let config = SimConfig::from_toml_str(
            r#"
            tick_rate = 30
            duration = 5.0

            [[regions]]
            id = 7
            shape = "box"
            min = [-4.0, 0.0, -4.0]
            max = [4.0, 0.0, 4.0]

            [[spawns]]
            profile = "bat"
            position = [1.0, 0.0, 1.0]
            regions = [7]
            "#,
        )
        .expect("scenario parses");

        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.regions[0].id, 7);
        assert!(matches!(config.regions[0].shape, RegionShape::Box { .. }));
        assert_eq!(config.spawns.len(), 1);
        assert_eq!(config.spawns[0].team, Team::Wild);
        assert!(!config.spawns[0].controlled);
        // Behavior section falls back to defaults
        assert!(config.behavior.profile("grunt").is_some());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("scenario.toml");

        let mut config = SimConfig::default();
        config.duration = 12.5;
        config.behavior.seed = 99;
        config.save_to(&path).expect("save");

        let loaded = SimConfig::load_from(&path);
        assert_eq!(loaded.duration, 12.5);
        assert_eq!(loaded.behavior.seed, 99);
        assert_eq!(loaded.spawns.len(), config.spawns.len());
        assert_eq!(loaded.regions, config.regions);
    }

    #[test]
    fn test_write_default_round_trips() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("wildkeep.toml");
        write_default(&path).expect("write default");
        let loaded = SimConfig::load_from(&path);
        let default = SimConfig::default();
        assert!(path.exists());
        assert_eq!(loaded.tick_rate, default.tick_rate);
        assert_eq!(loaded.regions, default.regions);
        assert_eq!(loaded.spawns, default.spawns);
    }

    #[test]
    fn test_load_missing_or_invalid_falls_back() {
        let dir = tempdir().expect("tempdir");
        let missing = SimConfig::load_from(dir.path().join("absent.toml"));
        assert_eq!(missing, SimConfig::default());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "tick_rate = \"fast\"").expect("write");
        assert_eq!(SimConfig::load_from(&bad), SimConfig::default());
    }
}
