// Game configuration loaded from RON, every field optional

use std::{fs, path::Path};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::engine::physics::{SolverSettings, DEFAULT_GRAVITY};

/// Errors raised while loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration (pixels/s², y up)
    pub gravity: Vec2,
    pub solver_iterations: u32,
    pub penetration_slop: f32,
    pub correction_percent: f32,
}
impl Default for PhysicsConfig {
    fn default() -> Self {
        let solver = SolverSettings::default();
        Self {
            gravity: DEFAULT_GRAVITY,
            solver_iterations: solver.iterations,
            penetration_slop: solver.penetration_slop,
            correction_percent: solver.correction_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Where the thrower stands (decorative, no body)
    pub player_position: Vec2,
    /// Where new projectiles spawn
    pub origin: Vec2,
    /// Drag length to impulse scale
    pub force_multiplier: f32,
}
impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            player_position: Vec2::new(150.0, 200.0),
            origin: Vec2::new(170.0, 200.0),
            force_multiplier: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Minimum speed for a body to break bamboo
    pub speed_threshold: f32,
    /// Contact depth a pair must exceed to count as touching
    pub overlap_tolerance: f32,
    /// Velocity factor applied to a projectile that breaks bamboo
    pub impact_slowdown: f32,
}
impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            speed_threshold: 100.0,
            overlap_tolerance: 0.0,
            impact_slowdown: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds between clearing a level and returning to level select
    pub completion_delay: f32,
}
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            completion_delay: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Centre of the static ground slab
    pub ground_center: Vec2,
    /// Width of the playfield, used to place the default tower
    pub screen_width: f32,
}
impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            ground_center: Vec2::new(640.0, 10.0),
            screen_width: 1280.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub launch: LaunchConfig,
    pub collision: CollisionConfig,
    pub session: SessionConfig,
    pub world: WorldConfig,
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Solver tuning for the physics world
    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            iterations: self.physics.solver_iterations,
            penetration_slop: self.physics.penetration_slop,
            correction_percent: self.physics.correction_percent,
        }
    }

    /// Non-fatal sanity checks. Returns one message per suspicious value.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.physics.gravity.is_finite() {
            warnings.push(format!("physics.gravity is not finite: {:?}", self.physics.gravity));
        }
        if self.physics.solver_iterations == 0 {
            warnings.push("physics.solver_iterations is 0; contacts will still get one pass".into());
        }
        if self.physics.penetration_slop < 0.0 {
            warnings.push(format!(
                "physics.penetration_slop {} is negative",
                self.physics.penetration_slop
            ));
        }
        if !(self.physics.correction_percent > 0.0 && self.physics.correction_percent <= 1.0) {
            warnings.push(format!(
                "physics.correction_percent {} outside (0, 1]",
                self.physics.correction_percent
            ));
        }
        if self.launch.force_multiplier <= 0.0 {
            warnings.push(format!(
                "launch.force_multiplier {} means throws never move",
                self.launch.force_multiplier
            ));
        }
        if self.collision.speed_threshold < 0.0 {
            warnings.push(format!(
                "collision.speed_threshold {} is negative",
                self.collision.speed_threshold
            ));
        }
        if self.collision.overlap_tolerance < 0.0 {
            warnings.push(format!(
                "collision.overlap_tolerance {} is negative",
                self.collision.overlap_tolerance
            ));
        }
        if !(0.0..=1.0).contains(&self.collision.impact_slowdown) {
            warnings.push(format!(
                "collision.impact_slowdown {} outside [0, 1]",
                self.collision.impact_slowdown
            ));
        }
        if self.session.completion_delay < 0.0 {
            warnings.push(format!(
                "session.completion_delay {} is negative",
                self.session.completion_delay
            ));
        }

        warnings
    }
}
