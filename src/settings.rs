//! Simulation settings
//!
//! Persisted as JSON next to the other stores.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::{self, PersistenceError};

/// Tuning for the race loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ticks per second
    pub fps: u32,
    /// Seconds a win/loss is shown before the race resets
    pub outcome_hold_secs: f32,
    /// Distance at which the computer car counts a waypoint as reached
    pub waypoint_reach_radius: f32,
    /// Leaderboard length per track
    pub max_high_scores: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: FPS,
            outcome_hold_secs: OUTCOME_HOLD_SECS,
            waypoint_reach_radius: WAYPOINT_REACH_RADIUS,
            max_high_scores: MAX_HIGH_SCORES,
        }
    }
}

impl Settings {
    /// Outcome hold in whole ticks
    pub fn outcome_hold_ticks(&self) -> u32 {
        (self.outcome_hold_secs.max(0.0) * self.fps as f32).round() as u32
    }

    /// Duration of one tick in seconds
    pub fn tick_secs(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Load settings from disk, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match persistence::load_json::<Settings>(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(PersistenceError::Missing { .. }) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save_json(path, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
