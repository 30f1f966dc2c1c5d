//! Best-time leaderboards, one per track
//!
//! Persisted as JSON; lower times rank higher.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_HIGH_SCORES, MAX_NAME_LEN};
use crate::persistence::{self, PersistenceError};

/// Receives finished race times
pub trait ScoreSink {
    /// Record a time; returns the rank achieved (1-indexed) if it made the board
    fn submit(&mut self, track_id: &str, name: &str, time_secs: f32) -> Option<usize>;
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    /// Finish time in seconds
    pub time_secs: f32,
}

/// Leaderboards keyed by track id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    #[serde(default = "default_capacity")]
    capacity: usize,
    tracks: BTreeMap<String, Vec<HighScoreEntry>>,
}

fn default_capacity() -> usize {
    MAX_HIGH_SCORES
}

impl Default for HighScores {
    fn default() -> Self {
        Self::new()
    }
}

impl HighScores {
    /// Empty leaderboards
    pub fn new() -> Self {
        Self::with_capacity(MAX_HIGH_SCORES)
    }

    /// Empty leaderboards keeping `capacity` entries per track
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tracks: BTreeMap::new(),
        }
    }

    /// Change the per-track length, dropping the slowest entries if shrinking
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        for entries in self.tracks.values_mut() {
            entries.truncate(self.capacity);
        }
    }

    /// Entries for a track, fastest first
    pub fn entries(&self, track_id: &str) -> &[HighScoreEntry] {
        self.tracks.get(track_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The fastest `n` entries for a track
    pub fn top(&self, track_id: &str, n: usize) -> &[HighScoreEntry] {
        let entries = self.entries(track_id);
        &entries[..n.min(entries.len())]
    }

    /// Best time on a track
    pub fn best_time(&self, track_id: &str) -> Option<f32> {
        self.entries(track_id).first().map(|e| e.time_secs)
    }

    /// Check if a time qualifies for a track's board
    pub fn qualifies(&self, track_id: &str, time_secs: f32) -> bool {
        if !time_secs.is_finite() || time_secs <= 0.0 {
            return false;
        }
        let entries = self.entries(track_id);
        if entries.len() < self.capacity {
            return true;
        }
        // Check if time beats the slowest entry
        entries.last().map(|e| time_secs < e.time_secs).unwrap_or(true)
    }

    /// Get the rank a time would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, track_id: &str, time_secs: f32) -> Option<usize> {
        if !self.qualifies(track_id, time_secs) {
            return None;
        }
        let entries = self.entries(track_id);
        let rank = entries.iter().position(|e| time_secs < e.time_secs);
        Some(rank.unwrap_or(entries.len()) + 1)
    }

    /// Add a time to a track's board (if it qualifies)
    ///
    /// Names are trimmed, lower-cased and cut to the display length; a blank
    /// name is not recorded. Returns the rank achieved (1-indexed).
    pub fn add_time(&mut self, track_id: &str, name: &str, time_secs: f32) -> Option<usize> {
        let name = clean_name(name)?;
        if !self.qualifies(track_id, time_secs) {
            return None;
        }

        let entries = self.tracks.entry(track_id.to_string()).or_default();
        let entry = HighScoreEntry { name, time_secs };

        // Ties keep the earlier entry ahead
        let pos = entries.iter().position(|e| time_secs < e.time_secs);
        let rank = match pos {
            Some(i) => {
                entries.insert(i, entry);
                i + 1
            }
            None => {
                entries.push(entry);
                entries.len()
            }
        };

        entries.truncate(self.capacity);
        log::info!("New {track_id} time {time_secs:.2}s at rank {rank}");
        Some(rank)
    }

    /// Check if no track has any entries
    pub fn is_empty(&self) -> bool {
        self.tracks.values().all(Vec::is_empty)
    }

    /// Load high scores from disk, starting fresh if missing or unreadable
    pub fn load(path: &Path) -> Self {
        match persistence::load_json::<HighScores>(path) {
            Ok(scores) => {
                log::info!("Loaded high scores for {} tracks", scores.tracks.len());
                scores
            }
            Err(PersistenceError::Missing { .. }) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("{e}; starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save_json(path, self)?;
        log::info!("High scores saved ({} tracks)", self.tracks.len());
        Ok(())
    }
}

impl ScoreSink for HighScores {
    fn submit(&mut self, track_id: &str, name: &str, time_secs: f32) -> Option<usize> {
        self.add_time(track_id, name, time_secs)
    }
}

/// Normalize a display name; `None` if nothing is left
pub fn clean_name(name: &str) -> Option<String> {
    let name: String = name.trim().to_lowercase().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() { None } else { Some(name) }
}
