//! Player profiles
//!
//! A profile remembers the last car and track a player picked and whether
//! sound is muted. The race only reads the car/track choice at setup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{DEFAULT_PLAYER_CAR_ID, DEFAULT_TRACK_ID};
use crate::highscores::clean_name;
use crate::persistence::{self, PersistenceError};

/// Profile used before anyone creates one
pub const DEFAULT_USERNAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    BlankName,
    NameTaken(String),
    UnknownProfile(String),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::BlankName => write!(f, "Profile name is blank"),
            ProfileError::NameTaken(name) => write!(f, "Profile `{name}` already exists"),
            ProfileError::UnknownProfile(name) => write!(f, "No profile named `{name}`"),
        }
    }
}

impl std::error::Error for ProfileError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub username: String,
    pub last_car_id: String,
    pub last_track_id: String,
    #[serde(default)]
    pub mute: bool,
}

impl PlayerProfile {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            last_car_id: DEFAULT_PLAYER_CAR_ID.to_string(),
            last_track_id: DEFAULT_TRACK_ID.to_string(),
            mute: false,
        }
    }

    /// Toggle mute
    pub fn update_mute(&mut self) {
        self.mute = !self.mute;
    }

    pub fn update_last_car_id(&mut self, car_id: &str) {
        self.last_car_id = car_id.to_string();
    }

    pub fn update_last_track_id(&mut self, track_id: &str) {
        self.last_track_id = track_id.to_string();
    }

    /// Whether this is the shared fallback profile
    pub fn is_default(&self) -> bool {
        self.username == DEFAULT_USERNAME
    }
}

/// All profiles keyed by username
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileStore {
    profiles: BTreeMap<String, PlayerProfile>,
}

impl Default for ProfileStore {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_USERNAME.to_string(), PlayerProfile::new(DEFAULT_USERNAME));
        Self { profiles }
    }
}

impl ProfileStore {
    pub fn get(&self, username: &str) -> Result<&PlayerProfile, ProfileError> {
        self.profiles
            .get(username)
            .ok_or_else(|| ProfileError::UnknownProfile(username.to_string()))
    }

    /// Profile by name, or the default profile
    pub fn get_or_default(&self, username: &str) -> PlayerProfile {
        self.profiles
            .get(username)
            .cloned()
            .unwrap_or_else(|| PlayerProfile::new(DEFAULT_USERNAME))
    }

    /// Usernames in order
    pub fn usernames(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Create a profile carrying over another profile's car, track and mute
    pub fn create(
        &mut self,
        username: &str,
        from: &PlayerProfile,
    ) -> Result<&PlayerProfile, ProfileError> {
        let username = clean_name(username).ok_or(ProfileError::BlankName)?;
        if self.profiles.contains_key(&username) {
            return Err(ProfileError::NameTaken(username));
        }

        let profile = PlayerProfile {
            username: username.clone(),
            ..from.clone()
        };
        log::info!("Created profile `{username}`");
        Ok(&*self.profiles.entry(username).or_insert(profile))
    }

    /// Store changes to an existing profile
    pub fn update(&mut self, profile: &PlayerProfile) -> Result<(), ProfileError> {
        match self.profiles.get_mut(&profile.username) {
            Some(slot) => {
                *slot = profile.clone();
                Ok(())
            }
            None => Err(ProfileError::UnknownProfile(profile.username.clone())),
        }
    }

    /// Load profiles from disk, falling back to just the default profile
    pub fn load(path: &Path) -> Self {
        match persistence::load_json::<ProfileStore>(path) {
            Ok(mut store) => {
                store
                    .profiles
                    .entry(DEFAULT_USERNAME.to_string())
                    .or_insert_with(|| PlayerProfile::new(DEFAULT_USERNAME));
                log::info!("Loaded {} profiles", store.profiles.len());
                store
            }
            Err(PersistenceError::Missing { .. }) => {
                log::info!("No profiles found, using default");
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using default profile");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save_json(path, self)?;
        log::info!("Profiles saved ({} profiles)", self.profiles.len());
        Ok(())
    }
}
