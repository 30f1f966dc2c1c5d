//! Pixel Racer - A top-down racing game against a waypoint-following rival
//!
//! Core modules:
//! - `sim`: Race simulation (car kinematics, mask collision, path follower, race state machine)
//! - `catalog`: Track and car definitions (track/car providers)
//! - `profiles`: Player profiles (last car/track, mute)
//! - `highscores`: Per-track best-time leaderboards
//! - `persistence`: JSON save/load shared by the stores above
//! - `settings`: Simulation tuning

pub mod catalog;
pub mod highscores;
pub mod persistence;
pub mod profiles;
pub mod settings;
pub mod sim;

pub use catalog::{CarProvider, Catalog, CatalogError, TrackProvider};
pub use highscores::{HighScores, ScoreSink};
pub use profiles::{PlayerProfile, ProfileStore};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Target simulation rate (ticks per second)
    pub const FPS: u32 = 60;

    /// Playfield dimensions (pixels)
    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 800;

    /// Waypoint counts as reached inside this distance (pixels)
    pub const WAYPOINT_REACH_RADIUS: f32 = 20.0;

    /// How long a win/loss stays on screen before the race resets
    pub const OUTCOME_HOLD_SECS: f32 = 2.0;

    /// Alpha above which a sprite pixel is solid
    pub const MASK_ALPHA_THRESHOLD: u8 = 127;

    /// Leaderboard length per track
    pub const MAX_HIGH_SCORES: usize = 10;

    /// Longest display name accepted for profiles and score entries
    pub const MAX_NAME_LEN: usize = 8;

    /// Car sprite size (pixels, unrotated)
    pub const CAR_WIDTH: u32 = 14;
    pub const CAR_HEIGHT: u32 = 28;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wrap an angle difference in degrees to (-180, 180]
#[inline]
pub fn wrap_degrees(mut delta: f32) -> f32 {
    delta = normalize_degrees(delta);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Unit vector a car with heading `angle` (degrees, 0 = up) travels along
#[inline]
pub fn heading_vector(angle: f32) -> glam::Vec2 {
    let radians = angle.to_radians();
    glam::Vec2::new(-radians.sin(), -radians.cos())
}

/// Heading (degrees, 0 = up) that points along `delta`
#[inline]
pub fn bearing(delta: glam::Vec2) -> f32 {
    normalize_degrees((-delta.x).atan2(-delta.y).to_degrees())
}
