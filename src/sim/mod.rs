//! Race simulation module
//!
//! All gameplay logic lives here. No rendering, audio or storage:
//! - Fixed tick, one input snapshot per tick
//! - Pixel-mask collision against the track
//! - No globals; everything hangs off `RaceContext`

pub mod car;
pub mod controller;
pub mod error;
pub mod follower;
pub mod mask;
pub mod race;
pub mod track;

pub use car::{Car, CarSpec, Pose, Turn};
pub use controller::{Controller, drive_player};
pub use error::SetupError;
pub use follower::{PathFollower, path_length};
pub use mask::{Mask, collide, pixel_offset};
pub use race::{
    CarView, RaceContext, RaceEvent, RacePhase, RaceSession, RaceSnapshot, Racer, TickInput,
};
pub use track::{FinishCrossing, Track, TrackLayout};
