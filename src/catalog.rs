//! Track and car catalog
//!
//! Serves track geometry and car tuning by id. A built-in catalog ships with
//! the crate; others can be loaded from JSON.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistenceError};
use crate::sim::{CarSpec, FinishCrossing, Mask, Pose, SetupError, Track, TrackLayout};

/// Car the computer always drives
pub const COMPUTER_CAR_ID: &str = "black_car";
pub const DEFAULT_PLAYER_CAR_ID: &str = "red_car";
pub const DEFAULT_TRACK_ID: &str = "oval";

#[derive(Debug)]
pub enum CatalogError {
    UnknownTrack(String),
    UnknownCar(String),
    Load(PersistenceError),
    Parse(serde_json::Error),
    Setup(SetupError),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::UnknownTrack(id) => write!(f, "Unknown track `{id}`"),
            CatalogError::UnknownCar(id) => write!(f, "Unknown car `{id}`"),
            CatalogError::Load(e) => write!(f, "Failed to load catalog: {e}"),
            CatalogError::Parse(e) => write!(f, "Failed to parse catalog: {e}"),
            CatalogError::Setup(e) => write!(f, "Invalid catalog entry: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Load(e) => Some(e),
            CatalogError::Parse(e) => Some(e),
            CatalogError::Setup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SetupError> for CatalogError {
    fn from(e: SetupError) -> Self {
        CatalogError::Setup(e)
    }
}

/// Looks up track geometry by id
pub trait TrackProvider {
    fn track(&self, id: &str) -> Result<Track, CatalogError>;
}

/// Looks up car tuning by id
pub trait CarProvider {
    fn car(&self, id: &str) -> Result<CarSpec, CatalogError>;
}

/// Serializable mask description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaskDef {
    /// Union of `[x, y, w, h]` rectangles
    Rects {
        width: u32,
        height: u32,
        rects: Vec<[u32; 4]>,
    },
    /// ASCII art, `#` solid
    Rows { rows: Vec<String> },
}

impl MaskDef {
    pub fn to_mask(&self) -> Mask {
        match self {
            MaskDef::Rects {
                width,
                height,
                rects,
            } => Mask::from_rects(*width, *height, rects),
            MaskDef::Rows { rows } => {
                let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
                Mask::from_rows(&rows)
            }
        }
    }
}

/// Serializable track description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDef {
    pub id: String,
    pub name: String,
    pub border: MaskDef,
    pub finish: MaskDef,
    pub finish_position: Vec2,
    #[serde(default)]
    pub finish_crossing: FinishCrossing,
    pub player_start: Pose,
    pub computer_start: Pose,
    pub waypoints: Vec<Vec2>,
    pub record_time_secs: f32,
}

impl TrackDef {
    pub fn build(&self) -> Result<Track, SetupError> {
        Track::new(TrackLayout {
            id: self.id.clone(),
            name: self.name.clone(),
            border_mask: self.border.to_mask(),
            finish_mask: self.finish.to_mask(),
            finish_position: self.finish_position,
            finish_crossing: self.finish_crossing,
            player_start: self.player_start,
            computer_start: self.computer_start,
            waypoints: self.waypoints.clone(),
            record_time_secs: self.record_time_secs,
        })
    }
}

/// All known cars and tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub cars: Vec<CarSpec>,
    pub tracks: Vec<TrackDef>,
}

impl Catalog {
    /// The cars and track that ship with the game
    pub fn builtin() -> Self {
        let cars = vec![
            CarSpec::new("red_car", "Red Car", 4.0, 4.0, 1.0),
            CarSpec::new("green_car", "Green Car", 4.0, 4.0, 1.0),
            CarSpec::new("grey_car", "Grey Car", 4.0, 4.0, 1.0),
            CarSpec::new("purple_car", "Purple Car", 4.0, 4.0, 1.0),
            CarSpec::new("white_car", "White Car", 4.0, 4.0, 1.0),
            CarSpec::new(COMPUTER_CAR_ID, "Black Car", 4.0, 4.0, 1.0),
        ];
        Self {
            cars,
            tracks: vec![oval_track()],
        }
    }

    /// Parse and validate a catalog
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json).map_err(CatalogError::Parse)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let catalog: Catalog = persistence::load_json(path).map_err(CatalogError::Load)?;
        catalog.validate()?;
        log::info!(
            "Loaded catalog: {} cars, {} tracks",
            catalog.cars.len(),
            catalog.tracks.len()
        );
        Ok(catalog)
    }

    /// Every entry must build
    pub fn validate(&self) -> Result<(), CatalogError> {
        for car in &self.cars {
            car.validate()?;
        }
        for track in &self.tracks {
            track.build()?;
        }
        Ok(())
    }

    /// Cars offered to the player, sorted by name
    pub fn player_cars(&self) -> Vec<&CarSpec> {
        let mut cars: Vec<&CarSpec> = self
            .cars
            .iter()
            .filter(|c| c.id != COMPUTER_CAR_ID)
            .collect();
        cars.sort_by(|a, b| a.name.cmp(&b.name));
        cars
    }

    /// Track ids and names, sorted by name
    pub fn track_names(&self) -> Vec<(&str, &str)> {
        let mut tracks: Vec<(&str, &str)> = self
            .tracks
            .iter()
            .map(|t| (t.id.as_str(), t.name.as_str()))
            .collect();
        tracks.sort_by(|a, b| a.1.cmp(b.1));
        tracks
    }
}

impl TrackProvider for Catalog {
    fn track(&self, id: &str) -> Result<Track, CatalogError> {
        let def = self
            .tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CatalogError::UnknownTrack(id.to_string()))?;
        Ok(def.build()?)
    }
}

impl CarProvider for Catalog {
    fn car(&self, id: &str) -> Result<CarSpec, CatalogError> {
        self.cars
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownCar(id.to_string()))
    }
}

/// 800x800 loop around a central island, driven clockwise
///
/// The finish strip crosses the left channel; both cars start just past it.
fn oval_track() -> TrackDef {
    TrackDef {
        id: DEFAULT_TRACK_ID.to_string(),
        name: "Oval".to_string(),
        border: MaskDef::Rects {
            width: 800,
            height: 800,
            rects: vec![
                [0, 0, 800, 40],
                [0, 760, 800, 40],
                [0, 0, 40, 800],
                [760, 0, 40, 800],
                [240, 240, 320, 320],
            ],
        },
        finish: MaskDef::Rects {
            width: 200,
            height: 10,
            rects: vec![[0, 0, 200, 10]],
        },
        finish_position: Vec2::new(40.0, 420.0),
        finish_crossing: FinishCrossing::Up,
        player_start: Pose::new(150.0, 370.0, 0.0),
        computer_start: Pose::new(90.0, 370.0, 0.0),
        waypoints: [
            (130.0, 200.0),
            (200.0, 120.0),
            (400.0, 120.0),
            (600.0, 120.0),
            (670.0, 200.0),
            (670.0, 400.0),
            (670.0, 600.0),
            (600.0, 670.0),
            (400.0, 670.0),
            (200.0, 670.0),
            (130.0, 600.0),
            (130.0, 480.0),
            // Past the line so the car is still driving when it crosses
            (130.0, 380.0),
        ]
        .into_iter()
        .map(|(x, y)| Vec2::new(x, y))
        .collect(),
        record_time_secs: 12.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::{RaceContext, RacePhase, TickInput};

    #[test]
    fn test_builtin_is_valid() {
        let catalog = Catalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.player_cars().len(), 5);
        assert!(catalog.player_cars().iter().all(|c| c.id != COMPUTER_CAR_ID));
        assert_eq!(catalog.track_names(), vec![("oval", "Oval")]);
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.car("green_car").unwrap().name, "Green Car");
        assert!(matches!(catalog.car("blue_car"), Err(CatalogError::UnknownCar(_))));
        assert_eq!(catalog.track("oval").unwrap().name(), "Oval");
        assert!(matches!(catalog.track("nope"), Err(CatalogError::UnknownTrack(_))));
    }

    #[test]
    fn test_json_catalog() {
        let json = r#"{
            "cars": [
                {
                    "id": "kart",
                    "name": "Kart",
                    "max_velocity": 3.0,
                    "rotation_speed": 5.0,
                    "acceleration": 0.5
                }
            ],
            "tracks": [{
                "id": "tiny",
                "name": "Tiny",
                "border": { "width": 100, "height": 100, "rects": [[0, 0, 100, 5]] },
                "finish": { "rows": ["XXXX", "XXXX"] },
                "finish_position": [10.0, 50.0],
                "player_start": { "position": [20.0, 10.0] },
                "computer_start": { "position": [40.0, 10.0], "angle": 180.0 },
                "waypoints": [[40.0, 80.0]],
                "record_time_secs": 5.0
            }]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        let kart = catalog.car("kart").unwrap();
        assert_eq!(kart.sprite_size, [crate::consts::CAR_WIDTH, crate::consts::CAR_HEIGHT]);

        let track = catalog.track("tiny").unwrap();
        assert_eq!(track.finish_mask().count(), 8);
        assert_eq!(track.finish_crossing(), FinishCrossing::Up);
        assert_eq!(track.computer_start().angle, 180.0);
    }

    #[test]
    fn test_json_catalog_rejects_bad_track() {
        let json = r#"{
            "cars": [],
            "tracks": [{
                "id": "empty",
                "name": "Empty",
                "border": { "width": 10, "height": 10, "rects": [] },
                "finish": { "width": 4, "height": 2, "rects": [[0, 0, 4, 2]] },
                "finish_position": [0.0, 0.0],
                "player_start": { "position": [0.0, 0.0] },
                "computer_start": { "position": [0.0, 0.0] },
                "waypoints": [],
                "record_time_secs": 5.0
            }]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::Setup(SetupError::EmptyWaypoints { .. }))
        ));
        assert!(matches!(Catalog::from_json("[]"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_oval_starts_clear_of_walls_and_line() {
        let catalog = Catalog::builtin();
        let ctx = RaceContext::new(
            catalog.track(DEFAULT_TRACK_ID).unwrap(),
            catalog.car(DEFAULT_PLAYER_CAR_ID).unwrap(),
            catalog.car(COMPUTER_CAR_ID).unwrap(),
            &Settings::default(),
        )
        .unwrap();
        let track = ctx.track();
        for racer in [ctx.player(), ctx.computer()] {
            assert!(racer.car.collide(track.border_mask(), Vec2::ZERO).is_none());
            assert!(racer.car.collide(track.finish_mask(), track.finish_position()).is_none());
        }
    }

    #[test]
    fn test_computer_laps_the_oval() {
        let catalog = Catalog::builtin();
        let settings = Settings::default();
        let mut ctx = RaceContext::new(
            catalog.track(DEFAULT_TRACK_ID).unwrap(),
            catalog.car(DEFAULT_PLAYER_CAR_ID).unwrap(),
            catalog.car(COMPUTER_CAR_ID).unwrap(),
            &settings,
        )
        .unwrap();

        ctx.tick(&TickInput {
            start: true,
            ..Default::default()
        });
        let budget = 3 * (12.0 * settings.fps as f32) as u32;
        let mut ticks = 0;
        while ctx.phase() == RacePhase::Running && ticks < budget {
            ctx.tick(&TickInput::default());
            ticks += 1;
        }
        assert_eq!(ctx.phase(), RacePhase::Lost);
    }
}
