//! Track geometry snapshot consumed by the race

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::car::Pose;
use super::error::{SetupError, require_finite, require_positive};
use super::mask::Mask;

/// Direction a car must travel across the finish strip to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishCrossing {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

/// Motion along the crossing axis below this (pixels/tick) counts as none
const CROSSING_EPSILON: f32 = 1e-3;

impl FinishCrossing {
    /// Unit direction a finishing car travels in
    pub fn direction(self) -> Vec2 {
        match self {
            FinishCrossing::Up => Vec2::NEG_Y,
            FinishCrossing::Down => Vec2::Y,
            FinishCrossing::Left => Vec2::NEG_X,
            FinishCrossing::Right => Vec2::X,
        }
    }

    /// Whether a car touching the strip while moving by `motion` came from beyond the line
    ///
    /// The direction of travel decides. A car with no motion along the
    /// crossing axis falls back to [`FinishCrossing::is_wrong_side`].
    pub fn is_wrong_way(self, motion: Vec2, point: IVec2, strip: IVec2) -> bool {
        let along = motion.dot(self.direction());
        if along > CROSSING_EPSILON {
            false
        } else if along < -CROSSING_EPSILON {
            true
        } else {
            self.is_wrong_side(point, strip)
        }
    }

    /// Whether a finish-strip contact point lies on the exit half of the strip
    ///
    /// A car driving the right way touches the entry half first; contact on
    /// the exit half means it came from beyond the line. Points exactly on the
    /// midline count as the exit half, so an ambiguous contact never finishes.
    pub fn is_wrong_side(self, point: IVec2, strip: IVec2) -> bool {
        // Doubled coordinates keep odd strip sizes exact
        let p = point * 2 + IVec2::ONE;
        match self {
            FinishCrossing::Up => p.y <= strip.y,
            FinishCrossing::Down => p.y >= strip.y,
            FinishCrossing::Left => p.x <= strip.x,
            FinishCrossing::Right => p.x >= strip.x,
        }
    }
}

/// Parts of a track before validation
#[derive(Debug, Clone)]
pub struct TrackLayout {
    pub id: String,
    pub name: String,
    /// Walls, placed at the origin
    pub border_mask: Mask,
    pub finish_mask: Mask,
    /// Top-left of the finish strip
    pub finish_position: Vec2,
    pub finish_crossing: FinishCrossing,
    pub player_start: Pose,
    pub computer_start: Pose,
    /// Racing line for the computer car, in driving order
    pub waypoints: Vec<Vec2>,
    /// Best human time (seconds); paces the computer car
    pub record_time_secs: f32,
}

/// Immutable track geometry
#[derive(Debug, Clone)]
pub struct Track {
    layout: TrackLayout,
}

impl Track {
    pub fn new(layout: TrackLayout) -> Result<Self, SetupError> {
        if layout.waypoints.is_empty() {
            return Err(SetupError::EmptyWaypoints {
                track_id: layout.id.clone(),
            });
        }
        require_positive("record_time_secs", layout.record_time_secs)?;
        for point in &layout.waypoints {
            require_finite("waypoint", point.x)?;
            require_finite("waypoint", point.y)?;
        }
        require_finite("finish_position", layout.finish_position.x)?;
        require_finite("finish_position", layout.finish_position.y)?;
        if layout.finish_mask.is_empty() {
            return Err(SetupError::EmptyMask { what: "finish" });
        }
        log::debug!(
            "Track `{}`: {} waypoints, record {:.2}s",
            layout.id,
            layout.waypoints.len(),
            layout.record_time_secs
        );
        Ok(Self { layout })
    }

    pub fn id(&self) -> &str {
        &self.layout.id
    }

    pub fn name(&self) -> &str {
        &self.layout.name
    }

    pub fn border_mask(&self) -> &Mask {
        &self.layout.border_mask
    }

    pub fn finish_mask(&self) -> &Mask {
        &self.layout.finish_mask
    }

    pub fn finish_position(&self) -> Vec2 {
        self.layout.finish_position
    }

    pub fn finish_crossing(&self) -> FinishCrossing {
        self.layout.finish_crossing
    }

    pub fn player_start(&self) -> Pose {
        self.layout.player_start
    }

    pub fn computer_start(&self) -> Pose {
        self.layout.computer_start
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.layout.waypoints
    }

    pub fn record_time_secs(&self) -> f32 {
        self.layout.record_time_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TrackLayout {
        TrackLayout {
            id: "test".into(),
            name: "Test".into(),
            border_mask: Mask::new(100, 100),
            finish_mask: Mask::filled(40, 10),
            finish_position: Vec2::new(10.0, 50.0),
            finish_crossing: FinishCrossing::Up,
            player_start: Pose::new(20.0, 10.0, 0.0),
            computer_start: Pose::new(40.0, 10.0, 0.0),
            waypoints: vec![Vec2::new(20.0, 5.0)],
            record_time_secs: 10.0,
        }
    }

    #[test]
    fn test_valid_track() {
        let track = Track::new(layout()).unwrap();
        assert_eq!(track.id(), "test");
        assert_eq!(track.waypoints().len(), 1);
        assert_eq!(track.record_time_secs(), 10.0);
    }

    #[test]
    fn test_empty_waypoints_rejected() {
        let mut l = layout();
        l.waypoints.clear();
        assert_eq!(
            Track::new(l).unwrap_err(),
            SetupError::EmptyWaypoints { track_id: "test".into() }
        );
    }

    #[test]
    fn test_bad_record_rejected() {
        let mut l = layout();
        l.record_time_secs = 0.0;
        assert!(Track::new(l).is_err());
    }

    #[test]
    fn test_wrong_side_up() {
        let strip = IVec2::new(40, 10);
        // Up: rows 0..5 are the exit half
        assert!(FinishCrossing::Up.is_wrong_side(IVec2::new(5, 0), strip));
        assert!(FinishCrossing::Up.is_wrong_side(IVec2::new(5, 4), strip));
        assert!(!FinishCrossing::Up.is_wrong_side(IVec2::new(5, 5), strip));
        assert!(!FinishCrossing::Up.is_wrong_side(IVec2::new(5, 9), strip));
    }

    #[test]
    fn test_wrong_side_other_directions() {
        let strip = IVec2::new(10, 9);
        assert!(FinishCrossing::Down.is_wrong_side(IVec2::new(0, 8), strip));
        // Middle row of an odd strip is ambiguous: never a finish
        assert!(FinishCrossing::Down.is_wrong_side(IVec2::new(0, 4), strip));
        assert!(FinishCrossing::Up.is_wrong_side(IVec2::new(0, 4), strip));
        assert!(!FinishCrossing::Down.is_wrong_side(IVec2::new(0, 3), strip));

        assert!(FinishCrossing::Left.is_wrong_side(IVec2::new(0, 0), strip));
        assert!(!FinishCrossing::Left.is_wrong_side(IVec2::new(9, 0), strip));
        assert!(FinishCrossing::Right.is_wrong_side(IVec2::new(9, 0), strip));
        assert!(!FinishCrossing::Right.is_wrong_side(IVec2::new(4, 0), strip));
    }

    #[test]
    fn test_wrong_way_follows_travel() {
        let strip = IVec2::new(40, 10);
        // Deep in the exit half but moving up: a correct crossing
        assert!(!FinishCrossing::Up.is_wrong_way(Vec2::new(0.0, -6.0), IVec2::new(5, 0), strip));
        // Entry half but moving down: came from beyond the line
        assert!(FinishCrossing::Up.is_wrong_way(Vec2::new(0.0, 2.0), IVec2::new(5, 9), strip));
        // Reversing leftward still counts as travelling left
        assert!(!FinishCrossing::Left.is_wrong_way(Vec2::new(-3.0, 0.5), IVec2::new(0, 0), strip));
        // Sideways contact falls back to the half test
        assert!(FinishCrossing::Up.is_wrong_way(Vec2::new(4.0, 0.0), IVec2::new(5, 2), strip));
        assert!(!FinishCrossing::Up.is_wrong_way(Vec2::ZERO, IVec2::new(5, 8), strip));
    }
}
