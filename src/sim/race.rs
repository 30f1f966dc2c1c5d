//! Race state machine
//!
//! One `RaceContext` owns the track, both cars and the session clock. The
//! caller feeds it one `TickInput` per frame; it moves the cars, resolves
//! collisions and walks the race through its phases.

use std::time::Instant;

use glam::Vec2;

use super::car::{Car, CarSpec, Pose};
use super::controller::Controller;
use super::error::{SetupError, require_positive};
use super::follower::PathFollower;
use super::track::Track;
use crate::settings::Settings;

/// Intents for a single tick; anything not set is "not pressed"
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub forward: bool,
    pub reverse: bool,
    pub left: bool,
    pub right: bool,
    /// Any other key (starts the race)
    pub start: bool,
    pub quit: bool,
}

impl TickInput {
    /// Whether any key that starts the race is down
    pub fn any_key(&self) -> bool {
        self.forward || self.reverse || self.left || self.right || self.start
    }
}

/// Current phase of a race attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RacePhase {
    /// Frozen until a key is pressed
    NotStarted,
    Running,
    /// Computer car crossed the line first
    Lost,
    /// Player crossed the line; time in seconds
    Won { time_secs: f32 },
}

/// Things that happened during a tick, for audio/HUD/score collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    Started,
    /// Player hit a wall or the back of the finish line
    PlayerBounced,
    Lost,
    /// Player won; submit to a score sink
    Finished { track_id: String, time_secs: f32 },
    /// Race back at the start line
    Reset,
    Quit,
}

/// Race clock
#[derive(Debug, Clone, Default)]
pub struct RaceSession {
    started_at: Option<Instant>,
    ticks: u64,
    /// Elapsed time pinned when the race ended
    stopped_secs: Option<f32>,
}

impl RaceSession {
    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.ticks = 0;
        self.stopped_secs = None;
    }

    /// Stop the clock at `now`, returning the final time
    pub fn stop_at(&mut self, now: Instant) -> f32 {
        let secs = self.elapsed_secs_at(now);
        self.stopped_secs = Some(secs);
        secs
    }

    /// Simulation ticks since the start
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Wall-clock seconds since the start, to the hundredth; 0 before the
    /// start and frozen once stopped
    pub fn elapsed_secs_at(&self, now: Instant) -> f32 {
        if let Some(secs) = self.stopped_secs {
            return secs;
        }
        match self.started_at {
            Some(start) => {
                let secs = now.saturating_duration_since(start).as_secs_f32();
                (secs * 100.0).round() / 100.0
            }
            None => 0.0,
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs_at(Instant::now())
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.ticks = 0;
        self.stopped_secs = None;
    }
}

/// A car plus whatever drives it
#[derive(Debug, Clone)]
pub struct Racer {
    pub car: Car,
    pub controller: Controller,
}

impl Racer {
    fn drive(&mut self, input: &TickInput) {
        self.controller.drive(&mut self.car, input);
    }

    fn reset(&mut self) {
        self.car.reset();
        self.controller.reset();
    }
}

/// Car state exposed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarView {
    pub pose: Pose,
    pub velocity: f32,
}

impl From<&Car> for CarView {
    fn from(car: &Car) -> Self {
        Self {
            pose: car.pose(),
            velocity: car.velocity(),
        }
    }
}

/// Everything the render sink needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RaceSnapshot {
    pub phase: RacePhase,
    pub player: CarView,
    pub computer: CarView,
    pub elapsed_secs: f32,
    pub record_time_secs: f32,
    /// Waypoint the computer car is steering at (debug overlay)
    pub computer_target: Option<Vec2>,
}

/// Session, both cars and the track
#[derive(Debug, Clone)]
pub struct RaceContext {
    track: Track,
    player: Racer,
    computer: Racer,
    session: RaceSession,
    phase: RacePhase,
    /// Ticks left before a finished race resets
    hold_ticks: u32,
    settings: Settings,
    events: Vec<RaceEvent>,
}

impl RaceContext {
    pub fn new(
        track: Track,
        player_spec: CarSpec,
        computer_spec: CarSpec,
        settings: &Settings,
    ) -> Result<Self, SetupError> {
        require_positive("fps", settings.fps as f32)?;
        require_positive("waypoint_reach_radius", settings.waypoint_reach_radius)?;

        let player = Racer {
            car: Car::player(player_spec, track.player_start())?,
            controller: Controller::Player,
        };
        let computer = Self::computer_racer(&track, computer_spec, settings)?;

        log::info!(
            "Race on `{}`: {} vs {}",
            track.id(),
            player.car.spec().id,
            computer.car.spec().id
        );

        Ok(Self {
            track,
            player,
            computer,
            session: RaceSession::default(),
            phase: RacePhase::NotStarted,
            hold_ticks: 0,
            settings: settings.clone(),
            events: Vec::new(),
        })
    }

    fn computer_racer(
        track: &Track,
        spec: CarSpec,
        settings: &Settings,
    ) -> Result<Racer, SetupError> {
        let start = track.computer_start();
        let car = Car::computer(spec, start)?;
        let follower = PathFollower::paced(
            track.waypoints().to_vec(),
            start.position,
            track.record_time_secs(),
            settings.fps,
            settings.waypoint_reach_radius,
        );
        if follower.target_velocity() > car.spec().max_velocity {
            log::warn!(
                "`{}` tops out at {:.2}px/tick, slower than the {:.2}px/tick record pace on `{}`",
                car.spec().id,
                car.spec().max_velocity,
                follower.target_velocity(),
                track.id()
            );
        }
        Ok(Racer {
            car,
            controller: Controller::Follower(follower),
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn player(&self) -> &Racer {
        &self.player
    }

    pub fn computer(&self) -> &Racer {
        &self.computer
    }

    pub fn session(&self) -> &RaceSession {
        &self.session
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    /// Take the events produced by the latest tick
    ///
    /// Each tick starts a fresh list, so events not drained before the next
    /// tick are dropped.
    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Swap the player's car, back at the start line
    pub fn set_player_car(&mut self, spec: CarSpec) -> Result<(), SetupError> {
        self.player.car = Car::player(spec, self.track.player_start())?;
        self.reset();
        Ok(())
    }

    /// Move the race to another track, keeping both car models
    pub fn set_track(&mut self, track: Track) -> Result<(), SetupError> {
        let player = Car::player(self.player.car.spec().clone(), track.player_start())?;
        let computer_spec = self.computer.car.spec().clone();
        let computer = Self::computer_racer(&track, computer_spec, &self.settings)?;
        self.player.car = player;
        self.computer = computer;
        self.track = track;
        self.reset();
        Ok(())
    }

    /// Advance one tick using the wall clock
    pub fn tick(&mut self, input: &TickInput) {
        self.tick_at(input, Instant::now());
    }

    /// Advance one tick with `now` as the current time
    pub fn tick_at(&mut self, input: &TickInput, now: Instant) {
        self.events.clear();
        if input.quit {
            self.events.push(RaceEvent::Quit);
            return;
        }

        match self.phase {
            RacePhase::NotStarted => {
                if input.any_key() {
                    self.session.start_at(now);
                    self.phase = RacePhase::Running;
                    self.events.push(RaceEvent::Started);
                    log::info!("Race started on `{}`", self.track.id());
                }
            }
            RacePhase::Running => self.step(input, now),
            RacePhase::Lost | RacePhase::Won { .. } => {
                self.hold_ticks = self.hold_ticks.saturating_sub(1);
                if self.hold_ticks == 0 {
                    self.reset();
                }
            }
        }
    }

    fn step(&mut self, input: &TickInput, now: Instant) {
        self.session.ticks += 1;

        self.player.drive(input);
        self.computer.drive(input);

        let finish_mask = self.track.finish_mask();
        let finish_pos = self.track.finish_position();

        if self.player.car.collide(self.track.border_mask(), Vec2::ZERO).is_some() {
            self.player.car.bounce();
            self.events.push(RaceEvent::PlayerBounced);
        }

        if self.computer.car.collide(finish_mask, finish_pos).is_some() {
            log::info!("Computer finished first after {} ticks", self.session.ticks);
            self.session.stop_at(now);
            self.finish(RacePhase::Lost);
            self.events.push(RaceEvent::Lost);
            return;
        }

        if let Some(point) = self.player.car.collide(finish_mask, finish_pos) {
            let motion = self.player.car.motion();
            let crossing = self.track.finish_crossing();
            if crossing.is_wrong_way(motion, point, finish_mask.size()) {
                self.player.car.bounce();
                self.events.push(RaceEvent::PlayerBounced);
            } else {
                let time_secs = self.session.stop_at(now);
                log::info!("Player finished `{}` in {:.2}s", self.track.id(), time_secs);
                self.finish(RacePhase::Won { time_secs });
                self.events.push(RaceEvent::Finished {
                    track_id: self.track.id().to_string(),
                    time_secs,
                });
            }
        }
    }

    fn finish(&mut self, phase: RacePhase) {
        self.phase = phase;
        self.hold_ticks = self.settings.outcome_hold_ticks().max(1);
    }

    /// Both cars back to the start, clock cleared
    pub fn reset(&mut self) {
        self.player.reset();
        self.computer.reset();
        self.session.reset();
        self.phase = RacePhase::NotStarted;
        self.hold_ticks = 0;
        self.events.push(RaceEvent::Reset);
        log::debug!("Race reset on `{}`", self.track.id());
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            phase: self.phase,
            player: CarView::from(&self.player.car),
            computer: CarView::from(&self.computer.car),
            elapsed_secs: self.session.elapsed_secs(),
            record_time_secs: self.track.record_time_secs(),
            computer_target: self
                .computer
                .controller
                .follower()
                .and_then(PathFollower::current_target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::controller::drive_player;
    use crate::sim::mask::Mask;
    use crate::sim::track::{FinishCrossing, TrackLayout};
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(16);

    fn player_spec() -> CarSpec {
        CarSpec::new("red_car", "Red Car", 4.0, 4.0, 1.0)
    }

    fn computer_spec() -> CarSpec {
        CarSpec::new("black_car", "Black Car", 4.0, 4.0, 0.5)
    }

    /// 400x400 box with 10px walls; finish strip across x 60..160 at y 200..210
    fn layout() -> TrackLayout {
        TrackLayout {
            id: "box".into(),
            name: "Box".into(),
            border_mask: Mask::from_rects(
                400,
                400,
                &[[0, 0, 400, 10], [0, 390, 400, 10], [0, 0, 10, 400], [390, 0, 10, 400]],
            ),
            finish_mask: Mask::filled(100, 10),
            finish_position: Vec2::new(60.0, 200.0),
            finish_crossing: FinishCrossing::Up,
            player_start: Pose::new(100.0, 300.0, 0.0),
            // Parked out of the way, crawling toward the bottom wall
            computer_start: Pose::new(300.0, 300.0, 0.0),
            waypoints: vec![Vec2::new(300.0, 350.0)],
            record_time_secs: 100.0,
        }
    }

    fn race(layout: TrackLayout) -> RaceContext {
        RaceContext::new(
            Track::new(layout).unwrap(),
            player_spec(),
            computer_spec(),
            &Settings::default(),
        )
        .unwrap()
    }

    fn forward() -> TickInput {
        TickInput {
            forward: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_frozen_until_key() {
        let mut ctx = race(layout());
        let t0 = Instant::now();
        for i in 0..5 {
            ctx.tick_at(&TickInput::default(), t0 + TICK * i);
        }
        assert_eq!(ctx.phase(), RacePhase::NotStarted);
        assert_eq!(ctx.player().car.position(), Vec2::new(100.0, 300.0));
        assert!(!ctx.session().is_started());

        ctx.tick_at(
            &TickInput {
                start: true,
                ..Default::default()
            },
            t0,
        );
        assert_eq!(ctx.phase(), RacePhase::Running);
        assert!(ctx.session().is_started());
        assert_eq!(ctx.drain_events(), vec![RaceEvent::Started]);
        // Start tick does not move anything
        assert_eq!(ctx.player().car.position(), Vec2::new(100.0, 300.0));
    }

    #[test]
    fn test_player_wins_from_correct_side() {
        let mut ctx = race(layout());
        let t0 = Instant::now();
        ctx.tick_at(&forward(), t0);

        let mut now = t0;
        for _ in 0..200 {
            now += TICK;
            ctx.tick_at(&forward(), now);
            if ctx.phase() != RacePhase::Running {
                break;
            }
        }

        let expected = (now - t0).as_secs_f32();
        let won_secs = match ctx.phase() {
            RacePhase::Won { time_secs } => time_secs,
            other => panic!("expected a win, got {other:?}"),
        };
        assert!((won_secs - expected).abs() <= 0.01);
        // HUD clock holds the finish time through the outcome period
        assert_eq!(ctx.snapshot().elapsed_secs, won_secs);
        let events = ctx.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            RaceEvent::Finished { track_id, .. } if track_id == "box"
        )));
    }

    #[test]
    fn test_fast_car_finishes_on_first_contact() {
        let mut ctx = race(layout());
        // Covers more than half the strip's thickness every tick
        let fast = CarSpec::new("fast", "Fast", 6.0, 4.0, 6.0);
        ctx.set_player_car(fast).unwrap();
        let t0 = Instant::now();
        ctx.tick_at(&forward(), t0);

        let mut bounces = 0;
        for i in 1..300 {
            ctx.tick_at(&forward(), t0 + TICK * i);
            if ctx.drain_events().contains(&RaceEvent::PlayerBounced) {
                bounces += 1;
            }
            if ctx.phase() != RacePhase::Running {
                break;
            }
        }
        assert!(matches!(ctx.phase(), RacePhase::Won { .. }), "got {:?}", ctx.phase());
        assert_eq!(bounces, 0);
    }

    #[test]
    fn test_undrained_events_do_not_pile_up() {
        let mut ctx = race(layout());
        let t0 = Instant::now();
        ctx.tick_at(&forward(), t0);
        for i in 1..10 {
            ctx.tick_at(&TickInput::default(), t0 + TICK * i);
        }
        // Only the latest tick's events remain; that tick produced none
        assert!(ctx.drain_events().is_empty());
    }

    #[test]
    fn test_wrong_side_bounces() {
        let mut l = layout();
        // Above the line, facing down
        l.player_start = Pose::new(100.0, 150.0, 180.0);
        let mut ctx = race(l);
        let t0 = Instant::now();
        ctx.tick_at(&forward(), t0);

        let mut bounced = false;
        for i in 1..120 {
            ctx.tick_at(&forward(), t0 + TICK * i);
            assert_eq!(ctx.phase(), RacePhase::Running);
            bounced |= ctx.drain_events().contains(&RaceEvent::PlayerBounced);
        }
        assert!(bounced);
        // Never got through the strip
        assert!(ctx.player().car.position().y < 200.0);
    }

    #[test]
    fn test_border_bounce_pushes_back() {
        let mut l = layout();
        // Heading left toward the west wall
        l.player_start = Pose::new(40.0, 300.0, 90.0);
        let mut ctx = race(l);
        let t0 = Instant::now();
        ctx.tick_at(&forward(), t0);

        for i in 1..60 {
            let mut ghost = ctx.player().car.clone();
            drive_player(&mut ghost, &forward());

            ctx.tick_at(&forward(), t0 + TICK * i);
            if ctx.drain_events().contains(&RaceEvent::PlayerBounced) {
                let x = ctx.player().car.position().x;
                assert!(x > ghost.position().x, "bounce should undo progress");
                assert_eq!(ctx.phase(), RacePhase::Running);
                return;
            }
        }
        panic!("player never reached the wall");
    }

    #[test]
    fn test_computer_first_loses_then_resets() {
        let mut l = layout();
        // Computer right below the line, aiming through it
        l.computer_start = Pose::new(120.0, 220.0, 0.0);
        l.waypoints = vec![Vec2::new(120.0, 100.0)];
        l.record_time_secs = 1.0;
        let mut ctx = race(l);
        let t0 = Instant::now();
        ctx.tick_at(
            &TickInput {
                start: true,
                ..Default::default()
            },
            t0,
        );

        let mut i = 1;
        while ctx.phase() == RacePhase::Running && i < 100 {
            ctx.tick_at(&TickInput::default(), t0 + TICK * i);
            i += 1;
        }
        assert_eq!(ctx.phase(), RacePhase::Lost);
        assert!(ctx.drain_events().contains(&RaceEvent::Lost));
        let lost_secs = ctx.session().elapsed_secs_at(t0 + TICK * i);

        // Holds for the outcome period with the clock stopped, then resets
        let hold = Settings::default().outcome_hold_ticks();
        for _ in 0..hold - 1 {
            ctx.tick_at(&TickInput::default(), t0);
            assert_eq!(ctx.phase(), RacePhase::Lost);
            assert_eq!(ctx.snapshot().elapsed_secs, lost_secs);
        }
        ctx.tick_at(&TickInput::default(), t0);
        assert_eq!(ctx.phase(), RacePhase::NotStarted);
        assert_eq!(ctx.drain_events(), vec![RaceEvent::Reset]);
        assert_eq!(ctx.computer().car.pose(), Pose::new(120.0, 220.0, 0.0));
        assert_eq!(ctx.computer().car.velocity(), 0.0);
        assert_eq!(ctx.computer().controller.follower().map(|f| f.current_index()), Some(0));
        assert!(!ctx.session().is_started());
    }

    #[test]
    fn test_quit_only_emits_event() {
        let mut ctx = race(layout());
        ctx.tick(&TickInput {
            quit: true,
            forward: true,
            ..Default::default()
        });
        assert_eq!(ctx.phase(), RacePhase::NotStarted);
        assert_eq!(ctx.drain_events(), vec![RaceEvent::Quit]);
    }

    #[test]
    fn test_reset_mid_race() {
        let mut ctx = race(layout());
        ctx.tick(&forward());
        for _ in 0..5 {
            ctx.tick(&forward());
        }
        assert_ne!(ctx.player().car.position(), Vec2::new(100.0, 300.0));
        ctx.reset();
        assert_eq!(ctx.phase(), RacePhase::NotStarted);
        assert_eq!(ctx.player().car.pose(), Pose::new(100.0, 300.0, 0.0));
        assert_eq!(ctx.snapshot().elapsed_secs, 0.0);
    }

    #[test]
    fn test_swap_player_car() {
        let mut ctx = race(layout());
        ctx.tick(&forward());
        ctx.tick(&forward());
        let fast = CarSpec::new("white_car", "White Car", 6.0, 5.0, 2.0);
        ctx.set_player_car(fast).unwrap();
        assert_eq!(ctx.player().car.spec().id, "white_car");
        assert_eq!(ctx.phase(), RacePhase::NotStarted);

        let bad = CarSpec::new("broken", "Broken", -1.0, 4.0, 1.0);
        assert!(ctx.set_player_car(bad).is_err());
        assert_eq!(ctx.player().car.spec().id, "white_car");
    }

    #[test]
    fn test_snapshot_exposes_state() {
        let ctx = race(layout());
        let snap = ctx.snapshot();
        assert_eq!(snap.phase, RacePhase::NotStarted);
        assert_eq!(snap.player.pose, Pose::new(100.0, 300.0, 0.0));
        assert_eq!(snap.computer.pose, Pose::new(300.0, 300.0, 0.0));
        assert_eq!(snap.record_time_secs, 100.0);
        assert_eq!(snap.computer_target, Some(Vec2::new(300.0, 350.0)));
    }

    #[test]
    fn test_session_rounding() {
        let mut session = RaceSession::default();
        let t0 = Instant::now();
        assert_eq!(session.elapsed_secs_at(t0), 0.0);
        session.start_at(t0);
        let t = session.elapsed_secs_at(t0 + Duration::from_millis(1234));
        assert!((t - 1.23).abs() < 1e-4);

        let stopped = session.stop_at(t0 + Duration::from_millis(2000));
        assert_eq!(session.elapsed_secs_at(t0 + Duration::from_secs(9)), stopped);
        session.reset();
        assert_eq!(session.elapsed_secs_at(t0 + Duration::from_secs(9)), 0.0);
        assert!(!session.is_started());
    }

    #[test]
    fn test_bad_settings_rejected() {
        let settings = Settings {
            fps: 0,
            ..Default::default()
        };
        let track = Track::new(layout()).unwrap();
        let err = RaceContext::new(track, player_spec(), computer_spec(), &settings);
        assert!(err.is_err());
    }
}
