//! Pixel Racer entry point
//!
//! Headless driver: loads settings, profiles and scores, then runs one race
//! at the fixed tick rate with a scripted driver standing in for the
//! keyboard. Rendering and audio live outside this crate.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use pixel_racer::catalog::COMPUTER_CAR_ID;
use pixel_racer::profiles::DEFAULT_USERNAME;
use pixel_racer::sim::{RaceContext, RaceEvent, RacePhase, TickInput};
use pixel_racer::{
    CarProvider, Catalog, HighScores, ProfileStore, ScoreSink, Settings, TrackProvider,
};

/// Stop the demo after this many ticks regardless of outcome
const MAX_TICKS: u32 = 60 * 60;

struct Paths {
    settings: PathBuf,
    profiles: PathBuf,
    scores: PathBuf,
    catalog: Option<PathBuf>,
}

impl Paths {
    /// Data directory from the first argument, else `./data`
    fn from_args() -> Self {
        let mut args = std::env::args().skip(1);
        let dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data"));
        let catalog = dir.join("catalog.json");
        Self {
            settings: dir.join("settings.json"),
            profiles: dir.join("profiles.json"),
            scores: dir.join("highscores.json"),
            catalog: catalog.exists().then_some(catalog),
        }
    }
}

/// Hold the throttle, steering right whenever the wall is close ahead
fn scripted_input(ctx: &RaceContext) -> TickInput {
    let car = &ctx.player().car;
    let probe = car.position() + pixel_racer::heading_vector(car.angle()) * 40.0;
    let blocked = ctx.track().border_mask().get(probe.x as i32, probe.y as i32);
    TickInput {
        forward: true,
        right: blocked,
        ..Default::default()
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let paths = Paths::from_args();
    let settings = Settings::load(&paths.settings);
    let catalog = match &paths.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin(),
    };
    let profiles = ProfileStore::load(&paths.profiles);
    let mut scores = HighScores::load(&paths.scores);
    scores.set_capacity(settings.max_high_scores);

    let profile = profiles.get_or_default(DEFAULT_USERNAME);
    let track = catalog.track(&profile.last_track_id)?;
    let player_car = catalog.car(&profile.last_car_id)?;
    let computer_car = catalog.car(COMPUTER_CAR_ID)?;

    let mut ctx = RaceContext::new(track, player_car, computer_car, &settings)?;
    let tick = Duration::from_secs_f32(settings.tick_secs());

    ctx.tick(&TickInput {
        start: true,
        ..Default::default()
    });

    let mut ticks = 0;
    let mut next_frame = Instant::now();
    'race: while ticks < MAX_TICKS {
        let input = scripted_input(&ctx);
        ctx.tick(&input);
        ticks += 1;

        for event in ctx.drain_events() {
            match event {
                RaceEvent::Finished { track_id, time_secs } => {
                    let name = if profile.is_default() {
                        "player"
                    } else {
                        profile.username.as_str()
                    };
                    match scores.submit(&track_id, name, time_secs) {
                        Some(rank) => log::info!("{time_secs:.2}s is rank {rank} on {track_id}"),
                        None => log::info!("{time_secs:.2}s did not make the board"),
                    }
                }
                RaceEvent::Lost => log::info!("You lost!"),
                RaceEvent::Quit | RaceEvent::Reset => break 'race,
                _ => {}
            }
        }

        // Pace to the tick rate
        next_frame += tick;
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
        } else {
            next_frame = now;
        }
    }

    if matches!(ctx.phase(), RacePhase::Running) {
        log::info!("Demo stopped after {ticks} ticks without a result");
    }
    let snapshot = ctx.snapshot();
    log::info!(
        "Player at ({:.0}, {:.0}), computer at ({:.0}, {:.0}); record {:.2}s",
        snapshot.player.pose.position.x,
        snapshot.player.pose.position.y,
        snapshot.computer.pose.position.x,
        snapshot.computer.pose.position.y,
        snapshot.record_time_secs
    );

    scores.save(&paths.scores)?;
    profiles.save(&paths.profiles)?;
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Pixel Racer (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
