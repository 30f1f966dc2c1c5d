//! Waypoint path follower for the computer car
//!
//! The follower steers at the current waypoint, advances once the car gets
//! close enough, and holds a cruising speed picked so that driving the whole
//! path takes the track's record time.

use glam::Vec2;

use super::car::Car;
use crate::bearing;

/// Drives a car through an ordered list of waypoints
#[derive(Debug, Clone)]
pub struct PathFollower {
    waypoints: Vec<Vec2>,
    current: usize,
    /// Set once the last waypoint has been reached
    finished: bool,
    target_velocity: f32,
    reach_radius: f32,
}

impl PathFollower {
    /// Follower with an explicit cruising speed
    pub fn new(waypoints: Vec<Vec2>, target_velocity: f32, reach_radius: f32) -> Self {
        Self {
            waypoints,
            current: 0,
            finished: false,
            target_velocity,
            reach_radius,
        }
    }

    /// Follower paced to cover the path from `start` in `record_secs`
    pub fn paced(
        waypoints: Vec<Vec2>,
        start: Vec2,
        record_secs: f32,
        fps: u32,
        reach_radius: f32,
    ) -> Self {
        let ticks = record_secs * fps as f32;
        let length = path_length(start, &waypoints);
        let target_velocity = if ticks > 0.0 { length / ticks } else { 0.0 };
        log::debug!(
            "Path follower: {} waypoints, {:.0}px path, cruising at {:.3}px/tick",
            waypoints.len(),
            length,
            target_velocity
        );
        Self::new(waypoints, target_velocity, reach_radius)
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Index of the waypoint being steered at
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_target(&self) -> Option<Vec2> {
        self.waypoints.get(self.current).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn target_velocity(&self) -> f32 {
        self.target_velocity
    }

    /// Turn toward the current waypoint, at most one steering step
    pub fn calculate_angle(&self, car: &mut Car) {
        let Some(target) = self.current_target() else {
            return;
        };
        let delta = target - car.position();
        if delta.length_squared() == 0.0 {
            return;
        }
        car.steer_toward(bearing(delta));
    }

    /// Advance to the next waypoint once the current one is reached
    pub fn update_path_point(&mut self, car: &Car) {
        if self.finished {
            return;
        }
        let Some(target) = self.current_target() else {
            return;
        };
        if car.position().distance(target) < self.reach_radius {
            if self.current + 1 < self.waypoints.len() {
                self.current += 1;
            } else {
                log::debug!("Path follower reached its last waypoint");
                self.finished = true;
            }
        }
    }

    /// One tick of driving
    pub fn drive(&mut self, car: &mut Car) {
        if self.waypoints.is_empty() {
            return;
        }
        if self.finished {
            car.reduce_speed();
            car.move_forward();
            return;
        }
        self.calculate_angle(car);
        self.update_path_point(car);
        car.accelerate_to(self.target_velocity);
        car.move_forward();
    }

    /// Back to the first waypoint
    pub fn reset(&mut self) {
        self.current = 0;
        self.finished = false;
    }
}

/// Length of the polyline from `start` through every waypoint
pub fn path_length(start: Vec2, waypoints: &[Vec2]) -> f32 {
    let mut length = 0.0;
    let mut prev = start;
    for &point in waypoints {
        length += prev.distance(point);
        prev = point;
    }
    length
}
