//! Per-tick drivers: player input or the waypoint follower

use super::car::{Car, Turn};
use super::follower::PathFollower;
use super::race::TickInput;

/// What drives a car each tick
#[derive(Debug, Clone)]
pub enum Controller {
    /// Human input
    Player,
    /// Computer car following the track's racing line
    Follower(PathFollower),
}

impl Controller {
    pub fn drive(&mut self, car: &mut Car, input: &TickInput) {
        match self {
            Controller::Player => drive_player(car, input),
            Controller::Follower(follower) => follower.drive(car),
        }
    }

    pub fn reset(&mut self) {
        if let Controller::Follower(follower) = self {
            follower.reset();
        }
    }

    pub fn follower(&self) -> Option<&PathFollower> {
        match self {
            Controller::Follower(follower) => Some(follower),
            Controller::Player => None,
        }
    }
}

/// Apply one tick of player input
///
/// A stopped car cannot steer. Drag applies whenever neither throttle nor
/// brake is held, so an empty input coasts the car to a stop.
pub fn drive_player(car: &mut Car, input: &TickInput) {
    if car.velocity() != 0.0 {
        if input.left {
            car.rotate(Turn::Left);
        }
        if input.right {
            car.rotate(Turn::Right);
        }
    }

    if input.forward {
        car.accelerate();
    } else if input.reverse {
        car.decelerate();
    } else {
        car.reduce_speed();
    }
    car.move_forward();
}
