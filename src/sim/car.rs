//! Car kinematics shared by the player and computer cars

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::error::{SetupError, require_finite, require_positive};
use super::mask::{Mask, collide};
use crate::consts::{CAR_HEIGHT, CAR_WIDTH};
use crate::{normalize_degrees, wrap_degrees};

/// Steering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// Counter-clockwise on screen (angle increases)
    Left,
    /// Clockwise on screen (angle decreases)
    Right,
}

/// Position and heading a car is placed at
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Top-left of the unrotated sprite
    pub position: Vec2,
    /// Heading in degrees, 0 = up
    #[serde(default)]
    pub angle: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, angle: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            angle,
        }
    }
}

/// Tuning for one car model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSpec {
    pub id: String,
    pub name: String,
    /// Top speed (pixels/tick)
    pub max_velocity: f32,
    /// Steering rate (degrees/tick)
    pub rotation_speed: f32,
    /// Throttle/brake step (pixels/tick per tick)
    pub acceleration: f32,
    /// Unrotated sprite size
    #[serde(default = "default_sprite_size")]
    pub sprite_size: [u32; 2],
}

fn default_sprite_size() -> [u32; 2] {
    [CAR_WIDTH, CAR_HEIGHT]
}

impl CarSpec {
    pub fn new(
        id: &str,
        name: &str,
        max_velocity: f32,
        rotation_speed: f32,
        acceleration: f32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            max_velocity,
            rotation_speed,
            acceleration,
            sprite_size: default_sprite_size(),
        }
    }

    /// Reject tuning that would make the kinematics meaningless
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("max_velocity", self.max_velocity)?;
        require_positive("acceleration", self.acceleration)?;
        require_finite("rotation_speed", self.rotation_speed)?;
        if self.rotation_speed < 0.0 {
            return Err(SetupError::NonPositive {
                field: "rotation_speed",
                value: self.rotation_speed,
            });
        }
        if self.sprite_size[0] == 0 || self.sprite_size[1] == 0 {
            return Err(SetupError::EmptyMask { what: "car sprite" });
        }
        Ok(())
    }

    /// Solid-rectangle sprite mask for this car
    pub fn sprite_mask(&self) -> Mask {
        Mask::filled(self.sprite_size[0], self.sprite_size[1])
    }
}

/// A car on the track
///
/// Velocity is signed along the heading: negative means reversing.
#[derive(Debug, Clone)]
pub struct Car {
    spec: CarSpec,
    position: Vec2,
    angle: f32,
    velocity: f32,
    /// Lowest velocity the brake can reach (0 or a reverse cap)
    reverse_floor: f32,
    start: Pose,
    /// Unrotated sprite mask
    sprite: Mask,
    /// Sprite mask at the current angle
    mask: Mask,
}

impl Car {
    /// Player car: braking continues into reverse down to half top speed
    pub fn player(spec: CarSpec, start: Pose) -> Result<Self, SetupError> {
        let floor = -spec.max_velocity / 2.0;
        Self::with_floor(spec, start, floor)
    }

    /// Computer car: forward only
    pub fn computer(spec: CarSpec, start: Pose) -> Result<Self, SetupError> {
        Self::with_floor(spec, start, 0.0)
    }

    /// Car with an explicit sprite mask (e.g. decoded from an image)
    pub fn with_sprite(mut self, sprite: Mask) -> Result<Self, SetupError> {
        if sprite.is_empty() {
            return Err(SetupError::EmptyMask { what: "car sprite" });
        }
        self.spec.sprite_size = [sprite.width(), sprite.height()];
        self.sprite = sprite;
        self.refresh_mask();
        Ok(self)
    }

    fn with_floor(spec: CarSpec, start: Pose, reverse_floor: f32) -> Result<Self, SetupError> {
        spec.validate()?;
        require_finite("start.x", start.position.x)?;
        require_finite("start.y", start.position.y)?;
        require_finite("start.angle", start.angle)?;

        let sprite = spec.sprite_mask();
        let mut car = Self {
            spec,
            position: start.position,
            angle: normalize_degrees(start.angle),
            velocity: 0.0,
            reverse_floor,
            start,
            mask: sprite.clone(),
            sprite,
        };
        car.refresh_mask();
        Ok(car)
    }

    pub fn spec(&self) -> &CarSpec {
        &self.spec
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Heading in degrees [0, 360), 0 = up
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn reverse_floor(&self) -> f32 {
        self.reverse_floor
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            angle: self.angle,
        }
    }

    /// Centre of the sprite (rotation pivot)
    pub fn center(&self) -> Vec2 {
        let [w, h] = self.spec.sprite_size;
        self.position + Vec2::new(w as f32, h as f32) / 2.0
    }

    /// Mask of the sprite at the current heading
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Top-left of the rotated mask (rotated sprite stays centred on the pivot)
    pub fn mask_position(&self) -> Vec2 {
        self.center() - self.mask.size().as_vec2() / 2.0
    }

    /// Place the car, keeping its velocity
    pub fn set_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.set_angle(pose.angle);
    }

    fn set_angle(&mut self, angle: f32) {
        let angle = normalize_degrees(angle);
        if angle != self.angle {
            self.angle = angle;
            self.refresh_mask();
        }
    }

    fn refresh_mask(&mut self) {
        self.mask = self.sprite.rotated(self.angle);
    }

    /// Turn by one steering step
    pub fn rotate(&mut self, turn: Turn) {
        let step = match turn {
            Turn::Left => self.spec.rotation_speed,
            Turn::Right => -self.spec.rotation_speed,
        };
        self.set_angle(self.angle + step);
    }

    /// Turn toward `target` degrees by at most one steering step, never overshooting
    pub fn steer_toward(&mut self, target: f32) {
        let error = wrap_degrees(target - self.angle);
        let step = self.spec.rotation_speed.min(error.abs());
        if error > 0.0 {
            self.set_angle(self.angle + step);
        } else if error < 0.0 {
            self.set_angle(self.angle - step);
        }
    }

    /// Throttle: speed up toward top speed
    pub fn accelerate(&mut self) {
        self.accelerate_to(self.spec.max_velocity);
    }

    /// Throttle with a lower ceiling than top speed
    pub fn accelerate_to(&mut self, limit: f32) {
        let limit = limit.min(self.spec.max_velocity);
        if self.velocity < limit {
            self.velocity = (self.velocity + self.spec.acceleration).min(limit);
        }
    }

    /// Brake, continuing into reverse down to the floor
    pub fn decelerate(&mut self) {
        self.velocity = (self.velocity - self.spec.acceleration).max(self.reverse_floor);
    }

    /// Passive drag toward a standstill
    ///
    /// Applies in reverse too: a reversing car coasts up to zero.
    pub fn reduce_speed(&mut self) {
        let drag = self.spec.acceleration / 2.0;
        if self.velocity > 0.0 {
            self.velocity = (self.velocity - drag).max(0.0);
        } else if self.velocity < 0.0 {
            self.velocity = (self.velocity + drag).min(0.0);
        }
    }

    /// Displacement of one `move_forward` at the current velocity
    pub fn motion(&self) -> Vec2 {
        crate::heading_vector(self.angle) * self.velocity
    }

    /// Advance one tick along the heading
    pub fn move_forward(&mut self) {
        self.position += self.motion();
    }

    /// Push the car back out of whatever it drove into
    pub fn bounce(&mut self) {
        self.velocity = -self.velocity;
        self.move_forward();
    }

    /// Back to the start pose, stopped
    pub fn reset(&mut self) {
        self.velocity = 0.0;
        self.set_pose(self.start);
    }

    /// Test this car against a mask placed at `mask_position`
    ///
    /// The point is in the other mask's frame.
    pub fn collide(&self, other: &Mask, mask_position: Vec2) -> Option<IVec2> {
        collide(&self.mask, self.mask_position(), other, mask_position)
    }

    #[cfg(test)]
    pub(crate) fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }
}
