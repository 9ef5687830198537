//! Simulation bodies
//!
//! Every simulated object is a [`Body`]: identity, shape, position and
//! velocity, plus a [`BodyKind`] payload carrying what is specific to
//! paddles, balls, bricks, capsules, aliens and the boss.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::alien::AlienMotion;
use super::capsule::EffectType;
use super::geom::{Aabb, Shape};
use crate::level::BrickType;

/// Stable body identity (allocated in increasing order, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Ball state - attached to paddle or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    /// Riding the paddle at `offset` from its center, released on launch or
    /// automatically at `release_tick` (sticky catch)
    Attached { offset: f32, release_tick: Option<u64> },
    Free,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Current speed; velocity magnitude always equals this while free
    pub speed: f32,
    pub state: BallState,
}

impl Ball {
    pub fn is_free(&self) -> bool {
        matches!(self.state, BallState::Free)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    /// Width with no size modifier active
    pub base_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub brick_type: BrickType,
    pub hits_left: u32,
    pub destructible: bool,
    /// Points awarded on destruction (level multiplier applied)
    pub score_value: u64,
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub effect: EffectType,
}

/// Drifter that enters through an inlet; dies to any hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alien {
    pub score_value: u64,
    pub motion: AlienMotion,
}

/// Doh: a many-hit target that fires volleys at the paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub hits_left: u32,
    pub score_value: u64,
    /// Ticks until the next shot or volley
    pub timer: u32,
    /// Shots left in the current volley; 0 while resting
    pub volley_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
    Top,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyKind {
    Paddle(Paddle),
    Ball(Ball),
    Brick(Brick),
    Capsule(Capsule),
    Wall(WallSide),
    /// Bolt fired by the laser paddle
    Laser,
    Alien(Alien),
    Boss(Boss),
    /// Aimed shot from the boss; destroys the paddle on contact
    BossShot,
}

/// Surfaces a ball can bounce off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    Wall,
    Paddle,
    Brick,
    Alien,
    Boss,
}

/// A simulated body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    /// Center of the shape
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub kind: BodyKind,
}

impl Body {
    /// Create a body; the registry assigns the real id on insertion
    pub fn new(pos: Vec2, shape: Shape, kind: BodyKind) -> Self {
        Self {
            id: BodyId(0),
            pos,
            vel: Vec2::ZERO,
            shape,
            kind,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(self.pos)
    }

    pub fn radius(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Rect { half } => half.x.max(half.y),
        }
    }

    /// Bodies a ball can strike
    pub fn is_ball_target(&self) -> bool {
        matches!(
            self.kind,
            BodyKind::Paddle(_)
                | BodyKind::Brick(_)
                | BodyKind::Wall(_)
                | BodyKind::Alien(_)
                | BodyKind::Boss(_)
        )
    }

    /// Bodies that take damage from balls and laser bolts
    pub fn is_strikeable(&self) -> bool {
        matches!(
            self.kind,
            BodyKind::Brick(_) | BodyKind::Alien(_) | BodyKind::Boss(_)
        )
    }

    /// Bodies an alien cannot drift through
    pub fn blocks_alien(&self) -> bool {
        matches!(
            self.kind,
            BodyKind::Brick(_) | BodyKind::Wall(_) | BodyKind::Alien(_) | BodyKind::Boss(_)
        )
    }

    pub fn is_alien(&self) -> bool {
        matches!(self.kind, BodyKind::Alien(_))
    }

    pub fn is_boss_shot(&self) -> bool {
        matches!(self.kind, BodyKind::BossShot)
    }

    pub fn is_ball(&self) -> bool {
        matches!(self.kind, BodyKind::Ball(_))
    }

    pub fn is_capsule(&self) -> bool {
        matches!(self.kind, BodyKind::Capsule(_))
    }

    pub fn is_laser(&self) -> bool {
        matches!(self.kind, BodyKind::Laser)
    }

    pub fn as_ball(&self) -> Option<&Ball> {
        match &self.kind {
            BodyKind::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn as_ball_mut(&mut self) -> Option<&mut Ball> {
        match &mut self.kind {
            BodyKind::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn as_brick(&self) -> Option<&Brick> {
        match &self.kind {
            BodyKind::Brick(brick) => Some(brick),
            _ => None,
        }
    }

    pub fn as_brick_mut(&mut self) -> Option<&mut Brick> {
        match &mut self.kind {
            BodyKind::Brick(brick) => Some(brick),
            _ => None,
        }
    }

    pub fn as_alien(&self) -> Option<&Alien> {
        match &self.kind {
            BodyKind::Alien(alien) => Some(alien),
            _ => None,
        }
    }

    pub fn as_alien_mut(&mut self) -> Option<&mut Alien> {
        match &mut self.kind {
            BodyKind::Alien(alien) => Some(alien),
            _ => None,
        }
    }

    pub fn as_boss_mut(&mut self) -> Option<&mut Boss> {
        match &mut self.kind {
            BodyKind::Boss(boss) => Some(boss),
            _ => None,
        }
    }

    pub fn as_paddle(&self) -> Option<&Paddle> {
        match &self.kind {
            BodyKind::Paddle(paddle) => Some(paddle),
            _ => None,
        }
    }

    /// Set a free ball's speed, keeping its direction
    pub fn set_ball_speed(&mut self, speed: f32) {
        let dir = super::geom::normalize_or(self.vel, Vec2::NEG_Y);
        if let BodyKind::Ball(ball) = &mut self.kind {
            ball.speed = speed;
            if ball.is_free() {
                self.vel = dir * speed;
            }
        }
    }

    /// Resize a rectangular body around its center
    pub fn set_width(&mut self, width: f32) {
        if let Shape::Rect { half } = &mut self.shape {
            half.x = width.abs() * 0.5;
        }
    }
}
