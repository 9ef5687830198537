//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (registry insertion order)
//! - No rendering or platform dependencies

pub mod alien;
pub mod body;
pub mod boss;
pub mod capsule;
pub mod collision;
pub mod event;
pub mod geom;
pub mod registry;
pub mod stage;
pub mod state;
pub mod tick;

pub use alien::{AlienMotion, Manoeuvre};
pub use body::{Alien, Ball, BallState, Body, BodyId, BodyKind, Boss, Brick, Capsule, Paddle, Surface, WallSide};
pub use capsule::{ActiveEffects, EffectCategory, EffectType, Expiry};
pub use collision::{paddle_bounce_direction, resolve_balls};
pub use event::GameEvent;
pub use geom::{Aabb, Shape, SweptHit, reflect, sweep_circle_rect};
pub use registry::BodyRegistry;
pub use stage::Stage;
pub use state::{Game, GamePhase, GameSession};
pub use tick::{FixedStep, Intent, TickInput, tick};
