//! Brickbreak - simulation core of a brick-breaking arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, collisions, capsules, aliens,
//!   the boss, game flow)
//! - `level`: Decoded level descriptors and their validation
//! - `tuning`: Data-driven game balance
//!
//! Rendering, audio and input devices are the host's business: the host feeds
//! [`sim::Intent`]s in and drains [`sim::GameEvent`]s out.

pub mod level;
pub mod sim;
pub mod tuning;

pub use level::{BrickSpec, BrickType, Level, LevelError, LevelTuning};
pub use sim::{FixedStep, Game, GameEvent, GamePhase, Intent, TickInput, tick};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Most ticks run for one frame
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Brick cell dimensions
    pub const BRICK_WIDTH: f32 = 32.0;
    pub const BRICK_HEIGHT: f32 = 16.0;
    /// Classic layout: 11 columns, 18 rows max
    pub const GRID_COLUMNS: u32 = 11;
    pub const GRID_ROWS: u32 = 18;

    /// Play field (interior, walls sit outside it)
    pub const FIELD_WIDTH: f32 = BRICK_WIDTH * GRID_COLUMNS as f32;
    pub const FIELD_HEIGHT: f32 = 480.0;
    pub const WALL_THICKNESS: f32 = 16.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 64.0;
    pub const PADDLE_HEIGHT: f32 = 12.0;
    /// Distance from field bottom to paddle center
    pub const PADDLE_BASELINE_MARGIN: f32 = 40.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 5.0;

    /// Capsule size
    pub const CAPSULE_WIDTH: f32 = 32.0;
    pub const CAPSULE_HEIGHT: f32 = 14.0;

    /// Laser bolt size
    pub const LASER_WIDTH: f32 = 2.0;
    pub const LASER_HEIGHT: f32 = 10.0;

    /// Aliens are square
    pub const ALIEN_SIZE: f32 = 24.0;

    /// Boss (Doh) size and the size of its shots
    pub const BOSS_WIDTH: f32 = 96.0;
    pub const BOSS_HEIGHT: f32 = 128.0;
    pub const BOSS_SHOT_SIZE: f32 = 8.0;

    /// Smallest length treated as non-zero in vector math
    pub const EPSILON: f32 = 1.0e-5;
}
