//! Game balance tuning
//!
//! Global, level-independent constants for paddle, ball and capsule
//! behaviour. Per-level modifiers live in [`crate::level::LevelTuning`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::level::LevelError;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Lives at the start of a run
    pub fn starting_lives(&self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 3,
            Difficulty::Hard => 2,
        }
    }

    /// Ceiling on ball speed (pixels/s)
    pub fn max_ball_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 360.0,
            Difficulty::Normal => 480.0,
            Difficulty::Hard => 600.0,
        }
    }
}

/// Balance values shared by every level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub difficulty: Difficulty,

    // === Lives & scoring ===
    pub starting_lives: u32,
    /// First score that awards an extra life
    pub extra_life_first: u64,
    /// Further extra lives every this many points
    pub extra_life_every: u64,
    /// Points for catching any capsule
    pub capsule_points: u64,
    /// Points for leaving through the warp gate
    pub warp_bonus: u64,

    // === Ball ===
    pub min_ball_speed: f32,
    pub max_ball_speed: f32,
    /// Paddle deflection at the very edge, radians from vertical
    pub max_bounce_angle: f32,
    /// Ticks between automatic speed-ups
    pub speedup_interval_ticks: u32,

    // === Paddle ===
    pub paddle_min_width: f32,
    pub paddle_max_width: f32,

    // === Capsules ===
    pub capsule_fall_speed: f32,
    pub max_active_capsules: usize,
    pub expand_factor: f32,
    pub shrink_factor: f32,
    pub shrink_ticks: u64,
    pub slow_factor: f32,
    pub slow_ticks: u64,
    pub sticky_release_ticks: u64,
    /// Total balls in play after a MultiBall catch
    pub multiball_count: usize,
    /// Angle between cloned balls, radians
    pub multiball_spread: f32,
    pub laser_speed: f32,
    pub laser_cooldown_ticks: u32,

    // === Aliens & boss ===
    /// Alien cruising speed (pixels/s)
    pub alien_speed: f32,
    pub alien_points: u64,
    /// Speed of the boss's aimed shots (pixels/s)
    pub boss_shot_speed: f32,
    /// Shots per volley
    pub boss_volley: u32,
    /// Ticks between shots of one volley
    pub boss_volley_gap_ticks: u32,
    /// Ticks the boss rests between volleys
    pub boss_rest_ticks: u32,

    // === Flow ===
    /// Frozen ticks after losing a ball
    pub ball_lost_ticks: u32,
    /// Frozen ticks after clearing a level
    pub level_clear_ticks: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            starting_lives: 3,
            extra_life_first: 20_000,
            extra_life_every: 60_000,
            capsule_points: 1_000,
            warp_bonus: 10_000,

            min_ball_speed: 120.0,
            max_ball_speed: 480.0,
            max_bounce_angle: 60f32.to_radians(),
            speedup_interval_ticks: 10 * 120,

            paddle_min_width: PADDLE_WIDTH * 0.5,
            paddle_max_width: PADDLE_WIDTH * 1.75,

            capsule_fall_speed: 90.0,
            max_active_capsules: 1,
            expand_factor: 1.5,
            shrink_factor: 0.6,
            shrink_ticks: 10 * 120,
            slow_factor: 0.6,
            slow_ticks: 10 * 120,
            sticky_release_ticks: 3 * 120,
            multiball_count: 3,
            multiball_spread: 0.35,
            laser_speed: 480.0,
            laser_cooldown_ticks: 30,

            alien_speed: 30.0,
            alien_points: 100,
            boss_shot_speed: 360.0,
            boss_volley: 3,
            boss_volley_gap_ticks: 60,
            boss_rest_ticks: 4 * 120,

            ball_lost_ticks: 120,
            level_clear_ticks: 120,
        }
    }
}

impl Tuning {
    /// Create tuning from a difficulty preset (applies preset defaults)
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut tuning = Self::default();
        tuning.apply_difficulty(difficulty);
        tuning
    }

    /// Apply a difficulty preset (updates difficulty-dependent values)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.starting_lives = difficulty.starting_lives();
        self.max_ball_speed = difficulty.max_ball_speed();
    }

    /// Decode from JSON, missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Clamp a ball speed into the allowed band
    pub fn clamp_ball_speed(&self, speed: f32) -> f32 {
        if !speed.is_finite() {
            return self.min_ball_speed;
        }
        speed.clamp(self.min_ball_speed, self.max_ball_speed)
    }

    /// Clamp a paddle width into the allowed band
    pub fn clamp_paddle_width(&self, width: f32) -> f32 {
        if !width.is_finite() {
            return PADDLE_WIDTH;
        }
        width.clamp(self.paddle_min_width, self.paddle_max_width)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        let positive = [
            ("min_ball_speed", self.min_ball_speed),
            ("max_ball_speed", self.max_ball_speed),
            ("max_bounce_angle", self.max_bounce_angle),
            ("paddle_min_width", self.paddle_min_width),
            ("paddle_max_width", self.paddle_max_width),
            ("capsule_fall_speed", self.capsule_fall_speed),
            ("expand_factor", self.expand_factor),
            ("shrink_factor", self.shrink_factor),
            ("slow_factor", self.slow_factor),
            ("laser_speed", self.laser_speed),
            ("alien_speed", self.alien_speed),
            ("boss_shot_speed", self.boss_shot_speed),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(LevelError::InvalidTuning { field, value });
            }
        }
        if self.max_ball_speed < self.min_ball_speed {
            return Err(LevelError::InvalidTuning {
                field: "max_ball_speed",
                value: self.max_ball_speed,
            });
        }
        if self.paddle_max_width < self.paddle_min_width {
            return Err(LevelError::InvalidTuning {
                field: "paddle_max_width",
                value: self.paddle_max_width,
            });
        }
        // Near-horizontal bounces never come back down
        if self.max_bounce_angle > 85f32.to_radians() {
            return Err(LevelError::InvalidTuning {
                field: "max_bounce_angle",
                value: self.max_bounce_angle,
            });
        }
        if self.starting_lives == 0 {
            return Err(LevelError::InvalidTuning {
                field: "starting_lives",
                value: 0.0,
            });
        }
        Ok(())
    }
}
