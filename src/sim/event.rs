//! Events emitted by the simulation for rendering, audio, scoring and
//! persistence collaborators.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Surface;
use super::capsule::EffectType;
use super::state::GamePhase;
use crate::level::BrickType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A brick lost its last hit point
    BrickDestroyed {
        position: Vec2,
        brick_type: BrickType,
        score_value: u64,
    },
    /// A brick took a hit and survived
    BrickHit { position: Vec2, hits_left: u32 },
    BallBounced { surface: Surface },
    /// A ball fell out but others are still in play
    BallDropped { remaining: usize },
    /// The last ball in play fell out
    BallLost,
    CapsuleSpawned { position: Vec2, effect: EffectType },
    CapsuleCaught { effect: EffectType },
    CapsuleMissed,
    /// A timed or until-ball-lost effect ended
    EffectExpired { effect: EffectType },
    LaserFired,
    AlienSpawned { position: Vec2 },
    AlienDestroyed { position: Vec2, score_value: u64 },
    /// An alien drifted out through the bottom
    AlienEscaped,
    BossHit { hits_left: u32 },
    BossDestroyed { position: Vec2, score_value: u64 },
    BossFired,
    /// A boss shot struck the paddle; every ball goes with it
    PaddleDestroyed,
    /// Paddle left through the open warp gate
    WarpEntered,
    ExtraLifeAwarded { lives: u32 },
    ScoreChanged { score: u64 },
    LevelStarted { index: usize, name: String },
    StateChanged { from: GamePhase, to: GamePhase },
    LevelComplete,
    GameOver { final_score: u64 },
}
