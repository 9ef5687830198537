//! Game session and phase state machine
//!
//! The session is the only place score, lives and phase change. Transitions
//! are driven by input intents and by events the resolver and capsule engine
//! emitted during the tick; nothing here inspects bodies directly.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::capsule::EffectType;
use super::event::GameEvent;
use super::stage::Stage;
use crate::level::{Level, LevelError};
use crate::tuning::Tuning;

/// High-level flow of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the start input
    Attract,
    Playing,
    Paused,
    /// Last ball gone; frozen before serving again or ending
    BallLost,
    /// Every destructible brick (and the boss) gone; frozen before the next
    /// level
    LevelComplete,
    GameOver,
    /// Every level cleared
    Victory,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Attract => "attract",
            GamePhase::Playing => "playing",
            GamePhase::Paused => "paused",
            GamePhase::BallLost => "ball-lost",
            GamePhase::LevelComplete => "level-complete",
            GamePhase::GameOver => "game-over",
            GamePhase::Victory => "victory",
        }
    }

    /// Terminal until [`Game::reset`]
    pub fn is_over(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// Score, lives and progress of one run
#[derive(Debug, Clone)]
pub struct GameSession {
    pub score: u64,
    pub lives: u32,
    /// 0-based index into the level list
    pub level_index: usize,
    pub phase: GamePhase,
    /// Ticks spent in a frozen transition phase
    pub phase_ticks: u32,
    /// Score that awards the next extra life
    pub next_extra_life: u64,
    /// Active level, `None` until the run starts
    pub stage: Option<Stage>,
}

impl GameSession {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: 0,
            lives: tuning.starting_lives,
            level_index: 0,
            phase: GamePhase::Attract,
            phase_ticks: 0,
            next_extra_life: if tuning.extra_life_first == 0 {
                u64::MAX
            } else {
                tuning.extra_life_first
            },
            stage: None,
        }
    }
}

/// A complete game: session, level list, tuning, seeded RNG and the event
/// outbox the host drains.
#[derive(Debug, Clone)]
pub struct Game {
    pub session: GameSession,
    pub(crate) levels: Vec<Level>,
    pub(crate) tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    seed: u64,
    /// Ticks run since creation or reset, frozen ones included
    pub(crate) tick_count: u64,
}

impl Game {
    /// Validate the tuning and every level, then wait in `Attract`
    pub fn new(levels: Vec<Level>, tuning: Tuning, seed: u64) -> Result<Self, LevelError> {
        tuning.validate()?;
        if levels.is_empty() {
            return Err(LevelError::NoLevels);
        }
        for level in &levels {
            level.validate(&tuning)?;
        }
        log::info!("New game: {} levels, seed {}", levels.len(), seed);
        Ok(Self {
            session: GameSession::new(&tuning),
            levels,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            seed,
            tick_count: 0,
        })
    }

    /// Back to `Attract` with a fresh session and the original seed
    pub fn reset(&mut self) {
        self.session = GameSession::new(&self.tuning);
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.events.clear();
        self.tick_count = 0;
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub fn score(&self) -> u64 {
        self.session.score
    }

    pub fn lives(&self) -> u32 {
        self.session.lives
    }

    pub fn level_index(&self) -> usize {
        self.session.level_index
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.session.stage.as_ref()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Events not yet drained
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every event emitted since the last drain, in emission order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.session.phase;
        if from == to {
            return;
        }
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.session.phase = to;
        self.session.phase_ticks = 0;
        self.events.push(GameEvent::StateChanged { from, to });
    }

    fn start_level(&mut self, index: usize) {
        let Some(level) = self.levels.get(index) else {
            debug_assert!(false, "level index {} out of range", index);
            return;
        };
        self.session.level_index = index;
        self.session.stage = Some(Stage::load(level, index as u32 + 1, &self.tuning));
        self.events.push(GameEvent::LevelStarted {
            index,
            name: level.name.clone(),
        });
    }

    /// Apply the phase intents sampled for this tick
    pub(crate) fn handle_phase_intents(&mut self, start: bool, pause: bool, resume: bool) {
        match self.session.phase {
            GamePhase::Attract if start => {
                self.start_level(0);
                self.set_phase(GamePhase::Playing);
            }
            GamePhase::Playing if pause => self.set_phase(GamePhase::Paused),
            GamePhase::Paused if resume => self.set_phase(GamePhase::Playing),
            _ => {}
        }
    }

    /// Count down a frozen transition phase
    pub(crate) fn step_transition(&mut self) {
        match self.session.phase {
            GamePhase::BallLost => {
                self.session.phase_ticks += 1;
                if self.session.phase_ticks < self.tuning.ball_lost_ticks {
                    return;
                }
                if self.session.lives > 0 {
                    if let Some(stage) = self.session.stage.as_mut() {
                        stage.spawn_attached_ball(&self.tuning);
                    }
                    self.set_phase(GamePhase::Playing);
                } else {
                    self.end_game(GamePhase::GameOver);
                }
            }
            GamePhase::LevelComplete => {
                self.session.phase_ticks += 1;
                if self.session.phase_ticks < self.tuning.level_clear_ticks {
                    return;
                }
                let next = self.session.level_index + 1;
                if next < self.levels.len() {
                    self.start_level(next);
                    self.set_phase(GamePhase::Playing);
                } else {
                    self.end_game(GamePhase::Victory);
                }
            }
            _ => {}
        }
    }

    fn end_game(&mut self, phase: GamePhase) {
        self.set_phase(phase);
        let final_score = self.session.score;
        log::info!("Game over ({}), final score {}", phase.as_str(), final_score);
        self.events.push(GameEvent::GameOver { final_score });
    }

    /// Fold this tick's events (from index `from` on) into the session
    pub(crate) fn process_events(&mut self, from: usize) {
        let emitted: Vec<GameEvent> = self.events.get(from..).unwrap_or_default().to_vec();
        for event in emitted {
            match event {
                GameEvent::BrickDestroyed { score_value, .. } | GameEvent::BossDestroyed { score_value, .. } => {
                    self.add_score(score_value);
                    self.target_cleared();
                }
                GameEvent::AlienDestroyed { score_value, .. } => self.add_score(score_value),
                GameEvent::CapsuleCaught { effect } => {
                    self.add_score(self.tuning.capsule_points);
                    if effect == EffectType::ExtraLife {
                        self.award_life();
                    }
                }
                GameEvent::WarpEntered => {
                    self.add_score(self.tuning.warp_bonus);
                    self.complete_level();
                }
                // Doh's shot drains every life but the one the following
                // BallLost takes
                GameEvent::PaddleDestroyed if self.session.phase == GamePhase::Playing => {
                    self.session.lives = self.session.lives.min(1);
                }
                GameEvent::BallLost => self.lose_life(),
                _ => {}
            }
        }
    }

    fn target_cleared(&mut self) {
        let cleared = match self.session.stage.as_mut() {
            Some(stage) => {
                debug_assert!(stage.remaining_targets > 0, "target count underflow");
                stage.remaining_targets = stage.remaining_targets.saturating_sub(1);
                stage.remaining_targets == 0
            }
            None => false,
        };
        if cleared {
            self.complete_level();
        }
    }

    fn complete_level(&mut self) {
        if self.session.phase != GamePhase::Playing {
            return;
        }
        log::info!("Level {} complete", self.session.level_index + 1);
        self.events.push(GameEvent::LevelComplete);
        self.set_phase(GamePhase::LevelComplete);
    }

    fn lose_life(&mut self) {
        if self.session.phase != GamePhase::Playing {
            return;
        }
        debug_assert!(self.session.lives > 0, "ball lost with no lives left");
        self.session.lives = self.session.lives.saturating_sub(1);
        log::info!("Ball lost, {} lives left", self.session.lives);
        if let Some(stage) = self.session.stage.as_mut() {
            stage.on_ball_lost(&self.tuning, &mut self.events);
        }
        self.set_phase(GamePhase::BallLost);
    }

    fn award_life(&mut self) {
        self.session.lives += 1;
        self.events.push(GameEvent::ExtraLifeAwarded {
            lives: self.session.lives,
        });
    }

    fn add_score(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.session.score = self.session.score.saturating_add(points);
        self.events.push(GameEvent::ScoreChanged {
            score: self.session.score,
        });
        while self.session.score >= self.session.next_extra_life {
            self.award_life();
            self.session.next_extra_life = match self.tuning.extra_life_every {
                0 => u64::MAX,
                every => self.session.next_extra_life.saturating_add(every),
            };
        }
    }
}
