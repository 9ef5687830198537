//! Fixed timestep simulation tick
//!
//! One call to [`tick`] advances the game by exactly `SIM_DT`. Inside a
//! playing tick the order is fixed: intents, body integration (capsules,
//! bolts, aliens, boss shots), collision resolution, capsule effects, state
//! transitions, registry compaction.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::capsule::{self, EffectType};
use super::{alien, boss};
use super::collision::{ResolveParams, remove_lost_balls, resolve_balls};
use super::event::GameEvent;
use super::state::{Game, GamePhase};
use crate::consts::*;
use crate::level::BrickType;

/// Longest frame the scheduler will account for (seconds)
const MAX_FRAME_DT: f32 = 0.1;

/// Discrete player intents, decoupled from devices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Horizontal paddle motion in field pixels
    MovePaddle(f32),
    LaunchBall,
    Pause,
    Resume,
    Start,
}

/// Intents folded into one tick's input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Paddle displacement this tick
    pub paddle_dx: f32,
    /// Launch attached balls, or fire the laser
    pub launch: bool,
    pub pause: bool,
    pub resume: bool,
    pub start: bool,
}

impl TickInput {
    pub fn from_intents(intents: &[Intent]) -> Self {
        let mut input = Self::default();
        for intent in intents {
            input.push(*intent);
        }
        input
    }

    pub fn push(&mut self, intent: Intent) {
        match intent {
            Intent::MovePaddle(dx) if dx.is_finite() => self.paddle_dx += dx,
            Intent::MovePaddle(_) => {}
            Intent::LaunchBall => self.launch = true,
            Intent::Pause => self.pause = true,
            Intent::Resume => self.resume = true,
            Intent::Start => self.start = true,
        }
    }

    fn merge(&mut self, other: &TickInput) {
        self.paddle_dx += other.paddle_dx;
        self.launch |= other.launch;
        self.pause |= other.pause;
        self.resume |= other.resume;
        self.start |= other.start;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Advance the game by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput) {
    game.tick_count += 1;
    let mark = game.events.len();

    game.handle_phase_intents(input.start, input.pause, input.resume);

    match game.session.phase {
        GamePhase::Playing => {}
        GamePhase::BallLost | GamePhase::LevelComplete => {
            game.step_transition();
            return;
        }
        // Attract, Paused and terminal phases hold everything still
        _ => return,
    }

    step_playing(game, input, mark);
    game.process_events(mark);

    if let Some(stage) = game.session.stage.as_mut() {
        stage.registry.compact();
    }
}

fn step_playing(game: &mut Game, input: &TickInput, mark: usize) {
    let Game {
        session,
        tuning,
        rng,
        events,
        ..
    } = game;
    let Some(stage) = session.stage.as_mut() else {
        debug_assert!(false, "playing without a stage");
        return;
    };
    stage.ticks += 1;

    // Intents
    stage.move_paddle(input.paddle_dx);
    if input.launch {
        stage.launch(tuning, events);
    }
    stage.release_due_balls(tuning);

    // Integration of the discrete movers
    let caught = capsule::update_capsules(stage, SIM_DT, events);
    stage.update_lasers(SIM_DT, events);
    alien::update_inlets(stage, tuning, rng, events);
    alien::update_aliens(stage, tuning, rng, SIM_DT, events);
    boss::update_boss(stage, tuning, events);
    boss::update_boss_shots(stage, SIM_DT, events);

    // Balls
    let params = ResolveParams {
        dt: SIM_DT,
        max_bounce_angle: tuning.max_bounce_angle,
        sticky: stage.effects.is_active(EffectType::StickyPaddle),
        sticky_release_tick: stage.ticks + tuning.sticky_release_ticks,
    };
    resolve_balls(&mut stage.registry, &params, events);
    let baseline = stage.paddle_aabb().max.y;
    remove_lost_balls(&mut stage.registry, baseline, events);

    // Capsule effects
    let destroyed: Vec<(Vec2, BrickType)> = events[mark..]
        .iter()
        .filter_map(|e| match e {
            GameEvent::BrickDestroyed {
                position, brick_type, ..
            } => Some((*position, *brick_type)),
            _ => None,
        })
        .collect();
    capsule::spawn_capsules(stage, &destroyed, tuning, rng, events);
    for effect in caught {
        capsule::apply_effect(stage, effect, tuning, events);
    }
    capsule::expire_effects(stage, tuning, events);

    stage.apply_speedup(tuning);
    if stage.warp_reached() {
        stage.warp_open = false;
        events.push(GameEvent::WarpEntered);
    }
}

/// Accumulator driving [`tick`] from a variable frame clock
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
    /// Input gathered during frames too short to run a tick
    pending: TickInput,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every whole tick that fits in the accumulated time, at most
    /// `MAX_SUBSTEPS`. Input applies to the first tick only. Returns the
    /// number of ticks run.
    pub fn advance(&mut self, game: &mut Game, frame_dt: f32, input: &TickInput) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += dt;
        self.pending.merge(input);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = std::mem::take(&mut self.pending);
            tick(game, &input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        if self.accumulator >= SIM_DT {
            log::debug!("Dropping {:.3}s of simulation time", self.accumulator);
            self.accumulator = 0.0;
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.pending = TickInput::default();
    }

    /// Fraction of a tick left in the accumulator (render interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::sim::body::Body;
    use crate::tuning::Tuning;

    fn game() -> Game {
        let level = Level::from_rows("t", &["", "", "", "rrrrrrrrrrr", "ggggggggggg"]).unwrap();
        Game::new(vec![level], Tuning::default(), 12345).unwrap()
    }

    fn press(intent: Intent) -> TickInput {
        TickInput::from_intents(&[intent])
    }

    fn bodies(game: &Game) -> Vec<Body> {
        game.stage().unwrap().registry.iter().cloned().collect()
    }

    #[test]
    fn test_tick_start_and_launch() {
        let mut g = game();
        tick(&mut g, &TickInput::default());
        assert_eq!(g.phase(), GamePhase::Attract);

        tick(&mut g, &press(Intent::Start));
        assert_eq!(g.phase(), GamePhase::Playing);
        assert!(g.stage().unwrap().free_ball().is_none());

        tick(&mut g, &press(Intent::LaunchBall));
        let ball = g.stage().unwrap().free_ball().unwrap();
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_pause_freezes_exactly() {
        let mut g = game();
        tick(&mut g, &press(Intent::Start));
        tick(&mut g, &press(Intent::LaunchBall));
        for _ in 0..10 {
            tick(&mut g, &TickInput::default());
        }

        tick(&mut g, &press(Intent::Pause));
        assert_eq!(g.phase(), GamePhase::Paused);
        let frozen = bodies(&g);
        let ticks = g.stage().unwrap().ticks;
        g.drain_events();

        let busy = TickInput::from_intents(&[Intent::MovePaddle(40.0), Intent::LaunchBall]);
        for _ in 0..50 {
            tick(&mut g, &busy);
        }
        assert_eq!(bodies(&g), frozen);
        assert_eq!(g.stage().unwrap().ticks, ticks);
        assert!(g.drain_events().is_empty());

        tick(&mut g, &press(Intent::Resume));
        assert_eq!(g.phase(), GamePhase::Playing);
        assert_ne!(bodies(&g), frozen);
    }

    #[test]
    fn test_determinism() {
        let script: Vec<TickInput> = (0..3000)
            .map(|i| match i {
                0 => press(Intent::Start),
                1 => press(Intent::LaunchBall),
                _ if i % 240 == 0 => press(Intent::LaunchBall),
                _ => press(Intent::MovePaddle(((i as f32) * 0.05).sin() * 3.0)),
            })
            .collect();

        let run = || {
            let mut g = game();
            let mut log = Vec::new();
            for input in &script {
                tick(&mut g, input);
                log.extend(g.drain_events());
            }
            (log, g.score(), g.lives())
        };
        let (a, score_a, lives_a) = run();
        let (b, score_b, lives_b) = run();
        assert!(!a.is_empty());
        assert_eq!(a, b);
        assert_eq!(score_a, score_b);
        assert_eq!(lives_a, lives_b);
    }

    #[test]
    fn test_fixed_step_counts_whole_ticks() {
        let mut g = game();
        let mut step = FixedStep::new();
        assert_eq!(step.advance(&mut g, SIM_DT * 2.5, &TickInput::default()), 2);
        assert!(step.alpha() < 1.0);
        // A long stall is capped and the excess dropped
        assert_eq!(step.advance(&mut g, 1.0, &TickInput::default()), MAX_SUBSTEPS);
        assert_eq!(step.alpha(), 0.0);
        assert_eq!(step.advance(&mut g, f32::NAN, &TickInput::default()), 0);
        assert_eq!(g.tick_count(), 2 + MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_fixed_step_keeps_input_for_next_tick() {
        let mut g = game();
        let mut step = FixedStep::new();
        assert_eq!(step.advance(&mut g, SIM_DT * 0.25, &press(Intent::Start)), 0);
        assert_eq!(g.phase(), GamePhase::Attract);
        step.advance(&mut g, SIM_DT, &TickInput::default());
        assert_eq!(g.phase(), GamePhase::Playing);

        // One-shot input only reaches the first tick of a multi-tick frame
        step.reset();
        let ticks = step.advance(&mut g, SIM_DT * 3.0, &press(Intent::Pause));
        assert!(ticks >= 2);
        assert_eq!(g.phase(), GamePhase::Paused);
    }

    #[test]
    fn test_intents_fold() {
        let input = TickInput::from_intents(&[
            Intent::MovePaddle(3.0),
            Intent::MovePaddle(-1.0),
            Intent::MovePaddle(f32::NAN),
            Intent::LaunchBall,
        ]);
        assert_eq!(input.paddle_dx, 2.0);
        assert!(input.launch && !input.pause);
        assert!(TickInput::default().is_empty());
    }
}
