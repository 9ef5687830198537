//! Headless native driver
//!
//! Runs the simulation with a simple autopilot and logs what happens.
//!
//! Usage: `brickbreak [seed] [seconds] [easy|normal|hard] [levels.json]`
//! Set `RUST_LOG=info` (or `debug`) to see the event stream.

use std::error::Error;

use brickbreak::level::builtin_levels;
use brickbreak::tuning::Difficulty;
use brickbreak::{FixedStep, Game, GameEvent, GamePhase, Intent, Level, TickInput, Tuning};

/// Host frame time (60 Hz display)
const FRAME_DT: f32 = 1.0 / 60.0;

/// Fastest the autopilot moves the paddle per frame, in pixels
const AUTOPILOT_STEP: f32 = 8.0;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Brickbreak (headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args.next().map(|s| s.parse()).transpose()?.unwrap_or(12345u64);
    let seconds = args.next().map(|s| s.parse()).transpose()?.unwrap_or(300.0f32);
    let difficulty = match args.next() {
        Some(name) => Difficulty::from_str(&name).ok_or_else(|| format!("unknown difficulty '{}'", name))?,
        None => Difficulty::default(),
    };
    let tuning = Tuning::from_difficulty(difficulty);
    log::info!("Difficulty {}", difficulty.as_str());
    let levels = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            let levels: Vec<Level> = serde_json::from_str(&json)?;
            log::info!("Loaded {} levels from {}", levels.len(), path);
            levels
        }
        None => builtin_levels(),
    };

    let mut game = Game::new(levels, tuning, seed)?;
    let mut step = FixedStep::new();
    let frames = (seconds / FRAME_DT).ceil() as u64;

    for _ in 0..frames {
        let input = autopilot(&game);
        step.advance(&mut game, FRAME_DT, &input);
        for event in game.drain_events() {
            report(&event);
        }
        if game.phase().is_over() {
            break;
        }
    }

    println!(
        "phase={} score={} lives={} level={} ticks={}",
        game.phase().as_str(),
        game.score(),
        game.lives(),
        game.level_index() + 1,
        game.tick_count()
    );
    Ok(())
}

/// Follow the lowest free ball, launch whenever one is waiting
fn autopilot(game: &Game) -> TickInput {
    let mut intents = Vec::new();
    match game.phase() {
        GamePhase::Attract => intents.push(Intent::Start),
        GamePhase::Playing => {
            if let Some(stage) = game.stage() {
                let paddle_x = stage.paddle_x();
                let lowest = stage
                    .registry
                    .iter()
                    .filter(|b| b.as_ball().is_some_and(|ball| ball.is_free()))
                    .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
                match lowest {
                    Some(ball) => {
                        let dx = (ball.pos.x - paddle_x).clamp(-AUTOPILOT_STEP, AUTOPILOT_STEP);
                        intents.push(Intent::MovePaddle(dx));
                    }
                    None => intents.push(Intent::LaunchBall),
                }
            }
        }
        _ => {}
    }
    TickInput::from_intents(&intents)
}

fn report(event: &GameEvent) {
    match event {
        GameEvent::LevelStarted { index, name } => log::info!("Level {} '{}'", index + 1, name),
        GameEvent::LevelComplete => log::info!("Level cleared"),
        GameEvent::BallLost => log::info!("Ball lost"),
        GameEvent::ExtraLifeAwarded { lives } => log::info!("Extra life ({} lives)", lives),
        GameEvent::CapsuleCaught { effect } => log::info!("Caught {}", effect.as_str()),
        GameEvent::BossDestroyed { .. } => log::info!("Doh destroyed"),
        GameEvent::PaddleDestroyed => log::info!("Paddle destroyed"),
        GameEvent::GameOver { final_score } => log::info!("Final score {}", final_score),
        GameEvent::BallBounced { .. } | GameEvent::ScoreChanged { .. } => log::trace!("{:?}", event),
        other => log::debug!("{:?}", other),
    }
}
