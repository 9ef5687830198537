//! Aliens
//!
//! Aliens come in through two inlets in the top wall, feel their way out of
//! the brick wall, then wander down the field in drops, jukes and loops.
//! Anything that touches one kills it: a ball (which bounces off), a laser
//! bolt, or the paddle. Aliens that reach the bottom escape.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Alien, Body, BodyId, BodyKind};
use super::collision::strike_target;
use super::event::GameEvent;
use super::geom::{Aabb, Shape};
use super::stage::Stage;
use crate::consts::ALIEN_SIZE;
use crate::tuning::Tuning;

/// Ticks spent sliding out of the inlet
const ENTER_TICKS: u32 = 192;
/// Length of each straight drop between manoeuvres
const DESCEND_TICKS: u32 = 120;
/// Room a juke or loop needs towards the side it swings to
const JUKE_CLEARANCE: f32 = 64.0;
const LOOP_CLEARANCE: f32 = 80.0;

/// Direction pairs tried while working out of the bricks
const ESCAPE_STATES: [(Vec2, Vec2); 4] = [
    (Vec2::Y, Vec2::NEG_X),
    (Vec2::NEG_X, Vec2::NEG_Y),
    (Vec2::Y, Vec2::X),
    (Vec2::X, Vec2::NEG_Y),
];

/// Velocity (in units of `alien_speed`, swinging right) and duration of each
/// manoeuvre leg
const JUKE: [(Vec2, u32); 4] = [
    (Vec2::new(1.0, 2.0), 20),
    (Vec2::new(2.0, 2.0), 60),
    (Vec2::new(2.0, 1.0), 20),
    (Vec2::new(1.0, 2.0), 20),
];

const LOOP: [(Vec2, u32); 12] = [
    (Vec2::new(1.0, 2.0), 20),
    (Vec2::new(2.0, 2.0), 60),
    (Vec2::new(2.0, 1.0), 20),
    (Vec2::new(2.0, -1.0), 20),
    (Vec2::new(2.0, -2.0), 60),
    (Vec2::new(1.0, -2.0), 20),
    (Vec2::new(-1.0, -2.0), 20),
    (Vec2::new(-2.0, -2.0), 60),
    (Vec2::new(-2.0, -1.0), 20),
    (Vec2::new(-2.0, 1.0), 20),
    (Vec2::new(-2.0, 2.0), 60),
    (Vec2::new(-1.0, 2.0), 20),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Manoeuvre {
    Juke,
    Loop,
}

impl Manoeuvre {
    fn legs(self) -> &'static [(Vec2, u32)] {
        match self {
            Manoeuvre::Juke => &JUKE,
            Manoeuvre::Loop => &LOOP,
        }
    }
}

/// What an alien is doing this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlienMotion {
    /// Sliding down out of the inlet
    Enter { ticks_left: u32 },
    /// Working around the bricks; index into the escape table
    Escape { state: usize },
    /// Straight drop before the next manoeuvre
    Descend { ticks_left: u32 },
    /// `dir` is +1 to swing right, -1 to swing left
    Manoeuvre {
        kind: Manoeuvre,
        dir: f32,
        leg: usize,
        ticks_left: u32,
    },
}

/// Inlet spots just under the top wall, a quarter in from each side
pub fn inlet_positions(field: &Aabb) -> [Vec2; 2] {
    let y = field.min.y + ALIEN_SIZE / 2.0;
    let w = field.width();
    [
        Vec2::new(field.min.x + w * 0.25, y),
        Vec2::new(field.min.x + w * 0.75, y),
    ]
}

/// Count down the inlet timers and let an alien in when one runs out
pub fn update_inlets(stage: &mut Stage, tuning: &Tuning, rng: &mut Pcg32, events: &mut Vec<GameEvent>) {
    let max_aliens = stage.level_tuning.max_aliens;
    if max_aliens == 0 {
        return;
    }
    let delay = stage.level_tuning.alien_spawn_delay_ticks;
    for (i, spot) in inlet_positions(&stage.field).into_iter().enumerate() {
        if stage.inlet_timers[i] > 0 {
            stage.inlet_timers[i] -= 1;
            continue;
        }
        let shape = Shape::rect(ALIEN_SIZE, ALIEN_SIZE);
        if stage.registry.count_where(|b| b.is_alien()) < max_aliens && !blocked(stage, None, &shape.aabb(spot)) {
            let body = Body::new(
                spot,
                shape,
                BodyKind::Alien(Alien {
                    score_value: tuning.alien_points,
                    motion: AlienMotion::Enter {
                        ticks_left: ENTER_TICKS,
                    },
                }),
            );
            stage.registry.add(body);
            log::debug!("Alien in through inlet {}", i);
            events.push(GameEvent::AlienSpawned { position: spot });
        }
        stage.inlet_timers[i] = rng.random_range(0..=delay);
    }
}

/// Move every alien one tick; aliens touching the paddle die, aliens below
/// the field escape
pub fn update_aliens(stage: &mut Stage, tuning: &Tuning, rng: &mut Pcg32, dt: f32, events: &mut Vec<GameEvent>) {
    let paddle = stage.paddle_aabb();
    let field = stage.field;
    let brick_floor = stage
        .registry
        .iter()
        .filter(|b| b.as_brick().is_some())
        .map(|b| b.aabb().max.y)
        .fold(field.min.y, f32::max);
    let step = tuning.alien_speed * dt;

    for id in stage.registry.ids_where(|b| b.is_alien()) {
        let Some(body) = stage.registry.get(id) else {
            continue;
        };
        let Some(motion) = body.as_alien().map(|a| a.motion) else {
            continue;
        };
        let (delta, next) = plan_move(stage, body, motion, step, brick_floor, rng);

        let Some(body) = stage.registry.get_mut(id) else {
            continue;
        };
        let half = body.aabb().half_extents().x;
        body.pos += delta;
        body.pos.x = body.pos.x.clamp(field.min.x + half, (field.max.x - half).max(field.min.x + half));
        body.vel = if dt > 0.0 { delta / dt } else { Vec2::ZERO };
        if let Some(alien) = body.as_alien_mut() {
            alien.motion = next;
        }

        let aabb = body.aabb();
        if aabb.min.y > field.max.y {
            stage.registry.remove(id);
            events.push(GameEvent::AlienEscaped);
        } else if aabb.overlaps(&paddle) {
            strike_target(&mut stage.registry, id, events);
        }
    }
}

fn plan_move(
    stage: &Stage,
    body: &Body,
    motion: AlienMotion,
    step: f32,
    brick_floor: f32,
    rng: &mut Pcg32,
) -> (Vec2, AlienMotion) {
    let shifted = |delta: Vec2| body.shape.aabb(body.pos + delta);
    match motion {
        AlienMotion::Enter { ticks_left } => {
            let delta = Vec2::Y * step;
            if ticks_left == 0 || blocked(stage, Some(body.id), &shifted(delta)) {
                (Vec2::ZERO, AlienMotion::Escape { state: 0 })
            } else {
                (delta, AlienMotion::Enter { ticks_left: ticks_left - 1 })
            }
        }
        AlienMotion::Escape { state } => {
            if body.aabb().min.y >= brick_floor {
                return (
                    Vec2::ZERO,
                    AlienMotion::Descend {
                        ticks_left: DESCEND_TICKS,
                    },
                );
            }
            // Try the preferred pair; roll to the next pair when both are shut
            let mut state = state % ESCAPE_STATES.len();
            for _ in 0..ESCAPE_STATES.len() {
                let (first, second) = ESCAPE_STATES[state];
                for dir in [first, second] {
                    let delta = dir * step;
                    if !blocked(stage, Some(body.id), &shifted(delta)) {
                        return (delta, AlienMotion::Escape { state });
                    }
                }
                state = (state + 1) % ESCAPE_STATES.len();
            }
            (Vec2::ZERO, AlienMotion::Escape { state })
        }
        AlienMotion::Descend { ticks_left } => {
            if ticks_left > 0 {
                (Vec2::Y * step, AlienMotion::Descend { ticks_left: ticks_left - 1 })
            } else {
                (Vec2::ZERO, next_manoeuvre(&stage.field, &body.aabb(), rng))
            }
        }
        AlienMotion::Manoeuvre {
            kind,
            dir,
            leg,
            ticks_left,
        } => {
            let legs = kind.legs();
            let Some(&(unit, _)) = legs.get(leg) else {
                return (
                    Vec2::ZERO,
                    AlienMotion::Descend {
                        ticks_left: DESCEND_TICKS,
                    },
                );
            };
            let delta = Vec2::new(unit.x * dir, unit.y) * step;
            let next = if ticks_left > 1 {
                AlienMotion::Manoeuvre {
                    kind,
                    dir,
                    leg,
                    ticks_left: ticks_left - 1,
                }
            } else {
                match legs.get(leg + 1) {
                    Some(&(_, ticks)) => AlienMotion::Manoeuvre {
                        kind,
                        dir,
                        leg: leg + 1,
                        ticks_left: ticks,
                    },
                    None => AlienMotion::Descend {
                        ticks_left: DESCEND_TICKS,
                    },
                }
            };
            (delta, next)
        }
    }
}

/// Random pick among another drop and whichever manoeuvres have room
fn next_manoeuvre(field: &Aabb, aabb: &Aabb, rng: &mut Pcg32) -> AlienMotion {
    let right_room = field.max.x - aabb.max.x;
    let left_room = aabb.min.x - field.min.x;
    let mut options = vec![AlienMotion::Descend {
        ticks_left: DESCEND_TICKS,
    }];
    for (kind, clearance) in [(Manoeuvre::Juke, JUKE_CLEARANCE), (Manoeuvre::Loop, LOOP_CLEARANCE)] {
        for (dir, room) in [(1.0, right_room), (-1.0, left_room)] {
            if room > clearance {
                options.push(AlienMotion::Manoeuvre {
                    kind,
                    dir,
                    leg: 0,
                    ticks_left: kind.legs()[0].1,
                });
            }
        }
    }
    options[rng.random_range(0..options.len())]
}

/// Something an alien cannot pass overlaps `aabb`
fn blocked(stage: &Stage, me: Option<BodyId>, aabb: &Aabb) -> bool {
    stage
        .registry
        .query_near(aabb, |b| Some(b.id) != me && b.blocks_alien())
        .into_iter()
        .any(|id| stage.registry.get(id).is_some_and(|b| b.aabb().overlaps(aabb)))
}
