//! Collision detection and response
//!
//! Only balls are detectors. Each free ball traces its path for the tick,
//! takes the earliest impact among paddle, bricks, aliens, boss and walls, reflects, and
//! re-traces the remaining time from the impact point. One impact per
//! sub-step, never two reflections from the same trace.

use glam::Vec2;

use super::body::{BallState, BodyId, BodyKind, Surface};
use super::event::GameEvent;
use super::geom::{Aabb, SweptHit, normalize_or, reflect, sweep_circle_rect};
use super::registry::BodyRegistry;
use crate::consts::EPSILON;

/// Impacts processed per ball per tick; leftover time is dropped
pub const MAX_IMPACTS_PER_TICK: usize = 8;

/// Gap left between a ball and the surface it just struck
const CONTACT_SKIN: f32 = 0.01;

/// Per-tick inputs to the resolver
#[derive(Debug, Clone, Copy)]
pub struct ResolveParams {
    pub dt: f32,
    pub max_bounce_angle: f32,
    /// Sticky paddle active: paddle hits attach instead of bouncing
    pub sticky: bool,
    /// Absolute stage tick at which a caught ball auto-releases
    pub sticky_release_tick: u64,
}

/// Ratio of the contact offset to the paddle half-width, in [-1, 1]
pub fn offset_ratio(contact_x: f32, paddle_center_x: f32, paddle_width: f32) -> f32 {
    let half = (paddle_width * 0.5).max(EPSILON);
    let ratio = (contact_x - paddle_center_x) / half;
    if ratio.is_finite() { ratio.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Outgoing direction off the paddle.
///
/// Depends only on where the ball touched: center goes straight up, the
/// edges leave at `max_angle` from vertical.
pub fn paddle_bounce_direction(ratio: f32, max_angle: f32) -> Vec2 {
    let angle = ratio.clamp(-1.0, 1.0) * max_angle;
    Vec2::new(angle.sin(), -angle.cos())
}

/// Damage a brick, alien or the boss. Returns true if this hit destroyed it.
///
/// Indestructible bricks shrug the hit off. A body already removed is left
/// alone, so destruction can only happen once.
pub fn strike_target(registry: &mut BodyRegistry, id: BodyId, events: &mut Vec<GameEvent>) -> bool {
    let Some(body) = registry.get_mut(id) else {
        debug_assert!(false, "strike on missing body {:?}", id);
        return false;
    };
    let position = body.pos;
    let destroyed = match &mut body.kind {
        BodyKind::Brick(brick) => {
            if !brick.destructible {
                return false;
            }
            debug_assert!(brick.hits_left > 0, "live brick with zero hit points");
            brick.hits_left = brick.hits_left.saturating_sub(1);
            if brick.hits_left > 0 {
                events.push(GameEvent::BrickHit {
                    position,
                    hits_left: brick.hits_left,
                });
                return false;
            }
            GameEvent::BrickDestroyed {
                position,
                brick_type: brick.brick_type,
                score_value: brick.score_value,
            }
        }
        BodyKind::Alien(alien) => GameEvent::AlienDestroyed {
            position,
            score_value: alien.score_value,
        },
        BodyKind::Boss(boss) => {
            boss.hits_left = boss.hits_left.saturating_sub(1);
            if boss.hits_left > 0 {
                events.push(GameEvent::BossHit {
                    hits_left: boss.hits_left,
                });
                return false;
            }
            log::info!("Boss destroyed");
            GameEvent::BossDestroyed {
                position,
                score_value: boss.score_value,
            }
        }
        _ => return false,
    };
    registry.remove(id);
    events.push(destroyed);
    true
}

/// Advance every free ball by one tick, resolving impacts
pub fn resolve_balls(registry: &mut BodyRegistry, params: &ResolveParams, events: &mut Vec<GameEvent>) {
    let balls = registry.ids_where(|b| b.as_ball().is_some_and(|ball| ball.is_free()));
    for id in balls {
        step_ball(registry, id, params, events);
    }
}

fn step_ball(registry: &mut BodyRegistry, id: BodyId, params: &ResolveParams, events: &mut Vec<GameEvent>) {
    let Some(body) = registry.get(id) else {
        return;
    };
    let Some(ball) = body.as_ball() else {
        return;
    };
    let radius = body.radius().max(EPSILON);
    let speed = ball.speed;
    let mut pos = body.pos;
    let mut vel = normalize_or(body.vel, Vec2::NEG_Y) * speed;
    let mut remaining = 1.0f32;
    let mut attached = None;

    for _ in 0..MAX_IMPACTS_PER_TICK {
        let delta = vel * params.dt * remaining;
        let Some((target, hit)) = earliest_impact(registry, pos, radius, delta) else {
            pos += delta;
            break;
        };

        pos += delta * hit.toi + hit.normal * CONTACT_SKIN;
        remaining *= 1.0 - hit.toi;

        let Some(target_body) = registry.get(target) else {
            break;
        };
        let surface = match target_body.kind {
            BodyKind::Paddle(_) => Surface::Paddle,
            BodyKind::Brick(_) => Surface::Brick,
            BodyKind::Wall(_) => Surface::Wall,
            BodyKind::Alien(_) => Surface::Alien,
            BodyKind::Boss(_) => Surface::Boss,
            _ => {
                debug_assert!(false, "ball struck a non-target body");
                break;
            }
        };
        let target_aabb = target_body.aabb();
        let target_x = target_body.pos.x;
        events.push(GameEvent::BallBounced { surface });

        match surface {
            // Clipping the paddle's side below its middle knocks the ball down
            Surface::Paddle if hit.normal.x != 0.0 && pos.y > target_aabb.center().y => {
                let angle = params.max_bounce_angle;
                vel = Vec2::new(hit.normal.x * angle.sin(), angle.cos()) * speed;
            }
            Surface::Paddle => {
                if params.sticky {
                    pos.y = target_aabb.min.y - radius - CONTACT_SKIN;
                    attached = Some(pos.x - target_x);
                    break;
                }
                let ratio = offset_ratio(pos.x, target_x, target_aabb.width());
                vel = paddle_bounce_direction(ratio, params.max_bounce_angle) * speed;
            }
            Surface::Brick | Surface::Alien | Surface::Boss => {
                vel = reflect(vel, hit.normal);
                strike_target(registry, target, events);
            }
            Surface::Wall => vel = reflect(vel, hit.normal),
        }

        if remaining <= EPSILON {
            break;
        }
    }

    if let Some(body) = registry.get_mut(id) {
        body.pos = pos;
        match attached {
            Some(offset) => {
                body.vel = Vec2::ZERO;
                if let Some(ball) = body.as_ball_mut() {
                    ball.state = BallState::Attached {
                        offset,
                        release_tick: Some(params.sticky_release_tick),
                    };
                }
            }
            None => body.vel = vel,
        }
    }
}

/// Smallest time of impact among candidate targets; ties keep the
/// earliest-inserted body
fn earliest_impact(registry: &BodyRegistry, pos: Vec2, radius: f32, delta: Vec2) -> Option<(BodyId, SweptHit)> {
    let half = Vec2::splat(radius);
    let swept = Aabb::from_center(pos, half).union(&Aabb::from_center(pos + delta, half));

    let mut best: Option<(BodyId, SweptHit)> = None;
    for candidate in registry.query_near(&swept, |b| b.is_ball_target()) {
        let Some(target) = registry.get(candidate) else {
            continue;
        };
        let Some(hit) = sweep_circle_rect(pos, radius, delta, &target.aabb()) else {
            continue;
        };
        if best.is_none_or(|(_, b)| hit.toi < b.toi) {
            best = Some((candidate, hit));
        }
    }
    best
}

/// Remove balls that fell below the paddle's baseline.
///
/// Emits `BallDropped` while others remain and `BallLost` when the last one
/// goes.
pub fn remove_lost_balls(registry: &mut BodyRegistry, baseline: f32, events: &mut Vec<GameEvent>) {
    let lost = registry.ids_where(|b| b.is_ball() && b.pos.y - b.radius() > baseline);
    if lost.is_empty() {
        return;
    }
    for id in lost {
        registry.remove(id);
        let remaining = registry.count_where(|b| b.is_ball());
        if remaining == 0 {
            events.push(GameEvent::BallLost);
        } else {
            events.push(GameEvent::BallDropped { remaining });
        }
    }
}
