//! Doh, the final-round boss
//!
//! Doh takes the place of the brick wall and soaks up hits from balls and
//! laser bolts. Between rests it fires a volley of shots aimed at wherever the
//! paddle is; a shot that reaches the paddle destroys it.

use glam::Vec2;

use super::body::{Body, BodyKind};
use super::event::GameEvent;
use super::geom::{Shape, normalize_or};
use super::stage::Stage;
use crate::consts::BOSS_SHOT_SIZE;
use crate::tuning::Tuning;

/// Run the boss's fire cycle for one tick
pub fn update_boss(stage: &mut Stage, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    let target = stage.paddle_aabb().center();
    let mut muzzles = Vec::new();
    for body in stage.registry.iter_mut() {
        let origin = body.pos;
        let Some(boss) = body.as_boss_mut() else {
            continue;
        };
        if boss.timer > 0 {
            boss.timer -= 1;
            continue;
        }
        if boss.volley_left == 0 {
            boss.volley_left = tuning.boss_volley.max(1);
        }
        boss.volley_left -= 1;
        boss.timer = if boss.volley_left > 0 {
            tuning.boss_volley_gap_ticks
        } else {
            tuning.boss_rest_ticks
        };
        muzzles.push(origin);
    }

    for origin in muzzles {
        let dir = normalize_or(target - origin, Vec2::Y);
        let shot = Body::new(origin, Shape::rect(BOSS_SHOT_SIZE, BOSS_SHOT_SIZE), BodyKind::BossShot)
            .with_velocity(dir * tuning.boss_shot_speed);
        stage.registry.add(shot);
        events.push(GameEvent::BossFired);
    }
}

/// Move boss shots; drop the ones that left the field and destroy the paddle
/// if one got through
pub fn update_boss_shots(stage: &mut Stage, dt: f32, events: &mut Vec<GameEvent>) {
    let paddle = stage.paddle_aabb();
    let field = stage.field;
    let mut paddle_hit = false;
    for id in stage.registry.ids_where(|b| b.is_boss_shot()) {
        let Some(body) = stage.registry.get_mut(id) else {
            continue;
        };
        body.pos += body.vel * dt;
        let aabb = body.aabb();
        if aabb.overlaps(&paddle) {
            stage.registry.remove(id);
            paddle_hit = true;
        } else if aabb.min.y > field.max.y || aabb.max.x < field.min.x || aabb.min.x > field.max.x {
            stage.registry.remove(id);
        }
    }
    if paddle_hit {
        stage.destroy_paddle(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::builtin_levels;

    fn boss_stage(tuning: &Tuning) -> Stage {
        let levels = builtin_levels();
        let doh = levels.iter().find(|l| l.boss.is_some()).unwrap();
        Stage::load(doh, 5, tuning)
    }

    #[test]
    fn test_volley_then_rest() {
        let tuning = Tuning::default();
        let mut s = boss_stage(&tuning);
        let mut events = Vec::new();
        let volley_ticks =
            tuning.boss_rest_ticks / 4 + 1 + (tuning.boss_volley - 1) * (tuning.boss_volley_gap_ticks + 1);
        for _ in 0..volley_ticks {
            update_boss(&mut s, &tuning, &mut events);
        }
        assert_eq!(events.len() as u32, tuning.boss_volley);
        assert!(events.iter().all(|e| *e == GameEvent::BossFired));

        // Resting: nothing more until the rest runs out
        for _ in 0..tuning.boss_rest_ticks {
            update_boss(&mut s, &tuning, &mut events);
        }
        assert_eq!(events.len() as u32, tuning.boss_volley);
        update_boss(&mut s, &tuning, &mut events);
        assert_eq!(events.len() as u32, tuning.boss_volley + 1);
    }

    #[test]
    fn test_shots_aim_at_paddle() {
        let tuning = Tuning::default();
        let mut s = boss_stage(&tuning);
        s.move_paddle(-1000.0);
        let mut events = Vec::new();
        for _ in 0..=tuning.boss_rest_ticks / 4 {
            update_boss(&mut s, &tuning, &mut events);
        }
        let shot = s.registry.iter().find(|b| b.is_boss_shot()).unwrap();
        let to_paddle = s.paddle_aabb().center() - shot.pos;
        assert!(shot.vel.normalize().dot(to_paddle.normalize()) > 0.999);
        assert!((shot.vel.length() - tuning.boss_shot_speed).abs() < 1e-3);
    }

    #[test]
    fn test_shot_on_paddle_takes_every_ball() {
        let tuning = Tuning::default();
        let mut s = boss_stage(&tuning);
        let paddle = s.paddle_aabb();
        s.registry.add(
            Body::new(
                Vec2::new(paddle.center().x, paddle.min.y - 5.0),
                Shape::rect(BOSS_SHOT_SIZE, BOSS_SHOT_SIZE),
                BodyKind::BossShot,
            )
            .with_velocity(Vec2::new(0.0, tuning.boss_shot_speed)),
        );
        let mut events = Vec::new();
        update_boss_shots(&mut s, crate::consts::SIM_DT, &mut events);
        assert_eq!(events, vec![GameEvent::PaddleDestroyed, GameEvent::BallLost]);
        assert_eq!(s.ball_count(), 0);
        assert_eq!(s.registry.count_where(|b| b.is_boss_shot()), 0);
    }

    #[test]
    fn test_shot_leaving_field_is_dropped() {
        let tuning = Tuning::default();
        let mut s = boss_stage(&tuning);
        s.move_paddle(-1000.0);
        s.registry.add(
            Body::new(
                Vec2::new(s.field.max.x - 20.0, s.field.max.y + 3.0),
                Shape::rect(BOSS_SHOT_SIZE, BOSS_SHOT_SIZE),
                BodyKind::BossShot,
            )
            .with_velocity(Vec2::new(0.0, tuning.boss_shot_speed)),
        );
        let mut events = Vec::new();
        update_boss_shots(&mut s, crate::consts::SIM_DT, &mut events);
        assert!(events.is_empty());
        assert_eq!(s.registry.count_where(|b| b.is_boss_shot()), 0);
        assert_eq!(s.ball_count(), 1);
    }
}
