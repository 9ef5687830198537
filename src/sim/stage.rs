//! The active level: body registry plus the per-level state the resolver and
//! capsule engine share (paddle modifiers, ball speed, laser cooldown,
//! alien inlets).

use glam::Vec2;

use super::body::{Ball, BallState, Body, BodyId, BodyKind, Boss, Brick, Paddle, WallSide};
use super::capsule::{ActiveEffects, EffectType};
use super::collision::{paddle_bounce_direction, strike_target};
use super::event::GameEvent;
use super::geom::{Aabb, Shape};
use super::registry::BodyRegistry;
use crate::consts::*;
use crate::level::{Level, LevelTuning};
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct Stage {
    pub registry: BodyRegistry,
    pub paddle: BodyId,
    /// Play area inside the walls; open at the bottom
    pub field: Aabb,
    /// 1-based level number (silver brick scaling)
    pub level_number: u32,
    pub level_tuning: LevelTuning,
    /// Ball speed before modifiers; grows with speed-ups
    pub base_ball_speed: f32,
    /// Live destructible bricks plus the boss
    pub remaining_targets: u32,
    pub effects: ActiveEffects,
    /// Playing ticks since load
    pub ticks: u64,
    /// Ticks with a ball in flight since the last serve
    pub rally_ticks: u32,
    pub laser_cooldown: u32,
    pub warp_open: bool,
    /// Ticks until each alien inlet next opens
    pub inlet_timers: [u32; 2],
    serve_offset: f32,
}

impl Stage {
    /// Populate a fresh registry from a level: walls, paddle, bricks in
    /// row-major order, the boss if the level has one, then one ball attached
    /// to the paddle.
    pub fn load(level: &Level, level_number: u32, tuning: &Tuning) -> Self {
        let width = level.field_width();
        let height = level.field_height;
        let field = Aabb::new(Vec2::ZERO, Vec2::new(width, height));
        let mut registry = BodyRegistry::new();

        // Side walls reach below the field so balls never slip past them
        let t = WALL_THICKNESS;
        let walls = [
            (Vec2::new(-t / 2.0, height / 2.0), Vec2::new(t, height + 2.0 * t), WallSide::Left),
            (Vec2::new(width + t / 2.0, height / 2.0), Vec2::new(t, height + 2.0 * t), WallSide::Right),
            (Vec2::new(width / 2.0, -t / 2.0), Vec2::new(width + 2.0 * t, t), WallSide::Top),
        ];
        for (pos, size, side) in walls {
            registry.add(Body::new(pos, Shape::rect(size.x, size.y), BodyKind::Wall(side)));
        }

        let half = PADDLE_WIDTH / 2.0;
        let paddle_x = level.placement.paddle_x.clamp(half, (width - half).max(half));
        let paddle = registry.add(Body::new(
            Vec2::new(paddle_x, level.paddle_y()),
            Shape::rect(PADDLE_WIDTH, PADDLE_HEIGHT),
            BodyKind::Paddle(Paddle {
                base_width: PADDLE_WIDTH,
            }),
        ));

        let mut specs: Vec<_> = level.bricks.iter().collect();
        specs.sort_by_key(|b| (b.row, b.col));
        let multiplier = level.tuning.score_multiplier.max(1) as u64;
        let mut remaining_targets = 0;
        for spec in specs {
            let pos = Vec2::new(
                spec.col as f32 * BRICK_WIDTH + BRICK_WIDTH / 2.0,
                level.grid_top + spec.row as f32 * BRICK_HEIGHT + BRICK_HEIGHT / 2.0,
            );
            let destructible = spec.brick_type.destructible();
            if destructible {
                remaining_targets += 1;
            }
            registry.add(Body::new(
                pos,
                Shape::rect(BRICK_WIDTH, BRICK_HEIGHT),
                BodyKind::Brick(Brick {
                    brick_type: spec.brick_type,
                    hits_left: spec
                        .hit_points
                        .unwrap_or_else(|| spec.brick_type.hit_points(level_number))
                        .max(1),
                    destructible,
                    score_value: spec.brick_type.points(level_number) * multiplier,
                    row: spec.row,
                    col: spec.col,
                }),
            ));
        }

        if let Some(boss) = &level.boss {
            remaining_targets += 1;
            registry.add(Body::new(
                level.boss_center(),
                Shape::rect(BOSS_WIDTH, BOSS_HEIGHT),
                BodyKind::Boss(Boss {
                    hits_left: boss.hit_points.max(1),
                    score_value: boss.score_value * multiplier,
                    timer: tuning.boss_rest_ticks / 4,
                    volley_left: 0,
                }),
            ));
        }

        let base_ball_speed = tuning.clamp_ball_speed(level.tuning.ball_speed);
        let delay = level.tuning.alien_spawn_delay_ticks;
        let mut stage = Self {
            registry,
            paddle,
            field,
            level_number,
            level_tuning: level.tuning.clone(),
            base_ball_speed,
            remaining_targets,
            effects: ActiveEffects::default(),
            ticks: 0,
            rally_ticks: 0,
            laser_cooldown: 0,
            warp_open: false,
            inlet_timers: [delay / 2, delay],
            serve_offset: level.placement.ball_offset,
        };
        stage.spawn_attached_ball(tuning);
        log::info!(
            "Loaded level {} '{}': {} bricks ({} to clear)",
            level_number,
            level.name,
            level.bricks.len(),
            remaining_targets
        );
        stage
    }

    pub fn paddle_body(&self) -> Option<&Body> {
        self.registry.get(self.paddle)
    }

    pub fn paddle_aabb(&self) -> Aabb {
        match self.paddle_body() {
            Some(body) => body.aabb(),
            None => {
                debug_assert!(false, "stage lost its paddle");
                Aabb::new(Vec2::new(0.0, self.field.max.y), Vec2::new(0.0, self.field.max.y))
            }
        }
    }

    pub fn paddle_x(&self) -> f32 {
        self.paddle_aabb().center().x
    }

    pub fn paddle_width(&self) -> f32 {
        self.paddle_aabb().width()
    }

    pub fn ball_ids(&self) -> Vec<BodyId> {
        self.registry.ids_where(|b| b.is_ball())
    }

    pub fn ball_count(&self) -> usize {
        self.registry.count_where(|b| b.is_ball())
    }

    /// First free ball in insertion order
    pub fn free_ball(&self) -> Option<&Body> {
        self.registry
            .iter()
            .find(|b| b.as_ball().is_some_and(|ball| ball.is_free()))
    }

    /// Ball speed with the slow modifier applied
    pub fn target_ball_speed(&self, tuning: &Tuning) -> f32 {
        let mut speed = self.base_ball_speed;
        if self.effects.is_active(EffectType::SlowBall) {
            speed *= tuning.slow_factor;
        }
        tuning.clamp_ball_speed(speed)
    }

    /// Serve a new ball resting on the paddle
    pub fn spawn_attached_ball(&mut self, tuning: &Tuning) -> BodyId {
        let speed = self.target_ball_speed(tuning);
        let offset = self.serve_offset.clamp(-self.paddle_width() / 2.0, self.paddle_width() / 2.0);
        let body = Body::new(
            Vec2::ZERO,
            Shape::circle(BALL_RADIUS),
            BodyKind::Ball(Ball {
                speed,
                state: BallState::Attached {
                    offset,
                    release_tick: None,
                },
            }),
        );
        let id = self.registry.add(body);
        self.sync_attached_balls();
        id
    }

    /// Move the paddle horizontally, clamped to the field. Attached balls ride
    /// along.
    pub fn move_paddle(&mut self, dx: f32) {
        if !dx.is_finite() {
            log::trace!("ignoring non-finite paddle delta {}", dx);
            return;
        }
        let field = self.field;
        if let Some(body) = self.registry.get_mut(self.paddle) {
            let half = body.aabb().width() / 2.0;
            let hi = (field.max.x - half).max(field.min.x + half);
            body.pos.x = (body.pos.x + dx).clamp(field.min.x + half, hi);
        }
        self.sync_attached_balls();
    }

    /// Place attached balls on top of the paddle at their offsets
    fn sync_attached_balls(&mut self) {
        let paddle = self.paddle_aabb();
        let center_x = paddle.center().x;
        let half = paddle.width() / 2.0;
        for body in self.registry.iter_mut() {
            let radius = body.radius();
            let Some(ball) = body.as_ball_mut() else {
                continue;
            };
            if let BallState::Attached { offset, .. } = &mut ball.state {
                *offset = offset.clamp(-half, half);
                let x = center_x + *offset;
                body.pos = Vec2::new(x, paddle.min.y - radius - 0.01);
                body.vel = Vec2::ZERO;
            }
        }
    }

    /// Handle the launch intent: release attached balls, otherwise fire the
    /// laser if it is fitted and cooled down.
    pub fn launch(&mut self, tuning: &Tuning, events: &mut Vec<GameEvent>) {
        if self.release_attached_balls(tuning) > 0 {
            return;
        }
        if self.effects.is_active(EffectType::LaserPaddle) && self.laser_cooldown == 0 {
            self.fire_lasers(tuning, events);
        }
    }

    /// Launch every attached ball. Returns how many left the paddle.
    pub fn release_attached_balls(&mut self, tuning: &Tuning) -> usize {
        let attached = self.registry.ids_where(|b| b.as_ball().is_some_and(|ball| !ball.is_free()));
        for id in &attached {
            self.release_ball(*id, tuning);
        }
        attached.len()
    }

    /// Auto-release balls caught by the sticky paddle once their time is up
    pub fn release_due_balls(&mut self, tuning: &Tuning) {
        let now = self.ticks;
        let due = self.registry.ids_where(|b| {
            matches!(
                b.as_ball().map(|ball| ball.state),
                Some(BallState::Attached { release_tick: Some(at), .. }) if at <= now
            )
        });
        for id in due {
            self.release_ball(id, tuning);
        }
    }

    fn release_ball(&mut self, id: BodyId, tuning: &Tuning) {
        let half = self.paddle_width() / 2.0;
        let speed = self.target_ball_speed(tuning);
        let Some(body) = self.registry.get_mut(id) else {
            return;
        };
        let Some(ball) = body.as_ball_mut() else {
            return;
        };
        let BallState::Attached { offset, .. } = ball.state else {
            return;
        };
        let ratio = if half > EPSILON { (offset / half).clamp(-1.0, 1.0) } else { 0.0 };
        ball.state = BallState::Free;
        ball.speed = speed;
        body.vel = paddle_bounce_direction(ratio, tuning.max_bounce_angle) * speed;
    }

    fn fire_lasers(&mut self, tuning: &Tuning, events: &mut Vec<GameEvent>) {
        let paddle = self.paddle_aabb();
        let y = paddle.min.y - LASER_HEIGHT / 2.0;
        for x in [paddle.min.x + 4.0, paddle.max.x - 4.0] {
            let bolt = Body::new(
                Vec2::new(x, y),
                Shape::rect(LASER_WIDTH, LASER_HEIGHT),
                BodyKind::Laser,
            )
            .with_velocity(Vec2::new(0.0, -tuning.laser_speed));
            self.registry.add(bolt);
        }
        self.laser_cooldown = tuning.laser_cooldown_ticks;
        events.push(GameEvent::LaserFired);
    }

    /// Let go of balls the sticky paddle is holding, as if their time were up
    pub fn release_caught_balls(&mut self, tuning: &Tuning) {
        let caught = self.registry.ids_where(|b| {
            matches!(
                b.as_ball().map(|ball| ball.state),
                Some(BallState::Attached { release_tick: Some(_), .. })
            )
        });
        for id in caught {
            self.release_ball(id, tuning);
        }
    }

    /// Move laser bolts; each strikes the first brick, alien or boss it
    /// overlaps
    pub fn update_lasers(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.laser_cooldown = self.laser_cooldown.saturating_sub(1);
        let top = self.field.min.y;
        for id in self.registry.ids_where(|b| b.is_laser()) {
            let Some(body) = self.registry.get_mut(id) else {
                continue;
            };
            body.pos += body.vel * dt;
            let aabb = body.aabb();
            if aabb.max.y < top {
                self.registry.remove(id);
                continue;
            }
            let hit = self
                .registry
                .query_near(&aabb, |b| b.is_strikeable())
                .into_iter()
                .find(|target| self.registry.get(*target).is_some_and(|b| b.aabb().overlaps(&aabb)));
            if let Some(target) = hit {
                self.registry.remove(id);
                strike_target(&mut self.registry, target, events);
            }
        }
    }

    /// Paddle is touching the right edge with the warp gate open
    pub fn warp_reached(&self) -> bool {
        self.warp_open && self.paddle_aabb().max.x >= self.field.max.x - EPSILON
    }

    /// Recompute paddle width from the active form modifier
    pub fn refresh_paddle_width(&mut self, tuning: &Tuning) {
        let factor = if self.effects.is_active(EffectType::ExpandPaddle) {
            tuning.expand_factor
        } else if self.effects.is_active(EffectType::ShrinkPaddle) {
            tuning.shrink_factor
        } else {
            1.0
        };
        if let Some(body) = self.registry.get_mut(self.paddle) {
            let base = body.as_paddle().map_or(PADDLE_WIDTH, |p| p.base_width);
            body.set_width(tuning.clamp_paddle_width(base * factor));
        }
        // Re-clamp inside the walls at the new width
        self.move_paddle(0.0);
    }

    /// Apply the current target speed to every ball
    pub fn refresh_ball_speed(&mut self, tuning: &Tuning) {
        let speed = self.target_ball_speed(tuning);
        for body in self.registry.iter_mut().filter(|b| b.is_ball()) {
            body.set_ball_speed(speed);
        }
    }

    /// Periodic speed-up while a ball is in flight
    pub fn apply_speedup(&mut self, tuning: &Tuning) {
        if self.free_ball().is_none() {
            return;
        }
        self.rally_ticks += 1;
        let interval = tuning.speedup_interval_ticks;
        if interval == 0 || self.rally_ticks % interval != 0 || self.level_tuning.speedup_factor <= 1.0 {
            return;
        }
        let next = (self.base_ball_speed * self.level_tuning.speedup_factor).min(tuning.max_ball_speed);
        if next > self.base_ball_speed {
            self.base_ball_speed = next;
            log::debug!("Ball speed up to {:.0}", next);
            self.refresh_ball_speed(tuning);
        }
    }

    /// A boss shot got the paddle: every ball in play goes down with it
    pub fn destroy_paddle(&mut self, events: &mut Vec<GameEvent>) {
        for id in self.ball_ids() {
            self.registry.remove(id);
        }
        log::info!("Paddle destroyed");
        events.push(GameEvent::PaddleDestroyed);
        events.push(GameEvent::BallLost);
    }

    /// Reset after the last ball was lost: strip modifiers, clear capsules,
    /// bolts and boss shots, restore the serve speed. Falling capsules count
    /// as missed.
    pub fn on_ball_lost(&mut self, tuning: &Tuning, events: &mut Vec<GameEvent>) {
        for effect in self.effects.clear() {
            events.push(GameEvent::EffectExpired { effect });
        }
        for id in self
            .registry
            .ids_where(|b| b.is_capsule() || b.is_laser() || b.is_ball() || b.is_boss_shot())
        {
            if self.registry.remove(id).is_some_and(|b| b.is_capsule()) {
                events.push(GameEvent::CapsuleMissed);
            }
        }
        self.warp_open = false;
        self.laser_cooldown = 0;
        self.rally_ticks = 0;
        self.base_ball_speed = tuning.clamp_ball_speed(self.level_tuning.ball_speed);
        self.refresh_paddle_width(tuning);
    }
}
