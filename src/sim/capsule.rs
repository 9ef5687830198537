//! Capsule / power-up engine
//!
//! Capsules drop from destroyed bricks, fall at a fixed speed and are either
//! caught by the paddle or missed. Effects are plain data keyed by
//! [`EffectType`]; applying one is a match over a closed set.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyKind, Capsule};
use super::event::GameEvent;
use super::geom::{Shape, rects_overlap};
use super::stage::Stage;
use crate::consts::{CAPSULE_HEIGHT, CAPSULE_WIDTH};
use crate::level::{BrickType, CapsuleWeight, LevelTuning};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    ExpandPaddle,
    ShrinkPaddle,
    MultiBall,
    SlowBall,
    ExtraLife,
    StickyPaddle,
    LaserPaddle,
    Warp,
}

/// Effects in the same category replace each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectCategory {
    PaddleForm,
    Grip,
    BallSpeed,
}

impl EffectType {
    /// `None` for one-shot effects, which are never held as active
    pub fn category(self) -> Option<EffectCategory> {
        match self {
            EffectType::ExpandPaddle | EffectType::ShrinkPaddle | EffectType::LaserPaddle => {
                Some(EffectCategory::PaddleForm)
            }
            EffectType::StickyPaddle => Some(EffectCategory::Grip),
            EffectType::SlowBall => Some(EffectCategory::BallSpeed),
            EffectType::MultiBall | EffectType::ExtraLife | EffectType::Warp => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectType::ExpandPaddle => "expand",
            EffectType::ShrinkPaddle => "shrink",
            EffectType::MultiBall => "multi-ball",
            EffectType::SlowBall => "slow",
            EffectType::ExtraLife => "extra-life",
            EffectType::StickyPaddle => "sticky",
            EffectType::LaserPaddle => "laser",
            EffectType::Warp => "warp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    /// Stage tick at which the effect ends
    AtTick(u64),
    UntilBallLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub effect: EffectType,
    pub expiry: Expiry,
}

/// Effects currently modifying the paddle or balls, at most one per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    effects: Vec<ActiveEffect>,
}

impl ActiveEffects {
    /// Activate an effect, replacing whatever held its category.
    ///
    /// Returns the displaced effect if it was a different one. One-shot
    /// effects are ignored.
    pub fn activate(&mut self, effect: EffectType, expiry: Expiry) -> Option<EffectType> {
        let category = effect.category()?;
        let mut displaced = None;
        self.effects.retain(|a| {
            if a.effect.category() == Some(category) {
                if a.effect != effect {
                    displaced = Some(a.effect);
                }
                false
            } else {
                true
            }
        });
        self.effects.push(ActiveEffect { effect, expiry });
        displaced
    }

    pub fn is_active(&self, effect: EffectType) -> bool {
        self.get(effect).is_some()
    }

    pub fn get(&self, effect: EffectType) -> Option<&ActiveEffect> {
        self.effects.iter().find(|a| a.effect == effect)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Drop timed effects due at or before `now`, in activation order
    pub fn expire_due(&mut self, now: u64) -> Vec<EffectType> {
        let mut expired = Vec::new();
        self.effects.retain(|a| match a.expiry {
            Expiry::AtTick(at) if at <= now => {
                expired.push(a.effect);
                false
            }
            _ => true,
        });
        expired
    }

    /// End whatever holds `category`, returning it
    pub fn end(&mut self, category: EffectCategory) -> Option<EffectType> {
        let at = self.effects.iter().position(|a| a.effect.category() == Some(category))?;
        Some(self.effects.remove(at).effect)
    }

    /// Drop everything (ball lost)
    pub fn clear(&mut self) -> Vec<EffectType> {
        self.effects.drain(..).map(|a| a.effect).collect()
    }
}

/// Decide whether a destroyed brick drops a capsule
pub fn roll_drop(rng: &mut Pcg32, brick_type: BrickType, tuning: &LevelTuning) -> bool {
    let p = (brick_type.drop_weight() * tuning.capsule_drop_rate).clamp(0.0, 1.0);
    if p <= 0.0 {
        return false;
    }
    if p >= 1.0 {
        return true;
    }
    rng.random_bool(p as f64)
}

/// Weighted draw over the capsule table, skipping effects `blocked` rules out
pub fn pick_effect(
    rng: &mut Pcg32,
    weights: &[CapsuleWeight],
    blocked: impl Fn(EffectType) -> bool,
) -> Option<EffectType> {
    let blocked = &blocked;
    let open = move || weights.iter().filter(move |w| w.weight > 0 && !blocked(w.effect));
    let total: u64 = open().map(|w| u64::from(w.weight)).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for w in open() {
        let weight = u64::from(w.weight);
        if roll < weight {
            return Some(w.effect);
        }
        roll -= weight;
    }
    None
}

/// Spawn capsules for bricks destroyed this tick.
///
/// Nothing drops unless exactly one ball is in play, and a capsule never
/// carries an until-ball-lost effect that is already on (or warp once the
/// gate is open).
pub fn spawn_capsules(
    stage: &mut Stage,
    destroyed: &[(Vec2, BrickType)],
    tuning: &Tuning,
    rng: &mut Pcg32,
    events: &mut Vec<GameEvent>,
) {
    for &(position, brick_type) in destroyed {
        if stage.ball_count() != 1 {
            return;
        }
        if stage.registry.count_where(|b| b.is_capsule()) >= tuning.max_active_capsules {
            return;
        }
        if !roll_drop(rng, brick_type, &stage.level_tuning) {
            continue;
        }
        let held = |effect: EffectType| match effect {
            EffectType::Warp => stage.warp_open,
            _ => stage
                .effects
                .get(effect)
                .is_some_and(|a| a.expiry == Expiry::UntilBallLost),
        };
        let Some(effect) = pick_effect(rng, &stage.level_tuning.capsule_weights, held) else {
            continue;
        };
        let body = Body::new(
            position,
            Shape::rect(CAPSULE_WIDTH, CAPSULE_HEIGHT),
            BodyKind::Capsule(Capsule { effect }),
        )
        .with_velocity(Vec2::new(0.0, tuning.capsule_fall_speed));
        stage.registry.add(body);
        log::debug!("Capsule {} spawned at ({:.0}, {:.0})", effect.as_str(), position.x, position.y);
        events.push(GameEvent::CapsuleSpawned { position, effect });
    }
}

/// Advance falling capsules and resolve catches and misses.
///
/// Returns the caught effects in capsule order.
pub fn update_capsules(stage: &mut Stage, dt: f32, events: &mut Vec<GameEvent>) -> Vec<EffectType> {
    let paddle = stage.paddle_aabb();
    let floor = stage.field.max.y;
    let mut caught = Vec::new();

    for id in stage.registry.ids_where(|b| b.is_capsule()) {
        let Some(body) = stage.registry.get_mut(id) else {
            continue;
        };
        body.pos += body.vel * dt;
        let aabb = body.aabb();
        let effect = match &body.kind {
            BodyKind::Capsule(c) => c.effect,
            _ => continue,
        };

        if rects_overlap(&aabb, &paddle) {
            stage.registry.remove(id);
            events.push(GameEvent::CapsuleCaught { effect });
            caught.push(effect);
        } else if aabb.min.y > floor {
            stage.registry.remove(id);
            events.push(GameEvent::CapsuleMissed);
        }
    }
    caught
}

/// Apply a caught effect to the stage.
///
/// Any catch other than sticky lets go of the grip and frees held balls; any
/// catch outside the paddle-form group puts the paddle back to normal.
/// ExtraLife only changes the session, so that is all it does here.
pub fn apply_effect(stage: &mut Stage, effect: EffectType, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    if effect != EffectType::StickyPaddle {
        if let Some(ended) = stage.effects.end(EffectCategory::Grip) {
            events.push(GameEvent::EffectExpired { effect: ended });
            stage.release_caught_balls(tuning);
        }
    }
    if effect.category() != Some(EffectCategory::PaddleForm) {
        if let Some(ended) = stage.effects.end(EffectCategory::PaddleForm) {
            events.push(GameEvent::EffectExpired { effect: ended });
            stage.refresh_paddle_width(tuning);
        }
    }

    let now = stage.ticks;
    let expiry = match effect {
        EffectType::ShrinkPaddle => Some(Expiry::AtTick(now + tuning.shrink_ticks)),
        EffectType::SlowBall => Some(Expiry::AtTick(now + tuning.slow_ticks)),
        EffectType::ExpandPaddle | EffectType::LaserPaddle | EffectType::StickyPaddle => {
            Some(Expiry::UntilBallLost)
        }
        EffectType::MultiBall | EffectType::ExtraLife | EffectType::Warp => None,
    };

    if let Some(expiry) = expiry {
        if let Some(displaced) = stage.effects.activate(effect, expiry) {
            events.push(GameEvent::EffectExpired { effect: displaced });
        }
    }

    match effect {
        EffectType::ExpandPaddle | EffectType::ShrinkPaddle | EffectType::LaserPaddle => {
            stage.refresh_paddle_width(tuning);
        }
        EffectType::SlowBall => stage.refresh_ball_speed(tuning),
        EffectType::MultiBall => split_balls(stage, tuning),
        EffectType::Warp => stage.warp_open = true,
        EffectType::StickyPaddle | EffectType::ExtraLife => {}
    }
    log::debug!("Effect {} applied", effect.as_str());
}

/// Revert timed effects that ran out
pub fn expire_effects(stage: &mut Stage, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    let expired = stage.effects.expire_due(stage.ticks);
    if expired.is_empty() {
        return;
    }
    for effect in &expired {
        log::debug!("Effect {} expired", effect.as_str());
        events.push(GameEvent::EffectExpired { effect: *effect });
    }
    stage.refresh_paddle_width(tuning);
    stage.refresh_ball_speed(tuning);
}

/// Clone the first free ball until `multiball_count` balls are in play
fn split_balls(stage: &mut Stage, tuning: &Tuning) {
    if stage.free_ball().is_none() {
        stage.release_attached_balls(tuning);
    }
    let Some(source) = stage.free_ball().cloned() else {
        return;
    };
    let extra = tuning.multiball_count.saturating_sub(stage.ball_count());
    for k in 1..=extra {
        let step = k.div_ceil(2) as f32 * tuning.multiball_spread;
        let angle = if k % 2 == 1 { step } else { -step };
        let mut clone = source.clone();
        clone.vel = super::geom::rotate(source.vel, angle);
        stage.registry.add(clone);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::consts::PADDLE_WIDTH;

    #[test]
    fn test_same_category_replaces() {
        let mut effects = ActiveEffects::default();
        assert_eq!(effects.activate(EffectType::ExpandPaddle, Expiry::UntilBallLost), None);
        let displaced = effects.activate(EffectType::ShrinkPaddle, Expiry::AtTick(100));
        assert_eq!(displaced, Some(EffectType::ExpandPaddle));
        assert!(!effects.is_active(EffectType::ExpandPaddle));
        assert_eq!(effects.len(), 1);

        // Different category coexists
        effects.activate(EffectType::SlowBall, Expiry::AtTick(50));
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn test_recatch_resets_duration_not_stacks() {
        let mut effects = ActiveEffects::default();
        effects.activate(EffectType::SlowBall, Expiry::AtTick(100));
        assert_eq!(effects.activate(EffectType::SlowBall, Expiry::AtTick(150)), None);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.get(EffectType::SlowBall).unwrap().expiry, Expiry::AtTick(150));
        assert!(effects.expire_due(100).is_empty());
        assert_eq!(effects.expire_due(150), vec![EffectType::SlowBall]);
    }

    #[test]
    fn test_one_shot_effects_are_not_held() {
        let mut effects = ActiveEffects::default();
        effects.activate(EffectType::MultiBall, Expiry::UntilBallLost);
        effects.activate(EffectType::ExtraLife, Expiry::UntilBallLost);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_until_ball_lost_survives_expiry() {
        let mut effects = ActiveEffects::default();
        effects.activate(EffectType::LaserPaddle, Expiry::UntilBallLost);
        effects.activate(EffectType::StickyPaddle, Expiry::UntilBallLost);
        assert!(effects.expire_due(u64::MAX).is_empty());
        assert_eq!(effects.clear(), vec![EffectType::LaserPaddle, EffectType::StickyPaddle]);
    }

    #[test]
    fn test_end_category() {
        let mut effects = ActiveEffects::default();
        effects.activate(EffectType::LaserPaddle, Expiry::UntilBallLost);
        effects.activate(EffectType::SlowBall, Expiry::AtTick(10));
        assert_eq!(effects.end(EffectCategory::PaddleForm), Some(EffectType::LaserPaddle));
        assert_eq!(effects.end(EffectCategory::PaddleForm), None);
        assert!(effects.is_active(EffectType::SlowBall));
    }

    #[test]
    fn test_roll_drop_bounds() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut always = LevelTuning::default();
        always.capsule_drop_rate = 1.0;
        let mut never = LevelTuning::default();
        never.capsule_drop_rate = 0.0;
        for _ in 0..20 {
            assert!(roll_drop(&mut rng, BrickType::Red, &always));
            assert!(!roll_drop(&mut rng, BrickType::Red, &never));
            assert!(!roll_drop(&mut rng, BrickType::Silver, &always));
        }
    }

    #[test]
    fn test_pick_effect_weighted_and_seeded() {
        let single = [
            CapsuleWeight {
                effect: EffectType::ExpandPaddle,
                weight: 0,
            },
            CapsuleWeight {
                effect: EffectType::LaserPaddle,
                weight: 3,
            },
        ];
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(pick_effect(&mut rng, &single, |_| false), Some(EffectType::LaserPaddle));
        }
        assert_eq!(pick_effect(&mut rng, &[], |_| false), None);

        let table = crate::level::default_capsule_weights();
        let a: Vec<_> = {
            let mut rng = Pcg32::seed_from_u64(99);
            (0..16).map(|_| pick_effect(&mut rng, &table, |_| false)).collect()
        };
        let b: Vec<_> = {
            let mut rng = Pcg32::seed_from_u64(99);
            (0..16).map(|_| pick_effect(&mut rng, &table, |_| false)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_pick_effect_huge_weights() {
        let table = [
            CapsuleWeight {
                effect: EffectType::SlowBall,
                weight: u32::MAX,
            },
            CapsuleWeight {
                effect: EffectType::Warp,
                weight: 1,
            },
        ];
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            assert!(pick_effect(&mut rng, &table, |_| false).is_some());
        }
        assert_eq!(
            pick_effect(&mut rng, &table, |e| e == EffectType::SlowBall),
            Some(EffectType::Warp)
        );
        assert_eq!(pick_effect(&mut rng, &table, |_| true), None);
    }

    fn stage() -> Stage {
        let level = crate::level::Level::from_rows("t", &["", "", "rrr"]).unwrap();
        Stage::load(&level, 1, &Tuning::default())
    }

    fn ball_speeds(stage: &Stage) -> Vec<f32> {
        stage
            .registry
            .iter()
            .filter(|b| b.is_ball())
            .map(|b| b.vel.length())
            .collect()
    }

    #[test]
    fn test_multiball_splits_at_spread() {
        let tuning = Tuning::default();
        let mut s = stage();
        let mut events = Vec::new();
        s.launch(&tuning, &mut events);
        let source = s.free_ball().unwrap().vel;
        apply_effect(&mut s, EffectType::MultiBall, &tuning, &mut events);

        assert_eq!(s.ball_count(), tuning.multiball_count);
        for speed in ball_speeds(&s) {
            assert!((speed - source.length()).abs() < 1e-3);
        }
        let mut angles: Vec<f32> = s
            .registry
            .iter()
            .filter(|b| b.is_ball())
            .map(|b| source.perp_dot(b.vel).atan2(source.dot(b.vel)))
            .collect();
        angles.sort_by(|a, b| a.total_cmp(b));
        let spread = tuning.multiball_spread;
        for (got, want) in angles.iter().zip([-spread, 0.0, spread]) {
            assert!((got - want).abs() < 1e-4, "angle {} != {}", got, want);
        }
    }

    #[test]
    fn test_slow_applies_then_restores() {
        let tuning = Tuning::default();
        let mut s = stage();
        let mut events = Vec::new();
        s.launch(&tuning, &mut events);
        let base = s.base_ball_speed;
        apply_effect(&mut s, EffectType::SlowBall, &tuning, &mut events);
        let slow = tuning.clamp_ball_speed(base * tuning.slow_factor);
        assert!(slow < base);
        assert!((ball_speeds(&s)[0] - slow).abs() < 1e-3);

        s.ticks = tuning.slow_ticks - 1;
        expire_effects(&mut s, &tuning, &mut events);
        assert!(events.is_empty());
        s.ticks = tuning.slow_ticks;
        expire_effects(&mut s, &tuning, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::EffectExpired {
                effect: EffectType::SlowBall
            }]
        );
        assert!((ball_speeds(&s)[0] - base).abs() < 1e-3);
    }

    #[test]
    fn test_shrink_expires_on_time() {
        let tuning = Tuning::default();
        let mut s = stage();
        let mut events = Vec::new();
        apply_effect(&mut s, EffectType::ShrinkPaddle, &tuning, &mut events);
        assert_eq!(s.paddle_width(), tuning.clamp_paddle_width(PADDLE_WIDTH * tuning.shrink_factor));

        s.ticks = tuning.shrink_ticks;
        expire_effects(&mut s, &tuning, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::EffectExpired {
                effect: EffectType::ShrinkPaddle
            }]
        );
        assert_eq!(s.paddle_width(), PADDLE_WIDTH);
    }

    #[test]
    fn test_recatch_slow_refreshes_duration() {
        let tuning = Tuning::default();
        let mut s = stage();
        let mut events = Vec::new();
        apply_effect(&mut s, EffectType::SlowBall, &tuning, &mut events);
        s.ticks = 100;
        apply_effect(&mut s, EffectType::SlowBall, &tuning, &mut events);
        assert!(events.is_empty());
        assert_eq!(
            s.effects.get(EffectType::SlowBall).unwrap().expiry,
            Expiry::AtTick(100 + tuning.slow_ticks)
        );
    }

    #[test]
    fn test_laser_replaces_expand() {
        let tuning = Tuning::default();
        let mut s = stage();
        let mut events = Vec::new();
        apply_effect(&mut s, EffectType::ExpandPaddle, &tuning, &mut events);
        assert!(s.paddle_width() > PADDLE_WIDTH);
        apply_effect(&mut s, EffectType::LaserPaddle, &tuning, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::EffectExpired {
                effect: EffectType::ExpandPaddle
            }]
        );
        assert_eq!(s.paddle_width(), PADDLE_WIDTH);
        assert!(s.effects.is_active(EffectType::LaserPaddle));
    }

    #[test]
    fn test_other_catches_end_form_and_grip() {
        let tuning = Tuning::default();
        let mut s = stage();
        let mut events = Vec::new();
        apply_effect(&mut s, EffectType::ExpandPaddle, &tuning, &mut events);
        apply_effect(&mut s, EffectType::StickyPaddle, &tuning, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::EffectExpired {
                effect: EffectType::ExpandPaddle
            }]
        );
        assert_eq!(s.paddle_width(), PADDLE_WIDTH);

        // A ball held by the sticky paddle goes free when the grip ends
        let held = s.ball_ids()[0];
        if let Some(ball) = s.registry.get_mut(held).and_then(|b| b.as_ball_mut()) {
            ball.state = crate::sim::body::BallState::Attached {
                offset: 0.0,
                release_tick: Some(500),
            };
        }
        events.clear();
        apply_effect(&mut s, EffectType::SlowBall, &tuning, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::EffectExpired {
                effect: EffectType::StickyPaddle
            }]
        );
        assert!(s.registry.get(held).unwrap().as_ball().unwrap().is_free());
        assert!(!s.effects.is_active(EffectType::StickyPaddle));
    }

    fn drop_everything(s: &mut Stage, weights: Vec<CapsuleWeight>) {
        s.level_tuning.capsule_drop_rate = 1.0;
        s.level_tuning.capsule_weights = weights;
    }

    #[test]
    fn test_spawn_skips_held_effects() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut s = stage();
        let mut events = Vec::new();
        drop_everything(
            &mut s,
            vec![
                CapsuleWeight {
                    effect: EffectType::ExpandPaddle,
                    weight: 1,
                },
                CapsuleWeight {
                    effect: EffectType::SlowBall,
                    weight: 1,
                },
            ],
        );
        s.effects.activate(EffectType::ExpandPaddle, Expiry::UntilBallLost);
        for _ in 0..10 {
            spawn_capsules(&mut s, &[(Vec2::new(50.0, 50.0), BrickType::Red)], &tuning, &mut rng, &mut events);
            for id in s.registry.ids_where(|b| b.is_capsule()) {
                s.registry.remove(id);
            }
        }
        assert_eq!(events.len(), 10);
        assert!(events.iter().all(|e| matches!(
            e,
            GameEvent::CapsuleSpawned {
                effect: EffectType::SlowBall,
                ..
            }
        )));

        // Warp stays out once the gate is open
        events.clear();
        drop_everything(
            &mut s,
            vec![CapsuleWeight {
                effect: EffectType::Warp,
                weight: 1,
            }],
        );
        s.warp_open = true;
        spawn_capsules(&mut s, &[(Vec2::new(50.0, 50.0), BrickType::Red)], &tuning, &mut rng, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_no_capsules_without_exactly_one_ball() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut s = stage();
        let mut events = Vec::new();
        drop_everything(&mut s, crate::level::default_capsule_weights());
        for id in s.ball_ids() {
            s.registry.remove(id);
        }
        spawn_capsules(&mut s, &[(Vec2::new(50.0, 50.0), BrickType::Red)], &tuning, &mut rng, &mut events);
        assert!(events.is_empty());

        let mut s = stage();
        drop_everything(&mut s, crate::level::default_capsule_weights());
        s.launch(&tuning, &mut events);
        apply_effect(&mut s, EffectType::MultiBall, &tuning, &mut events);
        events.clear();
        spawn_capsules(&mut s, &[(Vec2::new(50.0, 50.0), BrickType::Red)], &tuning, &mut rng, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_capsule_past_paddle_is_missed() {
        let mut s = stage();
        s.move_paddle(-1000.0);
        let floor = s.field.max.y;
        s.registry.add(
            Body::new(
                Vec2::new(300.0, floor + CAPSULE_HEIGHT / 2.0 - 0.1),
                Shape::rect(CAPSULE_WIDTH, CAPSULE_HEIGHT),
                BodyKind::Capsule(Capsule {
                    effect: EffectType::SlowBall,
                }),
            )
            .with_velocity(Vec2::new(0.0, 90.0)),
        );
        let mut events = Vec::new();
        let caught = update_capsules(&mut s, crate::consts::SIM_DT, &mut events);
        assert!(caught.is_empty());
        assert_eq!(events, vec![GameEvent::CapsuleMissed]);
        assert_eq!(s.registry.count_where(|b| b.is_capsule()), 0);
    }
}
