//! Geometry primitives for collision detection
//!
//! Screen convention: +x right, +y down. The field's top wall sits at y = 0 and
//! balls are lost past the bottom.
//!
//! Everything here is pure. Degenerate inputs (zero-length deltas, empty
//! rectangles) produce "no hit" rather than dividing by zero.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        let half = half.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Strict overlap: rectangles that only share an edge do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Inclusive point containment
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grow the rectangle by `by` on every side
    pub fn expand(&self, by: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(by),
            max: self.max + Vec2::splat(by),
        }
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Closest point inside the rectangle
    #[inline]
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// Collision shape, centered on the body position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect { half: Vec2 },
    Circle { radius: f32 },
}

impl Shape {
    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Rect {
            half: Vec2::new(width.abs() * 0.5, height.abs() * 0.5),
        }
    }

    pub fn circle(radius: f32) -> Self {
        Shape::Circle {
            radius: radius.abs(),
        }
    }

    /// Bounding box at the given position
    pub fn aabb(&self, pos: Vec2) -> Aabb {
        match *self {
            Shape::Rect { half } => Aabb::from_center(pos, half),
            Shape::Circle { radius } => Aabb::from_center(pos, Vec2::splat(radius)),
        }
    }

    pub fn width(&self) -> f32 {
        match *self {
            Shape::Rect { half } => half.x * 2.0,
            Shape::Circle { radius } => radius * 2.0,
        }
    }
}

/// Time-of-impact result for a swept test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptHit {
    /// Fraction of the swept delta at first contact, in [0, 1]
    pub toi: f32,
    /// Surface normal at contact, pointing away from the struck rectangle
    pub normal: Vec2,
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

#[inline]
pub fn rects_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Circle vs rectangle overlap (touching does not count)
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Aabb) -> bool {
    let closest = rect.clamp_point(center);
    (center - closest).length_squared() < radius * radius
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Normalize, falling back to `fallback` for zero-length or non-finite input
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    if !v.is_finite() || v.length_squared() < EPSILON * EPSILON {
        log::trace!("degenerate direction {:?}, using {:?}", v, fallback);
        return fallback;
    }
    v.normalize()
}

/// Pick the axis-aligned normal for an offset (ties go to the vertical axis)
fn dominant_axis_normal(offset: Vec2) -> Vec2 {
    if offset.x.abs() > offset.y.abs() {
        Vec2::new(offset.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, if offset.y < 0.0 { -1.0 } else { 1.0 })
    }
}

/// Entry test of the segment `start → start + delta` against a rectangle
/// (slab method).
///
/// Only entries are reported: a segment starting inside the rectangle yields
/// `None`. When both axes enter at the same instant (exact corner), the
/// vertical face wins.
pub fn segment_rect(start: Vec2, delta: Vec2, rect: &Aabb) -> Option<SweptHit> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec2::ZERO;

    let axes = [
        (start.x, delta.x, rect.min.x, rect.max.x, Vec2::X),
        (start.y, delta.y, rect.min.y, rect.max.y, Vec2::Y),
    ];

    for (i, &(s, d, lo, hi, unit)) in axes.iter().enumerate() {
        if d.abs() < EPSILON {
            if s < lo || s > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t_near, t_far, face_normal) = if d > 0.0 {
            ((lo - s) * inv, (hi - s) * inv, -unit)
        } else {
            ((hi - s) * inv, (lo - s) * inv, unit)
        };
        let vertical = i == 1;
        if t_near > t_enter || (vertical && t_near == t_enter) {
            t_enter = t_near;
            normal = face_normal;
        }
        t_exit = t_exit.min(t_far);
    }

    if !t_enter.is_finite() || t_enter > t_exit || t_enter < 0.0 || t_enter > 1.0 {
        return None;
    }
    Some(SweptHit {
        toi: t_enter,
        normal,
    })
}

/// Earliest contact of a moving circle with a static rectangle.
///
/// The rectangle is grown by the radius (Minkowski sum) and the circle's
/// center is traced as a segment. Entries through the grown corners are
/// re-checked against the rounded corner so near misses stay misses. Normals
/// are always axis-aligned.
///
/// A circle that already overlaps the rectangle reports an immediate hit
/// (toi 0) along the least-penetration axis, but only when it is moving into
/// that face.
pub fn sweep_circle_rect(center: Vec2, radius: f32, delta: Vec2, rect: &Aabb) -> Option<SweptHit> {
    if circle_rect_overlap(center, radius, rect) {
        let normal = overlap_normal(center, rect);
        return (delta.dot(normal) < 0.0).then_some(SweptHit { toi: 0.0, normal });
    }

    let grown = rect.expand(radius);
    if grown.contains(center) {
        // Clear of the rectangle but inside the grown box: only the rounded
        // corner nearest the start can be struck
        return corner_hit(center, radius, delta, rect.clamp_point(center));
    }

    let hit = segment_rect(center, delta, &grown)?;
    let contact = center + delta * hit.toi;

    let outside_x = contact.x < rect.min.x || contact.x > rect.max.x;
    let outside_y = contact.y < rect.min.y || contact.y > rect.max.y;
    if !(outside_x && outside_y) {
        return Some(hit);
    }
    corner_hit(center, radius, delta, rect.clamp_point(contact))
}

/// Solve |center + delta·t - corner| = radius for the first t in [0, 1]
fn corner_hit(center: Vec2, radius: f32, delta: Vec2, corner: Vec2) -> Option<SweptHit> {
    let m = center - corner;
    let a = delta.length_squared();
    if a < EPSILON * EPSILON {
        return None;
    }
    let b = m.dot(delta);
    let c = m.length_squared() - radius * radius;
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / a;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let offset = center + delta * t - corner;
    if delta.dot(offset) >= 0.0 {
        return None;
    }
    corner_normal(offset, delta).map(|normal| SweptHit { toi: t, normal })
}

/// Axis normal for a rounded-corner contact. The dominant axis wins unless
/// the motion runs parallel to it, then the other face takes the hit.
fn corner_normal(offset: Vec2, delta: Vec2) -> Option<Vec2> {
    let primary = dominant_axis_normal(offset);
    if delta.dot(primary) < 0.0 {
        return Some(primary);
    }
    let secondary = if primary.x == 0.0 {
        Vec2::new(offset.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, offset.y.signum())
    };
    (delta.dot(secondary) < 0.0).then_some(secondary)
}

/// Push-out normal for a circle center overlapping a rectangle
fn overlap_normal(center: Vec2, rect: &Aabb) -> Vec2 {
    if rect.contains(center) {
        let to_min = center - rect.min;
        let to_max = rect.max - center;
        let candidates = [
            (to_min.y, Vec2::NEG_Y),
            (to_max.y, Vec2::Y),
            (to_min.x, Vec2::NEG_X),
            (to_max.x, Vec2::X),
        ];
        let mut best = candidates[0];
        for &c in &candidates[1..] {
            if c.0 < best.0 {
                best = c;
            }
        }
        return best.1;
    }
    dominant_axis_normal(center - rect.clamp_point(center))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0))
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_overlap_touching_edges_is_not_overlap() {
        let a = unit_box();
        let b = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        assert!(!rects_overlap(&a, &b));
        let c = Aabb::new(Vec2::new(9.0, 9.0), Vec2::new(20.0, 20.0));
        assert!(rects_overlap(&a, &c));
    }

    #[test]
    fn test_circle_rect_overlap() {
        let r = unit_box();
        assert!(circle_rect_overlap(Vec2::new(12.0, 5.0), 3.0, &r));
        assert!(!circle_rect_overlap(Vec2::new(14.0, 5.0), 3.0, &r));
        // Corner distance is diagonal
        assert!(!circle_rect_overlap(Vec2::new(12.5, 12.5), 3.0, &r));
    }

    #[test]
    fn test_segment_rect_hits_top_face() {
        let hit = segment_rect(Vec2::new(5.0, -10.0), Vec2::new(0.0, 20.0), &unit_box()).unwrap();
        assert!((hit.toi - 0.5).abs() < 1e-6);
        assert_eq!(hit.normal, Vec2::NEG_Y);
    }

    #[test]
    fn test_segment_rect_exact_corner_prefers_vertical() {
        let hit = segment_rect(Vec2::new(-5.0, -5.0), Vec2::new(10.0, 10.0), &unit_box()).unwrap();
        assert!((hit.toi - 0.5).abs() < 1e-6);
        assert_eq!(hit.normal, Vec2::NEG_Y);
    }

    #[test]
    fn test_segment_rect_miss_and_short() {
        assert!(segment_rect(Vec2::new(20.0, -10.0), Vec2::new(0.0, 20.0), &unit_box()).is_none());
        // Stops before reaching the box
        assert!(segment_rect(Vec2::new(5.0, -10.0), Vec2::new(0.0, 5.0), &unit_box()).is_none());
        // Zero-length delta never divides
        assert!(segment_rect(Vec2::new(5.0, -10.0), Vec2::ZERO, &unit_box()).is_none());
    }

    #[test]
    fn test_sweep_circle_side_hit() {
        let hit = sweep_circle_rect(Vec2::new(-10.0, 5.0), 2.0, Vec2::new(20.0, 0.0), &unit_box())
            .unwrap();
        // Contact when center reaches x = -2
        assert!((hit.toi - 0.4).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::NEG_X);
    }

    #[test]
    fn test_sweep_circle_misses_rounded_corner() {
        // Diagonal path clips the grown box corner but stays ~2.26 from the real corner
        let start = Vec2::new(-4.2, 1.0);
        let hit = sweep_circle_rect(start, 2.0, Vec2::new(4.0, -4.0), &unit_box());
        assert!(hit.is_none());
        // Same direction, closer in: clips the rounded corner
        let start = Vec2::new(-3.0, 1.0);
        assert!(sweep_circle_rect(start, 2.0, Vec2::new(4.0, -4.0), &unit_box()).is_some());
    }

    #[test]
    fn test_sweep_circle_starting_inside_grown_corner() {
        // Clear of the brick but already inside the radius-grown box
        let rect = Aabb::new(Vec2::ZERO, Vec2::new(32.0, 16.0));
        let start = Vec2::new(-4.5, -4.5);
        assert!(!circle_rect_overlap(start, 5.0, &rect));
        let delta = Vec2::new(3.0, 3.0);
        let hit = sweep_circle_rect(start, 5.0, delta, &rect).unwrap();
        assert!((hit.toi - 0.3215).abs() < 1e-3);
        // Exact diagonal: vertical face wins
        assert_eq!(hit.normal, Vec2::NEG_Y);
        assert!(!circle_rect_overlap(start + delta * (hit.toi - 1e-3), 5.0, &rect));

        // Moving away from the corner never hits
        assert!(sweep_circle_rect(start, 5.0, -delta, &rect).is_none());
    }

    #[test]
    fn test_sweep_circle_grazing_along_face_hits_corner() {
        // Center 4 above the top face, moving sideways into the left corner
        let rect = Aabb::new(Vec2::ZERO, Vec2::new(32.0, 16.0));
        let hit = sweep_circle_rect(Vec2::new(-4.0, -4.0), 5.0, Vec2::new(10.0, 0.0), &rect).unwrap();
        assert!((hit.toi - 0.1).abs() < 1e-4);
        assert_eq!(hit.normal, Vec2::NEG_X);
    }

    #[test]
    fn test_sweep_circle_already_overlapping() {
        // Ball sunk into the top face, moving down: immediate hit
        let hit = sweep_circle_rect(Vec2::new(5.0, -1.0), 2.0, Vec2::new(0.0, 5.0), &unit_box())
            .unwrap();
        assert_eq!(hit.toi, 0.0);
        assert_eq!(hit.normal, Vec2::NEG_Y);
        // Same spot, moving away: no hit
        assert!(sweep_circle_rect(Vec2::new(5.0, -1.0), 2.0, Vec2::new(0.0, -5.0), &unit_box()).is_none());
    }

    #[test]
    fn test_normalize_or_fallback() {
        assert_eq!(normalize_or(Vec2::ZERO, Vec2::NEG_Y), Vec2::NEG_Y);
        assert_eq!(normalize_or(Vec2::new(f32::NAN, 1.0), Vec2::X), Vec2::X);
        assert!((normalize_or(Vec2::new(3.0, 4.0), Vec2::X).length() - 1.0).abs() < 1e-6);
    }
}
