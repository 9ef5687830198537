//! Level descriptors
//!
//! A level is plain decoded data: a sparse brick grid, initial placement and
//! per-level tuning. Decoding the on-disk format is the host's job; this
//! module only defines the in-memory contract, validates it, and offers JSON
//! and character-grid constructors for convenience.

use std::collections::HashSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::EffectType;
use crate::tuning::Tuning;

/// Brick types from the classic palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrickType {
    White,
    Orange,
    Cyan,
    Green,
    Red,
    Blue,
    Pink,
    Magenta,
    /// Takes several hits, worth more on later levels
    Silver,
    /// Indestructible, does not count for level clear
    Gold,
}

impl BrickType {
    /// Parse a layout character
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'w' => Some(BrickType::White),
            'o' => Some(BrickType::Orange),
            'c' => Some(BrickType::Cyan),
            'g' => Some(BrickType::Green),
            'r' => Some(BrickType::Red),
            'b' => Some(BrickType::Blue),
            'p' => Some(BrickType::Pink),
            'm' => Some(BrickType::Magenta),
            'S' => Some(BrickType::Silver),
            'G' => Some(BrickType::Gold),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            BrickType::White => 'w',
            BrickType::Orange => 'o',
            BrickType::Cyan => 'c',
            BrickType::Green => 'g',
            BrickType::Red => 'r',
            BrickType::Blue => 'b',
            BrickType::Pink => 'p',
            BrickType::Magenta => 'm',
            BrickType::Silver => 'S',
            BrickType::Gold => 'G',
        }
    }

    /// Base score for destroying this brick on the given (1-based) level
    pub fn points(self, level_number: u32) -> u64 {
        match self {
            BrickType::Pink => 50,
            BrickType::Orange => 60,
            BrickType::Cyan => 70,
            BrickType::Green => 80,
            BrickType::Red => 90,
            BrickType::Blue => 100,
            BrickType::Magenta => 110,
            BrickType::White => 120,
            BrickType::Silver => 50 * level_number.max(1) as u64,
            BrickType::Gold => 0,
        }
    }

    /// Default hits to destroy (silver toughens every 8 levels)
    pub fn hit_points(self, level_number: u32) -> u32 {
        match self {
            BrickType::Silver => 2 + level_number.saturating_sub(1) / 8,
            _ => 1,
        }
    }

    pub fn destructible(self) -> bool {
        self != BrickType::Gold
    }

    /// Relative chance of dropping a capsule (scaled by the level's drop rate)
    pub fn drop_weight(self) -> f32 {
        match self {
            BrickType::Silver | BrickType::Gold => 0.0,
            _ => 1.0,
        }
    }
}

/// One brick cell in the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickSpec {
    pub row: u32,
    pub col: u32,
    pub brick_type: BrickType,
    /// Overrides the type's default hit points
    #[serde(default)]
    pub hit_points: Option<u32>,
}

/// Initial paddle and ball placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Paddle center x (field coordinates)
    pub paddle_x: f32,
    /// Ball offset from paddle center while attached
    pub ball_offset: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            paddle_x: FIELD_WIDTH / 2.0,
            ball_offset: 0.0,
        }
    }
}

/// The boss (Doh) that replaces the brick wall on the final round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossSpec {
    pub hit_points: u32,
    /// Points for bringing it down
    pub score_value: u64,
}

impl Default for BossSpec {
    fn default() -> Self {
        Self {
            hit_points: 16,
            score_value: 1_000,
        }
    }
}

/// Relative weight of a capsule effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleWeight {
    pub effect: EffectType,
    pub weight: u32,
}

/// Per-level speed and scoring modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    /// Ball speed at launch (pixels/s)
    pub ball_speed: f32,
    /// Multiplier applied every speed-up interval (1.0 disables)
    pub speedup_factor: f32,
    /// Probability scale for capsule drops, 0-1
    pub capsule_drop_rate: f32,
    /// Multiplier on brick score values
    pub score_multiplier: u32,
    /// Weighted effect table for spawned capsules
    pub capsule_weights: Vec<CapsuleWeight>,
    /// Aliens alive at once (0 keeps the inlets shut)
    pub max_aliens: usize,
    /// Longest wait between inlet openings
    pub alien_spawn_delay_ticks: u32,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            ball_speed: 200.0,
            speedup_factor: 1.1,
            capsule_drop_rate: 0.25,
            score_multiplier: 1,
            capsule_weights: default_capsule_weights(),
            max_aliens: 0,
            alien_spawn_delay_ticks: 8 * 120,
        }
    }
}

/// Capsule mix used when a level does not supply its own
pub fn default_capsule_weights() -> Vec<CapsuleWeight> {
    [
        (EffectType::ExpandPaddle, 6),
        (EffectType::ShrinkPaddle, 2),
        (EffectType::MultiBall, 4),
        (EffectType::SlowBall, 6),
        (EffectType::ExtraLife, 1),
        (EffectType::StickyPaddle, 4),
        (EffectType::LaserPaddle, 4),
        (EffectType::Warp, 1),
    ]
    .into_iter()
    .map(|(effect, weight)| CapsuleWeight { effect, weight })
    .collect()
}

fn default_columns() -> u32 {
    GRID_COLUMNS
}

fn default_rows() -> u32 {
    GRID_ROWS
}

fn default_grid_top() -> f32 {
    BRICK_HEIGHT * 2.0
}

fn default_field_height() -> f32 {
    FIELD_HEIGHT
}

/// A decoded level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_rows")]
    pub rows: u32,
    /// Distance from the top wall to the first brick row
    #[serde(default = "default_grid_top")]
    pub grid_top: f32,
    #[serde(default = "default_field_height")]
    pub field_height: f32,
    /// Sparse grid; bodies are created row by row whatever the order here
    pub bricks: Vec<BrickSpec>,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub tuning: LevelTuning,
    #[serde(default)]
    pub boss: Option<BossSpec>,
}

impl Level {
    /// Build a level from a character grid (one string per row, space or
    /// `.` for an empty cell)
    pub fn from_rows(name: &str, rows: &[&str]) -> Result<Self, LevelError> {
        let mut bricks = Vec::new();
        let mut columns = 0;
        for (row, line) in rows.iter().enumerate() {
            columns = columns.max(line.chars().count() as u32);
            for (col, code) in line.chars().enumerate() {
                if code == ' ' || code == '.' {
                    continue;
                }
                let brick_type = BrickType::from_code(code).ok_or(LevelError::UnknownBrickCode {
                    row: row as u32,
                    col: col as u32,
                    code,
                })?;
                bricks.push(BrickSpec {
                    row: row as u32,
                    col: col as u32,
                    brick_type,
                    hit_points: None,
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            columns: columns.max(GRID_COLUMNS),
            rows: (rows.len() as u32).max(1),
            grid_top: default_grid_top(),
            field_height: FIELD_HEIGHT,
            bricks,
            placement: Placement {
                paddle_x: columns.max(GRID_COLUMNS) as f32 * BRICK_WIDTH / 2.0,
                ball_offset: 0.0,
            },
            tuning: LevelTuning::default(),
            boss: None,
        })
    }

    /// Decode a level from JSON and validate it
    pub fn from_json(json: &str, tuning: &Tuning) -> Result<Self, LevelError> {
        let level: Level = serde_json::from_str(json)?;
        level.validate(tuning)?;
        Ok(level)
    }

    pub fn field_width(&self) -> f32 {
        self.columns as f32 * BRICK_WIDTH
    }

    /// Y coordinate of the paddle center
    pub fn paddle_y(&self) -> f32 {
        self.field_height - PADDLE_BASELINE_MARGIN
    }

    /// Number of bricks that must be destroyed to clear the level
    pub fn destructible_count(&self) -> u32 {
        self.bricks
            .iter()
            .filter(|b| b.brick_type.destructible())
            .count() as u32
    }

    /// Bricks plus the boss, if any
    pub fn clear_targets(&self) -> u32 {
        self.destructible_count() + u32::from(self.boss.is_some())
    }

    /// Where the boss sits: centered, two rows below the grid top
    pub fn boss_center(&self) -> Vec2 {
        Vec2::new(
            self.field_width() / 2.0,
            self.grid_top + BRICK_HEIGHT * 2.0 + BOSS_HEIGHT / 2.0,
        )
    }

    /// Reject data the simulation cannot start from
    pub fn validate(&self, tuning: &Tuning) -> Result<(), LevelError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(LevelError::EmptyGrid);
        }

        let mut seen = HashSet::new();
        for brick in &self.bricks {
            if brick.row >= self.rows || brick.col >= self.columns {
                return Err(LevelError::BrickOutOfGrid {
                    row: brick.row,
                    col: brick.col,
                });
            }
            if !seen.insert((brick.row, brick.col)) {
                return Err(LevelError::DuplicateBrick {
                    row: brick.row,
                    col: brick.col,
                });
            }
            if brick.hit_points == Some(0) {
                return Err(LevelError::ZeroHitPoints {
                    row: brick.row,
                    col: brick.col,
                });
            }
        }
        if self.clear_targets() == 0 {
            return Err(LevelError::NoDestructibleBricks);
        }

        check_finite("grid_top", self.grid_top)?;
        check_finite("field_height", self.field_height)?;
        let grid_bottom = self.grid_top + self.rows as f32 * BRICK_HEIGHT;
        let paddle_top = self.paddle_y() - PADDLE_HEIGHT / 2.0;
        if self.grid_top < 0.0 || grid_bottom >= paddle_top - BALL_RADIUS * 2.0 {
            return Err(LevelError::GridOverlapsPaddle);
        }

        let width = self.field_width();
        if let Some(boss) = &self.boss {
            if boss.hit_points == 0 {
                return Err(LevelError::InvalidTuning {
                    field: "boss.hit_points",
                    value: 0.0,
                });
            }
            let bottom = self.boss_center().y + BOSS_HEIGHT / 2.0;
            if width < BOSS_WIDTH || bottom >= paddle_top - BALL_RADIUS * 2.0 {
                return Err(LevelError::PlacementOutsideField("boss"));
            }
        }

        let p = &self.placement;
        if !p.paddle_x.is_finite() || p.paddle_x < 0.0 || p.paddle_x > width {
            return Err(LevelError::PlacementOutsideField("paddle_x"));
        }
        let ball_x = p.paddle_x + p.ball_offset;
        if !ball_x.is_finite()
            || ball_x - BALL_RADIUS < 0.0
            || ball_x + BALL_RADIUS > width
            || p.ball_offset.abs() > PADDLE_WIDTH / 2.0
        {
            return Err(LevelError::PlacementOutsideField("ball_offset"));
        }

        let t = &self.tuning;
        check_finite("ball_speed", t.ball_speed)?;
        if t.ball_speed < tuning.min_ball_speed || t.ball_speed > tuning.max_ball_speed {
            return Err(LevelError::InvalidTuning {
                field: "ball_speed",
                value: t.ball_speed,
            });
        }
        check_finite("speedup_factor", t.speedup_factor)?;
        if t.speedup_factor < 1.0 {
            return Err(LevelError::InvalidTuning {
                field: "speedup_factor",
                value: t.speedup_factor,
            });
        }
        check_finite("capsule_drop_rate", t.capsule_drop_rate)?;
        if !(0.0..=1.0).contains(&t.capsule_drop_rate) {
            return Err(LevelError::InvalidTuning {
                field: "capsule_drop_rate",
                value: t.capsule_drop_rate,
            });
        }
        let total_weight: u64 = t.capsule_weights.iter().map(|w| u64::from(w.weight)).sum();
        if t.capsule_drop_rate > 0.0 && total_weight == 0 {
            return Err(LevelError::NoCapsuleWeights);
        }

        Ok(())
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), LevelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LevelError::InvalidTuning { field, value })
    }
}

/// Built-in stages from the classic layout set
pub fn builtin_levels() -> Vec<Level> {
    const LAYOUTS: &[(&str, &[&str])] = &[
        (
            "Round 1",
            &[
                "", "", "", "",
                "SSSSSSSSSSS",
                "rrrrrrrrrrr",
                "bbbbbbbbbbb",
                "ooooooooooo",
                "ppppppppppp",
                "ggggggggggg",
            ],
        ),
        (
            "Round 2",
            &[
                "", "",
                "p",
                "pc",
                "pcg",
                "pcgb",
                "pcgbr",
                "pcgbrp",
                "pcgbrpc",
                "pcgbrpcg",
                "pcgbrpcgb",
                "pcgbrpcgbr",
                "SSSSSSSSSSp",
            ],
        ),
        (
            "Round 3",
            &[
                "", "", "",
                "ggggggggggg",
                "",
                "wwwGGGGGGGG",
                "",
                "rrrrrrrrrrr",
                "",
                "GGGGGGGGwww",
                "",
                "ppppppppppp",
                "",
                "bbbGGGGGGGG",
                "",
                "bbbbbbbbbbb",
            ],
        ),
        (
            "Round 4",
            &[
                "", "", "", "",
                " Sogp ogbS ",
                " bgor grSb ",
                " gpro bSrg ",
                " orpg Sbgo ",
                " rogb ogpr ",
                " rgrS gorp ",
                " gbSr prog ",
                " oSbg rpgo ",
            ],
        ),
    ];

    let mut levels = Vec::with_capacity(LAYOUTS.len() + 1);
    for (name, rows) in LAYOUTS {
        match Level::from_rows(name, rows) {
            Ok(mut level) => {
                level.tuning.max_aliens = 3;
                levels.push(level);
            }
            Err(e) => log::warn!("Skipping built-in level {}: {}", name, e),
        }
    }

    // Final round: Doh alone, no bricks to drop capsules
    match Level::from_rows("Doh", &[""]) {
        Ok(mut level) => {
            level.boss = Some(BossSpec::default());
            level.tuning.capsule_drop_rate = 0.0;
            levels.push(level);
        }
        Err(e) => log::warn!("Skipping built-in boss round: {}", e),
    }
    levels
}

/// Errors that reject level data at load time
#[derive(Debug)]
pub enum LevelError {
    EmptyGrid,
    NoDestructibleBricks,
    BrickOutOfGrid { row: u32, col: u32 },
    DuplicateBrick { row: u32, col: u32 },
    ZeroHitPoints { row: u32, col: u32 },
    UnknownBrickCode { row: u32, col: u32, code: char },
    GridOverlapsPaddle,
    PlacementOutsideField(&'static str),
    InvalidTuning { field: &'static str, value: f32 },
    NoCapsuleWeights,
    NoLevels,
    Json(serde_json::Error),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::EmptyGrid => write!(f, "level grid has no rows or columns"),
            LevelError::NoDestructibleBricks => write!(f, "level has no destructible bricks"),
            LevelError::BrickOutOfGrid { row, col } => {
                write!(f, "brick at row {row}, col {col} lies outside the grid")
            }
            LevelError::DuplicateBrick { row, col } => {
                write!(f, "two bricks share row {row}, col {col}")
            }
            LevelError::ZeroHitPoints { row, col } => {
                write!(f, "brick at row {row}, col {col} has zero hit points")
            }
            LevelError::UnknownBrickCode { row, col, code } => {
                write!(f, "unknown brick code {code:?} at row {row}, col {col}")
            }
            LevelError::GridOverlapsPaddle => write!(f, "brick grid reaches the paddle zone"),
            LevelError::PlacementOutsideField(what) => {
                write!(f, "{what} places a body outside the play field")
            }
            LevelError::InvalidTuning { field, value } => {
                write!(f, "invalid tuning value {field} = {value}")
            }
            LevelError::NoCapsuleWeights => {
                write!(f, "capsules can drop but every capsule weight is zero")
            }
            LevelError::NoLevels => write!(f, "no levels supplied"),
            LevelError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_brick() -> Level {
        Level::from_rows("test", &["", "", "     r     "]).unwrap()
    }

    #[test]
    fn test_from_rows_palette() {
        let level = Level::from_rows("t", &["Sr", " G"]).unwrap();
        assert_eq!(level.bricks.len(), 3);
        assert_eq!(level.bricks[0].brick_type, BrickType::Silver);
        assert_eq!((level.bricks[2].row, level.bricks[2].col), (1, 1));
        assert_eq!(level.destructible_count(), 2);
    }

    #[test]
    fn test_from_rows_unknown_code() {
        let err = Level::from_rows("t", &["rx"]).unwrap_err();
        assert!(matches!(err, LevelError::UnknownBrickCode { row: 0, col: 1, code: 'x' }));
    }

    #[test]
    fn test_builtin_levels_validate() {
        let tuning = Tuning::default();
        let levels = builtin_levels();
        assert_eq!(levels.len(), 5);
        assert!(levels[4].boss.is_some());
        assert_eq!(levels[4].clear_targets(), 1);
        for level in &levels {
            level.validate(&tuning).unwrap();
        }
    }

    #[test]
    fn test_validate_rejects_gold_only() {
        let level = Level::from_rows("t", &["GGG"]).unwrap();
        assert!(matches!(
            level.validate(&Tuning::default()),
            Err(LevelError::NoDestructibleBricks)
        ));
    }

    #[test]
    fn test_boss_round_validation() {
        let tuning = Tuning::default();
        let mut level = Level::from_rows("doh", &[""]).unwrap();
        assert!(matches!(level.validate(&tuning), Err(LevelError::NoDestructibleBricks)));

        level.boss = Some(BossSpec::default());
        level.validate(&tuning).unwrap();

        level.boss = Some(BossSpec {
            hit_points: 0,
            ..Default::default()
        });
        assert!(matches!(
            level.validate(&tuning),
            Err(LevelError::InvalidTuning { field: "boss.hit_points", .. })
        ));

        level.boss = Some(BossSpec::default());
        level.grid_top = 300.0;
        assert!(matches!(level.validate(&tuning), Err(LevelError::PlacementOutsideField("boss"))));
    }

    #[test]
    fn test_validate_rejects_bad_cells() {
        let tuning = Tuning::default();

        let mut level = one_brick();
        level.bricks.push(level.bricks[0].clone());
        assert!(matches!(level.validate(&tuning), Err(LevelError::DuplicateBrick { .. })));

        let mut level = one_brick();
        level.bricks[0].col = 40;
        assert!(matches!(level.validate(&tuning), Err(LevelError::BrickOutOfGrid { .. })));

        let mut level = one_brick();
        level.bricks[0].hit_points = Some(0);
        assert!(matches!(level.validate(&tuning), Err(LevelError::ZeroHitPoints { .. })));
    }

    #[test]
    fn test_validate_rejects_ball_outside_field() {
        let mut level = one_brick();
        level.placement.paddle_x = 2.0;
        level.placement.ball_offset = -20.0;
        assert!(matches!(
            level.validate(&Tuning::default()),
            Err(LevelError::PlacementOutsideField("ball_offset"))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_tuning() {
        let tuning = Tuning::default();

        let mut level = one_brick();
        level.tuning.capsule_drop_rate = 1.5;
        assert!(matches!(
            level.validate(&tuning),
            Err(LevelError::InvalidTuning { field: "capsule_drop_rate", .. })
        ));

        let mut level = one_brick();
        level.tuning.ball_speed = f32::NAN;
        assert!(level.validate(&tuning).is_err());

        let mut level = one_brick();
        level.tuning.capsule_weights.clear();
        assert!(matches!(level.validate(&tuning), Err(LevelError::NoCapsuleWeights)));
    }

    #[test]
    fn test_validate_huge_capsule_weights() {
        let json = r#"{
            "name": "heavy",
            "bricks": [{ "row": 3, "col": 5, "brick_type": "Red" }],
            "tuning": {
                "capsule_weights": [
                    { "effect": "SlowBall", "weight": 4294967295 },
                    { "effect": "ExtraLife", "weight": 1 }
                ]
            }
        }"#;
        let level = Level::from_json(json, &Tuning::default()).unwrap();
        assert_eq!(level.tuning.capsule_weights[0].weight, u32::MAX);
    }

    #[test]
    fn test_from_json_with_defaults() {
        let json = r#"{
            "name": "json",
            "bricks": [
                { "row": 3, "col": 5, "brick_type": "Red" },
                { "row": 3, "col": 6, "brick_type": "Silver", "hit_points": 4 }
            ],
            "tuning": { "capsule_drop_rate": 1.0 }
        }"#;
        let level = Level::from_json(json, &Tuning::default()).unwrap();
        assert_eq!(level.columns, GRID_COLUMNS);
        assert_eq!(level.bricks[1].hit_points, Some(4));
        assert_eq!(level.tuning.capsule_drop_rate, 1.0);
        assert_eq!(level.tuning.ball_speed, LevelTuning::default().ball_speed);
    }

    #[test]
    fn test_from_json_malformed() {
        let err = Level::from_json("{ not json", &Tuning::default()).unwrap_err();
        assert!(matches!(err, LevelError::Json(_)));
    }

    #[test]
    fn test_silver_scales_with_level() {
        assert_eq!(BrickType::Silver.points(3), 150);
        assert_eq!(BrickType::Silver.hit_points(1), 2);
        assert_eq!(BrickType::Silver.hit_points(9), 3);
        assert!(!BrickType::Gold.destructible());
    }
}
