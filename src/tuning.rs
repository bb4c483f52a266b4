//! Data-driven game balance
//!
//! Every constant the simulation step reads lives here. Defaults reproduce the
//! classic game; overrides are plain JSON and may be partial.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Reasons a tuning record is rejected
#[derive(Debug, Error)]
pub enum TuningError {
    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// A size, speed or arena dimension that must be positive is not
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    /// A bounded range has min above max
    #[error("{field} range is inverted: min {min} > max {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    /// A bound that may be zero but not negative
    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f32 },
    /// A per-tick probability outside [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    BadProbability { field: &'static str, value: f64 },
    /// Lives cap of zero leaves nothing to lose
    #[error("max_lives must be at least 1")]
    ZeroLivesCap,
    /// A run must start with something to lose
    #[error("start_lives must be at least 1")]
    ZeroStartLives,
    /// Spin rate above half a turn per tick
    #[error("obstacles.max_spin must be at most {limit}, got {value}")]
    SpinTooFast { value: f32, limit: f32 },
    /// Run would start above the cap
    #[error("start_lives {start} exceeds max_lives {max}")]
    StartAboveCap { start: u8, max: u8 },
    /// Ending brackets must ascend
    #[error("ending tier brackets must ascend: {low} >= {high}")]
    TierOrder { low: u64, high: u64 },
}

/// Arena size before the driver reports a real canvas size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

/// Player box and movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub start_x: f32,
    pub start_y: f32,
    pub width: f32,
    pub height: f32,
    /// Pixels per second when `time_scaled`, pixels per tick otherwise
    pub speed: f32,
    pub time_scaled: bool,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            start_x: PLAYER_START_X,
            start_y: PLAYER_START_Y,
            width: PLAYER_SIZE,
            height: PLAYER_SIZE,
            speed: PLAYER_SPEED,
            time_scaled: true,
        }
    }
}

/// Obstacle spawn bounds. Sizes are square; speeds are pixels per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPolicy {
    pub min_size: f32,
    pub max_size: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Bernoulli trial per tick
    pub spawn_probability: f64,
    /// Rotation rate is drawn from [-max_spin, max_spin] radians per tick
    pub max_spin: f32,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            min_size: 30.0,
            max_size: 70.0,
            min_speed: 2.0,
            max_speed: 5.0,
            spawn_probability: 0.02,
            max_spin: 0.0,
        }
    }
}

/// Heart pickups: fixed size and speed, bounded count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartPolicy {
    pub size: f32,
    pub speed: f32,
    pub spawn_probability: f64,
    pub max_concurrent: usize,
}

impl Default for HeartPolicy {
    fn default() -> Self {
        Self {
            size: HEART_SIZE,
            speed: HEART_SPEED,
            spawn_probability: 0.005,
            max_concurrent: MAX_HEARTS,
        }
    }
}

/// Earth: appears once at `score_threshold`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalPolicy {
    pub score_threshold: u64,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
}

impl Default for GoalPolicy {
    fn default() -> Self {
        Self {
            score_threshold: EARTH_SCORE_THRESHOLD,
            width: EARTH_SIZE,
            height: EARTH_SIZE,
            speed: EARTH_SPEED,
        }
    }
}

/// Score brackets for the closing message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndingTiers {
    /// Scores below this get the lowest tier
    pub modest_below: u64,
    /// Scores below this (and at or above `modest_below`) get the middle tier
    pub solid_below: u64,
}

impl Default for EndingTiers {
    fn default() -> Self {
        Self {
            modest_below: 20,
            solid_below: 40,
        }
    }
}

/// Complete balance record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub obstacles: SpawnPolicy,
    pub hearts: HeartPolicy,
    pub goal: GoalPolicy,
    pub start_lives: u8,
    pub max_lives: u8,
    pub endings: EndingTiers,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena: ArenaTuning::default(),
            player: PlayerTuning::default(),
            obstacles: SpawnPolicy::default(),
            hearts: HeartPolicy::default(),
            goal: GoalPolicy::default(),
            start_lives: START_LIVES,
            max_lives: MAX_LIVES,
            endings: EndingTiers::default(),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
    if min <= max {
        Ok(())
    } else {
        Err(TuningError::InvertedRange { field, min, max })
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::BadProbability { field, value })
    }
}

impl Tuning {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "meteor_dash_tuning";

    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for exporting a starting point to edit)
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject anything that could spawn a zero or negative sized entity
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("arena.width", self.arena.width)?;
        positive("arena.height", self.arena.height)?;

        positive("player.width", self.player.width)?;
        positive("player.height", self.player.height)?;
        positive("player.speed", self.player.speed)?;

        let o = &self.obstacles;
        positive("obstacles.min_size", o.min_size)?;
        positive("obstacles.max_size", o.max_size)?;
        ordered("obstacles.size", o.min_size, o.max_size)?;
        positive("obstacles.min_speed", o.min_speed)?;
        positive("obstacles.max_speed", o.max_speed)?;
        ordered("obstacles.speed", o.min_speed, o.max_speed)?;
        probability("obstacles.spawn_probability", o.spawn_probability)?;
        if !o.max_spin.is_finite() || o.max_spin < 0.0 {
            return Err(TuningError::Negative {
                field: "obstacles.max_spin",
                value: o.max_spin,
            });
        }
        if o.max_spin > std::f32::consts::PI {
            return Err(TuningError::SpinTooFast {
                value: o.max_spin,
                limit: std::f32::consts::PI,
            });
        }

        positive("hearts.size", self.hearts.size)?;
        positive("hearts.speed", self.hearts.speed)?;
        probability("hearts.spawn_probability", self.hearts.spawn_probability)?;

        positive("goal.width", self.goal.width)?;
        positive("goal.height", self.goal.height)?;
        positive("goal.speed", self.goal.speed)?;

        if self.max_lives == 0 {
            return Err(TuningError::ZeroLivesCap);
        }
        if self.start_lives == 0 {
            return Err(TuningError::ZeroStartLives);
        }
        if self.start_lives > self.max_lives {
            return Err(TuningError::StartAboveCap {
                start: self.start_lives,
                max: self.max_lives,
            });
        }
        if self.endings.modest_below >= self.endings.solid_below {
            return Err(TuningError::TierOrder {
                low: self.endings.modest_below,
                high: self.endings.solid_below,
            });
        }
        Ok(())
    }

    /// Load tuning override from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning override from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
