//! Run state and entity types
//!
//! Everything one run owns lives in [`RunState`]. The driver holds it and hands
//! it to [`step`](super::step) once per frame.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::ending::{Ending, EndingTier, Outcome};
use crate::tuning::{Tuning, TuningError};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Fresh state, waiting for start
    Idle,
    /// Active gameplay
    Running,
    /// Reached Earth
    Won,
    /// Out of lives
    Lost,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Won | RunPhase::Lost)
    }
}

/// Held vertical direction for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalIntent {
    Up,
    Down,
    #[default]
    None,
}

impl VerticalIntent {
    /// Both keys held cancel out
    pub fn from_keys(up: bool, down: bool) -> Self {
        match (up, down) {
            (true, false) => VerticalIntent::Up,
            (false, true) => VerticalIntent::Down,
            _ => VerticalIntent::None,
        }
    }

    /// Sign in screen space (y grows downward)
    pub fn sign(&self) -> f32 {
        match self {
            VerticalIntent::Up => -1.0,
            VerticalIntent::Down => 1.0,
            VerticalIntent::None => 0.0,
        }
    }
}

/// The player's meteor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub intent: VerticalIntent,
}

impl Player {
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    /// Keep the whole box inside [0, arena_height]
    pub fn clamp_to(&mut self, arena_height: f32) {
        let max_y = (arena_height - self.size.y).max(0.0);
        self.pos.y = self.pos.y.clamp(0.0, max_y);
    }
}

/// A space rock drifting left
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    pub size: Vec2,
    /// Pixels per tick, always positive
    pub speed: f32,
    /// Current rotation (radians, visual only)
    pub angle: f32,
    /// Rotation per tick
    pub spin: f32,
}

impl Obstacle {
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn advance(&mut self) {
        self.pos.x -= self.speed;
        self.angle += self.spin;
    }
}

/// A heart pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heart {
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
}

impl Heart {
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn advance(&mut self) {
        self.pos.x -= self.speed;
    }
}

/// The goal marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Earth {
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
}

impl Earth {
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn advance(&mut self) {
        self.pos.x -= self.speed;
    }
}

/// Complete state of one run (deterministic given seed and inputs)
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Balance constants for this run
    pub tuning: Tuning,
    /// Arena size (canvas pixels)
    pub arena: Vec2,
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub hearts: Vec<Heart>,
    /// Present from the tick score reaches the threshold until it drifts off
    pub earth: Option<Earth>,
    /// Earth has been spawned this run (it never comes back)
    pub earth_spawned: bool,
    pub score: u64,
    pub lives: u8,
    pub phase: RunPhase,
    /// Ticks stepped while running
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
}

impl RunState {
    /// Create an idle run with default tuning
    pub fn new(seed: u64) -> Self {
        Self::build(seed, Tuning::default())
    }

    /// Create an idle run with custom tuning (validated first)
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::build(seed, tuning))
    }

    fn build(seed: u64, tuning: Tuning) -> Self {
        let arena = Vec2::new(tuning.arena.width, tuning.arena.height);
        let mut state = Self {
            seed,
            arena,
            player: Self::fresh_player(&tuning),
            obstacles: Vec::new(),
            hearts: Vec::new(),
            earth: None,
            earth_spawned: false,
            score: 0,
            lives: tuning.start_lives,
            phase: RunPhase::Idle,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
        };
        state.player.clamp_to(state.arena.y);
        state
    }

    fn fresh_player(tuning: &Tuning) -> Player {
        let p = &tuning.player;
        Player {
            pos: Vec2::new(p.start_x, p.start_y),
            size: Vec2::new(p.width, p.height),
            intent: VerticalIntent::None,
        }
    }

    /// Back to `Idle` with empty collections and fresh counters.
    ///
    /// The RNG keeps its stream so consecutive runs differ.
    pub fn reset(&mut self) {
        self.player = Self::fresh_player(&self.tuning);
        self.player.clamp_to(self.arena.y);
        self.obstacles.clear();
        self.hearts.clear();
        self.earth = None;
        self.earth_spawned = false;
        self.score = 0;
        self.lives = self.tuning.start_lives;
        self.phase = RunPhase::Idle;
        self.time_ticks = 0;
        log::info!("Run reset");
    }

    /// `Idle -> Running`. Returns false (and changes nothing) from any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase != RunPhase::Idle {
            log::warn!("Ignoring start from {:?}", self.phase);
            return false;
        }
        self.phase = RunPhase::Running;
        log::info!("Run started (seed {})", self.seed);
        true
    }

    /// Reset and start a new run
    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    /// Track a new canvas size; already spawned entities keep their positions
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            log::warn!("Ignoring arena resize to {}x{}", width, height);
            return;
        }
        self.arena = Vec2::new(width, height);
        self.player.clamp_to(height);
    }

    pub fn player_rect(&self) -> Rect {
        self.player.rect()
    }

    /// Drop one life; returns true when that was the last one
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }

    /// Gain one life up to the cap
    pub fn gain_life(&mut self) {
        if self.lives < self.tuning.max_lives {
            self.lives += 1;
        }
    }

    /// Outcome and closing message once the run is over
    pub fn ending(&self) -> Option<Ending> {
        let outcome = match self.phase {
            RunPhase::Won => Outcome::Won,
            RunPhase::Lost => Outcome::Lost,
            _ => return None,
        };
        Some(Ending {
            outcome,
            tier: EndingTier::for_score(self.score, &self.tuning.endings),
            score: self.score,
        })
    }
}
