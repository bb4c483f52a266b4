//! Meteor Dash - A side-scrolling arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, spawning, collisions, run state)
//! - `tuning`: Data-driven game balance
//! - `render`: Read-only snapshot consumed by the renderer

pub mod render;
pub mod sim;
pub mod tuning;

pub use render::{Snapshot, Sprite, SpriteKind};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Nominal frame time (60 Hz) used by headless drivers
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest dt a driver should hand to the step (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena defaults (canvas size before the first resize)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Player defaults - the meteor sits near the left edge
    pub const PLAYER_START_X: f32 = 100.0;
    pub const PLAYER_START_Y: f32 = 100.0;
    pub const PLAYER_SIZE: f32 = 60.0;
    /// Vertical speed in pixels per second (0.25 px/ms)
    pub const PLAYER_SPEED: f32 = 250.0;

    /// Lives
    pub const START_LIVES: u8 = 3;
    pub const MAX_LIVES: u8 = 3;

    /// Score at which Earth shows up
    pub const EARTH_SCORE_THRESHOLD: u64 = 20;
    pub const EARTH_SIZE: f32 = 150.0;
    pub const EARTH_SPEED: f32 = 2.0;

    /// Hearts
    pub const HEART_SIZE: f32 = 40.0;
    pub const HEART_SPEED: f32 = 2.0;
    pub const MAX_HEARTS: usize = 2;
}
