//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (one `Pcg32` per run)
//! - Collections rebuilt each pass, never spliced while iterating
//! - No rendering or platform dependencies

pub mod collision;
pub mod ending;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Rect, aabb_overlap};
pub use ending::{Ending, EndingTier, Outcome};
pub use state::{Earth, Heart, Obstacle, Player, RunPhase, RunState, VerticalIntent};
pub use tick::{RunEvent, StepInput, step};
