//! Render snapshot
//!
//! A read-only picture of a run, taken once per frame. The canvas painter and
//! any JavaScript overlay consume this; nothing here touches the run itself.

use serde::{Deserialize, Serialize};

use crate::sim::{Ending, Rect, RunPhase, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    Player,
    Obstacle,
    Heart,
    Earth,
}

impl SpriteKind {
    /// Fill colour used when no image is available
    pub fn fallback_color(&self) -> &'static str {
        match self {
            SpriteKind::Player => "#ff8c1a",
            SpriteKind::Obstacle => "#8a8580",
            SpriteKind::Heart => "#e8344e",
            SpriteKind::Earth => "#2f7de1",
        }
    }
}

/// One thing to draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub rect: Rect,
    /// Rotation about the rect centre (radians)
    pub angle: f32,
}

impl Sprite {
    fn upright(kind: SpriteKind, rect: Rect) -> Self {
        Self {
            kind,
            rect,
            angle: 0.0,
        }
    }
}

/// Everything a frame needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub arena_width: f32,
    pub arena_height: f32,
    pub player: Sprite,
    pub obstacles: Vec<Sprite>,
    pub hearts: Vec<Sprite>,
    pub earth: Option<Sprite>,
    pub score: u64,
    pub lives: u8,
    pub phase: RunPhase,
    pub ending: Option<Ending>,
}

impl Snapshot {
    /// Paint order: Earth behind, then hearts, obstacles, player on top
    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.earth
            .iter()
            .chain(self.hearts.iter())
            .chain(self.obstacles.iter())
            .chain(std::iter::once(&self.player))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl RunState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            arena_width: self.arena.x,
            arena_height: self.arena.y,
            player: Sprite::upright(SpriteKind::Player, self.player.rect()),
            obstacles: self
                .obstacles
                .iter()
                .map(|o| Sprite {
                    kind: SpriteKind::Obstacle,
                    rect: o.rect(),
                    angle: o.angle,
                })
                .collect(),
            hearts: self
                .hearts
                .iter()
                .map(|h| Sprite::upright(SpriteKind::Heart, h.rect()))
                .collect(),
            earth: self
                .earth
                .as_ref()
                .map(|e| Sprite::upright(SpriteKind::Earth, e.rect())),
            score: self.score,
            lives: self.lives,
            phase: self.phase,
            ending: self.ending(),
        }
    }
}
