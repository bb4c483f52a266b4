//! Axis-aligned bounding box collision
//!
//! Every entity in the arena is a box anchored at its top-left corner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned box (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap: boxes that only share an edge do not collide
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        aabb_overlap(self.pos, self.size, other.pos, other.size)
    }

    /// Trailing (right) edge has crossed the left boundary of the arena
    #[inline]
    pub fn is_past_left_edge(&self) -> bool {
        self.right() < 0.0
    }
}

/// Check overlap between boxes (x1,y1,w1,h1) and (x2,y2,w2,h2)
#[inline]
pub fn aabb_overlap(p1: Vec2, s1: Vec2, p2: Vec2, s2: Vec2) -> bool {
    p1.x < p2.x + s2.x && p1.x + s1.x > p2.x && p1.y < p2.y + s2.y && p1.y + s1.y > p2.y
}
