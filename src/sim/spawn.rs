//! Spawn policies
//!
//! Sampling takes any `rand::Rng` so tests can drive it with a seeded source.
//! Entities always enter at the right edge of the arena.

use glam::Vec2;
use rand::Rng;

use super::state::{Earth, Heart, Obstacle};
use crate::tuning::{GoalPolicy, HeartPolicy, SpawnPolicy};

/// Uniform y that keeps a box of `height` inside the arena
fn entry_y<R: Rng>(rng: &mut R, arena: Vec2, height: f32) -> f32 {
    let max_y = (arena.y - height).max(0.0);
    rng.random_range(0.0..=max_y)
}

impl SpawnPolicy {
    /// One Bernoulli trial; `Some` obstacle on success
    pub fn roll<R: Rng>(&self, rng: &mut R, arena: Vec2) -> Option<Obstacle> {
        if rng.random_bool(self.spawn_probability) {
            Some(self.sample(rng, arena))
        } else {
            None
        }
    }

    /// Build an obstacle at the right edge with sizes and speed drawn from the bounds
    pub fn sample<R: Rng>(&self, rng: &mut R, arena: Vec2) -> Obstacle {
        let size = rng.random_range(self.min_size..=self.max_size);
        let speed = rng.random_range(self.min_speed..=self.max_speed);
        let spin = if self.max_spin > 0.0 {
            rng.random_range(-self.max_spin..=self.max_spin)
        } else {
            0.0
        };
        let y = entry_y(rng, arena, size);
        Obstacle {
            pos: Vec2::new(arena.x, y),
            size: Vec2::splat(size),
            speed,
            angle: 0.0,
            spin,
        }
    }
}

impl HeartPolicy {
    /// Trial only runs while below the concurrent cap
    pub fn roll<R: Rng>(&self, rng: &mut R, arena: Vec2, live: usize) -> Option<Heart> {
        if live >= self.max_concurrent || !rng.random_bool(self.spawn_probability) {
            return None;
        }
        let y = entry_y(rng, arena, self.size);
        Some(Heart {
            pos: Vec2::new(arena.x, y),
            size: Vec2::splat(self.size),
            speed: self.speed,
        })
    }
}

impl GoalPolicy {
    /// Earth is anchored flush with the right edge
    pub fn place<R: Rng>(&self, rng: &mut R, arena: Vec2) -> Earth {
        let y = entry_y(rng, arena, self.height);
        Earth {
            pos: Vec2::new(arena.x - self.width, y),
            size: Vec2::new(self.width, self.height),
            speed: self.speed,
        }
    }
}
