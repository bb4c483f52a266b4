//! Simulation step
//!
//! Advances a run by one tick. Order within a tick is fixed: player movement,
//! obstacle spawn, obstacle advance/collide/score, hearts, Earth, terminal check.

use super::state::{Earth, RunPhase, RunState, VerticalIntent};

/// Held controls for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct StepInput {
    pub move_up: bool,
    pub move_down: bool,
}

impl StepInput {
    pub fn intent(&self) -> VerticalIntent {
        VerticalIntent::from_keys(self.move_up, self.move_down)
    }
}

/// Things that happened during a tick (for logging, audio, HUD pops)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunEvent {
    ObstacleSpawned,
    ObstacleHit { lives: u8 },
    ObstacleDodged { score: u64 },
    HeartSpawned,
    HeartCollected { lives: u8 },
    HeartMissed,
    EarthAppeared,
    EarthMissed,
    Won { score: u64 },
    Lost { score: u64 },
}

/// Advance the run by one tick.
///
/// `dt` is seconds since the previous tick; it only scales player movement and
/// only when the tuning marks movement as time-scaled. Outside `Running` this
/// does nothing.
pub fn step(state: &mut RunState, input: &StepInput, dt: f32) -> Vec<RunEvent> {
    let mut events = Vec::new();
    if state.phase != RunPhase::Running {
        return events;
    }

    state.time_ticks += 1;

    move_player(state, input, dt);

    if let Some(obstacle) = state.tuning.obstacles.roll(&mut state.rng, state.arena) {
        state.obstacles.push(obstacle);
        events.push(RunEvent::ObstacleSpawned);
    }

    advance_obstacles(state, &mut events);
    if state.phase == RunPhase::Running && state.lives == 0 {
        finish(state, RunPhase::Lost, &mut events);
    }
    // Losing the last life ends the tick on the spot
    if state.phase != RunPhase::Running {
        return events;
    }

    update_hearts(state, &mut events);
    update_earth(state, &mut events);

    if state.phase == RunPhase::Running && state.lives == 0 {
        finish(state, RunPhase::Lost, &mut events);
    }

    events
}

fn move_player(state: &mut RunState, input: &StepInput, dt: f32) {
    let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
    let scale = if state.tuning.player.time_scaled { dt } else { 1.0 };

    let intent = input.intent();
    state.player.intent = intent;
    state.player.pos.y += intent.sign() * state.tuning.player.speed * scale;
    state.player.clamp_to(state.arena.y);
}

/// Move every obstacle, then consume it by collision or by leaving the arena.
/// Survivors go into a fresh collection so nothing is skipped.
fn advance_obstacles(state: &mut RunState, events: &mut Vec<RunEvent>) {
    let player = state.player_rect();
    let mut pending = std::mem::take(&mut state.obstacles).into_iter();
    let mut kept = Vec::with_capacity(pending.len());
    let mut lost = false;

    while let Some(mut obstacle) = pending.next() {
        obstacle.advance();
        let rect = obstacle.rect();

        if rect.overlaps(&player) {
            let last = state.lose_life();
            events.push(RunEvent::ObstacleHit { lives: state.lives });
            log::debug!("Obstacle hit, {} lives left", state.lives);
            if last {
                lost = true;
                break;
            }
        } else if rect.is_past_left_edge() {
            state.score += 1;
            events.push(RunEvent::ObstacleDodged { score: state.score });
        } else {
            kept.push(obstacle);
        }
    }

    // Anything after the fatal hit stays where it was
    kept.extend(pending);
    state.obstacles = kept;

    if lost {
        finish(state, RunPhase::Lost, events);
    }
}

fn update_hearts(state: &mut RunState, events: &mut Vec<RunEvent>) {
    if let Some(heart) = state
        .tuning
        .hearts
        .roll(&mut state.rng, state.arena, state.hearts.len())
    {
        state.hearts.push(heart);
        events.push(RunEvent::HeartSpawned);
    }

    let player = state.player_rect();
    let hearts = std::mem::take(&mut state.hearts);
    let mut kept = Vec::with_capacity(hearts.len());

    for mut heart in hearts {
        heart.advance();
        let rect = heart.rect();

        if rect.overlaps(&player) {
            state.gain_life();
            events.push(RunEvent::HeartCollected { lives: state.lives });
            log::debug!("Heart collected, {} lives", state.lives);
        } else if rect.is_past_left_edge() {
            events.push(RunEvent::HeartMissed);
        } else {
            kept.push(heart);
        }
    }

    state.hearts = kept;
}

fn update_earth(state: &mut RunState, events: &mut Vec<RunEvent>) {
    if !state.earth_spawned && state.score >= state.tuning.goal.score_threshold {
        let earth: Earth = state.tuning.goal.place(&mut state.rng, state.arena);
        state.earth = Some(earth);
        state.earth_spawned = true;
        events.push(RunEvent::EarthAppeared);
        log::info!("Earth in sight at score {}", state.score);
    }

    let player = state.player_rect();
    let mut reached = false;
    if let Some(earth) = state.earth.as_mut() {
        earth.advance();
        let rect = earth.rect();
        if rect.overlaps(&player) {
            reached = true;
        } else if rect.is_past_left_edge() {
            state.earth = None;
            events.push(RunEvent::EarthMissed);
            log::info!("Earth drifted past");
        }
    }

    if reached {
        finish(state, RunPhase::Won, events);
    }
}

fn finish(state: &mut RunState, phase: RunPhase, events: &mut Vec<RunEvent>) {
    state.phase = phase;
    let score = state.score;
    match phase {
        RunPhase::Won => events.push(RunEvent::Won { score }),
        RunPhase::Lost => events.push(RunEvent::Lost { score }),
        _ => return,
    }
    log::info!(
        "Run over: {:?} after {} ticks, score {}",
        phase,
        state.time_ticks,
        score
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::ending::{EndingTier, Outcome};
    use crate::sim::state::{Heart, Obstacle};
    use crate::tuning::Tuning;
    use glam::Vec2;

    /// Running state with no random spawns
    fn quiet_state(tuning: Tuning) -> RunState {
        let mut tuning = tuning;
        tuning.obstacles.spawn_probability = 0.0;
        tuning.hearts.spawn_probability = 0.0;
        let mut state = RunState::with_tuning(12345, tuning).unwrap();
        state.start();
        state
    }

    fn rock(x: f32, y: f32, size: f32, speed: f32) -> Obstacle {
        Obstacle {
            pos: Vec2::new(x, y),
            size: Vec2::splat(size),
            speed,
            angle: 0.0,
            spin: 0.0,
        }
    }

    fn heart(x: f32, y: f32) -> Heart {
        Heart {
            pos: Vec2::new(x, y),
            size: Vec2::splat(HEART_SIZE),
            speed: HEART_SPEED,
        }
    }

    fn idle() -> StepInput {
        StepInput::default()
    }

    #[test]
    fn test_idle_and_terminal_steps_do_nothing() {
        let mut state = RunState::new(1);
        state.obstacles.push(rock(300.0, 100.0, 30.0, 2.0));
        assert!(step(&mut state, &idle(), FRAME_DT).is_empty());
        assert_eq!(state.obstacles[0].pos.x, 300.0);
        assert_eq!(state.time_ticks, 0);

        state.start();
        state.phase = RunPhase::Won;
        assert!(step(&mut state, &idle(), FRAME_DT).is_empty());
        assert_eq!(state.obstacles[0].pos.x, 300.0);
    }

    #[test]
    fn test_player_moves_with_dt() {
        let mut state = quiet_state(Tuning::default());
        let down = StepInput {
            move_down: true,
            ..Default::default()
        };
        step(&mut state, &down, 0.1);
        assert!((state.player.pos.y - (PLAYER_START_Y + PLAYER_SPEED * 0.1)).abs() < 1e-3);
        assert_eq!(state.player.intent, VerticalIntent::Down);

        // Both held cancel
        let both = StepInput {
            move_up: true,
            move_down: true,
        };
        let y = state.player.pos.y;
        step(&mut state, &both, 0.1);
        assert_eq!(state.player.pos.y, y);
    }

    #[test]
    fn test_player_clamped_to_arena() {
        let mut state = quiet_state(Tuning::default());
        let up = StepInput {
            move_up: true,
            ..Default::default()
        };
        step(&mut state, &up, 1000.0);
        assert_eq!(state.player.pos.y, 0.0);

        let down = StepInput {
            move_down: true,
            ..Default::default()
        };
        step(&mut state, &down, 1000.0);
        assert_eq!(state.player.pos.y, ARENA_HEIGHT - PLAYER_SIZE);
    }

    #[test]
    fn test_bad_dt_does_not_move_player() {
        let mut state = quiet_state(Tuning::default());
        let down = StepInput {
            move_down: true,
            ..Default::default()
        };
        for dt in [f32::NAN, f32::INFINITY, -1.0] {
            step(&mut state, &down, dt);
            assert_eq!(state.player.pos.y, PLAYER_START_Y);
        }
    }

    #[test]
    fn test_fixed_step_movement() {
        let mut tuning = Tuning::default();
        tuning.player.time_scaled = false;
        tuning.player.speed = 5.0;
        let mut state = quiet_state(tuning);
        let down = StepInput {
            move_down: true,
            ..Default::default()
        };
        step(&mut state, &down, 123.0);
        assert_eq!(state.player.pos.y, PLAYER_START_Y + 5.0);
    }

    #[test]
    fn test_obstacle_hit_costs_a_life() {
        let mut state = quiet_state(Tuning::default());
        // Lands exactly on the player after one advance
        state
            .obstacles
            .push(rock(PLAYER_START_X + 2.0, PLAYER_START_Y, PLAYER_SIZE, 2.0));

        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::ObstacleHit { lives: 2 }]);
        assert_eq!(state.lives, 2);
        assert_eq!(state.score, 0);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.phase, RunPhase::Running);
    }

    #[test]
    fn test_dodged_obstacle_scores_once() {
        let mut state = quiet_state(Tuning::default());
        // Still partly visible after this tick
        state.obstacles.push(rock(-27.0, 500.0, 30.0, 2.0));
        step(&mut state, &idle(), FRAME_DT);
        assert_eq!(state.score, 0);
        assert_eq!(state.obstacles.len(), 1);

        // Trailing edge crosses zero
        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::ObstacleDodged { score: 1 }]);
        assert_eq!(state.score, 1);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_collision_wins_over_off_screen() {
        let mut tuning = Tuning::default();
        tuning.player.start_x = -50.0;
        let mut state = quiet_state(tuning);
        // After advancing: x in [-35, -5], past the edge and inside the player
        state.obstacles.push(rock(-25.0, PLAYER_START_Y, 30.0, 10.0));

        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::ObstacleHit { lives: 2 }]);
        assert_eq!(state.score, 0);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_many_obstacles_in_one_tick() {
        let mut state = quiet_state(Tuning::default());
        state.obstacles.push(rock(-40.0, 500.0, 30.0, 2.0)); // dodged
        state.obstacles.push(rock(102.0, 110.0, 30.0, 2.0)); // hit
        state.obstacles.push(rock(-45.0, 400.0, 30.0, 3.0)); // dodged
        state.obstacles.push(rock(600.0, 300.0, 30.0, 2.0)); // kept
        state.obstacles.push(rock(120.0, 90.0, 30.0, 4.0)); // hit

        step(&mut state, &idle(), FRAME_DT);
        assert_eq!(state.score, 2);
        assert_eq!(state.lives, 1);
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].pos.x, 598.0);
    }

    #[test]
    fn test_last_life_ends_tick_immediately() {
        let mut state = quiet_state(Tuning::default());
        state.lives = 1;
        state.obstacles.push(rock(102.0, 100.0, 30.0, 2.0));
        state.obstacles.push(rock(102.0, 120.0, 30.0, 2.0));
        state.hearts.push(heart(102.0, 100.0));

        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(
            events,
            vec![RunEvent::ObstacleHit { lives: 0 }, RunEvent::Lost { score: 0 }]
        );
        assert_eq!(state.phase, RunPhase::Lost);
        assert_eq!(state.lives, 0);
        // Second rock was never processed
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].pos.x, 102.0);
        // Hearts were skipped
        assert_eq!(state.hearts.len(), 1);

        // Nothing further happens
        assert!(step(&mut state, &idle(), FRAME_DT).is_empty());
        assert_eq!(state.phase, RunPhase::Lost);

        let ending = state.ending().unwrap();
        assert_eq!(ending.outcome, Outcome::Lost);
        assert_eq!(ending.tier, EndingTier::Modest);
    }

    #[test]
    fn test_zero_lives_loses_before_hearts() {
        let mut state = quiet_state(Tuning::default());
        state.lives = 0;
        state.hearts.push(heart(PLAYER_START_X + HEART_SPEED, PLAYER_START_Y));

        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::Lost { score: 0 }]);
        assert_eq!(state.phase, RunPhase::Lost);
        assert_eq!(state.lives, 0);
        assert_eq!(state.hearts.len(), 1);
    }

    #[test]
    fn test_heart_at_cap_is_consumed() {
        let mut state = quiet_state(Tuning::default());
        state.hearts.push(heart(PLAYER_START_X + HEART_SPEED, PLAYER_START_Y));

        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::HeartCollected { lives: MAX_LIVES }]);
        assert_eq!(state.lives, MAX_LIVES);
        assert!(state.hearts.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_heart_restores_life() {
        let mut state = quiet_state(Tuning::default());
        state.lives = 1;
        state.hearts.push(heart(130.0, 120.0));
        step(&mut state, &idle(), FRAME_DT);
        assert_eq!(state.lives, 2);
    }

    #[test]
    fn test_missed_heart_does_not_score() {
        let mut state = quiet_state(Tuning::default());
        state.hearts.push(heart(-39.0, 500.0));
        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::HeartMissed]);
        assert!(state.hearts.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_heart_spawns_respect_cap() {
        let mut tuning = Tuning::default();
        tuning.obstacles.spawn_probability = 0.0;
        tuning.hearts.spawn_probability = 1.0;
        let mut state = RunState::with_tuning(3, tuning).unwrap();
        state.start();
        for _ in 0..10 {
            step(&mut state, &idle(), FRAME_DT);
            assert!(state.hearts.len() <= MAX_HEARTS);
        }
    }

    #[test]
    fn test_earth_spawns_once_at_threshold() {
        let mut state = quiet_state(Tuning::default());
        state.score = EARTH_SCORE_THRESHOLD - 1;

        // Not yet
        step(&mut state, &idle(), FRAME_DT);
        assert!(state.earth.is_none());
        assert!(!state.earth_spawned);

        // This dodge reaches the threshold
        state.obstacles.push(rock(-29.0, 500.0, 30.0, 2.0));
        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(state.score, EARTH_SCORE_THRESHOLD);
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == RunEvent::EarthAppeared)
                .count(),
            1
        );
        let earth = state.earth.as_ref().unwrap();
        // Anchored at the right edge, then moved once
        assert_eq!(earth.pos.x, ARENA_WIDTH - EARTH_SIZE - EARTH_SPEED);

        // More dodges never bring a second one
        for _ in 0..5 {
            state.obstacles.push(rock(-29.0, 500.0, 30.0, 2.0));
            let events = step(&mut state, &idle(), FRAME_DT);
            assert!(!events.contains(&RunEvent::EarthAppeared));
        }
        assert_eq!(
            state.earth.as_ref().unwrap().pos.x,
            ARENA_WIDTH - EARTH_SIZE - 6.0 * EARTH_SPEED
        );
    }

    #[test]
    fn test_reaching_earth_wins() {
        let mut state = quiet_state(Tuning::default());
        state.score = 42;
        state.earth_spawned = true;
        state.earth = Some(Earth {
            pos: Vec2::new(PLAYER_START_X + 50.0, PLAYER_START_Y),
            size: Vec2::splat(EARTH_SIZE),
            speed: EARTH_SPEED,
        });

        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::Won { score: 42 }]);
        assert_eq!(state.phase, RunPhase::Won);

        let ending = state.ending().unwrap();
        assert_eq!(ending.outcome, Outcome::Won);
        assert_eq!(ending.tier, EndingTier::Stellar);
        assert_eq!(ending.message(), "Amazing! You saved the Earth with style!");
    }

    #[test]
    fn test_missed_earth_never_returns() {
        let mut state = quiet_state(Tuning::default());
        state.score = 30;
        state.earth_spawned = true;
        state.earth = Some(Earth {
            pos: Vec2::new(-EARTH_SIZE + 1.0, 400.0),
            size: Vec2::splat(EARTH_SIZE),
            speed: EARTH_SPEED,
        });

        let events = step(&mut state, &idle(), FRAME_DT);
        assert_eq!(events, vec![RunEvent::EarthMissed]);
        assert!(state.earth.is_none());

        step(&mut state, &idle(), FRAME_DT);
        assert!(state.earth.is_none());
        assert_eq!(state.phase, RunPhase::Running);
    }

    #[test]
    fn test_determinism() {
        // Two runs with the same seed and inputs must match exactly
        let mut tuning = Tuning::default();
        tuning.obstacles.spawn_probability = 0.2;
        tuning.hearts.spawn_probability = 0.05;
        let mut state1 = RunState::with_tuning(99999, tuning.clone()).unwrap();
        let mut state2 = RunState::with_tuning(99999, tuning).unwrap();
        state1.start();
        state2.start();

        for i in 0..2000 {
            let input = StepInput {
                move_up: i % 90 < 40,
                move_down: i % 90 >= 50,
            };
            let e1 = step(&mut state1, &input, FRAME_DT);
            let e2 = step(&mut state2, &input, FRAME_DT);
            assert_eq!(e1, e2);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.lives, state2.lives);
        assert_eq!(state1.phase, state2.phase);
        assert_eq!(state1.obstacles.len(), state2.obstacles.len());
        for (a, b) in state1.obstacles.iter().zip(&state2.obstacles) {
            assert_eq!(a.pos, b.pos);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn inputs() -> impl Strategy<Value = Vec<(bool, bool, f32)>> {
            prop::collection::vec((any::<bool>(), any::<bool>(), -0.05f32..0.5), 1..400)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn random_runs_stay_consistent(seed in any::<u64>(), inputs in inputs()) {
                let mut tuning = Tuning::default();
                tuning.obstacles.spawn_probability = 0.15;
                tuning.hearts.spawn_probability = 0.05;
                tuning.goal.score_threshold = 5;
                let cap = tuning.max_lives;
                let mut state = RunState::with_tuning(seed, tuning).unwrap();
                state.start();

                for (up, down, dt) in inputs {
                    let before_score = state.score;
                    let before_lives = state.lives;
                    let before_phase = state.phase;

                    let events = step(&mut state, &StepInput { move_up: up, move_down: down }, dt);

                    // Player stays inside the arena
                    prop_assert!(state.player.pos.y >= 0.0);
                    prop_assert!(state.player.pos.y <= state.arena.y - state.player.size.y);

                    // Lives bounded; only hearts raise them
                    prop_assert!(state.lives <= cap);
                    let collected = events
                        .iter()
                        .filter(|e| matches!(e, RunEvent::HeartCollected { .. }))
                        .count();
                    if state.lives > before_lives {
                        prop_assert!(collected > 0);
                    }

                    // Score moves by exactly the number of dodges
                    let dodged = events
                        .iter()
                        .filter(|e| matches!(e, RunEvent::ObstacleDodged { .. }))
                        .count() as u64;
                    prop_assert_eq!(state.score, before_score + dodged);

                    // Earth appears at most once per run
                    let appeared = events.iter().filter(|e| **e == RunEvent::EarthAppeared).count();
                    prop_assert!(appeared <= 1);

                    // Terminal phases are sticky and entered once
                    let terminal_events = events
                        .iter()
                        .filter(|e| matches!(e, RunEvent::Won { .. } | RunEvent::Lost { .. }))
                        .count();
                    if before_phase.is_terminal() {
                        prop_assert!(events.is_empty());
                        prop_assert_eq!(state.phase, before_phase);
                    } else {
                        prop_assert!(terminal_events <= 1);
                    }
                    if state.lives == 0 {
                        prop_assert_eq!(state.phase, RunPhase::Lost);
                    }
                }
            }
        }
    }
}
