//! Meteor Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent};

    use meteor_dash::consts::MAX_FRAME_DT;
    use meteor_dash::sim::{RunPhase, RunState, StepInput, step};
    use meteor_dash::{Snapshot, Tuning};

    /// Game instance holding all state
    struct Game {
        state: RunState,
        ctx: CanvasRenderingContext2d,
        canvas: HtmlCanvasElement,
        last_time: f64,
        input: StepInput,
        /// Step calls are withheld while set
        paused: bool,
        /// Game-over modal already filled in for this run
        ending_shown: bool,
    }

    impl Game {
        fn new(state: RunState, canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
            Self {
                state,
                ctx,
                canvas,
                last_time: 0.0,
                input: StepInput::default(),
                paused: false,
                ending_shown: false,
            }
        }

        /// Match the canvas to the window and tell the simulation
        fn fit_to_window(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let w = window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(800.0);
            let h = window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(600.0);
            self.canvas.set_width(w as u32);
            self.canvas.set_height(h as u32);
            self.state.resize(w as f32, h as f32);
        }

        /// One simulation step per animation frame
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            self.last_time = time;

            if self.paused {
                return;
            }

            let dt = dt.min(MAX_FRAME_DT);
            for event in step(&mut self.state, &self.input, dt) {
                log::debug!("{:?}", event);
            }
        }

        /// Paint the snapshot as flat shapes
        fn render(&self, snapshot: &Snapshot) {
            let ctx = &self.ctx;
            ctx.clear_rect(
                0.0,
                0.0,
                snapshot.arena_width as f64,
                snapshot.arena_height as f64,
            );
            ctx.set_fill_style_str("#05060f");
            ctx.fill_rect(
                0.0,
                0.0,
                snapshot.arena_width as f64,
                snapshot.arena_height as f64,
            );

            for sprite in snapshot.sprites() {
                let center = sprite.rect.center();
                let size = sprite.rect.size;
                ctx.save();
                let placed = ctx
                    .translate(center.x as f64, center.y as f64)
                    .and_then(|_| ctx.rotate(sprite.angle as f64));
                if let Err(e) = placed {
                    log::warn!("Canvas transform failed: {:?}", e);
                }
                ctx.set_fill_style_str(sprite.kind.fallback_color());
                ctx.fill_rect(
                    -(size.x as f64) / 2.0,
                    -(size.y as f64) / 2.0,
                    size.x as f64,
                    size.y as f64,
                );
                ctx.restore();
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self, snapshot: &Snapshot) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&snapshot.score.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-lives .hud-value").ok().flatten() {
                el.set_text_content(Some(&snapshot.lives.to_string()));
            }

            // Game over modal, filled once per run
            match snapshot.ending {
                Some(ending) if !self.ending_shown => {
                    if let Some(el) = document.get_element_by_id("final-score") {
                        el.set_text_content(Some(&format!("Final Score: {}", ending.score)));
                    }
                    if let Some(el) = document.get_element_by_id("ending-message") {
                        el.set_text_content(Some(ending.message()));
                    }
                    if let Some(el) = document.get_element_by_id("game-over-modal") {
                        let _ = el.set_attribute("style", "display: flex");
                    }
                    self.ending_shown = true;
                    log::info!("{:?}: {}", ending.outcome, ending.message());
                }
                None if self.ending_shown => {
                    if let Some(el) = document.get_element_by_id("game-over-modal") {
                        let _ = el.set_attribute("style", "display: none");
                    }
                    self.ending_shown = false;
                }
                _ => {}
            }
        }

        /// Reset run state for a new run
        fn restart(&mut self) {
            self.state.restart();
            self.input = StepInput::default();
            self.paused = false;
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Meteor Dash starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let seed = js_sys::Date::now() as u64;
        let state = match RunState::with_tuning(seed, Tuning::load()) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Rejected tuning ({}), using defaults", e);
                RunState::new(seed)
            }
        };
        let game = Rc::new(RefCell::new(Game::new(state, canvas, ctx)));
        game.borrow_mut().fit_to_window();

        log::info!("Game initialized with seed: {}", seed);

        setup_resize(game.clone());
        setup_input_handlers(game.clone());
        setup_buttons(game.clone());
        setup_auto_pause(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Meteor Dash running!");
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().fit_to_window();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Key down - hold direction
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowUp" => g.input.move_up = true,
                    "ArrowDown" => g.input.move_down = true,
                    _ => return,
                }
                event.prevent_default();
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up - release direction
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowUp" => g.input.move_up = false,
                    "ArrowDown" => g.input.move_down = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Start button
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if g.state.phase == RunPhase::Idle {
                    g.state.start();
                } else {
                    g.restart();
                }
                let document = web_sys::window().unwrap().document().unwrap();
                if let Some(el) = document.query_selector(".start-screen").ok().flatten() {
                    let _ = el.set_attribute("style", "display: none");
                }
                if let Some(el) = document.get_element_by_id("gameCanvas") {
                    let _ = el.set_attribute("style", "display: block");
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Restart button (game over modal)
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().restart();
                log::info!("Game restarted");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
                let mut g = game.borrow_mut();
                if hidden && g.state.phase == RunPhase::Running {
                    g.paused = true;
                    log::info!("Auto-paused (tab hidden)");
                } else if !hidden && g.paused {
                    g.paused = false;
                    // Don't count the hidden time as one giant frame
                    g.last_time = 0.0;
                    log::info!("Resumed");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.state.phase == RunPhase::Running {
                    g.paused = true;
                    // Keys released while unfocused never reach us
                    g.input = StepInput::default();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window focus
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.paused {
                    g.paused = false;
                    g.last_time = 0.0;
                    log::info!("Resumed");
                }
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            let snapshot = g.state.snapshot();
            g.render(&snapshot);
            g.update_hud(&snapshot);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Meteor Dash (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5eed);
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Autopilot run for the native build
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use meteor_dash::consts::FRAME_DT;
    use meteor_dash::sim::{RunEvent, RunState, StepInput, step};

    /// Ticks before giving up on a run that neither wins nor loses
    const MAX_TICKS: u64 = 60 * 60 * 10;

    /// Steer away from the nearest rock ahead in the player's rows, or
    /// toward Earth once it shows up
    fn autopilot(state: &RunState) -> StepInput {
        let player = state.player_rect();
        let mid = player.center().y;

        if let Some(earth) = &state.earth {
            let target = earth.rect().center().y;
            return StepInput {
                move_up: target < mid - 5.0,
                move_down: target > mid + 5.0,
            };
        }

        let threat = state
            .obstacles
            .iter()
            .map(|o| o.rect())
            .filter(|r| r.right() > player.left() && r.left() < player.right() + 150.0)
            .filter(|r| r.bottom() > player.top() - 10.0 && r.top() < player.bottom() + 10.0)
            .min_by(|a, b| {
                a.left()
                    .partial_cmp(&b.left())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        match threat {
            Some(rock) => {
                let go_up = rock.center().y > mid && player.top() > rock.size.y;
                let blocked_below = player.bottom() + rock.size.y > state.arena.y;
                StepInput {
                    move_up: go_up || blocked_below,
                    move_down: !(go_up || blocked_below),
                }
            }
            None => StepInput::default(),
        }
    }

    pub fn run(seed: u64) {
        let mut state = RunState::new(seed);
        state.start();

        let mut hits = 0u32;
        let mut hearts = 0u32;
        while !state.phase.is_terminal() && state.time_ticks < MAX_TICKS {
            let input = autopilot(&state);
            for event in step(&mut state, &input, FRAME_DT) {
                match event {
                    RunEvent::ObstacleHit { lives } => {
                        hits += 1;
                        log::info!("Hit at tick {}, {} lives left", state.time_ticks, lives);
                    }
                    RunEvent::HeartCollected { .. } => hearts += 1,
                    other => log::debug!("{:?}", other),
                }
            }
        }

        match state.ending() {
            Some(ending) => log::info!(
                "{:?} after {} ticks: score {}, {} hits, {} hearts - {}",
                ending.outcome,
                state.time_ticks,
                ending.score,
                hits,
                hearts,
                ending.message()
            ),
            None => log::info!(
                "Stopped after {} ticks with score {} and {} lives",
                state.time_ticks,
                state.score,
                state.lives
            ),
        }
    }
}
