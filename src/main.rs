//! Pour Master entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlInputElement, KeyboardEvent};

    use pour_master::consts::SIM_DT;
    use pour_master::sim::{SessionPhase, Snapshot};
    use pour_master::{CueQueue, Game, Tuning};

    /// Browser-side wrapper holding the shell and frame timing
    pub struct WebGame {
        pub game: Game<CueQueue>,
        last_time: f64,
        last_phase: SessionPhase,
    }

    impl WebGame {
        fn new(seed: u64) -> Self {
            Self {
                game: Game::new(seed, Tuning::load(), CueQueue::new()),
                last_time: 0.0,
                last_phase: SessionPhase::Menu,
            }
        }

        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;
            self.game.update(dt);
        }

        /// Push the latest snapshot into the HUD elements
        fn update_hud(&mut self, document: &Document) {
            let snap = self.game.snapshot();

            set_text(document, "hud-score", &snap.score.to_string());
            set_text(document, "hud-time", &snap.time_remaining.to_string());
            set_text(document, "hud-cups", &snap.completed_cups.to_string());
            set_text(document, "hud-drink", snap.drink.as_str());
            set_text(document, "feedback", snap.feedback.as_deref().unwrap_or(""));

            if let Some(btn) = document.get_element_by_id("pour-btn") {
                let _ = btn
                    .class_list()
                    .toggle_with_force("disabled", snap.status.is_terminal());
            }

            if snap.phase != self.last_phase {
                show_screen(document, &snap);
                self.last_phase = snap.phase;
            }
        }
    }

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<WebGame>>>> = const { RefCell::new(None) };
    }

    fn with_game<T: Default>(f: impl FnOnce(&mut WebGame) -> T) -> T {
        GAME.with(|slot| match slot.borrow().as_ref() {
            Some(game) => f(&mut game.borrow_mut()),
            None => T::default(),
        })
    }

    /// Latest simulation snapshot as JSON (for a JS/CSS renderer)
    #[wasm_bindgen]
    pub fn snapshot_json() -> String {
        with_game(|g| serde_json::to_string(&g.game.snapshot()).unwrap_or_default())
    }

    /// Sound cues raised since the last call, as a JSON array
    #[wasm_bindgen]
    pub fn drain_cues_json() -> String {
        with_game(|g| serde_json::to_string(&g.game.audio_mut().drain()).unwrap_or_default())
    }

    #[wasm_bindgen]
    pub fn set_muted(muted: bool) {
        with_game(|g| g.game.audio_mut().set_muted(muted));
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn show_screen(document: &Document, snap: &Snapshot) {
        for (id, phase) in [
            ("menu", SessionPhase::Menu),
            ("play", SessionPhase::Playing),
            ("result", SessionPhase::Result),
        ] {
            if let Some(el) = document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("hidden", snap.phase != phase);
            }
        }
        if snap.phase == SessionPhase::Result {
            set_text(document, "result-score", &snap.score.to_string());
            set_text(document, "result-cups", &snap.completed_cups.to_string());
            set_text(document, "result-ended", &format_clock(js_sys::Date::new_0()));
        }
    }

    fn format_clock(date: js_sys::Date) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            date.get_hours(),
            date.get_minutes(),
            date.get_seconds()
        )
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Pour Master starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document, nothing to attach to");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(WebGame::new(seed)));
        GAME.with(|slot| *slot.borrow_mut() = Some(game.clone()));
        log::info!("Game initialized with seed: {}", seed);

        setup_pour_button(&document, game.clone());
        setup_keyboard(&document, game.clone());
        setup_session_buttons(&document, game.clone());
        show_screen(&document, &game.borrow().game.snapshot());

        request_animation_frame(game);
        log::info!("Pour Master running!");
    }

    fn listen(
        target: &web_sys::EventTarget,
        event: &str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_pour_button(document: &Document, game: Rc<RefCell<WebGame>>) {
        let Some(btn) = document.get_element_by_id("pour-btn") else {
            log::warn!("pour-btn missing");
            return;
        };

        for event in ["mousedown", "touchstart"] {
            let game = game.clone();
            listen(&btn, event, move |e: web_sys::Event| {
                e.prevent_default();
                game.borrow_mut().game.pour_start();
            });
        }
        // mouseleave after mouseup is a harmless duplicate stop
        for event in ["mouseup", "mouseleave", "touchend", "touchcancel"] {
            let game = game.clone();
            listen(&btn, event, move |e: web_sys::Event| {
                e.prevent_default();
                game.borrow_mut().game.pour_stop();
            });
        }
    }

    fn setup_keyboard(document: &Document, game: Rc<RefCell<WebGame>>) {
        {
            let game = game.clone();
            listen(document, "keydown", move |e: web_sys::Event| {
                let Some(key) = e.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if key.code() == "Space" && !key.repeat() {
                    e.prevent_default();
                    game.borrow_mut().game.pour_start();
                }
            });
        }
        listen(document, "keyup", move |e: web_sys::Event| {
            let Some(key) = e.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if key.code() == "Space" {
                game.borrow_mut().game.pour_stop();
            }
        });
    }

    fn setup_session_buttons(document: &Document, game: Rc<RefCell<WebGame>>) {
        for id in ["start-btn", "again-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                listen(&btn, "click", move |_e: web_sys::Event| {
                    let nickname = web_sys::window()
                        .and_then(|w| w.document())
                        .and_then(|d| d.get_element_by_id("nickname"))
                        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                        .map(|input| input.value());
                    game.borrow_mut().game.start_session(nickname);
                });
            }
        }

        if let Some(btn) = document.get_element_by_id("menu-btn") {
            listen(&btn, "click", move |_e: web_sys::Event| {
                game.borrow_mut().game.return_to_menu();
            });
        }
    }

    fn request_animation_frame(game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<WebGame>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.frame(time);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
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
    log::info!("Pour Master (native) starting...");
    log::info!("Native mode runs a headless autoplay session, use `trunk serve` for the web build");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0x5eed);
    autoplay(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play a full session with a simple "stop early for soda" policy
#[cfg(not(target_arch = "wasm32"))]
fn autoplay(seed: u64) {
    use pour_master::consts::SIM_DT;
    use pour_master::sim::{DrinkType, FillStatus, GameEvent, SessionPhase};
    use pour_master::{Game, NullAudio, Tuning};

    let mut game = Game::new(seed, Tuning::load(), NullAudio);
    game.start_session(Some("autoplay".into()));

    let mut cups = Vec::new();
    while game.state.phase == SessionPhase::Playing {
        let round = game.state.round.clone();
        // Stored pressure will come back as foam; leave room for it
        let projected = round.total_height() + round.pressure;
        let lead = match round.drink {
            DrinkType::Soda => 1.5,
            DrinkType::Coffee => 0.5,
        };

        match round.status {
            FillStatus::Empty => game.pour_start(),
            FillStatus::Pouring if projected >= round.target_line - lead => game.pour_stop(),
            _ => {}
        }

        game.update(SIM_DT);
        for event in game.events() {
            if let GameEvent::RoundEvaluated { outcome, reward } = *event {
                cups.push((round.drink, outcome, reward));
            }
        }
    }

    println!("\nSeed {}: {} rounds judged", seed, cups.len());
    for (i, (drink, outcome, reward)) in cups.iter().enumerate() {
        println!("  #{:<2} {:<6} {:?} (+{:.0})", i + 1, drink.as_str(), outcome, reward);
    }
    let snap = game.snapshot();
    println!("✓ {} cups, score {}", snap.completed_cups, snap.score);
}
