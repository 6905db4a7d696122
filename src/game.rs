//! Frontend-facing game shell
//!
//! Wraps [`GameState`] with the injected audio service and a fixed-step
//! accumulator so a frame callback can hand over raw elapsed time.

use crate::audio::{AudioService, SoundCue};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::sim::{GameEvent, GameState, Snapshot, TickInput, tick};
use crate::tuning::Tuning;

pub struct Game<A: AudioService> {
    pub state: GameState,
    audio: A,
    accumulator: f32,
    /// Edges captured between frames, consumed by the next tick
    input: TickInput,
    /// Events dispatched by the most recent call
    recent: Vec<GameEvent>,
}

impl<A: AudioService> Game<A> {
    pub fn new(seed: u64, tuning: Tuning, audio: A) -> Self {
        Self {
            state: GameState::new(seed, tuning),
            audio,
            accumulator: 0.0,
            input: TickInput::default(),
            recent: Vec::new(),
        }
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn start_session(&mut self, nickname: Option<String>) {
        self.accumulator = 0.0;
        self.input = TickInput::default();
        self.audio.start();
        self.state.start_session(nickname);
        self.dispatch_events();
    }

    pub fn return_to_menu(&mut self) {
        self.state.return_to_menu();
        self.audio.stop();
        self.dispatch_events();
    }

    /// Queue a pour-start edge for the next tick
    pub fn pour_start(&mut self) {
        self.input.pour_start = true;
        self.input.pour_stop = false;
    }

    /// Queue a pour-stop edge for the next tick
    pub fn pour_stop(&mut self) {
        if self.input.pour_start {
            // Tap shorter than a frame: apply the press now so the release lands
            self.state.pour_start();
            self.input.pour_start = false;
        }
        self.input.pour_stop = true;
    }

    /// Run as many fixed ticks as `dt` seconds cover; returns ticks run
    ///
    /// Physics catch-up is capped, the session clock is not: it always
    /// advances by the full `dt`.
    pub fn update(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = std::mem::take(&mut self.input);
            tick(&mut self.state, &input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of spiralling
            self.accumulator = 0.0;
        }

        self.state.advance_clock(dt);
        self.dispatch_events();
        substeps
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Events raised during the last `update`/`start_session`/`return_to_menu`
    pub fn events(&self) -> &[GameEvent] {
        &self.recent
    }

    fn dispatch_events(&mut self) {
        self.recent = self.state.drain_events();
        for event in &self.recent {
            if let Some(cue) = SoundCue::for_event(event) {
                self.audio.play(cue);
            }
            if matches!(event, GameEvent::SessionEnded { .. }) {
                self.audio.stop();
            }
        }
    }
}
