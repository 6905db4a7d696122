//! Round sequencing and the session clock
//!
//! Owns every write to `Session` outside of scoring: starting and abandoning
//! sessions, drawing the next glass and counting down the time budget.
//!
//! The countdown runs on wall time fed in by the frontend, not on simulation
//! ticks, so a session lasts the same on a slow device as on a fast one.

use rand::Rng;

use super::physics::uniform;
use super::state::{DrinkType, FillStatus, GameEvent, GameState, Round, Session, SessionPhase};

const MICROS_PER_SECOND: u64 = 1_000_000;

impl GameState {
    /// Reset counters and the clock, then serve the first glass
    pub fn start_session(&mut self, nickname: Option<String>) {
        let nickname = nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        log::info!(
            "Session started ({}s) for {}",
            self.tuning.session_seconds,
            nickname.as_deref().unwrap_or("guest")
        );

        self.session = Session::new(nickname, self.tuning.session_seconds);
        self.phase = SessionPhase::Playing;
        self.emit(GameEvent::SessionStarted);
        self.next_round();
    }

    /// Clear the glass and, while the session runs, draw a new drink and target
    pub fn next_round(&mut self) {
        self.timers.cancel_all();

        if !self.is_active() {
            self.round = Round::new(self.round.drink, self.round.target_line);
            return;
        }

        let drink = self.draw_drink();
        let target_line = uniform(&mut self.rng, self.tuning.target_min, self.tuning.target_max);
        self.round = Round::new(drink, target_line);

        log::debug!("Next glass: {} to {:.1}", drink.as_str(), target_line);
        self.emit(GameEvent::RoundStarted { drink, target_line });
    }

    /// Abandon the session and go back to the title screen
    pub fn return_to_menu(&mut self) {
        self.timers.cancel_all();
        self.phase = SessionPhase::Menu;
        self.round = Round::new(self.round.drink, self.round.target_line);
        log::info!("Returned to menu");
    }

    fn draw_drink(&mut self) -> DrinkType {
        let soda_chance = (self.tuning.soda_chance as f64).clamp(0.0, 1.0);
        if self.rng.random_bool(soda_chance) {
            DrinkType::Soda
        } else {
            DrinkType::Coffee
        }
    }

    /// Feed `seconds` of elapsed wall time into the one-second countdown
    pub fn advance_clock(&mut self, seconds: f32) {
        if !self.is_active() {
            return;
        }

        // Whole microseconds keep the countdown exact across uneven frames
        let elapsed = (seconds.max(0.0) as f64 * MICROS_PER_SECOND as f64).round() as u64;
        self.session.elapsed_us = self.session.elapsed_us.saturating_add(elapsed);
        self.session.clock_us = self.session.clock_us.saturating_add(elapsed);

        while self.session.clock_us >= MICROS_PER_SECOND {
            self.session.clock_us -= MICROS_PER_SECOND;
            self.session.time_remaining = self.session.time_remaining.saturating_sub(1);

            if self.session.time_remaining == 0 {
                self.end_session();
                return;
            }
        }
    }

    /// Time is up: freeze input, stop physics, keep the tally on screen
    fn end_session(&mut self) {
        self.timers.cancel_all();
        self.round.settle_timer = None;
        self.round.transition_timer = None;
        if self.round.is_pouring {
            // The glass is left as it stands, unjudged
            self.round.is_pouring = false;
            self.round.status = FillStatus::Settling;
            self.emit(GameEvent::PourStopped);
        }
        self.phase = SessionPhase::Result;
        self.session.ended_at_ms = Some(self.session.elapsed_us / 1000);

        log::info!(
            "Session ended: {} cups, {:.0} ml",
            self.session.completed_cups,
            self.session.total_volume
        );
        self.emit(GameEvent::SessionEnded {
            completed_cups: self.session.completed_cups,
            total_volume: self.session.total_volume,
        });
    }
}
