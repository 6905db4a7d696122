//! Fixed timestep simulation tick
//!
//! Core loop that advances the glass deterministically, plus the round state
//! machine transitions the loop and the pour button drive.

use rand::Rng;

use super::physics;
use super::scoring::{self, Outcome};
use super::state::{FillStatus, GameEvent, GameState, ms_to_ticks};
use super::timer::TimerKind;

/// Input edges for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pour button went down
    pub pour_start: bool,
    /// Pour button went up (or the pointer left it)
    pub pour_stop: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.pour_start {
        state.pour_start();
    }
    if input.pour_stop {
        state.pour_stop();
    }

    // Menu and result screens have no physics
    if !state.is_active() {
        return;
    }

    state.time_ticks += 1;

    let drink = state.round.drink;
    if physics::step(&mut state.round, state.tuning.drink(drink), &mut state.rng) {
        spill(state);
    }

    // Only the schedules this glass still holds a handle to may act on it
    while let Some(fired) = state.timers.pop_due(state.time_ticks) {
        match fired.kind {
            TimerKind::Settle if state.round.settle_timer == Some(fired) => {
                state.round.settle_timer = None;
                evaluate(state);
            }
            TimerKind::Transition if state.round.transition_timer == Some(fired) => {
                state.round.transition_timer = None;
                finish_round(state);
            }
            _ => log::debug!("timer {:?}#{} is stale, ignored", fired.kind, fired.generation),
        }
    }
}

impl GameState {
    /// EMPTY/SETTLING -> POURING
    pub fn pour_start(&mut self) {
        if !self.is_active() || self.round.status.is_terminal() {
            log::debug!("pour_start ignored in {:?}/{:?}", self.phase, self.round.status);
            return;
        }
        if self.round.is_pouring {
            return;
        }

        if let Some(handle) = self.round.settle_timer.take() {
            self.timers.cancel_handle(handle);
        }
        self.round.status = FillStatus::Pouring;
        self.round.is_pouring = true;
        self.emit(GameEvent::PourStarted);
    }

    /// POURING -> SETTLING, arming the settle window
    pub fn pour_stop(&mut self) {
        if !self.round.is_pouring {
            // mouseup followed by mouseleave lands here
            return;
        }

        self.round.is_pouring = false;
        self.round.status = FillStatus::Settling;

        let cfg = self.tuning.drink(self.round.drink);
        let jitter = self.tuning.settle_jitter_ms as i64;
        let offset = if jitter > 0 {
            self.rng.random_range(-jitter..=jitter)
        } else {
            0
        };
        let wait_ms = (cfg.settling_time_ms as i64 + offset).max(0) as u32;

        let handle = self
            .timers
            .schedule(TimerKind::Settle, self.time_ticks, ms_to_ticks(wait_ms));
        self.round.settle_timer = Some(handle);
        self.emit(GameEvent::PourStopped);
    }
}

/// Any live state -> SPILLED
fn spill(state: &mut GameState) {
    log::info!(
        "{} spilled at {:.1} (target {:.1})",
        state.round.drink.as_str(),
        state.round.total_height(),
        state.round.target_line
    );

    state.round.status = FillStatus::Spilled;
    state.round.is_pouring = false;
    state.round.feedback = Some(Outcome::Spill.feedback());

    if let Some(handle) = state.round.settle_timer.take() {
        state.timers.cancel_handle(handle);
    }
    let delay = ms_to_ticks(state.tuning.spill_delay_ms);
    let handle = state
        .timers
        .schedule(TimerKind::Transition, state.time_ticks, delay);
    state.round.transition_timer = Some(handle);
    state.emit(GameEvent::Spilled);
}

/// SETTLING -> EVALUATING, judging the glass as it stands right now
fn evaluate(state: &mut GameState) {
    if state.round.status != FillStatus::Settling {
        log::debug!("settle timer fired in {:?}, ignored", state.round.status);
        return;
    }

    state.round.status = FillStatus::Evaluating;

    let judgement = scoring::judge(
        state.round.total_height(),
        state.round.target_line,
        state.round.drink,
        &state.tuning,
    );
    scoring::record(&mut state.session, &judgement);
    state.round.feedback = Some(judgement.outcome.feedback());

    log::info!(
        "{} judged {:?} at {:.1} (target {:.1}), +{:.0}",
        state.round.drink.as_str(),
        judgement.outcome,
        judgement.final_level,
        state.round.target_line,
        judgement.reward
    );

    let delay = ms_to_ticks(state.tuning.evaluate_delay_ms);
    let handle = state
        .timers
        .schedule(TimerKind::Transition, state.time_ticks, delay);
    state.round.transition_timer = Some(handle);
    state.emit(GameEvent::RoundEvaluated {
        outcome: judgement.outcome,
        reward: judgement.reward,
    });
}

/// EVALUATING/SPILLED -> EMPTY
fn finish_round(state: &mut GameState) {
    if !state.round.status.is_terminal() {
        log::debug!("transition timer fired in {:?}, ignored", state.round.status);
        return;
    }
    state.next_round();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{DrinkType, Round, SIM_HZ, SessionPhase};
    use crate::tuning::Tuning;

    /// Session with the given glass and all jitter removed
    fn playing(drink: DrinkType, target_line: f32) -> GameState {
        let mut tuning = Tuning::default();
        tuning.settle_jitter_ms = 0;
        for cfg in [&mut tuning.soda, &mut tuning.coffee] {
            cfg.flow_noise = 0.0;
            cfg.chaos_min = 0.0;
            cfg.chaos_max = 0.0;
            cfg.rise_jitter = 0.0;
            cfg.decay_jitter = 0.0;
        }
        let mut state = GameState::new(12345, tuning);
        state.start_session(None);
        state.round = Round::new(drink, target_line);
        state.drain_events();
        state
    }

    fn run(state: &mut GameState, ticks: u64) {
        for _ in 0..ticks {
            tick(state, &TickInput::default());
        }
    }

    fn pour_until(state: &mut GameState, level: f32) {
        state.pour_start();
        while state.round.liquid_level < level && state.round.status == FillStatus::Pouring {
            tick(state, &TickInput::default());
        }
        state.pour_stop();
    }

    #[test]
    fn test_start_stop_transitions() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        assert_eq!(state.round.status, FillStatus::Empty);

        tick(
            &mut state,
            &TickInput {
                pour_start: true,
                ..Default::default()
            },
        );
        assert_eq!(state.round.status, FillStatus::Pouring);

        tick(
            &mut state,
            &TickInput {
                pour_stop: true,
                ..Default::default()
            },
        );
        assert_eq!(state.round.status, FillStatus::Settling);
        assert!(state.timers.is_armed(TimerKind::Settle));

        assert_eq!(
            state.drain_events(),
            vec![GameEvent::PourStarted, GameEvent::PourStopped]
        );
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut state = playing(DrinkType::Soda, 75.0);
        state.pour_stop();
        assert_eq!(state.round.status, FillStatus::Empty);
        assert!(!state.timers.is_armed(TimerKind::Settle));
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_double_stop_evaluates_once() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.pour_start();
        run(&mut state, 10);

        state.pour_stop();
        let armed = state.round.settle_timer;
        assert!(armed.is_some());
        state.pour_stop();
        assert_eq!(state.round.settle_timer, armed);

        let wait = ms_to_ticks(state.tuning.coffee.settling_time_ms) + 1;
        run(&mut state, wait);
        let evaluated = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::RoundEvaluated { .. }))
            .count();
        assert_eq!(evaluated, 1);
        assert_eq!(state.round.status, FillStatus::Evaluating);
    }

    #[test]
    fn test_repour_cancels_settle_timer() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.pour_start();
        run(&mut state, 5);
        state.pour_stop();
        run(&mut state, 5);

        state.pour_start();
        assert_eq!(state.round.status, FillStatus::Pouring);
        assert!(!state.timers.is_armed(TimerKind::Settle));
        assert_eq!(state.round.settle_timer, None);

        // Would have fired by now if it were still armed
        let wait = ms_to_ticks(state.tuning.coffee.settling_time_ms) + 5;
        run(&mut state, wait);
        assert_eq!(state.round.status, FillStatus::Pouring);
    }

    #[test]
    fn test_input_ignored_while_evaluating_or_spilled() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.round.status = FillStatus::Evaluating;
        state.pour_start();
        assert!(!state.round.is_pouring);

        state.round.status = FillStatus::Spilled;
        state.pour_start();
        assert!(!state.round.is_pouring);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_overflow_spills_on_crossing_tick() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.pour_start();

        let mut crossed_at = None;
        for n in 1..=200u64 {
            tick(&mut state, &TickInput::default());
            if state.round.total_height() > 105.0 && crossed_at.is_none() {
                crossed_at = Some(n);
                assert_eq!(state.round.status, FillStatus::Spilled);
                break;
            }
            assert_eq!(state.round.status, FillStatus::Pouring);
        }
        assert!(crossed_at.is_some());
        assert!(!state.round.is_pouring);
        assert_eq!(state.round.feedback, Some("Spilled!"));
        assert_eq!(state.session.completed_cups, 0);
        assert_eq!(state.session.total_volume, 0.0);
        assert!(state.timers.is_armed(TimerKind::Transition));
        assert!(state.drain_events().contains(&GameEvent::Spilled));
    }

    #[test]
    fn test_spill_then_next_round() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.round.liquid_level = 104.0;
        state.pour_start();
        tick(&mut state, &TickInput::default());
        assert_eq!(state.round.status, FillStatus::Spilled);

        let wait = ms_to_ticks(state.tuning.spill_delay_ms);
        run(&mut state, wait);
        assert_eq!(state.round.status, FillStatus::Empty);
        assert_eq!(state.round.liquid_level, 0.0);
        assert_eq!(state.round.foam_level, 0.0);
        assert_eq!(state.round.pressure, 0.0);
        assert_eq!(state.round.feedback, None);
        assert!((60.0..=85.0).contains(&state.round.target_line));
    }

    #[test]
    fn test_soda_rise_scenario() {
        let mut state = playing(DrinkType::Soda, 75.0);
        pour_until(&mut state, 49.8);
        assert_eq!(state.round.status, FillStatus::Settling);
        assert!(state.round.pressure > 0.0);

        // Foam keeps rising after the button is released
        let at_release = state.round.total_height();
        run(&mut state, 10);
        assert!(state.round.total_height() > at_release);

        let wait = ms_to_ticks(state.tuning.soda.settling_time_ms);
        run(&mut state, wait);
        assert_eq!(state.round.status, FillStatus::Evaluating);

        let judged = state.round.total_height();
        assert!((judged - 76.0).abs() < 1.5, "landed at {}", judged);
        assert_eq!(state.round.feedback, Some("Nice!"));
        assert_eq!(state.session.completed_cups, 1);
        let expected = judged * 6.0 * 1.5;
        assert!((state.session.total_volume - expected).abs() < 1e-2);
    }

    #[test]
    fn test_judged_height_is_sampled_at_fire() {
        let mut state = playing(DrinkType::Soda, 75.0);
        state.round.status = FillStatus::Settling;
        state.round.liquid_level = 70.0;
        state.round.foam_level = 8.0;
        let handle = state.timers.schedule(TimerKind::Settle, state.time_ticks, 1);
        state.round.settle_timer = Some(handle);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.round.status, FillStatus::Evaluating);
        assert_eq!(state.session.completed_cups, 1);
        // Foam decayed one tick before the timer fired
        let judged = 70.0 + 8.0 - state.tuning.soda.foam_decay;
        let expected = judged * 6.0 * 1.5;
        assert!((state.session.total_volume - expected).abs() < 1e-2);

        // Evaluation freezes the glass
        let frozen = state.round.total_height();
        run(&mut state, 5);
        assert_eq!(state.round.total_height(), frozen);
    }

    #[test]
    fn test_coffee_never_builds_pressure() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.pour_start();
        for _ in 0..80 {
            tick(&mut state, &TickInput::default());
            assert_eq!(state.round.pressure, 0.0);
        }
    }

    #[test]
    fn test_session_end_freezes_input() {
        let mut state = playing(DrinkType::Soda, 75.0);
        state.session.time_remaining = 1;
        state.pour_start();

        run(&mut state, SIM_HZ);
        assert_eq!(state.phase, SessionPhase::Playing);
        state.advance_clock(1.0);
        assert_eq!(state.phase, SessionPhase::Result);
        assert_eq!(state.session.time_remaining, 0);
        assert!(state.session.ended_at_ms.is_some());
        assert!(!state.round.is_pouring);

        let level = state.round.liquid_level;
        state.pour_start();
        run(&mut state, 30);
        assert!(!state.round.is_pouring);
        assert_eq!(state.round.liquid_level, level);
    }

    #[test]
    fn test_stale_settle_timer_is_ignored() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.pour_start();
        run(&mut state, 5);
        state.pour_stop();
        let Some(owned) = state.round.settle_timer else {
            panic!("pour_stop should arm the settle window");
        };
        state.drain_events();

        // Re-arming the slot outside the round leaves the glass holding a stale handle
        state.timers.schedule(TimerKind::Settle, state.time_ticks, 1);
        assert!(!state.timers.is_current(owned));

        run(&mut state, 2);
        assert_eq!(state.round.status, FillStatus::Settling);
        assert_eq!(state.session.completed_cups, 0);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_next_round_drops_old_handles() {
        let mut state = playing(DrinkType::Coffee, 70.0);
        state.round.liquid_level = 104.0;
        state.pour_start();
        tick(&mut state, &TickInput::default());
        assert_eq!(state.round.status, FillStatus::Spilled);
        let Some(hold) = state.round.transition_timer else {
            panic!("spill should arm the feedback hold");
        };

        state.next_round();
        assert_eq!(state.round.transition_timer, None);
        assert!(!state.timers.is_current(hold));
    }

    #[test]
    fn test_determinism() {
        let script = |state: &mut GameState| {
            state.start_session(Some("det".into()));
            for i in 0..600u32 {
                let input = TickInput {
                    pour_start: i % 150 == 0,
                    pour_stop: i % 150 == 100,
                };
                tick(state, &input);
            }
        };

        let mut a = GameState::new(99999, Tuning::default());
        let mut b = GameState::new(99999, Tuning::default());
        script(&mut a);
        script(&mut b);

        assert_eq!(a.round, b.round);
        assert_eq!(a.session, b.session);
        assert_eq!(a.drain_events(), b.drain_events());
    }
}
