//! Game state and core simulation types
//!
//! `Round` holds the per-tick accumulators the physics mutates; `Session`
//! holds the counters only the orchestrator touches. Presentation never sees
//! either directly, it reads a [`Snapshot`].

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::scoring::Outcome;
use super::timer::{TimerHandle, Timers};
use crate::tuning::Tuning;

/// Which drink the dispenser is pouring this round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrinkType {
    Soda,
    Coffee,
}

impl DrinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrinkType::Soda => "Soda",
            DrinkType::Coffee => "Coffee",
        }
    }
}

/// Round status (glass fill state machine)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillStatus {
    /// Fresh glass, nothing poured yet
    #[default]
    Empty,
    /// Button held, liquid flowing
    Pouring,
    /// Button released, foam still moving
    Settling,
    /// Judged, showing feedback
    Evaluating,
    /// Overflowed, showing feedback
    Spilled,
}

impl FillStatus {
    /// Physics and input are frozen in these states
    pub fn is_terminal(&self) -> bool {
        matches!(self, FillStatus::Evaluating | FillStatus::Spilled)
    }
}

/// Session-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Title screen, no session running
    #[default]
    Menu,
    /// Clock running, rounds cycling
    Playing,
    /// Time is up, final tally on screen
    Result,
}

/// Events an audio/visual collaborator may react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    RoundStarted { drink: DrinkType, target_line: f32 },
    PourStarted,
    PourStopped,
    Spilled,
    RoundEvaluated { outcome: Outcome, reward: f32 },
    SessionEnded { completed_cups: u32, total_volume: f32 },
}

/// The glass currently under the nozzle
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub drink: DrinkType,
    /// Centre of the success band (percent)
    pub target_line: f32,
    pub liquid_level: f32,
    pub foam_level: f32,
    /// Latent fizz, soda only
    pub pressure: f32,
    pub status: FillStatus,
    pub is_pouring: bool,
    pub feedback: Option<&'static str>,
    /// Settle window armed for this glass
    pub(crate) settle_timer: Option<TimerHandle>,
    /// Feedback hold armed for this glass
    pub(crate) transition_timer: Option<TimerHandle>,
}

impl Round {
    pub fn new(drink: DrinkType, target_line: f32) -> Self {
        Self {
            drink,
            target_line,
            liquid_level: 0.0,
            foam_level: 0.0,
            pressure: 0.0,
            status: FillStatus::Empty,
            is_pouring: false,
            feedback: None,
            settle_timer: None,
            transition_timer: None,
        }
    }

    /// Visible height: liquid plus foam
    #[inline]
    pub fn total_height(&self) -> f32 {
        self.liquid_level + self.foam_level
    }
}

/// One playthrough
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub nickname: Option<String>,
    pub time_remaining: u32,
    pub completed_cups: u32,
    /// Accumulated reward in ml-points
    pub total_volume: f32,
    /// Wall time into the current second of the countdown (µs)
    pub clock_us: u64,
    /// Wall time since the session started (µs)
    pub elapsed_us: u64,
    /// Session clock time when the countdown hit zero
    pub ended_at_ms: Option<u64>,
}

impl Session {
    pub fn new(nickname: Option<String>, seconds: u32) -> Self {
        Self {
            nickname,
            time_remaining: seconds,
            ..Default::default()
        }
    }

    /// Integer score shown on the HUD
    pub fn score(&self) -> u64 {
        self.total_volume.max(0.0).round() as u64
    }
}

/// Read-only view handed to rendering/audio each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: SessionPhase,
    pub drink: DrinkType,
    pub target_line: f32,
    pub tolerance: f32,
    pub liquid_level: f32,
    pub foam_level: f32,
    pub status: FillStatus,
    pub is_pouring: bool,
    pub feedback: Option<String>,
    pub time_remaining: u32,
    pub completed_cups: u32,
    pub total_volume: f32,
    pub score: u64,
    pub nickname: Option<String>,
}

/// Complete game state (deterministic from seed + input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: SessionPhase,
    pub round: Round,
    pub session: Session,
    /// Simulation ticks since the state was created
    pub time_ticks: u64,
    pub(crate) timers: Timers,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state sitting at the menu
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            tuning,
            phase: SessionPhase::Menu,
            round: Round::new(DrinkType::Coffee, 0.0),
            session: Session::default(),
            time_ticks: 0,
            timers: Timers::default(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    /// Input is accepted only while the clock is running
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            drink: self.round.drink,
            target_line: self.round.target_line,
            tolerance: self.tuning.drink(self.round.drink).tolerance,
            liquid_level: self.round.liquid_level,
            foam_level: self.round.foam_level,
            status: self.round.status,
            is_pouring: self.round.is_pouring,
            feedback: self.round.feedback.map(str::to_owned),
            time_remaining: self.session.time_remaining,
            completed_cups: self.session.completed_cups,
            total_volume: self.session.total_volume,
            score: self.session.score(),
            nickname: self.session.nickname.clone(),
        }
    }
}

/// Fixed simulation rate
pub const SIM_HZ: u64 = 60;

/// Milliseconds to whole ticks, rounding up so a timer never fires early
#[inline]
pub fn ms_to_ticks(ms: u32) -> u64 {
    (ms as u64 * SIM_HZ).div_ceil(1000)
}

/// Liquid + foam above this is a hard spill
pub const SPILL_THRESHOLD: f32 = 105.0;

/// Liquid + foam above this (but not above the spill line) rides surface tension
pub const BRIM: f32 = 100.0;
