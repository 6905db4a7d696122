//! Deterministic pour simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies

pub mod orchestrator;
pub mod physics;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod timer;

pub use scoring::{Judgement, Outcome, judge};
pub use state::{
    BRIM, DrinkType, FillStatus, GameEvent, GameState, Round, SIM_HZ, SPILL_THRESHOLD, Session,
    SessionPhase, Snapshot,
};
pub use tick::{TickInput, tick};
pub use timer::{TimerHandle, TimerKind};
