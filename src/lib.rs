//! Pour Master - hold to pour, let go before it foams over
//!
//! Core modules:
//! - `sim`: Deterministic simulation (fill physics, round state machine, scoring)
//! - `tuning`: Data-driven game balance
//! - `audio`: Audio service seam driven by simulation events
//! - `game`: Frontend shell (fixed-step accumulator, event dispatch)

pub mod audio;
pub mod game;
pub mod sim;
pub mod tuning;

pub use audio::{AudioService, CueQueue, NullAudio, SoundCue};
pub use game::Game;
pub use tuning::{DrinkConfig, Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    use crate::sim::SIM_HZ;

    /// Fixed simulation timestep (60 Hz, one step per animation frame)
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
}
