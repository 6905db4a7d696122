//! Audio service seam
//!
//! The simulation never plays sound itself. It raises [`GameEvent`]s; the
//! [`Game`](crate::game::Game) shell maps them to [`SoundCue`]s and hands them
//! to whatever [`AudioService`] was injected. Synthesis lives in the frontend.

use serde::{Deserialize, Serialize};

use crate::sim::{GameEvent, Outcome};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Start the pouring loop
    PourLoopStart,
    /// Stop the pouring loop
    PourLoopStop,
    /// Glass overflowed
    Splash,
    /// Judged in the band
    Success,
    /// Judged within the perfect window
    Perfect,
    /// Judged outside the band
    Fail,
    /// Session clock ran out
    TimeUp,
}

impl SoundCue {
    /// Cue for an event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::PourStarted => Some(SoundCue::PourLoopStart),
            GameEvent::PourStopped => Some(SoundCue::PourLoopStop),
            GameEvent::Spilled => Some(SoundCue::Splash),
            GameEvent::RoundEvaluated { outcome, .. } => Some(match outcome {
                Outcome::Perfect => SoundCue::Perfect,
                Outcome::Success | Outcome::SurfaceTension => SoundCue::Success,
                Outcome::Spill | Outcome::Overshoot | Outcome::Undershoot => SoundCue::Fail,
            }),
            GameEvent::SessionEnded { .. } => Some(SoundCue::TimeUp),
            GameEvent::SessionStarted | GameEvent::RoundStarted { .. } => None,
        }
    }
}

/// Process-wide audio resource with an explicit lifecycle
pub trait AudioService {
    /// Acquire the device / start ambience (called on session start)
    fn start(&mut self);
    /// Silence everything and release (called on session end or menu)
    fn stop(&mut self);
    fn play(&mut self, cue: SoundCue);
}

/// Discards every cue
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioService for NullAudio {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn play(&mut self, _cue: SoundCue) {}
}

/// Buffers cues for a frontend to poll and play
#[derive(Debug, Default)]
pub struct CueQueue {
    running: bool,
    muted: bool,
    pending: Vec<SoundCue>,
}

impl CueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mute/unmute (cues are dropped while muted)
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.pending.clear();
        }
    }

    /// Take all cues queued since the last call
    pub fn drain(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.pending)
    }
}

impl AudioService for CueQueue {
    fn start(&mut self) {
        self.running = true;
        log::debug!("audio started");
    }

    fn stop(&mut self) {
        if self.running {
            log::debug!("audio stopped");
        }
        self.running = false;
        // Cues already played this frame still go out; only the loop is cut
        self.pending.retain(|cue| *cue != SoundCue::PourLoopStart);
        self.pending.push(SoundCue::PourLoopStop);
    }

    fn play(&mut self, cue: SoundCue) {
        if self.running && !self.muted {
            self.pending.push(cue);
        }
    }
}
