//! Cancellable tick-based timers
//!
//! The round needs exactly two deferred callbacks: the settle window before
//! judging and the feedback hold before the next glass. Each slot carries a
//! generation counter so a handle from an older schedule can never cancel or
//! fire against a newer one.

/// Which deferred transition a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// SETTLING -> EVALUATING
    Settle,
    /// EVALUATING/SPILLED -> next round
    Transition,
}

/// Returned from [`Timers::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub kind: TimerKind,
    pub generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    deadline: Option<u64>,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Timers {
    settle: Slot,
    transition: Slot,
}

impl Timers {
    fn slot(&self, kind: TimerKind) -> &Slot {
        match kind {
            TimerKind::Settle => &self.settle,
            TimerKind::Transition => &self.transition,
        }
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Slot {
        match kind {
            TimerKind::Settle => &mut self.settle,
            TimerKind::Transition => &mut self.transition,
        }
    }

    /// Arm `kind` to fire `delay_ticks` after `now`, replacing any pending one
    pub fn schedule(&mut self, kind: TimerKind, now: u64, delay_ticks: u64) -> TimerHandle {
        let slot = self.slot_mut(kind);
        slot.generation = slot.generation.wrapping_add(1);
        let deadline = now + delay_ticks.max(1);
        slot.deadline = Some(deadline);
        log::debug!("timer {:?}#{} armed for tick {}", kind, slot.generation, deadline);
        TimerHandle {
            kind,
            generation: slot.generation,
        }
    }

    fn cancel(&mut self, kind: TimerKind) {
        let slot = self.slot_mut(kind);
        if slot.deadline.take().is_some() {
            log::debug!("timer {:?}#{} cancelled", kind, slot.generation);
        }
    }

    /// Cancel only if `handle` still names the pending schedule
    pub fn cancel_handle(&mut self, handle: TimerHandle) -> bool {
        if self.is_current(handle) {
            self.cancel(handle.kind);
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self) {
        self.cancel(TimerKind::Settle);
        self.cancel(TimerKind::Transition);
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slot(kind).deadline.is_some()
    }

    pub fn is_current(&self, handle: TimerHandle) -> bool {
        let slot = self.slot(handle.kind);
        slot.deadline.is_some() && slot.generation == handle.generation
    }

    /// Disarm and return the next timer due at `now` (settle before transition)
    pub fn pop_due(&mut self, now: u64) -> Option<TimerHandle> {
        for kind in [TimerKind::Settle, TimerKind::Transition] {
            let slot = self.slot_mut(kind);
            if slot.deadline.is_some_and(|deadline| deadline <= now) {
                slot.deadline = None;
                return Some(TimerHandle {
                    kind,
                    generation: slot.generation,
                });
            }
        }
        None
    }
}
