//! Per-tick liquid, foam and pressure integration
//!
//! Fixed increments per tick, never scaled by wall-clock delta. Soda stores
//! pressure while pouring and releases it as rising foam after the button is
//! let go; coffee only carries a thin crema layer.

use rand::Rng;

use super::state::{DrinkType, FillStatus, Round, SPILL_THRESHOLD};
use crate::tuning::DrinkConfig;

/// Pressure below this counts as fully released
pub const PRESSURE_EPSILON: f32 = 0.01;

/// Uniform draw in [lo, hi], collapsing empty ranges to `lo`
#[inline]
pub(crate) fn uniform<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Advance the round by one tick.
///
/// Returns `true` when liquid + foam crossed the spill line this tick while
/// the round was still live; the caller owns the SPILLED transition.
pub fn step<R: Rng>(round: &mut Round, cfg: &DrinkConfig, rng: &mut R) -> bool {
    if round.is_pouring && !round.status.is_terminal() {
        pour(round, cfg, rng);
    } else if !round.is_pouring && round.status == FillStatus::Settling {
        settle(round, cfg, rng);
    }

    round.foam_level = round.foam_level.max(0.0);
    round.pressure = round.pressure.max(0.0);

    overflowed(round)
}

/// Spill test, evaluated after the level update of the same tick
#[inline]
pub fn overflowed(round: &Round) -> bool {
    round.total_height() > SPILL_THRESHOLD && !round.status.is_terminal()
}

fn pour<R: Rng>(round: &mut Round, cfg: &DrinkConfig, rng: &mut R) {
    // Micro-flow jitter on top of the nominal fill speed
    round.liquid_level += cfg.fill_speed + uniform(rng, 0.0, cfg.flow_noise);

    match round.drink {
        DrinkType::Soda => {
            round.pressure += cfg.foam_rate + uniform(rng, cfg.chaos_min, cfg.chaos_max);
        }
        DrinkType::Coffee => {
            round.pressure = 0.0;
        }
    }

    // Agitation foam while the stream is hitting the surface
    if round.foam_level < cfg.pour_foam_cap {
        round.foam_level = (round.foam_level + cfg.pour_foam_step).min(cfg.pour_foam_cap);
    }
}

fn settle<R: Rng>(round: &mut Round, cfg: &DrinkConfig, rng: &mut R) {
    match round.drink {
        DrinkType::Soda if round.pressure > 0.0 => {
            // The rise: stored fizz turns into foam height
            let rise = cfg.rise_speed + uniform(rng, 0.0, cfg.rise_jitter);
            let transfer = round.pressure.min(rise);
            round.pressure -= transfer;
            round.foam_level += transfer;
            if round.pressure < PRESSURE_EPSILON {
                round.pressure = 0.0;
            }
        }
        DrinkType::Soda | DrinkType::Coffee => {
            if round.foam_level > cfg.foam_floor {
                let decay = cfg.foam_decay + uniform(rng, 0.0, cfg.decay_jitter);
                round.foam_level = (round.foam_level - decay).max(cfg.foam_floor);
            }
        }
    }
}
