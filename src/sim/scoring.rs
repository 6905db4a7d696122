//! Round judging and reward
//!
//! The final height is captured once, when the settle window closes, and
//! classified by the first matching band: spill, surface tension, overshoot,
//! undershoot, then in-zone success (perfect when within 1% of the line).

use serde::{Deserialize, Serialize};

use super::state::{BRIM, DrinkType, SPILL_THRESHOLD, Session};
use crate::tuning::Tuning;

/// Distance from the target line that still counts as perfect (exclusive)
pub const PERFECT_WINDOW: f32 = 1.0;

/// Result classification of a judged glass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Above the spill line
    Spill,
    /// Above the brim but held by surface tension
    SurfaceTension,
    /// Above the success band
    Overshoot,
    /// Below the success band
    Undershoot,
    /// Inside the success band
    Success,
    /// Inside the band and within [`PERFECT_WINDOW`] of the line
    Perfect,
}

impl Outcome {
    /// Counts as a served cup
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::SurfaceTension | Outcome::Success | Outcome::Perfect
        )
    }

    /// Text shown in the feedback bubble
    pub fn feedback(&self) -> &'static str {
        match self {
            Outcome::Spill => "Spilled!",
            Outcome::SurfaceTension => "Surface tension!",
            Outcome::Overshoot => "Too much!",
            Outcome::Undershoot => "Too little...",
            Outcome::Success => "Nice!",
            Outcome::Perfect => "Perfect!",
        }
    }
}

/// A judged round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    pub outcome: Outcome,
    /// Liquid + foam at the moment of judging
    pub final_level: f32,
    /// Volume-points awarded (0 for failures)
    pub reward: f32,
}

/// Classify `final_level` against `target_line` for `drink`
pub fn judge(final_level: f32, target_line: f32, drink: DrinkType, tuning: &Tuning) -> Judgement {
    let cfg = tuning.drink(drink);
    let min_success = target_line - cfg.tolerance;
    let max_success = target_line + cfg.tolerance;

    let outcome = if final_level > SPILL_THRESHOLD {
        Outcome::Spill
    } else if final_level > BRIM {
        Outcome::SurfaceTension
    } else if final_level > max_success {
        Outcome::Overshoot
    } else if final_level < min_success {
        Outcome::Undershoot
    } else if (final_level - target_line).abs() < PERFECT_WINDOW {
        Outcome::Perfect
    } else {
        Outcome::Success
    };

    let base_volume = final_level * tuning.ml_per_percent * cfg.score_multiplier;
    let reward = match outcome {
        Outcome::Spill | Outcome::Overshoot | Outcome::Undershoot => 0.0,
        Outcome::SurfaceTension => tuning.surface_tension_bonus,
        Outcome::Success => base_volume,
        Outcome::Perfect => base_volume * tuning.perfect_multiplier + cfg.perfect_bonus,
    };

    Judgement {
        outcome,
        final_level,
        reward,
    }
}

/// Fold a judgement into the session counters
pub fn record(session: &mut Session, judgement: &Judgement) {
    if !judgement.outcome.is_success() {
        return;
    }
    session.completed_cups += 1;
    session.total_volume += judgement.reward;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soda(final_level: f32) -> Judgement {
        // Soda tolerance is 7
        judge(final_level, 75.0, DrinkType::Soda, &Tuning::default())
    }

    #[test]
    fn test_band_edges_inclusive() {
        assert_eq!(soda(82.0).outcome, Outcome::Success);
        assert_eq!(soda(68.0).outcome, Outcome::Success);
        assert_eq!(soda(82.01).outcome, Outcome::Overshoot);
        assert_eq!(soda(67.99).outcome, Outcome::Undershoot);
        assert_eq!(soda(82.01).reward, 0.0);
        assert_eq!(soda(67.99).reward, 0.0);
    }

    #[test]
    fn test_perfect_beats_success_at_same_height() {
        let tuning = Tuning::default();
        let perfect = soda(75.0);
        assert_eq!(perfect.outcome, Outcome::Perfect);
        assert_eq!(soda(75.99).outcome, Outcome::Perfect);
        assert_eq!(soda(76.0).outcome, Outcome::Success);

        // Same height, target one step further away
        let plain = judge(75.0, 77.0, DrinkType::Soda, &tuning);
        assert_eq!(plain.outcome, Outcome::Success);
        assert!(perfect.reward > plain.reward);

        let expected = 75.0 * 6.0 * 1.5 * 1.2 + 399.0;
        assert!((perfect.reward - expected).abs() < 1e-2);
    }

    #[test]
    fn test_success_reward_is_volume() {
        let judged = soda(76.0);
        assert_eq!(judged.outcome, Outcome::Success);
        assert_eq!(judged.reward, 76.0 * 6.0 * 1.5);

        let coffee = judge(72.0, 70.0, DrinkType::Coffee, &Tuning::default());
        assert_eq!(coffee.outcome, Outcome::Success);
        assert_eq!(coffee.reward, 72.0 * 6.0);
    }

    #[test]
    fn test_surface_tension_band() {
        let mut tuning = Tuning::default();
        tuning.soda.tolerance = 10.0;

        let saved = judge(103.0, 85.0, DrinkType::Soda, &tuning);
        assert_eq!(saved.outcome, Outcome::SurfaceTension);
        assert_eq!(saved.reward, tuning.surface_tension_bonus);

        let spilled = judge(106.0, 85.0, DrinkType::Soda, &tuning);
        assert_eq!(spilled.outcome, Outcome::Spill);
        assert_eq!(spilled.reward, 0.0);

        let wide = judge(95.0, 85.0, DrinkType::Soda, &tuning);
        assert_eq!(wide.outcome, Outcome::Success);
        assert!(wide.reward > saved.reward);

        // 105 itself is still saved, 100 itself is an ordinary overshoot
        assert_eq!(judge(105.0, 85.0, DrinkType::Soda, &tuning).outcome, Outcome::SurfaceTension);
        assert_eq!(judge(100.0, 70.0, DrinkType::Soda, &tuning).outcome, Outcome::Overshoot);
    }

    #[test]
    fn test_record_counts_only_successes() {
        let mut session = Session::new(None, 60);

        record(&mut session, &soda(90.0));
        record(&mut session, &soda(50.0));
        record(&mut session, &soda(110.0));
        assert_eq!(session.completed_cups, 0);
        assert_eq!(session.total_volume, 0.0);

        record(&mut session, &soda(76.0));
        record(&mut session, &soda(103.0));
        assert_eq!(session.completed_cups, 2);
        assert_eq!(session.total_volume, 684.0 + 30.0);
    }

    #[test]
    fn test_feedback_text() {
        assert_eq!(Outcome::Perfect.feedback(), "Perfect!");
        assert_eq!(Outcome::Spill.feedback(), "Spilled!");
        assert!(!Outcome::Overshoot.is_success());
        assert!(Outcome::SurfaceTension.is_success());
    }
}
