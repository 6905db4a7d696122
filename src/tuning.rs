//! Data-driven game balance
//!
//! Every number that shapes how a pour feels lives here. Persisted separately
//! from anything else in LocalStorage so balance can be tweaked without a rebuild.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::DrinkType;

/// Rejected tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning json is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("target range is inverted ({min} > {max})")]
    InvertedTargetRange { min: f32, max: f32 },
    #[error("{drink:?}: {field} must be positive, got {value}")]
    NotPositive {
        drink: DrinkType,
        field: &'static str,
        value: f32,
    },
    #[error("{field} must be within [{lo}, {hi}], got {value}")]
    OutOfRange {
        field: &'static str,
        lo: f32,
        hi: f32,
        value: f32,
    },
}

/// Per-drink constant bundle (the "round configuration")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkConfig {
    /// Half-width of the success band around the target line
    pub tolerance: f32,
    /// Liquid added per pouring tick
    pub fill_speed: f32,
    /// Pressure added per pouring tick (soda only)
    pub foam_rate: f32,
    /// Nominal settle window before judging (ms)
    pub settling_time_ms: u32,
    /// Volume multiplier applied to successful pours
    pub score_multiplier: f32,
    /// Flat bonus for a perfect pour
    pub perfect_bonus: f32,

    // === Physics ===
    /// Upper bound of the per-tick flow jitter, drawn from [0, flow_noise]
    pub flow_noise: f32,
    /// Per-tick pressure chaos range while pouring
    pub chaos_min: f32,
    pub chaos_max: f32,
    /// Foam added per pouring tick
    pub pour_foam_step: f32,
    /// Foam stops growing from agitation at this height
    pub pour_foam_cap: f32,
    /// Base pressure-to-foam transfer per settling tick
    pub rise_speed: f32,
    /// Upper bound of the rise jitter, drawn from [0, rise_jitter]
    pub rise_jitter: f32,
    /// Foam lost per settling tick once pressure is spent
    pub foam_decay: f32,
    /// Upper bound of the decay jitter
    pub decay_jitter: f32,
    /// Foam never decays below this while settling (coffee crema)
    pub foam_floor: f32,
}

impl DrinkConfig {
    /// Fizzy: slower fill, big post-pour rise
    pub fn soda() -> Self {
        Self {
            tolerance: 7.0,
            fill_speed: 0.55,
            foam_rate: 0.22,
            settling_time_ms: 1400,
            score_multiplier: 1.5,
            perfect_bonus: 399.0,
            flow_noise: 0.04,
            chaos_min: -0.02,
            chaos_max: 0.08,
            pour_foam_step: 0.5,
            pour_foam_cap: 8.0,
            rise_speed: 0.4,
            rise_jitter: 0.1,
            foam_decay: 0.05,
            decay_jitter: 0.02,
            foam_floor: 0.0,
        }
    }

    /// Flat: fast fill, stops when you stop
    pub fn coffee() -> Self {
        Self {
            tolerance: 3.0,
            fill_speed: 0.85,
            foam_rate: 0.0,
            settling_time_ms: 800,
            score_multiplier: 1.0,
            perfect_bonus: 99.0,
            flow_noise: 0.04,
            chaos_min: 0.0,
            chaos_max: 0.0,
            pour_foam_step: 0.5,
            pour_foam_cap: 5.0,
            rise_speed: 0.0,
            rise_jitter: 0.0,
            foam_decay: 0.05,
            decay_jitter: 0.0,
            foam_floor: 2.0,
        }
    }

    fn validate(&self, drink: DrinkType) -> Result<(), TuningError> {
        let positive = [
            ("tolerance", self.tolerance),
            ("fill_speed", self.fill_speed),
            ("score_multiplier", self.score_multiplier),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(TuningError::NotPositive { drink, field, value });
            }
        }
        if self.chaos_min > self.chaos_max {
            return Err(TuningError::OutOfRange {
                field: "chaos_min",
                lo: f32::MIN,
                hi: self.chaos_max,
                value: self.chaos_min,
            });
        }
        let non_negative = [
            ("flow_noise", self.flow_noise),
            ("pour_foam_step", self.pour_foam_step),
            ("pour_foam_cap", self.pour_foam_cap),
            ("rise_speed", self.rise_speed),
            ("rise_jitter", self.rise_jitter),
            ("foam_decay", self.foam_decay),
            ("decay_jitter", self.decay_jitter),
            ("foam_floor", self.foam_floor),
        ];
        for (field, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(TuningError::OutOfRange {
                    field,
                    lo: 0.0,
                    hi: f32::MAX,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub soda: DrinkConfig,
    pub coffee: DrinkConfig,

    // === Rounds ===
    /// Target line range (percent of glass)
    pub target_min: f32,
    pub target_max: f32,
    /// Probability that the next round is soda
    pub soda_chance: f32,
    /// Settle window jitter, applied as ± this many ms
    pub settle_jitter_ms: u32,
    /// Feedback hold after a judged round
    pub evaluate_delay_ms: u32,
    /// Feedback hold after a spill
    pub spill_delay_ms: u32,

    // === Session ===
    /// Session length in seconds
    pub session_seconds: u32,

    // === Scoring ===
    /// 1% of glass height ≈ this many ml
    pub ml_per_percent: f32,
    /// Extra factor on top of the base volume for a perfect pour
    pub perfect_multiplier: f32,
    /// Flat reward for landing in the surface tension band
    pub surface_tension_bonus: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            soda: DrinkConfig::soda(),
            coffee: DrinkConfig::coffee(),

            target_min: 60.0,
            target_max: 85.0,
            soda_chance: 0.7,
            settle_jitter_ms: 200,
            evaluate_delay_ms: 1200,
            spill_delay_ms: 1500,

            session_seconds: 60,

            ml_per_percent: 6.0,
            perfect_multiplier: 1.2,
            surface_tension_bonus: 30.0,
        }
    }
}

impl Tuning {
    /// Config for the given drink
    pub fn drink(&self, drink: DrinkType) -> &DrinkConfig {
        match drink {
            DrinkType::Soda => &self.soda,
            DrinkType::Coffee => &self.coffee,
        }
    }

    /// Parse and validate a JSON tuning blob
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject tables that would break the simulation's invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        self.soda.validate(DrinkType::Soda)?;
        self.coffee.validate(DrinkType::Coffee)?;
        // Soda pressure must drain or the glass never settles
        if self.soda.rise_speed <= 0.0 {
            return Err(TuningError::NotPositive {
                drink: DrinkType::Soda,
                field: "rise_speed",
                value: self.soda.rise_speed,
            });
        }

        if self.target_min > self.target_max {
            return Err(TuningError::InvertedTargetRange {
                min: self.target_min,
                max: self.target_max,
            });
        }
        if !(0.0..=1.0).contains(&self.soda_chance) {
            return Err(TuningError::OutOfRange {
                field: "soda_chance",
                lo: 0.0,
                hi: 1.0,
                value: self.soda_chance,
            });
        }
        if self.session_seconds == 0 {
            return Err(TuningError::OutOfRange {
                field: "session_seconds",
                lo: 1.0,
                hi: f32::MAX,
                value: 0.0,
            });
        }
        Ok(())
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "pour_master_tuning";

    /// Load tuning from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Save tuning to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            let _ = storage.set_item(Self::STORAGE_KEY, &self.to_json());
            log::info!("Tuning saved");
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
