//! Scheduler settings and configuration types.
//!
//! Settings are persisted to the platform config directory as JSON and
//! loaded at startup.

use serde::{Deserialize, Serialize};

use crate::domain::WarmupSchedule;

/// Top-level scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Warmup lifecycle tuning.
    pub warmup: WarmupSettings,
    /// Upstream send provider configuration.
    pub provider: EspSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warmup: WarmupSettings::default(),
            provider: EspSettings::default(),
        }
    }
}

/// Warmup lifecycle thresholds and multipliers.
///
/// Mirrors [`WarmupSchedule`]; kept separate so the persisted format can
/// evolve independently of the domain type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupSettings {
    /// Days before an account leaves the no-send warmup phase.
    pub warmup_days: i64,
    /// Days before an account leaves the limited phase.
    pub limited_days: i64,
    /// Days before an account reaches full capacity.
    pub ramping_days: i64,
    /// Fraction of the base limit available while limited.
    pub limited_multiplier: f64,
    /// Fraction of the base limit available while ramping.
    pub ramping_multiplier: f64,
}

impl Default for WarmupSettings {
    fn default() -> Self {
        let schedule = WarmupSchedule::default();
        Self {
            warmup_days: schedule.warmup_days,
            limited_days: schedule.limited_days,
            ramping_days: schedule.ramping_days,
            limited_multiplier: schedule.limited_multiplier,
            ramping_multiplier: schedule.ramping_multiplier,
        }
    }
}

impl WarmupSettings {
    /// Converts into the domain schedule.
    pub fn to_schedule(&self) -> WarmupSchedule {
        WarmupSchedule {
            warmup_days: self.warmup_days,
            limited_days: self.limited_days,
            ramping_days: self.ramping_days,
            limited_multiplier: self.limited_multiplier,
            ramping_multiplier: self.ramping_multiplier,
        }
    }
}

/// Upstream send provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EspSettings {
    /// Display name used in logs and activity notes.
    pub name: String,
    /// Base URL of the provider's REST API.
    pub base_url: String,
    /// API key. Left empty here when supplied via environment.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EspSettings {
    fn default() -> Self {
        Self {
            name: "esp".to_string(),
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}
