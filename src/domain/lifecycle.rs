//! Warmup lifecycle classification.
//!
//! New sending accounts cannot send at full volume immediately; mail
//! providers restrict them while sender reputation builds. This module maps
//! an account's age since warmup start to a phase and a capacity multiplier.
//! The mapping is pure and total: every non-negative age resolves to exactly
//! one phase.

use serde::{Deserialize, Serialize};

/// Age-derived warmup phase of a sending account.
///
/// Phases form a total order and only move forward as the account ages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmupPhase {
    /// Initial period, no outbound sends.
    Warmup,
    /// Some capacity, heavily restricted.
    Limited,
    /// Ramping toward full capacity.
    Ramping,
    /// Full configured capacity.
    Active,
}

/// Phase thresholds and capacity multipliers.
///
/// Thresholds are days since warmup start: an account is in [`WarmupPhase::Warmup`]
/// below `warmup_days`, [`WarmupPhase::Limited`] below `limited_days`,
/// [`WarmupPhase::Ramping`] below `ramping_days`, and [`WarmupPhase::Active`]
/// from `ramping_days` on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupSchedule {
    /// Days before the account leaves the no-send warmup phase.
    pub warmup_days: i64,
    /// Days before the account leaves the limited phase.
    pub limited_days: i64,
    /// Days before the account reaches full capacity.
    pub ramping_days: i64,
    /// Fraction of the base daily limit available while limited.
    pub limited_multiplier: f64,
    /// Fraction of the base daily limit available while ramping.
    pub ramping_multiplier: f64,
}

impl Default for WarmupSchedule {
    fn default() -> Self {
        Self {
            warmup_days: 14,
            limited_days: 21,
            ramping_days: 35,
            limited_multiplier: 0.25,
            ramping_multiplier: 0.6,
        }
    }
}

impl WarmupSchedule {
    /// Classifies an account age in days into a warmup phase.
    ///
    /// Negative ages (clock skew, backdated rows) are treated as day zero.
    pub fn phase_for_age(&self, days: i64) -> WarmupPhase {
        let days = days.max(0);
        if days < self.warmup_days {
            WarmupPhase::Warmup
        } else if days < self.limited_days {
            WarmupPhase::Limited
        } else if days < self.ramping_days {
            WarmupPhase::Ramping
        } else {
            WarmupPhase::Active
        }
    }

    /// Returns the capacity multiplier for a phase.
    pub fn multiplier(&self, phase: WarmupPhase) -> f64 {
        match phase {
            WarmupPhase::Warmup => 0.0,
            WarmupPhase::Limited => self.limited_multiplier,
            WarmupPhase::Ramping => self.ramping_multiplier,
            WarmupPhase::Active => 1.0,
        }
    }

    /// Derives the effective daily limit for a phase from the configured base.
    pub fn daily_limit(&self, base_daily_limit: u32, phase: WarmupPhase) -> u32 {
        (f64::from(base_daily_limit) * self.multiplier(phase)).round() as u32
    }

    /// Days until the account enters the next phase, or `None` once active.
    pub fn days_until_next_phase(&self, days: i64) -> Option<i64> {
        let days = days.max(0);
        match self.phase_for_age(days) {
            WarmupPhase::Warmup => Some(self.warmup_days - days),
            WarmupPhase::Limited => Some(self.limited_days - days),
            WarmupPhase::Ramping => Some(self.ramping_days - days),
            WarmupPhase::Active => None,
        }
    }
}
