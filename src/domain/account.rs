//! Sending account domain types.
//!
//! A [`SenderAccount`] is a single sending identity (one mailbox/domain
//! pair) subject to a provider-imposed daily volume cap that grows through
//! the warmup lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::{WarmupPhase, WarmupSchedule};
use super::{AccountId, AgentId, MarketId};

/// Sending status of an account, as exposed at the API boundary.
///
/// `Warmup` through `Active` are derived from account age;
/// `Paused` and `Suspended` are operator/exogenous overrides that take
/// precedence over the derived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    /// Initial no-send period after registration.
    Warmup,
    /// Restricted capacity.
    Limited,
    /// Ramping toward full capacity.
    Ramping,
    /// Full configured capacity.
    Active,
    /// Operator paused the account.
    Paused,
    /// Provider or operator suspended the account (bounce rate, abuse).
    Suspended,
}

impl SendStatus {
    /// Whether this status permits outbound sends at all.
    pub fn is_sendable(self) -> bool {
        matches!(self, Self::Limited | Self::Ramping | Self::Active)
    }

    /// Database/API string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Limited => "limited",
            Self::Ramping => "ramping",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Suspended => "suspended",
        }
    }

    /// Parses the database/API string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warmup" => Some(Self::Warmup),
            "limited" => Some(Self::Limited),
            "ramping" => Some(Self::Ramping),
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

impl From<WarmupPhase> for SendStatus {
    fn from(phase: WarmupPhase) -> Self {
        match phase {
            WarmupPhase::Warmup => Self::Warmup,
            WarmupPhase::Limited => Self::Limited,
            WarmupPhase::Ramping => Self::Ramping,
            WarmupPhase::Active => Self::Active,
        }
    }
}

/// Why an account's derived lifecycle state is being overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    /// Operator paused the account.
    Paused,
    /// Exogenous suspension signal.
    Suspended,
    /// Account was deactivated (`is_active == false`).
    Deactivated,
}

/// Internal sending state of an account.
///
/// Overrides always win over the age-derived phase; representing the two
/// arms as a tagged union keeps that precedence structural instead of a
/// scattered set of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// Age-based derivation is skipped entirely.
    Override(OverrideKind),
    /// Phase derived from days since warmup start.
    Derived(WarmupPhase),
}

/// A single sending identity (mailbox + domain) and its daily quota state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderAccount {
    /// Unique identifier for this account.
    pub id: AccountId,
    /// Mailbox address sends originate from.
    pub email: String,
    /// Sending domain the mailbox belongs to.
    pub domain: String,
    /// Whether the account participates in sending at all.
    pub is_active: bool,
    /// Current sending status (derived, or an operator override).
    pub status: SendStatus,
    /// Operator-configured daily cap at full warmup.
    pub base_daily_limit: u32,
    /// Effective cap for today, re-derived from status on every read.
    pub current_daily_limit: u32,
    /// Sends recorded today; reset at the day boundary by a scheduled job.
    pub sent_today: u32,
    /// When the warmup lifecycle started for this account.
    pub warmup_started_at: DateTime<Utc>,
    /// Optional market scope.
    pub market_id: Option<MarketId>,
    /// Optional agent scope.
    pub agent_id: Option<AgentId>,
}

impl SenderAccount {
    /// Remaining quota for today, clamped at zero.
    pub fn remaining(&self) -> u32 {
        self.current_daily_limit.saturating_sub(self.sent_today)
    }

    /// Whole days elapsed since warmup start, clamped at zero.
    pub fn warmup_age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.warmup_started_at).num_days().max(0)
    }

    /// Resolves the internal sending state, overrides first.
    pub fn send_state(&self, schedule: &WarmupSchedule, now: DateTime<Utc>) -> SendState {
        if !self.is_active {
            return SendState::Override(OverrideKind::Deactivated);
        }
        match self.status {
            SendStatus::Paused => SendState::Override(OverrideKind::Paused),
            SendStatus::Suspended => SendState::Override(OverrideKind::Suspended),
            _ => SendState::Derived(schedule.phase_for_age(self.warmup_age_days(now))),
        }
    }

    /// Re-derives `status` and `current_daily_limit` from elapsed time.
    ///
    /// Overridden accounts keep their stored status and derive a zero limit,
    /// so they can never enter the ready set regardless of age.
    pub fn refresh(&mut self, schedule: &WarmupSchedule, now: DateTime<Utc>) {
        match self.send_state(schedule, now) {
            SendState::Override(_) => {
                self.current_daily_limit = 0;
            }
            SendState::Derived(phase) => {
                self.status = SendStatus::from(phase);
                self.current_daily_limit = schedule.daily_limit(self.base_daily_limit, phase);
            }
        }
    }
}
