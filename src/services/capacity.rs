//! Capacity aggregation across a pool of sending accounts.
//!
//! Builds a point-in-time [`CapacitySnapshot`] from a set of already
//! classified accounts: per-status totals, the ready set ordered by
//! remaining quota, and advisory warnings/recommendations for operators.
//! Everything here is pure and side-effect-free, so snapshots can be taken
//! concurrently with sends in flight.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AccountId, SendStatus, SenderAccount};

/// Aggregate numbers for one status group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    /// Accounts in this status.
    pub count: u32,
    /// Sum of current daily limits.
    pub capacity: u64,
    /// Sum of sends recorded today.
    pub used: u64,
}

/// An account eligible for sending, with its computed headroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadyAccount {
    /// Account identifier.
    pub id: AccountId,
    /// Mailbox address.
    pub email: String,
    /// Status at snapshot time.
    pub status: SendStatus,
    /// Effective daily limit.
    pub limit: u32,
    /// Sends recorded today.
    pub sent: u32,
    /// Quota left today.
    pub remaining: u32,
}

/// Point-in-time read-only aggregate over a filtered account set.
#[derive(Debug, Clone, Serialize)]
pub struct CapacitySnapshot {
    /// When the snapshot was computed.
    pub taken_at: DateTime<Utc>,
    /// Per-status aggregates.
    pub by_status: BTreeMap<SendStatus, StatusBreakdown>,
    /// Accounts able to absorb load, sorted by remaining quota descending.
    pub ready_accounts: Vec<ReadyAccount>,
    /// Sum of current daily limits over all accounts.
    pub total_capacity: u64,
    /// Sum of sends recorded today over all accounts.
    pub total_used: u64,
    /// Sum of remaining quota over ready accounts only.
    pub total_remaining: u64,
    /// Advisory, non-fatal conditions.
    pub warnings: Vec<String>,
    /// Operator suggestions.
    pub recommendations: Vec<String>,
}

impl CapacitySnapshot {
    /// Aggregates a set of classified accounts into a snapshot.
    ///
    /// Accounts must already carry a freshly derived `current_daily_limit`;
    /// the registry guarantees that on every read.
    pub fn build(accounts: &[SenderAccount], now: DateTime<Utc>) -> Self {
        let mut by_status: BTreeMap<SendStatus, StatusBreakdown> = BTreeMap::new();
        let mut ready_accounts = Vec::new();

        for account in accounts {
            let entry = by_status.entry(account.status).or_default();
            entry.count += 1;
            entry.capacity += u64::from(account.current_daily_limit);
            entry.used += u64::from(account.sent_today);

            let remaining = account.remaining();
            if account.status.is_sendable() && remaining > 0 {
                ready_accounts.push(ReadyAccount {
                    id: account.id.clone(),
                    email: account.email.clone(),
                    status: account.status,
                    limit: account.current_daily_limit,
                    sent: account.sent_today,
                    remaining,
                });
            }
        }

        // Accounts with the most headroom absorb load first; stable sort
        // keeps input order on ties.
        ready_accounts.sort_by(|a, b| b.remaining.cmp(&a.remaining));

        let total_capacity: u64 = by_status.values().map(|b| b.capacity).sum();
        let total_used: u64 = by_status.values().map(|b| b.used).sum();
        let total_remaining: u64 = ready_accounts.iter().map(|a| u64::from(a.remaining)).sum();

        let count_of = |status: SendStatus| by_status.get(&status).map_or(0, |b| b.count);
        let warmup_count = count_of(SendStatus::Warmup);
        let suspended_count = count_of(SendStatus::Suspended);
        let active_count = count_of(SendStatus::Active);

        let mut warnings = Vec::new();
        if warmup_count > 0 {
            warnings.push(format!("{} account(s) still warming up", warmup_count));
        }
        if suspended_count > 0 {
            warnings.push(format!(
                "{} account(s) suspended - check bounce rates",
                suspended_count
            ));
        }
        if total_remaining == 0 && total_capacity > 0 {
            warnings.push("Daily capacity exhausted - wait until tomorrow".to_string());
        }
        if ready_accounts.is_empty() {
            warnings.push("No accounts ready for sending".to_string());
        }

        let mut recommendations = Vec::new();
        if total_capacity < 100 {
            recommendations
                .push("Add more sending domains to increase daily capacity".to_string());
        }
        if warmup_count > active_count {
            recommendations.push(
                "Most accounts are still warming up; capacity will grow over the coming weeks"
                    .to_string(),
            );
        }

        Self {
            taken_at: now,
            by_status,
            ready_accounts,
            total_capacity,
            total_used,
            total_remaining,
            warnings,
            recommendations,
        }
    }
}
