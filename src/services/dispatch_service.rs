//! Batch admission control and dispatch.
//!
//! The [`DispatchService`] is the entry point used before handing a batch of
//! leads to the upstream send provider: it loads the account pool in scope,
//! snapshots remaining capacity, admits or rejects the batch, dispatches one
//! batched provider call, then persists per-account counters and lead status
//! updates. Admission is best-effort: capacity is checked against a snapshot
//! and counters are updated after dispatch, so two concurrent batches can
//! jointly overshoot a soft limit by at most one batch. Counters themselves
//! are safe; the store's increment is a single atomic add.
//!
//! A batch is terminal after one pass: rejected, dispatched, or failed.
//! Retry policy belongs to the caller.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::account_service::{
    AccountError, AccountFilter, AccountService, AccountStore, StoreError, StoreResult,
};
use super::capacity::CapacitySnapshot;
use super::distribution::{plan_distribution, DistributionError, DistributionPlan};
use crate::domain::{AgentId, Lead, LeadId, LeadStatus, MarketId};
use crate::providers::esp::{AccountUsage, EspError, SendProvider};

/// Errors that can occur while admitting and dispatching a batch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Business-rule rejection: the batch does not fit today's capacity.
    ///
    /// Not a system fault; carries what the caller needs to retry with an
    /// adjusted count or proceed with force-send.
    #[error("capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Leads the caller asked to send.
        requested: u32,
        /// Remaining capacity in the requested scope.
        available: u64,
        /// Actionable next step for the caller.
        recommendation: String,
    },

    /// Registry failure while loading or updating accounts.
    #[error(transparent)]
    Registry(#[from] AccountError),

    /// Lead store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The provider rejected or failed the batch after admission.
    #[error(transparent)]
    Provider(#[from] EspError),

    /// Planning rejected the request.
    #[error(transparent)]
    Planning(#[from] DistributionError),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Filter for lead listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    /// Restrict to a market.
    pub market_id: Option<MarketId>,
    /// Restrict to an agent.
    pub agent_id: Option<AgentId>,
    /// Restrict to a pipeline status.
    pub status: Option<LeadStatus>,
    /// Cap the number of returned leads.
    pub limit: Option<u32>,
}

/// Storage abstraction for the external lead store.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Lists leads matching a filter.
    async fn list_leads(&self, filter: &LeadFilter) -> StoreResult<Vec<Lead>>;

    /// Updates the status of a set of leads.
    async fn update_status(&self, lead_ids: &[LeadId], status: LeadStatus) -> StoreResult<()>;

    /// Appends an activity/audit note to a lead.
    async fn append_activity(&self, lead_id: &LeadId, note: &str) -> StoreResult<()>;
}

/// Options controlling batch admission.
#[derive(Debug, Clone)]
pub struct AdmissionOptions {
    /// Whether to gate the batch on remaining capacity.
    pub check_capacity: bool,
    /// Dispatch even when the batch exceeds capacity; the caller accepts
    /// the overshoot risk.
    pub force_send: bool,
}

impl Default for AdmissionOptions {
    fn default() -> Self {
        Self {
            check_capacity: true,
            force_send: false,
        }
    }
}

impl AdmissionOptions {
    /// Default options: capacity checked, no force.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the capacity gate entirely.
    pub fn unchecked(mut self) -> Self {
        self.check_capacity = false;
        self
    }

    /// Dispatches regardless of capacity.
    pub fn force(mut self) -> Self {
        self.force_send = true;
        self
    }
}

/// Where the recorded per-account counters came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterSource {
    /// The provider reported per-account usage; counters are exact.
    Reported,
    /// Counters were estimated from the distribution plan, capped by the
    /// provider's reported upload total.
    Estimated,
}

/// Outcome of a successfully dispatched batch.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionReceipt {
    /// The advisory plan computed at admission time.
    pub plan: DistributionPlan,
    /// Leads the provider accepted.
    pub uploaded: u32,
    /// Leads the provider dropped.
    pub skipped: u32,
    /// Precision of the recorded counters.
    pub counter_source: CounterSource,
}

/// Admission controller over an account registry, a lead store, and an
/// upstream send provider.
pub struct DispatchService<A: AccountStore, L: LeadStore, P: SendProvider> {
    accounts: AccountService<A>,
    leads: L,
    provider: P,
}

impl<A: AccountStore, L: LeadStore, P: SendProvider> DispatchService<A, L, P> {
    /// Creates a dispatch service.
    pub fn new(accounts: AccountService<A>, leads: L, provider: P) -> Self {
        Self {
            accounts,
            leads,
            provider,
        }
    }

    /// The underlying account registry.
    pub fn accounts(&self) -> &AccountService<A> {
        &self.accounts
    }

    /// Read-only capacity snapshot for a market/agent scope.
    pub async fn capacity(&self, filter: &AccountFilter) -> DispatchResult<CapacitySnapshot> {
        let accounts = self.accounts.list(&scoped(filter)).await?;
        Ok(CapacitySnapshot::build(&accounts, Utc::now()))
    }

    /// Read-only distribution preview: "can I send N leads today?".
    pub async fn plan(
        &self,
        requested: u32,
        filter: &AccountFilter,
    ) -> DispatchResult<DistributionPlan> {
        let snapshot = self.capacity(filter).await?;
        Ok(plan_distribution(requested, &snapshot.ready_accounts)?)
    }

    /// Admits and dispatches a batch of up to `lead_count` new leads.
    ///
    /// Admission is all-or-nothing: a batch larger than the scope's
    /// remaining capacity is rejected outright with
    /// [`DispatchError::CapacityExceeded`] before any lead is touched.
    /// Callers wanting a partial batch should consult [`plan`](Self::plan)
    /// first and resubmit with the admissible count.
    pub async fn admit_batch(
        &self,
        lead_count: u32,
        filter: &AccountFilter,
        options: &AdmissionOptions,
    ) -> DispatchResult<AdmissionReceipt> {
        if lead_count == 0 {
            return Err(DispatchError::InvalidRequest(
                "batch size must be greater than zero".to_string(),
            ));
        }

        let accounts = self.accounts.list(&scoped(filter)).await?;
        let snapshot = CapacitySnapshot::build(&accounts, Utc::now());

        if options.check_capacity && !options.force_send {
            let available = snapshot.total_remaining;
            if u64::from(lead_count) > available {
                let recommendation = if available == 0 {
                    "No capacity available today; wait for accounts to warm up or add more sending accounts".to_string()
                } else {
                    format!("Reduce the batch to {} leads or wait until tomorrow", available)
                };
                warn!(
                    requested = lead_count,
                    available, "rejecting batch over capacity"
                );
                return Err(DispatchError::CapacityExceeded {
                    requested: lead_count,
                    available,
                    recommendation,
                });
            }
        }

        // Advisory: the provider fans out per recipient, this subsystem's
        // obligation ends at "the batch fits aggregate capacity".
        let plan = plan_distribution(lead_count, &snapshot.ready_accounts)?;
        info!(
            requested = plan.requested,
            allocated = plan.total_allocated,
            accounts = plan.allocations.len(),
            "admitting batch: {}",
            plan.message
        );

        let leads = self
            .leads
            .list_leads(&LeadFilter {
                market_id: filter.market_id.clone(),
                agent_id: filter.agent_id.clone(),
                status: Some(LeadStatus::New),
                limit: Some(lead_count),
            })
            .await?;

        // Dispatch before counting: sends that never happened must never be
        // recorded.
        let receipt = self.provider.send_batch(&plan.allocations, &leads).await?;

        let (usage, counter_source) = match &receipt.per_account {
            Some(reported) => (reported.clone(), CounterSource::Reported),
            None => (
                estimate_usage(&plan, receipt.uploaded),
                CounterSource::Estimated,
            ),
        };
        for entry in &usage {
            if entry.sent > 0 {
                self.accounts.record_sent(&entry.account_id, entry.sent).await?;
            }
        }

        let lead_ids: Vec<LeadId> = leads.iter().map(|l| l.id.clone()).collect();
        if !lead_ids.is_empty() {
            self.leads
                .update_status(&lead_ids, LeadStatus::Contacted)
                .await?;
            let note = format!("Queued for outreach via {}", self.provider.name());
            try_join_all(
                lead_ids
                    .iter()
                    .map(|id| self.leads.append_activity(id, &note)),
            )
            .await?;
        }

        info!(
            uploaded = receipt.uploaded,
            skipped = receipt.skipped,
            source = ?counter_source,
            "batch dispatched"
        );

        Ok(AdmissionReceipt {
            plan,
            uploaded: receipt.uploaded,
            skipped: receipt.skipped,
            counter_source,
        })
    }
}

/// Admission only ever considers active accounts.
fn scoped(filter: &AccountFilter) -> AccountFilter {
    let mut filter = filter.clone();
    filter.is_active = Some(true);
    filter
}

/// Attributes the provider's reported upload total to accounts following
/// the plan's greedy order. An estimate: used only when the provider gives
/// no per-account breakdown.
fn estimate_usage(plan: &DistributionPlan, uploaded: u32) -> Vec<AccountUsage> {
    let mut left = uploaded;
    let mut usage = Vec::new();
    for allocation in &plan.allocations {
        if left == 0 {
            break;
        }
        let take = left.min(allocation.count);
        usage.push(AccountUsage {
            account_id: allocation.account_id.clone(),
            sent: take,
        });
        left -= take;
    }
    usage
}
