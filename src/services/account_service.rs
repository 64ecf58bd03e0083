//! Account registry service.
//!
//! Provides a service layer for sending-account operations including:
//! - Account registration and validation
//! - Derive-on-read lifecycle classification
//! - Operator status overrides (pause, resume, suspend)
//! - Sent-counter bookkeeping and the day-boundary reset hook

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::domain::{
    AccountId, AgentId, MarketId, SendStatus, SenderAccount, WarmupSchedule,
};

/// A storage-layer failure.
///
/// Distinct from an empty result set: a store that cannot be reached
/// surfaces here and is retryable, while "no accounts" is a successful
/// empty `Vec`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query failed inside the store.
    #[error("store query failed: {0}")]
    Query(String),
}

/// Result type for raw store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Account not found.
    #[error("account not found: {0}")]
    NotFound(String),

    /// Account already exists.
    #[error("account already exists: {0}")]
    AlreadyExists(String),

    /// Invalid account configuration.
    #[error("invalid account configuration: {0}")]
    InvalidConfig(String),

    /// Storage error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for registry operations.
pub type AccountResult<T> = Result<T, AccountError>;

/// Filter for account listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilter {
    /// Restrict to a market.
    pub market_id: Option<MarketId>,
    /// Restrict to an agent.
    pub agent_id: Option<AgentId>,
    /// Restrict to a stored status.
    pub status: Option<SendStatus>,
    /// Restrict to active or inactive accounts.
    pub is_active: Option<bool>,
}

impl AccountFilter {
    /// Creates an empty filter matching all accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to a market.
    pub fn market(mut self, id: impl Into<MarketId>) -> Self {
        self.market_id = Some(id.into());
        self
    }

    /// Restricts the filter to an agent.
    pub fn agent(mut self, id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(id.into());
        self
    }

    /// Restricts the filter to a stored status.
    pub fn status(mut self, status: SendStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the filter to active accounts.
    pub fn active_only(mut self) -> Self {
        self.is_active = Some(true);
        self
    }
}

/// Storage abstraction for sending accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Lists accounts matching a filter.
    async fn list_accounts(&self, filter: &AccountFilter) -> StoreResult<Vec<SenderAccount>>;

    /// Gets an account by ID.
    async fn get_account(&self, id: &AccountId) -> StoreResult<Option<SenderAccount>>;

    /// Gets an account by mailbox address.
    async fn get_by_email(&self, email: &str) -> StoreResult<Option<SenderAccount>>;

    /// Inserts a new account.
    async fn insert_account(&self, account: &SenderAccount) -> StoreResult<()>;

    /// Overwrites an account's stored status.
    async fn set_status(&self, id: &AccountId, status: SendStatus) -> StoreResult<()>;

    /// Activates or deactivates an account.
    async fn set_active(&self, id: &AccountId, active: bool) -> StoreResult<()>;

    /// Adds `n` to the account's sent-today counter.
    ///
    /// Implementations MUST perform a single storage-side atomic add, not a
    /// read-modify-write in application code; concurrent admissions may
    /// overshoot the soft limit by one in-flight batch but must never
    /// corrupt the counter.
    async fn increment_sent(&self, id: &AccountId, n: u32) -> StoreResult<()>;

    /// Zeroes every sent-today counter, returning the number of rows touched.
    async fn reset_sent_counters(&self) -> StoreResult<u32>;
}

/// Request to register a new sending account.
#[derive(Debug, Clone)]
pub struct RegisterAccountRequest {
    /// Mailbox address.
    pub email: String,
    /// Sending domain.
    pub domain: String,
    /// Daily cap once fully warmed.
    pub base_daily_limit: u32,
    /// Optional market scope.
    pub market_id: Option<MarketId>,
    /// Optional agent scope.
    pub agent_id: Option<AgentId>,
}

impl RegisterAccountRequest {
    /// Creates a request with the mailbox's domain taken from the address.
    pub fn new(email: impl Into<String>, base_daily_limit: u32) -> Self {
        let email = email.into();
        let domain = email.split('@').nth(1).unwrap_or_default().to_string();
        Self {
            email,
            domain,
            base_daily_limit,
            market_id: None,
            agent_id: None,
        }
    }

    /// Scopes the account to a market.
    pub fn market(mut self, id: impl Into<MarketId>) -> Self {
        self.market_id = Some(id.into());
        self
    }

    /// Scopes the account to an agent.
    pub fn agent(mut self, id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(id.into());
        self
    }
}

/// Service for managing the pool of sending accounts.
///
/// Classification is applied on every read: status and the effective daily
/// limit are re-derived from elapsed warmup time before an account leaves
/// this service, so callers always see current capacity without a cron
/// keeping stored rows fresh.
pub struct AccountService<S: AccountStore> {
    store: S,
    schedule: WarmupSchedule,
}

impl<S: AccountStore> AccountService<S> {
    /// Creates a registry over a store with the default warmup schedule.
    pub fn new(store: S) -> Self {
        Self::with_schedule(store, WarmupSchedule::default())
    }

    /// Creates a registry with an operator-tuned warmup schedule.
    pub fn with_schedule(store: S, schedule: WarmupSchedule) -> Self {
        Self { store, schedule }
    }

    /// The warmup schedule in effect.
    pub fn schedule(&self) -> &WarmupSchedule {
        &self.schedule
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new account, starting its warmup lifecycle now.
    pub async fn register(&self, request: RegisterAccountRequest) -> AccountResult<SenderAccount> {
        if !is_valid_email(&request.email) {
            return Err(AccountError::InvalidConfig(format!(
                "invalid mailbox address: {}",
                request.email
            )));
        }
        if request.domain.is_empty() {
            return Err(AccountError::InvalidConfig(
                "sending domain is required".to_string(),
            ));
        }
        if request.base_daily_limit == 0 {
            return Err(AccountError::InvalidConfig(
                "base daily limit must be greater than zero".to_string(),
            ));
        }

        if self.store.get_by_email(&request.email).await?.is_some() {
            return Err(AccountError::AlreadyExists(request.email));
        }

        let now = Utc::now();
        let mut account = SenderAccount {
            id: AccountId::from(format!("account-{}", uuid::Uuid::new_v4())),
            email: request.email,
            domain: request.domain,
            is_active: true,
            status: SendStatus::Warmup,
            base_daily_limit: request.base_daily_limit,
            current_daily_limit: 0,
            sent_today: 0,
            warmup_started_at: now,
            market_id: request.market_id,
            agent_id: request.agent_id,
        };
        account.refresh(&self.schedule, now);

        self.store.insert_account(&account).await?;
        info!(account = %account.id, email = %account.email, "registered sending account");

        Ok(account)
    }

    /// Lists accounts with freshly derived status and limits.
    pub async fn list(&self, filter: &AccountFilter) -> AccountResult<Vec<SenderAccount>> {
        let now = Utc::now();
        let mut accounts = self.store.list_accounts(filter).await?;
        for account in &mut accounts {
            account.refresh(&self.schedule, now);
        }
        Ok(accounts)
    }

    /// Gets one account with freshly derived status and limits.
    pub async fn get(&self, id: &AccountId) -> AccountResult<SenderAccount> {
        let mut account = self
            .store
            .get_account(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        account.refresh(&self.schedule, Utc::now());
        Ok(account)
    }

    /// Pauses an account. An operator decision, not a computed one.
    pub async fn pause(&self, id: &AccountId) -> AccountResult<()> {
        self.require(id).await?;
        self.store.set_status(id, SendStatus::Paused).await?;
        info!(account = %id, "paused sending account");
        Ok(())
    }

    /// Clears a pause; status is re-derived from age on the next read.
    pub async fn resume(&self, id: &AccountId) -> AccountResult<()> {
        let account = self.require(id).await?;
        let phase = self
            .schedule
            .phase_for_age(account.warmup_age_days(Utc::now()));
        self.store.set_status(id, SendStatus::from(phase)).await?;
        info!(account = %id, "resumed sending account");
        Ok(())
    }

    /// Records an exogenous suspension signal.
    ///
    /// The registry accepts suspensions but never computes them; bounce-rate
    /// detection lives upstream.
    pub async fn suspend(&self, id: &AccountId) -> AccountResult<()> {
        self.require(id).await?;
        self.store.set_status(id, SendStatus::Suspended).await?;
        info!(account = %id, "suspended sending account");
        Ok(())
    }

    /// Deactivates an account without deleting it.
    pub async fn deactivate(&self, id: &AccountId) -> AccountResult<()> {
        self.require(id).await?;
        self.store.set_active(id, false).await?;
        Ok(())
    }

    /// Records `n` sends against an account via the store's atomic add.
    pub async fn record_sent(&self, id: &AccountId, n: u32) -> AccountResult<()> {
        if n == 0 {
            return Ok(());
        }
        self.store.increment_sent(id, n).await?;
        Ok(())
    }

    /// Zeroes every sent-today counter.
    ///
    /// Intended to be driven by an external day-boundary scheduler; nothing
    /// in this crate invokes it on a timer.
    pub async fn reset_daily_counters(&self) -> AccountResult<u32> {
        let touched = self.store.reset_sent_counters().await?;
        info!(accounts = touched, "reset daily sent counters");
        Ok(touched)
    }

    /// Days until the account's next lifecycle phase, `None` once active
    /// or while overridden.
    pub fn days_until_next_phase(
        &self,
        account: &SenderAccount,
        now: DateTime<Utc>,
    ) -> Option<i64> {
        use crate::domain::SendState;
        match account.send_state(&self.schedule, now) {
            SendState::Override(_) => None,
            SendState::Derived(_) => self
                .schedule
                .days_until_next_phase(account.warmup_age_days(now)),
        }
    }

    async fn require(&self, id: &AccountId) -> AccountResult<SenderAccount> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }
}

/// Validates a mailbox address format.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let local = parts[0];
    let domain = parts[1];

    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}
