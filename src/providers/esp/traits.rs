//! Send provider trait definition.
//!
//! This module defines the [`SendProvider`] trait which abstracts over
//! upstream email service providers. The scheduler's obligation ends at
//! admitting a batch; the provider owns per-recipient fan-out, sequencing,
//! and deliverability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, Lead};
use crate::services::Allocation;

/// Result type alias for send provider operations.
pub type Result<T> = std::result::Result<T, EspError>;

/// Errors that can occur during send provider operations.
#[derive(Debug, thiserror::Error)]
pub enum EspError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider-side failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Per-account usage as reported back by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUsage {
    /// Account the sends were attributed to.
    pub account_id: AccountId,
    /// Sends the provider attributed to it.
    pub sent: u32,
}

/// Outcome of a batch upload.
///
/// Providers commonly deduplicate or drop leads on their side, so
/// `uploaded` can be lower than the batch size. The per-account breakdown
/// is optional; not every provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Leads the provider accepted.
    pub uploaded: u32,
    /// Leads the provider dropped (duplicates, invalid addresses).
    pub skipped: u32,
    /// Per-account attribution, when the provider reports it.
    pub per_account: Option<Vec<AccountUsage>>,
}

/// Trait for upstream send provider implementations.
///
/// A single call hands over the whole admitted batch together with the
/// advisory per-account allocations; delivery happens upstream.
#[async_trait]
pub trait SendProvider: Send + Sync {
    /// Human-readable provider name for logs.
    fn name(&self) -> &str;

    /// Uploads one admitted batch for delivery.
    ///
    /// # Errors
    ///
    /// Returns an [`EspError`] when the provider rejects or fails the batch;
    /// the scheduler treats that as terminal for the batch and records no
    /// sends.
    async fn send_batch(&self, allocations: &[Allocation], leads: &[Lead]) -> Result<BatchReceipt>;
}
