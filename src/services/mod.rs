//! Business services layer.
//!
//! This module contains the core services that implement the scheduler,
//! coordinating between domain types, storage, and the send provider.
//!
//! # Architecture
//!
//! ```text
//! Caller (RPC/HTTP surface of the surrounding app)
//!          |
//!          v
//!   DispatchService  -- admission control, the only mutating surface
//!     |        \
//!     v         v
//! AccountService  SendProvider / LeadStore (collaborators)
//!     |
//!     v
//! AccountStore (storage)
//! ```
//!
//! # Services Overview
//!
//! - [`AccountService`]: the account registry; classifies warmup state on
//!   every read and owns counter bookkeeping
//! - [`CapacitySnapshot`]: pure aggregation of a pool into per-status
//!   totals, the ready set, and operator advisories
//! - [`plan_distribution`]: pure greedy allocation of a requested volume
//! - [`DispatchService`]: batch admission, provider dispatch, and
//!   post-dispatch persistence

mod account_service;
mod capacity;
mod distribution;
mod dispatch_service;

pub use account_service::{
    AccountError, AccountFilter, AccountResult, AccountService, AccountStore,
    RegisterAccountRequest, StoreError, StoreResult,
};
pub use capacity::{CapacitySnapshot, ReadyAccount, StatusBreakdown};
pub use dispatch_service::{
    AdmissionOptions, AdmissionReceipt, CounterSource, DispatchError, DispatchResult,
    DispatchService, LeadFilter, LeadStore,
};
pub use distribution::{plan_distribution, Allocation, DistributionError, DistributionPlan};
