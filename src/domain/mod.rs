//! Domain layer types for the send-capacity scheduler.
//!
//! This module contains the core domain types used throughout the crate:
//! sending accounts, the warmup lifecycle, leads, and identifier newtypes.

mod account;
mod lead;
mod lifecycle;
mod types;

pub use account::{OverrideKind, SendState, SendStatus, SenderAccount};
pub use lead::{Lead, LeadStatus};
pub use lifecycle::{WarmupPhase, WarmupSchedule};
pub use types::{AccountId, AgentId, LeadId, MarketId};
