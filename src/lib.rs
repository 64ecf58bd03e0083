//! dripline - send-capacity scheduling for pools of warming outreach mailboxes
//!
//! This crate tracks a pool of email-sending accounts, each subject to a
//! provider-imposed daily cap that grows through a multi-week warmup
//! lifecycle, and admits and distributes batches of outbound leads across
//! that pool without exceeding any account's remaining quota for the day.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;

pub use domain::{Lead, LeadStatus, SendStatus, SenderAccount, WarmupPhase, WarmupSchedule};
pub use services::{
    AccountFilter, AccountService, AdmissionOptions, AdmissionReceipt, CapacitySnapshot,
    DispatchService, DistributionPlan,
};
