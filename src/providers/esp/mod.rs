//! Send provider implementations.
//!
//! This module contains the [`SendProvider`] trait and the HTTP client for
//! hosted ESPs. The provider receives one batched call per admitted send
//! request and fans out to individual recipients upstream.

mod http;
mod traits;

pub use http::HttpEspProvider;
pub use traits::{AccountUsage, BatchReceipt, EspError, Result, SendProvider};
