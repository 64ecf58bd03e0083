//! External provider implementations.
//!
//! - [`esp`] - Upstream email service providers that deliver admitted batches.

pub mod esp;
