//! Proxy pool core
//!
//! This module provides:
//! - The proxy catalog over the backing store
//! - Success/failure tracking with threshold eviction
//! - Random, smart and sequential selection strategies
//! - Endpoint formatting
//! - The `ProxyManager` composing all of the above

pub mod catalog;
pub mod format;
pub mod health;
pub mod manager;
pub mod rotation;

pub use catalog::ProxyCatalog;
pub use format::format_proxy;
pub use health::{FailureOutcome, HealthTracker};
pub use manager::ProxyManager;
pub use rotation::{ProxySelector, SelectionEngine, SelectionStrategy};
