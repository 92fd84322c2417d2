//! Proxy pool
//!
//! A pool of upstream proxies kept in a shared key-value store.
//!
//! ## Features
//!
//! - Random, smart (success-ratio) and sequential selection strategies
//! - Per-proxy success/failure counters with threshold eviction
//! - Provisioning from the Webshare proxy list API
//! - In-memory and PostgreSQL backing stores
//! - Admin HTTP API and background pool replenishment

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod proxy;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{PoolError, Result};
pub use proxy::{ProxyManager, SelectionStrategy};
