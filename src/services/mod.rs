//! Background services

pub mod replenish;

pub use replenish::{PoolReplenishHandle, PoolReplenishService};
