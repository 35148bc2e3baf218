//! Domain layer for the App Usage backend.
//!
//! This crate contains:
//! - Domain models (UsageRecord, AggregateTotals, BlockedApps)
//! - Source capability traits and the snapshot-backed implementation
//! - The usage aggregation pass and refresh coordination
//! - Domain error types

pub mod models;
pub mod services;
