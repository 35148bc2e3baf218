//! Shared utilities and common types for the App Usage backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Human-readable formatting of byte counts and durations
//! - Common validation logic

pub mod format;
pub mod validation;
