//! HTTP route handlers.

pub mod app_usage;
pub mod blocked_apps;
pub mod health;
