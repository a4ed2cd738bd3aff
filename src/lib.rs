//! Ledgerly: per-user order tracking with live-synced dashboards.
//!
//! The document store and the auth provider each run as an actor behind a
//! cloneable client. A [`dashboard::Dashboard`] mirrors one user's orders and
//! their people into a watchable state and applies edits through the store.

pub mod app_system;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod routing;
pub mod store;

#[cfg(test)]
mod mock_framework;
