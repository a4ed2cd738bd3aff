//! System orchestration, startup, and shutdown logic.

pub mod ledger_system;
pub mod telemetry;

pub use ledger_system::*;
pub use telemetry::*;
