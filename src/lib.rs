//! Push-subscription and alert-preference core for the rate-watch client.
//!
//! Host capabilities (notification permission, push manager, durable
//! key/value storage) sit behind the traits in [`platform`]; the backend
//! behind [`services::alerts_api::AlertsBackend`]. Everything else is plain
//! tokio code so it can be driven from a browser binding, the bundled CLI,
//! or tests.

pub mod config;
pub mod error;
pub mod models;
pub mod platform;
pub mod services;

pub use services::permission_gate::PermissionGate;
pub use services::preferences::{AlertPreferences, ReconcilePhase, TestOutcome};
pub use services::subscription_manager::SubscriptionManager;
