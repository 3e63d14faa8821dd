//! ktform relay
//!
//! Browsers cannot read cross-origin responses from the automation webhook, so the
//! form posts to this service instead. It checks the body is JSON, forwards it
//! unchanged and mirrors the upstream status back with a small JSON envelope.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use setup::{initialize_app, routes::setup_routes};
pub use state::RelayState;
