pub mod health;
pub mod relay;

pub use health::health_check;
pub use relay::{method_not_allowed, preflight, relay_submission};
