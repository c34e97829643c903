//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered by `RUST_LOG`.
//! The crate/module prefix is hidden (`with_target(false)`), so lines stay short and the
//! span hierarchy carries the context.
//!
//! ## What Gets Traced
//!
//! Every walk runs inside a `start` or `stop` span carrying the orchestrator's configured
//! name. Inside it:
//!
//! | Level   | Message                                        | Fields                      |
//! |---------|------------------------------------------------|-----------------------------|
//! | `INFO`  | `Starting services` / `Stopping services`      | `services`                  |
//! | `INFO`  | `Started` / `Stopped`                          | `service`                   |
//! | `WARN`  | `Start failed` / `Stop failed`                 | `service`, `error`          |
//! | `DEBUG` | `Plan computed`                                | `plan`                      |
//! | `DEBUG` | `Registered`, `Dependency added`               | `service`, `dependency`     |
//! | `DEBUG` | `Resolving dependency clients`                 | `service`, `dependencies`   |
//!
//! ## Usage
//!
//! ```bash
//! # One line per transition
//! RUST_LOG=info cargo run -p runsv-sample
//!
//! # Registration and dependency wiring as well
//! RUST_LOG=debug cargo run -p runsv-sample
//!
//! # Only the orchestrator
//! RUST_LOG=runsv=debug cargo run -p runsv-sample
//! ```
//!
//! With `RUST_LOG=info` a two-service system prints:
//!
//! ```text
//! INFO start: Starting services services=2 orchestrator=sample
//! INFO start: Started service="pool" orchestrator=sample
//! INFO start: Started service="cache" orchestrator=sample
//! INFO start: All services started services=2 orchestrator=sample
//! ```

use crate::framework::error::BoxError;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber is already set. Use [`try_setup_tracing`] where that can
/// happen, e.g. from tests.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Like [`setup_tracing`], but reports an already-installed subscriber as an error.
pub fn try_setup_tracing() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        let _ = try_setup_tracing();
        assert!(try_setup_tracing().is_err());
    }
}
