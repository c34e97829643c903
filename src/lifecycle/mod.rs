//! Service lifecycle orchestration.
//!
//! This module turns a set of registered services into an ordered start and stop sequence.
//!
//! # Main Components
//!
//! - [`Orchestrator`] - Registers services, plans, and runs start/stop walks
//! - [`ServiceRegistry`] - Name-keyed storage, first registration wins
//! - [`DependencyGraph`] - Directed graph with deterministic ordering and cycle reporting
//! - [`EventChannel`] / [`EventPublisher`] - Per-service `start` and `stop` notifications
//! - [`OrchestratorConfig`] - Serde-backed settings
//!
//! See [`tracing`] for what gets logged during a walk.

pub mod config;
pub mod events;
pub mod graph;
pub mod orchestrator;
pub mod registry;
pub mod tracing;

pub use config::OrchestratorConfig;
pub use events::{EventChannel, EventPublisher, LifecycleEvent, Subscription, Topic};
pub use graph::DependencyGraph;
pub use orchestrator::Orchestrator;
pub use registry::ServiceRegistry;
pub use tracing::{setup_tracing, try_setup_tracing};
