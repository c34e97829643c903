//! # runsv
//!
//! > **Start your services in dependency order. Stop them in reverse.**
//!
//! `runsv` is a small service-lifecycle orchestrator built on Tokio. You register services
//! together with the services they depend on; the orchestrator derives a start order in
//! which every dependency comes first, starts services one at a time, and hands each one
//! the *clients* of its direct dependencies. Stopping walks the same order backwards.
//!
//! ## 🚀 Core Concepts
//!
//! ### Services
//! A service has a unique name, a `start`, a `stop`, and optionally a client accessor.
//! Operations complete either by returning a future ([`Service`](framework::Service)) or
//! by signalling a [`Completion`](framework::Completion) handle
//! ([`CallbackService`](framework::CallbackService)). Both conventions can be mixed freely
//! in one system, even within one service built with
//! [`ServiceDescriptor::builder`](framework::ServiceDescriptor::builder).
//!
//! ### Clients
//! A client is whatever handle a running service exposes to others: a pool, a cache, a
//! channel sender. Clients travel type-erased and are recovered with
//! [`Clients::get_as`](framework::Clients::get_as).
//!
//! ### Plans
//! The start plan is a deterministic topological order of the dependency graph. The stop
//! plan is its exact reverse. A cycle is reported with the full path
//! (`Dependency Cycle Found: a -> b -> a`) before any service is touched.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Fail Fast, No Rollback
//! A walk stops at the first failing service and returns
//! [`LifecycleError`](framework::LifecycleError) carrying that service's own error.
//! Services already started stay started; call `stop` yourself if you want them down.
//!
//! ### 2. Strictly Sequential
//! At most one service operation is in flight at a time, even between independent services.
//!
//! ### 3. Events
//! After each successful start or stop, a [`LifecycleEvent`](lifecycle::LifecycleEvent) is
//! published on the orchestrator's event channel. Subscribe before the walk begins; every
//! subscriber receives every event, however slowly it reads.
//!
//! ### 4. Observability
//! Walks run inside `start` / `stop` spans and log each transition with `tracing`.
//! See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Contract ([`framework`])
//! - **Role**: What a service is and how its completion is observed.
//! - **Key items**: [`ServiceDescriptor`](framework::ServiceDescriptor),
//!   [`Operation`](framework::Operation), [`mock`](framework::mock).
//!
//! ### 2. The Orchestrator ([`lifecycle`])
//! - **Role**: Registration, planning, dependency wiring and sequencing.
//! - **Key items**: [`Orchestrator`](lifecycle::Orchestrator),
//!   [`DependencyGraph`](lifecycle::DependencyGraph).
//!
//! ## 🚀 Quick Start
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run -p runsv-sample
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test --workspace
//! ```

pub mod framework;
pub mod lifecycle;
