//! The service contract and its supporting types.
//!
//! This module defines what the orchestrator drives: services, the clients they expose,
//! and the two ways an operation may signal completion.
//!
//! # Main Components
//!
//! - [`Service`] / [`CallbackService`] - Traits for the deferred and callback conventions
//! - [`ServiceDescriptor`] - The validated, convention-tagged record the orchestrator stores
//! - [`Operation`] / [`Completion`] - Normalize both conventions into one awaited result
//! - [`Clients`] - Name-keyed, type-erased dependency clients
//! - [`LifecycleError`] / [`ValidationError`] / [`CycleError`] - Error types
//!
//! # Testing
//!
//! See [`mock`] module for a scripted service double and a shared call log.

pub mod client;
pub mod completion;
pub mod error;
pub mod mock;
pub mod service;

pub use client::{Client, Clients};
pub use completion::{Completion, Convention, Operation};
pub use error::{
    BoxError, CompletionDropped, CycleError, LifecycleError, ServiceResult, ValidationError,
};
pub use service::{CallbackService, ClientFn, Service, ServiceBuilder, ServiceDescriptor};
