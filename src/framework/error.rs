//! # Lifecycle Errors
//!
//! This module defines the error types used throughout the orchestrator.
//! By centralizing error definitions, we ensure consistent error handling across
//! registration, planning and the start/stop walks.
//!
//! Three families exist:
//!
//! - [`ValidationError`]: raised while a [`ServiceDescriptor`](crate::framework::ServiceDescriptor)
//!   is being built, never deferred into a walk.
//! - [`CycleError`]: raised when a plan is requested over a graph that is not a DAG.
//! - [`LifecycleError`]: the outcome of a failed start or stop walk. It carries the
//!   service's own error untouched as its `source`.

use std::error::Error as StdError;

/// Boxed error type returned by service operations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Outcome of a single start or stop operation.
pub type ServiceResult = Result<(), BoxError>;

/// A service descriptor failed the service contract.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("service must have a #name")]
    MissingName,
    #[error("service {service} must have a #start function")]
    MissingStart { service: String },
    #[error("service {service} must have a #stop function")]
    MissingStop { service: String },
}

/// The dependency graph contains a cycle.
///
/// `path` is the exact walk that closed the cycle, ending on the node it started from.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Dependency Cycle Found: {}", .path.join(" -> "))]
pub struct CycleError {
    pub path: Vec<String>,
}

impl CycleError {
    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }
}

/// A callback-style operation dropped its [`Completion`](crate::framework::Completion)
/// without ever signalling it.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("completion handle dropped before it was signalled")]
pub struct CompletionDropped;

/// Errors produced by the orchestrator's start and stop walks.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error("service {service} failed to start")]
    StartFailed {
        service: String,
        #[source]
        source: BoxError,
    },
    #[error("service {service} failed to stop")]
    StopFailed {
        service: String,
        #[source]
        source: BoxError,
    },
    #[error("service {0} is in the plan but not registered")]
    UnknownService(String),
}

impl LifecycleError {
    /// Name of the service whose operation failed, if any.
    pub fn service(&self) -> Option<&str> {
        match self {
            LifecycleError::StartFailed { service, .. }
            | LifecycleError::StopFailed { service, .. }
            | LifecycleError::UnknownService(service) => Some(service),
            LifecycleError::Cycle(_) => None,
        }
    }

    /// Borrow the error the service itself reported.
    pub fn service_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            LifecycleError::StartFailed { source, .. } | LifecycleError::StopFailed { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }

    /// Take back the error the service itself reported, unchanged.
    pub fn into_service_error(self) -> Option<BoxError> {
        match self {
            LifecycleError::StartFailed { source, .. } | LifecycleError::StopFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}
