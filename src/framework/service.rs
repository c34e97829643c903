//! # Service Contract
//!
//! Every participant the orchestrator drives must satisfy the same contract: a unique,
//! non-empty name, a `start` operation that receives the clients of its dependencies,
//! a `stop` operation, and optionally a client accessor.
//!
//! There are three ways to describe a service:
//!
//! - implement [`Service`] (deferred convention: `async fn start` / `async fn stop`),
//! - implement [`CallbackService`] (callback convention: operations receive a [`Completion`]),
//! - or assemble one from closures with [`ServiceDescriptor::builder`], choosing the
//!   convention per operation.
//!
//! All three produce a [`ServiceDescriptor`]. Construction validates the contract, so a
//! descriptor that exists is a valid one and registration can never fail later.

use crate::framework::client::{Client, Clients};
use crate::framework::completion::{Completion, Convention, Operation};
use crate::framework::error::{ServiceResult, ValidationError};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A service whose operations complete by returning a future.
///
/// # Dependency Injection
/// `start` receives `None` when the service has no dependencies, otherwise the clients
/// of its direct dependencies keyed by service name. Dependencies that expose no client
/// are absent from the map.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Unique name of the service (e.g. `"pg"`, `"redis"`).
    fn name(&self) -> &str;

    async fn start(&self, dependencies: Option<Clients>) -> ServiceResult;

    async fn stop(&self) -> ServiceResult;

    /// Runtime handle other services receive when they depend on this one.
    fn client(&self) -> Option<Client> {
        None
    }
}

/// A service whose operations complete by signalling a [`Completion`] handle.
///
/// The handle may be signalled inline or later from another task; the orchestrator
/// waits either way.
pub trait CallbackService: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn start(&self, dependencies: Option<Clients>, done: Completion);

    fn stop(&self, done: Completion);

    fn client(&self) -> Option<Client> {
        None
    }
}

/// Accessor producing a service's client, if it has one right now.
pub type ClientFn = Arc<dyn Fn() -> Option<Client> + Send + Sync>;

/// The registered record describing one service.
///
/// Cheap to clone: the operations are shared behind `Arc`s, so the same descriptor can be
/// passed both as a service and as somebody else's dependency.
#[derive(Clone)]
pub struct ServiceDescriptor {
    name: String,
    start: Operation<Option<Clients>>,
    stop: Operation<()>,
    client: Option<ClientFn>,
}

impl ServiceDescriptor {
    /// Start assembling a descriptor from closures.
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder {
            name: name.into(),
            start: None,
            stop: None,
            client: None,
        }
    }

    /// Describe a [`Service`] implementation.
    pub fn from_service<S: Service>(service: Arc<S>) -> Result<Self, ValidationError> {
        let name = validate_name(service.name())?;
        let starter = Arc::clone(&service);
        let stopper = Arc::clone(&service);
        let accessor = service;
        Ok(Self {
            name,
            start: Operation::deferred(move |deps| {
                let service = Arc::clone(&starter);
                async move { service.start(deps).await }
            }),
            stop: Operation::deferred(move |()| {
                let service = Arc::clone(&stopper);
                async move { service.stop().await }
            }),
            client: Some(Arc::new(move || accessor.client())),
        })
    }

    /// Describe a [`CallbackService`] implementation.
    pub fn from_callback_service<S: CallbackService>(
        service: Arc<S>,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(service.name())?;
        let starter = Arc::clone(&service);
        let stopper = Arc::clone(&service);
        let accessor = service;
        Ok(Self {
            name,
            start: Operation::callback(move |deps, done| starter.start(deps, done)),
            stop: Operation::callback(move |(), done| stopper.stop(done)),
            client: Some(Arc::new(move || accessor.client())),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_convention(&self) -> Convention {
        self.start.convention()
    }

    pub fn stop_convention(&self) -> Convention {
        self.stop.convention()
    }

    /// Whether the descriptor carries a client accessor.
    ///
    /// Descriptors built from [`Service`] or [`CallbackService`] always carry one, since
    /// the trait method exists even when left at its default; the accessor may still yield
    /// `None`. Builder descriptors carry one only if [`ServiceBuilder::client`] was called.
    /// Use [`client`](Self::client) to learn whether a client is actually available.
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// The service's client, if it has an accessor and the accessor yields one.
    pub fn client(&self) -> Option<Client> {
        self.client.as_ref().and_then(|accessor| accessor())
    }

    /// Run `start` and wait for its completion signal, whatever the convention.
    pub async fn start(&self, dependencies: Option<Clients>) -> ServiceResult {
        self.start.invoke(dependencies).await
    }

    /// Run `stop` and wait for its completion signal, whatever the convention.
    pub async fn stop(&self) -> ServiceResult {
        self.stop.invoke(()).await
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("start", &self.start.convention())
            .field("stop", &self.stop.convention())
            .field("client", &self.client.is_some())
            .finish()
    }
}

/// Builder for closure-based descriptors.
///
/// ```rust
/// use runsv::framework::ServiceDescriptor;
///
/// let cache = ServiceDescriptor::builder("cache")
///     .start_async(|_deps| async { Ok(()) })
///     .stop_callback(|done| done.ok())
///     .build()
///     .unwrap();
/// assert_eq!(cache.name(), "cache");
/// ```
pub struct ServiceBuilder {
    name: String,
    start: Option<Operation<Option<Clients>>>,
    stop: Option<Operation<()>>,
    client: Option<ClientFn>,
}

impl ServiceBuilder {
    pub fn start_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Option<Clients>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        self.start = Some(Operation::deferred(f));
        self
    }

    pub fn start_callback<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Clients>, Completion) + Send + Sync + 'static,
    {
        self.start = Some(Operation::callback(f));
        self
    }

    pub fn stop_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        self.stop = Some(Operation::deferred(move |()| f()));
        self
    }

    pub fn stop_callback<F>(mut self, f: F) -> Self
    where
        F: Fn(Completion) + Send + Sync + 'static,
    {
        self.stop = Some(Operation::callback(move |(), done| f(done)));
        self
    }

    /// Declare the client accessor.
    pub fn client<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Client + Send + Sync + 'static,
    {
        self.client = Some(Arc::new(move || Some(f())));
        self
    }

    /// Validate the contract and produce the descriptor.
    pub fn build(self) -> Result<ServiceDescriptor, ValidationError> {
        let name = validate_name(&self.name)?;
        let start = self.start.ok_or_else(|| ValidationError::MissingStart {
            service: name.clone(),
        })?;
        let stop = self.stop.ok_or_else(|| ValidationError::MissingStop {
            service: name.clone(),
        })?;
        Ok(ServiceDescriptor {
            name,
            start,
            stop,
            client: self.client,
        })
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    Ok(name.to_string())
}
