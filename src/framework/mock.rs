//! # Mock Services & Testing Guide
//!
//! [`MockService`] is a scripted service double. It implements **both** [`Service`] and
//! [`CallbackService`], so the same mock can be registered under either completion
//! convention and the orchestrator's observable behavior compared between the two.
//!
//! Every call is appended to a shared [`CallLog`] as `start:<name>` / `stop:<name>`, which
//! makes ordering across several services easy to assert.
//!
//! ## Scripting Failures
//!
//! ```rust
//! use runsv::framework::mock::{CallLog, MockService};
//! use runsv::framework::Convention;
//! use runsv::lifecycle::Orchestrator;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("connection refused")]
//! struct Refused;
//!
//! #[tokio::main]
//! async fn main() {
//!     let log = CallLog::default();
//!     let pg = MockService::new("pg", &log).fail_start(Refused).into_arc();
//!     let api = MockService::new("api", &log).into_arc();
//!
//!     let mut orchestrator = Orchestrator::new();
//!     orchestrator.add_service(
//!         api.descriptor(Convention::Deferred).unwrap(),
//!         [pg.descriptor(Convention::Callback).unwrap()],
//!     );
//!
//!     let err = orchestrator.start().await.unwrap_err();
//!     assert!(err.service_error().unwrap().downcast_ref::<Refused>().is_some());
//!     assert_eq!(log.entries(), vec!["start:pg"]);
//! }
//! ```
//!
//! ## Completion Timing
//!
//! In the callback convention the mock signals its [`Completion`] from a freshly spawned
//! task after yielding once, so tests exercise a real deferred completion rather than an
//! inline one. This requires a Tokio runtime (`#[tokio::test]`).

use crate::framework::client::{Client, Clients};
use crate::framework::completion::{Completion, Convention};
use crate::framework::error::{BoxError, ServiceResult, ValidationError};
use crate::framework::service::{CallbackService, Service, ServiceDescriptor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared, ordered record of lifecycle calls across mocks.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Client exposed by a [`MockService`] created with [`MockService::with_client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockClient {
    pub name: String,
}

/// A scripted service double.
pub struct MockService {
    name: String,
    log: CallLog,
    client: Option<Client>,
    start_error: Mutex<Option<BoxError>>,
    stop_error: Mutex<Option<BoxError>>,
    received: Mutex<Vec<Option<Clients>>>,
    starts: AtomicU32,
    stops: AtomicU32,
}

impl MockService {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            client: None,
            start_error: Mutex::new(None),
            stop_error: Mutex::new(None),
            received: Mutex::new(Vec::new()),
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
        }
    }

    /// Expose a [`MockClient`] carrying this service's name.
    pub fn with_client(mut self) -> Self {
        self.client = Some(Arc::new(MockClient {
            name: self.name.clone(),
        }));
        self
    }

    /// The next `start` fails with `error`. Later starts succeed again.
    pub fn fail_start(self, error: impl Into<BoxError>) -> Self {
        *self.start_error.lock() = Some(error.into());
        self
    }

    /// The next `stop` fails with `error`. Later stops succeed again.
    pub fn fail_stop(self, error: impl Into<BoxError>) -> Self {
        *self.stop_error.lock() = Some(error.into());
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Describe this mock under the requested completion convention.
    pub fn descriptor(
        self: &Arc<Self>,
        convention: Convention,
    ) -> Result<ServiceDescriptor, ValidationError> {
        match convention {
            Convention::Deferred => ServiceDescriptor::from_service(Arc::clone(self)),
            Convention::Callback => ServiceDescriptor::from_callback_service(Arc::clone(self)),
        }
    }

    /// Dependency clients received by each `start` call, oldest first.
    pub fn received(&self) -> Vec<Option<Clients>> {
        self.received.lock().clone()
    }

    pub fn start_count(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }

    fn record_start(&self, dependencies: Option<Clients>) -> ServiceResult {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(dependencies);
        self.log.push(format!("start:{}", self.name));
        match self.start_error.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn record_stop(&self) -> ServiceResult {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("stop:{}", self.name));
        match self.stop_error.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Service for MockService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, dependencies: Option<Clients>) -> ServiceResult {
        tokio::task::yield_now().await;
        self.record_start(dependencies)
    }

    async fn stop(&self) -> ServiceResult {
        tokio::task::yield_now().await;
        self.record_stop()
    }

    fn client(&self) -> Option<Client> {
        self.client.clone()
    }
}

impl CallbackService for MockService {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, dependencies: Option<Clients>, done: Completion) {
        let result = self.record_start(dependencies);
        complete_later(done, result);
    }

    fn stop(&self, done: Completion) {
        let result = self.record_stop();
        complete_later(done, result);
    }

    fn client(&self) -> Option<Client> {
        self.client.clone()
    }
}

fn complete_later(done: Completion, result: ServiceResult) {
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        done.complete(result);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_failure_is_consumed_once() {
        let log = CallLog::default();
        let mock = MockService::new("pg", &log)
            .fail_start("connection refused")
            .into_arc();
        let descriptor = mock.descriptor(Convention::Callback).unwrap();

        let err = descriptor.start(None).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert!(descriptor.start(None).await.is_ok());

        assert_eq!(mock.start_count(), 2);
        assert_eq!(log.entries(), vec!["start:pg", "start:pg"]);
    }

    #[tokio::test]
    async fn records_received_dependencies() {
        let log = CallLog::default();
        let mock = MockService::new("api", &log).with_client().into_arc();
        let descriptor = mock.descriptor(Convention::Deferred).unwrap();

        let mut deps = Clients::new();
        deps.insert("pg", Arc::new(MockClient { name: "pg".into() }));
        descriptor.start(Some(deps)).await.unwrap();
        descriptor.stop().await.unwrap();

        let received = mock.received();
        assert_eq!(received.len(), 1);
        let deps = received[0].as_ref().unwrap();
        assert_eq!(deps.get_as::<MockClient>("pg").unwrap().name, "pg");
        assert_eq!(mock.stop_count(), 1);

        let own = descriptor.client().unwrap();
        assert_eq!(own.downcast_ref::<MockClient>().unwrap().name, "api");
    }
}
