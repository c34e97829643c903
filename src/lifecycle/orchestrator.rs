use crate::framework::client::Clients;
use crate::framework::error::{CycleError, LifecycleError, ValidationError};
use crate::framework::service::ServiceDescriptor;
use crate::lifecycle::config::OrchestratorConfig;
use crate::lifecycle::events::{EventChannel, EventPublisher, LifecycleEvent, Subscription, Topic};
use crate::lifecycle::graph::DependencyGraph;
use crate::lifecycle::registry::ServiceRegistry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

/// The service-lifecycle orchestrator.
///
/// `Orchestrator` is responsible for:
/// - **Registration**: holding every service by name, first registration wins
/// - **Planning**: deriving a start order (dependencies first) and its reverse for stop
/// - **Dependency Wiring**: handing each service the clients of its direct dependencies
/// - **Sequencing**: running one start/stop at a time and aborting on the first failure
/// - **Notification**: publishing a [`LifecycleEvent`] after each successful transition
///
/// Plans are recomputed on every call, so they always reflect the current registrations.
/// Registration takes `&mut self` while walks take `&self`: the registry cannot change
/// under an in-flight walk.
///
/// # Example
///
/// ```rust
/// use runsv::framework::{Client, ServiceDescriptor};
/// use runsv::lifecycle::Orchestrator;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let db = ServiceDescriptor::builder("db")
///         .start_callback(|_, done| done.ok())
///         .stop_callback(|done| done.ok())
///         .client(|| -> Client { Arc::new("postgres://localhost") })
///         .build()
///         .unwrap();
///     let api = ServiceDescriptor::builder("api")
///         .start_async(|deps| async move {
///             let deps = deps.expect("api depends on db");
///             assert!(deps.contains("db"));
///             Ok(())
///         })
///         .stop_async(|| async { Ok(()) })
///         .build()
///         .unwrap();
///
///     let mut orchestrator = Orchestrator::new();
///     orchestrator.add_service(api, [db]);
///     assert_eq!(orchestrator.start_plan().unwrap(), vec!["db", "api"]);
///
///     orchestrator.start().await.unwrap();
///     orchestrator.stop().await.unwrap();
/// }
/// ```
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: ServiceRegistry,
    graph: DependencyGraph,
    events: EventChannel,
    /// Extra sinks that see every event published on `events`.
    publishers: Vec<Arc<dyn EventPublisher>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_config(OrchestratorConfig::default())
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        let events = EventChannel::new();
        Self {
            config,
            registry: ServiceRegistry::new(),
            graph: DependencyGraph::new(),
            events,
            publishers: Vec::new(),
        }
    }

    /// Replace the event channel, e.g. with one shared by several orchestrators.
    pub fn with_events(mut self, events: EventChannel) -> Self {
        self.events = events;
        self
    }

    /// Forward every lifecycle event to an additional publisher.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration & Lookup
    // ─────────────────────────────────────────────────────────────────────────

    /// Register `service` and every entry of `dependencies`, then record that `service`
    /// depends on each of them.
    ///
    /// Names already registered keep their first descriptor; the edges are added anyway.
    pub fn add_service<I>(&mut self, service: ServiceDescriptor, dependencies: I)
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        let dependencies: Vec<ServiceDescriptor> = dependencies.into_iter().collect();

        for entity in std::iter::once(&service).chain(dependencies.iter()) {
            if self.registry.insert(entity.clone()) {
                self.graph.add_node(entity.name());
            }
        }
        for dependency in &dependencies {
            debug!(
                service = service.name(),
                dependency = dependency.name(),
                "Dependency added"
            );
            self.graph.add_dependency(service.name(), dependency.name());
        }
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::MissingName`] for an empty name.
    pub fn get_service(&self, name: &str) -> Result<Option<&ServiceDescriptor>, ValidationError> {
        self.registry.get(name)
    }

    pub fn list_services(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Clients of the named services, or of every service when `names` is empty.
    pub fn get_clients(&self, names: &[&str]) -> Clients {
        self.registry.clients(names)
    }

    /// Direct dependencies of `name`, in declaration order.
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.graph.direct_dependencies_of(name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plans
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start_plan(&self) -> Result<Vec<String>, CycleError> {
        self.graph.plan()
    }

    pub fn stop_plan(&self) -> Result<Vec<String>, CycleError> {
        self.graph.reverse_plan()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    /// Subscribe to lifecycle events. Only walks that begin afterwards are observed.
    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        self.events.subscribe(topics)
    }

    fn publish(&self, event: LifecycleEvent) {
        for publisher in &self.publishers {
            publisher.publish(event.clone());
        }
        self.events.publish(event);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Walks
    // ─────────────────────────────────────────────────────────────────────────

    /// Start every service in plan order.
    ///
    /// Each service receives the clients of its direct dependencies, or `None` when it has
    /// none. The walk stops at the first failure; services already started stay started.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Cycle`] if the graph has a cycle (no service is touched)
    /// - [`LifecycleError::StartFailed`] carrying the failing service's own error
    pub async fn start(&self) -> Result<(), LifecycleError> {
        let span = info_span!("start", orchestrator = %self.config.name);
        async {
            let plan = self.start_plan()?;
            debug!(?plan, "Plan computed");
            info!(services = plan.len(), "Starting services");

            for name in &plan {
                let service = self.lookup(name)?;
                let dependencies = self.graph.direct_dependencies_of(name);
                let clients = if dependencies.is_empty() {
                    None
                } else {
                    debug!(service = %name, ?dependencies, "Resolving dependency clients");
                    Some(self.registry.clients(dependencies.as_slice()))
                };

                if let Err(source) = service.start(clients).await {
                    warn!(service = %name, error = %source, "Start failed");
                    return Err(LifecycleError::StartFailed {
                        service: name.clone(),
                        source,
                    });
                }
                info!(service = %name, "Started");
                self.publish(LifecycleEvent::Started(name.clone()));
            }

            info!(services = plan.len(), "All services started");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Stop every service in reverse plan order, aborting on the first failure.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Cycle`] if the graph has a cycle (no service is touched)
    /// - [`LifecycleError::StopFailed`] carrying the failing service's own error
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let span = info_span!("stop", orchestrator = %self.config.name);
        async {
            let plan = self.stop_plan()?;
            debug!(?plan, "Plan computed");
            info!(services = plan.len(), "Stopping services");

            for name in &plan {
                let service = self.lookup(name)?;
                if let Err(source) = service.stop().await {
                    warn!(service = %name, error = %source, "Stop failed");
                    return Err(LifecycleError::StopFailed {
                        service: name.clone(),
                        source,
                    });
                }
                info!(service = %name, "Stopped");
                self.publish(LifecycleEvent::Stopped(name.clone()));
            }

            info!(services = plan.len(), "All services stopped");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Callback form of [`start`](Self::start): runs the walk on the Tokio runtime and
    /// hands the outcome to `on_done` exactly once.
    pub fn start_with<F>(self: &Arc<Self>, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), LifecycleError>) + Send + 'static,
    {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { on_done(orchestrator.start().await) })
    }

    /// Callback form of [`stop`](Self::stop).
    pub fn stop_with<F>(self: &Arc<Self>, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), LifecycleError>) + Send + 'static,
    {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { on_done(orchestrator.stop().await) })
    }

    fn lookup(&self, name: &str) -> Result<&ServiceDescriptor, LifecycleError> {
        self.registry
            .find(name)
            .ok_or_else(|| LifecycleError::UnknownService(name.to_string()))
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::completion::Convention;
    use crate::framework::mock::{CallLog, MockClient, MockService};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<LifecycleEvent>>,
    }

    impl EventPublisher for Recorder {
        fn publish(&self, event: LifecycleEvent) {
            self.events.lock().push(event);
        }
    }

    fn mock(name: &str, log: &CallLog) -> Arc<MockService> {
        MockService::new(name, log).with_client().into_arc()
    }

    #[test]
    fn add_service_registers_dependencies_and_edges() {
        let log = CallLog::default();
        let (a, b) = (mock("a", &log), mock("b", &log));
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_service(
            b.descriptor(Convention::Deferred).unwrap(),
            [a.descriptor(Convention::Deferred).unwrap()],
        );

        assert_eq!(orchestrator.list_services(), vec!["b", "a"]);
        assert_eq!(orchestrator.dependencies_of("b"), vec!["a"]);
        assert_eq!(orchestrator.start_plan().unwrap(), vec!["a", "b"]);
        assert_eq!(orchestrator.stop_plan().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn re_adding_a_service_keeps_the_first_but_adds_edges() {
        let log = CallLog::default();
        let (a, b, c) = (mock("a", &log), mock("b", &log), mock("c", &log));
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_service(a.descriptor(Convention::Callback).unwrap(), []);
        orchestrator.add_service(b.descriptor(Convention::Deferred).unwrap(), []);
        orchestrator.add_service(
            c.descriptor(Convention::Deferred).unwrap(),
            [a.descriptor(Convention::Deferred).unwrap()],
        );
        orchestrator.add_service(
            a.descriptor(Convention::Deferred).unwrap(),
            [b.descriptor(Convention::Deferred).unwrap()],
        );

        let stored = orchestrator.get_service("a").unwrap().unwrap();
        assert_eq!(stored.start_convention(), Convention::Callback);
        assert_eq!(orchestrator.list_services(), vec!["a", "b", "c"]);
        assert_eq!(orchestrator.start_plan().unwrap(), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn cycle_fails_before_touching_any_service() {
        let log = CallLog::default();
        let a = mock("a", &log);
        let mut orchestrator = Orchestrator::new();
        let descriptor = a.descriptor(Convention::Deferred).unwrap();
        orchestrator.add_service(descriptor.clone(), [descriptor]);

        let err = orchestrator.start().await.unwrap_err();
        assert_eq!(err.to_string(), "Dependency Cycle Found: a -> a");
        let err = orchestrator.stop().await.unwrap_err();
        assert!(matches!(err, LifecycleError::Cycle(_)));
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn publishers_see_events_in_walk_order() {
        let log = CallLog::default();
        let (a, b) = (mock("a", &log), mock("b", &log));
        let recorder = Arc::new(Recorder::default());
        let mut orchestrator = Orchestrator::new().with_publisher(recorder.clone());
        orchestrator.add_service(
            b.descriptor(Convention::Callback).unwrap(),
            [a.descriptor(Convention::Deferred).unwrap()],
        );
        let mut subscription = orchestrator.subscribe(&[Topic::Stop]);

        orchestrator.start().await.unwrap();
        orchestrator.stop().await.unwrap();

        assert_eq!(
            *recorder.events.lock(),
            vec![
                LifecycleEvent::Started("a".into()),
                LifecycleEvent::Started("b".into()),
                LifecycleEvent::Stopped("b".into()),
                LifecycleEvent::Stopped("a".into()),
            ]
        );
        assert_eq!(
            subscription.drain(),
            vec![
                LifecycleEvent::Stopped("b".into()),
                LifecycleEvent::Stopped("a".into()),
            ]
        );
    }

    #[tokio::test]
    async fn services_without_dependencies_receive_none() {
        let log = CallLog::default();
        let (a, b) = (mock("a", &log), mock("b", &log));
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_service(
            b.descriptor(Convention::Deferred).unwrap(),
            [a.descriptor(Convention::Deferred).unwrap()],
        );

        orchestrator.start().await.unwrap();

        assert!(a.received()[0].is_none());
        let deps = b.received()[0].clone().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps.get_as::<MockClient>("a").unwrap().name, "a");
    }

    #[tokio::test]
    async fn callback_facade_reports_once() {
        let log = CallLog::default();
        let a = MockService::new("a", &log).fail_stop("disk full").into_arc();
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_service(a.descriptor(Convention::Callback).unwrap(), []);
        let orchestrator = Arc::new(orchestrator);

        let (tx, rx) = tokio::sync::oneshot::channel();
        orchestrator
            .start_with(move |result| {
                let _ = tx.send(result);
            })
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_ok());

        let (tx, rx) = tokio::sync::oneshot::channel();
        orchestrator
            .stop_with(move |result| {
                let _ = tx.send(result);
            })
            .await
            .unwrap();
        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.service(), Some("a"));
        assert_eq!(err.service_error().unwrap().to_string(), "disk full");
    }
}
