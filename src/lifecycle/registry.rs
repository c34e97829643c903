use crate::framework::client::Clients;
use crate::framework::error::ValidationError;
use crate::framework::service::ServiceDescriptor;
use indexmap::IndexMap;
use tracing::debug;

// ---------------------------------------------------------------------------
// ServiceRegistry
// ---------------------------------------------------------------------------

/// Registered services, keyed by name.
///
/// The first registration of a name wins; re-registering is a silent no-op.
/// Listing follows registration order.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: IndexMap<String, ServiceDescriptor>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `service` unless its name is taken. Returns whether it was stored.
    pub fn insert(&mut self, service: ServiceDescriptor) -> bool {
        if self.services.contains_key(service.name()) {
            debug!(service = service.name(), "Already registered, keeping first");
            return false;
        }
        debug!(
            service = service.name(),
            start = ?service.start_convention(),
            stop = ?service.stop_convention(),
            "Registered"
        );
        self.services.insert(service.name().to_string(), service);
        true
    }

    /// Look up a service by name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingName`] for an empty name.
    pub fn get(&self, name: &str) -> Result<Option<&ServiceDescriptor>, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(self.services.get(name))
    }

    pub(crate) fn find(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn list(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Clients of the named services; every registered service when `names` is empty.
    ///
    /// Services without a client, and names that are not registered, are left out.
    pub fn clients<S: AsRef<str>>(&self, names: &[S]) -> Clients {
        if names.is_empty() {
            return self.collect_clients(self.services.keys());
        }
        self.collect_clients(names.iter())
    }

    fn collect_clients<S: AsRef<str>>(&self, names: impl Iterator<Item = S>) -> Clients {
        let mut clients = Clients::new();
        for name in names {
            let name = name.as_ref();
            match self.services.get(name) {
                Some(service) => {
                    if let Some(client) = service.client() {
                        clients.insert(name, client);
                    }
                }
                None => debug!(service = name, "Client requested for unknown service"),
            }
        }
        clients
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
