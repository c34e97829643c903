//! # Service Clients
//!
//! A running service may expose a *client*: the runtime handle other services use to talk
//! to it (a connection pool, a cache handle, ...). Clients are heterogeneous, so they travel
//! type-erased as [`Client`] and are recovered with [`Clients::get_as`].

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shareable client handle.
pub type Client = Arc<dyn Any + Send + Sync>;

/// Mapping from service name to that service's client, in resolution order.
#[derive(Clone, Default)]
pub struct Clients {
    inner: IndexMap<String, Client>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a client, returning the previous one stored under `name`.
    pub fn insert(&mut self, name: impl Into<String>, client: Client) -> Option<Client> {
        self.inner.insert(name.into(), client)
    }

    pub fn get(&self, name: &str) -> Option<&Client> {
        self.inner.get(name)
    }

    /// Fetch the client registered under `name` as its concrete type.
    ///
    /// Returns `None` if the name is absent or the client is of another type.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.inner
            .get(name)
            .and_then(|client| Arc::clone(client).downcast::<T>().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Client)> {
        self.inner.iter().map(|(name, client)| (name.as_str(), client))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Clients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.keys()).finish()
    }
}

impl FromIterator<(String, Client)> for Clients {
    fn from_iter<It: IntoIterator<Item = (String, Client)>>(iter: It) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Clients {
    type Item = (String, Client);
    type IntoIter = indexmap::map::IntoIter<String, Client>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
