//! # Connection Pool Service
//!
//! An in-memory stand-in for a database pool. The pool hands out a bounded number of
//! connections (a Tokio [`Semaphore`]) over a shared key/value table.
//!
//! [`PoolService`] uses the **callback** convention: `start` returns immediately and
//! signals its [`Completion`] from a spawned task once a test connection has been
//! checked out and returned.
//!
//! Other services reach the pool through [`PooledClient`], which checks out a connection
//! for the duration of each [`query`](PooledClient::query).

use parking_lot::Mutex;
use runsv::framework::{CallbackService, Client, Clients, Completion};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Registered name of the pool service.
pub const POOL: &str = "pool";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool is already started")]
    AlreadyStarted,
    #[error("pool is not started")]
    NotStarted,
    #[error("pool is closed")]
    Closed,
}

/// A statement executed against the pool's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Store `value` under `key`, returning the previous value.
    Put { key: String, value: String },
    Get { key: String },
    /// Remove `key`, returning its value.
    Delete { key: String },
}

impl Statement {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Statement::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn get(key: impl Into<String>) -> Self {
        Statement::Get { key: key.into() }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Statement::Delete { key: key.into() }
    }
}

struct Pool {
    connections: Semaphore,
    size: usize,
    rows: Mutex<HashMap<String, String>>,
}

impl Pool {
    fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            connections: Semaphore::new(size),
            size,
            rows: Mutex::new(HashMap::new()),
        }
    }
}

/// Client handed to services that depend on the pool.
#[derive(Clone)]
pub struct PooledClient {
    pool: Arc<Pool>,
}

impl PooledClient {
    /// Check out a connection and run `statement` on it.
    pub async fn query(&self, statement: Statement) -> Result<Option<String>, PoolError> {
        let _connection = self
            .pool
            .connections
            .acquire()
            .await
            .map_err(|_| PoolError::Closed)?;
        debug!(?statement, "Query");

        let mut rows = self.pool.rows.lock();
        let result = match statement {
            Statement::Put { key, value } => rows.insert(key, value),
            Statement::Get { key } => rows.get(&key).cloned(),
            Statement::Delete { key } => rows.remove(&key),
        };
        Ok(result)
    }

    pub fn size(&self) -> usize {
        self.pool.size
    }

    /// Connections not currently checked out.
    pub fn idle(&self) -> usize {
        self.pool.connections.available_permits()
    }
}

/// The pool as a lifecycle-managed service.
pub struct PoolService {
    size: usize,
    pool: Mutex<Option<Arc<Pool>>>,
}

impl PoolService {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            pool: Mutex::new(None),
        }
    }
}

impl CallbackService for PoolService {
    fn name(&self) -> &str {
        POOL
    }

    fn start(&self, _dependencies: Option<Clients>, done: Completion) {
        let pool = {
            let mut slot = self.pool.lock();
            if slot.is_some() {
                return done.fail(PoolError::AlreadyStarted);
            }
            let pool = Arc::new(Pool::new(self.size));
            *slot = Some(Arc::clone(&pool));
            pool
        };

        tokio::spawn(async move {
            match pool.connections.acquire().await {
                Ok(connection) => {
                    drop(connection);
                    info!(size = pool.size, "Pool ready");
                    done.ok();
                }
                Err(_) => done.fail(PoolError::Closed),
            }
        });
    }

    fn stop(&self, done: Completion) {
        match self.pool.lock().take() {
            Some(pool) => {
                pool.connections.close();
                info!(rows = pool.rows.lock().len(), "Pool closed");
                done.ok();
            }
            None => done.fail(PoolError::NotStarted),
        }
    }

    fn client(&self) -> Option<Client> {
        let pool = self.pool.lock().clone()?;
        Some(Arc::new(PooledClient { pool }))
    }
}
