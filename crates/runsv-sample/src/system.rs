//! # Sample System
//!
//! Wires the pool and the cache into one [`Orchestrator`]: the cache is registered with the
//! pool as its dependency, so the pool starts first and stops last.
//!
//! ```rust,no_run
//! use runsv_sample::system::{SampleConfig, SampleSystem};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), runsv::framework::BoxError> {
//! let system = SampleSystem::new(SampleConfig::default())?;
//! system.start().await?;
//!
//! let cache = system.cache_client().expect("cache is running");
//! cache.put("user:1", "Alice").await?;
//!
//! system.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheClient, CacheService, CACHE};
use crate::pool::{PoolService, PooledClient, POOL};
use runsv::framework::{LifecycleError, ServiceDescriptor, ValidationError};
use runsv::lifecycle::{Orchestrator, OrchestratorConfig, Topic};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub orchestrator: OrchestratorConfig,
    /// Connections in the pool.
    pub pool_size: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig {
                name: "sample".to_string(),
            },
            pool_size: 4,
        }
    }
}

pub struct SampleSystem {
    orchestrator: Orchestrator,
}

impl SampleSystem {
    pub fn new(config: SampleConfig) -> Result<Self, ValidationError> {
        let pool = ServiceDescriptor::from_callback_service(Arc::new(PoolService::new(
            config.pool_size,
        )))?;
        let cache = ServiceDescriptor::from_service(Arc::new(CacheService::new()))?;

        let mut orchestrator = Orchestrator::with_config(config.orchestrator);
        orchestrator.add_service(cache, [pool]);
        info!(services = ?orchestrator.list_services(), "Sample system assembled");

        Ok(Self { orchestrator })
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Log every lifecycle event on a background task.
    ///
    /// The task ends once the system is dropped and yields the number of events it saw.
    pub fn watch_events(&self) -> JoinHandle<usize> {
        let mut events = self.orchestrator.subscribe(&Topic::ALL);
        tokio::spawn(async move {
            let mut seen = 0;
            while let Some(event) = events.recv().await {
                seen += 1;
                info!(topic = %event.topic(), service = event.service(), "Lifecycle event");
            }
            seen
        })
    }

    pub async fn start(&self) -> Result<(), LifecycleError> {
        self.orchestrator.start().await
    }

    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        self.orchestrator.stop().await
    }

    /// The pool's client, while the pool is running.
    pub fn pool_client(&self) -> Option<Arc<PooledClient>> {
        self.orchestrator.get_clients(&[POOL]).get_as(POOL)
    }

    /// The cache's client, while the cache is running.
    pub fn cache_client(&self) -> Option<Arc<CacheClient>> {
        self.orchestrator.get_clients(&[CACHE]).get_as(CACHE)
    }
}
