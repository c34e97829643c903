//! # runsv Sample Services
//!
//! Two services driven by the `runsv` orchestrator, one per completion convention:
//!
//! - **[pool]**: an in-memory connection pool ([`PoolService`](pool::PoolService)) using
//!   the callback convention. Its client is a [`PooledClient`](pool::PooledClient).
//! - **[cache]**: a read-through cache ([`CacheService`](cache::CacheService)) using the
//!   deferred convention. It depends on the pool.
//! - **[system]**: [`SampleSystem`](system::SampleSystem) wires both together.

pub mod cache;
pub mod pool;
pub mod system;
