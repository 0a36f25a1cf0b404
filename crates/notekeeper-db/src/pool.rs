//! Connection pool setup and pool health logging.
//!
//! Every worker shard holds at most one connection while it persists an
//! update, and retrieval requests need one more for the vector search. The
//! pool is sized so a busy worker cannot starve retrieval.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use notekeeper_core::{Error, Result};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Connections reserved on top of one per worker shard.
pub const RETRIEVAL_HEADROOM: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a caller waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Read `DB_MAX_CONNECTIONS` and `DB_ACQUIRE_TIMEOUT_SECS`; unset or
    /// unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map_or(defaults.max_connections, |n| n.max(1)),
            acquire_timeout: lookup("DB_ACQUIRE_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(defaults.acquire_timeout, Duration::from_secs),
        }
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self
    }

    /// Raise `max_connections` to cover `shards` worker shards plus
    /// [`RETRIEVAL_HEADROOM`]. Never lowers it.
    pub fn for_worker_shards(mut self, shards: usize) -> Self {
        let needed = u32::try_from(shards)
            .unwrap_or(u32::MAX)
            .saturating_add(RETRIEVAL_HEADROOM);
        if needed > self.max_connections {
            debug!(
                subsystem = "db",
                component = "pool",
                configured = self.max_connections,
                shards,
                "Raising max connections to cover worker shards"
            );
            self.max_connections = needed;
        }
        self
    }
}

pub async fn create_pool(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Pool occupancy at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub size: u32,
    pub idle: usize,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
        }
    }

    pub fn in_use(&self) -> usize {
        (self.size as usize).saturating_sub(self.idle)
    }

    /// Every open connection is checked out.
    pub fn is_saturated(&self) -> bool {
        self.size > 0 && self.idle == 0
    }
}

/// Log pool occupancy, warning when no idle connection is left.
pub fn log_pool_metrics(pool: &PgPool) -> PoolSnapshot {
    let snapshot = PoolSnapshot::of(pool);
    if snapshot.is_saturated() {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = snapshot.size,
            "All pool connections in use"
        );
    } else {
        debug!(
            subsystem = "db",
            component = "pool",
            pool_size = snapshot.size,
            pool_idle = snapshot.idle,
            pool_in_use = snapshot.in_use(),
            "Pool metrics"
        );
    }
    snapshot
}
