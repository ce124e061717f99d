//! Database metrics: per-query latency and pool occupancy.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Snapshot of connection pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub total: u32,
    pub idle: u32,
    pub active: u32,
}

impl PoolStats {
    pub fn from_counts(total: u32, idle: usize) -> Self {
        let idle = idle.min(total as usize) as u32;
        Self {
            total,
            idle,
            active: total - idle,
        }
    }
}

/// Publishes pool gauges and returns the snapshot.
pub fn record_pool_metrics(pool: &PgPool) -> PoolStats {
    let stats = PoolStats::from_counts(pool.size(), pool.num_idle());

    gauge!("db_pool_connections", "state" => "active").set(stats.active as f64);
    gauge!("db_pool_connections", "state" => "idle").set(stats.idle as f64);
    gauge!("db_pool_connections_total").set(stats.total as f64);

    stats
}

/// Times one named query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_client_by_id");
/// let result = sqlx::query_as::<_, ClientEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time under `db_query_duration_seconds{query}`.
    pub fn record(self) {
        histogram!("db_query_duration_seconds", "query" => self.query)
            .record(self.start.elapsed().as_secs_f64());
    }
}
