//! Publishes connection pool gauges.

use sqlx::PgPool;
use tracing::trace;

use super::scheduler::{Job, JobFrequency};

pub struct PoolMetricsJob {
    pool: PgPool,
    every_secs: u64,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool, every_secs: u64) -> Self {
        Self { pool, every_secs }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.every_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let stats = persistence::metrics::record_pool_metrics(&self.pool);
        trace!(total = stats.total, idle = stats.idle, active = stats.active, "Pool stats");
        Ok(())
    }
}
