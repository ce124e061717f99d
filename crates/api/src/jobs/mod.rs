//! Background job scheduler and job implementations.

mod auth_cleanup;
mod pool_metrics;
mod scheduler;

pub use auth_cleanup::AuthCleanupJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
