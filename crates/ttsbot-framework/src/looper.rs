//! Periodic background work.
//!
//! Extensions schedule recurring jobs (stats reporting, cache pruning, …) by
//! implementing [`Looper`] and handing it to
//! [`Instance::spawn_looper`](crate::Instance::spawn_looper).
//!
//! ```rust,ignore
//! struct AnalyticsReporter { instance: Arc<Instance> }
//!
//! impl Looper for AnalyticsReporter {
//!     const NAME: &'static str = "Analytics Reporter";
//!     const INTERVAL: Duration = Duration::from_secs(60);
//!
//!     async fn loop_func(&self) -> anyhow::Result<()> {
//!         let counts = self.instance.analytics().drain_counts();
//!         tracing::info!(?counts, "Analytics flushed");
//!         Ok(())
//!     }
//! }
//! ```

use std::future::Future;
use std::time::Duration;

/// A job that runs on a fixed interval for the lifetime of the instance.
pub trait Looper: Send + Sync + 'static {
    /// Name used in logs.
    const NAME: &'static str;

    /// Time between the start of one iteration and the next.
    const INTERVAL: Duration;

    /// One iteration of the job.
    fn loop_func(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}
