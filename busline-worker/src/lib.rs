//! Bounded-concurrency consumer for subject traffic, plus an outbound
//! publish-on-scan variant for bus-backed side-effects of a persistence layer

mod config;
pub mod http;
pub mod persist;
pub mod scanner;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::error;

use busline_client::{BusClient, ClientError};

pub use self::config::WorkerConfig;
pub use self::scanner::{OutboundScanner, PendingItem, PendingSource, ScanError};

/// Bounded-concurrency consumer for [`BusClient::subscribe`]
///
/// Each delivered message acquires one of `batch_size` semaphore permits
/// before `handler` runs in its own task, so a slow handler throttles new
/// dispatch instead of unboundedly spawning tasks. The permit is released
/// when the handler task ends, panic or not, and a panic is logged rather
/// than propagated.
pub struct WorkerPool {
    config: WorkerConfig,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    #[must_use]
    pub fn new(config: WorkerConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency()));
        Self { config, semaphore }
    }

    /// Subscribe and dispatch every message to `handler` under the pool's
    /// concurrency limit. Returns when the subscription ends.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`BusClient::subscribe`] returns.
    pub async fn run<H, Fut>(&self, client: &mut BusClient, handler: H) -> Result<(), ClientError>
    where
        H: Fn(Vec<u8>, String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let semaphore = Arc::clone(&self.semaphore);
        let queue_group = self.config.queue_group.clone().unwrap_or_default();

        client
            .subscribe(
                self.config.subject.clone(),
                queue_group,
                move |data, subject| {
                    let semaphore = Arc::clone(&semaphore);
                    let handler = Arc::clone(&handler);
                    async move {
                        let Ok(permit) = semaphore.acquire_owned().await else {
                            return;
                        };
                        let task = tokio::spawn(async move {
                            let _permit = permit;
                            handler(data, subject).await;
                        });
                        tokio::spawn(async move {
                            if let Err(err) = task.await {
                                error!(%err, "worker task panicked");
                            }
                        });
                    }
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{WorkerConfig, WorkerPool};

    #[test]
    fn concurrency_is_at_least_one() {
        let config = WorkerConfig {
            subject: "x".to_owned(),
            queue_group: None,
            batch_size: 0,
        };
        let pool = WorkerPool::new(config);
        assert_eq!(1, pool.semaphore.available_permits());
    }
}
