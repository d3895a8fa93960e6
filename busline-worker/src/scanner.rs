use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, warn};

use busline_client::BusClient;

/// One row a [`PendingSource`] hands back as ready to publish.
#[derive(Debug, Clone)]
pub struct PendingItem {
    pub id: String,
    pub subject: String,
    pub payload: Vec<u8>,
}

/// Backing store for the outbound scanner variant of [`crate::WorkerPool`]
///
/// Implementations own whatever persistence mechanism tracks pending
/// outbound messages (a table, a queue, ...); the scanner only needs to
/// fetch a batch and mark entries processed afterwards.
#[async_trait::async_trait]
pub trait PendingSource: Send + Sync {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<PendingItem>, ScanError>;
    async fn mark_processed(&self, id: &str) -> Result<(), ScanError>;
}

#[derive(Debug, thiserror::Error)]
#[error("pending source operation failed")]
pub struct ScanError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// Polls a [`PendingSource`] on an interval and republishes what it finds.
///
/// Marking an item processed happens after publish succeeds, so a crash
/// between the two can redeliver the same item; downstream consumers should
/// treat delivery as at-least-once, not exactly-once.
pub struct OutboundScanner<S> {
    source: Arc<S>,
    batch_size: usize,
}

impl<S: PendingSource + 'static> OutboundScanner<S> {
    #[must_use]
    pub fn new(source: Arc<S>, batch_size: usize) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
        }
    }

    /// Run the scan loop on `interval` until the process is torn down.
    ///
    /// `client` is reused across ticks; a publish failure for one item logs
    /// and moves on to the next rather than aborting the tick.
    pub async fn run(&self, mut client: BusClient, interval: Duration) -> ! {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(err) = self.scan_once(&mut client).await {
                error!(%err, "outbound scan tick failed");
            }
        }
    }

    async fn scan_once(&self, client: &mut BusClient) -> Result<(), ScanError> {
        let items = self.source.fetch_pending(self.batch_size).await?;
        for item in items {
            match client
                .publish(item.subject.clone(), item.payload.clone())
                .await
            {
                Ok(()) => {
                    if let Err(err) = self.source.mark_processed(&item.id).await {
                        error!(%err, id = %item.id, "failed to mark item processed after publish");
                    }
                }
                Err(err) => {
                    warn!(%err, id = %item.id, "failed to publish pending item, leaving it for the next pass");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{PendingItem, PendingSource, ScanError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        items: Mutex<Vec<PendingItem>>,
        processed: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl PendingSource for RecordingSource {
        async fn fetch_pending(&self, limit: usize) -> Result<Vec<PendingItem>, ScanError> {
            let mut items = self.items.lock().unwrap();
            let drained = items.drain(..items.len().min(limit)).collect();
            Ok(drained)
        }

        async fn mark_processed(&self, id: &str) -> Result<(), ScanError> {
            self.processed.lock().unwrap().push(id.to_owned());
            Ok(())
        }
    }

    #[tokio::test]
    async fn fetch_respects_limit() {
        let source = RecordingSource::default();
        source.items.lock().unwrap().extend((0..5).map(|i| PendingItem {
            id: i.to_string(),
            subject: "out".to_owned(),
            payload: vec![],
        }));

        let batch = source.fetch_pending(2).await.unwrap();
        assert_eq!(2, batch.len());
        assert_eq!(3, source.items.lock().unwrap().len());
    }
}
