//! Metrics-instrumented publish/subscribe wrapper on top of [`Client`]
//!
//! This is the thin "Bus Operations" layer: it adds no new wire behavior over
//! [`Client`], only counters and histograms describing what already happens.

use std::time::Instant;

use bytes::Bytes;
use futures_util::StreamExt;
use metrics::{counter, gauge, histogram};
use busline_proto::{error::ServerError, QueueGroup, ServerMessage, Subject};

use crate::core::{error::ClientClosedError, Client, Subscription};

const METRIC_NAMESPACE: &str = "bus";

/// Error returned by [`BusOps::publish`]
#[derive(Debug, thiserror::Error)]
#[error("publish failed")]
pub struct PublishFailed(#[source] ClientClosedError);

/// Error returned by [`BusOps::subscribe`]
#[derive(Debug, thiserror::Error)]
#[error("subscribe failed")]
pub struct SubscribeFailed(#[source] ClientClosedError);

/// A per-process wrapper around [`Client`] that records the named metrics
/// from the bus operations contract
#[derive(Debug, Clone)]
pub struct BusOps {
    client: Client,
}

impl BusOps {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Publish `data` to `subject`
    ///
    /// On success increments `bus_messages_published_total` and observes
    /// `bus_publish_latency_seconds`. On failure increments
    /// `bus_publish_failures_total`.
    ///
    /// # Errors
    ///
    /// It returns an error if the underlying connection is closed.
    pub async fn publish(&self, subject: Subject, data: Bytes) -> Result<(), PublishFailed> {
        let start = Instant::now();
        let result = self.client.publish(subject).payload(data).await;

        match result {
            Ok(()) => {
                counter!(format!("{METRIC_NAMESPACE}_messages_published_total")).increment(1);
                histogram!(format!("{METRIC_NAMESPACE}_publish_latency_seconds"))
                    .record(start.elapsed().as_secs_f64());
                Ok(())
            }
            Err(err) => {
                counter!(format!("{METRIC_NAMESPACE}_publish_failures_total")).increment(1);
                Err(PublishFailed(err))
            }
        }
    }

    /// Subscribe to `subject`, balancing deliveries across `queue_group` members when set
    ///
    /// Returns a [`MeteredSubscription`] which increments `bus_messages_received_total`
    /// and observes `bus_processing_duration_seconds` around every item the caller pulls
    /// from it. `bus_active_subscriptions` is incremented on creation and decremented when
    /// the subscription is dropped.
    ///
    /// # Errors
    ///
    /// It returns an error if the underlying connection is closed.
    pub async fn subscribe(
        &self,
        subject: Subject,
        queue_group: Option<QueueGroup>,
    ) -> Result<MeteredSubscription, SubscribeFailed> {
        let inner = self
            .client
            .subscribe(subject, queue_group)
            .await
            .map_err(SubscribeFailed)?;

        gauge!(format!("{METRIC_NAMESPACE}_active_subscriptions")).increment(1.0);

        Ok(MeteredSubscription { inner })
    }
}

/// A [`Subscription`] that records `bus_messages_received_total` and
/// `bus_processing_duration_seconds` as the caller consumes it, and decrements
/// `bus_active_subscriptions` on drop
#[derive(Debug)]
pub struct MeteredSubscription {
    inner: Subscription,
}

impl MeteredSubscription {
    /// Pull the next message, timing how long the caller spends waiting plus
    /// processing before calling this method again
    ///
    /// Returns `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Result<ServerMessage, ServerError>> {
        let start = Instant::now();
        let item = self.inner.next().await;

        if item.as_ref().is_some_and(Result::is_ok) {
            counter!(format!("{METRIC_NAMESPACE}_messages_received_total")).increment(1);
            histogram!(format!("{METRIC_NAMESPACE}_processing_duration_seconds"))
                .record(start.elapsed().as_secs_f64());
        }

        item
    }
}

impl Drop for MeteredSubscription {
    fn drop(&mut self) {
        gauge!(format!("{METRIC_NAMESPACE}_active_subscriptions")).decrement(1.0);
    }
}
