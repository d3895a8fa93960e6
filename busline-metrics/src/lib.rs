//! Process-wide metrics registry with an HTTP exposition surface

mod error;
mod sampler;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use self::error::MetricsError;

/// Process-wide metrics registry plus its background sampler.
///
/// [`init`](Self::init) installs the global [`metrics`] recorder exactly
/// once per process; [`start`](Self::start) spawns the sampler that feeds
/// default runtime gauges on an interval; [`serve`](serve) exposes the
/// registry's Prometheus text exposition plus `/health` and
/// `/debug/pprof/*` over HTTP.
pub struct MetricsCollector {
    handle: PrometheusHandle,
    sampler: Option<JoinHandle<()>>,
    stop: Arc<Notify>,
}

impl MetricsCollector {
    /// Install the global Prometheus recorder for this process.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::AlreadyInitialized`] if a recorder has
    /// already been installed.
    pub fn init() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|err| MetricsError::AlreadyInitialized(err.to_string()))?;

        Ok(Self {
            handle,
            sampler: None,
            stop: Arc::new(Notify::new()),
        })
    }

    /// Start the background sampler, recording default runtime gauges every `interval`.
    ///
    /// A no-op if the sampler is already running.
    pub fn start(&mut self, interval: Duration) {
        if self.sampler.is_some() {
            return;
        }
        let stop = Arc::clone(&self.stop);
        self.sampler = Some(tokio::spawn(sampler::run(interval, stop)));
    }

    /// Ask the sampler to stop, waiting up to `deadline` for it to exit.
    ///
    /// Logs a warning and abandons (but does not abort) the task if it
    /// hasn't stopped by the deadline.
    pub async fn stop_with_timeout(&mut self, deadline: Duration) {
        let Some(handle) = self.sampler.take() else {
            return;
        };
        self.stop.notify_one();
        if tokio::time::timeout(deadline, handle).await.is_err() {
            warn!(?deadline, "metrics sampler did not stop within the deadline");
        }
    }

    /// Render the current Prometheus text exposition.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// A running metrics HTTP server
pub struct MetricsServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl MetricsServer {
    /// Bind `addr` and start serving `/metrics`, `/health` and `/debug/pprof/*`.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Bind`] if the address cannot be bound.
    pub async fn start(
        addr: SocketAddr,
        collector: Arc<MetricsCollector>,
    ) -> Result<Self, MetricsError> {
        let listener = TcpListener::bind(addr).await.map_err(MetricsError::Bind)?;
        let addr = listener.local_addr().map_err(MetricsError::Bind)?;
        let router = server::router(collector);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(%addr, "starting metrics server");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Initiate a graceful drain. Safe to call multiple times.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Serve`] if the underlying HTTP task failed.
    pub async fn graceful_stop(&mut self) -> Result<(), MetricsError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            return handle.await.unwrap_or(Ok(())).map_err(MetricsError::Serve);
        }
        Ok(())
    }
}
