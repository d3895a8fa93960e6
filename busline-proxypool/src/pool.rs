use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Proxy};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::credentials::{random_credentials, random_user_agent};
use crate::error::ProxyPoolError;

/// One pooled HTTP client bound to a SOCKS5 proxy under its own credentials
/// and User-Agent.
pub struct PooledClient {
    client: Client,
    id: u64,
}

impl PooledClient {
    /// The underlying [`reqwest::Client`], already configured with the proxy.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn build_client(proxy_addr: &str, id: u64) -> Result<PooledClient, ProxyPoolError> {
    let creds = random_credentials();
    let proxy_url = format!("socks5h://{}:{}@{proxy_addr}", creds.username, creds.password);
    let client = Client::builder()
        .proxy(Proxy::all(proxy_url).map_err(ProxyPoolError::Build)?)
        .user_agent(random_user_agent())
        .build()
        .map_err(ProxyPoolError::Build)?;
    Ok(PooledClient { client, id })
}

/// Configuration for [`ProxyPool::construct`]
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    pub pool_size: usize,
    pub refresh_interval: Duration,
    pub proxy_addr: String,
}

/// A fixed-size pool of SOCKS5-backed HTTP clients, refreshed on a timer.
///
/// Idle clients sit in a bounded channel; [`borrow`](Self::borrow) takes one
/// out and [`return_client`](Self::return_client) puts it back. A background
/// task periodically drains idle clients and replaces them with freshly
/// built ones (new credentials, new User-Agent), stopping a pass as soon as
/// the channel runs dry so clients currently on loan are left untouched. A
/// client that fails to rebuild is dropped rather than kept around stale,
/// so the pool may temporarily run below capacity.
pub struct ProxyPool {
    free_tx: mpsc::Sender<PooledClient>,
    free_rx: Mutex<mpsc::Receiver<PooledClient>>,
    config: ProxyPoolConfig,
    shutdown: AtomicBool,
    refresh_handle: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl ProxyPool {
    /// Build `pool_size` clients against `proxy_addr` and start the refresh loop.
    ///
    /// # Errors
    ///
    /// Returns an error if any initial client fails to build.
    pub async fn construct(config: ProxyPoolConfig) -> Result<Arc<Self>, ProxyPoolError> {
        let (free_tx, free_rx) = mpsc::channel(config.pool_size.max(1));
        let next_id = AtomicU64::new(0);

        for _ in 0..config.pool_size {
            let id = next_id.fetch_add(1, Ordering::Relaxed);
            let entry = build_client(&config.proxy_addr, id)?;
            free_tx
                .send(entry)
                .await
                .expect("receiver is held by the pool being constructed");
        }

        let pool = Arc::new(Self {
            free_tx,
            free_rx: Mutex::new(free_rx),
            config,
            shutdown: AtomicBool::new(false),
            refresh_handle: Mutex::new(None),
            next_id,
        });

        let handle = tokio::spawn(Self::refresh_loop(Arc::clone(&pool)));
        *pool.refresh_handle.lock().await = Some(handle);

        Ok(pool)
    }

    /// Take an idle client out of the pool, waiting if none is free.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyPoolError::Closed`] once the pool has been shut down.
    pub async fn borrow(&self) -> Result<PooledClient, ProxyPoolError> {
        self.free_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(ProxyPoolError::Closed)
    }

    /// Return a previously borrowed client to the pool.
    ///
    /// A no-op if the pool has since shut down; the client is simply dropped.
    pub async fn return_client(&self, client: PooledClient) {
        let _ = self.free_tx.send(client).await;
    }

    /// Stop the refresh loop and drain the pool.
    ///
    /// Idempotent: only the first call has any effect.
    pub async fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.refresh_handle.lock().await.take() {
            handle.abort();
        }
        let mut rx = self.free_rx.lock().await;
        rx.close();
        while rx.try_recv().is_ok() {}
    }

    async fn refresh_loop(pool: Arc<Self>) {
        let mut ticker = tokio::time::interval(pool.config.refresh_interval);
        ticker.tick().await; // first tick fires immediately; the pool is already fresh

        loop {
            ticker.tick().await;
            if pool.shutdown.load(Ordering::SeqCst) {
                return;
            }
            pool.refresh_idle_pass().await;
        }
    }

    async fn refresh_idle_pass(&self) {
        let idle_count = self.free_rx.lock().await.len();

        for _ in 0..idle_count {
            let stale = {
                let mut rx = self.free_rx.lock().await;
                match rx.try_recv() {
                    Ok(entry) => entry,
                    Err(_) => return, // channel ran dry: the rest are on loan
                }
            };

            match build_client(&self.config.proxy_addr, stale.id) {
                Ok(fresh) => {
                    if self.free_tx.send(fresh).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    warn!(%err, "failed to refresh proxy client, dropping it from the pool");
                    drop(stale);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ProxyPool, ProxyPoolConfig, ProxyPoolError};
    use claims::{assert_matches, assert_ok};
    use std::time::Duration;

    fn config(pool_size: usize) -> ProxyPoolConfig {
        ProxyPoolConfig {
            pool_size,
            refresh_interval: Duration::from_secs(3600),
            proxy_addr: "127.0.0.1:1080".to_owned(),
        }
    }

    #[tokio::test]
    async fn borrow_and_return_round_trip() {
        let pool = assert_ok!(ProxyPool::construct(config(2)).await);
        let client = assert_ok!(pool.borrow().await);
        pool.return_client(client).await;
        assert_ok!(pool.borrow().await);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_closes_borrow() {
        let pool = assert_ok!(ProxyPool::construct(config(1)).await);
        pool.shutdown().await;
        pool.shutdown().await;
        assert_matches!(pool.borrow().await, Err(ProxyPoolError::Closed));
    }
}
