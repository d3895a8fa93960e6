use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::warn;

use busline_client::BusClient;
use busline_proxypool::ProxyPool;

/// Build a [`crate::WorkerPool`]-compatible handler that fetches `data`
/// (interpreted as a UTF-8 URL) through a pooled SOCKS5 HTTP client and
/// republishes the response body to `response_subject`.
///
/// Demonstrates the ephemeral-resource lifecycle: one proxy client is
/// borrowed per message and always returned, on every exit path. `client`
/// is shared across concurrently dispatched messages, so it is wrapped in
/// a [`tokio::sync::Mutex`]; the lock is only held for the publish call
/// itself, never across the proxied fetch.
pub fn http_get_handler(
    pool: Arc<ProxyPool>,
    client: Arc<Mutex<BusClient>>,
    response_subject: String,
    timeout: Duration,
) -> impl Fn(Vec<u8>, String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
    move |data, subject| {
        let pool = Arc::clone(&pool);
        let client = Arc::clone(&client);
        let response_subject = response_subject.clone();
        Box::pin(async move {
            let url = match std::str::from_utf8(&data) {
                Ok(url) => url.to_owned(),
                Err(err) => {
                    warn!(%err, %subject, "payload is not a valid URL");
                    return;
                }
            };

            let proxy_client = match pool.borrow().await {
                Ok(proxy_client) => proxy_client,
                Err(err) => {
                    warn!(%err, %subject, "no proxy client available");
                    return;
                }
            };

            let outcome = tokio::time::timeout(timeout, proxy_client.client().get(&url).send()).await;
            pool.return_client(proxy_client).await;

            let body = match outcome {
                Ok(Ok(response)) if response.status().is_success() => {
                    match response.bytes().await {
                        Ok(bytes) => bytes.to_vec(),
                        Err(err) => {
                            warn!(%err, %url, "failed to read upstream response body");
                            return;
                        }
                    }
                }
                Ok(Ok(response)) => {
                    warn!(status = %response.status(), %url, "upstream request failed");
                    return;
                }
                Ok(Err(err)) => {
                    warn!(%err, %url, "upstream request errored");
                    return;
                }
                Err(_) => {
                    warn!(%url, "upstream request timed out");
                    return;
                }
            };

            if let Err(err) = client.lock().await.publish(response_subject.clone(), body).await {
                warn!(%err, %url, subject = %response_subject, "failed to publish fetch response");
            }
        })
    }
}
