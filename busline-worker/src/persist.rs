use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::warn;

use busline_client::BusClient;

/// Payload accepted by the persister variant of [`crate::WorkerPool`].
#[derive(Debug, Deserialize)]
pub struct PersistPayload {
    pub id: String,
    pub document: serde_json::Value,
}

/// Backing store for the persister variant of [`crate::WorkerPool`].
///
/// The document-store driver itself is an external collaborator; this
/// trait is only the boundary the worker calls through, honoring a
/// 10-second save timeout.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save(&self, id: &str, document: &serde_json::Value) -> Result<(), PersistError>;
}

#[derive(Debug, thiserror::Error)]
#[error("document store operation failed")]
pub struct PersistError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// Build a [`crate::WorkerPool`]-compatible handler that parses `data` as a
/// [`PersistPayload`], saves it through `store` within `timeout`, and
/// republishes a confirmation (the saved id) to `response_subject`.
pub fn document_persist_handler<S>(
    store: Arc<S>,
    client: Arc<Mutex<BusClient>>,
    response_subject: String,
    timeout: Duration,
) -> impl Fn(Vec<u8>, String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static
where
    S: DocumentStore + 'static,
{
    move |data, subject| {
        let store = Arc::clone(&store);
        let client = Arc::clone(&client);
        let response_subject = response_subject.clone();
        Box::pin(async move {
            let payload: PersistPayload = match serde_json::from_slice(&data) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%err, %subject, "payload is not a valid persist document");
                    return;
                }
            };

            match tokio::time::timeout(timeout, store.save(&payload.id, &payload.document)).await {
                Ok(Ok(())) => {
                    if let Err(err) = client
                        .lock()
                        .await
                        .publish(response_subject.clone(), payload.id.clone().into_bytes())
                        .await
                    {
                        warn!(%err, id = %payload.id, subject = %response_subject, "failed to publish persist confirmation");
                    }
                }
                Ok(Err(err)) => warn!(%err, id = %payload.id, "failed to save document"),
                Err(_) => warn!(id = %payload.id, "document save timed out"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PersistPayload;

    #[test]
    fn payload_parses_from_json() {
        let payload: PersistPayload =
            serde_json::from_str(r#"{"id":"doc-1","document":{"a":1}}"#).unwrap();
        assert_eq!("doc-1", payload.id);
        assert_eq!(1, payload.document["a"]);
    }
}
