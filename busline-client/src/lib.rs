mod config;
mod error;

use futures_util::StreamExt;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use busline_gateway::proto::{
    bus_service_client::BusServiceClient, PublishRequest, SubscribeRequest,
};

pub use self::config::Env;
pub use self::error::ClientError;

/// Peer-side facade for the remote bus service
///
/// Mirrors [`busline_gateway::Gateway`]'s two operations with local
/// validation and a retry-friendly error surface.
#[derive(Clone)]
pub struct BusClient {
    inner: Option<BusServiceClient<Channel>>,
}

impl BusClient {
    /// Connect to `addr`, e.g. `http://127.0.0.1:50051`
    ///
    /// # Errors
    ///
    /// It returns an error if the transport fails to connect.
    pub async fn connect(addr: String, env: Env) -> Result<Self, ClientError> {
        let mut endpoint = Endpoint::from_shared(addr).map_err(ClientError::Transport)?;

        if matches!(env, Env::Prod) {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(ClientError::Transport)?;
        }

        let channel = endpoint.connect().await.map_err(ClientError::Transport)?;

        Ok(Self {
            inner: Some(BusServiceClient::new(channel)),
        })
    }

    fn client(&mut self) -> Result<&mut BusServiceClient<Channel>, ClientError> {
        self.inner.as_mut().ok_or(ClientError::Closed)
    }

    /// Publish `data` to `subject`
    ///
    /// # Errors
    ///
    /// It returns [`ClientError::SubjectRequired`]/[`ClientError::DataRequired`]
    /// for locally-detected validation failures, or the remote error otherwise.
    pub async fn publish(&mut self, subject: String, data: Vec<u8>) -> Result<(), ClientError> {
        validate_publish(&subject, &data)?;

        let response = self
            .client()?
            .publish(PublishRequest { subject, data })
            .await?
            .into_inner();

        if response.success {
            Ok(())
        } else {
            Err(ClientError::Remote(tonic::Status::unknown(response.message)))
        }
    }

    /// Subscribe to `subject`, awaiting `handler(data, subject)` for every received message
    ///
    /// `handler` is awaited in-line between receives, so it is the caller's
    /// responsibility to hand off slow work (e.g. to a bounded worker pool)
    /// rather than block the stream. Returns when the stream ends, a receive
    /// error occurs, or the call is canceled.
    ///
    /// # Errors
    ///
    /// It returns [`ClientError::SubjectRequired`] for a locally-detected
    /// validation failure, or the remote/transport error otherwise.
    pub async fn subscribe<F, Fut>(
        &mut self,
        subject: String,
        queue_group: String,
        mut handler: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(Vec<u8>, String) -> Fut + Send,
        Fut: std::future::Future<Output = ()> + Send,
    {
        validate_subject(&subject)?;

        let mut stream = self
            .client()?
            .subscribe(SubscribeRequest { subject, queue_group })
            .await?
            .into_inner();

        while let Some(message) = stream.next().await {
            let message = message?;
            handler(message.data, message.subject).await;
        }

        Ok(())
    }

    /// Release underlying transport resources
    ///
    /// Idempotent: calling it multiple times is a no-op.
    pub fn close(&mut self) {
        self.inner = None;
    }
}

fn validate_subject(subject: &str) -> Result<(), ClientError> {
    if subject.trim().is_empty() {
        Err(ClientError::SubjectRequired)
    } else {
        Ok(())
    }
}

fn validate_publish(subject: &str, data: &[u8]) -> Result<(), ClientError> {
    validate_subject(subject)?;
    if data.is_empty() {
        return Err(ClientError::DataRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_publish, validate_subject, ClientError};

    #[test]
    fn rejects_blank_subject() {
        assert!(matches!(
            validate_subject("   "),
            Err(ClientError::SubjectRequired)
        ));
    }

    #[test]
    fn rejects_empty_data() {
        assert!(matches!(
            validate_publish("x", &[]),
            Err(ClientError::DataRequired)
        ));
    }

    #[test]
    fn accepts_valid_publish() {
        assert!(validate_publish("test.subject", &[1, 2, 3]).is_ok());
    }
}
