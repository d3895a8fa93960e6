use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataValue;
use tonic::{Request, Response, Status};
use tracing::warn;
use busline_broker::BusOps;
use busline_proto::{QueueGroup, Subject};

use crate::{
    pool::ResponsePool,
    proto::{bus_service_server::BusService, Message, PublishRequest, PublishResponse, SubscribeRequest},
};

/// The [`BusService`] implementation
///
/// Bridges the broker's push-callback subscription model onto a
/// server-streaming RPC by forwarding every delivered message into a bounded
/// handoff queue drained by the streaming loop.
#[derive(Clone)]
pub struct BusServiceImpl {
    ops: BusOps,
    channel_buffer: usize,
}

impl BusServiceImpl {
    #[must_use]
    pub fn new(ops: BusOps, channel_buffer: usize) -> Self {
        Self { ops, channel_buffer }
    }
}

fn validate_publish(request: &PublishRequest) -> Result<(), Status> {
    if request.subject.trim().is_empty() {
        return Err(Status::invalid_argument("subject must not be empty"));
    }
    if request.data.is_empty() {
        return Err(Status::invalid_argument("data must not be empty"));
    }
    Ok(())
}

fn validate_subscribe(request: &SubscribeRequest) -> Result<Subject, Status> {
    if request.subject.trim().is_empty() {
        return Err(Status::invalid_argument("subject must not be empty"));
    }
    Subject::try_from(request.subject.clone())
        .map_err(|err| Status::invalid_argument(format!("invalid subject: {err}")))
}

#[tonic::async_trait]
impl BusService for BusServiceImpl {
    async fn publish(
        &self,
        request: Request<PublishRequest>,
    ) -> Result<Response<PublishResponse>, Status> {
        let request = request.into_inner();
        validate_publish(&request)?;

        let subject = Subject::try_from(request.subject)
            .map_err(|err| Status::invalid_argument(format!("invalid subject: {err}")))?;

        match self.ops.publish(subject, Bytes::from(request.data)).await {
            Ok(()) => Ok(Response::new(PublishResponse {
                success: true,
                message: String::new(),
            })),
            Err(err) => {
                warn!(%err, "publish failed");
                let mut response = Response::new(PublishResponse {
                    success: false,
                    message: err.to_string(),
                });
                // Surface the failure to the transport layer too, not just the body,
                // so middleware/clients that only inspect metadata still see it.
                if let Ok(value) = MetadataValue::try_from(err.to_string()) {
                    response.metadata_mut().insert("x-bus-error", value);
                }
                Ok(response)
            }
        }
    }

    type SubscribeStream =
        Pin<Box<dyn tokio_stream::Stream<Item = Result<Message, Status>> + Send + 'static>>;

    async fn subscribe(
        &self,
        request: Request<SubscribeRequest>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let inner = request.into_inner();
        let subject = validate_subscribe(&inner)?;
        let queue_group = (!inner.queue_group.is_empty())
            .then(|| QueueGroup::try_from(inner.queue_group))
            .transpose()
            .map_err(|err| Status::invalid_argument(format!("invalid queue group: {err}")))?;

        let mut subscription = self
            .ops
            .subscribe(subject, queue_group)
            .await
            .map_err(|err| Status::internal(err.to_string()))?;

        let (tx, rx) = mpsc::channel(self.channel_buffer);
        let pool = ResponsePool::new();

        tokio::spawn(async move {
            loop {
                let Some(item) = subscription.next().await else {
                    break;
                };

                let mut response = pool.get();
                let result = match item {
                    Ok(message) => {
                        response.subject = message.base.subject.to_string();
                        response.data = message.base.payload.to_vec();
                        Ok(response.clone())
                    }
                    Err(err) => Err(Status::internal(err.to_string())),
                };
                pool.put(response);

                if tx.send(result).await.is_err() {
                    // The client dropped the stream (CANCELED); the subscription is
                    // unregistered when `subscription` goes out of scope below.
                    break;
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

#[cfg(test)]
mod tests {
    use tonic::Code;

    use super::{validate_publish, validate_subscribe};
    use crate::proto::{PublishRequest, SubscribeRequest};

    #[test]
    fn rejects_empty_subject() {
        let err = validate_publish(&PublishRequest {
            subject: "   ".to_owned(),
            data: vec![1],
        })
        .unwrap_err();
        assert_eq!(Code::InvalidArgument, err.code());
        assert!(err.message().contains("subject"));
    }

    #[test]
    fn rejects_empty_data() {
        let err = validate_publish(&PublishRequest {
            subject: "x".to_owned(),
            data: vec![],
        })
        .unwrap_err();
        assert_eq!(Code::InvalidArgument, err.code());
        assert!(err.message().contains("data"));
    }

    #[test]
    fn accepts_valid_publish() {
        assert!(validate_publish(&PublishRequest {
            subject: "test.subject".to_owned(),
            data: vec![1, 2, 3],
        })
        .is_ok());
    }

    #[test]
    fn rejects_empty_subscribe_subject() {
        let err = validate_subscribe(&SubscribeRequest {
            subject: String::new(),
            queue_group: String::new(),
        })
        .unwrap_err();
        assert_eq!(Code::InvalidArgument, err.code());
    }
}
