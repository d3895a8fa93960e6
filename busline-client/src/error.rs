/// Error surface shared by [`crate::BusClient::publish`] and [`crate::BusClient::subscribe`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("subject is required")]
    SubjectRequired,
    #[error("data is required")]
    DataRequired,
    #[error("operation was canceled")]
    Canceled,
    #[error("client has been closed")]
    Closed,
    #[error("remote error")]
    Remote(#[source] tonic::Status),
    #[error("transport error")]
    Transport(#[source] tonic::transport::Error),
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        if status.code() == tonic::Code::Cancelled {
            Self::Canceled
        } else {
            Self::Remote(status)
        }
    }
}
