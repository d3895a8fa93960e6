use crate::Response;

/// Error surface for [`crate::ControlChannel`]
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("connect timed out")]
    Timeout,
    #[error("i/o error")]
    Io(#[source] std::io::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("channel has been closed")]
    Closed,
    #[error("malformed response line: {0:?}")]
    MalformedResponse(String),
    #[error("command must be preceded by a successful Authenticate")]
    NotAuthenticated,
    #[error("command rejected: {} {}", .0.code, .0.text)]
    Rejected(Response),
}
