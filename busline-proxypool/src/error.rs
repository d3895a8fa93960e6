/// Error surface for [`crate::ProxyPool`]
#[derive(Debug, thiserror::Error)]
pub enum ProxyPoolError {
    #[error("failed to build proxy client")]
    Build(#[source] reqwest::Error),
    #[error("pool has been shut down")]
    Closed,
}
