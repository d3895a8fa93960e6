/// Error surface for [`crate::MetricsCollector`]
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("a metrics recorder is already installed in this process: {0}")]
    AlreadyInitialized(String),
    #[error("failed to bind the metrics HTTP server")]
    Bind(#[source] std::io::Error),
    #[error("metrics HTTP server failed")]
    Serve(#[source] std::io::Error),
}
