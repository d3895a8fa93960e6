use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use crate::MetricsCollector;

pub(crate) fn router(collector: Arc<MetricsCollector>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .route("/debug/pprof/{*path}", get(pprof))
        .with_state(collector)
}

async fn metrics(State(collector): State<Arc<MetricsCollector>>) -> String {
    collector.render()
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn pprof() -> (StatusCode, &'static str) {
    (
        StatusCode::NOT_IMPLEMENTED,
        "profiling is not wired to a backend in this build",
    )
}

#[cfg(test)]
mod tests {
    use super::{health, pprof};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(StatusCode::OK, health().await);
    }

    #[tokio::test]
    async fn pprof_is_not_implemented() {
        let (status, _) = pprof().await;
        assert_eq!(StatusCode::NOT_IMPLEMENTED, status);
    }
}
