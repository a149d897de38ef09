pub mod category;
pub mod compilation_worker;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;

use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{any, get, get_service, post},
};
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeFile,
    trace::{self, TraceLayer},
};
use tracing::{Level, info};

use crate::{
    config::CompilerSettings,
    models::{AppState, Job},
};

/// Starts `num_workers` compile workers sharing one queue.
///
/// Must be called from within a tokio runtime.
pub fn spawn_workers(settings: CompilerSettings, num_workers: usize) -> AppState {
    let num_workers = num_workers.max(1);
    info!("Spawning {num_workers} compile workers...");

    let (tx, rx) = async_channel::unbounded::<Job>();

    for i in 0..num_workers {
        let rx = rx.clone();
        let settings = settings.clone();
        tokio::spawn(async move {
            compilation_worker::worker(i, rx, settings).await;
        });
    }

    AppState {
        work_queue: tx,
        compiler: settings,
        version: Arc::new(Default::default()),
    }
}

/// Builds the HTTP surface.
///
/// `rate_limit_per_second` applies to `/compile` only: a client IP may burst
/// that many requests and regains one every `1s / rate`. Clients are keyed by
/// forwarding headers first, then by `ConnectInfo`.
pub fn router(
    state: AppState,
    index_path: &Path,
    rate_limit_per_second: Option<u64>,
) -> Router {
    // pasted sources are taken whole, however large
    let mut compile_router: Router<AppState> = Router::new()
        .route(
            "/compile",
            post(handlers::compile).layer(DefaultBodyLimit::disable()),
        )
        .with_state(state.clone());

    if let Some(per_second) = rate_limit_per_second.filter(|n| *n > 0) {
        // per_second() on the builder is the refill interval, not a rate
        let governor_conf = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .period(Duration::from_nanos(1_000_000_000 / per_second))
            .burst_size(u32::try_from(per_second).unwrap_or(u32::MAX))
            .finish();

        match governor_conf {
            Some(conf) => compile_router = compile_router.layer(GovernorLayer::new(conf)),
            None => {
                tracing::warn!("Invalid rate limit {per_second}/s, /compile is not rate limited")
            }
        }
    }

    Router::new()
        .route("/", get_service(ServeFile::new(index_path)))
        .merge(compile_router)
        .route("/favicon.ico", any(handlers::favicon))
        .route("/api/v1/version", get(handlers::get_version))
        .route("/api/v1/category/titles", post(handlers::category_titles))
        .route("/api/v1/extension", post(handlers::extension_request))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO))
                .on_failure(trace::DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    use super::*;
    use crate::models::CompileStatus;

    #[tokio::test]
    async fn zero_workers_still_starts_one() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CompilerSettings {
            program: "sh".to_string(),
            flags: vec!["-c".to_string(), "exit 0".to_string(), "fakecc".to_string()],
            work_dir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(10),
        };
        let state = spawn_workers(settings, 0);

        let (reply, result) = oneshot::channel();
        state
            .work_queue
            .send(Job {
                id: Uuid::new_v4(),
                source: Bytes::from_static(b"int main() {}"),
                reply,
            })
            .await
            .unwrap();

        assert_eq!(result.await.unwrap().status, CompileStatus::Succeeded);
    }
}
