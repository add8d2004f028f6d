use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use table_layout::api::{
    self, OptimizeRequest, OptimizeResponse, ValidateRequest, ValidateResponse,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

const DEFAULT_OPTIMIZE_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Wall-clock budget for one optimize request, from `OPTIMIZE_TIMEOUT_SECS`.
fn optimize_timeout() -> Duration {
    let secs = std::env::var("OPTIMIZE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_OPTIMIZE_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

type OptimizeFailure = (StatusCode, Json<OptimizeResponse>);

/// Runs `work` on the blocking pool and gives up waiting after `limit`.
/// An abandoned task runs to completion in the background.
async fn run_blocking<T, F>(limit: Duration, work: F) -> Result<T, OptimizeFailure>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::time::timeout(limit, tokio::task::spawn_blocking(work))
        .await
        .map_err(|_| {
            tracing::warn!(seconds = limit.as_secs_f64(), "optimize timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(OptimizeResponse::failure_message(&format!(
                    "optimization exceeded {}s",
                    limit.as_secs_f64()
                ))),
            )
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "optimize task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(OptimizeResponse::failure_message("internal server error")),
            )
        })
}

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, OptimizeFailure> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /api/layout/optimize"
    );

    let result = run_blocking(optimize_timeout(), move || api::optimize(&req)).await?;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::warn!(error = %e, "rejected optimize request");
            Err((StatusCode::BAD_REQUEST, Json(OptimizeResponse::failure(&e))))
        }
    }
}

async fn validate(
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, (StatusCode, Json<ValidateResponse>)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /api/layout/validate"
    );

    match api::validate(&req) {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::warn!(error = %e, "rejected validate request");
            Err((StatusCode::BAD_REQUEST, Json(ValidateResponse::failure(&e))))
        }
    }
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/api/health", get(health))
        .route("/api/layout/optimize", post(optimize))
        .route("/api/layout/validate", post(validate))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_path = std::env::var("LOG_FILE").unwrap_or_else(|_| "development.log".to_string());
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .unwrap_or_else(|e| panic!("failed to open {log_path}: {e}"));

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_blocking_returns_result() {
        let value = run_blocking(Duration::from_secs(5), || 6 * 7).await;
        assert_eq!(value.map_err(|(status, _)| status), Ok(42));
    }

    #[tokio::test]
    async fn test_run_blocking_times_out() {
        let slow = || std::thread::sleep(Duration::from_millis(300));
        let Err((status, Json(body))) = run_blocking(Duration::from_millis(20), slow).await else {
            panic!("expected a timeout");
        };
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(!body.success);
        assert_eq!(body.count, 0);
        assert!(body.error.is_some_and(|e| e.contains("exceeded")));
    }
}
