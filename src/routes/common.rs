//! Common routes: health, readiness, version.

use crate::state::AppState;
use crate::store::Repository;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<&'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready<R: Repository>(State(state): State<AppState<R>>) -> (StatusCode, Json<ReadyBody>) {
    if let Err(e) = state.repo.ping().await {
        tracing::warn!(error = %e, "storage not ready");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                storage: Some("unavailable"),
            }),
        );
    }
    (
        StatusCode::OK,
        Json(ReadyBody {
            status: "ok",
            storage: Some("ok"),
        }),
    )
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes (no state): GET /health, GET /version, GET /info.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/info", get(version))
}

/// Common routes including readiness against the storage collaborator.
pub fn common_routes_with_ready<R: Repository>(state: AppState<R>) -> Router {
    Router::new()
        .route("/ready", get(ready::<R>))
        .with_state(state)
        .merge(common_routes())
}
