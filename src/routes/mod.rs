//! Router assembly: operational routes, the entity API under `/api`, and shared layers.

mod common;
mod entity;

pub use common::{common_routes, common_routes_with_ready};
pub use entity::entity_routes;

use crate::response::attach_failure_alert;
use crate::state::AppState;
use crate::store::Repository;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Mount point of the entity collections.
pub const API_PREFIX: &str = "/api";

/// Full application router.
pub fn app<R: Repository>(state: AppState<R>) -> Router {
    let body_limit = state.settings.body_limit;
    let alerts = state.alerts.clone();
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest(API_PREFIX, entity_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(middleware::map_response_with_state(alerts, attach_failure_alert)),
        )
}
