//! Entity CRUD routes: an explicit table registering one resource per entity kind.

use crate::entity::{Entity, A, B, C, D};
use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use crate::store::Repository;
use axum::{routing::get, Router};

/// `/{collection}` (list, create, update) and `/{collection}/:id` (read, delete) for one kind.
fn resource<E: Entity, R: Repository>() -> Router<AppState<R>> {
    Router::new()
        .route(
            &format!("/{}", E::COLLECTION),
            get(list::<E, R>).post(create::<E, R>).put(update::<E, R>),
        )
        .route(
            &format!("/{}/:id", E::COLLECTION),
            get(read::<E, R>).delete(delete_handler::<E, R>),
        )
}

pub fn entity_routes<R: Repository>(state: AppState<R>) -> Router {
    Router::new()
        .merge(resource::<A, R>())
        .merge(resource::<B, R>())
        .merge(resource::<C, R>())
        .merge(resource::<D, R>())
        .with_state(state)
}
