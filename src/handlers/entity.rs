//! Entity CRUD handlers, generic over the entity kind and the repository.

use crate::entity::Entity;
use crate::error::AppError;
use crate::routes::API_PREFIX;
use crate::service::CrudService;
use crate::sort::Sort;
use crate::state::AppState;
use crate::store::Repository;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};

pub async fn create<E: Entity, R: Repository>(
    State(state): State<AppState<R>>,
    Json(entity): Json<E>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(?entity, "REST request to save {}", E::ENTITY_NAME);
    let result = CrudService::create(state.repo.as_ref(), entity).await?;
    let id = result.id().map(|id| id.to_string()).unwrap_or_default();
    let mut headers = state.alerts.entity_created(E::ENTITY_NAME, &id);
    let location = format!("{}/{}/{}", API_PREFIX, E::COLLECTION, id);
    if let Ok(v) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, v);
    }
    Ok((StatusCode::CREATED, headers, Json(result)))
}

pub async fn update<E: Entity, R: Repository>(
    State(state): State<AppState<R>>,
    Json(entity): Json<E>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(?entity, "REST request to update {}", E::ENTITY_NAME);
    let result = CrudService::update(state.repo.as_ref(), entity).await?;
    let id = result.id().map(|id| id.to_string()).unwrap_or_default();
    let headers = state.alerts.entity_updated(E::ENTITY_NAME, &id);
    Ok((StatusCode::OK, headers, Json(result)))
}

pub async fn list<E: Entity, R: Repository>(
    State(state): State<AppState<R>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!("REST request to get all {}", E::COLLECTION);
    let sort = Sort::from_query(&params)?;
    let rows = CrudService::list::<E, R>(state.repo.as_ref(), &sort).await?;
    Ok(Json(rows))
}

pub async fn read<E: Entity, R: Repository>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(id, "REST request to get {}", E::ENTITY_NAME);
    let row = CrudService::read::<E, R>(state.repo.as_ref(), id).await?;
    Ok(Json(row))
}

pub async fn delete<E: Entity, R: Repository>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(id, "REST request to delete {}", E::ENTITY_NAME);
    CrudService::delete::<E, R>(state.repo.as_ref(), id).await?;
    let headers = state.alerts.entity_deleted(E::ENTITY_NAME, &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers))
}
