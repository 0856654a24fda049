//! Storage collaborator: the find/save/delete contract behind every resource, with PostgreSQL and memory backends.

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::{ensure_database_exists, ensure_entity_tables, PgRepository};

use crate::entity::{Entity, ID_COLUMN};
use crate::error::AppError;
use crate::sort::Sort;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Single-table persistence for any [`Entity`] kind. Each call is atomic on its own.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// All rows of `E`. Unordered unless `sort` is non-empty; unknown sort properties are rejected.
    async fn find_all<E: Entity>(&self, sort: &[Sort]) -> Result<Vec<E>, AppError>;

    async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, AppError>;

    async fn exists_by_id<E: Entity>(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.find_by_id::<E>(id).await?.is_some())
    }

    /// Insert when `id` is unset (the store assigns it), otherwise write the row with that id.
    async fn save<E: Entity>(&self, entity: E) -> Result<E, AppError>;

    /// Remove the row if present; absent ids are not an error.
    async fn delete_by_id<E: Entity>(&self, id: i64) -> Result<(), AppError>;

    /// Cheap round trip behind `/ready`.
    async fn ping(&self) -> Result<(), AppError>;
}

/// JSON object form of an entity, as stored and bound to statements.
fn entity_to_object<E: Entity>(entity: &E) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::BadRequest(format!(
            "{} must serialize to a JSON object, got {}",
            E::ENTITY_NAME,
            other
        ))),
    }
}

fn object_to_entity<E: Entity>(mut map: Map<String, Value>, id: i64) -> Result<E, AppError> {
    map.insert(ID_COLUMN.to_string(), Value::from(id));
    Ok(serde_json::from_value(Value::Object(map))?)
}
