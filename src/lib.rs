//! myapp: REST CRUD backend for the A, B, C and D resources.

pub mod config;
pub mod entity;
pub mod error;
pub mod response;
pub mod sort;
pub mod sql;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use config::{Settings, StorageKind};
pub use entity::{Entity, A, B, C, D};
pub use error::{AppError, BootstrapError, ConfigError};
pub use response::Alerts;
pub use routes::{app, common_routes, common_routes_with_ready, entity_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_entity_tables, MemoryRepository, PgRepository, Repository};
