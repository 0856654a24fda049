//! Typed errors and HTTP mapping.

use crate::response::FailureAlert;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key} '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Failures while preparing storage before the server starts.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Client input rejected for one entity kind; answered with alert headers.
    #[error("{message}")]
    BadRequestAlert {
        entity_name: &'static str,
        error_key: &'static str,
        message: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn id_exists(entity_name: &'static str) -> Self {
        AppError::BadRequestAlert {
            entity_name,
            error_key: "idexists",
            message: format!("A new {} cannot already have an ID", entity_name),
        }
    }

    pub fn id_null(entity_name: &'static str) -> Self {
        AppError::BadRequestAlert {
            entity_name,
            error_key: "idnull",
            message: "Invalid id".into(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn error_response(status: StatusCode, code: &str, message: String, details: Option<serde_json::Value>) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: code.to_string(),
            message,
            details,
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(_) | AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND.into_response(),
            AppError::BadRequestAlert {
                entity_name,
                error_key,
                message,
            } => {
                let details = serde_json::json!({
                    "entity_name": entity_name,
                    "error_key": error_key,
                });
                let mut response = error_response(StatusCode::BAD_REQUEST, "bad_request", message.clone(), Some(details));
                response.extensions_mut().insert(FailureAlert {
                    entity_name,
                    error_key,
                    message,
                });
                response
            }
            AppError::BadRequest(_) => {
                let message = self.to_string();
                error_response(StatusCode::BAD_REQUEST, "bad_request", message, None)
            }
            AppError::Db(_) | AppError::Serialization(_) => {
                tracing::error!(error = %self, "request failed");
                let code = match &self {
                    AppError::Db(_) => "database_error",
                    _ => "internal_error",
                };
                let message = self.to_string();
                error_response(StatusCode::INTERNAL_SERVER_ERROR, code, message, None)
            }
        }
    }
}
