use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::game::GameService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub game_service: Arc<GameService>,
}

impl AppState {
    pub fn new(game_service: Arc<GameService>) -> Self {
        Self { game_service }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Rack does not match: {0}")]
    RackMismatch(String),

    #[error("Words not found: {}", .0.join(", "))]
    WordsNotFound(Vec<String>),

    #[error("Words are not linked: {}", .0.join(", "))]
    WordsNotLinked(Vec<String>),

    #[error("Center cannot be empty (row {row}, column {column})")]
    CenterEmpty { row: usize, column: usize },

    #[error("Cell is already occupied (row {row}, column {column})")]
    CellOccupied { row: usize, column: usize },

    #[error("Insufficient tiles: requested {requested}, remaining {remaining}")]
    InsufficientTiles { requested: usize, remaining: usize },

    #[error("Version conflict: expected {expected}, actual {actual}")]
    VersionConflict { expected: i64, actual: i64 },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::NotAuthorized(_) => "NOT_AUTHORIZED",
            AppError::RackMismatch(_) => "RACK_MISMATCH",
            AppError::WordsNotFound(_) => "WORDS_NOT_FOUND",
            AppError::WordsNotLinked(_) => "WORDS_NOT_LINKED",
            AppError::CenterEmpty { .. } => "CENTER_EMPTY",
            AppError::CellOccupied { .. } => "CELL_OCCUPIED",
            AppError::InsufficientTiles { .. } => "INSUFFICIENT_TILES",
            AppError::VersionConflict { .. } => "VERSION_CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal => "INTERNAL",
        }
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, AppError::VersionConflict { .. })
    }

    /// Infrastructure failures sit outside the game rules taxonomy
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AppError::DatabaseError(_) | AppError::Internal)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            AppError::InvalidState(_)
            | AppError::RackMismatch(_)
            | AppError::InsufficientTiles { .. }
            | AppError::VersionConflict { .. } => StatusCode::CONFLICT,
            AppError::WordsNotFound(_)
            | AppError::WordsNotLinked(_)
            | AppError::CenterEmpty { .. }
            | AppError::CellOccupied { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match &self {
            AppError::WordsNotFound(words) | AppError::WordsNotLinked(words) => {
                json!({ "words": words })
            }
            AppError::CenterEmpty { row, column } | AppError::CellOccupied { row, column } => {
                json!({ "row": row, "column": column })
            }
            AppError::InsufficientTiles {
                requested,
                remaining,
            } => json!({ "requested": requested, "remaining": remaining }),
            AppError::VersionConflict { expected, actual } => {
                json!({ "expected": expected, "actual": actual })
            }
            _ => serde_json::Value::Null,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "details": details,
        }));

        (status, body).into_response()
    }
}
