//! Application-wide error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use creator_pass::storage::StaleWrite;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Engine(#[from] creator_pass::Error),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Analytics delivery failed: {0}")]
    Delivery(String),
}

impl From<StaleWrite> for DaemonError {
    fn from(e: StaleWrite) -> Self {
        Self::Engine(creator_pass::Error::StaleWrite(e))
    }
}

pub type Result<T> = std::result::Result<T, DaemonError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl DaemonError {
    pub fn status(&self) -> StatusCode {
        use creator_pass::Error as E;

        match self {
            Self::Engine(E::InsufficientCredits { .. }) => StatusCode::PAYMENT_REQUIRED,
            Self::Engine(E::StaleWrite(_)) => StatusCode::CONFLICT,
            Self::Engine(E::InvalidStepTransition { .. } | E::NotAnUpgrade { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::UnknownRole(_) | Self::UnknownTier(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DaemonError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
