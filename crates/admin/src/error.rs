//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::CurrentAdmin;
use crate::services::{AdminError, AuthError, TrialError};

/// Application-level error type for the admin console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session or credential operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Trial operation failed.
    #[error("Trial error: {0}")]
    Trial(#[from] TrialError),

    /// Allow-list management failed.
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Auth(e) if !e.is_backend_failure() => StatusCode::UNAUTHORIZED,
            Self::Trial(TrialError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Trial(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Admin(AdminError::NotFound) => StatusCode::NOT_FOUND,
            Self::Admin(AdminError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Admin(AdminError::SelfDeactivation) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Auth(_) | Self::Admin(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else if status == StatusCode::UNAUTHORIZED {
            "Unauthorized".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

/// Set the Sentry user context from the authorized admin.
pub fn set_sentry_user(admin: &CurrentAdmin) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin.id.to_string()),
            email: Some(admin.email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
