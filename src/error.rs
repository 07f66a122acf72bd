use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Rejected at the boundary, before any backend call
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The record names no parent (pet or owner) to attach to
    #[error("Missing {parent} for {resource}")]
    MissingParent {
        resource: &'static str,
        parent: &'static str,
    },

    #[error("Authentication required")]
    Unauthenticated,

    /// Credential changes on a stale session need the current password
    #[error("Recent login required")]
    RecentLoginRequired,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{resource} belongs to another user")]
    Forbidden { resource: &'static str },

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Another mutation of the same list entry has not settled yet
    #[error("A change to this entry is already in progress")]
    MutationInProgress,

    #[error("Image storage error: {0}")]
    Storage(String),

    #[error("Mail delivery error: {0}")]
    Mail(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-success answer from the HTTP API, as seen by the client
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to {operation}")]
    Internal { operation: String },

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::MissingParent { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthenticated | Error::InvalidCredentials | Error::RecentLoginRequired => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } | Error::MutationInProgress => StatusCode::CONFLICT,
            Error::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::Mail(_)
            | Error::Config(_)
            | Error::Internal { .. }
            | Error::Database(_)
            | Error::Redis(_)
            | Error::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent next to the message.
    pub fn code(&self) -> &str {
        match self {
            Error::Validation { .. } => "validation",
            Error::MissingParent { .. } => "missing_parent",
            Error::Unauthenticated => "unauthenticated",
            Error::RecentLoginRequired => "recent_login_required",
            Error::InvalidCredentials => "invalid_credentials",
            Error::Forbidden { .. } => "forbidden",
            Error::NotFound { .. } => "not_found",
            Error::Conflict { .. } => "conflict",
            Error::MutationInProgress => "mutation_in_progress",
            Error::Storage(_) => "storage",
            Error::Api { code, .. } => code,
            _ => "internal",
        }
    }

    /// Message safe to show a user; internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Mail(_)
            | Error::Config(_)
            | Error::Internal { .. }
            | Error::Database(_)
            | Error::Redis(_)
            | Error::Http(_) => "Something went wrong, please try again".to_string(),
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Database(_)
            | Error::Redis(_)
            | Error::Http(_)
            | Error::Mail(_)
            | Error::Config(_)
            | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Storage(_) => tracing::warn!("Storage error: {}", self),
            Error::Unauthenticated
            | Error::InvalidCredentials
            | Error::RecentLoginRequired
            | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            _ => tracing::debug!("Client error: {}", self),
        }

        tracing::Span::current().record("error", self.code());

        (
            self.status_code(),
            Json(json!({"error": self.user_message(), "code": self.code()})),
        )
            .into_response()
    }
}
