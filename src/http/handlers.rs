//! Request handlers.
//!
//! Handlers only extract input, call into [`crate::users`] and map the result
//! to a response. Error classification happens in the store.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::users::{self, StoreError, User, UserInput, UserStore};

/// Body of `PUT /users/{id}`.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct Status {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    fn success() -> Self {
        Self {
            state: "success",
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            state: "error",
            message: Some(message),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::NotFound { .. } => {
                tracing::debug!(error = %self, "record not found");
                StatusCode::NOT_FOUND
            }
            StoreError::Storage { .. } => {
                tracing::error!(error = %self, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(Status::error(self.to_string()))).into_response()
    }
}

/// Anything a handler can answer with besides success.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request path or body could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                tracing::debug!(error = %message, "rejected request");
                (StatusCode::BAD_REQUEST, Json(Status::error(message))).into_response()
            }
            ApiError::Store(e) => e.into_response(),
        }
    }
}

/// Liveness check.
pub async fn ping() -> &'static str {
    "pong"
}

pub async fn get_user<S: UserStore>(
    State(store): State<Arc<S>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = id?;
    Ok(Json(store.find(id).await?))
}

pub async fn update_user<S: UserStore>(
    State(store): State<Arc<S>>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<Status>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let input = UserInput { id, name: body.name };
    users::update_user(store.as_ref(), &input).await?;
    Ok(Json(Status::success()))
}
