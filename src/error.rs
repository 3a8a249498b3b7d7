use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::accounts::repo::StoreError;

const GENERIC_FAILURE: &str = "Error occurred... Please try again.";

/// Every failure a handler can surface. Rendered as `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} already exists")]
    DuplicateAccount(&'static str),
    #[error("incorrect password")]
    CredentialMismatch,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("token signing failed")]
    Signing,
    #[error("unauthorized")]
    Unauthorized,
    #[error("store: {0}")]
    Store(StoreError),
    /// Store failure while mutating a movie list.
    #[error("list update: {0}")]
    ListUpdate(StoreError),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => ApiError::DuplicateAccount(field),
            other => ApiError::Store(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

/// `Json` body extractor whose rejection renders as an `ApiError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor whose rejection renders as an `ApiError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateAccount(_)
            | ApiError::CredentialMismatch
            | ApiError::NotFound(_)
            | ApiError::InvalidInput(_)
            | ApiError::Signing => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) | ApiError::ListUpdate(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::DuplicateAccount("username") => "Username already exists".into(),
            ApiError::DuplicateAccount(_) => "Email already exists".into(),
            ApiError::CredentialMismatch => "Incorrect Password".into(),
            ApiError::NotFound(msg) => (*msg).into(),
            ApiError::InvalidInput(msg) => msg.clone(),
            ApiError::Signing => "Session has ended, please log in again".into(),
            ApiError::Unauthorized => "Unauthorized".into(),
            ApiError::ListUpdate(_) => "Error updating user's list".into(),
            ApiError::Store(_) | ApiError::Internal(_) => GENERIC_FAILURE.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_store_error_becomes_client_error() {
        let err = ApiError::from(StoreError::Duplicate("email"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "Email already exists");

        let err = ApiError::from(StoreError::Duplicate("username"));
        assert_eq!(err.client_message(), "Username already exists");
    }

    #[test]
    fn store_failures_are_never_success() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), GENERIC_FAILURE);
    }

    #[test]
    fn auth_failures_map_to_expected_statuses() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::CredentialMismatch.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Signing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Signing.client_message(),
            "Session has ended, please log in again"
        );
    }
}
