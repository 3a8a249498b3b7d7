use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    accounts::repo_types::PublicAccount,
    auth::{
        dto::{LoginRequest, LoginResponse, SignupRequest, SignupResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::{ApiError, ApiJson, ApiPath},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/test", get(test_endpoint))
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/:id", get(profile))
        .route("/email/:email", get(by_email))
        .route("/messages", get(messages))
}

pub async fn test_endpoint() -> Json<Value> {
    Json(json!({ "message": "User endpoint OK! ✅" }))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let account = services::signup(state.store.as_ref(), payload).await?;
    Ok(Json(SignupResponse {
        user: account.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let res = services::login(state.store.as_ref(), &keys, payload).await?;
    Ok(Json(res))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

/// Profile of the token holder. The path id is informational only.
#[instrument(skip(state, user))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state
        .store
        .find_by_id(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    debug!(account_id = %user.id, requested = %id, "profile");
    Ok(Json(ProfileResponse {
        id: account.id,
        name: account.display_name(),
        email: account.email,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub user_data: PublicAccount,
}

#[instrument(skip(state, user))]
pub async fn by_email(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(email): ApiPath<String>,
) -> Result<Json<UserDataResponse>, ApiError> {
    let account = state
        .store
        .find_by_id(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    debug!(account_id = %user.id, requested = %email, "user data");
    Ok(Json(UserDataResponse {
        user_data: account.into(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    pub id: Uuid,
    pub email: String,
    pub message: Vec<String>,
    pub same_user: Option<PublicAccount>,
}

#[instrument(skip(state, user))]
pub async fn messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessagesResponse>, ApiError> {
    let same_user = state.store.find_by_id(user.id).await?.map(PublicAccount::from);
    Ok(Json(MessagesResponse {
        id: user.id,
        email: user.email,
        message: (1..=9).map(|i| format!("message {i}")).collect(),
        same_user,
    }))
}
