use axum::{
    extract::State,
    routing::put,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::MovieBody,
    repo_types::{ListName, ProfileUpdate, PublicAccount},
};
use crate::{
    auth::{extractors::AuthUser, services},
    error::{ApiError, ApiJson, ApiPath},
    state::AppState,
};

const NO_SUCH_ACCOUNT: &str = "No user with that id";

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", put(update_profile).delete(delete_account))
        .route("/addToList/:list_name/:id", put(add_to_list))
        .route("/removeFromList/:list_name/:id", put(remove_from_list))
}

fn parse_list(raw: &str) -> Result<ListName, ApiError> {
    raw.parse::<ListName>().map_err(|e| {
        warn!(error = %e, "list mutation rejected");
        ApiError::InvalidInput(format!("Unknown list: {raw}"))
    })
}

#[instrument(skip(state, _user, update))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(mut update): ApiJson<ProfileUpdate>,
) -> Result<Json<PublicAccount>, ApiError> {
    if let Some(email) = update.email.take() {
        let email = services::normalize_email(&email);
        if !services::is_valid_email(&email) {
            return Err(ApiError::InvalidInput("Invalid email".into()));
        }
        update.email = Some(email);
    }
    // a blank user name leaves the stored one untouched
    update.user_name = services::normalize_user_name(update.user_name.take());
    let account = state
        .store
        .update_profile(id, update)
        .await?
        .ok_or(ApiError::NotFound(NO_SUCH_ACCOUNT))?;
    info!(account_id = %id, "profile updated");
    Ok(Json(account.into()))
}

#[instrument(skip(state, _user))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound(NO_SUCH_ACCOUNT));
    }
    info!(account_id = %id, "account deleted");
    Ok(Json(json!({ "message": "Successfully deleted user" })))
}

#[instrument(skip(state, _user, body))]
pub async fn add_to_list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath((list_name, id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<MovieBody>,
) -> Result<Json<PublicAccount>, ApiError> {
    let list = parse_list(&list_name)?;
    let account = state
        .store
        .push_to_list(id, list, body.movie)
        .await
        .map_err(ApiError::ListUpdate)?
        .ok_or(ApiError::NotFound(NO_SUCH_ACCOUNT))?;
    Ok(Json(account.into()))
}

#[instrument(skip(state, _user, body))]
pub async fn remove_from_list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath((list_name, id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<MovieBody>,
) -> Result<Json<PublicAccount>, ApiError> {
    let list = parse_list(&list_name)?;
    let movie_id = body
        .movie
        .get("id")
        .cloned()
        .ok_or_else(|| ApiError::InvalidInput("movie.id is required".into()))?;
    let account = state
        .store
        .pull_from_list(id, list, movie_id)
        .await
        .map_err(ApiError::ListUpdate)?
        .ok_or(ApiError::NotFound(NO_SUCH_ACCOUNT))?;
    Ok(Json(account.into()))
}
