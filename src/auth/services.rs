use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    dto::{LoginRequest, LoginResponse, SignupRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password, HashingError},
};
use crate::{
    accounts::{
        repo::AccountStore,
        repo_types::{Account, NewAccount},
    },
    error::ApiError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims a user name; blank names count as absent.
pub(crate) fn normalize_user_name(user_name: Option<String>) -> Option<String> {
    user_name
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
}

/// Runs a CPU-bound hashing job on the blocking pool.
async fn blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, HashingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Creates an account with a hashed credential.
///
/// The email lookup is only a fast path; the store's uniqueness constraint
/// decides races between concurrent signups.
pub async fn signup(store: &dyn AccountStore, payload: SignupRequest) -> Result<Account, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::InvalidInput("Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::InvalidInput("Password is required".into()));
    }

    if store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::DuplicateAccount("email"));
    }

    let password = payload.password;
    let password_hash = blocking(move || hash_password(&password)).await?;

    let account = store
        .create(NewAccount {
            email,
            user_name: normalize_user_name(payload.user_name),
            first_name: payload.first_name,
            last_name: payload.last_name,
            city: payload.city,
            state: payload.state,
            country: payload.country,
            bio: payload.bio,
            profile_picture: payload.profile_picture,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "create account rejected");
            ApiError::from(e)
        })?;

    info!(account_id = %account.id, email = %account.email, "account created");
    Ok(account)
}

/// Checks the credential and issues a token valid for the configured window.
pub async fn login(
    store: &dyn AccountStore,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let email = normalize_email(&payload.email);

    let account = store.find_by_email(&email).await?.ok_or_else(|| {
        warn!(email = %email, "login unknown email");
        ApiError::NotFound("User not found")
    })?;

    let password = payload.password;
    let stored = account.password_hash.clone();
    let ok = blocking(move || verify_password(&password, &stored)).await?;
    if !ok {
        warn!(account_id = %account.id, "login invalid password");
        return Err(ApiError::CredentialMismatch);
    }

    let (token, claims) = keys.sign(account.id, &account.email).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Signing
    })?;

    info!(account_id = %account.id, "account logged in");
    Ok(LoginResponse {
        success: true,
        token: format!("Bearer {token}"),
        login_data: claims,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::accounts::memory::MemoryAccountStore;

    fn signup_request(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: password.into(),
            user_name: None,
            first_name: Some("Ada".into()),
            last_name: None,
            city: None,
            state: None,
            country: None,
            bio: None,
            profile_picture: None,
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::new(b"test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("not an email"));
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
    }

    #[tokio::test]
    async fn signup_stores_hash_not_plaintext() {
        let store = MemoryAccountStore::new();
        let account = signup(&store, signup_request("A@x.com", "hunter22")).await.unwrap();
        assert_eq!(account.email, "a@x.com");
        assert_ne!(account.password_hash, "hunter22");
        assert!(verify_password("hunter22", &account.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected_without_second_record() {
        let store = MemoryAccountStore::new();
        signup(&store, signup_request("a@x.com", "one")).await.unwrap();
        let err = signup(&store, signup_request("a@x.com", "two")).await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateAccount("email")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn taken_user_name_is_rejected_by_the_store() {
        let store = MemoryAccountStore::new();
        let mut first = signup_request("a@x.com", "pw");
        first.user_name = Some("ax".into());
        signup(&store, first).await.unwrap();

        let mut second = signup_request("b@x.com", "pw");
        second.user_name = Some(" ax ".into());
        let err = signup(&store, second).await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateAccount("username")));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "username already exists");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn blank_user_names_are_stored_as_absent() {
        let store = MemoryAccountStore::new();
        let mut first = signup_request("a@x.com", "pw");
        first.user_name = Some("".into());
        let a = signup(&store, first).await.unwrap();
        let mut second = signup_request("b@x.com", "pw");
        second.user_name = Some("   ".into());
        let b = signup(&store, second).await.unwrap();

        assert_eq!(a.user_name, None);
        assert_eq!(b.user_name, None);
        assert_eq!(store.len().await, 2);
        assert_eq!(normalize_user_name(Some(" ada ".into())), Some("ada".into()));
    }

    #[tokio::test]
    async fn signup_requires_valid_email_and_password() {
        let store = MemoryAccountStore::new();
        let err = signup(&store, signup_request("nope", "pw")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        let err = signup(&store, signup_request("a@x.com", "")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn login_issues_token_for_matching_password() {
        let store = MemoryAccountStore::new();
        let keys = keys();
        let account = signup(&store, signup_request("a@x.com", "pw")).await.unwrap();

        let res = login(
            &store,
            &keys,
            LoginRequest {
                email: " A@X.COM".into(),
                password: "pw".into(),
            },
        )
        .await
        .unwrap();
        assert!(res.success);
        let token = res.token.strip_prefix("Bearer ").unwrap();
        let claims = keys.verify(token).unwrap();
        assert_eq!(claims.id, account.id);
        assert_eq!(claims, res.login_data);
    }

    #[tokio::test]
    async fn login_with_wrong_password_issues_no_token() {
        let store = MemoryAccountStore::new();
        signup(&store, signup_request("a@x.com", "pw")).await.unwrap();
        let err = login(
            &store,
            &keys(),
            LoginRequest {
                email: "a@x.com".into(),
                password: "wrong".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::CredentialMismatch));
    }

    #[tokio::test]
    async fn login_unknown_email_is_not_found() {
        let store = MemoryAccountStore::new();
        let err = login(
            &store,
            &keys(),
            LoginRequest {
                email: "ghost@x.com".into(),
                password: "pw".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User not found")));
    }
}
