use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// JWT payload identifying an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,      // account ID
    pub email: String, // account email
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime out of range")]
    Lifetime,
}

/// Signing and verification keys plus the validity window of issued tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn claims_at(
        &self,
        account_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<Claims, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|_| TokenError::Lifetime)?;
        let exp = now
            .checked_add(TimeDuration::seconds(ttl))
            .ok_or(TokenError::Lifetime)?;
        Ok(Claims {
            id: account_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Issues a token for the account and returns it with the payload it carries.
    pub fn sign(&self, account_id: Uuid, email: &str) -> Result<(String, Claims), TokenError> {
        let claims = self.claims_at(account_id, email, OffsetDateTime::now_utc())?;
        let token = self.encode_claims(&claims)?;
        debug!(account_id = %account_id, exp = claims.exp, "jwt signed");
        Ok((token, claims))
    }

    /// Checks signature and expiry. Any failure is `TokenError::Invalid`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(TokenError::Invalid)?;
        debug!(account_id = %data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(secret.as_bytes(), Duration::from_secs(3600))
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let account_id = Uuid::from_u128(42);
        let (token, issued) = keys.sign(account_id, "a@x.com").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, account_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims, issued);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys("dev-secret");
        let issued_at = OffsetDateTime::now_utc() - TimeDuration::seconds(3700);
        let claims = keys.claims_at(Uuid::new_v4(), "a@x.com", issued_at).unwrap();
        let token = keys.encode_claims(&claims).unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn oversized_lifetime_fails_to_sign() {
        let keys = JwtKeys::new(b"dev-secret", Duration::from_secs(u64::MAX));
        assert!(matches!(
            keys.sign(Uuid::new_v4(), "a@x.com"),
            Err(TokenError::Lifetime)
        ));

        let keys = JwtKeys::new(b"dev-secret", Duration::from_secs(i64::MAX as u64));
        assert!(matches!(
            keys.sign(Uuid::new_v4(), "a@x.com"),
            Err(TokenError::Lifetime)
        ));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let keys = make_keys("dev-secret");
        let (token, _) = keys.sign(Uuid::new_v4(), "a@x.com").unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        let i = sig_start + 5;
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(matches!(keys.verify(&tampered), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let (token, _) = make_keys("secret-one").sign(Uuid::new_v4(), "a@x.com").unwrap();
        assert!(make_keys("secret-two").verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = make_keys("dev-secret");
        assert!(keys.verify("garbage").is_err());
        assert!(keys.verify("").is_err());
        assert!(keys.verify("a.b.c").is_err());
    }
}
