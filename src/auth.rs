use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, models::User, repository::RepositoryState};

/// Alternate header carrying the raw token, as sent by the browser client.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Claims
///
/// The payload signed into every bearer token. It carries nothing but the subject
/// identifier and the validity window.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the account the token was issued to.
    pub sub: Uuid,
    /// Expiration Time (exp): seconds since the epoch after which the token is refused.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

/// issue_token
///
/// Signs an HS256 token for `user_id`, valid for `config.token_ttl_secs`.
pub fn issue_token(user_id: Uuid, config: &AppConfig) -> Result<String, ApiError> {
    let iat = unix_now();
    let claims = Claims {
        sub: user_id,
        iat,
        exp: iat + config.token_ttl_secs as usize,
    };
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| ApiError::ServerError(format!("token signing failed: {e}")))
}

/// verify_token
///
/// Checks signature and expiry and returns the claims. Any failure (bad signature,
/// malformed token, expired) is the same `Unauthorized` to the caller.
pub fn verify_token(token: &str, config: &AppConfig) -> Result<Claims, ApiError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            ApiError::Unauthorized("Token is not valid".to_string())
        })
}

/// Finds the token in `Authorization: Bearer ...` or, failing that, `x-auth-token`.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer
        .or_else(|| {
            headers
                .get(TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Holding one proves the request
/// carried a valid, unexpired token; it says nothing about whether the account still
/// exists or what role it has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// AuthUser Extractor
///
/// Used as a handler argument, it acts as the authentication middleware: extraction
/// fails with `Unauthorized` before the handler runs when the token is missing,
/// malformed, badly signed or expired. No store lookup happens here.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let token = extract_token(&parts.headers).ok_or_else(|| {
            ApiError::Unauthorized("No token, authorization denied".to_string())
        })?;

        let claims = verify_token(token, &config)?;
        Ok(AuthUser { id: claims.sub })
    }
}

/// AdminUser
///
/// An authenticated caller whose stored account currently has the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: Uuid,
    pub user: User,
}

/// AdminUser Extractor
///
/// The admin gate. It runs the `AuthUser` check first, then loads the caller's
/// account: a missing account is `Unauthorized`, a non-admin account is `Forbidden`.
/// Placed on every mutating content route and every admin auth route.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser { id } = AuthUser::from_request_parts(parts, state).await?;
        let repo = RepositoryState::from_ref(state);

        let user = repo
            .get_user(id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

        if !user.is_admin() {
            tracing::warn!(user_id = %id, "admin route refused for non-admin account");
            return Err(ApiError::admin_required());
        }

        Ok(AdminUser { id, user })
    }
}

// --- Password Hashing ---

/// hash_password
///
/// Runs bcrypt on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::ServerError(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::ServerError(format!("hashing failed: {e}")))
}

/// verify_password
///
/// Returns false on a mismatch and on any malformed stored hash.
pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}
