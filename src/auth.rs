use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};

use crate::{error::ApiError, models::User, password, repository::RepositoryState};

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers take it as an
/// argument, so the identity flows explicitly through the call chain instead of
/// being stashed on a shared request object.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
        }
    }
}

/// authenticate
///
/// Resolves a Basic credential pair to a user. The email lookup is an exact,
/// case-sensitive match and the secret is checked against the stored bcrypt hash.
///
/// All failures collapse into `ApiError::Unauthorized`; only the logs say which
/// step failed, and they never contain the submitted secret.
pub async fn authenticate(repo: &RepositoryState, email: &str, secret: &str) -> Result<AuthUser, ApiError> {
    let Some(user) = repo.find_user_by_email(email).await? else {
        tracing::warn!(email = %email, "authentication failed: user not found");
        return Err(ApiError::Unauthorized);
    };

    if !password::verify_password(secret.to_string(), user.password.clone()).await? {
        tracing::warn!(user_id = user.id, "authentication failed: password mismatch");
        return Err(ApiError::Unauthorized);
    }

    tracing::debug!(user_id = user.id, "authentication succeeded");
    Ok(AuthUser::from(user))
}

/// require_auth
///
/// Middleware for protected method routers. Resolving `AuthUser` rejects the
/// request with 401 before the handler runs; on success the extractor has
/// already stored the identity in the request extensions, where the handler's
/// own `AuthUser` argument picks it up without a second bcrypt verification.
pub async fn require_auth(_: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// AuthUser Extractor Implementation
///
/// 1. Reuse: if `require_auth` already resolved the identity for
///    this request, it is taken from the request extensions.
/// 2. Credential Extraction: `Authorization: Basic <base64(email:password)>`.
/// 3. Verification: see [`authenticate`].
///
/// Rejection: `ApiError::Unauthorized` (401, `{"message": "Access Denied"}`).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let Some(credentials) = parts.headers.typed_get::<Authorization<Basic>>() else {
            tracing::warn!("authentication failed: basic auth header not found");
            return Err(ApiError::Unauthorized);
        };

        let repo = RepositoryState::from_ref(state);
        let user = authenticate(&repo, credentials.username(), credentials.password()).await?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
