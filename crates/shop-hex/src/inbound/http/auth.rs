//! Caller identity for HTTP handlers.
//!
//! Tokens are HS256 JWTs binding a user id and a role, valid for one hour.
//! They are read from `Authorization: Bearer ...` or, failing that, from the
//! `token` cookie.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const TOKEN_COOKIE: &str = "token";
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, user_id: &str, role: Role) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            role,
            iat: now,
            exp: now + TOKEN_TTL.as_secs() as i64,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AppError::Unauthenticated("Invalid token.".into())
            })
    }
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<AuthKeys>::from_ref(state);
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(|| AppError::Unauthenticated("Missing token.".into()))?;
        let claims = keys.verify(&token)?;
        Ok(AuthUser {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::Forbidden("Access denied.".into()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::{HeaderValue, Request};

    const USER: &str = "64b7f0c2a1b2c3d4e5f60718";

    fn keys() -> Arc<AuthKeys> {
        Arc::new(AuthKeys::new("test-secret"))
    }

    fn parts_with(header: Option<(axum::http::HeaderName, String)>) -> Parts {
        let mut req = Request::builder().uri("/");
        if let Some((name, value)) = header {
            req = req.header(name, HeaderValue::from_str(&value).unwrap());
        }
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn issued_tokens_verify_and_expire_in_an_hour() {
        let keys = keys();
        let token = keys.issue(USER, Role::Admin).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, USER);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = AuthKeys::new("other").issue(USER, Role::User).unwrap();
        assert!(matches!(
            keys().verify(&token),
            Err(AppError::Unauthenticated(_))
        ));
        assert!(keys().verify("garbage").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = keys();
        let past = Utc::now().timestamp() - 2 * 3600;
        let claims = Claims {
            user_id: USER.into(),
            role: Role::User,
            iat: past,
            exp: past + 60,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn reads_bearer_header_then_cookie() {
        let keys = keys();
        let token = keys.issue(USER, Role::User).unwrap();

        let mut parts = parts_with(Some((AUTHORIZATION, format!("Bearer {token}"))));
        let user = AuthUser::from_request_parts(&mut parts, &keys).await.unwrap();
        assert_eq!(user.user_id, USER);

        let mut parts = parts_with(Some((COOKIE, format!("theme=dark; token={token}"))));
        let user = AuthUser::from_request_parts(&mut parts, &keys).await.unwrap();
        assert_eq!(user.role, Role::User);

        let mut parts = parts_with(Some((AUTHORIZATION, format!("Basic {token}"))));
        assert!(matches!(
            AuthUser::from_request_parts(&mut parts, &keys).await,
            Err(AppError::Unauthenticated(_))
        ));

        let mut parts = parts_with(None);
        assert!(matches!(
            AuthUser::from_request_parts(&mut parts, &keys).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn admin_extractor_requires_admin_role() {
        let keys = keys();
        let user_token = keys.issue(USER, Role::User).unwrap();
        let admin_token = keys.issue(USER, Role::Admin).unwrap();

        let mut parts = parts_with(Some((AUTHORIZATION, format!("Bearer {user_token}"))));
        assert!(matches!(
            AdminUser::from_request_parts(&mut parts, &keys).await,
            Err(AppError::Forbidden(_))
        ));

        let mut parts = parts_with(Some((AUTHORIZATION, format!("Bearer {admin_token}"))));
        let AdminUser(admin) = AdminUser::from_request_parts(&mut parts, &keys)
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
