use crate::{
    config::site::SiteConfig,
    error::{AppError, AppResult},
    models::User,
    response::found,
    utils::{
        cookie::{extract_cookie, SESSION_COOKIE},
        jwt::decode_jwt,
    },
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};

/// The identity of the visitor making the request.
///
/// Handlers take it as an explicit argument: `AuthUser` on routes behind
/// [`login_required`], `Option<AuthUser>` where anonymous access is allowed.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Resolves the session token (Bearer header first, then cookie) into an
/// [`AuthUser`] request extension. Missing or invalid tokens leave the
/// request anonymous.
pub async fn identity_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).or_else(|| extract_cookie(&headers, SESSION_COOKIE));

    if let Some(user_id) = token
        .and_then(|t| decode_jwt(&t).ok())
        .and_then(|claims| claims.user_id())
    {
        match User::find_by_id(user_id).one(&db).await? {
            Some(user) => {
                request.extensions_mut().insert(AuthUser {
                    id: user.id,
                    username: user.username,
                    role: user.role,
                });
            }
            None => tracing::debug!("Session token for unknown user {}", user_id),
        }
    }

    Ok(next.run(request).await)
}

/// Redirects anonymous visitors to the login page, remembering where they
/// were going in `?next=`.
pub async fn login_required(
    Extension(site): Extension<SiteConfig>,
    request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<AuthUser>().is_some() {
        return next.run(request).await;
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    tracing::debug!("Anonymous request to {}, redirecting to login", target);
    found(&login_redirect_url(&site.login_url, &target))
}

pub fn login_redirect_url(login_url: &str, next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", login_url, query)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Verify the current user has admin role
pub fn require_admin(auth_user: &AuthUser) -> AppResult<()> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}
