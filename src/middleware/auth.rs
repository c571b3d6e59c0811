use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::models::Role;
use crate::services::AppState;

/// Identity of the caller, taken from a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).ok_or_else(ApiError::unauthorized)?;
    let claims = state.auth.verify_token(token).map_err(|_| ApiError::unauthorized())?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::unauthorized())?;

    request.extensions_mut().insert(AuthUser {
        id,
        username: claims.username,
        roles: claims.roles,
    });
    Ok(next.run(request).await)
}

/// Must run after `require_auth`.
pub async fn require_manager(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let allowed = request
        .extensions()
        .get::<AuthUser>()
        .map(|user| user.has_any_role(&[Role::Manager, Role::Admin]))
        .ok_or_else(ApiError::unauthorized)?;

    if !allowed {
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}
