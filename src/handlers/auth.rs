use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::models::{Role, User};
use crate::services::auth::Initialization;
use crate::services::AppState;
use crate::validation::require_non_blank;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl JwtResponse {
    fn new(access_token: String, user: User) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
            id: user.id,
            username: user.username,
            email: user.email,
            roles: user.roles,
        }
    }
}

pub async fn signin(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<JwtResponse>> {
    require_non_blank("Username", &request.username)?;
    require_non_blank("Password", &request.password)?;

    let (user, token) = state.auth.authenticate(&request.username, &request.password).await?;
    Ok(Json(JwtResponse::new(token, user)))
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<JwtResponse>> {
    let user = state
        .auth
        .find_user(caller.id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Json(JwtResponse::new(String::new(), user)))
}

pub async fn initialize(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let message = match state.auth.initialize_default_users().await? {
        Initialization::Created => "Default users created successfully",
        Initialization::AlreadyPresent => "Users already exist in the system",
    };
    Ok(Json(json!({ "message": message })))
}
