use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::rest::{ApiJson, ApiResponse};
use crate::error::AppError;
use crate::models::user::{Actor, Role, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthenticated)?;

        state
            .sessions
            .get(token.trim())
            .map(|entry| *entry.value())
            .ok_or(AppError::Unauthenticated)
    }
}

impl Actor {
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} role required",
                role_name(role)
            )))
        }
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Driver => "driver",
        Role::Admin => "admin",
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

/// Creates the user and opens a session for it.
pub fn create_user(
    state: &AppState,
    name: String,
    email: String,
    role: Role,
) -> Result<(User, String), AppError> {
    let name = name.trim().to_string();
    let email = email.trim().to_ascii_lowercase();

    if name.is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("email is not valid".to_string()));
    }
    if state.users.iter().any(|entry| entry.value().email == email) {
        return Err(AppError::Conflict(format!("email {email} already registered")));
    }

    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        role,
        created_at: Utc::now(),
    };
    state.users.insert(user.id, user.clone());
    let token = state.issue_session(&user);

    tracing::info!(user_id = %user.id, role = role_name(role), "user registered");
    Ok((user, token))
}

async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<ApiResponse, AppError> {
    let (user, token) = create_user(&state, payload.name, payload.email, Role::User)?;
    Ok(ApiResponse::success(json!({ "user": user, "token": token })))
}

async fn me(State(state): State<Arc<AppState>>, actor: Actor) -> Result<ApiResponse, AppError> {
    let user = state
        .users
        .get(&actor.user_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", actor.user_id)))?;

    Ok(ApiResponse::success(json!({ "user": user })))
}
