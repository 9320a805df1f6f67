use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, get, patch};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::auth::create_user;
use crate::api::rest::{ApiJson, ApiPath, ApiResponse};
use crate::engine::transitions::cancel_parcel;
use crate::error::AppError;
use crate::models::payment::Payment;
use crate::models::user::{Actor, Role, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_account))
        .route("/admin/parcels/:id/assign", patch(assign_driver))
        .route("/admin/parcels/:id/cancel", patch(cancel))
        .route("/admin/parcels/:id", delete(delete_parcel))
        .route("/admin/payments", get(list_payments))
}

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

async fn create_account(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(payload): ApiJson<CreateAccountRequest>,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Admin)?;

    let (user, token) = create_user(&state, payload.name, payload.email, payload.role)?;
    Ok(ApiResponse::created(json!({ "user": user, "token": token })))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Admin)?;

    let mut users: Vec<User> = state
        .users
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Ok(ApiResponse::success(json!({ "users": users })))
}

async fn assign_driver(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AssignDriverRequest>,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Admin)?;

    let driver_role = state
        .users
        .get(&payload.driver_id)
        .map(|entry| entry.value().role)
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", payload.driver_id)))?;
    if driver_role != Role::Driver {
        return Err(AppError::BadRequest(format!(
            "user {} is not a driver",
            payload.driver_id
        )));
    }

    let mut parcel = state
        .parcels
        .get_mut(&id)
        .ok_or_else(|| AppError::ParcelNotFound(id.to_string()))?;
    if parcel.status.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "parcel is already {}",
            parcel.status
        )));
    }

    parcel.assigned_driver = Some(payload.driver_id);
    parcel.updated_at = Utc::now();

    info!(parcel_id = %id, driver_id = %payload.driver_id, "driver assigned");
    Ok(ApiResponse::success(json!({ "parcel": parcel.clone() })))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Admin)?;

    let mut parcel = state
        .parcels
        .get_mut(&id)
        .ok_or_else(|| AppError::ParcelNotFound(id.to_string()))?;

    let previous = cancel_parcel(&mut parcel, actor.user_id, Utc::now())?;
    state.metrics.parcel_moved(previous, parcel.status);

    info!(parcel_id = %id, "parcel cancelled");
    Ok(ApiResponse::success(json!({ "parcel": parcel.clone() })))
}

async fn delete_parcel(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Admin)?;

    let (_, parcel) = state
        .parcels
        .remove(&id)
        .ok_or_else(|| AppError::ParcelNotFound(id.to_string()))?;
    if let Some(payment_id) = state.payment_id_for_parcel(id) {
        state.payments.remove(&payment_id);
    }
    state
        .metrics
        .parcels_by_status
        .with_label_values(&[parcel.status.as_str()])
        .dec();

    info!(parcel_id = %id, tracking_id = %parcel.tracking_id, "parcel deleted");
    Ok(ApiResponse::success(json!({ "parcel": parcel })))
}

async fn list_payments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Admin)?;

    let mut payments: Vec<Payment> = state
        .payments
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    payments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Ok(ApiResponse::success(json!({ "payments": payments })))
}
