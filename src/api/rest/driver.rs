use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, patch};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::rest::{ApiJson, ApiPath, ApiResponse};
use crate::engine::transitions::{apply_transition, mark_payment_collected};
use crate::error::AppError;
use crate::models::parcel::Parcel;
use crate::models::user::{Actor, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver/parcels", get(list_assigned))
        .route("/driver/parcels/:id/status", patch(update_status))
        .route("/driver/parcels/:id/payment", patch(collect_payment))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Value,
}

impl UpdateStatusRequest {
    /// Raw requested status; anything but a JSON string is an unknown value.
    fn requested(&self) -> Result<&str, AppError> {
        self.status
            .as_str()
            .ok_or_else(|| AppError::InvalidStatusValue(self.status.to_string()))
    }
}

async fn list_assigned(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Driver)?;

    let mut parcels: Vec<Parcel> = state
        .parcels
        .iter()
        .filter(|entry| entry.value().assigned_driver == Some(actor.user_id))
        .map(|entry| entry.value().clone())
        .collect();
    parcels.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(ApiResponse::success(json!({ "parcels": parcels })))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Driver)?;

    let mut parcel = state
        .parcels
        .get_mut(&id)
        .ok_or_else(|| AppError::ParcelNotFound(id.to_string()))?;

    let outcome = payload
        .requested()
        .and_then(|requested| apply_transition(&mut parcel, requested, actor.user_id, Utc::now()));

    match outcome {
        Ok(previous) => {
            state.metrics.record_transition("accepted");
            state.metrics.parcel_moved(previous, parcel.status);
            info!(
                parcel_id = %id,
                driver_id = %actor.user_id,
                from = %previous,
                to = %parcel.status,
                "parcel status updated"
            );
            Ok(ApiResponse::success(json!({ "parcel": parcel.clone() })))
        }
        Err(err) => {
            state.metrics.record_transition("rejected");
            warn!(
                parcel_id = %id,
                driver_id = %actor.user_id,
                requested = %payload.status,
                error = %err,
                "parcel status update rejected"
            );
            Err(err)
        }
    }
}

async fn collect_payment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::Driver)?;

    let payment_id = state.payment_id_for_parcel(id);

    let mut parcel = state
        .parcels
        .get_mut(&id)
        .ok_or_else(|| AppError::ParcelNotFound(id.to_string()))?;
    let mut payment = payment_id.and_then(|payment_id| state.payments.get_mut(&payment_id));

    mark_payment_collected(
        &mut parcel,
        payment.as_deref_mut(),
        actor.user_id,
        Utc::now(),
    )?;

    state.metrics.payments_collected_total.inc();
    info!(
        parcel_id = %id,
        driver_id = %actor.user_id,
        payment_record = payment.is_some(),
        "payment collected"
    );

    let payment = payment.as_deref().cloned();
    Ok(ApiResponse::success(
        json!({ "parcel": parcel.clone(), "payment": payment }),
    ))
}
