use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::rest::{ApiJson, ApiPath, ApiResponse};
use crate::error::AppError;
use crate::models::parcel::{Contact, Parcel, PaymentStatus};
use crate::models::payment::Payment;
use crate::models::user::{Actor, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parcels", get(list_parcels).post(create_parcel))
        .route("/parcels/:id", get(get_parcel))
}

#[derive(Deserialize)]
pub struct CreateParcelRequest {
    pub sender: Contact,
    pub receiver: Contact,
    pub weight_kg: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

fn validate_contact(label: &str, contact: &Contact) -> Result<(), AppError> {
    if contact.name.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{label} name cannot be empty")));
    }
    if contact.address.is_blank() {
        return Err(AppError::BadRequest(format!(
            "{label} address must include street, city, postal_code and country"
        )));
    }
    Ok(())
}

async fn create_parcel(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(payload): ApiJson<CreateParcelRequest>,
) -> Result<ApiResponse, AppError> {
    actor.require(Role::User)?;

    validate_contact("sender", &payload.sender)?;
    validate_contact("receiver", &payload.receiver)?;
    if !(payload.weight_kg > 0.0) {
        return Err(AppError::BadRequest("weight_kg must be > 0".to_string()));
    }
    if payload.amount.is_some_and(|amount| !(amount > 0.0)) {
        return Err(AppError::BadRequest("amount must be > 0".to_string()));
    }

    let now = Utc::now();
    let parcel = Parcel::new(
        state.unused_parcel_id(Uuid::new_v4),
        actor.user_id,
        payload.sender,
        payload.receiver,
        payload.weight_kg,
        payload.description,
        now,
    );

    let payment = payload.amount.map(|amount| Payment {
        id: Uuid::new_v4(),
        parcel_id: parcel.id,
        amount,
        status: PaymentStatus::Pending,
        collected_by: None,
        collected_at: None,
        created_at: now,
    });

    state.parcels.insert(parcel.id, parcel.clone());
    if let Some(payment) = &payment {
        state.payments.insert(payment.id, payment.clone());
    }
    state
        .metrics
        .parcels_by_status
        .with_label_values(&[parcel.status.as_str()])
        .inc();

    tracing::info!(
        parcel_id = %parcel.id,
        tracking_id = %parcel.tracking_id,
        "parcel created"
    );

    Ok(ApiResponse::created(
        json!({ "parcel": parcel, "payment": payment }),
    ))
}

async fn list_parcels(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<ApiResponse, AppError> {
    let mut parcels: Vec<Parcel> = match actor.role {
        Role::Admin => state
            .parcels
            .iter()
            .map(|entry| entry.value().clone())
            .collect(),
        Role::User => state
            .parcels
            .iter()
            .filter(|entry| entry.value().created_by == actor.user_id)
            .map(|entry| entry.value().clone())
            .collect(),
        Role::Driver => {
            return Err(AppError::Forbidden(
                "drivers list parcels via /driver/parcels".to_string(),
            ));
        }
    };
    parcels.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(ApiResponse::success(json!({ "parcels": parcels })))
}

async fn get_parcel(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse, AppError> {
    let parcel = state
        .parcels
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::ParcelNotFound(id.to_string()))?;

    let visible = match actor.role {
        Role::Admin => true,
        Role::User => parcel.created_by == actor.user_id,
        Role::Driver => parcel.assigned_driver == Some(actor.user_id),
    };
    if !visible {
        return Err(AppError::ParcelNotFound(id.to_string()));
    }

    Ok(ApiResponse::success(json!({ "parcel": parcel })))
}
