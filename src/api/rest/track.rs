use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::api::rest::{ApiPath, ApiResponse};
use crate::engine::timeline::tracking_timeline;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/track/:tracking_id", get(track_parcel))
}

async fn track_parcel(
    State(state): State<Arc<AppState>>,
    ApiPath(tracking_id): ApiPath<String>,
) -> Result<ApiResponse, AppError> {
    let tracking_id = tracking_id.trim().to_ascii_uppercase();
    let parcel = state
        .parcel_by_tracking_id(&tracking_id)
        .ok_or_else(|| AppError::ParcelNotFound(tracking_id.clone()))?;

    let tracking = tracking_timeline(
        parcel.status,
        parcel.created_at,
        &parcel.sender.address,
        &parcel.receiver.address,
    );

    Ok(ApiResponse::success(json!({
        "parcel": parcel,
        "timeline": tracking.timeline,
        "estimatedDelivery": tracking.estimated_delivery,
    })))
}
