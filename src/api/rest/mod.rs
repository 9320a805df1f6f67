pub mod admin;
pub mod auth;
pub mod driver;
pub mod parcels;
pub mod track;

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(parcels::router())
        .merge(driver::router())
        .merge(track::router())
        .merge(admin::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub fn router_with_cors(state: Arc<AppState>) -> Router {
    router(state).layer(CorsLayer::permissive())
}

/// JSON body extractor whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Success envelope shared by every JSON endpoint.
pub struct ApiResponse {
    status: StatusCode,
    data: Value,
}

impl ApiResponse {
    pub fn success(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    pub fn created(data: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "success",
            "data": self.data,
        }));

        (self.status, body).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    users: usize,
    parcels: usize,
    payments: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        users: state.users.len(),
        parcels: state.parcels.len(),
        payments: state.payments.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
