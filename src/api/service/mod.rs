pub mod endpoints;
pub mod extract;
pub mod router;
pub mod types;

use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::StatusCode;

use crate::api::types::{AlertStatus, ErrorResponse, NewAlert};
use crate::store::AlertStore;

pub use types::ApiError;

#[derive(Clone)]
pub struct State<S> {
    pub store: S,
}

impl<S: AlertStore> State<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, Json(e)).into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Alert not found")),
            )
                .into_response(),
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorResponse::new(message))).into_response()
            }
            ApiError::Internal(detail) => {
                log::error!("request failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal Server Error")),
                )
                    .into_response()
            }
        }
    }
}

/// First-run convenience: a demonstration alert so the dashboard has
/// something to show.
pub fn demo_alert() -> NewAlert {
    NewAlert {
        ambulance_id: "TEMP-AMB-01".to_string(),
        current_lat: 12.9716,
        current_lng: 77.5946,
        destination_name: "City Hospital".to_string(),
        destination_lat: 12.9352,
        destination_lng: 77.6245,
        route_polyline: "[]".to_string(),
        eta: 15,
        distance: 5.2,
        status: AlertStatus::Active,
    }
}

/// Insert [`demo_alert`] when nothing is active. Returns whether a row was
/// created.
pub async fn seed<S: AlertStore>(store: &S) -> anyhow::Result<bool> {
    if !store.list_active().await?.is_empty() {
        return Ok(false);
    }

    log::info!("Seeding database with initial alert");
    let alert = store.create(demo_alert()).await?;
    log::info!("Seeded alert {} for {}", alert.id, alert.ambulance_id);

    Ok(true)
}
