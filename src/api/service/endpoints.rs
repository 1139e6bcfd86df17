use axum::extract::{Json, State};
use axum::http::StatusCode;

use super::extract::{AlertId, Validated};
use super::ApiError;
use crate::api::types::{Alert, LocationUpdate, NewAlert, StatusUpdate};
use crate::store::AlertStore;

pub type Result<T> = std::result::Result<T, ApiError>;

pub async fn create<S: AlertStore>(
    State(state): State<super::State<S>>,
    Validated(alert): Validated<NewAlert>,
) -> Result<(StatusCode, Json<Alert>)> {
    let created = state.store.create(alert).await?;
    log::info!(
        "alert {} created for ambulance {} ({})",
        created.id,
        created.ambulance_id,
        created.destination_name
    );

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_active<S: AlertStore>(
    State(state): State<super::State<S>>,
) -> Result<Json<Vec<Alert>>> {
    Ok(Json(state.store.list_active().await?))
}

pub async fn update_location<S: AlertStore>(
    State(state): State<super::State<S>>,
    AlertId(id): AlertId,
    Validated(update): Validated<LocationUpdate>,
) -> Result<Json<Alert>> {
    let updated = state
        .store
        .update_location(id, update.into())
        .await?
        .ok_or(ApiError::NotFound)?;

    log::debug!("alert {id} moved to ({}, {})", updated.current_lat, updated.current_lng);

    Ok(Json(updated))
}

pub async fn update_status<S: AlertStore>(
    State(state): State<super::State<S>>,
    AlertId(id): AlertId,
    Validated(update): Validated<StatusUpdate>,
) -> Result<Json<Alert>> {
    let updated = state
        .store
        .update_status(id, update.status)
        .await?
        .ok_or(ApiError::NotFound)?;

    log::info!("alert {id} marked {}", updated.status);

    Ok(Json(updated))
}
