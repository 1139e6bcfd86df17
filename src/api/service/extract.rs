use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde_json::Value;

use super::ApiError;
use crate::api::validate::{Validate, ValidationError};

/// JSON body checked against its [`Validate`] schema before the handler
/// runs.
pub struct Validated<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ValidationError::new(rejection.body_text()))?;

        Ok(Validated(T::validate(&value)?))
    }
}

/// The `:id` path segment of the alert endpoints.
pub struct AlertId(pub i32);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AlertId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::at("id", rejection.body_text()))?;

        raw.parse().map(AlertId).map_err(|_| {
            ValidationError::at("id", format!("Expected integer id, received {raw:?}")).into()
        })
    }
}
