use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::contract::{self, Endpoint};
use crate::api::types::{
    Alert, AlertStatus, ErrorResponse, LocationUpdate, NewAlert, StatusUpdate,
};
use crate::api::validate::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        message: String,
        field: Option<String>,
    },

    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid url: {0}")]
    Url(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status(),
            ClientError::Url(_) => None,
        }
    }
}

/// Typed calls against the alert endpoints.
#[derive(Clone)]
pub struct AlertsClient {
    inner: reqwest::Client,
    base: Url,
}

impl AlertsClient {
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let base = base
            .parse()
            .map_err(|e| ClientError::Url(format!("{base} is not a valid url: {e}")))?;

        Ok(Self {
            inner: reqwest::Client::new(),
            base,
        })
    }

    pub async fn create(&self, alert: &NewAlert) -> Result<Alert, ClientError> {
        self.send(
            &contract::CREATE_ALERT,
            contract::CREATE_ALERT.path.to_string(),
            Some(alert),
            "Failed to send emergency alert",
        )
        .await
    }

    pub async fn list_active(&self) -> Result<Vec<Alert>, ClientError> {
        self.send(
            &contract::LIST_ACTIVE,
            contract::LIST_ACTIVE.path.to_string(),
            None::<&()>,
            "Failed to fetch active alerts",
        )
        .await
    }

    pub async fn update_location(&self, id: i32, lat: f64, lng: f64) -> Result<Alert, ClientError> {
        self.send(
            &contract::UPDATE_LOCATION,
            contract::build_url(contract::UPDATE_LOCATION.path, &[("id", id.to_string())]),
            Some(&LocationUpdate { lat, lng }),
            "Failed to update location",
        )
        .await
    }

    pub async fn update_status(&self, id: i32, status: AlertStatus) -> Result<Alert, ClientError> {
        self.send(
            &contract::UPDATE_STATUS,
            contract::build_url(contract::UPDATE_STATUS.path, &[("id", id.to_string())]),
            Some(&StatusUpdate { status }),
            "Failed to update status",
        )
        .await
    }

    async fn send<B, T>(
        &self,
        endpoint: &Endpoint,
        path: String,
        body: Option<&B>,
        context: &'static str,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(&path)
            .map_err(|e| ClientError::Url(format!("error joining url: {e}")))?;

        let mut request = self.inner.request(endpoint.method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let transport = |source: reqwest::Error| ClientError::Transport { context, source };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(transport);
        }

        let bytes = response.bytes().await.map_err(transport)?;
        Err(rejection(status, &bytes, context))
    }
}

/// Prefer the service's own message when the body has a known error shape.
fn rejection(status: StatusCode, body: &[u8], fallback: &str) -> ClientError {
    let (message, field) = match status {
        StatusCode::BAD_REQUEST => match serde_json::from_slice::<ValidationError>(body) {
            Ok(e) => (e.message, e.field),
            Err(_) => (fallback.to_string(), None),
        },
        _ => match serde_json::from_slice::<ErrorResponse>(body) {
            Ok(e) if status != StatusCode::INTERNAL_SERVER_ERROR => (e.message, None),
            _ => (fallback.to_string(), None),
        },
    };

    ClientError::Rejected {
        status,
        message,
        field,
    }
}
