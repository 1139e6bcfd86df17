//! Client side of the alert API: typed requests, a polled view of the
//! active alerts, and mutations that refresh that view.

use std::time::Duration;

use tokio::sync::watch;

use crate::api::types::{Alert, AlertStatus, NewAlert};

pub mod alerts;
pub mod poller;

pub use alerts::{AlertsClient, ClientError};
pub use poller::{ActiveAlerts, Snapshot, POLL_INTERVAL};

/// An [`AlertsClient`] paired with the active-alerts query it keeps fresh.
pub struct LiveAlerts {
    client: AlertsClient,
    active: ActiveAlerts,
}

impl LiveAlerts {
    pub fn new(client: AlertsClient, poll_interval: Duration) -> Self {
        let active = ActiveAlerts::spawn(client.clone(), poll_interval);
        Self { client, active }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.active.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.active.subscribe()
    }

    pub async fn create(&self, alert: &NewAlert) -> Result<Alert, ClientError> {
        let created = self.client.create(alert).await?;
        self.active.invalidate();
        Ok(created)
    }

    pub async fn update_location(&self, id: i32, lat: f64, lng: f64) -> Result<Alert, ClientError> {
        let updated = self.client.update_location(id, lat, lng).await?;
        self.active.invalidate();
        Ok(updated)
    }

    pub async fn update_status(&self, id: i32, status: AlertStatus) -> Result<Alert, ClientError> {
        let updated = self.client.update_status(id, status).await?;
        self.active.invalidate();
        Ok(updated)
    }
}
