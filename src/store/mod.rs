//! Persistence for emergency alerts.
//!
//! Updates targeting a missing id resolve to `Ok(None)`; callers map that
//! to a 404. `StoreError` is reserved for storage failures and for the
//! optional one-active-alert-per-ambulance rule.

use std::future::Future;
use std::str::FromStr;

use crate::api::types::{Alert, AlertStatus, NewAlert};
use crate::api::Coord;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ambulance {0} already has an active alert")]
    ActiveAlertExists(String),

    #[error("db returned error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: i32, reason: String },
}

/// How many active alerts may exist at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivePolicy {
    /// No cap; the dispatcher shows the most recently updated one.
    #[default]
    Shared,
    /// At most one active alert per `ambulanceId`.
    OnePerAmbulance,
}

impl FromStr for ActivePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(ActivePolicy::Shared),
            "one-per-ambulance" => Ok(ActivePolicy::OnePerAmbulance),
            other => Err(anyhow::anyhow!(
                "unknown active policy {other:?}, expected \"shared\" or \"one-per-ambulance\""
            )),
        }
    }
}

pub trait AlertStore: Clone + Send + Sync + 'static {
    fn create(&self, alert: NewAlert) -> impl Future<Output = Result<Alert, StoreError>> + Send;

    /// Active alerts, most recently updated first.
    fn list_active(&self) -> impl Future<Output = Result<Vec<Alert>, StoreError>> + Send;

    fn update_location(
        &self,
        id: i32,
        location: Coord,
    ) -> impl Future<Output = Result<Option<Alert>, StoreError>> + Send;

    fn update_status(
        &self,
        id: i32,
        status: AlertStatus,
    ) -> impl Future<Output = Result<Option<Alert>, StoreError>> + Send;
}
