use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

use super::{ActivePolicy, AlertStore, StoreError};
use crate::api::types::{Alert, AlertStatus, NewAlert};
use crate::api::Coord;

#[derive(Default)]
struct Inner {
    next_id: i32,
    alerts: Vec<Alert>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Strictly increasing, so later writes always sort first.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn find(&mut self, id: i32) -> Option<&mut Alert> {
        self.alerts.iter_mut().find(|alert| alert.id == id)
    }
}

/// Process-local store with the same semantics as [`super::PgStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    policy: ActivePolicy,
}

impl MemoryStore {
    pub fn new(policy: ActivePolicy) -> Self {
        Self {
            inner: Arc::default(),
            policy,
        }
    }

    /// Every stored alert in insertion order, including completed ones.
    pub fn all(&self) -> Vec<Alert> {
        self.lock().alerts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AlertStore for MemoryStore {
    async fn create(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let mut inner = self.lock();

        if self.policy == ActivePolicy::OnePerAmbulance
            && alert.status == AlertStatus::Active
            && inner.alerts.iter().any(|existing| {
                existing.status == AlertStatus::Active
                    && existing.ambulance_id == alert.ambulance_id
            })
        {
            return Err(StoreError::ActiveAlertExists(alert.ambulance_id));
        }

        inner.next_id += 1;
        let created = Alert {
            id: inner.next_id,
            ambulance_id: alert.ambulance_id,
            current_lat: alert.current_lat,
            current_lng: alert.current_lng,
            destination_name: alert.destination_name,
            destination_lat: alert.destination_lat,
            destination_lng: alert.destination_lng,
            route_polyline: alert.route_polyline,
            eta: alert.eta,
            distance: alert.distance,
            status: alert.status,
            updated_at: inner.stamp(),
        };
        inner.alerts.push(created.clone());

        Ok(created)
    }

    async fn list_active(&self) -> Result<Vec<Alert>, StoreError> {
        let mut active: Vec<Alert> = self
            .lock()
            .alerts
            .iter()
            .filter(|alert| alert.status == AlertStatus::Active)
            .cloned()
            .collect();

        active.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(active)
    }

    async fn update_location(
        &self,
        id: i32,
        location: Coord,
    ) -> Result<Option<Alert>, StoreError> {
        let mut inner = self.lock();
        let stamp = inner.stamp();

        Ok(inner.find(id).map(|alert| {
            alert.current_lat = location.lat;
            alert.current_lng = location.lng;
            alert.updated_at = stamp;
            alert.clone()
        }))
    }

    async fn update_status(
        &self,
        id: i32,
        status: AlertStatus,
    ) -> Result<Option<Alert>, StoreError> {
        let mut inner = self.lock();

        if self.policy == ActivePolicy::OnePerAmbulance && status == AlertStatus::Active {
            let Some(ambulance_id) = inner.find(id).map(|alert| alert.ambulance_id.clone()) else {
                return Ok(None);
            };
            if inner.alerts.iter().any(|other| {
                other.id != id
                    && other.status == AlertStatus::Active
                    && other.ambulance_id == ambulance_id
            }) {
                return Err(StoreError::ActiveAlertExists(ambulance_id));
            }
        }

        let stamp = inner.stamp();

        Ok(inner.find(id).map(|alert| {
            alert.status = status;
            alert.updated_at = stamp;
            alert.clone()
        }))
    }
}
