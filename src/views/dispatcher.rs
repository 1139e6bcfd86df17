use std::fmt;

use tokio::sync::watch;

use super::map::MapView;
use super::{format_distance, format_eta};
use crate::api::types::{Alert, AlertStatus, RouteGeometry};
use crate::client::{ClientError, LiveAlerts, Snapshot};

pub const PRIORITY: &str = "CRITICAL";

/// The incoming alert panel.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingAlert {
    pub id: i32,
    pub ambulance_id: String,
    pub destination_name: String,
    pub eta: String,
    pub distance: String,
    pub priority: &'static str,
    pub map: MapView,
    /// Other active alerts behind the one on display.
    pub queued: usize,
}

impl IncomingAlert {
    fn new(alert: &Alert, queued: usize) -> Self {
        let route = RouteGeometry::decode(&alert.route_polyline).unwrap_or_else(|e| {
            log::warn!("alert {} has an unreadable route: {e}", alert.id);
            RouteGeometry::default()
        });

        Self {
            id: alert.id,
            ambulance_id: alert.ambulance_id.clone(),
            destination_name: alert.destination_name.clone(),
            eta: format_eta(alert.eta),
            distance: format_distance(alert.distance),
            priority: PRIORITY,
            map: MapView::new(Some(alert.current()), Some(alert.destination()), route, false),
            queued,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatcherView {
    Loading,
    /// No data has ever arrived and the last refresh failed.
    Unavailable(String),
    AllClear,
    Incoming(IncomingAlert),
}

impl DispatcherView {
    /// Shows the first, most recently updated, active alert.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        match (&snapshot.alerts, &snapshot.error) {
            (None, None) => DispatcherView::Loading,
            (None, Some(error)) => DispatcherView::Unavailable(error.clone()),
            (Some(alerts), _) => match alerts.first() {
                None => DispatcherView::AllClear,
                Some(first) => {
                    DispatcherView::Incoming(IncomingAlert::new(first, alerts.len() - 1))
                }
            },
        }
    }
}

impl fmt::Display for DispatcherView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatcherView::Loading => writeln!(f, "Loading..."),
            DispatcherView::Unavailable(error) => {
                writeln!(f, "Traffic Control Center offline: {error}")
            }
            DispatcherView::AllClear => {
                writeln!(f, "All Clear")?;
                writeln!(f, "No active emergency alerts at this time.")
            }
            DispatcherView::Incoming(alert) => {
                writeln!(f, "EMERGENCY INCOMING")?;
                writeln!(
                    f,
                    "Ambulance {} requires immediate route clearance",
                    alert.ambulance_id
                )?;
                writeln!(f, "  Estimated Arrival  {}", alert.eta)?;
                writeln!(f, "  Distance Away      {}", alert.distance)?;
                writeln!(f, "  Priority Level     {}", alert.priority)?;
                writeln!(f, "  Destination        {}", alert.destination_name)?;
                writeln!(
                    f,
                    "  Position           {:.5}, {:.5}",
                    alert.map.center.lat, alert.map.center.lng
                )?;
                if alert.queued > 0 {
                    writeln!(f, "  (+{} more active)", alert.queued)?;
                }
                Ok(())
            }
        }
    }
}

/// The traffic-control dashboard: reactive to the polled active list.
pub struct DispatcherBoard {
    live: LiveAlerts,
}

impl DispatcherBoard {
    pub fn new(live: LiveAlerts) -> Self {
        Self { live }
    }

    pub fn view(&self) -> DispatcherView {
        DispatcherView::from_snapshot(&self.live.snapshot())
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.live.subscribe()
    }

    /// "Mark Route Cleared".
    pub async fn clear(&self, id: i32) -> Result<Alert, ClientError> {
        self.live.update_status(id, AlertStatus::Completed).await
    }
}
