use super::map::MapView;
use super::{format_distance, format_eta, Notice};
use crate::api::map_service::{self, Place, Route};
use crate::api::types::{Alert, AlertStatus, NewAlert, RouteGeometry};
use crate::api::Coord;
use crate::client::{AlertsClient, ClientError};

/// Used when geolocation is unavailable.
pub const FALLBACK_POSITION: Coord = Coord::new(19.0760, 72.8777);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    NoPosition,
    PositionAcquired,
    DestinationChosen,
    RouteComputed,
    AlertActive,
}

/// What "Complete Trip" does to the alert on the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Only leave the active display; the alert stays active until a
    /// dispatcher clears it.
    #[default]
    LocalOnly,
    /// Also mark the alert completed.
    MarkCompleted,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct GeolocationError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Waiting for position")]
    NoPosition,

    #[error("Choose a destination first")]
    NoDestination,

    #[error("Calculate a route first")]
    NoRoute,

    #[error("An emergency alert is already active")]
    AlertAlreadyActive,

    #[error("No emergency alert is active")]
    NoActiveAlert,

    #[error("Failed to calculate route: {0}")]
    Routing(String),

    #[error("Failed to send alert: {0}")]
    SendAlert(#[source] ClientError),

    #[error("Failed to update location: {0}")]
    PushLocation(#[source] ClientError),

    #[error("Failed to complete trip: {0}")]
    Complete(#[source] ClientError),
}

impl DriverError {
    pub fn notice(&self) -> Notice {
        match self {
            DriverError::Routing(_) => Notice::error("Failed to calculate route"),
            DriverError::SendAlert(e) => {
                Notice::error("Failed to send alert").with_description(e.to_string())
            }
            other => Notice::error(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionButton {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverView {
    pub ambulance_id: String,
    pub state: DriverState,
    pub alert_banner: bool,
    pub destination: Option<String>,
    pub can_request_route: bool,
    pub eta: Option<String>,
    pub distance: Option<String>,
    pub map: MapView,
    pub action: ActionButton,
}

/// The ambulance pilot screen.
pub struct DriverSession {
    ambulance_id: String,
    policy: CompletionPolicy,
    routing: map_service::Client,
    alerts: AlertsClient,
    position: Option<Coord>,
    destination: Option<Place>,
    route: Option<Route>,
    alert: Option<Alert>,
}

impl DriverSession {
    pub fn new(
        ambulance_id: impl Into<String>,
        policy: CompletionPolicy,
        routing: map_service::Client,
        alerts: AlertsClient,
    ) -> Self {
        Self {
            ambulance_id: ambulance_id.into(),
            policy,
            routing,
            alerts,
            position: None,
            destination: None,
            route: None,
            alert: None,
        }
    }

    pub fn state(&self) -> DriverState {
        match (&self.position, &self.destination, &self.route, &self.alert) {
            (_, _, _, Some(_)) => DriverState::AlertActive,
            (None, _, _, _) => DriverState::NoPosition,
            (Some(_), None, _, _) => DriverState::PositionAcquired,
            (Some(_), Some(_), None, _) => DriverState::DestinationChosen,
            (Some(_), Some(_), Some(_), None) => DriverState::RouteComputed,
        }
    }

    pub fn position(&self) -> Option<Coord> {
        self.position
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// Apply the first geolocation result.
    pub fn locate(&mut self, fix: Result<Coord, GeolocationError>) -> Option<Notice> {
        match fix {
            Ok(position) => {
                self.position = Some(position);
                None
            }
            Err(e) => {
                log::warn!("geolocation failed ({e}), using fallback position");
                self.position = Some(FALLBACK_POSITION);
                Some(
                    Notice::error("GPS Unavailable")
                        .with_description("Using default location for prototype."),
                )
            }
        }
    }

    /// Choosing a new destination discards any computed route.
    pub fn select_destination(&mut self, place: Place) -> Result<(), DriverError> {
        if self.alert.is_some() {
            return Err(DriverError::AlertAlreadyActive);
        }
        self.destination = Some(place);
        self.route = None;
        Ok(())
    }

    pub async fn request_route(&mut self) -> Result<Notice, DriverError> {
        if self.alert.is_some() {
            return Err(DriverError::AlertAlreadyActive);
        }
        let from = self.position.ok_or(DriverError::NoPosition)?;
        let to = self
            .destination
            .as_ref()
            .ok_or(DriverError::NoDestination)?
            .location;

        let route = self
            .routing
            .route(from, to)
            .await
            .map_err(|e| DriverError::Routing(e.to_string()))?;

        log::info!(
            "route computed: {:.1} km, {} min, {} points",
            route.distance_km,
            route.eta_minutes,
            route.geometry.len()
        );
        self.route = Some(route);

        Ok(Notice::info("Route calculated successfully"))
    }

    pub async fn send_alert(&mut self) -> Result<Notice, DriverError> {
        if self.alert.is_some() {
            return Err(DriverError::AlertAlreadyActive);
        }
        let position = self.position.ok_or(DriverError::NoPosition)?;
        let destination = self.destination.as_ref().ok_or(DriverError::NoDestination)?;
        let route = self.route.as_ref().ok_or(DriverError::NoRoute)?;

        let alert = NewAlert {
            ambulance_id: self.ambulance_id.clone(),
            current_lat: position.lat,
            current_lng: position.lng,
            destination_name: destination.name.clone(),
            destination_lat: destination.location.lat,
            destination_lng: destination.location.lng,
            route_polyline: RouteGeometry(route.geometry.clone()).encode(),
            eta: route.eta_minutes,
            distance: route.distance_km,
            status: AlertStatus::Active,
        };

        let created = self
            .alerts
            .create(&alert)
            .await
            .map_err(DriverError::SendAlert)?;

        log::info!("alert {} broadcast for {}", created.id, created.ambulance_id);
        self.alert = Some(created);

        Ok(Notice::alert("EMERGENCY ALERT SENT!")
            .with_description("Traffic police have been notified."))
    }

    /// Report a new position for the active alert.
    pub async fn push_location(&mut self, at: Coord) -> Result<(), DriverError> {
        let id = self.alert.as_ref().ok_or(DriverError::NoActiveAlert)?.id;

        let updated = self
            .alerts
            .update_location(id, at.lat, at.lng)
            .await
            .map_err(DriverError::PushLocation)?;

        self.position = Some(at);
        self.alert = Some(updated);
        Ok(())
    }

    /// Leave the active display. With [`CompletionPolicy::MarkCompleted`] the
    /// alert is completed on the server first and stays active locally if
    /// that fails.
    pub async fn complete_trip(&mut self) -> Result<Notice, DriverError> {
        let id = self.alert.as_ref().ok_or(DriverError::NoActiveAlert)?.id;

        if self.policy == CompletionPolicy::MarkCompleted {
            self.alerts
                .update_status(id, AlertStatus::Completed)
                .await
                .map_err(DriverError::Complete)?;
        }

        self.alert = None;
        Ok(Notice::info("Trip completed"))
    }

    pub fn view(&self) -> DriverView {
        let state = self.state();
        let active = state == DriverState::AlertActive;
        let geometry = self
            .route
            .as_ref()
            .map(|r| RouteGeometry(r.geometry.clone()))
            .unwrap_or_default();

        DriverView {
            ambulance_id: self.ambulance_id.clone(),
            state,
            alert_banner: active,
            destination: self.destination.as_ref().map(|d| d.name.clone()),
            can_request_route: self.destination.is_some() && !active,
            eta: self.route.as_ref().map(|r| format_eta(r.eta_minutes)),
            distance: self.route.as_ref().map(|r| format_distance(r.distance_km)),
            map: MapView::new(
                self.position,
                self.destination.as_ref().map(|d| d.location),
                geometry,
                true,
            ),
            action: ActionButton {
                label: if active {
                    "Route Active"
                } else {
                    "Start Emergency Route"
                },
                enabled: self.route.is_some() && !active,
            },
        }
    }
}
