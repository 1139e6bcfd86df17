use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validate::{kind, Fields, Validate, ValidationError};
use super::Coord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Active,
    Completed,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "completed" => Ok(AlertStatus::Completed),
            other => Err(ValidationError::at(
                "status",
                format!("Invalid enum value. Expected 'active' | 'completed', received '{other}'"),
            )),
        }
    }
}

/// A persisted emergency alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i32,
    pub ambulance_id: String,
    pub current_lat: f64,
    pub current_lng: f64,
    pub destination_name: String,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub route_polyline: String,
    pub eta: i32,
    pub distance: f64,
    pub status: AlertStatus,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    pub fn current(&self) -> Coord {
        Coord::new(self.current_lat, self.current_lng)
    }

    pub fn destination(&self) -> Coord {
        Coord::new(self.destination_lat, self.destination_lng)
    }
}

/// Create-alert body: every field of [`Alert`] except `id` and `updatedAt`.
/// Only [`Validate`] reads it; serde is for sending.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub ambulance_id: String,
    pub current_lat: f64,
    pub current_lng: f64,
    pub destination_name: String,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub route_polyline: String,
    pub eta: i32,
    pub distance: f64,
    pub status: AlertStatus,
}

impl Validate for NewAlert {
    fn validate(value: &Value) -> Result<Self, ValidationError> {
        let fields = Fields::new(value)?;

        Ok(Self {
            ambulance_id: fields.string("ambulanceId")?,
            current_lat: fields.number("currentLat")?,
            current_lng: fields.number("currentLng")?,
            destination_name: fields.string("destinationName")?,
            destination_lat: fields.number("destinationLat")?,
            destination_lng: fields.number("destinationLng")?,
            route_polyline: polyline_field(&fields)?,
            eta: fields.integer("eta")?,
            distance: fields.number("distance")?,
            status: match fields.get("status") {
                None => AlertStatus::default(),
                Some(_) => status_field(&fields)?,
            },
        })
    }
}

fn polyline_field(fields: &Fields<'_>) -> Result<String, ValidationError> {
    let polyline = fields.string("routePolyline")?;
    RouteGeometry::decode(&polyline).map_err(|_| {
        ValidationError::at("routePolyline", "Expected a JSON array of [lat, lng] pairs")
    })?;
    Ok(polyline)
}

fn status_field(fields: &Fields<'_>) -> Result<AlertStatus, ValidationError> {
    match fields.get("status") {
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(ValidationError::at(
            "status",
            format!("Expected string, received {}", kind(other)),
        )),
        None => Err(ValidationError::at("status", "Required")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lng: f64,
}

impl Validate for LocationUpdate {
    fn validate(value: &Value) -> Result<Self, ValidationError> {
        let fields = Fields::new(value)?;
        Ok(Self {
            lat: fields.number("lat")?,
            lng: fields.number("lng")?,
        })
    }
}

impl From<LocationUpdate> for Coord {
    fn from(update: LocationUpdate) -> Self {
        Coord::new(update.lat, update.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: AlertStatus,
}

impl Validate for StatusUpdate {
    fn validate(value: &Value) -> Result<Self, ValidationError> {
        let fields = Fields::new(value)?;
        Ok(Self {
            status: status_field(&fields)?,
        })
    }
}

/// Body of 404, 409 and 500 responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Ordered `[lat, lng]` pairs, stored in `routePolyline` as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteGeometry(pub Vec<[f64; 2]>);

impl RouteGeometry {
    pub fn encode(&self) -> String {
        Value::from(
            self.0
                .iter()
                .map(|pair| Value::from(pair.to_vec()))
                .collect::<Vec<_>>(),
        )
        .to_string()
    }

    pub fn decode(polyline: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(polyline)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Coord> + '_ {
        self.0.iter().copied().map(Coord::from)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_body() -> Value {
        json!({
            "ambulanceId": "A1",
            "currentLat": 12.9,
            "currentLng": 77.6,
            "destinationName": "City Hospital",
            "destinationLat": 12.93,
            "destinationLng": 77.62,
            "routePolyline": "[]",
            "eta": 10,
            "distance": 3.5,
            "status": "active"
        })
    }

    #[test]
    fn new_alert_accepts_full_body() {
        let alert = NewAlert::validate(&valid_body()).unwrap();
        assert_eq!(alert.ambulance_id, "A1");
        assert_eq!(alert.eta, 10);
        assert_eq!(alert.status, AlertStatus::Active);
    }

    #[test]
    fn new_alert_status_defaults_to_active() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("status");
        let alert = NewAlert::validate(&body).unwrap();
        assert_eq!(alert.status, AlertStatus::Active);
    }

    #[test]
    fn new_alert_reports_missing_field() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("destinationName");
        let err = NewAlert::validate(&body).unwrap_err();
        assert_eq!(err, ValidationError::at("destinationName", "Required"));
    }

    #[test]
    fn new_alert_rejects_unknown_status() {
        let mut body = valid_body();
        body["status"] = json!("cancelled");
        let err = NewAlert::validate(&body).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("status"));
        assert!(err.message.contains("'cancelled'"));
    }

    #[test]
    fn new_alert_rejects_malformed_polyline() {
        let mut body = valid_body();
        body["routePolyline"] = json!("[[12.9]]");
        let err = NewAlert::validate(&body).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("routePolyline"));
    }

    #[test]
    fn status_update_requires_status() {
        let err = StatusUpdate::validate(&json!({})).unwrap_err();
        assert_eq!(err, ValidationError::at("status", "Required"));

        let err = StatusUpdate::validate(&json!({ "status": 1 })).unwrap_err();
        assert_eq!(err.message, "Expected string, received number");
    }

    #[test]
    fn alert_serializes_camel_case() {
        let alert = Alert {
            id: 3,
            ambulance_id: "A1".into(),
            current_lat: 1.0,
            current_lng: 2.0,
            destination_name: "H".into(),
            destination_lat: 3.0,
            destination_lng: 4.0,
            route_polyline: "[]".into(),
            eta: 5,
            distance: 6.5,
            status: AlertStatus::Completed,
            updated_at: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["ambulanceId"], "A1");
        assert_eq!(value["routePolyline"], "[]");
        assert_eq!(value["status"], "completed");
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn route_geometry_decodes_what_it_encoded() {
        let geometry = RouteGeometry(vec![
            [12.971_598_7, 77.594_562_1],
            [12.935_2, 77.624_5],
            [-0.1, 1e-7],
        ]);
        let decoded = RouteGeometry::decode(&geometry.encode()).unwrap();
        assert_eq!(decoded, geometry);
        assert!(RouteGeometry::decode("[]").unwrap().is_empty());
    }
}
