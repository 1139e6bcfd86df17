use serde::{Deserialize, Serialize};

use crate::api::Coord;

/// A GeoJSON feature collection as returned by the provider.
#[derive(Serialize, Deserialize)]
pub struct FeatureCollection<F> {
    pub features: Vec<F>,
}

#[derive(Serialize, Deserialize)]
pub struct RouteFeature {
    pub geometry: MultiLineString,
    pub properties: RouteProperties,
}

#[derive(Serialize, Deserialize)]
pub struct PlaceFeature {
    pub properties: PlaceProperties,
}

/// Legs of `[lon, lat]` pairs.
#[derive(Serialize, Deserialize)]
pub struct MultiLineString {
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Serialize, Deserialize)]
pub struct RouteProperties {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub time: f64,
}

#[derive(Serialize, Deserialize)]
pub struct PlaceProperties {
    pub lat: f64,
    pub lon: f64,
    pub formatted: String,
}

/// A computed route, converted to the units alerts are stored in.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// `[lat, lng]` pairs from origin to destination.
    pub geometry: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub eta_minutes: i32,
}

impl Route {
    pub fn from_feature(feature: RouteFeature) -> Self {
        let geometry = feature
            .geometry
            .coordinates
            .into_iter()
            .flatten()
            .map(|[lon, lat]| [lat, lon])
            .collect();

        Self {
            geometry,
            distance_km: feature.properties.distance / 1000.0,
            eta_minutes: (feature.properties.time / 60.0).round() as i32,
        }
    }
}

/// A geocoder candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub location: Coord,
}

impl From<PlaceProperties> for Place {
    fn from(p: PlaceProperties) -> Self {
        Self {
            name: p.formatted,
            location: Coord::new(p.lat, p.lon),
        }
    }
}

/// Restricts and biases place search.
#[derive(Debug, Clone)]
pub struct SearchArea {
    pub country_code: String,
    pub center: Coord,
    pub radius_m: u32,
    pub place_type: String,
}

impl Default for SearchArea {
    fn default() -> Self {
        Self {
            country_code: "in".to_string(),
            center: Coord::new(12.9716, 77.5946),
            radius_m: 50_000,
            place_type: "amenity".to_string(),
        }
    }
}

impl SearchArea {
    pub fn filter(&self) -> String {
        format!(
            "countrycode:{}|circle:{},{},{}",
            self.country_code, self.center.lng, self.center.lat, self.radius_m
        )
    }

    pub fn bias(&self) -> String {
        format!("proximity:{},{}", self.center.lng, self.center.lat)
    }
}
