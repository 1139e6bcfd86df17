use serde::{Deserialize, Serialize};

pub mod contract;
pub mod map_service;
pub mod service;
pub mod types;
pub mod validate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lng: f64,
}

impl Coord {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coord {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}
