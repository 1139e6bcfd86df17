use crate::api::types::RouteGeometry;
use crate::api::Coord;

/// Center used before any position is known.
pub const DEFAULT_CENTER: Coord = Coord::new(20.5937, 78.9629);
pub const DEFAULT_ZOOM: u8 = 13;

/// What a map widget needs to draw one trip.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: Coord,
    pub zoom: u8,
    pub ambulance: Option<Coord>,
    pub destination: Option<Coord>,
    pub route: RouteGeometry,
    /// South-west and north-east corners of the route, when there is one.
    pub fit_bounds: Option<(Coord, Coord)>,
    pub interactive: bool,
}

impl MapView {
    pub fn new(
        ambulance: Option<Coord>,
        destination: Option<Coord>,
        route: RouteGeometry,
        interactive: bool,
    ) -> Self {
        Self {
            center: ambulance.unwrap_or(DEFAULT_CENTER),
            zoom: DEFAULT_ZOOM,
            ambulance,
            destination,
            fit_bounds: bounding_box(&route),
            route,
            interactive,
        }
    }
}

pub fn bounding_box(route: &RouteGeometry) -> Option<(Coord, Coord)> {
    let mut points = route.points();
    let first = points.next()?;

    Some(points.fold((first, first), |(min, max), p| {
        (
            Coord::new(min.lat.min(p.lat), min.lng.min(p.lng)),
            Coord::new(max.lat.max(p.lat), max.lng.max(p.lng)),
        )
    }))
}
