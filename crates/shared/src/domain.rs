use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);
    };
}

id_newtype!(HouseId, u32);
id_newtype!(EdgeId, usize);

impl fmt::Display for HouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic coordinate in degrees. Travels on the wire as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn approx_eq(&self, other: &GeoPoint, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() < epsilon && (self.lng - other.lng).abs() < epsilon
    }

    /// Great-circle distance in meters.
    pub fn haversine_m(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(value: GeoPoint) -> Self {
        [value.lat, value.lng]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Substation {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub start: GeoPoint,
    pub end: GeoPoint,
    /// Meters, as computed by the solver.
    pub distance: f64,
}

impl Edge {
    pub fn between(start: GeoPoint, end: GeoPoint) -> Self {
        Self {
            start,
            end,
            distance: start.haversine_m(&end),
        }
    }

    /// Undirected endpoint match.
    pub fn connects(&self, a: &GeoPoint, b: &GeoPoint, epsilon: f64) -> bool {
        (self.start.approx_eq(a, epsilon) && self.end.approx_eq(b, epsilon))
            || (self.start.approx_eq(b, epsilon) && self.end.approx_eq(a, epsilon))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstationConnection {
    pub house: GeoPoint,
    pub substation: GeoPoint,
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substation_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryLayout {
    pub edges: Vec<Edge>,
    pub substation_connection: SubstationConnection,
    pub total_length: f64,
    pub total_cost: f64,
    pub cost_per_meter: f64,
    pub house_count: usize,
}

impl PrimaryLayout {
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailedEdge {
    pub id: EdgeId,
    pub edge: Edge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupLayout {
    pub edges: Vec<Edge>,
    pub total_length: f64,
    pub total_cost: f64,
    pub failed: FailedEdge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_travels_as_lat_lng_pair() {
        let encoded = serde_json::to_string(&GeoPoint::new(30.1, 78.2)).expect("encode");
        assert_eq!(encoded, "[30.1,78.2]");

        let decoded: GeoPoint = serde_json::from_str("[30.1,78.2]").expect("decode");
        assert_eq!(decoded, GeoPoint::new(30.1, 78.2));
    }

    #[test]
    fn haversine_matches_known_meridian_distance() {
        let a = GeoPoint::new(30.10, 78.10);
        let b = GeoPoint::new(30.11, 78.10);
        let meters = a.haversine_m(&b);
        assert!((meters - 1111.95).abs() < 0.5, "got {meters}");
    }

    #[test]
    fn edge_connects_in_either_direction() {
        let a = GeoPoint::new(1.0, 2.0);
        let b = GeoPoint::new(3.0, 4.0);
        let edge = Edge::between(a, b);
        assert!(edge.connects(&a, &b, 1e-9));
        assert!(edge.connects(&b, &a, 1e-9));
        assert!(!edge.connects(&a, &GeoPoint::new(3.0, 4.1), 1e-9));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}
