use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AttendanceError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius applied when no other policy is configured.
pub const DEFAULT_RADIUS_METERS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 12.9716)]
    pub latitude: f64,
    #[schema(example = 77.5946)]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point from optional request fields.
    ///
    /// Both coordinates must be present, finite and inside the WGS84 ranges.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, AttendanceError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).validated(),
            _ => Err(AttendanceError::MissingLocation),
        }
    }

    pub fn validated(self) -> Result<Self, AttendanceError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);

        if lat_ok && lon_ok {
            Ok(self)
        } else {
            Err(AttendanceError::InvalidLocation {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Branch (or legacy office) location an employee is checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceLocation {
    #[schema(example = 12.9716)]
    pub latitude: f64,
    #[schema(example = 77.5946)]
    pub longitude: f64,
    #[schema(example = "Bangalore HQ")]
    pub name: String,
}

impl ReferenceLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Outcome of looking up an employee's reference location.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceLookup {
    Found(ReferenceLocation),
    /// Nothing on file; the first valid check-in becomes the reference.
    NotSet,
}

impl From<Option<ReferenceLocation>> for ReferenceLookup {
    fn from(value: Option<ReferenceLocation>) -> Self {
        match value {
            Some(location) => ReferenceLookup::Found(location),
            None => ReferenceLookup::NotSet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityCheck {
    pub accepted: bool,
    pub distance_meters: f64,
}

/// Great-circle distance in kilometres between two points.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push h a hair past 1.0 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn validate_proximity(claimed: GeoPoint, reference: GeoPoint, radius_meters: f64) -> ProximityCheck {
    let distance_meters = haversine_km(claimed, reference) * 1000.0;

    ProximityCheck {
        accepted: distance_meters <= radius_meters,
        distance_meters,
    }
}
