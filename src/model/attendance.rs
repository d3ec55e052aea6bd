use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::attendance::geofence::GeoPoint;
use crate::attendance::status::AttendanceStatus;

/// Where a punch happened, as reported by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PunchLocation {
    #[schema(example = 12.9716)]
    pub latitude: f64,
    #[schema(example = 77.5946)]
    pub longitude: f64,
    #[schema(example = "12 MG Road", nullable = true)]
    pub address: Option<String>,
    #[schema(example = "Ashok Nagar", nullable = true)]
    pub area: Option<String>,
    #[schema(example = "Bengaluru", nullable = true)]
    pub city: Option<String>,
    #[schema(example = "560001", nullable = true)]
    pub pincode: Option<String>,
}

impl PunchLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// One check-in/check-out pair for one employee on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSession {
    pub id: u64,
    pub employee_id: u64,

    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,

    #[schema(value_type = String, format = "date-time", example = "2026-03-02T09:12:00")]
    pub punch_in: NaiveDateTime,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub punch_out: Option<NaiveDateTime>,

    pub punch_in_location: Option<PunchLocation>,
    pub punch_out_location: Option<PunchLocation>,

    pub status: AttendanceStatus,

    #[schema(example = 8.5, nullable = true)]
    pub work_hours: Option<f64>,

    pub punch_in_selfie: Option<String>,
    pub punch_out_selfie: Option<String>,
}

impl AttendanceSession {
    pub fn is_checked_out(&self) -> bool {
        self.punch_out.is_some()
    }
}

/// A session as written at check-in, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub punch_in: NaiveDateTime,
    pub punch_in_location: PunchLocation,
    pub punch_in_selfie: Option<String>,
    pub status: AttendanceStatus,
}

impl NewSession {
    pub fn into_session(self, id: u64) -> AttendanceSession {
        AttendanceSession {
            id,
            employee_id: self.employee_id,
            date: self.date,
            punch_in: self.punch_in,
            punch_out: None,
            punch_in_location: Some(self.punch_in_location),
            punch_out_location: None,
            status: self.status,
            work_hours: None,
            punch_in_selfie: self.punch_in_selfie,
            punch_out_selfie: None,
        }
    }
}

/// Fields written once at check-out.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutUpdate {
    pub punch_out: NaiveDateTime,
    pub punch_out_location: Option<PunchLocation>,
    pub punch_out_selfie: Option<String>,
    pub status: AttendanceStatus,
    pub work_hours: f64,
}

impl CheckOutUpdate {
    pub fn apply_to(&self, session: &mut AttendanceSession) {
        session.punch_out = Some(self.punch_out);
        session.punch_out_location = self.punch_out_location.clone();
        session.punch_out_selfie = self.punch_out_selfie.clone();
        session.status = self.status;
        session.work_hours = Some(self.work_hours);
    }
}

/// Date-bounded page of one employee's sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionQuery {
    pub employee_id: u64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: u32,
    pub offset: u32,
}

impl SessionQuery {
    pub fn matches(&self, session: &AttendanceSession) -> bool {
        session.employee_id == self.employee_id
            && self.from.is_none_or(|from| session.date >= from)
            && self.to.is_none_or(|to| session.date <= to)
    }
}
