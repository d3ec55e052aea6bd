use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "Latitude and longitude are required")]
    MissingLocation,

    #[display(fmt = "Invalid coordinates ({}, {})", latitude, longitude)]
    InvalidLocation { latitude: f64, longitude: f64 },

    #[display(
        fmt = "You are {:.0} m away from {}. Check-in is allowed within {:.0} m",
        distance_meters,
        reference_name,
        radius_meters
    )]
    GeofenceRejected {
        distance_meters: f64,
        radius_meters: f64,
        reference_name: String,
    },

    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,

    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,

    #[display(fmt = "No check-in found for today")]
    SessionNotFound,

    #[display(fmt = "No reference location on file for employee {}", _0)]
    ReferenceNotFound(u64),

    #[display(fmt = "Invalid date range: from {} is after to {}", from, to)]
    InvalidRange {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },

    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),

    #[display(fmt = "Internal Server Error")]
    Unexpected(anyhow::Error),
}

impl std::error::Error for AttendanceError {}

impl AttendanceError {
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceError::MissingLocation => "MISSING_LOCATION",
            AttendanceError::InvalidLocation { .. } => "INVALID_LOCATION",
            AttendanceError::GeofenceRejected { .. } => "GEOFENCE_REJECTED",
            AttendanceError::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            AttendanceError::AlreadyCheckedOut => "ALREADY_CHECKED_OUT",
            AttendanceError::SessionNotFound => "SESSION_NOT_FOUND",
            AttendanceError::ReferenceNotFound(_) => "REFERENCE_NOT_FOUND",
            AttendanceError::InvalidRange { .. } => "INVALID_RANGE",
            AttendanceError::Forbidden(_) => "FORBIDDEN",
            AttendanceError::Unexpected(_) => "UNEXPECTED",
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::SessionNotFound | AttendanceError::ReferenceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AttendanceError::Forbidden(_) => StatusCode::FORBIDDEN,
            AttendanceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AttendanceError::Unexpected(e) = self {
            tracing::error!(error = ?e, "Attendance request failed");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}

impl From<StoreError> for AttendanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AttendanceError::AlreadyCheckedIn,
            StoreError::Unexpected(e) => AttendanceError::Unexpected(e),
        }
    }
}
