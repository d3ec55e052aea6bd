pub mod error;
pub mod geofence;
pub mod service;
pub mod status;

pub use error::AttendanceError;
pub use service::{AttendanceService, PunchRequest};
