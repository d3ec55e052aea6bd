use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::error::AttendanceError;
use super::geofence::{GeoPoint, ReferenceLocation, ReferenceLookup, validate_proximity};
use super::status::WorkPolicy;
use crate::model::attendance::{
    AttendanceSession, CheckOutUpdate, NewSession, PunchLocation, SessionQuery,
};
use crate::store::AttendanceStore;

/// Name given to a reference location adopted from a first check-in.
pub const BOOTSTRAP_REFERENCE_NAME: &str = "First check-in location";

/// Body of a check-in or check-out request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PunchRequest {
    #[schema(example = 12.9716)]
    pub latitude: Option<f64>,
    #[schema(example = 77.5946)]
    pub longitude: Option<f64>,
    #[schema(example = "12 MG Road")]
    pub address: Option<String>,
    #[schema(example = "Ashok Nagar")]
    pub area: Option<String>,
    #[schema(example = "Bengaluru")]
    pub city: Option<String>,
    #[schema(example = "560001")]
    pub pincode: Option<String>,
    /// Opaque reference to an uploaded selfie.
    pub selfie: Option<String>,
}

impl PunchRequest {
    /// `Ok(None)` when no coordinates were sent at all.
    fn location(&self) -> Result<Option<PunchLocation>, AttendanceError> {
        if self.latitude.is_none() && self.longitude.is_none() {
            return Ok(None);
        }

        let point = GeoPoint::from_parts(self.latitude, self.longitude)?;
        Ok(Some(PunchLocation {
            latitude: point.latitude,
            longitude: point.longitude,
            address: self.address.clone(),
            area: self.area.clone(),
            city: self.city.clone(),
            pincode: self.pincode.clone(),
        }))
    }
}

pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    policy: WorkPolicy,
    radius_meters: f64,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn AttendanceStore>, policy: WorkPolicy, radius_meters: f64) -> Self {
        Self {
            store,
            policy,
            radius_meters,
        }
    }

    pub async fn check_in(
        &self,
        employee_id: u64,
        request: PunchRequest,
        now: NaiveDateTime,
    ) -> Result<AttendanceSession, AttendanceError> {
        let location = request.location()?.ok_or(AttendanceError::MissingLocation)?;
        let date = now.date();

        if self.store.find_session(employee_id, date).await?.is_some() {
            return Err(AttendanceError::AlreadyCheckedIn);
        }

        let reference = self.store.reference_location(employee_id).await?;
        if let ReferenceLookup::Found(reference) = &reference {
            let check = validate_proximity(location.point(), reference.point(), self.radius_meters);
            if !check.accepted {
                warn!(
                    employee_id,
                    distance_meters = check.distance_meters,
                    reference = %reference.name,
                    "Check-in outside geofence"
                );
                return Err(AttendanceError::GeofenceRejected {
                    distance_meters: check.distance_meters,
                    radius_meters: self.radius_meters,
                    reference_name: reference.name.clone(),
                });
            }
        }

        let session = NewSession {
            employee_id,
            date,
            punch_in: now,
            punch_in_location: location,
            punch_in_selfie: request.selfie,
            status: self.policy.derive_check_in_status(now),
        };

        let stored = self.store.insert_session(session).await?;
        info!(employee_id, %date, status = %stored.status, "Checked in");

        // only a recorded check-in may become the reference
        if matches!(reference, ReferenceLookup::NotSet) {
            if let Some(location) = &stored.punch_in_location {
                if let Err(e) = self.bootstrap_reference(employee_id, location).await {
                    error!(employee_id, error = %e, "Failed to adopt reference location");
                }
            }
        }

        Ok(stored)
    }

    async fn bootstrap_reference(
        &self,
        employee_id: u64,
        location: &PunchLocation,
    ) -> Result<(), AttendanceError> {
        let reference = ReferenceLocation {
            latitude: location.latitude,
            longitude: location.longitude,
            name: location
                .address
                .clone()
                .unwrap_or_else(|| BOOTSTRAP_REFERENCE_NAME.to_string()),
        };
        self.store.set_reference_location(employee_id, &reference).await?;
        info!(employee_id, reference = %reference.name, "Adopted first check-in as reference location");
        Ok(())
    }

    pub async fn check_out(
        &self,
        employee_id: u64,
        request: PunchRequest,
        now: NaiveDateTime,
    ) -> Result<AttendanceSession, AttendanceError> {
        let location = request.location()?;

        let mut session = self
            .store
            .find_session(employee_id, now.date())
            .await?
            .ok_or(AttendanceError::SessionNotFound)?;

        if session.is_checked_out() {
            return Err(AttendanceError::AlreadyCheckedOut);
        }

        // punch-out never precedes punch-in, even across a clock step
        let punch_out = now.max(session.punch_in);
        let outcome = self
            .policy
            .derive_check_out_status(session.punch_in, punch_out, session.status);

        let update = CheckOutUpdate {
            punch_out,
            punch_out_location: location,
            punch_out_selfie: request.selfie,
            status: outcome.status,
            work_hours: outcome.work_hours,
        };

        if !self.store.complete_session(session.id, &update).await? {
            return Err(AttendanceError::AlreadyCheckedOut);
        }

        update.apply_to(&mut session);
        info!(
            employee_id,
            date = %session.date,
            status = %session.status,
            work_hours = outcome.work_hours,
            "Checked out"
        );
        Ok(session)
    }

    pub async fn today(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
    ) -> Result<AttendanceSession, AttendanceError> {
        self.store
            .find_session(employee_id, now.date())
            .await?
            .ok_or(AttendanceError::SessionNotFound)
    }

    pub async fn history(
        &self,
        query: SessionQuery,
    ) -> Result<(Vec<AttendanceSession>, i64), AttendanceError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AttendanceError::InvalidRange { from, to });
            }
        }

        Ok(self.store.list_sessions(&query).await?)
    }

    pub async fn reference(&self, employee_id: u64) -> Result<ReferenceLocation, AttendanceError> {
        match self.store.reference_location(employee_id).await? {
            ReferenceLookup::Found(location) => Ok(location),
            ReferenceLookup::NotSet => Err(AttendanceError::ReferenceNotFound(employee_id)),
        }
    }

    pub async fn set_reference(
        &self,
        employee_id: u64,
        location: ReferenceLocation,
    ) -> Result<ReferenceLocation, AttendanceError> {
        location.point().validated()?;
        self.store.set_reference_location(employee_id, &location).await?;
        info!(employee_id, reference = %location.name, "Reference location updated");
        Ok(location)
    }
}

/// Normalises pagination into `(page, per_page, offset)`.
pub fn page_window(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1).saturating_mul(per_page);
    (page, per_page, offset)
}
