use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use moka::future::Cache;
use sqlx::{FromRow, MySqlPool};
use std::str::FromStr;

use super::{AttendanceStore, StoreError};
use crate::attendance::geofence::{ReferenceLocation, ReferenceLookup};
use crate::attendance::status::AttendanceStatus;
use crate::model::attendance::{
    AttendanceSession, CheckOutUpdate, NewSession, PunchLocation, SessionQuery,
};

const SESSION_COLUMNS: &str = r#"
    id, employee_id, date, punch_in, punch_out,
    punch_in_latitude, punch_in_longitude, punch_in_address, punch_in_area, punch_in_city, punch_in_pincode,
    punch_out_latitude, punch_out_longitude, punch_out_address, punch_out_area, punch_out_city, punch_out_pincode,
    status, work_hours, punch_in_selfie, punch_out_selfie
"#;

#[derive(FromRow)]
struct SessionRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    punch_in: NaiveDateTime,
    punch_out: Option<NaiveDateTime>,
    punch_in_latitude: Option<f64>,
    punch_in_longitude: Option<f64>,
    punch_in_address: Option<String>,
    punch_in_area: Option<String>,
    punch_in_city: Option<String>,
    punch_in_pincode: Option<String>,
    punch_out_latitude: Option<f64>,
    punch_out_longitude: Option<f64>,
    punch_out_address: Option<String>,
    punch_out_area: Option<String>,
    punch_out_city: Option<String>,
    punch_out_pincode: Option<String>,
    status: String,
    work_hours: Option<f64>,
    punch_in_selfie: Option<String>,
    punch_out_selfie: Option<String>,
}

fn location(
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
    area: Option<String>,
    city: Option<String>,
    pincode: Option<String>,
) -> Option<PunchLocation> {
    Some(PunchLocation {
        latitude: latitude?,
        longitude: longitude?,
        address,
        area,
        city,
        pincode,
    })
}

impl TryFrom<SessionRow> for AttendanceSession {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|e| {
            StoreError::Unexpected(anyhow::anyhow!("unknown status {:?} on session {}: {e}", row.status, row.id))
        })?;

        Ok(AttendanceSession {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            punch_in: row.punch_in,
            punch_out: row.punch_out,
            punch_in_location: location(
                row.punch_in_latitude,
                row.punch_in_longitude,
                row.punch_in_address,
                row.punch_in_area,
                row.punch_in_city,
                row.punch_in_pincode,
            ),
            punch_out_location: location(
                row.punch_out_latitude,
                row.punch_out_longitude,
                row.punch_out_address,
                row.punch_out_area,
                row.punch_out_city,
                row.punch_out_pincode,
            ),
            status,
            work_hours: row.work_hours,
            punch_in_selfie: row.punch_in_selfie,
            punch_out_selfie: row.punch_out_selfie,
        })
    }
}

/// MySQL-backed store. Reference locations are cached per employee.
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
    references: Cache<u64, ReferenceLocation>,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool, reference_ttl: Duration) -> Self {
        Self {
            pool,
            references: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(reference_ttl)
                .build(),
        }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM attendance_sessions WHERE employee_id = ? AND date = ?"
        ))
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AttendanceSession::try_from).transpose()
    }

    async fn insert_session(&self, session: NewSession) -> Result<AttendanceSession, StoreError> {
        let loc = &session.punch_in_location;

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_sessions
            (employee_id, date, punch_in,
             punch_in_latitude, punch_in_longitude, punch_in_address, punch_in_area, punch_in_city, punch_in_pincode,
             status, punch_in_selfie)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.employee_id)
        .bind(session.date)
        .bind(session.punch_in)
        .bind(loc.latitude)
        .bind(loc.longitude)
        .bind(&loc.address)
        .bind(&loc.area)
        .bind(&loc.city)
        .bind(&loc.pincode)
        .bind(session.status.to_string())
        .bind(&session.punch_in_selfie)
        .execute(&self.pool)
        .await?;

        Ok(session.into_session(result.last_insert_id()))
    }

    async fn complete_session(&self, id: u64, update: &CheckOutUpdate) -> Result<bool, StoreError> {
        let loc = update.punch_out_location.as_ref();

        let result = sqlx::query(
            r#"
            UPDATE attendance_sessions
            SET punch_out = ?,
                punch_out_latitude = ?, punch_out_longitude = ?, punch_out_address = ?,
                punch_out_area = ?, punch_out_city = ?, punch_out_pincode = ?,
                punch_out_selfie = ?, status = ?, work_hours = ?
            WHERE id = ?
            AND punch_out IS NULL
            "#,
        )
        .bind(update.punch_out)
        .bind(loc.map(|l| l.latitude))
        .bind(loc.map(|l| l.longitude))
        .bind(loc.and_then(|l| l.address.clone()))
        .bind(loc.and_then(|l| l.area.clone()))
        .bind(loc.and_then(|l| l.city.clone()))
        .bind(loc.and_then(|l| l.pincode.clone()))
        .bind(&update.punch_out_selfie)
        .bind(update.status.to_string())
        .bind(update.work_hours)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_sessions(&self, query: &SessionQuery) -> Result<(Vec<AttendanceSession>, i64), StoreError> {
        let filter = "employee_id = ? AND (? IS NULL OR date >= ?) AND (? IS NULL OR date <= ?)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM attendance_sessions WHERE {filter}"
        ))
        .bind(query.employee_id)
        .bind(query.from)
        .bind(query.from)
        .bind(query.to)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM attendance_sessions WHERE {filter} ORDER BY date DESC LIMIT ? OFFSET ?"
        ))
        .bind(query.employee_id)
        .bind(query.from)
        .bind(query.from)
        .bind(query.to)
        .bind(query.to)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let sessions = rows
            .into_iter()
            .map(AttendanceSession::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((sessions, total))
    }

    async fn reference_location(&self, employee_id: u64) -> Result<ReferenceLookup, StoreError> {
        if let Some(cached) = self.references.get(&employee_id).await {
            return Ok(ReferenceLookup::Found(cached));
        }

        let row = sqlx::query_as::<_, (f64, f64, String)>(
            "SELECT latitude, longitude, name FROM attendance_reference_locations WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((latitude, longitude, name)) = row else {
            return Ok(ReferenceLookup::NotSet);
        };

        let location = ReferenceLocation {
            latitude,
            longitude,
            name,
        };
        self.references.insert(employee_id, location.clone()).await;

        Ok(ReferenceLookup::Found(location))
    }

    async fn set_reference_location(
        &self,
        employee_id: u64,
        location: &ReferenceLocation,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO attendance_reference_locations (employee_id, latitude, longitude, name)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE latitude = VALUES(latitude), longitude = VALUES(longitude), name = VALUES(name)
            "#,
        )
        .bind(employee_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(&location.name)
        .execute(&self.pool)
        .await?;

        self.references.invalidate(&employee_id).await;
        Ok(())
    }
}
