pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::Display;

use crate::attendance::geofence::{ReferenceLocation, ReferenceLookup};
use crate::model::attendance::{AttendanceSession, CheckOutUpdate, NewSession, SessionQuery};

pub use memory::MemoryAttendanceStore;
pub use mysql::MySqlAttendanceStore;

#[derive(Debug, Display)]
pub enum StoreError {
    /// A unique key (employee, date) already exists.
    #[display(fmt = "duplicate attendance session")]
    Duplicate,
    #[display(fmt = "{}", _0)]
    Unexpected(anyhow::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Unexpected(err.into())
    }
}

/// Persistence of attendance sessions and reference locations.
///
/// Implementations must enforce at most one session per (employee, date)
/// and only apply a check-out to a session that has none yet.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when a session for the same
    /// employee and date already exists.
    async fn insert_session(&self, session: NewSession) -> Result<AttendanceSession, StoreError>;

    /// Returns `false` when the session was already checked out.
    async fn complete_session(&self, id: u64, update: &CheckOutUpdate) -> Result<bool, StoreError>;

    async fn list_sessions(&self, query: &SessionQuery) -> Result<(Vec<AttendanceSession>, i64), StoreError>;

    async fn reference_location(&self, employee_id: u64) -> Result<ReferenceLookup, StoreError>;

    async fn set_reference_location(
        &self,
        employee_id: u64,
        location: &ReferenceLocation,
    ) -> Result<(), StoreError>;
}
