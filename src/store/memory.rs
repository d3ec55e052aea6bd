use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceStore, StoreError};
use crate::attendance::geofence::{ReferenceLocation, ReferenceLookup};
use crate::model::attendance::{AttendanceSession, CheckOutUpdate, NewSession, SessionQuery};

#[derive(Default)]
struct Inner {
    next_id: u64,
    sessions: HashMap<(u64, NaiveDate), AttendanceSession>,
    references: HashMap<u64, ReferenceLocation>,
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    inner: Mutex<Inner>,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("attendance store lock poisoned")))
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn find_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        Ok(self.lock()?.sessions.get(&(employee_id, date)).cloned())
    }

    async fn insert_session(&self, session: NewSession) -> Result<AttendanceSession, StoreError> {
        let mut inner = self.lock()?;
        let key = (session.employee_id, session.date);
        if inner.sessions.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }

        inner.next_id += 1;
        let stored = session.into_session(inner.next_id);
        inner.sessions.insert(key, stored.clone());
        Ok(stored)
    }

    async fn complete_session(&self, id: u64, update: &CheckOutUpdate) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let session = inner
            .sessions
            .values_mut()
            .find(|s| s.id == id && s.punch_out.is_none());

        match session {
            Some(session) => {
                update.apply_to(session);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_sessions(&self, query: &SessionQuery) -> Result<(Vec<AttendanceSession>, i64), StoreError> {
        let inner = self.lock()?;
        let mut matching: Vec<_> = inner
            .sessions
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn reference_location(&self, employee_id: u64) -> Result<ReferenceLookup, StoreError> {
        Ok(self.lock()?.references.get(&employee_id).cloned().into())
    }

    async fn set_reference_location(
        &self,
        employee_id: u64,
        location: &ReferenceLocation,
    ) -> Result<(), StoreError> {
        self.lock()?.references.insert(employee_id, location.clone());
        Ok(())
    }
}
