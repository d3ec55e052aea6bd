use std::sync::Arc;

use anyhow::Context;
use sqlx::MySqlPool;

use crate::config::Config;
use crate::store::{AttendanceStore, MemoryAttendanceStore, MySqlAttendanceStore};

pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Picks the session store: MySQL when a database is configured, memory otherwise.
pub async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn AttendanceStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = init_db(url).await?;
            Ok(Arc::new(MySqlAttendanceStore::new(pool, config.reference_cache_ttl)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, attendance sessions are kept in memory");
            Ok(Arc::new(MemoryAttendanceStore::new()))
        }
    }
}
