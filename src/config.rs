use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::attendance::geofence::DEFAULT_RADIUS_METERS;
use crate::attendance::status::WorkPolicy;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// When absent, sessions are kept in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_attendance_per_min: u32,

    // Attendance policy
    pub geofence_radius_meters: f64,
    pub work_policy: WorkPolicy,
    pub reference_cache_ttl: Duration,
}

fn var_or<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}

fn check_work_policy(policy: &WorkPolicy) -> Result<()> {
    if policy.work_end <= policy.work_start {
        anyhow::bail!("WORK_END must be later than WORK_START");
    }
    if !policy.min_work_hours.is_finite() || policy.min_work_hours < 0.0 {
        anyhow::bail!("MIN_WORK_HOURS must be a non-negative number");
    }
    Ok(())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let work_policy = WorkPolicy {
            work_start: var_or::<NaiveTime>("WORK_START", "09:30:00")?,
            work_end: var_or::<NaiveTime>("WORK_END", "18:30:00")?,
            min_work_hours: var_or("MIN_WORK_HOURS", "5")?,
        };
        check_work_policy(&work_policy)?;

        let geofence_radius_meters: f64 =
            var_or("GEOFENCE_RADIUS_METERS", &DEFAULT_RADIUS_METERS.to_string())?;
        if !geofence_radius_meters.is_finite() || geofence_radius_meters < 0.0 {
            anyhow::bail!("GEOFENCE_RADIUS_METERS must be a non-negative number");
        }

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_attendance_per_min: var_or("RATE_ATTENDANCE_PER_MIN", "120")?,

            geofence_radius_meters,
            work_policy,
            reference_cache_ttl: Duration::from_secs(var_or("REFERENCE_CACHE_TTL_SECS", "300")?),
        })
    }
}
