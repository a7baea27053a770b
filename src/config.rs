use std::env;
use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::clutch::ClutchFilter;
use crate::error::{AnalyticsError, Result};

const DEFAULT_DB_PATH: &str = "hoops_analytics.sqlite";
const DEFAULT_LOG_FILTER: &str = "info";

static DOTENV: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub parallelism: usize,
    pub log_filter: String,
    pub clutch: ClutchFilter,
}

impl AppConfig {
    /// Load `.env.local` then `.env` (first one wins) and read the environment.
    pub fn from_env() -> Result<Self> {
        DOTENV.get_or_init(|| {
            let _ = dotenvy::from_filename(".env.local");
            let _ = dotenvy::from_filename(".env");
        });
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("HOOPS_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let parallelism = lookup("HOOPS_PARALLELISM")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 32);
        let log_filter = lookup("HOOPS_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let defaults = ClutchFilter::default();
        let clutch = ClutchFilter::new(
            env_u32(&lookup, "HOOPS_CLUTCH_SECONDS", "time_remaining_seconds")?
                .unwrap_or(defaults.time_remaining_seconds()),
            env_u32(&lookup, "HOOPS_CLUTCH_MARGIN", "score_margin")?
                .unwrap_or(defaults.score_margin()),
            env_bool(&lookup, "HOOPS_CLUTCH_OVERTIME", "include_overtime")?
                .unwrap_or(defaults.include_overtime()),
            env_u32(&lookup, "HOOPS_CLUTCH_MIN_PERIOD", "min_period")?
                .unwrap_or(defaults.min_period()),
        )?;

        Ok(Self {
            db_path,
            parallelism,
            log_filter,
            clutch,
        })
    }
}

fn env_u32(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &'static str,
) -> Result<Option<u32>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|_| AnalyticsError::invalid(field, format!("{key}={raw:?} is not a number")))
}

fn env_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &'static str,
) -> Result<Option<bool>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(AnalyticsError::invalid(
            field,
            format!("{key}={raw:?} is not a boolean"),
        )),
    }
}
