use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use time::UtcOffset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Postgres,
    Memory,
}

/// Display order of the body-composition history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub dir: PathBuf,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub ai: AiConfig,
    pub staff_code: String,
    pub utc_offset_hours: i8,
    pub inbody_sort: SortOrder,
    pub logout_clears_all: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match env_or("STORE_BACKEND", "file").to_lowercase().as_str() {
            "file" => StoreBackend::File,
            "postgres" | "pg" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("STORE_BACKEND=postgres requires DATABASE_URL");
        }
        let store = StoreConfig {
            backend,
            dir: PathBuf::from(env_or("STORE_DIR", "./data")),
            database_url,
        };

        let ai = AiConfig {
            api_key: std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?,
            model: env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            timeout_secs: parse_or("AI_TIMEOUT_SECS", 30),
        };

        let inbody_sort = match env_or("INBODY_SORT", "asc").to_lowercase().as_str() {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        };

        Ok(Self {
            store,
            ai,
            staff_code: env_or("STAFF_CODE", "STAFF999"),
            utc_offset_hours: parse_or("CLINIC_UTC_OFFSET_HOURS", 9),
            inbody_sort,
            logout_clears_all: parse_or("LOGOUT_CLEARS_ALL", false),
        })
    }

    /// Offset used for "today" and the meal time-of-day. Out-of-range values fall back to UTC.
    pub fn utc_offset(&self) -> UtcOffset {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
