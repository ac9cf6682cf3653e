//! REST API client for the Flowstate backend.
//!
//! The engine only ever creates sessions. The read-only calls exist for the
//! CLI's `categories`, `history` and `dashboard` commands.

mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::timer::SessionStatus;

/// Body of `POST /sessions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub duration_minutes: u64,
    pub status: SessionStatus,
    pub note: String,
    pub category_id: Option<i64>,
}

/// A stored focus session as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub duration_minutes: u64,
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_utc::deserialize")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_utc::deserialize")]
    pub end_time: Option<DateTime<Utc>>,
}

/// The backend writes `datetime.utcnow()` without an offset; those read as UTC.
mod lenient_utc {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Ok(dt.with_timezone(&Utc)),
            Err(_) => raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
        }
    }
}

/// A user-defined session category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color_code: String,
}

/// The one network call the engine makes.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn create_session(&self, session: &NewSession) -> Result<SessionRecord, ApiError>;
}
