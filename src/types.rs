//! Core types for the archive ledger.

use crate::error::{LedgerError, Result};
use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp format used by the Wayback Machine (`YYYYMMDDhhmmss`).
const WAYBACK_FORMAT: &str = "%Y%m%d%H%M%S";

/// Timezone-naive capture time with second precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Wrap a datetime, dropping sub-second precision.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Timestamp(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// Build from calendar fields. Returns `None` for impossible dates.
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, min, sec))
            .map(Timestamp)
    }

    /// Current UTC wall-clock time. Archive timestamps are UTC as well.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now().naive_utc())
    }

    /// Parse a 14-digit Wayback timestamp.
    pub fn parse_wayback(s: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(s, WAYBACK_FORMAT)
            .map(Self::from_datetime)
            .map_err(|e| LedgerError::InvalidTimestamp(format!("{s:?}: {e}")))
    }

    /// Format as a 14-digit Wayback timestamp.
    pub fn to_wayback(&self) -> String {
        self.0.format(WAYBACK_FORMAT).to_string()
    }

    /// Calendar date of this timestamp.
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl FromStr for Timestamp {
    type Err = LedgerError;

    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DDThh:mm:ss` and `YYYY-MM-DD hh:mm:ss`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Timestamp(midnight));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self::from_datetime(dt));
            }
        }
        Err(LedgerError::InvalidTimestamp(s.to_string()))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// One archived capture reported by a snapshot lister.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Original page URL (the record key).
    pub url: String,

    /// When the archive took the capture.
    pub captured_at: Timestamp,
}

impl Snapshot {
    pub fn new(url: impl Into<String>, captured_at: Timestamp) -> Self {
        Self {
            url: url.into(),
            captured_at,
        }
    }
}

/// Metadata scraped from a page.
///
/// An empty description marks a page whose content is gone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub description: String,
    pub image_url: String,
}

impl PageMeta {
    pub fn new(description: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            image_url: image_url.into(),
        }
    }
}

/// A single discovered page in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical URL of the original page (unique key).
    pub url: String,

    /// Secondary resource extracted from the page. May be empty.
    pub image_url: String,

    /// Free-text content extracted from the page.
    pub description: String,

    /// When the archive snapshot was taken.
    pub captured_at: Timestamp,

    /// Whether the page had content at ingestion time. Never recomputed.
    pub valid: bool,
}

impl Record {
    /// Create a record from scraped metadata, deriving validity.
    pub fn new(url: impl Into<String>, meta: PageMeta, captured_at: Timestamp) -> Self {
        let valid = !meta.description.is_empty();
        Self {
            url: url.into(),
            image_url: meta.image_url,
            description: meta.description,
            captured_at,
            valid,
        }
    }
}

/// Time interval believed to be fully ingested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRange {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl CoverageRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// True if both bounds are set and `at` lies in `[start, end]`.
    pub fn contains(&self, at: Timestamp) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= at && at <= end,
            _ => false,
        }
    }
}
