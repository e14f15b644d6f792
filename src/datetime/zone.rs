//! Timezone resolution
//!
//! Zone lookup is a read-only capability ([`ZoneDatabase`]); the
//! default implementation is backed by the IANA database in `chrono-tz`.

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::{Tz, TZ_VARIANTS};
use log::debug;
use std::fmt;

use super::TimeError;
use crate::constants::FALLBACK_ZONE;

/// Result of resolving a zone at an instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneInfo {
    /// UTC offset in effect at the instant
    pub offset: FixedOffset,
    /// Short name (e.g. "BST", "JST")
    pub abbreviation: String,
    /// Name shown in place of the city placeholder
    pub display_name: String,
}

/// Read-only timezone database
pub trait ZoneDatabase {
    /// All known zone identifiers
    fn enumerate_zones(&self) -> Vec<String>;

    /// Offset, abbreviation and display name of `zone_id` at `instant`
    fn resolve(&self, zone_id: &str, instant: DateTime<Utc>) -> Result<ZoneInfo, TimeError>;
}

/// Last path component of a zone identifier ("America/New_York" -> "New_York")
pub fn display_name(zone_id: &str) -> &str {
    zone_id.rsplit('/').next().unwrap_or(zone_id)
}

/// IANA database compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct TzDatabase;

impl ZoneDatabase for TzDatabase {
    fn enumerate_zones(&self) -> Vec<String> {
        TZ_VARIANTS.iter().map(|tz| tz.name().to_string()).collect()
    }

    fn resolve(&self, zone_id: &str, instant: DateTime<Utc>) -> Result<ZoneInfo, TimeError> {
        let tz: Tz = zone_id
            .parse()
            .map_err(|_| TimeError::UnknownZone(zone_id.to_string()))?;
        let offset = tz.offset_from_utc_datetime(&instant.naive_utc());

        Ok(ZoneInfo {
            offset: offset.fix(),
            abbreviation: offset.to_string(),
            display_name: display_name(tz.name()).to_string(),
        })
    }
}

/// Best guess at the host's zone identifier.
///
/// Checks `TZ`, then the `/etc/localtime` symlink target.
/// Returns None if neither names a zone.
pub fn host_zone_id() -> Option<String> {
    if let Ok(tz) = std::env::var("TZ") {
        let tz = tz.trim_start_matches(':');
        if tz.parse::<Tz>().is_ok() {
            return Some(tz.to_string());
        }
        debug!("Ignoring unrecognized TZ value: {}", tz);
    }

    let target = std::fs::read_link("/etc/localtime").ok()?;
    let target = target.to_string_lossy();
    let (_, zone) = target.split_once("zoneinfo/")?;
    zone.parse::<Tz>().ok().map(|_| zone.to_string())
}

/// Host zone, or UTC
pub fn host_zone_or_fallback() -> String {
    host_zone_id().unwrap_or_else(|| FALLBACK_ZONE.to_string())
}

// ============================================================================
// chrono adapter
// ============================================================================

/// Offset that formats `%Z` as the resolved abbreviation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneOffset {
    fixed: FixedOffset,
    abbreviation: String,
}

impl Offset for ZoneOffset {
    fn fix(&self) -> FixedOffset {
        self.fixed
    }
}

impl fmt::Display for ZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.abbreviation)
    }
}

/// A zone pinned to one resolved offset, so chrono can format
/// wall-clock time with the database's abbreviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone(ZoneOffset);

impl ResolvedZone {
    pub fn new(info: &ZoneInfo) -> Self {
        Self(ZoneOffset {
            fixed: info.offset,
            abbreviation: info.abbreviation.clone(),
        })
    }
}

impl TimeZone for ResolvedZone {
    type Offset = ZoneOffset;

    fn from_offset(offset: &ZoneOffset) -> Self {
        Self(offset.clone())
    }

    fn offset_from_local_date(&self, _local: &NaiveDate) -> LocalResult<ZoneOffset> {
        LocalResult::Single(self.0.clone())
    }

    fn offset_from_local_datetime(&self, _local: &NaiveDateTime) -> LocalResult<ZoneOffset> {
        LocalResult::Single(self.0.clone())
    }

    fn offset_from_utc_date(&self, _utc: &NaiveDate) -> ZoneOffset {
        self.0.clone()
    }

    fn offset_from_utc_datetime(&self, _utc: &NaiveDateTime) -> ZoneOffset {
        self.0.clone()
    }
}
