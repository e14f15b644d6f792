//! Date/time text source
//!
//! Formats one wall-clock [`TimeSpec`] as observed in a list of zones,
//! one output line per zone.

use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use log::warn;
use std::fmt::Write;
use std::sync::Arc;

use super::format::{translate, FORMAT_TOKENS};
use super::zone::{display_name, ResolvedZone, TzDatabase, ZoneDatabase};
use super::TimeError;
use crate::constants::ZONE_CITY_PLACEHOLDER;

/// Calendar date plus time of day.
///
/// Interpreted as wall-clock time in some reference zone. Immutable;
/// edits replace the whole value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSpec {
    date: NaiveDate,
    time: NaiveTime,
}

impl TimeSpec {
    /// Validated constructor. None if any field is out of range
    /// (including day 30 of February and friends).
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<Self> {
        Some(Self {
            date: NaiveDate::from_ymd_opt(year, month, day)?,
            time: NaiveTime::from_hms_opt(hour, minute, second)?,
        })
    }

    /// Constructor that clamps every field into its valid range,
    /// the day against the length of the given month.
    pub fn clamped(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        let year = year.clamp(-9999, 9999);
        let month = month.clamp(1, 12);
        let day = day.clamp(1, days_in_month(year, month));
        Self {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
            time: NaiveTime::from_hms_opt(hour.min(23), minute.min(59), second.min(59))
                .unwrap_or_default(),
        }
    }

    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        Self {
            date: datetime.date(),
            // Drop sub-second precision
            time: datetime.time().with_nanosecond(0).unwrap_or(datetime.time()),
        }
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    pub fn second(&self) -> u32 {
        self.time.second()
    }
}

/// Number of days in `month` of `year`
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// A user format string and its strftime translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeFormat {
    raw: String,
    canonical: String,
}

impl DateTimeFormat {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let canonical = translate(&raw);
        Self { raw, canonical }
    }

    /// Text as typed by the user
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// strftime pattern
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

/// Produces multi-zone date/time text
#[derive(Clone)]
pub struct TimeSource {
    db: Arc<dyn ZoneDatabase + Send + Sync>,
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::new(Arc::new(TzDatabase))
    }
}

impl TimeSource {
    pub fn new(db: Arc<dyn ZoneDatabase + Send + Sync>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &(dyn ZoneDatabase + Send + Sync) {
        self.db.as_ref()
    }

    /// Current wall-clock time in `zone_id` (UTC if the zone is unknown)
    pub fn now(&self, zone_id: &str) -> TimeSpec {
        let now = Utc::now();
        let offset = match self.db.resolve(zone_id, now) {
            Ok(info) => info.offset.local_minus_utc(),
            Err(e) => {
                warn!("Current time falls back to UTC: {}", e);
                0
            }
        };
        let local = now.naive_utc() + Duration::seconds(offset as i64);
        TimeSpec::from_naive(local)
    }

    /// Instant at which `spec` is the wall-clock time in `reference_zone`.
    ///
    /// Unknown reference zones are treated as UTC.
    pub fn instant(&self, spec: &TimeSpec, reference_zone: &str) -> DateTime<Utc> {
        let local = spec.naive();
        let offset_at = |guess: NaiveDateTime| {
            self.db
                .resolve(reference_zone, Utc.from_utc_datetime(&guess))
                .map(|info| info.offset.local_minus_utc() as i64)
        };
        let shift = |offset: i64| {
            local
                .checked_sub_signed(Duration::seconds(offset))
                .unwrap_or(local)
        };

        let first = match offset_at(local) {
            Ok(offset) => offset,
            Err(e) => {
                warn!("Reference zone treated as UTC: {}", e);
                return Utc.from_utc_datetime(&local);
            }
        };
        // Second pass picks up a transition between the guess and the answer
        let second = offset_at(shift(first)).unwrap_or(first);
        Utc.from_utc_datetime(&shift(second))
    }

    /// Format `instant` as observed in `zone_id` using a strftime pattern
    pub fn format_in_zone(
        &self,
        instant: DateTime<Utc>,
        zone_id: &str,
        pattern: &str,
    ) -> Result<String, TimeError> {
        let info = self.db.resolve(zone_id, instant)?;

        let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(TimeError::InvalidPattern(pattern.to_string()));
        }

        let local = instant.with_timezone(&ResolvedZone::new(&info));
        let mut out = String::new();
        write!(out, "{}", local.format_with_items(items.iter()))
            .map_err(|_| TimeError::InvalidPattern(pattern.to_string()))?;
        Ok(out)
    }

    /// Render one line per zone, in list order, joined by newlines.
    ///
    /// A line whose zone or pattern fails falls back to the raw format
    /// text. The city placeholder is replaced after formatting; with
    /// `lowercase_am_pm` every "AM"/"PM" becomes "am"/"pm".
    pub fn render(
        &self,
        spec: &TimeSpec,
        reference_zone: &str,
        zones: &[String],
        format: &DateTimeFormat,
        lowercase_am_pm: bool,
    ) -> String {
        if format.raw().is_empty() {
            return String::new();
        }

        let instant = self.instant(spec, reference_zone);
        let lines: Vec<String> = zones
            .iter()
            .map(|zone_id| {
                let line = match self.format_in_zone(instant, zone_id, format.canonical()) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Date/time line for {} left unformatted: {}", zone_id, e);
                        format.raw().to_string()
                    }
                };
                line.replace(ZONE_CITY_PLACEHOLDER, display_name(zone_id))
            })
            .collect();

        let text = lines.join("\n");
        if lowercase_am_pm {
            text.replace("PM", "pm").replace("AM", "am")
        } else {
            text
        }
    }

    /// Every table token with a sample rendering in `zone_id`, for help output
    pub fn token_samples(&self, spec: &TimeSpec, zone_id: &str) -> Vec<(&'static str, String, &'static str)> {
        let instant = self.instant(spec, zone_id);
        let mut samples: Vec<_> = FORMAT_TOKENS
            .iter()
            .map(|token| {
                let sample = self
                    .format_in_zone(instant, zone_id, token.canonical)
                    .unwrap_or_else(|_| token.canonical.to_string());
                (token.custom, sample, token.description)
            })
            .collect();
        samples.push((
            ZONE_CITY_PLACEHOLDER,
            display_name(zone_id).to_string(),
            "The time zone's city name",
        ));
        samples
    }
}
