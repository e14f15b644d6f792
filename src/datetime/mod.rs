//! Date/time text generation
//!
//! Handles:
//! - Custom format token translation (YYYY, hh, ap, ...)
//! - Timezone resolution (IANA database via chrono-tz)
//! - Multi-zone formatting with city placeholder and am/pm casing

#![allow(dead_code)]

pub mod format;
pub mod source;
pub mod zone;

// Re-exports (not every item is used by the binary itself)
#[allow(unused_imports)]
pub use format::{translate, FormatToken, FORMAT_TOKENS};
#[allow(unused_imports)]
pub use source::{days_in_month, DateTimeFormat, TimeSource, TimeSpec};
#[allow(unused_imports)]
pub use zone::{display_name, host_zone_or_fallback, TzDatabase, ZoneDatabase, ZoneInfo};

/// Recoverable date/time formatting failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("unknown timezone '{0}'")]
    UnknownZone(String),
    #[error("invalid date/time pattern '{0}'")]
    InvalidPattern(String),
}
