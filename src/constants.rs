//! Global constants for tzbanner
//!
//! Consolidates default values and reserved tokens
//! to eliminate magic numbers throughout the codebase.

#![allow(dead_code)]

use crate::utils::ColorRGBA;

// ============================================================================
// Text Constants
// ============================================================================

/// Default line height for new text elements (pixels)
pub const DEFAULT_LINE_HEIGHT: f32 = 60.0;

/// Smallest line height a text element accepts (pixels)
pub const MIN_LINE_HEIGHT: f32 = 1.0;

/// Default text for a new plain text element
pub const DEFAULT_TEXT: &str = "Text";

/// Default text color (opaque white)
pub const DEFAULT_TEXT_COLOR: ColorRGBA = ColorRGBA::WHITE;

/// Default text background (fully transparent)
pub const DEFAULT_TEXT_BACKGROUND: ColorRGBA = ColorRGBA::TRANSPARENT;

// ============================================================================
// Date/Time Constants
// ============================================================================

/// Marker replaced by the zone's display name after formatting
pub const ZONE_CITY_PLACEHOLDER: &str = "TMZCITY";

/// Default format for new date/time elements
pub const DEFAULT_DATETIME_FORMAT: &str = "hh:mmap TMZCITY";

/// Zone used when no reference zone is configured or detectable
pub const FALLBACK_ZONE: &str = "UTC";

// ============================================================================
// Export Constants
// ============================================================================

/// Default export file name prefix
pub const EXPORT_FILE_PREFIX: &str = "banner";

/// Poll interval of the headless frame loop
pub const FRAME_INTERVAL: std::time::Duration = std::time::Duration::from_millis(16);
