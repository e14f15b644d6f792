//! Utility functions shared across tzbanner
//!
//! Common helpers that don't fit in specialized modules.

#![allow(dead_code)]

pub mod color;

// Re-exports (not every item is used by the binary itself)
#[allow(unused_imports)]
pub use color::{composite_over, parse_hex_rgba, saturating_add, scale, unscale, ColorRGBA};
