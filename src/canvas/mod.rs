//! Canvas composition
//!
//! Handles:
//! - RGBA bitmaps and coverage colorization
//! - Image, text and date/time elements
//! - Ordered overlay composition over a background
//! - Background PNG export

#![allow(dead_code)]

pub mod bitmap;
pub mod element;
pub mod export;
pub mod stack;

use std::path::PathBuf;

// Re-exports (not every item is used by the binary itself)
#[allow(unused_imports)]
pub use bitmap::{colorize, decode_image, RgbaBitmap};
#[allow(unused_imports)]
pub use element::{DateTimeElement, Element, ImageElement, Overlay, Placement, TextElement, TextStyle};
#[allow(unused_imports)]
pub use export::{encode_png, ExportStatus, ExportTask};
#[allow(unused_imports)]
pub use stack::CanvasStack;

/// Image decode/encode failure
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to load image {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("failed to write image {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}
