//! Font loading and text rasterization
//!
//! Handles:
//! - TTF/OTF font loading (fontdue)
//! - Font discovery (fontdb) and the path-keyed shared asset cache
//! - Line layout with kerning, merged into one coverage bitmap

#![allow(dead_code)]

pub mod asset;
pub mod layout;
pub mod registry;

// Re-exports (not every item is used by the binary itself)
#[allow(unused_imports)]
pub use asset::{font_name, FontAsset, FontLoadError, GlyphSource};
#[allow(unused_imports)]
pub use layout::{layout_text, rasterize_text, CoverageBitmap, Rect, TextBlock};
#[allow(unused_imports)]
pub use registry::{FontEntry, FontRegistry};

/// Font file committed for tests
#[cfg(test)]
pub fn test_font_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}
