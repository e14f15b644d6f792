//! Font assets
//!
//! Loads font programs with fontdue and exposes the per-glyph
//! metrics the text layout needs, in font design units.

use fontdue::{Font, FontSettings};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Font loading failure
#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Vertical line metrics (design units, descent negative)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

/// Horizontal glyph metrics (design units)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HMetrics {
    pub advance_width: f32,
    pub left_side_bearing: f32,
}

/// Glyph pixel box relative to the baseline origin, y increasing downward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitmapBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BitmapBox {
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }
}

/// Metrics and coverage source for text layout
pub trait GlyphSource {
    fn v_metrics(&self) -> VMetrics;

    fn h_metrics(&self, ch: char) -> HMetrics;

    /// Pixel box of `ch` at `scale` (pixels per design unit)
    fn bitmap_box(&self, ch: char, scale: f32) -> BitmapBox;

    /// Coverage of `ch` at `scale`, row-major, sized to [`bitmap_box`](Self::bitmap_box)
    fn rasterize(&self, ch: char, scale: f32) -> Vec<u8>;

    /// Kerning adjustment between two characters (design units)
    fn kern_advance(&self, left: char, right: char) -> f32;

    /// Scale mapping ascent-to-descent onto `height` pixels
    fn scale_for_pixel_height(&self, height: f32) -> f32 {
        let v = self.v_metrics();
        let span = v.ascent - v.descent;
        if span <= 0.0 {
            0.0
        } else {
            height / span
        }
    }
}

/// An immutable font program, shared by every element that uses it.
///
/// A font that failed to load is still constructible; it reports zero
/// metrics and renders nothing.
pub struct FontAsset {
    path: PathBuf,
    font: Option<Font>,
}

impl std::fmt::Debug for FontAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontAsset")
            .field("path", &self.path)
            .field("usable", &self.font.is_some())
            .finish()
    }
}

impl FontAsset {
    /// Read and parse a font file
    pub fn load(path: &Path) -> Result<Self, FontLoadError> {
        let data = std::fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, &data)
    }

    /// Parse font program bytes; `path` is kept for identification
    pub fn from_bytes(path: &Path, data: &[u8]) -> Result<Self, FontLoadError> {
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|e| {
            FontLoadError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        info!("Font loaded: {} ({} glyphs)", path.display(), font.glyph_count());
        Ok(Self {
            path: path.to_path_buf(),
            font: Some(font),
        })
    }

    /// Asset with no glyphs
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            font: None,
        }
    }

    /// Load `path`, degrading to an empty asset on failure
    pub fn open(path: &Path) -> Self {
        match Self::load(path) {
            Ok(asset) => asset,
            Err(e) => {
                warn!("{} (text using it will be blank)", e);
                Self::empty(path)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Font name shown to users (file stem)
    pub fn name(&self) -> String {
        font_name(&self.path)
    }

    pub fn is_usable(&self) -> bool {
        self.font.is_some()
    }

    /// Size in pixels per em for a design-unit scale
    fn px(font: &Font, scale: f32) -> f32 {
        scale * font.units_per_em()
    }
}

/// File stem of a font path
pub fn font_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl GlyphSource for FontAsset {
    fn v_metrics(&self) -> VMetrics {
        let Some(font) = &self.font else {
            return VMetrics::default();
        };
        // Metrics at one pixel per design unit are the raw design values
        font.horizontal_line_metrics(font.units_per_em())
            .map(|m| VMetrics {
                ascent: m.ascent,
                descent: m.descent,
                line_gap: m.line_gap,
            })
            .unwrap_or_default()
    }

    fn h_metrics(&self, ch: char) -> HMetrics {
        let Some(font) = &self.font else {
            return HMetrics::default();
        };
        let m = font.metrics(ch, font.units_per_em());
        HMetrics {
            advance_width: m.advance_width,
            left_side_bearing: m.bounds.xmin,
        }
    }

    fn bitmap_box(&self, ch: char, scale: f32) -> BitmapBox {
        let Some(font) = &self.font else {
            return BitmapBox::default();
        };
        if scale <= 0.0 {
            return BitmapBox::default();
        }
        let m = font.metrics(ch, Self::px(font, scale));
        // fontdue's ymin is the bottom edge with y up
        let top = -(m.ymin + m.height as i32);
        BitmapBox {
            x0: m.xmin,
            y0: top,
            x1: m.xmin + m.width as i32,
            y1: top + m.height as i32,
        }
    }

    fn rasterize(&self, ch: char, scale: f32) -> Vec<u8> {
        match &self.font {
            Some(font) if scale > 0.0 => font.rasterize(ch, Self::px(font, scale)).1,
            _ => Vec::new(),
        }
    }

    fn kern_advance(&self, left: char, right: char) -> f32 {
        let Some(font) = &self.font else {
            return 0.0;
        };
        font.horizontal_kern(left, right, font.units_per_em())
            .unwrap_or(0.0)
    }
}
