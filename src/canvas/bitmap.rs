//! RGBA bitmaps
//!
//! Pixel storage shared by every canvas layer, coverage colorization,
//! and image file decoding.

use image::imageops::FilterType;
use image::RgbaImage;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::ImageError;
use crate::font::CoverageBitmap;
use crate::utils::{composite_over, scale, ColorRGBA};

/// Row-major RGBA pixels; 0x0 is a valid empty bitmap
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RgbaBitmap {
    width: u32,
    height: u32,
    pixels: Vec<ColorRGBA>,
}

impl RgbaBitmap {
    /// Transparent bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, ColorRGBA::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: ColorRGBA) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wrap packed RGBA bytes. None if the length does not match.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return None;
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| ColorRGBA::new(p[0], p[1], p[2], p[3]))
            .collect();
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Packed RGBA bytes, as handed to the PNG encoder
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_bytes()).collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[ColorRGBA] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<ColorRGBA> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Write one pixel; out-of-bounds writes are ignored
    pub fn put(&mut self, x: u32, y: u32, color: ColorRGBA) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = color;
        }
    }

    /// Composite `color` over the pixel at (x, y)
    pub fn blend(&mut self, x: u32, y: u32, color: ColorRGBA) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = composite_over(color, self.pixels[idx]);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }
}

/// Colorize a coverage bitmap.
///
/// Each pixel is `fg` with its alpha scaled by coverage, composited
/// over `bg`. Output has the coverage bitmap's dimensions.
pub fn colorize(coverage: &CoverageBitmap, fg: ColorRGBA, bg: ColorRGBA) -> RgbaBitmap {
    let pixels = coverage
        .data
        .iter()
        .map(|&c| composite_over(fg.with_alpha(scale(fg.a, c)), bg))
        .collect();
    RgbaBitmap {
        width: coverage.width,
        height: coverage.height,
        pixels,
    }
}

/// Decode an image file to RGBA, optionally scaled.
///
/// Scaled dimensions never drop below one pixel.
pub fn decode_image(path: &Path, factor: f32) -> Result<RgbaBitmap, ImageError> {
    let load_err = |reason: String| ImageError::Load {
        path: path.to_path_buf(),
        reason,
    };

    let img = image::io::Reader::open(path)
        .map_err(|e| load_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| load_err(format!("format error: {}", e)))?
        .decode()
        .map_err(|e| load_err(format!("decode error: {}", e)))?;

    let mut rgba = img.to_rgba8();
    debug!("Image decoded: {} ({}x{})", path.display(), rgba.width(), rgba.height());

    let factor = if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        warn!("Ignoring invalid image scale {} for {}", factor, path.display());
        1.0
    };
    if factor != 1.0 {
        let w = ((rgba.width() as f32 * factor) as u32).max(1);
        let h = ((rgba.height() as f32 * factor) as u32).max(1);
        rgba = image::imageops::resize(&rgba, w, h, FilterType::Triangle);
    }

    Ok(from_image(rgba))
}

fn from_image(img: RgbaImage) -> RgbaBitmap {
    let (width, height) = img.dimensions();
    let pixels = img.pixels().map(|p| ColorRGBA::from_bytes(p.0)).collect();
    RgbaBitmap {
        width,
        height,
        pixels,
    }
}

/// Path of a decoded image, kept alongside the pixels for re-loading
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub path: PathBuf,
    pub scale: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_matches_composite() {
        let coverage = CoverageBitmap {
            width: 3,
            height: 2,
            data: vec![255; 6],
        };
        let fg = ColorRGBA::new(255, 0, 0, 128);
        let bg = ColorRGBA::new(0, 0, 255, 255);
        let out = colorize(&coverage, fg, bg);

        let expected = composite_over(fg, bg);
        assert_eq!(out.size(), (3, 2));
        assert!(out.pixels().iter().all(|&p| p == expected));
        assert_eq!(expected, ColorRGBA::new(128, 0, 127, 255));
    }

    #[test]
    fn test_colorize_zero_coverage_is_background() {
        let coverage = CoverageBitmap {
            width: 2,
            height: 1,
            data: vec![0, 255],
        };
        let bg = ColorRGBA::new(10, 20, 30, 40);
        let out = colorize(&coverage, ColorRGBA::WHITE, bg);
        assert_eq!(out.get(0, 0), Some(bg));
        assert_eq!(out.get(1, 0), Some(ColorRGBA::WHITE));
    }

    #[test]
    fn test_colorize_empty() {
        let out = colorize(&CoverageBitmap::default(), ColorRGBA::WHITE, ColorRGBA::BLACK);
        assert!(out.is_empty());
        assert!(out.to_rgba_bytes().is_empty());
    }

    #[test]
    fn test_byte_conversion() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        let bitmap = RgbaBitmap::from_rgba_bytes(2, 1, &bytes).unwrap();
        assert_eq!(bitmap.get(1, 0), Some(ColorRGBA::new(5, 6, 7, 8)));
        assert_eq!(bitmap.to_rgba_bytes(), bytes);
        assert!(RgbaBitmap::from_rgba_bytes(2, 2, &bytes).is_none());
    }

    #[test]
    fn test_put_and_blend_clip() {
        let mut bitmap = RgbaBitmap::filled(2, 2, ColorRGBA::WHITE);
        bitmap.put(5, 5, ColorRGBA::BLACK);
        bitmap.blend(0, 9, ColorRGBA::BLACK);
        assert!(bitmap.pixels().iter().all(|&p| p == ColorRGBA::WHITE));

        bitmap.blend(1, 1, ColorRGBA::BLACK);
        assert_eq!(bitmap.get(1, 1), Some(ColorRGBA::BLACK));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_image(Path::new("/nonexistent/image.png"), 1.0).unwrap_err();
        assert!(matches!(err, ImageError::Load { .. }));
    }

    #[test]
    fn test_decode_garbage() {
        let path = std::env::temp_dir().join(format!("tzbanner_garbage_{}.png", std::process::id()));
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = decode_image(&path, 1.0).unwrap_err();
        assert!(matches!(err, ImageError::Load { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_decode_and_scale() {
        let path = std::env::temp_dir().join(format!("tzbanner_decode_{}.png", std::process::id()));
        let img = RgbaImage::from_pixel(4, 2, image::Rgba([9, 8, 7, 255]));
        img.save(&path).unwrap();

        let full = decode_image(&path, 1.0).unwrap();
        assert_eq!(full.size(), (4, 2));
        assert_eq!(full.get(3, 1), Some(ColorRGBA::new(9, 8, 7, 255)));

        let half = decode_image(&path, 0.5).unwrap();
        assert_eq!(half.size(), (2, 1));

        // Never below one pixel
        let tiny = decode_image(&path, 0.01).unwrap();
        assert_eq!(tiny.size(), (1, 1));

        let invalid = decode_image(&path, -2.0).unwrap();
        assert_eq!(invalid.size(), (4, 2));
        let _ = std::fs::remove_file(path);
    }
}
