//! Text layout and rasterization
//!
//! Places glyphs line by line (tabs skipped, `\n` starts a new line,
//! kerning between neighbours) and merges their coverage into a single
//! 8-bit bitmap.

use super::asset::GlyphSource;
use crate::utils::saturating_add;

/// Integer rectangle in layout space (y down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// One placed glyph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphLayout {
    pub ch: char,
    /// Coverage, `rect.width * rect.height` bytes, row-major
    pub coverage: Vec<u8>,
    pub rect: Rect,
}

/// Laid out text: placed glyphs plus their accumulated bounding box
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBlock {
    glyphs: Vec<GlyphLayout>,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl TextBlock {
    pub fn glyphs(&self) -> &[GlyphLayout] {
        &self.glyphs
    }

    /// Bounding box as (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).max(0) as u32
    }

    /// Merge every glyph into one bitmap sized to the bounding box.
    ///
    /// Overlapping coverage (e.g. from negative kerning) adds with saturation.
    pub fn merge(&self) -> CoverageBitmap {
        let width = self.width();
        let height = self.height();
        let mut bitmap = CoverageBitmap::new(width, height);
        let (w, h) = (width as i32, height as i32);

        for glyph in &self.glyphs {
            let rect = glyph.rect;
            for gy in 0..rect.height {
                let dy = rect.y - self.min_y + gy;
                if dy < 0 || dy >= h {
                    continue;
                }
                for gx in 0..rect.width {
                    let dx = rect.x - self.min_x + gx;
                    if dx < 0 || dx >= w {
                        continue;
                    }
                    let src = glyph.coverage[(gx + gy * rect.width) as usize];
                    let dst = &mut bitmap.data[(dx + dy * w) as usize];
                    *dst = saturating_add(*dst, src);
                }
            }
        }

        bitmap
    }
}

/// Merged 8-bit coverage; 0x0 is valid (empty text)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageBitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl CoverageBitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((x + y * self.width) as usize).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Running min/max along one axis
#[derive(Debug, Clone, Copy, Default)]
struct Extent(Option<(i32, i32)>);

impl Extent {
    fn include(&mut self, lo: i32, hi: i32) {
        self.0 = Some(match self.0 {
            Some((min, max)) => (min.min(lo), max.max(hi)),
            None => (lo, hi),
        });
    }

    /// Grow the far edge only; starts the extent at `lo` if empty
    fn reach(&mut self, lo: i32, hi: i32) {
        self.0 = Some(match self.0 {
            Some((min, max)) => (min, max.max(hi)),
            None => (lo, hi),
        });
    }

    fn range(&self) -> (i32, i32) {
        self.0.unwrap_or((0, 0))
    }
}

/// Line height in pixels for `font` at `scale`
pub fn scaled_line_height(font: &dyn GlyphSource, scale: f32) -> i32 {
    let v = font.v_metrics();
    let ascent = (v.ascent * scale).floor() as i32;
    let descent = (v.descent * scale).floor() as i32;
    let line_gap = (v.line_gap * scale).floor() as i32;
    ascent - descent + line_gap
}

/// Lay out `text` at `line_height` pixels.
///
/// Every line reaches at least one full line height down, even where
/// its ink is shorter; a line break with nothing before it still counts
/// as a line.
pub fn layout_text(font: &dyn GlyphSource, text: &str, line_height: f32) -> TextBlock {
    let scale = font.scale_for_pixel_height(line_height);
    let ascent = (font.v_metrics().ascent * scale).floor() as i32;
    let line_h = scaled_line_height(font, scale);

    let mut horizontal = Extent::default();
    let mut vertical = Extent::default();
    let mut glyphs = Vec::new();
    let (mut x, mut y) = (0i32, 0i32);

    let chars: Vec<char> = text.chars().collect();
    for (i, &ch) in chars.iter().enumerate() {
        match ch {
            '\t' => continue,
            '\n' => {
                vertical.reach(y, y + line_h);
                x = 0;
                y += line_h;
                continue;
            }
            _ => {}
        }

        let h = font.h_metrics(ch);
        let left_side_bearing = (h.left_side_bearing * scale).floor() as i32;
        let bbox = font.bitmap_box(ch, scale);

        let rect = Rect {
            x: x + left_side_bearing,
            y: y + bbox.y0 + ascent,
            width: bbox.width(),
            height: bbox.height(),
        };
        let mut coverage = font.rasterize(ch, scale);
        coverage.resize((rect.width * rect.height) as usize, 0);

        horizontal.include(rect.x, rect.right());
        vertical.include(rect.y, rect.bottom().max(y + line_h));

        glyphs.push(GlyphLayout { ch, coverage, rect });

        x += (h.advance_width * scale).floor() as i32;
        if let Some(&next) = chars.get(i + 1) {
            if next != '\n' {
                x += (font.kern_advance(ch, next) * scale).floor() as i32;
            }
        }
    }

    let (min_x, max_x) = horizontal.range();
    let (min_y, max_y) = vertical.range();
    TextBlock {
        glyphs,
        min_x,
        min_y,
        max_x,
        max_y,
    }
}

/// Lay out and merge in one step
pub fn rasterize_text(font: &dyn GlyphSource, text: &str, line_height: f32) -> CoverageBitmap {
    layout_text(font, text, line_height).merge()
}
