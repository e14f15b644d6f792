//! Canvas elements
//!
//! Three kinds of overlay share one interface: a decoded image, styled
//! text, and multi-zone date/time text. Each owns the RGBA bitmap it
//! last rendered.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::bitmap::{colorize, decode_image, ImageSource, RgbaBitmap};
use super::ImageError;
use crate::constants::{
    DEFAULT_DATETIME_FORMAT, DEFAULT_LINE_HEIGHT, DEFAULT_TEXT_BACKGROUND, DEFAULT_TEXT_COLOR,
    MIN_LINE_HEIGHT,
};
use crate::datetime::{DateTimeFormat, TimeSource, TimeSpec};
use crate::font::{rasterize_text, FontAsset, Rect};
use crate::utils::ColorRGBA;

/// Where and how an element's bitmap lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub position: (i32, i32),
    pub display_size: (u32, u32),
    /// Per-pixel multiply applied when compositing
    pub color: ColorRGBA,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: (0, 0),
            display_size: (0, 0),
            color: ColorRGBA::WHITE,
        }
    }
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.position.0,
            y: self.position.1,
            width: self.display_size.0 as i32,
            height: self.display_size.1 as i32,
        }
    }
}

/// Borrowed view of one element as the canvas stack draws it
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub pixels: &'a RgbaBitmap,
    pub position: (i32, i32),
    pub display_size: (u32, u32),
    pub modulation: ColorRGBA,
}

/// A decoded image file
#[derive(Debug, Clone)]
pub struct ImageElement {
    source: ImageSource,
    pixels: RgbaBitmap,
    pub placement: Placement,
}

impl ImageElement {
    /// Decode `path` scaled by `scale`; display size starts at the native size
    pub fn open(path: &Path, scale: f32) -> Result<Self, ImageError> {
        let pixels = decode_image(path, scale)?;
        let placement = Placement {
            display_size: pixels.size(),
            ..Placement::default()
        };
        Ok(Self {
            source: ImageSource {
                path: path.to_path_buf(),
                scale,
            },
            pixels,
            placement,
        })
    }

    /// Wrap pixels that did not come from a file
    pub fn from_bitmap(pixels: RgbaBitmap) -> Self {
        let placement = Placement {
            display_size: pixels.size(),
            ..Placement::default()
        };
        Self {
            source: ImageSource {
                path: PathBuf::new(),
                scale: 1.0,
            },
            pixels,
            placement,
        }
    }

    pub fn path(&self) -> &Path {
        &self.source.path
    }

    pub fn pixels(&self) -> &RgbaBitmap {
        &self.pixels
    }

    /// Display size back to the decoded size
    pub fn reset_size(&mut self) {
        self.placement.display_size = self.pixels.size();
    }

    /// Decode the file again. Keeps the previous pixels on failure.
    pub fn render(&mut self) {
        if self.source.path.as_os_str().is_empty() {
            return;
        }
        match decode_image(&self.source.path, self.source.scale) {
            Ok(pixels) => self.pixels = pixels,
            Err(e) => warn!("Keeping previous pixels: {}", e),
        }
    }
}

/// Text styling shared by text and date/time elements
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font: Arc<FontAsset>,
    pub line_height: f32,
    pub color: ColorRGBA,
    pub background: ColorRGBA,
}

impl TextStyle {
    pub fn new(font: Arc<FontAsset>) -> Self {
        Self {
            font,
            line_height: DEFAULT_LINE_HEIGHT,
            color: DEFAULT_TEXT_COLOR,
            background: DEFAULT_TEXT_BACKGROUND,
        }
    }
}

/// Styled text; every setter re-renders
#[derive(Debug, Clone)]
pub struct TextElement {
    text: String,
    style: TextStyle,
    pixels: RgbaBitmap,
    pub placement: Placement,
}

impl TextElement {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        let mut element = Self {
            text: text.into(),
            style,
            pixels: RgbaBitmap::default(),
            placement: Placement::default(),
        };
        element.style.line_height = element.style.line_height.max(MIN_LINE_HEIGHT);
        element.render();
        element
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn pixels(&self) -> &RgbaBitmap {
        &self.pixels
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.render();
    }

    pub fn set_font(&mut self, font: Arc<FontAsset>) {
        self.style.font = font;
        self.render();
    }

    pub fn set_line_height(&mut self, line_height: f32) {
        self.style.line_height = line_height.max(MIN_LINE_HEIGHT);
        self.render();
    }

    pub fn set_color(&mut self, color: ColorRGBA) {
        self.style.color = color;
        self.render();
    }

    pub fn set_background(&mut self, background: ColorRGBA) {
        self.style.background = background;
        self.render();
    }

    /// Rasterize and colorize; the display size follows the new bitmap
    pub fn render(&mut self) {
        let coverage = rasterize_text(self.style.font.as_ref(), &self.text, self.style.line_height);
        self.pixels = colorize(&coverage, self.style.color, self.style.background);
        self.placement.display_size = self.pixels.size();
        debug!(
            "Text rendered: {:?} -> {}x{}",
            self.text,
            self.pixels.width(),
            self.pixels.height()
        );
    }
}

/// Date/time text observed in an ordered list of zones
#[derive(Clone)]
pub struct DateTimeElement {
    label: TextElement,
    format: DateTimeFormat,
    zones: Vec<String>,
    time: TimeSpec,
    reference_zone: String,
    lowercase_am_pm: bool,
    source: TimeSource,
}

impl DateTimeElement {
    /// Element showing the current time in `reference_zone`, listing that zone only
    pub fn new(style: TextStyle, reference_zone: impl Into<String>, source: TimeSource) -> Self {
        let reference_zone = reference_zone.into();
        let time = source.now(&reference_zone);
        let mut element = Self {
            label: TextElement::new("", style),
            format: DateTimeFormat::new(DEFAULT_DATETIME_FORMAT),
            zones: vec![reference_zone.clone()],
            time,
            reference_zone,
            lowercase_am_pm: true,
            source,
        };
        element.render();
        element
    }

    pub fn text(&self) -> &str {
        self.label.text()
    }

    pub fn label(&self) -> &TextElement {
        &self.label
    }

    pub fn format(&self) -> &DateTimeFormat {
        &self.format
    }

    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    pub fn time(&self) -> TimeSpec {
        self.time
    }

    pub fn reference_zone(&self) -> &str {
        &self.reference_zone
    }

    pub fn lowercase_am_pm(&self) -> bool {
        self.lowercase_am_pm
    }

    pub fn set_format(&mut self, format: &str) {
        self.format = DateTimeFormat::new(format);
        self.render();
    }

    pub fn set_time(&mut self, time: TimeSpec) {
        self.time = time;
        self.render();
    }

    /// Snap to the current time in the reference zone
    pub fn set_now(&mut self) {
        self.time = self.source.now(&self.reference_zone);
        self.render();
    }

    pub fn set_reference_zone(&mut self, zone: impl Into<String>) {
        self.reference_zone = zone.into();
        self.render();
    }

    pub fn set_lowercase_am_pm(&mut self, lowercase: bool) {
        self.lowercase_am_pm = lowercase;
        self.render();
    }

    /// Replace the whole zone list, dropping duplicates
    pub fn set_zones(&mut self, zones: &[String]) {
        self.zones.clear();
        for zone in zones {
            if !self.zones.contains(zone) {
                self.zones.push(zone.clone());
            }
        }
        self.render();
    }

    /// Append a zone. Returns false if already listed.
    pub fn add_zone(&mut self, zone: &str) -> bool {
        if self.zones.iter().any(|z| z == zone) {
            return false;
        }
        self.zones.push(zone.to_string());
        self.render();
        true
    }

    pub fn remove_zone(&mut self, index: usize) -> Option<String> {
        if index >= self.zones.len() {
            return None;
        }
        let zone = self.zones.remove(index);
        self.render();
        Some(zone)
    }

    /// Swap with the previous zone. Returns false at the top.
    pub fn move_zone_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.zones.len() {
            return false;
        }
        self.zones.swap(index, index - 1);
        self.render();
        true
    }

    /// Swap with the next zone. Returns false at the bottom.
    pub fn move_zone_down(&mut self, index: usize) -> bool {
        let Some(next) = index.checked_add(1).filter(|&n| n < self.zones.len()) else {
            return false;
        };
        self.zones.swap(index, next);
        self.render();
        true
    }

    pub fn set_font(&mut self, font: Arc<FontAsset>) {
        self.label.set_font(font);
    }

    pub fn set_line_height(&mut self, line_height: f32) {
        self.label.set_line_height(line_height);
    }

    pub fn set_color(&mut self, color: ColorRGBA) {
        self.label.set_color(color);
    }

    pub fn set_background(&mut self, background: ColorRGBA) {
        self.label.set_background(background);
    }

    pub fn render(&mut self) {
        let text = self.source.render(
            &self.time,
            &self.reference_zone,
            &self.zones,
            &self.format,
            self.lowercase_am_pm,
        );
        self.label.set_text(text);
    }
}

/// A canvas element
#[derive(Clone)]
pub enum Element {
    Image(ImageElement),
    Text(TextElement),
    DateTime(DateTimeElement),
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Image(_) => "image",
            Element::Text(_) => "text",
            Element::DateTime(_) => "datetime",
        }
    }

    /// Rebuild the pixel source from the element's state
    pub fn render(&mut self) {
        match self {
            Element::Image(e) => e.render(),
            Element::Text(e) => e.render(),
            Element::DateTime(e) => e.render(),
        }
    }

    pub fn pixels(&self) -> &RgbaBitmap {
        match self {
            Element::Image(e) => e.pixels(),
            Element::Text(e) => e.pixels(),
            Element::DateTime(e) => e.label.pixels(),
        }
    }

    pub fn placement(&self) -> &Placement {
        match self {
            Element::Image(e) => &e.placement,
            Element::Text(e) => &e.placement,
            Element::DateTime(e) => &e.label.placement,
        }
    }

    pub fn placement_mut(&mut self) -> &mut Placement {
        match self {
            Element::Image(e) => &mut e.placement,
            Element::Text(e) => &mut e.placement,
            Element::DateTime(e) => &mut e.label.placement,
        }
    }

    /// Canvas-space rectangle covered by the element
    pub fn bounding_box(&self) -> Rect {
        self.placement().rect()
    }

    pub fn overlay(&self) -> Overlay<'_> {
        let placement = self.placement();
        Overlay {
            pixels: self.pixels(),
            position: placement.position,
            display_size: placement.display_size,
            modulation: placement.color,
        }
    }

    /// Hit test in canvas coordinates
    pub fn contains(&self, point: (i32, i32)) -> bool {
        let r = self.bounding_box();
        point.0 >= r.x && point.0 < r.right() && point.1 >= r.y && point.1 < r.bottom()
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        let placement = self.placement_mut();
        placement.position.0 += dx;
        placement.position.1 += dy;
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.placement_mut().position = (x, y);
    }

    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.placement_mut().display_size = (width, height);
    }

    pub fn set_modulation(&mut self, color: ColorRGBA) {
        self.placement_mut().color = color;
    }
}

impl From<ImageElement> for Element {
    fn from(e: ImageElement) -> Self {
        Element::Image(e)
    }
}

impl From<TextElement> for Element {
    fn from(e: TextElement) -> Self {
        Element::Text(e)
    }
}

impl From<DateTimeElement> for Element {
    fn from(e: DateTimeElement) -> Self {
        Element::DateTime(e)
    }
}
