//! Editing session
//!
//! Owns the current canvas, its selection and the outstanding export.
//! A session starts empty; selecting a canvas tears down whatever was
//! on the previous one.

#![allow(dead_code)]

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::canvas::{
    decode_image, export, CanvasStack, DateTimeElement, Element, ExportStatus, ExportTask,
    ImageElement, ImageError, RgbaBitmap, TextElement, TextStyle,
};
use crate::config::{Config, LayerConfig, LayerKind};
use crate::datetime::{TimeSource, TimeSpec};
use crate::font::FontRegistry;

pub struct Session {
    config: Config,
    fonts: FontRegistry,
    time_source: TimeSource,
    canvas: Option<CanvasStack>,
    selection: Option<usize>,
    export: Option<ExportTask>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self::with_time_source(config, TimeSource::default())
    }

    pub fn with_time_source(config: Config, time_source: TimeSource) -> Self {
        let mut fonts = FontRegistry::new(config.font_directories(), config.fonts.system);
        fonts.setup_default(&config.fonts.default);
        Self {
            config,
            fonts,
            time_source,
            canvas: None,
            selection: None,
            export: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn time_source(&self) -> &TimeSource {
        &self.time_source
    }

    // ========================================================================
    // Canvas lifecycle
    // ========================================================================

    /// Start a new canvas; previous elements and selection are dropped
    pub fn select_canvas(&mut self, background: RgbaBitmap) {
        info!("Canvas selected: {}x{}", background.width(), background.height());
        self.canvas = Some(CanvasStack::new(background));
        self.selection = None;
        self.fonts.prune();
    }

    /// Canvas from an image file
    pub fn open_canvas(&mut self, path: &Path, scale: f32) -> Result<(), ImageError> {
        let background = decode_image(path, scale)?;
        self.select_canvas(background);
        Ok(())
    }

    /// Canvas as configured: the background image if set and loadable,
    /// a solid canvas otherwise
    pub fn open_configured_canvas(&mut self) {
        let canvas = self.config.canvas.clone();
        if !canvas.background.is_empty() {
            let path = PathBuf::from(crate::config::expand_path(&canvas.background, None));
            match self.open_canvas(&path, canvas.scale) {
                Ok(()) => return,
                Err(e) => warn!("{} (using a solid canvas)", e),
            }
        }
        self.select_canvas(RgbaBitmap::filled(
            canvas.width.max(1),
            canvas.height.max(1),
            canvas.color,
        ));
    }

    pub fn close_canvas(&mut self) {
        self.canvas = None;
        self.selection = None;
    }

    pub fn canvas(&self) -> Option<&CanvasStack> {
        self.canvas.as_ref()
    }

    // ========================================================================
    // Element construction
    // ========================================================================

    /// Configured text style using `font` (default font if None or unknown)
    pub fn text_style(&mut self, font: Option<&Path>) -> TextStyle {
        let mut style = TextStyle::new(self.fonts.get(font));
        style.line_height = self.config.text.line_height;
        style.color = self.config.text.color;
        style.background = self.config.text.background;
        style
    }

    pub fn new_text(&mut self, text: &str) -> TextElement {
        let style = self.text_style(None);
        TextElement::new(text, style)
    }

    /// Date/time element with the configured format, zones and casing
    pub fn new_datetime(&mut self) -> DateTimeElement {
        let style = self.text_style(None);
        let mut element =
            DateTimeElement::new(style, self.config.reference_zone(), self.time_source.clone());
        element.set_format(&self.config.datetime.format);
        element.set_lowercase_am_pm(self.config.datetime.lowercase_am_pm);
        if !self.config.datetime.zones.is_empty() {
            element.set_zones(&self.config.datetime.zones);
        }
        element
    }

    pub fn new_image(&self, path: &Path, scale: f32) -> Result<ImageElement, ImageError> {
        ImageElement::open(path, scale)
    }

    /// Build an element from a config layer
    pub fn element_from_layer(&mut self, layer: &LayerConfig) -> Result<Element> {
        let mut element = match layer.kind {
            LayerKind::Image => {
                let path = PathBuf::from(crate::config::expand_path(&layer.path, None));
                Element::from(self.new_image(&path, layer.scale)?)
            }
            LayerKind::Text => Element::from(TextElement::new(&layer.text, self.layer_style(layer))),
            LayerKind::DateTime => Element::from(self.datetime_from_layer(layer)?),
        };

        element.set_position(layer.x, layer.y);
        element.set_modulation(layer.color);
        let (native_w, native_h) = element.pixels().size();
        if layer.width.is_some() || layer.height.is_some() {
            element.set_display_size(layer.width.unwrap_or(native_w), layer.height.unwrap_or(native_h));
        }
        Ok(element)
    }

    fn layer_style(&mut self, layer: &LayerConfig) -> TextStyle {
        let font = (!layer.font.is_empty()).then(|| self.resolve_font(&layer.font));
        let mut style = self.text_style(font.as_deref());
        if let Some(line_height) = layer.line_height {
            style.line_height = line_height;
        }
        if let Some(color) = layer.text_color {
            style.color = color;
        }
        if let Some(background) = layer.background {
            style.background = background;
        }
        style
    }

    /// Font path for a layer's `font` field: a path, or a discovered font name
    fn resolve_font(&self, font: &str) -> PathBuf {
        let as_path = PathBuf::from(crate::config::expand_path(font, None));
        if as_path.is_file() {
            return as_path;
        }
        match self
            .fonts
            .available_fonts()
            .into_iter()
            .find(|f| f.name.eq_ignore_ascii_case(font))
        {
            Some(entry) => entry.path,
            None => {
                warn!("Font '{}' not found, using the default font", font);
                PathBuf::new()
            }
        }
    }

    fn datetime_from_layer(&mut self, layer: &LayerConfig) -> Result<DateTimeElement> {
        let mut element = self.new_datetime();
        let style = self.layer_style(layer);
        element.set_font(style.font);
        element.set_line_height(style.line_height);
        element.set_color(style.color);
        element.set_background(style.background);

        if let Some(zone) = &layer.reference_zone {
            element.set_reference_zone(zone.as_str());
        }
        if let Some(format) = &layer.format {
            element.set_format(format);
        }
        if let Some(lowercase) = layer.lowercase_am_pm {
            element.set_lowercase_am_pm(lowercase);
        }
        if !layer.zones.is_empty() {
            element.set_zones(&layer.zones);
        }

        let date = layer.parsed_date()?;
        let time = layer.parsed_time()?;
        if date.is_some() || time.is_some() {
            let now = self.time_source.now(element.reference_zone()).naive();
            let naive = NaiveDateTime::new(date.unwrap_or(now.date()), time.unwrap_or(now.time()));
            element.set_time(TimeSpec::from_naive(naive));
        }
        Ok(element)
    }

    /// Add every configured layer, skipping (and logging) broken ones.
    /// Returns the number added.
    pub fn add_configured_layers(&mut self) -> usize {
        let layers = self.config.layers.clone();
        let mut added = 0;
        for (i, layer) in layers.iter().enumerate() {
            let element = self
                .element_from_layer(layer)
                .with_context(|| format!("Layer {} ({:?})", i + 1, layer.kind));
            match element {
                Ok(element) => {
                    if self.add_element(element).is_some() {
                        added += 1;
                    }
                }
                Err(e) => warn!("Skipping {:#}", e),
            }
        }
        added
    }

    // ========================================================================
    // Element list
    // ========================================================================

    /// Add on top of the canvas and select it. None without a canvas.
    pub fn add_element(&mut self, element: Element) -> Option<usize> {
        let Some(canvas) = self.canvas.as_mut() else {
            warn!("No canvas selected, {} element dropped", element.kind());
            return None;
        };
        let kind = element.kind();
        let index = canvas.push(element);
        debug!("Added {} element at {}", kind, index);
        self.selection = Some(index);
        Some(index)
    }

    pub fn remove_element(&mut self, index: usize) -> Option<Element> {
        let removed = self.canvas.as_mut()?.remove(index)?;
        self.selection = match self.selection {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Some(removed)
    }

    /// Swap with the previous element (drawn earlier)
    pub fn move_up(&mut self, index: usize) -> bool {
        index > 0 && self.swap(index, index - 1)
    }

    /// Swap with the next element (drawn later)
    pub fn move_down(&mut self, index: usize) -> bool {
        index
            .checked_add(1)
            .is_some_and(|next| self.swap(index, next))
    }

    fn swap(&mut self, a: usize, b: usize) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        if !canvas.swap(a, b) {
            return false;
        }
        // Selection follows the element
        self.selection = match self.selection {
            Some(s) if s == a => Some(b),
            Some(s) if s == b => Some(a),
            other => other,
        };
        true
    }

    // ========================================================================
    // Selection and interaction
    // ========================================================================

    pub fn select(&mut self, index: usize) -> bool {
        let valid = self.canvas.as_ref().is_some_and(|c| index < c.len());
        if valid {
            self.selection = Some(index);
        }
        valid
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected_mut(&mut self) -> Option<&mut Element> {
        let index = self.selection?;
        self.canvas.as_mut()?.get_mut(index)
    }

    /// Select the topmost element under `point`; clears the selection on a miss
    pub fn pick(&mut self, point: (i32, i32)) -> Option<usize> {
        self.selection = self.canvas.as_ref().and_then(|c| c.pick(point));
        self.selection
    }

    pub fn drag_selected(&mut self, dx: i32, dy: i32) -> bool {
        match self.selected_mut() {
            Some(element) => {
                element.move_by(dx, dy);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Render and export
    // ========================================================================

    /// Composed canvas at native resolution
    pub fn render(&self) -> Option<RgbaBitmap> {
        self.canvas.as_ref().map(CanvasStack::render)
    }

    /// Dispatch an export of the composed canvas.
    ///
    /// Refused while another export is pending or without a canvas.
    pub fn export(&mut self, path: PathBuf) -> bool {
        if self.export.is_some() {
            warn!("Export already in progress, ignoring request for {}", path.display());
            return false;
        }
        let Some(composed) = self.render() else {
            warn!("No canvas to export");
            return false;
        };
        match ExportTask::spawn(path, &composed) {
            Ok(task) => {
                info!("Exporting to {}", task.path().display());
                self.export = Some(task);
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Export into the configured directory under a timestamped name
    pub fn export_default(&mut self) -> Option<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .config
            .export_directory()
            .join(format!("{}_{}.png", self.config.export.file_prefix, timestamp));
        self.export(path.clone()).then_some(path)
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    /// Called once per frame. Returns the export result once, when it finishes.
    pub fn poll_export(&mut self) -> Option<Result<PathBuf, ImageError>> {
        let status = self.export.as_ref()?.poll();
        match status {
            ExportStatus::Pending => None,
            ExportStatus::Done(result) => {
                self.export = None;
                export::report(&result);
                Some(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ColorRGBA;
    use std::time::Duration;

    fn session() -> Session {
        let mut config = Config::default();
        config.fonts.system = false;
        config.datetime.reference_zone = "UTC".into();
        Session::new(config)
    }

    fn block(w: u32, h: u32, color: ColorRGBA, at: (i32, i32)) -> Element {
        let mut e = Element::from(ImageElement::from_bitmap(RgbaBitmap::filled(w, h, color)));
        e.set_position(at.0, at.1);
        e
    }

    #[test]
    fn test_no_canvas() {
        let mut s = session();
        assert!(s.add_element(block(1, 1, ColorRGBA::WHITE, (0, 0))).is_none());
        assert!(s.render().is_none());
        assert!(!s.export(std::env::temp_dir().join("never.png")));
    }

    #[test]
    fn test_select_canvas_tears_down() {
        let mut s = session();
        s.select_canvas(RgbaBitmap::new(10, 10));
        s.add_element(block(2, 2, ColorRGBA::WHITE, (0, 0)));
        assert_eq!(s.selection(), Some(0));

        s.select_canvas(RgbaBitmap::new(5, 5));
        assert_eq!(s.selection(), None);
        assert!(s.canvas().unwrap().is_empty());
    }

    #[test]
    fn test_reorder_keeps_selection() {
        let mut s = session();
        s.select_canvas(RgbaBitmap::new(10, 10));
        s.add_element(block(1, 1, ColorRGBA::BLACK, (0, 0)));
        s.add_element(block(1, 1, ColorRGBA::WHITE, (0, 0)));
        assert_eq!(s.selection(), Some(1));

        assert!(s.move_up(1));
        assert_eq!(s.selection(), Some(0));
        assert_eq!(s.render().unwrap().get(0, 0), Some(ColorRGBA::BLACK));

        assert!(!s.move_up(0));
        assert!(!s.move_down(1));
        assert!(s.move_down(0));
        assert_eq!(s.selection(), Some(1));
    }

    #[test]
    fn test_reorder_out_of_range() {
        let mut s = session();
        s.select_canvas(RgbaBitmap::new(10, 10));
        s.add_element(block(1, 1, ColorRGBA::BLACK, (0, 0)));
        assert!(!s.move_down(usize::MAX));
        assert!(!s.move_up(usize::MAX));
        assert_eq!(s.selection(), Some(0));
    }

    #[test]
    fn test_remove_adjusts_selection() {
        let mut s = session();
        s.select_canvas(RgbaBitmap::new(10, 10));
        for _ in 0..3 {
            s.add_element(block(1, 1, ColorRGBA::WHITE, (0, 0)));
        }
        s.select(2);
        assert!(s.remove_element(0).is_some());
        assert_eq!(s.selection(), Some(1));
        assert!(s.remove_element(1).is_some());
        assert_eq!(s.selection(), None);
        assert!(s.remove_element(7).is_none());
        assert!(!s.select(1));
    }

    #[test]
    fn test_pick_and_drag() {
        let mut s = session();
        s.select_canvas(RgbaBitmap::filled(10, 10, ColorRGBA::BLACK));
        s.add_element(block(4, 4, ColorRGBA::WHITE, (0, 0)));
        s.add_element(block(4, 4, ColorRGBA::WHITE, (2, 2)));

        assert_eq!(s.pick((3, 3)), Some(1));
        assert!(s.drag_selected(5, 5));
        let moved = s.canvas().unwrap().elements()[1].bounding_box();
        assert_eq!((moved.x, moved.y), (7, 7));

        assert_eq!(s.pick((9, 0)), None);
        assert!(!s.drag_selected(1, 1));
    }

    #[test]
    fn test_text_without_fonts_is_blank() {
        let mut s = session();
        s.select_canvas(RgbaBitmap::filled(4, 4, ColorRGBA::BLACK));
        let text = s.new_text("Hello");
        assert!(text.pixels().is_empty());
        s.add_element(text.into());
        assert_eq!(s.render().unwrap(), RgbaBitmap::filled(4, 4, ColorRGBA::BLACK));
    }

    #[test]
    fn test_datetime_layer() {
        let mut s = session();
        let layer = LayerConfig {
            kind: LayerKind::DateTime,
            format: Some("YYYY-MM-DD HH:mm TMZCITY".into()),
            zones: vec!["UTC".into(), "Asia/Tokyo".into()],
            date: "2024-03-01".into(),
            time: "20:15".into(),
            x: 3,
            ..LayerConfig::default()
        };
        let Element::DateTime(clock) = s.element_from_layer(&layer).unwrap() else {
            panic!("expected a date/time element");
        };
        assert_eq!(clock.text(), "2024-03-01 20:15 UTC\n2024-03-02 05:15 Tokyo");
        assert_eq!(clock.label().placement.position, (3, 0));
    }

    #[test]
    fn test_broken_layers_skipped() {
        let mut config = Config::default();
        config.fonts.system = false;
        config.layers = vec![
            LayerConfig {
                kind: LayerKind::Image,
                path: "/nonexistent/logo.png".into(),
                ..LayerConfig::default()
            },
            LayerConfig {
                kind: LayerKind::DateTime,
                time: "99:99".into(),
                ..LayerConfig::default()
            },
            LayerConfig::default(),
        ];
        let mut s = Session::new(config);
        s.select_canvas(RgbaBitmap::new(8, 8));
        assert_eq!(s.add_configured_layers(), 1);
    }

    #[test]
    fn test_export_once() {
        let mut s = session();
        s.select_canvas(RgbaBitmap::filled(2, 2, ColorRGBA::WHITE));
        let path = std::env::temp_dir().join(format!("tzbanner_session_{}.png", std::process::id()));

        assert!(s.export(path.clone()));
        assert!(s.is_exporting());
        assert!(!s.export(path.clone()));

        let mut result = None;
        for _ in 0..500 {
            if let Some(r) = s.poll_export() {
                result = Some(r);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(result.unwrap().unwrap(), path);
        assert!(s.poll_export().is_none());
        assert!(!s.is_exporting());
        let _ = std::fs::remove_file(path);
    }
}
