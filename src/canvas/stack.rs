//! Canvas stack
//!
//! A background surface plus ordered overlay elements. Later elements
//! draw on top of earlier ones.

use super::bitmap::RgbaBitmap;
use super::element::{Element, Overlay};

pub struct CanvasStack {
    background: RgbaBitmap,
    elements: Vec<Element>,
}

impl CanvasStack {
    pub fn new(background: RgbaBitmap) -> Self {
        Self {
            background,
            elements: Vec::new(),
        }
    }

    pub fn background(&self) -> &RgbaBitmap {
        &self.background
    }

    /// Native canvas size (the background's)
    pub fn size(&self) -> (u32, u32) {
        self.background.size()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Add on top; returns the new element's index
    pub fn push(&mut self, element: Element) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Element> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    /// Swap two elements. False if either index is out of range.
    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if a >= self.elements.len() || b >= self.elements.len() {
            return false;
        }
        self.elements.swap(a, b);
        true
    }

    /// Topmost element containing `point`
    pub fn pick(&self, point: (i32, i32)) -> Option<usize> {
        self.elements.iter().rposition(|e| e.contains(point))
    }

    /// Compose everything at native resolution
    pub fn render(&self) -> RgbaBitmap {
        let mut canvas = self.background.clone();
        for element in &self.elements {
            draw_overlay(&mut canvas, &element.overlay());
        }
        canvas
    }
}

/// Scale `overlay` to its display size (nearest neighbour), modulate,
/// and composite it onto `canvas`. Parts outside the canvas are clipped.
pub fn draw_overlay(canvas: &mut RgbaBitmap, overlay: &Overlay<'_>) {
    let src = overlay.pixels;
    let (dw, dh) = overlay.display_size;
    if src.is_empty() || dw == 0 || dh == 0 {
        return;
    }
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (ox, oy) = (overlay.position.0 as i64, overlay.position.1 as i64);

    // Visible part of the display rect, in display coordinates
    let x_start = (-ox).max(0);
    let y_start = (-oy).max(0);
    let x_end = (dw as i64).min(cw - ox);
    let y_end = (dh as i64).min(ch - oy);

    for dy in y_start..y_end {
        let sy = (dy * src.height() as i64 / dh as i64) as u32;
        for dx in x_start..x_end {
            let sx = (dx * src.width() as i64 / dw as i64) as u32;
            let Some(pixel) = src.get(sx, sy) else {
                continue;
            };
            canvas.blend(
                (ox + dx) as u32,
                (oy + dy) as u32,
                pixel.modulate(overlay.modulation),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::element::ImageElement;
    use crate::utils::{composite_over, ColorRGBA};

    const RED: ColorRGBA = ColorRGBA::new(255, 0, 0, 255);
    const GREEN: ColorRGBA = ColorRGBA::new(0, 255, 0, 255);
    const BLUE: ColorRGBA = ColorRGBA::new(0, 0, 255, 255);

    fn solid(w: u32, h: u32, color: ColorRGBA, at: (i32, i32)) -> Element {
        let mut e = Element::from(ImageElement::from_bitmap(RgbaBitmap::filled(w, h, color)));
        e.set_position(at.0, at.1);
        e
    }

    #[test]
    fn test_background_only() {
        let stack = CanvasStack::new(RgbaBitmap::filled(4, 4, BLUE));
        assert_eq!(stack.render(), RgbaBitmap::filled(4, 4, BLUE));
    }

    #[test]
    fn test_later_elements_on_top() {
        let mut stack = CanvasStack::new(RgbaBitmap::filled(4, 4, BLUE));
        stack.push(solid(2, 2, RED, (0, 0)));
        stack.push(solid(2, 2, GREEN, (1, 1)));
        let out = stack.render();
        assert_eq!(out.get(0, 0), Some(RED));
        assert_eq!(out.get(1, 1), Some(GREEN));
        assert_eq!(out.get(3, 3), Some(BLUE));

        assert!(stack.swap(0, 1));
        assert_eq!(stack.render().get(1, 1), Some(RED));
    }

    #[test]
    fn test_clipping() {
        let mut stack = CanvasStack::new(RgbaBitmap::filled(3, 3, BLUE));
        stack.push(solid(4, 4, RED, (-2, 2)));
        let out = stack.render();
        assert_eq!(out.get(0, 2), Some(RED));
        assert_eq!(out.get(1, 2), Some(RED));
        assert_eq!(out.get(2, 2), Some(BLUE));
        assert_eq!(out.get(0, 1), Some(BLUE));
    }

    #[test]
    fn test_display_size_scales() {
        let mut source = RgbaBitmap::filled(2, 1, RED);
        source.put(1, 0, GREEN);
        let mut e = Element::from(ImageElement::from_bitmap(source));
        e.set_display_size(4, 2);

        let mut stack = CanvasStack::new(RgbaBitmap::filled(4, 2, BLUE));
        stack.push(e);
        let out = stack.render();
        assert_eq!(out.get(1, 1), Some(RED));
        assert_eq!(out.get(2, 0), Some(GREEN));
        assert_eq!(out.get(3, 1), Some(GREEN));
    }

    #[test]
    fn test_modulation() {
        let mut e = solid(1, 1, ColorRGBA::WHITE, (0, 0));
        e.set_modulation(ColorRGBA::new(255, 0, 0, 128));
        let mut stack = CanvasStack::new(RgbaBitmap::filled(1, 1, BLUE));
        stack.push(e);
        let expected = composite_over(ColorRGBA::new(255, 0, 0, 128), BLUE);
        assert_eq!(stack.render().get(0, 0), Some(expected));
    }

    #[test]
    fn test_pick_topmost() {
        let mut stack = CanvasStack::new(RgbaBitmap::new(10, 10));
        stack.push(solid(5, 5, RED, (0, 0)));
        stack.push(solid(5, 5, GREEN, (3, 3)));
        assert_eq!(stack.pick((4, 4)), Some(1));
        assert_eq!(stack.pick((1, 1)), Some(0));
        assert_eq!(stack.pick((9, 9)), None);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut stack = CanvasStack::new(RgbaBitmap::new(1, 1));
        assert!(stack.remove(0).is_none());
        stack.push(solid(1, 1, RED, (0, 0)));
        assert!(!stack.swap(0, 1));
        assert!(stack.remove(0).is_some());
        assert!(stack.is_empty());
    }
}
