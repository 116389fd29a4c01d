//! Owned pixel surface the renderer draws into.

use egui::Color32;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color32::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixels.
    pub fn pixels(&self) -> &[Color32] {
        &self.pixels
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels = vec![Color32::BLACK; width * height];
        }
    }

    pub fn clear(&mut self, color: Color32) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Color32> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Off-surface writes are dropped.
    pub fn put(&mut self, x: i32, y: i32, color: Color32) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x >= self.width {
            return;
        }
        if let Some(pixel) = self.pixels.get_mut(y * self.width + x) {
            *pixel = color;
        }
    }

    /// Fill a rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color32) {
        self.for_each_in_rect(x, y, width, height, |pixel| *pixel = color);
    }

    /// Mix `color` over a rectangle with opacity `alpha` in `[0, 1]`.
    pub fn blend_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color32, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        self.for_each_in_rect(x, y, width, height, |pixel| *pixel = mix(*pixel, color, alpha));
    }

    fn for_each_in_rect(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        mut paint: impl FnMut(&mut Color32),
    ) {
        let surface_w = i32::try_from(self.width).unwrap_or(i32::MAX);
        let surface_h = i32::try_from(self.height).unwrap_or(i32::MAX);
        let x0 = x.clamp(0, surface_w);
        let y0 = y.clamp(0, surface_h);
        let x1 = x.saturating_add(width).clamp(0, surface_w);
        let y1 = y.saturating_add(height).clamp(0, surface_h);
        for row in y0..y1 {
            let start = row as usize * self.width;
            let Some(span) = self.pixels.get_mut(start + x0 as usize..start + x1 as usize) else {
                continue;
            };
            span.iter_mut().for_each(&mut paint);
        }
    }

    /// Pack into RGBA bytes for upload.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|pixel| pixel.to_array()).collect()
    }
}

/// Linear mix of two opaque colors.
pub fn mix(base: Color32, over: Color32, alpha: f32) -> Color32 {
    let channel = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * alpha).round() as u8;
    Color32::from_rgb(
        channel(base.r(), over.r()),
        channel(base.g(), over.g()),
        channel(base.b(), over.b()),
    )
}

/// Scale brightness, keeping alpha.
pub fn shade(color: Color32, factor: f32) -> Color32 {
    let channel = |c: u8| (f32::from(c) * factor).clamp(0.0, 255.0) as u8;
    Color32::from_rgba_premultiplied(
        channel(color.r()),
        channel(color.g()),
        channel(color.b()),
        color.a(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rects_are_clipped_to_the_surface() {
        let mut frame = FrameBuffer::new(8, 4);
        frame.fill_rect(-3, 2, 5, 10, Color32::RED);
        assert_eq!(frame.get(0, 2), Some(Color32::RED));
        assert_eq!(frame.get(1, 3), Some(Color32::RED));
        assert_eq!(frame.get(2, 3), Some(Color32::BLACK));
        assert_eq!(frame.get(0, 1), Some(Color32::BLACK));
    }

    #[test]
    fn off_surface_writes_are_ignored() {
        let mut frame = FrameBuffer::new(4, 4);
        frame.put(-1, 0, Color32::WHITE);
        frame.put(4, 0, Color32::WHITE);
        frame.put(0, 4, Color32::WHITE);
        assert!(frame.pixels().iter().all(|&p| p == Color32::BLACK));
        assert_eq!(frame.get(4, 0), None);
    }

    #[test]
    fn blending_mixes_toward_overlay() {
        let mut frame = FrameBuffer::new(2, 2);
        frame.clear(Color32::from_rgb(0, 0, 200));
        frame.blend_rect(0, 0, 2, 2, Color32::from_rgb(200, 0, 0), 0.5);
        assert_eq!(frame.get(1, 1), Some(Color32::from_rgb(100, 0, 100)));
    }

    #[test]
    fn shading_darkens() {
        let color = shade(Color32::from_rgb(200, 100, 50), 0.5);
        assert_eq!(color, Color32::from_rgb(100, 50, 25));
    }

    #[test]
    fn rgba_export_matches_size() {
        let frame = FrameBuffer::new(3, 2);
        assert_eq!(frame.to_rgba().len(), 3 * 2 * 4);
    }
}
