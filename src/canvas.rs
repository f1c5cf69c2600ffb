use crate::field::Rgb;
use crate::surface::{DrawSurface, PixelBuffer};

/// CPU raster the engine draws into; the GPU presenter uploads it as a
/// texture each frame. Always opaque: every pixel starts as `background`.
pub struct Canvas {
    width: u32,
    height: u32,
    background: Rgb,
    pixels: Vec<[u8; 4]>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let mut canvas = Self {
            width,
            height,
            background,
            pixels: Vec::new(),
        };
        canvas.resize(width, height);
        canvas
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// RGBA8 rows, top to bottom
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn background_pixel(&self) -> [u8; 4] {
        [self.background.r(), self.background.g(), self.background.b(), 255]
    }

    /// Source-over with straight alpha
    fn blend(&mut self, x: u32, y: u32, color: Rgb, alpha: f64) {
        if alpha <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);
        let index = y as usize * self.width as usize + x as usize;
        let dst = &mut self.pixels[index];
        for (channel, src) in dst.iter_mut().take(3).zip(color.0) {
            let mixed = src as f64 * alpha + *channel as f64 * (1.0 - alpha);
            *channel = mixed.round() as u8;
        }
    }

    /// Pixel range whose centers fall in `[lo, hi)`, clipped to `0..limit`
    fn span(lo: f64, hi: f64, limit: u32) -> std::ops::Range<u32> {
        let start = (lo - 0.5).ceil().max(0.0);
        let end = (hi - 0.5).ceil().clamp(0.0, limit as f64);
        if start >= end {
            return 0..0;
        }
        start as u32..end as u32
    }
}

impl DrawSurface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let fill = self.background_pixel();
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, fill);
    }

    fn clear(&mut self) {
        let fill = self.background_pixel();
        self.pixels.fill(fill);
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb, opacity: f64) {
        if !(radius > 0.0) || !(opacity > 0.0) {
            return;
        }
        // One extra pixel of margin for the anti-aliased rim
        let xs = Self::span(cx - radius - 1.0, cx + radius + 1.0, self.width);
        let ys = Self::span(cy - radius - 1.0, cy + radius + 1.0, self.height);

        for y in ys {
            let dy = y as f64 + 0.5 - cy;
            for x in xs.clone() {
                let dx = x as f64 + 0.5 - cx;
                let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
                self.blend(x, y, color, opacity * coverage);
            }
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb, opacity: f64) {
        if !(opacity > 0.0) {
            return;
        }
        let xs = Self::span(x, x + width, self.width);
        for py in Self::span(y, y + height, self.height) {
            for px in xs.clone() {
                self.blend(px, py, color, opacity);
            }
        }
    }

    fn draw_scaled(&mut self, buffer: &PixelBuffer) {
        let (bw, bh) = (buffer.width(), buffer.height());
        if bw == 0 || bh == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let sx = bw as f64 / self.width as f64;
        let sy = bh as f64 / self.height as f64;

        for y in 0..self.height {
            let v = ((y as f64 + 0.5) * sy - 0.5).clamp(0.0, (bh - 1) as f64);
            let y0 = v.floor() as u32;
            let y1 = (y0 + 1).min(bh - 1);
            let fy = v - y0 as f64;

            for x in 0..self.width {
                let u = ((x as f64 + 0.5) * sx - 0.5).clamp(0.0, (bw - 1) as f64);
                let x0 = u.floor() as u32;
                let x1 = (x0 + 1).min(bw - 1);
                let fx = u - x0 as f64;

                // Interpolate premultiplied so transparent texels carry no color
                let mut premul = [0.0f64; 3];
                let mut alpha = 0.0;
                for (px, py, weight) in [
                    (x0, y0, (1.0 - fx) * (1.0 - fy)),
                    (x1, y0, fx * (1.0 - fy)),
                    (x0, y1, (1.0 - fx) * fy),
                    (x1, y1, fx * fy),
                ] {
                    let texel = buffer.get(px, py);
                    let a = texel[3] as f64 / 255.0 * weight;
                    alpha += a;
                    for (acc, channel) in premul.iter_mut().zip(texel) {
                        *acc += channel as f64 * a;
                    }
                }
                if alpha <= 0.0 {
                    continue;
                }

                let color = Rgb::new(
                    (premul[0] / alpha).round() as u8,
                    (premul[1] / alpha).round() as u8,
                    (premul[2] / alpha).round() as u8,
                );
                self.blend(x, y, color, alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgb = Rgb::new(10, 10, 10);

    #[test]
    fn test_new_canvas_is_background() {
        let canvas = Canvas::new(4, 3, BG);
        assert_eq!(canvas.size(), (4, 3));
        assert_eq!(canvas.as_bytes().len(), 4 * 3 * 4);
        assert_eq!(canvas.pixel(3, 2), [10, 10, 10, 255]);
    }

    #[test]
    fn test_opaque_circle_covers_center_not_corner() {
        let mut canvas = Canvas::new(20, 20, BG);
        canvas.fill_circle(10.0, 10.0, 4.0, Rgb::WHITE, 1.0);
        assert_eq!(canvas.pixel(10, 10), [255, 255, 255, 255]);
        assert_eq!(canvas.pixel(0, 0), [10, 10, 10, 255]);
        assert_eq!(canvas.pixel(19, 19), [10, 10, 10, 255]);
    }

    #[test]
    fn test_half_opacity_blends_with_background() {
        let mut canvas = Canvas::new(4, 4, Rgb::BLACK);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::new(200, 100, 0), 0.5);
        assert_eq!(canvas.pixel(2, 2), [100, 50, 0, 255]);
    }

    #[test]
    fn test_rect_uses_pixel_centers() {
        let mut canvas = Canvas::new(10, 10, Rgb::BLACK);
        canvas.fill_rect(2.0, 3.0, 3.0, 2.0, Rgb::WHITE, 1.0);
        for y in 0..10 {
            for x in 0..10 {
                let inside = (2..5).contains(&x) && (3..5).contains(&y);
                let expected = if inside { 255 } else { 0 };
                assert_eq!(canvas.pixel(x, y)[0], expected, "pixel {},{}", x, y);
            }
        }
    }

    #[test]
    fn test_shapes_clip_at_edges() {
        let mut canvas = Canvas::new(5, 5, Rgb::BLACK);
        canvas.fill_circle(-2.0, -2.0, 5.0, Rgb::WHITE, 1.0);
        canvas.fill_rect(3.0, 3.0, 100.0, 100.0, Rgb::WHITE, 1.0);
        canvas.fill_circle(2.0, 2.0, 1.0, Rgb::WHITE, f64::NAN);
        assert_eq!(canvas.pixel(4, 4)[0], 255);
        assert_eq!(canvas.pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_clear_and_resize() {
        let mut canvas = Canvas::new(3, 3, BG);
        canvas.fill_rect(0.0, 0.0, 3.0, 3.0, Rgb::WHITE, 1.0);
        canvas.clear();
        assert_eq!(canvas.pixel(1, 1), [10, 10, 10, 255]);
        canvas.resize(6, 2);
        assert_eq!(canvas.size(), (6, 2));
        assert_eq!(canvas.as_bytes().len(), 6 * 2 * 4);
    }

    #[test]
    fn test_draw_scaled_uniform_buffer() {
        let mut buffer = PixelBuffer::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                buffer.put(x, y, Rgb::new(255, 0, 0), 1.0);
            }
        }
        let mut canvas = Canvas::new(8, 8, Rgb::BLACK);
        canvas.draw_scaled(&buffer);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(canvas.pixel(x, y), [255, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn test_draw_scaled_transparent_texel_adds_no_color() {
        let mut buffer = PixelBuffer::new(2, 1);
        buffer.put(0, 0, Rgb::WHITE, 1.0);
        buffer.put(1, 0, Rgb::new(255, 0, 0), 0.0);
        let mut canvas = Canvas::new(4, 1, Rgb::BLACK);
        canvas.draw_scaled(&buffer);
        // Left edge is the opaque white texel, right edge untouched
        assert_eq!(canvas.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(canvas.pixel(3, 0), [0, 0, 0, 255]);
        // Interpolated pixels fade white over black, never tinted red
        let mid = canvas.pixel(2, 0);
        assert_eq!(mid[0], mid[1]);
        assert!(mid[0] > 0 && mid[0] < 255);
    }
}
