use crate::field::Rgb;

/// Drawing target supplied by the host.
///
/// Coordinates are in surface pixels. `opacity` is straight alpha in [0, 1]
/// composited source-over onto what is already there.
pub trait DrawSurface {
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    /// Reset to the empty background
    fn clear(&mut self);

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb, opacity: f64);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb, opacity: f64);

    /// Stretch `buffer` over the whole surface with smooth interpolation
    fn draw_scaled(&mut self, buffer: &PixelBuffer);
}

/// Low-resolution RGBA8 image, one pixel per grid cell, straight alpha
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    /// Reset every pixel to fully transparent
    pub fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    /// Write a pixel; opacity is quantized to `round(opacity * 255)`.
    /// Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: u32, y: u32, color: Rgb, opacity: f64) {
        if x >= self.width || y >= self.height {
            return;
        }
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let index = y as usize * self.width as usize + x as usize;
        self.pixels[index] = [color.r(), color.g(), color.b(), alpha];
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}
