use serde::{Deserialize, Serialize};

/// 8-bit RGB color. Opacity always travels separately as an `f64` in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    #[cfg(test)]
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn r(self) -> u8 {
        self.0[0]
    }

    pub fn g(self) -> u8 {
        self.0[1]
    }

    pub fn b(self) -> u8 {
        self.0[2]
    }

    /// Aurora blend: per-channel linear interpolation from `self` to `other`,
    /// rounded to the nearest integer. `t` is clamped to [0, 1].
    pub fn blend(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let channel = |a: u8, b: u8| -> u8 {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb([
            channel(self.0[0], other.0[0]),
            channel(self.0[1], other.0[1]),
            channel(self.0[2], other.0[2]),
        ])
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}
