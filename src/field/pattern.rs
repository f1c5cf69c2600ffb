use crate::config::Config;
use crate::field::{Cell, NoiseField, Rgb};

/// Opacity and color for one cell, either base pattern or overlay
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSample {
    pub opacity: f64,
    pub color: Rgb,
}

impl CellSample {
    pub const EMPTY: CellSample = CellSample {
        opacity: 0.0,
        color: Rgb::WHITE,
    };

    pub fn new(opacity: f64, color: Rgb) -> Self {
        Self { opacity, color }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            opacity: self.opacity * factor,
            color: self.color,
        }
    }
}

/// Base pattern: domain-warped ridge noise animated by the pattern clock.
///
/// Pure in `(cell, time, config)`; nothing carries over between frames.
pub struct PatternField<'a> {
    noise: &'a NoiseField,
    config: &'a Config,
    offset: f64,
}

impl<'a> PatternField<'a> {
    pub fn new(noise: &'a NoiseField, config: &'a Config, offset: f64) -> Self {
        Self {
            noise,
            config,
            offset,
        }
    }

    pub fn evaluate(&self, cell: Cell, time: f64) -> CellSample {
        let c = self.config;
        let noise = self.noise;
        let off = self.offset;
        let (x, y) = (cell.xf(), cell.yf());

        // Low-frequency oscillators perturbing the warp inputs
        let wave1 = (time * c.wave_frequency + x * c.pattern_scale * 10.0).sin() * c.wave_amplitude;
        let wave2 =
            (time * c.wave_frequency * 0.7 + y * c.pattern_scale * 10.0).cos() * c.wave_amplitude;

        let warp_freq = c.pattern_scale * c.warp_scale;
        let warp_x = noise.noise2d(x * warp_freq + wave1 + off, y * warp_freq + time + off)
            * c.warp_amount;
        let warp_y = noise.noise2d(x * warp_freq + 100.0 + off, y * warp_freq + time + wave2 + off)
            * c.warp_amount;

        let v = noise.noise2d(
            (x + warp_x) * c.pattern_scale + wave2 * 0.5 + off,
            (y + warp_y) * c.pattern_scale + wave1 * 0.5 + off,
        );

        let ridge = (1.0 - v.abs()).clamp(0.0, 1.0);
        let raw = ridge.powf(c.ridge_power);
        let lo = c.min_opacity.min(c.max_opacity);
        let hi = c.min_opacity.max(c.max_opacity);
        let opacity = (c.min_opacity + raw * (c.max_opacity - c.min_opacity))
            .max(lo)
            .min(hi);

        let color = if c.pattern_aurora {
            let color_noise = noise.noise2d(
                x * c.color_scale + off * 0.5,
                y * c.color_scale + time * 0.5 + off * 0.5,
            );
            c.aurora_color1.blend(c.aurora_color2, (color_noise + 1.0) / 2.0)
        } else {
            Rgb::WHITE
        };

        CellSample { opacity, color }
    }
}
