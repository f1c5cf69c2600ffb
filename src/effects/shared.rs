//! Helpers shared by the wave and twinkle overlays.

use std::f64::consts::PI;

use crate::config::DEAD_ZONE_FADE_FRACTION;
use crate::field::{Cell, NoiseField, RadialFrame};

/// Hermite smoothstep on an already-normalized `t`
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn fract(v: f64) -> f64 {
    v - v.floor()
}

/// Sine hash of a cell coordinate, mapped into [0, 1).
#[inline]
pub fn cell_hash(cell: Cell, kx: f64, ky: f64, offset: f64, amplitude: f64) -> f64 {
    fract((cell.xf() * kx + cell.yf() * ky + offset).sin() * amplitude)
}

/// Two independent per-cell values: `gate` decides whether the cell
/// twinkles at all, `phase` offsets its oscillator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparkleSeeds {
    pub gate: f64,
    pub phase: f64,
}

impl SparkleSeeds {
    pub fn for_cell(cell: Cell, offset: f64) -> Self {
        Self {
            gate: cell_hash(cell, 12.9898, 78.233, offset, 43758.5453),
            phase: cell_hash(cell, 93.9898, 67.345, offset * 2.0, 23421.6312) * PI * 2.0,
        }
    }

    /// Half-wave rectified oscillator: dark for half of each period
    pub fn brightness(&self, time: f64, speed: f64) -> f64 {
        (time * speed + self.phase).sin().max(0.0)
    }
}

/// Per-cell aurora blend factor for hash-selected sparkles
pub fn hash_color_blend(cell: Cell, offset: f64) -> f64 {
    cell_hash(cell, 45.123, 89.456, offset, 12345.6789)
}

/// Gate threshold from a 0-100 density: 0 -> 1.0 (nothing), 100 -> 0.1
pub fn sparkle_threshold(density: f64) -> f64 {
    1.0 - density / 100.0 * 0.9
}

/// Broad, slowly drifting light bands built from three blended noise
/// samples at different scales and offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowingWave {
    /// Spatial frequency of the primary sample
    pub base_scale: f64,
    /// Drift rate applied to the effect clock
    pub speed: f64,
}

impl FlowingWave {
    pub fn new(twinkle_scale: f64, twinkle_speed: f64) -> Self {
        Self {
            base_scale: 0.0005 + (1.0 - twinkle_scale) * 0.003,
            speed: twinkle_speed * 0.15,
        }
    }

    /// Wave level in [0, 1] for a cell at effect time `time`
    pub fn sample(&self, noise: &NoiseField, cell: Cell, time: f64, offset: f64) -> f64 {
        let (x, y) = (cell.xf(), cell.yf());
        let scale = self.base_scale;
        let drift = time * self.speed;

        let wave1 = noise.noise2d(x * scale + drift, y * scale + drift * 0.5 + offset);
        let wave2 = noise.noise2d(
            x * scale * 0.5 + drift * 0.3 + 50.0,
            y * scale * 0.7 - drift * 0.2 + offset + 50.0,
        );
        let wave3 = noise.noise2d(
            (x + y * 0.5) * scale * 0.8 + drift * 0.4,
            (y - x * 0.3) * scale * 0.8 + offset + 100.0,
        );

        let combined = wave1 * 0.5 + wave2 * 0.3 + wave3 * 0.2;
        ((combined * PI * 2.0).sin() + 1.0) / 2.0
    }
}

/// Radial fade suppressing overlays near the grid center.
///
/// `deadzone` is the configured 0-100 value, a percentage of the
/// center-to-corner distance. Returns 0 inside the dead zone, 1 outside its
/// soft edge, and a smoothstep in between.
pub fn dead_zone_fade(distance: f64, frame: &RadialFrame, deadzone: f64) -> f64 {
    let max_radius = frame.corner * (deadzone / 100.0);
    let fade_zone = max_radius * DEAD_ZONE_FADE_FRACTION;

    if distance < max_radius {
        0.0
    } else if distance < max_radius + fade_zone {
        smoothstep((distance - max_radius) / fade_zone)
    } else {
        1.0
    }
}
