//! Diagonal sweep overlay.
//!
//! A band of width `effect.width` travels along `x + y` from the top-left
//! corner to the bottom-right one, lighting the cells of the sparkle set it
//! passes. After each pass the sweep waits a random delay, the sparkle set is
//! resampled and the band restarts just before the corner.

use std::f64::consts::PI;

use rand::Rng;

use crate::config::{EffectConfig, WaveMode};
use crate::effects::shared::{dead_zone_fade, hash_color_blend, sparkle_threshold, SparkleSeeds};
use crate::effects::EffectContext;
use crate::field::{Cell, CellSample, GridGeometry, Rgb};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SweepPhase {
    Sweeping,
    /// Paused between passes until the given timestamp (ms)
    Waiting { until: f64 },
}

/// Sweep position and pause state. Persists across resizes.
#[derive(Clone, Debug)]
pub struct WaveSweep {
    position: f64,
    phase: SweepPhase,
}

impl Default for WaveSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveSweep {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            phase: SweepPhase::Sweeping,
        }
    }

    /// Current band center along the `x + y` diagonal
    pub fn position(&self) -> f64 {
        self.position
    }

    #[cfg(test)]
    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.phase, SweepPhase::Waiting { .. })
    }

    /// Step the sweep by one frame. Returns true when a pass has just
    /// completed; the caller then regenerates the sparkle set.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        delta: f64,
        effect: &EffectConfig,
        grid: &GridGeometry,
        rng: &mut R,
    ) -> bool {
        match self.phase {
            SweepPhase::Sweeping => {
                self.position += delta * effect.speed * 100.0;

                let end = (grid.cols + grid.rows) as f64 + effect.width;
                if self.position > end {
                    let delay = effect.delay_min + rng.gen::<f64>() * (effect.delay_max - effect.delay_min);
                    self.phase = SweepPhase::Waiting { until: now + delay };
                    log::debug!("Sweep complete, next pass in {:.0} ms", delay);
                    return true;
                }
            }
            SweepPhase::Waiting { until } => {
                if now >= until {
                    self.phase = SweepPhase::Sweeping;
                    self.position = -effect.width;
                }
            }
        }
        false
    }
}

pub fn evaluate(ctx: &EffectContext<'_>, cell: Cell, mode: WaveMode) -> CellSample {
    let fade = dead_zone_fade(ctx.radial.distance(cell), &ctx.radial, ctx.config.effect.deadzone);

    match mode {
        WaveMode::CombinedSparkle => combined_sparkle(ctx, cell, fade),
        WaveMode::Sweep if ctx.sweep.is_waiting() => CellSample::EMPTY,
        WaveMode::Sweep => sweep_band(ctx, cell, fade),
    }
}

fn sweep_band(ctx: &EffectContext<'_>, cell: Cell, fade: f64) -> CellSample {
    let effect = &ctx.config.effect;
    let position = ctx.sweep.position();
    let dist = ((cell.x + cell.y) as f64 - position).abs();

    if dist >= effect.width {
        return CellSample::EMPTY;
    }
    let Some(phase) = ctx.sparkles.phase(cell) else {
        return CellSample::EMPTY;
    };

    let sparkle = (dist / effect.width * PI * 0.5).cos() * effect.intensity;
    let cylinder = cylinder_fade(position, cell, ctx.grid.cols, ctx.grid.rows);
    let opacity = sparkle * phase * cylinder.max(0.0) * fade;

    let color = if effect.aurora {
        let c = ctx.config;
        let scale = c.color_scale * 2.0;
        let color_noise = ctx.noise.noise2d(
            cell.xf() * scale + ctx.offset,
            cell.yf() * scale + ctx.pattern_time + ctx.offset,
        );
        c.aurora_color1.blend(c.aurora_color2, (color_noise + 1.0) / 2.0)
    } else {
        Rgb::WHITE
    };

    CellSample::new(opacity, color)
}

/// Brightness profile along the current diagonal line.
///
/// Once the line spans the full short side of the grid, cells fade toward
/// its ends (floor 0.3). While the line is still shorter than that, the fade
/// is weakened in proportion to how complete the line is.
fn cylinder_fade(position: f64, cell: Cell, cols: u32, rows: u32) -> f64 {
    let full_length = cols.min(rows) as i64;
    let head = position.floor() as i64;
    let start = (head - (rows as i64 - 1)).max(0);
    let end = (cols as i64 - 1).min(head);
    let length = (end - start + 1).max(1);

    if length <= 1 {
        return 1.0;
    }

    let along = ((cell.x as i64 - start) as f64 / (length - 1) as f64).clamp(0.0, 1.0);
    let base = (along * PI).sin();

    if length >= full_length {
        0.3 + 0.7 * base
    } else {
        let completeness = length as f64 / full_length as f64;
        (1.0 - (1.0 - base) * completeness * 0.7).max(0.3)
    }
}

/// Hash-selected sparkles that twinkle continuously and brighten as the band
/// passes near them. Ignores the sparkle set and the pause between sweeps.
fn combined_sparkle(ctx: &EffectContext<'_>, cell: Cell, fade: f64) -> CellSample {
    if fade <= 0.0 {
        return CellSample::EMPTY;
    }
    let effect = &ctx.config.effect;

    let dist = ((cell.x + cell.y) as f64 - ctx.sweep.position()).abs();
    let proximity = (1.0 - dist / effect.width).max(0.0).sqrt();

    let seeds = SparkleSeeds::for_cell(cell, ctx.offset);
    if seeds.gate <= sparkle_threshold(effect.density) {
        return CellSample::EMPTY;
    }

    let speed = 0.1 + (effect.twinkle_speed / 100.0) * 0.4;
    let sparkle = seeds.brightness(ctx.effect_time, speed);
    let base = effect.sparkle_base_opacity / 100.0;
    let level = base + (1.0 - base) * proximity;

    let color = if effect.aurora {
        let c = ctx.config;
        c.aurora_color1.blend(c.aurora_color2, hash_color_blend(cell, ctx.offset))
    } else {
        Rgb::WHITE
    };

    CellSample::new(sparkle * level * fade, color)
}
