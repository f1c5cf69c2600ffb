mod shared;
mod sparkle;
mod twinkle;
mod wave;

pub use shared::smoothstep;
pub use sparkle::SparkleSet;
pub use twinkle::TwinkleTuning;
pub use wave::WaveSweep;

use crate::config::{Config, EffectKind};
use crate::field::{Cell, CellSample, GridGeometry, NoiseField, RadialFrame};

/// Everything an overlay needs to evaluate one cell in the current frame.
/// Borrowed from the instance state; rebuilt every frame.
pub struct EffectContext<'a> {
    pub noise: &'a NoiseField,
    pub config: &'a Config,
    pub grid: &'a GridGeometry,
    pub radial: RadialFrame,
    pub offset: f64,
    pub pattern_time: f64,
    pub effect_time: f64,
    pub sweep: &'a WaveSweep,
    pub sparkles: &'a SparkleSet,
    pub twinkle: TwinkleTuning,
}

impl EffectContext<'_> {
    /// Overlay color and opacity for a cell; empty when no effect is active.
    pub fn evaluate(&self, cell: Cell) -> CellSample {
        match self.config.effect.kind {
            EffectKind::None => CellSample::EMPTY,
            EffectKind::Wave(mode) => wave::evaluate(self, cell, mode),
            EffectKind::Twinkle(mode) => twinkle::evaluate(self, cell, mode),
        }
    }
}
