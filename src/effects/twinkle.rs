use crate::config::{EffectConfig, TwinkleMode};
use crate::effects::shared::{
    dead_zone_fade, hash_color_blend, sparkle_threshold, FlowingWave, SparkleSeeds,
};
use crate::effects::EffectContext;
use crate::field::{Cell, CellSample, Rgb};

/// Twinkle parameters derived from the 10-100 / 0-100 user scales
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwinkleTuning {
    /// Oscillator speed, 1 (twinkle_speed 10) to 6 (twinkle_speed 100)
    pub speed: f64,
    /// Noise scale, 0.5 (size 10) down to 0.001 (size 100)
    pub scale: f64,
    /// Gate threshold, 1.0 (density 0) down to 0.1 (density 100)
    pub threshold: f64,
}

impl TwinkleTuning {
    pub fn from_effect(effect: &EffectConfig) -> Self {
        Self {
            speed: 1.0 + (effect.twinkle_speed - 10.0) / 90.0 * 5.0,
            scale: 0.5 - (effect.size - 10.0) / 90.0 * 0.499,
            threshold: sparkle_threshold(effect.density),
        }
    }
}

pub fn evaluate(ctx: &EffectContext<'_>, cell: Cell, mode: TwinkleMode) -> CellSample {
    let fade = dead_zone_fade(ctx.radial.distance(cell), &ctx.radial, ctx.config.effect.deadzone);
    if fade <= 0.0 {
        return CellSample::EMPTY;
    }

    match mode {
        TwinkleMode::Sparkle => sparkle(ctx, cell, fade),
        TwinkleMode::Wave => wave(ctx, cell, fade),
        TwinkleMode::Combined => combined(ctx, cell, fade),
    }
}

fn hashed_color(ctx: &EffectContext<'_>, cell: Cell) -> Rgb {
    let c = ctx.config;
    if c.effect.aurora {
        c.aurora_color1.blend(c.aurora_color2, hash_color_blend(cell, ctx.offset))
    } else {
        Rgb::WHITE
    }
}

/// Random twinkling stars; a slow large-scale noise groups their brightness.
fn sparkle(ctx: &EffectContext<'_>, cell: Cell, fade: f64) -> CellSample {
    let tuning = ctx.twinkle;
    let seeds = SparkleSeeds::for_cell(cell, ctx.offset);
    if seeds.gate <= tuning.threshold {
        return CellSample::EMPTY;
    }

    let t = ctx.effect_time;
    let brightness = seeds.brightness(t, tuning.speed);
    let group = ctx.noise.noise2d(
        cell.xf() * tuning.scale + t * 0.2 + ctx.offset,
        cell.yf() * tuning.scale + ctx.offset,
    );
    let ceiling = 0.2 + (group + 1.0) / 2.0 * 0.8;

    let opacity = brightness * ceiling * ctx.config.effect.intensity * fade;
    CellSample::new(opacity, hashed_color(ctx, cell))
}

/// Smooth flowing light bands, no per-cell gating. Density narrows or
/// widens the bands.
fn wave(ctx: &EffectContext<'_>, cell: Cell, fade: f64) -> CellSample {
    let tuning = ctx.twinkle;
    let flow = FlowingWave::new(tuning.scale, tuning.speed);
    let level = flow.sample(ctx.noise, cell, ctx.effect_time, ctx.offset);

    let density_factor = 0.3 + tuning.threshold * 0.7;
    let opacity = level.powf(1.0 / density_factor) * ctx.config.effect.intensity * fade;

    let c = ctx.config;
    let color = if c.effect.aurora && opacity > 0.0 {
        let color_wave = ctx.noise.noise2d(
            cell.xf() * flow.base_scale * 0.3 + ctx.effect_time * flow.speed * 0.1 + ctx.offset,
            cell.yf() * flow.base_scale * 0.3 + ctx.offset,
        );
        c.aurora_color1.blend(c.aurora_color2, (color_wave + 1.0) / 2.0)
    } else {
        Rgb::WHITE
    };

    CellSample::new(opacity, color)
}

/// Sparkles whose floor is `base_opacity`, lifted toward full brightness
/// where a flowing band passes.
fn combined(ctx: &EffectContext<'_>, cell: Cell, fade: f64) -> CellSample {
    let tuning = ctx.twinkle;
    let seeds = SparkleSeeds::for_cell(cell, ctx.offset);
    if seeds.gate <= tuning.threshold {
        return CellSample::EMPTY;
    }

    let flow = FlowingWave::new(tuning.scale, tuning.speed);
    let wave_level = flow.sample(ctx.noise, cell, ctx.effect_time, ctx.offset).sqrt();

    let effect = &ctx.config.effect;
    let brightness = seeds.brightness(ctx.effect_time, tuning.speed * 2.0);
    let base = effect.base_opacity / 100.0;
    let level = base + (1.0 - base) * wave_level;

    let opacity = brightness * level * effect.intensity * fade;
    CellSample::new(opacity, hashed_color(ctx, cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EffectKind};
    use crate::effects::{SparkleSet, WaveSweep};
    use crate::field::{GridGeometry, NoiseField};

    #[test]
    fn test_tuning_mapping() {
        let effect = EffectConfig {
            twinkle_speed: 10.0,
            size: 10.0,
            density: 0.0,
            ..EffectConfig::default()
        };
        let t = TwinkleTuning::from_effect(&effect);
        assert_eq!(t.speed, 1.0);
        assert_eq!(t.scale, 0.5);
        assert_eq!(t.threshold, 1.0);

        let effect = EffectConfig {
            twinkle_speed: 100.0,
            size: 100.0,
            density: 100.0,
            ..EffectConfig::default()
        };
        let t = TwinkleTuning::from_effect(&effect);
        assert!((t.speed - 6.0).abs() < 1e-12);
        assert!((t.scale - 0.001).abs() < 1e-12);
        assert!((t.threshold - 0.1).abs() < 1e-12);
    }

    struct Fixture {
        noise: NoiseField,
        config: Config,
        grid: GridGeometry,
        sweep: WaveSweep,
        sparkles: SparkleSet,
    }

    impl Fixture {
        fn new(mode: TwinkleMode, tweak: impl FnOnce(&mut EffectConfig)) -> Self {
            let mut config = Config::default();
            config.effect.kind = EffectKind::Twinkle(mode);
            config.effect.deadzone = 0.0;
            tweak(&mut config.effect);
            Self {
                noise: NoiseField::new(2024),
                config,
                grid: GridGeometry::new(4.0, 2.0, 240, 240),
                sweep: WaveSweep::new(),
                sparkles: SparkleSet::new(),
            }
        }

        fn ctx(&self, effect_time: f64) -> EffectContext<'_> {
            EffectContext {
                noise: &self.noise,
                config: &self.config,
                grid: &self.grid,
                radial: self.grid.radial(),
                offset: 42.0,
                pattern_time: 0.0,
                effect_time,
                sweep: &self.sweep,
                sparkles: &self.sparkles,
                twinkle: TwinkleTuning::from_effect(&self.config.effect),
            }
        }

        fn opacities(&self, mode: TwinkleMode, effect_time: f64) -> Vec<f64> {
            let ctx = self.ctx(effect_time);
            self.grid.cells().map(|c| evaluate(&ctx, c, mode).opacity).collect()
        }
    }

    #[test]
    fn test_modes_stay_in_unit_range() {
        for mode in [TwinkleMode::Sparkle, TwinkleMode::Wave, TwinkleMode::Combined] {
            let fx = Fixture::new(mode, |_| {});
            for t in [0.0, 1.7, 40.0] {
                for o in fx.opacities(mode, t) {
                    assert!((0.0..=1.0).contains(&o), "{:?} opacity {}", mode, o);
                }
            }
        }
    }

    #[test]
    fn test_zero_density_gates_all_sparkles() {
        for mode in [TwinkleMode::Sparkle, TwinkleMode::Combined] {
            let fx = Fixture::new(mode, |e| e.density = 0.0);
            assert!(fx.opacities(mode, 3.3).iter().all(|&o| o == 0.0));
        }
    }

    #[test]
    fn test_sparkle_density_controls_count() {
        let sparse = Fixture::new(TwinkleMode::Sparkle, |e| e.density = 10.0);
        let dense = Fixture::new(TwinkleMode::Sparkle, |e| e.density = 90.0);
        let lit = |fx: &Fixture| {
            let ctx = fx.ctx(0.0);
            fx.grid
                .cells()
                .filter(|c| SparkleSeeds::for_cell(*c, ctx.offset).gate > ctx.twinkle.threshold)
                .count()
        };
        assert!(lit(&dense) > lit(&sparse) * 3);
    }

    #[test]
    fn test_wave_mode_is_not_gated() {
        let fx = Fixture::new(TwinkleMode::Wave, |e| e.density = 0.0);
        let lit = fx.opacities(TwinkleMode::Wave, 5.0).iter().filter(|&&o| o > 0.0).count();
        assert!(lit > fx.grid.cell_count() / 2);
    }

    #[test]
    fn test_combined_floor_is_base_opacity() {
        let low = Fixture::new(TwinkleMode::Combined, |e| e.base_opacity = 0.0);
        let full = Fixture::new(TwinkleMode::Combined, |e| e.base_opacity = 100.0);
        let a = low.opacities(TwinkleMode::Combined, 2.0);
        let b = full.opacities(TwinkleMode::Combined, 2.0);
        for (lo, hi) in a.iter().zip(&b) {
            assert!(lo <= hi);
        }
    }

    /// Opacity divided by the cell's own twinkle: the shared group ceiling
    fn ceilings(fx: &Fixture, effect_time: f64) -> Vec<(Cell, f64)> {
        let ctx = fx.ctx(effect_time);
        fx.grid
            .cells()
            .filter_map(|cell| {
                let sample = evaluate(&ctx, cell, TwinkleMode::Sparkle);
                let brightness = SparkleSeeds::for_cell(cell, ctx.offset)
                    .brightness(effect_time, ctx.twinkle.speed);
                (sample.opacity > 0.0 && brightness > 1e-3)
                    .then(|| (cell, sample.opacity / brightness))
            })
            .collect()
    }

    #[test]
    fn test_sparkle_neighbors_share_group_ceiling() {
        let fx = Fixture::new(TwinkleMode::Sparkle, |e| {
            e.density = 100.0;
            e.size = 100.0;
        });
        let lit = ceilings(&fx, 2.5);
        // Half of the twinkles are in their dark half-period
        assert!(lit.len() > fx.grid.cell_count() / 5);

        let mut pairs = 0;
        for (a, ca) in &lit {
            assert!((0.2 - 1e-9..=1.0 + 1e-9).contains(ca), "ceiling {}", ca);
            for (b, cb) in &lit {
                if b.y == a.y && b.x == a.x + 1 {
                    assert!((ca - cb).abs() < 0.02, "{:?} {} vs {:?} {}", a, ca, b, cb);
                    pairs += 1;
                }
            }
        }
        assert!(pairs > 0);
    }

    #[test]
    fn test_sparkle_group_ceiling_varies_at_small_size() {
        let fx = Fixture::new(TwinkleMode::Sparkle, |e| {
            e.density = 100.0;
            e.size = 10.0;
        });
        let lit = ceilings(&fx, 2.5);
        let lo = lit.iter().map(|(_, c)| *c).fold(f64::INFINITY, f64::min);
        let hi = lit.iter().map(|(_, c)| *c).fold(f64::NEG_INFINITY, f64::max);
        assert!(lo >= 0.2 - 1e-9 && hi <= 1.0 + 1e-9);
        assert!(hi - lo > 0.1);
    }

    #[test]
    fn test_wave_aurora_colors_lit_cells() {
        let fx = Fixture::new(TwinkleMode::Wave, |e| e.aurora = true);
        let ctx = fx.ctx(5.0);
        let (c1, c2) = (fx.config.aurora_color1, fx.config.aurora_color2);
        let within = |v: u8, a: u8, b: u8| a.min(b) <= v && v <= a.max(b);

        let mut colors = Vec::new();
        for cell in fx.grid.cells() {
            let sample = evaluate(&ctx, cell, TwinkleMode::Wave);
            if sample.opacity > 0.0 {
                assert!(within(sample.color.r(), c1.r(), c2.r()));
                assert!(within(sample.color.g(), c1.g(), c2.g()));
                assert!(within(sample.color.b(), c1.b(), c2.b()));
                colors.push(sample.color);
            } else {
                assert_eq!(sample.color, Rgb::WHITE);
            }
        }
        colors.dedup();
        assert!(colors.len() > 1);
    }

    #[test]
    fn test_wave_without_aurora_is_white() {
        let fx = Fixture::new(TwinkleMode::Wave, |e| e.aurora = false);
        let ctx = fx.ctx(5.0);
        assert!(fx
            .grid
            .cells()
            .all(|cell| evaluate(&ctx, cell, TwinkleMode::Wave).color == Rgb::WHITE));
    }

    #[test]
    fn test_dead_zone_suppresses_center() {
        let fx = Fixture::new(TwinkleMode::Wave, |e| e.deadzone = 50.0);
        let ctx = fx.ctx(1.0);
        let center = Cell::new(fx.grid.cols / 2, fx.grid.rows / 2);
        assert_eq!(evaluate(&ctx, center, TwinkleMode::Wave), CellSample::EMPTY);
    }
}
