use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BorealisError;
use crate::field::Rgb;

/// Window size used when the config does not pin one
pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 800;

/// Background the canvas composites onto (near black, slight blue)
pub const BACKGROUND: Rgb = Rgb::new(13, 13, 20);

/// Effect clock advances at this rate per millisecond of frame delta
pub const EFFECT_TIME_RATE: f64 = 0.001;

/// Simulated frame delta (ms) for forced redraws
pub const FORCED_FRAME_DELTA_MS: f64 = 16.0;

/// Fraction of the dead-zone radius used as its soft edge
pub const DEAD_ZONE_FADE_FRACTION: f64 = 0.3;

/// Smallest cell size (px) the grid will ever use
pub const MIN_CELL_SIZE: f64 = 0.5;

/// Slowest collapse speed accepted, so transitions always terminate
pub const MIN_COLLAPSE_SPEED: f64 = 0.001;

/// Random per-instance offset is drawn from [0, RANDOM_OFFSET_RANGE)
pub const RANDOM_OFFSET_RANGE: f64 = 1000.0;

/// Noise seeds are drawn from [0, NOISE_SEED_RANGE) when none is configured
pub const NOISE_SEED_RANGE: u32 = 10_000;

// ============================================
// Host keyboard tuning
// ============================================

/// Density change per +/- key press
pub const DENSITY_STEP: f64 = 5.0;

/// Dot size change per [/] key press
pub const DOT_SIZE_STEP: f64 = 1.0;

/// Full configuration snapshot. Read-only while a frame is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Surface
    /// Window width in pixels (None = default size)
    pub width: Option<u32>,
    /// Window height in pixels (None = default size)
    pub height: Option<u32>,
    pub fullscreen: bool,
    /// Start collapsed; stays hidden until `show` is requested
    pub initially_hidden: bool,
    pub auto_start: bool,
    /// Fixed seed for noise and sparkle randomness (None = random)
    pub seed: Option<u32>,

    // Grid
    /// Grid density (10-100)
    pub density: f64,
    /// Dot size (0-10, 0 = smallest)
    pub dot_size: f64,
    /// Fill whole cells instead of circles
    pub solid_pattern: bool,
    /// Render solid patterns through a cell-resolution buffer upscaled onto the surface
    pub upscale_solid: bool,
    /// Cell size at max density
    pub density_min_cell: f64,
    /// Cell size at min density
    pub density_max_cell: f64,
    /// Gap at max density
    pub density_min_gap: f64,
    /// Gap at min density
    pub density_max_gap: f64,

    // Pattern
    /// Noise scale (smaller = larger patterns)
    pub pattern_scale: f64,
    pub pattern_aurora: bool,
    /// Domain warp frequency multiplier
    pub warp_scale: f64,
    /// Domain warp intensity
    pub warp_amount: f64,
    /// Pattern clock advance per millisecond
    pub animation_speed: f64,
    /// Ridge sharpness (higher = thinner lines)
    pub ridge_power: f64,
    pub min_opacity: f64,
    pub max_opacity: f64,
    /// Oscillator frequency
    pub wave_frequency: f64,
    /// Oscillator amplitude
    pub wave_amplitude: f64,

    pub effect: EffectConfig,

    // Aurora
    pub aurora_color1: Rgb,
    pub aurora_color2: Rgb,
    /// Color variation scale
    pub color_scale: f64,

    // Collapse
    /// Progress added or removed per frame
    pub collapse_speed: f64,
    /// Width of the soft edge of the radial wipe
    pub collapse_wave_width: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fullscreen: false,
            initially_hidden: false,
            auto_start: true,
            seed: None,
            density: 50.0,
            dot_size: 5.0,
            solid_pattern: false,
            upscale_solid: true,
            density_min_cell: 2.0,
            density_max_cell: 8.0,
            density_min_gap: 1.0,
            density_max_gap: 4.0,
            pattern_scale: 0.001,
            pattern_aurora: false,
            warp_scale: 0.5,
            warp_amount: 20.0,
            animation_speed: 0.00002,
            ridge_power: 2.0,
            min_opacity: 0.0,
            max_opacity: 1.0,
            wave_frequency: 3.0,
            wave_amplitude: 0.5,
            effect: EffectConfig::default(),
            aurora_color1: Rgb::new(0, 255, 128),
            aurora_color2: Rgb::new(148, 0, 211),
            color_scale: 0.003,
            collapse_speed: 0.1,
            collapse_wave_width: 0.4,
        }
    }
}

/// Overlay effect selection. Closed set; each kind carries its sub-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    None,
    Wave(WaveMode),
    Twinkle(TwinkleMode),
}

impl EffectKind {
    /// Cycle order used by the host's effect key
    pub fn next(self) -> Self {
        match self {
            EffectKind::None => EffectKind::Wave(WaveMode::Sweep),
            EffectKind::Wave(WaveMode::Sweep) => EffectKind::Wave(WaveMode::CombinedSparkle),
            EffectKind::Wave(WaveMode::CombinedSparkle) => EffectKind::Twinkle(TwinkleMode::Sparkle),
            EffectKind::Twinkle(TwinkleMode::Sparkle) => EffectKind::Twinkle(TwinkleMode::Wave),
            EffectKind::Twinkle(TwinkleMode::Wave) => EffectKind::Twinkle(TwinkleMode::Combined),
            EffectKind::Twinkle(TwinkleMode::Combined) => EffectKind::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    /// Diagonal band lights up cells of the sparkle set
    Sweep,
    /// Hash-selected sparkles, boosted as the band passes
    CombinedSparkle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwinkleMode {
    Sparkle,
    Wave,
    Combined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub kind: EffectKind,
    /// Aurora colors for the overlay
    pub aurora: bool,
    /// Center dead zone size (0-100)
    pub deadzone: f64,
    /// Max brightness
    pub intensity: f64,

    // Wave
    /// Sweep speed (cells per ms / 100)
    pub speed: f64,
    /// Width of the sweep band in cells
    pub width: f64,
    /// Chance of a cell joining the sparkle set (0-1)
    pub chance: f64,
    /// Min pause between sweeps (ms)
    pub delay_min: f64,
    /// Max pause between sweeps (ms)
    pub delay_max: f64,
    /// Sparkle floor when the band is elsewhere (0-100)
    pub sparkle_base_opacity: f64,

    // Twinkle
    /// Floor when no wave is passing in combined mode (0-100)
    pub base_opacity: f64,
    /// Twinkle speed (10-100)
    pub twinkle_speed: f64,
    /// Pattern size (10-100)
    pub size: f64,
    /// Star density (0-100)
    pub density: f64,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            kind: EffectKind::Wave(WaveMode::Sweep),
            aurora: false,
            deadzone: 20.0,
            intensity: 1.0,
            speed: 0.0008,
            width: 120.0,
            chance: 0.08,
            delay_min: 1000.0,
            delay_max: 3000.0,
            sparkle_base_opacity: 0.0,
            base_opacity: 30.0,
            twinkle_speed: 50.0,
            size: 50.0,
            density: 50.0,
        }
    }
}

impl Config {
    /// Load a TOML config file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, BorealisError> {
        let content = std::fs::read_to_string(path).map_err(|source| BorealisError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| BorealisError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.sanitized())
    }

    /// Clamp every value into a domain the evaluator can handle without
    /// producing NaN or negative sizes.
    pub fn sanitized(&self) -> Self {
        let defaults = Config::default();
        let mut c = self.clone();

        c.density = clamp_field("density", c.density, defaults.density, 10.0, 100.0);
        c.dot_size = clamp_field("dot_size", c.dot_size, defaults.dot_size, 0.0, 10.0);
        c.density_min_cell = at_least("density_min_cell", c.density_min_cell, defaults.density_min_cell, 0.0);
        c.density_max_cell = at_least("density_max_cell", c.density_max_cell, defaults.density_max_cell, 0.0);
        c.density_min_gap = at_least("density_min_gap", c.density_min_gap, defaults.density_min_gap, 0.0);
        c.density_max_gap = at_least("density_max_gap", c.density_max_gap, defaults.density_max_gap, 0.0);

        c.pattern_scale = finite("pattern_scale", c.pattern_scale, defaults.pattern_scale);
        c.warp_scale = finite("warp_scale", c.warp_scale, defaults.warp_scale);
        c.warp_amount = finite("warp_amount", c.warp_amount, defaults.warp_amount);
        c.animation_speed = at_least("animation_speed", c.animation_speed, defaults.animation_speed, 0.0);
        c.ridge_power = at_least("ridge_power", c.ridge_power, defaults.ridge_power, 0.0);
        c.wave_frequency = finite("wave_frequency", c.wave_frequency, defaults.wave_frequency);
        c.wave_amplitude = finite("wave_amplitude", c.wave_amplitude, defaults.wave_amplitude);
        c.color_scale = finite("color_scale", c.color_scale, defaults.color_scale);

        c.min_opacity = clamp_field("min_opacity", c.min_opacity, defaults.min_opacity, 0.0, 1.0);
        c.max_opacity = clamp_field("max_opacity", c.max_opacity, defaults.max_opacity, 0.0, 1.0);
        if c.min_opacity > c.max_opacity {
            log::warn!(
                "min_opacity {} exceeds max_opacity {}, swapping",
                c.min_opacity,
                c.max_opacity
            );
            std::mem::swap(&mut c.min_opacity, &mut c.max_opacity);
        }

        c.collapse_speed = at_least("collapse_speed", c.collapse_speed, defaults.collapse_speed, MIN_COLLAPSE_SPEED);
        c.collapse_wave_width =
            at_least("collapse_wave_width", c.collapse_wave_width, defaults.collapse_wave_width, 0.0);

        c.effect = c.effect.sanitized();
        c
    }

    /// Fields whose change invalidates grid geometry and the sparkle set
    pub fn needs_regeneration(&self, other: &Config) -> bool {
        self.density != other.density
            || self.dot_size != other.dot_size
            || self.density_min_cell != other.density_min_cell
            || self.density_max_cell != other.density_max_cell
            || self.density_min_gap != other.density_min_gap
            || self.density_max_gap != other.density_max_gap
            || self.solid_pattern != other.solid_pattern
            || self.pattern_aurora != other.pattern_aurora
            || self.min_opacity != other.min_opacity
            || self.max_opacity != other.max_opacity
            || self.effect != other.effect
    }
}

impl EffectConfig {
    pub fn sanitized(&self) -> Self {
        let d = EffectConfig::default();
        let mut e = self.clone();
        e.deadzone = clamp_field("effect.deadzone", e.deadzone, d.deadzone, 0.0, 100.0);
        e.intensity = at_least("effect.intensity", e.intensity, d.intensity, 0.0);
        e.speed = at_least("effect.speed", e.speed, d.speed, 0.0);
        e.width = at_least("effect.width", e.width, d.width, 1.0);
        e.chance = clamp_field("effect.chance", e.chance, d.chance, 0.0, 1.0);
        e.delay_min = at_least("effect.delay_min", e.delay_min, d.delay_min, 0.0);
        e.delay_max = at_least("effect.delay_max", e.delay_max, d.delay_max, e.delay_min);
        e.sparkle_base_opacity =
            clamp_field("effect.sparkle_base_opacity", e.sparkle_base_opacity, d.sparkle_base_opacity, 0.0, 100.0);
        e.base_opacity = clamp_field("effect.base_opacity", e.base_opacity, d.base_opacity, 0.0, 100.0);
        e.twinkle_speed = clamp_field("effect.twinkle_speed", e.twinkle_speed, d.twinkle_speed, 10.0, 100.0);
        e.size = clamp_field("effect.size", e.size, d.size, 10.0, 100.0);
        e.density = clamp_field("effect.density", e.density, d.density, 0.0, 100.0);
        e
    }
}

fn finite(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::warn!("{} is not finite, using default {}", name, default);
        default
    }
}

fn clamp_field(name: &str, value: f64, default: f64, min: f64, max: f64) -> f64 {
    let value = finite(name, value, default);
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{} = {} out of range [{}, {}], clamped to {}", name, value, min, max, clamped);
    }
    clamped
}

fn at_least(name: &str, value: f64, default: f64, min: f64) -> f64 {
    let value = finite(name, value, default);
    if value < min {
        log::warn!("{} = {} below minimum {}, raised", name, value, min);
        min
    } else {
        value
    }
}
