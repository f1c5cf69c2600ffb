//! One animated field bound to one drawing surface.
//!
//! The host calls [`Borealis::advance_and_render`] once per display refresh.
//! Everything that changes between frames lives in `FrameState` so resize
//! and reconfiguration know exactly what to reset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::AnimationClock;
use crate::compositor::FrameCompositor;
use crate::config::{
    Config, EffectConfig, EffectKind, FORCED_FRAME_DELTA_MS, NOISE_SEED_RANGE, RANDOM_OFFSET_RANGE,
};
use crate::effects::{EffectContext, SparkleSet, TwinkleTuning, WaveSweep};
use crate::field::{GridGeometry, NoiseField};
use crate::surface::{DrawSurface, PixelBuffer};
use crate::transition::{CollapseTransition, TransitionEvent};

/// Persistent listener, fired on every completion
pub type Listener = Box<dyn FnMut()>;

/// One-shot completion callback
pub type Callback = Box<dyn FnOnce()>;

/// Mutable per-frame state. Clocks, sweep and collapse progress survive a
/// resize; the sparkle set and raster buffer do not.
struct FrameState {
    clock: AnimationClock,
    sweep: WaveSweep,
    sparkles: SparkleSet,
    transition: CollapseTransition,
    raster: Option<PixelBuffer>,
}

pub struct Borealis<S: DrawSurface> {
    config: Config,
    geometry: GridGeometry,
    tuning: TwinkleTuning,
    noise: NoiseField,
    offset: f64,
    rng: StdRng,
    state: FrameState,
    surface: S,
    running: bool,
    on_show: Option<Listener>,
    on_hide: Option<Listener>,
    pending_show: Option<Callback>,
    pending_hide: Option<Callback>,
}

impl<S: DrawSurface> Borealis<S> {
    /// Build an instance drawing onto `surface`. The config is sanitized
    /// first; a configured seed makes the whole animation reproducible.
    pub fn new(config: Config, surface: S) -> Self {
        let config = config.sanitized();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed as u64),
            None => StdRng::from_entropy(),
        };
        let noise_seed = config
            .seed
            .unwrap_or_else(|| rng.gen_range(0..NOISE_SEED_RANGE));
        let offset = rng.gen::<f64>() * RANDOM_OFFSET_RANGE;

        let (width, height) = surface.size();
        let geometry = GridGeometry::from_config(&config, width, height);
        let mut sparkles = SparkleSet::new();
        sparkles.regenerate(&geometry, config.effect.chance, &mut rng);

        let transition = if config.initially_hidden {
            CollapseTransition::hidden(config.collapse_wave_width)
        } else {
            CollapseTransition::shown()
        };

        log::info!(
            "Field {}x{} cells ({:.2}px dots, {:.2}px gap), noise seed {}",
            geometry.cols,
            geometry.rows,
            geometry.cell_size,
            geometry.gap,
            noise_seed
        );

        Self {
            tuning: TwinkleTuning::from_effect(&config.effect),
            running: config.auto_start,
            config,
            geometry,
            noise: NoiseField::new(noise_seed),
            offset,
            rng,
            state: FrameState {
                clock: AnimationClock::new(),
                sweep: WaveSweep::new(),
                sparkles,
                transition,
                raster: None,
            },
            surface,
            on_show: None,
            on_hide: None,
            pending_show: None,
            pending_hide: None,
        }
    }

    /// Resume frame production. The next frame measures its delta from
    /// its own timestamp, so time spent stopped is skipped.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.state.clock.restart();
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one frame at timestamp `now` (ms): clocks, sweep, collapse,
    /// then draw. Returns false without doing anything while stopped.
    pub fn advance_and_render(&mut self, now: f64) -> bool {
        if !self.running {
            return false;
        }

        let delta = self.state.clock.tick(now, self.config.animation_speed);

        if let EffectKind::Wave(_) = self.config.effect.kind {
            let finished = self.state.sweep.advance(
                now,
                delta,
                &self.config.effect,
                &self.geometry,
                &mut self.rng,
            );
            if finished {
                self.state
                    .sparkles
                    .regenerate(&self.geometry, self.config.effect.chance, &mut self.rng);
            }
        }

        let event = self
            .state
            .transition
            .advance(self.config.collapse_speed, self.config.collapse_wave_width);
        if let Some(event) = event {
            self.notify(event);
        }

        self.render();
        true
    }

    /// Draw one frame on demand, e.g. while stopped. Advances the clocks by
    /// a simulated 16 ms; sweep and collapse progress are left alone. The
    /// next timed frame measures its delta from here, not from the last one.
    pub fn force_frame(&mut self) {
        self.state
            .clock
            .advance(FORCED_FRAME_DELTA_MS, self.config.animation_speed);
        self.state.clock.restart();
        self.render();
    }

    fn render(&mut self) {
        let effects = EffectContext {
            noise: &self.noise,
            config: &self.config,
            grid: &self.geometry,
            radial: self.geometry.radial(),
            offset: self.offset,
            pattern_time: self.state.clock.pattern_time,
            effect_time: self.state.clock.effect_time,
            sweep: &self.state.sweep,
            sparkles: &self.state.sparkles,
            twinkle: self.tuning,
        };
        FrameCompositor::new(effects, &self.state.transition)
            .render(&mut self.surface, &mut self.state.raster);
    }

    fn notify(&mut self, event: TransitionEvent) {
        let (pending, listener) = match event {
            TransitionEvent::Shown => (self.pending_show.take(), self.on_show.as_mut()),
            TransitionEvent::Hidden => (self.pending_hide.take(), self.on_hide.as_mut()),
        };
        log::info!("Transition complete: {:?}", event);

        if let Some(callback) = pending {
            callback();
        }
        if let Some(listener) = listener {
            listener();
        }
    }

    /// Expand from the center. `on_complete` runs once when fully shown,
    /// immediately if already there.
    pub fn request_show(&mut self, on_complete: Option<Callback>) {
        self.state.transition.request_show();
        self.pending_hide = None;
        match on_complete {
            Some(callback) if self.is_visible() => callback(),
            callback => self.pending_show = callback,
        }
    }

    /// Collapse toward the center. `on_complete` runs once when fully
    /// hidden, immediately if already there.
    pub fn request_hide(&mut self, on_complete: Option<Callback>) {
        self.state.transition.request_hide();
        self.pending_show = None;
        match on_complete {
            Some(callback) if self.is_hidden() => callback(),
            callback => self.pending_hide = callback,
        }
    }

    /// Show if collapsing, hide otherwise
    pub fn toggle(&mut self, on_complete: Option<Callback>) {
        if self.is_collapsing() {
            self.request_show(on_complete);
        } else {
            self.request_hide(on_complete);
        }
    }

    pub fn on_show(&mut self, listener: impl FnMut() + 'static) {
        self.on_show = Some(Box::new(listener));
    }

    pub fn on_hide(&mut self, listener: impl FnMut() + 'static) {
        self.on_hide = Some(Box::new(listener));
    }

    /// True while heading toward (or resting at) the hidden state
    pub fn is_collapsing(&self) -> bool {
        self.state.transition.is_collapsing()
    }

    pub fn is_visible(&self) -> bool {
        self.state.transition.is_visible()
    }

    pub fn is_hidden(&self) -> bool {
        self.state.transition.is_hidden(self.config.collapse_wave_width)
    }

    /// Collapse progress, 0 (shown) to `1 + collapse_wave_width` (hidden)
    pub fn progress(&self) -> f64 {
        self.state.transition.progress()
    }

    /// Resize the surface and rebuild everything tied to the grid
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.regenerate();
        log::info!(
            "Resized to {}x{} px, {}x{} cells",
            width,
            height,
            self.geometry.cols,
            self.geometry.rows
        );
    }

    /// Replace the configuration. Grid-affecting and effect changes rebuild
    /// geometry and the sparkle set; the seed only applies at construction.
    pub fn update_config(&mut self, config: Config) {
        let config = config.sanitized();
        let regenerate = self.config.needs_regeneration(&config);
        if self.config.effect != config.effect {
            self.tuning = TwinkleTuning::from_effect(&config.effect);
        }
        self.config = config;
        if regenerate {
            self.regenerate();
        }
    }

    pub fn set_effect(&mut self, effect: EffectConfig) {
        log::info!("Effect set to {:?}", effect.kind);
        let config = Config {
            effect,
            ..self.config.clone()
        };
        self.update_config(config);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn effect(&self) -> &EffectConfig {
        &self.config.effect
    }

    #[cfg(test)]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn regenerate(&mut self) {
        let (width, height) = self.surface.size();
        self.geometry = GridGeometry::from_config(&self.config, width, height);
        self.state.raster = None;
        self.state
            .sparkles
            .regenerate(&self.geometry, self.config.effect.chance, &mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::config::{TwinkleMode, WaveMode, BACKGROUND};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seeded(tweak: impl FnOnce(&mut Config)) -> Borealis<Canvas> {
        let mut config = Config {
            seed: Some(42),
            pattern_scale: 0.05,
            ..Config::default()
        };
        tweak(&mut config);
        Borealis::new(config, Canvas::new(120, 80, BACKGROUND))
    }

    fn log_into(log: &Rc<RefCell<Vec<&'static str>>>, entry: &'static str) -> impl FnMut() + 'static {
        let log = Rc::clone(log);
        move || log.borrow_mut().push(entry)
    }

    #[test]
    fn test_hide_completes_in_one_step() {
        let mut b = seeded(|c| {
            c.collapse_speed = 1.0;
            c.collapse_wave_width = 0.0;
        });
        let log = Rc::new(RefCell::new(Vec::new()));
        b.request_hide(Some(Box::new(log_into(&log, "callback"))));
        assert!(!b.is_hidden());

        b.advance_and_render(0.0);
        assert_eq!(b.progress(), 1.0);
        assert!(b.is_hidden());
        assert!(!b.is_visible());

        b.advance_and_render(16.0);
        b.advance_and_render(32.0);
        assert_eq!(*log.borrow(), vec!["callback"]);
    }

    #[test]
    fn test_one_shot_then_listener() {
        let mut b = seeded(|c| c.collapse_speed = 0.5);
        let log = Rc::new(RefCell::new(Vec::new()));
        b.on_hide(log_into(&log, "listener"));
        b.request_hide(Some(Box::new(log_into(&log, "once"))));

        for frame in 0..10 {
            b.advance_and_render(frame as f64 * 16.0);
        }
        assert_eq!(*log.borrow(), vec!["once", "listener"]);

        // Second cycle: only the persistent listener remains
        b.request_show(None);
        for frame in 10..20 {
            b.advance_and_render(frame as f64 * 16.0);
        }
        b.request_hide(None);
        for frame in 20..30 {
            b.advance_and_render(frame as f64 * 16.0);
        }
        assert_eq!(*log.borrow(), vec!["once", "listener", "listener"]);
    }

    #[test]
    fn test_callback_for_reached_state_fires_immediately() {
        let mut b = seeded(|_| {});
        let log = Rc::new(RefCell::new(Vec::new()));
        b.request_show(Some(Box::new(log_into(&log, "shown"))));
        assert_eq!(*log.borrow(), vec!["shown"]);
    }

    #[test]
    fn test_reversal_drops_pending_callback() {
        let mut b = seeded(|c| c.collapse_speed = 0.1);
        let log = Rc::new(RefCell::new(Vec::new()));
        b.request_hide(Some(Box::new(log_into(&log, "hidden"))));
        b.advance_and_render(0.0);
        b.request_show(None);
        for frame in 1..40 {
            b.advance_and_render(frame as f64 * 16.0);
        }
        assert!(b.is_visible());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_toggle_alternates() {
        let mut b = seeded(|_| {});
        b.toggle(None);
        assert!(b.is_collapsing());
        b.toggle(None);
        assert!(!b.is_collapsing());
    }

    #[test]
    fn test_initially_hidden() {
        let mut b = seeded(|c| c.initially_hidden = true);
        assert!(b.is_hidden());
        assert_eq!(b.progress(), 1.0 + b.config().collapse_wave_width);
        // Nothing but background on screen
        b.force_frame();
        b.surface()
            .as_bytes()
            .chunks(4)
            .for_each(|px| assert_eq!(px, [13, 13, 20, 255]));
    }

    #[test]
    fn test_stopped_instance_does_nothing() {
        let mut b = seeded(|c| c.auto_start = false);
        assert!(!b.is_running());
        assert!(!b.advance_and_render(100.0));
        assert_eq!(b.state.clock, AnimationClock::new());

        b.start();
        assert!(b.advance_and_render(200.0));
        assert!(b.advance_and_render(216.0));
        assert!((b.state.clock.effect_time - 0.016).abs() < 1e-12);

        b.stop();
        assert!(!b.advance_and_render(232.0));
    }

    #[test]
    fn test_force_frame_leaves_transition_and_sweep() {
        let mut b = seeded(|c| c.auto_start = false);
        b.request_hide(None);
        b.force_frame();
        assert_eq!(b.progress(), 0.0);
        assert_eq!(b.state.sweep.position(), 0.0);
        assert!((b.state.clock.effect_time - 0.016).abs() < 1e-12);
        assert!((b.state.clock.pattern_time - 16.0 * b.config().animation_speed).abs() < 1e-18);
    }

    #[test]
    fn test_force_frame_while_running_does_not_double_count() {
        let mut b = seeded(|_| {});
        b.advance_and_render(0.0);
        b.advance_and_render(16.0);
        b.force_frame();
        b.advance_and_render(32.0);
        assert!((b.state.clock.effect_time - 0.032).abs() < 1e-12);

        b.advance_and_render(48.0);
        assert!((b.state.clock.effect_time - 0.048).abs() < 1e-12);
    }

    #[test]
    fn test_sweep_completion_regenerates_sparkles() {
        let mut b = seeded(|c| {
            c.effect.kind = EffectKind::Wave(WaveMode::Sweep);
            c.effect.speed = 1.0;
            c.effect.chance = 0.5;
        });
        let before: Vec<_> = b.geometry().cells().map(|c| b.state.sparkles.phase(c)).collect();

        b.advance_and_render(0.0);
        assert!(!b.state.sweep.is_waiting());
        b.advance_and_render(16.0);
        assert!(b.state.sweep.is_waiting());

        let after: Vec<_> = b.geometry().cells().map(|c| b.state.sparkles.phase(c)).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn test_twinkle_does_not_move_sweep() {
        let mut b = seeded(|c| c.effect.kind = EffectKind::Twinkle(TwinkleMode::Sparkle));
        b.advance_and_render(0.0);
        b.advance_and_render(500.0);
        assert_eq!(b.state.sweep.position(), 0.0);
    }

    #[test]
    fn test_resize_rebuilds_grid() {
        let mut b = seeded(|c| c.solid_pattern = true);
        b.advance_and_render(0.0);
        assert!(b.state.raster.is_some());
        let before = *b.geometry();

        b.resize(240, 40);
        assert_eq!(b.surface().size(), (240, 40));
        assert!(b.state.raster.is_none());
        assert!(b.geometry().cols > before.cols);
        assert_eq!(
            b.state.sparkles.dimensions(),
            (b.geometry().cols, b.geometry().rows)
        );
    }

    #[test]
    fn test_density_change_rebuilds_grid() {
        let mut b = seeded(|_| {});
        let cols = b.geometry().cols;
        let config = Config {
            density: 100.0,
            ..b.config().clone()
        };
        b.update_config(config);
        assert!(b.geometry().cols > cols);

        let config = Config {
            animation_speed: 0.5,
            ..b.config().clone()
        };
        let geometry = *b.geometry();
        b.update_config(config);
        assert_eq!(*b.geometry(), geometry);
    }

    #[test]
    fn test_set_effect_updates_tuning() {
        let mut b = seeded(|_| {});
        let effect = EffectConfig {
            kind: EffectKind::Twinkle(TwinkleMode::Wave),
            twinkle_speed: 100.0,
            ..b.effect().clone()
        };
        b.set_effect(effect);
        assert_eq!(b.effect().kind, EffectKind::Twinkle(TwinkleMode::Wave));
        assert!((b.tuning.speed - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_frames() {
        let mut a = seeded(|c| c.effect.kind = EffectKind::Twinkle(TwinkleMode::Combined));
        let mut b = seeded(|c| c.effect.kind = EffectKind::Twinkle(TwinkleMode::Combined));
        for frame in 0..3 {
            a.advance_and_render(frame as f64 * 16.0);
            b.advance_and_render(frame as f64 * 16.0);
        }
        assert_eq!(a.surface().as_bytes(), b.surface().as_bytes());
    }
}
