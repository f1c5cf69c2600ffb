use crate::config::EffectKind;
use crate::effects::EffectContext;
use crate::field::{Cell, CellSample, PatternField};
use crate::surface::{DrawSurface, PixelBuffer};
use crate::transition::CollapseTransition;

/// Combines pattern, overlay and collapse gate per cell and rasterizes
/// the result. Borrowed view over one frame's state.
pub struct FrameCompositor<'a> {
    effects: EffectContext<'a>,
    pattern: PatternField<'a>,
    transition: &'a CollapseTransition,
}

impl<'a> FrameCompositor<'a> {
    pub fn new(effects: EffectContext<'a>, transition: &'a CollapseTransition) -> Self {
        let pattern = PatternField::new(effects.noise, effects.config, effects.offset);
        Self {
            effects,
            pattern,
            transition,
        }
    }

    /// Final `(pattern, overlay)` samples for a cell, both gated by the
    /// collapse wipe
    pub fn composite(&self, cell: Cell) -> (CellSample, CellSample) {
        let radial = &self.effects.radial;
        let gate = self.transition.gate(
            radial.distance(cell),
            radial.corner,
            self.effects.config.collapse_wave_width,
        );
        if gate <= 0.0 {
            return (CellSample::EMPTY, CellSample::EMPTY);
        }

        let pattern = self.pattern.evaluate(cell, self.effects.pattern_time);
        let effect = self.effects.evaluate(cell);
        (pattern.scaled(gate), effect.scaled(gate))
    }

    /// Clear the surface and draw every cell. Solid patterns go through the
    /// cell-resolution buffer when `upscale_solid` is set; the buffer is
    /// reallocated whenever the grid dimensions no longer match it.
    pub fn render<S: DrawSurface + ?Sized>(&self, surface: &mut S, raster: &mut Option<PixelBuffer>) {
        surface.clear();

        let config = self.effects.config;
        if config.solid_pattern && config.upscale_solid {
            let grid = self.effects.grid;
            if raster.as_ref().is_some_and(|b| !b.matches(grid.cols, grid.rows)) {
                *raster = None;
            }
            let buffer = raster.get_or_insert_with(|| PixelBuffer::new(grid.cols, grid.rows));
            self.render_upscaled(surface, buffer);
        } else {
            self.render_direct(surface);
        }
    }

    /// Per-cell shapes at native resolution
    pub fn render_direct<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        let grid = self.effects.grid;
        let solid = self.effects.config.solid_pattern;
        let radius = grid.cell_size / 2.0;
        // Overlap by a pixel so rounding never opens seams between cells
        let tile = grid.step.ceil() + 1.0;

        for cell in grid.cells() {
            let (pattern, effect) = self.composite(cell);
            if pattern.opacity <= 0.0 && effect.opacity <= 0.0 {
                continue;
            }
            let (cx, cy) = grid.dot_center(cell);

            if pattern.opacity > 0.0 {
                if solid {
                    let x = (cell.xf() * grid.step).floor();
                    let y = (cell.yf() * grid.step).floor();
                    surface.fill_rect(x, y, tile, tile, pattern.color, pattern.opacity);
                } else {
                    surface.fill_circle(cx, cy, radius, pattern.color, pattern.opacity);
                }
            }
            if effect.opacity > 0.0 {
                surface.fill_circle(cx, cy, radius, effect.color, effect.opacity);
            }
        }
    }

    /// Pattern written one pixel per cell and stretched over the surface,
    /// overlays drawn on top at native resolution so they stay crisp
    pub fn render_upscaled<S: DrawSurface + ?Sized>(&self, surface: &mut S, buffer: &mut PixelBuffer) {
        let grid = self.effects.grid;
        buffer.clear();

        let mut overlays = Vec::new();
        let has_effect = self.effects.config.effect.kind != EffectKind::None;

        for cell in grid.cells() {
            let (pattern, effect) = self.composite(cell);
            if pattern.opacity > 0.0 {
                buffer.put(cell.x, cell.y, pattern.color, pattern.opacity);
            }
            if has_effect && effect.opacity > 0.0 {
                overlays.push((cell, effect));
            }
        }

        surface.draw_scaled(buffer);

        let radius = grid.cell_size / 2.0;
        for (cell, effect) in overlays {
            let (cx, cy) = grid.dot_center(cell);
            surface.fill_circle(cx, cy, radius, effect.color, effect.opacity);
        }
    }
}
