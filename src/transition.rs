//! Radial show/hide wipe.
//!
//! Progress runs from 0 (fully shown) to `1 + wave_width` (fully hidden).
//! Each cell starts fading once progress passes `1 - distance / corner`, so
//! the outer edge goes first and the center last; the reverse on show.

use crate::effects::smoothstep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    /// Progress reached 0 while expanding
    Shown,
    /// Progress reached `1 + wave_width` while collapsing
    Hidden,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollapseTransition {
    progress: f64,
    collapsing: bool,
}

impl CollapseTransition {
    pub fn shown() -> Self {
        Self {
            progress: 0.0,
            collapsing: false,
        }
    }

    pub fn hidden(wave_width: f64) -> Self {
        Self {
            progress: 1.0 + wave_width,
            collapsing: true,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_collapsing(&self) -> bool {
        self.collapsing
    }

    pub fn request_show(&mut self) {
        self.collapsing = false;
    }

    pub fn request_hide(&mut self) {
        self.collapsing = true;
    }

    pub fn is_visible(&self) -> bool {
        !self.collapsing && self.progress == 0.0
    }

    pub fn is_hidden(&self, wave_width: f64) -> bool {
        self.collapsing && self.progress >= 1.0 + wave_width
    }

    /// Step progress by `speed` toward the requested end. Returns the
    /// completion event on the frame the end is first reached.
    pub fn advance(&mut self, speed: f64, wave_width: f64) -> Option<TransitionEvent> {
        let end = 1.0 + wave_width;

        if self.collapsing && self.progress < end {
            self.progress += speed;
            if self.progress >= end {
                self.progress = end;
                return Some(TransitionEvent::Hidden);
            }
        } else if !self.collapsing && self.progress > 0.0 {
            self.progress -= speed;
            if self.progress <= 0.0 {
                self.progress = 0.0;
                return Some(TransitionEvent::Shown);
            }
        }
        None
    }

    /// Opacity multiplier for a cell at `distance` from the grid center,
    /// `corner` being the center-to-corner distance.
    pub fn gate(&self, distance: f64, corner: f64, wave_width: f64) -> f64 {
        if self.progress <= 0.0 {
            return 1.0;
        }

        let normalized = if corner > 0.0 { distance / corner } else { 0.0 };
        let collapse_at = 1.0 - normalized;

        if self.progress > collapse_at + wave_width {
            0.0
        } else if self.progress > collapse_at {
            smoothstep(1.0 - (self.progress - collapse_at) / wave_width)
        } else {
            1.0
        }
    }
}
