mod color;
mod grid;
mod noise;
mod pattern;

pub use color::Rgb;
pub use grid::{Cell, GridGeometry, RadialFrame};
pub use noise::NoiseField;
pub use pattern::{CellSample, PatternField};
