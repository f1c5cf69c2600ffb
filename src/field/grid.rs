use crate::config::{Config, MIN_CELL_SIZE};

/// Integer cell coordinate, `0 <= x < cols`, `0 <= y < rows`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn xf(self) -> f64 {
        self.x as f64
    }

    pub fn yf(self) -> f64 {
        self.y as f64
    }
}

/// Maps a pixel area onto a cell grid. Independent of time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    /// Diameter of a dot in pixels (always > 0)
    pub cell_size: f64,
    /// Space between dots in pixels
    pub gap: f64,
    /// `cell_size + gap` (always > 0)
    pub step: f64,
    pub cols: u32,
    pub rows: u32,
}

impl GridGeometry {
    /// Build from explicit cell size and gap. Degenerate inputs are floored
    /// so the step stays positive.
    pub fn new(cell_size: f64, gap: f64, width: u32, height: u32) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        };
        let gap = if gap.is_finite() { gap.max(0.0) } else { 0.0 };
        let step = cell_size + gap;

        Self {
            cell_size,
            gap,
            step,
            cols: (width as f64 / step).ceil() as u32,
            rows: (height as f64 / step).ceil() as u32,
        }
    }

    /// Derive cell size and gap from density and dot size.
    ///
    /// Density 100 uses the min cell/gap bounds, density 10 the max ones.
    /// Dot size scales the cell from 0.3x (0) through 1x (5) to 2x (10).
    pub fn from_config(config: &Config, width: u32, height: u32) -> Self {
        let t = (100.0 - config.density) / 90.0;
        let base_cell =
            config.density_min_cell + t * (config.density_max_cell - config.density_min_cell);
        let size_multiplier = 0.3 + (config.dot_size / 10.0) * 1.7;
        let gap = config.density_min_gap + t * (config.density_max_gap - config.density_min_gap);
        Self::new(base_cell * size_multiplier, gap, width, height)
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    #[cfg(test)]
    pub fn index(&self, cell: Cell) -> usize {
        cell.y as usize * self.cols as usize + cell.x as usize
    }

    /// All cells, row-major
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |y| (0..cols).map(move |x| Cell::new(x, y)))
    }

    /// Pixel center of a cell's dot
    pub fn dot_center(&self, cell: Cell) -> (f64, f64) {
        let half = self.cell_size / 2.0;
        (cell.xf() * self.step + half, cell.yf() * self.step + half)
    }

    pub fn radial(&self) -> RadialFrame {
        RadialFrame::new(self.cols, self.rows)
    }
}

/// Grid center and center-to-corner distance, in cell units.
/// Shared by the dead-zone fade and the collapse wipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialFrame {
    pub center_x: f64,
    pub center_y: f64,
    /// Distance from center to a grid corner
    pub corner: f64,
}

impl RadialFrame {
    pub fn new(cols: u32, rows: u32) -> Self {
        let center_x = cols as f64 / 2.0;
        let center_y = rows as f64 / 2.0;
        Self {
            center_x,
            center_y,
            corner: (center_x * center_x + center_y * center_y).sqrt(),
        }
    }

    pub fn distance(&self, cell: Cell) -> f64 {
        let dx = cell.xf() - self.center_x;
        let dy = cell.yf() - self.center_y;
        (dx * dx + dy * dy).sqrt()
    }
}
