use rand::Rng;

use crate::field::{Cell, GridGeometry};

/// Sparse set of cells lit by the wave sweep, each with a brightness phase
/// in [0, 1). Regenerated wholesale, never edited cell by cell.
#[derive(Clone, Debug, Default)]
pub struct SparkleSet {
    cols: u32,
    rows: u32,
    phases: Vec<Option<f64>>,
}

impl SparkleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resample membership for every cell of `grid`: each cell joins with
    /// probability `chance` and gets a fresh uniform phase.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, grid: &GridGeometry, chance: f64, rng: &mut R) {
        self.cols = grid.cols;
        self.rows = grid.rows;
        self.phases.clear();
        self.phases.reserve(grid.cell_count());

        for _ in 0..grid.cell_count() {
            let phase = (rng.gen::<f64>() < chance).then(|| rng.gen::<f64>());
            self.phases.push(phase);
        }

        log::debug!(
            "Sparkle set regenerated: {} of {} cells",
            self.len(),
            grid.cell_count()
        );
    }

    /// Phase of a sparkling cell, or None when the cell is not in the set
    pub fn phase(&self, cell: Cell) -> Option<f64> {
        if cell.x >= self.cols || cell.y >= self.rows {
            return None;
        }
        let index = cell.y as usize * self.cols as usize + cell.x as usize;
        self.phases.get(index).copied().flatten()
    }

    fn len(&self) -> usize {
        self.phases.iter().flatten().count()
    }

    #[cfg(test)]
    pub fn contains(&self, cell: Cell) -> bool {
        self.phase(cell).is_some()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(cols: u32, rows: u32) -> GridGeometry {
        GridGeometry::new(4.0, 2.0, cols * 6, rows * 6)
    }

    #[test]
    fn test_empty_until_generated() {
        let set = SparkleSet::new();
        assert!(set.is_empty());
        assert!(!set.contains(Cell::new(0, 0)));
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let g = grid(20, 10);
        let mut set = SparkleSet::new();

        set.regenerate(&g, 1.0, &mut rng);
        assert_eq!(set.len(), 200);
        assert!(g.cells().all(|c| set.contains(c)));

        set.regenerate(&g, 0.0, &mut rng);
        assert!(set.is_empty());
    }

    #[test]
    fn test_phases_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(2);
        let g = grid(30, 30);
        let mut set = SparkleSet::new();
        set.regenerate(&g, 0.5, &mut rng);
        for cell in g.cells() {
            if let Some(phase) = set.phase(cell) {
                assert!((0.0..1.0).contains(&phase));
            }
        }
    }

    #[test]
    fn test_regeneration_changes_membership() {
        let mut rng = StdRng::seed_from_u64(3);
        let g = grid(40, 40);
        let mut set = SparkleSet::new();
        set.regenerate(&g, 0.08, &mut rng);
        let before: Vec<bool> = g.cells().map(|c| set.contains(c)).collect();
        set.regenerate(&g, 0.08, &mut rng);
        let after: Vec<bool> = g.cells().map(|c| set.contains(c)).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn test_out_of_grid_is_absent() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut set = SparkleSet::new();
        set.regenerate(&grid(5, 5), 1.0, &mut rng);
        assert_eq!(set.dimensions(), (5, 5));
        assert!(!set.contains(Cell::new(5, 0)));
        assert!(!set.contains(Cell::new(0, 5)));
    }
}
