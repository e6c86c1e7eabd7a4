//! Uniform cell grid bounding the cost of pair evaluation.
//!
//! Cells are sized to at most half the smallest interaction separation and store any
//! number of occupants (counting-sort layout: one contiguous run of particle indices per
//! cell). Cell coordinates wrap modulo the grid extent so the same build and query work
//! for periodic and walled boxes.

use crate::core::geometry::Rect;
use crate::core::particle::Particle;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cols: usize,
    rows: usize,
    dx: f64,
    dy: f64,
    /// Distance beyond which no interaction acts.
    interaction_range: f64,
    cutoff_factor: f64,
    /// `cell_start[c]..cell_start[c + 1]` indexes `entries` for cell `c`.
    cell_start: Vec<usize>,
    entries: Vec<usize>,
    /// Scratch buffer for candidate pairs, reused across sub-steps.
    pairs: Vec<(usize, usize)>,
}

impl SpatialGrid {
    /// Size a grid for `bounds` from the smallest and largest interaction separation.
    pub fn new(bounds: &Rect, min_separation: f64, max_separation: f64, cutoff_factor: f64) -> Self {
        let max_cell_side = 0.5 * min_separation;
        let cols = ((bounds.width() / max_cell_side).ceil() as usize).max(1);
        let rows = ((bounds.height() / max_cell_side).ceil() as usize).max(1);
        Self {
            cols,
            rows,
            dx: bounds.width() / cols as f64,
            dy: bounds.height() / rows as f64,
            interaction_range: max_separation * cutoff_factor,
            cutoff_factor,
            cell_start: vec![0; cols * rows + 1],
            entries: Vec::new(),
            pairs: Vec::new(),
        }
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cell_size(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    #[inline]
    pub fn interaction_range(&self) -> f64 {
        self.interaction_range
    }

    /// Cutoff factor the interaction range was sized with.
    #[inline]
    pub fn cutoff_factor(&self) -> f64 {
        self.cutoff_factor
    }

    #[inline]
    fn cell_index(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    /// Particle indices currently bucketed in cell `(col, row)`.
    pub fn cell(&self, col: usize, row: usize) -> &[usize] {
        let c = self.cell_index(col, row);
        &self.entries[self.cell_start[c]..self.cell_start[c + 1]]
    }

    /// Re-bucket every particle and record its cell on the particle.
    pub fn rebuild(&mut self, bounds: &Rect, particles: &mut [Particle]) {
        let cells = self.cols * self.rows;
        self.cell_start.clear();
        self.cell_start.resize(cells + 1, 0);

        for p in particles.iter_mut() {
            let col = wrap_cell((p.position.x - bounds.left) / self.dx, self.cols);
            let row = wrap_cell((p.position.y - bounds.bottom) / self.dy, self.rows);
            p.grid_col = col;
            p.grid_row = row;
            let c = self.cell_index(col, row);
            self.cell_start[c + 1] += 1;
        }
        for c in 0..cells {
            self.cell_start[c + 1] += self.cell_start[c];
        }

        self.entries.clear();
        self.entries.resize(particles.len(), 0);
        let mut cursor: Vec<usize> = self.cell_start[..cells].to_vec();
        for (i, p) in particles.iter().enumerate() {
            let c = self.cell_index(p.grid_col, p.grid_row);
            self.entries[cursor[c]] = i;
            cursor[c] += 1;
        }
    }

    /// Inclusive cell-offset window along one axis.
    fn window(range: f64, side: f64, count: usize) -> (i64, i64) {
        let grid_radius = (range / side).ceil() as i64;
        let box_radius = (count as f64 - 1.0) / 2.0;
        let lo = -(box_radius.floor() as i64).min(grid_radius);
        let hi = (box_radius.ceil() as i64).min(grid_radius);
        (lo, hi)
    }

    /// Candidate pairs `(i, j)` with `j > i` whose cells lie within the interaction
    /// window. Requires a prior [`rebuild`](Self::rebuild) with the same particles.
    pub fn candidate_pairs(&mut self, particles: &[Particle]) -> &[(usize, usize)] {
        self.pairs.clear();
        let (dx_min, dx_max) = Self::window(self.interaction_range, self.dx, self.cols);
        let (dy_min, dy_max) = Self::window(self.interaction_range, self.dy, self.rows);

        for (i, p) in particles.iter().enumerate() {
            for dy in dy_min..=dy_max {
                let row = (p.grid_row as i64 + dy).rem_euclid(self.rows as i64) as usize;
                for dx in dx_min..=dx_max {
                    let col = (p.grid_col as i64 + dx).rem_euclid(self.cols as i64) as usize;
                    let c = self.cell_index(col, row);
                    for &j in &self.entries[self.cell_start[c]..self.cell_start[c + 1]] {
                        if j > i {
                            self.pairs.push((i, j));
                        }
                    }
                }
            }
        }
        &self.pairs
    }
}

#[inline]
fn wrap_cell(coord: f64, count: usize) -> usize {
    if !coord.is_finite() {
        return 0;
    }
    (coord.floor() as i64).rem_euclid(count as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vec2;
    use crate::error::Result;
    use std::collections::HashSet;

    fn particles_at(points: &[(f64, f64)]) -> Result<Vec<Particle>> {
        points
            .iter()
            .map(|&(x, y)| Particle::at(Vec2::new(x, y)))
            .collect()
    }

    fn box25() -> Rect {
        Rect::from_center_size(Vec2::zeros(), 25.0, 25.0)
    }

    #[test]
    fn cell_side_is_at_most_half_the_min_separation() {
        let grid = SpatialGrid::new(&box25(), 2.0, 2.0, 2.5);
        let (dx, dy) = grid.cell_size();
        assert!(dx <= 1.0 + 1e-12 && dy <= 1.0 + 1e-12);
        assert_eq!(grid.cols(), 25);
        assert_eq!(grid.rows(), 25);
        assert_eq!(grid.interaction_range(), 5.0);
    }

    #[test]
    fn collocated_particles_are_all_enumerated() -> Result<()> {
        let b = box25();
        let mut grid = SpatialGrid::new(&b, 2.0, 2.0, 2.5);
        let mut ps = particles_at(&[(0.1, 0.1), (0.2, 0.15), (0.3, 0.2), (0.25, 0.3)])?;
        grid.rebuild(&b, &mut ps);
        assert_eq!(grid.cell(ps[0].grid_col, ps[0].grid_row).len(), 4);

        let pairs: HashSet<(usize, usize)> = grid.candidate_pairs(&ps).iter().copied().collect();
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert!(pairs.contains(&(i, j)), "missing pair ({i}, {j})");
            }
        }
        assert_eq!(pairs.len(), 6);
        Ok(())
    }

    #[test]
    fn pairs_are_unique_even_on_tiny_grids() -> Result<()> {
        // 2x2 cells: the window covers the whole grid exactly once.
        let b = Rect::from_center_size(Vec2::zeros(), 4.0, 4.0);
        let mut grid = SpatialGrid::new(&b, 4.0, 4.0, 2.5);
        assert_eq!((grid.cols(), grid.rows()), (2, 2));
        let mut ps = particles_at(&[(-1.5, -1.5), (1.5, -1.5), (1.5, 1.5), (-1.5, 1.5), (0.5, 0.5)])?;
        grid.rebuild(&b, &mut ps);
        let pairs = grid.candidate_pairs(&ps).to_vec();
        let unique: HashSet<_> = pairs.iter().copied().collect();
        assert_eq!(pairs.len(), unique.len());
        assert_eq!(unique.len(), 10);
        Ok(())
    }

    #[test]
    fn window_wraps_across_edges() -> Result<()> {
        let b = box25();
        let mut grid = SpatialGrid::new(&b, 2.0, 2.0, 2.5);
        let mut ps = particles_at(&[(-12.3, 0.0), (12.3, 0.0), (0.0, 0.0)])?;
        grid.rebuild(&b, &mut ps);
        assert_eq!(ps[0].grid_col, 0);
        assert_eq!(ps[1].grid_col, 24);
        let pairs = grid.candidate_pairs(&ps).to_vec();
        assert!(pairs.contains(&(0, 1)));
        assert!(!pairs.contains(&(0, 2)));
        Ok(())
    }

    #[test]
    fn positions_outside_the_box_still_bucket() -> Result<()> {
        let b = box25();
        let mut grid = SpatialGrid::new(&b, 2.0, 2.0, 2.5);
        let mut ps = particles_at(&[(13.0, -13.0)])?;
        grid.rebuild(&b, &mut ps);
        assert!(ps[0].grid_col < grid.cols() && ps[0].grid_row < grid.rows());
        Ok(())
    }
}
