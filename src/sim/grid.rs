//! Uniform spatial grid for balloon neighbor queries.
//!
//! Each live balloon is stored in exactly one cell, keyed by
//! `(floor(x / cell_size), floor(y / cell_size))`. Queries return a single
//! cell; collision code walks the 3×3 neighborhood itself, which is enough as
//! long as `cell_size` is at least one balloon diameter.

use std::collections::HashMap;

use glam::Vec2;

use super::state::Balloon;

/// Cell coordinates
pub type CellKey = (i32, i32);

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    /// Map from cell coordinates to balloon indices
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    /// `cell_size` is clamped to at least 1px
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() { cell_size.max(1.0) } else { 1.0 };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Grid sized so every overlapping pair shares a 3×3 neighborhood
    pub fn for_balloons(cell_size: f32, balloons: &[Balloon]) -> Self {
        let max_diameter = balloons
            .iter()
            .map(|b| b.radius * 2.0)
            .fold(0.0_f32, f32::max);
        Self::new(cell_size.max(max_diameter))
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing a position
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> CellKey {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Clear and reinsert every non-popped balloon
    pub fn rebuild(&mut self, balloons: &[Balloon]) {
        self.clear();
        for (idx, balloon) in balloons.iter().enumerate() {
            if balloon.is_alive() {
                let cell = self.cell_of(balloon.pos);
                self.cells.entry(cell).or_default().push(idx);
            }
        }
        // Drop cells left empty by this rebuild
        self.cells.retain(|_, v| !v.is_empty());
    }

    /// Empty every cell, keeping the allocations for the next rebuild
    pub fn clear(&mut self) {
        for v in self.cells.values_mut() {
            v.clear();
        }
    }

    /// Balloon indices in exactly this cell
    pub fn neighbors(&self, cell_x: i32, cell_y: i32) -> &[usize] {
        self.cells
            .get(&(cell_x, cell_y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|v| !v.is_empty()).count()
    }
}
