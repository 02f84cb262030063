//! Per-frame simulation step
//!
//! Fixed pipeline order: integrate → (every Nth tick) grid rebuild + collision
//! pass → fragment lifecycle. Rendering happens after this, never inside it.

use super::collision::resolve_collisions;
use super::fragments::update_fragments;
use super::grid::SpatialGrid;
use super::integrate::{advance_animations, integrate_batch};
use super::state::Field;
use crate::governor::PerformanceConfig;

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Balloons visited by the integrator batch
    pub integrated: usize,
    /// Pairs corrected, if a collision pass ran this tick
    pub collisions: Option<usize>,
    /// Fragments alive after reaping
    pub fragments: usize,
}

/// Advance the field by one governed tick
pub fn tick(field: &mut Field, grid: &mut SpatialGrid, config: &PerformanceConfig) -> TickReport {
    field.time_ticks += 1;
    let time_scale = config.time_scale();

    let integrated = integrate_batch(field, config.balloon_batch_size, time_scale);
    advance_animations(field, time_scale);

    // Positions drift slowly relative to the cell size, so the grid is not
    // rebuilt every tick
    let interval = u64::from(config.grid_rebuild_interval.max(1));
    let collisions = if field.time_ticks % interval == 0 {
        grid.rebuild(&field.balloons);
        Some(resolve_collisions(field, grid))
    } else {
        None
    };

    update_fragments(
        field,
        config.max_fragments,
        config.fragment_update_budget,
        time_scale,
    );

    TickReport {
        integrated,
        collisions,
        fragments: field.fragments.len(),
    }
}
