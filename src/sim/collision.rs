//! Balloon–balloon overlap resolution
//!
//! Overlapping pairs are pushed apart along the line between their centers,
//! half the overlap each, and lose the part of their relative velocity that
//! still closes the gap. Without the velocity change gravity drives a
//! resting pile straight back into the overlap between passes.

use glam::Vec2;

use super::grid::SpatialGrid;
use super::state::{Balloon, Field};
use crate::consts::{BALLOON_RESTITUTION, COLLISION_ITERATIONS, MIN_SEPARATION_DISTANCE};

/// Push two balloons apart if they overlap. Returns true if they did.
pub fn separate_pair(a: &mut Balloon, b: &mut Balloon) -> bool {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = a.radius + b.radius;
    if dist >= min_dist {
        return false;
    }

    // Exact coincidence has no direction; pick one instead of dividing by ~0
    let axis = if dist > MIN_SEPARATION_DISTANCE {
        delta / dist
    } else {
        Vec2::X
    };
    let push = axis * ((min_dist - dist) * 0.5);
    a.pos -= push;
    b.pos += push;

    let closing = (b.vel - a.vel).dot(axis);
    if closing < 0.0 {
        let impulse = axis * (-closing * 0.5 * (1.0 + BALLOON_RESTITUTION));
        a.vel -= impulse;
        b.vel += impulse;
    }
    true
}

/// One resolution pass: up to `COLLISION_ITERATIONS` sweeps over the grid's
/// 3×3 neighborhoods, stopping early once a sweep finds nothing. Returns the
/// total number of pair corrections.
pub fn resolve_collisions(field: &mut Field, grid: &SpatialGrid) -> usize {
    let mut corrected = 0;
    for _ in 0..COLLISION_ITERATIONS {
        let found = sweep(field, grid);
        if found == 0 {
            break;
        }
        corrected += found;
    }
    corrected
}

/// Each pair is handled once per sweep (lower index first)
fn sweep(field: &mut Field, grid: &SpatialGrid) -> usize {
    let (width, height) = (field.width, field.height);
    let balloons = &mut field.balloons;
    let mut corrected = 0;

    for i in 0..balloons.len() {
        if balloons[i].popped {
            continue;
        }
        let (cx, cy) = grid.cell_of(balloons[i].pos);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for &j in grid.neighbors(cx + dx, cy + dy) {
                    if j <= i || j >= balloons.len() || balloons[j].popped {
                        continue;
                    }
                    let (head, tail) = balloons.split_at_mut(j);
                    let (a, b) = (&mut head[i], &mut tail[0]);
                    if separate_pair(a, b) {
                        a.clamp_to(width, height);
                        b.clamp_to(width, height);
                        corrected += 1;
                    }
                }
            }
        }
    }

    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::FieldConfig;

    /// Field with fixed positions and radius 20 balloons
    fn field_with(positions: &[(f32, f32)]) -> Field {
        let mut field = Field::new(&FieldConfig {
            balloon_count: positions.len(),
            width: 800.0,
            height: 600.0,
            ..Default::default()
        });
        for (b, &(x, y)) in field.balloons.iter_mut().zip(positions) {
            b.pos = Vec2::new(x, y);
            b.radius = 20.0;
        }
        field
    }

    fn pass(field: &mut Field) -> usize {
        let mut grid = SpatialGrid::for_balloons(50.0, &field.balloons);
        grid.rebuild(&field.balloons);
        resolve_collisions(field, &grid)
    }

    fn distance(field: &Field, i: usize, j: usize) -> f32 {
        field.balloons[i].pos.distance(field.balloons[j].pos)
    }

    #[test]
    fn test_one_pass_separates_pair() {
        let mut field = field_with(&[(400.0, 300.0), (401.0, 300.0)]);
        let before = distance(&field, 0, 1);
        assert_eq!(pass(&mut field), 1);
        let after = distance(&field, 0, 1);
        assert!(after > before);
        assert!(after >= 40.0 - 1e-3);
        // Symmetric split
        assert!((field.balloons[0].pos.x - 380.5).abs() < 1e-3);
        assert!((field.balloons[1].pos.x - 420.5).abs() < 1e-3);
    }

    #[test]
    fn test_coincident_centers_do_not_produce_nan() {
        let mut field = field_with(&[(300.0, 300.0), (300.0, 300.0)]);
        pass(&mut field);
        for b in &field.balloons {
            assert!(b.pos.is_finite());
        }
        assert!(distance(&field, 0, 1) >= 40.0 - 1e-3);
    }

    #[test]
    fn test_converges_against_wall() {
        // Pinned against the left wall: clamping re-introduces overlap at first
        let mut field = field_with(&[(20.0, 300.0), (21.0, 300.0), (22.0, 301.0)]);
        for _ in 0..100 {
            pass(&mut field);
        }
        for i in 0..3 {
            for j in (i + 1)..3 {
                assert!(distance(&field, i, j) >= 40.0 - 0.5, "pair {i},{j} still overlaps");
            }
        }
        for b in &field.balloons {
            assert!(b.pos.x >= 0.0 && b.pos.x <= 800.0);
        }
    }

    #[test]
    fn test_far_apart_and_popped_untouched() {
        let mut field = field_with(&[(100.0, 100.0), (700.0, 500.0), (101.0, 100.0)]);
        field.pop(2, 0.0);
        assert_eq!(pass(&mut field), 0);
        assert_eq!(field.balloons[0].pos, Vec2::new(100.0, 100.0));
        assert_eq!(field.balloons[2].pos, Vec2::new(101.0, 100.0));
    }

    #[test]
    fn test_closing_velocity_is_reversed_and_damped() {
        let mut field = field_with(&[(400.0, 300.0), (430.0, 300.0)]);
        field.balloons[0].vel = Vec2::new(2.0, 0.0);
        field.balloons[1].vel = Vec2::new(-2.0, 0.0);
        pass(&mut field);

        let (a, b) = (&field.balloons[0], &field.balloons[1]);
        let separating = (b.vel - a.vel).x;
        assert!((separating - 4.0 * BALLOON_RESTITUTION).abs() < 1e-4);
        // Equal and opposite, so the pair's momentum is unchanged
        assert!((a.vel + b.vel).length() < 1e-5);
    }

    #[test]
    fn test_separating_pair_keeps_velocity() {
        let mut field = field_with(&[(400.0, 300.0), (430.0, 300.0)]);
        field.balloons[0].vel = Vec2::new(-1.0, 0.5);
        field.balloons[1].vel = Vec2::new(1.0, 0.5);
        pass(&mut field);
        assert_eq!(field.balloons[0].vel, Vec2::new(-1.0, 0.5));
        assert_eq!(field.balloons[1].vel, Vec2::new(1.0, 0.5));
    }

    #[test]
    fn test_extra_sweeps_settle_a_chain() {
        // Fixing the middle pair re-opens the outer ones; later sweeps catch it
        let mut field = field_with(&[(300.0, 300.0), (335.0, 300.0), (370.0, 300.0), (405.0, 300.0)]);
        assert!(pass(&mut field) > 3);
        for i in 0..3 {
            assert!(distance(&field, i, i + 1) >= 40.0 - 1.0, "pair {i} still overlaps");
        }
    }

    #[test]
    fn test_touching_is_not_overlap() {
        let mut field = field_with(&[(100.0, 100.0), (140.0, 100.0)]);
        assert_eq!(pass(&mut field), 0);
    }
}
