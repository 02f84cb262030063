//! Pop fragments: spawn, decay, reap
//!
//! The fragment population is the only thing that grows with player input,
//! so every entry point enforces the cap (oldest trimmed first).

use glam::Vec2;
use rand::Rng;

use super::state::{Field, Fragment};
use crate::color::Rgb;
use crate::consts::*;

/// Drop the oldest fragments until at most `cap` remain. Returns how many
/// were dropped.
pub fn trim_to_cap(fragments: &mut Vec<Fragment>, cap: usize) -> usize {
    let excess = fragments.len().saturating_sub(cap);
    if excess > 0 {
        fragments.drain(..excess);
    }
    excess
}

/// Spawn a burst of `count` fragments at `origin`. The cap holds on return.
pub fn spawn_fragments(field: &mut Field, origin: Vec2, color: Rgb, count: usize, cap: usize) {
    if count == 0 || cap == 0 {
        trim_to_cap(&mut field.fragments, cap);
        return;
    }

    // Only the newest `cap` of this burst could survive the trim anyway
    let count = count.min(cap);
    field.fragments.reserve(count);
    for _ in 0..count {
        let angle = field.rng.random_range(0.0..std::f32::consts::TAU);
        let speed = field
            .rng
            .random_range(FRAGMENT_MIN_SPEED..=FRAGMENT_MAX_SPEED);
        let vel = Vec2::new(angle.cos(), angle.sin()) * speed - Vec2::Y * FRAGMENT_UPWARD_KICK;
        let size = field
            .rng
            .random_range(FRAGMENT_MIN_SIZE..=FRAGMENT_MAX_SIZE);

        field.fragments.push(Fragment {
            pos: origin,
            vel,
            gravity: FRAGMENT_GRAVITY,
            size,
            color,
            life: 1.0,
        });
    }

    let dropped = trim_to_cap(&mut field.fragments, cap);
    if dropped > 0 {
        log::debug!("Fragment cap {} reached, dropped {} oldest", cap, dropped);
    }
}

/// Per-tick fragment update: trim to cap, integrate the newest `budget`
/// fragments, decay every fragment's life and reap the dead.
///
/// Fragments never bounce; ones that leave the surface simply fade out.
pub fn update_fragments(field: &mut Field, cap: usize, budget: usize, time_scale: f32) {
    trim_to_cap(&mut field.fragments, cap);

    let len = field.fragments.len();
    let first_moving = len.saturating_sub(budget);
    for fragment in &mut field.fragments[first_moving..] {
        fragment.vel.y += fragment.gravity * time_scale;
        fragment.pos += fragment.vel * time_scale;
    }

    for fragment in &mut field.fragments {
        fragment.life -= FRAGMENT_LIFE_DECAY;
    }
    field.fragments.retain(|f| f.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::FieldConfig;

    fn empty_field() -> Field {
        Field::new(&FieldConfig {
            balloon_count: 0,
            seed: 11,
            ..Default::default()
        })
    }

    #[test]
    fn test_spawn_inherits_origin_and_color() {
        let mut field = empty_field();
        let red = Rgb::new(255, 0, 0);
        spawn_fragments(&mut field, Vec2::new(50.0, 60.0), red, 8, 100);
        assert_eq!(field.fragments.len(), 8);
        for f in &field.fragments {
            assert_eq!(f.pos, Vec2::new(50.0, 60.0));
            assert_eq!(f.color, red);
            assert_eq!(f.life, 1.0);
            let speed = (f.vel + Vec2::Y * FRAGMENT_UPWARD_KICK).length();
            assert!(speed >= FRAGMENT_MIN_SPEED - 1e-4 && speed <= FRAGMENT_MAX_SPEED + 1e-4);
        }
    }

    #[test]
    fn test_spawn_respects_cap_oldest_first() {
        let mut field = empty_field();
        let old = Rgb::new(1, 1, 1);
        let new = Rgb::new(2, 2, 2);
        spawn_fragments(&mut field, Vec2::ZERO, old, 10, 12);
        spawn_fragments(&mut field, Vec2::ZERO, new, 10, 12);
        assert_eq!(field.fragments.len(), 12);
        assert_eq!(field.fragments.iter().filter(|f| f.color == old).count(), 2);
        // Survivors of the first burst sit at the front
        assert_eq!(field.fragments[0].color, old);
        assert_eq!(field.fragments[11].color, new);
    }

    #[test]
    fn test_zero_cap_spawns_nothing() {
        let mut field = empty_field();
        spawn_fragments(&mut field, Vec2::ZERO, Rgb::WHITE, 8, 0);
        assert!(field.fragments.is_empty());
    }

    #[test]
    fn test_life_decays_and_reaps() {
        let mut field = empty_field();
        spawn_fragments(&mut field, Vec2::ZERO, Rgb::WHITE, 4, 100);
        let ticks_to_die = (1.0 / FRAGMENT_LIFE_DECAY).ceil() as usize;

        let mut last_life = 1.0;
        for _ in 0..ticks_to_die - 1 {
            update_fragments(&mut field, 100, 100, 1.0);
            assert_eq!(field.fragments.len(), 4);
            let life = field.fragments[0].life;
            assert!(life < last_life);
            assert!((field.fragments[0].alpha() - life).abs() < f32::EPSILON);
            last_life = life;
        }
        update_fragments(&mut field, 100, 100, 1.0);
        assert!(field.fragments.is_empty());
    }

    #[test]
    fn test_budget_limits_integration_not_decay() {
        let mut field = empty_field();
        spawn_fragments(&mut field, Vec2::ZERO, Rgb::WHITE, 5, 100);
        update_fragments(&mut field, 100, 2, 1.0);
        assert!(field.fragments[..3].iter().all(|f| f.pos == Vec2::ZERO));
        assert!(field.fragments[3..].iter().all(|f| f.pos != Vec2::ZERO));
        assert!(field.fragments.iter().all(|f| f.life < 1.0));
    }

    #[test]
    fn test_fragment_gravity_pulls_down() {
        let mut field = empty_field();
        spawn_fragments(&mut field, Vec2::ZERO, Rgb::WHITE, 1, 10);
        let vy = field.fragments[0].vel.y;
        update_fragments(&mut field, 10, 10, 1.0);
        assert!((field.fragments[0].vel.y - (vy + FRAGMENT_GRAVITY)).abs() < 1e-5);
    }
}
