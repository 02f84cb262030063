//! Balloon kinematics and animation phases

use glam::Vec2;

use super::state::{Balloon, Field};
use crate::clamp_axis;
use crate::consts::{GRAVITY, MAX_BALLOON_SPEED, WALL_DAMPING};

/// Advance one balloon: gravity, move, bounce off the walls, clamp
pub fn integrate_balloon(balloon: &mut Balloon, width: f32, height: f32, time_scale: f32) {
    if balloon.popped {
        return;
    }

    balloon.vel.y += GRAVITY * time_scale;
    balloon.vel = balloon.vel.clamp_length_max(MAX_BALLOON_SPEED);
    balloon.pos += balloon.vel * time_scale;

    let (x, vx) = bounce_axis(balloon.pos.x, balloon.vel.x, balloon.radius, width);
    let (y, vy) = bounce_axis(balloon.pos.y, balloon.vel.y, balloon.radius, height);
    balloon.pos = Vec2::new(x, y);
    balloon.vel = Vec2::new(vx, vy);
}

/// Reflect and damp velocity on a boundary crossing, clamping the position
#[inline]
fn bounce_axis(pos: f32, vel: f32, radius: f32, extent: f32) -> (f32, f32) {
    let clamped = clamp_axis(pos, radius, extent);
    if clamped > pos {
        // Hit the low edge, must now move toward positive
        (clamped, vel.abs() * WALL_DAMPING)
    } else if clamped < pos {
        (clamped, -vel.abs() * WALL_DAMPING)
    } else {
        (pos, vel)
    }
}

/// Integrate up to `batch_size` balloons starting at the field's round-robin
/// cursor. Returns how many balloons were visited.
pub fn integrate_batch(field: &mut Field, batch_size: usize, time_scale: f32) -> usize {
    let count = field.balloons.len();
    if count == 0 || batch_size == 0 {
        return 0;
    }

    let visit = batch_size.min(count);
    let start = field.batch_cursor % count;
    let (width, height) = (field.width, field.height);

    for offset in 0..visit {
        let idx = (start + offset) % count;
        integrate_balloon(&mut field.balloons[idx], width, height, time_scale);
    }
    field.batch_cursor = (start + visit) % count;
    visit
}

/// Advance every live balloon's cosmetic oscillators
pub fn advance_animations(field: &mut Field, time_scale: f32) {
    for balloon in field.balloons.iter_mut().filter(|b| b.is_alive()) {
        balloon.anim.advance(time_scale);
    }
}
