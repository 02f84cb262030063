//! Pointer hit-testing against balloons

use glam::Vec2;

use crate::sim::{Balloon, BalloonId};

/// Topmost live balloon containing `point`, if any.
///
/// Balloons are drawn in insertion order, so the last one drawn is on top:
/// scan back to front.
pub fn hit_test(balloons: &[Balloon], point: Vec2) -> Option<BalloonId> {
    balloons
        .iter()
        .rev()
        .find(|b| b.is_alive() && b.contains(point))
        .map(|b| b.id)
}

/// Convert a client-space pointer position into surface CSS coordinates
#[inline]
pub fn client_to_surface(client: Vec2, surface_origin: Vec2) -> Vec2 {
    client - surface_origin
}
