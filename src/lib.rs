//! Balloon Field - an interactive "pop the balloon" phoneme mini-game
//!
//! Core modules:
//! - `sim`: Entity store, spatial grid, integration, collisions, fragments
//! - `governor`: One-time device assessment into fixed per-frame budgets
//! - `renderer`: Surface abstraction, gradient cache, Canvas 2D backend
//! - `scheduler`: Cooperative frame loop over an injected scheduler
//! - `engine`: Ties the pipeline together and handles pointer interaction
//! - `content`: Boundary to the phoneme content lookup service
//! - `platform`: Browser glue (signals, animation frames, visibility)

pub mod color;
pub mod content;
pub mod engine;
pub mod error;
pub mod governor;
pub mod interaction;
pub mod platform;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sim;

pub use color::Rgb;
pub use engine::Engine;
pub use error::EngineError;
pub use governor::{DeviceSignals, PerformanceConfig, QualityPreset, derive_config};
pub use settings::Settings;

/// Simulation tuning constants
///
/// Velocities are in CSS pixels per reference tick (one 60 Hz frame).
pub mod consts {
    /// Duration of the reference tick all velocities are expressed in
    pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

    /// Persistent downward acceleration applied to balloons (px/tick²)
    pub const GRAVITY: f32 = 0.05;
    /// Velocity multiplier applied on wall bounce
    pub const WALL_DAMPING: f32 = 0.8;
    /// Hard cap on balloon speed (px/tick)
    pub const MAX_BALLOON_SPEED: f32 = 12.0;
    /// Launch speed range for freshly placed balloons (px/tick)
    pub const BALLOON_START_SPEED: f32 = 1.5;

    /// Balloon radius at size_scale 1.0
    pub const BASE_BALLOON_RADIUS: f32 = 40.0;
    /// Surface width at which size_scale reaches 1.0
    pub const FULL_SCALE_WIDTH: f32 = 1200.0;
    /// Smallest allowed size_scale (phones)
    pub const MIN_SIZE_SCALE: f32 = 0.6;

    /// Below this distance the separation axis is not normalized
    pub const MIN_SEPARATION_DISTANCE: f32 = 0.01;
    /// Share of the closing speed kept (reversed) when two balloons touch
    pub const BALLOON_RESTITUTION: f32 = 0.3;
    /// Most sweeps one collision pass makes over the grid
    pub const COLLISION_ITERATIONS: usize = 4;

    /// Fragment gravity (px/tick²)
    pub const FRAGMENT_GRAVITY: f32 = 0.15;
    /// Life lost by every fragment each tick
    pub const FRAGMENT_LIFE_DECAY: f32 = 1.0 / 32.0;
    /// Fragment launch speed range (px/tick)
    pub const FRAGMENT_MIN_SPEED: f32 = 2.0;
    pub const FRAGMENT_MAX_SPEED: f32 = 6.0;
    /// Extra upward velocity so bursts "pop" upward
    pub const FRAGMENT_UPWARD_KICK: f32 = 2.0;
    /// Fragment size range (px)
    pub const FRAGMENT_MIN_SIZE: f32 = 2.0;
    pub const FRAGMENT_MAX_SIZE: f32 = 6.0;

    /// Fallback color when the pool is empty or a color fails to parse
    pub const DEFAULT_BALLOON_COLOR: &str = "#ff6b6b";
}

/// Clamp a coordinate so a circle of `radius` stays inside `[0, extent]`.
///
/// When the extent is smaller than the diameter the center is pinned to the
/// middle, which still satisfies `0 <= v <= extent`.
#[inline]
pub fn clamp_axis(value: f32, radius: f32, extent: f32) -> f32 {
    let lo = radius.min(extent * 0.5);
    let hi = (extent - radius).max(lo);
    value.clamp(lo, hi)
}
