//! Entity store and core simulation types
//!
//! Balloons are created once and never removed: popping only flips a flag, so
//! a balloon's id is always its index in `Field::balloons`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use crate::clamp_axis;
use crate::color::Rgb;
use crate::consts::*;

/// Stable balloon identifier (equal to its index in the store)
pub type BalloonId = u32;

/// A phase/speed/amplitude triple driving one cosmetic animation channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    /// Current phase (radians, kept in [0, TAU))
    pub phase: f32,
    /// Phase advance per reference tick
    pub speed: f32,
    pub amplitude: f32,
}

impl Oscillator {
    pub const STILL: Oscillator = Oscillator {
        phase: 0.0,
        speed: 0.0,
        amplitude: 0.0,
    };

    pub fn advance(&mut self, time_scale: f32) {
        self.phase = (self.phase + self.speed * time_scale).rem_euclid(std::f32::consts::TAU);
    }

    /// Current offset in `[-amplitude, amplitude]`
    #[inline]
    pub fn value(&self) -> f32 {
        self.phase.sin() * self.amplitude
    }
}

/// Animation state for a balloon; feeds the renderer only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalloonAnimation {
    /// Vertical float bob (px)
    pub bob: Oscillator,
    /// Tilt (radians)
    pub rotation: Oscillator,
    /// Scale pulse (fraction of size)
    pub pulse: Oscillator,
    /// Lateral sway (px)
    pub sway: Oscillator,
    /// Shade cycle (fraction toward white/black)
    pub color_cycle: Oscillator,
}

impl BalloonAnimation {
    pub const STILL: BalloonAnimation = BalloonAnimation {
        bob: Oscillator::STILL,
        rotation: Oscillator::STILL,
        pulse: Oscillator::STILL,
        sway: Oscillator::STILL,
        color_cycle: Oscillator::STILL,
    };

    fn random(rng: &mut Pcg32) -> Self {
        let mut osc = |speed: (f32, f32), amplitude: (f32, f32)| Oscillator {
            phase: rng.random_range(0.0..std::f32::consts::TAU),
            speed: rng.random_range(speed.0..speed.1),
            amplitude: rng.random_range(amplitude.0..amplitude.1),
        };
        Self {
            bob: osc((0.02, 0.05), (3.0, 8.0)),
            rotation: osc((0.01, 0.03), (0.03, 0.1)),
            pulse: osc((0.03, 0.06), (0.01, 0.04)),
            sway: osc((0.01, 0.03), (2.0, 6.0)),
            color_cycle: osc((0.005, 0.02), (0.05, 0.12)),
        }
    }

    pub fn advance(&mut self, time_scale: f32) {
        self.bob.advance(time_scale);
        self.rotation.advance(time_scale);
        self.pulse.advance(time_scale);
        self.sway.advance(time_scale);
        self.color_cycle.advance(time_scale);
    }
}

/// A balloon entity
#[derive(Debug, Clone)]
pub struct Balloon {
    pub id: BalloonId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Rgb,
    /// Phoneme symbol drawn on the balloon
    pub label: String,
    /// Uniform size factor derived from the surface width
    pub size_scale: f32,
    pub anim: BalloonAnimation,
    pub popped: bool,
    /// Host timestamp (ms) of the pop
    pub popped_at: Option<f64>,
}

impl Balloon {
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.popped
    }

    /// Where the body is painted: the physics position plus sway and bob
    #[inline]
    pub fn drawn_center(&self) -> Vec2 {
        self.pos + Vec2::new(self.anim.sway.value(), self.anim.bob.value())
    }

    #[inline]
    pub fn drawn_scale(&self) -> f32 {
        1.0 + self.anim.pulse.value()
    }

    /// Point-in-circle test against the body as it is drawn, so a tap lands
    /// on what the player sees
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        self.drawn_center().distance(point) < self.radius * self.drawn_scale()
    }

    /// Keep the balloon fully inside the surface
    pub fn clamp_to(&mut self, width: f32, height: f32) {
        self.pos.x = clamp_axis(self.pos.x, self.radius, width);
        self.pos.y = clamp_axis(self.pos.y, self.radius, height);
    }
}

/// A short-lived cosmetic particle from a popped balloon
#[derive(Debug, Clone)]
pub struct Fragment {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Added to `vel.y` every tick
    pub gravity: f32,
    pub size: f32,
    pub color: Rgb,
    /// 1.0 at spawn, removed once <= 0
    pub life: f32,
}

impl Fragment {
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.life.max(0.0)
    }
}

/// Construction parameters supplied by the host page
#[derive(Debug, Clone)]
pub struct FieldConfig {
    pub balloon_count: usize,
    /// Surface size in CSS pixels
    pub width: f32,
    pub height: f32,
    /// Phoneme symbols, assigned by `index % len`
    pub labels: Vec<String>,
    /// Hex colors, assigned by `index % len`
    pub colors: Vec<String>,
    /// Run the cosmetic bob/sway/rotation/pulse/shade animations
    pub animate: bool,
    pub seed: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            balloon_count: 12,
            width: 800.0,
            height: 600.0,
            labels: ["P", "B", "T", "D", "K", "G"].map(String::from).to_vec(),
            colors: ["#ff6b6b", "#4ecdc4", "#ffd93d", "#6c5ce7", "#a8e6cf"]
                .map(String::from)
                .to_vec(),
            animate: true,
            seed: 0,
        }
    }
}

/// Replace NaN/negative surface extents with zero
pub fn sanitize_extent(value: f32, what: &str) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("Invalid surface {}: {}, using 0", what, value);
        0.0
    }
}

/// Uniform balloon scale for a surface width (phones get smaller balloons)
pub fn size_scale_for_width(width: f32) -> f32 {
    (width / FULL_SCALE_WIDTH).clamp(MIN_SIZE_SCALE, 1.0)
}

/// The entity store: every balloon and fragment, plus the session RNG
#[derive(Debug, Clone)]
pub struct Field {
    pub width: f32,
    pub height: f32,
    pub balloons: Vec<Balloon>,
    /// Oldest first
    pub fragments: Vec<Fragment>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Next balloon the integrator's round-robin batch starts at
    pub batch_cursor: usize,
    pub rng: Pcg32,
}

impl Field {
    /// Build the balloon population. Malformed input degrades instead of failing:
    /// a zero count gives an inert field, bad colors fall back to a default.
    pub fn new(config: &FieldConfig) -> Self {
        let width = sanitize_extent(config.width, "width");
        let height = sanitize_extent(config.height, "height");
        let mut rng = Pcg32::seed_from_u64(config.seed);

        if config.balloon_count == 0 {
            log::warn!("Balloon count is 0, field will be empty");
        }
        if config.labels.is_empty() {
            log::warn!("Empty label pool, balloons will be unlabeled");
        }
        if config.colors.is_empty() {
            log::warn!("Empty color pool, using {}", DEFAULT_BALLOON_COLOR);
        }

        let palette = resolve_palette(&config.colors);
        let size_scale = size_scale_for_width(width);
        let radius = BASE_BALLOON_RADIUS * size_scale;

        let balloons = (0..config.balloon_count)
            .map(|i| {
                let label = if config.labels.is_empty() {
                    String::new()
                } else {
                    config.labels[i % config.labels.len()].clone()
                };
                let color = palette[i % palette.len()];

                let pos = Vec2::new(
                    clamp_axis(rng.random_range(0.0..=1.0) * width, radius, width),
                    clamp_axis(rng.random_range(0.0..=1.0) * height, radius, height),
                );
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let speed = rng.random_range(0.3..=1.0) * BALLOON_START_SPEED;
                let vel = Vec2::new(angle.cos(), angle.sin()) * speed;

                let anim = if config.animate {
                    BalloonAnimation::random(&mut rng)
                } else {
                    BalloonAnimation::STILL
                };

                Balloon {
                    id: i as BalloonId,
                    pos,
                    vel,
                    radius,
                    color,
                    label,
                    size_scale,
                    anim,
                    popped: false,
                    popped_at: None,
                }
            })
            .collect();

        Self {
            width,
            height,
            balloons,
            fragments: Vec::new(),
            time_ticks: 0,
            batch_cursor: 0,
            rng,
        }
    }

    pub fn balloon(&self, id: BalloonId) -> Option<&Balloon> {
        self.balloons.get(id as usize)
    }

    /// Flag a balloon as popped. Returns false if it was already popped or
    /// does not exist, so callers can make popping idempotent.
    pub fn pop(&mut self, id: BalloonId, now_ms: f64) -> bool {
        match self.balloons.get_mut(id as usize) {
            Some(balloon) if balloon.is_alive() => {
                balloon.popped = true;
                balloon.popped_at = Some(now_ms);
                true
            }
            _ => false,
        }
    }

    pub fn alive_count(&self) -> usize {
        self.balloons.iter().filter(|b| b.is_alive()).count()
    }

    /// True once every balloon has been popped (also for an empty field)
    pub fn all_popped(&self) -> bool {
        self.balloons.iter().all(|b| b.popped)
    }

    /// Change the surface bounds and pull every balloon back inside
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.width = sanitize_extent(width, "width");
        self.height = sanitize_extent(height, "height");
        for balloon in &mut self.balloons {
            balloon.clamp_to(self.width, self.height);
        }
    }
}

fn resolve_palette(colors: &[String]) -> Vec<Rgb> {
    let fallback = Rgb::parse(DEFAULT_BALLOON_COLOR).unwrap_or(Rgb::new(255, 107, 107));
    if colors.is_empty() {
        return vec![fallback];
    }
    colors
        .iter()
        .map(|c| {
            Rgb::parse(c).unwrap_or_else(|e| {
                log::warn!("{}, using {}", e, DEFAULT_BALLOON_COLOR);
                fallback
            })
        })
        .collect()
}
