//! Balloon field rendering
//!
//! The renderer draws through the [`Surface`] trait so the same code paints a
//! Canvas 2D context in the browser and a [`RecordingSurface`] in tests.
//! Drawing reads the field and never mutates it.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod gradient;
pub mod recording;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
pub use gradient::{GradientCache, GradientKey, GradientStop, balloon_stops, shade_level};
pub use recording::{DrawCall, RecordingSurface};

use glam::Vec2;

use crate::color::Rgb;
use crate::error::EngineError;
use crate::sim::{Balloon, Field};
use gradient::SHADE_STEP;

/// Balloon string color
const STRING_COLOR: Rgb = Rgb::new(120, 120, 120);
/// String length relative to radius
const STRING_LENGTH: f32 = 0.8;
/// Knot radius relative to balloon radius
const KNOT_SCALE: f32 = 0.12;
/// Label font size relative to radius
const LABEL_SCALE: f32 = 0.8;

/// Drawing operations the renderer needs from a backend
pub trait Surface {
    /// Backend gradient handle (e.g. `CanvasGradient`)
    type Gradient;

    /// Prepare a new frame (clear, reset transform). An error means the
    /// surface is unusable right now and nothing should be drawn.
    fn begin_frame(&mut self) -> Result<(), EngineError>;

    /// Build a radial balloon gradient centered on the local origin
    fn create_balloon_gradient(&mut self, radius: f32, stops: &[GradientStop]) -> Option<Self::Gradient>;

    /// Save state, then translate → rotate → uniformly scale
    fn push_transform(&mut self, translate: Vec2, rotation: f32, scale: f32);

    /// Restore the state saved by the matching `push_transform`
    fn pop_transform(&mut self);

    fn fill_gradient_circle(&mut self, center: Vec2, radius: f32, gradient: &Self::Gradient);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: f32);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgb, width: f32);

    /// Centered text
    fn fill_text(&mut self, text: &str, at: Vec2, size_px: f32, color: Rgb);
}

/// Display size in CSS pixels plus the device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub css_width: f32,
    pub css_height: f32,
    pub dpr: f32,
}

impl SurfaceSize {
    pub fn new(css_width: f32, css_height: f32, dpr: f32) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        Self {
            css_width,
            css_height,
            dpr,
        }
    }

    /// Backing buffer size: display size × devicePixelRatio
    pub fn backing_size(&self) -> (u32, u32) {
        let scale = |v: f32| {
            if v.is_finite() {
                (v * self.dpr).round().max(0.0) as u32
            } else {
                0
            }
        };
        (scale(self.css_width), scale(self.css_height))
    }
}

/// Paints balloons and fragments, memoizing gradients per visual key
#[derive(Debug)]
pub struct Renderer<G> {
    gradients: GradientCache<G>,
    frames_drawn: u64,
}

impl<G> Default for Renderer<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> Renderer<G> {
    pub fn new() -> Self {
        Self {
            gradients: GradientCache::new(),
            frames_drawn: 0,
        }
    }

    pub fn gradients(&self) -> &GradientCache<G> {
        &self.gradients
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Drop cached gradients (the drawing context changed)
    pub fn reset_cache(&mut self) {
        self.gradients.clear();
    }

    /// Draw one frame: clear, every live balloon, then every fragment
    pub fn draw<S>(&mut self, surface: &mut S, field: &Field) -> Result<(), EngineError>
    where
        S: Surface<Gradient = G>,
    {
        surface.begin_frame()?;
        self.paint(surface, field);
        Ok(())
    }

    /// Paint onto a surface whose frame has already begun
    pub fn paint<S>(&mut self, surface: &mut S, field: &Field)
    where
        S: Surface<Gradient = G>,
    {
        for balloon in field.balloons.iter().filter(|b| b.is_alive()) {
            self.draw_balloon(surface, balloon);
        }

        for fragment in &field.fragments {
            let alpha = fragment.alpha();
            if alpha > 0.0 {
                surface.fill_circle(fragment.pos, fragment.size, fragment.color, alpha);
            }
        }

        self.frames_drawn += 1;
    }

    fn draw_balloon<S>(&mut self, surface: &mut S, balloon: &Balloon)
    where
        S: Surface<Gradient = G>,
    {
        let anim = &balloon.anim;
        let r = balloon.radius;
        let center = balloon.drawn_center();
        let scale = balloon.drawn_scale();

        let shade = shade_level(anim.color_cycle.value());
        let body = balloon.color.shade(shade as f32 * SHADE_STEP);

        surface.push_transform(center, anim.rotation.value(), scale);

        surface.stroke_line(
            Vec2::new(0.0, r),
            Vec2::new(0.0, r * (1.0 + STRING_LENGTH)),
            STRING_COLOR,
            1.5 * balloon.size_scale,
        );

        let key = GradientKey::new(body, r);
        match self
            .gradients
            .get_or_create(key, || surface.create_balloon_gradient(r, &balloon_stops(body)))
        {
            Some(gradient) => surface.fill_gradient_circle(Vec2::ZERO, r, gradient),
            // Flat fill beats drawing nothing
            None => surface.fill_circle(Vec2::ZERO, r, body, 1.0),
        }

        surface.fill_circle(Vec2::new(0.0, r), r * KNOT_SCALE, body.shade(-0.3), 1.0);

        if !balloon.label.is_empty() {
            surface.fill_text(&balloon.label, Vec2::ZERO, r * LABEL_SCALE, Rgb::WHITE);
        }

        surface.pop_transform();
    }
}
