//! In-memory surface that records draw calls
//!
//! Used by the native host and by tests; no browser required.

use glam::Vec2;

use super::Surface;
use super::gradient::GradientStop;
use crate::color::Rgb;
use crate::error::EngineError;

/// One recorded drawing operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    PushTransform {
        translate: Vec2,
        rotation: f32,
        scale: f32,
    },
    PopTransform,
    GradientCircle {
        center: Vec2,
        radius: f32,
        gradient: u32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgb,
        alpha: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Rgb,
    },
    Text {
        text: String,
        at: Vec2,
        size_px: f32,
    },
}

/// Records the calls of the most recent frame
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    /// Calls since the last `begin_frame`
    pub calls: Vec<DrawCall>,
    /// Emulates an unmounted surface when false
    pub available: bool,
    /// Frames successfully begun
    pub frames: u64,
    gradients_created: u32,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            available: true,
            frames: 0,
            gradients_created: 0,
        }
    }

    pub fn gradients_created(&self) -> u32 {
        self.gradients_created
    }

    /// Labels drawn this frame, in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }
}

impl Surface for RecordingSurface {
    type Gradient = u32;

    fn begin_frame(&mut self) -> Result<(), EngineError> {
        if !self.available {
            return Err(EngineError::surface("recording surface detached"));
        }
        self.calls.clear();
        self.calls.push(DrawCall::Clear);
        self.frames += 1;
        Ok(())
    }

    fn create_balloon_gradient(&mut self, _radius: f32, _stops: &[GradientStop]) -> Option<u32> {
        self.gradients_created += 1;
        Some(self.gradients_created)
    }

    fn push_transform(&mut self, translate: Vec2, rotation: f32, scale: f32) {
        self.calls.push(DrawCall::PushTransform {
            translate,
            rotation,
            scale,
        });
    }

    fn pop_transform(&mut self) {
        self.calls.push(DrawCall::PopTransform);
    }

    fn fill_gradient_circle(&mut self, center: Vec2, radius: f32, gradient: &u32) {
        self.calls.push(DrawCall::GradientCircle {
            center,
            radius,
            gradient: *gradient,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: f32) {
        self.calls.push(DrawCall::Circle {
            center,
            radius,
            color,
            alpha,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgb, _width: f32) {
        self.calls.push(DrawCall::Line { from, to, color });
    }

    fn fill_text(&mut self, text: &str, at: Vec2, size_px: f32, _color: Rgb) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            at,
            size_px,
        });
    }
}
