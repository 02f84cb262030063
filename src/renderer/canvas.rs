//! Canvas 2D backend (wasm32 only)

use std::f64::consts::TAU;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

use super::gradient::GradientStop;
use super::{Surface, SurfaceSize};
use crate::color::Rgb;
use crate::error::EngineError;

/// A mounted `<canvas>` and its 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: SurfaceSize,
}

impl CanvasSurface {
    /// Acquire the 2D context and size the backing buffer for `dpr`.
    ///
    /// Fails if the canvas has no layout yet or the context cannot be created;
    /// callers retry on a later frame.
    pub fn new(canvas: &HtmlCanvasElement, dpr: f32) -> Result<Self, EngineError> {
        if !canvas.is_connected() {
            return Err(EngineError::surface("canvas is not in the document"));
        }
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| EngineError::surface(format!("getContext failed: {:?}", e)))?
            .ok_or_else(|| EngineError::surface("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| EngineError::surface("context is not a CanvasRenderingContext2d"))?;

        let mut surface = Self {
            canvas: canvas.clone(),
            ctx,
            size: SurfaceSize::new(0.0, 0.0, dpr),
        };
        surface.sync_size(dpr);
        if surface.size.css_width <= 0.0 || surface.size.css_height <= 0.0 {
            return Err(EngineError::surface("canvas has no layout size yet"));
        }
        Ok(surface)
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Re-read the layout size. Resizes the backing buffer to
    /// `display × dpr` and returns true when anything changed.
    pub fn sync_size(&mut self, dpr: f32) -> bool {
        let size = SurfaceSize::new(
            self.canvas.client_width() as f32,
            self.canvas.client_height() as f32,
            dpr,
        );
        if size == self.size {
            return false;
        }
        let (w, h) = size.backing_size();
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        log::info!(
            "Canvas {}x{} css @ {:.2}x -> {}x{} backing",
            size.css_width,
            size.css_height,
            size.dpr,
            w,
            h
        );
        self.size = size;
        true
    }
}

impl Surface for CanvasSurface {
    type Gradient = CanvasGradient;

    fn begin_frame(&mut self) -> Result<(), EngineError> {
        if !self.canvas.is_connected() {
            return Err(EngineError::surface("canvas was removed from the document"));
        }
        let dpr = self.size.dpr as f64;
        // Draw in CSS pixels; the backing buffer is dpr times larger
        self.ctx
            .set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)
            .map_err(|e| EngineError::surface(format!("setTransform failed: {:?}", e)))?;
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.size.css_width as f64,
            self.size.css_height as f64,
        );
        Ok(())
    }

    fn create_balloon_gradient(&mut self, radius: f32, stops: &[GradientStop]) -> Option<CanvasGradient> {
        let r = radius as f64;
        // Highlight sits up and to the left of center
        let gradient = self
            .ctx
            .create_radial_gradient(-r * 0.3, -r * 0.3, r * 0.1, 0.0, 0.0, r)
            .ok()?;
        for stop in stops {
            gradient
                .add_color_stop(stop.offset, &stop.color.to_css(1.0))
                .ok()?;
        }
        Some(gradient)
    }

    fn push_transform(&mut self, translate: Vec2, rotation: f32, scale: f32) {
        self.ctx.save();
        let _ = self.ctx.translate(translate.x as f64, translate.y as f64);
        let _ = self.ctx.rotate(rotation as f64);
        let _ = self.ctx.scale(scale as f64, scale as f64);
    }

    fn pop_transform(&mut self) {
        self.ctx.restore();
    }

    fn fill_gradient_circle(&mut self, center: Vec2, radius: f32, gradient: &CanvasGradient) {
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU);
        self.ctx.set_fill_style_canvas_gradient(gradient);
        self.ctx.fill();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: f32) {
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU);
        self.ctx.set_fill_style_str(&color.to_css(alpha));
        self.ctx.fill();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgb, width: f32) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.set_stroke_style_str(&color.to_css(1.0));
        self.ctx.set_line_width(width as f64);
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, at: Vec2, size_px: f32, color: Rgb) {
        self.ctx.set_font(&format!("bold {:.0}px sans-serif", size_px));
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(&color.to_css(1.0));
        let _ = self.ctx.fill_text(text, at.x as f64, at.y as f64);
    }
}
