//! The balloon field engine
//!
//! Owns the entity store, the spatial grid and the renderer, and exposes the
//! handful of operations a host needs: run a frame, handle a pointer press,
//! resize, reset. All mutation happens on the caller's thread between
//! frames.

use std::rc::Rc;

use glam::Vec2;

use crate::content::{ContentSlot, ContentSource, LookupState};
use crate::governor::PerformanceConfig;
use crate::interaction::hit_test;
use crate::renderer::{Renderer, Surface, SurfaceSize};
use crate::settings::Settings;
use crate::sim::{Balloon, BalloonId, Field, FieldConfig, SpatialGrid, TickReport, spawn_fragments, tick};

/// What a call to [`Engine::frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Simulated and painted
    Drawn(TickReport),
    /// The surface refused the frame; the simulation did not advance
    NotDrawn,
    /// No surface yet; nothing happened
    NoSurface,
}

type PopListener = Box<dyn FnMut(&Balloon)>;

/// Simulation + rendering for one balloon field
pub struct Engine<G> {
    field: Field,
    field_config: FieldConfig,
    grid: SpatialGrid,
    config: PerformanceConfig,
    renderer: Renderer<G>,
    content: Rc<ContentSlot>,
    source: Option<Box<dyn ContentSource>>,
    pop_listener: Option<PopListener>,
}

impl<G> Engine<G> {
    pub fn new(field_config: FieldConfig, config: PerformanceConfig) -> Self {
        let field = Field::new(&field_config);
        let grid = SpatialGrid::for_balloons(config.cell_size, &field.balloons);
        log::info!(
            "Balloon field: {} balloons on {}x{}, preset {}",
            field.balloons.len(),
            field.width,
            field.height,
            config.preset.as_str()
        );
        Self {
            field,
            field_config,
            grid,
            config,
            renderer: Renderer::new(),
            content: ContentSlot::new(),
            source: None,
            pop_listener: None,
        }
    }

    /// Build with user settings folded in (quality override, fragments,
    /// reduced motion)
    pub fn with_settings(mut field_config: FieldConfig, config: PerformanceConfig, settings: &Settings) -> Self {
        if settings.reduced_motion {
            field_config.animate = false;
        }
        Self::new(field_config, settings.apply(config))
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Direct store access for hosts that place balloons themselves
    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    pub fn renderer(&self) -> &Renderer<G> {
        &self.renderer
    }

    /// Balloons still waiting to be popped
    pub fn remaining(&self) -> usize {
        self.field.alive_count()
    }

    /// Register the "balloon popped" callback (fires synchronously)
    pub fn set_pop_listener(&mut self, listener: impl FnMut(&Balloon) + 'static) {
        self.pop_listener = Some(Box::new(listener));
    }

    pub fn set_content_source(&mut self, source: impl ContentSource + 'static) {
        self.source = Some(Box::new(source));
    }

    /// Shared lookup state; hosts attach a listener to forward changes
    pub fn content(&self) -> Rc<ContentSlot> {
        Rc::clone(&self.content)
    }

    pub fn lookup_state(&self) -> LookupState {
        self.content.state()
    }

    /// Advance the simulation by one governed tick without drawing
    pub fn step(&mut self) -> TickReport {
        tick(&mut self.field, &mut self.grid, &self.config)
    }

    /// Paint the current state
    pub fn render<S>(&mut self, surface: &mut S) -> Result<(), crate::EngineError>
    where
        S: Surface<Gradient = G>,
    {
        self.renderer.draw(surface, &self.field)
    }

    /// One governed frame: claim the surface, tick, then draw. A missing or
    /// unusable surface makes the whole frame a no-op; the host retries on
    /// the next one.
    pub fn frame<S>(&mut self, surface: Option<&mut S>) -> FrameOutcome
    where
        S: Surface<Gradient = G>,
    {
        let Some(surface) = surface else {
            return FrameOutcome::NoSurface;
        };
        if let Err(e) = surface.begin_frame() {
            log::debug!("Frame not drawn: {}", e);
            return FrameOutcome::NotDrawn;
        }
        let report = self.step();
        self.renderer.paint(surface, &self.field);
        FrameOutcome::Drawn(report)
    }

    /// Hit-test a press in surface coordinates and pop whatever is on top
    pub fn pointer_down(&mut self, point: Vec2, now_ms: f64) -> Option<BalloonId> {
        let id = hit_test(&self.field.balloons, point)?;
        self.pop(id, now_ms).then_some(id)
    }

    /// Pop a balloon: burst, callback, content lookup. Popping twice is a
    /// no-op and returns false.
    pub fn pop(&mut self, id: BalloonId, now_ms: f64) -> bool {
        if !self.field.pop(id, now_ms) {
            return false;
        }

        let idx = id as usize;
        let (origin, color) = {
            let b = &self.field.balloons[idx];
            (b.pos, b.color)
        };
        spawn_fragments(
            &mut self.field,
            origin,
            color,
            self.config.fragments_per_pop,
            self.config.max_fragments,
        );

        let balloon = &self.field.balloons[idx];
        log::debug!(
            "Popped balloon {} '{}' ({} left)",
            id,
            balloon.label,
            self.field.alive_count()
        );

        if let Some(listener) = self.pop_listener.as_mut() {
            listener(balloon);
        }

        // Nothing to look up for an unlabeled balloon
        if let Some(source) = self.source.as_ref().filter(|_| !balloon.label.is_empty()) {
            let reply = ContentSlot::begin(&self.content, &balloon.label);
            source.lookup(&balloon.label, reply);
        }

        true
    }

    /// New surface size: update bounds, pull balloons inside, drop the grid
    pub fn resize(&mut self, size: SurfaceSize) {
        self.field.set_bounds(size.css_width, size.css_height);
        self.field_config.width = self.field.width;
        self.field_config.height = self.field.height;
        self.grid.clear();
        self.grid.rebuild(&self.field.balloons);
    }

    /// Start a fresh round with the same pools and a new seed
    pub fn reset(&mut self, seed: u64) {
        self.field_config.seed = seed;
        self.field = Field::new(&self.field_config);
        self.grid = SpatialGrid::for_balloons(self.config.cell_size, &self.field.balloons);
        self.content.reset();
        log::info!("Field reset with seed {}", seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItem, StaticContentSource};
    use crate::governor::QualityPreset;
    use crate::renderer::RecordingSurface;
    use std::cell::RefCell;

    fn engine(count: usize) -> Engine<u32> {
        Engine::new(
            FieldConfig {
                balloon_count: count,
                labels: vec!["P".into(), "B".into()],
                colors: vec!["#3366ff".into()],
                animate: false,
                seed: 11,
                ..Default::default()
            },
            PerformanceConfig::from_preset(QualityPreset::Medium),
        )
    }

    #[test]
    fn test_frame_without_surface_is_noop() {
        let mut engine = engine(3);
        let before: Vec<Vec2> = engine.field().balloons.iter().map(|b| b.pos).collect();
        assert_eq!(engine.frame::<RecordingSurface>(None), FrameOutcome::NoSurface);
        let after: Vec<Vec2> = engine.field().balloons.iter().map(|b| b.pos).collect();
        assert_eq!(before, after);
        assert_eq!(engine.field().time_ticks, 0);
    }

    #[test]
    fn test_frame_with_lost_surface_is_noop() {
        let mut engine = engine(3);
        let before: Vec<Vec2> = engine.field().balloons.iter().map(|b| b.pos).collect();
        let mut surface = RecordingSurface::new();
        surface.available = false;
        assert_eq!(engine.frame(Some(&mut surface)), FrameOutcome::NotDrawn);
        let after: Vec<Vec2> = engine.field().balloons.iter().map(|b| b.pos).collect();
        assert_eq!(before, after);
        assert_eq!(engine.field().time_ticks, 0);
        assert_eq!(engine.renderer().frames_drawn(), 0);

        surface.available = true;
        assert!(matches!(engine.frame(Some(&mut surface)), FrameOutcome::Drawn(_)));
        assert_eq!(engine.field().time_ticks, 1);
        assert_eq!(engine.renderer().frames_drawn(), 1);
    }

    #[test]
    fn test_pointer_pops_once() {
        let mut engine = engine(1);
        let popped = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&popped);
        engine.set_pop_listener(move |b| seen.borrow_mut().push(b.id));

        let center = engine.field().balloons[0].pos;
        assert_eq!(engine.pointer_down(center, 5.0), Some(0));
        assert_eq!(engine.pointer_down(center, 6.0), None);
        assert!(!engine.pop(0, 7.0));

        assert_eq!(*popped.borrow(), [0]);
        assert_eq!(engine.field().fragments.len(), engine.config().fragments_per_pop);
        assert_eq!(engine.remaining(), 0);
    }

    #[test]
    fn test_pointer_miss() {
        let mut engine = engine(2);
        assert_eq!(engine.pointer_down(Vec2::new(-100.0, -100.0), 0.0), None);
        assert_eq!(engine.remaining(), 2);
        assert!(engine.field().fragments.is_empty());
    }

    #[test]
    fn test_pop_triggers_lookup() {
        let mut engine = engine(2);
        engine.set_content_source(StaticContentSource::new().with(
            "B",
            vec![ContentItem {
                id: "7".into(),
                title: "Bola".into(),
                kind: "activity".into(),
                url: None,
            }],
        ));
        assert_eq!(engine.lookup_state(), LookupState::Idle);
        assert!(engine.pop(1, 0.0));
        match engine.lookup_state() {
            LookupState::Ready { label, items } => {
                assert_eq!(label, "B");
                assert_eq!(items.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unlabeled_pop_skips_lookup() {
        let mut engine: Engine<u32> = Engine::new(
            FieldConfig {
                balloon_count: 2,
                labels: vec![],
                animate: false,
                ..Default::default()
            },
            PerformanceConfig::from_preset(QualityPreset::Medium),
        );
        engine.set_content_source(StaticContentSource::new());
        assert!(engine.field().balloons[0].label.is_empty());
        assert!(engine.pop(0, 0.0));
        assert_eq!(engine.lookup_state(), LookupState::Idle);
    }

    #[test]
    fn test_settings_fold_in() {
        let settings = Settings {
            fragments: false,
            reduced_motion: true,
            ..Default::default()
        };
        let mut engine: Engine<u32> = Engine::with_settings(
            FieldConfig {
                balloon_count: 2,
                ..Default::default()
            },
            PerformanceConfig::default(),
            &settings,
        );
        assert!(engine.pop(0, 0.0));
        assert!(engine.field().fragments.is_empty());
        assert!(
            engine
                .field()
                .balloons
                .iter()
                .all(|b| b.anim == crate::sim::BalloonAnimation::STILL)
        );
    }

    #[test]
    fn test_resize_reclamps() {
        let mut engine = engine(6);
        engine.resize(SurfaceSize::new(200.0, 150.0, 2.0));
        for b in &engine.field().balloons {
            assert!(b.pos.x >= 0.0 && b.pos.x <= 200.0);
            assert!(b.pos.y >= 0.0 && b.pos.y <= 150.0);
        }
    }

    #[test]
    fn test_reset_restores_round() {
        let mut engine = engine(3);
        engine.pop(0, 0.0);
        engine.pop(1, 0.0);
        engine.reset(99);
        assert_eq!(engine.remaining(), 3);
        assert!(engine.field().fragments.is_empty());
        assert_eq!(engine.field().time_ticks, 0);
        assert_eq!(engine.lookup_state(), LookupState::Idle);
    }
}
