//! Balloon Field entry point
//!
//! In the browser this mounts the engine on `<canvas id="balloon-field">`.
//! Natively it runs a short headless session and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use serde::Serialize;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasGradient, EventTarget, HtmlCanvasElement, PageTransitionEvent, PointerEvent};

    use balloon_field::content::HttpContentSource;
    use balloon_field::engine::FrameOutcome;
    use balloon_field::interaction::client_to_surface;
    use balloon_field::platform::field_config_from_attrs;
    use balloon_field::platform::web::{RafScheduler, detect_signals, dispatch_detail, on_visibility_change};
    use balloon_field::renderer::CanvasSurface;
    use balloon_field::scheduler::FrameLoop;
    use balloon_field::{Engine, Settings, derive_config};

    const CANVAS_ID: &str = "balloon-field";
    const RESTART_ID: &str = "balloon-field-restart";

    #[derive(Serialize)]
    struct PopDetail<'a> {
        id: u32,
        label: &'a str,
        color: String,
        x: f32,
        y: f32,
    }

    #[derive(Serialize)]
    struct CompleteDetail {
        balloons: usize,
    }

    /// Everything the frame callback and input handlers share
    struct Host {
        canvas: HtmlCanvasElement,
        surface: Option<CanvasSurface>,
        engine: Engine<CanvasGradient>,
        dpr: f32,
        /// The field was built before the canvas had a layout size
        needs_layout: bool,
    }

    impl Host {
        fn frame(&mut self) {
            if let Some(surface) = self.surface.as_mut() {
                if surface.sync_size(self.dpr) {
                    self.engine.resize(surface.size());
                }
            } else {
                match CanvasSurface::new(&self.canvas, self.dpr) {
                    Ok(surface) => {
                        self.engine.resize(surface.size());
                        if self.needs_layout {
                            self.engine.reset(js_sys::Date::now() as u64);
                            self.needs_layout = false;
                        }
                        self.surface = Some(surface);
                    }
                    Err(e) => log::debug!("{}", e),
                }
            }

            if self.engine.frame(self.surface.as_mut()) == FrameOutcome::NotDrawn {
                // Re-acquire the context on the next frame
                self.surface = None;
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Balloon Field starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(CANVAS_ID)
            .ok_or("no #balloon-field canvas")?
            .dyn_into()
            .map_err(|_| "#balloon-field is not a canvas")?;

        let signals = detect_signals(&window);
        let settings = Settings::load();
        // Write back so every key exists for the page's settings panel
        settings.save();
        let config = derive_config(&signals);

        let (css_w, css_h) = (canvas.client_width() as f32, canvas.client_height() as f32);
        let field_config = field_config_from_attrs(
            |key| canvas.get_attribute(&format!("data-{}", key)),
            css_w,
            css_h,
            js_sys::Date::now() as u64,
        );
        let mut engine = Engine::with_settings(field_config, config, &settings);

        let target: EventTarget = canvas.clone().into();
        {
            let target = target.clone();
            engine.set_pop_listener(move |balloon| {
                dispatch_detail(
                    &target,
                    "balloonpopped",
                    &PopDetail {
                        id: balloon.id,
                        label: &balloon.label,
                        color: balloon.color.to_css(1.0),
                        x: balloon.pos.x,
                        y: balloon.pos.y,
                    },
                );
            });
        }
        {
            let target = target.clone();
            engine
                .content()
                .set_listener(move |state| dispatch_detail(&target, "balloon-content", state));
        }
        if let Some(url) = canvas.get_attribute("data-content-url") {
            engine.set_content_source(HttpContentSource::new(url));
        }

        let interval_ms = engine.config().frame_interval_ms;
        let host = Rc::new(RefCell::new(Host {
            canvas: canvas.clone(),
            surface: None,
            engine,
            dpr: signals.device_pixel_ratio,
            needs_layout: css_w <= 0.0 || css_h <= 0.0,
        }));

        let frame_loop = {
            let host = host.clone();
            FrameLoop::new(RafScheduler::new(window.clone()), interval_ms, move |_now| {
                host.borrow_mut().frame();
            })
        };

        setup_pointer_input(&canvas, host.clone());
        setup_restart_button(host.clone());

        if settings.pause_when_hidden {
            let frame_loop = frame_loop.clone();
            on_visibility_change(&document, move |visible| frame_loop.set_visible(visible));
        }
        setup_teardown(&window, frame_loop.clone());

        frame_loop.start();
        log::info!("Balloon Field running!");
        Ok(())
    }

    fn setup_pointer_input(canvas: &HtmlCanvasElement, host: Rc<RefCell<Host>>) {
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            let rect = canvas_clone.get_bounding_client_rect();
            let point = client_to_surface(
                Vec2::new(event.client_x() as f32, event.client_y() as f32),
                Vec2::new(rect.left() as f32, rect.top() as f32),
            );

            let Ok(mut host) = host.try_borrow_mut() else {
                return;
            };
            if host.engine.pointer_down(point, event.time_stamp()).is_some()
                && host.engine.remaining() == 0
            {
                let balloons = host.engine.field().balloons.len();
                log::info!("Round complete");
                dispatch_detail(&canvas_clone, "balloonfieldcomplete", &CompleteDetail { balloons });
            }
        });
        let _ = canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_restart_button(host: Rc<RefCell<Host>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id(RESTART_ID) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                host.borrow_mut().engine.reset(seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Cancel the pending frame when the page goes away. A page frozen into
    /// the back/forward cache is only paused and picks up again on
    /// `pageshow`. The leaked handlers keep the loop alive for the page's
    /// lifetime.
    fn setup_teardown(window: &web_sys::Window, frame_loop: FrameLoop) {
        {
            let frame_loop = frame_loop.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let persisted = event
                    .dyn_ref::<PageTransitionEvent>()
                    .is_some_and(|e| e.persisted());
                frame_loop.page_hide(persisted);
            });
            let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            frame_loop.page_show();
        });
        let _ = window.add_event_listener_with_callback("pageshow", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = web_host::run() {
        log::error!("Balloon Field failed to start: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Balloon Field (native) starting headless session...");
    headless::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use balloon_field::consts::REFERENCE_FRAME_MS;
    use balloon_field::content::{ContentItem, StaticContentSource};
    use balloon_field::renderer::RecordingSurface;
    use balloon_field::scheduler::{FrameLoop, ManualScheduler};
    use balloon_field::sim::FieldConfig;
    use balloon_field::{DeviceSignals, Engine, Settings, derive_config};

    /// Ten seconds of 60 Hz display callbacks
    const CALLBACKS: u32 = 600;
    /// Pop one balloon this often
    const POP_EVERY: u32 = 45;

    pub fn run() {
        let signals = DeviceSignals {
            logical_cores: std::thread::available_parallelism()
                .ok()
                .map(|n| n.get() as u32),
            ..Default::default()
        };
        let settings = Settings::load();
        let engine: Rc<RefCell<Engine<u32>>> = Rc::new(RefCell::new(Engine::with_settings(
            FieldConfig {
                seed: 7,
                ..Default::default()
            },
            derive_config(&signals),
            &settings,
        )));

        {
            let mut engine = engine.borrow_mut();
            engine.set_content_source(StaticContentSource::new().with(
                "P",
                vec![ContentItem {
                    id: "p-1".into(),
                    title: "Pato".into(),
                    kind: "activity".into(),
                    url: None,
                }],
            ));
            engine.content().set_listener(|state| log::info!("Content: {:?}", state));
            engine.set_pop_listener(|b| log::info!("Popped {} '{}'", b.id, b.label));
        }

        let surface = Rc::new(RefCell::new(RecordingSurface::new()));
        let scheduler = ManualScheduler::new();
        let interval_ms = engine.borrow().config().frame_interval_ms;
        let frame_loop = {
            let engine = engine.clone();
            let surface = surface.clone();
            FrameLoop::new(Rc::clone(&scheduler), interval_ms, move |_now| {
                engine.borrow_mut().frame(Some(&mut *surface.borrow_mut()));
            })
        };

        frame_loop.start();
        let mut now = 0.0;
        for n in 1..=CALLBACKS {
            scheduler.fire(now);
            if n % POP_EVERY == 0 {
                let target = engine
                    .borrow()
                    .field()
                    .balloons
                    .iter()
                    .find(|b| b.is_alive())
                    .map(|b| b.pos);
                if let Some(point) = target {
                    engine.borrow_mut().pointer_down(point, now);
                }
            }
            now += REFERENCE_FRAME_MS;
        }
        frame_loop.stop();

        let engine = engine.borrow();
        let stats = frame_loop.stats();
        log::info!(
            "{} frames run, {} callbacks skipped, {} balloons left, {} fragments live, {} gradients cached",
            stats.frames,
            stats.skipped,
            engine.remaining(),
            engine.field().fragments.len(),
            engine.renderer().gradients().len()
        );
        log::info!("Last frame issued {} draw calls", surface.borrow().calls.len());
    }
}
