//! Browser bindings (wasm32 only)

use std::cell::Cell;

use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, EventTarget, Window};

use crate::governor::{ConnectionQuality, DeviceSignals};
use crate::scheduler::{FrameCallback, Scheduler};

/// Read touch capability, core count, connection quality and pixel ratio
pub fn detect_signals(window: &Window) -> DeviceSignals {
    let navigator = window.navigator();

    let coarse_pointer = window
        .match_media("(pointer: coarse)")
        .ok()
        .flatten()
        .is_some_and(|m| m.matches());
    let touch = navigator.max_touch_points() > 0 || coarse_pointer;

    let cores = navigator.hardware_concurrency();
    let logical_cores = (cores.is_finite() && cores >= 1.0).then_some(cores as u32);

    // navigator.connection is not in every browser (or in web-sys)
    let connection = js_sys::Reflect::get(&navigator, &JsValue::from_str("connection"))
        .ok()
        .filter(|c| c.is_object())
        .and_then(|c| js_sys::Reflect::get(&c, &JsValue::from_str("effectiveType")).ok())
        .and_then(|t| t.as_string())
        .and_then(|t| ConnectionQuality::from_effective_type(&t));

    DeviceSignals {
        touch,
        logical_cores,
        connection,
        device_pixel_ratio: window.device_pixel_ratio() as f32,
    }
}

/// `requestAnimationFrame`-backed scheduler
pub struct RafScheduler {
    window: Window,
    handle: Cell<Option<i32>>,
}

impl RafScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            handle: Cell::new(None),
        }
    }
}

impl Scheduler for RafScheduler {
    fn schedule_next(&self, callback: FrameCallback) {
        let closure = Closure::once_into_js(move |now: f64| callback(now));
        match self.window.request_animation_frame(closure.unchecked_ref()) {
            Ok(id) => self.handle.set(Some(id)),
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
    }

    fn cancel(&self) {
        if let Some(id) = self.handle.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
    }
}

/// Call `handler(visible)` whenever the document visibility changes
pub fn on_visibility_change(document: &Document, mut handler: impl FnMut(bool) + 'static) {
    let doc = document.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        handler(doc.visibility_state() != web_sys::VisibilityState::Hidden);
    });
    let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Dispatch a `CustomEvent` whose `detail` is `detail` serialized as JSON
pub fn dispatch_detail<T: Serialize>(target: &EventTarget, name: &str, detail: &T) {
    let value = match serde_json::to_string(detail) {
        Ok(json) => js_sys::JSON::parse(&json).unwrap_or(JsValue::NULL),
        Err(e) => {
            log::warn!("Could not serialize {} detail: {}", name, e);
            JsValue::NULL
        }
    };

    let init = web_sys::CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&value);
    match web_sys::CustomEvent::new_with_event_init_dict(name, &init) {
        Ok(event) => {
            let _ = target.dispatch_event(&event);
        }
        Err(e) => log::warn!("Could not create {} event: {:?}", name, e),
    }
}
