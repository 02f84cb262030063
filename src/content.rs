//! Phoneme content lookup boundary
//!
//! Popping a balloon asks an external service for learning content linked to
//! the balloon's label. The engine only starts the request and records its
//! state. It does not cache, retry, or interpret the items.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One piece of content returned by the lookup service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// Resource type as reported by the service (activity, worksheet, ...)
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Lookup progress, forwarded to the host UI
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupState {
    #[default]
    Idle,
    Loading {
        label: String,
    },
    /// Finished; an empty list means "no content found"
    Ready {
        label: String,
        items: Vec<ContentItem>,
    },
    Failed {
        label: String,
        message: String,
    },
}

impl LookupState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LookupState::Loading { .. })
    }
}

pub type LookupListener = Box<dyn Fn(&LookupState)>;

/// Shared cell holding the latest lookup state.
///
/// Every new lookup bumps a generation counter; replies carrying an older
/// generation are dropped, so a slow response never overwrites a newer pop.
#[derive(Default)]
pub struct ContentSlot {
    state: RefCell<LookupState>,
    generation: Cell<u64>,
    listener: RefCell<Option<LookupListener>>,
}

impl ContentSlot {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn state(&self) -> LookupState {
        self.state.borrow().clone()
    }

    /// Called after every state change. Must not replace itself from inside
    /// the callback.
    pub fn set_listener(&self, listener: impl Fn(&LookupState) + 'static) {
        *self.listener.borrow_mut() = Some(Box::new(listener));
    }

    /// Start a lookup: state becomes `Loading` and a reply handle is returned
    pub fn begin(slot: &Rc<Self>, label: &str) -> ContentReply {
        let generation = slot.generation.get() + 1;
        slot.generation.set(generation);
        slot.set_state(LookupState::Loading {
            label: label.to_string(),
        });
        ContentReply {
            slot: Rc::clone(slot),
            generation,
            label: label.to_string(),
        }
    }

    /// Back to `Idle`, invalidating any in-flight reply
    pub fn reset(&self) {
        self.generation.set(self.generation.get() + 1);
        self.set_state(LookupState::Idle);
    }

    fn finish(&self, generation: u64, state: LookupState) -> bool {
        if generation != self.generation.get() {
            return false;
        }
        self.set_state(state);
        true
    }

    fn set_state(&self, state: LookupState) {
        *self.state.borrow_mut() = state.clone();
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener(&state);
        }
    }
}

/// Completion handle for one lookup
#[must_use = "a lookup stays Loading until its reply is resolved"]
pub struct ContentReply {
    slot: Rc<ContentSlot>,
    generation: u64,
    label: String,
}

impl ContentReply {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Record the outcome. Failures become `Failed`; they are not retried.
    pub fn resolve(self, result: Result<Vec<ContentItem>, EngineError>) {
        let state = match result {
            Ok(items) => {
                log::debug!("{} content item(s) for '{}'", items.len(), self.label);
                LookupState::Ready {
                    label: self.label.clone(),
                    items,
                }
            }
            Err(e) => {
                log::warn!("{}", e);
                LookupState::Failed {
                    label: self.label.clone(),
                    message: e.to_string(),
                }
            }
        };
        if !self.slot.finish(self.generation, state) {
            log::debug!("Dropping stale content reply for '{}'", self.label);
        }
    }
}

/// Something that can look up content for a phoneme label
pub trait ContentSource {
    /// Start a lookup; must not block. Resolve `reply` whenever done.
    fn lookup(&self, label: &str, reply: ContentReply);
}

/// In-memory source that answers immediately (native host, tests)
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    items: HashMap<String, Vec<ContentItem>>,
}

impl StaticContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: &str, items: Vec<ContentItem>) -> Self {
        self.items.insert(label.to_string(), items);
        self
    }
}

impl ContentSource for StaticContentSource {
    fn lookup(&self, label: &str, reply: ContentReply) {
        let items = self.items.get(label).cloned().unwrap_or_default();
        reply.resolve(Ok(items));
    }
}

/// Decode a lookup response: either a bare array or `{"items": [...]}`
pub fn parse_items(body: &str) -> Result<Vec<ContentItem>, String> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Body {
        Bare(Vec<ContentItem>),
        Wrapped { items: Vec<ContentItem> },
    }

    match serde_json::from_str::<Body>(body) {
        Ok(Body::Bare(items)) | Ok(Body::Wrapped { items }) => Ok(items),
        Err(e) => Err(format!("malformed response: {}", e)),
    }
}

/// `fetch`-backed source hitting `{endpoint}{encoded label}` (wasm32 only)
#[cfg(target_arch = "wasm32")]
pub struct HttpContentSource {
    endpoint: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpContentSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn url_for(&self, label: &str) -> String {
        let encoded: String = js_sys::encode_uri_component(label).into();
        format!("{}{}", self.endpoint, encoded)
    }
}

#[cfg(target_arch = "wasm32")]
impl ContentSource for HttpContentSource {
    fn lookup(&self, label: &str, reply: ContentReply) {
        let url = self.url_for(label);
        let label = label.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_items(&url)
                .await
                .map_err(|message| EngineError::lookup(&label, message));
            reply.resolve(result);
        });
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_items(url: &str) -> Result<Vec<ContentItem>, String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or("no window")?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("fetch failed: {:?}", e))?
        .dyn_into()
        .map_err(|_| "fetch did not return a Response".to_string())?;

    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }

    let text = response
        .text()
        .map_err(|e| format!("reading body failed: {:?}", e))?;
    let body = JsFuture::from(text)
        .await
        .map_err(|e| format!("reading body failed: {:?}", e))?
        .as_string()
        .ok_or("response body is not text")?;

    parse_items(&body)
}
