//! WASM bindings for the intro loader.
//!
//! The page owns the clock (`requestAnimationFrame`, `setTimeout`) and calls
//! into `JsLoader` with milliseconds since mount.

use std::time::Duration;

use js_sys::{Function, Reflect};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::error::{IntroError, IntroResult};
use super::model::{Environment, SequencerConfig};
use super::readiness::ReadinessSignal;
use super::sequencer::LoaderSequencer;
use super::snippet::TEMPLATE_SNIPPET;
use super::storage::IntroStorage;

/// Serialize a value to JsValue with maps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

fn millis(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0) / 1000.0)
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<IntroError> for JsValue {
    fn from(err: IntroError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

/// Helper macro for Result conversion
macro_rules! js_result {
    ($expr:expr) => {
        $expr.map_err(|e: IntroError| JsValue::from(e))
    };
}

// =============================================================================
// OPTIONS & STORAGE
// =============================================================================

/// Constructor options: config and environment fields side by side, plus an
/// optional snippet override.
///
/// `ready: true` is for pages with nothing to wait on; the latch starts
/// resolved and `notifyReady` is not needed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LoaderOptions {
    #[serde(flatten)]
    config: SequencerConfig,
    #[serde(flatten)]
    environment: Environment,
    text: Option<String>,
    ready: bool,
}

impl LoaderOptions {
    fn readiness(&self) -> ReadinessSignal {
        if self.ready {
            ReadinessSignal::ready()
        } else {
            ReadinessSignal::pending()
        }
    }
}

/// Adapter for any object with `getItem`/`setItem`, such as `localStorage`.
struct JsStorage {
    target: JsValue,
}

impl JsStorage {
    fn method(&self, name: &str) -> IntroResult<Function> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or_else(|| IntroError::storage(format!("storage has no {name}()")))
    }
}

impl IntroStorage for JsStorage {
    fn get_item(&self, key: &str) -> IntroResult<Option<String>> {
        let value = self
            .method("getItem")?
            .call1(&self.target, &JsValue::from_str(key))
            .map_err(|e| IntroError::storage(format!("getItem threw: {e:?}")))?;
        Ok(value.as_string())
    }

    fn set_item(&mut self, key: &str, value: &str) -> IntroResult<()> {
        self.method("setItem")?
            .call2(&self.target, &JsValue::from_str(key), &JsValue::from_str(value))
            .map_err(|e| IntroError::storage(format!("setItem threw: {e:?}")))?;
        Ok(())
    }
}

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around `LoaderSequencer`.
#[wasm_bindgen]
pub struct JsLoader {
    inner: LoaderSequencer<JsStorage>,
}

#[wasm_bindgen]
impl JsLoader {
    /// Mounts a loader at t = 0.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const loader = new JsLoader({ timeoutMs: 15000 }, localStorage, () => unlockScroll());
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue, storage: JsValue, on_finish: Function) -> Result<JsLoader, JsValue> {
        let options: LoaderOptions = if options.is_undefined() || options.is_null() {
            LoaderOptions::default()
        } else {
            from_value(options)?
        };
        let readiness = options.readiness();
        let text = options
            .text
            .unwrap_or_else(|| TEMPLATE_SNIPPET.to_string());

        let inner = js_result!(LoaderSequencer::mount(
            text,
            options.config,
            options.environment,
            readiness,
            JsStorage { target: storage },
            move || {
                if let Err(e) = on_finish.call0(&JsValue::NULL) {
                    tracing::warn!(error = ?e, "onFinish threw");
                }
            },
        ))?;
        Ok(JsLoader { inner })
    }

    /// Animation frame / timer wake-up.
    pub fn advance(&mut self, now_ms: f64) {
        self.inner.advance(millis(now_ms));
    }

    /// The readiness promise settled, either way.
    #[wasm_bindgen(js_name = notifyReady)]
    pub fn notify_ready(&mut self, now_ms: f64) {
        self.inner.notify_ready(millis(now_ms));
    }

    /// The exit transition's `transitionend` fired.
    #[wasm_bindgen(js_name = transitionEnd)]
    pub fn transition_end(&mut self, now_ms: f64) -> bool {
        self.inner.transition_end(millis(now_ms))
    }

    #[wasm_bindgen(js_name = triggerExit)]
    pub fn trigger_exit(&mut self, now_ms: f64) -> bool {
        self.inner.trigger_exit(millis(now_ms))
    }

    pub fn unmount(&mut self) {
        self.inner.unmount();
    }

    /// "typing" | "holding" | "animating" | "done"
    pub fn state(&self) -> String {
        self.inner.state().as_str().to_string()
    }

    /// `{ totalLength, displayedLength }`
    pub fn progress(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.progress())?)
    }

    #[wasm_bindgen(js_name = visibleText)]
    pub fn visible_text(&self) -> String {
        self.inner.visible_text().to_string()
    }

    /// Array of `{ kind, text }` tokens for the visible text.
    pub fn highlighted(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.highlighted())?)
    }

    /// Drains pending events, e.g. `[{ type: "exitAnimationStarted" }]`.
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.take_events())?)
    }

    /// Milliseconds since mount of the next timer, or undefined.
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.inner.next_deadline().map(|d| d.as_secs_f64() * 1000.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
