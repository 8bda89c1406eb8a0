// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for veneer.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebDom`]: [`Dom`](veneer_core::dom::Dom) over `web_sys` nodes
//! - [`WebPlatform`]: capability detection, native observers, stylesheet
//!   injection
//! - [`RafTicker`]: one-shot `requestAnimationFrame` tick source
//! - [`parse_options`]: JS option objects to [`PartialOptions`]
//! - [`environment`]: the per-thread [`Environment`]

mod dom;
mod observer;
mod platform;
mod raf;

pub use dom::WebDom;
pub use platform::{PlatformError, STYLESHEET_ID, WebPlatform};
pub use raf::RafTicker;

use std::rc::Rc;

use wasm_bindgen::JsValue;

use veneer_core::environment::Environment;
use veneer_core::options::PartialOptions;
use veneer_core::runtime::Runtime;
use veneer_core::time::HostTime;

/// A runtime over the browser platform.
pub type WebRuntime = Runtime<WebPlatform>;

thread_local! {
    static ENVIRONMENT: Rc<Environment> = Rc::new(Environment::new());
}

/// Returns this thread's environment.
///
/// Every [`runtime`] on the thread shares it, so defaults set through it
/// apply to instances created afterwards.
#[must_use]
pub fn environment() -> Rc<Environment> {
    ENVIRONMENT.with(Rc::clone)
}

/// Creates a runtime for the global document and installs the default
/// stylesheet.
///
/// # Errors
///
/// Returns [`PlatformError`] outside a document context.
pub fn runtime() -> Result<WebRuntime, PlatformError> {
    let platform = WebPlatform::new()?;
    platform.install_stylesheet();
    Ok(Runtime::new(platform, environment()))
}

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}

/// Why a JS option object could not be read.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// `JSON.stringify` threw or returned `undefined` (functions, symbols).
    #[error("options are not JSON-serializable")]
    NotSerializable,
    /// The JSON did not match the option schema.
    #[error("invalid options: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl From<OptionsError> for JsValue {
    fn from(err: OptionsError) -> Self {
        js_error(&err)
    }
}

/// Reads a JS option object into [`PartialOptions`].
///
/// `undefined` and `null` read as empty options. Keys are camelCase, as in
/// `{ paddingAbsolute: true, scrollbars: { autoHide: "leave" } }`.
///
/// # Errors
///
/// Returns [`OptionsError`] for values that do not stringify or do not match
/// the option schema.
pub fn parse_options(value: &JsValue) -> Result<PartialOptions, OptionsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(PartialOptions::default());
    }
    let json = js_sys::JSON::stringify(value).map_err(|_| OptionsError::NotSerializable)?;
    let json = json.as_string().ok_or(OptionsError::NotSerializable)?;
    options_from_json(&json)
}

/// Reads option JSON into [`PartialOptions`].
///
/// # Errors
///
/// Returns [`OptionsError::Invalid`] if the JSON does not match the option
/// schema.
pub fn options_from_json(json: &str) -> Result<PartialOptions, OptionsError> {
    Ok(serde_json::from_str(json)?)
}

/// Converts any error into a JS `Error` carrying its message.
pub fn js_error(err: &impl core::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_core::overflow::OverflowBehavior;

    #[test]
    fn option_json_is_camel_case_and_partial() {
        let options = options_from_json(r#"{ "paddingAbsolute": true, "overflow": { "x": "hidden" } }"#)
            .expect("valid options");
        assert_eq!(options.padding_absolute, Some(true), "camelCase key");
        assert_eq!(options.overflow.x, Some(OverflowBehavior::Hidden), "kebab-case value");
        assert_eq!(options.overflow.y, None, "absent keys stay unset");
    }

    #[test]
    fn empty_object_is_default() {
        let options = options_from_json("{}").expect("valid options");
        assert_eq!(options, PartialOptions::default(), "nothing set");
    }

    #[test]
    fn schema_mismatch_is_invalid() {
        let err = options_from_json(r#"{ "overflow": { "x": "sideways" } }"#).unwrap_err();
        assert!(matches!(err, OptionsError::Invalid(_)), "unknown overflow behavior");
    }

    #[test]
    fn environment_is_shared_per_thread() {
        assert!(Rc::ptr_eq(&environment(), &environment()), "same environment");
    }
}
