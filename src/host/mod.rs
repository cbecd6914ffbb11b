//! Glue to the capability object the hosting platform injects at
//! `window.Twitch.ext`. The helper is re-read on every call rather than
//! cached; the panel may be constructed before the helper script finishes
//! loading.

pub(crate) mod auth;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

/// What the host hands the panel when it authorizes the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct HostAuth {
    pub token: String,
    pub user_id: String,
    pub channel_id: String,
    pub client_id: String,
}

/// The host-provided messaging/configuration object, as a trait so the
/// config and auth flows can run against a fake with no real host present.
pub(crate) trait ExtensionHost: Send + Sync {
    /// Register the authorization callback. The host re-fires it on token
    /// refresh, so the callback may run more than once.
    fn on_authorized(&self, callback: Box<dyn FnMut(HostAuth) + Send>);
    /// Register the callback fired whenever the broadcaster-scoped
    /// configuration segment changes.
    fn on_config_changed(&self, callback: Box<dyn FnMut() + Send>);
    /// Current broadcaster-segment payload, if one was ever saved.
    fn get_config(&self) -> Option<String>;
    /// Replace the broadcaster-segment payload under the given version key.
    fn set_config(&self, version: &str, content: &str);
}

pub(crate) struct TwitchHost;

impl TwitchHost {
    pub fn new() -> Self {
        Self
    }

    /// Whether the page is actually running inside the extension iframe.
    pub fn available() -> bool {
        ext_helper().is_some()
    }
}

fn ext_helper() -> Option<JsValue> {
    let window = web_sys::window()?;
    let twitch = js_sys::Reflect::get(&window, &"Twitch".into()).ok()?;
    if twitch.is_undefined() || !twitch.is_object() {
        return None;
    }
    let ext = js_sys::Reflect::get(&twitch, &"ext".into()).ok()?;
    if ext.is_undefined() || !ext.is_object() {
        return None;
    }
    Some(ext)
}

fn get_path(root: &JsValue, path: &[&str]) -> Option<JsValue> {
    let mut current = root.clone();
    for key in path {
        current = js_sys::Reflect::get(&current, &(*key).into()).ok()?;
        if current.is_undefined() || current.is_null() {
            return None;
        }
    }
    Some(current)
}

fn string_prop(object: &JsValue, key: &str) -> String {
    js_sys::Reflect::get(object, &key.into())
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}

fn call_method(target: &JsValue, name: &str, args: &[&JsValue]) {
    let Ok(f) = js_sys::Reflect::get(target, &name.into()) else {
        return;
    };
    let Some(f) = f.dyn_ref::<js_sys::Function>() else {
        return;
    };
    let _ = match args {
        [] => f.call0(target),
        [a] => f.call1(target, a),
        [a, b] => f.call2(target, a, b),
        [a, b, c] => f.call3(target, a, b, c),
        _ => return,
    };
}

impl ExtensionHost for TwitchHost {
    fn on_authorized(&self, mut callback: Box<dyn FnMut(HostAuth) + Send>) {
        let Some(ext) = ext_helper() else {
            return;
        };
        let cb = Closure::wrap(Box::new(move |auth: JsValue| {
            callback(HostAuth {
                token: string_prop(&auth, "token"),
                user_id: string_prop(&auth, "userId"),
                channel_id: string_prop(&auth, "channelId"),
                client_id: string_prop(&auth, "clientId"),
            });
        }) as Box<dyn FnMut(JsValue)>);
        call_method(&ext, "onAuthorized", &[cb.as_ref()]);
        // The registration lives for the page lifetime.
        cb.forget();
    }

    fn on_config_changed(&self, mut callback: Box<dyn FnMut() + Send>) {
        let Some(ext) = ext_helper() else {
            return;
        };
        let Some(configuration) = get_path(&ext, &["configuration"]) else {
            return;
        };
        let cb = Closure::wrap(Box::new(move || callback()) as Box<dyn FnMut()>);
        call_method(&configuration, "onChanged", &[cb.as_ref()]);
        cb.forget();
    }

    fn get_config(&self) -> Option<String> {
        let ext = ext_helper()?;
        get_path(&ext, &["configuration", "broadcaster", "content"])?.as_string()
    }

    fn set_config(&self, version: &str, content: &str) {
        let Some(ext) = ext_helper() else {
            return;
        };
        let Some(configuration) = get_path(&ext, &["configuration"]) else {
            return;
        };
        call_method(
            &configuration,
            "set",
            &[
                &JsValue::from_str("broadcaster"),
                &JsValue::from_str(version),
                &JsValue::from_str(content),
            ],
        );
    }
}

/// In-memory host for tests: holds one config cell, records writes, and
/// fires its registered callbacks on demand.
#[cfg(test)]
pub(crate) struct FakeHost {
    config: std::sync::Mutex<Option<String>>,
    writes: std::sync::Mutex<Vec<(String, String)>>,
    authorized: std::sync::Mutex<Option<Box<dyn FnMut(HostAuth) + Send>>>,
    config_changed: std::sync::Mutex<Option<Box<dyn FnMut() + Send>>>,
}

#[cfg(test)]
impl FakeHost {
    pub fn new(initial_config: Option<&str>) -> Self {
        Self {
            config: std::sync::Mutex::new(initial_config.map(str::to_string)),
            writes: std::sync::Mutex::new(vec![]),
            authorized: std::sync::Mutex::new(None),
            config_changed: std::sync::Mutex::new(None),
        }
    }

    pub fn authorize(&self, auth: HostAuth) {
        if let Some(cb) = self.authorized.lock().unwrap().as_mut() {
            cb(auth);
        }
    }

    pub fn replace_config(&self, content: &str) {
        *self.config.lock().unwrap() = Some(content.to_string());
        if let Some(cb) = self.config_changed.lock().unwrap().as_mut() {
            cb();
        }
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ExtensionHost for FakeHost {
    fn on_authorized(&self, callback: Box<dyn FnMut(HostAuth) + Send>) {
        *self.authorized.lock().unwrap() = Some(callback);
    }

    fn on_config_changed(&self, callback: Box<dyn FnMut() + Send>) {
        *self.config_changed.lock().unwrap() = Some(callback);
    }

    fn get_config(&self) -> Option<String> {
        self.config.lock().unwrap().clone()
    }

    fn set_config(&self, version: &str, content: &str) {
        self.writes
            .lock()
            .unwrap()
            .push((version.to_string(), content.to_string()));
        *self.config.lock().unwrap() = Some(content.to_string());
    }
}
