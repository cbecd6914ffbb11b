mod api;
mod app;
mod components;
mod config;
mod host;
mod models;
mod pages;
mod state;
mod util;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::config::AppConfig;
    use crate::host::{ExtensionHost, TwitchHost};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_host_is_absent_outside_the_extension_iframe() {
        // The test harness page has no Twitch helper injected.
        assert!(!TwitchHost::available());

        let host = TwitchHost::new();
        assert_eq!(host.get_config(), None);

        // Writes and callback registrations degrade to no-ops.
        host.set_config("1.3.0", "{}");
        host.on_config_changed(Box::new(|| {}));
    }

    #[wasm_bindgen_test]
    fn test_defaults_apply_without_a_stored_config() {
        let host = TwitchHost::new();
        let config = AppConfig::from_stored(host.get_config().as_deref());
        assert_eq!(config, AppConfig::default());
    }
}
