use crate::config::{AppConfig, EXT_CONFIG_VERSION};
use crate::host::auth::AuthState;
use crate::host::{ExtensionHost, HostAuth};
use crate::models::{CompletedGame, UserSummary};
use leptos::prelude::*;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub host: Arc<dyn ExtensionHost>,

    /// Reconciled broadcaster configuration; starts as defaults until the
    /// host delivers the stored blob.
    pub config: RwSignal<AppConfig>,
    pub auth: RwSignal<AuthState>,

    /// Set once the host has authorized the session; nothing renders before.
    pub finished_loading: RwSignal<bool>,

    /// Latest poll results. Replaced wholesale each cycle.
    pub summary: RwSignal<Option<UserSummary>>,
    pub completed: RwSignal<Vec<CompletedGame>>,

    /// Display gate: fetches still in flight for the current cycle.
    pub pending_fetches: RwSignal<u8>,

    /// Set when the first cycle's countdown reaches zero; nothing renders
    /// until both initial fetches are home.
    pub initial_fetch_done: RwSignal<bool>,

    /// Terminal failure message. Once set, polling stops; a page refresh is
    /// the only way back.
    pub fail_message: RwSignal<Option<String>>,

    /// Handle of the scheduled refresh timeout, for cleanup.
    pub refresh_timer: RwSignal<Option<i32>>,

    /// Bumped on teardown so stale in-flight fetches discard their results.
    pub refresh_generation: RwSignal<u64>,
}

impl AppState {
    pub fn new(host: Arc<dyn ExtensionHost>) -> Self {
        let stored = host.get_config();
        Self {
            host,
            config: RwSignal::new(AppConfig::from_stored(stored.as_deref())),
            auth: RwSignal::new(AuthState::default()),
            finished_loading: RwSignal::new(false),
            summary: RwSignal::new(None),
            completed: RwSignal::new(vec![]),
            pending_fetches: RwSignal::new(0),
            initial_fetch_done: RwSignal::new(false),
            fail_message: RwSignal::new(None),
            refresh_timer: RwSignal::new(None),
            refresh_generation: RwSignal::new(0),
        }
    }

    /// Wire the host callbacks. Called once from the app root.
    pub fn bind_host(&self) {
        let state = self.clone();
        self.host.on_authorized(Box::new(move |auth: HostAuth| {
            state
                .auth
                .update(|a| a.set_token(&auth.token, &auth.user_id));
            if !state.finished_loading.get_untracked() {
                state.reload_config();
                state.finished_loading.set(true);
            }
        }));

        let state = self.clone();
        self.host
            .on_config_changed(Box::new(move || state.reload_config()));
    }

    /// Re-read the persisted blob; absent or unreadable content falls back
    /// to defaults silently.
    pub fn reload_config(&self) {
        let stored = self.host.get_config();
        self.config.set(AppConfig::from_stored(stored.as_deref()));
    }

    /// Persist the whole configuration as one JSON blob under the fixed
    /// version key, and adopt it locally.
    pub fn save_config(&self, config: &AppConfig) {
        self.host.set_config(EXT_CONFIG_VERSION, &config.to_json());
        self.config.set(config.clone());
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FakeHost;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn broadcaster_token() -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload =
            URL_SAFE_NO_PAD.encode(br#"{"role":"broadcaster","opaque_user_id":"U1"}"#);
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn test_authorize_loads_config_and_flips_the_gate() {
        let host = Arc::new(FakeHost::new(Some(
            r#"{"username":"bdjeffyp","apiKey":"k"}"#,
        )));
        let state = AppState::new(host.clone());
        state.bind_host();
        assert!(!state.finished_loading.get_untracked());

        host.authorize(HostAuth {
            token: broadcaster_token(),
            user_id: "U1".to_string(),
            ..Default::default()
        });

        assert!(state.finished_loading.get_untracked());
        assert!(state.auth.get_untracked().is_broadcaster());
        assert_eq!(state.config.get_untracked().username, "bdjeffyp");
        // Missing fields were reconciled in.
        assert_eq!(state.config.get_untracked().sections.len(), 4);
    }

    #[test]
    fn test_config_change_reloads_state() {
        let host = Arc::new(FakeHost::new(None));
        let state = AppState::new(host.clone());
        state.bind_host();
        assert_eq!(state.config.get_untracked().username, "");

        host.replace_config(r#"{"username":"bdjeffyp"}"#);
        assert_eq!(state.config.get_untracked().username, "bdjeffyp");
    }

    #[test]
    fn test_save_writes_one_blob_under_the_version_key() {
        let host = Arc::new(FakeHost::new(None));
        let state = AppState::new(host.clone());

        let mut config = AppConfig::default();
        config.username = "bdjeffyp".to_string();
        config.api_key = "secret".to_string();
        state.save_config(&config);

        let writes = host.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, EXT_CONFIG_VERSION);
        assert_eq!(AppConfig::from_stored(Some(&writes[0].1)), config);
        assert_eq!(state.config.get_untracked(), config);
    }

    #[test]
    fn test_malformed_stored_blob_falls_back_to_defaults() {
        let host = Arc::new(FakeHost::new(Some("oops not json")));
        let state = AppState::new(host);
        assert_eq!(state.config.get_untracked(), AppConfig::default());
    }
}
