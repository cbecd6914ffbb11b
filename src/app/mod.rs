use crate::host::{ExtensionHost, TwitchHost};
use crate::pages::{ConfigPage, PanelPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;
use std::sync::Arc;

/// Root of both extension surfaces: the viewer panel and the broadcaster
/// configuration page. Host callbacks are wired once here, before routing.
#[component]
pub fn App() -> impl IntoView {
    if !TwitchHost::available() {
        leptos::logging::warn!(
            "Twitch extension helper is not loaded; configuration and auth will not work"
        );
    }

    let host: Arc<dyn ExtensionHost> = Arc::new(TwitchHost::new());
    let state = AppState::new(host);
    state.bind_host();
    provide_context(AppContext(state));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <PanelPage /> }>
                <Route path=path!("config") view=ConfigPage />
                <Route path=path!("") view=PanelPage />
            </Routes>
        </Router>
    }
}
