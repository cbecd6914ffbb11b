#![allow(dead_code)]

use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

/// Native checkbox with the same manual two-way wiring as `Input`.
#[allow(dead_code)]
#[component]
pub fn Checkbox(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] id: String,
    #[prop(optional)] disabled: bool,

    #[prop(into)] bind_checked: RwSignal<bool>,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "size-4 shrink-0 rounded-[4px] border border-input accent-primary shadow-xs outline-none",
        "focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2",
        "disabled:cursor-not-allowed disabled:opacity-50",
        class
    );

    let on_change = move |ev: web_sys::Event| {
        if let Some(target) = ev.target() {
            if let Some(input) = target.dyn_ref::<web_sys::HtmlInputElement>() {
                bind_checked.set(input.checked());
            }
        }
    };

    view! {
        <input
            data-name="Checkbox"
            type="checkbox"
            class=merged_class
            id=id
            disabled=disabled
            prop:checked=move || bind_checked.get()
            on:change=on_change
        />
    }
    .into_any()
}
