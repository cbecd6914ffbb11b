use crate::api::normalize::mastered_sets;
use crate::api::{ApiError, ApiErrorKind, RaClient, RA_URL};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, Card, CardContent, CardDescription, CardHeader,
    CardItem, CardList, CardTitle, Checkbox, Input, Label, Spinner,
};
use crate::config::sections::{self, SectionDescriptor, SectionKind};
use crate::config::validate::{clamp_achievement_count, validate_fields};
use crate::config::AppConfig;
use crate::models::{Achievement, CompletedGame, UserSummary};
use crate::state::{AppContext, AppState};
use crate::util::short_date;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

/// The next poll is scheduled this long after the previous cycle finishes,
/// so the effective period drifts by the fetch duration.
const REFRESH_INTERVAL_MS: i32 = 60_000;

// ---------------------------------------------------------------------------
// Viewer panel
// ---------------------------------------------------------------------------

#[component]
pub fn PanelPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    // Kick the first cycle once the host has authorized; each cycle
    // reschedules the next one itself.
    {
        let state = app_state.0.clone();
        Effect::new(move |_| {
            if state.finished_loading.get()
                && state.pending_fetches.get_untracked() == 0
                && state.refresh_timer.get_untracked().is_none()
                && state.summary.get_untracked().is_none()
            {
                run_refresh_cycle(state.clone());
            }
        });
    }

    // A torn-down panel must not keep polling: drop the pending timer and
    // invalidate in-flight fetches.
    {
        let state = app_state.0.clone();
        on_cleanup(move || {
            state.refresh_generation.update(|g| *g += 1);
            if let Some(handle) = state.refresh_timer.get_untracked() {
                if let Some(win) = web_sys::window() {
                    win.clear_timeout_with_handle(handle);
                }
            }
        });
    }

    let fail = app_state.0.fail_message;
    let ready = {
        let state = app_state.0.clone();
        move || {
            state.finished_loading.get()
                && state.initial_fetch_done.get()
                && state.summary.get().is_some()
        }
    };

    let content = {
        let state = app_state.0.clone();
        move || {
            let config = state.config.get();
            let Some(summary) = state.summary.get() else {
                return ().into_view().into_any();
            };
            config
                .sections
                .iter()
                .filter(|s| s.visible)
                .map(|section| render_section(&state, &config, &summary, section))
                .collect_view()
                .into_any()
        }
    };

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <div class="mx-auto flex w-full max-w-xs flex-col gap-2 px-2 py-2">
                <Show
                    when=move || fail.get().is_none()
                    fallback=move || view! {
                        <Alert class="border-destructive/30">
                            <AlertDescription class="text-destructive text-xs">
                                {move || fail.get().unwrap_or_default()}
                            </AlertDescription>
                        </Alert>
                    }
                >
                    <Show
                        when=ready.clone()
                        fallback=|| view! {
                            <div class="flex items-center justify-center gap-2 py-8 text-xs text-muted-foreground">
                                <Spinner />
                                "Loading…"
                            </div>
                        }
                    >
                        {content.clone()}
                    </Show>
                </Show>
            </div>
        </div>
    }
}

fn render_section(
    state: &AppState,
    config: &AppConfig,
    summary: &UserSummary,
    section: &SectionDescriptor,
) -> AnyView {
    match section.kind {
        SectionKind::UserProfile => view! {
            <UserProfileSection summary=summary.clone() />
        }
        .into_any(),
        SectionKind::LastGamePlaying => view! {
            <LastGameSection
                summary=summary.clone()
                show_rich_presence=section.child_visible.unwrap_or(false)
            />
        }
        .into_any(),
        SectionKind::RecentAchievements => {
            let achievements: Vec<Achievement> = summary
                .recent_achievements
                .iter()
                .take(config.num_achievements_to_show as usize)
                .cloned()
                .collect();
            view! { <RecentAchievementsSection achievements=achievements /> }.into_any()
        }
        SectionKind::MasteredSets => {
            let sets = mastered_sets(
                state.completed.get(),
                config.show_completed_with_mastered,
            );
            view! { <MasteredSetsSection sets=sets /> }.into_any()
        }
        // Child-only setting; never rendered as a section of its own.
        SectionKind::RichPresence => ().into_view().into_any(),
    }
}

/// Run one poll: summary and completed sets race freely, the display gate
/// counts them back in, and the last one home schedules the next cycle.
fn run_refresh_cycle(state: AppState) {
    if state.fail_message.get_untracked().is_some() {
        return;
    }

    let config = state.config.get_untracked();
    if config.username.is_empty() || config.api_key.is_empty() {
        state.fail_message.set(Some(
            "This panel is not configured yet. The broadcaster must enter \
             RetroAchievements credentials on the extension configuration page."
                .to_string(),
        ));
        return;
    }

    let generation = state.refresh_generation.get_untracked();
    let client = RaClient::new(config.username, config.api_key);
    state.refresh_timer.set(None);
    state.pending_fetches.set(2);

    {
        let state = state.clone();
        let client = client.clone();
        let count = config.num_achievements_to_show;
        spawn_local(async move {
            let result = client.get_summary(count).await;
            if state.refresh_generation.get_untracked() != generation {
                return;
            }
            match result {
                Ok(summary) => state.summary.set(Some(summary)),
                Err(e) => enter_fail_state(&state, &e),
            }
            finish_fetch(state);
        });
    }

    {
        let state = state.clone();
        spawn_local(async move {
            let result = client.get_completed_games().await;
            if state.refresh_generation.get_untracked() != generation {
                return;
            }
            match result {
                Ok(games) => state.completed.set(games),
                Err(e) => enter_fail_state(&state, &e),
            }
            finish_fetch(state);
        });
    }
}

/// Terminal: polling stops and only a page refresh recovers.
fn enter_fail_state(state: &AppState, error: &ApiError) {
    leptos::logging::warn!("refresh failed: {error}");
    let message = match error.kind {
        ApiErrorKind::InvalidKey => {
            "RetroAchievements rejected the configured API key. \
             Check the extension configuration, then refresh the page."
        }
        _ => "Could not reach RetroAchievements. Refresh the page to try again.",
    };
    state.fail_message.set(Some(message.to_string()));
}

fn finish_fetch(state: AppState) {
    state.pending_fetches.update(|p| *p = p.saturating_sub(1));
    if state.pending_fetches.get_untracked() == 0 {
        state.initial_fetch_done.set(true);
        schedule_refresh(state);
    }
}

fn schedule_refresh(state: AppState) {
    if state.fail_message.get_untracked().is_some() {
        return;
    }
    let Some(win) = web_sys::window() else {
        return;
    };

    let s2 = state.clone();
    let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
        s2.refresh_timer.set(None);
        run_refresh_cycle(s2.clone());
    });

    let handle = win
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            REFRESH_INTERVAL_MS,
        )
        .unwrap_or(0);
    state.refresh_timer.set(Some(handle));
}

// ---------------------------------------------------------------------------
// Panel sections
// ---------------------------------------------------------------------------

#[component]
fn UserProfileSection(summary: UserSummary) -> impl IntoView {
    let rank = if summary.is_ranked() {
        format!("Rank {}", summary.rank)
    } else {
        "Unranked".to_string()
    };
    let points = format!(
        "{} points ({} true)",
        summary.total_points, summary.total_true_points
    );

    view! {
        <Card>
            <CardContent class="flex items-center gap-3">
                <img
                    src=summary.user_pic_url.clone()
                    alt=format!("{} avatar", summary.username)
                    class="size-12 rounded-md"
                />
                <div class="flex flex-col gap-0.5">
                    <div class="text-sm font-semibold">{summary.username.clone()}</div>
                    <div class="text-xs text-muted-foreground">{rank}</div>
                    <div class="text-xs text-muted-foreground">{points}</div>
                </div>
            </CardContent>
        </Card>
    }
}

#[component]
fn LastGameSection(summary: UserSummary, show_rich_presence: bool) -> impl IntoView {
    let game = summary.last_game().cloned();
    let presence = summary.rich_presence.clone();
    let has_presence = {
        let presence = presence.clone();
        move || show_rich_presence && !presence.is_empty()
    };

    view! {
        <Card>
            <CardHeader>
                <CardTitle>"Last seen playing"</CardTitle>
            </CardHeader>
            <CardContent class="flex flex-col gap-1">
                {match game {
                    Some(game) => view! {
                        <div class="flex items-center gap-2">
                            <img
                                src=format!("{RA_URL}{}", game.image_icon)
                                alt=game.title.clone()
                                class="size-8 rounded-sm"
                            />
                            <div class="flex flex-col">
                                <div class="text-xs font-medium">{game.title.clone()}</div>
                                <div class="text-xs text-muted-foreground">
                                    {format!("{} · {}", game.console_name, short_date(&game.last_played))}
                                </div>
                            </div>
                        </div>
                    }
                    .into_any(),
                    None => view! {
                        <div class="text-xs text-muted-foreground">"No games played yet."</div>
                    }
                    .into_any(),
                }}
                <Show when=has_presence fallback=|| ().into_view()>
                    <div class="text-xs italic text-muted-foreground">{presence.clone()}</div>
                </Show>
            </CardContent>
        </Card>
    }
}

#[component]
fn RecentAchievementsSection(achievements: Vec<Achievement>) -> impl IntoView {
    view! {
        <Card>
            <CardHeader>
                <CardTitle>"Recent achievements"</CardTitle>
            </CardHeader>
            <CardContent>
                <Show
                    when={
                        let is_empty = achievements.is_empty();
                        move || !is_empty
                    }
                    fallback=|| view! {
                        <div class="text-xs text-muted-foreground">"No recent achievements."</div>
                    }
                >
                    <CardList>
                        {achievements
                            .iter()
                            .map(|achievement| {
                                view! {
                                    <CardItem>
                                        <img
                                            src=achievement.badge_url.clone()
                                            alt=achievement.title.clone()
                                            class="size-8 rounded-sm"
                                        />
                                        <div class="flex min-w-0 flex-col">
                                            <div class="truncate text-xs font-medium">
                                                {format!("{} ({})", achievement.title, achievement.points)}
                                                <Show when={
                                                    let hardcore = achievement.hardcore_achieved;
                                                    move || hardcore
                                                } fallback=|| ().into_view()>
                                                    <span class="ml-1 rounded-sm bg-primary/15 px-1 text-[10px] text-primary">"HC"</span>
                                                </Show>
                                            </div>
                                            <div class="truncate text-xs text-muted-foreground">
                                                {format!(
                                                    "{} · {}",
                                                    achievement.game_title,
                                                    short_date(&achievement.date_awarded)
                                                )}
                                            </div>
                                        </div>
                                    </CardItem>
                                }
                            })
                            .collect_view()}
                    </CardList>
                </Show>
            </CardContent>
        </Card>
    }
}

#[component]
fn MasteredSetsSection(sets: Vec<CompletedGame>) -> impl IntoView {
    view! {
        <Card>
            <CardHeader>
                <CardTitle>"Mastered sets"</CardTitle>
            </CardHeader>
            <CardContent>
                <Show
                    when={
                        let is_empty = sets.is_empty();
                        move || !is_empty
                    }
                    fallback=|| view! {
                        <div class="text-xs text-muted-foreground">"No mastered sets yet."</div>
                    }
                >
                    <CardList>
                        {sets
                            .iter()
                            .map(|set| {
                                let badge = if set.hardcore_mode { "Mastered" } else { "Completed" };
                                view! {
                                    <CardItem>
                                        <img src=set.icon_url.clone() alt=set.title.clone() class="size-8 rounded-sm" />
                                        <div class="flex min-w-0 flex-col">
                                            <div class="truncate text-xs font-medium">{set.title.clone()}</div>
                                            <div class="text-xs text-muted-foreground">
                                                {format!("{} · {}/{} · {}", set.console_name, set.num_awarded, set.max_possible, badge)}
                                            </div>
                                        </div>
                                    </CardItem>
                                }
                            })
                            .collect_view()}
                    </CardList>
                </Show>
            </CardContent>
        </Card>
    }
}

// ---------------------------------------------------------------------------
// Broadcaster configuration page
// ---------------------------------------------------------------------------

#[component]
pub fn ConfigPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let state = app_state.0.clone();

    let username: RwSignal<String> = RwSignal::new(String::new());
    let api_key: RwSignal<String> = RwSignal::new(String::new());
    let count_text: RwSignal<String> = RwSignal::new(String::new());
    let show_completed: RwSignal<bool> = RwSignal::new(false);
    let sections_edit: RwSignal<Vec<SectionDescriptor>> = RwSignal::new(vec![]);
    let saved: RwSignal<bool> = RwSignal::new(false);
    let drag_kind: RwSignal<Option<SectionKind>> = RwSignal::new(None);

    // Seed the form whenever the stored config (re)loads.
    {
        let state = state.clone();
        Effect::new(move |_| {
            let config = state.config.get();
            username.set(config.username.clone());
            api_key.set(config.api_key.clone());
            count_text.set(config.num_achievements_to_show.to_string());
            show_completed.set(config.show_completed_with_mastered);
            sections_edit.set(config.sections.clone());
        });
    }

    // Recomputed on every keystroke; gates the save button.
    let errors = move || validate_fields(&username.get(), &api_key.get(), &count_text.get());

    let on_submit = {
        let state = state.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            if errors().any() {
                return;
            }
            let Some(count) = clamp_achievement_count(&count_text.get_untracked()) else {
                return;
            };
            let config = AppConfig {
                username: username.get_untracked().trim().to_string(),
                api_key: api_key.get_untracked().trim().to_string(),
                num_achievements_to_show: count,
                show_completed_with_mastered: show_completed.get_untracked(),
                sections: sections_edit.get_untracked(),
            };
            state.save_config(&config);
            count_text.set(count.to_string());
            saved.set(true);
        }
    };

    let is_broadcaster = {
        let state = state.clone();
        move || state.auth.get().is_broadcaster()
    };

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <div class="mx-auto flex w-full max-w-md flex-col gap-3 px-4 py-6">
                <div class="space-y-1">
                    <h1 class="text-lg font-semibold">"RetroAchievements panel"</h1>
                    <p class="text-xs text-muted-foreground">"Configuration"</p>
                </div>

                <Show
                    when=is_broadcaster
                    fallback=|| view! {
                        <Alert>
                            <AlertDescription class="text-xs">
                                "Only the broadcaster can edit this configuration."
                            </AlertDescription>
                        </Alert>
                    }
                >
                    <form class="flex flex-col gap-3" on:submit=on_submit.clone()>
                        <Card>
                            <CardHeader>
                                <CardTitle>"Account"</CardTitle>
                                <CardDescription>
                                    "The API key is on the RetroAchievements settings page."
                                </CardDescription>
                            </CardHeader>
                            <CardContent class="flex flex-col gap-3">
                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="username" class="text-xs">"Username"</Label>
                                    <Input id="username" placeholder="bdjeffyp" bind_value=username />
                                    <Show when=move || errors().username.is_some() fallback=|| ().into_view()>
                                        <p class="text-xs text-destructive">
                                            {move || errors().username.unwrap_or_default()}
                                        </p>
                                    </Show>
                                </div>

                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="api-key" class="text-xs">"API key"</Label>
                                    <Input id="api-key" bind_value=api_key />
                                    <Show when=move || errors().api_key.is_some() fallback=|| ().into_view()>
                                        <p class="text-xs text-destructive">
                                            {move || errors().api_key.unwrap_or_default()}
                                        </p>
                                    </Show>
                                </div>

                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="achievement-count" class="text-xs">
                                        "Achievements to show (1-30)"
                                    </Label>
                                    <Input id="achievement-count" r#type="number" bind_value=count_text />
                                    <Show when=move || errors().count.is_some() fallback=|| ().into_view()>
                                        <p class="text-xs text-destructive">
                                            {move || errors().count.unwrap_or_default()}
                                        </p>
                                    </Show>
                                </div>

                                <div class="flex items-center gap-2">
                                    <Checkbox id="show-completed" bind_checked=show_completed />
                                    <Label html_for="show-completed" class="text-xs">
                                        "Also list completed (non-hardcore) sets"
                                    </Label>
                                </div>
                            </CardContent>
                        </Card>

                        <Card>
                            <CardHeader>
                                <CardTitle>"Sections"</CardTitle>
                                <CardDescription>
                                    "Drag to reorder. Order changes apply on save."
                                </CardDescription>
                            </CardHeader>
                            <CardContent class="flex flex-col gap-2">
                                <For
                                    each=move || sections_edit.get()
                                    key=|section| section.kind.to_string()
                                    children=move |section: SectionDescriptor| {
                                        view! {
                                            <SectionCard
                                                section=section
                                                sections_edit=sections_edit
                                                drag_kind=drag_kind
                                            />
                                        }
                                    }
                                />
                            </CardContent>
                        </Card>

                        <Show when=move || saved.get() fallback=|| ().into_view()>
                            <Alert>
                                <AlertDescription class="text-xs">"Configuration saved."</AlertDescription>
                            </Alert>
                        </Show>

                        <Button size=ButtonSize::Sm attr:disabled=move || errors().any()>
                            "Save"
                        </Button>
                    </form>
                </Show>
            </div>
        </div>
    }
}

/// One draggable row of the section-order editor. The checkbox toggles the
/// section, the indented checkbox toggles its dependent setting, and drops
/// land before or after this row depending on the pointer's vertical
/// position inside it.
#[component]
fn SectionCard(
    section: SectionDescriptor,
    sections_edit: RwSignal<Vec<SectionDescriptor>>,
    drag_kind: RwSignal<Option<SectionKind>>,
) -> impl IntoView {
    let kind = section.kind;
    let child_kind = section.child_kind;

    let on_dragstart = move |ev: web_sys::DragEvent| {
        drag_kind.set(Some(kind));
        if let Some(dt) = ev.data_transfer() {
            let _ = dt.set_data("text/plain", &kind.to_string());
            dt.set_drop_effect("move");
        }
    };

    let on_dragover = move |ev: web_sys::DragEvent| {
        ev.prevent_default();
        if let Some(dt) = ev.data_transfer() {
            dt.set_drop_effect("move");
        }
    };

    let on_drop = move |ev: web_sys::DragEvent| {
        ev.prevent_default();

        let Some(dragged) = drag_kind.get_untracked() else {
            return;
        };
        drag_kind.set(None);
        if dragged == kind {
            return;
        }

        // Decide before/after by pointer position inside the target row.
        let insert_after = ev
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| el.get_bounding_client_rect())
            .map(|rect| {
                let mid = rect.top() + rect.height() / 2.0;
                f64::from(ev.client_y()) >= mid
            })
            .unwrap_or(true);

        sections_edit.update(|list| {
            let Some(target_index) = sections::index_of(list, kind) else {
                return;
            };
            let to = if insert_after { target_index + 1 } else { target_index };
            // Removing the dragged entry shifts everything after it left.
            let to = match sections::index_of(list, dragged) {
                Some(from) if from < to => to - 1,
                _ => to,
            };
            sections::move_entry(list, dragged, to);
        });
    };

    view! {
        <div
            class="flex flex-col gap-1 rounded-md border bg-background px-3 py-2"
            draggable="true"
            on:dragstart=on_dragstart
            on:dragover=on_dragover
            on:drop=on_drop
        >
            <div class="flex items-center gap-2">
                <span class="cursor-grab select-none text-muted-foreground">"≡"</span>
                <input
                    type="checkbox"
                    id=kind.to_string()
                    class="size-4 accent-primary"
                    prop:checked=move || {
                        sections::setting_for(&sections_edit.get(), kind).unwrap_or(false)
                    }
                    on:change=move |ev: web_sys::Event| {
                        let checked = event_target_checked(&ev);
                        sections_edit.update(|list| sections::set_visible(list, kind, checked));
                    }
                />
                <Label html_for=kind.to_string() class="text-xs">{kind.to_string()}</Label>
            </div>

            {child_kind.map(|child| view! {
                <div class="ml-6 flex items-center gap-2">
                    <span class="text-muted-foreground">"└"</span>
                    <input
                        type="checkbox"
                        id=child.to_string()
                        class="size-4 accent-primary"
                        prop:checked=move || {
                            sections::child_setting_for(&sections_edit.get(), kind).unwrap_or(false)
                        }
                        disabled=move || {
                            !sections::setting_for(&sections_edit.get(), kind).unwrap_or(false)
                        }
                        on:change=move |ev: web_sys::Event| {
                            let checked = event_target_checked(&ev);
                            sections_edit.update(|list| {
                                sections::set_child_visible(list, kind, checked)
                            });
                        }
                    />
                    <Label html_for=child.to_string() class="text-xs">{child.to_string()}</Label>
                </div>
            })}
        </div>
    }
}
