use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use starchart_shared::{LocationId, Waypoint};

use crate::api;
use crate::app::{Galaxy, HeaderExpanded, Notice, RouteNonce, ShowLabels, ShowNpcs, ShowRoutes};
use crate::config::NOTICE_DISMISS_MS;
use crate::galaxy::GalaxyView;
use crate::viewport::Viewport;
use crate::ws::ConnectionStatus;

pub fn contacts_text(count: usize) -> String {
    format!("{count} CONTACTS")
}

pub fn routes_button_text(show: bool) -> &'static str {
    if show { "HIDE ROUTES" } else { "SHOW ROUTES" }
}

pub fn labels_button_text(show: bool) -> &'static str {
    if show { "HIDE LABELS" } else { "SHOW LABELS" }
}

/// A route completion applies only while no newer request was made and the
/// selectors still name the requested ends.
pub fn route_result_current(
    requested: (u64, LocationId, LocationId),
    nonce: u64,
    from: Option<LocationId>,
    to: Option<LocationId>,
) -> bool {
    let (request_nonce, want_from, want_to) = requested;
    nonce == request_nonce && from == Some(want_from) && to == Some(want_to)
}

pub fn route_summary(waypoints: &[Waypoint]) -> String {
    waypoints
        .iter()
        .map(|w| {
            if w.name.is_empty() {
                format!("#{}", w.location_id)
            } else {
                w.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Select values are location ids; the placeholder option is empty.
pub fn parse_location_choice(value: &str) -> Option<LocationId> {
    value.trim().parse().ok()
}

/// Both ends chosen and distinct.
pub fn route_request(
    from: Option<LocationId>,
    to: Option<LocationId>,
) -> Option<(LocationId, LocationId)> {
    match (from, to) {
        (Some(from), Some(to)) if from != to => Some((from, to)),
        _ => None,
    }
}

/// Fit the camera to every known location.
pub(crate) fn fit_map(galaxy: RwSignal<GalaxyView>, viewport: RwSignal<Viewport>) {
    if let Some(change) = galaxy.with_untracked(|g| g.fit_all()) {
        viewport.update(|vp| change.apply(vp));
    }
}

/// Drop the active route and any request still in flight.
pub(crate) fn clear_route(galaxy: RwSignal<GalaxyView>, nonce: RwSignal<u64>) {
    nonce.update(|n| *n = n.wrapping_add(1));
    galaxy.update(|g| g.clear_route());
}

/// Show `message` until it is replaced or times out.
pub(crate) fn raise_notice(notice: RwSignal<Option<String>>, message: &str) {
    notice.set(Some(message.to_string()));
    let shown = message.to_string();
    let timer = Timeout::new(NOTICE_DISMISS_MS, move || {
        if notice.get_untracked().as_deref() == Some(shown.as_str()) {
            notice.set(None);
        }
    });
    timer.forget();
}

/// Title bar: contact count, connection state and the collapse toggle.
#[component]
pub fn Header(children: Children) -> impl IntoView {
    let Galaxy(galaxy) = expect_context();
    let HeaderExpanded(expanded) = expect_context();
    let connection: RwSignal<ConnectionStatus> = expect_context();
    let controls_open: RwSignal<bool> = RwSignal::new(false);

    let contacts = Memo::new(move |_| galaxy.with(|g| g.total_contacts()));

    view! {
        <header
            id="header"
            class:header-expanded=move || expanded.get()
            class:header-collapsed=move || !expanded.get()
        >
            <div class="header-bar">
                <h1 class="title">"STARCHART"</h1>
                <div class="status-bar">
                    <span id="player-count">{move || contacts_text(contacts.get())}</span>
                    <span
                        id="connection-indicator"
                        class=move || connection.get().css_class()
                    >
                        "●"
                    </span>
                    <span id="connection-text">{move || connection.get().text()}</span>
                </div>
                <button
                    id="mobile-toggle"
                    on:click=move |_| controls_open.update(|v| *v = !*v)
                >
                    "☰"
                </button>
                <button
                    id="header-toggle"
                    class:collapsed=move || !expanded.get()
                    title=move || if expanded.get() { "Collapse header" } else { "Expand header" }
                    on:click=move |_| expanded.update(|v| *v = !*v)
                >
                    {move || if expanded.get() { "▲" } else { "▼" }}
                </button>
            </div>
            <div id="controls-section" class:active=move || controls_open.get()>
                {children()}
            </div>
        </header>
    }
}

#[component]
pub fn SearchBox() -> impl IntoView {
    let Galaxy(galaxy) = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let query: RwSignal<String> = RwSignal::new(String::new());

    let perform = move || {
        let q = query.get_untracked();
        if let Some(change) = galaxy.try_update(|g| g.search(&q)).flatten() {
            viewport.update(|vp| change.apply(vp));
        }
    };

    let on_input = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(input) = target.dyn_into::<web_sys::HtmlInputElement>() else {
            return;
        };
        let value = input.value();
        if value.trim().is_empty() {
            galaxy.update(|g| g.clear_highlights());
        }
        query.set(value);
    };

    let on_keydown = move |e: leptos::ev::KeyboardEvent| {
        if e.key() == "Enter" {
            perform();
        }
    };

    let on_clear = move |_| {
        query.set(String::new());
        galaxy.update(|g| g.clear_highlights());
    };

    view! {
        <div class="control-group search-group">
            <input
                id="location-search"
                type="text"
                placeholder="SEARCH LOCATIONS..."
                prop:value=move || query.get()
                on:input=on_input
                on:keydown=on_keydown
            />
            <button id="search-btn" on:click=move |_| perform()>"SEARCH"</button>
            <button id="clear-search-btn" on:click=on_clear>"CLEAR"</button>
        </div>
    }
}

#[component]
fn LocationSelect(
    id: &'static str,
    placeholder: &'static str,
    choice: RwSignal<Option<LocationId>>,
    options: Memo<Vec<(LocationId, String)>>,
) -> impl IntoView {
    let on_change = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(select) = target.dyn_into::<web_sys::HtmlSelectElement>() else {
            return;
        };
        choice.set(parse_location_choice(&select.value()));
    };

    view! {
        <select
            id=id
            on:change=on_change
            prop:value=move || choice.get().map(|v| v.to_string()).unwrap_or_default()
        >
            <option value="" selected=move || choice.get().is_none()>{placeholder}</option>
            {move || {
                options
                    .get()
                    .into_iter()
                    .map(|(location_id, text)| {
                        view! {
                            <option
                                value=location_id.to_string()
                                selected=move || choice.get() == Some(location_id)
                            >
                                {text}
                            </option>
                        }
                    })
                    .collect::<Vec<_>>()
            }}
        </select>
    }
}

/// Route selectors plus plot and clear.
#[component]
pub fn RouteControls() -> impl IntoView {
    let Galaxy(galaxy) = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let RouteNonce(route_nonce) = expect_context();
    let Notice(notice) = expect_context();

    let route_from: RwSignal<Option<LocationId>> = RwSignal::new(None);
    let route_to: RwSignal<Option<LocationId>> = RwSignal::new(None);

    let options = Memo::new(move |_| galaxy.with(|g| g.route_options()));
    let has_route = Memo::new(move |_| galaxy.with(|g| g.route().is_some()));
    let summary = Memo::new(move |_| {
        galaxy.with(|g| g.route().map(|route| route_summary(&route.waypoints)))
    });

    // A new snapshot may drop a chosen location.
    Effect::new(move || {
        let options = options.get();
        for choice in [route_from, route_to] {
            if let Some(id) = choice.get_untracked()
                && !options.iter().any(|(option_id, _)| *option_id == id)
            {
                choice.set(None);
            }
        }
    });

    let on_plot = move |_| {
        let Some((from, to)) = route_request(route_from.get_untracked(), route_to.get_untracked())
        else {
            return;
        };
        let request_nonce = route_nonce.get_untracked().wrapping_add(1);
        route_nonce.set(request_nonce);

        wasm_bindgen_futures::spawn_local(async move {
            let result = api::fetch_route(from, to).await;
            if !route_result_current(
                (request_nonce, from, to),
                route_nonce.get_untracked(),
                route_from.get_untracked(),
                route_to.get_untracked(),
            ) {
                return;
            }
            let path = match result {
                Ok(path) => path,
                Err(err) => {
                    web_sys::console::warn_1(
                        &format!("Route {from} -> {to} failed: {err}").into(),
                    );
                    raise_notice(notice, err.route_notice());
                    return;
                }
            };
            match galaxy.try_update(|g| g.show_route(path)) {
                Some(Ok(change)) => viewport.update(|vp| change.apply(vp)),
                Some(Err(err)) => {
                    web_sys::console::warn_1(&format!("Route {from} -> {to}: {err}").into());
                    raise_notice(notice, "NO ROUTE FOUND BETWEEN SELECTED LOCATIONS");
                }
                None => {}
            }
        });
    };

    let on_clear = move |_| {
        clear_route(galaxy, route_nonce);
        route_from.set(None);
        route_to.set(None);
    };

    view! {
        <div class="control-group route-group">
            <LocationSelect id="route-from" placeholder="FROM..." choice=route_from options=options />
            <LocationSelect id="route-to" placeholder="TO..." choice=route_to options=options />
            <button
                id="plot-route-btn"
                disabled=move || route_request(route_from.get(), route_to.get()).is_none()
                on:click=on_plot
            >
                "PLOT ROUTE"
            </button>
            <button id="clear-route-btn" disabled=move || !has_route.get() on:click=on_clear>
                "CLEAR ROUTE"
            </button>
            {move || summary.get().map(|text| view! { <div class="route-summary">{text}</div> })}
        </div>
    }
}

#[component]
pub fn ViewControls() -> impl IntoView {
    let Galaxy(galaxy) = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let ShowLabels(show_labels) = expect_context();
    let ShowRoutes(show_routes) = expect_context();
    let ShowNpcs(show_npcs) = expect_context();

    view! {
        <div class="control-group view-group">
            <button id="fit-bounds-btn" on:click=move |_| fit_map(galaxy, viewport)>"FIT VIEW"</button>
            <button
                id="toggle-labels-btn"
                class:toggle-active=move || show_labels.get()
                on:click=move |_| show_labels.update(|v| *v = !*v)
            >
                {move || labels_button_text(show_labels.get())}
            </button>
            <button
                id="toggle-routes-btn"
                class:toggle-active=move || show_routes.get()
                on:click=move |_| show_routes.update(|v| *v = !*v)
            >
                {move || routes_button_text(show_routes.get())}
            </button>
            <button
                id="toggle-npcs-btn"
                class:toggle-active=move || show_npcs.get()
                on:click=move |_| show_npcs.update(|v| *v = !*v)
            >
                "NPCS"
            </button>
        </div>
    }
}

/// Transient message for failed user actions.
#[component]
pub fn NoticeBanner() -> impl IntoView {
    let Notice(notice) = expect_context();

    view! {
        {move || {
            notice.get().map(|message| {
                view! {
                    <div class="notice-banner" on:click=move |_| notice.set(None)>
                        {message}
                    </div>
                }
            })
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_needs_two_distinct_ends() {
        assert_eq!(route_request(Some(1), Some(2)), Some((1, 2)));
        assert_eq!(route_request(Some(1), Some(1)), None);
        assert_eq!(route_request(None, Some(2)), None);
        assert_eq!(route_request(Some(1), None), None);
    }

    #[test]
    fn route_result_needs_matching_nonce_and_ends() {
        assert!(route_result_current((4, 1, 2), 4, Some(1), Some(2)));
        assert!(!route_result_current((4, 1, 2), 5, Some(1), Some(2)));
        assert!(!route_result_current((4, 1, 2), 4, Some(1), Some(3)));
        assert!(!route_result_current((4, 1, 2), 4, None, Some(2)));
    }

    #[test]
    fn route_summary_falls_back_to_ids() {
        let waypoints = [
            Waypoint {
                location_id: 1,
                name: "Alpha".into(),
                x_coord: 0.0,
                y_coord: 0.0,
            },
            Waypoint {
                location_id: 9,
                name: String::new(),
                x_coord: 5.0,
                y_coord: 5.0,
            },
        ];
        assert_eq!(route_summary(&waypoints), "Alpha → #9");
        assert_eq!(route_summary(&[]), "");
    }

    #[test]
    fn select_values() {
        assert_eq!(parse_location_choice("42"), Some(42));
        assert_eq!(parse_location_choice(""), None);
        assert_eq!(parse_location_choice("abc"), None);
    }

    #[test]
    fn button_texts() {
        assert_eq!(contacts_text(3), "3 CONTACTS");
        assert_eq!(routes_button_text(false), "SHOW ROUTES");
        assert_eq!(routes_button_text(true), "HIDE ROUTES");
        assert_eq!(labels_button_text(true), "HIDE LABELS");
    }
}
