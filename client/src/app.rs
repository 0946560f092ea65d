use std::cell::RefCell;

use gloo_storage::Storage;
use gloo_timers::callback::Timeout;
use leptos::prelude::*;

use starchart_shared::{CorridorId, MapEvent};

use crate::canvas::MapCanvas;
use crate::colors::Theme;
use crate::config::{LOADING_HIDE_DELAY_MS, SETTINGS_KEY, Settings};
use crate::controls::{self, Header, NoticeBanner, RouteControls, SearchBox, ViewControls};
use crate::galaxy::GalaxyView;
use crate::panel::{CorridorPanel, LocationPanel};
use crate::viewport::Viewport;
use crate::ws::{self, ConnectionStatus};

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Newtype wrappers so same-typed signals get distinct context slots.
#[derive(Clone, Copy)]
pub(crate) struct Galaxy(pub RwSignal<GalaxyView>);
#[derive(Clone, Copy)]
pub(crate) struct ActiveTheme(pub RwSignal<Theme>);
#[derive(Clone, Copy)]
pub(crate) struct HoveredCorridor(pub RwSignal<Option<CorridorId>>);
#[derive(Clone, Copy)]
pub(crate) struct ShowLabels(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct ShowRoutes(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct ShowNpcs(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct HeaderExpanded(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct Notice(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct RouteNonce(pub RwSignal<u64>);

fn set_body_class(class: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(body) = window.document().and_then(|d| d.body()) else {
        return;
    };
    body.set_class_name(class);
}

/// Root application component. Provides global reactive signals via context.
#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();

    let show_labels: RwSignal<bool> = RwSignal::new(saved.show_labels);
    let show_routes: RwSignal<bool> = RwSignal::new(saved.show_routes);
    let show_npcs: RwSignal<bool> = RwSignal::new(saved.show_npcs);
    let header_expanded: RwSignal<bool> = RwSignal::new(saved.header_expanded);

    let galaxy: RwSignal<GalaxyView> = RwSignal::new(GalaxyView::new(
        saved.show_labels,
        saved.show_routes,
        saved.show_npcs,
    ));
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    let theme: RwSignal<Theme> = RwSignal::new(Theme::from_unit(js_sys::Math::random()));
    let hovered_corridor: RwSignal<Option<CorridorId>> = RwSignal::new(None);
    let connection: RwSignal<ConnectionStatus> = RwSignal::new(ConnectionStatus::Connecting);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);
    let route_nonce: RwSignal<u64> = RwSignal::new(0);
    let loading_hidden: RwSignal<bool> = RwSignal::new(false);
    let loading_timer_set: RwSignal<bool> = RwSignal::new(false);

    provide_context(Galaxy(galaxy));
    provide_context(viewport);
    provide_context(ActiveTheme(theme));
    provide_context(HoveredCorridor(hovered_corridor));
    provide_context(connection);
    provide_context(ShowLabels(show_labels));
    provide_context(ShowRoutes(show_routes));
    provide_context(ShowNpcs(show_npcs));
    provide_context(HeaderExpanded(header_expanded));
    provide_context(Notice(notice));
    provide_context(RouteNonce(route_nonce));

    // Persist settings to localStorage on any change
    Effect::new(move || {
        let settings = Settings {
            show_labels: show_labels.get(),
            show_routes: show_routes.get(),
            show_npcs: show_npcs.get(),
            header_expanded: header_expanded.get(),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    Effect::new(move || {
        let show = show_labels.get();
        let vp = viewport.get_untracked();
        galaxy.update(|g| g.set_show_labels(show, &vp));
    });

    Effect::new(move || {
        let show = show_routes.get();
        if !show {
            hovered_corridor.set(None);
        }
        galaxy.update(|g| g.set_show_routes(show));
    });

    Effect::new(move || {
        let show = show_npcs.get();
        galaxy.update(|g| g.set_show_npcs(show));
    });

    Effect::new(move || {
        set_body_class(&theme.get().body_class());
    });

    // Connect the push feed on mount
    Effect::new(move || {
        let on_event = move |event: MapEvent| {
            let vp = viewport.get_untracked();
            let Some(applied) = galaxy.try_update(|g| g.apply(event, &vp)) else {
                return;
            };
            if !applied.skipped_corridors.is_empty() {
                web_sys::console::warn_1(
                    &format!(
                        "Skipped corridors with unresolved endpoints: {:?}",
                        applied.skipped_corridors
                    )
                    .into(),
                );
            }
            if let Some(name) = applied.theme {
                match Theme::parse(&name) {
                    Some(parsed) => theme.set(parsed),
                    None => {
                        web_sys::console::warn_1(&format!("Unknown theme '{name}'").into());
                    }
                }
            }
            if let Some(change) = applied.view {
                viewport.update(|vp| change.apply(vp));
            }
        };
        ws::connect(on_event, connection);
        on_cleanup(ws::disconnect);
    });

    // Hide the loading overlay a moment after the first snapshot lands.
    Effect::new(move || {
        if !galaxy.with(|g| g.is_loaded()) || loading_timer_set.get_untracked() {
            return;
        }
        loading_timer_set.set(true);
        galaxy.with_untracked(|g| {
            web_sys::console::info_1(
                &format!(
                    "Galaxy loaded: {} locations, {} corridors",
                    g.location_count(),
                    g.corridor_count()
                )
                .into(),
            );
        });
        let timer = Timeout::new(LOADING_HIDE_DELAY_MS, move || loading_hidden.set(true));
        timer.forget();
    });

    // Global keyboard shortcuts
    Effect::new(move || {
        use wasm_bindgen::JsCast;
        use wasm_bindgen::prelude::*;
        let Some(window) = web_sys::window() else {
            return;
        };
        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });
        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                let target = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok());
                let target_tag = target.as_ref().map(|el| el.tag_name()).unwrap_or_default();
                // Don't intercept while typing or choosing
                if matches!(target_tag.as_str(), "INPUT" | "TEXTAREA" | "SELECT") {
                    if key == "Escape"
                        && let Some(el) = target
                    {
                        el.blur().ok();
                    }
                    return;
                }
                match key.as_str() {
                    "Escape" => {
                        galaxy.update(|g| g.hide_location_panel());
                        controls::clear_route(galaxy, route_nonce);
                    }
                    "f" | "F" => controls::fit_map(galaxy, viewport),
                    "l" | "L" => show_labels.update(|v| *v = !*v),
                    "r" | "R" => show_routes.update(|v| *v = !*v),
                    "h" | "H" => header_expanded.update(|v| *v = !*v),
                    _ => {}
                }
            });
        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <Header>
            <SearchBox />
            <RouteControls />
            <ViewControls />
        </Header>
        <div id="map" class:header-collapsed=move || !header_expanded.get()>
            <MapCanvas />
        </div>
        <LocationPanel />
        <CorridorPanel />
        <NoticeBanner />
        <div id="loading-overlay" class="loading-overlay" class:hidden=move || loading_hidden.get()>
            <div class="loading-spinner"></div>
            <div class="loading-text">"INITIALIZING NAVIGATION SYSTEMS..."</div>
        </div>
    }
}
