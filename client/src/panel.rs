use leptos::prelude::*;

use starchart_shared::{
    Alignment, Location, NpcPresence, NpcTransit, PlayerPresence, PlayerTransit, StaticNpc,
    SubLocation,
};

use crate::api;
use crate::app::{Galaxy, HeaderExpanded};
use crate::markers::{type_icon, wealth_display};

/// "12 minutes 5 seconds".
pub fn format_travel_time(secs: u32) -> String {
    format!("{} minutes {} seconds", secs / 60, secs % 60)
}

/// Population with thousands separators; zero reads as unknown.
pub fn format_population(population: u64) -> String {
    if population == 0 {
        return "UNKNOWN".to_string();
    }
    let digits = population.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Banner class and text for non-neutral locations.
pub const fn alignment_banner(alignment: Alignment) -> Option<(&'static str, &'static str)> {
    match alignment {
        Alignment::Loyalist => Some(("alignment-panel alignment-loyalist", "🛡️ LOYALISTS")),
        Alignment::Outlaw => Some(("alignment-panel alignment-outlaw", "⚔️ OUTLAWS")),
        Alignment::Neutral | Alignment::Unknown => None,
    }
}

pub fn sub_location_line(sub: &SubLocation) -> String {
    format!(
        "{} {} - {}",
        sub.icon.as_deref().unwrap_or("📍"),
        sub.name.to_uppercase(),
        sub.description
    )
}

pub fn npc_line(npc: &NpcPresence) -> String {
    format!(
        "{} ({}) - {}",
        npc.name.to_uppercase(),
        npc.callsign,
        npc.ship_name
    )
}

pub fn inhabitant_line(npc: &StaticNpc) -> String {
    let age = npc.age.map_or_else(|| "?".to_string(), |a| a.to_string());
    format!(
        "{} ({age}) - {}",
        npc.name.to_uppercase(),
        npc.occupation.to_uppercase()
    )
}

pub fn player_transit_line(player: &PlayerTransit) -> String {
    format!(
        "{} ({} → {})",
        player.name, player.origin, player.destination
    )
}

/// Two lines: who and where.
pub fn npc_transit_lines(npc: &NpcTransit) -> (String, String) {
    (
        format!("{} ({}) - {}", npc.name, npc.callsign, npc.ship_name),
        format!("{} → {}", npc.origin, npc.destination),
    )
}

/// Details for the selected location. Hidden while nothing is selected.
#[component]
pub fn LocationPanel() -> impl IntoView {
    let Galaxy(galaxy) = expect_context();
    let HeaderExpanded(header_expanded) = expect_context();

    let selected_id = Memo::new(move |_| galaxy.with(|g| g.selection().location));
    let selected: Memo<Option<Location>> =
        Memo::new(move |_| galaxy.with(|g| g.selected_location().cloned()));
    let present: Memo<(Vec<PlayerPresence>, Vec<NpcPresence>)> = Memo::new(move |_| {
        galaxy.with(|g| match g.selection().location {
            Some(id) => (g.players_at(id).to_vec(), g.npcs_at(id).to_vec()),
            None => (Vec::new(), Vec::new()),
        })
    });

    let sub_locations: RwSignal<Vec<SubLocation>> = RwSignal::new(Vec::new());
    let sub_request_nonce: RwSignal<u64> = RwSignal::new(0);

    // Fetch areas whenever the selection changes; late answers for a
    // location that is no longer selected are dropped.
    Effect::new(move || {
        let request_nonce = sub_request_nonce.get_untracked().wrapping_add(1);
        sub_request_nonce.set(request_nonce);
        sub_locations.set(Vec::new());

        let Some(id) = selected_id.get() else {
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            let subs = match api::fetch_sub_locations(id).await {
                Ok(subs) => subs,
                Err(err) => {
                    web_sys::console::warn_1(
                        &format!("Failed to fetch sub-locations for {id}: {err}").into(),
                    );
                    Vec::new()
                }
            };
            if sub_request_nonce.get_untracked() != request_nonce
                || selected_id.get_untracked() != Some(id)
            {
                return;
            }
            sub_locations.set(subs);
        });
    });

    let on_close = move |_| galaxy.update(|g| g.hide_location_panel());

    view! {
        <div
            id="location-panel"
            class="location-panel"
            class:hidden=move || selected.get().is_none()
            class:header-collapsed=move || !header_expanded.get()
        >
            <div class="panel-header">
                <h2 id="location-title">
                    {move || selected.get().map(|l| l.name.to_uppercase()).unwrap_or_default()}
                </h2>
                <button id="close-panel" class="panel-close" on:click=on_close>"×"</button>
            </div>
            <div id="location-details">
                {move || {
                    let Some(location) = selected.get() else {
                        return ().into_any();
                    };
                    let (players, npcs) = present.get();
                    let subs = sub_locations.get();
                    view! {
                        <LocationDetails location=location players=players npcs=npcs subs=subs />
                    }
                    .into_any()
                }}
            </div>
        </div>
    }
}

#[component]
fn LocationDetails(
    location: Location,
    players: Vec<PlayerPresence>,
    npcs: Vec<NpcPresence>,
    subs: Vec<SubLocation>,
) -> impl IntoView {
    let kind = location.kind();
    let nobody_here = players.is_empty() && npcs.is_empty() && location.static_npcs.is_empty();
    let description = if location.description.trim().is_empty() {
        "No description available.".to_string()
    } else {
        location.description.clone()
    };

    view! {
        {alignment_banner(location.alignment)
            .map(|(class, text)| view! { <div class=class>{text}</div> })}
        <div class="location-detail">
            <strong>{format!("{} TYPE:", type_icon(kind))}</strong>
            {format!(" {}", location.location_type.to_uppercase())}
        </div>
        <div class="location-detail">
            <strong>"💰 WEALTH:"</strong>
            {format!(" {}", wealth_display(location.wealth_level))}
        </div>
        <div class="location-detail">
            <strong>"👥 POPULATION:"</strong>
            {format!(" {}", format_population(location.population))}
        </div>
        <div class="location-detail">
            <strong>"📍 COORDINATES:"</strong>
            {format!(" ({}, {})", location.x_coord, location.y_coord)}
        </div>
        <div class="location-detail">
            <strong>"📄 DESCRIPTION:"</strong>
            <div class="location-description">{description}</div>
        </div>
        {(!subs.is_empty()).then(|| view! {
            <div class="sub-locations">
                <strong>"🏢 AVAILABLE AREAS:"</strong>
                {subs.iter().map(|sub| view! {
                    <div class="sub-location-item">{sub_location_line(sub)}</div>
                }).collect_view()}
            </div>
        })}
        {(!players.is_empty()).then(|| view! {
            <div class="players-list">
                <strong>{format!("👥 CONTACTS PRESENT ({}):", players.len())}</strong>
                {players.iter().map(|player| view! {
                    <div class="player-item">
                        <span class="status-indicator status-online"></span>
                        {player.name.to_uppercase()}
                    </div>
                }).collect_view()}
            </div>
        })}
        {(!npcs.is_empty()).then(|| view! {
            <div class="players-list">
                <strong>{format!("🤖 NPCS PRESENT ({}):", npcs.len())}</strong>
                {npcs.iter().map(|npc| view! {
                    <div class="player-item">
                        <span class="status-indicator status-npc"></span>
                        {npc_line(npc)}
                    </div>
                }).collect_view()}
            </div>
        })}
        {(!location.static_npcs.is_empty()).then(|| view! {
            <div class="players-list">
                <strong>{format!("👤 NOTABLE INHABITANTS ({}):", location.static_npcs.len())}</strong>
                {location.static_npcs.iter().map(|npc| view! {
                    <div class="player-item">
                        <span class="status-indicator status-inhabitant"></span>
                        {inhabitant_line(npc)}
                        <div class="inhabitant-personality">{npc.personality.clone()}</div>
                    </div>
                }).collect_view()}
            </div>
        })}
        {nobody_here.then(|| view! {
            <div class="location-detail">
                <em>"No contacts, NPCs, or notable inhabitants currently present"</em>
            </div>
        })}
    }
}

/// Details for the selected corridor and whoever is travelling it.
#[component]
pub fn CorridorPanel() -> impl IntoView {
    let Galaxy(galaxy) = expect_context();

    let selected = Memo::new(move |_| {
        galaxy.with(|g| {
            g.selected_corridor().map(|(corridor, kind)| {
                (
                    corridor.clone(),
                    kind,
                    g.players_in_transit(corridor.corridor_id).to_vec(),
                    g.npcs_in_transit(corridor.corridor_id).to_vec(),
                )
            })
        })
    });

    let on_close = move |_| galaxy.update(|g| g.clear_corridor_selection());

    view! {
        <div
            id="corridor-info-panel"
            class="corridor-info-overlay"
            style:display=move || if selected.get().is_some() { "block" } else { "none" }
        >
            {move || {
                let Some((corridor, kind, players, npcs)) = selected.get() else {
                    return ().into_any();
                };
                let empty = players.is_empty() && npcs.is_empty();
                view! {
                    <div class="corridor-info-panel">
                        <h3>{corridor.name.clone()}</h3>
                        <div class="corridor-details">
                            <p><strong>"Type:"</strong>{format!(" {}", kind.label())}</p>
                            <p><strong>"Travel Time:"</strong>{format!(" {}", format_travel_time(corridor.travel_time))}</p>
                            <p><strong>"Fuel Cost:"</strong>{format!(" {} units", corridor.fuel_cost)}</p>
                            <p><strong>"Danger Level:"</strong>{format!(" {}/5", corridor.danger_level)}</p>
                        </div>
                        {(!players.is_empty()).then(|| view! {
                            <div class="transit-players">
                                <h4>"Players in Transit:"</h4>
                                {players.iter().map(|p| view! {
                                    <div class="transit-player">{player_transit_line(p)}</div>
                                }).collect_view()}
                            </div>
                        })}
                        {(!npcs.is_empty()).then(|| view! {
                            <div class="transit-players">
                                <h4>"NPCs in Transit:"</h4>
                                {npcs.iter().map(|npc| {
                                    let (who, route) = npc_transit_lines(npc);
                                    view! {
                                        <div class="transit-player transit-npc">
                                            {who}<br />{route}
                                        </div>
                                    }
                                }).collect_view()}
                            </div>
                        })}
                        {empty.then(|| view! { <p>"No players or NPCs currently in transit"</p> })}
                        <button on:click=on_close>"Close"</button>
                    </div>
                }
                .into_any()
            }}
        </div>
    }
}
