//! Map-side index of the galaxy and the overlays that render it.
//!
//! `GalaxyView` owns every overlay in the scene. Full snapshots tear the index
//! down and rebuild it; partial updates rebuild only their own category. The
//! view never talks to the browser, so everything here runs under plain
//! `cargo test`.

use std::collections::BTreeMap;

use thiserror::Error;

use starchart_shared::{
    Corridor, CorridorId, CorridorKind, GalaxySnapshot, Location, LocationId, MapEvent,
    NpcPresence, NpcTransit, PlayerPresence, PlayerTransit, Waypoint, classify,
};

use crate::config::{FIT_PADDING_PX, FOCUS_ZOOM, SEARCH_FIT_PADDING_PX};
use crate::labels;
use crate::markers::{Highlight, RingKind};
use crate::scene::{
    CorridorHitOverlay, CorridorOverlay, MarkerOverlay, Overlay, OverlayId, RingOverlay,
    RouteOverlay, Scene, TransitHighlight,
};
use crate::viewport::{Viewport, WorldRect};

/// A camera move requested by a galaxy operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewChange {
    Fit { rect: WorldRect, padding: f64 },
    Center { x: f64, y: f64, zoom: f64 },
}

impl ViewChange {
    pub fn apply(self, vp: &mut Viewport) {
        match self {
            Self::Fit { rect, padding } => vp.fit_bounds(rect, padding),
            Self::Center { x, y, zoom } => vp.set_view(x, y, zoom),
        }
    }
}

/// Side effects of applying one push message that the caller must carry out.
#[derive(Debug, Default, PartialEq)]
pub struct Applied {
    pub theme: Option<String>,
    pub view: Option<ViewChange>,
    /// Corridors dropped because an endpoint could not be resolved.
    pub skipped_corridors: Vec<CorridorId>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route needs at least two waypoints, got {0}")]
    TooShort(usize),
    #[error("route passes through unknown location {0}")]
    UnknownWaypoint(LocationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub location: Option<LocationId>,
    pub corridor: Option<CorridorId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    overlay: OverlayId,
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone)]
struct LocationEntry {
    location: Location,
    marker: OverlayId,
    player_ring: Option<OverlayId>,
    npc_ring: Option<OverlayId>,
    label: Option<OverlayId>,
}

#[derive(Debug, Clone)]
struct CorridorEntry {
    corridor: Corridor,
    kind: CorridorKind,
    from: (f64, f64),
    to: (f64, f64),
    line: OverlayId,
    hit: OverlayId,
}

#[derive(Debug, Clone)]
pub struct GalaxyView {
    scene: Scene,
    locations: BTreeMap<LocationId, LocationEntry>,
    corridors: BTreeMap<CorridorId, CorridorEntry>,
    players_at: BTreeMap<LocationId, Vec<PlayerPresence>>,
    npcs_at: BTreeMap<LocationId, Vec<NpcPresence>>,
    players_in_transit: BTreeMap<CorridorId, Vec<PlayerTransit>>,
    npcs_in_transit: BTreeMap<CorridorId, Vec<NpcTransit>>,
    highlights: BTreeMap<LocationId, Highlight>,
    selection: Selection,
    route: Option<ActiveRoute>,
    total_player_count: Option<u32>,
    show_labels: bool,
    show_routes: bool,
    show_npcs: bool,
    loaded: bool,
}

impl Default for GalaxyView {
    fn default() -> Self {
        Self::new(false, false, true)
    }
}

impl GalaxyView {
    pub fn new(show_labels: bool, show_routes: bool, show_npcs: bool) -> Self {
        Self {
            scene: Scene::default(),
            locations: BTreeMap::new(),
            corridors: BTreeMap::new(),
            players_at: BTreeMap::new(),
            npcs_at: BTreeMap::new(),
            players_in_transit: BTreeMap::new(),
            npcs_in_transit: BTreeMap::new(),
            highlights: BTreeMap::new(),
            selection: Selection::default(),
            route: None,
            total_player_count: None,
            show_labels,
            show_routes,
            show_npcs,
            loaded: false,
        }
    }

    /// Apply one decoded push message.
    pub fn apply(&mut self, event: MapEvent, vp: &Viewport) -> Applied {
        match event {
            MapEvent::GalaxyData(snapshot) => return self.apply_snapshot(snapshot, vp),
            MapEvent::PlayerUpdate(players) => self.apply_players(players),
            MapEvent::NpcUpdate(npcs) => self.apply_npcs(npcs),
            MapEvent::TransitUpdate(transit) => self.apply_player_transit(transit),
            MapEvent::NpcTransitUpdate(transit) => self.apply_npc_transit(transit),
            MapEvent::LocationUpdate(location) => self.upsert_location(location, vp),
        }
        Applied::default()
    }

    pub fn apply_snapshot(&mut self, snapshot: GalaxySnapshot, vp: &Viewport) -> Applied {
        self.teardown();

        let GalaxySnapshot {
            locations,
            corridors,
            players,
            dynamic_npcs,
            players_in_transit,
            npcs_in_transit,
            selected_theme,
            total_player_count,
        } = snapshot;

        self.players_in_transit = group_by(players_in_transit, |t| t.corridor_id);
        self.npcs_in_transit = group_by(npcs_in_transit, |t| t.corridor_id);
        self.total_player_count = total_player_count;

        for location in locations {
            self.insert_location(location);
        }

        let mut skipped_corridors = Vec::new();
        for corridor in corridors {
            let id = corridor.corridor_id;
            if !self.insert_corridor(corridor) {
                skipped_corridors.push(id);
            }
        }

        self.refresh_corridor_highlighting();
        self.apply_route_visibility();
        self.apply_players(players);
        self.apply_npcs(dynamic_npcs);
        self.relabel(vp);
        self.loaded = true;

        Applied {
            theme: selected_theme,
            view: self.fit_all(),
            skipped_corridors,
        }
    }

    pub fn apply_players(&mut self, players: Vec<PlayerPresence>) {
        self.players_at = group_by(players, |p| p.location_id);
        let ids: Vec<LocationId> = self.locations.keys().copied().collect();
        for id in ids {
            self.refresh_ring(id, RingKind::Players);
        }
    }

    pub fn apply_npcs(&mut self, npcs: Vec<NpcPresence>) {
        self.npcs_at = group_by(npcs, |n| n.location_id);
        let ids: Vec<LocationId> = self.locations.keys().copied().collect();
        for id in ids {
            self.refresh_ring(id, RingKind::Npcs);
        }
    }

    pub fn apply_player_transit(&mut self, transit: Vec<PlayerTransit>) {
        self.players_in_transit = group_by(transit, |t| t.corridor_id);
        self.refresh_corridor_highlighting();
    }

    pub fn apply_npc_transit(&mut self, transit: Vec<NpcTransit>) {
        self.npcs_in_transit = group_by(transit, |t| t.corridor_id);
        self.refresh_corridor_highlighting();
    }

    /// Replace a single location record and rebuild its overlays. Corridor
    /// classification is left as it was computed at creation.
    pub fn upsert_location(&mut self, location: Location, vp: &Viewport) {
        let id = location.location_id;
        self.insert_location(location);
        self.refresh_ring(id, RingKind::Players);
        self.refresh_ring(id, RingKind::Npcs);
        self.relabel(vp);
    }

    // --- index maintenance ---

    fn teardown(&mut self) {
        for entry in std::mem::take(&mut self.locations).into_values() {
            self.remove_location_overlays(&entry);
        }
        for entry in std::mem::take(&mut self.corridors).into_values() {
            self.scene.remove(entry.line);
            self.scene.remove(entry.hit);
        }
        if let Some(route) = self.route.take() {
            self.scene.remove(route.overlay);
        }
        debug_assert!(self.scene.is_empty(), "untracked overlay survived teardown");

        self.players_at.clear();
        self.npcs_at.clear();
        self.players_in_transit.clear();
        self.npcs_in_transit.clear();
        self.highlights.clear();
        self.selection = Selection::default();
        self.total_player_count = None;
    }

    fn remove_location_overlays(&mut self, entry: &LocationEntry) {
        self.scene.remove(entry.marker);
        for id in [entry.player_ring, entry.npc_ring, entry.label]
            .into_iter()
            .flatten()
        {
            self.scene.remove(id);
        }
    }

    fn insert_location(&mut self, location: Location) {
        let id = location.location_id;
        if let Some(old) = self.locations.remove(&id) {
            self.remove_location_overlays(&old);
        }
        let marker = self.scene.add(Overlay::Marker(MarkerOverlay {
            location_id: id,
            pos: (location.x_coord, location.y_coord),
            kind: location.kind(),
            alignment: location.alignment,
            highlight: self.highlights.get(&id).copied(),
        }));
        self.locations.insert(
            id,
            LocationEntry {
                location,
                marker,
                player_ring: None,
                npc_ring: None,
                label: None,
            },
        );
    }

    fn endpoint(&self, id: LocationId) -> Option<(f64, f64)> {
        self.locations
            .get(&id)
            .map(|e| (e.location.x_coord, e.location.y_coord))
    }

    fn insert_corridor(&mut self, corridor: Corridor) -> bool {
        let endpoints = match corridor.wire_endpoints() {
            Some(([ox, oy], [dx, dy])) => Some(((ox, oy), (dx, dy))),
            None => self
                .endpoint(corridor.origin_location)
                .zip(self.endpoint(corridor.destination_location)),
        };
        let Some((from, to)) = endpoints else {
            return false;
        };

        let kind = classify(
            &corridor.name,
            self.locations
                .get(&corridor.origin_location)
                .map(|e| e.location.kind()),
            self.locations
                .get(&corridor.destination_location)
                .map(|e| e.location.kind()),
        );
        let id = corridor.corridor_id;
        if let Some(old) = self.corridors.remove(&id) {
            self.scene.remove(old.line);
            self.scene.remove(old.hit);
        }
        let line = self.scene.add(Overlay::Corridor(CorridorOverlay {
            corridor_id: id,
            from,
            to,
            kind,
            transit: TransitHighlight::None,
            hidden: !self.show_routes,
        }));
        let hit = self.scene.add(Overlay::CorridorHit(CorridorHitOverlay {
            corridor_id: id,
            from,
            to,
            interactive: self.show_routes,
        }));
        self.corridors.insert(
            id,
            CorridorEntry {
                corridor,
                kind,
                from,
                to,
                line,
                hit,
            },
        );
        true
    }

    fn refresh_ring(&mut self, id: LocationId, kind: RingKind) {
        let present = match kind {
            RingKind::Players => self.players_at.get(&id).is_some_and(|v| !v.is_empty()),
            RingKind::Npcs => self.npcs_at.get(&id).is_some_and(|v| !v.is_empty()),
        };
        let hidden = kind == RingKind::Npcs && !self.show_npcs;
        let Some(entry) = self.locations.get_mut(&id) else {
            return;
        };
        let pos = (entry.location.x_coord, entry.location.y_coord);
        let slot = match kind {
            RingKind::Players => &mut entry.player_ring,
            RingKind::Npcs => &mut entry.npc_ring,
        };
        if let Some(old) = slot.take() {
            self.scene.remove(old);
        }
        if present {
            *slot = Some(self.scene.add(Overlay::Ring(RingOverlay {
                location_id: id,
                pos,
                kind,
                hidden,
            })));
        }
    }

    fn refresh_corridor_highlighting(&mut self) {
        for (id, entry) in &self.corridors {
            let transit = TransitHighlight::of(
                self.players_in_transit.contains_key(id),
                self.npcs_in_transit.contains_key(id),
            );
            if let Some(Overlay::Corridor(line)) = self.scene.get_mut(entry.line) {
                line.transit = transit;
            }
        }
    }

    fn apply_route_visibility(&mut self) {
        let show = self.show_routes;
        for entry in self.corridors.values() {
            if let Some(Overlay::Corridor(line)) = self.scene.get_mut(entry.line) {
                line.hidden = !show;
            }
            if let Some(Overlay::CorridorHit(hit)) = self.scene.get_mut(entry.hit) {
                hit.interactive = show;
            }
        }
        if let Some(route) = &self.route
            && let Some(Overlay::Route(line)) = self.scene.get_mut(route.overlay)
        {
            line.hidden = !show;
        }
    }

    // --- highlights and selection ---

    fn set_highlight(&mut self, id: LocationId, highlight: Option<Highlight>) {
        let Some(entry) = self.locations.get(&id) else {
            return;
        };
        match highlight {
            Some(h) => self.highlights.insert(id, h),
            None => self.highlights.remove(&id),
        };
        if let Some(Overlay::Marker(marker)) = self.scene.get_mut(entry.marker) {
            marker.highlight = highlight;
        }
    }

    pub fn clear_highlights(&mut self) {
        let ids: Vec<LocationId> = self.highlights.keys().copied().collect();
        for id in ids {
            self.set_highlight(id, None);
        }
    }

    /// Select a location and highlight it. Unknown ids are ignored.
    pub fn select_location(&mut self, id: LocationId) -> bool {
        if !self.locations.contains_key(&id) {
            return false;
        }
        self.selection.location = Some(id);
        self.clear_highlights();
        self.set_highlight(id, Some(Highlight::Focus));
        true
    }

    /// Close the location panel: drop the selection and every highlight.
    pub fn hide_location_panel(&mut self) {
        self.selection.location = None;
        self.clear_highlights();
    }

    pub fn select_corridor(&mut self, id: CorridorId) -> bool {
        if !self.corridors.contains_key(&id) {
            return false;
        }
        self.selection.corridor = Some(id);
        true
    }

    pub fn clear_corridor_selection(&mut self) {
        self.selection.corridor = None;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The selected location, re-resolved through the index.
    pub fn selected_location(&self) -> Option<&Location> {
        self.location(self.selection.location?)
    }

    pub fn selected_corridor(&self) -> Option<(&Corridor, CorridorKind)> {
        let entry = self.corridors.get(&self.selection.corridor?)?;
        Some((&entry.corridor, entry.kind))
    }

    // --- search ---

    /// Highlight every location whose name or type contains `query`.
    pub fn search(&mut self, query: &str) -> Option<ViewChange> {
        self.clear_highlights();
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let hits: Vec<(LocationId, f64, f64)> = self
            .locations
            .values()
            .map(|e| &e.location)
            .filter(|l| {
                l.name.to_lowercase().contains(&needle)
                    || l.location_type.to_lowercase().contains(&needle)
            })
            .map(|l| (l.location_id, l.x_coord, l.y_coord))
            .collect();

        for &(id, _, _) in &hits {
            self.set_highlight(id, Some(Highlight::Focus));
        }
        match hits.as_slice() {
            [] => None,
            [(id, x, y)] => {
                self.select_location(*id);
                Some(ViewChange::Center {
                    x: *x,
                    y: *y,
                    zoom: FOCUS_ZOOM,
                })
            }
            many => WorldRect::around(many.iter().map(|&(_, x, y)| (x, y))).map(|rect| {
                ViewChange::Fit {
                    rect,
                    padding: SEARCH_FIT_PADDING_PX,
                }
            }),
        }
    }

    // --- routes ---

    /// Replace the active route. Fewer than two waypoints, or a waypoint no
    /// longer in the index, is a failure and leaves the current route
    /// untouched.
    pub fn show_route(&mut self, waypoints: Vec<Waypoint>) -> Result<ViewChange, RouteError> {
        let points: Vec<(f64, f64)> = waypoints.iter().map(|w| (w.x_coord, w.y_coord)).collect();
        let Some(rect) = WorldRect::around(points.iter().copied()).filter(|_| points.len() >= 2)
        else {
            return Err(RouteError::TooShort(points.len()));
        };
        if let Some(missing) = waypoints
            .iter()
            .find(|w| !self.locations.contains_key(&w.location_id))
        {
            return Err(RouteError::UnknownWaypoint(missing.location_id));
        }

        self.clear_route();
        let overlay = self.scene.add(Overlay::Route(RouteOverlay {
            points,
            hidden: !self.show_routes,
        }));
        for waypoint in &waypoints {
            self.set_highlight(waypoint.location_id, Some(Highlight::Route));
        }
        self.route = Some(ActiveRoute { overlay, waypoints });
        Ok(ViewChange::Fit {
            rect,
            padding: FIT_PADDING_PX,
        })
    }

    pub fn clear_route(&mut self) {
        if let Some(route) = self.route.take() {
            self.scene.remove(route.overlay);
        }
        self.clear_highlights();
    }

    pub fn route(&self) -> Option<&ActiveRoute> {
        self.route.as_ref()
    }

    // --- toggles ---

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    pub fn show_routes(&self) -> bool {
        self.show_routes
    }

    pub fn show_npcs(&self) -> bool {
        self.show_npcs
    }

    pub fn set_show_labels(&mut self, show: bool, vp: &Viewport) {
        self.show_labels = show;
        self.relabel(vp);
    }

    /// Hiding routes also drops the corridor selection.
    pub fn set_show_routes(&mut self, show: bool) {
        self.show_routes = show;
        self.apply_route_visibility();
        if !show {
            self.clear_corridor_selection();
        }
    }

    pub fn set_show_npcs(&mut self, show: bool) {
        self.show_npcs = show;
        for entry in self.locations.values() {
            if let Some(id) = entry.npc_ring
                && let Some(Overlay::Ring(ring)) = self.scene.get_mut(id)
            {
                ring.hidden = !show;
            }
        }
    }

    // --- labels ---

    pub fn remove_labels(&mut self) {
        for entry in self.locations.values_mut() {
            if let Some(id) = entry.label.take() {
                self.scene.remove(id);
            }
        }
    }

    /// Drop every label and, when labels are on, lay them out again.
    pub fn relabel(&mut self, vp: &Viewport) {
        self.remove_labels();
        if !self.show_labels {
            return;
        }
        let placed = labels::layout(vp, self.locations.values().map(|e| &e.location));
        for label in placed {
            let id = label.location_id;
            let handle = self.scene.add(Overlay::Label(label));
            if let Some(entry) = self.locations.get_mut(&id) {
                entry.label = Some(handle);
            }
        }
    }

    // --- readers ---

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id).map(|e| &e.location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values().map(|e| &e.location)
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn corridor(&self, id: CorridorId) -> Option<(&Corridor, CorridorKind)> {
        self.corridors.get(&id).map(|e| (&e.corridor, e.kind))
    }

    pub fn corridor_count(&self) -> usize {
        self.corridors.len()
    }

    #[cfg(test)]
    pub fn corridor_segment(&self, id: CorridorId) -> Option<((f64, f64), (f64, f64))> {
        self.corridors.get(&id).map(|e| (e.from, e.to))
    }

    pub fn corridor_transit(&self, id: CorridorId) -> TransitHighlight {
        match self.corridors.get(&id).and_then(|e| self.scene.get(e.line)) {
            Some(Overlay::Corridor(line)) => line.transit,
            _ => TransitHighlight::None,
        }
    }

    pub fn players_at(&self, id: LocationId) -> &[PlayerPresence] {
        self.players_at.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn npcs_at(&self, id: LocationId) -> &[NpcPresence] {
        self.npcs_at.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn players_in_transit(&self, id: CorridorId) -> &[PlayerTransit] {
        self.players_in_transit.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn npcs_in_transit(&self, id: CorridorId) -> &[NpcTransit] {
        self.npcs_in_transit.get(&id).map_or(&[], Vec::as_slice)
    }

    #[cfg(test)]
    pub fn transit_group_count(&self) -> usize {
        self.players_in_transit.len() + self.npcs_in_transit.len()
    }

    #[cfg(test)]
    pub fn highlight_of(&self, id: LocationId) -> Option<Highlight> {
        self.highlights.get(&id).copied()
    }

    #[cfg(test)]
    pub fn highlighted_count(&self) -> usize {
        self.highlights.len()
    }

    /// Contact count shown in the header.
    pub fn total_contacts(&self) -> usize {
        match self.total_player_count {
            Some(total) => total as usize,
            None => {
                self.players_at.values().map(Vec::len).sum::<usize>()
                    + self.players_in_transit.values().map(Vec::len).sum::<usize>()
            }
        }
    }

    /// Any corridor currently showing a transit pulse.
    pub fn has_active_transit(&self) -> bool {
        self.show_routes
            && self
                .corridors
                .keys()
                .any(|id| self.corridor_transit(*id) != TransitHighlight::None)
    }

    pub fn fit_all(&self) -> Option<ViewChange> {
        WorldRect::around(self.locations().map(|l| (l.x_coord, l.y_coord))).map(|rect| {
            ViewChange::Fit {
                rect,
                padding: FIT_PADDING_PX,
            }
        })
    }

    /// `(id, "NAME (TYPE)")` for the route selectors, sorted by name.
    pub fn route_options(&self) -> Vec<(LocationId, String)> {
        let mut options: Vec<&Location> = self.locations().collect();
        options.sort_by(|a, b| a.name.cmp(&b.name));
        options
            .into_iter()
            .map(|l| {
                (
                    l.location_id,
                    format!(
                        "{} ({})",
                        l.name.to_uppercase(),
                        l.location_type.to_uppercase()
                    ),
                )
            })
            .collect()
    }
}

fn group_by<T, K: Ord>(items: Vec<T>, key: impl Fn(&T) -> K) -> BTreeMap<K, Vec<T>> {
    let mut out: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        out.entry(key(&item)).or_default().push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use starchart_shared::Alignment;

    fn location(id: LocationId, name: &str, kind: &str, x: f64, y: f64) -> Location {
        Location {
            location_id: id,
            name: name.into(),
            location_type: kind.into(),
            x_coord: x,
            y_coord: y,
            wealth_level: 5,
            population: 100,
            alignment: Alignment::Neutral,
            description: String::new(),
            static_npcs: Vec::new(),
        }
    }

    fn corridor(id: CorridorId, name: &str, from: LocationId, to: LocationId) -> Corridor {
        Corridor {
            corridor_id: id,
            name: name.into(),
            origin_location: from,
            destination_location: to,
            origin_x: None,
            origin_y: None,
            dest_x: None,
            dest_y: None,
            travel_time: 90,
            fuel_cost: 10,
            danger_level: 2,
        }
    }

    fn player_transit(name: &str, corridor_id: CorridorId) -> PlayerTransit {
        PlayerTransit {
            name: name.into(),
            corridor_id,
            origin: "A".into(),
            destination: "B".into(),
        }
    }

    fn npc_transit(name: &str, corridor_id: CorridorId) -> NpcTransit {
        NpcTransit {
            name: name.into(),
            callsign: "NX-1".into(),
            ship_name: "Drifter".into(),
            corridor_id,
            origin: "A".into(),
            destination: "B".into(),
        }
    }

    fn waypoint(id: LocationId, x: f64, y: f64) -> Waypoint {
        Waypoint {
            location_id: id,
            name: format!("W{id}"),
            x_coord: x,
            y_coord: y,
        }
    }

    fn sample() -> GalaxySnapshot {
        GalaxySnapshot {
            locations: vec![
                location(1, "Alpha", "Colony", 0.0, 0.0),
                location(2, "Beta Station", "Space Station", 100.0, 50.0),
                location(3, "Gamma Gate", "Transit Gate", -80.0, 40.0),
                location(4, "Delta", "Outpost", 30.0, -60.0),
            ],
            corridors: vec![
                corridor(7, "Alpha - Beta", 1, 2),
                corridor(8, "Beta - Gamma", 2, 3),
                corridor(9, "Alpha Approach", 1, 4),
            ],
            players: vec![PlayerPresence {
                name: "Vex".into(),
                location_id: 2,
            }],
            dynamic_npcs: vec![NpcPresence {
                name: "Orin".into(),
                callsign: "OR-3".into(),
                ship_name: "Lark".into(),
                location_id: 3,
            }],
            ..GalaxySnapshot::default()
        }
    }

    fn marker_ids(view: &GalaxyView) -> Vec<LocationId> {
        let mut ids: Vec<LocationId> = view
            .scene()
            .iter()
            .filter_map(|(_, o)| match o {
                Overlay::Marker(m) => Some(m.location_id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    fn count_routes(view: &GalaxyView) -> usize {
        view.scene().count(|o| matches!(o, Overlay::Route(_)))
    }

    #[test]
    fn snapshot_markers_match_snapshot_ids() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        assert_eq!(marker_ids(&view), vec![1, 2, 3, 4]);

        let mut next = sample();
        next.locations.retain(|l| l.location_id != 2);
        next.locations.push(location(5, "Epsilon", "Colony", 10.0, 10.0));
        next.corridors.clear();
        view.apply_snapshot(next, &vp);
        assert_eq!(marker_ids(&view), vec![1, 3, 4, 5]);
        assert_eq!(view.corridor_count(), 0);
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Corridor(_))), 0);
    }

    #[test]
    fn every_overlay_belongs_to_the_index() {
        let vp = Viewport::default();
        let mut view = GalaxyView::new(true, true, true);
        view.apply_snapshot(sample(), &vp);
        view.show_route(vec![waypoint(1, 0.0, 0.0), waypoint(2, 100.0, 50.0)])
            .unwrap();
        // 4 markers, 3 lines + 3 hit targets, 1 player ring, 1 npc ring,
        // 1 route, and one label per visible location.
        let labels = view.scene().count(|o| matches!(o, Overlay::Label(_)));
        assert_eq!(view.scene().len(), 4 + 6 + 2 + 1 + labels);

        view.apply_snapshot(sample(), &vp);
        assert!(view.route().is_none());
        assert_eq!(count_routes(&view), 0);
        let labels = view.scene().count(|o| matches!(o, Overlay::Label(_)));
        assert_eq!(view.scene().len(), 4 + 6 + 2 + labels);
    }

    #[test]
    fn single_location_snapshot() {
        let mut vp = Viewport::default();
        vp.set_view(0.0, 0.0, 1.0);
        let mut view = GalaxyView::new(true, false, true);
        let applied = view.apply_snapshot(
            GalaxySnapshot {
                locations: vec![location(1, "Alpha", "Colony", 0.0, 0.0)],
                ..GalaxySnapshot::default()
            },
            &vp,
        );
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Marker(_))), 1);
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Corridor(_))), 0);
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Label(_))), 1);
        assert!(matches!(applied.view, Some(ViewChange::Fit { .. })));
    }

    #[test]
    fn corridors_resolve_endpoints_and_classify() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        let mut snapshot = sample();
        snapshot.corridors.push(corridor(10, "Nowhere", 1, 99));
        let applied = view.apply_snapshot(snapshot, &vp);
        assert_eq!(applied.skipped_corridors, vec![10]);
        assert_eq!(view.corridor(7).map(|(_, k)| k), Some(CorridorKind::Ungated));
        assert_eq!(view.corridor(8).map(|(_, k)| k), Some(CorridorKind::Gated));
        assert_eq!(view.corridor(9).map(|(_, k)| k), Some(CorridorKind::Approach));
        assert_eq!(view.corridor_segment(7), Some(((0.0, 0.0), (100.0, 50.0))));
    }

    #[test]
    fn transit_update_leaves_locations_and_corridors_alone() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        let locations: Vec<Location> = view.locations().cloned().collect();
        let corridor = view.corridor(7).map(|(c, k)| (c.clone(), k));

        view.apply(
            MapEvent::TransitUpdate(vec![player_transit("Vex", 7)]),
            &vp,
        );
        assert_eq!(view.locations().cloned().collect::<Vec<_>>(), locations);
        assert_eq!(view.corridor(7).map(|(c, k)| (c.clone(), k)), corridor);
        assert_eq!(view.corridor_transit(7), TransitHighlight::Player);
    }

    #[test]
    fn empty_transit_clears_highlight() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        view.apply(MapEvent::TransitUpdate(vec![player_transit("Vex", 7)]), &vp);
        assert_eq!(view.corridor_transit(7), TransitHighlight::Player);
        view.apply(MapEvent::TransitUpdate(Vec::new()), &vp);
        assert_eq!(view.corridor_transit(7), TransitHighlight::None);
        assert_eq!(view.transit_group_count(), 0);
    }

    #[test]
    fn players_outrank_npcs_on_a_corridor() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        view.apply_npc_transit(vec![npc_transit("Orin", 8), npc_transit("Kel", 7)]);
        view.apply_player_transit(vec![player_transit("Vex", 7)]);
        assert_eq!(view.corridor_transit(7), TransitHighlight::Player);
        assert_eq!(view.corridor_transit(8), TransitHighlight::Npc);
        assert_eq!(view.corridor_transit(9), TransitHighlight::None);
        assert_eq!(view.npcs_in_transit(8).len(), 1);
    }

    #[test]
    fn snapshot_without_transit_empties_transit_index() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        let mut snapshot = sample();
        snapshot.players_in_transit = vec![player_transit("Vex", 7)];
        view.apply_snapshot(snapshot, &vp);
        assert_eq!(view.corridor_transit(7), TransitHighlight::Player);
        view.apply_snapshot(sample(), &vp);
        assert_eq!(view.transit_group_count(), 0);
        assert_eq!(view.corridor_transit(7), TransitHighlight::None);
    }

    #[test]
    fn presence_updates_rebuild_rings() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        let rings = |v: &GalaxyView, kind: RingKind| {
            v.scene()
                .count(|o| matches!(o, Overlay::Ring(r) if r.kind == kind))
        };
        assert_eq!(rings(&view, RingKind::Players), 1);
        view.apply_players(vec![
            PlayerPresence {
                name: "A".into(),
                location_id: 1,
            },
            PlayerPresence {
                name: "B".into(),
                location_id: 4,
            },
        ]);
        assert_eq!(rings(&view, RingKind::Players), 2);
        assert!(view.players_at(2).is_empty());
        assert_eq!(rings(&view, RingKind::Npcs), 1);
        view.apply_npcs(Vec::new());
        assert_eq!(rings(&view, RingKind::Npcs), 0);
    }

    #[test]
    fn npc_toggle_hides_rings() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        view.set_show_npcs(false);
        assert_eq!(
            view.scene()
                .count(|o| matches!(o, Overlay::Ring(r) if r.kind == RingKind::Npcs && r.hidden)),
            1
        );
        view.apply_npcs(vec![NpcPresence {
            name: "Orin".into(),
            callsign: String::new(),
            ship_name: String::new(),
            location_id: 1,
        }]);
        assert_eq!(
            view.scene()
                .count(|o| matches!(o, Overlay::Ring(r) if r.kind == RingKind::Npcs && r.hidden)),
            1
        );
    }

    #[test]
    fn selection_survives_partial_updates_and_resolves_through_index() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        assert!(view.select_location(2));
        view.apply_players(Vec::new());
        assert_eq!(view.selected_location().map(|l| l.location_id), Some(2));
        assert!(!view.select_location(42));
        assert_eq!(view.selection().location, Some(2));

        view.apply_snapshot(sample(), &vp);
        assert!(view.selected_location().is_none());
    }

    #[test]
    fn location_update_replaces_one_record() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        view.select_location(2);
        let mut moved = location(2, "Beta Prime", "Space Station", 120.0, 50.0);
        moved.alignment = Alignment::Outlaw;
        view.apply(MapEvent::LocationUpdate(moved), &vp);

        assert_eq!(marker_ids(&view), vec![1, 2, 3, 4]);
        assert_eq!(view.location(2).map(|l| l.name.as_str()), Some("Beta Prime"));
        assert_eq!(view.highlight_of(2), Some(Highlight::Focus));
        // Player ring follows the new position.
        assert!(view.scene().iter().any(|(_, o)| matches!(
            o,
            Overlay::Ring(r) if r.location_id == 2 && r.pos == (120.0, 50.0)
        )));
        assert_eq!(view.corridor(8).map(|(_, k)| k), Some(CorridorKind::Gated));

        view.apply(
            MapEvent::LocationUpdate(location(6, "Zeta", "Colony", 5.0, 5.0)),
            &vp,
        );
        assert_eq!(view.location_count(), 5);
    }

    #[test]
    fn route_replaces_previous_and_highlights_waypoints() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        view.show_route(vec![waypoint(1, 0.0, 0.0), waypoint(2, 100.0, 50.0)])
            .unwrap();
        let change = view
            .show_route(vec![
                waypoint(1, 0.0, 0.0),
                waypoint(2, 100.0, 50.0),
                waypoint(3, -80.0, 40.0),
            ])
            .unwrap();
        assert_eq!(count_routes(&view), 1);
        assert_eq!(view.highlighted_count(), 3);
        assert_eq!(view.highlight_of(3), Some(Highlight::Route));
        assert!(matches!(change, ViewChange::Fit { padding, .. } if padding == FIT_PADDING_PX));
    }

    #[test]
    fn short_route_leaves_state_untouched() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        view.show_route(vec![waypoint(1, 0.0, 0.0), waypoint(4, 30.0, -60.0)])
            .unwrap();
        let before = view.route().cloned();
        assert_eq!(
            view.show_route(vec![waypoint(3, 0.0, 0.0)]),
            Err(RouteError::TooShort(1))
        );
        assert_eq!(view.route().cloned(), before);
        assert_eq!(count_routes(&view), 1);
        assert_eq!(view.highlighted_count(), 2);
    }

    #[test]
    fn empty_route_reports_zero_waypoints() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        assert_eq!(view.show_route(Vec::new()), Err(RouteError::TooShort(0)));
        assert_eq!(count_routes(&view), 0);
    }

    #[test]
    fn route_through_dropped_location_is_rejected() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        let mut shrunk = sample();
        shrunk.locations.retain(|l| l.location_id != 2);
        shrunk.corridors.clear();
        view.apply_snapshot(shrunk, &vp);

        view.show_route(vec![waypoint(1, 0.0, 0.0), waypoint(3, -80.0, 40.0)])
            .unwrap();
        assert_eq!(
            view.show_route(vec![waypoint(1, 0.0, 0.0), waypoint(2, 100.0, 50.0)]),
            Err(RouteError::UnknownWaypoint(2))
        );
        assert_eq!(count_routes(&view), 1);
        let kept: Vec<LocationId> = view
            .route()
            .map(|r| r.waypoints.iter().map(|w| w.location_id).collect())
            .unwrap_or_default();
        assert_eq!(kept, vec![1, 3]);
        assert_eq!(view.highlighted_count(), 2);
        assert_eq!(view.highlight_of(2), None);
    }

    #[test]
    fn clearing_route_removes_overlay_and_highlights() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        view.show_route(vec![waypoint(1, 0.0, 0.0), waypoint(2, 100.0, 50.0)])
            .unwrap();
        view.clear_route();
        assert_eq!(count_routes(&view), 0);
        assert_eq!(view.highlighted_count(), 0);
    }

    #[test]
    fn hiding_routes_hides_lines_and_drops_corridor_selection() {
        let vp = Viewport::default();
        let mut view = GalaxyView::new(false, true, true);
        view.apply_snapshot(sample(), &vp);
        assert!(view.select_corridor(7));
        view.set_show_routes(false);
        assert!(view.selected_corridor().is_none());
        assert_eq!(
            view.scene()
                .count(|o| matches!(o, Overlay::Corridor(c) if c.hidden)),
            3
        );
        assert_eq!(
            view.scene()
                .count(|o| matches!(o, Overlay::CorridorHit(h) if h.interactive)),
            0
        );
    }

    #[test]
    fn search_single_hit_selects_and_centers() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        let change = view.search("beta");
        assert_eq!(view.selection().location, Some(2));
        assert_eq!(
            change,
            Some(ViewChange::Center {
                x: 100.0,
                y: 50.0,
                zoom: FOCUS_ZOOM
            })
        );
    }

    #[test]
    fn search_many_hits_fits_and_matches_type() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        let change = view.search("GATE");
        assert_eq!(view.highlighted_count(), 1);
        assert!(matches!(change, Some(ViewChange::Center { .. })));

        let change = view.search("a");
        assert_eq!(view.highlighted_count(), 4);
        assert!(matches!(
            change,
            Some(ViewChange::Fit { padding, .. }) if padding == SEARCH_FIT_PADDING_PX
        ));
        assert_eq!(view.search("   "), None);
        assert_eq!(view.highlighted_count(), 0);
    }

    #[test]
    fn labels_toggle_and_relabel() {
        let mut vp = Viewport::default();
        vp.set_view(0.0, 0.0, 1.0);
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Label(_))), 0);
        view.set_show_labels(true, &vp);
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Label(_))), 4);
        view.relabel(&vp);
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Label(_))), 4);
        view.set_show_labels(false, &vp);
        assert_eq!(view.scene().count(|o| matches!(o, Overlay::Label(_))), 0);
    }

    #[test]
    fn contact_count_prefers_server_total() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        let mut snapshot = sample();
        snapshot.players_in_transit = vec![player_transit("Kai", 7)];
        view.apply_snapshot(snapshot.clone(), &vp);
        assert_eq!(view.total_contacts(), 2);
        snapshot.total_player_count = Some(40);
        view.apply_snapshot(snapshot, &vp);
        assert_eq!(view.total_contacts(), 40);
    }

    #[test]
    fn route_options_sorted_by_name() {
        let vp = Viewport::default();
        let mut view = GalaxyView::default();
        view.apply_snapshot(sample(), &vp);
        let names: Vec<String> = view.route_options().into_iter().map(|(_, t)| t).collect();
        assert_eq!(names[0], "ALPHA (COLONY)");
        assert_eq!(names[3], "GAMMA GATE (TRANSIT GATE)");
    }
}
