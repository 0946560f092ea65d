use starchart_shared::{Location, LocationId, LocationKind};

use crate::viewport::Viewport;

/// Visible counts at or below this get every label.
const LABEL_ALL_THRESHOLD: usize = 8;
const VERY_LOW_ZOOM_CAP: usize = 10;

/// Candidate screen offsets around the marker, picked by `id mod 8`.
pub const OFFSETS: [(f64, f64); 8] = [
    (0.0, -35.0),
    (30.0, -20.0),
    (30.0, 20.0),
    (0.0, 35.0),
    (-30.0, 20.0),
    (-30.0, -20.0),
    (40.0, 0.0),
    (-40.0, 0.0),
];

/// A placed label. The box center sits `(dx, dy)` screen pixels from the
/// world anchor, so it tracks the marker while panning between relayouts.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub location_id: LocationId,
    pub text: String,
    pub anchor: (f64, f64),
    pub dx: f64,
    pub dy: f64,
    pub width: f64,
    pub height: f64,
    pub wealth: WealthClass,
    pub zoom: ZoomClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WealthClass {
    High,
    Medium,
    Low,
}

impl WealthClass {
    pub fn of(wealth_level: u8) -> Self {
        match wealth_level {
            7.. => Self::High,
            4..=6 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomClass {
    Large,
    Medium,
    Small,
}

impl ZoomClass {
    pub fn of(zoom: f64) -> Self {
        if zoom >= 3.0 {
            Self::Large
        } else if zoom >= 0.0 {
            Self::Medium
        } else {
            Self::Small
        }
    }

    pub const fn font_px(self) -> f64 {
        match self {
            Self::Large => 13.0,
            Self::Medium => 11.0,
            Self::Small => 9.0,
        }
    }
}

fn type_weight(kind: LocationKind) -> f64 {
    match kind {
        LocationKind::Station => 100.0,
        LocationKind::Colony => 80.0,
        LocationKind::Gate => 60.0,
        LocationKind::Outpost => 40.0,
        LocationKind::Other => 20.0,
    }
}

pub fn importance(location: &Location) -> f64 {
    type_weight(location.kind())
        + 10.0 * f64::from(location.wealth_level)
        + 5.0 * (location.population as f64 + 1.0).log10()
}

/// How many of `visible` labels survive at this zoom.
pub fn label_cap(visible: usize, zoom: f64) -> usize {
    if visible <= LABEL_ALL_THRESHOLD {
        visible
    } else if zoom >= 2.0 {
        visible * 3 / 4
    } else if zoom >= 0.0 {
        visible / 2
    } else if zoom >= -2.0 {
        (visible / 4).max(1)
    } else {
        visible.min(VERY_LOW_ZOOM_CAP)
    }
}

/// Pick the locations to label. `visible` must already be in ascending id
/// order; the sort is stable so equal scores keep that order.
pub fn select<'a>(mut visible: Vec<&'a Location>, zoom: f64) -> Vec<&'a Location> {
    let cap = label_cap(visible.len(), zoom);
    if cap == visible.len() {
        return visible;
    }
    visible.sort_by(|a, b| importance(b).total_cmp(&importance(a)));
    visible.truncate(cap);
    visible
}

pub fn offset_scale(zoom: f64) -> f64 {
    (1.0 + zoom * 0.1).clamp(0.7, 1.5)
}

pub fn offset_for(location_id: LocationId, zoom: f64) -> (f64, f64) {
    let (dx, dy) = OFFSETS[location_id.rem_euclid(OFFSETS.len() as i64) as usize];
    let scale = offset_scale(zoom);
    (dx * scale, dy * scale)
}

/// Label anchor for a marker at `(sx, sy)`: the primary offset, else the
/// mirrored one, else nothing.
pub fn place(vp: &Viewport, location_id: LocationId, sx: f64, sy: f64) -> Option<(f64, f64)> {
    let (dx, dy) = offset_for(location_id, vp.zoom());
    [(sx + dx, sy + dy), (sx - dx, sy - dy)]
        .into_iter()
        .find(|&(x, y)| vp.screen_contains(x, y))
}

pub fn format_text(name: &str, zoom: f64) -> String {
    let len = name.chars().count();
    if zoom < -1.0 && len > 12 {
        format!("{}...", truncate_upper(name, 10))
    } else if zoom < 1.0 && len > 15 {
        format!("{}...", truncate_upper(name, 12))
    } else {
        name.to_uppercase()
    }
}

fn truncate_upper(name: &str, chars: usize) -> String {
    name.chars().take(chars).collect::<String>().to_uppercase()
}

/// Box size `(width, height)` for a label string at `zoom`.
pub fn box_size(text: &str, zoom: f64) -> (f64, f64) {
    let (min_w, h) = if zoom >= 3.0 {
        (120.0, 28.0)
    } else if zoom >= 1.0 {
        (100.0, 24.0)
    } else if zoom >= -1.0 {
        (80.0, 20.0)
    } else {
        (70.0, 18.0)
    };
    let char_w = if zoom >= 2.0 {
        8.0
    } else if zoom >= 0.0 {
        7.0
    } else {
        6.0
    };
    let w = (text.chars().count() as f64 * char_w + 20.0).max(min_w);
    (w, h)
}

/// Full label pass: filter to the viewport, select, place.
/// `locations` must iterate in ascending id order.
pub fn layout<'a>(
    vp: &Viewport,
    locations: impl IntoIterator<Item = &'a Location>,
) -> Vec<PlacedLabel> {
    let zoom = vp.zoom();
    let bounds = vp.visible_world();
    let visible: Vec<&Location> = locations
        .into_iter()
        .filter(|loc| bounds.contains(loc.x_coord, loc.y_coord))
        .collect();

    select(visible, zoom)
        .into_iter()
        .filter_map(|loc| {
            let (sx, sy) = vp.world_to_screen(loc.x_coord, loc.y_coord);
            let (x, y) = place(vp, loc.location_id, sx, sy)?;
            let text = format_text(&loc.name, zoom);
            let (width, height) = box_size(&text, zoom);
            Some(PlacedLabel {
                location_id: loc.location_id,
                text,
                anchor: (loc.x_coord, loc.y_coord),
                dx: x - sx,
                dy: y - sy,
                width,
                height,
                wealth: WealthClass::of(loc.wealth_level),
                zoom: ZoomClass::of(zoom),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: LocationId, kind: &str, wealth: u8, x: f64, y: f64) -> Location {
        Location {
            location_id: id,
            name: format!("Loc {id}"),
            location_type: kind.into(),
            x_coord: x,
            y_coord: y,
            wealth_level: wealth,
            population: 0,
            alignment: Default::default(),
            description: String::new(),
            static_npcs: Vec::new(),
        }
    }

    #[test]
    fn importance_uses_type_wealth_and_population() {
        let mut loc = location(1, "Space Station", 3, 0.0, 0.0);
        assert_eq!(importance(&loc), 130.0);
        loc.population = 999;
        assert!((importance(&loc) - 145.0).abs() < 1e-9);
        assert_eq!(importance(&location(2, "Derelict", 0, 0.0, 0.0)), 20.0);
    }

    #[test]
    fn cap_follows_zoom_tiers() {
        assert_eq!(label_cap(8, -10.0), 8);
        assert_eq!(label_cap(20, 2.0), 15);
        assert_eq!(label_cap(20, 0.5), 10);
        assert_eq!(label_cap(20, -1.0), 5);
        assert_eq!(label_cap(9, -2.0), 2);
        assert_eq!(label_cap(30, -2.5), 10);
        assert_eq!(label_cap(9, -3.0), 9);
    }

    #[test]
    fn select_never_exceeds_cap_and_prefers_important() {
        let locs: Vec<Location> = (0..12)
            .map(|i| location(i, if i == 11 { "Space Station" } else { "Outpost" }, 0, 0.0, 0.0))
            .collect();
        let chosen = select(locs.iter().collect(), 0.0);
        assert_eq!(chosen.len(), 6);
        assert_eq!(chosen[0].location_id, 11);
    }

    #[test]
    fn equal_scores_keep_ascending_id_order() {
        let locs: Vec<Location> = (0..10).map(|i| location(i, "Colony", 2, 0.0, 0.0)).collect();
        let chosen: Vec<LocationId> = select(locs.iter().collect(), 0.0)
            .into_iter()
            .map(|l| l.location_id)
            .collect();
        assert_eq!(chosen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn offsets_are_deterministic_by_id() {
        assert_eq!(offset_for(0, 0.0), (0.0, -35.0));
        assert_eq!(offset_for(9, 0.0), (30.0, -20.0));
        assert_eq!(offset_for(-1, 0.0), (-40.0, 0.0));
        let (dx, _) = offset_for(6, 10.0);
        assert_eq!(dx, 60.0);
        let (dx, _) = offset_for(6, -10.0);
        assert!((dx - 28.0).abs() < 1e-9);
    }

    #[test]
    fn place_falls_back_to_mirror_then_skips() {
        let mut vp = Viewport::default();
        vp.resize(200.0, 200.0);
        vp.set_view(0.0, 0.0, 0.0);
        // id 0 wants to go 35px up; near the top edge it mirrors below.
        assert_eq!(place(&vp, 0, 100.0, 10.0), Some((100.0, 45.0)));
        assert_eq!(place(&vp, 0, 100.0, 100.0), Some((100.0, 65.0)));
        // Too close to both edges for either direction.
        vp.resize(200.0, 40.0);
        assert_eq!(place(&vp, 0, 100.0, 20.0), None);
    }

    #[test]
    fn text_is_uppercased_and_truncated_by_zoom() {
        assert_eq!(format_text("Alpha", 0.0), "ALPHA");
        assert_eq!(format_text("Thirteen chars", -2.0), "THIRTEEN C...");
        assert_eq!(format_text("Sixteen chars ab", 0.0), "SIXTEEN CHAR...");
        assert_eq!(format_text("Sixteen chars ab", 1.0), "SIXTEEN CHARS AB");
    }

    #[test]
    fn box_grows_with_text() {
        assert_eq!(box_size("AB", 3.0), (120.0, 28.0));
        assert_eq!(box_size("ABCDEFGHIJKLMNOP", 2.0), (148.0, 24.0));
        assert_eq!(box_size("AB", -2.0), (70.0, 18.0));
    }

    #[test]
    fn layout_labels_single_visible_location() {
        let mut vp = Viewport::default();
        vp.set_view(0.0, 0.0, 1.0);
        let locs = [location(1, "Colony", 5, 0.0, 0.0), location(2, "Colony", 5, 1.0e6, 0.0)];
        let labels = layout(&vp, locs.iter());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].location_id, 1);
        assert_eq!(labels[0].wealth, WealthClass::Medium);
        assert!((labels[0].dx - 33.0).abs() < 1e-9);
        assert!((labels[0].dy + 22.0).abs() < 1e-9);
    }
}
