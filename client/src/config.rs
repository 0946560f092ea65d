use serde::{Deserialize, Serialize};

pub const WS_PATH: &str = "/ws";

pub fn route_url(from: i64, to: i64) -> String {
    format!("/api/route/{from}/{to}")
}

pub fn sub_locations_url(location_id: i64) -> String {
    format!("/api/location/{location_id}/sub-locations")
}

pub const RECONNECT_BASE_MS: u32 = 1_000;
pub const RECONNECT_MAX_MS: u32 = 30_000;
pub const RECONNECT_MAX_ATTEMPTS: u32 = 10;

/// Quiet period after the last pan/zoom before labels are recomputed.
pub const LABEL_DEBOUNCE_MS: u32 = 200;
/// The loading overlay stays up this long after the first snapshot.
pub const LOADING_HIDE_DELAY_MS: u32 = 1_500;
pub const NOTICE_DISMISS_MS: u32 = 4_000;

/// Zoom levels are log2 of pixels per world unit.
pub const MIN_ZOOM: f64 = -3.0;
pub const MAX_ZOOM: f64 = 6.0;
pub const INITIAL_ZOOM: f64 = 1.0;
/// Zoom used when search narrows to a single location.
pub const FOCUS_ZOOM: f64 = 4.0;

/// Half-extent of the pannable world square.
pub const WORLD_HALF_EXTENT: f64 = 5_000.0;

pub const FIT_PADDING_PX: f64 = 20.0;
pub const SEARCH_FIT_PADDING_PX: f64 = 40.0;

pub const SETTINGS_KEY: &str = "starchart_settings";

/// UI preferences persisted to localStorage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub show_labels: bool,
    pub show_routes: bool,
    pub show_npcs: bool,
    pub header_expanded: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_labels: false,
            show_routes: false,
            show_npcs: true,
            header_expanded: true,
        }
    }
}
