use starchart_shared::{Alignment, CorridorKind, LocationKind};

use crate::colors::{Palette, Rgb};
use crate::scene::TransitHighlight;

/// Colour by meaning; resolved against the active palette when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Primary,
    Success,
    Warning,
    Gold,
    Loyalist,
    Outlaw,
    Approach,
    Route,
    White,
}

impl ColorRole {
    pub const fn resolve(self, palette: &Palette) -> Rgb {
        match self {
            Self::Primary => palette.primary,
            Self::Success => palette.success,
            Self::Warning => palette.warning,
            Self::Gold => (0xff, 0xdd, 0x00),
            Self::Loyalist => (0x41, 0x69, 0xe1),
            Self::Outlaw => (0xdc, 0x14, 0x3c),
            Self::Approach => (0x8c, 0x75, 0xff),
            Self::Route => (0xff, 0xff, 0x00),
            Self::White => (0xff, 0xff, 0xff),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Triangle,
    Square,
    Diamond,
}

pub const fn shape(kind: LocationKind) -> MarkerShape {
    match kind {
        LocationKind::Station => MarkerShape::Triangle,
        LocationKind::Outpost => MarkerShape::Square,
        LocationKind::Gate => MarkerShape::Diamond,
        LocationKind::Colony | LocationKind::Other => MarkerShape::Circle,
    }
}

pub const fn fill(kind: LocationKind, alignment: Alignment) -> ColorRole {
    match alignment {
        Alignment::Loyalist => ColorRole::Loyalist,
        Alignment::Outlaw => ColorRole::Outlaw,
        Alignment::Neutral | Alignment::Unknown => match kind {
            LocationKind::Colony => ColorRole::Success,
            LocationKind::Station => ColorRole::Primary,
            LocationKind::Outpost => ColorRole::Warning,
            LocationKind::Gate => ColorRole::Gold,
            LocationKind::Other => ColorRole::White,
        },
    }
}

/// Marker size in screen pixels for a zoom level.
pub fn size_px(zoom: f64) -> f64 {
    if zoom < -1.0 {
        12.0
    } else if zoom < 0.0 {
        13.0
    } else if zoom < 1.0 {
        14.0
    } else {
        15.0
    }
}

/// Why a location is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// Selection or search hit.
    Focus,
    /// Waypoint of the active route.
    Route,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: ColorRole,
    pub weight: f64,
}

pub const fn stroke(highlight: Option<Highlight>) -> Stroke {
    match highlight {
        Some(Highlight::Focus) => Stroke {
            color: ColorRole::Primary,
            weight: 4.0,
        },
        Some(Highlight::Route) => Stroke {
            color: ColorRole::Route,
            weight: 4.0,
        },
        None => Stroke {
            color: ColorRole::White,
            weight: 2.0,
        },
    }
}

/// Presence ring drawn around a location marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingKind {
    Players,
    Npcs,
}

impl RingKind {
    pub const fn radius(self) -> f64 {
        match self {
            Self::Players => 18.0,
            Self::Npcs => 16.0,
        }
    }

    pub const fn color(self) -> ColorRole {
        match self {
            Self::Players => ColorRole::Success,
            Self::Npcs => ColorRole::Warning,
        }
    }
}

pub const RING_WEIGHT: f64 = 3.0;

pub const fn corridor_color(kind: CorridorKind) -> ColorRole {
    match kind {
        CorridorKind::Approach => ColorRole::Approach,
        CorridorKind::Ungated => ColorRole::Warning,
        CorridorKind::Gated => ColorRole::Success,
    }
}

/// Pulse colour for a corridor with traffic: players blue, NPCs yellow.
pub const fn transit_color(transit: TransitHighlight) -> Option<ColorRole> {
    match transit {
        TransitHighlight::Player => Some(ColorRole::Loyalist),
        TransitHighlight::Npc => Some(ColorRole::Gold),
        TransitHighlight::None => None,
    }
}

const PULSE_PERIOD_MS: f64 = 1_600.0;

/// Opacity of a transit pulse at `now_ms`, cycling between 0.35 and 1.
pub fn pulse_alpha(now_ms: f64) -> f64 {
    let phase = (now_ms.rem_euclid(PULSE_PERIOD_MS) / PULSE_PERIOD_MS) * std::f64::consts::TAU;
    0.675 + 0.325 * phase.cos()
}

/// Width of the invisible corridor click target, in pixels.
pub const CORRIDOR_HIT_WIDTH: f64 = 12.0;

pub const ROUTE_WEIGHT: f64 = 5.0;
pub const ROUTE_OPACITY: f64 = 0.9;

pub fn wealth_display(level: u8) -> &'static str {
    match level {
        9.. => "👑 OPULENT",
        7..=8 => "💎 WEALTHY",
        5..=6 => "💰 PROSPEROUS",
        3..=4 => "⚖️ AVERAGE",
        2 => "📉 POOR",
        1 => "🗑️ IMPOVERISHED",
        0 => "❓ UNKNOWN",
    }
}

pub const fn type_icon(kind: LocationKind) -> &'static str {
    match kind {
        LocationKind::Colony => "🏘️",
        LocationKind::Station => "🛰️",
        LocationKind::Outpost => "🏭",
        LocationKind::Gate => "🌌",
        LocationKind::Other => "📍",
    }
}
