use std::collections::BTreeMap;

use starchart_shared::{Alignment, CorridorId, CorridorKind, LocationId, LocationKind};

use crate::labels::PlacedLabel;
use crate::markers::{Highlight, RingKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(u64);

/// Who is travelling a corridor right now. Players win over NPCs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitHighlight {
    #[default]
    None,
    Player,
    Npc,
}

impl TransitHighlight {
    pub fn of(has_players: bool, has_npcs: bool) -> Self {
        if has_players {
            Self::Player
        } else if has_npcs {
            Self::Npc
        } else {
            Self::None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOverlay {
    pub location_id: LocationId,
    pub pos: (f64, f64),
    pub kind: LocationKind,
    pub alignment: Alignment,
    pub highlight: Option<Highlight>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RingOverlay {
    pub location_id: LocationId,
    pub pos: (f64, f64),
    pub kind: RingKind,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorridorOverlay {
    pub corridor_id: CorridorId,
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub kind: CorridorKind,
    pub transit: TransitHighlight,
    pub hidden: bool,
}

/// Invisible, wider click target laid over a corridor line.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorHitOverlay {
    pub corridor_id: CorridorId,
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub points: Vec<(f64, f64)>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Marker(MarkerOverlay),
    Ring(RingOverlay),
    Corridor(CorridorOverlay),
    CorridorHit(CorridorHitOverlay),
    Route(RouteOverlay),
    Label(PlacedLabel),
}

/// Draw order, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Corridors,
    Route,
    Rings,
    Markers,
    Labels,
}

impl Overlay {
    pub const fn layer(&self) -> Option<Layer> {
        match self {
            Self::Corridor(_) => Some(Layer::Corridors),
            Self::Route(_) => Some(Layer::Route),
            Self::Ring(_) => Some(Layer::Rings),
            Self::Marker(_) => Some(Layer::Markers),
            Self::Label(_) => Some(Layer::Labels),
            Self::CorridorHit(_) => None,
        }
    }
}

/// Retained set of map overlays keyed by handle.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    next_id: u64,
    overlays: BTreeMap<OverlayId, Overlay>,
}

impl Scene {
    pub fn add(&mut self, overlay: Overlay) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.overlays.insert(id, overlay);
        id
    }

    pub fn remove(&mut self, id: OverlayId) -> Option<Overlay> {
        self.overlays.remove(&id)
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.get(&id)
    }

    pub fn get_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.overlays.get_mut(&id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OverlayId, &Overlay)> {
        self.overlays.iter().map(|(id, o)| (*id, o))
    }

    /// Overlays of one layer in insertion order.
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &Overlay> {
        self.overlays
            .values()
            .filter(move |o| o.layer() == Some(layer))
    }

    pub fn count(&self, pred: impl Fn(&Overlay) -> bool) -> usize {
        self.overlays.values().filter(|o| pred(o)).count()
    }
}
