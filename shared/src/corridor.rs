use crate::galaxy::LocationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorridorKind {
    /// Short local hop into a location's approach space.
    Approach,
    Ungated,
    Gated,
}

/// Stroke role for a corridor line. Colours resolve against the active theme
/// except for `Approach`, which is fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorridorStyle {
    pub weight: f64,
    pub opacity: f64,
    pub dash: Option<[f64; 2]>,
}

impl CorridorKind {
    pub const fn style(self) -> CorridorStyle {
        match self {
            Self::Approach => CorridorStyle {
                weight: 1.5,
                opacity: 0.7,
                dash: Some([4.0, 2.0]),
            },
            Self::Ungated => CorridorStyle {
                weight: 3.0,
                opacity: 0.7,
                dash: Some([8.0, 5.0]),
            },
            Self::Gated => CorridorStyle {
                weight: 2.0,
                opacity: 0.7,
                dash: None,
            },
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Approach => "Local Approach",
            Self::Ungated => "Ungated (Dangerous)",
            Self::Gated => "Gated (Safe)",
        }
    }
}

/// Classify a corridor from its name and the kinds of its endpoints.
///
/// Name patterns win: "approach" first, then "ungated". Otherwise the corridor
/// is gated when either endpoint is a gate, and ungated when neither is (or
/// when an endpoint is unknown).
pub fn classify(
    name: &str,
    origin: Option<LocationKind>,
    destination: Option<LocationKind>,
) -> CorridorKind {
    let name = name.to_ascii_lowercase();
    if name.contains("approach") {
        return CorridorKind::Approach;
    }
    if name.contains("ungated") {
        return CorridorKind::Ungated;
    }
    if origin == Some(LocationKind::Gate) || destination == Some(LocationKind::Gate) {
        CorridorKind::Gated
    } else {
        CorridorKind::Ungated
    }
}
