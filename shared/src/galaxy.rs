use serde::{Deserialize, Serialize};

pub type LocationId = i64;
pub type CorridorId = i64;

/// Coarse location category parsed from the free-form `location_type` string.
///
/// The server is not consistent about casing or spelling ("Space Station",
/// "space_station", "Transit Gate", "gate"), so matching is lenient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    Colony,
    Station,
    Outpost,
    Gate,
    Other,
}

impl LocationKind {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '_' | '-' => ' ',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "colony" => Self::Colony,
            "space station" | "station" => Self::Station,
            "outpost" => Self::Outpost,
            "gate" | "transit gate" => Self::Gate,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Neutral,
    Loyalist,
    Outlaw,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticNpc {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub personality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: LocationId,
    pub name: String,
    pub location_type: String,
    pub x_coord: f64,
    pub y_coord: f64,
    #[serde(default)]
    pub wealth_level: u8,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub static_npcs: Vec<StaticNpc>,
}

impl Location {
    pub fn kind(&self) -> LocationKind {
        LocationKind::parse(&self.location_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub corridor_id: CorridorId,
    pub name: String,
    pub origin_location: LocationId,
    pub destination_location: LocationId,
    #[serde(default)]
    pub origin_x: Option<f64>,
    #[serde(default)]
    pub origin_y: Option<f64>,
    #[serde(default)]
    pub dest_x: Option<f64>,
    #[serde(default)]
    pub dest_y: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub travel_time: u32,
    #[serde(default)]
    pub fuel_cost: u32,
    #[serde(default)]
    pub danger_level: u8,
}

impl Corridor {
    /// Endpoint coordinates carried on the wire, if both are present.
    pub fn wire_endpoints(&self) -> Option<([f64; 2], [f64; 2])> {
        Some((
            [self.origin_x?, self.origin_y?],
            [self.dest_x?, self.dest_y?],
        ))
    }
}

/// A player docked at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPresence {
    pub name: String,
    pub location_id: LocationId,
}

/// A dynamic NPC docked at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcPresence {
    pub name: String,
    #[serde(default)]
    pub callsign: String,
    #[serde(default)]
    pub ship_name: String,
    pub location_id: LocationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTransit {
    pub name: String,
    pub corridor_id: CorridorId,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcTransit {
    pub name: String,
    #[serde(default)]
    pub callsign: String,
    #[serde(default)]
    pub ship_name: String,
    pub corridor_id: CorridorId,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
}

/// Complete replacement state for locations and corridors plus every
/// presence/transit category. Missing categories decode as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GalaxySnapshot {
    pub locations: Vec<Location>,
    #[serde(default)]
    pub corridors: Vec<Corridor>,
    #[serde(default)]
    pub players: Vec<PlayerPresence>,
    #[serde(default)]
    pub dynamic_npcs: Vec<NpcPresence>,
    #[serde(default)]
    pub players_in_transit: Vec<PlayerTransit>,
    #[serde(default)]
    pub npcs_in_transit: Vec<NpcTransit>,
    #[serde(default)]
    pub selected_theme: Option<String>,
    #[serde(default)]
    pub total_player_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubLocation {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// One stop of a computed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location_id: LocationId,
    #[serde(default)]
    pub name: String,
    pub x_coord: f64,
    pub y_coord: f64,
}

/// Body of `/api/route/{from}/{to}`: either a path or an error indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteResponse {
    Failed { error: String },
    Found { path: Vec<Waypoint> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_kind_parses_server_spellings() {
        assert_eq!(LocationKind::parse("Colony"), LocationKind::Colony);
        assert_eq!(LocationKind::parse("Space Station"), LocationKind::Station);
        assert_eq!(LocationKind::parse("space_station"), LocationKind::Station);
        assert_eq!(LocationKind::parse("Transit Gate"), LocationKind::Gate);
        assert_eq!(LocationKind::parse("gate"), LocationKind::Gate);
        assert_eq!(LocationKind::parse(" OUTPOST "), LocationKind::Outpost);
        assert_eq!(LocationKind::parse("derelict"), LocationKind::Other);
    }

    #[test]
    fn location_defaults_optional_fields() {
        let loc: Location = serde_json::from_str(
            r#"{"location_id":1,"name":"Alpha","location_type":"Colony","x_coord":10,"y_coord":-4}"#,
        )
        .unwrap();
        assert_eq!(loc.wealth_level, 0);
        assert_eq!(loc.population, 0);
        assert_eq!(loc.alignment, Alignment::Neutral);
        assert!(loc.static_npcs.is_empty());
        assert_eq!(loc.kind(), LocationKind::Colony);
    }

    #[test]
    fn unknown_alignment_does_not_reject_location() {
        let loc: Location = serde_json::from_str(
            r#"{"location_id":2,"name":"B","location_type":"gate","x_coord":0,"y_coord":0,"alignment":"pirate"}"#,
        )
        .unwrap();
        assert_eq!(loc.alignment, Alignment::Unknown);
    }

    #[test]
    fn corridor_wire_endpoints_require_all_coordinates() {
        let mut corridor: Corridor = serde_json::from_str(
            r#"{"corridor_id":7,"name":"Alpha - Beta","origin_location":1,"destination_location":2,
                "origin_x":0,"origin_y":0,"dest_x":5,"dest_y":5}"#,
        )
        .unwrap();
        assert_eq!(corridor.wire_endpoints(), Some(([0.0, 0.0], [5.0, 5.0])));
        corridor.dest_y = None;
        assert_eq!(corridor.wire_endpoints(), None);
    }

    #[test]
    fn route_response_distinguishes_path_and_error() {
        let found: RouteResponse = serde_json::from_str(
            r#"{"path":[{"location_id":1,"name":"A","x_coord":0,"y_coord":0},
                        {"location_id":2,"name":"B","x_coord":3,"y_coord":4}],"total_time":120}"#,
        )
        .unwrap();
        let RouteResponse::Found { path } = found else {
            panic!("expected path");
        };
        assert_eq!(path.len(), 2);

        let failed: RouteResponse = serde_json::from_str(r#"{"error":"no path"}"#).unwrap();
        assert_eq!(
            failed,
            RouteResponse::Failed {
                error: "no path".into()
            }
        );
    }
}
