use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::galaxy::{GalaxySnapshot, Location, NpcPresence, NpcTransit, PlayerPresence, PlayerTransit};

/// Raw `{type, data}` envelope as it arrives over the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A decoded push message. Each variant replaces one data category.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    GalaxyData(GalaxySnapshot),
    PlayerUpdate(Vec<PlayerPresence>),
    NpcUpdate(Vec<NpcPresence>),
    TransitUpdate(Vec<PlayerTransit>),
    LocationUpdate(Location),
    NpcTransitUpdate(Vec<NpcTransit>),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message is not a {{type, data}} envelope: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unknown message type {0:?}")]
    UnknownType(String),
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl MapEvent {
    pub const GALAXY_DATA: &'static str = "galaxy_data";
    pub const PLAYER_UPDATE: &'static str = "player_update";
    pub const NPC_UPDATE: &'static str = "npc_update";
    pub const TRANSIT_UPDATE: &'static str = "transit_update";
    pub const LOCATION_UPDATE: &'static str = "location_update";
    pub const NPC_TRANSIT_UPDATE: &'static str = "npc_transit_update";

    /// Decode a full socket frame. The payload is parsed completely before
    /// anything is returned, so a bad frame never yields a partial event.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
        Self::from_envelope(envelope)
    }

    pub fn from_envelope(envelope: Envelope) -> Result<Self, DecodeError> {
        let Envelope { kind, data } = envelope;
        match kind.as_str() {
            Self::GALAXY_DATA => payload(Self::GALAXY_DATA, data).map(Self::GalaxyData),
            Self::PLAYER_UPDATE => list_payload(Self::PLAYER_UPDATE, data).map(Self::PlayerUpdate),
            Self::NPC_UPDATE => list_payload(Self::NPC_UPDATE, data).map(Self::NpcUpdate),
            Self::TRANSIT_UPDATE => {
                list_payload(Self::TRANSIT_UPDATE, data).map(Self::TransitUpdate)
            }
            Self::LOCATION_UPDATE => payload(Self::LOCATION_UPDATE, data).map(Self::LocationUpdate),
            Self::NPC_TRANSIT_UPDATE => {
                list_payload(Self::NPC_TRANSIT_UPDATE, data).map(Self::NpcTransitUpdate)
            }
            _ => Err(DecodeError::UnknownType(kind)),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::GalaxyData(_) => Self::GALAXY_DATA,
            Self::PlayerUpdate(_) => Self::PLAYER_UPDATE,
            Self::NpcUpdate(_) => Self::NPC_UPDATE,
            Self::TransitUpdate(_) => Self::TRANSIT_UPDATE,
            Self::LocationUpdate(_) => Self::LOCATION_UPDATE,
            Self::NpcTransitUpdate(_) => Self::NPC_TRANSIT_UPDATE,
        }
    }
}

fn payload<T: DeserializeOwned>(
    kind: &'static str,
    data: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|source| DecodeError::InvalidPayload { kind, source })
}

/// List categories treat a missing/null payload as an empty list.
fn list_payload<T: DeserializeOwned>(
    kind: &'static str,
    data: serde_json::Value,
) -> Result<Vec<T>, DecodeError> {
    if data.is_null() {
        return Ok(Vec::new());
    }
    payload(kind, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_galaxy_snapshot_with_missing_transit() {
        let event = MapEvent::decode(
            r#"{"type":"galaxy_data","data":{
                "locations":[{"location_id":1,"name":"Alpha","location_type":"Colony",
                              "x_coord":0,"y_coord":0,"wealth_level":5}],
                "corridors":[],
                "selected_theme":"amber"}}"#,
        )
        .unwrap();
        let MapEvent::GalaxyData(snapshot) = event else {
            panic!("expected galaxy_data");
        };
        assert_eq!(snapshot.locations.len(), 1);
        assert!(snapshot.players_in_transit.is_empty());
        assert!(snapshot.npcs_in_transit.is_empty());
        assert_eq!(snapshot.selected_theme.as_deref(), Some("amber"));
    }

    #[test]
    fn decodes_transit_update() {
        let event = MapEvent::decode(
            r#"{"type":"transit_update","data":[{"name":"Vex","corridor_id":7,"origin":"A","destination":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(event.kind(), MapEvent::TRANSIT_UPDATE);
        let MapEvent::TransitUpdate(list) = event else {
            panic!("expected transit_update");
        };
        assert_eq!(list[0].corridor_id, 7);
    }

    #[test]
    fn null_list_payload_is_empty() {
        let event = MapEvent::decode(r#"{"type":"npc_update","data":null}"#).unwrap();
        assert_eq!(event, MapEvent::NpcUpdate(Vec::new()));
    }

    #[test]
    fn unknown_type_is_reported_by_name() {
        let err = MapEvent::decode(r#"{"type":"weather","data":{}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownType(ref kind) if kind == "weather"));
    }

    #[test]
    fn non_json_frame_is_malformed() {
        let err = MapEvent::decode("not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn bad_payload_names_the_category() {
        let err = MapEvent::decode(r#"{"type":"player_update","data":[{"name":3}]}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidPayload {
                kind: "player_update",
                ..
            }
        ));
    }

    #[test]
    fn galaxy_data_without_locations_is_rejected() {
        let err = MapEvent::decode(r#"{"type":"galaxy_data","data":{"corridors":[]}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPayload { kind: "galaxy_data", .. }));
    }
}
