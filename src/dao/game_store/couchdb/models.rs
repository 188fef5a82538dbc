use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::{
    game_store::couchdb::error::CouchDaoError,
    models::{PlayerEntity, RoomEntity, RoomStatus, RoundEntity},
};

pub const ROOM_PREFIX: &str = "room::";
pub const END_SUFFIX: &str = "\u{ffff}";

/// Response shape of the `_all_docs` endpoint.
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

/// Single row of an `_all_docs` response; only the embedded document is used.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Room record as stored in CouchDB. The entity version travels inside the
/// body; `_rev` is CouchDB's own MVCC token and both must line up for a
/// compare-and-swap write to land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRoomDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub room: RoomBody,
}

/// Body of a room document, everything but the CouchDB bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomBody {
    pub code: String,
    pub status: RoomStatus,
    pub host_id: Uuid,
    pub players: Vec<PlayerEntity>,
    pub round: Option<RoundEntity>,
    pub version: u64,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<(RoomEntity, Option<String>)> for CouchRoomDocument {
    fn from((room, rev): (RoomEntity, Option<String>)) -> Self {
        Self {
            id: room_doc_id(room.id),
            rev,
            room: RoomBody {
                code: room.code,
                status: room.status,
                host_id: room.host_id,
                players: room.players,
                round: room.round,
                version: room.version,
                created_at: room.created_at,
                updated_at: room.updated_at,
            },
        }
    }
}

impl TryFrom<CouchRoomDocument> for RoomEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchRoomDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            code: doc.room.code,
            status: doc.room.status,
            host_id: doc.room.host_id,
            players: doc.room.players,
            round: doc.room.round,
            version: doc.room.version,
            created_at: doc.room.created_at,
            updated_at: doc.room.updated_at,
        })
    }
}

/// Build the document identifier for a room.
pub fn room_doc_id(id: Uuid) -> String {
    format!("{}{}", ROOM_PREFIX, id)
}

/// Recover the room UUID from a document identifier.
pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let (_, id) = doc_id
        .split_once("::")
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing separator",
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_string(),
        kind: "invalid UUID",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_round_trips() {
        let id = Uuid::new_v4();
        assert_eq!(extract_uuid(&room_doc_id(id)).unwrap(), id);
    }

    #[test]
    fn malformed_doc_ids_are_rejected() {
        assert!(extract_uuid("room-no-separator").is_err());
        assert!(extract_uuid("room::not-a-uuid").is_err());
    }
}
