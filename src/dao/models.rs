use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::round::{Board, ClueOutcome, RoundPhase, WagerRecord};

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Players are gathering; the board has not been attached yet.
    Lobby,
    /// A round is in progress.
    Playing,
    /// The round has completed; the room awaits cleanup.
    Finished,
}

/// Participant stored inside a room record. Order in the containing vector is
/// join order and drives turn rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Display name, unique within the room.
    pub name: String,
    /// Running score. May go negative.
    pub score: i32,
    /// When the player joined, for auditing.
    pub joined_at: SystemTime,
}

/// Persisted state of the active round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEntity {
    /// The immutable clue grid.
    pub board: Board,
    /// Current phase of the round.
    pub phase: RoundPhase,
    /// Player currently empowered to act.
    pub turn_player_id: Option<Uuid>,
    /// Clues already resolved, in resolution order.
    pub revealed_clues: Vec<String>,
    /// Clue currently under adjudication.
    pub selected_clue: Option<String>,
    /// Outcome of the most recently resolved clue.
    pub last_result: Option<ClueOutcome>,
    /// Final-round wagers in submission order.
    pub final_wagers: Vec<FinalWagerEntity>,
    /// Wager ceiling applied when a player's score is below it.
    pub wager_floor: i32,
}

/// One player's final-round wager as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalWagerEntity {
    /// Owner of the wager.
    pub player_id: Uuid,
    /// Wagered amount.
    pub amount: i32,
    /// Submitted answer text, once present.
    pub answer: Option<String>,
    /// Correctness verdict, once judged.
    pub is_correct: Option<bool>,
    /// True once judgement is complete.
    pub validated: bool,
}

/// Aggregate room record persisted by the storage layer: one record per room
/// carrying its players and the active round. `version` is the
/// optimistic-concurrency token; every successful write increments it and
/// every writer states the version it read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEntity {
    /// Primary key of the room.
    pub id: Uuid,
    /// Short join code shared with players.
    pub code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Identifier of the current host.
    pub host_id: Uuid,
    /// Players in join order.
    pub players: Vec<PlayerEntity>,
    /// Active round state, absent while in the lobby.
    pub round: Option<RoundEntity>,
    /// Optimistic-concurrency token, incremented on every write.
    pub version: u64,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the room record was updated.
    pub updated_at: SystemTime,
}

/// Summary of a room returned by listing operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListItemEntity {
    /// Primary key of the room.
    pub id: Uuid,
    /// Short join code.
    pub code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Number of players currently in the room.
    pub player_count: usize,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl From<&RoomEntity> for RoomListItemEntity {
    fn from(entity: &RoomEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code.clone(),
            status: entity.status,
            player_count: entity.players.len(),
            created_at: entity.created_at,
        }
    }
}

impl From<(Uuid, WagerRecord)> for FinalWagerEntity {
    fn from((player_id, record): (Uuid, WagerRecord)) -> Self {
        Self {
            player_id,
            amount: record.amount,
            answer: record.answer,
            is_correct: record.is_correct,
            validated: record.validated,
        }
    }
}

impl From<FinalWagerEntity> for (Uuid, WagerRecord) {
    fn from(entity: FinalWagerEntity) -> Self {
        (
            entity.player_id,
            WagerRecord {
                amount: entity.amount,
                answer: entity.answer,
                is_correct: entity.is_correct,
                validated: entity.validated,
            },
        )
    }
}
