use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, RoomEntity, RoomStatus, RoundEntity},
    state::round::{GameRound, Player, Roster},
};

/// Runtime representation of a room, hydrated from and persisted back to a
/// [`RoomEntity`].
///
/// The roster is insertion-ordered and that order is the turn rotation order,
/// so joins append and departures `shift_remove` to preserve it. Join
/// timestamps are tracked alongside in the same order.
#[derive(Debug, Clone)]
pub struct RoomSession {
    /// Primary key of the room.
    pub id: Uuid,
    /// Short join code shared with players.
    pub code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Identifier of the current host.
    pub host_id: Uuid,
    /// Players in join order with their scores.
    pub roster: Roster,
    /// Join timestamps, same order and keys as the roster.
    pub joined_at: IndexMap<Uuid, SystemTime>,
    /// Active round, absent while in the lobby.
    pub round: Option<GameRound>,
    /// Optimistic-concurrency token of the record this session was read from.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

impl RoomSession {
    /// Create a fresh lobby with `host_name` as its only player and host.
    pub fn create(code: String, host_name: String) -> Self {
        let now = SystemTime::now();
        let host_id = Uuid::new_v4();

        let mut roster = Roster::new();
        roster.insert(
            host_id,
            Player {
                name: host_name,
                score: 0,
            },
        );
        let mut joined_at = IndexMap::new();
        joined_at.insert(host_id, now);

        Self {
            id: Uuid::new_v4(),
            code,
            status: RoomStatus::Lobby,
            host_id,
            roster,
            joined_at,
            round: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a player to the roster, returning the new identifier.
    pub fn add_player(&mut self, name: String) -> Uuid {
        let id = Uuid::new_v4();
        self.roster.insert(id, Player { name, score: 0 });
        self.joined_at.insert(id, SystemTime::now());
        id
    }

    /// Remove a player while preserving the join order of the rest, returning
    /// the index the player held. Round repair and host migration are the
    /// caller's concern.
    pub fn remove_player(&mut self, id: Uuid) -> Option<usize> {
        let index = self.roster.get_index_of(&id)?;
        self.roster.shift_remove(&id);
        self.joined_at.shift_remove(&id);
        Some(index)
    }

    /// Whether any current player carries this display name.
    pub fn has_player_named(&self, name: &str) -> bool {
        self.roster.values().any(|player| player.name == name)
    }

    /// The earliest-joined player still present, the host migration target.
    pub fn earliest_joined(&self) -> Option<Uuid> {
        self.roster.keys().next().copied()
    }

    /// Stamp the session as modified and bump the concurrency token so the
    /// next save states the version it read.
    pub fn touch(&mut self) {
        self.updated_at = SystemTime::now();
        self.version += 1;
    }
}

impl From<RoomEntity> for RoomSession {
    fn from(entity: RoomEntity) -> Self {
        let mut roster = Roster::new();
        let mut joined_at = IndexMap::new();
        for player in entity.players {
            roster.insert(
                player.id,
                Player {
                    name: player.name,
                    score: player.score,
                },
            );
            joined_at.insert(player.id, player.joined_at);
        }

        Self {
            id: entity.id,
            code: entity.code,
            status: entity.status,
            host_id: entity.host_id,
            roster,
            joined_at,
            round: entity.round.map(Into::into),
            version: entity.version,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<RoomSession> for RoomEntity {
    fn from(session: RoomSession) -> Self {
        let players = session
            .roster
            .iter()
            .map(|(id, player)| PlayerEntity {
                id: *id,
                name: player.name.clone(),
                score: player.score,
                joined_at: session
                    .joined_at
                    .get(id)
                    .copied()
                    .unwrap_or(session.created_at),
            })
            .collect();

        Self {
            id: session.id,
            code: session.code,
            status: session.status,
            host_id: session.host_id,
            players,
            round: session.round.map(Into::into),
            version: session.version,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

impl From<RoundEntity> for GameRound {
    fn from(entity: RoundEntity) -> Self {
        Self {
            board: entity.board,
            phase: entity.phase,
            turn_player_id: entity.turn_player_id,
            revealed_clues: entity.revealed_clues,
            selected_clue: entity.selected_clue,
            last_result: entity.last_result,
            final_wagers: entity.final_wagers.into_iter().map(Into::into).collect(),
            wager_floor: entity.wager_floor,
        }
    }
}

impl From<GameRound> for RoundEntity {
    fn from(round: GameRound) -> Self {
        Self {
            board: round.board,
            phase: round.phase,
            turn_player_id: round.turn_player_id,
            revealed_clues: round.revealed_clues,
            selected_clue: round.selected_clue,
            last_result: round.last_result,
            final_wagers: round
                .final_wagers
                .into_iter()
                .map(Into::into)
                .collect(),
            wager_floor: round.wager_floor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::round::{Board, Category, Clue, FinalClue, RoundPhase};

    fn sample_board() -> Board {
        Board {
            categories: vec![Category {
                title: "solo".into(),
                clues: vec![Clue {
                    id: "solo-200".into(),
                    question: "q".into(),
                    answer: "a".into(),
                    value: 200,
                    source_snippet: None,
                }],
            }],
            final_clue: FinalClue {
                category: "final".into(),
                question: "fq".into(),
                answer: "fa".into(),
            },
        }
    }

    #[test]
    fn create_seats_the_host_first() {
        let session = RoomSession::create("ABC234".into(), "host".into());

        assert_eq!(session.status, RoomStatus::Lobby);
        assert_eq!(session.roster.len(), 1);
        assert_eq!(session.earliest_joined(), Some(session.host_id));
        assert!(session.has_player_named("host"));
        assert_eq!(session.version, 0);
    }

    #[test]
    fn remove_player_preserves_join_order() {
        let mut session = RoomSession::create("ABC234".into(), "host".into());
        let second = session.add_player("second".into());
        let third = session.add_player("third".into());

        assert_eq!(session.remove_player(second), Some(1));
        let order: Vec<Uuid> = session.roster.keys().copied().collect();
        assert_eq!(order, vec![session.host_id, third]);
        assert_eq!(session.remove_player(second), None);
    }

    #[test]
    fn entity_round_trip_preserves_rotation_order() {
        let mut session = RoomSession::create("ABC234".into(), "host".into());
        let second = session.add_player("second".into());
        session.round = Some(GameRound::new(sample_board(), second, 1_000));
        session.status = RoomStatus::Playing;
        session.touch();

        let entity = RoomEntity::from(session.clone());
        assert_eq!(entity.players.len(), 2);
        assert_eq!(entity.players[0].id, session.host_id);
        assert_eq!(entity.version, 1);

        let restored = RoomSession::from(entity);
        let order: Vec<Uuid> = restored.roster.keys().copied().collect();
        assert_eq!(order, vec![session.host_id, second]);
        let round = restored.round.as_ref().unwrap();
        assert_eq!(round.phase, RoundPhase::Selecting);
        assert_eq!(round.turn_player_id, Some(second));
    }
}
