use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{RoomListItemEntity, RoomStatus},
    dto::{format_system_time, phase::RoundPhaseDto, validation::validate_player_name},
    state::{
        RoomSession,
        round::{Board, Category, Clue, FinalClue, GameRound, RoundPhase},
    },
};

/// Number of categories on a standard board.
pub const BOARD_CATEGORIES: usize = 5;
/// Clue values of each category, in ascending order.
pub const CLUE_VALUES: [i32; 5] = [200, 400, 600, 800, 1000];

/// Payload used to open a brand-new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display name of the creating player, who becomes the host.
    #[validate(custom(function = validate_player_name))]
    pub host_name: String,
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Display name of the joining player.
    #[validate(custom(function = validate_player_name))]
    pub name: String,
}

/// Payload used to leave a room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveRoomRequest {
    /// Identifier of the departing player.
    pub player_id: Uuid,
}

/// Payload used by the host to start the game with a generated board.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartGameRequest {
    /// Identifier of the acting player; must be the host.
    pub player_id: Uuid,
    /// The clue grid to play on.
    #[validate(nested)]
    pub board: BoardInput,
}

/// Incoming clue grid supplied when starting a game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BoardInput {
    /// Exactly five categories of five clues each.
    pub categories: Vec<CategoryInput>,
    /// The final-round clue.
    pub final_clue: FinalClueInput,
}

/// Incoming category definition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryInput {
    /// Category title.
    pub title: String,
    /// Clues ordered by ascending value.
    pub clues: Vec<ClueInput>,
}

/// Incoming clue definition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClueInput {
    /// Identifier unique across the whole board.
    pub id: String,
    /// Question text.
    pub question: String,
    /// Canonical answer used for judging.
    pub answer: String,
    /// Point value; must match the expected value for its row.
    pub value: i32,
    /// Optional citation of the source material.
    #[serde(default)]
    pub source_snippet: Option<String>,
}

/// Incoming final clue definition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FinalClueInput {
    /// Category of the final clue.
    pub category: String,
    /// Question text.
    pub question: String,
    /// Canonical answer used for judging.
    pub answer: String,
}

impl Validate for BoardInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.categories.len() != BOARD_CATEGORIES {
            errors.add(
                "categories",
                board_error(
                    "category_count",
                    format!(
                        "Board must have exactly {BOARD_CATEGORIES} categories (got {})",
                        self.categories.len()
                    ),
                ),
            );
        }

        let mut seen_ids = HashSet::new();
        for category in &self.categories {
            if category.title.trim().is_empty() {
                errors.add(
                    "categories",
                    board_error("category_title", "Category title must not be blank".into()),
                );
            }
            if category.clues.len() != CLUE_VALUES.len() {
                errors.add(
                    "categories",
                    board_error(
                        "clue_count",
                        format!(
                            "Each category must have exactly {} clues (got {})",
                            CLUE_VALUES.len(),
                            category.clues.len()
                        ),
                    ),
                );
                continue;
            }
            for (clue, expected_value) in category.clues.iter().zip(CLUE_VALUES) {
                if clue.id.trim().is_empty() {
                    errors.add(
                        "categories",
                        board_error("clue_id", "Clue identifier must not be blank".into()),
                    );
                } else if !seen_ids.insert(clue.id.as_str()) {
                    errors.add(
                        "categories",
                        board_error(
                            "clue_id_duplicate",
                            format!("Duplicate clue identifier `{}`", clue.id),
                        ),
                    );
                }
                if clue.question.trim().is_empty() || clue.answer.trim().is_empty() {
                    errors.add(
                        "categories",
                        board_error(
                            "clue_text",
                            format!("Clue `{}` must have a question and an answer", clue.id),
                        ),
                    );
                }
                if clue.value != expected_value {
                    errors.add(
                        "categories",
                        board_error(
                            "clue_value",
                            format!(
                                "Clue `{}` must be worth {expected_value} (got {})",
                                clue.id, clue.value
                            ),
                        ),
                    );
                }
            }
        }

        if self.final_clue.category.trim().is_empty()
            || self.final_clue.question.trim().is_empty()
            || self.final_clue.answer.trim().is_empty()
        {
            errors.add(
                "final_clue",
                board_error(
                    "final_clue_text",
                    "Final clue must have a category, question, and answer".into(),
                ),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn board_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

impl From<BoardInput> for Board {
    fn from(input: BoardInput) -> Self {
        Self {
            categories: input
                .categories
                .into_iter()
                .map(|category| Category {
                    title: category.title,
                    clues: category
                        .clues
                        .into_iter()
                        .map(|clue| Clue {
                            id: clue.id,
                            question: clue.question,
                            answer: clue.answer,
                            value: clue.value,
                            source_snippet: clue.source_snippet,
                        })
                        .collect(),
                })
                .collect(),
            final_clue: FinalClue {
                category: input.final_clue.category,
                question: input.final_clue.question,
                answer: input.final_clue.answer,
            },
        }
    }
}

/// Wire representation of the room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatusDto {
    /// Players are gathering.
    Lobby,
    /// A round is in progress.
    Playing,
    /// The round has completed.
    Finished,
}

impl From<RoomStatus> for RoomStatusDto {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Lobby => Self::Lobby,
            RoomStatus::Playing => Self::Playing,
            RoomStatus::Finished => Self::Finished,
        }
    }
}

/// Public projection of a player exposed to REST/SSE clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Current score.
    pub score: i32,
    /// Whether this player is the current host.
    pub is_host: bool,
}

/// Projection of a single clue cell. The canonical answer appears only once
/// the clue has been resolved.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ClueSnapshot {
    /// Clue identifier.
    pub id: String,
    /// Point value.
    pub value: i32,
    /// Question text.
    pub question: String,
    /// Whether the clue has been resolved.
    pub revealed: bool,
    /// Canonical answer, present once revealed.
    pub answer: Option<String>,
    /// Citation of the source material, present once revealed.
    pub source_snippet: Option<String>,
}

/// Projection of a board category.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CategorySnapshot {
    /// Category title.
    pub title: String,
    /// Clues of the category.
    pub clues: Vec<ClueSnapshot>,
}

/// Projection of the final clue, revealed piecewise as the final round
/// progresses.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct FinalClueSnapshot {
    /// Category, visible as soon as the final round starts.
    pub category: String,
    /// Question text, visible once all wagers are in.
    pub question: Option<String>,
    /// Canonical answer, visible at the final reveal.
    pub answer: Option<String>,
}

/// One player's final-round wager as exposed to clients. Amounts and answers
/// stay hidden until the final reveal.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct FinalWagerSnapshot {
    /// Owner of the wager.
    pub player_id: Uuid,
    /// Whether the answer has been submitted and judged.
    pub answered: bool,
    /// Wagered amount, present from the final reveal on.
    pub amount: Option<i32>,
    /// Submitted answer, present from the final reveal on.
    pub answer: Option<String>,
    /// Correctness verdict, present from the final reveal on.
    pub is_correct: Option<bool>,
}

/// Outcome of the most recently resolved clue.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ClueOutcomeSnapshot {
    /// Identifier of the resolved clue.
    pub clue_id: String,
    /// Responder identifier, absent when the clue was skipped.
    pub responder_id: Option<Uuid>,
    /// Display name of the responder.
    pub responder_name: String,
    /// Whether the answer was judged correct.
    pub is_correct: bool,
    /// Signed score change applied.
    pub points_delta: i32,
    /// Raw answer text as submitted.
    pub answer: String,
}

/// Projection of the active round.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RoundSnapshot {
    /// Current phase.
    pub phase: RoundPhaseDto,
    /// Player currently empowered to act.
    pub turn_player_id: Option<Uuid>,
    /// The board with per-clue reveal state.
    pub categories: Vec<CategorySnapshot>,
    /// The final clue, revealed piecewise.
    pub final_clue: FinalClueSnapshot,
    /// Clue currently under adjudication.
    pub selected_clue: Option<String>,
    /// Outcome on display during the revealing phase.
    pub last_result: Option<ClueOutcomeSnapshot>,
    /// Final-round wagers, present during the final phases.
    pub final_wagers: Option<Vec<FinalWagerSnapshot>>,
}

/// Full public view of a room.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RoomSnapshot {
    /// Room identifier.
    pub id: Uuid,
    /// Short join code.
    pub code: String,
    /// Lifecycle status.
    pub status: RoomStatusDto,
    /// Identifier of the current host.
    pub host_id: Uuid,
    /// Players in join order.
    pub players: Vec<PlayerSummary>,
    /// The active round, absent in the lobby.
    pub round: Option<RoundSnapshot>,
    /// Concurrency token of the state this snapshot was taken from.
    pub version: u64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 last-update timestamp.
    pub updated_at: String,
}

/// Response returned by room creation and join: the room plus the identifier
/// minted for the acting player.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomMembershipResponse {
    /// Identifier of the created or joined player.
    pub player_id: Uuid,
    /// Snapshot of the room after the change.
    pub room: RoomSnapshot,
}

/// Summary of a room returned by the listing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListItem {
    /// Room identifier.
    pub id: Uuid,
    /// Short join code.
    pub code: String,
    /// Lifecycle status.
    pub status: RoomStatusDto,
    /// Number of players currently in the room.
    pub player_count: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<RoomListItemEntity> for RoomListItem {
    fn from(entity: RoomListItemEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            status: entity.status.into(),
            player_count: entity.player_count,
            created_at: format_system_time(entity.created_at),
        }
    }
}

impl RoundSnapshot {
    fn from_round(round: &GameRound) -> Self {
        let revealed: HashSet<&str> = round
            .revealed_clues
            .iter()
            .map(String::as_str)
            .collect();

        let categories = round
            .board
            .categories
            .iter()
            .map(|category| CategorySnapshot {
                title: category.title.clone(),
                clues: category
                    .clues
                    .iter()
                    .map(|clue| {
                        let is_revealed = revealed.contains(clue.id.as_str());
                        ClueSnapshot {
                            id: clue.id.clone(),
                            value: clue.value,
                            question: clue.question.clone(),
                            revealed: is_revealed,
                            answer: is_revealed.then(|| clue.answer.clone()),
                            source_snippet: if is_revealed {
                                clue.source_snippet.clone()
                            } else {
                                None
                            },
                        }
                    })
                    .collect(),
            })
            .collect();

        let final_question_visible = matches!(
            round.phase,
            RoundPhase::FinalAnswering | RoundPhase::FinalRevealing | RoundPhase::Finished
        );
        let final_answer_visible = round.phase == RoundPhase::Finished;
        let final_clue = FinalClueSnapshot {
            category: round.board.final_clue.category.clone(),
            question: final_question_visible.then(|| round.board.final_clue.question.clone()),
            answer: final_answer_visible.then(|| round.board.final_clue.answer.clone()),
        };

        let in_final = matches!(
            round.phase,
            RoundPhase::FinalWager
                | RoundPhase::FinalAnswering
                | RoundPhase::FinalRevealing
                | RoundPhase::Finished
        );
        let wagers_visible = matches!(
            round.phase,
            RoundPhase::FinalRevealing | RoundPhase::Finished
        );
        let final_wagers = in_final.then(|| {
            round
                .final_wagers
                .iter()
                .map(|(player_id, wager)| FinalWagerSnapshot {
                    player_id: *player_id,
                    answered: wager.validated,
                    amount: wagers_visible.then_some(wager.amount),
                    answer: if wagers_visible {
                        wager.answer.clone()
                    } else {
                        None
                    },
                    is_correct: if wagers_visible { wager.is_correct } else { None },
                })
                .collect()
        });

        Self {
            phase: round.phase.into(),
            turn_player_id: round.turn_player_id,
            categories,
            final_clue,
            selected_clue: round.selected_clue.clone(),
            last_result: round.last_result.as_ref().map(|outcome| ClueOutcomeSnapshot {
                clue_id: outcome.clue_id.clone(),
                responder_id: outcome.responder_id,
                responder_name: outcome.responder_name.clone(),
                is_correct: outcome.is_correct,
                points_delta: outcome.points_delta,
                answer: outcome.answer.clone(),
            }),
            final_wagers,
        }
    }
}

impl From<&RoomSession> for RoomSnapshot {
    fn from(session: &RoomSession) -> Self {
        let players = session
            .roster
            .iter()
            .map(|(id, player)| PlayerSummary {
                id: *id,
                name: player.name.clone(),
                score: player.score,
                is_host: *id == session.host_id,
            })
            .collect();

        Self {
            id: session.id,
            code: session.code.clone(),
            status: session.status.into(),
            host_id: session.host_id,
            players,
            round: session.round.as_ref().map(RoundSnapshot::from_round),
            version: session.version,
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::round::DEFAULT_WAGER_FLOOR;

    fn board_input() -> BoardInput {
        BoardInput {
            categories: (0..5)
                .map(|c| CategoryInput {
                    title: format!("category {c}"),
                    clues: CLUE_VALUES
                        .iter()
                        .map(|&value| ClueInput {
                            id: format!("c{c}-{value}"),
                            question: "q".into(),
                            answer: "a".into(),
                            value,
                            source_snippet: None,
                        })
                        .collect(),
                })
                .collect(),
            final_clue: FinalClueInput {
                category: "final".into(),
                question: "fq".into(),
                answer: "fa".into(),
            },
        }
    }

    #[test]
    fn well_formed_board_validates() {
        assert!(board_input().validate().is_ok());
    }

    #[test]
    fn board_with_wrong_shape_is_rejected() {
        let mut input = board_input();
        input.categories.pop();
        assert!(input.validate().is_err());

        let mut input = board_input();
        input.categories[0].clues.pop();
        assert!(input.validate().is_err());
    }

    #[test]
    fn board_with_duplicate_or_blank_ids_is_rejected() {
        let mut input = board_input();
        input.categories[1].clues[0].id = "c0-200".into();
        assert!(input.validate().is_err());

        let mut input = board_input();
        input.categories[0].clues[0].id = " ".into();
        assert!(input.validate().is_err());
    }

    #[test]
    fn board_with_off_grid_value_is_rejected() {
        let mut input = board_input();
        input.categories[2].clues[3].value = 700;
        assert!(input.validate().is_err());
    }

    #[test]
    fn snapshot_hides_unrevealed_answers() {
        let mut session = RoomSession::create("ABC234".into(), "host".into());
        let host = session.host_id;
        session.round = Some(GameRound::new(
            Board::from(board_input()),
            host,
            DEFAULT_WAGER_FLOOR,
        ));

        let mut round = session.round.take().unwrap();
        round.select_clue(host, "c0-200").unwrap();
        let mut roster = session.roster.clone();
        round
            .resolve_answer(&mut roster, host, "guess".into(), true)
            .unwrap();
        session.roster = roster;
        session.round = Some(round);

        let snapshot = RoomSnapshot::from(&session);
        let round_view = snapshot.round.unwrap();
        let resolved = &round_view.categories[0].clues[0];
        assert!(resolved.revealed);
        assert_eq!(resolved.answer.as_deref(), Some("a"));

        let untouched = &round_view.categories[0].clues[1];
        assert!(!untouched.revealed);
        assert_eq!(untouched.answer, None);

        assert_eq!(round_view.final_clue.question, None);
        assert_eq!(round_view.final_clue.answer, None);
    }

    #[test]
    fn snapshot_hides_wager_amounts_until_reveal() {
        let mut session = RoomSession::create("ABC234".into(), "host".into());
        let host = session.host_id;
        let _other = session.add_player("other".into());
        let mut round = GameRound::new(Board::from(board_input()), host, DEFAULT_WAGER_FLOOR);
        round.phase = RoundPhase::FinalWager;
        round.place_wager(&session.roster, host, 500).unwrap();
        session.round = Some(round);

        let snapshot = RoomSnapshot::from(&session);
        let wagers = snapshot.round.unwrap().final_wagers.unwrap();
        assert_eq!(wagers.len(), 1);
        assert_eq!(wagers[0].player_id, host);
        assert_eq!(wagers[0].amount, None);
        assert!(!wagers[0].answered);
    }
}
