use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default ceiling applied to final wagers when a player's score is below it.
pub const DEFAULT_WAGER_FLOOR: i32 = 1_000;

/// A single board cell: question, canonical answer, and point value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    /// Stable identifier, unique across the whole board.
    pub id: String,
    /// Question text shown to players.
    pub question: String,
    /// Canonical answer used for judging.
    pub answer: String,
    /// Point value of the clue.
    pub value: i32,
    /// Short citation of the source material the clue was generated from.
    pub source_snippet: Option<String>,
}

/// A column of the board: a category title and its clues ordered by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category title displayed as the column header.
    pub title: String,
    /// Clues belonging to this category.
    pub clues: Vec<Clue>,
}

/// The closing clue every player wagers on simultaneously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalClue {
    /// Category of the final clue.
    pub category: String,
    /// Question text.
    pub question: String,
    /// Canonical answer used for judging.
    pub answer: String,
}

/// Immutable clue grid consumed by the round. Produced by an external board
/// generator and validated at the API boundary before it reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Categories making up the grid.
    pub categories: Vec<Category>,
    /// The final-round clue.
    pub final_clue: FinalClue,
}

impl Board {
    /// Look up a clue anywhere on the board by its identifier.
    pub fn clue(&self, id: &str) -> Option<&Clue> {
        self.categories
            .iter()
            .flat_map(|category| category.clues.iter())
            .find(|clue| clue.id == id)
    }

    /// Total number of clues on the board.
    pub fn clue_count(&self) -> usize {
        self.categories
            .iter()
            .map(|category| category.clues.len())
            .sum()
    }
}

/// Participant tracked during a round: display name and running score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within the room.
    pub name: String,
    /// Running score. May go negative.
    pub score: i32,
}

/// Join-ordered roster of players keyed by identifier. Insertion order is the
/// turn rotation order.
pub type Roster = IndexMap<Uuid, Player>;

/// Discrete stage of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// The turn player picks the next clue.
    Selecting,
    /// The turn player answers the selected clue.
    Answering,
    /// The resolved clue's outcome is on display until the turn player continues.
    Revealing,
    /// All players place their final wagers.
    FinalWager,
    /// All players answer the final clue.
    FinalAnswering,
    /// Final outcomes are on display; any player can trigger the reveal.
    FinalRevealing,
    /// Terminal state: all scores settled.
    Finished,
}

/// Outcome of the most recently resolved clue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueOutcome {
    /// Identifier of the resolved clue.
    pub clue_id: String,
    /// Responder, or `None` when the clue was skipped.
    pub responder_id: Option<Uuid>,
    /// Display name of the responder ("No one" on skip).
    pub responder_name: String,
    /// Whether the answer was judged correct.
    pub is_correct: bool,
    /// Signed score change applied to the responder.
    pub points_delta: i32,
    /// Raw answer text as submitted.
    pub answer: String,
}

/// Per-player wager record for the final round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerRecord {
    /// Wagered amount, already bounds-checked on entry.
    pub amount: i32,
    /// Submitted answer text, once the player has answered.
    pub answer: Option<String>,
    /// Correctness verdict, present once judged.
    pub is_correct: Option<bool>,
    /// True once judgement for this wager is complete.
    pub validated: bool,
}

/// Error returned when a round action is rejected. No variant mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// The acting player does not hold the turn.
    #[error("it is not your turn")]
    NotYourTurn,
    /// The acting player is not part of the roster.
    #[error("you are not part of this game")]
    UnknownPlayer,
    /// The requested clue does not exist on the board.
    #[error("no clue `{0}` on the board")]
    UnknownClue(String),
    /// The requested clue has already been resolved.
    #[error("clue `{0}` has already been revealed")]
    ClueAlreadyRevealed(String),
    /// The action is not legal in the current phase.
    #[error("cannot {action} while {phase:?}")]
    WrongPhase {
        /// Human-readable name of the attempted action.
        action: &'static str,
        /// Phase the round was in when the action arrived.
        phase: RoundPhase,
    },
    /// The wager is outside the `0..=max(score, floor)` bound.
    #[error("wager must be between 0 and {max}, got {got}")]
    WagerOutOfBounds {
        /// Maximum allowed wager for this player.
        max: i32,
        /// Rejected amount.
        got: i32,
    },
    /// The player already placed a wager this round.
    #[error("you have already wagered")]
    WagerAlreadyPlaced,
    /// The player has no wager on record for the final round.
    #[error("no wager on record")]
    WagerMissing,
    /// The player already answered the final clue.
    #[error("final answer already submitted")]
    AnswerAlreadySubmitted,
}

/// The phase/turn state machine driving one round of trivia.
///
/// `GameRound` is a pure in-memory structure: every operation is
/// `(state, action, actor) -> Result<effects, RoundError>` and either applies
/// its full effect set or leaves the round untouched. Persistence, transport,
/// and answer judgement live outside. Invariants maintained across every
/// transition:
///
/// - `revealed_clues` grows monotonically and never exceeds the board size;
/// - `selected_clue` is `Some` iff the phase is `Answering`;
/// - `last_result` is `Some` iff the phase is `Revealing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRound {
    /// The immutable clue grid for this round.
    pub board: Board,
    /// Current phase.
    pub phase: RoundPhase,
    /// Player currently empowered to act, or `None` once finished.
    pub turn_player_id: Option<Uuid>,
    /// Identifiers of clues already resolved, in resolution order.
    pub revealed_clues: Vec<String>,
    /// Clue currently under adjudication.
    pub selected_clue: Option<String>,
    /// Outcome of the most recently resolved clue.
    pub last_result: Option<ClueOutcome>,
    /// Final-round wagers keyed by player, insertion-ordered.
    pub final_wagers: IndexMap<Uuid, WagerRecord>,
    /// Wager ceiling applied when a player's score is below it.
    pub wager_floor: i32,
}

impl GameRound {
    /// Start a fresh round on `board` with `first_turn` empowered to select.
    pub fn new(board: Board, first_turn: Uuid, wager_floor: i32) -> Self {
        Self {
            board,
            phase: RoundPhase::Selecting,
            turn_player_id: Some(first_turn),
            revealed_clues: Vec::new(),
            selected_clue: None,
            last_result: None,
            final_wagers: IndexMap::new(),
            wager_floor,
        }
    }

    fn ensure_turn(&self, actor: Uuid) -> Result<(), RoundError> {
        if self.turn_player_id != Some(actor) {
            return Err(RoundError::NotYourTurn);
        }
        Ok(())
    }

    /// The turn player picks a clue, moving the round to `Answering`.
    pub fn select_clue(&mut self, actor: Uuid, clue_id: &str) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Selecting {
            return Err(RoundError::WrongPhase {
                action: "select a clue",
                phase: self.phase,
            });
        }
        self.ensure_turn(actor)?;
        if self.board.clue(clue_id).is_none() {
            return Err(RoundError::UnknownClue(clue_id.to_string()));
        }
        if self.revealed_clues.iter().any(|id| id == clue_id) {
            return Err(RoundError::ClueAlreadyRevealed(clue_id.to_string()));
        }

        self.selected_clue = Some(clue_id.to_string());
        self.phase = RoundPhase::Answering;
        Ok(())
    }

    /// The turn player submits an answer for the selected clue. The
    /// correctness verdict is an opaque input decided by the caller.
    ///
    /// Applies `±value` to the responder's score, appends the clue to the
    /// revealed set, and moves to `Revealing`, or straight to `FinalWager`
    /// when this was the last clue on the board.
    pub fn resolve_answer(
        &mut self,
        roster: &mut Roster,
        actor: Uuid,
        answer: String,
        is_correct: bool,
    ) -> Result<ClueOutcome, RoundError> {
        if self.phase != RoundPhase::Answering {
            return Err(RoundError::WrongPhase {
                action: "submit an answer",
                phase: self.phase,
            });
        }
        self.ensure_turn(actor)?;
        let clue_id = self
            .selected_clue
            .clone()
            .ok_or(RoundError::WrongPhase {
                action: "submit an answer",
                phase: self.phase,
            })?;
        let value = self
            .board
            .clue(&clue_id)
            .map(|clue| clue.value)
            .ok_or_else(|| RoundError::UnknownClue(clue_id.clone()))?;
        let player = roster.get_mut(&actor).ok_or(RoundError::UnknownPlayer)?;

        let points_delta = if is_correct { value } else { -value };
        player.score += points_delta;

        let outcome = ClueOutcome {
            clue_id,
            responder_id: Some(actor),
            responder_name: player.name.clone(),
            is_correct,
            points_delta,
            answer,
        };
        self.finish_clue(outcome.clone());
        Ok(outcome)
    }

    /// The turn player skips the selected clue: revealed with no score change,
    /// recorded as answered by no one.
    pub fn skip_clue(&mut self, actor: Uuid) -> Result<ClueOutcome, RoundError> {
        if self.phase != RoundPhase::Answering {
            return Err(RoundError::WrongPhase {
                action: "skip",
                phase: self.phase,
            });
        }
        self.ensure_turn(actor)?;
        let clue_id = self
            .selected_clue
            .clone()
            .ok_or(RoundError::WrongPhase {
                action: "skip",
                phase: self.phase,
            })?;

        let outcome = ClueOutcome {
            clue_id,
            responder_id: None,
            responder_name: "No one".to_string(),
            is_correct: false,
            points_delta: 0,
            answer: "(skipped)".to_string(),
        };
        self.finish_clue(outcome.clone());
        Ok(outcome)
    }

    /// Append the resolved clue and advance out of `Answering`. Entering the
    /// final round clears the turn since wagering is simultaneous.
    fn finish_clue(&mut self, outcome: ClueOutcome) {
        self.revealed_clues.push(outcome.clue_id.clone());
        self.selected_clue = None;

        if self.revealed_clues.len() >= self.board.clue_count() {
            self.last_result = None;
            self.final_wagers = IndexMap::new();
            self.phase = RoundPhase::FinalWager;
        } else {
            self.last_result = Some(outcome);
            self.phase = RoundPhase::Revealing;
        }
    }

    /// The turn player acknowledges the reveal and returns to `Selecting`,
    /// recomputing the turn: a correct answer keeps the turn ("run the
    /// board"), otherwise the next player in join order takes it.
    pub fn advance(&mut self, roster: &Roster, actor: Uuid) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Revealing {
            return Err(RoundError::WrongPhase {
                action: "continue",
                phase: self.phase,
            });
        }
        self.ensure_turn(actor)?;

        let retain_turn = self
            .last_result
            .as_ref()
            .is_some_and(|outcome| outcome.is_correct);
        if !retain_turn {
            self.turn_player_id = self
                .turn_player_id
                .and_then(|current| next_in_rotation(roster, current));
        }

        self.last_result = None;
        self.phase = RoundPhase::Selecting;
        Ok(())
    }

    /// Record a final-round wager for `actor`. Accepted wagers satisfy
    /// `0 <= amount <= max(score, wager_floor)`. Returns `true` when this was
    /// the last outstanding wager and the round advanced to `FinalAnswering`.
    pub fn place_wager(
        &mut self,
        roster: &Roster,
        actor: Uuid,
        amount: i32,
    ) -> Result<bool, RoundError> {
        if self.phase != RoundPhase::FinalWager {
            return Err(RoundError::WrongPhase {
                action: "wager",
                phase: self.phase,
            });
        }
        let player = roster.get(&actor).ok_or(RoundError::UnknownPlayer)?;
        if self.final_wagers.contains_key(&actor) {
            return Err(RoundError::WagerAlreadyPlaced);
        }
        let max = player.score.max(self.wager_floor);
        if amount < 0 || amount > max {
            return Err(RoundError::WagerOutOfBounds { max, got: amount });
        }

        self.final_wagers.insert(
            actor,
            WagerRecord {
                amount,
                answer: None,
                is_correct: None,
                validated: false,
            },
        );

        Ok(self.maybe_advance_final(roster))
    }

    /// Record `actor`'s final answer together with its judged verdict and mark
    /// the wager validated. Returns `true` when every wager is validated and
    /// the round advanced to `FinalRevealing`.
    pub fn submit_final_answer(
        &mut self,
        roster: &Roster,
        actor: Uuid,
        answer: String,
        is_correct: bool,
    ) -> Result<bool, RoundError> {
        if self.phase != RoundPhase::FinalAnswering {
            return Err(RoundError::WrongPhase {
                action: "answer the final clue",
                phase: self.phase,
            });
        }
        if !roster.contains_key(&actor) {
            return Err(RoundError::UnknownPlayer);
        }
        let wager = self
            .final_wagers
            .get_mut(&actor)
            .ok_or(RoundError::WagerMissing)?;
        if wager.answer.is_some() {
            return Err(RoundError::AnswerAlreadySubmitted);
        }

        wager.answer = Some(answer);
        wager.is_correct = Some(is_correct);
        wager.validated = true;

        Ok(self.maybe_advance_final(roster))
    }

    /// Any player triggers the final reveal: every validated wager is applied
    /// as `±amount` to its owner's score and the round terminates.
    pub fn reveal_final(&mut self, roster: &mut Roster, actor: Uuid) -> Result<(), RoundError> {
        if self.phase != RoundPhase::FinalRevealing {
            return Err(RoundError::WrongPhase {
                action: "reveal the final scores",
                phase: self.phase,
            });
        }
        if !roster.contains_key(&actor) {
            return Err(RoundError::UnknownPlayer);
        }

        for (player_id, wager) in &self.final_wagers {
            let Some(player) = roster.get_mut(player_id) else {
                // Wager left behind by a departed player.
                continue;
            };
            if wager.is_correct.unwrap_or(false) {
                player.score += wager.amount;
            } else {
                player.score -= wager.amount;
            }
        }

        self.turn_player_id = None;
        self.phase = RoundPhase::Finished;
        Ok(())
    }

    /// Repair the round after a player departed. `roster` is the roster with
    /// the player already removed; `departed_index` is the position the player
    /// held in join order before removal.
    ///
    /// When the departing player held the turn, the player now sitting at the
    /// same positional index (mod the shorter roster) takes it; a departure
    /// mid-`Answering` abandons the resolution and force-resets to
    /// `Selecting`. During the final round, the departed player's wager is
    /// dropped and the pending auto-advance is re-evaluated against the
    /// remaining players.
    pub fn handle_departure(&mut self, roster: &Roster, departed: Uuid, departed_index: usize) {
        if roster.is_empty() {
            return;
        }

        self.final_wagers.shift_remove(&departed);

        if self.turn_player_id == Some(departed) {
            let index = departed_index % roster.len();
            self.turn_player_id = roster.get_index(index).map(|(id, _)| *id);

            if self.phase == RoundPhase::Answering {
                self.selected_clue = None;
                self.phase = RoundPhase::Selecting;
            } else if self.phase == RoundPhase::Revealing {
                // The departed resolver can no longer continue; the new turn
                // holder picks next.
                self.last_result = None;
                self.phase = RoundPhase::Selecting;
            }
        }

        if matches!(
            self.phase,
            RoundPhase::FinalWager | RoundPhase::FinalAnswering
        ) {
            self.maybe_advance_final(roster);
        }
    }

    /// Move `FinalWager` to `FinalAnswering` once every current player has
    /// wagered, and `FinalAnswering` to `FinalRevealing` once every wager is
    /// validated. Returns whether a transition happened.
    fn maybe_advance_final(&mut self, roster: &Roster) -> bool {
        match self.phase {
            RoundPhase::FinalWager => {
                let all_wagered = roster
                    .keys()
                    .all(|player_id| self.final_wagers.contains_key(player_id));
                if all_wagered && !roster.is_empty() {
                    self.phase = RoundPhase::FinalAnswering;
                    return true;
                }
                false
            }
            RoundPhase::FinalAnswering => {
                let all_validated = roster
                    .keys()
                    .filter_map(|player_id| self.final_wagers.get(player_id))
                    .all(|wager| wager.validated)
                    && roster
                        .keys()
                        .all(|player_id| self.final_wagers.contains_key(player_id));
                if all_validated && !roster.is_empty() {
                    self.phase = RoundPhase::FinalRevealing;
                    return true;
                }
                false
            }
            _ => false,
        }
    }
}

/// Next player after `current` in join order, wrapping circularly.
fn next_in_rotation(roster: &Roster, current: Uuid) -> Option<Uuid> {
    if roster.is_empty() {
        return None;
    }
    let index = roster.get_index_of(&current).unwrap_or(0);
    let next = (index + 1) % roster.len();
    roster.get_index(next).map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clue(id: &str, value: i32) -> Clue {
        Clue {
            id: id.to_string(),
            question: format!("question {id}"),
            answer: format!("answer {id}"),
            value,
            source_snippet: None,
        }
    }

    fn full_board() -> Board {
        let categories = (0..5)
            .map(|c| Category {
                title: format!("category {c}"),
                clues: [200, 400, 600, 800, 1000]
                    .iter()
                    .map(|&value| clue(&format!("c{c}-{value}"), value))
                    .collect(),
            })
            .collect();
        Board {
            categories,
            final_clue: FinalClue {
                category: "history".into(),
                question: "final question".into(),
                answer: "final answer".into(),
            },
        }
    }

    fn tiny_board(value: i32) -> Board {
        Board {
            categories: vec![Category {
                title: "only".into(),
                clues: vec![clue("only-clue", value)],
            }],
            final_clue: FinalClue {
                category: "geography".into(),
                question: "final question".into(),
                answer: "final answer".into(),
            },
        }
    }

    fn roster_of(names: &[&str]) -> (Roster, Vec<Uuid>) {
        let mut roster = Roster::new();
        let mut ids = Vec::new();
        for name in names {
            let id = Uuid::new_v4();
            roster.insert(
                id,
                Player {
                    name: name.to_string(),
                    score: 0,
                },
            );
            ids.push(id);
        }
        (roster, ids)
    }

    #[test]
    fn select_requires_turn_and_unrevealed_clue() {
        let (_roster, ids) = roster_of(&["a", "b"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);

        assert_eq!(
            round.select_clue(ids[1], "c0-200"),
            Err(RoundError::NotYourTurn)
        );
        assert_eq!(
            round.select_clue(ids[0], "nope"),
            Err(RoundError::UnknownClue("nope".into()))
        );

        round.select_clue(ids[0], "c0-200").unwrap();
        assert_eq!(round.phase, RoundPhase::Answering);
        assert_eq!(round.selected_clue.as_deref(), Some("c0-200"));
    }

    #[test]
    fn correct_answer_scores_and_reveals() {
        let (mut roster, ids) = roster_of(&["a", "b"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);

        round.select_clue(ids[0], "c0-600").unwrap();
        let outcome = round
            .resolve_answer(&mut roster, ids[0], "my answer".into(), true)
            .unwrap();

        assert_eq!(outcome.points_delta, 600);
        assert_eq!(roster[&ids[0]].score, 600);
        assert_eq!(round.phase, RoundPhase::Revealing);
        assert_eq!(round.selected_clue, None);
        assert_eq!(round.revealed_clues, vec!["c0-600".to_string()]);
        assert!(round.last_result.is_some());
    }

    #[test]
    fn wrong_answer_goes_negative_and_rotates_on_continue() {
        // Three players in join order; the first answers a 400 clue wrong.
        let (mut roster, ids) = roster_of(&["a", "b", "c"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);

        round.select_clue(ids[0], "c1-400").unwrap();
        round
            .resolve_answer(&mut roster, ids[0], "wrong".into(), false)
            .unwrap();
        assert_eq!(roster[&ids[0]].score, -400);

        round.advance(&roster, ids[0]).unwrap();
        assert_eq!(round.phase, RoundPhase::Selecting);
        assert_eq!(round.turn_player_id, Some(ids[1]));
        assert_eq!(round.last_result, None);
    }

    #[test]
    fn correct_answer_retains_turn_on_continue() {
        let (mut roster, ids) = roster_of(&["a", "b"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);

        round.select_clue(ids[0], "c0-200").unwrap();
        round
            .resolve_answer(&mut roster, ids[0], "right".into(), true)
            .unwrap();
        round.advance(&roster, ids[0]).unwrap();

        assert_eq!(round.turn_player_id, Some(ids[0]));
    }

    #[test]
    fn rotation_wraps_circularly() {
        let (mut roster, ids) = roster_of(&["a", "b", "c"]);
        let mut round = GameRound::new(full_board(), ids[2], DEFAULT_WAGER_FLOOR);

        round.select_clue(ids[2], "c0-200").unwrap();
        round
            .resolve_answer(&mut roster, ids[2], "wrong".into(), false)
            .unwrap();
        round.advance(&roster, ids[2]).unwrap();

        assert_eq!(round.turn_player_id, Some(ids[0]));
    }

    #[test]
    fn skip_reveals_without_scoring() {
        let (roster, ids) = roster_of(&["a", "b"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);

        round.select_clue(ids[0], "c2-800").unwrap();
        let outcome = round.skip_clue(ids[0]).unwrap();

        assert_eq!(outcome.points_delta, 0);
        assert_eq!(outcome.responder_id, None);
        assert!(!outcome.is_correct);
        assert_eq!(round.phase, RoundPhase::Revealing);

        // Skip counts as incorrect for rotation purposes.
        round.advance(&roster, ids[0]).unwrap();
        assert_eq!(round.turn_player_id, Some(ids[1]));
    }

    #[test]
    fn last_clue_moves_to_final_wager() {
        // Single-clue board: a correct answer lands straight in final_wager
        // with no revealing stop and the turn untouched.
        let (mut roster, ids) = roster_of(&["p1", "p2"]);
        let mut round = GameRound::new(tiny_board(200), ids[0], DEFAULT_WAGER_FLOOR);

        round.select_clue(ids[0], "only-clue").unwrap();
        round
            .resolve_answer(&mut roster, ids[0], "right".into(), true)
            .unwrap();

        assert_eq!(roster[&ids[0]].score, 200);
        assert_eq!(round.phase, RoundPhase::FinalWager);
        assert_eq!(round.turn_player_id, Some(ids[0]));
        assert!(round.final_wagers.is_empty());
        assert_eq!(round.last_result, None);
    }

    #[test]
    fn revealed_set_grows_monotonically_to_board_size() {
        let (mut roster, ids) = roster_of(&["a"]);
        let board = full_board();
        let all_ids: Vec<String> = board
            .categories
            .iter()
            .flat_map(|c| c.clues.iter().map(|clue| clue.id.clone()))
            .collect();
        let mut round = GameRound::new(board, ids[0], DEFAULT_WAGER_FLOOR);

        let mut previous = 0;
        for clue_id in &all_ids {
            round.select_clue(ids[0], clue_id).unwrap();
            round
                .resolve_answer(&mut roster, ids[0], "x".into(), true)
                .unwrap();
            assert!(round.revealed_clues.len() > previous);
            previous = round.revealed_clues.len();
            if round.phase == RoundPhase::Revealing {
                round.advance(&roster, ids[0]).unwrap();
            }
        }

        assert_eq!(round.revealed_clues.len(), 25);
        assert_eq!(round.phase, RoundPhase::FinalWager);
    }

    #[test]
    fn wager_bounds_follow_score_and_floor() {
        let (mut roster, ids) = roster_of(&["rich", "poor"]);
        roster[&ids[0]].score = 3_000;
        roster[&ids[1]].score = -400;
        let mut round = GameRound::new(tiny_board(200), ids[0], DEFAULT_WAGER_FLOOR);
        round.phase = RoundPhase::FinalWager;

        assert_eq!(
            round.place_wager(&roster, ids[0], 3_001),
            Err(RoundError::WagerOutOfBounds {
                max: 3_000,
                got: 3_001
            })
        );
        assert_eq!(
            round.place_wager(&roster, ids[1], 1_001),
            Err(RoundError::WagerOutOfBounds {
                max: 1_000,
                got: 1_001
            })
        );
        assert_eq!(
            round.place_wager(&roster, ids[0], -1),
            Err(RoundError::WagerOutOfBounds { max: 3_000, got: -1 })
        );
        assert!(round.final_wagers.is_empty());

        assert_eq!(round.place_wager(&roster, ids[0], 3_000), Ok(false));
        assert_eq!(
            round.place_wager(&roster, ids[0], 100),
            Err(RoundError::WagerAlreadyPlaced)
        );
    }

    #[test]
    fn wagers_advance_exactly_when_last_player_wagers() {
        // Auto-advance happens on the last valid wager, not before.
        let (roster, ids) = roster_of(&["a", "b", "c"]);
        let mut round = GameRound::new(tiny_board(200), ids[0], DEFAULT_WAGER_FLOOR);
        round.phase = RoundPhase::FinalWager;

        assert_eq!(round.place_wager(&roster, ids[0], 100), Ok(false));
        assert_eq!(round.phase, RoundPhase::FinalWager);
        assert_eq!(round.place_wager(&roster, ids[1], 0), Ok(false));
        assert_eq!(round.phase, RoundPhase::FinalWager);
        assert_eq!(round.place_wager(&roster, ids[2], 1_000), Ok(true));
        assert_eq!(round.phase, RoundPhase::FinalAnswering);
    }

    #[test]
    fn final_round_settles_wagers_by_correctness() {
        let (mut roster, ids) = roster_of(&["a", "b"]);
        roster[&ids[0]].score = 1_000;
        roster[&ids[1]].score = 500;
        let mut round = GameRound::new(tiny_board(200), ids[0], DEFAULT_WAGER_FLOOR);
        round.phase = RoundPhase::FinalWager;

        round.place_wager(&roster, ids[0], 800).unwrap();
        round.place_wager(&roster, ids[1], 500).unwrap();
        assert_eq!(round.phase, RoundPhase::FinalAnswering);

        assert_eq!(
            round.submit_final_answer(&roster, ids[0], "right".into(), true),
            Ok(false)
        );
        assert_eq!(
            round.submit_final_answer(&roster, ids[0], "again".into(), false),
            Err(RoundError::AnswerAlreadySubmitted)
        );
        assert_eq!(
            round.submit_final_answer(&roster, ids[1], "wrong".into(), false),
            Ok(true)
        );
        assert_eq!(round.phase, RoundPhase::FinalRevealing);

        round.reveal_final(&mut roster, ids[1]).unwrap();
        assert_eq!(round.phase, RoundPhase::Finished);
        assert_eq!(round.turn_player_id, None);
        assert_eq!(roster[&ids[0]].score, 1_800);
        assert_eq!(roster[&ids[1]].score, 0);
    }

    #[test]
    fn departure_of_turn_holder_mid_answer_resets_to_selecting() {
        // Turn holder leaves mid-answer: phase resets, selected clue is
        // cleared, and the turn passes on.
        let (mut roster, ids) = roster_of(&["host", "b", "c"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);
        round.select_clue(ids[0], "c0-200").unwrap();

        let departed_index = roster.get_index_of(&ids[0]).unwrap();
        roster.shift_remove(&ids[0]);
        round.handle_departure(&roster, ids[0], departed_index);

        assert_eq!(round.phase, RoundPhase::Selecting);
        assert_eq!(round.selected_clue, None);
        assert_eq!(round.turn_player_id, Some(ids[1]));
    }

    #[test]
    fn departure_keeps_positional_index_modulo_new_count() {
        let (mut roster, ids) = roster_of(&["a", "b", "c"]);
        let mut round = GameRound::new(full_board(), ids[2], DEFAULT_WAGER_FLOOR);

        // Last-joined player holds the turn and leaves; index 2 wraps to 0.
        let departed_index = roster.get_index_of(&ids[2]).unwrap();
        roster.shift_remove(&ids[2]);
        round.handle_departure(&roster, ids[2], departed_index);

        assert_eq!(round.turn_player_id, Some(ids[0]));
    }

    #[test]
    fn departure_of_non_turn_player_leaves_round_alone() {
        let (mut roster, ids) = roster_of(&["a", "b", "c"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);
        round.select_clue(ids[0], "c0-200").unwrap();

        let departed_index = roster.get_index_of(&ids[2]).unwrap();
        roster.shift_remove(&ids[2]);
        round.handle_departure(&roster, ids[2], departed_index);

        assert_eq!(round.phase, RoundPhase::Answering);
        assert_eq!(round.turn_player_id, Some(ids[0]));
        assert_eq!(round.selected_clue.as_deref(), Some("c0-200"));
    }

    #[test]
    fn departure_during_final_wager_unblocks_advance() {
        let (mut roster, ids) = roster_of(&["a", "b", "c"]);
        let mut round = GameRound::new(tiny_board(200), ids[0], DEFAULT_WAGER_FLOOR);
        round.phase = RoundPhase::FinalWager;

        round.place_wager(&roster, ids[0], 100).unwrap();
        round.place_wager(&roster, ids[1], 100).unwrap();

        // The only player yet to wager leaves: the round must not stall.
        let departed_index = roster.get_index_of(&ids[2]).unwrap();
        roster.shift_remove(&ids[2]);
        round.handle_departure(&roster, ids[2], departed_index);

        assert_eq!(round.phase, RoundPhase::FinalAnswering);
        assert!(!round.final_wagers.contains_key(&ids[2]));
    }

    #[test]
    fn actions_in_wrong_phase_are_rejected_without_mutation() {
        let (mut roster, ids) = roster_of(&["a", "b"]);
        let mut round = GameRound::new(full_board(), ids[0], DEFAULT_WAGER_FLOOR);
        let before = round.clone();

        assert!(matches!(
            round.resolve_answer(&mut roster, ids[0], "x".into(), true),
            Err(RoundError::WrongPhase { .. })
        ));
        assert!(matches!(
            round.advance(&roster, ids[0]),
            Err(RoundError::WrongPhase { .. })
        ));
        assert!(matches!(
            round.place_wager(&roster, ids[0], 100),
            Err(RoundError::WrongPhase { .. })
        ));
        assert!(matches!(
            round.reveal_final(&mut roster, ids[0]),
            Err(RoundError::WrongPhase { .. })
        ));
        assert_eq!(round, before);
        assert_eq!(roster[&ids[0]].score, 0);
    }
}
