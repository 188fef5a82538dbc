use serde::Serialize;
use utoipa::ToSchema;

use crate::state::round::RoundPhase;

/// Wire representation of the round phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhaseDto {
    /// The turn player picks the next clue.
    Selecting,
    /// The turn player answers the selected clue.
    Answering,
    /// The resolved clue's outcome is on display.
    Revealing,
    /// All players place their final wagers.
    FinalWager,
    /// All players answer the final clue.
    FinalAnswering,
    /// Final outcomes are on display.
    FinalRevealing,
    /// All scores settled.
    Finished,
}

impl From<RoundPhase> for RoundPhaseDto {
    fn from(phase: RoundPhase) -> Self {
        match phase {
            RoundPhase::Selecting => Self::Selecting,
            RoundPhase::Answering => Self::Answering,
            RoundPhase::Revealing => Self::Revealing,
            RoundPhase::FinalWager => Self::FinalWager,
            RoundPhase::FinalAnswering => Self::FinalAnswering,
            RoundPhase::FinalRevealing => Self::FinalRevealing,
            RoundPhase::Finished => Self::Finished,
        }
    }
}
