use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Payload used by the turn player to pick a clue.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectClueRequest {
    /// Identifier of the acting player.
    pub player_id: Uuid,
    /// Identifier of the clue to reveal.
    #[validate(length(min = 1, max = 128))]
    pub clue_id: String,
}

/// Payload used by the turn player to answer the selected clue.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Identifier of the acting player.
    pub player_id: Uuid,
    /// Answer text as typed.
    #[validate(length(min = 1, max = 512))]
    pub answer: String,
}

/// Payload used by the turn player to skip the selected clue.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SkipClueRequest {
    /// Identifier of the acting player.
    pub player_id: Uuid,
}

/// Payload used by the turn player to acknowledge the reveal and move on.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ContinueRequest {
    /// Identifier of the acting player.
    pub player_id: Uuid,
}

/// Payload used to place a final-round wager.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct WagerRequest {
    /// Identifier of the acting player.
    pub player_id: Uuid,
    /// Wagered amount; bounds depend on the player's score.
    #[validate(range(min = 0))]
    pub amount: i32,
}

/// Payload used to answer the final clue.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FinalAnswerRequest {
    /// Identifier of the acting player.
    pub player_id: Uuid,
    /// Answer text as typed.
    #[validate(length(min = 1, max = 512))]
    pub answer: String,
}

/// Payload used to trigger the final reveal.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FinalRevealRequest {
    /// Identifier of the acting player.
    pub player_id: Uuid,
}
