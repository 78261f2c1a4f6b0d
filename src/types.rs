use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type ConnectionId = String;
pub type DurableId = String;
pub type QuestionId = u32;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Lobby,
    AskingQuestion,
    Revealing,
    RoundEnded,
}

/// Game rules that can be tuned per deployment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub max_players: usize,
    pub min_players: usize,
    pub max_answer_chars: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: 10,
            min_players: 3,
            max_answer_chars: 500,
        }
    }
}

/// A question pair: everyone gets `normal_prompt` except the imposter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "normal")]
    pub normal_prompt: String,
    #[serde(rename = "imposter")]
    pub imposter_prompt: String,
}

/// Public view of a present player (never carries the durable id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

/// One answer as shown during the reveal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevealedAnswer {
    pub display_name: String,
    pub answer_text: String,
}
