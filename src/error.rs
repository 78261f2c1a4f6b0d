//! Errors a player action can be rejected with.
//!
//! Every variant is reported to the originating connection only. None of
//! them leave partially applied state behind.

use crate::types::Phase;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Display name must not be blank")]
    BlankName,

    #[error("That name is already taken")]
    NameTaken,

    #[error("The lobby is full ({0} players max)")]
    LobbyFull(usize),

    #[error("Only the host can {0}")]
    NotHost(&'static str),

    #[error("Cannot {action} while the game is in {phase:?}")]
    WrongPhase { action: &'static str, phase: Phase },

    #[error("You already answered this round")]
    DuplicateAnswer,

    #[error("Answers are not being accepted right now")]
    NotAcceptingAnswers,

    #[error("Answer must not be blank")]
    BlankAnswer,

    #[error("Answer is longer than {0} characters")]
    AnswerTooLong(usize),

    #[error("No session found for that id")]
    NoSuchSession,

    #[error("Join the game first")]
    NotJoined,

    #[error("This connection already belongs to another player")]
    AlreadyJoined,

    #[error("At least {min} players are needed to start a round (have {have})")]
    NotEnoughPlayers { min: usize, have: usize },

    #[error("No questions available")]
    QuestionPoolExhausted,
}

impl GameError {
    /// Stable machine-readable code sent alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            GameError::BlankName => "BLANK_NAME",
            GameError::NameTaken => "NAME_TAKEN",
            GameError::LobbyFull(_) => "LOBBY_FULL",
            GameError::NotHost(_) => "NOT_HOST",
            GameError::WrongPhase { .. } => "WRONG_PHASE",
            GameError::DuplicateAnswer => "DUPLICATE_ANSWER",
            GameError::NotAcceptingAnswers => "NOT_ACCEPTING_ANSWERS",
            GameError::BlankAnswer => "BLANK_ANSWER",
            GameError::AnswerTooLong(_) => "ANSWER_TOO_LONG",
            GameError::NoSuchSession => "NO_SUCH_SESSION",
            GameError::NotJoined => "NOT_JOINED",
            GameError::AlreadyJoined => "ALREADY_JOINED",
            GameError::NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            GameError::QuestionPoolExhausted => "QUESTION_POOL_EXHAUSTED",
        }
    }

    /// Fatal errors force the session back to the lobby
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::QuestionPoolExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pool_exhaustion_is_fatal() {
        assert!(GameError::QuestionPoolExhausted.is_fatal());
        assert!(!GameError::NameTaken.is_fatal());
        assert!(!GameError::NotEnoughPlayers { min: 3, have: 2 }.is_fatal());
    }

    #[test]
    fn test_messages_include_context() {
        let err = GameError::WrongPhase {
            action: "advance the reveal",
            phase: Phase::Lobby,
        };
        assert_eq!(err.code(), "WRONG_PHASE");
        assert!(err.to_string().contains("advance the reveal"));
        assert!(err.to_string().contains("Lobby"));

        assert!(GameError::LobbyFull(10).to_string().contains("10"));
    }
}
