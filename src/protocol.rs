use crate::error::GameError;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Re-attach a previously joined player to this connection
    RestoreSession {
        durable_id: DurableId,
    },
    Join {
        display_name: String,
        #[serde(default)]
        durable_id: Option<DurableId>,
    },
    SubmitAnswer {
        text: String,
    },
    Leave,
    // Host-only messages
    StartRound,
    AdvanceReveal,
    NextRound,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection
    Welcome {
        protocol: String,
        connection_id: ConnectionId,
        phase: Phase,
        server_now: String,
    },
    SessionRestored {
        durable_id: DurableId,
        name: String,
        connection_id: ConnectionId,
    },
    RestoreFailed {
        code: String,
        message: String,
    },
    JoinAccepted {
        durable_id: DurableId,
        name: String,
    },
    GameError {
        code: String,
        message: String,
    },
    RosterUpdate {
        players: Vec<PlayerSummary>,
        host_id: Option<ConnectionId>,
        phase: Phase,
    },
    HostChanged {
        new_host_id: Option<ConnectionId>,
    },
    /// Sent to each player individually; the prompt differs for the imposter
    RoundStarted {
        round_number: u32,
        prompt_text: String,
        is_imposter: bool,
        phase: Phase,
    },
    /// Broadcast companion of `RoundStarted` without any question content
    RoundStartedPublic {
        round_number: u32,
        phase: Phase,
        host_id: Option<ConnectionId>,
    },
    AnswerProgress {
        submitted_count: usize,
        total_players: usize,
    },
    AnswersRevealed {
        answers: Vec<RevealedAnswer>,
        normal_question_text: String,
        phase: Phase,
    },
    /// Clients read this text aloud
    SpeakText {
        text: String,
    },
    PhaseChanged {
        phase: Phase,
        host_id: Option<ConnectionId>,
    },
}

impl ServerMessage {
    pub fn error(err: &GameError) -> Self {
        ServerMessage::GameError {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn restore_failed(err: &GameError) -> Self {
        ServerMessage::RestoreFailed {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// A notification together with who should receive it
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Every open connection
    Broadcast(ServerMessage),
    /// A single connection
    To(ConnectionId, ServerMessage),
}

impl Outbound {
    /// The message if `connection` should receive it
    pub fn for_connection(&self, connection: &str) -> Option<&ServerMessage> {
        match self {
            Outbound::Broadcast(msg) => Some(msg),
            Outbound::To(target, msg) if target == connection => Some(msg),
            Outbound::To(..) => None,
        }
    }

    pub fn message(&self) -> &ServerMessage {
        match self {
            Outbound::Broadcast(msg) | Outbound::To(_, msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_names() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"t":"join","displayName":"Alice","durableId":"abc"}"#)
                .unwrap();
        assert_eq!(
            join,
            ClientMessage::Join {
                display_name: "Alice".to_string(),
                durable_id: Some("abc".to_string()),
            }
        );

        let join: ClientMessage =
            serde_json::from_str(r#"{"t":"join","displayName":"Bob"}"#).unwrap();
        assert!(matches!(join, ClientMessage::Join { durable_id: None, .. }));

        let start: ClientMessage = serde_json::from_str(r#"{"t":"start-round"}"#).unwrap();
        assert_eq!(start, ClientMessage::StartRound);

        let restore: ClientMessage =
            serde_json::from_str(r#"{"t":"restore-session","durableId":"xyz"}"#).unwrap();
        assert_eq!(
            restore,
            ClientMessage::RestoreSession {
                durable_id: "xyz".to_string()
            }
        );
    }

    #[test]
    fn test_server_message_wire_shape() {
        let msg = ServerMessage::AnswerProgress {
            submitted_count: 2,
            total_players: 3,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "answer-progress");
        assert_eq!(json["submittedCount"], 2);
        assert_eq!(json["totalPlayers"], 3);

        let msg = ServerMessage::PhaseChanged {
            phase: Phase::AskingQuestion,
            host_id: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "phase-changed");
        assert_eq!(json["phase"], "ASKING_QUESTION");
    }

    #[test]
    fn test_error_message_carries_code() {
        let msg = ServerMessage::error(&GameError::NameTaken);
        assert_eq!(
            msg,
            ServerMessage::GameError {
                code: "NAME_TAKEN".to_string(),
                message: "That name is already taken".to_string(),
            }
        );
    }

    #[test]
    fn test_outbound_targeting() {
        let targeted = Outbound::To(
            "c1".to_string(),
            ServerMessage::SpeakText {
                text: "hi".to_string(),
            },
        );
        assert!(targeted.for_connection("c1").is_some());
        assert!(targeted.for_connection("c2").is_none());

        let broadcast = Outbound::Broadcast(ServerMessage::SpeakText {
            text: "hi".to_string(),
        });
        assert!(broadcast.for_connection("anyone").is_some());
    }
}
