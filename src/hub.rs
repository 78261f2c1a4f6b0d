//! Shared application state
//!
//! The session sits behind one async lock. Each inbound event is applied
//! while holding the write lock and its notifications are published before
//! the lock is released, so events never interleave and every socket sees
//! notifications in the order the session produced them.

use crate::dispatch::Inbound;
use crate::protocol::{Outbound, ServerMessage, PROTOCOL_VERSION};
use crate::state::{Session, SessionSnapshot};
use crate::types::ConnectionId;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

const OUTBOUND_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    session: Arc<RwLock<Session>>,
    /// Every notification of every event, broadcast or targeted
    outbound: broadcast::Sender<Outbound>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        let (tx, _rx) = broadcast::channel(OUTBOUND_CAPACITY);
        Self {
            session: Arc::new(RwLock::new(session)),
            outbound: tx,
        }
    }

    /// Fresh id for a transport connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ulid::Ulid::new().to_string()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.outbound.subscribe()
    }

    /// First message for a new connection
    pub async fn welcome(&self, connection: &ConnectionId) -> ServerMessage {
        ServerMessage::Welcome {
            protocol: PROTOCOL_VERSION.to_string(),
            connection_id: connection.clone(),
            phase: self.session.read().await.phase(),
            server_now: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Apply one event and publish its notifications. Also returns them.
    pub async fn handle(&self, connection: &str, event: Inbound) -> Vec<Outbound> {
        let mut session = self.session.write().await;
        let effects = session.handle(connection, event);

        for effect in &effects {
            // No subscribers is fine
            let _ = self.outbound.send(effect.clone());
        }
        drop(session);

        effects
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ClientMessage;
    use crate::questions::QuestionBank;
    use crate::types::{GameConfig, Phase};

    fn state() -> AppState {
        AppState::new(Session::with_seed(
            QuestionBank::builtin().unwrap(),
            GameConfig::default(),
            7,
        ))
    }

    #[tokio::test]
    async fn test_handle_publishes_in_order() {
        let state = state();
        let mut rx = state.subscribe();

        let effects = state
            .handle(
                "c0",
                ClientMessage::Join {
                    display_name: "Alice".to_string(),
                    durable_id: None,
                }
                .into(),
            )
            .await;
        assert!(!effects.is_empty());

        for expected in &effects {
            assert_eq!(&rx.recv().await.unwrap(), expected);
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_welcome_reports_connection_and_phase() {
        let state = state();
        let id = state.next_connection_id();

        match state.welcome(&id).await {
            ServerMessage::Welcome {
                connection_id,
                phase,
                protocol,
                ..
            } => {
                assert_eq!(connection_id, id);
                assert_eq!(phase, Phase::Lobby);
                assert_eq!(protocol, PROTOCOL_VERSION);
            }
            other => panic!("Expected Welcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let state = state();
        assert_ne!(state.next_connection_id(), state.next_connection_id());
    }

    #[tokio::test]
    async fn test_concurrent_joins_are_serialized() {
        let state = state();
        let mut tasks = Vec::new();
        for i in 0..10 {
            let state = state.clone();
            tasks.push(tokio::spawn(async move {
                state
                    .handle(
                        &format!("c{}", i),
                        ClientMessage::Join {
                            display_name: "Same".to_string(),
                            durable_id: None,
                        }
                        .into(),
                    )
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // Exactly one of the racing joins wins the name
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.host_id, Some(snapshot.players[0].connection_id.clone()));
    }
}
