//! Event dispatcher
//!
//! `Session::handle` applies one inbound event: it resolves the connection
//! to a player, checks role and phase, mutates the session and returns the
//! notifications to deliver. Nothing here touches the network.
//!
//! Handlers validate before they mutate. A handler that returns `Err` has
//! changed nothing and emitted nothing; the error goes back to the
//! originating connection only.

use crate::error::GameError;
use crate::protocol::{ClientMessage, Outbound, ServerMessage};
use crate::state::host::HostChange;
use crate::state::registry::Binding;
use crate::state::roster::{normalize_name, Roster};
use crate::state::round::{check_transition, Reveal, RoundAction};
use crate::state::Session;
use crate::types::Phase;

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Client(ClientMessage),
    /// The transport lost the connection
    Disconnected,
}

impl From<ClientMessage> for Inbound {
    fn from(msg: ClientMessage) -> Self {
        Inbound::Client(msg)
    }
}

/// Notifications produced while handling one event, in emission order
#[derive(Debug, Default)]
struct Effects(Vec<Outbound>);

impl Effects {
    fn broadcast(&mut self, msg: ServerMessage) {
        self.0.push(Outbound::Broadcast(msg));
    }

    fn send(&mut self, connection: &str, msg: ServerMessage) {
        self.0.push(Outbound::To(connection.to_string(), msg));
    }
}

fn answers_revealed(reveal: Reveal) -> ServerMessage {
    ServerMessage::AnswersRevealed {
        answers: reveal.answers,
        normal_question_text: reveal.normal_question_text,
        phase: Phase::Revealing,
    }
}

impl Session {
    /// Apply one inbound event from `connection`
    pub fn handle(&mut self, connection: &str, event: Inbound) -> Vec<Outbound> {
        let mut fx = Effects::default();

        match event {
            Inbound::Disconnected => self.on_disconnect(connection, &mut fx),

            Inbound::Client(msg) => {
                // Restore has its own failure message
                let rejection: fn(&GameError) -> ServerMessage =
                    if matches!(msg, ClientMessage::RestoreSession { .. }) {
                        ServerMessage::restore_failed
                    } else {
                        ServerMessage::error
                    };

                let result = match msg {
                    ClientMessage::RestoreSession { durable_id } => {
                        self.restore_session(connection, &durable_id, &mut fx)
                    }
                    ClientMessage::Join {
                        display_name,
                        durable_id,
                    } => self.join(connection, &display_name, durable_id.as_deref(), &mut fx),
                    ClientMessage::SubmitAnswer { text } => {
                        self.submit_answer(connection, &text, &mut fx)
                    }
                    ClientMessage::Leave => self.leave(connection, &mut fx),
                    ClientMessage::StartRound => self.start_round(connection, &mut fx),
                    ClientMessage::AdvanceReveal => self.advance_reveal(connection, &mut fx),
                    ClientMessage::NextRound => self.next_round(connection, &mut fx),
                };

                if let Err(e) = result {
                    tracing::warn!("Rejected action from {}: {}", connection, e);
                    fx.send(connection, rejection(&e));
                }
            }
        }

        fx.0
    }

    fn join(
        &mut self,
        connection: &str,
        display_name: &str,
        durable_id: Option<&str>,
        fx: &mut Effects,
    ) -> Result<(), GameError> {
        let by_connection = self.registry.key_for_connection(connection);
        let by_durable = durable_id.and_then(|id| self.registry.key_for_durable(id));
        let joining = match (by_connection, by_durable) {
            (Some(current), Some(other)) if current != other => {
                return Err(GameError::AlreadyJoined)
            }
            (Some(current), _) => Some(current),
            (None, known) => known,
        };

        // A returning identity keeps the name it first joined with
        let known = joining
            .and_then(|key| self.registry.get(key))
            .map(|p| (p.durable_id().clone(), p.display_name().to_string()));
        let (durable_id, name) = match known {
            Some((id, name)) => (Some(id), name),
            None => (None, normalize_name(display_name)?),
        };

        self.roster()
            .admit(&name, joining, self.config.max_players)?;

        let binding = self
            .registry
            .bind(durable_id.as_deref(), connection.to_string(), name.clone());

        tracing::info!(
            "Player {:?} joined on {} ({})",
            name,
            connection,
            if binding.minted { "new" } else { "returning" }
        );

        fx.send(
            connection,
            ServerMessage::JoinAccepted {
                durable_id: binding.durable_id.clone(),
                name,
            },
        );
        self.after_attach(connection, &binding, fx);
        Ok(())
    }

    fn restore_session(
        &mut self,
        connection: &str,
        durable_id: &str,
        fx: &mut Effects,
    ) -> Result<(), GameError> {
        let key = self
            .registry
            .key_for_durable(durable_id)
            .ok_or(GameError::NoSuchSession)?;
        if let Some(current) = self.registry.key_for_connection(connection) {
            if current != key {
                return Err(GameError::AlreadyJoined);
            }
        }

        let name = self
            .registry
            .get(key)
            .map(|p| p.display_name().to_string())
            .ok_or(GameError::NoSuchSession)?;
        self.roster()
            .admit(&name, Some(key), self.config.max_players)?;

        let binding = self.registry.restore(durable_id, connection.to_string())?;
        tracing::info!("Player {:?} restored on {}", name, connection);

        fx.send(
            connection,
            ServerMessage::SessionRestored {
                durable_id: binding.durable_id.clone(),
                name,
                connection_id: connection.to_string(),
            },
        );
        self.after_attach(connection, &binding, fx);
        Ok(())
    }

    /// Host hand-over, roster broadcast and round catch-up for a player that
    /// was just bound to `connection`
    fn after_attach(&mut self, connection: &str, binding: &Binding, fx: &mut Effects) {
        // The host role belongs to the player, so it follows them
        let mut change = match &binding.replaced_connection {
            Some(old) => self.host.transfer(old, connection),
            None => HostChange::Unchanged,
        };
        if !change.changed() {
            change = self.host.claim_if_vacant(connection);
        }
        if let HostChange::Elected(id) = change {
            tracing::info!("Host is now {}", id);
            fx.broadcast(ServerMessage::HostChanged {
                new_host_id: Some(id),
            });
        }

        self.broadcast_roster(fx);

        match self.round.phase() {
            Phase::Lobby => {}
            Phase::AskingQuestion => {
                if let Some((prompt, is_imposter)) = self.round.prompt_for(&binding.durable_id) {
                    fx.send(
                        connection,
                        ServerMessage::RoundStarted {
                            round_number: self.round.round_number(),
                            prompt_text: prompt.to_string(),
                            is_imposter,
                            phase: Phase::AskingQuestion,
                        },
                    );
                }
                if binding.was_bound {
                    fx.send(connection, self.progress());
                } else {
                    // The total changed for everyone
                    fx.broadcast(self.progress());
                }
            }
            Phase::Revealing => {
                fx.send(connection, self.phase_changed());
                if let Some(reveal) = self.round.current_reveal() {
                    fx.send(connection, answers_revealed(reveal));
                }
            }
            Phase::RoundEnded => fx.send(connection, self.phase_changed()),
        }
    }

    fn submit_answer(
        &mut self,
        connection: &str,
        text: &str,
        fx: &mut Effects,
    ) -> Result<(), GameError> {
        check_transition(self.round.phase(), RoundAction::SubmitAnswer)?;
        let (durable_id, name) = self
            .registry
            .resolve(connection)
            .map(|p| (p.durable_id().clone(), p.display_name().to_string()))
            .ok_or(GameError::NotAcceptingAnswers)?;

        let submitted =
            self.round
                .submit_answer(&durable_id, &name, text, self.config.max_answer_chars)?;
        tracing::info!(
            "Answer {}/{} received from {:?}",
            submitted,
            self.roster().len(),
            name
        );

        fx.broadcast(self.progress());
        self.reveal_if_complete(fx);
        Ok(())
    }

    fn start_round(&mut self, connection: &str, fx: &mut Effects) -> Result<(), GameError> {
        self.require_host(connection, RoundAction::Start)?;
        check_transition(self.round.phase(), RoundAction::Start)?;
        self.begin_round(connection, fx);
        Ok(())
    }

    fn next_round(&mut self, connection: &str, fx: &mut Effects) -> Result<(), GameError> {
        self.require_host(connection, RoundAction::NextRound)?;
        check_transition(self.round.phase(), RoundAction::NextRound)?;
        self.begin_round(connection, fx);
        Ok(())
    }

    fn advance_reveal(&mut self, connection: &str, fx: &mut Effects) -> Result<(), GameError> {
        self.require_host(connection, RoundAction::AdvanceReveal)?;
        let text = self.round.advance_reveal()?;
        tracing::info!("Round {} ended", self.round.round_number());

        fx.broadcast(ServerMessage::SpeakText { text });
        fx.broadcast(self.phase_changed());
        Ok(())
    }

    fn leave(&mut self, connection: &str, fx: &mut Effects) -> Result<(), GameError> {
        if self.registry.key_for_connection(connection).is_none() {
            return Err(GameError::NotJoined);
        }
        self.depart(connection, true, fx);
        Ok(())
    }

    fn on_disconnect(&mut self, connection: &str, fx: &mut Effects) {
        // Players that dropped earlier had their chance to come back
        let swept = self.registry.sweep_detached();
        if swept > 0 {
            tracing::debug!("Purged {} detached players", swept);
        }
        self.depart(connection, false, fx);
    }

    fn require_host(&self, connection: &str, action: RoundAction) -> Result<(), GameError> {
        if self.host.is_host(connection) {
            Ok(())
        } else {
            Err(GameError::NotHost(action.describe()))
        }
    }

    /// Runs the round start for the host at `requester`. Failures are not
    /// rejections: they force the session back to the lobby.
    fn begin_round(&mut self, requester: &str, fx: &mut Effects) {
        let members = self.roster().durable_ids();
        let start = match self.round.begin(
            &members,
            self.config.min_players,
            &self.questions,
            &mut self.rng,
        ) {
            Ok(start) => start,
            Err(e) => {
                fx.send(requester, ServerMessage::error(&e));
                if e.is_fatal() {
                    tracing::error!("Cannot start round: {}", e);
                    self.reset();
                } else {
                    tracing::warn!("Cannot start round: {}", e);
                    self.return_to_lobby();
                }
                fx.broadcast(self.phase_changed());
                return;
            }
        };

        tracing::info!(
            round = start.round_number,
            question = start.question.id,
            players = members.len(),
            "Round started"
        );

        for (_, player) in self.roster().members() {
            let Some(connection) = player.connection() else {
                continue;
            };
            let is_imposter = *player.durable_id() == start.imposter;
            let prompt = if is_imposter {
                &start.question.imposter_prompt
            } else {
                &start.question.normal_prompt
            };
            fx.send(
                connection,
                ServerMessage::RoundStarted {
                    round_number: start.round_number,
                    prompt_text: prompt.clone(),
                    is_imposter,
                    phase: Phase::AskingQuestion,
                },
            );
        }

        fx.broadcast(ServerMessage::RoundStartedPublic {
            round_number: start.round_number,
            phase: Phase::AskingQuestion,
            host_id: self.host().cloned(),
        });
    }

    /// Unbind `connection` and reconcile the round, host and roster.
    /// `purge` destroys the identity instead of keeping it restorable.
    fn depart(&mut self, connection: &str, purge: bool, fx: &mut Effects) {
        let Some(key) = self.registry.unbind(connection) else {
            tracing::debug!("Connection {} closed without a player", connection);
            return;
        };
        let Some((durable_id, name)) = self
            .registry
            .get(key)
            .map(|p| (p.durable_id().clone(), p.display_name().to_string()))
        else {
            return;
        };
        if purge {
            self.registry.purge(key);
        }
        tracing::info!(
            "Player {:?} {}",
            name,
            if purge { "left" } else { "disconnected" }
        );

        if self.round.phase() == Phase::AskingQuestion && self.round.purge_answer(&durable_id) {
            tracing::debug!("Discarded answer of {:?}", name);
        }

        if self.roster().is_empty() {
            if self.host.clear().changed() {
                fx.broadcast(ServerMessage::HostChanged { new_host_id: None });
            }
            if self.round.phase() != Phase::Lobby {
                self.reset();
                fx.broadcast(self.phase_changed());
            }
            self.broadcast_roster(fx);
            return;
        }

        if let HostChange::Elected(id) = self.host.reelect(connection, &Roster::new(&self.registry))
        {
            tracing::info!("Host left, {} is the new host", id);
            fx.broadcast(ServerMessage::HostChanged {
                new_host_id: Some(id),
            });
        }

        self.broadcast_roster(fx);

        if self.round.phase() == Phase::AskingQuestion && !self.reveal_if_complete(fx) {
            fx.broadcast(self.progress());
        }
    }

    /// Reveal the answers if every present player has one in. Returns
    /// whether the reveal happened.
    fn reveal_if_complete(&mut self, fx: &mut Effects) -> bool {
        if !self.round.is_complete(self.roster().len()) {
            return false;
        }
        match self.round.reveal() {
            Some(reveal) => {
                tracing::info!(
                    "All {} answers in, revealing round {}",
                    reveal.answers.len(),
                    self.round.round_number()
                );
                fx.broadcast(answers_revealed(reveal));
                true
            }
            None => false,
        }
    }

    fn progress(&self) -> ServerMessage {
        ServerMessage::AnswerProgress {
            submitted_count: self.round.answers().len(),
            total_players: self.roster().len(),
        }
    }

    fn phase_changed(&self) -> ServerMessage {
        ServerMessage::PhaseChanged {
            phase: self.phase(),
            host_id: self.host().cloned(),
        }
    }

    fn broadcast_roster(&self, fx: &mut Effects) {
        fx.broadcast(ServerMessage::RosterUpdate {
            players: self.roster().summaries(),
            host_id: self.host().cloned(),
            phase: self.phase(),
        });
    }
}
