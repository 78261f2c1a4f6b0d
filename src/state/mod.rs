pub mod host;
pub mod registry;
pub mod roster;
pub mod round;

use crate::questions::QuestionBank;
use crate::types::*;
use host::HostElection;
use rand::rngs::StdRng;
use rand::SeedableRng;
use registry::{IdentityRegistry, PlayerIdentity};
use roster::Roster;
use round::RoundState;
use serde::Serialize;

/// All state of the one game session.
///
/// Only the dispatcher mutates it (see `crate::dispatch`); everything else
/// gets read-only views.
pub struct Session {
    pub(crate) registry: IdentityRegistry,
    pub(crate) host: HostElection,
    pub(crate) round: RoundState,
    pub(crate) questions: QuestionBank,
    pub(crate) config: GameConfig,
    pub(crate) rng: StdRng,
}

/// Public snapshot of the session, safe to show to anyone
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub round_number: u32,
    pub players: Vec<PlayerSummary>,
    pub host_id: Option<ConnectionId>,
}

impl Session {
    pub fn new(questions: QuestionBank, config: GameConfig) -> Self {
        Self::with_rng(questions, config, StdRng::from_os_rng())
    }

    /// Deterministic session for tests and replays
    pub fn with_seed(questions: QuestionBank, config: GameConfig, seed: u64) -> Self {
        Self::with_rng(questions, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(questions: QuestionBank, config: GameConfig, rng: StdRng) -> Self {
        Self {
            registry: IdentityRegistry::new(),
            host: HostElection::new(),
            round: RoundState::new(),
            questions,
            config,
            rng,
        }
    }

    /// Hard reset of the round back to the lobby. Players and the host role
    /// are untouched.
    pub fn reset(&mut self) {
        tracing::info!(
            "Resetting session to lobby (was {:?}, round {})",
            self.round.phase(),
            self.round.round_number()
        );
        self.round.reset();
    }

    /// Abandon the current round and go back to the lobby, keeping the round
    /// counter and the questions already asked
    pub fn return_to_lobby(&mut self) {
        tracing::info!(
            "Returning to lobby (was {:?}, round {})",
            self.round.phase(),
            self.round.round_number()
        );
        self.round.return_to_lobby();
    }

    pub fn phase(&self) -> Phase {
        self.round.phase()
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn roster(&self) -> Roster<'_> {
        Roster::new(&self.registry)
    }

    pub fn host(&self) -> Option<&ConnectionId> {
        self.host.current()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    /// Player bound to `connection`, if any
    pub fn player(&self, connection: &str) -> Option<&PlayerIdentity> {
        self.registry.resolve(connection)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            round_number: self.round.round_number(),
            players: self.roster().summaries(),
            host_id: self.host().cloned(),
        }
    }
}
