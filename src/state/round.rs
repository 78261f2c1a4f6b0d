//! Round state machine
//!
//! ```text
//! Lobby --start--> AskingQuestion --all answered--> Revealing
//!   Revealing --advance--> RoundEnded --next--> AskingQuestion
//! any phase --reset--> Lobby
//! ```
//!
//! Every operation validates first and mutates only on success.

use crate::error::GameError;
use crate::questions::QuestionBank;
use crate::types::*;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;

/// Inbound actions that drive the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundAction {
    Start,
    SubmitAnswer,
    AdvanceReveal,
    NextRound,
}

impl RoundAction {
    pub fn describe(self) -> &'static str {
        match self {
            RoundAction::Start => "start a round",
            RoundAction::SubmitAnswer => "submit an answer",
            RoundAction::AdvanceReveal => "advance the reveal",
            RoundAction::NextRound => "start the next round",
        }
    }
}

/// The single table of legal phase/action combinations
pub fn check_transition(phase: Phase, action: RoundAction) -> Result<(), GameError> {
    use Phase::*;

    match (phase, action) {
        (Lobby, RoundAction::Start) => Ok(()),
        (AskingQuestion, RoundAction::SubmitAnswer) => Ok(()),
        (Revealing, RoundAction::AdvanceReveal) => Ok(()),
        (RoundEnded, RoundAction::NextRound) => Ok(()),

        (_, RoundAction::SubmitAnswer) => Err(GameError::NotAcceptingAnswers),
        (phase, action) => Err(GameError::WrongPhase {
            action: action.describe(),
            phase,
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub durable_id: DurableId,
    pub display_name: String,
    pub text: String,
}

/// What a successful round start decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStart {
    pub round_number: u32,
    pub question: Question,
    pub imposter: DurableId,
    /// The question pool ran out and was recycled for this round
    pub rotated: bool,
}

/// Public reveal payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub answers: Vec<RevealedAnswer>,
    pub normal_question_text: String,
}

#[derive(Debug, Default)]
pub struct RoundState {
    phase: Phase,
    question: Option<Question>,
    imposter: Option<DurableId>,
    answers: Vec<SubmittedAnswer>,
    used_question_ids: HashSet<QuestionId>,
    round_number: u32,
}

impl RoundState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn imposter(&self) -> Option<&DurableId> {
        self.imposter.as_ref()
    }

    pub fn answers(&self) -> &[SubmittedAnswer] {
        &self.answers
    }

    pub fn used_question_ids(&self) -> &HashSet<QuestionId> {
        &self.used_question_ids
    }

    pub fn has_answered(&self, durable_id: &str) -> bool {
        self.answers.iter().any(|a| a.durable_id == durable_id)
    }

    /// Start a round for `members`: pick an imposter and an unused question
    pub fn begin<R: Rng + ?Sized>(
        &mut self,
        members: &[DurableId],
        min_players: usize,
        bank: &QuestionBank,
        rng: &mut R,
    ) -> Result<RoundStart, GameError> {
        if members.len() < min_players {
            return Err(GameError::NotEnoughPlayers {
                min: min_players,
                have: members.len(),
            });
        }

        let (question, rotated) = self.pick_question(bank, rng)?;
        let imposter = members
            .choose(rng)
            .cloned()
            .ok_or(GameError::NotEnoughPlayers {
                min: min_players,
                have: 0,
            })?;

        if rotated {
            tracing::info!("Question pool exhausted, starting a new rotation");
            self.used_question_ids.clear();
        }
        self.used_question_ids.insert(question.id);
        self.answers.clear();
        self.round_number += 1;
        self.phase = Phase::AskingQuestion;
        self.question = Some(question.clone());
        self.imposter = Some(imposter.clone());

        Ok(RoundStart {
            round_number: self.round_number,
            question,
            imposter,
            rotated,
        })
    }

    /// Random unused question, or a random question from the whole pool once
    /// every question has been used
    fn pick_question<R: Rng + ?Sized>(
        &self,
        bank: &QuestionBank,
        rng: &mut R,
    ) -> Result<(Question, bool), GameError> {
        let fresh: Vec<&Question> = bank
            .questions()
            .iter()
            .filter(|q| !self.used_question_ids.contains(&q.id))
            .collect();

        if let Some(question) = fresh.choose(rng) {
            return Ok(((*question).clone(), false));
        }

        bank.questions()
            .choose(rng)
            .cloned()
            .map(|q| (q, true))
            .ok_or(GameError::QuestionPoolExhausted)
    }

    /// Prompt shown to `durable_id` this round and whether they are the imposter
    pub fn prompt_for(&self, durable_id: &str) -> Option<(&str, bool)> {
        let question = self.question.as_ref()?;
        if self.imposter.as_deref() == Some(durable_id) {
            Some((&question.imposter_prompt, true))
        } else {
            Some((&question.normal_prompt, false))
        }
    }

    /// Record an answer; returns how many answers are in
    pub fn submit_answer(
        &mut self,
        durable_id: &str,
        display_name: &str,
        text: &str,
        max_chars: usize,
    ) -> Result<usize, GameError> {
        check_transition(self.phase, RoundAction::SubmitAnswer)?;

        if self.has_answered(durable_id) {
            return Err(GameError::DuplicateAnswer);
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::BlankAnswer);
        }
        if text.chars().count() > max_chars {
            return Err(GameError::AnswerTooLong(max_chars));
        }

        self.answers.push(SubmittedAnswer {
            durable_id: durable_id.to_string(),
            display_name: display_name.to_string(),
            text: text.to_string(),
        });
        Ok(self.answers.len())
    }

    /// Drop a departed player's answer
    pub fn purge_answer(&mut self, durable_id: &str) -> bool {
        let before = self.answers.len();
        self.answers.retain(|a| a.durable_id != durable_id);
        self.answers.len() != before
    }

    /// Whether every one of `roster_size` present players has answered
    pub fn is_complete(&self, roster_size: usize) -> bool {
        self.phase == Phase::AskingQuestion
            && roster_size > 0
            && self.answers.len() == roster_size
    }

    /// Move to Revealing. Returns None if answers are not being collected,
    /// so the reveal happens at most once per round.
    pub fn reveal(&mut self) -> Option<Reveal> {
        if self.phase != Phase::AskingQuestion {
            return None;
        }
        self.phase = Phase::Revealing;
        self.current_reveal()
    }

    /// The reveal payload of the current round
    pub fn current_reveal(&self) -> Option<Reveal> {
        let question = self.question.as_ref()?;
        Some(Reveal {
            answers: self
                .answers
                .iter()
                .map(|a| RevealedAnswer {
                    display_name: a.display_name.clone(),
                    answer_text: a.text.clone(),
                })
                .collect(),
            normal_question_text: question.normal_prompt.clone(),
        })
    }

    /// Revealing -> RoundEnded; returns the text clients should speak
    pub fn advance_reveal(&mut self) -> Result<String, GameError> {
        check_transition(self.phase, RoundAction::AdvanceReveal)?;
        let text = self
            .question
            .as_ref()
            .map(|q| q.normal_prompt.clone())
            .ok_or(GameError::WrongPhase {
                action: RoundAction::AdvanceReveal.describe(),
                phase: self.phase,
            })?;
        self.phase = Phase::RoundEnded;
        Ok(text)
    }

    /// Back to the lobby, dropping the current round only. The round
    /// counter and the used questions are kept.
    pub fn return_to_lobby(&mut self) {
        self.phase = Phase::Lobby;
        self.question = None;
        self.imposter = None;
        self.answers.clear();
    }

    /// Hard reset back to the lobby, clearing all round state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
