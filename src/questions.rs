//! Read-only question bank, loaded once at startup

use crate::types::{Question, QuestionId};
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_QUESTIONS: &str = include_str!("../data/questions.json");

#[derive(Debug, thiserror::Error)]
pub enum QuestionLoadError {
    #[error("Failed to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid question file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Question {0} has an empty prompt")]
    EmptyPrompt(QuestionId),

    #[error("Duplicate question id {0}")]
    DuplicateId(QuestionId),
}

#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank, rejecting blank prompts and duplicate ids.
    /// An empty list is allowed; starting a round will fail instead.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionLoadError> {
        let mut seen = HashSet::new();
        for q in &questions {
            if q.normal_prompt.trim().is_empty() || q.imposter_prompt.trim().is_empty() {
                return Err(QuestionLoadError::EmptyPrompt(q.id));
            }
            if !seen.insert(q.id) {
                return Err(QuestionLoadError::DuplicateId(q.id));
            }
        }
        Ok(Self { questions })
    }

    pub fn from_json(json: &str) -> Result<Self, QuestionLoadError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, QuestionLoadError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// The question set compiled into the binary
    pub fn builtin() -> Result<Self, QuestionLoadError> {
        Self::from_json(BUILTIN_QUESTIONS)
    }

    /// Load from `path` if given, otherwise use the built-in set
    pub fn load(path: Option<&Path>) -> Result<Self, QuestionLoadError> {
        let bank = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::builtin()?,
        };
        tracing::info!(
            "Loaded {} questions from {}",
            bank.len(),
            path.map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in set".to_string())
        );
        Ok(bank)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
