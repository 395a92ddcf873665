use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerMap, Confidence, EntityAttributes, UNKNOWN_ENTITY};

/// Body of `POST /predict`. Always carries every answer given so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub answers: AnswerMap,
}

/// Wire shape of a `/predict` reply. Any subset of the fields may be present;
/// use [`PredictResponse::into_outcome`] rather than inspecting them directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// What a `/predict` reply means for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
    Continue { question: String },
    Concluded { entity: String, confidence: Confidence },
    Unknown,
}

impl PredictOutcome {
    /// Entity name to display once the session has concluded.
    pub fn entity(&self) -> Option<&str> {
        match self {
            PredictOutcome::Continue { .. } => None,
            PredictOutcome::Concluded { entity, .. } => Some(entity),
            PredictOutcome::Unknown => Some(UNKNOWN_ENTITY),
        }
    }
}

impl PredictResponse {
    /// A non-empty `prediction` wins over `next_question`; a reply with neither
    /// is [`PredictOutcome::Unknown`].
    pub fn into_outcome(self) -> PredictOutcome {
        if let Some(entity) = self.prediction.filter(|entity| !entity.is_empty()) {
            return PredictOutcome::Concluded {
                entity,
                confidence: Confidence(self.confidence.unwrap_or(0.0)),
            };
        }
        match self.next_question.filter(|question| !question.is_empty()) {
            Some(question) => PredictOutcome::Continue { question },
            None => PredictOutcome::Unknown,
        }
    }
}

/// Why a feedback submission is being sent. Both kinds are `correct: true` on the
/// wire; the difference is whose entity name is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// The player confirmed the service's own guess.
    Reinforce,
    /// The player named the entity they were actually thinking of.
    Teach,
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub entity: String,
    pub correct: bool,
    pub answers: AnswerMap,
}

impl FeedbackRequest {
    pub fn new(kind: FeedbackKind, entity: impl Into<String>, answers: AnswerMap) -> Self {
        let correct = match kind {
            FeedbackKind::Reinforce | FeedbackKind::Teach => true,
        };
        Self {
            entity: entity.into(),
            correct,
            answers,
        }
    }
}

/// Query string of `POST /add-question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddQuestionQuery {
    pub question: String,
}

/// Reply of `GET /admin/data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminSnapshot {
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub entities: BTreeMap<String, EntityAttributes>,
}

/// Acknowledgement body; the client never depends on its content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
