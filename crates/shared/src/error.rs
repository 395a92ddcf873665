use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Input rejected on the client before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("question text must not be empty")]
    EmptyQuestion,
    #[error("entity name must not be empty")]
    EmptyEntity,
    #[error("question {question:?} was already answered in this session")]
    DuplicateAnswer { question: String },
    #[error("answer submitted for {submitted:?} but the current question is {expected:?}")]
    StaleQuestion { expected: String, submitted: String },
    #[error("answer bit must be 0 or 1, got {0}")]
    InvalidAnswerBit(u8),
}

/// Error body returned by the service on non-2xx responses (`{"detail": ...}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    pub detail: Value,
}

impl ServiceErrorBody {
    /// Flattens `detail` into one line; validation errors arrive as a list of objects.
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.get("msg")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
