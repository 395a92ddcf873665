use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Question every fresh session opens with.
pub const DEFAULT_FIRST_QUESTION: &str = "Is it an animal?";

/// Result shown when the service can neither guess nor ask anything further.
pub const UNKNOWN_ENTITY: &str = "I don't know what you're thinking of!";

/// A yes/no reply, carried on the wire as `1`/`0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Answer {
    No,
    Yes,
}

impl Answer {
    pub fn bit(self) -> u8 {
        match self {
            Answer::No => 0,
            Answer::Yes => 1,
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value {
            Answer::Yes
        } else {
            Answer::No
        }
    }
}

impl From<Answer> for u8 {
    fn from(value: Answer) -> Self {
        value.bit()
    }
}

impl TryFrom<u8> for Answer {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Answer::No),
            1 => Ok(Answer::Yes),
            other => Err(ValidationError::InvalidAnswerBit(other)),
        }
    }
}

/// Question text -> answer, keyed by the exact text that was displayed.
///
/// Entries are only ever added; [`AnswerMap::record`] refuses to overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<String, Answer>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        question: impl Into<String>,
        answer: Answer,
    ) -> Result<(), ValidationError> {
        match self.0.entry(question.into()) {
            btree_map::Entry::Occupied(entry) => Err(ValidationError::DuplicateAnswer {
                question: entry.key().clone(),
            }),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(answer);
                Ok(())
            }
        }
    }

    pub fn get(&self, question: &str) -> Option<Answer> {
        self.0.get(question).copied()
    }

    pub fn contains(&self, question: &str) -> bool {
        self.0.contains_key(question)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Answer)> {
        self.0.iter().map(|(question, answer)| (question.as_str(), *answer))
    }
}

impl FromIterator<(String, Answer)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (String, Answer)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Service-reported certainty for a guess. Nominally within `[0, 1]`; the client
/// does not clamp it.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(pub f64);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);

    pub fn value(self) -> f64 {
        self.0
    }

    /// Display form: `round(confidence * 100)`.
    pub fn percent(self) -> i64 {
        (self.0 * 100.0).round() as i64
    }
}

/// Attribute name -> weight for one known entity.
pub type EntityAttributes = BTreeMap<String, f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_map_refuses_to_overwrite() {
        let mut answers = AnswerMap::new();
        answers
            .record("Is it an animal?", Answer::Yes)
            .expect("first answer");

        let err = answers
            .record("Is it an animal?", Answer::No)
            .expect_err("duplicate must fail");
        assert_eq!(
            err,
            ValidationError::DuplicateAnswer {
                question: "Is it an animal?".to_string()
            }
        );
        assert_eq!(answers.get("Is it an animal?"), Some(Answer::Yes));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn answer_bits_reject_values_other_than_zero_and_one() {
        let decoded: AnswerMap =
            serde_json::from_str(r#"{"Can it fly?": 0, "Is it a pet?": 1}"#).expect("decode");
        assert_eq!(decoded.get("Can it fly?"), Some(Answer::No));
        assert_eq!(decoded.get("Is it a pet?"), Some(Answer::Yes));

        assert!(serde_json::from_str::<AnswerMap>(r#"{"Can it fly?": 2}"#).is_err());
    }

    #[test]
    fn confidence_percent_rounds_to_nearest() {
        assert_eq!(Confidence(0.82).percent(), 82);
        assert_eq!(Confidence(0.826).percent(), 83);
        assert_eq!(Confidence(0.004).percent(), 0);
        assert_eq!(Confidence(1.0).percent(), 100);
        assert_eq!(Confidence::default().percent(), 0);
    }
}
