//! Game Session Controller: the question/answer/feedback state machine.
//!
//! A [`Session`] is a plain value owned by one [`GameController`]. The controller
//! splits each round into [`GameController::submit_answer`], which moves the session
//! into [`Phase::AwaitingPrediction`] and hands back a [`PendingPrediction`] ticket,
//! and [`GameController::apply_prediction`], which consumes the ticket together with
//! the service reply. While a ticket is outstanding every further answer is refused
//! with [`ClientError::Busy`].

use std::{fmt, sync::Arc};

use serde_json::Value;
use shared::{
    domain::{Answer, AnswerMap, Confidence, DEFAULT_FIRST_QUESTION, UNKNOWN_ENTITY},
    error::ValidationError,
    protocol::{FeedbackKind, FeedbackRequest, PredictOutcome, PredictRequest, PredictResponse},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{error::ClientError, PredictionService};

pub const CORRECT_GUESS_TEXT: &str = "Great! I guessed correctly.";
pub const WRONG_GUESS_TEXT: &str = "I was wrong. What were you thinking of?";

fn taught_text(entity: &str) -> String {
    format!("Thanks! I'll remember that {entity} has these attributes.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStage {
    /// The guess was confirmed and reinforcing feedback was sent.
    Correct,
    /// The guess was wrong; waiting for the player to name the entity.
    AwaitingEntity,
    /// The player's entity was submitted as teaching feedback.
    Taught,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Asking,
    AwaitingPrediction,
    Concluded,
    FeedbackGiven(FeedbackStage),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Intro => f.write_str("intro"),
            Phase::Asking => f.write_str("asking"),
            Phase::AwaitingPrediction => f.write_str("awaiting prediction"),
            Phase::Concluded => f.write_str("concluded"),
            Phase::FeedbackGiven(FeedbackStage::Correct) => f.write_str("feedback given (correct)"),
            Phase::FeedbackGiven(FeedbackStage::AwaitingEntity) => {
                f.write_str("feedback given (awaiting entity)")
            }
            Phase::FeedbackGiven(FeedbackStage::Taught) => f.write_str("feedback given (taught)"),
        }
    }
}

/// Answers the service has acknowledged, plus at most one answer still in flight.
///
/// Only acknowledged answers are permanent. A pending answer that never got a reply
/// is replaced when the player answers the same question again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerLedger {
    acknowledged: AnswerMap,
    pending: Option<(String, Answer)>,
}

impl AnswerLedger {
    pub fn acknowledged(&self) -> &AnswerMap {
        &self.acknowledged
    }

    pub fn pending(&self) -> Option<(&str, Answer)> {
        self.pending
            .as_ref()
            .map(|(question, answer)| (question.as_str(), *answer))
    }

    /// Map sent with the next `/predict`: acknowledged entries plus the pending one.
    pub fn outgoing(&self) -> AnswerMap {
        self.acknowledged
            .iter()
            .map(|(question, answer)| (question.to_string(), answer))
            .chain(self.pending.clone())
            .collect()
    }

    fn stage(&mut self, question: &str, answer: Answer) -> Result<(), ValidationError> {
        if self.acknowledged.contains(question) {
            return Err(ValidationError::DuplicateAnswer {
                question: question.to_string(),
            });
        }
        self.pending = Some((question.to_string(), answer));
        Ok(())
    }

    fn commit(&mut self) {
        if let Some((question, answer)) = self.pending.take() {
            if let Err(err) = self.acknowledged.record(question, answer) {
                warn!(%err, "pending answer collided with an acknowledged one");
            }
        }
    }
}

/// Per-play state. Created at start-up and replaced wholesale on reset.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    phase: Phase,
    current_question: String,
    ledger: AnswerLedger,
    result: Option<String>,
    confidence: Confidence,
    feedback: Option<String>,
    play_count: u64,
    round: u32,
    last_response: Option<Value>,
}

impl Session {
    pub fn new(first_question: impl Into<String>) -> Self {
        Self::with_play_count(first_question, 0)
    }

    fn with_play_count(first_question: impl Into<String>, play_count: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: Phase::Intro,
            current_question: first_question.into(),
            ledger: AnswerLedger::default(),
            result: None,
            confidence: Confidence::ZERO,
            feedback: None,
            play_count,
            round: 0,
            last_response: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_question(&self) -> &str {
        &self.current_question
    }

    /// Acknowledged answers only.
    pub fn answers(&self) -> &AnswerMap {
        self.ledger.acknowledged()
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    /// 1-based number of the question currently displayed.
    pub fn question_number(&self) -> usize {
        self.ledger.acknowledged().len() + 1
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn confidence_percent(&self) -> i64 {
        self.confidence.percent()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn play_count(&self) -> u64 {
        self.play_count
    }

    /// Number of `/predict` requests issued in this session.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Last raw `/predict` reply, kept for diagnostics.
    pub fn last_response(&self) -> Option<&Value> {
        self.last_response.as_ref()
    }

    pub fn is_awaiting_prediction(&self) -> bool {
        self.phase == Phase::AwaitingPrediction
    }
}

/// Proof that a `/predict` request was issued for a particular session round.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrediction {
    session_id: Uuid,
    round: u32,
    request: PredictRequest,
}

impl PendingPrediction {
    pub fn request(&self) -> &PredictRequest {
        &self.request
    }

    pub fn round(&self) -> u32 {
        self.round
    }
}

/// Where a round landed.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Asking {
        question: String,
    },
    Concluded {
        entity: String,
        confidence: Confidence,
    },
    Unknown,
    /// The round failed; the same question is displayed again.
    Retry {
        question: String,
        reason: String,
    },
    /// The reply belonged to a session that has since been reset.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackDelivery {
    Delivered,
    Failed { reason: String },
}

pub struct GameController {
    service: Arc<dyn PredictionService>,
    first_question: String,
    session: Session,
}

impl GameController {
    pub fn new(service: Arc<dyn PredictionService>) -> Self {
        Self::with_first_question(service, DEFAULT_FIRST_QUESTION)
    }

    pub fn with_first_question(
        service: Arc<dyn PredictionService>,
        first_question: impl Into<String>,
    ) -> Self {
        let first_question = first_question.into();
        Self {
            service,
            session: Session::new(first_question.clone()),
            first_question,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn play_count(&self) -> u64 {
        self.session.play_count
    }

    pub fn start(&mut self) -> Result<(), ClientError> {
        self.expect_phase("start", Phase::Intro)?;
        self.session.phase = Phase::Asking;
        info!(session_id = %self.session.id, "session started");
        Ok(())
    }

    /// Records `question -> yes` as pending and moves to [`Phase::AwaitingPrediction`].
    ///
    /// `question` must be the text currently displayed.
    pub fn submit_answer(
        &mut self,
        question: &str,
        yes: bool,
    ) -> Result<PendingPrediction, ClientError> {
        self.expect_phase("answer", Phase::Asking)?;
        if question != self.session.current_question {
            return Err(ValidationError::StaleQuestion {
                expected: self.session.current_question.clone(),
                submitted: question.to_string(),
            }
            .into());
        }

        let answer = Answer::from(yes);
        self.session.ledger.stage(question, answer)?;
        self.session.phase = Phase::AwaitingPrediction;
        self.session.round += 1;

        let request = PredictRequest {
            answers: self.session.ledger.outgoing(),
        };
        info!(
            session_id = %self.session.id,
            round = self.session.round,
            question,
            answer = answer.bit(),
            answers = request.answers.len(),
            "submitting answer"
        );

        Ok(PendingPrediction {
            session_id: self.session.id,
            round: self.session.round,
            request,
        })
    }

    /// Feeds the outcome of the request behind `ticket` back into the session.
    pub fn apply_prediction(
        &mut self,
        ticket: PendingPrediction,
        reply: Result<Value, ClientError>,
    ) -> Step {
        if ticket.session_id != self.session.id
            || ticket.round != self.session.round
            || self.session.phase != Phase::AwaitingPrediction
        {
            debug!(
                session_id = %ticket.session_id,
                round = ticket.round,
                "dropping reply for a superseded round"
            );
            return Step::Discarded;
        }

        let raw = match reply {
            Ok(raw) => raw,
            Err(err) => return self.retry(err),
        };
        self.session.last_response = Some(raw.clone());

        let response = match serde_json::from_value::<PredictResponse>(raw) {
            Ok(response) => response,
            Err(source) => {
                return self.retry(ClientError::Decode {
                    endpoint: "/predict",
                    source,
                })
            }
        };

        self.session.ledger.commit();
        match response.into_outcome() {
            PredictOutcome::Continue { question } => {
                debug!(session_id = %self.session.id, %question, "next question");
                self.session.current_question = question.clone();
                self.session.phase = Phase::Asking;
                Step::Asking { question }
            }
            PredictOutcome::Concluded { entity, confidence } => {
                info!(
                    session_id = %self.session.id,
                    %entity,
                    confidence = confidence.value(),
                    "service made a guess"
                );
                self.conclude(entity.clone(), confidence);
                Step::Concluded { entity, confidence }
            }
            PredictOutcome::Unknown => {
                info!(session_id = %self.session.id, "service has nothing left to ask");
                self.conclude(UNKNOWN_ENTITY.to_string(), Confidence::ZERO);
                Step::Unknown
            }
        }
    }

    /// Submits one answer for `question` and waits for the service.
    pub async fn answer(&mut self, question: &str, yes: bool) -> Result<Step, ClientError> {
        let ticket = self.submit_answer(question, yes)?;
        let reply = self.service.predict(ticket.request()).await;
        Ok(self.apply_prediction(ticket, reply))
    }

    pub async fn answer_current(&mut self, yes: bool) -> Result<Step, ClientError> {
        let question = self.session.current_question.clone();
        self.answer(&question, yes).await
    }

    /// Player verdict on the guess. A correct guess is reinforced with the service
    /// right away; a wrong one waits for [`GameController::teach`].
    pub async fn confirm(&mut self, correct: bool) -> Result<Option<FeedbackDelivery>, ClientError> {
        self.expect_phase("confirm the guess", Phase::Concluded)?;

        if !correct {
            self.session.feedback = Some(WRONG_GUESS_TEXT.to_string());
            self.session.phase = Phase::FeedbackGiven(FeedbackStage::AwaitingEntity);
            return Ok(None);
        }

        let entity = self
            .session
            .result
            .clone()
            .unwrap_or_else(|| UNKNOWN_ENTITY.to_string());
        self.session.feedback = Some(CORRECT_GUESS_TEXT.to_string());
        self.session.phase = Phase::FeedbackGiven(FeedbackStage::Correct);
        Ok(Some(
            self.send_feedback(FeedbackKind::Reinforce, entity).await,
        ))
    }

    /// Names the entity the player was really thinking of.
    pub async fn teach(&mut self, entity: &str) -> Result<FeedbackDelivery, ClientError> {
        self.expect_phase(
            "teach an entity",
            Phase::FeedbackGiven(FeedbackStage::AwaitingEntity),
        )?;
        let entity = entity.trim();
        if entity.is_empty() {
            return Err(ValidationError::EmptyEntity.into());
        }

        self.session.feedback = Some(taught_text(entity));
        self.session.phase = Phase::FeedbackGiven(FeedbackStage::Taught);
        Ok(self
            .send_feedback(FeedbackKind::Teach, entity.to_string())
            .await)
    }

    /// Starts a new play; the play counter carries over and goes up by one.
    pub fn reset(&mut self) -> Result<(), ClientError> {
        if self.session.phase == Phase::Intro {
            return Err(ClientError::InvalidTransition {
                action: "reset",
                phase: Phase::Intro,
            });
        }

        let previous = self.session.id;
        let mut session =
            Session::with_play_count(self.first_question.clone(), self.session.play_count + 1);
        session.phase = Phase::Asking;
        self.session = session;
        info!(
            previous_session = %previous,
            session_id = %self.session.id,
            play_count = self.session.play_count,
            "session reset"
        );
        Ok(())
    }

    /// Service-side diagnostics. Does not touch the session.
    pub async fn fetch_debug(&self) -> Result<Value, ClientError> {
        self.service.debug_snapshot().await
    }

    fn expect_phase(&self, action: &'static str, expected: Phase) -> Result<(), ClientError> {
        match self.session.phase {
            phase if phase == expected => Ok(()),
            Phase::AwaitingPrediction => Err(ClientError::Busy),
            phase => Err(ClientError::InvalidTransition { action, phase }),
        }
    }

    fn conclude(&mut self, entity: String, confidence: Confidence) {
        self.session.result = Some(entity);
        self.session.confidence = confidence;
        self.session.phase = Phase::Concluded;
    }

    fn retry(&mut self, err: ClientError) -> Step {
        warn!(
            session_id = %self.session.id,
            round = self.session.round,
            error = %err,
            "prediction round failed; asking again"
        );
        self.session.phase = Phase::Asking;
        Step::Retry {
            question: self.session.current_question.clone(),
            reason: err.to_string(),
        }
    }

    async fn send_feedback(&self, kind: FeedbackKind, entity: String) -> FeedbackDelivery {
        let request = FeedbackRequest::new(kind, entity, self.session.answers().clone());
        match self.service.submit_feedback(&request).await {
            Ok(()) => {
                info!(
                    session_id = %self.session.id,
                    entity = %request.entity,
                    ?kind,
                    "feedback delivered"
                );
                FeedbackDelivery::Delivered
            }
            Err(err) => {
                warn!(
                    session_id = %self.session.id,
                    entity = %request.entity,
                    ?kind,
                    error = %err,
                    "feedback not delivered"
                );
                FeedbackDelivery::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
