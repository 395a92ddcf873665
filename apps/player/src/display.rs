//! Terminal rendering of the session and of failures.

use client_core::{ClientError, FeedbackDelivery, FeedbackStage, Phase, Session};

pub fn describe_failure(err: &ClientError) -> String {
    match err {
        ClientError::Transport { .. } if err.is_timeout() => {
            "The guessing service took too long to answer; try again.".to_string()
        }
        ClientError::Transport { .. } => {
            "Guessing service unreachable; check the service URL and try again.".to_string()
        }
        ClientError::Status {
            status, message, ..
        } => format!("The guessing service refused the request ({status}): {message}"),
        ClientError::Decode { .. } => {
            "The guessing service sent a reply I could not read; try again.".to_string()
        }
        ClientError::Busy => "Still thinking about your last answer...".to_string(),
        other => other.to_string(),
    }
}

pub fn describe_delivery(delivery: &FeedbackDelivery) -> Option<String> {
    match delivery {
        FeedbackDelivery::Delivered => None,
        FeedbackDelivery::Failed { reason } => Some(format!(
            "(Could not send that to the guessing service: {reason})"
        )),
    }
}

pub fn intro() -> String {
    [
        "Think of something, and I'll try to guess it through a series of questions.",
        "The more you play, the smarter I become!",
        "",
        "Press Enter to start guessing (q to quit).",
    ]
    .join("\n")
}

/// Screen for the current phase, followed by the available keys.
pub fn screen(session: &Session) -> String {
    let mut out = String::new();
    match session.phase() {
        Phase::Intro => out.push_str(&intro()),
        Phase::Asking | Phase::AwaitingPrediction => {
            out.push_str(&format!(
                "Question {}: {}\n",
                session.question_number(),
                session.current_question()
            ));
            out.push_str("[y]es / [n]o   (r: reset, d: debug, q: quit)");
        }
        Phase::Concluded => {
            out.push_str(&guess(session));
            out.push_str("\nIs that right? [c]orrect / [w]rong   (r: reset, q: quit)");
        }
        Phase::FeedbackGiven(stage) => {
            if let Some(feedback) = session.feedback() {
                out.push_str(feedback);
                out.push('\n');
            }
            match stage {
                FeedbackStage::AwaitingEntity => {
                    out.push_str("Type what you were thinking of (:reset to skip):")
                }
                FeedbackStage::Correct | FeedbackStage::Taught => {
                    out.push_str("Press Enter to play again (q to quit).")
                }
            }
        }
    }
    out
}

pub fn guess(session: &Session) -> String {
    format!(
        "I think it's a... {}\nConfidence: {}%",
        session.result().unwrap_or_default(),
        session.confidence_percent()
    )
}

pub fn footer(session: &Session) -> String {
    format!("Games played: {}", session.play_count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_failures_mention_code_and_detail() {
        let err = ClientError::Status {
            endpoint: "/predict",
            status: 500,
            message: "model file is corrupt".to_string(),
        };
        assert_eq!(
            describe_failure(&err),
            "The guessing service refused the request (500): model file is corrupt"
        );
    }

    #[test]
    fn fresh_session_shows_intro() {
        let session = Session::new("Is it an animal?");
        assert!(screen(&session).starts_with("Think of something"));
        assert_eq!(footer(&session), "Games played: 0");
    }

    #[test]
    fn failed_delivery_is_reported() {
        assert_eq!(describe_delivery(&FeedbackDelivery::Delivered), None);
        let text = describe_delivery(&FeedbackDelivery::Failed {
            reason: "timeout".to_string(),
        })
        .expect("message");
        assert!(text.contains("timeout"));
    }
}
