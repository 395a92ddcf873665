use shared::error::ValidationError;
use thiserror::Error;

use crate::session::Phase;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned status {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: u16,
        message: String,
    },
    #[error("malformed reply from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a prediction request is already in flight")]
    Busy,
    #[error("cannot {action} while {phase}")]
    InvalidTransition { action: &'static str, phase: Phase },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Failures that come from the service round trip rather than from local input.
    /// Controllers turn these into state transitions or notices instead of returning them.
    pub fn is_recoverable_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Transport { .. } | ClientError::Status { .. } | ClientError::Decode { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport { source, .. } if source.is_timeout())
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, ClientError::Transport { source, .. } if source.is_connect())
    }
}
