use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    error::ServiceErrorBody,
    protocol::{AddQuestionQuery, AdminSnapshot, FeedbackRequest, PredictRequest},
};
use tracing::{debug, warn};

pub mod catalog;
pub mod config;
pub mod error;
pub mod session;

pub use catalog::{CatalogBrowser, EntitySummary, Notice, NoticeKind};
pub use config::{load_settings, load_settings_from, Settings};
pub use error::ClientError;
pub use session::{
    AnswerLedger, FeedbackDelivery, FeedbackStage, GameController, PendingPrediction, Phase,
    Session, Step,
};

const PREDICT_PATH: &str = "/predict";
const FEEDBACK_PATH: &str = "/feedback";
const DEBUG_PATH: &str = "/debug";
const ADMIN_DATA_PATH: &str = "/admin/data";
const ADD_QUESTION_PATH: &str = "/add-question";

/// Game-side operations of the inference service.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Returns the raw reply so callers can keep it for diagnostics.
    async fn predict(&self, request: &PredictRequest) -> Result<Value, ClientError>;
    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<(), ClientError>;
    async fn debug_snapshot(&self) -> Result<Value, ClientError>;
}

/// Question bank and entity catalog operations of the inference service.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn admin_snapshot(&self) -> Result<AdminSnapshot, ClientError>;
    async fn add_question(&self, question: &str) -> Result<(), ClientError>;
}

/// HTTP client for the inference/knowledge service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let defaults = Settings::default();
        Self::with_timeouts(
            base_url,
            defaults.request_timeout(),
            defaults.connect_timeout(),
        )
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::with_timeouts(
            settings.service_url.clone(),
            settings.request_timeout(),
            settings.connect_timeout(),
        )
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = config::normalize_service_url(&base_url.into())?;
        let http = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport { endpoint, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ServiceErrorBody>(&body)
            .map(|parsed| parsed.message())
            .unwrap_or(body);
        warn!(endpoint, status = status.as_u16(), %message, "service rejected request");
        Err(ClientError::Status {
            endpoint,
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let bytes = self
            .send(endpoint, request)
            .await?
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { endpoint, source })?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { endpoint, source })
    }

    /// The acknowledgement body is not inspected.
    async fn send_ack(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<(), ClientError> {
        self.send(endpoint, request).await?;
        debug!(endpoint, "service acknowledged request");
        Ok(())
    }
}

#[async_trait]
impl PredictionService for ServiceClient {
    async fn predict(&self, request: &PredictRequest) -> Result<Value, ClientError> {
        let builder = self.http.post(self.endpoint(PREDICT_PATH)).json(request);
        self.send_json(PREDICT_PATH, builder).await
    }

    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<(), ClientError> {
        let builder = self.http.post(self.endpoint(FEEDBACK_PATH)).json(request);
        self.send_ack(FEEDBACK_PATH, builder).await
    }

    async fn debug_snapshot(&self) -> Result<Value, ClientError> {
        let builder = self.http.get(self.endpoint(DEBUG_PATH));
        self.send_json(DEBUG_PATH, builder).await
    }
}

#[async_trait]
impl CatalogService for ServiceClient {
    async fn admin_snapshot(&self) -> Result<AdminSnapshot, ClientError> {
        let builder = self.http.get(self.endpoint(ADMIN_DATA_PATH));
        self.send_json(ADMIN_DATA_PATH, builder).await
    }

    async fn add_question(&self, question: &str) -> Result<(), ClientError> {
        let builder = self
            .http
            .post(self.endpoint(ADD_QUESTION_PATH))
            .query(&AddQuestionQuery {
                question: question.to_string(),
            });
        self.send_ack(ADD_QUESTION_PATH, builder).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
