//! Catalog Browser: operator view over the question bank and known entities.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use shared::{error::ValidationError, protocol::AdminSnapshot};
use tracing::{info, warn};

use crate::{error::ClientError, CatalogService};

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);
pub const ADD_FAILED_TEXT: &str = "Error adding question. Please try again.";
pub const LOAD_FAILED_TEXT: &str = "Error loading catalog. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message for the operator; expires `ttl` after it was posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: NoticeKind,
    message: String,
    posted_at: Instant,
    ttl: Duration,
}

impl Notice {
    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_live_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.posted_at) < self.ttl
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub name: String,
    pub attribute_count: usize,
}

pub struct CatalogBrowser {
    service: Arc<dyn CatalogService>,
    snapshot: AdminSnapshot,
    loaded: bool,
    notice: Option<Notice>,
    notice_ttl: Duration,
}

impl CatalogBrowser {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self {
            service,
            snapshot: AdminSnapshot::default(),
            loaded: false,
            notice: None,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    /// Re-fetches the catalog. On failure the previous snapshot stays and an error
    /// notice is posted; returns whether the fetch succeeded.
    pub async fn refresh(&mut self) -> bool {
        match self.fetch().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "catalog fetch failed");
                self.post(NoticeKind::Error, LOAD_FAILED_TEXT.to_string());
                false
            }
        }
    }

    /// Submits a new question, then re-fetches so the list reflects the service's
    /// own deduplication. Only local validation failures are returned as errors;
    /// service failures become an error notice.
    pub async fn add_question(&mut self, text: &str) -> Result<NoticeKind, ClientError> {
        let question = text.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }

        if let Err(err) = self.service.add_question(question).await {
            warn!(question, error = %err, "adding question failed");
            self.post(NoticeKind::Error, ADD_FAILED_TEXT.to_string());
            return Ok(NoticeKind::Error);
        }

        info!(question, "question added");
        self.post(
            NoticeKind::Success,
            format!("Question \"{question}\" added successfully!"),
        );
        if let Err(err) = self.fetch().await {
            warn!(error = %err, "catalog re-fetch after add failed");
        }
        Ok(NoticeKind::Success)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn questions(&self) -> &[String] {
        &self.snapshot.questions
    }

    /// Entities from the last fetch with the number of attributes each one carries.
    pub fn entities(&self) -> impl Iterator<Item = EntitySummary> + '_ {
        self.snapshot
            .entities
            .iter()
            .map(|(name, attributes)| EntitySummary {
                name: name.clone(),
                attribute_count: attributes.len(),
            })
    }

    pub fn notice(&mut self) -> Option<&Notice> {
        self.notice_at(Instant::now())
    }

    /// Current notice as of `now`; an expired notice is cleared.
    pub fn notice_at(&mut self, now: Instant) -> Option<&Notice> {
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| !notice.is_live_at(now))
        {
            self.notice = None;
        }
        self.notice.as_ref()
    }

    async fn fetch(&mut self) -> Result<(), ClientError> {
        let snapshot = self.service.admin_snapshot().await?;
        info!(
            questions = snapshot.questions.len(),
            entities = snapshot.entities.len(),
            "catalog fetched"
        );
        self.snapshot = snapshot;
        self.loaded = true;
        Ok(())
    }

    fn post(&mut self, kind: NoticeKind, message: String) {
        self.notice = Some(Notice {
            kind,
            message,
            posted_at: Instant::now(),
            ttl: self.notice_ttl,
        });
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
