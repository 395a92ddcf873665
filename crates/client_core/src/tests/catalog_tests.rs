use super::*;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

struct FakeCatalog {
    snapshot: Mutex<AdminSnapshot>,
    fail_fetch: bool,
    fail_add: bool,
    added: Arc<Mutex<Vec<String>>>,
    fetches: Arc<Mutex<u32>>,
}

impl FakeCatalog {
    fn with_snapshot(snapshot: AdminSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail_fetch: false,
            fail_add: false,
            added: Arc::new(Mutex::new(Vec::new())),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    fn empty() -> Self {
        Self::with_snapshot(AdminSnapshot::default())
    }
}

fn rejected(endpoint: &'static str) -> ClientError {
    ClientError::Status {
        endpoint,
        status: 500,
        message: "internal error".to_string(),
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn admin_snapshot(&self) -> Result<AdminSnapshot, ClientError> {
        *self.fetches.lock().await += 1;
        if self.fail_fetch {
            return Err(rejected("/admin/data"));
        }
        Ok(self.snapshot.lock().await.clone())
    }

    async fn add_question(&self, question: &str) -> Result<(), ClientError> {
        self.added.lock().await.push(question.to_string());
        if self.fail_add {
            return Err(rejected("/add-question"));
        }
        let mut snapshot = self.snapshot.lock().await;
        if !snapshot.questions.iter().any(|q| q == question) {
            snapshot.questions.push(question.to_string());
        }
        Ok(())
    }
}

fn sample_snapshot() -> AdminSnapshot {
    serde_json::from_value(json!({
        "questions": ["Is it an animal?", "Does it live in water?"],
        "entities": {
            "dog": {"Is it an animal?": 1, "Does it live in water?": 0, "Is it a pet?": 1},
            "fish": {"Is it an animal?": 1, "Does it live in water?": 1}
        }
    }))
    .expect("snapshot")
}

#[tokio::test]
async fn empty_catalog_renders_as_zero_items() {
    let mut browser = CatalogBrowser::new(Arc::new(FakeCatalog::empty()));
    assert!(!browser.is_loaded());

    assert!(browser.refresh().await);
    assert!(browser.is_loaded());
    assert!(browser.questions().is_empty());
    assert_eq!(browser.entities().count(), 0);
    assert!(browser.notice().is_none());
}

#[tokio::test]
async fn entity_attribute_counts_come_from_the_fetched_entry() {
    let mut browser = CatalogBrowser::new(Arc::new(FakeCatalog::with_snapshot(sample_snapshot())));
    browser.refresh().await;

    let summaries: Vec<EntitySummary> = browser.entities().collect();
    assert_eq!(
        summaries,
        vec![
            EntitySummary {
                name: "dog".to_string(),
                attribute_count: 3,
            },
            EntitySummary {
                name: "fish".to_string(),
                attribute_count: 2,
            },
        ]
    );
    assert_eq!(browser.questions().len(), 2);
}

#[tokio::test]
async fn blank_question_never_reaches_the_service() {
    let service = Arc::new(FakeCatalog::empty());
    let mut browser = CatalogBrowser::new(service.clone());

    for text in ["", "   ", "\t\n"] {
        let err = browser.add_question(text).await.expect_err("blank");
        assert!(
            matches!(err, ClientError::Validation(ValidationError::EmptyQuestion)),
            "unexpected error: {err}"
        );
    }
    assert!(service.added.lock().await.is_empty());
    assert_eq!(*service.fetches.lock().await, 0);

    browser.refresh().await;
    assert!(browser.questions().is_empty());
}

#[tokio::test]
async fn added_question_is_refetched_and_announced() {
    let service = Arc::new(FakeCatalog::with_snapshot(sample_snapshot()));
    let mut browser = CatalogBrowser::new(service.clone());
    browser.refresh().await;

    let kind = browser
        .add_question("  Is it a bird?  ")
        .await
        .expect("add");
    assert_eq!(kind, NoticeKind::Success);
    assert_eq!(*service.added.lock().await, vec!["Is it a bird?".to_string()]);
    assert_eq!(*service.fetches.lock().await, 2);
    assert!(browser.questions().iter().any(|q| q == "Is it a bird?"));

    let notice = browser.notice().expect("notice");
    assert_eq!(notice.kind(), NoticeKind::Success);
    assert_eq!(
        notice.message(),
        "Question \"Is it a bird?\" added successfully!"
    );
}

#[tokio::test]
async fn duplicate_question_follows_service_deduplication() {
    let service = Arc::new(FakeCatalog::with_snapshot(sample_snapshot()));
    let mut browser = CatalogBrowser::new(service.clone());

    browser
        .add_question("Is it an animal?")
        .await
        .expect("add");
    assert_eq!(
        browser
            .questions()
            .iter()
            .filter(|q| *q == "Is it an animal?")
            .count(),
        1
    );
}

#[tokio::test]
async fn failed_add_posts_error_notice_without_retrying() {
    let mut fake = FakeCatalog::with_snapshot(sample_snapshot());
    fake.fail_add = true;
    let service = Arc::new(fake);
    let mut browser = CatalogBrowser::new(service.clone());

    let kind = browser.add_question("Is it a bird?").await.expect("handled");
    assert_eq!(kind, NoticeKind::Error);
    assert_eq!(service.added.lock().await.len(), 1);
    assert_eq!(*service.fetches.lock().await, 0);

    let notice = browser.notice().expect("notice");
    assert_eq!(notice.kind(), NoticeKind::Error);
    assert_eq!(notice.message(), ADD_FAILED_TEXT);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let mut browser = CatalogBrowser::new(Arc::new(FakeCatalog::with_snapshot(sample_snapshot())));
    browser.refresh().await;

    let mut broken = FakeCatalog::empty();
    broken.fail_fetch = true;
    browser.service = Arc::new(broken);

    assert!(!browser.refresh().await);
    assert_eq!(browser.questions().len(), 2);
    assert_eq!(browser.entities().count(), 2);
    assert_eq!(
        browser.notice().map(Notice::message),
        Some(LOAD_FAILED_TEXT)
    );
}

#[tokio::test]
async fn notice_clears_itself_after_the_ttl() {
    let mut browser = CatalogBrowser::new(Arc::new(FakeCatalog::empty()));
    browser.add_question("Is it red?").await.expect("add");

    let posted_at = browser.notice().expect("notice").posted_at;
    assert!(browser
        .notice_at(posted_at + Duration::from_millis(2_999))
        .is_some());
    assert!(browser.notice_at(posted_at + DEFAULT_NOTICE_TTL).is_none());
    assert!(browser.notice_at(posted_at).is_none());
}

#[tokio::test]
async fn notice_ttl_is_configurable() {
    let mut browser = CatalogBrowser::new(Arc::new(FakeCatalog::empty()))
        .with_notice_ttl(Duration::from_secs(10));
    browser.add_question("Is it red?").await.expect("add");

    let posted_at = browser.notice().expect("notice").posted_at;
    assert!(browser
        .notice_at(posted_at + Duration::from_secs(5))
        .is_some());
}
