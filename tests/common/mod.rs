#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use scamwatch::config::thresholds::{RiskThresholds, ScreeningConfig};
use scamwatch::domain::report::{
    Report, ReportStatus, ScamType, ScammerInfo, ValidationState,
};
use scamwatch::infra::memory::InMemoryReportStore;
use scamwatch::infra::store::ReportStore;
use scamwatch::infra::verify::{
    ActivityLogger, EmailVerifier, PartnerVerifier, ScamDatabase, SearchEvent,
};
use scamwatch::AppState;

pub const TEST_MODERATOR_TOKEN: &str = "test-moderator-token-12345";

// ---------------------------------------------------------------------------
// Scriptable collaborator mocks
// ---------------------------------------------------------------------------

/// Scam-database stub: `matched` scripts the lookup verdict, `fail` makes
/// every call error (collaborator unreachable).
#[derive(Default)]
pub struct MockScamDatabase {
    pub matched: AtomicBool,
    pub fail: AtomicBool,
}

#[async_trait]
impl ScamDatabase for MockScamDatabase {
    async fn lookup(
        &self,
        _title: &str,
        _description: &str,
        _scammer: &ScammerInfo,
    ) -> Result<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("scam database unreachable"));
        }
        Ok(self.matched.load(Ordering::SeqCst))
    }
}

pub struct MockEmailVerifier {
    pub valid: AtomicBool,
}

impl Default for MockEmailVerifier {
    fn default() -> Self {
        Self {
            valid: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl EmailVerifier for MockEmailVerifier {
    async fn verify(&self, _email: &str) -> Result<bool> {
        Ok(self.valid.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct MockPartnerVerifier {
    pub verified: AtomicBool,
}

#[async_trait]
impl PartnerVerifier for MockPartnerVerifier {
    async fn verify_report(&self, _report: &Report) -> Result<bool> {
        Ok(self.verified.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct RecordingActivityLogger {
    pub events: Mutex<Vec<SearchEvent>>,
}

#[async_trait]
impl ActivityLogger for RecordingActivityLogger {
    async fn record_search(&self, event: &SearchEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TestApp — fresh in-memory app per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub scam_db: Arc<MockScamDatabase>,
    pub email_verifier: Arc<MockEmailVerifier>,
    pub partner: Arc<MockPartnerVerifier>,
    pub activity: Arc<RecordingActivityLogger>,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let scam_db = Arc::new(MockScamDatabase::default());
        let email_verifier = Arc::new(MockEmailVerifier::default());
        let partner = Arc::new(MockPartnerVerifier::default());
        let activity = Arc::new(RecordingActivityLogger::default());

        let state = AppState {
            store: Arc::new(InMemoryReportStore::new()),
            scam_db: scam_db.clone(),
            email_verifier: email_verifier.clone(),
            partner_verifier: partner.clone(),
            activity: activity.clone(),
            risk_thresholds: RiskThresholds::default(),
            screening: ScreeningConfig::default(),
            moderator_token: Some(TEST_MODERATOR_TOKEN.to_string()),
        };

        let router = scamwatch::http::router(state.clone());

        TestApp {
            router,
            state,
            scam_db,
            email_verifier,
            partner,
            activity,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None, &[]).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body), &[]).await
    }

    /// GET with the moderator token header.
    pub async fn get_moderator(&self, path: &str) -> TestResponse {
        self.request(
            Method::GET,
            path,
            None,
            &[("x-moderator-token", TEST_MODERATOR_TOKEN)],
        )
        .await
    }

    /// PUT with the moderator token header.
    pub async fn put_moderator(&self, path: &str, body: Value) -> TestResponse {
        self.request(
            Method::PUT,
            path,
            Some(body),
            &[("x-moderator-token", TEST_MODERATOR_TOKEN)],
        )
        .await
    }

    /// POST with the moderator token header.
    pub async fn post_moderator(&self, path: &str, body: Option<Value>) -> TestResponse {
        self.request(
            Method::POST,
            path,
            body,
            &[("x-moderator-token", TEST_MODERATOR_TOKEN)],
        )
        .await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Submit a minimal report through the API; returns its id.
    pub async fn submit_report(&self, title: &str, description: &str) -> Uuid {
        let resp = self
            .post_json(
                "/v1/scams",
                serde_json::json!({
                    "title": title,
                    "description": description,
                    "scam_type": "phishing",
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.error_message());
        Uuid::parse_str(resp.json()["id"].as_str().unwrap()).unwrap()
    }

    /// Submit a report with full payload control; returns the raw response.
    pub async fn submit_report_raw(&self, body: Value) -> TestResponse {
        self.post_json("/v1/scams", body).await
    }

    /// Insert a report directly into the store, bypassing screening. Used to
    /// seed the historical corpus that risk scoring and search count over.
    pub async fn seed_report(
        &self,
        title: &str,
        scammer: ScammerInfo,
        status: ReportStatus,
    ) -> Uuid {
        let report = build_report(title, scammer, status);
        self.seed(&report).await;
        report.id
    }

    /// Insert a fully customized report (votes, tags, type, ...) directly.
    pub async fn seed(&self, report: &Report) {
        self.state
            .store
            .insert(report)
            .await
            .expect("seed insert failed");
    }

    /// Seed `count` approved reports sharing one scammer phone number.
    pub async fn seed_phone_corpus(&self, phone: &str, count: usize) {
        for i in 0..count {
            self.seed_report(
                &format!("phone corpus {} #{}", phone, i),
                ScammerInfo {
                    phone: Some(phone.to_string()),
                    ..Default::default()
                },
                ReportStatus::Approved,
            )
            .await;
        }
    }

    /// Fetch a report as a moderator and return its JSON.
    pub async fn fetch_report(&self, id: Uuid) -> Value {
        let resp = self.get_moderator(&format!("/v1/scams/{}", id)).await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.json()
    }
}

/// A plain report with the given fields; tweak the rest before seeding.
pub fn build_report(title: &str, scammer: ScammerInfo, status: ReportStatus) -> Report {
    Report {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("seeded description for {}", title),
        scam_type: ScamType::Other,
        scammer,
        financial_loss: None,
        status,
        validation: ValidationState::default(),
        verified: false,
        upvotes: 0,
        downvotes: 0,
        tags: vec![],
        date_occurred: None,
        created_at: OffsetDateTime::now_utc(),
    }
}
