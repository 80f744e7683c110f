use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::report::{Report, ScammerInfo};

/// Known-scam database lookup. Returns true when the submitted report
/// matches an already-catalogued scam profile.
#[async_trait]
pub trait ScamDatabase: Send + Sync {
    async fn lookup(&self, title: &str, description: &str, scammer: &ScammerInfo)
        -> Result<bool>;
}

/// Email deliverability/validity check. Returns true when the address is
/// considered valid.
#[async_trait]
pub trait EmailVerifier: Send + Sync {
    async fn verify(&self, email: &str) -> Result<bool>;
}

/// Partner-network verification of a full report. Returns true when a
/// partner confirms the report.
#[async_trait]
pub trait PartnerVerifier: Send + Sync {
    async fn verify_report(&self, report: &Report) -> Result<bool>;
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    pub result_count: i64,
}

/// Search activity sink. Failures are logged and swallowed by callers;
/// recording activity must never fail a search.
#[async_trait]
pub trait ActivityLogger: Send + Sync {
    async fn record_search(&self, event: &SearchEvent) -> Result<()>;
}

/// Shared reqwest client with the bounded per-request timeout every
/// collaborator call must respect.
pub fn verification_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|err| anyhow!("failed to build verification client: {}", err))
}

#[derive(Clone)]
pub struct HttpScamDatabase {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Serialize)]
struct ScamLookupRequest<'a> {
    title: &'a str,
    description: &'a str,
    scammer: &'a ScammerInfo,
}

#[derive(Deserialize)]
struct ScamLookupResponse {
    matched: bool,
}

impl HttpScamDatabase {
    pub fn new(client: reqwest::Client, base: &Url) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: base.join("v1/lookup")?,
        })
    }
}

#[async_trait]
impl ScamDatabase for HttpScamDatabase {
    async fn lookup(
        &self,
        title: &str,
        description: &str,
        scammer: &ScammerInfo,
    ) -> Result<bool> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&ScamLookupRequest {
                title,
                description,
                scammer,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("scam database returned {}: {}", status, body));
        }

        let parsed: ScamLookupResponse = resp.json().await?;
        Ok(parsed.matched)
    }
}

#[derive(Clone)]
pub struct HttpEmailVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Serialize)]
struct EmailVerifyRequest<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct EmailVerifyResponse {
    valid: bool,
}

impl HttpEmailVerifier {
    pub fn new(client: reqwest::Client, base: &Url) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: base.join("v1/verify")?,
        })
    }
}

#[async_trait]
impl EmailVerifier for HttpEmailVerifier {
    async fn verify(&self, email: &str) -> Result<bool> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&EmailVerifyRequest { email })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("email verifier returned {}: {}", status, body));
        }

        let parsed: EmailVerifyResponse = resp.json().await?;
        Ok(parsed.valid)
    }
}

#[derive(Clone)]
pub struct HttpPartnerVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Deserialize)]
struct PartnerVerifyResponse {
    verified: bool,
}

impl HttpPartnerVerifier {
    pub fn new(client: reqwest::Client, base: &Url) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: base.join("v1/reports/verify")?,
        })
    }
}

#[async_trait]
impl PartnerVerifier for HttpPartnerVerifier {
    async fn verify_report(&self, report: &Report) -> Result<bool> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(report)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("partner verifier returned {}: {}", status, body));
        }

        let parsed: PartnerVerifyResponse = resp.json().await?;
        Ok(parsed.verified)
    }
}

#[derive(Clone)]
pub struct HttpActivityLogger {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpActivityLogger {
    pub fn new(client: reqwest::Client, base: &Url) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: base.join("v1/events/search")?,
        })
    }
}

#[async_trait]
impl ActivityLogger for HttpActivityLogger {
    async fn record_search(&self, event: &SearchEvent) -> Result<()> {
        let resp = self.client.post(self.endpoint.clone()).json(event).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("activity logger returned {}", status));
        }
        Ok(())
    }
}

/// Used when no activity sink is configured; search activity is only traced.
pub struct TracingActivityLogger;

#[async_trait]
impl ActivityLogger for TracingActivityLogger {
    async fn record_search(&self, event: &SearchEvent) -> Result<()> {
        tracing::info!(
            result_count = event.result_count,
            q = event.q.as_deref().unwrap_or(""),
            "search activity"
        );
        Ok(())
    }
}
