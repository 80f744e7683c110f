use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::app::normalize::{is_phone_like, normalize_phone};
use crate::config::thresholds::{RiskLevel, RiskThresholds};
use crate::infra::store::ReportStore;

/// Identifiers to assess, typically lifted straight from a search request.
#[derive(Debug, Clone, Default)]
pub struct RiskQuery {
    pub query: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub business_name: Option<String>,
}

/// Advisory attached to every search response. `kind`/`entity`/`message`
/// are present only when an identifier cleared its blacklist threshold.
#[derive(Debug, Clone, Serialize)]
pub struct BlacklistInfo {
    pub is_blacklisted: bool,
    pub risk_level: RiskLevel,
    pub report_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BlacklistInfo {
    pub fn clean() -> Self {
        Self {
            is_blacklisted: false,
            risk_level: RiskLevel::Low,
            report_count: 0,
            kind: None,
            entity: None,
            message: None,
        }
    }

    fn flagged(kind: &str, entity: &str, count: i64, level: RiskLevel) -> Self {
        Self {
            is_blacklisted: true,
            risk_level: level,
            report_count: count,
            kind: Some(kind.to_string()),
            entity: Some(entity.to_string()),
            message: Some(advisory_message(level, kind, entity, count)),
        }
    }
}

fn advisory_message(level: RiskLevel, kind: &str, entity: &str, count: i64) -> String {
    match level {
        RiskLevel::Critical => format!(
            "DANGER: the {} \"{}\" appears in {} fraud reports. Do not engage.",
            kind, entity, count
        ),
        RiskLevel::High => format!(
            "WARNING: the {} \"{}\" appears in {} fraud reports and is considered a known scam vector.",
            kind, entity, count
        ),
        _ => format!(
            "CAUTION: the {} \"{}\" appears in {} fraud reports. Proceed carefully.",
            kind, entity, count
        ),
    }
}

/// Threshold-based blacklist classifier. Branches run in a fixed priority
/// order (phone, email, website, business name, free-text fallback) and the
/// first identifier to clear its threshold wins; counts are never merged
/// across identifier types.
pub struct RiskEngine {
    store: Arc<dyn ReportStore>,
    thresholds: RiskThresholds,
}

impl RiskEngine {
    pub fn new(store: Arc<dyn ReportStore>, thresholds: RiskThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Never fails: a store error degrades to the neutral advisory so the
    /// search endpoint stays up when advisory computation is broken.
    pub async fn assess(&self, query: &RiskQuery) -> BlacklistInfo {
        match self.evaluate(query).await {
            Ok(info) => info,
            Err(err) => {
                tracing::warn!(error = ?err, "risk assessment failed, returning neutral advisory");
                BlacklistInfo::clean()
            }
        }
    }

    async fn evaluate(&self, query: &RiskQuery) -> Result<BlacklistInfo> {
        if let Some(phone) = non_empty(query.phone.as_deref()) {
            let normalized = normalize_phone(phone);
            if !normalized.is_empty() {
                let count = self.store.count_phone_containing(&normalized).await?;
                if let Some(level) = self.thresholds.phone_tier(count) {
                    return Ok(BlacklistInfo::flagged("phone", phone, count, level));
                }
            }
        }

        if let Some(email) = non_empty(query.email.as_deref()) {
            let count = self.store.count_email_exact(email).await?;
            if let Some(level) = self.thresholds.email_tier(count) {
                return Ok(BlacklistInfo::flagged("email", email, count, level));
            }
        }

        if let Some(website) = non_empty(query.website.as_deref()) {
            let count = self.store.count_website_containing(website).await?;
            if let Some(level) = self.thresholds.website_tier(count) {
                return Ok(BlacklistInfo::flagged("website", website, count, level));
            }
        }

        if let Some(business) = non_empty(query.business_name.as_deref()) {
            let count = self.store.count_business_containing(business).await?;
            if let Some(level) = self.thresholds.website_tier(count) {
                return Ok(BlacklistInfo::flagged("business", business, count, level));
            }
        }

        // Free-text fallback: try the raw query as a phone field, exact
        // first, then normalized substring when it looks like a number.
        if let Some(text) = non_empty(query.query.as_deref()) {
            let count = self.store.count_phone_exact(text).await?;
            if let Some(level) = self.thresholds.phone_tier(count) {
                return Ok(BlacklistInfo::flagged("phone", text, count, level));
            }

            if is_phone_like(text) {
                let normalized = normalize_phone(text);
                if !normalized.is_empty() {
                    let count = self.store.count_phone_containing(&normalized).await?;
                    if let Some(level) = self.thresholds.phone_tier(count) {
                        return Ok(BlacklistInfo::flagged("phone", text, count, level));
                    }
                }
            }
        }

        Ok(BlacklistInfo::clean())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
