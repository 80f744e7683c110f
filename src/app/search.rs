use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::app::normalize::normalize_phone;
use crate::app::risk::RiskQuery;
use crate::config::thresholds::relevance;
use crate::domain::report::{Report, ScamType};
use crate::infra::store::{ReportStore, SearchFilter};
use crate::infra::verify::{ActivityLogger, SearchEvent};

#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub business_name: Option<String>,
    pub scam_type: Option<ScamType>,
    pub page: i64,
    pub limit: i64,
}

impl SearchParams {
    /// Search requires at least one signal; a bare type filter is not one.
    pub fn has_criteria(&self) -> bool {
        [
            self.q.as_deref(),
            self.email.as_deref(),
            self.phone.as_deref(),
            self.website.as_deref(),
            self.business_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|value| !value.trim().is_empty())
    }

    /// The same identifiers, handed to the risk scoring engine.
    pub fn risk_query(&self) -> RiskQuery {
        RiskQuery {
            query: self.q.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            website: self.website.clone(),
            business_name: self.business_name.clone(),
        }
    }

    fn filter(&self) -> SearchFilter {
        SearchFilter {
            q: trimmed(self.q.as_deref()),
            email: trimmed(self.email.as_deref()),
            phone_normalized: trimmed(self.phone.as_deref())
                .map(|phone| normalize_phone(&phone))
                .filter(|normalized| !normalized.is_empty()),
            website: trimmed(self.website.as_deref()),
            business_name: trimmed(self.business_name.as_deref()),
            scam_type: self.scam_type,
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredReport {
    #[serde(flatten)]
    pub report: Report,
    pub relevance_score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Retrieval plus locally computed relevance ranking. The store paginates
/// candidates; scores are computed here and re-order the page, independent
/// of the store's native ordering.
pub struct SearchService {
    store: Arc<dyn ReportStore>,
    activity: Arc<dyn ActivityLogger>,
}

impl SearchService {
    pub fn new(store: Arc<dyn ReportStore>, activity: Arc<dyn ActivityLogger>) -> Self {
        Self { store, activity }
    }

    pub async fn search(&self, params: &SearchParams) -> Result<(Vec<ScoredReport>, Pagination)> {
        let filter = params.filter();
        let offset = (params.page - 1) * params.limit;
        let (candidates, total) = self.store.search(&filter, offset, params.limit).await?;

        let mut results: Vec<ScoredReport> = candidates
            .into_iter()
            .map(|report| {
                let relevance_score = relevance_score(&report, params);
                ScoredReport {
                    report,
                    relevance_score,
                }
            })
            .collect();
        // Stable sort: ties keep the store's newest-first retrieval order.
        results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

        let event = SearchEvent {
            q: filter.q.clone(),
            email: filter.email.clone(),
            phone: filter.phone_normalized.clone(),
            website: filter.website.clone(),
            business_name: filter.business_name.clone(),
            result_count: results.len() as i64,
        };
        if let Err(err) = self.activity.record_search(&event).await {
            tracing::warn!(error = ?err, "failed to record search activity");
        }

        let total_pages = if total == 0 {
            0
        } else {
            (total + params.limit - 1) / params.limit
        };
        let pagination = Pagination {
            page: params.page,
            limit: params.limit,
            total,
            total_pages,
        };

        Ok((results, pagination))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Additive relevance score. Every matching signal contributes; a report
/// matching on several accumulates all of them.
pub fn relevance_score(report: &Report, params: &SearchParams) -> i64 {
    let mut score = 0;
    let scammer = &report.scammer;

    if let Some(email) = trimmed(params.email.as_deref()) {
        if scammer.email.as_deref() == Some(email.as_str()) {
            score += relevance::EMAIL_EXACT;
        }
    }
    if let Some(phone) = trimmed(params.phone.as_deref()) {
        let needle = normalize_phone(&phone);
        if !needle.is_empty()
            && scammer
                .phone
                .as_deref()
                .map(normalize_phone)
                .is_some_and(|stored| stored.contains(&needle))
        {
            score += relevance::PHONE_MATCH;
        }
    }
    if let Some(website) = trimmed(params.website.as_deref()) {
        if scammer
            .website
            .as_deref()
            .is_some_and(|stored| contains_ci(stored, &website))
        {
            score += relevance::WEBSITE_MATCH;
        }
    }
    if let Some(business) = trimmed(params.business_name.as_deref()) {
        if scammer
            .business_name
            .as_deref()
            .is_some_and(|stored| contains_ci(stored, &business))
        {
            score += relevance::BUSINESS_MATCH;
        }
    }
    if let Some(q) = trimmed(params.q.as_deref()) {
        if contains_ci(&report.title, &q) {
            score += relevance::TITLE_MATCH;
        }
        if scammer
            .name
            .as_deref()
            .is_some_and(|name| contains_ci(name, &q))
        {
            score += relevance::SCAMMER_NAME_MATCH;
        }
        if contains_ci(&report.description, &q) {
            score += relevance::DESCRIPTION_MATCH;
        }
    }

    if report.verified {
        score += relevance::VERIFIED_BONUS;
    }
    score += i64::from(report.upvotes - report.downvotes).min(relevance::VOTE_BONUS_CAP);

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{ReportStatus, ScammerInfo};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn report(scammer: ScammerInfo, upvotes: i32, downvotes: i32) -> Report {
        Report {
            id: Uuid::new_v4(),
            title: "Fake broker stole my deposit".to_string(),
            description: "Wired money and never heard back".to_string(),
            scam_type: ScamType::Investment,
            scammer,
            financial_loss: None,
            status: ReportStatus::Approved,
            validation: Default::default(),
            verified: false,
            upvotes,
            downvotes,
            tags: vec![],
            date_occurred: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn email_match_outranks_title_match_despite_votes() {
        let email_hit = report(
            ScammerInfo {
                email: Some("crook@example.com".to_string()),
                ..Default::default()
            },
            1,
            0,
        );
        let mut title_hit = report(ScammerInfo::default(), 39, 0);
        title_hit.title = "crook@example.com took my savings".to_string();

        let params = SearchParams {
            q: Some("crook@example.com".to_string()),
            email: Some("crook@example.com".to_string()),
            page: 1,
            limit: 20,
            ..Default::default()
        };

        let email_score = relevance_score(&email_hit, &params);
        let title_score = relevance_score(&title_hit, &params);
        assert!(
            email_score > title_score,
            "email match {} should outrank title match {}",
            email_score,
            title_score
        );
    }

    #[test]
    fn signals_accumulate() {
        let mut hit = report(
            ScammerInfo {
                email: Some("crook@example.com".to_string()),
                phone: Some("+1 (555) 000-1234".to_string()),
                ..Default::default()
            },
            0,
            0,
        );
        hit.verified = true;

        let params = SearchParams {
            email: Some("crook@example.com".to_string()),
            phone: Some("5550001234".to_string()),
            page: 1,
            limit: 20,
            ..Default::default()
        };

        // 100 (email) + 90 (phone) + 20 (verified)
        assert_eq!(relevance_score(&hit, &params), 210);
    }

    #[test]
    fn vote_bonus_is_capped() {
        let hit = report(ScammerInfo::default(), 50, 0);
        let params = SearchParams {
            q: Some("no match here".to_string()),
            page: 1,
            limit: 20,
            ..Default::default()
        };
        assert_eq!(relevance_score(&hit, &params), 10);
    }

    #[test]
    fn downvoted_reports_lose_score() {
        let hit = report(ScammerInfo::default(), 0, 4);
        let params = SearchParams::default();
        assert_eq!(relevance_score(&hit, &params), -4);
    }
}
