use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app::normalize::normalize_phone;
use crate::domain::report::{Report, ReportStatus, ScammerInfo, VISIBLE_FOR_MATCHING};
use crate::infra::store::{
    CorpusStats, DailyCount, FinancialTotals, ReportStore, SearchFilter, StatusCount, TypeCount,
    WebsiteCount,
};

/// In-memory `ReportStore` used by the test harness and local development.
/// Matching semantics mirror the SQL implementation: case-insensitive
/// substring containment, exact email equality, substring matching over
/// normalized phone digits.
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: Mutex<Vec<Report>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn visible(report: &Report) -> bool {
    VISIBLE_FOR_MATCHING.contains(&report.status)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_filter(report: &Report, filter: &SearchFilter) -> bool {
    if !visible(report) {
        return false;
    }
    if let Some(scam_type) = filter.scam_type {
        if report.scam_type != scam_type {
            return false;
        }
    }

    let mut any_criteria = false;
    if let Some(q) = &filter.q {
        any_criteria = true;
        let scammer = &report.scammer;
        let fields = [
            Some(report.title.as_str()),
            Some(report.description.as_str()),
            scammer.name.as_deref(),
            scammer.email.as_deref(),
            scammer.website.as_deref(),
            scammer.business_name.as_deref(),
        ];
        if fields
            .into_iter()
            .flatten()
            .any(|field| contains_ci(field, q))
            || report.tags.iter().any(|tag| contains_ci(tag, q))
        {
            return true;
        }
    }
    if let Some(email) = &filter.email {
        any_criteria = true;
        if report.scammer.email.as_deref() == Some(email.as_str()) {
            return true;
        }
    }
    if let Some(phone) = &filter.phone_normalized {
        any_criteria = true;
        if report
            .scammer
            .phone
            .as_deref()
            .map(normalize_phone)
            .is_some_and(|stored| stored.contains(phone.as_str()))
        {
            return true;
        }
    }
    if let Some(website) = &filter.website {
        any_criteria = true;
        if report
            .scammer
            .website
            .as_deref()
            .is_some_and(|stored| contains_ci(stored, website))
        {
            return true;
        }
    }
    if let Some(business) = &filter.business_name {
        any_criteria = true;
        if report
            .scammer
            .business_name
            .as_deref()
            .is_some_and(|stored| contains_ci(stored, business))
        {
            return true;
        }
    }

    // Type-only filtering (no text criteria) keeps every visible report.
    !any_criteria
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert(&self, report: &Report) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Report>> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .find(|report| report.id == id)
            .cloned())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        comment: Option<&str>,
    ) -> Result<bool> {
        let mut reports = self.reports.lock().unwrap();
        match reports.iter_mut().find(|report| report.id == id) {
            Some(report) => {
                report.status = status;
                if let Some(comment) = comment {
                    report.validation.comments = Some(comment.to_string());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_step(&self, id: Uuid, step: &str) -> Result<bool> {
        let mut reports = self.reports.lock().unwrap();
        match reports.iter_mut().find(|report| report.id == id) {
            Some(report) => {
                report.validation.step = Some(step.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_comments(&self, id: Uuid, comments: &str) -> Result<bool> {
        let mut reports = self.reports.lock().unwrap();
        match reports.iter_mut().find(|report| report.id == id) {
            Some(report) => {
                report.validation.comments = Some(comments.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<bool> {
        let mut reports = self.reports.lock().unwrap();
        match reports.iter_mut().find(|report| report.id == id) {
            Some(report) => {
                report.verified = verified;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn duplicate_exists(
        &self,
        title: &str,
        description: &str,
        exclude: Uuid,
    ) -> Result<bool> {
        Ok(self.reports.lock().unwrap().iter().any(|report| {
            report.id != exclude && report.title == title && report.description == description
        }))
    }

    async fn count_scammer_overlap(&self, scammer: &ScammerInfo, exclude: Uuid) -> Result<i64> {
        if !scammer.has_overlap_keys() {
            return Ok(0);
        }
        let count = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|report| report.id != exclude)
            .filter(|report| {
                let other = &report.scammer;
                (scammer.email.is_some() && other.email == scammer.email)
                    || (scammer.phone.is_some() && other.phone == scammer.phone)
                    || (scammer.name.is_some() && other.name == scammer.name)
            })
            .count();
        Ok(count as i64)
    }

    async fn count_phone_containing(&self, normalized: &str) -> Result<i64> {
        let count = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|report| visible(report))
            .filter(|report| {
                report
                    .scammer
                    .phone
                    .as_deref()
                    .map(normalize_phone)
                    .is_some_and(|stored| stored.contains(normalized))
            })
            .count();
        Ok(count as i64)
    }

    async fn count_phone_exact(&self, phone: &str) -> Result<i64> {
        let count = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|report| visible(report))
            .filter(|report| report.scammer.phone.as_deref() == Some(phone))
            .count();
        Ok(count as i64)
    }

    async fn count_email_exact(&self, email: &str) -> Result<i64> {
        let count = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|report| visible(report))
            .filter(|report| report.scammer.email.as_deref() == Some(email))
            .count();
        Ok(count as i64)
    }

    async fn count_website_containing(&self, website: &str) -> Result<i64> {
        let count = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|report| visible(report))
            .filter(|report| {
                report
                    .scammer
                    .website
                    .as_deref()
                    .is_some_and(|stored| contains_ci(stored, website))
            })
            .count();
        Ok(count as i64)
    }

    async fn count_business_containing(&self, business_name: &str) -> Result<i64> {
        let count = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|report| visible(report))
            .filter(|report| {
                report
                    .scammer
                    .business_name
                    .as_deref()
                    .is_some_and(|stored| contains_ci(stored, business_name))
            })
            .count();
        Ok(count as i64)
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Report>, i64)> {
        let reports = self.reports.lock().unwrap();
        let mut matched: Vec<Report> = reports
            .iter()
            .filter(|report| matches_filter(report, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as i64;
        let page: Vec<Report> = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn stats(&self) -> Result<CorpusStats> {
        let reports = self.reports.lock().unwrap();

        let mut by_status: HashMap<&'static str, i64> = HashMap::new();
        let mut by_type: HashMap<&'static str, i64> = HashMap::new();
        let mut websites: HashMap<String, i64> = HashMap::new();
        let mut days: HashMap<time::Date, i64> = HashMap::new();
        let mut total_amount = 0.0;
        let mut reports_with_loss = 0;

        let cutoff = OffsetDateTime::now_utc() - Duration::days(30);
        for report in reports.iter() {
            *by_status.entry(report.status.as_db()).or_default() += 1;
            *by_type.entry(report.scam_type.as_db()).or_default() += 1;
            if let Some(website) = report.scammer.website.as_deref() {
                if !website.is_empty() {
                    *websites.entry(website.to_string()).or_default() += 1;
                }
            }
            if report.created_at >= cutoff {
                *days.entry(report.created_at.date()).or_default() += 1;
            }
            if let Some(loss) = &report.financial_loss {
                total_amount += loss.amount;
                reports_with_loss += 1;
            }
        }

        let mut by_status: Vec<StatusCount> = by_status
            .into_iter()
            .map(|(status, count)| StatusCount {
                status: status.to_string(),
                count,
            })
            .collect();
        by_status.sort_by(|a, b| a.status.cmp(&b.status));

        let mut by_type: Vec<TypeCount> = by_type
            .into_iter()
            .map(|(scam_type, count)| TypeCount {
                scam_type: scam_type.to_string(),
                count,
            })
            .collect();
        by_type.sort_by(|a, b| b.count.cmp(&a.count));

        let mut top_websites: Vec<WebsiteCount> = websites
            .into_iter()
            .map(|(website, count)| WebsiteCount { website, count })
            .collect();
        top_websites.sort_by(|a, b| b.count.cmp(&a.count));
        top_websites.truncate(10);

        let mut daily_counts: Vec<DailyCount> = days
            .into_iter()
            .map(|(day, count)| DailyCount {
                day: day.to_string(),
                count,
            })
            .collect();
        daily_counts.sort_by(|a, b| a.day.cmp(&b.day));

        Ok(CorpusStats {
            total_reports: reports.len() as i64,
            by_status,
            by_type,
            top_websites,
            daily_counts,
            financial: FinancialTotals {
                total_amount,
                reports_with_loss,
            },
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
