use std::sync::Arc;

use anyhow::Result;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::report::{
    FinancialLoss, Report, ReportStatus, ScamType, ScammerInfo, ValidationState,
};
use crate::infra::store::{CorpusStats, ReportStore};

/// Validated submission payload; field-level validation happens at the HTTP
/// boundary before this is built.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub scam_type: ScamType,
    pub scammer: ScammerInfo,
    pub financial_loss: Option<FinancialLoss>,
    pub tags: Vec<String>,
    pub date_occurred: Option<Date>,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ReportStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Persists a new report in `pending`. Screening runs separately; a
    /// report is never publicly visible before it has had the chance to.
    pub async fn create(&self, new_report: NewReport) -> Result<Report> {
        let report = Report {
            id: Uuid::new_v4(),
            title: new_report.title,
            description: new_report.description,
            scam_type: new_report.scam_type,
            scammer: new_report.scammer,
            financial_loss: new_report.financial_loss,
            status: ReportStatus::Pending,
            validation: ValidationState::default(),
            verified: false,
            upvotes: 0,
            downvotes: 0,
            tags: new_report.tags,
            date_occurred: new_report.date_occurred,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.insert(&report).await?;
        Ok(report)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Report>> {
        self.store.fetch(id).await
    }

    /// Manual moderation: the only way out of `under_review`, and the only
    /// path to `approved` besides partner verification.
    pub async fn moderate(
        &self,
        id: Uuid,
        status: ReportStatus,
        notes: Option<&str>,
    ) -> Result<bool> {
        let updated = self.store.set_status(id, status, notes).await?;
        if updated {
            tracing::info!(report_id = %id, status = status.as_db(), "report moderated");
        }
        Ok(updated)
    }

    pub async fn stats(&self) -> Result<CorpusStats> {
        self.store.stats().await
    }
}
