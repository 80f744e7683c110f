use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::config::thresholds::ScreeningConfig;
use crate::domain::report::{Report, ReportStatus};
use crate::infra::store::ReportStore;
use crate::infra::verify::{EmailVerifier, PartnerVerifier, ScamDatabase};

pub const COMMENT_SCAM_DB_MATCH: &str = "Matched known scam database";
pub const COMMENT_EMAIL_INVALID: &str = "Scammer email failed verification";
pub const COMMENT_HIGH_TARGET: &str = "Profile flagged as high target scammer";
pub const COMMENT_PARTNER_VERIFIED: &str = "Verified by partner network";

pub const STEP_AUTOMATED_VERIFICATION: &str = "automated_verification";
pub const STEP_MANUAL_REVIEW: &str = "manual_review";

/// Uniform per-stage result surfaced to callers and logs.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub success: bool,
    pub message: String,
}

impl StageOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// What the driver does after a stage ran.
enum StageControl {
    Advance,
    Stop(StageOutcome),
}

/// One automated check. Stages persist their own mutations as their final
/// act, so an error inside a stage never leaves a half-applied report.
#[async_trait]
trait ScreeningStage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, report: &mut Report) -> Result<StageControl>;
}

/// The ordered screening state machine applied to a newly submitted report.
/// Stages run until one stops the pipeline; a stage's internal error is
/// caught at the stage boundary and surfaced as a failed outcome, never a
/// panic or a propagated error. Safe to re-invoke on an interrupted report:
/// every mutation is a single-field idempotent write.
pub struct ScreeningPipeline {
    store: Arc<dyn ReportStore>,
    stages: Vec<Box<dyn ScreeningStage>>,
    partner: PartnerCheck,
}

impl ScreeningPipeline {
    pub fn new(
        store: Arc<dyn ReportStore>,
        scam_db: Arc<dyn ScamDatabase>,
        email_verifier: Arc<dyn EmailVerifier>,
        partner: Arc<dyn PartnerVerifier>,
        config: ScreeningConfig,
    ) -> Self {
        let stages: Vec<Box<dyn ScreeningStage>> = vec![
            Box::new(InitialScreening {
                store: store.clone(),
            }),
            Box::new(AutomatedVerification {
                store: store.clone(),
                scam_db,
                email_verifier,
            }),
            Box::new(HighTargetCheck {
                store: store.clone(),
                threshold: config.high_target_threshold,
            }),
        ];
        Self {
            store: store.clone(),
            stages,
            partner: PartnerCheck { store, partner },
        }
    }

    /// Runs the automatic stages (initial screening, automated verification,
    /// high-target check) in order. The partner check is deliberately not
    /// chained here; see [`ScreeningPipeline::partner_check`].
    pub async fn run(&self, report_id: Uuid) -> Result<StageOutcome> {
        let Some(mut report) = self.store.fetch(report_id).await? else {
            return Ok(StageOutcome::fail("Report not found"));
        };

        for stage in &self.stages {
            match stage.run(&mut report).await {
                Ok(StageControl::Advance) => {
                    tracing::debug!(report_id = %report_id, stage = stage.name(), "stage passed");
                }
                Ok(StageControl::Stop(outcome)) => {
                    tracing::info!(
                        report_id = %report_id,
                        stage = stage.name(),
                        success = outcome.success,
                        message = %outcome.message,
                        "screening stopped"
                    );
                    return Ok(outcome);
                }
                Err(err) => {
                    tracing::error!(
                        report_id = %report_id,
                        stage = stage.name(),
                        error = ?err,
                        "screening stage errored"
                    );
                    return Ok(StageOutcome::fail(format!("Error during {}", stage.name())));
                }
            }
        }

        Ok(StageOutcome::ok("Screening complete"))
    }

    /// External partner verification, invoked out-of-band by a moderator.
    pub async fn partner_check(&self, report_id: Uuid) -> Result<StageOutcome> {
        let Some(mut report) = self.store.fetch(report_id).await? else {
            return Ok(StageOutcome::fail("Report not found"));
        };

        match self.partner.run(&mut report).await {
            Ok(StageControl::Stop(outcome)) => Ok(outcome),
            Ok(StageControl::Advance) => Ok(StageOutcome::ok("Partner verification complete")),
            Err(err) => {
                tracing::error!(
                    report_id = %report_id,
                    stage = self.partner.name(),
                    error = ?err,
                    "partner check errored"
                );
                Ok(StageOutcome::fail(format!(
                    "Error during {}",
                    self.partner.name()
                )))
            }
        }
    }
}

struct InitialScreening {
    store: Arc<dyn ReportStore>,
}

#[async_trait]
impl ScreeningStage for InitialScreening {
    fn name(&self) -> &'static str {
        "initial screening"
    }

    async fn run(&self, report: &mut Report) -> Result<StageControl> {
        if report.title.trim().is_empty() || report.description.trim().is_empty() {
            return Ok(StageControl::Stop(StageOutcome::fail(
                "Title and description are required",
            )));
        }

        if self
            .store
            .duplicate_exists(&report.title, &report.description, report.id)
            .await?
        {
            return Ok(StageControl::Stop(StageOutcome::fail("Duplicate report")));
        }

        self.store
            .set_step(report.id, STEP_AUTOMATED_VERIFICATION)
            .await?;
        report.validation.step = Some(STEP_AUTOMATED_VERIFICATION.to_string());
        Ok(StageControl::Advance)
    }
}

struct AutomatedVerification {
    store: Arc<dyn ReportStore>,
    scam_db: Arc<dyn ScamDatabase>,
    email_verifier: Arc<dyn EmailVerifier>,
}

#[async_trait]
impl ScreeningStage for AutomatedVerification {
    fn name(&self) -> &'static str {
        "automated verification"
    }

    async fn run(&self, report: &mut Report) -> Result<StageControl> {
        let matched = self
            .scam_db
            .lookup(&report.title, &report.description, &report.scammer)
            .await?;
        if matched {
            self.store
                .set_status(report.id, ReportStatus::Rejected, Some(COMMENT_SCAM_DB_MATCH))
                .await?;
            report.status = ReportStatus::Rejected;
            report.validation.comments = Some(COMMENT_SCAM_DB_MATCH.to_string());
            return Ok(StageControl::Stop(StageOutcome::fail(COMMENT_SCAM_DB_MATCH)));
        }

        if let Some(email) = report.scammer.email.clone() {
            let valid = self.email_verifier.verify(&email).await?;
            if !valid {
                // Deliberately leaves status untouched: an undeliverable
                // scammer address is grounds for a human look, not rejection.
                self.store
                    .set_comments(report.id, COMMENT_EMAIL_INVALID)
                    .await?;
                report.validation.comments = Some(COMMENT_EMAIL_INVALID.to_string());
                return Ok(StageControl::Stop(StageOutcome::fail(COMMENT_EMAIL_INVALID)));
            }
        }

        Ok(StageControl::Advance)
    }
}

struct HighTargetCheck {
    store: Arc<dyn ReportStore>,
    threshold: i64,
}

#[async_trait]
impl ScreeningStage for HighTargetCheck {
    fn name(&self) -> &'static str {
        "high target check"
    }

    async fn run(&self, report: &mut Report) -> Result<StageControl> {
        let overlap = self
            .store
            .count_scammer_overlap(&report.scammer, report.id)
            .await?;

        if overlap >= self.threshold {
            self.store
                .set_status(report.id, ReportStatus::UnderReview, Some(COMMENT_HIGH_TARGET))
                .await?;
            report.status = ReportStatus::UnderReview;
            report.validation.comments = Some(COMMENT_HIGH_TARGET.to_string());
            return Ok(StageControl::Stop(StageOutcome::ok(COMMENT_HIGH_TARGET)));
        }

        // Approval always requires a moderator; the pipeline only queues.
        self.store.set_step(report.id, STEP_MANUAL_REVIEW).await?;
        report.validation.step = Some(STEP_MANUAL_REVIEW.to_string());
        Ok(StageControl::Stop(StageOutcome::ok("Queued for manual review")))
    }
}

struct PartnerCheck {
    store: Arc<dyn ReportStore>,
    partner: Arc<dyn PartnerVerifier>,
}

#[async_trait]
impl ScreeningStage for PartnerCheck {
    fn name(&self) -> &'static str {
        "partner verification"
    }

    async fn run(&self, report: &mut Report) -> Result<StageControl> {
        let verified = self.partner.verify_report(report).await?;
        if !verified {
            return Ok(StageControl::Stop(StageOutcome::fail(
                "Partner verification failed",
            )));
        }

        self.store.set_verified(report.id, true).await?;
        self.store
            .set_status(report.id, ReportStatus::Approved, Some(COMMENT_PARTNER_VERIFIED))
            .await?;
        report.verified = true;
        report.status = ReportStatus::Approved;
        report.validation.comments = Some(COMMENT_PARTNER_VERIFIED.to_string());
        Ok(StageControl::Stop(StageOutcome::ok(COMMENT_PARTNER_VERIFIED)))
    }
}
