use serde::{Deserialize, Serialize};

/// Severity tiers for blacklist advisories, ordered by severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A scammer identifier recurring across this many existing reports marks a
/// new report as a high target and routes it straight to `under_review`.
pub const HIGH_TARGET_REPORT_THRESHOLD: i64 = 20;

/// Per-identifier report-count thresholds for the risk scoring engine.
///
/// Website and business names flag at lower counts than phone numbers:
/// domains are cheap to register and legitimate businesses rarely accumulate
/// fraud reports, while phone numbers get reassigned and need more
/// corroboration. Defaults are the production values; tests override.
#[derive(Debug, Clone, Copy)]
pub struct RiskThresholds {
    pub phone_medium: i64,
    pub phone_high: i64,
    pub phone_critical: i64,
    pub email_medium: i64,
    pub email_high: i64,
    pub website_medium: i64,
    pub website_high: i64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            phone_medium: 5,
            phone_high: 10,
            phone_critical: 15,
            email_medium: 5,
            email_high: 10,
            website_medium: 3,
            website_high: 8,
        }
    }
}

impl RiskThresholds {
    pub fn phone_tier(&self, count: i64) -> Option<RiskLevel> {
        if count >= self.phone_critical {
            Some(RiskLevel::Critical)
        } else if count >= self.phone_high {
            Some(RiskLevel::High)
        } else if count >= self.phone_medium {
            Some(RiskLevel::Medium)
        } else {
            None
        }
    }

    pub fn email_tier(&self, count: i64) -> Option<RiskLevel> {
        if count >= self.email_high {
            Some(RiskLevel::High)
        } else if count >= self.email_medium {
            Some(RiskLevel::Medium)
        } else {
            None
        }
    }

    /// Shared by the website and business-name branches.
    pub fn website_tier(&self, count: i64) -> Option<RiskLevel> {
        if count >= self.website_high {
            Some(RiskLevel::High)
        } else if count >= self.website_medium {
            Some(RiskLevel::Medium)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScreeningConfig {
    pub high_target_threshold: i64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            high_target_threshold: HIGH_TARGET_REPORT_THRESHOLD,
        }
    }
}

/// Additive relevance-score weights for search ranking.
pub mod relevance {
    pub const EMAIL_EXACT: i64 = 100;
    pub const PHONE_MATCH: i64 = 90;
    pub const WEBSITE_MATCH: i64 = 80;
    pub const BUSINESS_MATCH: i64 = 70;
    pub const TITLE_MATCH: i64 = 60;
    pub const SCAMMER_NAME_MATCH: i64 = 50;
    pub const DESCRIPTION_MATCH: i64 = 40;
    pub const VERIFIED_BONUS: i64 = 20;
    pub const VOTE_BONUS_CAP: i64 = 10;
}
