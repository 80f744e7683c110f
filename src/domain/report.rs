use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Statuses whose reports participate in risk counting and default search.
/// Includes `pending` so fresh reports propagate into advisories before
/// moderation (see DESIGN.md — flagged for product review).
pub const VISIBLE_FOR_MATCHING: [ReportStatus; 2] = [ReportStatus::Approved, ReportStatus::Pending];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub scam_type: ScamType,
    #[serde(default)]
    pub scammer: ScammerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_loss: Option<FinancialLoss>,
    pub status: ReportStatus,
    #[serde(default)]
    pub validation: ValidationState,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub upvotes: i32,
    #[serde(default)]
    pub downvotes: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "date_string")]
    pub date_occurred: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// (De)serializes `Option<Date>` as "YYYY-MM-DD" on the wire.
pub mod date_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&date.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value {
            Some(raw) => {
                let format = time::format_description::parse("[year]-[month]-[day]")
                    .map_err(serde::de::Error::custom)?;
                Date::parse(&raw, format.as_slice())
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Terminal states are left alone by the automatic pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScamType {
    Investment,
    Romance,
    Phishing,
    TechSupport,
    OnlineShopping,
    Lottery,
    FakeJob,
    Charity,
    Rental,
    Crypto,
    IdentityTheft,
    Other,
}

impl ScamType {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "investment" => Some(Self::Investment),
            "romance" => Some(Self::Romance),
            "phishing" => Some(Self::Phishing),
            "tech_support" => Some(Self::TechSupport),
            "online_shopping" => Some(Self::OnlineShopping),
            "lottery" => Some(Self::Lottery),
            "fake_job" => Some(Self::FakeJob),
            "charity" => Some(Self::Charity),
            "rental" => Some(Self::Rental),
            "crypto" => Some(Self::Crypto),
            "identity_theft" => Some(Self::IdentityTheft),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Investment => "investment",
            Self::Romance => "romance",
            Self::Phishing => "phishing",
            Self::TechSupport => "tech_support",
            Self::OnlineShopping => "online_shopping",
            Self::Lottery => "lottery",
            Self::FakeJob => "fake_job",
            Self::Charity => "charity",
            Self::Rental => "rental",
            Self::Crypto => "crypto",
            Self::IdentityTheft => "identity_theft",
            Self::Other => "other",
        }
    }
}

/// Contact details reported for the scammer. Every field is optional and
/// independently matchable by search and risk scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScammerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
}

impl ScammerInfo {
    /// True when no identifier that the high-target check keys on is present.
    pub fn has_overlap_keys(&self) -> bool {
        self.email.is_some() || self.phone.is_some() || self.name.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialLoss {
    pub amount: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Transient screening metadata. `step` marks pipeline progress,
/// `comments` holds the moderator-visible reason for the current disposition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}
