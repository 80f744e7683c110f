use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use time::Date;
use uuid::Uuid;

use crate::app::normalize::{escape_like_pattern, normalize_phone};
use crate::config::AppConfig;
use crate::domain::report::{
    FinancialLoss, Report, ReportStatus, ScamType, ScammerInfo, ValidationState,
};

/// Store-side search filter. Criteria are OR-combined; `scam_type` and the
/// visibility allow-list always apply. Candidates are paginated by the store
/// before the ranking engine scores them.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub q: Option<String>,
    pub email: Option<String>,
    pub phone_normalized: Option<String>,
    pub website: Option<String>,
    pub business_name: Option<String>,
    pub scam_type: Option<ScamType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub total_reports: i64,
    pub by_status: Vec<StatusCount>,
    pub by_type: Vec<TypeCount>,
    pub top_websites: Vec<WebsiteCount>,
    pub daily_counts: Vec<DailyCount>,
    pub financial: FinancialTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    pub scam_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebsiteCount {
    pub website: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyCount {
    /// ISO date, "YYYY-MM-DD".
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialTotals {
    pub total_amount: f64,
    pub reports_with_loss: i64,
}

/// The report document store. Production runs on Postgres; tests use the
/// in-memory implementation. All `count_*` methods are restricted to
/// `VISIBLE_FOR_MATCHING` statuses; `duplicate_exists` and
/// `count_scammer_overlap` consider every status.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, report: &Report) -> Result<()>;
    async fn fetch(&self, id: Uuid) -> Result<Option<Report>>;

    /// Set status and (when given) the moderator-visible disposition comment.
    async fn set_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        comment: Option<&str>,
    ) -> Result<bool>;
    /// Record pipeline progress without touching status.
    async fn set_step(&self, id: Uuid, step: &str) -> Result<bool>;
    /// Record a disposition comment without touching status.
    async fn set_comments(&self, id: Uuid, comments: &str) -> Result<bool>;
    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<bool>;

    /// True when another report (any status, excluding `exclude`) carries
    /// the same title and description.
    async fn duplicate_exists(&self, title: &str, description: &str, exclude: Uuid)
        -> Result<bool>;
    /// Reports (any status, excluding `exclude`) sharing the scammer's
    /// email, phone, or name.
    async fn count_scammer_overlap(&self, scammer: &ScammerInfo, exclude: Uuid) -> Result<i64>;

    async fn count_phone_containing(&self, normalized: &str) -> Result<i64>;
    async fn count_phone_exact(&self, phone: &str) -> Result<i64>;
    async fn count_email_exact(&self, email: &str) -> Result<i64>;
    async fn count_website_containing(&self, website: &str) -> Result<i64>;
    async fn count_business_containing(&self, business_name: &str) -> Result<i64>;

    /// Returns one page of candidates (newest first) plus the total match count.
    async fn search(&self, filter: &SearchFilter, offset: i64, limit: i64)
        -> Result<(Vec<Report>, i64)>;
    async fn stats(&self) -> Result<CorpusStats>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

const REPORT_COLUMNS: &str = "id, title, description, scam_type, \
     scammer_name, scammer_email, scammer_phone, scammer_website, scammer_business_name, \
     loss_amount, loss_currency, loss_payment_method, \
     status, validation_step, validation_comments, verified, upvotes, downvotes, tags, \
     date_occurred, created_at";

impl PgReportStore {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_report(row: &sqlx::postgres::PgRow) -> Result<Report> {
        let status: String = row.get("status");
        let status = ReportStatus::from_db(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown report status: {}", status))?;
        let scam_type: String = row.get("scam_type");
        let scam_type = ScamType::from_db(&scam_type)
            .ok_or_else(|| anyhow::anyhow!("unknown scam type: {}", scam_type))?;

        let loss_amount: Option<f64> = row.get("loss_amount");
        let financial_loss = loss_amount.map(|amount| FinancialLoss {
            amount,
            currency: row.get::<Option<String>, _>("loss_currency").unwrap_or_default(),
            payment_method: row.get("loss_payment_method"),
        });

        Ok(Report {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            scam_type,
            scammer: ScammerInfo {
                name: row.get("scammer_name"),
                email: row.get("scammer_email"),
                phone: row.get("scammer_phone"),
                website: row.get("scammer_website"),
                business_name: row.get("scammer_business_name"),
            },
            financial_loss,
            status,
            validation: ValidationState {
                step: row.get("validation_step"),
                comments: row.get("validation_comments"),
            },
            verified: row.get("verified"),
            upvotes: row.get("upvotes"),
            downvotes: row.get("downvotes"),
            tags: row.get("tags"),
            date_occurred: row.get("date_occurred"),
            created_at: row.get("created_at"),
        })
    }

    /// Builds the shared WHERE clause for search/count. Returns the SQL
    /// fragment and the text parameters to bind, in order.
    fn search_where(filter: &SearchFilter) -> (String, Vec<String>) {
        let mut sql = String::from("status IN ('approved', 'pending')");
        let mut params: Vec<String> = Vec::new();

        if let Some(scam_type) = filter.scam_type {
            params.push(scam_type.as_db().to_string());
            sql.push_str(&format!(" AND scam_type = ${}", params.len()));
        }

        let mut criteria: Vec<String> = Vec::new();
        if let Some(q) = &filter.q {
            params.push(format!("%{}%", escape_like_pattern(q)));
            let idx = params.len();
            criteria.push(format!(
                "(title ILIKE ${idx} ESCAPE '\\' \
                 OR description ILIKE ${idx} ESCAPE '\\' \
                 OR scammer_name ILIKE ${idx} ESCAPE '\\' \
                 OR scammer_email ILIKE ${idx} ESCAPE '\\' \
                 OR scammer_website ILIKE ${idx} ESCAPE '\\' \
                 OR scammer_business_name ILIKE ${idx} ESCAPE '\\' \
                 OR array_to_string(tags, ' ') ILIKE ${idx} ESCAPE '\\')"
            ));
        }
        if let Some(email) = &filter.email {
            params.push(email.clone());
            criteria.push(format!("scammer_email = ${}", params.len()));
        }
        if let Some(phone) = &filter.phone_normalized {
            params.push(format!("%{}%", escape_like_pattern(phone)));
            criteria.push(format!(
                "scammer_phone_normalized LIKE ${} ESCAPE '\\'",
                params.len()
            ));
        }
        if let Some(website) = &filter.website {
            params.push(format!("%{}%", escape_like_pattern(website)));
            criteria.push(format!("scammer_website ILIKE ${} ESCAPE '\\'", params.len()));
        }
        if let Some(business) = &filter.business_name {
            params.push(format!("%{}%", escape_like_pattern(business)));
            criteria.push(format!(
                "scammer_business_name ILIKE ${} ESCAPE '\\'",
                params.len()
            ));
        }

        if !criteria.is_empty() {
            sql.push_str(&format!(" AND ({})", criteria.join(" OR ")));
        }

        (sql, params)
    }

    async fn count_where(&self, condition: &str, param: &str) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM reports WHERE status IN ('approved', 'pending') AND {}",
            condition
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(param)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn insert(&self, report: &Report) -> Result<()> {
        sqlx::query(
            "INSERT INTO reports \
             (id, title, description, scam_type, \
              scammer_name, scammer_email, scammer_phone, scammer_phone_normalized, \
              scammer_website, scammer_business_name, \
              loss_amount, loss_currency, loss_payment_method, \
              status, validation_step, validation_comments, verified, upvotes, downvotes, \
              tags, date_occurred, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                     $14, $15, $16, $17, $18, $19, $20, $21, $22)",
        )
        .bind(report.id)
        .bind(&report.title)
        .bind(&report.description)
        .bind(report.scam_type.as_db())
        .bind(&report.scammer.name)
        .bind(&report.scammer.email)
        .bind(&report.scammer.phone)
        .bind(report.scammer.phone.as_deref().map(normalize_phone))
        .bind(&report.scammer.website)
        .bind(&report.scammer.business_name)
        .bind(report.financial_loss.as_ref().map(|loss| loss.amount))
        .bind(report.financial_loss.as_ref().map(|loss| loss.currency.clone()))
        .bind(
            report
                .financial_loss
                .as_ref()
                .and_then(|loss| loss.payment_method.clone()),
        )
        .bind(report.status.as_db())
        .bind(&report.validation.step)
        .bind(&report.validation.comments)
        .bind(report.verified)
        .bind(report.upvotes)
        .bind(report.downvotes)
        .bind(&report.tags)
        .bind(report.date_occurred)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Report>> {
        let sql = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_report).transpose()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        comment: Option<&str>,
    ) -> Result<bool> {
        let result = match comment {
            Some(comment) => {
                sqlx::query(
                    "UPDATE reports SET status = $1, validation_comments = $2 WHERE id = $3",
                )
                .bind(status.as_db())
                .bind(comment)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE reports SET status = $1 WHERE id = $2")
                    .bind(status.as_db())
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    async fn set_step(&self, id: Uuid, step: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE reports SET validation_step = $1 WHERE id = $2")
            .bind(step)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_comments(&self, id: Uuid, comments: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE reports SET validation_comments = $1 WHERE id = $2")
            .bind(comments)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE reports SET verified = $1 WHERE id = $2")
            .bind(verified)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn duplicate_exists(
        &self,
        title: &str,
        description: &str,
        exclude: Uuid,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reports \
             WHERE title = $1 AND description = $2 AND id <> $3)",
        )
        .bind(title)
        .bind(description)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn count_scammer_overlap(&self, scammer: &ScammerInfo, exclude: Uuid) -> Result<i64> {
        let mut params: Vec<&str> = Vec::new();
        let mut criteria: Vec<String> = Vec::new();
        if let Some(email) = &scammer.email {
            params.push(email);
            criteria.push(format!("scammer_email = ${}", params.len() + 1));
        }
        if let Some(phone) = &scammer.phone {
            params.push(phone);
            criteria.push(format!("scammer_phone = ${}", params.len() + 1));
        }
        if let Some(name) = &scammer.name {
            params.push(name);
            criteria.push(format!("scammer_name = ${}", params.len() + 1));
        }
        if criteria.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM reports WHERE id <> $1 AND ({})",
            criteria.join(" OR ")
        );
        let mut query = sqlx::query_scalar(&sql).bind(exclude);
        for param in params {
            query = query.bind(param);
        }
        let count: i64 = query.fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn count_phone_containing(&self, normalized: &str) -> Result<i64> {
        let pattern = format!("%{}%", escape_like_pattern(normalized));
        self.count_where("scammer_phone_normalized LIKE $1 ESCAPE '\\'", &pattern)
            .await
    }

    async fn count_phone_exact(&self, phone: &str) -> Result<i64> {
        self.count_where("scammer_phone = $1", phone).await
    }

    async fn count_email_exact(&self, email: &str) -> Result<i64> {
        self.count_where("scammer_email = $1", email).await
    }

    async fn count_website_containing(&self, website: &str) -> Result<i64> {
        let pattern = format!("%{}%", escape_like_pattern(website));
        self.count_where("scammer_website ILIKE $1 ESCAPE '\\'", &pattern)
            .await
    }

    async fn count_business_containing(&self, business_name: &str) -> Result<i64> {
        let pattern = format!("%{}%", escape_like_pattern(business_name));
        self.count_where("scammer_business_name ILIKE $1 ESCAPE '\\'", &pattern)
            .await
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Report>, i64)> {
        let (where_sql, params) = Self::search_where(filter);

        let count_sql = format!("SELECT COUNT(*) FROM reports WHERE {}", where_sql);
        let mut count_query = sqlx::query_scalar(&count_sql);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {} FROM reports WHERE {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            REPORT_COLUMNS,
            where_sql,
            params.len() + 1,
            params.len() + 2,
        );
        let mut data_query = sqlx::query(&data_sql);
        for param in &params {
            data_query = data_query.bind(param);
        }
        let rows = data_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in &rows {
            reports.push(Self::row_to_report(row)?);
        }

        Ok((reports, total))
    }

    async fn stats(&self) -> Result<CorpusStats> {
        let total_reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await?;

        let status_rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM reports GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        let by_status = status_rows
            .into_iter()
            .map(|row| StatusCount {
                status: row.get("status"),
                count: row.get("count"),
            })
            .collect();

        let type_rows = sqlx::query(
            "SELECT scam_type, COUNT(*) AS count FROM reports \
             GROUP BY scam_type ORDER BY count DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        let by_type = type_rows
            .into_iter()
            .map(|row| TypeCount {
                scam_type: row.get("scam_type"),
                count: row.get("count"),
            })
            .collect();

        let website_rows = sqlx::query(
            "SELECT scammer_website, COUNT(*) AS count FROM reports \
             WHERE scammer_website IS NOT NULL AND scammer_website <> '' \
             GROUP BY scammer_website ORDER BY count DESC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await?;
        let top_websites = website_rows
            .into_iter()
            .map(|row| WebsiteCount {
                website: row.get("scammer_website"),
                count: row.get("count"),
            })
            .collect();

        let daily_rows = sqlx::query(
            "SELECT created_at::date AS day, COUNT(*) AS count FROM reports \
             WHERE created_at >= NOW() - INTERVAL '30 days' \
             GROUP BY day ORDER BY day",
        )
        .fetch_all(&self.pool)
        .await?;
        let daily_counts = daily_rows
            .into_iter()
            .map(|row| DailyCount {
                day: row.get::<Date, _>("day").to_string(),
                count: row.get("count"),
            })
            .collect();

        let financial_row = sqlx::query(
            "SELECT COALESCE(SUM(loss_amount), 0) AS total_amount, \
                    COUNT(loss_amount) AS reports_with_loss \
             FROM reports WHERE loss_amount IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        let financial = FinancialTotals {
            total_amount: financial_row.get("total_amount"),
            reports_with_loss: financial_row.get("reports_with_loss"),
        };

        Ok(CorpusStats {
            total_reports,
            by_status,
            by_type,
            top_websites,
            daily_counts,
            financial,
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
