use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::app::reports::{NewReport, ReportService};
use crate::app::risk::{BlacklistInfo, RiskEngine};
use crate::app::screening::ScreeningPipeline;
use crate::app::search::{Pagination, ScoredReport, SearchParams, SearchService};
use crate::domain::report::{
    FinancialLoss, Report, ReportStatus, ScamType, ScammerInfo,
};
use crate::http::{AppError, ModeratorToken};
use crate::infra::store::CorpusStats;
use crate::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store.ping().await.is_ok();
    let status = if store { "ok" } else { "degraded" };
    Json(HealthResponse { status })
}

#[derive(Deserialize)]
pub struct CreateReportRequest {
    pub title: String,
    pub description: String,
    pub scam_type: String,
    #[serde(default, with = "crate::domain::report::date_string")]
    pub date_occurred: Option<Date>,
    #[serde(default)]
    pub scammer: Option<ScammerInfo>,
    #[serde(default)]
    pub financial_loss: Option<FinancialLoss>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct CreateReportResponse {
    pub id: Uuid,
    pub status: ReportStatus,
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<CreateReportResponse>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title cannot be empty"));
    }
    if payload.title.len() > MAX_TITLE_LEN {
        return Err(AppError::bad_request("title must be at most 200 characters"));
    }
    if payload.description.trim().is_empty() {
        return Err(AppError::bad_request("description cannot be empty"));
    }
    if payload.description.len() > MAX_DESCRIPTION_LEN {
        return Err(AppError::bad_request(
            "description must be at most 5000 characters",
        ));
    }
    let Some(scam_type) = ScamType::from_db(&payload.scam_type) else {
        return Err(AppError::bad_request("unknown scam_type"));
    };
    let scammer = payload.scammer.unwrap_or_default();
    if let Some(email) = scammer.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(AppError::bad_request("scammer email is invalid"));
        }
    }
    if let Some(loss) = &payload.financial_loss {
        if !loss.amount.is_finite() || loss.amount < 0.0 {
            return Err(AppError::bad_request(
                "financial loss amount must be non-negative",
            ));
        }
        if loss.currency.trim().is_empty() {
            return Err(AppError::bad_request("financial loss currency is required"));
        }
    }

    let service = ReportService::new(state.store.clone());
    let report = service
        .create(NewReport {
            title: payload.title.trim().to_string(),
            description: payload.description.trim().to_string(),
            scam_type,
            scammer,
            financial_loss: payload.financial_loss,
            tags: payload.tags,
            date_occurred: payload.date_occurred,
        })
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to create report");
            AppError::internal("failed to create report")
        })?;

    // Screening outcomes are deliberately not surfaced to the submitter;
    // halt reasons land in moderator-visible validation comments and logs.
    let pipeline = ScreeningPipeline::new(
        state.store.clone(),
        state.scam_db.clone(),
        state.email_verifier.clone(),
        state.partner_verifier.clone(),
        state.screening,
    );
    match pipeline.run(report.id).await {
        Ok(outcome) => {
            tracing::debug!(
                report_id = %report.id,
                success = outcome.success,
                message = %outcome.message,
                "screening finished"
            );
        }
        Err(err) => {
            tracing::error!(report_id = %report.id, error = ?err, "screening pipeline failed");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateReportResponse {
            id: report.id,
            status: ReportStatus::Pending,
        }),
    ))
}

pub async fn get_report(
    Path(id): Path<Uuid>,
    moderator: Option<ModeratorToken>,
    State(state): State<AppState>,
) -> Result<Json<Report>, AppError> {
    let service = ReportService::new(state.store.clone());
    let report = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, report_id = %id, "failed to fetch report");
        AppError::internal("failed to fetch report")
    })?;

    match report {
        Some(report)
            if moderator.is_some() || report.status == ReportStatus::Approved =>
        {
            Ok(Json(report))
        }
        _ => Err(AppError::not_found("report not found")),
    }
}

#[derive(Deserialize)]
pub struct SearchRequestQuery {
    pub q: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub business_name: Option<String>,
    pub scam_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredReport>,
    pub pagination: Pagination,
    pub blacklist: BlacklistInfo,
}

pub async fn search_reports(
    State(state): State<AppState>,
    Query(query): Query<SearchRequestQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let scam_type = match query.scam_type.as_deref() {
        Some(raw) => Some(
            ScamType::from_db(raw).ok_or_else(|| AppError::bad_request("unknown scam_type"))?,
        ),
        None => None,
    };
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::bad_request("page must be at least 1"));
    }
    let limit = query.limit.unwrap_or(20);
    if !(1..=100).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 100"));
    }

    let params = SearchParams {
        q: query.q,
        email: query.email,
        phone: query.phone,
        website: query.website,
        business_name: query.business_name,
        scam_type,
        page,
        limit,
    };
    if !params.has_criteria() {
        return Err(AppError::bad_request(
            "at least one search criterion is required",
        ));
    }

    let search_service = SearchService::new(state.store.clone(), state.activity.clone());
    let risk_engine = RiskEngine::new(state.store.clone(), state.risk_thresholds);

    // The advisory is best-effort and never fails the search; run both
    // against the store concurrently.
    let risk_query = params.risk_query();
    let (search_result, blacklist) =
        tokio::join!(search_service.search(&params), risk_engine.assess(&risk_query));

    let (results, pagination) = search_result.map_err(|err| {
        tracing::error!(error = ?err, "search failed");
        AppError::internal("search failed")
    })?;

    Ok(Json(SearchResponse {
        results,
        pagination,
        blacklist,
    }))
}

pub async fn search_stats(
    State(state): State<AppState>,
) -> Result<Json<CorpusStats>, AppError> {
    let service = ReportService::new(state.store.clone());
    let stats = service.stats().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to compute search stats");
        AppError::internal("failed to compute search stats")
    })?;
    Ok(Json(stats))
}

#[derive(Deserialize)]
pub struct ModerateRequest {
    pub status: String,
    pub notes: Option<String>,
}

pub async fn moderate_report(
    Path(id): Path<Uuid>,
    _moderator: ModeratorToken,
    State(state): State<AppState>,
    Json(payload): Json<ModerateRequest>,
) -> Result<StatusCode, AppError> {
    let status = ReportStatus::from_db(&payload.status)
        .filter(|status| *status != ReportStatus::Pending)
        .ok_or_else(|| {
            AppError::bad_request("status must be approved, rejected, or under_review")
        })?;

    let service = ReportService::new(state.store.clone());
    let updated = service
        .moderate(id, status, payload.notes.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = %id, "failed to moderate report");
            AppError::internal("failed to moderate report")
        })?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("report not found"))
    }
}

#[derive(Serialize)]
pub struct PartnerCheckResponse {
    pub success: bool,
    pub message: String,
}

pub async fn verify_partner(
    Path(id): Path<Uuid>,
    _moderator: ModeratorToken,
    State(state): State<AppState>,
) -> Result<Json<PartnerCheckResponse>, AppError> {
    let exists = state
        .store
        .fetch(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = %id, "failed to fetch report");
            AppError::internal("failed to fetch report")
        })?
        .is_some();
    if !exists {
        return Err(AppError::not_found("report not found"));
    }

    let pipeline = ScreeningPipeline::new(
        state.store.clone(),
        state.scam_db.clone(),
        state.email_verifier.clone(),
        state.partner_verifier.clone(),
        state.screening,
    );
    let outcome = pipeline.partner_check(id).await.map_err(|err| {
        tracing::error!(error = ?err, report_id = %id, "partner check failed");
        AppError::internal("partner check failed")
    })?;

    Ok(Json(PartnerCheckResponse {
        success: outcome.success,
        message: outcome.message,
    }))
}
