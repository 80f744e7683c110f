pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::sync::Arc;

use crate::config::thresholds::{RiskThresholds, ScreeningConfig};
use crate::infra::store::ReportStore;
use crate::infra::verify::{ActivityLogger, EmailVerifier, PartnerVerifier, ScamDatabase};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReportStore>,
    pub scam_db: Arc<dyn ScamDatabase>,
    pub email_verifier: Arc<dyn EmailVerifier>,
    pub partner_verifier: Arc<dyn PartnerVerifier>,
    pub activity: Arc<dyn ActivityLogger>,
    pub risk_thresholds: RiskThresholds,
    pub screening: ScreeningConfig,
    pub moderator_token: Option<String>,
}
