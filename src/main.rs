use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scamwatch::config::thresholds::{RiskThresholds, ScreeningConfig};
use scamwatch::config::AppConfig;
use scamwatch::infra::store::PgReportStore;
use scamwatch::infra::verify::{
    verification_client, ActivityLogger, HttpActivityLogger, HttpEmailVerifier,
    HttpPartnerVerifier, HttpScamDatabase, TracingActivityLogger,
};
use scamwatch::{http, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store = PgReportStore::connect(&config).await?;
    let client = verification_client(config.verify_timeout_seconds)?;

    let activity: Arc<dyn ActivityLogger> = match &config.activity_log_url {
        Some(url) => Arc::new(HttpActivityLogger::new(client.clone(), url)?),
        None => Arc::new(TracingActivityLogger),
    };

    let state = AppState {
        store: Arc::new(store),
        scam_db: Arc::new(HttpScamDatabase::new(client.clone(), &config.scam_db_url)?),
        email_verifier: Arc::new(HttpEmailVerifier::new(
            client.clone(),
            &config.email_verify_url,
        )?),
        partner_verifier: Arc::new(HttpPartnerVerifier::new(
            client.clone(),
            &config.partner_verify_url,
        )?),
        activity,
        risk_thresholds: RiskThresholds::default(),
        screening: ScreeningConfig::default(),
        moderator_token: config.moderator_token.clone(),
    };

    let app: Router = http::router(state).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!("listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
