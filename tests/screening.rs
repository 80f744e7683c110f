//! Screening pipeline behavior: duplicates, scam-database rejection, email
//! verification, high-target flagging, and the out-of-band partner check.

mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use common::TestApp;
use scamwatch::domain::report::{ReportStatus, ScammerInfo};
use serde_json::json;

#[tokio::test]
async fn new_report_is_pending_and_queued_for_manual_review() {
    let app = TestApp::new();

    let id = app.submit_report("Fake invoice email", "Asked me to pay a fake invoice").await;

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "pending");
    assert_eq!(report["validation"]["step"].as_str().unwrap(), "manual_review");
}

#[tokio::test]
async fn duplicate_report_halts_before_verification() {
    let app = TestApp::new();

    let _a = app.submit_report("X", "Y").await;
    let b = app.submit_report("X", "Y").await;

    // B is created but initial screening halted: still pending, no pipeline
    // progress recorded.
    let report = app.fetch_report(b).await;
    assert_eq!(report["status"].as_str().unwrap(), "pending");
    assert!(report["validation"]["step"].is_null());
}

#[tokio::test]
async fn scam_database_match_rejects_report() {
    let app = TestApp::new();
    app.scam_db.matched.store(true, Ordering::SeqCst);

    let id = app.submit_report("Known ponzi outfit", "Same pitch as the catalogued one").await;

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "rejected");
    assert_eq!(
        report["validation"]["comments"].as_str().unwrap(),
        "Matched known scam database"
    );
}

#[tokio::test]
async fn invalid_scammer_email_halts_without_rejecting() {
    let app = TestApp::new();
    app.email_verifier.valid.store(false, Ordering::SeqCst);

    let resp = app
        .submit_report_raw(json!({
            "title": "Crypto doubler",
            "description": "Promised to double deposits in a week",
            "scam_type": "crypto",
            "scammer": { "email": "bounce@nowhere.example" },
        }))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let id = resp.json()["id"].as_str().unwrap().parse().unwrap();

    let report = app.fetch_report(id).await;
    // Status untouched; only the comment records the failed check.
    assert_eq!(report["status"].as_str().unwrap(), "pending");
    assert_eq!(
        report["validation"]["comments"].as_str().unwrap(),
        "Scammer email failed verification"
    );
    assert_eq!(
        report["validation"]["step"].as_str().unwrap(),
        "automated_verification"
    );
}

#[tokio::test]
async fn recurring_scammer_phone_flags_high_target() {
    let app = TestApp::new();
    app.seed_phone_corpus("+1 (555) 717-2020", 20).await;

    let resp = app
        .submit_report_raw(json!({
            "title": "Same caller again",
            "description": "Number called claiming to be my bank",
            "scam_type": "phishing",
            "scammer": { "phone": "+1 (555) 717-2020" },
        }))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let id = resp.json()["id"].as_str().unwrap().parse().unwrap();

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "under_review");
    assert_eq!(
        report["validation"]["comments"].as_str().unwrap(),
        "Profile flagged as high target scammer"
    );
}

#[tokio::test]
async fn few_recurrences_queue_for_manual_review() {
    let app = TestApp::new();
    app.seed_phone_corpus("+1 (555) 717-2021", 5).await;

    let resp = app
        .submit_report_raw(json!({
            "title": "Suspicious caller",
            "description": "Offered a fake refund",
            "scam_type": "tech_support",
            "scammer": { "phone": "+1 (555) 717-2021" },
        }))
        .await;
    let id = resp.json()["id"].as_str().unwrap().parse().unwrap();

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "pending");
    assert_eq!(report["validation"]["step"].as_str().unwrap(), "manual_review");
}

#[tokio::test]
async fn unreachable_scam_database_leaves_report_intact() {
    let app = TestApp::new();
    app.scam_db.fail.store(true, Ordering::SeqCst);

    // Submission still succeeds; the stage failure is contained.
    let id = app.submit_report("Gift card demand", "Caller demanded gift cards").await;

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "pending");
    // Initial screening had already recorded its progress; the errored
    // verification stage persisted nothing.
    assert_eq!(
        report["validation"]["step"].as_str().unwrap(),
        "automated_verification"
    );
    assert!(report["validation"]["comments"].is_null());
}

#[tokio::test]
async fn partner_check_approves_and_marks_verified() {
    let app = TestApp::new();
    app.partner.verified.store(true, Ordering::SeqCst);

    let id = app.submit_report("Rental deposit scam", "Landlord vanished with the deposit").await;

    let resp = app
        .post_moderator(&format!("/v1/scams/{}/verify-partner", id), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["success"].as_bool().unwrap(), true);

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "approved");
    assert_eq!(report["verified"].as_bool().unwrap(), true);
    assert_eq!(
        report["validation"]["comments"].as_str().unwrap(),
        "Verified by partner network"
    );
}

#[tokio::test]
async fn partner_check_failure_leaves_status_unchanged() {
    let app = TestApp::new();

    let id = app.submit_report("Lottery fee upfront", "Asked for a fee to release winnings").await;

    let resp = app
        .post_moderator(&format!("/v1/scams/{}/verify-partner", id), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["success"].as_bool().unwrap(), false);

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "pending");
}

#[tokio::test]
async fn partner_check_requires_moderator_token() {
    let app = TestApp::new();
    let id = app.submit_report("Charity front", "Collected donations for nothing").await;

    let resp = app
        .request(
            axum::http::Method::POST,
            &format!("/v1/scams/{}/verify-partner", id),
            None,
            &[],
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn partner_check_unknown_report_is_404() {
    let app = TestApp::new();

    let resp = app
        .post_moderator(
            &format!("/v1/scams/{}/verify-partner", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overlap_count_mixes_email_phone_and_name() {
    let app = TestApp::new();
    // 10 by phone + 10 by name, none by email.
    app.seed_phone_corpus("+1 (555) 717-2022", 10).await;
    for i in 0..10 {
        app.seed_report(
            &format!("named corpus #{}", i),
            ScammerInfo {
                name: Some("Grim Lender LLC".to_string()),
                ..Default::default()
            },
            ReportStatus::Pending,
        )
        .await;
    }

    let resp = app
        .submit_report_raw(json!({
            "title": "Loan upfront fees",
            "description": "Charged fees and never funded the loan",
            "scam_type": "investment",
            "scammer": {
                "phone": "+1 (555) 717-2022",
                "name": "Grim Lender LLC",
            },
        }))
        .await;
    let id = resp.json()["id"].as_str().unwrap().parse().unwrap();

    let report = app.fetch_report(id).await;
    assert_eq!(report["status"].as_str().unwrap(), "under_review");
}
