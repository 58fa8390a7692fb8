use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::core::time::{minutes_ago, primitive_now_utc};
use crate::db::types::{AnalysisStatus, SubmissionType};
use crate::repositories;
use crate::services::{dispatch, maintenance};
use crate::test_support::{
    self, EchoAssessor, RejectingAssessor, SweepingAssessor, TestContext, UnreachableAssessor,
};

async fn count_rows(ctx: &TestContext, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(ctx.state.db())
        .await
        .expect("count rows")
}

async fn user_token(ctx: &TestContext, username: &str) -> (String, String) {
    let user = test_support::insert_user(ctx.state.db(), username, "Exam Taker", "taker-pass").await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());
    (user.id, token)
}

async fn post_json(
    ctx: &TestContext,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, uri, Some(token), Some(body)))
        .await
        .expect("post");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn get_json(ctx: &TestContext, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, uri, Some(token), None))
        .await
        .expect("get");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn writing_without_text_body_is_rejected_and_stores_nothing() {
    let ctx = test_support::setup_test_context().await;
    let (_, token) = user_token(&ctx, "writer01").await;

    for body in [json!({"topic": "Holidays"}), json!({"topic": "Holidays", "text_body": "  "})] {
        let (status, body) = post_json(&ctx, "/api/v1/submit/writing", &token, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
        assert_eq!(body["error"], "Text body is required");
    }

    assert_eq!(count_rows(&ctx, "submissions").await, 0);
    assert_eq!(count_rows(&ctx, "writing_submissions").await, 0);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let ctx = test_support::setup_test_context().await;
    let (_, token) = user_token(&ctx, "writer02").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/submit/writing")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request");
    let response = ctx.app.clone().oneshot(request).await.expect("post");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn writing_submission_completes_with_result() {
    let ctx = test_support::setup_test_context().await;
    let (user_id, token) = user_token(&ctx, "writer03").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/writing",
        &token,
        json!({"topic": "Holidays", "text_body": "I  love the\nmountains in winter"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["score"], 90.0);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["message"], "Writing submitted successfully");
    let submission_id = body["submission_id"].as_str().expect("submission id");

    let submission = repositories::submissions::find_owned(ctx.state.db(), &user_id, submission_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(submission.status, AnalysisStatus::Completed);
    assert_eq!(submission.submission_type, SubmissionType::Writing);
    assert!(submission.assessed_at.is_some());

    let details = repositories::submissions::find_writing_details(ctx.state.db(), submission_id)
        .await
        .expect("details")
        .expect("details exist");
    assert_eq!(details.word_count, 6);
    assert_eq!(details.topic, "Holidays");

    assert_eq!(count_rows(&ctx, "assessment_results").await, 1);
    let result = repositories::submissions::find_result(ctx.state.db(), submission_id)
        .await
        .expect("result")
        .expect("result exists");
    assert_eq!(result.grammar_score, Some(90.0));
    assert_eq!(result.pronunciation_score, None);
    assert_eq!(result.suggestions.0.len(), 3);
}

#[tokio::test]
async fn skill_scores_are_averaged_when_backend_omits_overall() {
    let ctx = test_support::setup_test_context_with_assessor(Arc::new(EchoAssessor)).await;
    let (_, token) = user_token(&ctx, "writer04").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/writing",
        &token,
        json!({"text_body": "one two three"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["score"], 72.5);

    let submission_id = body["submission_id"].as_str().expect("submission id");
    let (status, detail) =
        get_json(&ctx, &format!("/api/v1/submissions/{submission_id}"), &token).await;
    assert_eq!(status, StatusCode::OK, "response: {detail}");
    assert_eq!(detail["details"]["type"], "writing");
    assert_eq!(detail["details"]["topic"], "");
    assert_eq!(detail["result"]["feedback_summary"], "3 words");
}

#[tokio::test]
async fn failed_assessment_keeps_rows_as_failed() {
    let ctx = test_support::setup_test_context_with_assessor(Arc::new(UnreachableAssessor)).await;
    let (user_id, token) = user_token(&ctx, "writer05").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/writing",
        &token,
        json!({"topic": "Remote work", "text_body": "It saves commuting time"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "response: {body}");
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().unwrap_or_default().contains("unavailable"));

    let submission_id = body["submission_id"].as_str().expect("submission id");
    let submission = repositories::submissions::find_owned(ctx.state.db(), &user_id, submission_id)
        .await
        .expect("find")
        .expect("submission persisted");
    assert_eq!(submission.status, AnalysisStatus::Failed);
    assert!(submission.error_message.is_some());
    assert_eq!(submission.overall_score, None);

    assert_eq!(count_rows(&ctx, "writing_submissions").await, 1);
    assert_eq!(count_rows(&ctx, "assessment_results").await, 0);
}

#[tokio::test]
async fn listening_submission_stores_transcription() {
    let ctx = test_support::setup_test_context_with_assessor(Arc::new(EchoAssessor)).await;
    let (user_id, token) = user_token(&ctx, "speaker01").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/listening",
        &token,
        json!({
            "topic": "Childhood",
            "audio_url": "https://cdn.example.com/take1.webm",
            "duration_seconds": 41.5
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["message"], "Audio submitted successfully");
    assert_eq!(body["score"], 64.5);
    assert_eq!(body["transcription"], "heard https://cdn.example.com/take1.webm");

    let submission_id = body["submission_id"].as_str().expect("submission id");
    let details = repositories::submissions::find_listening_details(ctx.state.db(), submission_id)
        .await
        .expect("details")
        .expect("details exist");
    assert_eq!(details.duration_seconds, 41.5);
    assert_eq!(details.transcription.as_deref(), Some("heard https://cdn.example.com/take1.webm"));

    let submission = repositories::submissions::find_owned(ctx.state.db(), &user_id, submission_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(submission.submission_type, SubmissionType::Listening);
    assert_eq!(submission.status, AnalysisStatus::Completed);
}

#[tokio::test]
async fn listening_requires_audio_url_and_valid_duration() {
    let ctx = test_support::setup_test_context().await;
    let (_, token) = user_token(&ctx, "speaker02").await;

    let (status, body) =
        post_json(&ctx, "/api/v1/submit/listening", &token, json!({"topic": "Goals"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["error"], "Audio URL is required");

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/listening",
        &token,
        json!({"audio_url": "audio/x/1.mp3", "duration_seconds": -4}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    assert_eq!(count_rows(&ctx, "submissions").await, 0);
}

#[tokio::test]
async fn listening_duration_defaults_to_zero() {
    let ctx = test_support::setup_test_context().await;
    let (user_id, token) = user_token(&ctx, "speaker03").await;
    let key = format!("audio/{user_id}/take.mp3");

    let (status, body) =
        post_json(&ctx, "/api/v1/submit/listening", &token, json!({"audio_url": key})).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert!(body["transcription"].is_null());

    let submission_id = body["submission_id"].as_str().expect("submission id");
    let details = repositories::submissions::find_listening_details(ctx.state.db(), submission_id)
        .await
        .expect("details")
        .expect("details exist");
    assert_eq!(details.duration_seconds, 0.0);
    assert_eq!(details.audio_url, key);
}

#[tokio::test]
async fn listening_rejects_another_users_audio_key() {
    let ctx = test_support::setup_test_context_with_assessor(Arc::new(EchoAssessor)).await;
    let (owner_id, _) = user_token(&ctx, "speaker04").await;
    let (_, other_token) = user_token(&ctx, "speaker05").await;

    for key in [
        format!("audio/{owner_id}/take.mp3"),
        "audio/../private/take.mp3".to_string(),
        "backups/dump.sql".to_string(),
    ] {
        let (status, body) = post_json(
            &ctx,
            "/api/v1/submit/listening",
            &other_token,
            json!({"topic": "Childhood", "audio_url": key}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
        assert_eq!(body["error"], "Audio URL does not reference your upload");
    }

    assert_eq!(count_rows(&ctx, "submissions").await, 0);
}

#[tokio::test]
async fn nul_in_text_body_is_bad_request() {
    let ctx = test_support::setup_test_context().await;
    let (_, token) = user_token(&ctx, "writer06").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/writing",
        &token,
        json!({"topic": "Holidays", "text_body": "broken\u{0}essay"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["error"], "text_body must not contain NUL characters");
    assert_eq!(count_rows(&ctx, "submissions").await, 0);
}

#[tokio::test]
async fn declined_assessment_reports_backend_reason() {
    let ctx = test_support::setup_test_context_with_assessor(Arc::new(RejectingAssessor(
        "No speech detected",
    )))
    .await;
    let (_, token) = user_token(&ctx, "speaker06").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/listening",
        &token,
        json!({"topic": "Goals", "audio_url": "https://cdn.example.com/silence.webm"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "response: {body}");
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "No speech detected");

    let submission_id = body["submission_id"].as_str().expect("submission id");
    let submission = repositories::submissions::find_by_id(ctx.state.db(), submission_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(submission.status, AnalysisStatus::Failed);
    assert_eq!(submission.error_message.as_deref(), Some("No speech detected"));
}

#[tokio::test]
async fn submission_swept_during_assessment_stays_failed() {
    let ctx = test_support::setup_test_context_with_pool_assessor(|pool| {
        Arc::new(SweepingAssessor { pool: pool.clone() })
    })
    .await;
    let (_, token) = user_token(&ctx, "writer07").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/writing",
        &token,
        json!({"text_body": "slow to assess"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "response: {body}");
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], maintenance::STALE_SUBMISSION_MESSAGE);

    let submission_id = body["submission_id"].as_str().expect("submission id");
    let submission = repositories::submissions::find_by_id(ctx.state.db(), submission_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(submission.status, AnalysisStatus::Failed);
    assert_eq!(submission.overall_score, None);
    assert_eq!(count_rows(&ctx, "assessment_results").await, 0);
}

#[tokio::test]
async fn unstorable_result_marks_submission_failed() {
    let ctx = test_support::setup_test_context().await;
    let (user_id, token) = user_token(&ctx, "writer08").await;

    sqlx::query("DROP TABLE assessment_results")
        .execute(ctx.state.db())
        .await
        .expect("drop results table");

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/writing",
        &token,
        json!({"text_body": "nowhere to keep the score"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "response: {body}");
    assert_eq!(body["status"], 500);

    let submission_id: String =
        sqlx::query_scalar("SELECT id FROM submissions WHERE user_id = $1")
            .bind(&user_id)
            .fetch_one(ctx.state.db())
            .await
            .expect("stored submission");

    let submission = repositories::submissions::find_owned(ctx.state.db(), &user_id, &submission_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(submission.status, AnalysisStatus::Failed);
    assert_eq!(submission.overall_score, None);
    assert_eq!(submission.error_message.as_deref(), Some(dispatch::PERSIST_FAILED_MESSAGE));
}

#[tokio::test]
async fn detail_of_foreign_submission_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let (_, owner_token) = user_token(&ctx, "owner01").await;
    let (_, other_token) = user_token(&ctx, "other01").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/writing",
        &owner_token,
        json!({"text_body": "Private essay"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    let submission_id = body["submission_id"].as_str().expect("submission id").to_string();

    let (status, body) =
        get_json(&ctx, &format!("/api/v1/submissions/{submission_id}"), &other_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "response: {body}");
    assert_eq!(body["error"], "Submission not found");

    let (status, _) =
        get_json(&ctx, &format!("/api/v1/submissions/{submission_id}"), &owner_token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_json(&ctx, "/api/v1/submissions/does-not-exist", &owner_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_lists_only_own_submissions_newest_first() {
    let ctx = test_support::setup_test_context().await;
    let (user_id, token) = user_token(&ctx, "dash01").await;
    let (_, other_token) = user_token(&ctx, "dash02").await;

    post_json(&ctx, "/api/v1/submit/writing", &token, json!({"text_body": "first essay"})).await;
    post_json(
        &ctx,
        "/api/v1/submit/listening",
        &token,
        json!({
            "topic": "Goals",
            "audio_url": format!("audio/{user_id}/a.mp3"),
            "duration_seconds": 12
        }),
    )
    .await;
    post_json(&ctx, "/api/v1/submit/writing", &other_token, json!({"text_body": "not yours"}))
        .await;

    let (status, body) = get_json(&ctx, "/api/v1/submissions", &token).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["total_count"], 2);
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["submission_type"], "listening");
    assert_eq!(items[0]["topic"], "Goals");
    assert_eq!(items[1]["submission_type"], "writing");
    assert_eq!(items[1]["word_count"], 2);
    assert!(items.iter().all(|item| item["has_result"] == true));

    let (status, body) = get_json(&ctx, "/api/v1/submissions?type=writing&limit=0", &token).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["limit"], 1);

    let (status, body) = get_json(&ctx, "/api/v1/submissions?status=failed", &token).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["total_count"], 0);

    let (status, _) = get_json(&ctx, "/api/v1/submissions?status=bogus", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stale_in_progress_submissions_are_failed() {
    let ctx = test_support::setup_test_context().await;
    let (user_id, _) = user_token(&ctx, "stale01").await;
    let now = primitive_now_utc();

    for (id, age_minutes) in [("stale-old", 120), ("stale-fresh", 1)] {
        repositories::submissions::create_writing(
            ctx.state.db(),
            repositories::submissions::NewWritingSubmission {
                id,
                user_id: &user_id,
                topic: "",
                text_body: "left behind",
                word_count: 2,
                status: AnalysisStatus::InProgress,
                created_at: minutes_ago(now, age_minutes),
            },
        )
        .await
        .expect("insert submission");
    }

    let failed = maintenance::fail_stale_submissions(&ctx.state).await.expect("sweep");
    assert_eq!(failed, 1);

    let old = repositories::submissions::find_by_id(ctx.state.db(), "stale-old")
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(old.status, AnalysisStatus::Failed);
    assert_eq!(old.error_message.as_deref(), Some(maintenance::STALE_SUBMISSION_MESSAGE));

    let fresh = repositories::submissions::find_by_id(ctx.state.db(), "stale-fresh")
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(fresh.status, AnalysisStatus::InProgress);
}

#[tokio::test]
async fn completed_submission_cannot_be_failed_later() {
    let ctx = test_support::setup_test_context().await;
    let (_, token) = user_token(&ctx, "terminal01").await;

    let (_, body) =
        post_json(&ctx, "/api/v1/submit/writing", &token, json!({"text_body": "done"})).await;
    let submission_id = body["submission_id"].as_str().expect("submission id");

    let marked = repositories::submissions::mark_failed(
        ctx.state.db(),
        submission_id,
        "late failure",
        primitive_now_utc(),
    )
    .await
    .expect("mark failed");
    assert!(!marked);

    let submission = repositories::submissions::find_by_id(ctx.state.db(), submission_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(submission.status, AnalysisStatus::Completed);
}

#[tokio::test]
async fn upload_url_requires_storage() {
    let ctx = test_support::setup_test_context().await;
    let (_, token) = user_token(&ctx, "upload01").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/listening/upload-url",
        &token,
        json!({"filename": "take.mp3", "content_type": "audio/mpeg"}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "response: {body}");
}

#[tokio::test]
async fn upload_url_issues_user_scoped_key() {
    let ctx = test_support::setup_test_context_with_storage().await;
    let (user_id, token) = user_token(&ctx, "upload02").await;

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/listening/upload-url",
        &token,
        json!({"filename": "take.webm", "content_type": "audio/webm"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["method"], "PUT");
    let key = body["audio_url"].as_str().expect("key");
    assert!(key.starts_with(&format!("audio/{user_id}/")));
    assert!(key.ends_with(".webm"));
    assert!(body["upload_url"].as_str().unwrap_or_default().contains(&user_id));

    let (status, body) = post_json(
        &ctx,
        "/api/v1/submit/listening/upload-url",
        &token,
        json!({"filename": "take.exe", "content_type": "application/octet-stream"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}

#[tokio::test]
async fn ping_reports_service() {
    let ctx = test_support::setup_test_context().await;
    let (_, token) = user_token(&ctx, "pinger01").await;

    let (status, body) = get_json(&ctx, "/api/v1/ping", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"service": "langexam", "ok": true}));
}
