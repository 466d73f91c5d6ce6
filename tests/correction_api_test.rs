use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    routing::{get, post},
    Router,
};
use correction_backend::{config::Config, routes, AppState};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config {
        max_batch_size: 5,
        ..Config::default()
    };
    let state = AppState::new(&config);
    Router::new()
        .route("/api/templates", post(routes::templates::create_template))
        .route("/api/correct/single", post(routes::correction::correct_single))
        .route("/api/correct/batch", post(routes::correction::correct_batch))
        .route("/api/results", get(routes::correction::list_results))
        .route(
            "/api/results/:id/report",
            get(routes::correction::get_report),
        )
        .route(
            "/api/analytics/:template_id",
            get(routes::reports::class_analytics),
        )
        .route("/api/reports/summary", get(routes::reports::summary))
        .route("/api/export/:format", get(routes::export::export_results))
        .with_state(state)
}

async fn post_json(app: &Router, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, JsonValue) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_quiz(app: &Router) -> String {
    let (status, body) = post_json(
        app,
        "/api/templates",
        json!({
            "name": "Physics quiz",
            "questions": [
                { "type": "true_false", "correct_answers": ["V"] },
                { "type": "multiple_choice", "options": ["A", "B", "C", "D"], "correct_answers": ["B"] },
                { "type": "numeric", "correct_answers": ["9.8"], "error_margin": 0.1, "weight": 2.0 },
                { "type": "short_text", "correct_answers": ["Newton"] }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["templates"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn single_true_false_quiz_scores_on_the_default_scale() {
    let app = app();
    let (_, body) = post_json(
        &app,
        "/api/templates",
        json!({
            "name": "Quiz",
            "questions": [{ "type": "true_false", "correct_answers": ["V"] }]
        }),
    )
    .await;
    let template_id = body["templates"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        "/api/correct/single",
        json!({ "template_id": template_id, "student_id": "ana", "answers": { "1": "V" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["score"], 10.0);
    assert_eq!(body["result"]["letter_grade"], "A");

    let (_, body) = post_json(
        &app,
        "/api/correct/single",
        json!({ "template_id": template_id, "student_id": "bruno", "answers": { "1": "F" } }),
    )
    .await;
    assert_eq!(body["result"]["score"], 0.0);
    assert_eq!(body["result"]["letter_grade"], "F");
    assert_eq!(body["report"]["passed"], false);
}

#[tokio::test]
async fn correction_report_and_malformed_answers() {
    let app = app();
    let template_id = create_quiz(&app).await;

    let (status, body) = post_json(
        &app,
        "/api/correct/single",
        json!({
            "template_id": template_id,
            "student_id": "carla",
            "answers": { "1": "verdadeiro", "2": "b", "3": "9,75", "4": "  NEWTON " }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["percentage"], 100.0);
    assert_eq!(body["result"]["correct_answers"], 4);
    let result_id = body["result"]["id"].as_str().unwrap().to_string();

    let (status, report) = get_json(&app, &format!("/api/results/{}/report", result_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["template_name"], "Physics quiz");
    assert_eq!(report["wrong_questions"].as_array().unwrap().len(), 0);

    let (status, body) = post_json(
        &app,
        "/api/correct/single",
        json!({
            "template_id": template_id,
            "student_id": "diego",
            "answers": { "1": "maybe", "2": "Z", "3": ["9.8", "9.7"], "4": "Galileu" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reasons: Vec<&str> = body["result"]["malformed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["reason"].as_str().unwrap())
        .collect();
    assert_eq!(reasons, vec!["not_true_false", "unknown_option", "several_values"]);
    assert_eq!(body["result"]["earned"], 0.0);
    assert_eq!(body["report"]["wrong_questions"], json!([1, 2, 3, 4]));
}

#[tokio::test]
async fn payload_validation_and_unknown_templates() {
    let app = app();
    let template_id = create_quiz(&app).await;

    let (status, _) = post_json(
        &app,
        "/api/correct/single",
        json!({ "template_id": template_id, "student_id": "", "answers": {} }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/correct/single",
        json!({
            "template_id": "00000000-0000-4000-8000-000000000000",
            "student_id": "eva",
            "answers": {}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(&app, "/api/correct/batch", json!({ "submissions": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_analytics_summary_and_export() {
    let app = app();
    let template_id = create_quiz(&app).await;

    let (status, body) = post_json(
        &app,
        "/api/correct/batch",
        json!({
            "submissions": [
                { "template_id": template_id, "student_id": "s1", "answers": { "1": "V", "2": "B", "3": "9.8", "4": "Newton" } },
                { "template_id": template_id, "student_id": "s2", "answers": { "1": "V", "2": "B", "3": "9.8" } },
                { "template_id": template_id, "student_id": "s3", "answers": { "1": "F", "2": "A" } },
                { "template_id": "00000000-0000-4000-8000-000000000000", "student_id": "s4", "answers": {} }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["corrected"], 3);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["entries"][3]["status"], "failed");

    let (status, body) = get_json(&app, &format!("/api/results?template_id={}", template_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, analytics) = get_json(&app, &format!("/api/analytics/{}", template_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["total_students"], 3);
    assert_eq!(analytics["highest_percentage"], 100.0);
    assert_eq!(analytics["lowest_percentage"], 0.0);
    assert_eq!(analytics["grade_distribution"]["A"], 1);

    let (_, summary) = get_json(&app, "/api/reports/summary").await;
    assert_eq!(summary["templates"], 1);
    assert_eq!(summary["tests_corrected"], 3);

    let (status, doc) = get_json(&app, "/api/export/json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["total_results"], 3);

    let request = Request::builder()
        .uri("/api/export/xlsx")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));

    let (status, _) = get_json(&app, "/api/export/csv").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let app = app();
    let template_id = create_quiz(&app).await;
    let submissions: Vec<JsonValue> = (0..6)
        .map(|i| {
            json!({ "template_id": template_id, "student_id": format!("s{}", i), "answers": {} })
        })
        .collect();

    let (status, body) = post_json(
        &app,
        "/api/correct/batch",
        json!({ "submissions": submissions }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit of 5"));
}
