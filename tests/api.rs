//! HTTP API exercised in-process with local-only components.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Local, NaiveDate};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use study_planner::api::{router, AppState};
use study_planner::planner::StudyPlanGenerator;
use study_planner::storage::MemoryTaskStore;
use study_planner::task::{at_deadline_hour, TaskExtractor};

fn app() -> Router {
    router(Arc::new(AppState {
        extractor: TaskExtractor::local_only(),
        planner: StudyPlanGenerator::local_only(),
        store: Arc::new(MemoryTaskStore::new()),
        remote_enabled: false,
    }))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_remote_disabled() {
    let (status, body) = send(&app(), Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["remote_enabled"], false);
}

#[tokio::test]
async fn parse_uses_heuristic_without_remote() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/tasks/parse",
        Some(json!({"text": "Urgent: calculus homework, 90 min, tomorrow"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "heuristic");
    assert_eq!(body["task"]["title"], "Urgent: calculus homework");
    assert_eq!(body["task"]["priority"], "high");
    assert_eq!(body["task"]["duration"], 90);
    assert_eq!(
        body["summary"],
        "Urgent: calculus homework [High] 1h 30m, due tomorrow at 6:00 PM"
    );
}

#[tokio::test]
async fn quick_add_then_list() {
    let app = app();
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/tasks/quick",
        Some(json!({"text": "read chapter 4 for 30 min"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");

    let (status, tasks) = send(&app, Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["id"], created["id"]);
}

#[tokio::test]
async fn create_rejects_blank_title() {
    let (status, _) = send(
        &app(),
        Method::POST,
        "/api/tasks",
        Some(json!({
            "title": "   ",
            "duration": 30,
            "deadline": "2024-01-02T18:00:00+00:00",
            "priority": "low"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_clamps_duration() {
    let (status, created) = send(
        &app(),
        Method::POST,
        "/api/tasks",
        Some(json!({
            "title": " Thesis ",
            "duration": 1000,
            "deadline": "2024-01-02T18:00:00+00:00",
            "priority": "high"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["duration"], 480);
    assert_eq!(created["title"], "Thesis");
}

#[tokio::test]
async fn update_and_delete_lifecycle() {
    let app = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({
            "title": "Lab report",
            "duration": 60,
            "deadline": "2024-01-02T18:00:00+00:00",
            "priority": "medium"
        })),
    )
    .await;
    let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"status": "completed", "duration": 5000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["duration"], 480);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({"title": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_for_date_filters_by_local_day() {
    let app = app();
    let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    for (title, date) in [("On the day", day), ("Day after", day.succ_opt().unwrap())] {
        let deadline = at_deadline_hour(date, &Local).unwrap();
        send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({
                "title": title,
                "duration": 45,
                "deadline": deadline.to_rfc3339(),
                "priority": "low"
            })),
        )
        .await;
    }

    let (status, tasks) = send(&app, Method::GET, "/api/tasks/date/2024-03-05", None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "On the day");

    let (status, _) = send(&app, Method::GET, "/api/tasks/date/not-a-date", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generated_plan_can_be_saved_and_fetched() {
    let app = app();
    let (status, plan) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"tasks": [], "save": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["schedule"].as_array().unwrap().len(), 5);
    assert_eq!(plan["schedule"][1]["break"], true);

    let uri = format!("/api/plans/{}", plan["date"].as_str().unwrap());
    let (status, stored) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["plan"], plan);
}

#[tokio::test]
async fn plan_accepts_minimal_task_shape() {
    let (status, plan) = send(
        &app(),
        Method::POST,
        "/api/plan",
        Some(json!({"tasks": [{
            "id": "p1",
            "title": "Physics",
            "duration": 90,
            "deadline": "2024-01-02T18:00:00Z",
            "priority": "high"
        }]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["schedule"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn plan_without_tasks_uses_stored_rows() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/tasks/quick",
        Some(json!({"text": "essay draft, 2 hours"})),
    )
    .await;
    let (status, plan) = send(&app, Method::POST, "/api/plan", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(plan["schedule"].is_array());
}

#[tokio::test]
async fn missing_plan_is_not_found() {
    let (status, _) = send(&app(), Method::GET, "/api/plans/2024-01-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_plan_replaces_by_date() {
    let app = app();
    let plan = json!({
        "date": "2024-01-01",
        "schedule": [{"start": "08:00", "end": "09:00", "task": "Read"}]
    });
    let (status, first) = send(&app, Method::PUT, "/api/plans/2024-01-01", Some(plan)).await;
    assert_eq!(status, StatusCode::OK);

    let replacement = json!({"date": "2024-01-01", "schedule": []});
    let (status, second) =
        send(&app, Method::PUT, "/api/plans/2024-01-01", Some(replacement)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["plan"]["schedule"], json!([]));
}
