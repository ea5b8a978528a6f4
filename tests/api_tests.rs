//! HTTP API tests driving the router with `oneshot`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

use photowrapped::config::Config;
use photowrapped::db::Database;
use photowrapped::models::Session;
use photowrapped::scanner::PhotoExif;
use photowrapped::{build_router, AppState};

/// Two sessions in different categories, one with a RAW count.
fn setup_app() -> axum::Router {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();

    let photos = |prefix: &str, lens: &str, apertures: &[f64]| -> Vec<PhotoExif> {
        apertures
            .iter()
            .enumerate()
            .map(|(i, a)| PhotoExif {
                file_path: format!("/shoots/{}/{}.jpg", prefix, i),
                file_name: format!("{}.jpg", i),
                lens: Some(lens.to_string()),
                aperture: Some(*a),
                date_taken: NaiveDate::from_ymd_opt(2025, 4, 3)
                    .and_then(|d| d.and_hms_opt(18, 0, 0)),
                ..Default::default()
            })
            .collect()
    };

    let run = db
        .create_session(&Session {
            name: "01_-_2025-04-03".to_string(),
            category: Some("running".to_string()),
            group: Some("thesole".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 4, 3),
            total_raw_photos: Some(10),
            ..Default::default()
        })
        .unwrap();
    db.insert_photos(run, &photos("run", "FE 85mm F1.4 GM II", &[1.4, 1.4, 2.0]))
        .unwrap();
    db.refresh_session_totals(run).unwrap();

    let portraits = db
        .create_session(&Session {
            name: "studio".to_string(),
            category: Some("portraits".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 5, 10),
            ..Default::default()
        })
        .unwrap();
    db.insert_photos(portraits, &photos("studio", "24-70mm F2.8 DG DN", &[2.8, 4.0]))
        .unwrap();
    db.refresh_session_totals(portraits).unwrap();

    build_router(AppState::new(db, Config::default()))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health() {
    let app = setup_app();
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "photowrapped");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_analyze_all() {
    let app = setup_app();
    let response = app
        .oneshot(send_json("POST", "/api/analyze", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let analysis = &body["analysis"];
    assert_eq!(analysis["name"], "All Sessions");
    assert_eq!(analysis["total_photos"], 5);
    assert_eq!(analysis["lens_freq"]["FE 85mm F1.4 GM II"], 3);
    assert_eq!(analysis["hit_rate"], 30.0);
    assert!(body["task_id"].as_str().unwrap().starts_with("analyze-"));
}

#[tokio::test]
async fn test_analyze_with_filters_and_progress() {
    let app = setup_app();
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/analyze",
            json!({
                "scope": {"type": "all"},
                "filters": {"aperture": ["1.4"], "bogus": ["x"]},
                "task_id": "job-1"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let analysis = &body["analysis"];
    assert_eq!(analysis["total_photos"], 2);
    assert_eq!(analysis["aperture_freq"]["1.4"], 2);
    assert!(analysis["aperture_freq"].get("2.0").is_none());

    let sections = analysis["sections"].as_array().unwrap();
    let facets = sections
        .iter()
        .find(|s| s["section"] == "facets")
        .expect("facets section");
    // relaxed aperture facet still shows the other apertures
    assert_eq!(facets["facets"]["aperture"]["2.8"], 1);
    assert_eq!(facets["facets"]["category"]["portraits"]["photos"], 0);

    let response = app.oneshot(get("/api/progress/job-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let progress = extract_json(response.into_body()).await;
    assert_eq!(progress["status"], "complete");
    assert_eq!(progress["percentage"], 100);
}

#[tokio::test]
async fn test_progress_for_unknown_task() {
    let app = setup_app();
    let response = app.oneshot(get("/api/progress/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "unknown");
}

#[tokio::test]
async fn test_analyze_empty_scope_is_not_found() {
    let app = setup_app();
    let response = app
        .oneshot(send_json(
            "POST",
            "/api/analyze",
            json!({"scope": {"type": "category", "name": "weddings"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "EMPTY_SCOPE");
}

#[tokio::test]
async fn test_sessions_update_and_delete() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(get("/api/sessions?category=portraits"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    let id = sessions[0]["id"].as_i64().unwrap();
    assert!(sessions[0]["hit_rate"].is_null());

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/api/sessions/{}", id),
            json!({"total_raw_photos": 8}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["session"]["hit_rate"], 25.0);

    let response = app
        .clone()
        .oneshot(send_json("PUT", "/api/sessions/9999", json!({"name": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/database/overview")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_sessions"], 1);
    assert_eq!(body["total_photos"], 3);
}

#[tokio::test]
async fn test_categories_groups_and_lenses() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(get("/api/database/categories-groups"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["categories"], json!(["portraits", "running"]));
    assert_eq!(body["groups"], json!(["Ungrouped", "thesole"]));

    let response = app.oneshot(get("/api/lenses/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_lenses"], 2);
    assert_eq!(body["most_used"][0]["name"], "FE 85mm F1.4 GM II");
    assert_eq!(body["most_used"][0]["usage_count"], 3);
}

#[tokio::test]
async fn test_wrapped() {
    let app = setup_app();
    let response = app
        .oneshot(send_json(
            "POST",
            "/api/wrapped",
            json!({"category": "running", "group": "thesole"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["wrapped"]["total_sessions"], 1);
    assert_eq!(body["wrapped"]["months"][0]["month"], "2025-04");
    assert_eq!(body["wrapped"]["months"][0]["photos"], 3);
}

#[tokio::test]
async fn test_destructive_requests_need_input() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/database/reset", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/database/delete-category",
            json!({"categories": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/database/delete-group",
            json!({"groups": ["thesole"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["deleted"]["sessions"], 1);
    assert_eq!(body["deleted"]["photos"], 3);

    let response = app
        .oneshot(send_json("POST", "/api/database/reset", json!({"confirm": true})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["deleted"]["sessions"], 1);
}

#[tokio::test]
async fn test_extract_missing_folder() {
    let app = setup_app();
    let response = app
        .oneshot(send_json(
            "POST",
            "/api/extract",
            json!({"folder": "/definitely/not/here"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "FOLDER_NOT_FOUND");
}
