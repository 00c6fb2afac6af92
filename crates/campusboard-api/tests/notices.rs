mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use campusboard_entity::UserRole;
use helpers::{TestApp, drain};

#[tokio::test]
async fn test_create_notice_broadcasts() {
    let app = TestApp::new();
    let a = app.user("A", UserRole::Faculty);
    let viewer = app.user("V", UserRole::Student);
    let (_conn, mut rx) = app.connect(&viewer);

    let notice = app.create_notice(&a, "Midterm dates").await;

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["event"], "notice-update");
    assert_eq!(frames[1]["event"], "new-notice");
    assert_eq!(frames[1]["data"]["notice"]["id"], notice["id"]);
    assert_eq!(frames[1]["data"]["message"], "New exam notice posted");
}

#[tokio::test]
async fn test_students_cannot_post_notices() {
    let app = TestApp::new();
    let student = app.user("S", UserRole::Student);
    let (status, body) = app
        .post(
            "/api/notices",
            &student,
            json!({ "title": "x", "content": "y", "category": "z" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_invalid_notice_is_rejected() {
    let app = TestApp::new();
    let a = app.user("A", UserRole::Faculty);
    let (status, body) = app
        .post(
            "/api/notices",
            &a,
            json!({ "title": "", "content": "y", "category": "z" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_public_feed_filters_by_department() {
    let app = TestApp::new();
    let a = app.user("A", UserRole::Faculty);
    app.create_notice(&a, "Civil only").await;
    app.post(
        "/api/notices",
        &a,
        json!({ "title": "Everyone", "content": "c", "category": "event" }),
    )
    .await;

    let (status, body) = app.get("/api/notices?department=Electronics", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Everyone".to_string()]);

    let (_, all) = app.get("/api/notices?limit=5", None).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_and_delete_notice() {
    let app = TestApp::new();
    let a = app.user("A", UserRole::Faculty);
    let other = app.user("O", UserRole::Faculty);
    let notice = app.create_notice(&a, "Draft").await;
    let uri = format!("/api/notices/{}", notice["id"].as_str().unwrap());

    let (status, _) = app
        .put(&uri, &other, Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.put(&uri, &a, Some(json!({ "title": "Final" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Final");

    let (_conn, mut rx) = app.connect(&other);
    let (status, _) = app.delete(&uri, &a).await;
    assert_eq!(status, StatusCode::OK);
    let frames = drain(&mut rx);
    assert_eq!(frames[0]["event"], "notice-update");
    assert_eq!(frames[0]["data"]["noticeId"], notice["id"]);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();
    let a = app.user("A", UserRole::Faculty);
    let _conn = app.connect(&a);

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (_, detailed) = app.get("/api/health/detailed", None).await;
    assert_eq!(detailed["data"]["database"], "memory");
    assert_eq!(detailed["data"]["connections"], 1);
    assert_eq!(detailed["data"]["onlineUsers"], 1);
    assert_eq!(detailed["data"]["rooms"], 1);
}
