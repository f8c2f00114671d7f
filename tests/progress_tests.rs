use axum::http::{Method, StatusCode};
use serde_json::json;

use lingua_backend::db::progress;

mod common;

#[tokio::test]
async fn completing_and_uncompleting_a_lesson() {
    let app = common::create_test_app().await;
    let token = app.sign_up("progress@example.com").await;
    let lesson = app.lesson_id("japanese", "N5", 1).await;

    let (status, body) = app
        .request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": lesson, "isCompleted": true })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isCompleted"], true);
    assert!(body["completedAt"].is_string());

    let user_id = app.state.jwt.validate(&token).unwrap().sub;
    let row = progress::find(&app.state.db, &user_id, lesson).await.unwrap().unwrap();
    assert!(row.completed_at.is_some());

    let (status, body) = app
        .request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": lesson, "isCompleted": false })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isCompleted"], false);
    assert!(body["completedAt"].is_null());

    let row = progress::find(&app.state.db, &user_id, lesson).await.unwrap().unwrap();
    assert!(!row.is_completed);
    assert!(row.completed_at.is_none());
}

#[tokio::test]
async fn progress_input_errors() {
    let app = common::create_test_app().await;
    let token = app.sign_up("errors@example.com").await;

    let (status, body) = app
        .request(Method::POST, "/api/v1/progress", Some(json!({ "isCompleted": true })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "lessonId is required");

    let (status, _) = app
        .request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": 424242, "isCompleted": true })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post("/api/v1/progress", json!({ "lessonId": 1, "isCompleted": true })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn course_percentages_follow_completed_lessons() {
    let app = common::create_test_app().await;
    let token = app.sign_up("percent@example.com").await;

    for order in [1, 2] {
        let lesson = app.lesson_id("japanese", "N5", order).await;
        let (status, _) = app
            .request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": lesson, "isCompleted": true })), Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let started = app.lesson_id("chinese", "HSK1", 1).await;
    app.request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": started, "isCompleted": false })), Some(&token))
        .await;

    let (status, body) = app.request(Method::GET, "/api/v1/progress", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 2);

    let n5 = courses.iter().find(|c| c["level"] == "N5").unwrap();
    assert_eq!(n5["totalLessons"], 3);
    assert_eq!(n5["completedLessons"], 2);
    let pct = n5["percentage"].as_f64().unwrap();
    assert!((pct - 200.0 / 3.0).abs() < 1e-9);

    let hsk = courses.iter().find(|c| c["level"] == "HSK1").unwrap();
    assert_eq!(hsk["completedLessons"], 0);
    assert_eq!(hsk["percentage"], 0.0);
}

#[tokio::test]
async fn lesson_detail_merges_callers_progress() {
    let app = common::create_test_app().await;
    let token = app.sign_up("detail@example.com").await;
    let lesson = app.lesson_id("korean", "TOPIK1", 1).await;
    app.request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": lesson, "isCompleted": true })), Some(&token))
        .await;

    let uri = format!("/api/v1/lessons/{lesson}");
    let (_, body) = app.request(Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(body["progress"]["isCompleted"], true);

    let (status, body) = app.request(Method::GET, &uri, None, Some("expired-or-bogus")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["progress"].is_null());
}

#[tokio::test]
async fn dashboard_counts_xp_and_courses() {
    let app = common::create_test_app().await;
    let token = app.sign_up("dash@example.com").await;

    let (status, body) = app.request(Method::GET, "/api/v1/dashboard", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["xp"], 0);
    assert_eq!(body["level"], 1);
    assert_eq!(body["currentStreak"], 0);

    let lesson = app.lesson_id("japanese", "N4", 1).await;
    app.request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": lesson, "isCompleted": true })), Some(&token))
        .await;

    let (_, body) = app.request(Method::GET, "/api/v1/dashboard", None, Some(&token)).await;
    assert_eq!(body["completedLessons"], 1);
    assert_eq!(body["completedToday"], 1);
    assert_eq!(body["xp"], 10);
    assert_eq!(body["currentStreak"], 1);
    assert_eq!(body["coursesStarted"], 1);
    assert_eq!(body["coursesCompleted"], 1);
}

#[tokio::test]
async fn unpublished_lessons_cannot_be_tracked() {
    let app = common::create_test_app().await;
    let token = app.sign_up("draft@example.com").await;
    let published = app.lesson_id("japanese", "N5", 1).await;

    let course_id: i64 = sqlx::query_scalar("SELECT course_id FROM lessons WHERE id = ?")
        .bind(published)
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    let draft = sqlx::query("INSERT INTO lessons (course_id, title, sort_order, is_published) VALUES (?, 'Draft', 99, 0)")
        .bind(course_id)
        .execute(&app.state.db)
        .await
        .unwrap()
        .last_insert_rowid();

    let (status, _) = app.get(&format!("/api/v1/lessons/{draft}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::POST, "/api/v1/progress", Some(json!({ "lessonId": draft, "isCompleted": true })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(count_rows(&app, &token).await, 0);
}

async fn count_rows(app: &common::TestApp, token: &str) -> i64 {
    let user_id = app.state.jwt.validate(token).unwrap().sub;
    sqlx::query_scalar("SELECT COUNT(*) FROM user_progress WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&app.state.db)
        .await
        .unwrap()
}
