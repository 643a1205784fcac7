mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use common::{create_test_admin, generate_unique_email};
use http_body_util::BodyExt;
use rollbook::config::cors::CorsConfig;
use rollbook::config::jwt::JwtConfig;
use rollbook::router::init_router;
use rollbook::state::AppState;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

fn setup_test_app(pool: PgPool) -> axum::Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
    };
    init_router(state)
}

async fn get_auth_token(app: axum::Router, email: &str, password: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "email": email,
                "password": password
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn insert_student(pool: &PgPool, name: &str, start: &str, end: &str) -> Uuid {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap();

    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO students (name, fathers_name, email, mobile, age, study_start_date, \
         study_end_date, picture, picture_mime_type, feedback, address) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
    )
    .bind(name)
    .bind("Test Father")
    .bind(generate_unique_email("student"))
    .bind("9876543210")
    .bind(20)
    .bind(start)
    .bind(end)
    .bind("aGVsbG8=")
    .bind("image/jpeg")
    .bind("Test feedback")
    .bind("Test address")
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn date_range_response(
    pool: &PgPool,
    token: &str,
    query: &str,
) -> (StatusCode, serde_json::Value) {
    let app = setup_test_app(pool.clone());
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/students/date-range?{}", query))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[sqlx::test(migrations = "./migrations")]
async fn test_date_range_matches_all_overlap_arms(pool: PgPool) {
    let admin_email = generate_unique_email("admin");
    let password = "testpass123";
    create_test_admin(&pool, &admin_email, password).await;
    let token = get_auth_token(setup_test_app(pool.clone()), &admin_email, password).await;

    // Query window 2024-01-15..2024-02-15.
    // Ends inside the window.
    insert_student(&pool, "Ends In Range", "2024-01-01", "2024-01-31").await;
    // Starts inside the window.
    insert_student(&pool, "Starts In Range", "2024-02-01", "2024-03-01").await;
    // Spans the whole window.
    insert_student(&pool, "Spans Range", "2024-01-01", "2024-03-01").await;
    // Entirely before the window.
    insert_student(&pool, "Outside Range", "2023-01-01", "2023-06-01").await;

    let (status, body) = date_range_response(
        &pool,
        &token,
        "startDate=2024-01-15&endDate=2024-02-15",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dateRange"]["count"], 3);
    assert_eq!(body["dateRange"]["startDate"], "2024-01-15");
    assert_eq!(body["dateRange"]["endDate"], "2024-02-15");

    let students = body["students"].as_array().unwrap();
    let names: Vec<&str> = students
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Ends In Range"));
    assert!(names.contains(&"Starts In Range"));
    assert!(names.contains(&"Spans Range"));
    assert!(!names.contains(&"Outside Range"));

    // Ordered by study start date, ascending.
    let starts: Vec<&str> = students
        .iter()
        .map(|s| s["studyStartDate"].as_str().unwrap())
        .collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_date_range_requires_both_bounds(pool: PgPool) {
    let admin_email = generate_unique_email("admin");
    let password = "testpass123";
    create_test_admin(&pool, &admin_email, password).await;
    let token = get_auth_token(setup_test_app(pool.clone()), &admin_email, password).await;

    let (status, body) = date_range_response(&pool, &token, "startDate=2024-01-15").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Both start date and end date are required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_date_range_rejects_inverted_bounds(pool: PgPool) {
    let admin_email = generate_unique_email("admin");
    let password = "testpass123";
    create_test_admin(&pool, &admin_email, password).await;
    let token = get_auth_token(setup_test_app(pool.clone()), &admin_email, password).await;

    let (status, body) = date_range_response(
        &pool,
        &token,
        "startDate=2024-02-15&endDate=2024-01-15",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End date must be after start date");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_date_range_requires_auth(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let request = Request::builder()
        .method("GET")
        .uri("/api/students/date-range?startDate=2024-01-15&endDate=2024-02-15")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
