use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use availability_cell::availability_routes;
use shared_database::SchedulingStore;
use shared_models::scheduling::{AppointmentStatus, NewAppointment, SlotTime};
use shared_utils::test_utils::{TestApp, TestUser};

fn today() -> NaiveDate {
    // A Thursday.
    NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
}

fn router(app: &TestApp) -> Router {
    availability_routes(app.state.clone())
}

async fn send(app: &TestApp, method: Method, uri: &str, user: Option<&TestUser>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, app.bearer(user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router(app).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn monday_template(is_active: bool) -> Value {
    json!([{ "day_of_week": 1, "times": ["10:00", "09:00"], "is_active": is_active }])
}

#[tokio::test]
async fn test_free_monday_lists_all_times() {
    let app = TestApp::new(today());
    let practitioner = TestUser::practitioner("dra.ana@example.com");
    let patient = TestUser::patient("joao@example.com");

    let (status, _) = send(&app, Method::POST, "/", Some(&practitioner), Some(monday_template(true))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/slots?date=2025-05-05", Some(&patient), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"], json!(["09:00", "10:00"]));
    assert_eq!(body["day_of_week"], 1);
}

#[tokio::test]
async fn test_scheduled_appointment_removes_its_time() {
    let app = TestApp::new(today());
    let practitioner = TestUser::practitioner("dra.ana@example.com");
    send(&app, Method::POST, "/", Some(&practitioner), Some(monday_template(true))).await;

    let booked = app
        .store
        .insert_appointment(NewAppointment {
            client_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
            time: SlotTime::parse("09:00").unwrap(),
            notes: None,
        })
        .await
        .unwrap();
    app.store
        .update_appointment_status(booked.id, AppointmentStatus::Pending, AppointmentStatus::Scheduled)
        .await
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/slots?date=2025-05-05", Some(&practitioner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"], json!(["10:00"]));
}

#[tokio::test]
async fn test_inactive_day_and_past_date_offer_nothing() {
    let app = TestApp::new(today());
    let practitioner = TestUser::practitioner("dra.ana@example.com");
    send(&app, Method::POST, "/", Some(&practitioner), Some(monday_template(false))).await;

    let (_, body) = send(&app, Method::GET, "/slots?date=2025-05-05", Some(&practitioner), None).await;
    assert_eq!(body["slots"], json!([]));

    send(&app, Method::POST, "/", Some(&practitioner), Some(monday_template(true))).await;
    let (_, body) = send(&app, Method::GET, "/slots?date=2025-04-28", Some(&practitioner), None).await;
    assert_eq!(body["slots"], json!([]));
}

#[tokio::test]
async fn test_replacing_twice_gives_same_template() {
    let app = TestApp::new(today());
    let practitioner = TestUser::practitioner("dra.ana@example.com");
    let template = json!([
        { "dayOfWeek": 5, "times": ["09:00"], "isActive": true },
        { "day_of_week": 1, "times": ["14:00", "09:00"] }
    ]);

    send(&app, Method::POST, "/", Some(&practitioner), Some(template.clone())).await;
    let (_, first) = send(&app, Method::GET, "/", Some(&practitioner), None).await;
    send(&app, Method::POST, "/", Some(&practitioner), Some(template)).await;
    let (_, second) = send(&app, Method::GET, "/", Some(&practitioner), None).await;

    assert_eq!(first, second);
    assert_eq!(first[0]["day_of_week"], 1);
    assert_eq!(first[0]["times"], json!(["09:00", "14:00"]));
    assert_eq!(first[1]["day_of_week"], 5);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let app = TestApp::new(today());
    let practitioner = TestUser::practitioner("dra.ana@example.com");

    let bad_day = json!([{ "day_of_week": 9, "times": ["09:00"], "is_active": true }]);
    let (status, body) = send(&app, Method::POST, "/", Some(&practitioner), Some(bad_day)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Day of week"));

    let (status, _) = send(&app, Method::GET, "/slots?date=05/05/2025", Some(&practitioner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_access_rules() {
    let app = TestApp::new(today());
    let patient = TestUser::patient("joao@example.com");

    let (status, _) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/", Some(&patient), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(&app, Method::POST, "/", Some(&patient), Some(monday_template(true))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_template_is_a_validation_error() {
    let app = TestApp::new(today());
    let practitioner = TestUser::practitioner("dra.ana@example.com");

    let (status, body) = send(&app, Method::POST, "/", Some(&practitioner), Some(json!({ "day_of_week": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/",
        Some(&practitioner),
        Some(json!([{ "day_of_week": "monday", "times": ["09:00"], "is_active": true }])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
