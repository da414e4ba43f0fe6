use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use patient_cell::patient_routes;
use shared_database::SchedulingStore;
use shared_models::auth::Role;
use shared_models::scheduling::{NewAppointment, SlotTime, UserProfile};
use shared_utils::test_utils::{TestApp, TestUser};

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

    let response = patient_routes(app.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn app_with_patient() -> (TestApp, UserProfile) {
    let app = TestApp::new(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
    let patient = app
        .store
        .insert_user(UserProfile::new("joao@email.com", "João da Silva", Role::Patient))
        .await
        .unwrap();
    app.store
        .insert_user(UserProfile::new("dra.ana@email.com", "Dra. Ana", Role::Practitioner))
        .await
        .unwrap();
    (app, patient)
}

#[tokio::test]
async fn test_list_contains_only_patients() {
    let (app, patient) = app_with_patient().await;
    let practitioner = TestUser::practitioner("dra.ana@email.com");

    let (status, body) = send(&app, Method::GET, "/", Some(&practitioner), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], patient.id.to_string());
    assert_eq!(list[0]["role"], "patient");
}

#[tokio::test]
async fn test_detail_includes_appointments_and_notes() {
    let (app, patient) = app_with_patient().await;
    let practitioner = TestUser::practitioner("dra.ana@email.com");
    for (day, time) in [(2, "09:00"), (9, "14:00")] {
        app.store
            .insert_appointment(NewAppointment {
                client_id: patient.id,
                date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
                time: SlotTime::parse(time).unwrap(),
                notes: None,
            })
            .await
            .unwrap();
    }

    let uri = format!("/{}/notes", patient.id);
    send(&app, Method::POST, &uri, Some(&practitioner), Some(json!({ "note": "Ansiedade leve" }))).await;
    let (status, updated) = send(&app, Method::POST, &uri, Some(&practitioner), Some(json!({ "note": "Retorno em 15 dias" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["private_notes"], "Ansiedade leve\nRetorno em 15 dias");

    let (status, detail) = send(&app, Method::GET, &format!("/{}", patient.id), Some(&practitioner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["full_name"], "João da Silva");
    assert_eq!(detail["private_notes"], "Ansiedade leve\nRetorno em 15 dias");
    assert_eq!(detail["appointments"][0]["date"], "2025-05-09");
    assert_eq!(detail["appointments"][1]["date"], "2025-05-02");
}

#[tokio::test]
async fn test_note_errors() {
    let (app, patient) = app_with_patient().await;
    let practitioner = TestUser::practitioner("dra.ana@email.com");

    let (status, _) = send(&app, Method::POST, &format!("/{}/notes", patient.id), Some(&practitioner), Some(json!({ "note": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, &format!("/{}/notes", Uuid::new_v4()), Some(&practitioner), Some(json!({ "note": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/{}", Uuid::new_v4()), Some(&practitioner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::POST, &format!("/{}/notes", patient.id), Some(&practitioner), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_patients_cannot_use_the_directory() {
    let (app, patient) = app_with_patient().await;
    let as_patient = TestUser::patient("joao@email.com").with_id(patient.id);

    let (status, _) = send(&app, Method::GET, "/", Some(&as_patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, &format!("/{}", patient.id), Some(&as_patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, &format!("/{}/notes", patient.id), Some(&as_patient), Some(json!({ "note": "x" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
