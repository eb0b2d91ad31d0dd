use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use todoc::onboarding::{Onboarding, Route};
use todoc::{App, AppError};
use todoc_api::endpoints::kids::Gender;
use todoc_api::endpoints::records::{Health, RecordFields, Symptom};
use todoc_api::testing::{MockTransport, TestGateway};
use todoc_api::Method;
use todoc_session::{KeyValueStore, MemoryStore, SessionState};

fn user_json() -> serde_json::Value {
    json!({"id": 7, "email": "mom@todoc.test", "username": "mom"})
}

fn kid_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": 7,
        "name": "Sky",
        "birth_date": "2024-01-15",
        "gender": "female",
        "image_url": null
    })
}

fn build_app() -> (App, MockTransport, MemoryStore) {
    let TestGateway {
        gateway,
        storage,
        transport,
        ..
    } = TestGateway::new();
    let onboarding = Onboarding::new(Arc::new(storage.clone()));
    (App::from_parts(Arc::new(gateway), onboarding), transport, storage)
}

async fn logged_in_app() -> (App, MockTransport, MemoryStore) {
    let (app, transport, storage) = build_app();
    transport
        .respond_json(200, json!({"access_token": "abc123", "token_type": "bearer"}))
        .respond_json(200, user_json());
    app.login("mom@todoc.test", "secret").await.unwrap();
    (app, transport, storage)
}

#[tokio::test]
async fn test_first_login_walks_through_onboarding() {
    let (app, transport, _storage) = build_app();
    assert_eq!(app.route().unwrap(), Route::Login);

    transport
        .respond_json(200, json!({"access_token": "abc123", "token_type": "bearer"}))
        .respond_json(200, user_json());
    let user = app.login(" mom@todoc.test ", "secret").await.unwrap();

    assert_eq!(user.username, "mom");
    assert_eq!(app.state(), SessionState::Authenticated);
    assert_eq!(app.route().unwrap(), Route::Onboarding);

    transport.respond_json(201, kid_json(3));
    let mut kids = app.kids();
    let birth = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let kid = kids.create("Sky", birth, Gender::Female).await.unwrap();
    app.onboarding().complete(kid.id).unwrap();

    assert_eq!(app.route().unwrap(), Route::Home);
    assert_eq!(app.onboarding().selected_kid().unwrap(), Some(3));
}

#[tokio::test]
async fn test_rejected_token_sends_user_back_to_login() {
    let (app, transport, storage) = logged_in_app().await;
    app.onboarding().complete(3).unwrap();
    assert_eq!(app.route().unwrap(), Route::Home);

    transport.respond_json(401, json!({"detail": "Could not validate credentials"}));
    let err = app.kids().load().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.structured().unwrap().status, 401);
    assert_eq!(app.route().unwrap(), Route::Login);
    assert_eq!(storage.get("access_token").unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_onboarding() {
    let (app, _transport, storage) = logged_in_app().await;
    app.onboarding().complete(3).unwrap();

    assert!(app.logout().unwrap());

    assert_eq!(app.route().unwrap(), Route::Login);
    assert!(!app.onboarding().is_completed().unwrap());
    assert_eq!(app.onboarding().selected_kid().unwrap(), None);
    assert!(storage.get("access_token").unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_login_never_reaches_the_server() {
    let (app, transport, _storage) = build_app();

    let err = app.login("not-an-email", "secret").await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(transport.request_count(), 0);
    assert_eq!(app.route().unwrap(), Route::Login);
}

#[tokio::test]
async fn test_health_record_is_posted_and_listed() {
    let (app, transport, _storage) = logged_in_app().await;
    transport.respond_json(
        201,
        json!({
            "id": 11,
            "temperature": "38.4",
            "symptom": "fever",
            "symptom_other": null,
            "record": {
                "id": 11,
                "kid_id": 3,
                "record_type": "health",
                "title": null,
                "memo": "after nap",
                "image_url": null,
                "created_at": "2024-05-01T08:30:00"
            }
        }),
    );

    let mut records = app.records(3);
    let detail = Health {
        temperature: Some(38.4),
        symptom: Symptom::Fever,
        symptom_other: None,
    };
    let fields = RecordFields {
        memo: Some("after nap".into()),
        ..Default::default()
    };
    let created = records.create(detail, fields).await.unwrap();

    assert_eq!(created.detail.temperature, Some(38.4));
    let request = transport.last_request().unwrap();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url.path(), "/api/v1/kids/3/records/health");

    let cached = records.records().items();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].details.symptom, Some(Symptom::Fever));
    assert_eq!(cached[0].fields.memo.as_deref(), Some("after nap"));
}
