use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;
use crate::test_support::{emailed_link, link_token, test_db, wait_for_mail, MemoryReminderQueue};

struct TestApp {
    router: Router,
    mailer: Mailer,
    reminders: Arc<MemoryReminderQueue>,
}

async fn test_app(settings: ApiSettings) -> TestApp {
    let db = test_db().await;
    let mailer = Mailer::mock().unwrap();
    let reminders = Arc::new(MemoryReminderQueue::default());
    let router = router(Services {
        db,
        sessions: SessionRegistry::default(),
        mailer: mailer.clone(),
        reminders: reminders.clone(),
        images: None,
        settings,
    });
    TestApp {
        router,
        mailer,
        reminders,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, value)
}

async fn register(app: &TestApp, email: &str) -> String {
    let (status, cookie, _) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": email, "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    cookie.expect("session cookie")
}

async fn create_pet(app: &TestApp, cookie: &str, name: &str) -> Value {
    let (status, _, pet) = send(
        app,
        Method::POST,
        "/pets",
        Some(cookie),
        Some(json!({"name": name, "breed": "Beagle", "age": 4, "weight": 11.5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    pet
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, Option<String>) {
    let (status, cookie, _) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    (status, cookie)
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = test_app(ApiSettings::default()).await;
    let (status, _, body) = send(&app, Method::GET, "/pets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let (status, _, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_login_logout_round() {
    let app = test_app(ApiSettings::default()).await;
    let cookie = register(&app, "Owner@Example.com").await;

    let (status, _, user) = send(&app, Method::GET, "/auth/session", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "owner@example.com");
    assert_eq!(user["verified"], false);

    wait_for_mail(&app.mailer, 1).await;
    assert_eq!(app.mailer.outbox()[0].to, "owner@example.com");

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": "owner@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, _, _) = send(&app, Method::POST, "/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = send(&app, Method::GET, "/auth/session", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "owner@example.com", "password": "wrong-one"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cookie, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "owner@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cookie.is_some());
}

#[tokio::test]
async fn password_reset_answers_the_same_for_unknown_addresses() {
    let app = test_app(ApiSettings::default()).await;
    register(&app, "known@example.com").await;
    wait_for_mail(&app.mailer, 1).await;

    for email in ["known@example.com", "nobody@example.com"] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/auth/password-reset",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    wait_for_mail(&app.mailer, 2).await;
    let outbox = app.mailer.outbox();
    assert_eq!(outbox.len(), 2);
    assert!(outbox.iter().all(|m| m.to == "known@example.com"));

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/auth/password-reset/confirm",
        None,
        Some(json!({"token": "made-up", "new_password": "another1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn emailed_verification_link_verifies_the_account() {
    let app = test_app(ApiSettings::default()).await;
    let cookie = register(&app, "vera@example.com").await;
    wait_for_mail(&app.mailer, 1).await;

    let link = emailed_link(&app.mailer.outbox()[0].html);
    let path = link
        .strip_prefix("http://localhost:8000")
        .expect("verification link targets the API");
    assert!(path.starts_with("/auth/verify?token="));

    let (status, _, user) = send(&app, Method::GET, path, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "vera@example.com");
    assert_eq!(user["verified"], true);

    let (_, _, session) = send(&app, Method::GET, "/auth/session", Some(&cookie), None).await;
    assert_eq!(session["verified"], true);

    let (status, _, body) = send(&app, Method::GET, path, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn emailed_reset_token_sets_a_new_password_and_signs_out() {
    let app = test_app(ApiSettings::default()).await;
    let first = register(&app, "rosa@example.com").await;
    let (_, second) = login(&app, "rosa@example.com", "hunter22").await;
    let second = second.expect("session cookie");
    wait_for_mail(&app.mailer, 1).await;

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/auth/password-reset",
        None,
        Some(json!({"email": "rosa@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_mail(&app.mailer, 2).await;

    let link = emailed_link(&app.mailer.outbox()[1].html);
    assert!(link.starts_with("pawtrack://app/reset-password?token="));
    let token = link_token(&link);

    let confirm = json!({"token": token, "new_password": "fresh-start9"});
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/auth/password-reset/confirm",
        None,
        Some(confirm.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for cookie in [&first, &second] {
        let (status, _, _) = send(&app, Method::GET, "/auth/session", Some(cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(login(&app, "rosa@example.com", "hunter22").await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, "rosa@example.com", "fresh-start9").await.0, StatusCode::OK);

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/auth/password-reset/confirm",
        None,
        Some(confirm),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn changing_password_signs_out_other_sessions() {
    let app = test_app(ApiSettings::default()).await;
    let current = register(&app, "pia@example.com").await;
    let (_, other) = login(&app, "pia@example.com", "hunter22").await;
    let other = other.expect("session cookie");

    let (status, _, _) = send(
        &app,
        Method::PATCH,
        "/auth/password",
        Some(&current),
        Some(json!({"new_password": "another-one1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&app, Method::GET, "/auth/session", Some(&current), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, Method::GET, "/auth/session", Some(&other), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, "pia@example.com", "another-one1").await.0, StatusCode::OK);
}

#[tokio::test]
async fn stale_session_needs_current_password_to_change_email() {
    let app = test_app(ApiSettings {
        recent_login_window: Duration::ZERO,
        ..Default::default()
    })
    .await;
    let cookie = register(&app, "old@example.com").await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let (status, _, body) = send(
        &app,
        Method::PATCH,
        "/auth/email",
        Some(&cookie),
        Some(json!({"new_email": "new@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "recent_login_required");

    let (_, _, user) = send(&app, Method::GET, "/auth/session", Some(&cookie), None).await;
    assert_eq!(user["email"], "old@example.com");

    let (status, _, user) = send(
        &app,
        Method::PATCH,
        "/auth/email",
        Some(&cookie),
        Some(json!({"new_email": "new@example.com", "current_password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "new@example.com");
    assert_eq!(user["verified"], false);

    let (_, _, user) = send(&app, Method::GET, "/auth/session", Some(&cookie), None).await;
    assert_eq!(user["email"], "new@example.com");
}

#[tokio::test]
async fn pets_are_private_to_their_owner() {
    let app = test_app(ApiSettings::default()).await;
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let pet = create_pet(&app, &alice, "Biscuit").await;
    let pet_uri = format!("/pets/{}", pet["id"].as_str().unwrap());

    let (status, _, pets) = send(&app, Method::GET, "/pets", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pets, json!([]));

    let (status, _, _) = send(&app, Method::GET, &pet_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _, _) = send(&app, Method::DELETE, &pet_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, updated) = send(
        &app,
        Method::PATCH,
        &pet_uri,
        Some(&alice),
        Some(json!({"weight": 12.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["weight"], 12.0);
    assert_eq!(updated["name"], "Biscuit");

    let (status, _, _) = send(&app, Method::DELETE, &pet_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, body) = send(&app, Method::GET, &pet_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn feeding_schedule_needs_an_owned_pet() {
    let app = test_app(ApiSettings::default()).await;
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;
    let pet = create_pet(&app, &alice, "Biscuit").await;

    let schedule = |pet_id: &str| {
        json!({
            "pet_id": pet_id,
            "food_type": "Dry Food",
            "amount": "200g",
            "time": "08:00 AM",
            "frequency": "daily"
        })
    };

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/feeding-schedules",
        Some(&alice),
        Some(schedule(&uuid::Uuid::nil().to_string())),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_parent");

    let pet_id = pet["id"].as_str().unwrap();
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/feeding-schedules",
        Some(&bob),
        Some(schedule(pet_id)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, created) = send(
        &app,
        Method::POST,
        "/feeding-schedules",
        Some(&alice),
        Some(schedule(pet_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, list) = send(
        &app,
        Method::GET,
        &format!("/pets/{pet_id}/feeding-schedules"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], created["id"]);
    assert_eq!(list[0]["time"], "08:00 AM");
}

#[tokio::test]
async fn health_records_list_newest_first() {
    let app = test_app(ApiSettings::default()).await;
    let alice = register(&app, "alice@example.com").await;
    let pet = create_pet(&app, &alice, "Biscuit").await;
    let pet_id = pet["id"].as_str().unwrap();

    for (title, date) in [("First shots", "2024-01-10"), ("Annual checkup", "2024-11-02")] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/health-records",
            Some(&alice),
            Some(json!({"pet_id": pet_id, "type": "checkup", "title": title, "date": date})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, _, list) = send(
        &app,
        Method::GET,
        &format!("/pets/{pet_id}/health-records"),
        Some(&alice),
        None,
    )
    .await;
    let titles: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Annual checkup", "First shots"]);
}

#[tokio::test]
async fn vets_filter_by_district() {
    let app = test_app(ApiSettings::default()).await;
    let cookie = register(&app, "alice@example.com").await;

    for (name, district) in [("Paws Clinic", "Central"), ("Harbour Vets", "Harbour")] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/vets",
            Some(&cookie),
            Some(json!({
                "name": name,
                "address": "1 Main St",
                "contact": "555-0100",
                "district": district,
                "emergency": false,
                "rating": 4.5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _, list) = send(&app, Method::GET, "/vets?district=Harbour", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Harbour Vets");

    let (_, _, all) = send(&app, Method::GET, "/vets", Some(&cookie), None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reminders_are_scheduled_and_cancelled_per_user() {
    let app = test_app(ApiSettings::default()).await;
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;
    let at = (chrono::Utc::now() + chrono::Duration::days(3)).to_rfc3339();

    for cookie in [&alice, &alice, &bob] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/reminders",
            Some(cookie),
            Some(json!({"at": at, "title": "Rabies booster", "body": "Due soon"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _, body) = send(&app, Method::DELETE, "/reminders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], 2);
    assert_eq!(app.reminders.pending().len(), 1);

    let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/reminders",
        Some(&bob),
        Some(json!({"at": past, "title": "Too late", "body": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_upload_without_storage_is_unavailable() {
    let app = test_app(ApiSettings::default()).await;
    let cookie = register(&app, "alice@example.com").await;
    let pet = create_pet(&app, &cookie, "Biscuit").await;

    let boundary = "pawtrack-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nPNG\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/pets/{}/image", pet["id"].as_str().unwrap()))
        .header(header::COOKIE, &cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
