use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use server::{Claims, JwtVerifier, ServerState};
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = engine::Engine::builder().database(db).build().await.unwrap();
    server::router(ServerState::new(engine, JwtVerifier::new(SECRET)))
}

fn token(name: &str) -> String {
    let claims = Claims {
        sub: format!("sub-{name}"),
        email: Some(format!("{name}@example.org")),
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn me(app: &Router, token: &str) -> Value {
    let (status, body) = send(app, Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

async fn become_tutor(app: &Router, token: &str) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/tutors",
        Some(token),
        Some(json!({
            "expertise": [
                { "name": "Rust", "category": "programming", "years_of_experience": 3 }
            ],
            "hourly_rate": 1.0,
            "bio": "Ownership without tears"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/wallet", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("missing bearer token"));

    let (status, body) = send(&app, Method::GET, "/api/wallet", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("invalid token"));

    let request = Request::builder()
        .uri("/api/wallet")
        .header("authorization", "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn public_listings_need_no_token() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/tutors", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["total_items"], json!(0));
    assert_eq!(body["pagination"]["current_page"], json!(1));
}

#[tokio::test]
async fn verify_signs_in_with_profile_hints() {
    let app = app().await;
    let alice = token("alice");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/verify",
        Some(&alice),
        Some(json!({ "display_name": "Alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display_name"], json!("Alice"));
    assert_eq!(body["data"]["email"], json!("alice@example.org"));
    assert_eq!(body["data"]["time_wallet"]["balance"], json!(10.0));

    let current = me(&app, &alice).await;
    assert_eq!(current["id"], body["data"]["id"]);

    let id = current["id"].as_str().unwrap().to_string();
    let (status, public) = send(&app, Method::GET, &format!("/api/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["data"]["display_name"], json!("Alice"));
}

#[tokio::test]
async fn booking_and_completion_move_hours() {
    let app = app().await;
    let tutor = token("tutor");
    let student = token("student");
    become_tutor(&app, &tutor).await;
    let tutor_id = me(&app, &tutor).await["id"].clone();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sessions",
        Some(&student),
        Some(json!({
            "tutor_id": tutor_id,
            "skill": "Rust",
            "category": "programming",
            "duration": 2.0,
            "scheduled_date": "2030-01-15",
            "scheduled_time": "10:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], json!("pending"));
    let session_id = body["data"]["id"].as_str().unwrap().to_string();
    let complete = format!("/api/sessions/{session_id}/complete");

    let (status, body) = send(&app, Method::POST, &complete, Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(&app, Method::POST, &complete, Some(&tutor), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["session"]["status"], json!("completed"));
    assert_eq!(body["data"]["transaction"]["kind"], json!("earned"));
    assert_eq!(body["data"]["transaction"]["amount"], json!(2.0));

    let (_, wallet) = send(&app, Method::GET, "/api/wallet", Some(&student), None).await;
    assert_eq!(wallet["data"]["balance"], json!(8.0));
    assert_eq!(wallet["data"]["total_spent"], json!(2.0));
    let (_, wallet) = send(&app, Method::GET, "/api/wallet", Some(&tutor), None).await;
    assert_eq!(wallet["data"]["balance"], json!(12.0));

    let (status, ledger) = send(&app, Method::GET, "/api/transactions", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["pagination"]["total_items"], json!(1));
    assert_eq!(ledger["data"][0]["kind"], json!("spent"));

    let (status, body) = send(&app, Method::POST, &complete, Some(&tutor), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("session already completed"));

    let (_, stats) = send(
        &app,
        Method::GET,
        "/api/transactions/stats",
        Some(&tutor),
        None,
    )
    .await;
    assert_eq!(stats["data"]["earned"]["total"], json!(2.0));
    assert_eq!(stats["data"]["earned"]["count"], json!(1));
}

#[tokio::test]
async fn errors_use_the_envelope() {
    let app = app().await;
    let alice = token("alice");

    let missing = format!("/api/users/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::GET, &missing, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/wallet/adjust",
        Some(&alice),
        Some(json!({ "amount": 1.0, "type": "sideways" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/transactions/manual",
        Some(&alice),
        Some(json!({ "type": "spent", "amount": 50.0, "skill": "Moving" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, wallet) = send(&app, Method::GET, "/api/wallet", Some(&alice), None).await;
    assert_eq!(wallet["data"]["balance"], json!(10.0));
}

#[tokio::test]
async fn malformed_requests_use_the_envelope() {
    let app = app().await;
    let alice = token("alice");
    let tutor = token("tutor");
    become_tutor(&app, &tutor).await;
    let tutor_id = me(&app, &tutor).await["tutor_id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = send(&app, Method::GET, "/api/users/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/transactions/manual",
        Some(&alice),
        Some(json!({ "type": "earned", "amount": "two", "skill": "Baking" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/tutors/{tutor_id}/reviews"),
        Some(&alice),
        Some(json!({ "rating": 300 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/tutors?min_rating=high",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/wallet/adjust",
        Some(&alice),
        Some(json!({ "amount": 1.0e300, "type": "add" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn joining_a_program_twice_pays_once() {
    let app = app().await;
    let organizer = token("organizer");
    let member = token("member");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/programs",
        Some(&organizer),
        Some(json!({ "title": "Repair cafe", "category": "other", "reward_hours": 5.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let join = format!("/api/programs/{}/join", body["data"]["id"].as_str().unwrap());

    let (status, first) = send(&app, Method::POST, &join, Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["transaction"]["amount"], json!(5.0));
    assert_eq!(first["data"]["program"]["participants"].as_array().unwrap().len(), 1);

    let (status, second) = send(&app, Method::POST, &join, Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["transaction"], Value::Null);

    let (_, wallet) = send(&app, Method::GET, "/api/wallet", Some(&organizer), None).await;
    assert_eq!(wallet["data"]["balance"], json!(15.0));

    let (_, joined) = send(&app, Method::GET, "/api/programs/joined", Some(&member), None).await;
    assert_eq!(joined["data"][0]["role"], json!("participant"));
    assert_eq!(joined["data"][0]["title"], json!("Repair cafe"));
}
