//! Card lifecycle integration tests
//!
//! Exercise the HTTP surface end to end against a real Postgres database.
//! Requires DATABASE_URL to be set.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use card_ledger::domain::CardStatus;
use card_ledger::service::CardService;

const ADMIN_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

fn request(method: &str, uri: &str, owner_id: &str, admin: bool, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Owner-Id", owner_id);

    if admin {
        builder = builder.header("X-Owner-Role", "admin");
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_admin_creates_card() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool);
    let owner_id = Uuid::new_v4();

    let response = app
        .oneshot(request(
            "POST",
            "/cards",
            ADMIN_ID,
            true,
            Some(json!({ "owner_id": owner_id })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["balance"], "0");

    let masked = body["pan_masked"].as_str().unwrap();
    assert!(masked.starts_with("**** **** **** "));
    assert_eq!(masked.len(), 19);

    // No sensitive fields in the response
    assert!(body.get("pan_encrypted").is_none());
    assert!(body.get("pan_fingerprint").is_none());
}

#[tokio::test]
async fn test_create_card_requires_admin_role() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool);

    let response = app
        .oneshot(request(
            "POST",
            "/cards",
            &Uuid::new_v4().to_string(),
            false,
            Some(json!({ "owner_id": Uuid::new_v4() })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_owner_header_is_unauthorized() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/cards")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_owner_header_is_bad_request() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/cards")
                .header("X-Owner-Id", "not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_owner_gets_own_card() {
    let pool = common::setup_test_db().await;
    let owner_id = Uuid::new_v4();
    let card_id =
        common::seed_card(&pool, owner_id, "1234", CardStatus::Active, dec!(42.50)).await;

    let app = common::test_app(pool);
    let response = app
        .oneshot(request(
            "GET",
            &format!("/cards/{}", card_id),
            &owner_id.to_string(),
            false,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["card_id"], card_id.to_string());
    assert_eq!(body["pan_masked"], "**** **** **** 1234");
    assert_eq!(body["balance"], "42.50");
}

#[tokio::test]
async fn test_foreign_card_is_not_found() {
    let pool = common::setup_test_db().await;
    let card_id = common::seed_card(
        &pool,
        Uuid::new_v4(),
        "1234",
        CardStatus::Active,
        dec!(10.00),
    )
    .await;

    // A different owner must not learn the card exists
    let app = common::test_app(pool);
    let response = app
        .oneshot(request(
            "GET",
            &format!("/cards/{}", card_id),
            &Uuid::new_v4().to_string(),
            false,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_blocks_card() {
    let pool = common::setup_test_db().await;
    let owner_id = Uuid::new_v4();
    let card_id =
        common::seed_card(&pool, owner_id, "9999", CardStatus::Active, dec!(5.00)).await;

    let app = common::test_app(pool);
    let response = app
        .oneshot(request(
            "POST",
            &format!("/cards/{}/block", card_id),
            &owner_id.to_string(),
            false,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "BLOCKED");
}

#[tokio::test]
async fn test_list_cards_filtered_by_status() {
    let pool = common::setup_test_db().await;
    let owner_id = Uuid::new_v4();
    common::seed_card(&pool, owner_id, "1111", CardStatus::Active, dec!(1.00)).await;
    common::seed_card(&pool, owner_id, "2222", CardStatus::Blocked, dec!(2.00)).await;
    common::seed_card(&pool, owner_id, "3333", CardStatus::Active, dec!(3.00)).await;

    let app = common::test_app(pool);
    let response = app
        .oneshot(request(
            "GET",
            "/cards?status=ACTIVE",
            &owner_id.to_string(),
            false,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["total_elements"], 2);
    let content = body["content"].as_array().unwrap();
    assert_eq!(content.len(), 2);
    for card in content {
        assert_eq!(card["status"], "ACTIVE");
    }
}

#[tokio::test]
async fn test_list_cards_excludes_other_owners() {
    let pool = common::setup_test_db().await;
    let owner_id = Uuid::new_v4();
    common::seed_card(&pool, owner_id, "1111", CardStatus::Active, dec!(1.00)).await;
    common::seed_card(
        &pool,
        Uuid::new_v4(),
        "2222",
        CardStatus::Active,
        dec!(2.00),
    )
    .await;

    let app = common::test_app(pool);
    let response = app
        .oneshot(request(
            "GET",
            "/cards",
            &owner_id.to_string(),
            false,
            None,
        ))
        .await
        .unwrap();

    let body = response_json(response).await;
    assert_eq!(body["total_elements"], 1);
    assert_eq!(body["content"][0]["pan_masked"], "**** **** **** 1111");
}

#[tokio::test]
async fn test_admin_sets_status_and_deletes() {
    let pool = common::setup_test_db().await;
    let owner_id = Uuid::new_v4();
    let card_id =
        common::seed_card(&pool, owner_id, "7777", CardStatus::Active, dec!(0.00)).await;

    let app = common::test_app(pool.clone());

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/admin/cards/{}/status", card_id),
            ADMIN_ID,
            true,
            Some(json!({ "status": "BLOCKED" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "BLOCKED");

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/admin/cards/{}", card_id),
            ADMIN_ID,
            true,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Deleting again must report not found
    let response = app
        .oneshot(request(
            "DELETE",
            &format!("/admin/cards/{}", card_id),
            ADMIN_ID,
            true,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_endpoints_reject_regular_users() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool);
    let card_id = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/admin/cards/{}/status", card_id),
            &Uuid::new_v4().to_string(),
            false,
            Some(json!({ "status": "BLOCKED" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            "DELETE",
            &format!("/admin/cards/{}", card_id),
            &Uuid::new_v4().to_string(),
            false,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_plaintext_pan_never_stored() {
    let pool = common::setup_test_db().await;
    let crypto = common::test_crypto();
    let service = CardService::new(pool.clone(), crypto.clone());

    let owner_id = Uuid::new_v4();
    let card = service.create(owner_id).await.unwrap();

    let (pan_encrypted, pan_fingerprint, pan_last4): (Vec<u8>, String, String) =
        sqlx::query_as(
            "SELECT pan_encrypted, pan_fingerprint, pan_last4 FROM cards WHERE id = $1",
        )
        .bind(card.id)
        .fetch_one(&pool)
        .await
        .unwrap();

    // The stored blob decrypts back to a 16-digit number
    let pan = crypto.decrypt(&pan_encrypted).unwrap();
    assert_eq!(pan.len(), 16);
    assert!(pan.chars().all(|c| c.is_ascii_digit()));

    // Fingerprint is the keyed digest of that number, not the number itself
    assert_eq!(pan_fingerprint, crypto.fingerprint(&pan));
    assert!(!pan_fingerprint.contains(&pan));

    // The blob is not the plaintext
    assert_ne!(pan_encrypted, pan.as_bytes());
    assert_eq!(pan_last4, pan[12..]);
}
