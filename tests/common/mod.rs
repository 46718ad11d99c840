//! Common test utilities
#![allow(dead_code)]

use std::sync::Arc;

use axum::{middleware, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use card_ledger::api::{self, AppState};
use card_ledger::crypto::PanCrypto;
use card_ledger::domain::CardStatus;

/// Setup test database - ensure schema and truncate card state
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cards (
            id              UUID PRIMARY KEY,
            owner_id        UUID NOT NULL,
            pan_encrypted   BYTEA NOT NULL,
            pan_fingerprint VARCHAR(64) NOT NULL,
            pan_last4       VARCHAR(4) NOT NULL,
            expiry_month    SMALLINT NOT NULL,
            expiry_year     SMALLINT NOT NULL,
            status_card     VARCHAR(16) NOT NULL
                CHECK (status_card IN ('ACTIVE', 'BLOCKED', 'EXPIRED')),
            balance         NUMERIC(19, 2) NOT NULL DEFAULT 0
                CHECK (balance >= 0)
        )
        "#,
    )
    .execute(&pool)
    .await
    .expect("Failed to create cards table");

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS cards_pan_fingerprint_key ON cards (pan_fingerprint)",
    )
    .execute(&pool)
    .await
    .expect("Failed to create fingerprint index");

    sqlx::query("CREATE INDEX IF NOT EXISTS cards_owner_id_idx ON cards (owner_id)")
        .execute(&pool)
        .await
        .expect("Failed to create owner index");

    sqlx::query("TRUNCATE TABLE cards")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

/// Crypto service with a fixed test key
pub fn test_crypto() -> Arc<PanCrypto> {
    let key = BASE64.encode([7u8; 32]);
    Arc::new(PanCrypto::new(&key, "test-pepper").expect("Failed to build test crypto"))
}

/// Router wired the way the server binary wires it (minus HTTP tracing)
pub fn test_app(pool: PgPool) -> Router {
    let state = AppState {
        pool,
        crypto: test_crypto(),
    };

    api::create_router()
        .layer(middleware::from_fn(
            api::middleware::identity_middleware,
        ))
        .with_state(state)
}

/// Insert a card row directly, bypassing the lifecycle service
pub async fn seed_card(
    pool: &PgPool,
    owner_id: Uuid,
    last_four: &str,
    status: CardStatus,
    balance: Decimal,
) -> Uuid {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO cards (
            id, owner_id, pan_encrypted, pan_fingerprint, pan_last4,
            expiry_month, expiry_year, status_card, balance
        )
        VALUES ($1, $2, $3, $4, $5, 12, 2031, $6, $7)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(vec![0u8; 44])
    .bind(format!("test-{}", Uuid::new_v4().simple()))
    .bind(last_four)
    .bind(status.to_string())
    .bind(balance)
    .execute(pool)
    .await
    .expect("Failed to seed card");

    id
}

/// Current balance of a card
pub async fn card_balance(pool: &PgPool, card_id: Uuid) -> Decimal {
    sqlx::query_scalar("SELECT balance FROM cards WHERE id = $1")
        .bind(card_id)
        .fetch_one(pool)
        .await
        .expect("Failed to fetch balance")
}
