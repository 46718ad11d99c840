//! Database module
//!
//! Database connection and schema verification utilities.
//! Schema lives in raw SQL files under migrations/.

use sqlx::PgPool;

/// Simple connectivity check.
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check that the cards table and its safety constraints exist.
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = 'cards'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        tracing::error!("Required table 'cards' does not exist");
        return Ok(false);
    }

    // The unique index on pan_fingerprint is the real safety net against
    // a duplicate-number race; refuse to start without it.
    let unique_fingerprint: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM pg_indexes
            WHERE schemaname = 'public'
              AND tablename = 'cards'
              AND indexdef LIKE 'CREATE UNIQUE INDEX%'
              AND indexdef LIKE '%pan_fingerprint%'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !unique_fingerprint {
        tracing::error!("Unique index on cards.pan_fingerprint is missing");
        return Ok(false);
    }

    Ok(true)
}
