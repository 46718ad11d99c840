//! Card Store
//!
//! Persistence layer for card records over Postgres. All shared mutable
//! state lives here; callers get snapshots and must re-fetch under a row
//! lock (`find_for_update_by_id_for_owner`) before mutating a balance.
//! Status changes go through the column-scoped `update_status` instead.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Card, CardStatus, PageParams};

/// Raw row shape of the cards table.
type CardRow = (
    Uuid,    // id
    Uuid,    // owner_id
    Vec<u8>, // pan_encrypted
    String,  // pan_fingerprint
    String,  // pan_last4
    i16,     // expiry_month
    i16,     // expiry_year
    String,  // status_card
    Decimal, // balance
);

const CARD_COLUMNS: &str = "id, owner_id, pan_encrypted, pan_fingerprint, pan_last4, \
     expiry_month, expiry_year, status_card, balance";

fn map_row(row: CardRow) -> Result<Card, sqlx::Error> {
    let (id, owner_id, pan_encrypted, pan_fingerprint, pan_last_four, expiry_month, expiry_year, status, balance) =
        row;

    let status: CardStatus = status
        .parse()
        .map_err(|e: crate::domain::ParseCardStatusError| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Card {
        id,
        owner_id,
        pan_encrypted,
        pan_fingerprint,
        pan_last_four,
        expiry_month,
        expiry_year,
        status,
        balance,
    })
}

/// Repository for card records.
#[derive(Debug, Clone)]
pub struct CardStore {
    pool: PgPool,
}

impl CardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a freshly created card.
    ///
    /// The UNIQUE constraint on pan_fingerprint makes this the authoritative
    /// duplicate check; callers translate the violation into a domain error.
    pub async fn insert(&self, card: &Card) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO cards (
                id, owner_id, pan_encrypted, pan_fingerprint, pan_last4,
                expiry_month, expiry_year, status_card, balance
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(card.id)
        .bind(card.owner_id)
        .bind(&card.pan_encrypted)
        .bind(&card.pan_fingerprint)
        .bind(&card.pan_last_four)
        .bind(card.expiry_month)
        .bind(card.expiry_year)
        .bind(card.status.to_string())
        .bind(card.balance)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cards WHERE pan_fingerprint = $1)")
            .bind(fingerprint)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn exists_by_id(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cards WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, sqlx::Error> {
        let row: Option<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_row).transpose()
    }

    pub async fn find_by_id_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Card>, sqlx::Error> {
        let row: Option<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_row).transpose()
    }

    /// Fetch a card under an exclusive row lock, scoped to its owner.
    ///
    /// The lock is held until the enclosing transaction commits or rolls
    /// back; concurrent lockers of the same row block here.
    pub async fn find_for_update_by_id_for_owner(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Card>, sqlx::Error> {
        let row: Option<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(map_row).transpose()
    }

    /// Persist the mutable fields of a card.
    ///
    /// Only ever called by the transaction that owns the row lock.
    pub async fn save_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        card: &Card,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE cards SET status_card = $2, balance = $3 WHERE id = $1")
            .bind(card.id)
            .bind(card.status.to_string())
            .bind(card.balance)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Persist a status change without touching the balance.
    ///
    /// Balances are only ever written through `save_locked` by the
    /// transaction holding the row lock; a status change racing a
    /// transfer must not resurrect a stale balance snapshot.
    pub async fn update_status(&self, id: Uuid, status: CardStatus) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE cards SET status_card = $2 WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a card; returns whether a row was removed.
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        params: PageParams,
    ) -> Result<(Vec<Card>, i64), sqlx::Error> {
        let rows: Vec<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE owner_id = $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let cards = rows.into_iter().map(map_row).collect::<Result<_, _>>()?;
        Ok((cards, total))
    }

    pub async fn list_by_owner_and_status(
        &self,
        owner_id: Uuid,
        status: CardStatus,
        params: PageParams,
    ) -> Result<(Vec<Card>, i64), sqlx::Error> {
        let rows: Vec<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE owner_id = $1 AND status_card = $2 \
             ORDER BY id LIMIT $3 OFFSET $4"
        ))
        .bind(owner_id)
        .bind(status.to_string())
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cards WHERE owner_id = $1 AND status_card = $2",
        )
        .bind(owner_id)
        .bind(status.to_string())
        .fetch_one(&self.pool)
        .await?;

        let cards = rows.into_iter().map(map_row).collect::<Result<_, _>>()?;
        Ok((cards, total))
    }

    pub async fn list_by_status(
        &self,
        status: CardStatus,
        params: PageParams,
    ) -> Result<(Vec<Card>, i64), sqlx::Error> {
        let rows: Vec<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE status_card = $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(status.to_string())
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE status_card = $1")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await?;

        let cards = rows.into_iter().map(map_row).collect::<Result<_, _>>()?;
        Ok((cards, total))
    }
}
