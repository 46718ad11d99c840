//! Transfer Engine
//!
//! Moves money between two cards of the same owner inside a single
//! database transaction. Both rows are locked before mutation, always in
//! ascending card-id order regardless of transfer direction, so two
//! transfers over the same pair in opposite directions cannot deadlock.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Amount, Card, CardError};
use crate::error::{AppError, AppResult};
use crate::store::CardStore;

/// Command to transfer money between two cards of one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub from_card_id: Uuid,
    pub to_card_id: Uuid,
    /// Amount as string for precise decimal handling
    pub amount: String,
}

impl TransferCommand {
    pub fn new(from_card_id: Uuid, to_card_id: Uuid, amount: String) -> Self {
        Self {
            from_card_id,
            to_card_id,
            amount,
        }
    }
}

/// Result of a completed transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub from_card_id: Uuid,
    pub to_card_id: Uuid,
    pub amount: Decimal,
    pub status: String,
}

/// Executes validated balance movements between two cards.
///
/// The engine holds no mutable state of its own; correctness under
/// concurrency comes from the store's row locks and the single
/// transaction wrapping lock, mutation and persistence.
pub struct TransferEngine {
    pool: PgPool,
    store: CardStore,
}

impl TransferEngine {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: CardStore::new(pool.clone()),
            pool,
        }
    }

    /// Execute a transfer, retrying on transient lock conflicts.
    ///
    /// A failed attempt commits nothing, so the whole transfer is safe to
    /// rerun from validation.
    pub async fn execute(&self, owner_id: Uuid, command: TransferCommand) -> AppResult<TransferResult> {
        const MAX_RETRIES: u32 = 3;

        let amount = Amount::from_str(&command.amount)
            .map_err(|e| CardError::InvalidAmount(e.to_string()))?;

        if command.from_card_id == command.to_card_id {
            return Err(CardError::SameCardTransfer.into());
        }

        for attempt in 0..MAX_RETRIES {
            match self
                .try_transfer(owner_id, command.from_card_id, command.to_card_id, &amount)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        owner_id = %owner_id,
                        from_card_id = %command.from_card_id,
                        to_card_id = %command.to_card_id,
                        amount = %amount,
                        "Transfer completed"
                    );
                    return Ok(TransferResult {
                        from_card_id: command.from_card_id,
                        to_card_id: command.to_card_id,
                        amount: amount.value(),
                        status: "completed".to_string(),
                    });
                }
                Err(AppError::Card(ref err)) if err.is_retryable() && attempt < MAX_RETRIES - 1 => {
                    let delay = Duration::from_millis(50 * (attempt as u64 + 1));
                    tokio::time::sleep(delay).await;
                    tracing::warn!(
                        "Transfer conflict, retrying (attempt {}/{})",
                        attempt + 1,
                        MAX_RETRIES
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(CardError::TransferConflict.into())
    }

    /// Single attempt: lock both rows, validate, mutate, commit.
    async fn try_transfer(
        &self,
        owner_id: Uuid,
        from_card_id: Uuid,
        to_card_id: Uuid,
        amount: &Amount,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let (mut from_card, mut to_card) = self
            .lock_pair(&mut tx, owner_id, from_card_id, to_card_id)
            .await?;

        if !from_card.is_active() {
            return Err(CardError::CardNotActive {
                last_four: from_card.pan_last_four,
            }
            .into());
        }
        if !to_card.is_active() {
            return Err(CardError::CardNotActive {
                last_four: to_card.pan_last_four,
            }
            .into());
        }

        if from_card.balance < amount.value() {
            return Err(CardError::InsufficientFunds {
                last_four: from_card.pan_last_four,
            }
            .into());
        }

        from_card.balance -= amount.value();
        to_card.balance += amount.value();

        self.store.save_locked(&mut tx, &from_card).await?;
        self.store.save_locked(&mut tx, &to_card).await?;

        tx.commit().await.map_err(map_conflict)?;

        Ok(())
    }

    /// Lock both cards in ascending id order and hand them back as
    /// (from, to). Either row missing or foreign surfaces the same
    /// `CardNotFound`.
    async fn lock_pair(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        from_card_id: Uuid,
        to_card_id: Uuid,
    ) -> AppResult<(Card, Card)> {
        let (first_id, second_id) = if from_card_id < to_card_id {
            (from_card_id, to_card_id)
        } else {
            (to_card_id, from_card_id)
        };

        let first = self
            .store
            .find_for_update_by_id_for_owner(tx, first_id, owner_id)
            .await
            .map_err(map_conflict)?
            .ok_or(CardError::CardNotFound)?;

        let second = self
            .store
            .find_for_update_by_id_for_owner(tx, second_id, owner_id)
            .await
            .map_err(map_conflict)?
            .ok_or(CardError::CardNotFound)?;

        if first.id == from_card_id {
            Ok((first, second))
        } else {
            Ok((second, first))
        }
    }
}

/// SQLSTATEs signalling a transient concurrency conflict.
const CONFLICT_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
];

fn map_conflict(err: sqlx::Error) -> AppError {
    let is_conflict = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| CONFLICT_SQLSTATES.contains(&code.as_ref()))
        .unwrap_or(false);

    if is_conflict {
        AppError::Card(CardError::TransferConflict)
    } else {
        AppError::Database(err)
    }
}
