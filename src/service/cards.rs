//! Card Lifecycle Service
//!
//! Creates cards with confidentially stored numbers and handles reads,
//! status changes and administrative deletion.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::crypto::{generate_pan, last_four, PanCrypto};
use crate::domain::{Card, CardError, CardStatus, Page, PageParams};
use crate::error::{AppError, AppResult};
use crate::store::CardStore;

/// Cards are valid for five years from creation.
const CARD_VALID_YEARS: i32 = 5;

/// Lifecycle operations on cards.
pub struct CardService {
    store: CardStore,
    crypto: Arc<PanCrypto>,
}

impl CardService {
    pub fn new(pool: PgPool, crypto: Arc<PanCrypto>) -> Self {
        Self {
            store: CardStore::new(pool),
            crypto,
        }
    }

    /// Create a card for an owner: ACTIVE, zero balance, expiry five years
    /// out. The number is generated, fingerprinted and encrypted; the
    /// plaintext never leaves this function.
    pub async fn create(&self, owner_id: Uuid) -> AppResult<Card> {
        let pan = generate_pan();
        let fingerprint = self.crypto.fingerprint(&pan);

        // Fail-fast check; the unique constraint below is the actual
        // guarantee against a concurrent duplicate.
        if self.store.exists_by_fingerprint(&fingerprint).await? {
            return Err(CardError::CardAlreadyExists.into());
        }

        let pan_encrypted = self.crypto.encrypt(&pan)?;
        let pan_last_four = last_four(&pan).to_string();

        let today = Utc::now().date_naive();
        let expiry_month = today.month() as i16;
        let expiry_year = (today.year() + CARD_VALID_YEARS) as i16;

        let card = Card {
            id: Uuid::new_v4(),
            owner_id,
            pan_encrypted,
            pan_fingerprint: fingerprint,
            pan_last_four,
            expiry_month,
            expiry_year,
            status: CardStatus::Active,
            balance: Decimal::ZERO,
        };

        self.store.insert(&card).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Card(CardError::CardAlreadyExists)
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(card_id = %card.id, owner_id = %owner_id, "Card created");
        Ok(card)
    }

    /// Fetch a card scoped to its owner.
    pub async fn get_owned(&self, owner_id: Uuid, card_id: Uuid) -> AppResult<Card> {
        self.store
            .find_by_id_for_owner(card_id, owner_id)
            .await?
            .ok_or_else(|| CardError::CardNotFound.into())
    }

    pub async fn list_owned(&self, owner_id: Uuid, params: PageParams) -> AppResult<Page<Card>> {
        let (cards, total) = self.store.list_by_owner(owner_id, params).await?;
        Ok(Page::new(cards, params, total))
    }

    pub async fn list_owned_by_status(
        &self,
        owner_id: Uuid,
        status: CardStatus,
        params: PageParams,
    ) -> AppResult<Page<Card>> {
        let (cards, total) = self
            .store
            .list_by_owner_and_status(owner_id, status, params)
            .await?;
        Ok(Page::new(cards, params, total))
    }

    /// Block one of the caller's own cards.
    pub async fn block_owned(&self, owner_id: Uuid, card_id: Uuid) -> AppResult<Card> {
        let mut card = self
            .store
            .find_by_id_for_owner(card_id, owner_id)
            .await?
            .ok_or(CardError::CardNotFound)?;

        card.status = CardStatus::Blocked;
        self.store.update_status(card.id, card.status).await?;

        tracing::info!(card_id = %card.id, "Card blocked by owner");
        Ok(card)
    }

    /// Administrative status change, no ownership scoping.
    pub async fn admin_set_status(&self, card_id: Uuid, status: CardStatus) -> AppResult<Card> {
        let mut card = self
            .store
            .find_by_id(card_id)
            .await?
            .ok_or(CardError::CardNotFound)?;

        card.status = status;
        self.store.update_status(card.id, status).await?;

        tracing::info!(card_id = %card.id, status = %status, "Card status updated");
        Ok(card)
    }

    /// Administrative deletion.
    pub async fn admin_delete(&self, card_id: Uuid) -> AppResult<()> {
        if !self.store.exists_by_id(card_id).await? {
            return Err(CardError::CardNotFound.into());
        }
        self.store.delete_by_id(card_id).await?;

        tracing::info!(card_id = %card_id, "Card deleted");
        Ok(())
    }

    /// Administrative listing across all owners, filtered by status.
    pub async fn admin_list_by_status(
        &self,
        status: CardStatus,
        params: PageParams,
    ) -> AppResult<Page<Card>> {
        let (cards, total) = self.store.list_by_status(status, params).await?;
        Ok(Page::new(cards, params, total))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
