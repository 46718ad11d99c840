//! API Routes
//!
//! HTTP endpoint definitions for the card ledger.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Card, CardStatus, Page, PageParams};
use crate::error::AppError;
use crate::service::{CardService, TransferCommand, TransferEngine};

use super::middleware::OwnerIdentity;
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub owner_id: Uuid,
}

/// Card as exposed to callers: masked number only, never the ciphertext
/// or fingerprint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CardResponse {
    pub card_id: Uuid,
    pub pan_masked: String,
    pub expiry_month: i16,
    pub expiry_year: i16,
    pub status: CardStatus,
    pub balance: Decimal,
}

impl CardResponse {
    pub fn from_card(card: &Card) -> Self {
        Self {
            card_id: card.id,
            pan_masked: card.masked_pan(),
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            status: card.status,
            balance: card.balance,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListCardsQuery {
    #[serde(default)]
    pub status: Option<CardStatus>,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdminListCardsQuery {
    pub status: CardStatus,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_card_id: Uuid,
    pub to_card_id: Uuid,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub from_card_id: Uuid,
    pub to_card_id: Uuid,
    pub amount: Decimal,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CardStatus,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Owner-scoped card endpoints
        .route("/cards", post(create_card))
        .route("/cards", get(list_cards))
        .route("/cards/:card_id", get(get_card))
        .route("/cards/:card_id/block", post(block_card))
        // Transfers
        .route("/transfers", post(transfer))
        // Admin endpoints
        .route("/admin/cards", get(admin_list_cards))
        .route("/admin/cards/:card_id/status", patch(admin_set_status))
        .route("/admin/cards/:card_id", delete(admin_delete_card))
}

// =========================================================================
// POST /cards
// =========================================================================

/// Create a card for an owner (administrative)
async fn create_card(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), AppError> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    let service = CardService::new(state.pool, state.crypto);
    let card = service.create(request.owner_id).await?;

    Ok((StatusCode::CREATED, Json(CardResponse::from_card(&card))))
}

// =========================================================================
// GET /cards
// =========================================================================

/// List the caller's own cards, optionally filtered by status
async fn list_cards(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Query(query): Query<ListCardsQuery>,
) -> Result<Json<Page<CardResponse>>, AppError> {
    let service = CardService::new(state.pool, state.crypto);
    let params = PageParams::new(query.page, query.size);

    let page = match query.status {
        Some(status) => {
            service
                .list_owned_by_status(identity.owner_id, status, params)
                .await?
        }
        None => service.list_owned(identity.owner_id, params).await?,
    };

    Ok(Json(page.map(|card| CardResponse::from_card(&card))))
}

// =========================================================================
// GET /cards/:card_id
// =========================================================================

/// Get one of the caller's own cards
async fn get_card(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardResponse>, AppError> {
    let service = CardService::new(state.pool, state.crypto);
    let card = service.get_owned(identity.owner_id, card_id).await?;

    Ok(Json(CardResponse::from_card(&card)))
}

// =========================================================================
// POST /cards/:card_id/block
// =========================================================================

/// Block one of the caller's own cards
async fn block_card(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardResponse>, AppError> {
    let service = CardService::new(state.pool, state.crypto);
    let card = service.block_owned(identity.owner_id, card_id).await?;

    Ok(Json(CardResponse::from_card(&card)))
}

// =========================================================================
// POST /transfers
// =========================================================================

/// Transfer money between two of the caller's cards
async fn transfer(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let engine = TransferEngine::new(state.pool);

    let command = TransferCommand::new(request.from_card_id, request.to_card_id, request.amount);
    let result = engine.execute(identity.owner_id, command).await?;

    Ok(Json(TransferResponse {
        from_card_id: result.from_card_id,
        to_card_id: result.to_card_id,
        amount: result.amount,
        status: result.status,
    }))
}

// =========================================================================
// GET /admin/cards
// =========================================================================

/// List cards across all owners, filtered by status (admin only)
async fn admin_list_cards(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Query(query): Query<AdminListCardsQuery>,
) -> Result<Json<Page<CardResponse>>, AppError> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    let service = CardService::new(state.pool, state.crypto);
    let params = PageParams::new(query.page, query.size);
    let page = service.admin_list_by_status(query.status, params).await?;

    Ok(Json(page.map(|card| CardResponse::from_card(&card))))
}

// =========================================================================
// PATCH /admin/cards/:card_id/status
// =========================================================================

/// Change a card's status (admin only)
async fn admin_set_status(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Path(card_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<CardResponse>, AppError> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    let service = CardService::new(state.pool, state.crypto);
    let card = service.admin_set_status(card_id, request.status).await?;

    Ok(Json(CardResponse::from_card(&card)))
}

// =========================================================================
// DELETE /admin/cards/:card_id
// =========================================================================

/// Delete a card (admin only)
async fn admin_delete_card(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Path(card_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    let service = CardService::new(state.pool, state.crypto);
    service.admin_delete(card_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_request_deserialize() {
        let json = r#"{
            "from_card_id": "550e8400-e29b-41d4-a716-446655440001",
            "to_card_id": "550e8400-e29b-41d4-a716-446655440002",
            "amount": "100.50"
        }"#;

        let request: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.amount, "100.50");
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListCardsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.size, 20);
        assert!(query.status.is_none());
    }

    #[test]
    fn test_card_response_masks_pan() {
        let card = Card {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            pan_encrypted: vec![1, 2, 3],
            pan_fingerprint: "abc".to_string(),
            pan_last_four: "6467".to_string(),
            expiry_month: 8,
            expiry_year: 2031,
            status: CardStatus::Active,
            balance: dec!(12.34),
        };

        let response = CardResponse::from_card(&card);
        assert_eq!(response.pan_masked, "**** **** **** 6467");

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("fingerprint"));
        assert!(!json.contains("pan_encrypted"));
        assert!(json.contains("\"ACTIVE\""));
    }

    #[test]
    fn test_update_status_request_deserialize() {
        let request: UpdateStatusRequest =
            serde_json::from_str(r#"{"status": "BLOCKED"}"#).unwrap();
        assert_eq!(request.status, CardStatus::Blocked);
    }
}
