//! Card entity and status
//!
//! The `Card` values handed out by the store are snapshots of persisted
//! state. Callers that want to mutate a balance must re-fetch the card
//! under a row lock instead of writing back a stale copy.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a card.
///
/// A closed set: adding a state means revisiting every match in the
/// lifecycle service and the transfer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown card status: {0}")]
pub struct ParseCardStatusError(pub String);

impl FromStr for CardStatus {
    type Err = ParseCardStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CardStatus::Active),
            "BLOCKED" => Ok(CardStatus::Blocked),
            "EXPIRED" => Ok(CardStatus::Expired),
            other => Err(ParseCardStatusError(other.to_string())),
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardStatus::Active => "ACTIVE",
            CardStatus::Blocked => "BLOCKED",
            CardStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// A payment card record.
///
/// The plaintext PAN never appears here: only the AES-GCM blob
/// (`pan_encrypted`), the keyed one-way fingerprint used for uniqueness
/// checks, and the clear last four digits for display masking.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub pan_encrypted: Vec<u8>,
    pub pan_fingerprint: String,
    pub pan_last_four: String,
    pub expiry_month: i16,
    pub expiry_year: i16,
    pub status: CardStatus,
    pub balance: Decimal,
}

impl Card {
    pub fn is_active(&self) -> bool {
        matches!(self.status, CardStatus::Active)
    }

    /// Display form, e.g. `**** **** **** 3498`.
    pub fn masked_pan(&self) -> String {
        format!("**** **** **** {}", self.pan_last_four)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [CardStatus::Active, CardStatus::Blocked, CardStatus::Expired] {
            let parsed: CardStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_unknown_rejected() {
        let err = "FROZEN".parse::<CardStatus>().unwrap_err();
        assert_eq!(err, ParseCardStatusError("FROZEN".to_string()));
    }

    #[test]
    fn test_status_serde_uppercase() {
        let json = serde_json::to_string(&CardStatus::Blocked).unwrap();
        assert_eq!(json, "\"BLOCKED\"");
        let status: CardStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(status, CardStatus::Active);
    }

    #[test]
    fn test_masked_pan() {
        let card = Card {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            pan_encrypted: vec![],
            pan_fingerprint: String::new(),
            pan_last_four: "3498".to_string(),
            expiry_month: 12,
            expiry_year: 2031,
            status: CardStatus::Active,
            balance: Decimal::ZERO,
        };
        assert_eq!(card.masked_pan(), "**** **** **** 3498");
    }
}
